mod common;

use chrono::Duration;
use common::*;
use fx_news_aggregator::{
    AggregatorError, ArticleQuery, ArticleStore, BatchWriter, CurrencyTag, DedupKey, Deduplicator, NewArticle,
};
use tracing::info;

fn article(title: &str, url: &str, hours: i64, tags: &[CurrencyTag]) -> NewArticle {
    NewArticle {
        category: "official_sources".to_string(),
        title: title.to_string(),
        summary: format!("Summary of {}", title),
        url: url.to_string(),
        published: hours_ago(hours),
        currency_tags: tags.to_vec(),
    }
}

async fn poisoned_store() -> ArticleStore {
    let store = ArticleStore::in_memory().await.unwrap();
    sqlx::query(
        "CREATE TRIGGER reject_poison BEFORE INSERT ON news_articles \
         WHEN NEW.title = 'poison' BEGIN SELECT RAISE(ABORT, 'injected failure'); END;",
    )
    .execute(store.pool())
    .await
    .unwrap();
    store
}

#[tokio::test]
async fn test_commit_and_read_back() {
    init_tracing();
    info!("Testing article round trip through SQLite");

    let store = ArticleStore::in_memory().await.unwrap();
    let inserted = store
        .commit_batch(&[
            article("BOJ keeps policy unchanged", "https://boj.example.com/1", 2, &[CurrencyTag::Jpy]),
            article(
                "EUR/USD slides",
                "https://wire.example.com/2",
                1,
                &[CurrencyTag::Usd, CurrencyTag::Eur],
            ),
        ])
        .await
        .unwrap();
    assert_eq!(inserted, 2);

    let articles = store.query(&ArticleQuery::default()).await.unwrap();
    assert_eq!(articles.len(), 2);
    assert_eq!(articles[0].title, "EUR/USD slides");
    assert_eq!(articles[0].published, hours_ago(1));
    assert_eq!(articles[0].currency_tags, vec![CurrencyTag::Usd, CurrencyTag::Eur]);
    assert_eq!(articles[1].currency_tags, vec![CurrencyTag::Jpy]);
    assert!(articles[0].id > 0);
}

#[tokio::test]
async fn test_exists_by_url_and_by_title_published() {
    init_tracing();

    let store = ArticleStore::in_memory().await.unwrap();
    store
        .commit_batch(&[article("Fed minutes", "https://fed.example.com/minutes", 3, &[])])
        .await
        .unwrap();

    assert!(store.exists(&DedupKey::url("https://fed.example.com/minutes")).await.unwrap());
    assert!(!store.exists(&DedupKey::url("https://fed.example.com/other")).await.unwrap());

    assert!(store
        .exists(&DedupKey::title_published("Fed minutes", hours_ago(3)))
        .await
        .unwrap());
    assert!(!store
        .exists(&DedupKey::title_published("Fed minutes", hours_ago(4)))
        .await
        .unwrap());
}

#[tokio::test]
async fn test_duplicate_url_is_skipped_not_failed() {
    init_tracing();

    let store = ArticleStore::in_memory().await.unwrap();
    store
        .commit_batch(&[article("First", "https://wire.example.com/same", 1, &[])])
        .await
        .unwrap();

    let inserted = store
        .commit_batch(&[
            article("Second headline", "https://wire.example.com/same", 1, &[]),
            article("Third", "https://wire.example.com/new", 1, &[]),
        ])
        .await
        .unwrap();

    assert_eq!(inserted, 1);
    assert_eq!(store.count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_failed_batch_rolls_back_entirely() {
    init_tracing();

    let store = poisoned_store().await;
    let result = store
        .commit_batch(&[
            article("Fine", "https://wire.example.com/1", 1, &[]),
            article("poison", "https://wire.example.com/2", 1, &[]),
        ])
        .await;

    assert!(matches!(result, Err(AggregatorError::Database(_))));
    assert_eq!(store.count().await.unwrap(), 0);

    // the store is still usable afterwards
    let inserted = store
        .commit_batch(&[article("Fine", "https://wire.example.com/1", 1, &[])])
        .await
        .unwrap();
    assert_eq!(inserted, 1);
}

#[tokio::test]
async fn test_query_filters() {
    init_tracing();

    let store = ArticleStore::in_memory().await.unwrap();
    let mut api = article("Yen slides", "https://wire.example.com/yen", 1, &[CurrencyTag::Jpy]);
    api.category = "finnhub_forex".to_string();

    store
        .commit_batch(&[
            article("Fed decision", "https://fed.example.com/1", 2, &[CurrencyTag::Usd]),
            article("ECB decision", "https://ecb.example.com/1", 10, &[CurrencyTag::Eur]),
            article("Old news", "https://fed.example.com/old", 48, &[CurrencyTag::Usd]),
            api,
        ])
        .await
        .unwrap();

    let recent = store
        .query(&ArticleQuery {
            from: Some(sweep_time() - Duration::hours(12)),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(recent.len(), 3);

    let usd = store
        .query(&ArticleQuery {
            currencies: vec![CurrencyTag::Usd],
            ..Default::default()
        })
        .await
        .unwrap();
    let titles: Vec<&str> = usd.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(titles, vec!["Fed decision", "Old news"]);

    let eur_or_jpy = store
        .query(&ArticleQuery {
            currencies: vec![CurrencyTag::Eur, CurrencyTag::Jpy],
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(eur_or_jpy.len(), 2);

    let api_only = store
        .query(&ArticleQuery {
            category: Some("finnhub_forex".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(api_only.len(), 1);
    assert_eq!(api_only[0].title, "Yen slides");

    let limited = store
        .query(&ArticleQuery {
            to: Some(hours_ago(2)),
            limit: Some(1),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].title, "Fed decision");
}

#[tokio::test]
async fn test_batch_writer_commits_when_full() {
    init_tracing();

    let store = ArticleStore::in_memory().await.unwrap();
    let mut writer = BatchWriter::new(store.clone(), 2);

    writer.accept(article("One", "https://a.example.com/1", 1, &[])).await.unwrap();
    assert_eq!(writer.pending_len(), 1);
    assert_eq!(store.count().await.unwrap(), 0);

    writer.accept(article("Two", "https://a.example.com/2", 1, &[])).await.unwrap();
    assert_eq!(writer.pending_len(), 0);
    assert_eq!(store.count().await.unwrap(), 2);

    writer.accept(article("Three", "https://a.example.com/3", 1, &[])).await.unwrap();
    writer.flush().await.unwrap();

    let stats = writer.stats();
    assert_eq!(stats.committed_batches, 2);
    assert_eq!(stats.added, 3);
    assert_eq!(stats.failed_batches, 0);
}

#[tokio::test]
async fn test_batch_writer_survives_a_failed_commit() {
    init_tracing();

    let store = poisoned_store().await;
    let mut writer = BatchWriter::new(store.clone(), 2);

    writer.accept(article("poison", "https://a.example.com/1", 1, &[])).await.unwrap();
    let err = writer
        .accept(article("Innocent", "https://a.example.com/2", 1, &[]))
        .await
        .unwrap_err();
    assert!(matches!(err, AggregatorError::Commit { batch_len: 2, .. }));
    assert_eq!(writer.pending_len(), 0);

    writer.accept(article("Later", "https://a.example.com/3", 1, &[])).await.unwrap();
    writer.flush().await.unwrap();

    let stats = writer.stats();
    assert_eq!(stats.failed_batches, 1);
    assert_eq!(stats.dropped, 2);
    assert_eq!(stats.committed_batches, 1);
    assert_eq!(stats.added, 1);
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_deduplicator_remembers_keys_within_a_sweep() {
    init_tracing();

    let store = ArticleStore::in_memory().await.unwrap();
    store
        .commit_batch(&[article("Stored", "https://a.example.com/stored", 1, &[])])
        .await
        .unwrap();

    let mut dedup = Deduplicator::new(store);

    assert!(!dedup.admit(DedupKey::url("https://a.example.com/stored")).await.unwrap());
    assert!(dedup.admit(DedupKey::url("https://a.example.com/new")).await.unwrap());
    assert!(!dedup.admit(DedupKey::url("https://a.example.com/new")).await.unwrap());

    let key = DedupKey::title_published("Same title", hours_ago(1));
    assert!(dedup.admit(key.clone()).await.unwrap());
    assert!(!dedup.admit(key).await.unwrap());
    assert_eq!(dedup.seen_count(), 2);
}

#[tokio::test]
async fn test_connect_creates_database_file() {
    init_tracing();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("db").join("forex.sqlite");
    let url = format!("sqlite://{}", path.display());

    let store = ArticleStore::connect(&url).await.unwrap();
    store
        .commit_batch(&[article("Persisted", "https://a.example.com/p", 1, &[])])
        .await
        .unwrap();
    drop(store);

    let reopened = ArticleStore::connect(&url).await.unwrap();
    assert_eq!(reopened.count().await.unwrap(), 1);
    assert!(path.exists());
}
