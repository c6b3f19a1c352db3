use crate::dedup::DedupKey;
use crate::types::{AggregatorError, Article, CurrencyTag, NewArticle, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://./db/forex.sqlite";

/// Filter for reading stored articles back.
#[derive(Debug, Clone, Default)]
pub struct ArticleQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub category: Option<String>,
    /// Keep articles carrying any of these tags. Empty means no filter.
    pub currencies: Vec<CurrencyTag>,
    pub limit: Option<usize>,
}

/// SQLite-backed article storage. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ArticleStore {
    pool: SqlitePool,
}

impl ArticleStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        if let Some(parent) = options.get_filename().parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.setup_schema().await?;
        info!("Article store ready at {}", database_url);
        Ok(store)
    }

    /// Private in-memory database. A single connection keeps every query on
    /// the same database.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.setup_schema().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn setup_schema(&self) -> Result<()> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS news_articles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                category TEXT NOT NULL,
                title TEXT NOT NULL,
                summary TEXT NOT NULL,
                url TEXT NOT NULL CHECK (length(url) > 0),
                published INTEGER NOT NULL,
                currency_tags TEXT NOT NULL DEFAULT '[]',
                created_at INTEGER NOT NULL
            )
            "#,
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_news_articles_url ON news_articles (url)",
            "CREATE INDEX IF NOT EXISTS idx_news_articles_title_published ON news_articles (title, published)",
            "CREATE INDEX IF NOT EXISTS idx_news_articles_published ON news_articles (published)",
        ];

        for statement in statements {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Whether an article matching `key` is already stored
    pub async fn exists(&self, key: &DedupKey) -> Result<bool> {
        let found: i64 = match key {
            DedupKey::Url(url) => {
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM news_articles WHERE url = ?)")
                    .bind(url)
                    .fetch_one(&self.pool)
                    .await?
            }
            DedupKey::TitlePublished { title, published_millis } => {
                sqlx::query_scalar(
                    "SELECT EXISTS(SELECT 1 FROM news_articles WHERE title = ? AND published = ?)",
                )
                .bind(title)
                .bind(published_millis)
                .fetch_one(&self.pool)
                .await?
            }
        };
        Ok(found != 0)
    }

    /// Insert a batch in one transaction and return how many rows were new.
    ///
    /// Rows whose url already exists are skipped. Any error rolls the whole
    /// batch back.
    pub async fn commit_batch(&self, articles: &[NewArticle]) -> Result<usize> {
        if articles.is_empty() {
            return Ok(0);
        }

        let created_at = Utc::now().timestamp_millis();
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0usize;

        for article in articles {
            let tags = serde_json::to_string(&article.currency_tags)?;
            let result = sqlx::query(
                r#"
                INSERT INTO news_articles (category, title, summary, url, published, currency_tags, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(url) DO NOTHING
                "#,
            )
            .bind(&article.category)
            .bind(&article.title)
            .bind(&article.summary)
            .bind(&article.url)
            .bind(article.published.timestamp_millis())
            .bind(tags)
            .bind(created_at)
            .execute(&mut *tx)
            .await?;

            inserted += result.rows_affected() as usize;
        }

        tx.commit().await?;
        debug!("Committed {} of {} articles", inserted, articles.len());
        Ok(inserted)
    }

    /// Articles matching `query`, newest first.
    pub async fn query(&self, query: &ArticleQuery) -> Result<Vec<Article>> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT id, category, title, summary, url, published, currency_tags, created_at FROM news_articles WHERE 1 = 1",
        );

        if let Some(from) = query.from {
            builder.push(" AND published >= ").push_bind(from.timestamp_millis());
        }
        if let Some(to) = query.to {
            builder.push(" AND published <= ").push_bind(to.timestamp_millis());
        }
        if let Some(category) = &query.category {
            builder.push(" AND category = ").push_bind(category.clone());
        }
        if !query.currencies.is_empty() {
            builder.push(" AND (");
            for (i, tag) in query.currencies.iter().enumerate() {
                if i > 0 {
                    builder.push(" OR ");
                }
                builder
                    .push("currency_tags LIKE ")
                    .push_bind(format!("%\"{}\"%", tag.as_str()));
            }
            builder.push(")");
        }

        builder.push(" ORDER BY published DESC, id DESC");
        if let Some(limit) = query.limit {
            builder.push(" LIMIT ").push_bind(limit as i64);
        }

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_article).collect()
    }

    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM news_articles")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

fn row_to_article(row: &SqliteRow) -> Result<Article> {
    let tags: String = row.try_get("currency_tags")?;
    Ok(Article {
        id: row.try_get("id")?,
        category: row.try_get("category")?,
        title: row.try_get("title")?,
        summary: row.try_get("summary")?,
        url: row.try_get("url")?,
        published: millis_to_datetime(row.try_get("published")?)?,
        currency_tags: serde_json::from_str(&tags)?,
        created_at: millis_to_datetime(row.try_get("created_at")?)?,
    })
}

fn millis_to_datetime(millis: i64) -> Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .ok_or_else(|| AggregatorError::General(format!("timestamp out of range: {}", millis)))
}
