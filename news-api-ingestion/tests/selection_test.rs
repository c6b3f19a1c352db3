mod common;

use common::{init_tracing, item, test_window};
use news_api_ingestion::{is_currency_related, select_items};
use tracing::info;

#[test]
fn test_select_items_drops_out_of_window_items() {
    init_tracing();
    let window = test_window();

    let items = vec![
        item("Dollar firms ahead of CPI", "https://news.example/a", 5),
        item("Dollar slipped yesterday", "https://news.example/b", 90),
        item("Yen futures open", "https://news.example/c", -10),
    ];

    let selected = select_items(items, &window, 50);
    let urls: Vec<&str> = selected.iter().map(|i| i.url.as_str()).collect();
    info!("Selected {:?}", urls);

    assert_eq!(urls, vec!["https://news.example/a"]);
}

#[test]
fn test_select_items_keeps_first_occurrence_of_each_url() {
    init_tracing();
    let window = test_window();

    let mut first = item("ECB holds rates", "https://news.example/ecb", 10);
    first.summary = "first copy".to_string();
    let mut second = item("ECB holds rates (updated)", "https://news.example/ecb", 3);
    second.summary = "second copy".to_string();

    let selected = select_items(vec![first, second], &window, 50);

    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0].summary, "first copy");
}

#[test]
fn test_select_items_requires_url_and_relevance() {
    init_tracing();
    let window = test_window();

    let items = vec![
        item("Dollar index climbs", "", 4),
        item("Local bakery wins award", "https://news.example/bakery", 4),
        item("Yen weakens past 150", "https://news.example/yen", 4),
    ];

    let selected = select_items(items, &window, 50);
    let urls: Vec<&str> = selected.iter().map(|i| i.url.as_str()).collect();

    assert_eq!(urls, vec!["https://news.example/yen"]);
}

#[test]
fn test_select_items_sorts_newest_first_and_truncates() {
    init_tracing();
    let window = test_window();

    let items = vec![
        item("Euro steady", "https://news.example/1", 20),
        item("Euro rallies", "https://news.example/2", 1),
        item("Euro dips", "https://news.example/3", 10),
    ];

    let selected = select_items(items, &window, 2);
    let urls: Vec<&str> = selected.iter().map(|i| i.url.as_str()).collect();

    assert_eq!(urls, vec!["https://news.example/2", "https://news.example/3"]);
}

#[test]
fn test_relevance_by_source_name() {
    let mut wire = item("Quarterly earnings roundup", "https://news.example/q", 1);
    assert!(!is_currency_related(&wire));

    wire.source = "Reuters".to_string();
    assert!(is_currency_related(&wire));
}

#[test]
fn test_relevance_by_country_and_keywords() {
    let japan = item("Japan machinery orders rise", "https://news.example/j", 1);
    let fomc = item("Minutes of the FOMC meeting", "https://news.example/f", 1);
    let jp = item("日銀が政策金利を据え置き", "https://news.example/boj", 1);

    assert!(is_currency_related(&japan));
    assert!(is_currency_related(&fomc));
    assert!(is_currency_related(&jp));
}
