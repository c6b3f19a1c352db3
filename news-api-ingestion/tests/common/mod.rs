use chrono::{DateTime, TimeZone, Utc};
use interfaces::{ApiNewsItem, TimeWindow};
use std::sync::Once;

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub fn window_end() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 12, 0, 0).unwrap()
}

/// The default 30 minute pull window ending at `window_end()`.
pub fn test_window() -> TimeWindow {
    TimeWindow::ending_at(window_end(), chrono::Duration::minutes(30))
}

pub fn item(headline: &str, url: &str, minutes_ago: i64) -> ApiNewsItem {
    ApiNewsItem {
        headline: headline.to_string(),
        url: url.to_string(),
        summary: String::new(),
        source: "Unknown Wire".to_string(),
        datetime: (window_end() - chrono::Duration::minutes(minutes_ago)).timestamp(),
        category: "forex".to_string(),
    }
}
