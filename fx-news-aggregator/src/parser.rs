use crate::types::{AggregatorError, ParsedEntry, ParsedFeed, Result};
use chrono::Utc;
use feed_rs::parser;
use tracing::debug;

pub struct FeedParser;

impl FeedParser {
    /// Parse an RSS 1.0/2.0 or Atom document.
    pub fn parse_feed(content: &str) -> Result<ParsedFeed> {
        debug!("Parsing feed content ({} bytes)", content.len());

        let feed = parser::parse(content.as_bytes())
            .map_err(|e| AggregatorError::Parse(format!("Failed to parse feed: {}", e)))?;

        let title = feed.title.map(|t| t.content);
        let entries: Vec<ParsedEntry> = feed.entries.into_iter().map(Self::parse_entry).collect();

        debug!("Parsed feed with {} entries", entries.len());

        Ok(ParsedFeed { title, entries })
    }

    fn parse_entry(entry: feed_rs::model::Entry) -> ParsedEntry {
        let title = entry
            .title
            .map(|t| t.content)
            .filter(|t| !t.trim().is_empty());

        let link = entry
            .links
            .first()
            .map(|l| l.href.trim().to_string())
            .filter(|href| !href.is_empty());

        // prefer the summary, fall back to inline content
        let summary = entry
            .summary
            .map(|s| s.content)
            .or_else(|| entry.content.and_then(|c| c.body))
            .filter(|s| !s.trim().is_empty());

        // RSS 1.0 feeds (dc:date) surface as `updated` only
        let published_at = entry
            .published
            .or(entry.updated)
            .map(|dt| dt.with_timezone(&Utc));

        ParsedEntry {
            title,
            link,
            summary,
            published_at,
        }
    }
}
