/// Text processing utilities
pub mod text {
    use scraper::Html;

    /// Truncate to at most `max_chars` characters, preferring a sentence or
    /// word boundary. Works on characters, never splits a code point.
    pub fn truncate_chars(text: &str, max_chars: usize) -> String {
        let text = text.trim();
        if text.chars().count() <= max_chars {
            return text.to_string();
        }

        let truncated: String = text.chars().take(max_chars).collect();
        let sentence_end = truncated
            .char_indices()
            .filter(|(_, c)| matches!(c, '.' | '。' | '!' | '?'))
            .map(|(i, c)| i + c.len_utf8())
            .last();

        match sentence_end {
            Some(end) if end > truncated.len() / 2 => truncated[..end].to_string(),
            _ => match truncated.rfind(' ') {
                Some(space) if space > truncated.len() / 2 => format!("{}...", &truncated[..space]),
                _ => format!("{}...", truncated),
            },
        }
    }

    /// Collapse runs of whitespace to single spaces and trim.
    pub fn collapse_whitespace(text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Plain text of an HTML fragment such as a feed summary.
    pub fn strip_html(fragment: &str) -> String {
        if !fragment.contains('<') {
            return collapse_whitespace(fragment);
        }
        let parsed = Html::parse_fragment(fragment);
        let text: Vec<&str> = parsed.root_element().text().collect();
        collapse_whitespace(&text.join(" "))
    }
}

/// URL utilities
pub mod url {
    use url::Url;

    /// Extract domain from URL
    pub fn extract_domain(url_str: &str) -> Option<String> {
        Url::parse(url_str).ok()?.domain().map(|d| d.to_string())
    }

    /// Lowercased extension of the URL path's last segment, ignoring query and fragment.
    pub fn path_extension(url_str: &str) -> Option<String> {
        let path = match Url::parse(url_str) {
            Ok(url) => url.path().to_string(),
            Err(_) => url_str
                .split(['?', '#'])
                .next()
                .unwrap_or_default()
                .to_string(),
        };

        let last_segment = path.rsplit('/').next()?;
        let (stem, ext) = last_segment.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }

    pub fn is_http_url(url_str: &str) -> bool {
        match Url::parse(url_str) {
            Ok(url) => url.scheme() == "http" || url.scheme() == "https",
            Err(_) => false,
        }
    }
}

/// Time utilities
pub mod time {
    use std::time::Duration;

    /// Format duration in human-readable form
    pub fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();

        if total_seconds < 60 {
            format!("{}s", total_seconds)
        } else if total_seconds < 3600 {
            format!("{}m", total_seconds / 60)
        } else if total_seconds < 86400 {
            format!("{}h", total_seconds / 3600)
        } else {
            format!("{}d", total_seconds / 86400)
        }
    }
}
