use regex::Regex;
use std::sync::LazyLock;

static DOCUMENT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/d/([a-zA-Z0-9_-]+)").expect("document id pattern is valid"));

/// Extracts the spreadsheet document id from a share link such as
/// `https://docs.google.com/spreadsheets/d/<id>/edit`.
#[must_use]
pub fn document_id(feed_url: &str) -> Option<&str> {
    DOCUMENT_ID.captures(feed_url).and_then(|c| c.get(1)).map(|m| m.as_str())
}

/// One accepted line of the feed, before the recipient is normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRow {
    pub recipient: String,
    pub body: String,
}

/// Line counters gathered while parsing a feed. The header line is not counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    pub rows_read: usize,
    pub rows_dropped: usize,
}

impl ParseStats {
    #[must_use]
    pub const fn rows_accepted(&self) -> usize {
        self.rows_read - self.rows_dropped
    }
}
