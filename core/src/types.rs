//! Domain records returned by the Pinboard API, plus query options.
//!
//! # Design
//! These types never see raw JSON. Per-endpoint wire structs in `wire`
//! decode the response and convert into these records, so timestamps are
//! already UTC and tag strings are already split.

use chrono::{DateTime, NaiveDate, Utc};

/// A single bookmark.
///
/// `created` is `None` when the server time was missing or unparsable; on
/// `add_bookmark` a `None` is replaced with the current time. `hash` and
/// `meta` are empty unless the server sent them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bookmark {
    pub url: String,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub created: Option<DateTime<Utc>>,
    /// Replace an existing bookmark with the same URL.
    pub replace: bool,
    /// Make the bookmark public.
    pub shared: bool,
    pub to_read: bool,
    /// MD5 of the URL, hex encoded.
    pub hash: Vec<u8>,
    /// Change-detection signature, only present when requested.
    pub meta: Vec<u8>,
}

impl Bookmark {
    pub fn new(url: &str, title: &str) -> Self {
        Self {
            url: url.to_string(),
            title: title.to_string(),
            ..Self::default()
        }
    }
}

/// A tag and the number of bookmarks using it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub count: u64,
}

/// Number of bookmarks created on one calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub date: NaiveDate,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteMetadata {
    pub id: String,
    pub title: String,
    /// Size of the note text in bytes.
    pub length: u64,
    /// SHA1 of the note text, hex encoded.
    pub hash: Vec<u8>,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

/// A note with its full text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Note {
    pub metadata: NoteMetadata,
    pub text: String,
}

/// Tags used site-wide for a URL.
pub type Popular = Vec<String>;

/// Tags drawn from the user's own tags for a URL.
pub type Recommended = Vec<String>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Suggestions {
    pub popular: Popular,
    pub recommended: Recommended,
}

/// Filters for `posts/get`. With neither `date` nor `url`, the server uses
/// the date of the most recent bookmark.
#[derive(Debug, Clone, Default)]
pub struct GetOptions {
    pub date: Option<DateTime<Utc>>,
    pub url: Option<String>,
    pub tags: Vec<String>,
    pub meta: bool,
}

/// Filters for `posts/recent`. `count` is capped at `MAX_RECENT_COUNT`;
/// `None` lets the server pick its default of 15.
#[derive(Debug, Clone, Default)]
pub struct RecentOptions {
    pub tags: Vec<String>,
    pub count: Option<u32>,
}

/// Filters and paging for `posts/all`.
#[derive(Debug, Clone, Default)]
pub struct AllOptions {
    pub tags: Vec<String>,
    pub offset: u32,
    /// `None` returns every bookmark.
    pub count: Option<u32>,
    /// Only bookmarks created after this time.
    pub start: Option<DateTime<Utc>>,
    /// Only bookmarks created before this time.
    pub end: Option<DateTime<Utc>>,
    pub meta: bool,
}

/// Server-enforced cap on `posts/recent`.
pub const MAX_RECENT_COUNT: u32 = 100;
