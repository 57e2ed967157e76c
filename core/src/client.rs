//! Stateless request builder and response parser for the Pinboard API.
//!
//! # Design
//! `PinboardClient` holds only its configuration. Every endpoint has a
//! `build_*` method producing an `HttpRequest` and a `parse_*` method
//! consuming an `HttpResponse`; neither does I/O. `Pinboard` (see `session`)
//! composes the two around a `Transport`, but hosts that run their own HTTP
//! stack can drive this type directly.
//!
//! Request parameters follow the same rules everywhere: tag lists are
//! comma-joined and omitted when empty, booleans are `yes`/`no`, timestamps
//! are RFC3339 in UTC and omitted when unset (except `posts/add`, which
//! substitutes the current time). Every request carries `format=json` and an
//! `auth_token`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use url::Url;

use crate::codec::{
    bool_to_yes_no, decode_array, decode_object, decode_string_map, format_rfc3339, join_tags,
    parse_count, parse_date, parse_rfc3339,
};
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{check_response, HttpRequest, HttpResponse};
use crate::types::{
    AllOptions, Bookmark, GetOptions, Note, NoteMetadata, Post, RecentOptions, Suggestions, Tag,
    MAX_RECENT_COUNT,
};
use crate::wire::{DatesEnvelope, NoteObject, NotesEnvelope, PostObject, PostsEnvelope, SuggestEntry};

/// Query parameters, kept sorted so URLs are deterministic.
pub type Params = BTreeMap<&'static str, String>;

/// An API endpoint. `Note` addresses a single note by ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    ApiToken,
    PostsUpdate,
    PostsAdd,
    PostsDelete,
    PostsGet,
    PostsDates,
    PostsRecent,
    PostsAll,
    PostsSuggest,
    TagsGet,
    TagsDelete,
    TagsRename,
    NotesList,
    Note(String),
}

impl Endpoint {
    fn segments(&self) -> Vec<&str> {
        let path = match self {
            Endpoint::Note(id) => return vec!["notes", id.as_str()],
            Endpoint::ApiToken => "user/api_token",
            Endpoint::PostsUpdate => "posts/update",
            Endpoint::PostsAdd => "posts/add",
            Endpoint::PostsDelete => "posts/delete",
            Endpoint::PostsGet => "posts/get",
            Endpoint::PostsDates => "posts/dates",
            Endpoint::PostsRecent => "posts/recent",
            Endpoint::PostsAll => "posts/all",
            Endpoint::PostsSuggest => "posts/suggest",
            Endpoint::TagsGet => "tags/get",
            Endpoint::TagsDelete => "tags/delete",
            Endpoint::TagsRename => "tags/rename",
            Endpoint::NotesList => "notes/list",
        };
        path.split('/').collect()
    }

    pub fn path(&self) -> String {
        self.segments().join("/")
    }
}

/// Synchronous, stateless client for the Pinboard API.
#[derive(Debug, Clone)]
pub struct PinboardClient {
    config: ClientConfig,
}

impl PinboardClient {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Build a GET request for `endpoint`.
    ///
    /// `format=json` is always set. A non-empty `auth_token` already present
    /// in `params` wins over `token`.
    pub fn build(
        &self,
        endpoint: Endpoint,
        mut params: Params,
        token: &str,
    ) -> Result<HttpRequest, ApiError> {
        params.insert("format", "json".to_string());
        if params.get("auth_token").map_or(true, |t| t.is_empty()) {
            params.insert("auth_token", token.to_string());
        }

        let base = self.config.base_url();
        let mut url = Url::parse(base).map_err(|e| ApiError::InvalidUrl(format!("{base}: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(format!("{base}: cannot be a base URL")))?
            .pop_if_empty()
            .extend(endpoint.segments())
            .push("");
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in &params {
                query.append_pair(key, value);
            }
        }

        Ok(HttpRequest {
            endpoint: endpoint.path(),
            url,
        })
    }

    // -----------------------------------------------------------------------
    // Build
    // -----------------------------------------------------------------------

    /// The token is sent as an explicit `auth_token` so it is validated
    /// before anything is stored.
    pub fn build_authenticate(&self, token: &str) -> Result<HttpRequest, ApiError> {
        let mut params = Params::new();
        params.insert("auth_token", token.to_string());
        self.build(Endpoint::ApiToken, params, "")
    }

    pub fn build_last_update(&self, token: &str) -> Result<HttpRequest, ApiError> {
        self.build(Endpoint::PostsUpdate, Params::new(), token)
    }

    pub fn build_add_bookmark(
        &self,
        token: &str,
        bookmark: &Bookmark,
    ) -> Result<HttpRequest, ApiError> {
        self.build_add_bookmark_at(token, bookmark, Utc::now())
    }

    fn build_add_bookmark_at(
        &self,
        token: &str,
        bookmark: &Bookmark,
        now: DateTime<Utc>,
    ) -> Result<HttpRequest, ApiError> {
        let mut params = Params::new();
        params.insert("url", bookmark.url.clone());
        params.insert("description", bookmark.title.clone());
        if !bookmark.description.is_empty() {
            params.insert("extended", bookmark.description.clone());
        }
        if let Some(tags) = join_tags(&bookmark.tags) {
            params.insert("tags", tags);
        }
        params.insert("dt", format_rfc3339(&bookmark.created.unwrap_or(now)));
        params.insert("replace", bool_to_yes_no(bookmark.replace).to_string());
        params.insert("shared", bool_to_yes_no(bookmark.shared).to_string());
        params.insert("toread", bool_to_yes_no(bookmark.to_read).to_string());
        self.build(Endpoint::PostsAdd, params, token)
    }

    pub fn build_delete_bookmark(&self, token: &str, url: &str) -> Result<HttpRequest, ApiError> {
        let mut params = Params::new();
        params.insert("url", url.to_string());
        self.build(Endpoint::PostsDelete, params, token)
    }

    pub fn build_get_bookmarks(
        &self,
        token: &str,
        options: &GetOptions,
    ) -> Result<HttpRequest, ApiError> {
        let mut params = Params::new();
        if let Some(date) = &options.date {
            params.insert("dt", format_rfc3339(date));
        }
        if let Some(url) = options.url.as_deref().filter(|u| !u.is_empty()) {
            params.insert("url", url.to_string());
        }
        insert_tags(&mut params, &options.tags);
        params.insert("meta", bool_to_yes_no(options.meta).to_string());
        self.build(Endpoint::PostsGet, params, token)
    }

    pub fn build_date_histogram(
        &self,
        token: &str,
        tags: &[String],
    ) -> Result<HttpRequest, ApiError> {
        let mut params = Params::new();
        insert_tags(&mut params, tags);
        self.build(Endpoint::PostsDates, params, token)
    }

    pub fn build_recent_bookmarks(
        &self,
        token: &str,
        options: &RecentOptions,
    ) -> Result<HttpRequest, ApiError> {
        let mut params = Params::new();
        insert_tags(&mut params, &options.tags);
        if let Some(count) = options.count {
            params.insert("count", count.min(MAX_RECENT_COUNT).to_string());
        }
        self.build(Endpoint::PostsRecent, params, token)
    }

    pub fn build_all_bookmarks(
        &self,
        token: &str,
        options: &AllOptions,
    ) -> Result<HttpRequest, ApiError> {
        let mut params = Params::new();
        insert_tags(&mut params, &options.tags);
        params.insert("start", options.offset.to_string());
        if let Some(count) = options.count {
            params.insert("results", count.to_string());
        }
        if let Some(start) = &options.start {
            params.insert("fromdt", format_rfc3339(start));
        }
        if let Some(end) = &options.end {
            params.insert("todt", format_rfc3339(end));
        }
        params.insert("meta", bool_to_yes_no(options.meta).to_string());
        self.build(Endpoint::PostsAll, params, token)
    }

    pub fn build_suggest_tags(&self, token: &str, url: &str) -> Result<HttpRequest, ApiError> {
        let mut params = Params::new();
        params.insert("url", url.to_string());
        self.build(Endpoint::PostsSuggest, params, token)
    }

    pub fn build_list_tags(&self, token: &str) -> Result<HttpRequest, ApiError> {
        self.build(Endpoint::TagsGet, Params::new(), token)
    }

    pub fn build_delete_tag(&self, token: &str, tag: &str) -> Result<HttpRequest, ApiError> {
        let mut params = Params::new();
        params.insert("tag", tag.to_string());
        self.build(Endpoint::TagsDelete, params, token)
    }

    pub fn build_rename_tag(
        &self,
        token: &str,
        old: &str,
        new: &str,
    ) -> Result<HttpRequest, ApiError> {
        let mut params = Params::new();
        params.insert("old", old.to_string());
        params.insert("new", new.to_string());
        self.build(Endpoint::TagsRename, params, token)
    }

    pub fn build_list_notes(&self, token: &str) -> Result<HttpRequest, ApiError> {
        self.build(Endpoint::NotesList, Params::new(), token)
    }

    pub fn build_fetch_note(&self, token: &str, id: &str) -> Result<HttpRequest, ApiError> {
        self.build(Endpoint::Note(id.to_string()), Params::new(), token)
    }

    // -----------------------------------------------------------------------
    // Parse
    // -----------------------------------------------------------------------

    /// Returns the canonical token echoed by the server.
    pub fn parse_authenticate(&self, response: HttpResponse) -> Result<String, ApiError> {
        let mut map = decode_string_map(&check_response(response)?)?;
        map.remove("result")
            .ok_or_else(|| ApiError::decode("missing field `result`"))
    }

    pub fn parse_last_update(&self, response: HttpResponse) -> Result<DateTime<Utc>, ApiError> {
        let map = decode_string_map(&check_response(response)?)?;
        let raw = map
            .get("update_time")
            .ok_or_else(|| ApiError::decode("missing field `update_time`"))?;
        parse_rfc3339(raw).ok_or_else(|| ApiError::decode(format!("invalid update_time {raw:?}")))
    }

    pub fn parse_add_bookmark(&self, response: HttpResponse) -> Result<(), ApiError> {
        expect_done(response, "result_code")
    }

    pub fn parse_delete_bookmark(&self, response: HttpResponse) -> Result<(), ApiError> {
        expect_done(response, "result_code")
    }

    pub fn parse_get_bookmarks(&self, response: HttpResponse) -> Result<Vec<Bookmark>, ApiError> {
        parse_posts_envelope(response)
    }

    pub fn parse_recent_bookmarks(
        &self,
        response: HttpResponse,
    ) -> Result<Vec<Bookmark>, ApiError> {
        parse_posts_envelope(response)
    }

    /// Entries come back sorted by date; the wire map itself is unordered.
    pub fn parse_date_histogram(&self, response: HttpResponse) -> Result<Vec<Post>, ApiError> {
        let envelope: DatesEnvelope = decode_object(&check_response(response)?)?;
        let mut posts = envelope
            .dates
            .iter()
            .map(|(date, count)| -> Result<Post, ApiError> {
                Ok(Post {
                    date: parse_date(date)?,
                    count: parse_count(count),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        posts.sort_by_key(|p| p.date);
        Ok(posts)
    }

    pub fn parse_all_bookmarks(&self, response: HttpResponse) -> Result<Vec<Bookmark>, ApiError> {
        let posts: Vec<PostObject> = decode_array(&check_response(response)?)?;
        Ok(posts.into_iter().map(Bookmark::from).collect())
    }

    /// The server answers with `[{"popular":[..]},{"recommended":[..]}]`.
    /// Fewer than two elements means there is nothing to suggest.
    pub fn parse_suggest_tags(&self, response: HttpResponse) -> Result<Suggestions, ApiError> {
        let entries: Vec<SuggestEntry> = decode_array(&check_response(response)?)?;
        let mut entries = entries.into_iter();
        let (Some(first), Some(second)) = (entries.next(), entries.next()) else {
            return Ok(Suggestions::default());
        };
        Ok(Suggestions {
            popular: first
                .popular
                .ok_or_else(|| ApiError::decode("missing field `popular`"))?,
            recommended: second
                .recommended
                .ok_or_else(|| ApiError::decode("missing field `recommended`"))?,
        })
    }

    /// Tags come back sorted by name.
    pub fn parse_list_tags(&self, response: HttpResponse) -> Result<Vec<Tag>, ApiError> {
        let map = decode_string_map(&check_response(response)?)?;
        let mut tags: Vec<Tag> = map
            .into_iter()
            .map(|(name, count)| Tag {
                count: parse_count(&count),
                name,
            })
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    pub fn parse_delete_tag(&self, response: HttpResponse) -> Result<(), ApiError> {
        expect_done(response, "result")
    }

    pub fn parse_rename_tag(&self, response: HttpResponse) -> Result<(), ApiError> {
        expect_done(response, "result")
    }

    /// Reads exactly `count` notes. A longer array is truncated; a shorter
    /// one fails the whole call.
    pub fn parse_list_notes(&self, response: HttpResponse) -> Result<Vec<NoteMetadata>, ApiError> {
        let envelope: NotesEnvelope = decode_object(&check_response(response)?)?;
        if envelope.count > envelope.notes.len() {
            return Err(ApiError::decode(format!(
                "notes listing declares {} notes but contains {}",
                envelope.count,
                envelope.notes.len()
            )));
        }
        Ok(envelope
            .notes
            .into_iter()
            .take(envelope.count)
            .map(NoteMetadata::from)
            .collect())
    }

    pub fn parse_fetch_note(&self, response: HttpResponse) -> Result<Note, ApiError> {
        let note: NoteObject = decode_object(&check_response(response)?)?;
        Ok(note.into())
    }
}

fn insert_tags(params: &mut Params, tags: &[String]) {
    if let Some(tags) = join_tags(tags) {
        params.insert("tag", tags);
    }
}

fn parse_posts_envelope(response: HttpResponse) -> Result<Vec<Bookmark>, ApiError> {
    let envelope: PostsEnvelope = decode_object(&check_response(response)?)?;
    Ok(envelope.posts.into_iter().map(Bookmark::from).collect())
}

/// Require `map[key] == "done"`; any other value is the server's error code.
fn expect_done(response: HttpResponse, key: &str) -> Result<(), ApiError> {
    let mut map = decode_string_map(&check_response(response)?)?;
    match map.remove(key) {
        Some(code) if code == "done" => Ok(()),
        Some(code) => Err(ApiError::Protocol(code)),
        None => Err(ApiError::decode(format!("missing field `{key}`"))),
    }
}
