//! Authenticated session over a `Transport`.
//!
//! # Design
//! `Pinboard` owns a `PinboardClient`, a transport, the user's token and an
//! authenticated flag. `authenticate` is the only operation allowed while the
//! flag is unset; every other operation checks it first and fails without
//! issuing a request. Each operation is exactly one build, one GET and one
//! parse. The session is not meant to be shared across threads while it is
//! being authenticated.

use std::fmt;

use chrono::{DateTime, Utc};
use log::{debug, trace};

use crate::client::PinboardClient;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Transport, UreqTransport};
use crate::types::{
    AllOptions, Bookmark, GetOptions, Note, NoteMetadata, Post, RecentOptions, Suggestions, Tag,
};

pub struct Pinboard<T = UreqTransport> {
    client: PinboardClient,
    transport: T,
    token: String,
    authenticated: bool,
}

impl<T: fmt::Debug> fmt::Debug for Pinboard<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pinboard")
            .field("client", &self.client)
            .field("transport", &self.transport)
            .field("authenticated", &self.authenticated)
            .finish_non_exhaustive()
    }
}

impl Pinboard<UreqTransport> {
    /// An unauthenticated session using the blocking `ureq` transport.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(config, UreqTransport::new())
    }
}

impl<T: Transport> Pinboard<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self {
            client: PinboardClient::new(config),
            transport,
            token: String::new(),
            authenticated: false,
        }
    }

    /// The stored token, `<user>:<secret>`, or empty before authentication.
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn client(&self) -> &PinboardClient {
        &self.client
    }

    fn guard(&self) -> Result<&str, ApiError> {
        if !self.authenticated {
            return Err(ApiError::Unauthenticated);
        }
        Ok(&self.token)
    }

    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!("GET {}", request.endpoint);
        let response = self.transport.get(&request)?;
        trace!(
            "{} answered {} with {} bytes",
            request.endpoint,
            response.status,
            response.body.len()
        );
        Ok(response)
    }

    /// Validate `token` and, on success, store it and return the token the
    /// server reports. On failure the session is left exactly as it was.
    pub fn authenticate(&mut self, token: &str) -> Result<String, ApiError> {
        let request = self.client.build_authenticate(token)?;
        let canonical = self.client.parse_authenticate(self.execute(request)?)?;
        self.token = token.to_string();
        self.authenticated = true;
        debug!("authenticated");
        Ok(canonical)
    }

    /// Time of the last add, update or delete. Check this before pulling
    /// `all_bookmarks` again.
    pub fn last_update(&self) -> Result<DateTime<Utc>, ApiError> {
        let request = self.client.build_last_update(self.guard()?)?;
        self.client.parse_last_update(self.execute(request)?)
    }

    pub fn add_bookmark(&self, bookmark: &Bookmark) -> Result<(), ApiError> {
        let request = self.client.build_add_bookmark(self.guard()?, bookmark)?;
        self.client.parse_add_bookmark(self.execute(request)?)
    }

    pub fn delete_bookmark(&self, url: &str) -> Result<(), ApiError> {
        let request = self.client.build_delete_bookmark(self.guard()?, url)?;
        self.client.parse_delete_bookmark(self.execute(request)?)
    }

    /// Bookmarks on a single day, or for a single URL.
    pub fn get_bookmarks(&self, options: &GetOptions) -> Result<Vec<Bookmark>, ApiError> {
        let request = self.client.build_get_bookmarks(self.guard()?, options)?;
        self.client.parse_get_bookmarks(self.execute(request)?)
    }

    pub fn date_histogram(&self, tags: &[String]) -> Result<Vec<Post>, ApiError> {
        let request = self.client.build_date_histogram(self.guard()?, tags)?;
        self.client.parse_date_histogram(self.execute(request)?)
    }

    pub fn recent_bookmarks(&self, options: &RecentOptions) -> Result<Vec<Bookmark>, ApiError> {
        let request = self.client.build_recent_bookmarks(self.guard()?, options)?;
        self.client.parse_recent_bookmarks(self.execute(request)?)
    }

    pub fn all_bookmarks(&self, options: &AllOptions) -> Result<Vec<Bookmark>, ApiError> {
        let request = self.client.build_all_bookmarks(self.guard()?, options)?;
        self.client.parse_all_bookmarks(self.execute(request)?)
    }

    pub fn suggest_tags(&self, url: &str) -> Result<Suggestions, ApiError> {
        let request = self.client.build_suggest_tags(self.guard()?, url)?;
        self.client.parse_suggest_tags(self.execute(request)?)
    }

    pub fn list_tags(&self) -> Result<Vec<Tag>, ApiError> {
        let request = self.client.build_list_tags(self.guard()?)?;
        self.client.parse_list_tags(self.execute(request)?)
    }

    pub fn delete_tag(&self, tag: &str) -> Result<(), ApiError> {
        let request = self.client.build_delete_tag(self.guard()?, tag)?;
        self.client.parse_delete_tag(self.execute(request)?)
    }

    /// Rename `old` to `new`, or fold it into `new` if that tag exists. The
    /// server matches `old` case-insensitively.
    pub fn rename_tag(&self, old: &str, new: &str) -> Result<(), ApiError> {
        let request = self.client.build_rename_tag(self.guard()?, old, new)?;
        self.client.parse_rename_tag(self.execute(request)?)
    }

    pub fn list_notes(&self) -> Result<Vec<NoteMetadata>, ApiError> {
        let request = self.client.build_list_notes(self.guard()?)?;
        self.client.parse_list_notes(self.execute(request)?)
    }

    pub fn fetch_note(&self, id: &str) -> Result<Note, ApiError> {
        let request = self.client.build_fetch_note(self.guard()?, id)?;
        self.client.parse_fetch_note(self.execute(request)?)
    }
}
