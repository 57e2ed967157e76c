//! Synchronous client for the Pinboard v1 API.
//!
//! # Overview
//! `Pinboard` authenticates with a `<user>:<secret>` token and exposes one
//! method per endpoint: bookmarks, date histograms, tag suggestions, tags and
//! notes. Each call is a single blocking GET.
//!
//! # Design
//! - `PinboardClient` is stateless: `build_*` produces an `HttpRequest`,
//!   `parse_*` consumes an `HttpResponse`. Neither touches the network.
//! - `Transport` performs the GET; `UreqTransport` is the default.
//! - Pinboard answers with three envelope shapes (string map, mixed object,
//!   top-level array). Each endpoint decodes into its own serde struct at the
//!   boundary and is converted into the domain types in `types`.
//! - The base URL lives in `ClientConfig`, so tests point the client at a
//!   local mock server.

pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod http;
pub mod session;
pub mod types;
mod wire;

pub use client::{Endpoint, Params, PinboardClient};
pub use config::ClientConfig;
pub use error::{ApiError, ErrorKind};
pub use http::{check_response, HttpRequest, HttpResponse, Transport, UreqTransport};
pub use session::Pinboard;
pub use types::{
    AllOptions, Bookmark, GetOptions, Note, NoteMetadata, Popular, Post, RecentOptions,
    Recommended, Suggestions, Tag, MAX_RECENT_COUNT,
};
