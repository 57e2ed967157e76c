//! Per-endpoint response envelopes as serde structs.
//!
//! Each endpoint gets its own struct so a field's wire type is stated where it
//! is read. Note `length` is a numeric string in `notes/list` but a JSON
//! number in `notes/<id>`, hence the two note structs.

use std::collections::HashMap;

use log::warn;
use serde::Deserialize;

use crate::codec::{parse_count, parse_fixed_date_time, parse_rfc3339, split_tags, yes_no_to_bool};
use crate::types::{Bookmark, Note, NoteMetadata};

/// One bookmark as returned by `posts/get`, `posts/recent` and `posts/all`.
#[derive(Debug, Deserialize)]
pub(crate) struct PostObject {
    href: String,
    description: String,
    extended: String,
    tags: String,
    time: String,
    shared: String,
    toread: String,
    #[serde(default)]
    hash: Option<String>,
    #[serde(default)]
    meta: Option<String>,
}

impl From<PostObject> for Bookmark {
    fn from(post: PostObject) -> Self {
        let created = parse_rfc3339(&post.time);
        if created.is_none() {
            warn!("unparsable time {:?} on bookmark {}", post.time, post.href);
        }
        Bookmark {
            url: post.href,
            title: post.description,
            description: post.extended,
            tags: split_tags(&post.tags),
            created,
            replace: false,
            shared: yes_no_to_bool(&post.shared),
            to_read: yes_no_to_bool(&post.toread),
            hash: post.hash.map(String::into_bytes).unwrap_or_default(),
            meta: post.meta.map(String::into_bytes).unwrap_or_default(),
        }
    }
}

/// `posts/get` and `posts/recent`.
#[derive(Debug, Deserialize)]
pub(crate) struct PostsEnvelope {
    pub posts: Vec<PostObject>,
}

/// `posts/dates`: date string to numeric-string count.
#[derive(Debug, Deserialize)]
pub(crate) struct DatesEnvelope {
    pub dates: HashMap<String, String>,
}

/// One element of the `posts/suggest` array.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct SuggestEntry {
    #[serde(default)]
    pub popular: Option<Vec<String>>,
    #[serde(default)]
    pub recommended: Option<Vec<String>>,
}

/// `notes/list`.
#[derive(Debug, Deserialize)]
pub(crate) struct NotesEnvelope {
    pub count: usize,
    pub notes: Vec<NoteListingObject>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NoteListingObject {
    id: String,
    title: String,
    hash: String,
    length: String,
    created_at: String,
    updated_at: String,
}

impl From<NoteListingObject> for NoteMetadata {
    fn from(note: NoteListingObject) -> Self {
        NoteMetadata {
            id: note.id,
            title: note.title,
            length: parse_count(&note.length),
            hash: note.hash.into_bytes(),
            created: parse_fixed_date_time(&note.created_at),
            updated: parse_fixed_date_time(&note.updated_at),
        }
    }
}

/// `notes/<id>`.
#[derive(Debug, Deserialize)]
pub(crate) struct NoteObject {
    id: String,
    title: String,
    hash: String,
    length: u64,
    text: String,
    created_at: String,
    updated_at: String,
}

impl From<NoteObject> for Note {
    fn from(note: NoteObject) -> Self {
        Note {
            metadata: NoteMetadata {
                id: note.id,
                title: note.title,
                length: note.length,
                hash: note.hash.into_bytes(),
                created: parse_fixed_date_time(&note.created_at),
                updated: parse_fixed_date_time(&note.updated_at),
            },
            text: note.text,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn post_without_hash_or_meta_decodes_to_empty_bytes() {
        let post: PostObject = serde_json::from_str(
            r#"{"href":"http://aaa.com/","description":"AAA","extended":"","tags":"a b",
                "time":"2015-07-02T07:56:40Z","shared":"no","toread":"yes"}"#,
        )
        .unwrap();
        let bookmark = Bookmark::from(post);
        assert!(bookmark.hash.is_empty());
        assert!(bookmark.meta.is_empty());
        assert!(bookmark.to_read);
        assert!(!bookmark.shared);
        assert_eq!(bookmark.tags, vec!["a", "b"]);
        assert_eq!(
            bookmark.created,
            Some(Utc.with_ymd_and_hms(2015, 7, 2, 7, 56, 40).unwrap())
        );
    }

    #[test]
    fn post_with_bad_time_keeps_created_unset() {
        let post: PostObject = serde_json::from_str(
            r#"{"href":"u","description":"d","extended":"e","tags":"","time":"yesterday",
                "shared":"yes","toread":"no","hash":"abc"}"#,
        )
        .unwrap();
        let bookmark = Bookmark::from(post);
        assert!(bookmark.created.is_none());
        assert_eq!(bookmark.hash, b"abc".to_vec());
        assert!(bookmark.shared);
    }

    #[test]
    fn post_missing_required_field_is_rejected() {
        let result: Result<PostObject, _> = serde_json::from_str(
            r#"{"href":"u","description":"d","tags":"","time":"","shared":"no","toread":"no"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn listing_note_length_must_be_a_string() {
        let result: Result<NoteListingObject, _> = serde_json::from_str(
            r#"{"id":"1","title":"t","hash":"h","length":26,
                "created_at":"2015-04-20 13:51:58","updated_at":"2015-04-20 13:51:58"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn single_note_length_must_be_a_number() {
        let result: Result<NoteObject, _> = serde_json::from_str(
            r#"{"id":"1","title":"t","hash":"h","length":"26","text":"x",
                "created_at":"2015-04-20 13:51:58","updated_at":"2015-04-20 13:51:58"}"#,
        );
        assert!(result.is_err());
    }
}
