//! In-memory stand-in for the Pinboard v1 API.
//!
//! Serves the same paths and JSON envelopes as the real service so the client
//! can be exercised over real HTTP. Every request must carry `format=json`
//! and the `auth_token` the server was started with.

use std::{
    collections::{hash_map::DefaultHasher, BTreeMap, HashMap},
    hash::{Hash, Hasher},
    sync::Arc,
};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, SecondsFormat, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};

/// Default cap of `posts/recent`.
const RECENT_DEFAULT: usize = 15;
const RECENT_MAX: usize = 100;

#[derive(Clone, Debug)]
pub struct StoredBookmark {
    pub href: String,
    pub description: String,
    pub extended: String,
    pub tags: Vec<String>,
    pub time: DateTime<Utc>,
    pub shared: bool,
    pub toread: bool,
}

#[derive(Clone, Debug)]
pub struct StoredNote {
    pub id: String,
    pub title: String,
    pub text: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug)]
pub struct Store {
    pub token: String,
    pub bookmarks: Vec<StoredBookmark>,
    pub notes: Vec<StoredNote>,
    pub update_time: DateTime<Utc>,
}

impl Store {
    /// An empty bookmark store with two seeded notes.
    pub fn new(token: &str) -> Self {
        Self {
            token: token.to_string(),
            bookmarks: Vec::new(),
            notes: vec![
                StoredNote {
                    id: "364bd4c30a2b9654d0e1".to_string(),
                    title: "shopping list".to_string(),
                    text: "eggs, milk, bread, tea".to_string(),
                    created_at: "2015-04-20 13:51:58".to_string(),
                    updated_at: "2015-04-21 08:12:03".to_string(),
                },
                StoredNote {
                    id: "364bd9876a2b96543453".to_string(),
                    title: "coding notes".to_string(),
                    text: "borrow checker is always right".to_string(),
                    created_at: "2015-05-02 19:00:00".to_string(),
                    updated_at: "2015-05-02 19:00:00".to_string(),
                },
            ],
            update_time: Utc::now(),
        }
    }

    fn user(&self) -> &str {
        self.token.split(':').next().unwrap_or_default()
    }

    /// Bookmarks carrying every tag in `tags`, newest first.
    fn tagged(&self, tags: &[String]) -> Vec<&StoredBookmark> {
        let mut matches: Vec<_> = self
            .bookmarks
            .iter()
            .filter(|b| tags.iter().all(|t| b.tags.contains(t)))
            .collect();
        matches.sort_by(|a, b| b.time.cmp(&a.time));
        matches
    }

    fn tag_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for tag in self.bookmarks.iter().flat_map(|b| &b.tags) {
            *counts.entry(tag.clone()).or_insert(0) += 1;
        }
        counts
    }
}

pub type Db = Arc<RwLock<Store>>;

type Params = HashMap<String, String>;
type Rejection = (StatusCode, &'static str);
type ApiResult<T = Value> = Result<Json<T>, Rejection>;

#[derive(Serialize, Deserialize, Debug)]
pub struct PostJson {
    pub href: String,
    pub description: String,
    pub extended: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<String>,
    pub hash: String,
    pub time: String,
    pub shared: String,
    pub toread: String,
    pub tags: String,
}

impl PostJson {
    fn new(b: &StoredBookmark, meta: bool) -> Self {
        Self {
            href: b.href.clone(),
            description: b.description.clone(),
            extended: b.extended.clone(),
            meta: meta.then(|| {
                let tags = b.tags.join(" ");
                digest(&[b.href.as_str(), b.description.as_str(), b.extended.as_str(), tags.as_str()])
            }),
            hash: digest(&[b.href.as_str()]),
            time: rfc3339(&b.time),
            shared: yes_no(b.shared).to_string(),
            toread: yes_no(b.toread).to_string(),
            tags: b.tags.join(" "),
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct PostsJson {
    pub date: String,
    pub user: String,
    pub posts: Vec<PostJson>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct DatesJson {
    pub user: String,
    pub tag: String,
    pub dates: BTreeMap<String, String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct NoteSummaryJson {
    pub id: String,
    pub hash: String,
    pub title: String,
    pub length: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct NotesJson {
    pub count: usize,
    pub notes: Vec<NoteSummaryJson>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct NoteJson {
    pub id: String,
    pub hash: String,
    pub title: String,
    pub length: usize,
    pub text: String,
    pub created_at: String,
    pub updated_at: String,
}

pub fn app(token: &str) -> Router {
    let db: Db = Arc::new(RwLock::new(Store::new(token)));
    Router::new()
        .route("/user/api_token/", get(api_token))
        .route("/posts/update/", get(posts_update))
        .route("/posts/add/", get(posts_add))
        .route("/posts/delete/", get(posts_delete))
        .route("/posts/get/", get(posts_get))
        .route("/posts/recent/", get(posts_recent))
        .route("/posts/dates/", get(posts_dates))
        .route("/posts/all/", get(posts_all))
        .route("/posts/suggest/", get(posts_suggest))
        .route("/tags/get/", get(tags_get))
        .route("/tags/delete/", get(tags_delete))
        .route("/tags/rename/", get(tags_rename))
        .route("/notes/list/", get(notes_list))
        .route("/notes/{id}/", get(note_by_id))
        .with_state(db)
}

pub async fn run(listener: TcpListener, token: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app(token)).await
}

fn authorize(store: &Store, q: &Params) -> Result<(), Rejection> {
    if q.get("format").map(String::as_str) != Some("json") {
        return Err((StatusCode::BAD_REQUEST, "format=json required\n"));
    }
    match q.get("auth_token") {
        Some(token) if *token == store.token => Ok(()),
        _ => {
            debug!("rejected request with bad auth_token");
            Err((StatusCode::UNAUTHORIZED, "401 Forbidden\n"))
        }
    }
}

fn result_code(code: &str) -> ApiResult {
    Ok(Json(json!({ "result_code": code })))
}

fn result(code: &str) -> ApiResult {
    Ok(Json(json!({ "result": code })))
}

fn tag_param(q: &Params, key: &str) -> Vec<String> {
    q.get(key)
        .map(|raw| {
            raw.split([',', ' '])
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn time_param(q: &Params, key: &str) -> Option<DateTime<Utc>> {
    q.get(key)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|t| t.with_timezone(&Utc))
}

fn rfc3339(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn yes_no(b: bool) -> &'static str {
    if b {
        "yes"
    } else {
        "no"
    }
}

fn digest(parts: &[&str]) -> String {
    let mut hasher = DefaultHasher::new();
    parts.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

async fn api_token(State(db): State<Db>, Query(q): Query<Params>) -> ApiResult {
    let store = db.read().await;
    authorize(&store, &q)?;
    let secret = store.token.split_once(':').map(|(_, s)| s).unwrap_or_default();
    result(secret)
}

async fn posts_update(State(db): State<Db>, Query(q): Query<Params>) -> ApiResult {
    let store = db.read().await;
    authorize(&store, &q)?;
    Ok(Json(json!({ "update_time": rfc3339(&store.update_time) })))
}

async fn posts_add(State(db): State<Db>, Query(q): Query<Params>) -> ApiResult {
    let mut store = db.write().await;
    authorize(&store, &q)?;
    let Some(href) = q.get("url").filter(|u| !u.is_empty()) else {
        return result_code("missing url");
    };
    let Some(description) = q.get("description").filter(|d| !d.is_empty()) else {
        return result_code("missing description");
    };
    let existing = store.bookmarks.iter().position(|b| b.href == *href);
    if existing.is_some() && q.get("replace").map(String::as_str) == Some("no") {
        return result_code("item already exists");
    }
    let bookmark = StoredBookmark {
        href: href.clone(),
        description: description.clone(),
        extended: q.get("extended").cloned().unwrap_or_default(),
        tags: tag_param(&q, "tags"),
        time: time_param(&q, "dt").unwrap_or_else(Utc::now),
        shared: q.get("shared").map(String::as_str) != Some("no"),
        toread: q.get("toread").map(String::as_str) == Some("yes"),
    };
    match existing {
        Some(i) => store.bookmarks[i] = bookmark,
        None => store.bookmarks.push(bookmark),
    }
    store.update_time = Utc::now();
    result_code("done")
}

async fn posts_delete(State(db): State<Db>, Query(q): Query<Params>) -> ApiResult {
    let mut store = db.write().await;
    authorize(&store, &q)?;
    let url = q.get("url").cloned().unwrap_or_default();
    let before = store.bookmarks.len();
    store.bookmarks.retain(|b| b.href != url);
    if store.bookmarks.len() == before {
        return result_code("item not found");
    }
    store.update_time = Utc::now();
    result_code("done")
}

async fn posts_get(State(db): State<Db>, Query(q): Query<Params>) -> ApiResult<PostsJson> {
    let store = db.read().await;
    authorize(&store, &q)?;
    let tags = tag_param(&q, "tag");
    let meta = q.get("meta").map(String::as_str) == Some("yes");
    let url = q.get("url").filter(|u| !u.is_empty());
    let tagged = store.tagged(&tags);

    // With neither url nor dt, the day of the newest bookmark is used.
    let day = time_param(&q, "dt")
        .or_else(|| url.is_none().then(|| tagged.first().map(|b| b.time)).flatten())
        .map(|t| t.date_naive());

    let posts = tagged
        .into_iter()
        .filter(|b| url.map_or(true, |u| b.href == *u))
        .filter(|b| day.map_or(true, |d| b.time.date_naive() == d))
        .map(|b| PostJson::new(b, meta))
        .collect();
    let date = day
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| rfc3339(&d.and_utc()))
        .unwrap_or_else(|| rfc3339(&store.update_time));
    Ok(Json(PostsJson {
        date,
        user: store.user().to_string(),
        posts,
    }))
}

async fn posts_recent(State(db): State<Db>, Query(q): Query<Params>) -> ApiResult<PostsJson> {
    let store = db.read().await;
    authorize(&store, &q)?;
    let count = q
        .get("count")
        .and_then(|c| c.parse().ok())
        .unwrap_or(RECENT_DEFAULT)
        .min(RECENT_MAX);
    let posts: Vec<PostJson> = store
        .tagged(&tag_param(&q, "tag"))
        .into_iter()
        .take(count)
        .map(|b| PostJson::new(b, false))
        .collect();
    Ok(Json(PostsJson {
        date: rfc3339(&store.update_time),
        user: store.user().to_string(),
        posts,
    }))
}

async fn posts_dates(State(db): State<Db>, Query(q): Query<Params>) -> ApiResult<DatesJson> {
    let store = db.read().await;
    authorize(&store, &q)?;
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for b in store.tagged(&tag_param(&q, "tag")) {
        *counts.entry(b.time.format("%Y-%m-%d").to_string()).or_insert(0) += 1;
    }
    Ok(Json(DatesJson {
        user: store.user().to_string(),
        tag: q.get("tag").cloned().unwrap_or_default(),
        dates: counts.into_iter().map(|(d, c)| (d, c.to_string())).collect(),
    }))
}

async fn posts_all(State(db): State<Db>, Query(q): Query<Params>) -> ApiResult<Vec<PostJson>> {
    let store = db.read().await;
    authorize(&store, &q)?;
    let offset: usize = q.get("start").and_then(|s| s.parse().ok()).unwrap_or(0);
    let results: usize = q
        .get("results")
        .and_then(|s| s.parse().ok())
        .unwrap_or(usize::MAX);
    let from = time_param(&q, "fromdt");
    let to = time_param(&q, "todt");
    let meta = q.get("meta").map(String::as_str) == Some("yes");
    let posts: Vec<PostJson> = store
        .tagged(&tag_param(&q, "tag"))
        .into_iter()
        .filter(|b| from.map_or(true, |f| b.time >= f))
        .filter(|b| to.map_or(true, |t| b.time <= t))
        .skip(offset)
        .take(results)
        .map(|b| PostJson::new(b, meta))
        .collect();
    Ok(Json(posts))
}

async fn posts_suggest(State(db): State<Db>, Query(q): Query<Params>) -> ApiResult {
    let store = db.read().await;
    authorize(&store, &q)?;
    let url = q.get("url").cloned().unwrap_or_default();
    let popular: Vec<String> = store
        .bookmarks
        .iter()
        .find(|b| b.href == url)
        .map(|b| b.tags.clone())
        .unwrap_or_default();
    let mut recommended: Vec<(String, usize)> = store.tag_counts().into_iter().collect();
    recommended.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    let recommended: Vec<String> = recommended.into_iter().map(|(t, _)| t).collect();
    Ok(Json(json!([{ "popular": popular }, { "recommended": recommended }])))
}

async fn tags_get(
    State(db): State<Db>,
    Query(q): Query<Params>,
) -> ApiResult<BTreeMap<String, String>> {
    let store = db.read().await;
    authorize(&store, &q)?;
    let counts: BTreeMap<String, String> = store
        .tag_counts()
        .into_iter()
        .map(|(t, c)| (t, c.to_string()))
        .collect();
    Ok(Json(counts))
}

async fn tags_delete(State(db): State<Db>, Query(q): Query<Params>) -> ApiResult {
    let mut store = db.write().await;
    authorize(&store, &q)?;
    let tag = q.get("tag").cloned().unwrap_or_default();
    let mut found = false;
    for b in &mut store.bookmarks {
        let before = b.tags.len();
        b.tags.retain(|t| *t != tag);
        found |= b.tags.len() != before;
    }
    if !found {
        return result("item not found");
    }
    store.update_time = Utc::now();
    result("done")
}

/// Match on `old` ignores case; renaming onto an existing tag folds the two.
async fn tags_rename(State(db): State<Db>, Query(q): Query<Params>) -> ApiResult {
    let mut store = db.write().await;
    authorize(&store, &q)?;
    let old = q.get("old").cloned().unwrap_or_default().to_lowercase();
    let new = q.get("new").cloned().unwrap_or_default();
    if new.is_empty() {
        return result("rename to empty tag not allowed");
    }
    let mut found = false;
    for b in &mut store.bookmarks {
        if !b.tags.iter().any(|t| t.to_lowercase() == old) {
            continue;
        }
        found = true;
        b.tags.retain(|t| t.to_lowercase() != old && *t != new);
        b.tags.push(new.clone());
    }
    if !found {
        return result("item not found");
    }
    store.update_time = Utc::now();
    result("done")
}

async fn notes_list(State(db): State<Db>, Query(q): Query<Params>) -> ApiResult<NotesJson> {
    let store = db.read().await;
    authorize(&store, &q)?;
    let notes: Vec<NoteSummaryJson> = store
        .notes
        .iter()
        .map(|n| NoteSummaryJson {
            id: n.id.clone(),
            hash: digest(&[n.text.as_str()]),
            title: n.title.clone(),
            length: n.text.len().to_string(),
            created_at: n.created_at.clone(),
            updated_at: n.updated_at.clone(),
        })
        .collect();
    Ok(Json(NotesJson {
        count: notes.len(),
        notes,
    }))
}

async fn note_by_id(
    State(db): State<Db>,
    Path(id): Path<String>,
    Query(q): Query<Params>,
) -> ApiResult<NoteJson> {
    let store = db.read().await;
    authorize(&store, &q)?;
    let note = store
        .notes
        .iter()
        .find(|n| n.id == id)
        .ok_or((StatusCode::NOT_FOUND, "note not found\n"))?;
    Ok(Json(NoteJson {
        id: note.id.clone(),
        hash: digest(&[note.text.as_str()]),
        title: note.title.clone(),
        length: note.text.len(),
        text: note.text.clone(),
        created_at: note.created_at.clone(),
        updated_at: note.updated_at.clone(),
    }))
}
