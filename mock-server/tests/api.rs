use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, DatesJson, NoteJson, NotesJson, PostJson, PostsJson};
use tower::{Service, ServiceExt};

const TOKEN: &str = "mango:1234";
const AUTH: &str = "auth_token=mango%3A1234&format=json";

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

fn authed(path: &str, query: &str) -> Request<String> {
    if query.is_empty() {
        get(&format!("{path}?{AUTH}"))
    } else {
        get(&format!("{path}?{query}&{AUTH}"))
    }
}

// --- auth ---

#[tokio::test]
async fn wrong_token_returns_401() {
    let resp = app(TOKEN)
        .oneshot(get("/posts/update/?auth_token=mango%3Awrong&format=json"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn missing_format_returns_400() {
    let resp = app(TOKEN)
        .oneshot(get("/tags/get/?auth_token=mango%3A1234"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn api_token_echoes_secret() {
    let resp = app(TOKEN).oneshot(authed("/user/api_token/", "")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["result"], "1234");
}

// --- notes ---

#[tokio::test]
async fn notes_list_reports_count_and_string_lengths() {
    let resp = app(TOKEN).oneshot(authed("/notes/list/", "")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let notes: NotesJson = body_json(resp).await;
    assert_eq!(notes.count, 2);
    assert_eq!(notes.notes.len(), 2);
    assert_eq!(notes.notes[0].length, "22");
}

#[tokio::test]
async fn note_by_id_returns_text() {
    let resp = app(TOKEN)
        .oneshot(authed("/notes/364bd4c30a2b9654d0e1/", ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let note: NoteJson = body_json(resp).await;
    assert_eq!(note.title, "shopping list");
    assert_eq!(note.length, note.text.len());
}

#[tokio::test]
async fn unknown_note_returns_404() {
    let resp = app(TOKEN).oneshot(authed("/notes/nope/", "")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- posts ---

#[tokio::test]
async fn suggest_without_bookmarks_has_two_empty_elements() {
    let resp = app(TOKEN)
        .oneshot(authed("/posts/suggest/", "url=https%3A%2F%2Fa.com"))
        .await
        .unwrap();
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body, serde_json::json!([{ "popular": [] }, { "recommended": [] }]));
}

#[tokio::test]
async fn add_requires_url() {
    let resp = app(TOKEN)
        .oneshot(authed("/posts/add/", "description=x"))
        .await
        .unwrap();
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["result_code"], "missing url");
}

// --- full lifecycle ---

#[tokio::test]
async fn bookmark_lifecycle() {
    let mut app = app(TOKEN).into_service();

    // add two bookmarks on different days
    for query in [
        "url=https%3A%2F%2Ffoo.com&description=Foo&tags=rust%2Cweb&dt=2015-07-01T12%3A37%3A35Z&replace=no&shared=no&toread=yes",
        "url=https%3A%2F%2Fbar.com&description=Bar&tags=rust&dt=2015-07-02T08%3A00%3A00Z&replace=no&shared=yes&toread=no",
    ] {
        let resp = ServiceExt::ready(&mut app)
            .await
            .unwrap()
            .call(authed("/posts/add/", query))
            .await
            .unwrap();
        let body: serde_json::Value = body_json(resp).await;
        assert_eq!(body["result_code"], "done");
    }

    // adding again without replace is refused
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(authed("/posts/add/", "url=https%3A%2F%2Ffoo.com&description=Foo&replace=no"))
        .await
        .unwrap();
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["result_code"], "item already exists");

    // get defaults to the newest day
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(authed("/posts/get/", "meta=yes"))
        .await
        .unwrap();
    let posts: PostsJson = body_json(resp).await;
    assert_eq!(posts.user, "mango");
    assert_eq!(posts.posts.len(), 1);
    assert_eq!(posts.posts[0].href, "https://bar.com");
    assert!(posts.posts[0].meta.is_some());

    // all, filtered by tag, newest first
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(authed("/posts/all/", "tag=rust"))
        .await
        .unwrap();
    let all: Vec<PostJson> = body_json(resp).await;
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].href, "https://bar.com");
    assert_eq!(all[1].tags, "rust web");

    // dates
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(authed("/posts/dates/", ""))
        .await
        .unwrap();
    let dates: DatesJson = body_json(resp).await;
    assert_eq!(dates.user, "mango");
    assert_eq!(dates.dates["2015-07-01"], "1");
    assert_eq!(dates.dates["2015-07-02"], "1");

    // rename folds case-insensitively
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(authed("/tags/rename/", "old=RUST&new=rustlang"))
        .await
        .unwrap();
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["result"], "done");

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(authed("/tags/get/", ""))
        .await
        .unwrap();
    let tags: serde_json::Value = body_json(resp).await;
    assert_eq!(tags, serde_json::json!({ "rustlang": "2", "web": "1" }));

    // delete
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(authed("/posts/delete/", "url=https%3A%2F%2Ffoo.com"))
        .await
        .unwrap();
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["result_code"], "done");

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(authed("/posts/delete/", "url=https%3A%2F%2Ffoo.com"))
        .await
        .unwrap();
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["result_code"], "item not found");
}
