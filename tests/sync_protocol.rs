use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use futures::future::join_all;
use notesync::db::{self, users};
use notesync::operations::{create_book, create_note, delete_book, update_note, NoteUpdate};
use notesync::server::{router, AppState};
use notesync::sync::{pull_changes, LocalSource, SyncCursor, SyncMode};
use notesync::User;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::ServiceExt;

struct TestServer {
    app: Router,
    pool: SqlitePool,
    _temp_dir: TempDir,
}

async fn setup() -> TestServer {
    let temp_dir = TempDir::new().unwrap();
    let pool = db::init_db(&temp_dir.path().join("server.db"))
        .await
        .unwrap();

    TestServer {
        app: router(AppState::new(pool.clone())),
        pool,
        _temp_dir: temp_dir,
    }
}

async fn add_user(pool: &SqlitePool, email: &str) -> User {
    let mut conn = pool.acquire().await.unwrap();
    users::create_user(&mut conn, email, &format!("key-{}", email))
        .await
        .unwrap()
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    api_key: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(key) = api_key {
        builder = builder.header("authorization", format!("Bearer {}", key));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, value)
}

#[tokio::test]
async fn test_health_needs_no_auth() {
    let server = setup().await;

    let (status, body) = send(&server.app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_sync_routes_require_bearer_key() {
    let server = setup().await;
    add_user(&server.pool, "alice@example.com").await;

    let (status, body) = send(&server.app, "GET", "/v3/sync/state", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "missing_auth");

    let (status, body) = send(&server.app, "GET", "/v3/sync/state", Some("nope"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_key");

    let (status, _) = send(
        &server.app,
        "GET",
        "/v3/sync/state",
        Some("key-alice@example.com"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_create_update_delete_then_fragment() {
    let server = setup().await;
    add_user(&server.pool, "alice@example.com").await;
    let key = Some("key-alice@example.com");
    let app = &server.app;

    let (status, body) = send(app, "POST", "/v3/books", key, Some(json!({"name": "B1"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["result"]["usn"], 1);
    let book_uuid = body["result"]["uuid"].as_str().unwrap().to_string();

    let (status, body) = send(
        app,
        "POST",
        "/v3/notes",
        key,
        Some(json!({"book_uuid": book_uuid, "content": "hello"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["result"]["usn"], 2);
    let note_uuid = body["result"]["uuid"].as_str().unwrap().to_string();
    let note_path = format!("/v3/notes/{}", note_uuid);

    let (status, body) = send(
        app,
        "PATCH",
        &note_path,
        key,
        Some(json!({"content": "hello world"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["usn"], 3);
    assert_eq!(body["result"]["content"], "hello world");

    let (status, body) = send(app, "DELETE", &note_path, key, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["usn"], 4);
    assert_eq!(body["result"]["deleted"], true);
    assert_eq!(body["result"]["content"], "");

    let (status, state) = send(app, "GET", "/v3/sync/state", key, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state["max_usn"], 4);
    assert_eq!(state["full_sync_before"], 1_577_836_800);

    let (status, fragment) = send(
        app,
        "GET",
        "/v3/sync/fragment?after_usn=0&limit=100",
        key,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fragment["frag_max_usn"], 4);
    assert_eq!(fragment["user_max_usn"], 4);
    assert_eq!(fragment["books"].as_array().unwrap().len(), 1);
    assert_eq!(fragment["books"][0]["uuid"], book_uuid);
    assert_eq!(fragment["books"][0]["usn"], 1);
    assert_eq!(fragment["notes"], json!([]));
    assert_eq!(fragment["expunged_notes"], json!([note_uuid]));
    assert_eq!(fragment["expunged_books"], json!([]));
}

#[tokio::test]
async fn test_fragment_query_validation() {
    let server = setup().await;
    add_user(&server.pool, "alice@example.com").await;
    let key = Some("key-alice@example.com");

    for uri in [
        "/v3/sync/fragment?limit=101",
        "/v3/sync/fragment?limit=0",
        "/v3/sync/fragment?after_usn=-1",
        "/v3/sync/fragment?after_usn=abc",
    ] {
        let (status, body) = send(&server.app, "GET", uri, key, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["error"], "validation_error");
    }

    let (status, body) = send(&server.app, "GET", "/v3/sync/fragment", key, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["frag_max_usn"], 0);
}

#[tokio::test]
async fn test_other_users_note_is_not_found() {
    let server = setup().await;
    let alice = add_user(&server.pool, "alice@example.com").await;
    let bob = add_user(&server.pool, "bob@example.com").await;

    let mut tx = server.pool.begin().await.unwrap();
    let book = create_book(&mut tx, &alice, "js").await.unwrap();
    let note = create_note(&mut tx, &alice, book.uuid, "secret", None, None)
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let path = format!("/v3/notes/{}", note.uuid);
    let bob_key = Some("key-bob@example.com");

    let (status, body) = send(&server.app, "GET", &path, bob_key, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, _) = send(
        &server.app,
        "PATCH",
        &path,
        bob_key,
        Some(json!({"content": "mine now"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&server.app, "DELETE", &path, bob_key, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Neither counter moved
    let mut conn = server.pool.acquire().await.unwrap();
    assert_eq!(users::max_usn(&mut conn, alice.id).await.unwrap(), 2);
    assert_eq!(users::max_usn(&mut conn, bob.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_rejected_mutations_consume_no_usn() {
    let server = setup().await;
    let user = add_user(&server.pool, "alice@example.com").await;
    let key = Some("key-alice@example.com");
    let app = &server.app;

    let missing_book = uuid::Uuid::new_v4();
    let (status, _) = send(
        app,
        "POST",
        "/v3/notes",
        key,
        Some(json!({"book_uuid": missing_book, "content": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(app, "POST", "/v3/books", key, Some(json!({"name": "js"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(app, "POST", "/v3/books", key, Some(json!({"name": "js"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, state) = send(app, "GET", "/v3/sync/state", key, None).await;
    assert_eq!(state["max_usn"], 1);

    let mut conn = server.pool.acquire().await.unwrap();
    assert_eq!(users::max_usn(&mut conn, user.id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_deleted_book_restore_needs_name() {
    let server = setup().await;
    add_user(&server.pool, "alice@example.com").await;
    let key = Some("key-alice@example.com");
    let app = &server.app;

    let (_, body) = send(app, "POST", "/v3/books", key, Some(json!({"name": "go"}))).await;
    let path = format!("/v3/books/{}", body["result"]["uuid"].as_str().unwrap());

    let (status, body) = send(app, "DELETE", &path, key, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["usn"], 2);

    let (status, body) = send(app, "PATCH", &path, key, Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, body) = send(app, "PATCH", &path, key, Some(json!({"name": "golang"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["label"], "golang");
    assert_eq!(body["result"]["deleted"], false);
    assert_eq!(body["result"]["usn"], 3);
}

#[tokio::test]
async fn test_book_errors() {
    let server = setup().await;
    add_user(&server.pool, "alice@example.com").await;
    let key = Some("key-alice@example.com");
    let app = &server.app;

    let (status, _) = send(app, "POST", "/v3/books", key, Some(json!({"name": "js"}))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(app, "POST", "/v3/books", key, Some(json!({"name": "js"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    let (status, _) = send(app, "POST", "/v3/books", key, Some(json!({"name": "  "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(app, "POST", "/v3/books", key, Some(json!({"label": "x"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(app, "DELETE", "/v3/books/not-a-uuid", key, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let missing = format!("/v3/books/{}", uuid::Uuid::new_v4());
    let (status, _) = send(app, "DELETE", &missing, key, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, books) = send(app, "GET", "/v3/books", key, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(books.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_concurrent_creates_get_contiguous_usns() {
    let server = setup().await;
    let user = add_user(&server.pool, "alice@example.com").await;

    let mut tx = server.pool.begin().await.unwrap();
    let book_uuid = create_book(&mut tx, &user, "js").await.unwrap().uuid;
    tx.commit().await.unwrap();

    const WRITERS: i64 = 20;

    let tasks = (0..WRITERS).map(|i| {
        let pool = server.pool.clone();
        let user = user.clone();
        tokio::spawn(async move {
            let mut tx = pool.begin().await.unwrap();
            let note = create_note(&mut tx, &user, book_uuid, &format!("n{}", i), None, None)
                .await
                .unwrap();
            tx.commit().await.unwrap();
            note.usn
        })
    });

    let mut usns: Vec<i64> = join_all(tasks)
        .await
        .into_iter()
        .map(|result| result.unwrap())
        .collect();
    usns.sort_unstable();

    let expected: Vec<i64> = (2..=WRITERS + 1).collect();
    assert_eq!(usns, expected);

    let mut conn = server.pool.acquire().await.unwrap();
    assert_eq!(users::max_usn(&mut conn, user.id).await.unwrap(), WRITERS + 1);
}

#[tokio::test]
async fn test_every_mutation_takes_the_next_usn() {
    let server = setup().await;
    let user = add_user(&server.pool, "alice@example.com").await;
    let mut tx = server.pool.begin().await.unwrap();

    let mut usns = Vec::new();
    let book = create_book(&mut tx, &user, "js").await.unwrap();
    usns.push(book.usn);

    let mut notes = Vec::new();
    for i in 0..5 {
        let note = create_note(&mut tx, &user, book.uuid, &format!("n{}", i), None, None)
            .await
            .unwrap();
        usns.push(note.usn);
        notes.push(note);
    }
    for note in &notes[..2] {
        let params = NoteUpdate {
            public: Some(true),
            ..Default::default()
        };
        usns.push(update_note(&mut tx, &user, note, &params).await.unwrap().usn);
    }
    let deleted = delete_book(&mut tx, &user, &book).await.unwrap();
    usns.push(deleted.usn);

    // 1 book + 5 notes + 2 updates + 5 cascaded note deletes + 1 book delete
    let total = users::max_usn(&mut tx, user.id).await.unwrap();
    assert_eq!(total, 14);
    assert_eq!(deleted.usn, 14);

    let fragment = notesync::pull_fragment(
        &mut tx,
        user.id,
        notesync::FragmentParams::new(0, 100).unwrap(),
    )
    .await
    .unwrap();
    assert_eq!(fragment.frag_max_usn, 14);
    assert_eq!(fragment.expunged_notes.len(), 5);
    assert_eq!(fragment.expunged_books, vec![book.uuid]);

    usns.sort_unstable();
    usns.dedup();
    assert_eq!(usns.len(), 9);
}

#[tokio::test]
async fn test_pull_loop_reconstructs_live_state() {
    let server = setup().await;
    let user = add_user(&server.pool, "alice@example.com").await;
    let mut tx = server.pool.begin().await.unwrap();

    let kept = create_book(&mut tx, &user, "kept").await.unwrap();
    let gone = create_book(&mut tx, &user, "gone").await.unwrap();
    for i in 0..7 {
        create_note(&mut tx, &user, kept.uuid, &format!("k{}", i), None, None)
            .await
            .unwrap();
    }
    for i in 0..3 {
        create_note(&mut tx, &user, gone.uuid, &format!("g{}", i), None, None)
            .await
            .unwrap();
    }
    delete_book(&mut tx, &user, &gone).await.unwrap();
    tx.commit().await.unwrap();

    let source = LocalSource::new(server.pool.clone(), user.id);
    let outcome = pull_changes(&source, &SyncCursor::default(), 4).await.unwrap();

    assert_eq!(outcome.mode, SyncMode::Full);
    assert_eq!(outcome.cursor.max_usn, 16);
    assert_eq!(outcome.books.len(), 1);
    assert!(outcome.books.contains_key(&kept.uuid));
    assert_eq!(outcome.notes.len(), 7);
    assert_eq!(outcome.expunged_notes.len(), 3);
    assert!(outcome.expunged_books.contains(&gone.uuid));

    // A second cycle from the saved cursor has nothing new
    let again = pull_changes(&source, &outcome.cursor, 4).await.unwrap();
    assert_eq!(again.mode, SyncMode::Incremental);
    assert_eq!(again.fragments, 1);
    assert_eq!(again.change_count(), 0);
    assert_eq!(again.cursor.max_usn, 16);
}
