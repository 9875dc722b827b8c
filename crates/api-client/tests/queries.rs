//! Cached reads: de-duplication, gating, retry and failure handling

mod common;

use common::{book_json, ok, queries_for};
use libris_api_client::keys;
use libris_api_client::models::Book;
use libris_api_client::QueryState;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_concurrent_reads_share_one_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/books/7"))
        .respond_with(ok(book_json(7, "Kindred", 2)).set_delay(Duration::from_millis(200)))
        .expect(1)
        .mount(&server)
        .await;

    let queries = queries_for(&server);
    let books = queries.books();

    let (a, b) = tokio::join!(books.detail(Some(7)), books.detail(Some(7)));
    assert_eq!(a.data().map(|b| b.id), Some(7));
    assert_eq!(b.data().map(|b| b.id), Some(7));

    // Fresh value, served without I/O
    assert!(books.detail(Some(7)).await.is_ready());
}

#[tokio::test]
async fn test_peek_reports_loading_while_in_flight() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/books/7"))
        .respond_with(ok(book_json(7, "Kindred", 2)).set_delay(Duration::from_millis(300)))
        .mount(&server)
        .await;

    let queries = queries_for(&server);
    let key = keys::books::detail(7);
    assert!(queries.peek::<Book>(&key).is_not_requested());

    let background = queries.clone();
    let handle = tokio::spawn(async move { background.books().detail(Some(7)).await });

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(queries.peek::<Book>(&key).is_loading());

    assert!(handle.await.unwrap().is_ready());
    assert!(queries.peek::<Book>(&key).is_ready());
}

#[tokio::test]
async fn test_abandoned_read_still_lands_in_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/books/7"))
        .respond_with(ok(book_json(7, "Kindred", 2)).set_delay(Duration::from_millis(200)))
        .expect(1)
        .mount(&server)
        .await;

    let queries = queries_for(&server);
    let key = keys::books::detail(7);

    let gave_up = tokio::time::timeout(Duration::from_millis(50), queries.books().detail(Some(7))).await;
    assert!(gave_up.is_err());
    assert!(queries.peek::<Book>(&key).is_loading());

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(queries.peek::<Book>(&key).is_ready());
    assert!(queries.books().detail(Some(7)).await.is_ready());
}

#[tokio::test]
async fn test_disabled_reads_issue_no_request() {
    let server = MockServer::start().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ok(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let queries = queries_for(&server);
    assert!(queries.books().detail(None).await.is_not_requested());
    assert!(queries.members().detail(Some(0)).await.is_not_requested());
    assert!(queries.members().search("   ").await.is_not_requested());
    assert!(queries.authors().by_nationality("").await.is_not_requested());
    assert!(queries.borrowed_books().due_within(0).await.is_not_requested());
    assert!(queries.borrowed_books().by_status(None).await.is_not_requested());
    assert!(queries.borrowed_books().search(None).await.is_not_requested());
    assert!(queries
        .borrowed_books()
        .by_date_range(chrono::NaiveDate::from_ymd_opt(2024, 1, 1), None)
        .await
        .is_not_requested());
    assert!(queries.cache().is_empty());
}

#[tokio::test]
async fn test_server_error_retried_three_times() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/books/available"))
        .respond_with(ResponseTemplate::new(500))
        .expect(4)
        .mount(&server)
        .await;

    let queries = queries_for(&server);
    let state = queries.books().available().await;
    assert_eq!(state.error().and_then(|e| e.status()), Some(500));

    // A failed fetch stores nothing
    assert!(!queries.cache().contains(&keys::books::available()));
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/members/404"))
        .respond_with(common::failure(404, "Member not found"))
        .expect(1)
        .mount(&server)
        .await;

    let state = queries_for(&server).members().detail(Some(404)).await;
    assert!(state.error().is_some_and(|e| e.is_not_found()));
}

#[tokio::test]
async fn test_throttling_retried_twice() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/borrowed-books/stats"))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&server)
        .await;

    let state = queries_for(&server).borrowed_books().statistics().await;
    assert_eq!(state.error().and_then(|e| e.status()), Some(429));
}

#[tokio::test]
async fn test_transient_failure_recovers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/books/categories"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/books/categories"))
        .respond_with(ok(json!(["Fiction", "History"])))
        .expect(1)
        .mount(&server)
        .await;

    let state = queries_for(&server).books().categories().await;
    assert_eq!(
        state.into_data(),
        Some(vec!["Fiction".to_string(), "History".to_string()])
    );
}

#[tokio::test]
async fn test_stale_value_is_refetched() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/authors"))
        .respond_with(ok(json!([common::author_json(1, "Ursula K. Le Guin")])))
        .expect(2)
        .mount(&server)
        .await;

    let queries = queries_for(&server);
    assert!(queries.authors().all().await.is_ready());
    assert!(queries.authors().all().await.is_ready());

    queries.invalidate(&keys::authors::all());
    let state = queries.authors().all().await;
    assert_eq!(state.data().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_prefetch_warms_detail() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/members/3"))
        .respond_with(ok(common::member_json(3, "Ada")))
        .expect(1)
        .mount(&server)
        .await;

    let queries = queries_for(&server);
    assert!(queries.members().prefetch(3).await);
    match queries.members().detail(Some(3)).await {
        QueryState::Ready(member) => assert_eq!(member.name, "Ada"),
        other => panic!("expected cached member, got {other:?}"),
    }
}
