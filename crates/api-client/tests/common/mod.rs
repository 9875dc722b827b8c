//! Shared helpers for HTTP-level tests

#![allow(dead_code)]

use libris_api_client::{ClientConfig, LibraryClient, QueryClient};
use libris_core::cache::QueryConfig;
use libris_core::retry::RetryPolicy;
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::{MockServer, ResponseTemplate};

/// Client pointed at the mock server's `/api`
pub fn client_for(server: &MockServer) -> LibraryClient {
    let config = ClientConfig::default()
        .with_base_url(format!("{}/api", server.uri()))
        .with_timeout(Duration::from_secs(2));
    LibraryClient::with_config(config).expect("valid test config")
}

/// Query client with millisecond retry delays
pub fn queries_for(server: &MockServer) -> QueryClient {
    let config = QueryConfig::default()
        .with_reads(RetryPolicy::reads().quick())
        .with_writes(RetryPolicy::writes().quick());
    QueryClient::new(client_for(server), config)
}

/// 200 with a successful envelope around `data`
pub fn ok(data: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "success": true, "data": data }))
}

/// Error response with an envelope message
pub fn failure(status: u16, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(json!({ "success": false, "message": message }))
}

pub fn book_json(id: i64, title: &str, available: u32) -> Value {
    json!({
        "id": id,
        "title": title,
        "category": "Fiction",
        "publishingYear": 1979,
        "totalCopies": 3,
        "availableCopies": available,
        "authorId": 5,
        "authorName": "Octavia E. Butler"
    })
}

pub fn author_json(id: i64, name: &str) -> Value {
    json!({ "id": id, "name": name, "nationality": "American" })
}

pub fn member_json(id: i64, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "email": format!("{}@example.org", name.to_lowercase()),
        "membershipStatus": "ACTIVE"
    })
}

pub fn borrowed_json(id: i64, book_id: i64, member_id: i64) -> Value {
    json!({
        "id": id,
        "bookId": book_id,
        "memberId": member_id,
        "bookTitle": "Kindred",
        "borrowDate": "2024-03-01",
        "dueDate": "2024-03-15",
        "status": "BORROWED",
        "fineAmount": 0.0
    })
}
