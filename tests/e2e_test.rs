use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::{Request, StatusCode};
use library_loans::api::handlers::AppState;
use library_loans::api::router::create_router;
use library_loans::api::types::*;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

mod common;

// ============================================================================
// E2Eテスト用のヘルパー関数
// ============================================================================

/// E2Eテスト用のアプリケーションセットアップ
///
/// インメモリストアと実際のAPIルーターを使用します。
fn setup_e2e_app() -> Router {
    let (_store, service_deps) = common::setup_memory();
    create_router(Arc::new(AppState { service_deps }))
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Bytes) {
    send(
        app,
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
    )
    .await
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Bytes) {
    send(
        app,
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Bytes) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body)
}

fn parse<T: DeserializeOwned>(body: &[u8]) -> T {
    serde_json::from_slice(body).unwrap()
}

async fn create_book(app: &Router, title: &str) -> BookResponse {
    let (status, body) = post_json(
        app,
        "/books",
        json!({ "title": title, "author": "Frank Herbert" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    parse(&body)
}

async fn create_borrower(app: &Router, name: &str, is_active: bool) -> BorrowerResponse {
    let (status, body) = post_json(
        app,
        "/borrowers",
        json!({ "name": name, "is_active": is_active }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    parse(&body)
}

// ============================================================================
// E2Eテスト: 正常系
// ============================================================================

#[tokio::test]
async fn test_e2e_full_loan_flow() {
    let app = setup_e2e_app();
    let book = create_book(&app, "Dune").await;
    let borrower = create_borrower(&app, "Alice", true).await;

    assert!(book.available);
    assert_eq!(book.borrow_count, 0);

    // Step 1: 貸出（POST /borrow）
    let (status, body) = post_json(
        &app,
        "/borrow",
        json!({ "book_id": book.id, "borrower_id": borrower.id }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    let created: LoanCreatedResponse = parse(&body);
    assert_eq!(created.message, "Book borrowed successfully.");

    // Step 2: 貸中一覧（GET /loans/active/:borrower_id）
    let (status, body) = get(&app, &format!("/loans/active/{}", borrower.id)).await;

    assert_eq!(status, StatusCode::OK);
    let active: ActiveLoansResponse = parse(&body);
    assert_eq!(active.borrowed_books_count, 1);
    assert_eq!(active.borrowed_books[0].id, created.loan_id);
    assert_eq!(active.borrowed_books[0].book_title, "Dune");
    assert_eq!(active.borrowed_books[0].borrowed_by, "Alice");
    assert!(!active.borrowed_books[0].is_returned);

    // 書籍は貸出中
    let (_, body) = get(&app, "/books?available=false").await;
    let unavailable: Vec<BookResponse> = parse(&body);
    assert_eq!(unavailable.len(), 1);
    assert_eq!(unavailable[0].id, book.id);
    assert_eq!(unavailable[0].borrow_count, 1);

    // Step 3: 返却（POST /return）
    let (status, body) = post_json(&app, "/return", json!({ "book_id": book.id })).await;

    assert_eq!(status, StatusCode::OK);
    let returned: BookReturnedResponse = parse(&body);
    assert_eq!(returned.message, "Book returned successfully.");

    // Step 4: 貸出履歴（GET /loans/history/:borrower_id）
    let (status, body) = get(&app, &format!("/loans/history/{}", borrower.id)).await;

    assert_eq!(status, StatusCode::OK);
    let history: Vec<LoanResponse> = parse(&body);
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, created.loan_id);
    assert!(history[0].is_returned);
    assert!(history[0].returned_date.is_some());

    // 返却後は貸中一覧が空
    let (_, body) = get(&app, &format!("/loans/active/{}", borrower.id)).await;
    let active: ActiveLoansResponse = parse(&body);
    assert_eq!(active.borrowed_books_count, 0);
    assert!(active.borrowed_books.is_empty());

    let (_, body) = get(&app, "/books?available=true").await;
    let available: Vec<BookResponse> = parse(&body);
    assert_eq!(available.len(), 1);
    assert!(available[0].available);
}

#[tokio::test]
async fn test_e2e_catalog_listing() {
    let app = setup_e2e_app();
    let first = create_book(&app, "Dune").await;
    let second = create_book(&app, "Emma").await;
    let borrower = create_borrower(&app, "Alice", true).await;
    create_borrower(&app, "Bob", false).await;

    post_json(
        &app,
        "/borrow",
        json!({ "book_id": first.id, "borrower_id": borrower.id }),
    )
    .await;

    let (status, body) = get(&app, "/books").await;
    assert_eq!(status, StatusCode::OK);
    let books: Vec<BookResponse> = parse(&body);
    assert_eq!(books.len(), 2);

    let (_, body) = get(&app, "/books?available=TRUE").await;
    let available: Vec<BookResponse> = parse(&body);
    assert_eq!(available.len(), 1);
    assert_eq!(available[0].id, second.id);

    let (status, body) = get(&app, "/borrowers").await;
    assert_eq!(status, StatusCode::OK);
    let borrowers: Vec<BorrowerResponse> = parse(&body);
    assert_eq!(borrowers.len(), 2);
    assert!(borrowers[0].is_active);
    assert!(!borrowers[1].is_active);
}

#[tokio::test]
async fn test_e2e_borrower_defaults_to_active() {
    let app = setup_e2e_app();

    let (status, body) = post_json(&app, "/borrowers", json!({ "name": "Alice" })).await;

    assert_eq!(status, StatusCode::CREATED);
    let borrower: BorrowerResponse = parse(&body);
    assert!(borrower.is_active);
}

#[tokio::test]
async fn test_e2e_health_check() {
    let app = setup_e2e_app();

    let (status, body) = get(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"OK");
}

// ============================================================================
// E2Eテスト: エラーケース
// ============================================================================

#[tokio::test]
async fn test_e2e_borrow_missing_book_id() {
    let app = setup_e2e_app();
    let borrower = create_borrower(&app, "Alice", true).await;

    let (status, body) = post_json(&app, "/borrow", json!({ "borrower_id": borrower.id })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: ErrorResponse = parse(&body);
    assert_eq!(error.error, "INVALID_REQUEST");
}

#[tokio::test]
async fn test_e2e_malformed_json() {
    let app = setup_e2e_app();

    let (status, body) = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/borrow")
            .header("content-type", "application/json")
            .body(Body::from("{ not json"))
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: ErrorResponse = parse(&body);
    assert_eq!(error.error, "INVALID_REQUEST");
}

#[tokio::test]
async fn test_e2e_borrow_unknown_entities() {
    let app = setup_e2e_app();
    let book = create_book(&app, "Dune").await;
    let borrower = create_borrower(&app, "Alice", true).await;

    let (status, body) = post_json(
        &app,
        "/borrow",
        json!({ "book_id": 999, "borrower_id": borrower.id }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(parse::<ErrorResponse>(&body).error, "BOOK_NOT_FOUND");

    let (status, body) = post_json(
        &app,
        "/borrow",
        json!({ "book_id": book.id, "borrower_id": 999 }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(parse::<ErrorResponse>(&body).error, "BORROWER_NOT_FOUND");
}

#[tokio::test]
async fn test_e2e_borrow_denials() {
    let app = setup_e2e_app();
    let book = create_book(&app, "Dune").await;
    let alice = create_borrower(&app, "Alice", true).await;
    let bob = create_borrower(&app, "Bob", true).await;
    let carol = create_borrower(&app, "Carol", false).await;

    let (status, _) = post_json(
        &app,
        "/borrow",
        json!({ "book_id": book.id, "borrower_id": alice.id }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // 貸出中の書籍
    let (status, body) = post_json(
        &app,
        "/borrow",
        json!({ "book_id": book.id, "borrower_id": bob.id }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(parse::<ErrorResponse>(&body).error, "BOOK_UNAVAILABLE");

    // 無効な利用者
    let other = create_book(&app, "Emma").await;
    let (status, body) = post_json(
        &app,
        "/borrow",
        json!({ "book_id": other.id, "borrower_id": carol.id }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(parse::<ErrorResponse>(&body).error, "BORROWER_INACTIVE");
}

#[tokio::test]
async fn test_e2e_borrow_limit_reached() {
    let app = setup_e2e_app();
    let borrower = create_borrower(&app, "Alice", true).await;
    let mut books = Vec::new();
    for title in ["A", "B", "C", "D"] {
        books.push(create_book(&app, title).await);
    }

    for book in &books[..3] {
        let (status, _) = post_json(
            &app,
            "/borrow",
            json!({ "book_id": book.id, "borrower_id": borrower.id }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = post_json(
        &app,
        "/borrow",
        json!({ "book_id": books[3].id, "borrower_id": borrower.id }),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(parse::<ErrorResponse>(&body).error, "BORROW_LIMIT_REACHED");
}

#[tokio::test]
async fn test_e2e_return_without_active_loan() {
    let app = setup_e2e_app();
    let book = create_book(&app, "Dune").await;

    let (status, body) = post_json(&app, "/return", json!({ "book_id": book.id })).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(parse::<ErrorResponse>(&body).error, "NO_ACTIVE_LOAN");
}

#[tokio::test]
async fn test_e2e_loans_for_unknown_borrower() {
    let app = setup_e2e_app();

    let (status, body) = get(&app, "/loans/active/42").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(parse::<ErrorResponse>(&body).error, "BORROWER_NOT_FOUND");

    let (status, body) = get(&app, "/loans/history/42").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(parse::<ErrorResponse>(&body).error, "BORROWER_NOT_FOUND");
}

#[tokio::test]
async fn test_e2e_create_book_with_blank_title() {
    let app = setup_e2e_app();

    let (status, body) = post_json(
        &app,
        "/books",
        json!({ "title": "   ", "author": "Anonymous" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(parse::<ErrorResponse>(&body).error, "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_e2e_loans_with_invalid_borrower_id() {
    let app = setup_e2e_app();

    for uri in [
        "/loans/active/abc",
        "/loans/history/abc",
        "/loans/active/0",
        "/loans/history/-3",
    ] {
        let (status, body) = get(&app, uri).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "uri={}", uri);
        let error: ErrorResponse = parse(&body);
        assert_eq!(error.error, "INVALID_REQUEST", "uri={}", uri);
        assert!(!error.message.is_empty());
    }
}
