use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers::{
    AppState, borrow_book, create_book, create_borrower, get_active_loans, get_loan_history,
    list_books, list_borrowers, return_book,
};

/// Creates the API router with all library endpoints
///
/// Catalog endpoints:
/// - POST /books, GET /books?available=
/// - POST /borrowers, GET /borrowers
///
/// Loan endpoints:
/// - POST /borrow - Borrow a book
/// - POST /return - Return a book
/// - GET /loans/active/:borrower_id - Open loans for a borrower
/// - GET /loans/history/:borrower_id - Full loan history for a borrower
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        .route("/books", post(create_book).get(list_books))
        .route("/borrowers", post(create_borrower).get(list_borrowers))
        .route("/borrow", post(borrow_book))
        .route("/return", post(return_book))
        .route("/loans/active/:borrower_id", get(get_active_loans))
        .route("/loans/history/:borrower_id", get(get_loan_history))
        // Add tracing middleware
        .layer(TraceLayer::new_for_http())
        // Add application state
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
