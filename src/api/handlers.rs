use crate::application::{
    ServiceDependencies,
    catalog::{self, BookFilter},
    loan::{self, active_loans, loan_history},
};
use crate::domain::{
    BorrowerId,
    commands::{BorrowBook, ReturnBook},
};
use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
};
use std::sync::Arc;

use super::{
    error::ApiError,
    types::{
        ActiveLoansResponse, BookResponse, BookReturnedResponse, BorrowRequest, BorrowerResponse,
        CreateBookRequest, CreateBorrowerRequest, ListBooksQuery, LoanCreatedResponse,
        LoanResponse, ReturnRequest,
    },
};

// ============================================================================
// State
// ============================================================================

/// ハンドラー間で共有されるアプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub service_deps: ServiceDependencies,
}

/// JSONボディの解析失敗をAPIエラーに変換する
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

/// パスの利用者IDを検証する
///
/// 数値でない値と0以下の値はいずれも `INVALID_REQUEST` になる。
fn borrower_id_path(path: Result<Path<i64>, PathRejection>) -> Result<BorrowerId, ApiError> {
    let Path(raw) = path.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    BorrowerId::parse(Some(raw)).map_err(|e| ApiError::BadRequest(format!("borrower_id {}", e)))
}

// ============================================================================
// Catalog handlers
// ============================================================================

/// POST /books - 書籍を登録
pub async fn create_book(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateBookRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<BookResponse>), ApiError> {
    let req = json_body(payload)?;

    let book = catalog::register_book(&state.service_deps, req.to_command()).await?;

    Ok((StatusCode::CREATED, Json(BookResponse::from(book))))
}

/// GET /books - 書籍一覧を取得
///
/// クエリパラメータ:
/// - available: 貸出可否で絞り込み（オプション）
pub async fn list_books(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListBooksQuery>, QueryRejection>,
) -> Result<Json<Vec<BookResponse>>, ApiError> {
    let Query(query) = query.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    let filter = BookFilter {
        available: query.available_filter(),
    };

    let books = catalog::list_books(&state.service_deps, filter).await?;

    Ok(Json(books.into_iter().map(BookResponse::from).collect()))
}

/// POST /borrowers - 利用者を登録
pub async fn create_borrower(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateBorrowerRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<BorrowerResponse>), ApiError> {
    let req = json_body(payload)?;

    let borrower = catalog::register_borrower(&state.service_deps, req.to_command()).await?;

    Ok((StatusCode::CREATED, Json(BorrowerResponse::from(borrower))))
}

/// GET /borrowers - 利用者一覧を取得
pub async fn list_borrowers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<BorrowerResponse>>, ApiError> {
    let borrowers = catalog::list_borrowers(&state.service_deps).await?;

    Ok(Json(
        borrowers.into_iter().map(BorrowerResponse::from).collect(),
    ))
}

// ============================================================================
// Loan command handlers (POST)
// ============================================================================

/// POST /borrow - 書籍を貸し出す
///
/// 強制されるビジネスルール:
/// - 書籍・利用者が存在すること
/// - 利用者が有効であること
/// - 書籍が貸出可能であること
/// - 利用者の貸出数が上限（3冊）未満であること
pub async fn borrow_book(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<BorrowRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<LoanCreatedResponse>), ApiError> {
    let req = json_body(payload)?;

    let cmd = BorrowBook {
        book_id: req.book_id,
        borrower_id: req.borrower_id,
        borrowed_at: chrono::Utc::now(),
    };

    let loan_id = loan::borrow_book(&state.service_deps, cmd).await?;

    let response = LoanCreatedResponse {
        loan_id: loan_id.value(),
        message: "Book borrowed successfully.".to_string(),
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /return - 書籍を返却
///
/// 書籍の未返却貸出（複数ある場合は最新のもの）を返却済みにする。
pub async fn return_book(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ReturnRequest>, JsonRejection>,
) -> Result<Json<BookReturnedResponse>, ApiError> {
    let req = json_body(payload)?;

    let cmd = ReturnBook {
        book_id: req.book_id,
        returned_at: chrono::Utc::now(),
    };

    loan::return_book(&state.service_deps, cmd).await?;

    Ok(Json(BookReturnedResponse {
        message: "Book returned successfully.".to_string(),
    }))
}

// ============================================================================
// Loan query handlers (GET)
// ============================================================================

/// GET /loans/active/:borrower_id - 利用者の貸中一覧
pub async fn get_active_loans(
    State(state): State<Arc<AppState>>,
    borrower_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<ActiveLoansResponse>, ApiError> {
    let borrower_id = borrower_id_path(borrower_id)?;

    let active = active_loans(&state.service_deps, borrower_id).await?;

    Ok(Json(ActiveLoansResponse {
        borrowed_books_count: active.count,
        borrowed_books: active.loans.into_iter().map(LoanResponse::from).collect(),
    }))
}

/// GET /loans/history/:borrower_id - 利用者の貸出履歴
pub async fn get_loan_history(
    State(state): State<Arc<AppState>>,
    borrower_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Vec<LoanResponse>>, ApiError> {
    let borrower_id = borrower_id_path(borrower_id)?;

    let loans = loan_history(&state.service_deps, borrower_id).await?;

    Ok(Json(loans.into_iter().map(LoanResponse::from).collect()))
}
