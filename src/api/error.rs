use crate::application::{catalog::CatalogError, loan::EntityKind, loan::LoanApplicationError};
use crate::domain::BorrowDenial;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::types::ErrorResponse;

/// API層のエラー型
///
/// アプリケーション層のエラーをラップし、HTTPレスポンスへのマッピングを提供する。
#[derive(Debug)]
pub enum ApiError {
    Loan(LoanApplicationError),
    Catalog(CatalogError),
    /// リクエストボディ・パスパラメータの解析失敗
    BadRequest(String),
}

impl From<LoanApplicationError> for ApiError {
    fn from(err: LoanApplicationError) -> Self {
        ApiError::Loan(err)
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        ApiError::Catalog(err)
    }
}

fn loan_error_parts(err: &LoanApplicationError) -> (StatusCode, &'static str, String) {
    match err {
        // 400 Bad Request - 呼び出し側の入力誤り
        LoanApplicationError::InvalidRequest(msg) => {
            (StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg.clone())
        }

        // 404 Not Found - 参照先が存在しない
        LoanApplicationError::NotFound(EntityKind::Book) => (
            StatusCode::NOT_FOUND,
            "BOOK_NOT_FOUND",
            "Book not found".to_string(),
        ),
        LoanApplicationError::NotFound(EntityKind::Borrower) => (
            StatusCode::NOT_FOUND,
            "BORROWER_NOT_FOUND",
            "Borrower not found".to_string(),
        ),
        LoanApplicationError::NoActiveLoan => (
            StatusCode::NOT_FOUND,
            "NO_ACTIVE_LOAN",
            "No active loan found for this book".to_string(),
        ),

        // 422 Unprocessable Entity - ビジネスルール違反
        LoanApplicationError::IneligibleBorrow(reason) => {
            let (error_type, message) = match reason {
                BorrowDenial::BorrowerInactive => {
                    ("BORROWER_INACTIVE", "Borrower is not active")
                }
                BorrowDenial::BookUnavailable => ("BOOK_UNAVAILABLE", "Book is not available"),
                BorrowDenial::BorrowLimitReached => {
                    ("BORROW_LIMIT_REACHED", "Borrowing limit reached (max 3 books)")
                }
            };
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                error_type,
                message.to_string(),
            )
        }

        // 503 Service Unavailable - ストア障害（再試行可能）
        // 内部エラーの詳細はログに記録し、クライアントには一般的なメッセージのみを返す
        LoanApplicationError::StorageFailure(e) => {
            tracing::error!("Storage failure: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "STORAGE_FAILURE",
                "Storage is temporarily unavailable, please retry".to_string(),
            )
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            ApiError::Loan(err) => loan_error_parts(err),
            ApiError::Catalog(err @ CatalogError::Validation { .. }) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", err.to_string())
            }
            ApiError::Catalog(CatalogError::StorageFailure(e)) => {
                tracing::error!("Storage failure: {}", e);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "STORAGE_FAILURE",
                    "Storage is temporarily unavailable, please retry".to_string(),
                )
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg.clone()),
        };

        let body = Json(ErrorResponse::new(error_type, message));
        (status, body).into_response()
    }
}
