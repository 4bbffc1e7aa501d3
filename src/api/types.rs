use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    Book, Borrower,
    commands::{RegisterBook, RegisterBorrower},
};
use crate::ports::LoanView;

/// 貸出リクエスト（POST /borrow）
///
/// IDの欠落・不正の検証はアプリケーション層で行うため、ここではOptionで受ける。
#[derive(Debug, Serialize, Deserialize)]
pub struct BorrowRequest {
    pub book_id: Option<i64>,
    pub borrower_id: Option<i64>,
}

/// 返却リクエスト（POST /return）
#[derive(Debug, Serialize, Deserialize)]
pub struct ReturnRequest {
    pub book_id: Option<i64>,
}

/// 書籍登録リクエスト（POST /books）
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateBookRequest {
    pub title: String,
    pub author: String,
}

impl CreateBookRequest {
    pub fn to_command(&self) -> RegisterBook {
        RegisterBook {
            title: self.title.clone(),
            author: self.author.clone(),
        }
    }
}

/// 利用者登録リクエスト（POST /borrowers）
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateBorrowerRequest {
    pub name: String,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl CreateBorrowerRequest {
    pub fn to_command(&self) -> RegisterBorrower {
        RegisterBorrower {
            name: self.name.clone(),
            is_active: self.is_active,
        }
    }
}

/// 書籍一覧取得のクエリパラメータ
#[derive(Debug, Deserialize)]
pub struct ListBooksQuery {
    /// "true"（大文字小文字を区別しない）で貸出可能、それ以外の値で貸出中に絞り込む
    pub available: Option<String>,
}

impl ListBooksQuery {
    pub fn available_filter(&self) -> Option<bool> {
        self.available
            .as_deref()
            .map(|value| value.eq_ignore_ascii_case("true"))
    }
}

/// 書籍レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct BookResponse {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub available: bool,
    pub borrow_count: u32,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        Self {
            id: book.id.value(),
            title: book.title,
            author: book.author,
            available: book.available,
            borrow_count: book.borrow_count,
        }
    }
}

/// 利用者レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct BorrowerResponse {
    pub id: i64,
    pub name: String,
    pub is_active: bool,
}

impl From<Borrower> for BorrowerResponse {
    fn from(borrower: Borrower) -> Self {
        Self {
            id: borrower.id.value(),
            name: borrower.name,
            is_active: borrower.is_active,
        }
    }
}

/// 貸出作成レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct LoanCreatedResponse {
    pub loan_id: i64,
    pub message: String,
}

/// 返却レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct BookReturnedResponse {
    pub message: String,
}

/// 貸出レスポンス（貸中一覧・貸出履歴）
#[derive(Debug, Serialize, Deserialize)]
pub struct LoanResponse {
    pub id: i64,
    pub book_title: String,
    pub borrowed_by: String,
    pub borrowed_date: DateTime<Utc>,
    pub returned_date: Option<DateTime<Utc>>,
    pub is_returned: bool,
}

impl From<LoanView> for LoanResponse {
    fn from(view: LoanView) -> Self {
        Self {
            id: view.loan_id.value(),
            book_title: view.book_title,
            borrowed_by: view.borrower_name,
            borrowed_date: view.borrowed_at,
            returned_date: view.returned_at,
            is_returned: view.is_returned,
        }
    }
}

/// 貸中一覧レスポンス（GET /loans/active/:borrower_id）
#[derive(Debug, Serialize, Deserialize)]
pub struct ActiveLoansResponse {
    pub borrowed_books_count: usize,
    pub borrowed_books: Vec<LoanResponse>,
}

/// エラーレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}
