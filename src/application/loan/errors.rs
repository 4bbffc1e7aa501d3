use crate::domain::BorrowDenial;
use thiserror::Error;

/// 存在確認の対象
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Book,
    Borrower,
}

/// 貸出管理アプリケーション層のエラー
///
/// いずれのエラーでもストアの状態は変更されない。
#[derive(Debug, Error)]
pub enum LoanApplicationError {
    /// IDが指定されていない、または不正
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// 書籍または利用者が存在しない
    #[error("{0:?} not found")]
    NotFound(EntityKind),

    /// 貸出条件を満たしていない
    #[error("Borrow not allowed: {0}")]
    IneligibleBorrow(BorrowDenial),

    /// 返却対象の貸出がない
    #[error("No active loan found for this book")]
    NoActiveLoan,

    /// ストアのトランザクションが確定できなかった（再試行可能）
    #[error("Storage failure")]
    StorageFailure(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, LoanApplicationError>;
