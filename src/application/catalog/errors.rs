use thiserror::Error;

/// 書籍・利用者管理のエラー
#[derive(Debug, Error)]
pub enum CatalogError {
    /// 入力値が不正
    #[error("Invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// ストアのエラー
    #[error("Storage failure")]
    StorageFailure(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T> = std::result::Result<T, CatalogError>;
