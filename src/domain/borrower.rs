use serde::{Deserialize, Serialize};

use super::{BorrowerId, RequiredText};

/// 利用者
///
/// `is_active` は新規貸出の可否のみを左右し、既存の貸出には影響しない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Borrower {
    pub id: BorrowerId,
    pub name: String,
    pub is_active: bool,
}

/// 新規登録する利用者
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBorrower {
    pub name: RequiredText,
    pub is_active: bool,
}
