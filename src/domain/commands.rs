use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// コマンド：書籍を貸し出す
///
/// IDはリクエスト由来の未検証の値。検証は貸出サービスが行う。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowBook {
    pub book_id: Option<i64>,
    pub borrower_id: Option<i64>,
    pub borrowed_at: DateTime<Utc>,
}

/// コマンド：書籍を返却する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnBook {
    pub book_id: Option<i64>,
    pub returned_at: DateTime<Utc>,
}

/// コマンド：書籍を登録する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterBook {
    pub title: String,
    pub author: String,
}

/// コマンド：利用者を登録する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterBorrower {
    pub name: String,
    /// 省略時は有効
    pub is_active: Option<bool>,
}
