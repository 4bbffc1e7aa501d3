use serde::{Deserialize, Serialize};

use super::{BookId, RequiredText};

/// 書籍
///
/// `available` は「この書籍に未返却の貸出が存在しない」ことのキャッシュ。
/// 貸出サービスのみが `available` と `borrow_count` を更新する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub available: bool,
    /// 累計貸出回数（単調増加）
    pub borrow_count: u32,
}

/// 新規登録する書籍
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: RequiredText,
    pub author: RequiredText,
}

/// 純粋関数：貸出により書籍を貸出中にする
///
/// 副作用なし。更新後の書籍を返す。
pub fn mark_borrowed(book: &Book) -> Book {
    Book {
        available: false,
        borrow_count: book.borrow_count.saturating_add(1),
        ..book.clone()
    }
}

/// 純粋関数：返却により書籍の貸出可否を再計算する
///
/// `remaining_open_loans` は返却処理後もこの書籍に残る未返却貸出の件数。
/// 不変条件が守られていれば常に0であり、書籍は貸出可能に戻る。
/// 累計貸出回数は変更しない。
pub fn mark_returned(book: &Book, remaining_open_loans: usize) -> Book {
    Book {
        available: remaining_open_loans == 0,
        ..book.clone()
    }
}
