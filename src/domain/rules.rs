//! 貸出ルールエンジン
//!
//! 現在のエンティティのスナップショットから貸出・返却の可否を判定する純粋関数群。
//! 書籍・利用者の存在確認は呼び出し側の前提条件とする。

use super::{Book, BorrowDenial, Borrower, Loan, ReturnDenial};

/// 利用者1人あたりの同時貸出上限
pub const MAX_OPEN_LOANS: usize = 3;

/// 純粋関数：貸出可否を判定する
///
/// ビジネスルール（この順に評価する）：
/// - 利用者が有効であること
/// - 書籍が貸出可能であること
/// - 利用者の未返却貸出が3冊未満であること
pub fn can_borrow(
    book: &Book,
    borrower: &Borrower,
    open_loan_count: usize,
) -> Result<(), BorrowDenial> {
    if !borrower.is_active {
        return Err(BorrowDenial::BorrowerInactive);
    }

    if !book.available {
        return Err(BorrowDenial::BookUnavailable);
    }

    if open_loan_count >= MAX_OPEN_LOANS {
        return Err(BorrowDenial::BorrowLimitReached);
    }

    Ok(())
}

/// 純粋関数：返却対象の貸出を選ぶ
///
/// 未返却の貸出が複数ある場合は最も新しく作成されたもの（IDが最大）を選ぶ。
/// 正常運用では未返却の貸出は書籍ごとに高々1件なので、この選択は発生しない。
pub fn can_return(open_loans: &[Loan]) -> Result<&Loan, ReturnDenial> {
    open_loans
        .iter()
        .filter(|loan| loan.is_open())
        .max_by_key(|loan| loan.id)
        .ok_or(ReturnDenial::NoActiveLoan)
}
