use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BookId, BorrowerId, LoanId, ReturnLoanError};

/// Loan - 1冊の書籍の1回の貸出
///
/// 返却済みかどうかは `returned_at` の有無のみで表現する。
/// 独立した返却フラグを持たないため、両者が食い違うことはない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,

    // 他の集約への参照（IDのみ）
    pub book_id: BookId,
    pub borrower_id: BorrowerId,

    pub borrowed_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
}

impl Loan {
    /// 返却済みか
    pub fn is_returned(&self) -> bool {
        self.returned_at.is_some()
    }

    /// 未返却か
    pub fn is_open(&self) -> bool {
        !self.is_returned()
    }
}

/// ストアへ挿入する新規貸出（IDはストアが採番する）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLoan {
    pub book_id: BookId,
    pub borrower_id: BorrowerId,
    pub borrowed_at: DateTime<Utc>,
}

/// 純粋関数：貸出を開始する
///
/// 貸出可否の判定は `rules::can_borrow` で済ませてから呼ぶこと。
pub fn open_loan(book_id: BookId, borrower_id: BorrowerId, borrowed_at: DateTime<Utc>) -> NewLoan {
    NewLoan {
        book_id,
        borrower_id,
        borrowed_at,
    }
}

/// 純粋関数：貸出を返却済みにする
///
/// ビジネスルール：
/// - 返却は1回のみ（返却済みの貸出は再度返却できない）
/// - 貸出日時は変更しない
///
/// 副作用なし。新しいLoanを返す。
pub fn close_loan(loan: &Loan, returned_at: DateTime<Utc>) -> Result<Loan, ReturnLoanError> {
    if loan.is_returned() {
        return Err(ReturnLoanError::AlreadyReturned);
    }

    Ok(Loan {
        returned_at: Some(returned_at),
        ..loan.clone()
    })
}
