use thiserror::Error;

/// 貸出拒否の理由
///
/// 表示文字列は理由コードと同じ。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BorrowDenial {
    /// 利用者が無効化されている
    #[error("borrower_inactive")]
    BorrowerInactive,
    /// 書籍が貸出中
    #[error("book_unavailable")]
    BookUnavailable,
    /// 貸出上限（3冊）に達している
    #[error("borrow_limit_reached")]
    BorrowLimitReached,
}

impl BorrowDenial {
    /// 理由コード
    pub fn as_str(&self) -> &'static str {
        match self {
            BorrowDenial::BorrowerInactive => "borrower_inactive",
            BorrowDenial::BookUnavailable => "book_unavailable",
            BorrowDenial::BorrowLimitReached => "borrow_limit_reached",
        }
    }
}

/// 返却拒否の理由
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReturnDenial {
    /// 書籍に未返却の貸出が存在しない
    #[error("no_active_loan")]
    NoActiveLoan,
}

/// 貸出の返却処理のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReturnLoanError {
    /// 既に返却済み
    #[error("loan is already returned")]
    AlreadyReturned,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_borrow_denial_display_matches_code() {
        for denial in [
            BorrowDenial::BorrowerInactive,
            BorrowDenial::BookUnavailable,
            BorrowDenial::BorrowLimitReached,
        ] {
            assert_eq!(denial.to_string(), denial.as_str());
        }
    }
}
