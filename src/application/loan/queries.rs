use crate::domain::BorrowerId;
use crate::ports::{LoanFilter, LoanView};

use super::errors::{EntityKind, LoanApplicationError, Result};
use crate::application::ServiceDependencies;

/// 利用者の貸中一覧
///
/// `count` は常に `loans.len()` と一致する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveLoans {
    pub count: usize,
    pub loans: Vec<LoanView>,
}

/// 利用者の存在を確認した上で貸出を取得する
async fn loans_for_existing_borrower(
    deps: &ServiceDependencies,
    borrower_id: BorrowerId,
    filter: LoanFilter,
) -> Result<Vec<LoanView>> {
    let borrower = deps
        .entity_store
        .get_borrower(borrower_id)
        .await
        .map_err(LoanApplicationError::StorageFailure)?;

    if borrower.is_none() {
        return Err(LoanApplicationError::NotFound(EntityKind::Borrower));
    }

    deps.entity_store
        .find_loans_by_borrower(borrower_id, filter)
        .await
        .map_err(LoanApplicationError::StorageFailure)
}

/// 利用者の未返却貸出を作成順に取得する
///
/// 利用者の有効・無効に関わらず、存在すれば結果を返す。
pub async fn active_loans(
    deps: &ServiceDependencies,
    borrower_id: BorrowerId,
) -> Result<ActiveLoans> {
    let loans = loans_for_existing_borrower(deps, borrower_id, LoanFilter::Open).await?;

    Ok(ActiveLoans {
        count: loans.len(),
        loans,
    })
}

/// 利用者の貸出履歴（返却済みを含む）を作成順に取得する
pub async fn loan_history(
    deps: &ServiceDependencies,
    borrower_id: BorrowerId,
) -> Result<Vec<LoanView>> {
    loans_for_existing_borrower(deps, borrower_id, LoanFilter::All).await
}
