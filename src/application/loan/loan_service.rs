use crate::domain::{self, BookId, BorrowerId, LoanId, commands::*, rules};
use crate::ports::StoreTransaction;

use super::errors::{EntityKind, LoanApplicationError, Result};
use crate::application::ServiceDependencies;

/// 拒否・失敗時にトランザクションを解放する
///
/// 書き込みは行っていないため、ロールバックの失敗はログに残すのみとする。
async fn release(tx: Box<dyn StoreTransaction>) {
    if let Err(e) = tx.rollback().await {
        tracing::warn!(error = %e, "Failed to roll back transaction");
    }
}

/// 書籍を貸し出す
///
/// ビジネスルール：
/// - 書籍・利用者が存在すること
/// - 利用者が有効であること
/// - 書籍が貸出可能であること
/// - 利用者の未返却貸出が3冊未満であること
///
/// # 一貫性保証
///
/// 判定から書き込みまでを1つのトランザクションで行う。書籍行と利用者行を
/// 排他ロックするため、同じ書籍への同時貸出は直列化され、片方は
/// `book_unavailable` で拒否される。貸出の作成・書籍の貸出中化・累計貸出回数の
/// 加算はすべて確定するか、いずれも確定しない。
///
/// # 引数
/// * `deps` - サービスの依存関係
/// * `cmd` - 貸出コマンド
///
/// # 戻り値
/// 成功時は作成された貸出のID
pub async fn borrow_book(deps: &ServiceDependencies, cmd: BorrowBook) -> Result<LoanId> {
    // 1. 入力の検証
    let book_id = BookId::parse(cmd.book_id)
        .map_err(|e| LoanApplicationError::InvalidRequest(format!("book_id {}", e)))?;
    let borrower_id = BorrowerId::parse(cmd.borrower_id)
        .map_err(|e| LoanApplicationError::InvalidRequest(format!("borrower_id {}", e)))?;

    let mut tx = deps
        .entity_store
        .begin()
        .await
        .map_err(LoanApplicationError::StorageFailure)?;

    // 2. 書籍・利用者の存在確認（行ロック）
    let Some(book) = tx
        .lock_book(book_id)
        .await
        .map_err(LoanApplicationError::StorageFailure)?
    else {
        release(tx).await;
        return Err(LoanApplicationError::NotFound(EntityKind::Book));
    };

    let Some(borrower) = tx
        .lock_borrower(borrower_id)
        .await
        .map_err(LoanApplicationError::StorageFailure)?
    else {
        release(tx).await;
        return Err(LoanApplicationError::NotFound(EntityKind::Borrower));
    };

    // 3. 利用者の未返却貸出数
    let open_loan_count = tx
        .count_open_loans_for_borrower(borrower_id)
        .await
        .map_err(LoanApplicationError::StorageFailure)?;

    // 4. 貸出可否の判定
    if let Err(reason) = rules::can_borrow(&book, &borrower, open_loan_count) {
        release(tx).await;
        tracing::info!(
            book_id = %book_id,
            borrower_id = %borrower_id,
            reason = %reason,
            "Borrow denied"
        );
        return Err(LoanApplicationError::IneligibleBorrow(reason));
    }

    // 5. 貸出の作成と書籍の更新をまとめて確定
    let new_loan = domain::loan::open_loan(book_id, borrower_id, cmd.borrowed_at);
    let loan = tx
        .insert_loan(new_loan)
        .await
        .map_err(LoanApplicationError::StorageFailure)?;

    tx.update_book(&domain::book::mark_borrowed(&book))
        .await
        .map_err(LoanApplicationError::StorageFailure)?;

    tx.commit().await.map_err(|e| {
        tracing::error!(error = %e, book_id = %book_id, "Failed to commit borrow");
        LoanApplicationError::StorageFailure(e)
    })?;

    tracing::info!(
        loan_id = %loan.id,
        book_id = %book_id,
        borrower_id = %borrower_id,
        "Book borrowed"
    );

    Ok(loan.id)
}

/// 書籍を返却する
///
/// ビジネスルール：
/// - 書籍に未返却の貸出が存在すること
/// - 未返却の貸出が複数ある場合は最も新しいものを返却する
///
/// # 一貫性保証
///
/// 書籍行を排他ロックした上で未返却貸出を読み込み、貸出の返却済み化と
/// 書籍の貸出可能化をまとめて確定する。累計貸出回数は変更しない。
///
/// # 引数
/// * `deps` - サービスの依存関係
/// * `cmd` - 返却コマンド
pub async fn return_book(deps: &ServiceDependencies, cmd: ReturnBook) -> Result<()> {
    // 1. 入力の検証
    let book_id = BookId::parse(cmd.book_id)
        .map_err(|e| LoanApplicationError::InvalidRequest(format!("book_id {}", e)))?;

    let mut tx = deps
        .entity_store
        .begin()
        .await
        .map_err(LoanApplicationError::StorageFailure)?;

    // 2. 書籍の行ロックと未返却貸出の読み込み
    // 存在しない書籍には貸出もないため、返却対象なしとして扱う
    let Some(book) = tx
        .lock_book(book_id)
        .await
        .map_err(LoanApplicationError::StorageFailure)?
    else {
        release(tx).await;
        return Err(LoanApplicationError::NoActiveLoan);
    };

    let open_loans = tx
        .open_loans_for_book(book_id)
        .await
        .map_err(LoanApplicationError::StorageFailure)?;

    // 3. 返却対象の選択
    let loan = match rules::can_return(&open_loans) {
        Ok(loan) => loan.clone(),
        Err(_) => {
            release(tx).await;
            tracing::info!(book_id = %book_id, "Return denied: no active loan");
            return Err(LoanApplicationError::NoActiveLoan);
        }
    };

    let open_loan_count = open_loans.iter().filter(|l| l.is_open()).count();
    if open_loan_count > 1 {
        tracing::warn!(
            book_id = %book_id,
            open_loans = open_loan_count,
            selected_loan_id = %loan.id,
            "Multiple open loans for one book; returning the most recent"
        );
    }

    // 4. 貸出の返却済み化と書籍の更新をまとめて確定
    let closed = match domain::loan::close_loan(&loan, cmd.returned_at) {
        Ok(closed) => closed,
        Err(_) => {
            release(tx).await;
            return Err(LoanApplicationError::NoActiveLoan);
        }
    };

    tx.update_loan(&closed)
        .await
        .map_err(LoanApplicationError::StorageFailure)?;

    tx.update_book(&domain::book::mark_returned(&book, open_loan_count - 1))
        .await
        .map_err(LoanApplicationError::StorageFailure)?;

    tx.commit().await.map_err(|e| {
        tracing::error!(error = %e, book_id = %book_id, "Failed to commit return");
        LoanApplicationError::StorageFailure(e)
    })?;

    tracing::info!(loan_id = %closed.id, book_id = %book_id, "Book returned");

    Ok(())
}
