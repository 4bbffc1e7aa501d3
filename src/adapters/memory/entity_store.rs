use crate::domain::{
    Book, BookId, Borrower, BorrowerId, Loan, LoanId, NewBook, NewBorrower, NewLoan,
};
use crate::ports::entity_store::{
    EntityStore as EntityStoreTrait, LoanFilter, LoanView, Result, StoreTransaction,
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Default)]
struct StoreState {
    books: BTreeMap<BookId, Book>,
    borrowers: BTreeMap<BorrowerId, Borrower>,
    loans: BTreeMap<LoanId, Loan>,
    last_book_id: i64,
    last_borrower_id: i64,
    last_loan_id: i64,
}

impl StoreState {
    fn insert_loan(&mut self, loan: NewLoan) -> Loan {
        self.last_loan_id += 1;
        let loan = Loan {
            id: LoanId::new(self.last_loan_id),
            book_id: loan.book_id,
            borrower_id: loan.borrower_id,
            borrowed_at: loan.borrowed_at,
            returned_at: None,
        };
        self.loans.insert(loan.id, loan.clone());
        loan
    }

    fn loan_view(&self, loan: &Loan) -> Option<LoanView> {
        let book = self.books.get(&loan.book_id)?;
        let borrower = self.borrowers.get(&loan.borrower_id)?;
        Some(LoanView::new(
            loan.id,
            book.title.clone(),
            borrower.name.clone(),
            loan.borrowed_at,
            loan.returned_at,
        ))
    }
}

/// EntityStoreのインメモリ実装
///
/// トランザクションは `begin` からコミットまたは破棄までストア全体のロックを
/// 保持するため、完全に直列化される。書き込みは変更された行だけを保持し、
/// コミット時に共有状態へ反映する。
pub struct EntityStore {
    state: Arc<Mutex<StoreState>>,
    fail_next_commit: Arc<AtomicBool>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(StoreState::default())),
            fail_next_commit: Arc::new(AtomicBool::new(false)),
        }
    }

    /// 次回のコミットを失敗させる（ストア障害のテスト用）
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// 貸出サービスを経由せずに貸出を直接挿入する
    ///
    /// 同じ書籍に未返却の貸出が2件ある状態など、貸出サービスが作らない状態を
    /// テストで用意するために使う。書籍の貸出可否は変更しない。
    pub async fn seed_loan(&self, loan: NewLoan) -> Loan {
        self.state.lock().await.insert_loan(loan)
    }

    /// IDで書籍を取得する
    pub async fn get_book(&self, book_id: BookId) -> Option<Book> {
        self.state.lock().await.books.get(&book_id).cloned()
    }

    /// すべての書籍（ID順）
    pub async fn books(&self) -> Vec<Book> {
        self.state.lock().await.books.values().cloned().collect()
    }

    /// すべての貸出（作成順）
    pub async fn loans(&self) -> Vec<Loan> {
        self.state.lock().await.loans.values().cloned().collect()
    }
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntityStoreTrait for EntityStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        let guard = self.state.clone().lock_owned().await;
        let staged = StagedWrites {
            last_loan_id: guard.last_loan_id,
            ..StagedWrites::default()
        };

        Ok(Box::new(Transaction {
            guard,
            staged,
            fail_commit: self.fail_next_commit.clone(),
        }))
    }

    async fn insert_book(&self, book: NewBook) -> Result<Book> {
        let mut state = self.state.lock().await;
        state.last_book_id += 1;

        let book = Book {
            id: BookId::new(state.last_book_id),
            title: book.title.into_inner(),
            author: book.author.into_inner(),
            available: true,
            borrow_count: 0,
        };
        state.books.insert(book.id, book.clone());

        Ok(book)
    }

    async fn list_books(&self, available: Option<bool>) -> Result<Vec<Book>> {
        let state = self.state.lock().await;
        Ok(state
            .books
            .values()
            .filter(|b| available.is_none_or(|available| b.available == available))
            .cloned()
            .collect())
    }

    async fn insert_borrower(&self, borrower: NewBorrower) -> Result<Borrower> {
        let mut state = self.state.lock().await;
        state.last_borrower_id += 1;

        let borrower = Borrower {
            id: BorrowerId::new(state.last_borrower_id),
            name: borrower.name.into_inner(),
            is_active: borrower.is_active,
        };
        state.borrowers.insert(borrower.id, borrower.clone());

        Ok(borrower)
    }

    async fn list_borrowers(&self) -> Result<Vec<Borrower>> {
        let state = self.state.lock().await;
        Ok(state.borrowers.values().cloned().collect())
    }

    async fn get_borrower(&self, borrower_id: BorrowerId) -> Result<Option<Borrower>> {
        let state = self.state.lock().await;
        Ok(state.borrowers.get(&borrower_id).cloned())
    }

    async fn find_loans_by_borrower(
        &self,
        borrower_id: BorrowerId,
        filter: LoanFilter,
    ) -> Result<Vec<LoanView>> {
        let state = self.state.lock().await;
        Ok(state
            .loans
            .values()
            .filter(|l| l.borrower_id == borrower_id && filter.matches(l))
            .filter_map(|l| state.loan_view(l))
            .collect())
    }
}

/// トランザクション内で書き込まれた行
///
/// コミット時に共有状態へ反映する。破棄された場合は何も反映しない。
#[derive(Debug, Default)]
struct StagedWrites {
    books: BTreeMap<BookId, Book>,
    loans: BTreeMap<LoanId, Loan>,
    last_loan_id: i64,
}

/// インメモリトランザクション
///
/// `commit` せずに破棄すると書き込みは捨てられ、ロックも解放される。
pub struct Transaction {
    guard: OwnedMutexGuard<StoreState>,
    staged: StagedWrites,
    fail_commit: Arc<AtomicBool>,
}

impl Transaction {
    fn book(&self, book_id: BookId) -> Option<&Book> {
        self.staged
            .books
            .get(&book_id)
            .or_else(|| self.guard.books.get(&book_id))
    }

    fn loan(&self, loan_id: LoanId) -> Option<&Loan> {
        self.staged
            .loans
            .get(&loan_id)
            .or_else(|| self.guard.loans.get(&loan_id))
    }

    /// 書き込みを反映した貸出を作成順に列挙する
    fn loans(&self) -> impl Iterator<Item = &Loan> {
        let committed = self
            .guard
            .loans
            .values()
            .map(move |l| self.staged.loans.get(&l.id).unwrap_or(l));
        let inserted = self
            .staged
            .loans
            .range(LoanId::new(self.guard.last_loan_id + 1)..)
            .map(|(_, l)| l);
        committed.chain(inserted)
    }
}

#[async_trait]
impl StoreTransaction for Transaction {
    async fn lock_book(&mut self, book_id: BookId) -> Result<Option<Book>> {
        Ok(self.book(book_id).cloned())
    }

    async fn lock_borrower(&mut self, borrower_id: BorrowerId) -> Result<Option<Borrower>> {
        Ok(self.guard.borrowers.get(&borrower_id).cloned())
    }

    async fn count_open_loans_for_borrower(&mut self, borrower_id: BorrowerId) -> Result<usize> {
        Ok(self
            .loans()
            .filter(|l| l.borrower_id == borrower_id && l.is_open())
            .count())
    }

    async fn open_loans_for_book(&mut self, book_id: BookId) -> Result<Vec<Loan>> {
        Ok(self
            .loans()
            .filter(|l| l.book_id == book_id && l.is_open())
            .cloned()
            .collect())
    }

    async fn insert_loan(&mut self, loan: NewLoan) -> Result<Loan> {
        self.staged.last_loan_id += 1;
        let loan = Loan {
            id: LoanId::new(self.staged.last_loan_id),
            book_id: loan.book_id,
            borrower_id: loan.borrower_id,
            borrowed_at: loan.borrowed_at,
            returned_at: None,
        };
        self.staged.loans.insert(loan.id, loan.clone());
        Ok(loan)
    }

    async fn update_book(&mut self, book: &Book) -> Result<()> {
        let Some(stored) = self.book(book.id) else {
            return Err(format!("book {} not found", book.id).into());
        };

        let updated = Book {
            available: book.available,
            borrow_count: book.borrow_count,
            ..stored.clone()
        };
        self.staged.books.insert(updated.id, updated);
        Ok(())
    }

    async fn update_loan(&mut self, loan: &Loan) -> Result<()> {
        let Some(stored) = self.loan(loan.id) else {
            return Err(format!("loan {} not found", loan.id).into());
        };

        let updated = Loan {
            returned_at: loan.returned_at,
            ..stored.clone()
        };
        self.staged.loans.insert(updated.id, updated);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let Transaction {
            mut guard,
            staged,
            fail_commit,
        } = *self;

        if fail_commit.swap(false, Ordering::SeqCst) {
            return Err("simulated commit failure".into());
        }

        guard.books.extend(staged.books);
        guard.loans.extend(staged.loans);
        guard.last_loan_id = staged.last_loan_id;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}
