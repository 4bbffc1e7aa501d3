use crate::domain::{
    Book, BookId, Borrower, BorrowerId, Loan, LoanId, NewBook, NewBorrower, NewLoan,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 貸出ビュー
///
/// 呼び出し側へ返す貸出の射影。書名と利用者名を結合済み。
/// `is_returned` は `returned_at` から導出される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanView {
    pub loan_id: LoanId,
    pub book_title: String,
    pub borrower_name: String,
    pub borrowed_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub is_returned: bool,
}

impl LoanView {
    pub fn new(
        loan_id: LoanId,
        book_title: impl Into<String>,
        borrower_name: impl Into<String>,
        borrowed_at: DateTime<Utc>,
        returned_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            loan_id,
            book_title: book_title.into(),
            borrower_name: borrower_name.into(),
            borrowed_at,
            returned_at,
            is_returned: returned_at.is_some(),
        }
    }
}

/// 利用者の貸出検索条件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanFilter {
    /// 未返却のみ
    Open,
    /// 返却済みを含むすべて
    All,
}

impl LoanFilter {
    pub fn matches(&self, loan: &Loan) -> bool {
        match self {
            LoanFilter::Open => loan.is_open(),
            LoanFilter::All => true,
        }
    }
}

/// エンティティストアポート
///
/// 書籍・利用者・貸出の永続化を抽象化する。
/// 状態を変更する貸出・返却は `begin` で開始したトランザクション内で行う。
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// トランザクションを開始する
    ///
    /// 返されたハンドルは1回の操作専用。`commit` せずに破棄すると
    /// ロールバックされ、保持しているロックも解放される。
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>>;

    /// 書籍を登録する（貸出可能、累計貸出回数0）
    async fn insert_book(&self, book: NewBook) -> Result<Book>;

    /// 書籍をID順に取得する
    ///
    /// `available` が指定された場合は貸出可否で絞り込む。
    async fn list_books(&self, available: Option<bool>) -> Result<Vec<Book>>;

    /// 利用者を登録する
    async fn insert_borrower(&self, borrower: NewBorrower) -> Result<Borrower>;

    /// 利用者をID順に取得する
    async fn list_borrowers(&self) -> Result<Vec<Borrower>>;

    /// IDで利用者を取得する
    async fn get_borrower(&self, borrower_id: BorrowerId) -> Result<Option<Borrower>>;

    /// 利用者の貸出を作成順に取得する
    ///
    /// 貸中一覧と貸出履歴の表示に使用される。
    async fn find_loans_by_borrower(
        &self,
        borrower_id: BorrowerId,
        filter: LoanFilter,
    ) -> Result<Vec<LoanView>>;
}

/// 1回の貸出・返却操作をスコープとするトランザクション
///
/// `lock_*` で読み込んだ行はコミットまたはロールバックまで他の
/// トランザクションから排他される。
#[async_trait]
pub trait StoreTransaction: Send {
    /// 書籍を排他ロックして取得する
    async fn lock_book(&mut self, book_id: BookId) -> Result<Option<Book>>;

    /// 利用者を排他ロックして取得する
    async fn lock_borrower(&mut self, borrower_id: BorrowerId) -> Result<Option<Borrower>>;

    /// 利用者の未返却貸出の件数
    async fn count_open_loans_for_borrower(&mut self, borrower_id: BorrowerId) -> Result<usize>;

    /// 書籍の未返却貸出を作成順に取得する
    async fn open_loans_for_book(&mut self, book_id: BookId) -> Result<Vec<Loan>>;

    /// 貸出を挿入する（IDはストアが採番）
    async fn insert_loan(&mut self, loan: NewLoan) -> Result<Loan>;

    /// 書籍の貸出可否と累計貸出回数を更新する
    async fn update_book(&mut self, book: &Book) -> Result<()>;

    /// 貸出の返却日時を更新する
    async fn update_loan(&mut self, loan: &Loan) -> Result<()>;

    /// すべての書き込みをまとめて確定する
    async fn commit(self: Box<Self>) -> Result<()>;

    /// すべての書き込みを破棄する
    async fn rollback(self: Box<Self>) -> Result<()>;
}
