use crate::domain::{
    Book, BookId, Borrower, BorrowerId, Loan, LoanId, NewBook, NewBorrower, NewLoan,
};
use crate::ports::entity_store::{
    EntityStore as EntityStoreTrait, LoanFilter, LoanView, Result, StoreTransaction,
};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Row, postgres::PgRow};

/// PostgreSQLの行データをBookに変換する
///
/// borrow_countのi32からu32への変換でエラーハンドリングを行う。
fn map_row_to_book(row: &PgRow) -> Result<Book> {
    let borrow_count_i32: i32 = row.get("borrow_count");
    let borrow_count: u32 = borrow_count_i32.try_into().map_err(|_| {
        Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("borrow_count out of range: {}", borrow_count_i32),
        )) as Box<dyn std::error::Error + Send + Sync>
    })?;

    Ok(Book {
        id: BookId::new(row.get("id")),
        title: row.get("title"),
        author: row.get("author"),
        available: row.get("available"),
        borrow_count,
    })
}

fn map_row_to_borrower(row: &PgRow) -> Borrower {
    Borrower {
        id: BorrowerId::new(row.get("id")),
        name: row.get("name"),
        is_active: row.get("is_active"),
    }
}

fn map_row_to_loan(row: &PgRow) -> Loan {
    Loan {
        id: LoanId::new(row.get("id")),
        book_id: BookId::new(row.get("book_id")),
        borrower_id: BorrowerId::new(row.get("borrower_id")),
        borrowed_at: row.get("borrowed_at"),
        returned_at: row.get("returned_at"),
    }
}

fn map_row_to_loan_view(row: &PgRow) -> LoanView {
    LoanView::new(
        LoanId::new(row.get("id")),
        row.get::<String, _>("book_title"),
        row.get::<String, _>("borrower_name"),
        row.get("borrowed_at"),
        row.get("returned_at"),
    )
}

/// EntityStoreのPostgreSQL実装
///
/// 貸出・返却のトランザクションでは `SELECT ... FOR UPDATE` で書籍行・利用者行を
/// 排他ロックし、判定から書き込みまでを直列化する。
pub struct EntityStore {
    pool: PgPool,
}

impl EntityStore {
    /// PostgreSQLコネクションプールから新しいEntityStoreを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntityStoreTrait for EntityStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(Transaction { tx }))
    }

    async fn insert_book(&self, book: NewBook) -> Result<Book> {
        let row = sqlx::query(
            r#"
            INSERT INTO books (title, author, available, borrow_count)
            VALUES ($1, $2, TRUE, 0)
            RETURNING id, title, author, available, borrow_count
            "#,
        )
        .bind(book.title.as_str())
        .bind(book.author.as_str())
        .fetch_one(&self.pool)
        .await?;

        map_row_to_book(&row)
    }

    /// 書籍一覧（availableが指定された場合は絞り込み）
    async fn list_books(&self, available: Option<bool>) -> Result<Vec<Book>> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, author, available, borrow_count
            FROM books
            WHERE $1::boolean IS NULL OR available = $1
            ORDER BY id ASC
            "#,
        )
        .bind(available)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_book).collect()
    }

    async fn insert_borrower(&self, borrower: NewBorrower) -> Result<Borrower> {
        let row = sqlx::query(
            r#"
            INSERT INTO borrowers (name, is_active)
            VALUES ($1, $2)
            RETURNING id, name, is_active
            "#,
        )
        .bind(borrower.name.as_str())
        .bind(borrower.is_active)
        .fetch_one(&self.pool)
        .await?;

        Ok(map_row_to_borrower(&row))
    }

    async fn list_borrowers(&self) -> Result<Vec<Borrower>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, is_active
            FROM borrowers
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(map_row_to_borrower).collect())
    }

    async fn get_borrower(&self, borrower_id: BorrowerId) -> Result<Option<Borrower>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, is_active
            FROM borrowers
            WHERE id = $1
            "#,
        )
        .bind(borrower_id.value())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(map_row_to_borrower))
    }

    /// 利用者の貸出を書名・利用者名と結合して取得（作成順）
    async fn find_loans_by_borrower(
        &self,
        borrower_id: BorrowerId,
        filter: LoanFilter,
    ) -> Result<Vec<LoanView>> {
        let rows = sqlx::query(
            r#"
            SELECT
                l.id,
                b.title AS book_title,
                r.name AS borrower_name,
                l.borrowed_at,
                l.returned_at
            FROM loans l
            JOIN books b ON b.id = l.book_id
            JOIN borrowers r ON r.id = l.borrower_id
            WHERE l.borrower_id = $1
              AND (NOT $2 OR l.returned_at IS NULL)
            ORDER BY l.id ASC
            "#,
        )
        .bind(borrower_id.value())
        .bind(filter == LoanFilter::Open)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(map_row_to_loan_view).collect())
    }
}

/// PostgreSQLトランザクション
///
/// コミットせずに破棄された場合、sqlxがロールバックして接続をプールへ返す。
pub struct Transaction {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTransaction for Transaction {
    async fn lock_book(&mut self, book_id: BookId) -> Result<Option<Book>> {
        let row = sqlx::query(
            r#"
            SELECT id, title, author, available, borrow_count
            FROM books
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(book_id.value())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.as_ref().map(map_row_to_book).transpose()
    }

    async fn lock_borrower(&mut self, borrower_id: BorrowerId) -> Result<Option<Borrower>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, is_active
            FROM borrowers
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(borrower_id.value())
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.as_ref().map(map_row_to_borrower))
    }

    async fn count_open_loans_for_borrower(&mut self, borrower_id: BorrowerId) -> Result<usize> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM loans
            WHERE borrower_id = $1 AND returned_at IS NULL
            "#,
        )
        .bind(borrower_id.value())
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(usize::try_from(count)?)
    }

    async fn open_loans_for_book(&mut self, book_id: BookId) -> Result<Vec<Loan>> {
        let rows = sqlx::query(
            r#"
            SELECT id, book_id, borrower_id, borrowed_at, returned_at
            FROM loans
            WHERE book_id = $1 AND returned_at IS NULL
            ORDER BY id ASC
            "#,
        )
        .bind(book_id.value())
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows.iter().map(map_row_to_loan).collect())
    }

    async fn insert_loan(&mut self, loan: NewLoan) -> Result<Loan> {
        let row = sqlx::query(
            r#"
            INSERT INTO loans (book_id, borrower_id, borrowed_at, returned_at)
            VALUES ($1, $2, $3, NULL)
            RETURNING id, book_id, borrower_id, borrowed_at, returned_at
            "#,
        )
        .bind(loan.book_id.value())
        .bind(loan.borrower_id.value())
        .bind(loan.borrowed_at)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(map_row_to_loan(&row))
    }

    async fn update_book(&mut self, book: &Book) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET available = $2, borrow_count = $3
            WHERE id = $1
            "#,
        )
        .bind(book.id.value())
        .bind(book.available)
        .bind(i32::try_from(book.borrow_count)?)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() != 1 {
            return Err(format!("book {} not found", book.id).into());
        }
        Ok(())
    }

    /// 返却日時を設定する（未返却の貸出のみ）
    async fn update_loan(&mut self, loan: &Loan) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE loans
            SET returned_at = $2
            WHERE id = $1 AND returned_at IS NULL
            "#,
        )
        .bind(loan.id.value())
        .bind(loan.returned_at)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() != 1 {
            return Err(format!("open loan {} not found", loan.id).into());
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
