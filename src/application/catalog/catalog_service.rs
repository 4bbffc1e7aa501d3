use crate::domain::{Book, Borrower, NewBook, NewBorrower, RequiredText, commands::*};

use super::errors::{CatalogError, Result};
use crate::application::ServiceDependencies;

/// 書籍一覧の絞り込み条件
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BookFilter {
    /// 指定時は貸出可否で絞り込む
    pub available: Option<bool>,
}

fn required_text(field: &'static str, value: String) -> Result<RequiredText> {
    RequiredText::try_from(value).map_err(|e| CatalogError::Validation {
        field,
        reason: e.to_string(),
    })
}

/// 書籍を登録する
///
/// 登録直後の書籍は貸出可能で、累計貸出回数は0。
/// 貸出可否と累計貸出回数は貸出サービスのみが更新するため、入力では受け付けない。
pub async fn register_book(deps: &ServiceDependencies, cmd: RegisterBook) -> Result<Book> {
    let new_book = NewBook {
        title: required_text("title", cmd.title)?,
        author: required_text("author", cmd.author)?,
    };

    let book = deps
        .entity_store
        .insert_book(new_book)
        .await
        .map_err(CatalogError::StorageFailure)?;

    tracing::info!(book_id = %book.id, title = %book.title, "Book registered");

    Ok(book)
}

/// 書籍をID順に取得する
pub async fn list_books(deps: &ServiceDependencies, filter: BookFilter) -> Result<Vec<Book>> {
    deps.entity_store
        .list_books(filter.available)
        .await
        .map_err(CatalogError::StorageFailure)
}

/// 利用者を登録する
///
/// `is_active` 省略時は有効な利用者として登録する。
pub async fn register_borrower(
    deps: &ServiceDependencies,
    cmd: RegisterBorrower,
) -> Result<Borrower> {
    let new_borrower = NewBorrower {
        name: required_text("name", cmd.name)?,
        is_active: cmd.is_active.unwrap_or(true),
    };

    let borrower = deps
        .entity_store
        .insert_borrower(new_borrower)
        .await
        .map_err(CatalogError::StorageFailure)?;

    tracing::info!(borrower_id = %borrower.id, "Borrower registered");

    Ok(borrower)
}

/// 利用者をID順に取得する
pub async fn list_borrowers(deps: &ServiceDependencies) -> Result<Vec<Borrower>> {
    deps.entity_store
        .list_borrowers()
        .await
        .map_err(CatalogError::StorageFailure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryEntityStore;
    use std::sync::Arc;

    fn deps() -> ServiceDependencies {
        ServiceDependencies {
            entity_store: Arc::new(MemoryEntityStore::new()),
        }
    }

    #[tokio::test]
    async fn test_register_book_defaults() {
        let deps = deps();

        let book = register_book(
            &deps,
            RegisterBook {
                title: " Dune ".to_string(),
                author: "Frank Herbert".to_string(),
            },
        )
        .await
        .unwrap();

        assert_eq!(book.title, "Dune");
        assert!(book.available);
        assert_eq!(book.borrow_count, 0);
    }

    #[tokio::test]
    async fn test_register_book_rejects_blank_title() {
        let deps = deps();

        let result = register_book(
            &deps,
            RegisterBook {
                title: "  ".to_string(),
                author: "Frank Herbert".to_string(),
            },
        )
        .await;

        assert!(matches!(
            result,
            Err(CatalogError::Validation { field: "title", .. })
        ));
        assert!(list_books(&deps, BookFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_register_borrower_active_by_default() {
        let deps = deps();

        let borrower = register_borrower(
            &deps,
            RegisterBorrower {
                name: "Alice".to_string(),
                is_active: None,
            },
        )
        .await
        .unwrap();
        assert!(borrower.is_active);

        let inactive = register_borrower(
            &deps,
            RegisterBorrower {
                name: "Bob".to_string(),
                is_active: Some(false),
            },
        )
        .await
        .unwrap();
        assert!(!inactive.is_active);

        let borrowers = list_borrowers(&deps).await.unwrap();
        assert_eq!(borrowers.len(), 2);
        assert_eq!(borrowers[0].id, borrower.id);
        assert_eq!(borrowers[1].id, inactive.id);
    }
}
