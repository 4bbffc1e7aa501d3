mod catalog_service;
mod errors;

pub use catalog_service::{
    BookFilter, list_books, list_borrowers, register_book, register_borrower,
};
pub use errors::{CatalogError, Result};
