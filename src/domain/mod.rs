pub mod book;
pub mod borrower;
pub mod commands;
pub mod errors;
pub mod loan;
pub mod rules;
pub mod value_objects;

pub use book::{Book, NewBook};
pub use borrower::{Borrower, NewBorrower};
pub use errors::*;
pub use loan::{Loan, NewLoan};
pub use value_objects::*;
