mod errors;
mod loan_service;
mod queries;

pub use crate::application::ServiceDependencies;
pub use errors::{EntityKind, LoanApplicationError, Result};
pub use loan_service::{borrow_book, return_book};
pub use queries::{ActiveLoans, active_loans, loan_history};
