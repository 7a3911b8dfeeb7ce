//! expensectl-core: domain model for personal expense tracking
//!
//! Everything here is pure and synchronous: validated input types,
//! the CSV codec, report aggregation and the board reorder planner.
//! Persistence and HTTP live in `expensectl-server`.

pub mod config;
pub mod csv;
pub mod currency;
pub mod error;
pub mod models;
pub mod reorder;
pub mod reports;

pub use config::ExpenseConfig;
pub use error::{CoreError, Result};
pub use models::{
    Board, BoardWithColumns, Card, Column, ColumnWithCards, Expense, ExpensePatch, ExpenseStatus,
    Money, NewExpense, User, ValidationError,
};
