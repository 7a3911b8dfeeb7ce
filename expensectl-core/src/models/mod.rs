//! Domain models with validation at construction
//!
//! All user input is validated when creating these types.
//! Invalid input returns ValidationError, not panic.

pub mod validation;
pub mod text;
pub mod money;
pub mod status;
pub mod expense;
pub mod kanban;
pub mod user;
pub mod pagination;

pub use validation::ValidationError;
pub use text::{
    BoardName, CardTitle, Category, ColumnName, Description, ExpenseTitle, Label, UserName,
};
pub use money::Money;
pub use status::ExpenseStatus;
pub use expense::{CurrencyCode, Expense, ExpensePatch, NewExpense, DEFAULT_CATEGORIES};
pub use kanban::{
    Board, BoardWithColumns, Card, Column, ColumnWithCards, Labels, DEFAULT_BOARD_NAME,
    DEFAULT_COLUMNS,
};
pub use user::{Email, Password, User};
pub use pagination::{Pagination, Paginated, PaginationParams};
