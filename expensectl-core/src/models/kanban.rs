//! Kanban board records
//!
//! A board owns ordered columns; a column owns ordered cards. `order` is a
//! dense 0-based index within the parent, maintained by `crate::reorder`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::{Label, ValidationError};

/// Name given to the board created by "initialize default board"
pub const DEFAULT_BOARD_NAME: &str = "Expense Tracker";

/// Columns created on a default board, as (name, order)
pub const DEFAULT_COLUMNS: [(&str, u32); 4] =
    [("To Log", 0), ("Verify", 1), ("Paid", 2), ("Reimburse", 3)];

/// Maximum number of labels on a card
const MAX_LABELS: usize = 16;

/// Validated card labels (deduplicated, order preserved)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Labels(Vec<String>);

impl Labels {
    pub fn new<I, S>(labels: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for raw in labels {
            let label = Label::new(raw.as_ref())?.into_string();
            if !out.contains(&label) {
                out.push(label);
            }
        }
        if out.len() > MAX_LABELS {
            return Err(ValidationError::TooMany {
                field: "labels",
                max: MAX_LABELS,
            });
        }
        Ok(Self(out))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Board {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub id: Uuid,
    pub board_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub order: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Card {
    pub id: Uuid,
    pub board_id: Uuid,
    pub column_id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub labels: Vec<String>,
    pub order: u32,
    pub due_date: Option<NaiveDate>,
    pub expense_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnWithCards {
    #[serde(flatten)]
    pub column: Column,
    pub cards: Vec<Card>,
}

/// Board with its columns (by order) and each column's cards (by order)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardWithColumns {
    pub board: Board,
    pub columns: Vec<ColumnWithCards>,
}

impl BoardWithColumns {
    /// Group a flat card list under its columns.
    ///
    /// Cards whose column isn't in `columns` are dropped.
    pub fn assemble(board: Board, mut columns: Vec<Column>, mut cards: Vec<Card>) -> Self {
        columns.sort_by_key(|c| c.order);
        cards.sort_by_key(|c| c.order);

        let columns = columns
            .into_iter()
            .map(|column| {
                let cards = cards
                    .iter()
                    .filter(|card| card.column_id == column.id)
                    .cloned()
                    .collect();
                ColumnWithCards { column, cards }
            })
            .collect();

        Self { board, columns }
    }

    pub fn column_named(&self, name: &str) -> Option<&ColumnWithCards> {
        self.columns.iter().find(|c| c.column.name == name)
    }
}
