//! Expense records and their validated input forms

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::{Category, Description, ExpenseStatus, ExpenseTitle, Money, ValidationError};

/// Suggested categories, in display order
pub const DEFAULT_CATEGORIES: [&str; 9] = [
    "Food & Dining",
    "Transportation",
    "Shopping",
    "Entertainment",
    "Bills & Utilities",
    "Healthcare",
    "Travel",
    "Education",
    "Other",
];

/// ISO-4217 style currency code: exactly three ASCII letters, stored upper-case
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: "currency" });
        }
        if trimmed.len() != 3 || !trimmed.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(ValidationError::InvalidFormat {
                field: "currency",
                reason: "must be a 3-letter code (e.g., USD, EUR)",
            });
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for CurrencyCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Stored expense
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expense {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub category: String,
    pub amount: Money,
    pub currency: String,
    pub date: NaiveDate,
    pub description: String,
    pub status: ExpenseStatus,
    pub kanban_card_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for creating an expense
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    pub title: ExpenseTitle,
    pub category: Category,
    pub amount: Money,
    pub currency: CurrencyCode,
    pub date: NaiveDate,
    pub description: Description,
    pub status: ExpenseStatus,
}

impl NewExpense {
    /// Validate raw fields into a new expense.
    ///
    /// The amount must be strictly positive.
    pub fn new(
        title: &str,
        category: &str,
        amount: Money,
        currency: &str,
        date: NaiveDate,
        description: Option<&str>,
        status: Option<ExpenseStatus>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            title: ExpenseTitle::new(title)?,
            category: Category::new(category)?,
            amount: amount.require_positive()?,
            currency: CurrencyCode::new(currency)?,
            date,
            description: Description::new(description.unwrap_or(""))?,
            status: status.unwrap_or_default(),
        })
    }
}

/// Validated partial update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpensePatch {
    pub title: Option<ExpenseTitle>,
    pub category: Option<Category>,
    pub amount: Option<Money>,
    pub currency: Option<CurrencyCode>,
    pub date: Option<NaiveDate>,
    pub description: Option<Description>,
    pub status: Option<ExpenseStatus>,
}

impl ExpensePatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.category.is_none()
            && self.amount.is_none()
            && self.currency.is_none()
            && self.date.is_none()
            && self.description.is_none()
            && self.status.is_none()
    }

    /// Apply the patch onto an existing expense in memory.
    pub fn apply(&self, expense: &mut Expense) {
        if let Some(title) = &self.title {
            expense.title = title.as_str().to_owned();
        }
        if let Some(category) = &self.category {
            expense.category = category.as_str().to_owned();
        }
        if let Some(amount) = self.amount {
            expense.amount = amount;
        }
        if let Some(currency) = &self.currency {
            expense.currency = currency.as_str().to_owned();
        }
        if let Some(date) = self.date {
            expense.date = date;
        }
        if let Some(description) = &self.description {
            expense.description = description.as_str().to_owned();
        }
        if let Some(status) = self.status {
            expense.status = status;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    #[test]
    fn currency_is_upper_cased() {
        assert_eq!(CurrencyCode::new(" inr ").unwrap().as_str(), "INR");
    }

    #[test]
    fn currency_must_be_three_letters() {
        assert!(CurrencyCode::new("US").is_err());
        assert!(CurrencyCode::new("USDX").is_err());
        assert!(CurrencyCode::new("U$D").is_err());
        assert!(matches!(
            CurrencyCode::new(""),
            Err(ValidationError::Empty { field: "currency" })
        ));
    }

    #[test]
    fn new_expense_defaults() {
        let e = NewExpense::new(
            "Lunch",
            "Food & Dining",
            Money::from_cents(2550),
            "usd",
            date(),
            None,
            None,
        )
        .unwrap();
        assert_eq!(e.status, ExpenseStatus::Logged);
        assert_eq!(e.description.as_str(), "");
        assert_eq!(e.currency.as_str(), "USD");
    }

    #[test]
    fn new_expense_rejects_zero_amount() {
        let err = NewExpense::new("Lunch", "Food", Money::ZERO, "USD", date(), None, None)
            .unwrap_err();
        assert_eq!(err, ValidationError::NotPositive { field: "amount" });
    }

    #[test]
    fn patch_applies_only_set_fields() {
        let now = Utc::now();
        let mut expense = Expense {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Taxi".into(),
            category: "Transportation".into(),
            amount: Money::from_cents(1500),
            currency: "USD".into(),
            date: date(),
            description: String::new(),
            status: ExpenseStatus::Logged,
            kanban_card_id: None,
            created_at: now,
            updated_at: now,
        };
        let patch = ExpensePatch {
            status: Some(ExpenseStatus::Cleared),
            amount: Some(Money::from_cents(1800)),
            ..Default::default()
        };
        assert!(!patch.is_empty());
        patch.apply(&mut expense);
        assert_eq!(expense.status, ExpenseStatus::Cleared);
        assert_eq!(expense.amount.cents(), 1800);
        assert_eq!(expense.title, "Taxi");
    }
}
