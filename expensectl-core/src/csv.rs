//! CSV import/export for expenses
//!
//! Format: a header row naming the columns (any order, case-insensitive)
//! followed by one expense per row.
//!
//! ```text
//! title,category,amount,currency,date,description
//! "Sample Expense","Food & Dining",25.50,USD,2024-01-15,"Lunch at restaurant"
//! ```
//!
//! Import is all-or-nothing: every row is validated and all problems are
//! reported together.

use std::fs;
use std::path::Path;

use chrono::{DateTime, NaiveDate};
use thiserror::Error;

use crate::error::CoreError;

use crate::models::{
    Category, CurrencyCode, Description, Expense, ExpenseStatus, ExpenseTitle, Money, NewExpense,
    ValidationError,
};

pub const CSV_HEADERS: [&str; 6] = ["title", "category", "amount", "currency", "date", "description"];

pub const REQUIRED_CSV_FIELDS: [&str; 5] = ["title", "category", "amount", "currency", "date"];

/// Why a CSV document was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CsvError {
    #[error("CSV must have at least a header row and one data row")]
    TooShort,

    #[error("Missing required headers: {}", .0.join(", "))]
    MissingHeaders(Vec<String>),

    #[error("Row {row}: unterminated quoted field")]
    UnterminatedQuote { row: usize },

    #[error("CSV validation errors:\n{}", .0.join("\n"))]
    Rows(Vec<String>),
}

impl CsvError {
    /// Individual problem descriptions, one per line of the report
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::Rows(rows) => rows.clone(),
            other => vec![other.to_string()],
        }
    }
}

/// One data row, as text, after header mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvExpense {
    pub title: String,
    pub category: String,
    pub amount: String,
    pub currency: String,
    pub date: String,
    pub description: String,
}

impl CsvExpense {
    fn field(&self, name: &str) -> &str {
        match name {
            "title" => &self.title,
            "category" => &self.category,
            "amount" => &self.amount,
            "currency" => &self.currency,
            "date" => &self.date,
            _ => &self.description,
        }
    }

    /// Problems with this row; `row` is the 1-based row number in the file.
    pub fn validate(&self, row: usize) -> Vec<String> {
        let mut errors = Vec::new();

        for field in REQUIRED_CSV_FIELDS {
            if self.field(field).trim().is_empty() {
                errors.push(format!("Row {}: {} is required", row, field));
            }
        }

        if !self.amount.trim().is_empty() && Money::parse_positive(&self.amount).is_err() {
            errors.push(format!("Row {}: amount must be a positive number", row));
        }

        if !self.date.trim().is_empty() && parse_date(&self.date).is_none() {
            errors.push(format!(
                "Row {}: date must be a valid date (YYYY-MM-DD format recommended)",
                row
            ));
        }

        let currency = self.currency.trim();
        if !currency.is_empty() && CurrencyCode::new(currency).is_err() {
            errors.push(format!(
                "Row {}: currency must be a 3-letter code (e.g., USD, EUR)",
                row
            ));
        }

        // Length caps, checked by the same types the import builds
        let text_checks = [
            (self.title.trim().is_empty(), ExpenseTitle::new(&self.title).err()),
            (self.category.trim().is_empty(), Category::new(&self.category).err()),
            (false, Description::new(&self.description).err()),
        ];
        for (blank, err) in text_checks {
            if let (false, Some(e)) = (blank, err) {
                errors.push(format!("Row {}: {}", row, e));
            }
        }

        errors
    }

    /// Convert a validated row into an expense draft with status `logged`.
    pub fn into_new_expense(self) -> Result<NewExpense, ValidationError> {
        let amount = Money::parse_positive(&self.amount)?;
        let date = parse_date(&self.date).ok_or(ValidationError::InvalidFormat {
            field: "date",
            reason: "must be a valid date",
        })?;
        NewExpense::new(
            &self.title,
            &self.category,
            amount,
            &self.currency,
            date,
            Some(&self.description),
            Some(ExpenseStatus::Logged),
        )
    }
}

/// Accepts `YYYY-MM-DD`, `YYYY/MM/DD`, `MM/DD/YYYY` and RFC 3339 timestamps.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
}

/// Parse and validate a CSV document.
pub fn parse_csv(text: &str) -> Result<Vec<CsvExpense>, CsvError> {
    let records = split_records(text)?;
    if records.len() < 2 {
        return Err(CsvError::TooShort);
    }

    let headers: Vec<String> = records[0].iter().map(|h| h.trim().to_lowercase()).collect();
    let missing: Vec<String> = REQUIRED_CSV_FIELDS
        .iter()
        .filter(|field| !headers.iter().any(|h| h == *field))
        .map(|field| field.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(CsvError::MissingHeaders(missing));
    }

    let index = |name: &str| headers.iter().position(|h| h == name);
    let (title, category, amount, currency, date, description) = (
        index("title"),
        index("category"),
        index("amount"),
        index("currency"),
        index("date"),
        index("description"),
    );

    let mut expenses = Vec::with_capacity(records.len() - 1);
    let mut errors = Vec::new();

    for (i, values) in records.iter().enumerate().skip(1) {
        let row_number = i + 1;
        if values.len() != headers.len() {
            errors.push(format!("Row {}: incorrect number of columns", row_number));
            continue;
        }

        let get = |idx: Option<usize>| {
            idx.and_then(|i| values.get(i))
                .map(|v| unneutralize(v.trim()).to_owned())
                .unwrap_or_default()
        };

        let row = CsvExpense {
            title: get(title),
            category: get(category),
            amount: get(amount),
            currency: get(currency),
            date: get(date),
            description: get(description),
        };

        let row_errors = row.validate(row_number);
        if row_errors.is_empty() {
            expenses.push(row);
        } else {
            errors.extend(row_errors);
        }
    }

    if !errors.is_empty() {
        return Err(CsvError::Rows(errors));
    }

    Ok(expenses)
}

/// Parse a CSV document straight into expense drafts.
pub fn import_expenses(text: &str) -> Result<Vec<NewExpense>, CsvError> {
    let rows = parse_csv(text)?;
    let mut drafts = Vec::with_capacity(rows.len());
    let mut errors = Vec::new();
    for (i, row) in rows.into_iter().enumerate() {
        match row.into_new_expense() {
            Ok(draft) => drafts.push(draft),
            Err(e) => errors.push(format!("Row {}: {}", i + 2, e)),
        }
    }
    if errors.is_empty() {
        Ok(drafts)
    } else {
        Err(CsvError::Rows(errors))
    }
}

fn read_text(path: &Path) -> crate::Result<String> {
    if !path.exists() {
        return Err(CoreError::path_not_found(path));
    }
    Ok(fs::read_to_string(path)?)
}

/// Read and validate a CSV file without building drafts.
pub fn read_csv_file(path: &Path) -> crate::Result<Vec<CsvExpense>> {
    Ok(parse_csv(&read_text(path)?)?)
}

/// Read a CSV file straight into expense drafts.
pub fn import_file(path: &Path) -> crate::Result<Vec<NewExpense>> {
    Ok(import_expenses(&read_text(path)?)?)
}

/// Render expenses as CSV with the standard header.
pub fn to_csv(expenses: &[Expense]) -> String {
    let mut lines = Vec::with_capacity(expenses.len() + 1);
    lines.push(CSV_HEADERS.join(","));
    for expense in expenses {
        lines.push(
            [
                quote(&expense.title),
                quote(&expense.category),
                expense.amount.to_string(),
                expense.currency.clone(),
                expense.date.format("%Y-%m-%d").to_string(),
                quote(&expense.description),
            ]
            .join(","),
        );
    }
    lines.join("\n")
}

/// Header plus one sample row, for users starting an import file.
pub fn template() -> String {
    [
        CSV_HEADERS.join(","),
        [
            "\"Sample Expense\"",
            "\"Food & Dining\"",
            "25.50",
            "USD",
            "2024-01-15",
            "\"Lunch at restaurant\"",
        ]
        .join(","),
    ]
    .join("\n")
}

fn should_neutralize(value: &str) -> bool {
    matches!(
        value.trim_start().chars().next(),
        Some('=') | Some('+') | Some('-') | Some('@')
    )
}

/// Always-quoted text field; spreadsheet formula prefixes get a leading `'`.
fn quote(value: &str) -> String {
    let safe = if should_neutralize(value) {
        format!("'{}", value)
    } else {
        value.to_owned()
    };
    format!("\"{}\"", safe.replace('"', "\"\""))
}

/// Undo `quote`'s formula neutralization on import.
fn unneutralize(value: &str) -> &str {
    match value.strip_prefix('\'') {
        Some(rest) if should_neutralize(rest) => rest,
        _ => value,
    }
}

/// Split text into records of raw fields.
///
/// Handles double-quoted fields with `""` escapes, embedded commas and
/// newlines. Blank lines are dropped.
fn split_records(text: &str) -> Result<Vec<Vec<String>>, CsvError> {
    let mut records: Vec<Vec<String>> = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    fn finish_record(records: &mut Vec<Vec<String>>, record: &mut Vec<String>, field: &mut String) {
        record.push(std::mem::take(field));
        let blank = record.len() == 1 && record[0].trim().is_empty();
        let done = std::mem::take(record);
        if !blank {
            records.push(done);
        }
    }

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.trim().is_empty() => {
                field.clear();
                in_quotes = true;
            }
            ',' => record.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => finish_record(&mut records, &mut record, &mut field),
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(CsvError::UnterminatedQuote {
            row: records.len() + 1,
        });
    }
    if !field.is_empty() || !record.is_empty() {
        finish_record(&mut records, &mut record, &mut field);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn expense(title: &str, description: &str) -> Expense {
        let now = Utc::now();
        Expense {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: title.into(),
            category: "Food & Dining".into(),
            amount: Money::from_cents(2550),
            currency: "USD".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            description: description.into(),
            status: ExpenseStatus::Logged,
            kanban_card_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn template_parses_cleanly() {
        let rows = parse_csv(&template()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "Sample Expense");
        assert_eq!(rows[0].category, "Food & Dining");
        assert_eq!(rows[0].description, "Lunch at restaurant");
    }

    #[test]
    fn headers_any_order_and_case() {
        let text = "Date, AMOUNT ,title,currency,category\n2024-02-01,12,Bus,usd,Transportation\n";
        let rows = parse_csv(text).unwrap();
        assert_eq!(rows[0].amount, "12");
        assert_eq!(rows[0].description, "");

        let draft = rows[0].clone().into_new_expense().unwrap();
        assert_eq!(draft.currency.as_str(), "USD");
        assert_eq!(draft.amount.cents(), 1200);
        assert_eq!(draft.status, ExpenseStatus::Logged);
    }

    #[test]
    fn missing_headers_are_listed() {
        let err = parse_csv("title,amount\nA,1\n").unwrap_err();
        assert_eq!(
            err,
            CsvError::MissingHeaders(vec!["category".into(), "currency".into(), "date".into()])
        );
        assert_eq!(
            err.to_string(),
            "Missing required headers: category, currency, date"
        );
    }

    #[test]
    fn needs_a_data_row() {
        assert_eq!(parse_csv("title,category,amount,currency,date\n\n  \n"), Err(CsvError::TooShort));
        assert_eq!(parse_csv(""), Err(CsvError::TooShort));
    }

    #[test]
    fn collects_every_row_error() {
        let text = "\
title,category,amount,currency,date
,Food,-4,USD,2024-01-01
Cab,Transport,10,DOLLARS,someday
Ok,Other,1,USD
";
        let err = parse_csv(text).unwrap_err();
        let messages = err.messages();
        assert_eq!(
            messages,
            vec![
                "Row 2: title is required",
                "Row 2: amount must be a positive number",
                "Row 3: date must be a valid date (YYYY-MM-DD format recommended)",
                "Row 3: currency must be a 3-letter code (e.g., USD, EUR)",
                "Row 4: incorrect number of columns",
            ]
        );
    }

    #[test]
    fn validation_matches_what_import_accepts() {
        let long_title = "x".repeat(300);
        let text = format!(
            "title,category,amount,currency,date\n\
             {long_title},Food,4,USD,2024-01-01\n\
             Cab,Transport,10,U$D,2024-01-02\n"
        );
        let err = parse_csv(&text).unwrap_err();
        assert_eq!(
            err.messages(),
            vec![
                "Row 2: title exceeds maximum length of 256 characters",
                "Row 3: currency must be a 3-letter code (e.g., USD, EUR)",
            ]
        );
        assert_eq!(import_expenses(&text).unwrap_err(), err);
    }

    #[test]
    fn quoted_fields_keep_commas_quotes_and_newlines() {
        let text = "title,category,amount,currency,date,description\n\
                    \"Dinner, with \"\"friends\"\"\",Food,40,USD,2024/03/02,\"line one\nline two\"\n";
        let rows = parse_csv(text).unwrap();
        assert_eq!(rows[0].title, "Dinner, with \"friends\"");
        assert_eq!(rows[0].description, "line one\nline two");
        assert_eq!(
            parse_date(&rows[0].date),
            NaiveDate::from_ymd_opt(2024, 3, 2)
        );
    }

    #[test]
    fn unterminated_quote_is_reported() {
        let text = "title,category,amount,currency,date\n\"Oops,Food,1,USD,2024-01-01\n";
        assert_eq!(parse_csv(text), Err(CsvError::UnterminatedQuote { row: 2 }));
    }

    #[test]
    fn export_quotes_and_neutralizes() {
        let csv = to_csv(&[expense("=SUM(A1)", "said \"hi\"")]);
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("title,category,amount,currency,date,description"));
        assert_eq!(
            lines.next(),
            Some("\"'=SUM(A1)\",\"Food & Dining\",25.50,USD,2024-01-15,\"said \"\"hi\"\"\"")
        );
    }

    #[test]
    fn exported_rows_import_back() {
        let original = vec![expense("=cmd", "a, b"), expense("Coffee", "")];
        let drafts = import_expenses(&to_csv(&original)).unwrap();
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].title.as_str(), "=cmd");
        assert_eq!(drafts[0].description.as_str(), "a, b");
        assert_eq!(drafts[1].amount, original[1].amount);
        assert_eq!(drafts[1].date, original[1].date);
    }

    #[test]
    fn files_are_read_and_checked() {
        let dir = tempfile::TempDir::new().unwrap();
        let good = dir.path().join("good.csv");
        fs::write(&good, template()).unwrap();
        assert_eq!(read_csv_file(&good).unwrap().len(), 1);
        assert_eq!(import_file(&good).unwrap()[0].title.as_str(), "Sample Expense");

        let bad = dir.path().join("bad.csv");
        fs::write(&bad, "title,amount\nA,1\n").unwrap();
        assert!(matches!(
            import_file(&bad),
            Err(CoreError::Csv(CsvError::MissingHeaders(_)))
        ));

        let missing = dir.path().join("missing.csv");
        assert!(matches!(
            read_csv_file(&missing),
            Err(CoreError::PathNotFound { .. })
        ));
    }

    #[test]
    fn date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15);
        assert_eq!(parse_date("2024-01-15"), expected);
        assert_eq!(parse_date("2024/01/15"), expected);
        assert_eq!(parse_date("01/15/2024"), expected);
        assert_eq!(parse_date("2024-01-15T10:30:00Z"), expected);
        assert_eq!(parse_date("15th Jan"), None);
    }
}
