//! Bounded free-text fields
//!
//! Each type trims its input and enforces a maximum length counted in
//! characters. Required fields reject blank input.

use serde::Serialize;

use super::ValidationError;

fn bounded(
    field: &'static str,
    raw: &str,
    max: usize,
    required: bool,
) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if required && trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    if trimmed.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(trimmed.to_owned())
}

macro_rules! text_field {
    ($(#[$meta:meta])* $name:ident, $field:literal, $max:expr, $required:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Maximum length in characters
            pub const MAX_LEN: usize = $max;

            pub fn new(s: &str) -> Result<Self, ValidationError> {
                bounded($field, s, Self::MAX_LEN, $required).map(Self)
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

text_field!(
    /// Expense title
    ExpenseTitle, "title", 256, true
);
text_field!(
    /// Expense category (free text; see `DEFAULT_CATEGORIES` for suggestions)
    Category, "category", 64, true
);
text_field!(
    /// Optional long-form description; empty is allowed
    Description, "description", 2000, false
);
text_field!(BoardName, "board name", 64, true);
text_field!(ColumnName, "column name", 64, true);
text_field!(CardTitle, "card title", 256, true);
text_field!(Label, "label", 32, true);
text_field!(
    /// Display name of an account
    UserName, "name", 128, true
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_input() {
        let title = ExpenseTitle::new("  Lunch  ").unwrap();
        assert_eq!(title.as_str(), "Lunch");
    }

    #[test]
    fn rejects_blank_required() {
        let err = Category::new("   ").unwrap_err();
        assert_eq!(err, ValidationError::Empty { field: "category" });
    }

    #[test]
    fn description_may_be_empty() {
        assert_eq!(Description::new("").unwrap().as_str(), "");
    }

    #[test]
    fn length_counts_characters() {
        // 64 multi-byte characters fit
        let name = "₹".repeat(64);
        assert!(BoardName::new(&name).is_ok());

        let too_long = "a".repeat(65);
        let err = BoardName::new(&too_long).unwrap_err();
        assert!(matches!(err, ValidationError::TooLong { max: 64, .. }));
    }

    #[test]
    fn board_names_allow_spaces() {
        assert!(BoardName::new("Expense Tracker").is_ok());
    }
}
