use crate::domain::model::{FieldValidator, Row};
use regex::Regex;

/// Text a null cell is turned into before pattern matching.
pub const NULL_TEXT: &str = "None";

pub fn is_valid(value: Option<&str>, pattern: &Regex) -> bool {
    pattern.is_match(value.unwrap_or(NULL_TEXT))
}

/// True when every validator accepts its column. A column absent from the
/// row's schema reads as null.
pub fn passes_all(row: &Row, validators: &[FieldValidator]) -> bool {
    validators
        .iter()
        .all(|v| is_valid(row.get(v.column()), v.pattern()))
}
