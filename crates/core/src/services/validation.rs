//! Input checks shared by the ledger services. Each helper returns the
//! cleaned value so callers validate everything before mutating.

use rust_decimal::Decimal;

use crate::errors::CoreError;
use crate::models::money::amount_from_f64;

/// Trimmed, non-empty text field.
pub(crate) fn required_text(field: &str, value: &str) -> Result<String, CoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::InvalidField(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

/// A finite monetary amount (negative allowed) as an exact decimal.
pub(crate) fn money_amount(field: &str, value: f64) -> Result<Decimal, CoreError> {
    amount_from_f64(value).ok_or_else(|| {
        CoreError::InvalidAmount(format!(
            "{field} must be a finite number within range, got {value}"
        ))
    })
}

/// A finite numeric field of a record.
pub(crate) fn finite_field(field: &str, value: f64) -> Result<f64, CoreError> {
    if !value.is_finite() {
        return Err(CoreError::InvalidField(format!(
            "{field} must be a finite number, got {value}"
        )));
    }
    Ok(value)
}

/// Case-insensitive name comparison.
pub(crate) fn same_name(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// `true` when `query` (already lowercased) is found in `text`, ignoring case.
pub(crate) fn matches_query(text: &str, query: &str) -> bool {
    text.to_lowercase().contains(query)
}
