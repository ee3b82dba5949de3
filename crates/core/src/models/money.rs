//! Exact bill amounts.
//!
//! Amounts enter as floats (user input, JSON numbers) and are kept as
//! [`Decimal`] so sums never pick up binary rounding error.

use std::str::FromStr;

use rust_decimal::Decimal;

/// The decimal written by the float's shortest round-trip text, so `0.1`
/// becomes exactly `0.1`. `None` for non-finite or out-of-range values.
pub fn amount_from_f64(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    Decimal::from_str(&value.to_string()).ok()
}

/// Serde adapter writing a [`Decimal`] as a plain number.
pub mod as_number {
    use rust_decimal::Decimal;
    use serde::de::Error as _;
    use serde::ser::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::amount_from_f64;

    pub fn serialize<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
        let number: f64 = value
            .to_string()
            .parse()
            .map_err(|_| S::Error::custom(format!("amount {value} has no float form")))?;
        serializer.serialize_f64(number)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
        let number = f64::deserialize(deserializer)?;
        amount_from_f64(number)
            .ok_or_else(|| D::Error::custom(format!("amount {number} is out of range")))
    }
}
