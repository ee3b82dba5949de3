use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single bill inside a Month.
///
/// Amounts are stored in the configured bill currency. A negative amount
/// is a credit or rebate and reduces the month's total. Amounts are exact
/// decimals and travel as plain JSON numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    /// Stable row identity. Snapshots written before ids existed get a
    /// fresh one on load.
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,

    /// Display name, unique per month (case-insensitive)
    pub name: String,

    /// Signed amount
    #[serde(with = "crate::models::money::as_number")]
    pub amount: Decimal,

    /// Whether this bill has been paid
    #[serde(default)]
    pub paid: bool,
}

impl Bill {
    pub fn new(name: impl Into<String>, amount: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            amount,
            paid: false,
        }
    }
}

/// An entry of the base bill template that seeds every new Month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseBill {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    #[serde(with = "crate::models::money::as_number")]
    pub amount: Decimal,
}

impl BaseBill {
    pub fn new(name: impl Into<String>, amount: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            amount,
        }
    }

    /// Materialize this template entry as an unpaid bill with its own id.
    pub fn to_bill(&self) -> Bill {
        Bill::new(self.name.clone(), self.amount)
    }
}
