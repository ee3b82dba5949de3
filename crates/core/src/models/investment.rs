use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::currency::Currency;

/// An open position, tracked by cost basis (not market value).
///
/// `amount` is the authoritative purchase cost. It is recorded by the user
/// and may differ from `purchase_price_per_unit * quantity`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Investment {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,

    /// Globally unique among open investments (case-insensitive)
    pub name: String,

    /// Purchase cost in `currency`
    pub amount: f64,

    pub currency: Currency,

    /// Platform tag, matched by value against the dataset's platform list
    pub platform: String,

    /// Recurring contribution in `currency`. A `null` or non-finite value
    /// in a snapshot reads as 0.
    #[serde(default, with = "contribution")]
    pub monthly_contribution: f64,

    pub purchase_price_per_unit: f64,

    pub quantity: f64,
}

/// Written as an optional number so `null` from older backends reads back.
mod contribution {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_some(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        let value = Option::<f64>::deserialize(deserializer)?;
        Ok(value.filter(|v| v.is_finite()).unwrap_or(0.0))
    }
}

/// User-supplied fields for creating or editing an investment.
///
/// `monthly_contribution` falls back to 0 when absent or not finite.
#[derive(Debug, Clone, PartialEq)]
pub struct InvestmentFields {
    pub name: String,
    pub amount: f64,
    pub currency: Currency,
    pub platform: String,
    pub monthly_contribution: Option<f64>,
    pub purchase_price_per_unit: f64,
    pub quantity: f64,
}

impl InvestmentFields {
    pub fn new(
        name: impl Into<String>,
        amount: f64,
        currency: Currency,
        platform: impl Into<String>,
        purchase_price_per_unit: f64,
        quantity: f64,
    ) -> Self {
        Self {
            name: name.into(),
            amount,
            currency,
            platform: platform.into(),
            monthly_contribution: None,
            purchase_price_per_unit,
            quantity,
        }
    }

    /// Builder-style setter for the monthly contribution.
    pub fn with_monthly_contribution(mut self, contribution: f64) -> Self {
        self.monthly_contribution = Some(contribution);
        self
    }
}

/// Immutable record of a realized trade.
///
/// Created exactly once when an open investment is sold. `profit_loss` is
/// expressed in `sell_currency`; `profit_loss_reporting` is the same figure
/// in the fixed reporting currency and keeps the snapshot key
/// `profitLossCHF`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoldInvestment {
    pub name: String,
    pub platform: String,
    pub purchase_currency: Currency,
    pub sell_currency: Currency,
    pub purchase_price_per_unit: f64,
    pub sell_price_per_unit: f64,
    pub quantity: f64,
    pub purchase_amount: f64,
    pub sale_amount: f64,
    pub profit_loss: f64,
    #[serde(rename = "profitLossCHF")]
    pub profit_loss_reporting: f64,
    pub date_sold: NaiveDate,
}

impl SoldInvestment {
    /// Return on this trade as a percentage of the purchase amount.
    /// A zero purchase amount yields 0.
    pub fn return_pct(&self) -> f64 {
        if self.purchase_amount != 0.0 {
            self.profit_loss / self.purchase_amount * 100.0
        } else {
            0.0
        }
    }
}
