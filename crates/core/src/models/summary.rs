use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::currency::Currency;

/// Totals for a single month. Amounts are exact decimals in the bill
/// currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthSummary {
    pub year: String,
    pub month: u32,
    pub currency: Currency,
    #[serde(with = "crate::models::money::as_number")]
    pub total: Decimal,
    #[serde(with = "crate::models::money::as_number")]
    pub paid: Decimal,
    /// `total - paid`
    #[serde(with = "crate::models::money::as_number")]
    pub unpaid: Decimal,
    /// Rounded share of `paid` in `total`, 0 when the total is 0
    pub percent_paid: u8,
}

/// Bill figures across every year and month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallBillSummary {
    /// Currency of `total_paid`
    pub currency: Currency,
    /// Sum of paid bills, converted from the bill currency
    pub total_paid: f64,
    pub total_bills: usize,
    pub paid_bills: usize,
    pub unpaid_bills: usize,
}

/// Cost-basis totals of the open positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentSummary {
    pub currency: Currency,
    pub total_value: f64,
    pub total_monthly_contribution: f64,
    pub investment_count: usize,
    pub platform_count: usize,
    pub by_platform: Vec<PlatformValue>,
}

/// Summed, converted value of the open positions held on one platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformValue {
    pub platform: String,
    pub value: f64,
}

/// Realized-gain statistics over every sold investment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealizedGainSummary {
    /// The fixed reporting currency
    pub currency: Currency,
    pub total_realized_gain: f64,
    pub count: usize,
    /// Mean of the per-trade return percentages, 0 when nothing was sold
    pub average_return_pct: f64,
}

/// One step of the cumulative realized P/L series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CumulativePoint {
    pub date: NaiveDate,
    pub name: String,
    /// This trade's P/L in the reporting currency
    pub profit_loss: f64,
    /// Running total up to and including this trade
    pub cumulative: f64,
}

/// Paid vs unpaid split of one month, for the bills chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillsSplit {
    #[serde(with = "crate::models::money::as_number")]
    pub paid: Decimal,
    /// Sum of the bills not yet paid
    #[serde(with = "crate::models::money::as_number")]
    pub unpaid: Decimal,
}

/// Figures a sale would produce, computed without touching the ledgers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalePreview {
    pub sell_currency: Currency,
    pub sale_amount: f64,
    /// Purchase amount expressed in the sell currency
    pub purchase_amount_converted: f64,
    pub profit_loss: f64,
    pub reporting_currency: Currency,
    pub profit_loss_reporting: f64,
}
