use std::fmt::Write as _;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use super::currency_service::CurrencyService;
use super::investment_service::InvestmentService;
use crate::errors::CoreError;
use crate::models::bill::Bill;
use crate::models::currency::Currency;
use crate::models::dataset::Dataset;
use crate::models::summary::{
    BillsSplit, CumulativePoint, InvestmentSummary, MonthSummary, OverallBillSummary,
    RealizedGainSummary,
};

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Derives every displayed total from the ledgers.
///
/// All views are recomputed on demand; nothing is cached.
pub struct SummaryService {
    investment_service: InvestmentService,
}

impl SummaryService {
    pub fn new() -> Self {
        Self {
            investment_service: InvestmentService::new(),
        }
    }

    // ── Bills ───────────────────────────────────────────────────────

    /// Totals of one month's bills.
    ///
    /// Sums are exact decimals and `unpaid` is `total - paid`, so
    /// `total == paid + unpaid` holds with no rounding error.
    pub fn month_summary(
        &self,
        year: &str,
        month: u32,
        bills: &[Bill],
        currency: Currency,
    ) -> MonthSummary {
        let total = sum_amounts(bills.iter());
        let paid = sum_amounts(bills.iter().filter(|b| b.paid));

        MonthSummary {
            year: year.to_string(),
            month,
            currency,
            total,
            paid,
            unpaid: total.saturating_sub(paid),
            percent_paid: percent_paid(paid, total),
        }
    }

    /// Paid vs unpaid sums of one month.
    pub fn bills_split(&self, bills: &[Bill]) -> BillsSplit {
        BillsSplit {
            paid: sum_amounts(bills.iter().filter(|b| b.paid)),
            unpaid: sum_amounts(bills.iter().filter(|b| !b.paid)),
        }
    }

    /// Paid value and bill counts across every year and month.
    /// Bill amounts are converted from `bill_currency` to `target`.
    pub fn overall_bill_summary(
        &self,
        dataset: &Dataset,
        currency_service: &CurrencyService,
        bill_currency: Currency,
        target: Currency,
    ) -> Result<OverallBillSummary, CoreError> {
        let bills = || dataset.years.values().flat_map(|m| m.values()).flatten();
        let total_bills = bills().count();
        let paid_bills = bills().filter(|b| b.paid).count();

        let paid_sum = sum_amounts(bills().filter(|b| b.paid));
        let paid_sum = paid_sum.to_f64().ok_or_else(|| {
            CoreError::InvalidAmount(format!("Paid total {paid_sum} is out of range"))
        })?;
        let total_paid = currency_service.convert(paid_sum, bill_currency, target)?;

        Ok(OverallBillSummary {
            currency: target,
            total_paid,
            total_bills,
            paid_bills,
            unpaid_bills: total_bills - paid_bills,
        })
    }

    /// Plain-text report of one month, one line per bill.
    pub fn export_month_summary(
        &self,
        year: &str,
        month: u32,
        bills: &[Bill],
        currency: Currency,
    ) -> String {
        let summary = self.month_summary(year, month, bills, currency);
        let month_name = MONTH_NAMES
            .get(month.saturating_sub(1) as usize)
            .copied()
            .unwrap_or("Unknown");

        let mut out = String::new();
        let _ = writeln!(out, "Summary for {month_name} {year}");
        let _ = writeln!(out, "{}", "=".repeat(60));
        let _ = writeln!(out);
        let _ = writeln!(out, "Total Expenses: {:.2} {currency}", summary.total);
        let _ = writeln!(out, "Total Paid: {:.2} {currency}", summary.paid);
        let _ = writeln!(out, "Total Unpaid: {:.2} {currency}", summary.unpaid);
        let _ = writeln!(out, "Percentage Paid: {}%", summary.percent_paid);
        let _ = writeln!(out);
        let _ = writeln!(out, "Bills:");
        let _ = writeln!(out, "{}", "-".repeat(30));
        for bill in bills {
            let status = if bill.paid { "PAID" } else { "UNPAID" };
            let _ = writeln!(out, "{}: {:.2} {currency} [{status}]", bill.name, bill.amount);
        }
        out
    }

    // ── Investments ─────────────────────────────────────────────────

    /// Totals and platform breakdown of the open positions in `target`.
    pub fn investment_summary(
        &self,
        dataset: &Dataset,
        currency_service: &CurrencyService,
        target: Currency,
    ) -> Result<InvestmentSummary, CoreError> {
        let svc = &self.investment_service;
        Ok(InvestmentSummary {
            currency: target,
            total_value: svc.total_value(dataset, currency_service, target)?,
            total_monthly_contribution: svc.total_monthly_contribution(
                dataset,
                currency_service,
                target,
            )?,
            investment_count: dataset.investments.len(),
            platform_count: svc.distinct_platform_count(dataset),
            by_platform: svc.value_by_platform(dataset, currency_service, target)?,
        })
    }

    // ── Realized gains ──────────────────────────────────────────────

    /// Realized-gain statistics. The average is the plain mean of per-trade
    /// return percentages, not a value-weighted return.
    pub fn realized_gain_summary(
        &self,
        dataset: &Dataset,
        reporting_currency: Currency,
    ) -> RealizedGainSummary {
        let sold = &dataset.sold_investments;
        let total_realized_gain: f64 = sold.iter().map(|s| s.profit_loss_reporting).sum();
        let average_return_pct = if sold.is_empty() {
            0.0
        } else {
            sold.iter().map(|s| s.return_pct()).sum::<f64>() / sold.len() as f64
        };

        RealizedGainSummary {
            currency: reporting_currency,
            total_realized_gain,
            count: sold.len(),
            average_return_pct,
        }
    }

    /// Running total of realized P/L in sale-date order. The sort is stable,
    /// so same-day sales stay in the order they were recorded.
    pub fn cumulative_profit_loss(&self, dataset: &Dataset) -> Vec<CumulativePoint> {
        let mut sold: Vec<_> = dataset.sold_investments.iter().collect();
        sold.sort_by_key(|s| s.date_sold);

        let mut running = 0.0;
        sold.into_iter()
            .map(|s| {
                running += s.profit_loss_reporting;
                CumulativePoint {
                    date: s.date_sold,
                    name: s.name.clone(),
                    profit_loss: s.profit_loss_reporting,
                    cumulative: running,
                }
            })
            .collect()
    }
}

impl Default for SummaryService {
    fn default() -> Self {
        Self::new()
    }
}

/// `round(100 * paid / total)` with halves rounded up, clamped to 0..=100.
/// A zero total yields 0.
pub fn percent_paid(paid: Decimal, total: Decimal) -> u8 {
    if total.is_zero() {
        return 0;
    }
    let rounded = paid
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|p| p.checked_div(total))
        .and_then(|pct| pct.checked_add(Decimal::new(5, 1)))
        .map(|pct| pct.floor());
    match rounded {
        Some(pct) => pct
            .clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
            .to_u8()
            .unwrap_or(0),
        // paid dwarfs total
        None if paid.is_sign_negative() != total.is_sign_negative() => 0,
        None => 100,
    }
}

/// Exact sum of bill amounts. Saturates at the decimal range instead of
/// overflowing.
fn sum_amounts<'a>(bills: impl Iterator<Item = &'a Bill>) -> Decimal {
    bills.fold(Decimal::ZERO, |acc, b| acc.saturating_add(b.amount))
}
