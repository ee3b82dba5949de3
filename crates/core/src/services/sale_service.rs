use chrono::NaiveDate;
use tracing::debug;
use uuid::Uuid;

use super::currency_service::CurrencyService;
use super::investment_service::position;
use super::validation::matches_query;
use crate::errors::CoreError;
use crate::models::currency::Currency;
use crate::models::dataset::Dataset;
use crate::models::investment::{Investment, SoldInvestment};
use crate::models::summary::SalePreview;

/// Settles open positions into realized sold-investment records.
///
/// A sale is one-way: the open investment leaves the ledger and exactly one
/// immutable `SoldInvestment` is appended. Every fallible step runs before
/// either ledger is touched.
pub struct SaleService;

impl SaleService {
    pub fn new() -> Self {
        Self
    }

    /// Compute what selling `investment` would produce.
    ///
    /// P/L compares the proceeds against the recorded purchase `amount`
    /// converted into the sell currency, NOT against
    /// `purchase_price_per_unit * quantity`.
    pub fn preview(
        &self,
        investment: &Investment,
        sell_price_per_unit: f64,
        sell_currency: Currency,
        currency_service: &CurrencyService,
        reporting_currency: Currency,
    ) -> Result<SalePreview, CoreError> {
        if !sell_price_per_unit.is_finite() {
            return Err(CoreError::InvalidPrice(format!(
                "Sell price must be a finite number, got {sell_price_per_unit}"
            )));
        }

        let sale_amount = sell_price_per_unit * investment.quantity;
        let purchase_amount_converted = if investment.currency == sell_currency {
            investment.amount
        } else {
            currency_service.convert(investment.amount, investment.currency, sell_currency)?
        };
        let profit_loss = sale_amount - purchase_amount_converted;
        let profit_loss_reporting =
            currency_service.convert(profit_loss, sell_currency, reporting_currency)?;

        Ok(SalePreview {
            sell_currency,
            sale_amount,
            purchase_amount_converted,
            profit_loss,
            reporting_currency,
            profit_loss_reporting,
        })
    }

    /// Sell an open investment on `date_sold`.
    ///
    /// Fails with `InvalidPrice` unless the price is finite and positive.
    /// On success the investment is removed from the open ledger and the
    /// returned record is appended to the sold ledger.
    #[allow(clippy::too_many_arguments)]
    pub fn sell(
        &self,
        dataset: &mut Dataset,
        investment_id: Uuid,
        sell_price_per_unit: f64,
        sell_currency: Currency,
        date_sold: NaiveDate,
        currency_service: &CurrencyService,
        reporting_currency: Currency,
    ) -> Result<SoldInvestment, CoreError> {
        if !sell_price_per_unit.is_finite() || sell_price_per_unit <= 0.0 {
            return Err(CoreError::InvalidPrice(format!(
                "Sell price must be a positive number, got {sell_price_per_unit}"
            )));
        }

        let idx = position(dataset, investment_id)?;
        let investment = &dataset.investments[idx];
        let preview = self.preview(
            investment,
            sell_price_per_unit,
            sell_currency,
            currency_service,
            reporting_currency,
        )?;

        let record = SoldInvestment {
            name: investment.name.clone(),
            platform: investment.platform.clone(),
            purchase_currency: investment.currency,
            sell_currency,
            purchase_price_per_unit: investment.purchase_price_per_unit,
            sell_price_per_unit,
            quantity: investment.quantity,
            purchase_amount: investment.amount,
            sale_amount: preview.sale_amount,
            profit_loss: preview.profit_loss,
            profit_loss_reporting: preview.profit_loss_reporting,
            date_sold,
        };

        // Nothing below can fail: both ledgers change together.
        dataset.investments.remove(idx);
        dataset.sold_investments.push(record.clone());
        debug!(
            name = %record.name,
            profit_loss = record.profit_loss,
            %sell_currency,
            "Settled investment sale"
        );
        Ok(record)
    }

    /// Sold records matching `query` on name or platform (ignoring case),
    /// optionally restricted to one platform, most recent sale first.
    /// Records sold on the same day keep their insertion order.
    pub fn search_sold<'a>(
        &self,
        dataset: &'a Dataset,
        query: &str,
        platform: Option<&str>,
    ) -> Vec<&'a SoldInvestment> {
        let q = query.trim().to_lowercase();
        let mut sold: Vec<&SoldInvestment> = dataset
            .sold_investments
            .iter()
            .filter(|s| matches_query(&s.name, &q) || matches_query(&s.platform, &q))
            .filter(|s| platform.map_or(true, |p| s.platform == p))
            .collect();
        sold.sort_by(|a, b| b.date_sold.cmp(&a.date_sold));
        sold
    }

    /// Distinct platforms of sold records, sorted.
    pub fn sold_platforms<'a>(&self, dataset: &'a Dataset) -> Vec<&'a str> {
        let mut platforms: Vec<&str> = dataset
            .sold_investments
            .iter()
            .map(|s| s.platform.as_str())
            .collect();
        platforms.sort_unstable();
        platforms.dedup();
        platforms
    }
}

impl Default for SaleService {
    fn default() -> Self {
        Self::new()
    }
}
