pub mod config;
pub mod errors;
pub mod models;
pub mod services;
pub mod storage;
pub mod stores;

use chrono::{Datelike, NaiveDate, Utc};
use std::borrow::Cow;
use tracing::{info, warn};
use uuid::Uuid;

use config::TrackerConfig;
use errors::CoreError;
use models::{
    bill::{BaseBill, Bill},
    currency::Currency,
    dataset::Dataset,
    investment::{Investment, InvestmentFields, SoldInvestment},
    summary::{
        BillsSplit, CumulativePoint, InvestmentSummary, MonthSummary, OverallBillSummary,
        PlatformValue, RealizedGainSummary, SalePreview,
    },
};
use services::{
    bill_service::BillService, currency_service::CurrencyService,
    investment_service::InvestmentService, platform_service::PlatformService,
    sale_service::SaleService, summary_service::SummaryService,
};
use storage::manager::StorageManager;
use stores::traits::SnapshotStore;

/// Main entry point for the finance tracker core library.
/// Owns the financial dataset, the configuration and every service that
/// operates on them. There is no global state: the application root holds
/// one `FinanceTracker` and calls into it.
#[must_use]
pub struct FinanceTracker {
    dataset: Dataset,
    config: TrackerConfig,
    currency_service: CurrencyService,
    bill_service: BillService,
    investment_service: InvestmentService,
    platform_service: PlatformService,
    sale_service: SaleService,
    summary_service: SummaryService,
    /// Tracks whether any mutation has occurred since the last save/load.
    dirty: bool,
}

impl std::fmt::Debug for FinanceTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinanceTracker")
            .field("years", &self.dataset.years.len())
            .field("bills", &self.dataset.bill_count())
            .field("investments", &self.dataset.investments.len())
            .field("sold", &self.dataset.sold_investments.len())
            .field("currency", &self.dataset.currency)
            .field("dirty", &self.dirty)
            .finish()
    }
}

impl FinanceTracker {
    /// Start from the default dataset with the default configuration.
    pub fn create_new() -> Self {
        Self::with_config(TrackerConfig::default())
    }

    /// Start from the default dataset with a custom configuration.
    pub fn with_config(config: TrackerConfig) -> Self {
        let dataset = Dataset::new_default(&config, current_year());
        Self::build(dataset, config)
    }

    /// Wrap an existing dataset (e.g. one parsed by the caller).
    pub fn from_dataset(dataset: Dataset, config: TrackerConfig) -> Self {
        Self::build(dataset.normalized(&config, current_year()), config)
    }

    /// Load from a snapshot store, falling back to the default dataset when
    /// the store holds nothing yet.
    pub async fn load_from_store(
        store: &dyn SnapshotStore,
        config: TrackerConfig,
    ) -> Result<Self, CoreError> {
        let dataset = match store.load().await? {
            Some(dataset) => dataset.normalized(&config, current_year()),
            None => {
                info!(store = store.name(), "No snapshot found, starting from the default dataset");
                Dataset::new_default(&config, current_year())
            }
        };
        info!(store = store.name(), investments = dataset.investments.len(), "Loaded dataset");
        Ok(Self::build(dataset, config))
    }

    /// Replace the in-memory dataset with the store's snapshot.
    /// On any failure the current dataset is kept untouched.
    pub async fn reload_from_store(&mut self, store: &dyn SnapshotStore) -> Result<(), CoreError> {
        let loaded = match store.load().await {
            Ok(loaded) => loaded,
            Err(e) => {
                warn!(store = store.name(), error = %e, "Reload failed, keeping current dataset");
                return Err(e);
            }
        };
        self.dataset = match loaded {
            Some(dataset) => dataset.normalized(&self.config, current_year()),
            None => Dataset::new_default(&self.config, current_year()),
        };
        self.dirty = false;
        info!(store = store.name(), "Reloaded dataset");
        Ok(())
    }

    /// Write the whole dataset to a store.
    /// Clears the unsaved-changes flag on success.
    pub async fn save_to_store(&mut self, store: &dyn SnapshotStore) -> Result<(), CoreError> {
        store.save(&self.dataset).await?;
        self.dirty = false;
        info!(store = store.name(), "Saved dataset");
        Ok(())
    }

    /// Load from a JSON snapshot string.
    pub fn load_from_json(json: &str, config: TrackerConfig) -> Result<Self, CoreError> {
        let dataset = StorageManager::from_json(json)?;
        Ok(Self::from_dataset(dataset, config))
    }

    /// The full dataset as a JSON snapshot, in the shape persistence expects.
    pub fn to_json(&self) -> Result<String, CoreError> {
        StorageManager::to_json(&self.dataset)
    }

    /// Load from encrypted bytes (password required).
    pub fn load_from_bytes(
        encrypted: &[u8],
        password: &str,
        config: TrackerConfig,
    ) -> Result<Self, CoreError> {
        let dataset = StorageManager::load_from_bytes(encrypted, password)?;
        Ok(Self::from_dataset(dataset, config))
    }

    /// Encrypt the dataset to bytes the caller can write anywhere.
    /// Clears the unsaved-changes flag on success.
    pub fn save_to_bytes(&mut self, password: &str) -> Result<Vec<u8>, CoreError> {
        let bytes = StorageManager::save_to_bytes(&self.dataset, password)?;
        self.dirty = false;
        Ok(bytes)
    }

    /// Throw every bill, investment and sale away and start over from the
    /// default dataset.
    pub fn reset(&mut self) {
        self.dataset = Dataset::new_default(&self.config, current_year());
        self.dirty = true;
        info!("Dataset reset to defaults");
    }

    // ── Dataset & Settings ──────────────────────────────────────────

    #[must_use]
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    #[must_use]
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// The currency totals are displayed in.
    #[must_use]
    pub fn display_currency(&self) -> Currency {
        self.dataset.currency
    }

    pub fn set_display_currency(&mut self, currency: Currency) {
        self.dataset.currency = currency;
        self.dirty = true;
    }

    /// Parse and set the display currency from a code such as "usd".
    pub fn set_display_currency_code(&mut self, code: &str) -> Result<(), CoreError> {
        let currency = code.parse()?;
        self.set_display_currency(currency);
        Ok(())
    }

    /// Convert an amount with the configured rate table.
    pub fn convert(&self, amount: f64, from: Currency, to: Currency) -> Result<f64, CoreError> {
        self.currency_service.convert(amount, from, to)
    }

    /// Returns `true` if the dataset has been modified since the last save or load.
    #[must_use]
    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }

    // ── Bills ───────────────────────────────────────────────────────

    /// Bills of `(year, month)`. Materializes the month from the base
    /// template on first access, which counts as a modification.
    pub fn get_or_create_month(&mut self, year: &str, month: u32) -> Result<&[Bill], CoreError> {
        let existed = self.bill_service.month(&self.dataset, year, month).is_some();
        let bills = self
            .bill_service
            .get_or_create_month(&mut self.dataset, year, month)?;
        if !existed {
            self.dirty = true;
        }
        Ok(bills.as_slice())
    }

    /// Bills of an already materialized month.
    #[must_use]
    pub fn get_month(&self, year: &str, month: u32) -> Option<&[Bill]> {
        self.bill_service.month(&self.dataset, year, month)
    }

    pub fn add_bill(
        &mut self,
        year: &str,
        month: u32,
        name: &str,
        amount: f64,
    ) -> Result<Uuid, CoreError> {
        let id = self
            .bill_service
            .add_bill(&mut self.dataset, year, month, name, amount)
            .inspect_err(|e| warn!(error = %e, "Rejected bill"))?;
        self.dirty = true;
        Ok(id)
    }

    pub fn edit_bill(
        &mut self,
        year: &str,
        month: u32,
        bill_id: Uuid,
        name: &str,
        amount: f64,
    ) -> Result<(), CoreError> {
        self.bill_service
            .edit_bill(&mut self.dataset, year, month, bill_id, name, amount)
            .inspect_err(|e| warn!(error = %e, "Rejected bill edit"))?;
        self.dirty = true;
        Ok(())
    }

    pub fn delete_bill(&mut self, year: &str, month: u32, bill_id: Uuid) -> Result<Bill, CoreError> {
        let bill = self
            .bill_service
            .delete_bill(&mut self.dataset, year, month, bill_id)?;
        self.dirty = true;
        Ok(bill)
    }

    /// Flip a bill between paid and unpaid. Returns the new state.
    pub fn toggle_paid(&mut self, year: &str, month: u32, bill_id: Uuid) -> Result<bool, CoreError> {
        let paid = self
            .bill_service
            .toggle_paid(&mut self.dataset, year, month, bill_id)?;
        self.dirty = true;
        Ok(paid)
    }

    /// Bills of a month whose name contains `query` (ignoring case).
    #[must_use]
    pub fn search_bills(&self, year: &str, month: u32, query: &str) -> Vec<&Bill> {
        self.bill_service
            .search_bills(&self.dataset, year, month, query)
    }

    // ── Years ───────────────────────────────────────────────────────

    pub fn add_year(&mut self, year: &str) -> Result<(), CoreError> {
        self.bill_service
            .add_year(&mut self.dataset, year)
            .inspect_err(|e| warn!(error = %e, "Rejected year"))?;
        self.dirty = true;
        Ok(())
    }

    /// Delete a year and return the year to select next (the lowest one left).
    pub fn delete_year(&mut self, year: &str) -> Result<String, CoreError> {
        let next = self
            .bill_service
            .delete_year(&mut self.dataset, year)
            .inspect_err(|e| warn!(error = %e, "Rejected year deletion"))?;
        self.dirty = true;
        Ok(next)
    }

    /// All years, ascending.
    #[must_use]
    pub fn list_years(&self) -> Vec<&str> {
        self.bill_service.list_years(&self.dataset)
    }

    /// Materialized months of a year, ascending.
    #[must_use]
    pub fn list_months(&self, year: &str) -> Vec<u32> {
        self.bill_service.list_months(&self.dataset, year)
    }

    // ── Base Bill Template ──────────────────────────────────────────

    #[must_use]
    pub fn base_bills(&self) -> &[BaseBill] {
        &self.dataset.base_bills
    }

    pub fn add_base_bill(&mut self, name: &str, amount: f64) -> Result<Uuid, CoreError> {
        let id = self
            .bill_service
            .add_base_bill(&mut self.dataset, name, amount)?;
        self.dirty = true;
        Ok(id)
    }

    pub fn edit_base_bill(&mut self, id: Uuid, name: &str, amount: f64) -> Result<(), CoreError> {
        self.bill_service
            .edit_base_bill(&mut self.dataset, id, name, amount)?;
        self.dirty = true;
        Ok(())
    }

    pub fn remove_base_bill(&mut self, id: Uuid) -> Result<BaseBill, CoreError> {
        let removed = self.bill_service.remove_base_bill(&mut self.dataset, id)?;
        self.dirty = true;
        Ok(removed)
    }

    // ── Platforms ───────────────────────────────────────────────────

    #[must_use]
    pub fn platforms(&self) -> &[String] {
        &self.dataset.platforms
    }

    pub fn add_platform(&mut self, name: &str) -> Result<(), CoreError> {
        self.platform_service
            .add_platform(&mut self.dataset, name)?;
        self.dirty = true;
        Ok(())
    }

    pub fn remove_platform(&mut self, name: &str) -> Result<(), CoreError> {
        self.platform_service
            .remove_platform(&mut self.dataset, name)
            .inspect_err(|e| warn!(error = %e, "Rejected platform removal"))?;
        self.dirty = true;
        Ok(())
    }

    // ── Investments ─────────────────────────────────────────────────

    #[must_use]
    pub fn investments(&self) -> &[Investment] {
        &self.dataset.investments
    }

    #[must_use]
    pub fn get_investment(&self, id: Uuid) -> Option<&Investment> {
        self.investment_service.get(&self.dataset, id)
    }

    pub fn add_investment(&mut self, fields: InvestmentFields) -> Result<Uuid, CoreError> {
        let id = self
            .investment_service
            .add_investment(&mut self.dataset, fields)
            .inspect_err(|e| warn!(error = %e, "Rejected investment"))?;
        self.dirty = true;
        Ok(id)
    }

    pub fn edit_investment(&mut self, id: Uuid, fields: InvestmentFields) -> Result<(), CoreError> {
        self.investment_service
            .edit_investment(&mut self.dataset, id, fields)
            .inspect_err(|e| warn!(error = %e, "Rejected investment edit"))?;
        self.dirty = true;
        Ok(())
    }

    /// Remove an open investment without recording a sale.
    pub fn delete_investment(&mut self, id: Uuid) -> Result<Investment, CoreError> {
        let removed = self
            .investment_service
            .delete_investment(&mut self.dataset, id)?;
        self.dirty = true;
        Ok(removed)
    }

    /// Open investments whose name or platform contains `query`.
    #[must_use]
    pub fn search_investments(&self, query: &str) -> Vec<&Investment> {
        self.investment_service
            .search_investments(&self.dataset, query)
    }

    /// Σ converted purchase amounts of open investments.
    pub fn total_investment_value(&self, currency: Currency) -> Result<f64, CoreError> {
        self.investment_service
            .total_value(&self.dataset, &self.currency_service, currency)
    }

    /// Σ converted monthly contributions of open investments.
    pub fn total_monthly_contribution(&self, currency: Currency) -> Result<f64, CoreError> {
        self.investment_service
            .total_monthly_contribution(&self.dataset, &self.currency_service, currency)
    }

    #[must_use]
    pub fn distinct_platform_count(&self) -> usize {
        self.investment_service
            .distinct_platform_count(&self.dataset)
    }

    /// Converted open-investment value per platform.
    pub fn value_by_platform(&self, currency: Currency) -> Result<Vec<PlatformValue>, CoreError> {
        self.investment_service
            .value_by_platform(&self.dataset, &self.currency_service, currency)
    }

    // ── Sales ───────────────────────────────────────────────────────

    /// Figures selling `id` would produce, without selling it.
    pub fn preview_sale(
        &self,
        id: Uuid,
        sell_price_per_unit: f64,
        sell_currency: Currency,
    ) -> Result<SalePreview, CoreError> {
        let investment = self
            .get_investment(id)
            .ok_or_else(|| CoreError::InvestmentNotFound(id.to_string()))?;
        self.sale_service.preview(
            investment,
            sell_price_per_unit,
            sell_currency,
            &self.currency_service,
            self.config.reporting_currency,
        )
    }

    /// Sell an open investment today.
    pub fn sell_investment(
        &mut self,
        id: Uuid,
        sell_price_per_unit: f64,
        sell_currency: Currency,
    ) -> Result<SoldInvestment, CoreError> {
        let today = Utc::now().date_naive();
        self.sell_investment_on(id, sell_price_per_unit, sell_currency, today)
    }

    /// Sell an open investment with an explicit sale date.
    pub fn sell_investment_on(
        &mut self,
        id: Uuid,
        sell_price_per_unit: f64,
        sell_currency: Currency,
        date_sold: NaiveDate,
    ) -> Result<SoldInvestment, CoreError> {
        let record = self
            .sale_service
            .sell(
                &mut self.dataset,
                id,
                sell_price_per_unit,
                sell_currency,
                date_sold,
                &self.currency_service,
                self.config.reporting_currency,
            )
            .inspect_err(|e| warn!(error = %e, "Rejected sale"))?;
        self.dirty = true;
        info!(
            name = %record.name,
            profit_loss = record.profit_loss,
            currency = %record.sell_currency,
            "Investment sold"
        );
        Ok(record)
    }

    #[must_use]
    pub fn sold_investments(&self) -> &[SoldInvestment] {
        &self.dataset.sold_investments
    }

    /// Sold records matching `query`, optionally on one platform, newest first.
    #[must_use]
    pub fn search_sold(&self, query: &str, platform: Option<&str>) -> Vec<&SoldInvestment> {
        self.sale_service
            .search_sold(&self.dataset, query, platform)
    }

    /// Distinct platforms that appear in sold records, sorted.
    #[must_use]
    pub fn sold_platforms(&self) -> Vec<&str> {
        self.sale_service.sold_platforms(&self.dataset)
    }

    // ── Summaries ───────────────────────────────────────────────────

    /// Totals of `(year, month)` in the bill currency. A month that has not
    /// been materialized yet is summarized as the template would seed it.
    pub fn month_summary(&self, year: &str, month: u32) -> Result<MonthSummary, CoreError> {
        let bills = self.month_view(year, month)?;
        Ok(self.summary_service.month_summary(
            year,
            month,
            &bills,
            self.config.bill_currency,
        ))
    }

    /// Paid vs unpaid sums of `(year, month)`.
    pub fn month_split(&self, year: &str, month: u32) -> Result<BillsSplit, CoreError> {
        let bills = self.month_view(year, month)?;
        Ok(self.summary_service.bills_split(&bills))
    }

    /// Paid value (in `currency`) and bill counts over every month.
    pub fn overall_bill_summary(&self, currency: Currency) -> Result<OverallBillSummary, CoreError> {
        self.summary_service.overall_bill_summary(
            &self.dataset,
            &self.currency_service,
            self.config.bill_currency,
            currency,
        )
    }

    /// Σ paid bills over every year and month, converted to `currency`.
    pub fn overall_paid_value(&self, currency: Currency) -> Result<f64, CoreError> {
        Ok(self.overall_bill_summary(currency)?.total_paid)
    }

    /// Investment totals in the display currency.
    pub fn investment_summary(&self) -> Result<InvestmentSummary, CoreError> {
        self.summary_service.investment_summary(
            &self.dataset,
            &self.currency_service,
            self.dataset.currency,
        )
    }

    /// Realized-gain statistics in the fixed reporting currency.
    #[must_use]
    pub fn realized_gain_summary(&self) -> RealizedGainSummary {
        self.summary_service
            .realized_gain_summary(&self.dataset, self.config.reporting_currency)
    }

    /// Cumulative realized P/L series, oldest sale first.
    #[must_use]
    pub fn cumulative_profit_loss(&self) -> Vec<CumulativePoint> {
        self.summary_service.cumulative_profit_loss(&self.dataset)
    }

    /// Plain-text report of `(year, month)`.
    pub fn export_month_summary(&self, year: &str, month: u32) -> Result<String, CoreError> {
        let bills = self.month_view(year, month)?;
        Ok(self.summary_service.export_month_summary(
            year,
            month,
            &bills,
            self.config.bill_currency,
        ))
    }

    // ── Internal ────────────────────────────────────────────────────

    fn month_view(&self, year: &str, month: u32) -> Result<Cow<'_, [Bill]>, CoreError> {
        self.bill_service
            .month_or_template(&self.dataset, year, month)
    }

    fn build(dataset: Dataset, config: TrackerConfig) -> Self {
        let currency_service = CurrencyService::new(config.exchange_rates.clone());

        Self {
            dataset,
            config,
            currency_service,
            bill_service: BillService::new(),
            investment_service: InvestmentService::new(),
            platform_service: PlatformService::new(),
            sale_service: SaleService::new(),
            summary_service: SummaryService::new(),
            dirty: false,
        }
    }
}

fn current_year() -> i32 {
    Utc::now().year()
}
