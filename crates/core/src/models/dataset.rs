use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use super::bill::{BaseBill, Bill};
use super::currency::Currency;
use super::investment::{Investment, SoldInvestment};
use crate::config::TrackerConfig;

/// Bills of one year, keyed by month number (1-12).
pub type YearBills = BTreeMap<u32, Vec<Bill>>;

/// The root financial dataset. Everything in here is persisted as one
/// snapshot and replaced as a whole on load.
///
/// The serialized shape is
/// `{currency, platforms, years: {Y: {M: Bill[]}}, baseBills, investments, soldInvestments}`.
/// Absent fields fall back to empty collections (and CHF for `currency`),
/// unknown fields are ignored. An absent `platforms` key is remembered so
/// [`Dataset::normalized`] can seed the configured defaults; an explicit
/// empty list stays empty.
///
/// Entities never reference each other: an investment names its platform,
/// a month is addressed by `(year, month)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "DatasetRecord")]
pub struct Dataset {
    /// Display currency selected by the user
    #[serde(default)]
    pub currency: Currency,

    /// Known platform tags, kept sorted
    #[serde(default)]
    pub platforms: Vec<String>,

    /// Year (4-digit string) → month number → bills
    #[serde(default)]
    pub years: BTreeMap<String, YearBills>,

    /// Template copied into every newly materialized month
    #[serde(default)]
    pub base_bills: Vec<BaseBill>,

    /// Open positions
    #[serde(default)]
    pub investments: Vec<Investment>,

    /// Realized trades, in the order they were sold
    #[serde(default)]
    pub sold_investments: Vec<SoldInvestment>,

    #[serde(skip)]
    platforms_missing: bool,
}

/// Wire shape of a snapshot. Field order matches [`Dataset`] so the
/// binary encoding stays compatible.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DatasetRecord {
    #[serde(default)]
    currency: Currency,
    #[serde(default, deserialize_with = "present_platforms")]
    platforms: Option<Vec<String>>,
    #[serde(default)]
    years: BTreeMap<String, YearBills>,
    #[serde(default)]
    base_bills: Vec<BaseBill>,
    #[serde(default)]
    investments: Vec<Investment>,
    #[serde(default)]
    sold_investments: Vec<SoldInvestment>,
}

fn present_platforms<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Vec::deserialize(deserializer).map(Some)
}

impl From<DatasetRecord> for Dataset {
    fn from(record: DatasetRecord) -> Self {
        Self {
            currency: record.currency,
            platforms_missing: record.platforms.is_none(),
            platforms: record.platforms.unwrap_or_default(),
            years: record.years,
            base_bills: record.base_bills,
            investments: record.investments,
            sold_investments: record.sold_investments,
        }
    }
}

impl Dataset {
    /// The dataset used when there is no snapshot yet, or after a reset:
    /// CHF display currency, the configured default platforms and one
    /// empty `current_year`.
    pub fn new_default(config: &TrackerConfig, current_year: i32) -> Self {
        let mut years = BTreeMap::new();
        years.insert(format!("{current_year:04}"), YearBills::new());

        Self {
            currency: Currency::CHF,
            platforms: default_platforms(config),
            years,
            ..Self::default()
        }
    }

    /// Fill a freshly loaded snapshot's gaps from the defaults: the
    /// configured platforms when the snapshot had no `platforms` key, and
    /// `current_year` when it has no years at all.
    pub fn normalized(mut self, config: &TrackerConfig, current_year: i32) -> Self {
        if std::mem::take(&mut self.platforms_missing) {
            self.platforms = default_platforms(config);
        }
        if self.years.is_empty() {
            self.years
                .insert(format!("{current_year:04}"), YearBills::new());
        }
        self
    }

    /// Total number of bills across every year and month.
    pub fn bill_count(&self) -> usize {
        self.years
            .values()
            .flat_map(|months| months.values())
            .map(Vec::len)
            .sum()
    }
}

fn default_platforms(config: &TrackerConfig) -> Vec<String> {
    let mut platforms = config.default_platforms.clone();
    platforms.sort();
    platforms.dedup();
    platforms
}
