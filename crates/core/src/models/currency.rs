use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::errors::CoreError;

/// The closed set of currencies the tracker understands.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Currency {
    #[default]
    CHF,
    USD,
    EUR,
}

impl Currency {
    pub const ALL: [Currency; 3] = [Currency::CHF, Currency::USD, Currency::EUR];

    /// ISO 4217 code.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::CHF => "CHF",
            Currency::USD => "USD",
            Currency::EUR => "EUR",
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = CoreError;

    /// Parse a currency code, ignoring case and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "CHF" => Ok(Currency::CHF),
            "USD" => Ok(Currency::USD),
            "EUR" => Ok(Currency::EUR),
            _ => Err(CoreError::UnknownCurrency(s.to_string())),
        }
    }
}

/// Static exchange-rate table: `rates[from][to]` is the multiplier that
/// turns an amount in `from` into an amount in `to`.
///
/// Rates are specified independently per direction, so the table is not
/// reciprocal: `USD→EUR` is 0.93 while `EUR→USD` is 1.08. Stored figures
/// were computed with these exact constants, keep them as they are.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExchangeRateTable {
    rates: BTreeMap<Currency, BTreeMap<Currency, f64>>,
}

impl ExchangeRateTable {
    /// An empty table. Only same-currency conversions succeed against it.
    pub fn empty() -> Self {
        Self {
            rates: BTreeMap::new(),
        }
    }

    /// Set the `from → to` rate, replacing any previous value.
    pub fn set_rate(&mut self, from: Currency, to: Currency, rate: f64) {
        self.rates.entry(from).or_default().insert(to, rate);
    }

    /// Look up the `from → to` rate.
    pub fn rate(&self, from: Currency, to: Currency) -> Option<f64> {
        self.rates.get(&from)?.get(&to).copied()
    }

    /// Whether the table has a row for `currency`.
    pub fn has_row(&self, currency: Currency) -> bool {
        self.rates.contains_key(&currency)
    }

    /// Currencies that appear as a source row, in sorted order.
    pub fn currencies(&self) -> Vec<Currency> {
        self.rates.keys().copied().collect()
    }
}

impl Default for ExchangeRateTable {
    fn default() -> Self {
        let mut table = Self::empty();
        table.set_rate(Currency::CHF, Currency::CHF, 1.0);
        table.set_rate(Currency::CHF, Currency::USD, 1.10);
        table.set_rate(Currency::CHF, Currency::EUR, 1.02);
        table.set_rate(Currency::USD, Currency::CHF, 0.91);
        table.set_rate(Currency::USD, Currency::USD, 1.0);
        table.set_rate(Currency::USD, Currency::EUR, 0.93);
        table.set_rate(Currency::EUR, Currency::CHF, 0.98);
        table.set_rate(Currency::EUR, Currency::USD, 1.08);
        table.set_rate(Currency::EUR, Currency::EUR, 1.0);
        table
    }
}
