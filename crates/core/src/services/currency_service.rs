use crate::errors::CoreError;
use crate::models::currency::{Currency, ExchangeRateTable};

/// Converts amounts between currencies using a static rate table.
///
/// Same-currency conversion returns the amount untouched, so
/// `convert(x, A, A) == x` holds exactly for every `x`. Round trips through
/// another currency are NOT exact because the table is not reciprocal.
#[derive(Debug, Clone)]
pub struct CurrencyService {
    rates: ExchangeRateTable,
}

impl CurrencyService {
    pub fn new(rates: ExchangeRateTable) -> Self {
        Self { rates }
    }

    /// Convert `amount` from one currency to another.
    /// E.g., convert(1000.0, USD, EUR) → 930.0
    ///
    /// Fails with `UnknownCurrency` when the table has no `from → to` rate.
    pub fn convert(&self, amount: f64, from: Currency, to: Currency) -> Result<f64, CoreError> {
        if from == to {
            return Ok(amount);
        }

        let rate = self.rate(from, to)?;
        Ok(amount * rate)
    }

    /// The `from → to` multiplier.
    pub fn rate(&self, from: Currency, to: Currency) -> Result<f64, CoreError> {
        if from == to {
            return Ok(1.0);
        }
        if !self.rates.has_row(from) {
            return Err(CoreError::UnknownCurrency(from.to_string()));
        }
        self.rates
            .rate(from, to)
            .ok_or_else(|| CoreError::UnknownCurrency(to.to_string()))
    }

    pub fn rates(&self) -> &ExchangeRateTable {
        &self.rates
    }
}

impl Default for CurrencyService {
    fn default() -> Self {
        Self::new(ExchangeRateTable::default())
    }
}
