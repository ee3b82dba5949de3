use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::models::currency::{Currency, ExchangeRateTable};

/// Process-wide settings that are not part of the persisted dataset.
///
/// Every field is optional in the JSON form; missing ones take the
/// defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Currency every realized P/L figure is permanently recorded in.
    pub reporting_currency: Currency,

    /// Currency bill amounts are entered and stored in.
    pub bill_currency: Currency,

    /// Static rate table used for every conversion.
    pub exchange_rates: ExchangeRateTable,

    /// Platforms a brand-new dataset starts with.
    pub default_platforms: Vec<String>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            reporting_currency: Currency::CHF,
            bill_currency: Currency::CHF,
            exchange_rates: ExchangeRateTable::default(),
            default_platforms: [
                "Stock Broker",
                "Crypto Exchange",
                "Real Estate",
                "Bonds",
                "Bank",
                "P2P Lending",
                "Commodities",
            ]
            .iter()
            .map(|p| p.to_string())
            .collect(),
        }
    }
}

impl TrackerConfig {
    /// Parse a config from JSON and validate it.
    pub fn from_json_str(json: &str) -> Result<Self, CoreError> {
        let config: TrackerConfig = serde_json::from_str(json)
            .map_err(|e| CoreError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file from disk (native only, not WASM).
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&text)?;
        tracing::debug!(path = %path.display(), "Loaded tracker config");
        Ok(config)
    }

    /// Check that the rate table can serve the conversions the tracker
    /// always performs.
    ///
    /// Rules:
    /// - every rate must be finite and positive
    /// - every row must map its own currency to exactly 1
    /// - reporting and bill currencies must have a row
    pub fn validate(&self) -> Result<(), CoreError> {
        for from in self.exchange_rates.currencies() {
            for to in Currency::ALL {
                if let Some(rate) = self.exchange_rates.rate(from, to) {
                    if !rate.is_finite() || rate <= 0.0 {
                        return Err(CoreError::Config(format!(
                            "Rate {from} → {to} must be a positive number, got {rate}"
                        )));
                    }
                }
            }
            if self.exchange_rates.rate(from, from) != Some(1.0) {
                return Err(CoreError::Config(format!(
                    "Rate {from} → {from} must be exactly 1"
                )));
            }
        }

        for (label, currency) in [
            ("reporting", self.reporting_currency),
            ("bill", self.bill_currency),
        ] {
            if !self.exchange_rates.has_row(currency) {
                return Err(CoreError::Config(format!(
                    "No exchange rates defined for {label} currency {currency}"
                )));
            }
        }

        Ok(())
    }
}
