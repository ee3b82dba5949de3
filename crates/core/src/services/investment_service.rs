use std::collections::HashSet;
use tracing::debug;
use uuid::Uuid;

use super::currency_service::CurrencyService;
use super::validation::{finite_field, matches_query, required_text, same_name};
use crate::errors::CoreError;
use crate::models::currency::Currency;
use crate::models::dataset::Dataset;
use crate::models::investment::{Investment, InvestmentFields};
use crate::models::summary::PlatformValue;

/// Manages open positions and their multi-currency valuation.
///
/// Valuation is by cost basis: an investment is worth its recorded
/// purchase `amount`, converted into the requested currency.
pub struct InvestmentService;

impl InvestmentService {
    pub fn new() -> Self {
        Self
    }

    /// Open a new position.
    ///
    /// Rules:
    /// - name and platform must be non-empty
    /// - platform must be in the dataset's platform list
    /// - amount, purchase price and quantity must be finite
    /// - name must not match another open investment (ignoring case)
    pub fn add_investment(
        &self,
        dataset: &mut Dataset,
        fields: InvestmentFields,
    ) -> Result<Uuid, CoreError> {
        let investment = validate_fields(Uuid::new_v4(), fields)?;
        check_platform(dataset, &investment.platform, None)?;
        if dataset
            .investments
            .iter()
            .any(|i| same_name(&i.name, &investment.name))
        {
            return Err(CoreError::duplicate("investment", &investment.name));
        }

        let id = investment.id;
        debug!(name = %investment.name, amount = investment.amount, currency = %investment.currency, "Added investment");
        dataset.investments.push(investment);
        Ok(id)
    }

    /// Replace every field of an open position, keeping its id.
    /// The duplicate check ignores the investment being edited, and the
    /// position may keep a platform that is no longer listed.
    pub fn edit_investment(
        &self,
        dataset: &mut Dataset,
        id: Uuid,
        fields: InvestmentFields,
    ) -> Result<(), CoreError> {
        let updated = validate_fields(id, fields)?;
        let current = &dataset.investments[position(dataset, id)?];
        check_platform(dataset, &updated.platform, Some(current.platform.as_str()))?;
        if dataset
            .investments
            .iter()
            .any(|i| i.id != id && same_name(&i.name, &updated.name))
        {
            return Err(CoreError::duplicate("investment", &updated.name));
        }

        let slot = dataset
            .investments
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| CoreError::InvestmentNotFound(id.to_string()))?;
        *slot = updated;
        debug!(%id, "Edited investment");
        Ok(())
    }

    /// Remove an open position permanently. No sold record is created.
    pub fn delete_investment(&self, dataset: &mut Dataset, id: Uuid) -> Result<Investment, CoreError> {
        let idx = position(dataset, id)?;
        debug!(%id, "Deleted investment");
        Ok(dataset.investments.remove(idx))
    }

    pub fn get<'a>(&self, dataset: &'a Dataset, id: Uuid) -> Option<&'a Investment> {
        dataset.investments.iter().find(|i| i.id == id)
    }

    /// Open positions whose name or platform contains `query` (ignoring case).
    pub fn search_investments<'a>(&self, dataset: &'a Dataset, query: &str) -> Vec<&'a Investment> {
        let q = query.trim().to_lowercase();
        dataset
            .investments
            .iter()
            .filter(|i| matches_query(&i.name, &q) || matches_query(&i.platform, &q))
            .collect()
    }

    // ── Valuation ───────────────────────────────────────────────────

    /// Σ purchase amount of every open position, converted to `target`.
    pub fn total_value(
        &self,
        dataset: &Dataset,
        currency_service: &CurrencyService,
        target: Currency,
    ) -> Result<f64, CoreError> {
        dataset.investments.iter().try_fold(0.0, |sum, i| -> Result<f64, CoreError> {
            Ok(sum + currency_service.convert(i.amount, i.currency, target)?)
        })
    }

    /// Σ monthly contribution of every open position, converted to `target`.
    pub fn total_monthly_contribution(
        &self,
        dataset: &Dataset,
        currency_service: &CurrencyService,
        target: Currency,
    ) -> Result<f64, CoreError> {
        dataset.investments.iter().try_fold(0.0, |sum, i| -> Result<f64, CoreError> {
            Ok(sum + currency_service.convert(i.monthly_contribution, i.currency, target)?)
        })
    }

    /// Number of distinct platforms among open positions.
    pub fn distinct_platform_count(&self, dataset: &Dataset) -> usize {
        dataset
            .investments
            .iter()
            .map(|i| i.platform.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Converted value per platform, in order of first appearance.
    pub fn value_by_platform(
        &self,
        dataset: &Dataset,
        currency_service: &CurrencyService,
        target: Currency,
    ) -> Result<Vec<PlatformValue>, CoreError> {
        let mut values: Vec<PlatformValue> = Vec::new();
        for investment in &dataset.investments {
            let value = currency_service.convert(investment.amount, investment.currency, target)?;
            match values.iter_mut().find(|p| p.platform == investment.platform) {
                Some(entry) => entry.value += value,
                None => values.push(PlatformValue {
                    platform: investment.platform.clone(),
                    value,
                }),
            }
        }
        Ok(values)
    }
}

impl Default for InvestmentService {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn position(dataset: &Dataset, id: Uuid) -> Result<usize, CoreError> {
    dataset
        .investments
        .iter()
        .position(|i| i.id == id)
        .ok_or_else(|| CoreError::InvestmentNotFound(id.to_string()))
}

/// `platform` must be a listed platform tag, or the one the position
/// already uses.
fn check_platform(dataset: &Dataset, platform: &str, current: Option<&str>) -> Result<(), CoreError> {
    if current == Some(platform) || dataset.platforms.iter().any(|p| p == platform) {
        return Ok(());
    }
    Err(CoreError::InvalidField(format!(
        "Platform '{platform}' is not in the platform list"
    )))
}

fn validate_fields(id: Uuid, fields: InvestmentFields) -> Result<Investment, CoreError> {
    let name = required_text("Investment name", &fields.name)?;
    let platform = required_text("Platform", &fields.platform)?;
    let amount = finite_field("Amount", fields.amount)?;
    let purchase_price_per_unit = finite_field("Purchase price per unit", fields.purchase_price_per_unit)?;
    let quantity = finite_field("Quantity", fields.quantity)?;

    let monthly_contribution = match fields.monthly_contribution {
        Some(c) if c.is_finite() => c,
        _ => 0.0,
    };
    if monthly_contribution < 0.0 {
        return Err(CoreError::InvalidField(format!(
            "Monthly contribution must not be negative, got {monthly_contribution}"
        )));
    }

    Ok(Investment {
        id,
        name,
        amount,
        currency: fields.currency,
        platform,
        monthly_contribution,
        purchase_price_per_unit,
        quantity,
    })
}
