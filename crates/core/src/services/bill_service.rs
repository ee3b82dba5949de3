use std::borrow::Cow;
use tracing::debug;
use uuid::Uuid;

use super::validation::{matches_query, money_amount, required_text, same_name};
use crate::errors::CoreError;
use crate::models::bill::{BaseBill, Bill};
use crate::models::dataset::{Dataset, YearBills};

/// Manages per-(year, month) bill lists, years and the base bill template.
///
/// Pure business logic, no I/O. Every command validates its input before
/// touching the dataset, so a rejected call leaves it unchanged.
pub struct BillService;

impl BillService {
    pub fn new() -> Self {
        Self
    }

    // ── Months ──────────────────────────────────────────────────────

    /// Return the bills of `(year, month)`, materializing the month first
    /// if it does not exist yet.
    ///
    /// Side effect: a missing month is created as a deep copy of the base
    /// template with every entry unpaid (and a missing year is created with
    /// it). Later template edits never reach months created here.
    pub fn get_or_create_month<'a>(
        &self,
        dataset: &'a mut Dataset,
        year: &str,
        month: u32,
    ) -> Result<&'a mut Vec<Bill>, CoreError> {
        let year = validate_year(year)?;
        validate_month(month)?;

        let Dataset {
            years, base_bills, ..
        } = dataset;
        let months = years.entry(year.clone()).or_default();
        let bills = months.entry(month).or_insert_with(|| {
            debug!(%year, month, template_len = base_bills.len(), "Materialized month from base template");
            base_bills.iter().map(BaseBill::to_bill).collect()
        });
        Ok(bills)
    }

    /// Bills of an existing month, without materializing anything.
    /// The year is matched after trimming, like every other year lookup.
    pub fn month<'a>(&self, dataset: &'a Dataset, year: &str, month: u32) -> Option<&'a [Bill]> {
        dataset
            .years
            .get(year.trim())
            .and_then(|months| months.get(&month))
            .map(Vec::as_slice)
    }

    /// What `get_or_create_month` would return, computed without mutating:
    /// the stored month if it exists, otherwise the unpaid template copy.
    pub fn month_or_template<'a>(
        &self,
        dataset: &'a Dataset,
        year: &str,
        month: u32,
    ) -> Result<Cow<'a, [Bill]>, CoreError> {
        validate_month(month)?;
        match self.month(dataset, year, month) {
            Some(bills) => Ok(Cow::Borrowed(bills)),
            None => {
                validate_year(year)?;
                Ok(Cow::Owned(
                    dataset.base_bills.iter().map(BaseBill::to_bill).collect(),
                ))
            }
        }
    }

    /// Months of a year that have been materialized, ascending.
    pub fn list_months(&self, dataset: &Dataset, year: &str) -> Vec<u32> {
        dataset
            .years
            .get(year.trim())
            .map(|months| months.keys().copied().collect())
            .unwrap_or_default()
    }

    // ── Bills ───────────────────────────────────────────────────────

    /// Append a new unpaid bill to `(year, month)`.
    ///
    /// Fails with `DuplicateName` if a bill with the same name (ignoring
    /// case) is already in that month, or would be once the month is
    /// materialized from the template.
    pub fn add_bill(
        &self,
        dataset: &mut Dataset,
        year: &str,
        month: u32,
        name: &str,
        amount: f64,
    ) -> Result<Uuid, CoreError> {
        let name = required_text("Bill name", name)?;
        let amount = money_amount("Bill amount", amount)?;

        {
            let existing = self.month_or_template(dataset, year, month)?;
            if existing.iter().any(|b| same_name(&b.name, &name)) {
                return Err(CoreError::duplicate("bill", &name));
            }
        }

        let bills = self.get_or_create_month(dataset, year, month)?;
        let bill = Bill::new(name, amount);
        let id = bill.id;
        debug!(%year, month, name = %bill.name, %amount, "Added bill");
        bills.push(bill);
        Ok(id)
    }

    /// Rename and/or re-amount an existing bill.
    /// The duplicate check ignores the bill being edited.
    pub fn edit_bill(
        &self,
        dataset: &mut Dataset,
        year: &str,
        month: u32,
        bill_id: Uuid,
        name: &str,
        amount: f64,
    ) -> Result<(), CoreError> {
        let name = required_text("Bill name", name)?;
        let amount = money_amount("Bill amount", amount)?;

        let bills = month_mut(dataset, year, month, bill_id)?;
        if bills
            .iter()
            .any(|b| b.id != bill_id && same_name(&b.name, &name))
        {
            return Err(CoreError::duplicate("bill", &name));
        }

        let bill = bills
            .iter_mut()
            .find(|b| b.id == bill_id)
            .ok_or_else(|| CoreError::BillNotFound(bill_id.to_string()))?;
        bill.name = name;
        bill.amount = amount;
        debug!(%year, month, %bill_id, "Edited bill");
        Ok(())
    }

    /// Remove a bill from its month and return it.
    pub fn delete_bill(
        &self,
        dataset: &mut Dataset,
        year: &str,
        month: u32,
        bill_id: Uuid,
    ) -> Result<Bill, CoreError> {
        let bills = month_mut(dataset, year, month, bill_id)?;
        let idx = bills
            .iter()
            .position(|b| b.id == bill_id)
            .ok_or_else(|| CoreError::BillNotFound(bill_id.to_string()))?;
        let removed = bills.remove(idx);
        debug!(%year, month, %bill_id, "Deleted bill");
        Ok(removed)
    }

    /// Flip the paid flag of a bill. Returns the new state.
    pub fn toggle_paid(
        &self,
        dataset: &mut Dataset,
        year: &str,
        month: u32,
        bill_id: Uuid,
    ) -> Result<bool, CoreError> {
        let bills = month_mut(dataset, year, month, bill_id)?;
        let bill = bills
            .iter_mut()
            .find(|b| b.id == bill_id)
            .ok_or_else(|| CoreError::BillNotFound(bill_id.to_string()))?;
        bill.paid = !bill.paid;
        debug!(%year, month, %bill_id, paid = bill.paid, "Toggled bill paid state");
        Ok(bill.paid)
    }

    /// Bills of an existing month whose name contains `query` (ignoring case).
    pub fn search_bills<'a>(
        &self,
        dataset: &'a Dataset,
        year: &str,
        month: u32,
        query: &str,
    ) -> Vec<&'a Bill> {
        let q = query.trim().to_lowercase();
        self.month(dataset, year, month)
            .unwrap_or_default()
            .iter()
            .filter(|b| matches_query(&b.name, &q))
            .collect()
    }

    // ── Years ───────────────────────────────────────────────────────

    /// Create an empty year. No months are materialized.
    pub fn add_year(&self, dataset: &mut Dataset, year: &str) -> Result<(), CoreError> {
        let year = validate_year(year)?;
        if dataset.years.contains_key(&year) {
            return Err(CoreError::DuplicateYear(year));
        }
        debug!(%year, "Added year");
        dataset.years.insert(year, YearBills::new());
        Ok(())
    }

    /// Delete a year with all its months.
    ///
    /// The last remaining year can never be deleted. Returns the year the
    /// caller should select next: the lowest remaining one.
    pub fn delete_year(&self, dataset: &mut Dataset, year: &str) -> Result<String, CoreError> {
        let year = year.trim();
        if !dataset.years.contains_key(year) {
            return Err(CoreError::YearNotFound(year.to_string()));
        }
        if dataset.years.len() <= 1 {
            return Err(CoreError::LastYearProtected(year.to_string()));
        }

        dataset.years.remove(year);
        debug!(%year, "Deleted year");

        self.list_years(dataset)
            .first()
            .map(|y| y.to_string())
            .ok_or_else(|| CoreError::YearNotFound(year.to_string()))
    }

    /// All years, ascending by numeric value.
    pub fn list_years<'a>(&self, dataset: &'a Dataset) -> Vec<&'a str> {
        let mut years: Vec<&str> = dataset.years.keys().map(String::as_str).collect();
        years.sort_by_key(|y| (y.parse::<i64>().unwrap_or(i64::MAX), y.to_string()));
        years
    }

    // ── Base bill template ──────────────────────────────────────────

    /// Append an entry to the base template. Existing months are untouched.
    pub fn add_base_bill(
        &self,
        dataset: &mut Dataset,
        name: &str,
        amount: f64,
    ) -> Result<Uuid, CoreError> {
        let name = required_text("Base bill name", name)?;
        let amount = money_amount("Base bill amount", amount)?;
        if dataset.base_bills.iter().any(|b| same_name(&b.name, &name)) {
            return Err(CoreError::duplicate("base bill", &name));
        }

        let entry = BaseBill::new(name, amount);
        let id = entry.id;
        debug!(name = %entry.name, %amount, "Added base bill");
        dataset.base_bills.push(entry);
        Ok(id)
    }

    /// Edit a template entry. Existing months are untouched.
    pub fn edit_base_bill(
        &self,
        dataset: &mut Dataset,
        id: Uuid,
        name: &str,
        amount: f64,
    ) -> Result<(), CoreError> {
        let name = required_text("Base bill name", name)?;
        let amount = money_amount("Base bill amount", amount)?;
        if dataset
            .base_bills
            .iter()
            .any(|b| b.id != id && same_name(&b.name, &name))
        {
            return Err(CoreError::duplicate("base bill", &name));
        }

        let entry = dataset
            .base_bills
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| CoreError::BaseBillNotFound(id.to_string()))?;
        entry.name = name;
        entry.amount = amount;
        debug!(%id, "Edited base bill");
        Ok(())
    }

    /// Remove a template entry and return it.
    pub fn remove_base_bill(&self, dataset: &mut Dataset, id: Uuid) -> Result<BaseBill, CoreError> {
        let idx = dataset
            .base_bills
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| CoreError::BaseBillNotFound(id.to_string()))?;
        debug!(%id, "Removed base bill");
        Ok(dataset.base_bills.remove(idx))
    }
}

impl Default for BillService {
    fn default() -> Self {
        Self::new()
    }
}

/// Accept exactly four ASCII digits (surrounding whitespace ignored).
pub(crate) fn validate_year(year: &str) -> Result<String, CoreError> {
    let trimmed = year.trim();
    if trimmed.len() != 4 || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(CoreError::InvalidYear(year.to_string()));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn validate_month(month: u32) -> Result<(), CoreError> {
    if !(1..=12).contains(&month) {
        return Err(CoreError::InvalidMonth(month));
    }
    Ok(())
}

/// Mutable bills of an existing month. A missing month cannot hold the
/// bill, so it reports the bill as not found.
fn month_mut<'a>(
    dataset: &'a mut Dataset,
    year: &str,
    month: u32,
    bill_id: Uuid,
) -> Result<&'a mut Vec<Bill>, CoreError> {
    validate_month(month)?;
    dataset
        .years
        .get_mut(year.trim())
        .and_then(|months| months.get_mut(&month))
        .ok_or_else(|| CoreError::BillNotFound(bill_id.to_string()))
}
