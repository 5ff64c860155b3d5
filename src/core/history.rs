//! Time-bounded region to currency assignments and the rules that resolve them.
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// A single currency assignment for a region, as listed in the CLDR document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyValidity {
    pub currency_code: String,
    /// `None` means the start is unknown.
    pub valid_from: Option<NaiveDate>,
    /// `None` means the currency is still in use with no scheduled end.
    pub valid_to: Option<NaiveDate>,
    pub is_tender: bool,
}

impl CurrencyValidity {
    /// Returns true when the currency has no end date or ends on/after `today`.
    pub fn is_active_on(&self, today: NaiveDate) -> bool {
        self.valid_to.is_none_or(|to| to >= today)
    }
}

/// Region code to its currency assignments, kept in document order.
pub type RegionCurrencyHistory = BTreeMap<String, Vec<CurrencyValidity>>;

/// Status of a currency assignment relative to the current date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CurrencyStatus {
    Active,
    Historical,
}

impl CurrencyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CurrencyStatus::Active => "Active",
            CurrencyStatus::Historical => "Historical",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            CurrencyStatus::Active => 0,
            CurrencyStatus::Historical => 1,
        }
    }
}

/// Orders `Active` before `Historical`.
impl Ord for CurrencyStatus {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl PartialOrd for CurrencyStatus {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for CurrencyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source of the raw CLDR supplemental data document.
#[async_trait]
pub trait RegionCurrencySource: Send + Sync {
    async fn fetch_document(&self) -> Result<String>;
}

/// Picks the currency a region uses today.
///
/// Entries are scanned in the order given, not re-sorted by date. The first
/// tender entry that is open-ended or ends on/after `today` wins, so when
/// several entries have no end date the one listed first is selected.
pub fn determine_current_currency(
    entries: &[CurrencyValidity],
    today: NaiveDate,
) -> Option<&CurrencyValidity> {
    entries
        .iter()
        .filter(|entry| entry.is_tender)
        .find(|entry| entry.is_active_on(today))
}

/// Returns every tender entry sorted by start date, unknown starts first.
pub fn all_tender_currencies(entries: &[CurrencyValidity]) -> Vec<&CurrencyValidity> {
    let mut tender: Vec<_> = entries.iter().filter(|entry| entry.is_tender).collect();
    tender.sort_by_key(|entry| entry.valid_from);
    tender
}

pub fn classify_status(entry: &CurrencyValidity, today: NaiveDate) -> CurrencyStatus {
    if entry.is_active_on(today) {
        CurrencyStatus::Active
    } else {
        CurrencyStatus::Historical
    }
}

#[cfg(test)]
pub(crate) fn validity(
    code: &str,
    from: Option<&str>,
    to: Option<&str>,
    is_tender: bool,
) -> CurrencyValidity {
    let parse = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
    CurrencyValidity {
        currency_code: code.to_string(),
        valid_from: from.map(parse),
        valid_to: to.map(parse),
        is_tender,
    }
}
