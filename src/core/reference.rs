use anyhow::Result;
use std::collections::BTreeMap;
use tracing::{error, info};

/// ISO 3166-1 country identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryRecord {
    pub short_code: String,
    pub long_code: Option<String>,
    pub short_name: String,
    /// Falls back to `short_name` when the dataset has no official name.
    pub official_name: String,
}

/// ISO 4217 currency identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyRecord {
    pub code: String,
    pub display_name: String,
    pub numeric_id: String,
}

/// Lookup tables loaded once per run.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    pub countries: BTreeMap<String, CountryRecord>,
    pub currencies: BTreeMap<String, CurrencyRecord>,
}

impl ReferenceData {
    pub fn country(&self, code: &str) -> Option<&CountryRecord> {
        self.countries.get(code)
    }

    pub fn currency(&self, code: &str) -> Option<&CurrencyRecord> {
        self.currencies.get(code)
    }
}

pub trait ReferenceProvider {
    fn load_countries(&self) -> Result<BTreeMap<String, CountryRecord>>;
    fn load_currencies(&self) -> Result<BTreeMap<String, CurrencyRecord>>;
}

/// Loads both tables. A table that fails to load is logged and left empty so
/// the run continues with degraded names.
pub fn load_reference_data(provider: &dyn ReferenceProvider) -> ReferenceData {
    let countries = provider.load_countries().unwrap_or_else(|e| {
        error!("Failed to load ISO 3166 data: {e:#}");
        BTreeMap::new()
    });
    info!("Loaded {} ISO 3166 countries/territories", countries.len());

    let currencies = provider.load_currencies().unwrap_or_else(|e| {
        error!("Failed to load ISO 4217 data: {e:#}");
        BTreeMap::new()
    });
    info!("Loaded {} ISO 4217 currencies", currencies.len());

    ReferenceData {
        countries,
        currencies,
    }
}
