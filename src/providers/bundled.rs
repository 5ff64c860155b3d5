use crate::core::config::ReferenceConfig;
use crate::core::reference::{CountryRecord, CurrencyRecord, ReferenceProvider};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

const BUNDLED_COUNTRIES: &str = include_str!("../../reference/iso3166.json");
const BUNDLED_CURRENCIES: &str = include_str!("../../reference/iso4217.json");

/// Reads the ISO 3166-1 and ISO 4217 datasets in the iso-codes JSON layout.
/// Datasets compiled into the binary are used unless a path override is set.
pub struct BundledReferenceProvider {
    countries_path: Option<PathBuf>,
    currencies_path: Option<PathBuf>,
}

impl BundledReferenceProvider {
    pub fn new() -> Self {
        Self {
            countries_path: None,
            currencies_path: None,
        }
    }

    pub fn from_config(config: &ReferenceConfig) -> Self {
        Self {
            countries_path: config.countries_path.clone(),
            currencies_path: config.currencies_path.clone(),
        }
    }
}

impl Default for BundledReferenceProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct CountriesFile {
    #[serde(rename = "3166-1")]
    entries: Vec<CountryEntry>,
}

#[derive(Debug, Deserialize)]
struct CountryEntry {
    alpha_2: String,
    alpha_3: Option<String>,
    name: String,
    official_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CurrenciesFile {
    #[serde(rename = "4217")]
    entries: Vec<CurrencyEntry>,
}

#[derive(Debug, Deserialize)]
struct CurrencyEntry {
    alpha_3: String,
    name: String,
    #[serde(default)]
    numeric: String,
}

fn read_dataset(path: Option<&Path>, bundled: &'static str) -> Result<String> {
    match path {
        Some(path) => {
            debug!("Reading reference dataset from {}", path.display());
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read reference dataset: {}", path.display()))
        }
        None => Ok(bundled.to_string()),
    }
}

fn parse_countries(json: &str) -> Result<BTreeMap<String, CountryRecord>> {
    let file: CountriesFile =
        serde_json::from_str(json).context("Failed to parse ISO 3166 dataset")?;

    Ok(file
        .entries
        .into_iter()
        .map(|entry| {
            let official_name = entry.official_name.unwrap_or_else(|| entry.name.clone());
            let record = CountryRecord {
                short_code: entry.alpha_2.clone(),
                long_code: entry.alpha_3.filter(|code| !code.is_empty()),
                short_name: entry.name,
                official_name,
            };
            (entry.alpha_2, record)
        })
        .collect())
}

fn parse_currencies(json: &str) -> Result<BTreeMap<String, CurrencyRecord>> {
    let file: CurrenciesFile =
        serde_json::from_str(json).context("Failed to parse ISO 4217 dataset")?;

    Ok(file
        .entries
        .into_iter()
        .map(|entry| {
            let record = CurrencyRecord {
                code: entry.alpha_3.clone(),
                display_name: entry.name,
                numeric_id: entry.numeric,
            };
            (entry.alpha_3, record)
        })
        .collect())
}

impl ReferenceProvider for BundledReferenceProvider {
    fn load_countries(&self) -> Result<BTreeMap<String, CountryRecord>> {
        let json = read_dataset(self.countries_path.as_deref(), BUNDLED_COUNTRIES)?;
        parse_countries(&json)
    }

    fn load_currencies(&self) -> Result<BTreeMap<String, CurrencyRecord>> {
        let json = read_dataset(self.currencies_path.as_deref(), BUNDLED_CURRENCIES)?;
        parse_currencies(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::reference::load_reference_data;
    use tempfile::TempDir;

    #[test]
    fn test_bundled_countries() {
        let countries = BundledReferenceProvider::new().load_countries().unwrap();

        assert!(countries.len() > 240);
        let us = countries.get("US").unwrap();
        assert_eq!(us.long_code.as_deref(), Some("USA"));
        assert_eq!(us.short_name, "United States");
        assert_eq!(us.official_name, "United States of America");

        // No official name in the dataset, so it falls back to the short name
        let aruba = countries.get("AW").unwrap();
        assert_eq!(aruba.official_name, "Aruba");
    }

    #[test]
    fn test_bundled_currencies() {
        let currencies = BundledReferenceProvider::new().load_currencies().unwrap();

        let eur = currencies.get("EUR").unwrap();
        assert_eq!(eur.display_name, "Euro");
        assert_eq!(eur.numeric_id, "978");
        assert_eq!(currencies.get("USD").unwrap().display_name, "US Dollar");
    }

    #[test]
    fn test_path_override() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let countries_path = temp_dir.path().join("countries.json");
        std::fs::write(
            &countries_path,
            r#"{"3166-1": [{"alpha_2": "ZZ", "name": "Testland"}]}"#,
        )?;

        let provider = BundledReferenceProvider::from_config(&ReferenceConfig {
            countries_path: Some(countries_path),
            currencies_path: None,
        });
        let countries = provider.load_countries()?;

        assert_eq!(countries.len(), 1);
        let zz = countries.get("ZZ").unwrap();
        assert_eq!(zz.long_code, None);
        assert_eq!(zz.official_name, "Testland");
        Ok(())
    }

    #[test]
    fn test_missing_or_malformed_dataset_degrades_to_empty() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let malformed = temp_dir.path().join("currencies.json");
        std::fs::write(&malformed, "{ not json")?;

        let provider = BundledReferenceProvider::from_config(&ReferenceConfig {
            countries_path: Some(temp_dir.path().join("missing.json")),
            currencies_path: Some(malformed),
        });

        assert!(provider.load_countries().is_err());
        assert!(provider.load_currencies().is_err());

        let data = load_reference_data(&provider);
        assert!(data.countries.is_empty());
        assert!(data.currencies.is_empty());
        Ok(())
    }
}
