//! Joins the CLDR history with the ISO reference tables into the output views.
use crate::core::history::{
    CurrencyStatus, CurrencyValidity, RegionCurrencyHistory, all_tender_currencies,
    classify_status, determine_current_currency,
};
use crate::core::reference::{CountryRecord, ReferenceData};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

const UNKNOWN: &str = "Unknown";

/// Row types that know their CSV header, so empty views still get one.
pub trait CsvRow: Serialize {
    const HEADERS: &'static [&'static str];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentCurrencyRow {
    pub country_code: String,
    pub country_name: String,
    pub official_country_name: String,
    pub iso_alpha3_code: String,
    pub currency_code: String,
    pub currency_name: String,
    pub active_since: String,
    pub last_updated: String,
}

impl CsvRow for CurrentCurrencyRow {
    const HEADERS: &'static [&'static str] = &[
        "country_code",
        "country_name",
        "official_country_name",
        "iso_alpha3_code",
        "currency_code",
        "currency_name",
        "active_since",
        "last_updated",
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoricalCurrencyRow {
    pub country_code: String,
    pub country_name: String,
    pub official_country_name: String,
    pub iso_alpha3_code: String,
    pub currency_code: String,
    pub currency_name: String,
    pub active_from: String,
    pub active_until: String,
    pub status: CurrencyStatus,
    pub last_updated: String,
    #[serde(skip)]
    valid_from: Option<NaiveDate>,
}

impl CsvRow for HistoricalCurrencyRow {
    const HEADERS: &'static [&'static str] = &[
        "country_code",
        "country_name",
        "official_country_name",
        "iso_alpha3_code",
        "currency_code",
        "currency_name",
        "active_from",
        "active_until",
        "status",
        "last_updated",
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentCurrencyEntry {
    pub country_name: String,
    pub official_country_name: String,
    pub iso_alpha3_code: String,
    pub currency_code: String,
    pub currency_name: String,
    pub active_since: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoricalCurrencyEntry {
    pub currency_code: String,
    pub currency_name: String,
    pub active_from: String,
    pub active_until: String,
    pub status: CurrencyStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoricalCountryEntry {
    pub country_name: String,
    pub official_country_name: String,
    pub iso_alpha3_code: String,
    pub currencies: Vec<HistoricalCurrencyEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct IsoMappings {
    pub countries: BTreeMap<String, String>,
    pub currencies: BTreeMap<String, String>,
    pub alpha2_to_alpha3: BTreeMap<String, String>,
}

/// All views produced by one run.
#[derive(Debug, Clone)]
pub struct CurrencyViews {
    pub current_rows: Vec<CurrentCurrencyRow>,
    pub historical_rows: Vec<HistoricalCurrencyRow>,
    pub current_json: BTreeMap<String, CurrentCurrencyEntry>,
    pub historical_json: BTreeMap<String, HistoricalCountryEntry>,
    pub iso_mappings: IsoMappings,
}

fn format_date(date: Option<NaiveDate>, missing: &str) -> String {
    date.map_or_else(
        || missing.to_string(),
        |d| d.format("%Y-%m-%d").to_string(),
    )
}

pub struct ViewGenerator<'a> {
    reference: &'a ReferenceData,
    today: NaiveDate,
    generated_at: String,
}

impl<'a> ViewGenerator<'a> {
    pub fn new(reference: &'a ReferenceData, today: NaiveDate, generated_at: &str) -> Self {
        ViewGenerator {
            reference,
            today,
            generated_at: generated_at.to_string(),
        }
    }

    pub fn generate(&self, history: &RegionCurrencyHistory) -> CurrencyViews {
        CurrencyViews {
            current_rows: self.current_rows(history),
            historical_rows: self.historical_rows(history),
            current_json: self.current_json(history),
            historical_json: self.historical_json(history),
            iso_mappings: self.iso_mappings(),
        }
    }

    /// Country record for a region, or `None` when the region is filtered out.
    fn country(&self, region_code: &str) -> Option<&'a CountryRecord> {
        self.reference
            .country(region_code)
            .filter(|country| !country.short_name.is_empty() && country.short_name != UNKNOWN)
    }

    fn currency_name(&self, code: &str) -> String {
        self.reference
            .currency(code)
            .map_or_else(|| code.to_string(), |c| c.display_name.clone())
    }

    fn current_entry(
        &self,
        country: &CountryRecord,
        currency: &CurrencyValidity,
    ) -> CurrentCurrencyEntry {
        CurrentCurrencyEntry {
            country_name: country.short_name.clone(),
            official_country_name: country.official_name.clone(),
            iso_alpha3_code: country.long_code.clone().unwrap_or_default(),
            currency_code: currency.currency_code.clone(),
            currency_name: self.currency_name(&currency.currency_code),
            active_since: format_date(currency.valid_from, UNKNOWN),
        }
    }

    fn historical_entry(&self, currency: &CurrencyValidity) -> HistoricalCurrencyEntry {
        HistoricalCurrencyEntry {
            currency_code: currency.currency_code.clone(),
            currency_name: self.currency_name(&currency.currency_code),
            active_from: format_date(currency.valid_from, UNKNOWN),
            active_until: format_date(currency.valid_to, ""),
            status: classify_status(currency, self.today),
        }
    }

    /// Regions that have a country record, with that record.
    fn known_regions<'h>(
        &self,
        history: &'h RegionCurrencyHistory,
    ) -> impl Iterator<Item = (&'h String, &'a CountryRecord, &'h Vec<CurrencyValidity>)> {
        history.iter().filter_map(move |(code, entries)| {
            self.country(code).map(|country| (code, country, entries))
        })
    }

    pub fn current_rows(&self, history: &RegionCurrencyHistory) -> Vec<CurrentCurrencyRow> {
        self.known_regions(history)
            .filter_map(|(code, country, entries)| {
                let currency = determine_current_currency(entries, self.today)?;
                let entry = self.current_entry(country, currency);
                Some(CurrentCurrencyRow {
                    country_code: code.clone(),
                    country_name: entry.country_name,
                    official_country_name: entry.official_country_name,
                    iso_alpha3_code: entry.iso_alpha3_code,
                    currency_code: entry.currency_code,
                    currency_name: entry.currency_name,
                    active_since: entry.active_since,
                    last_updated: self.generated_at.clone(),
                })
            })
            .collect()
    }

    /// Rows ordered by region code, then `Active` before `Historical`, then
    /// start date with unknown starts first.
    pub fn historical_rows(&self, history: &RegionCurrencyHistory) -> Vec<HistoricalCurrencyRow> {
        let mut rows: Vec<HistoricalCurrencyRow> = self
            .known_regions(history)
            .flat_map(move |(code, country, entries)| {
                all_tender_currencies(entries)
                    .into_iter()
                    .map(move |currency| {
                        let entry = self.historical_entry(currency);
                        HistoricalCurrencyRow {
                            country_code: code.clone(),
                            country_name: country.short_name.clone(),
                            official_country_name: country.official_name.clone(),
                            iso_alpha3_code: country.long_code.clone().unwrap_or_default(),
                            currency_code: entry.currency_code,
                            currency_name: entry.currency_name,
                            active_from: entry.active_from,
                            active_until: entry.active_until,
                            status: entry.status,
                            last_updated: self.generated_at.clone(),
                            valid_from: currency.valid_from,
                        }
                    })
            })
            .collect();

        rows.sort_by(|a, b| {
            a.country_code
                .cmp(&b.country_code)
                .then(a.status.cmp(&b.status))
                .then(a.valid_from.cmp(&b.valid_from))
        });
        rows
    }

    pub fn current_json(
        &self,
        history: &RegionCurrencyHistory,
    ) -> BTreeMap<String, CurrentCurrencyEntry> {
        self.known_regions(history)
            .filter_map(|(code, country, entries)| {
                let currency = determine_current_currency(entries, self.today)?;
                Some((code.clone(), self.current_entry(country, currency)))
            })
            .collect()
    }

    /// Currencies within a region stay in start-date order. Regions with no
    /// tender currency are left out.
    pub fn historical_json(
        &self,
        history: &RegionCurrencyHistory,
    ) -> BTreeMap<String, HistoricalCountryEntry> {
        self.known_regions(history)
            .filter_map(|(code, country, entries)| {
                let currencies: Vec<_> = all_tender_currencies(entries)
                    .into_iter()
                    .map(|currency| self.historical_entry(currency))
                    .collect();
                if currencies.is_empty() {
                    return None;
                }
                Some((
                    code.clone(),
                    HistoricalCountryEntry {
                        country_name: country.short_name.clone(),
                        official_country_name: country.official_name.clone(),
                        iso_alpha3_code: country.long_code.clone().unwrap_or_default(),
                        currencies,
                    },
                ))
            })
            .collect()
    }

    /// Flat code mappings built from the full reference tables.
    pub fn iso_mappings(&self) -> IsoMappings {
        let countries = &self.reference.countries;
        IsoMappings {
            countries: countries
                .iter()
                .map(|(code, country)| (code.clone(), country.short_name.clone()))
                .collect(),
            currencies: self
                .reference
                .currencies
                .iter()
                .map(|(code, currency)| (code.clone(), currency.display_name.clone()))
                .collect(),
            alpha2_to_alpha3: countries
                .iter()
                .filter_map(|(code, country)| {
                    country
                        .long_code
                        .as_ref()
                        .map(|long_code| (code.clone(), long_code.clone()))
                })
                .collect(),
        }
    }
}
