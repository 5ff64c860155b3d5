//! Core data model and transformation logic

pub mod config;
pub mod history;
pub mod log;
pub mod reference;
pub mod views;

// Re-export main types for cleaner imports
pub use history::{CurrencyStatus, CurrencyValidity, RegionCurrencyHistory, RegionCurrencySource};
pub use reference::{CountryRecord, CurrencyRecord, ReferenceData, ReferenceProvider};
pub use views::{CurrencyViews, ViewGenerator};
