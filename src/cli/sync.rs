use super::ui;
use crate::core::config::AppConfig;
use crate::core::reference::{ReferenceProvider, load_reference_data};
use crate::core::{RegionCurrencySource, ViewGenerator};
use crate::providers::bundled::BundledReferenceProvider;
use crate::providers::cldr::{CldrProvider, parse_currency_data};
use crate::store::metadata::{RunMetadata, format_timestamp};
use crate::store::{OutputStore, WrittenFile};
use anyhow::Result;
use chrono::{Local, Utc};
use comfy_table::Cell;
use std::path::PathBuf;
use tracing::info;

/// Outcome of a completed sync.
#[derive(Debug)]
pub struct SyncReport {
    pub output_dir: PathBuf,
    pub total_regions: usize,
    pub current_rows: usize,
    pub historical_rows: usize,
    pub files: Vec<WrittenFile>,
    pub generated_at: String,
}

impl SyncReport {
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![ui::header_cell("File"), ui::header_cell("Records")]);

        for file in &self.files {
            let name = file.path.file_name().map_or_else(
                || file.path.display().to_string(),
                |n| n.to_string_lossy().to_string(),
            );
            table.add_row(vec![Cell::new(name), ui::count_cell(file.records)]);
        }

        let mut output = format!(
            "Output: {}\n\n",
            ui::style_text(&self.output_dir.display().to_string(), ui::StyleType::Title)
        );
        output.push_str(&table.to_string());
        output.push_str(&format!(
            "\n\n{} {}\n{} {}\n{}",
            ui::style_text("Current currencies:", ui::StyleType::TotalLabel),
            ui::style_text(
                &format!("{} regions", self.current_rows),
                ui::StyleType::TotalValue
            ),
            ui::style_text("Historical currencies:", ui::StyleType::TotalLabel),
            ui::style_text(
                &format!("{} records", self.historical_rows),
                ui::StyleType::TotalValue
            ),
            ui::style_text(
                &format!("Generated at {}", self.generated_at),
                ui::StyleType::Subtle
            ),
        ));
        output
    }
}

/// Runs the whole pipeline: load reference tables, fetch and parse the CLDR
/// document, build the views and write them to the output directory.
pub async fn sync_currency_data(
    config: &AppConfig,
    source: &dyn RegionCurrencySource,
    reference: &dyn ReferenceProvider,
) -> Result<SyncReport> {
    info!("Starting currency data update process...");

    let store = OutputStore::new(&config.output_dir);
    store.ensure_dir()?;

    info!("Loading ISO reference data...");
    let reference = load_reference_data(reference);

    info!("Fetching CLDR currency data...");
    let xml = source.fetch_document().await?;

    info!("Parsing currency data...");
    let history = parse_currency_data(&xml)?;

    let generated_at = format_timestamp(Utc::now());
    let today = Local::now().date_naive();
    let views = ViewGenerator::new(&reference, today, &generated_at).generate(&history);

    let metadata = RunMetadata::new(&generated_at, history.len());
    let files = store.write_all(&views, &metadata)?;

    info!("Process completed successfully!");
    info!("- Current currencies: {} regions", views.current_rows.len());
    info!(
        "- Historical currencies: {} records",
        views.historical_rows.len()
    );

    Ok(SyncReport {
        output_dir: store.dir().to_path_buf(),
        total_regions: history.len(),
        current_rows: views.current_rows.len(),
        historical_rows: views.historical_rows.len(),
        files,
        generated_at,
    })
}

pub async fn run(config: &AppConfig) -> Result<SyncReport> {
    let source = CldrProvider::from_config(&config.source);
    let reference = BundledReferenceProvider::from_config(&config.reference);

    let report = sync_currency_data(config, &source, &reference).await?;
    println!("{}", report.display_as_table());
    Ok(report)
}
