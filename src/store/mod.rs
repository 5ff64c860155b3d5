pub mod metadata;

use crate::core::views::{CsvRow, CurrencyViews};
use anyhow::{Context, Result};
use metadata::RunMetadata;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const CURRENT_CSV: &str = "current_currencies.csv";
pub const HISTORICAL_CSV: &str = "historical_currencies.csv";
pub const CURRENT_JSON: &str = "current_currencies.json";
pub const HISTORICAL_JSON: &str = "historical_currencies.json";
pub const ISO_MAPPINGS_JSON: &str = "iso_mappings.json";
pub const METADATA_JSON: &str = "metadata.json";

/// A file written by the store and the number of records it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFile {
    pub path: PathBuf,
    pub records: usize,
}

/// Writes the generated views into a single output directory.
pub struct OutputStore {
    dir: PathBuf,
}

impl OutputStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        OutputStore {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn ensure_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create directory: {}", self.dir.display()))
    }

    /// Writes rows with a header line, even when there are no rows.
    pub fn write_csv<T: CsvRow>(&self, name: &str, rows: &[T]) -> Result<WrittenFile> {
        let path = self.dir.join(name);
        let write = || -> Result<()> {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_path(&path)?;
            writer.write_record(T::HEADERS)?;
            for row in rows {
                writer.serialize(row)?;
            }
            writer.flush()?;
            Ok(())
        };
        write().with_context(|| format!("Failed to write {}", path.display()))?;

        debug!("Wrote {} rows to {}", rows.len(), path.display());
        Ok(WrittenFile {
            path,
            records: rows.len(),
        })
    }

    pub fn write_json<T: Serialize>(
        &self,
        name: &str,
        value: &T,
        records: usize,
    ) -> Result<WrittenFile> {
        let path = self.dir.join(name);
        let json = serde_json::to_string_pretty(value)
            .with_context(|| format!("Failed to serialize {name}"))?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        debug!("Wrote {}", path.display());
        Ok(WrittenFile { path, records })
    }

    /// Writes every view followed by the metadata record. Files already
    /// written stay on disk if a later write fails.
    pub fn write_all(
        &self,
        views: &CurrencyViews,
        metadata: &RunMetadata,
    ) -> Result<Vec<WrittenFile>> {
        self.ensure_dir()?;

        info!("Writing current currencies CSV...");
        let mut written = vec![self.write_csv(CURRENT_CSV, &views.current_rows)?];

        info!("Writing historical currencies CSV...");
        written.push(self.write_csv(HISTORICAL_CSV, &views.historical_rows)?);

        info!("Writing current currencies JSON...");
        written.push(self.write_json(
            CURRENT_JSON,
            &views.current_json,
            views.current_json.len(),
        )?);

        info!("Writing historical currencies JSON...");
        written.push(self.write_json(
            HISTORICAL_JSON,
            &views.historical_json,
            views.historical_json.len(),
        )?);

        info!("Writing ISO mappings...");
        let mappings = &views.iso_mappings;
        written.push(self.write_json(
            ISO_MAPPINGS_JSON,
            mappings,
            mappings.countries.len() + mappings.currencies.len(),
        )?);

        info!("Saving metadata...");
        written.push(self.write_json(METADATA_JSON, metadata, 1)?);

        Ok(written)
    }
}
