//! Position importer: JSON source, natural key = title.

use std::path::Path;

use tracing::info;

use super::{commit_batch, log_summary, ImportError, ImportStats, Importer, RecordOutcome};
use crate::domain::{PositionFields, PositionLevel};
use crate::source::{self, SourceRecord};
use crate::store::RecordStore;

pub struct PositionImporter;

impl Importer for PositionImporter {
    fn name(&self) -> &'static str {
        "position"
    }

    fn import(
        &self,
        store: &mut dyn RecordStore,
        path: &Path,
    ) -> Result<ImportStats, ImportError> {
        let records = source::load_json(path)?;
        self.import_records(store, &records)
    }
}

impl PositionImporter {
    pub(crate) fn import_records(
        &self,
        store: &mut dyn RecordStore,
        records: &[SourceRecord],
    ) -> Result<ImportStats, ImportError> {
        let mut stats = ImportStats::default();

        for record in records {
            stats.processed += 1;
            let fields = match validate(record) {
                Ok(fields) => fields,
                Err(reason) => {
                    stats.apply(RecordOutcome::Skipped(reason));
                    continue;
                }
            };
            stats.apply(upsert(store, fields));
        }

        commit_batch(store, "position", &stats)?;
        log_summary("position", &stats);
        Ok(stats)
    }
}

fn validate(record: &SourceRecord) -> Result<PositionFields, String> {
    let title = record
        .text("title")
        .ok_or_else(|| "skipping position with missing title".to_string())?;
    let level_raw = record
        .text("level")
        .ok_or_else(|| format!("skipping position '{title}' with missing level"))?;
    let level = PositionLevel::parse(&level_raw)
        .ok_or_else(|| format!("invalid level '{level_raw}' for position '{title}'"))?;
    Ok(PositionFields { title, level })
}

fn upsert(store: &mut dyn RecordStore, fields: PositionFields) -> RecordOutcome {
    let existing = match store.find_position(&fields.title) {
        Ok(existing) => existing,
        Err(err) => {
            return RecordOutcome::Error(format!(
                "error checking for existing position '{}': {err}",
                fields.title
            ))
        }
    };

    match existing {
        Some(id) => match store.update_position(id, &fields) {
            Ok(()) => {
                info!("updated position '{}'", fields.title);
                RecordOutcome::Updated
            }
            Err(err) => {
                RecordOutcome::Error(format!("error updating position '{}': {err}", fields.title))
            }
        },
        None => match store.insert_position(&fields) {
            Ok(_) => {
                info!("created new position '{}'", fields.title);
                RecordOutcome::Created
            }
            Err(err) => {
                RecordOutcome::Error(format!("error creating position '{}': {err}", fields.title))
            }
        },
    }
}
