//! Committee importer: JSON source, natural key = name.

use std::path::Path;

use tracing::info;

use super::{commit_batch, log_summary, ImportError, ImportStats, Importer, RecordOutcome};
use crate::domain::{CommitteeFields, Division};
use crate::source::{self, SourceRecord};
use crate::store::RecordStore;

pub struct CommitteeImporter;

impl Importer for CommitteeImporter {
    fn name(&self) -> &'static str {
        "committee"
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

impl CommitteeImporter {
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

        commit_batch(store, "committee", &stats)?;
        log_summary("committee", &stats);
        Ok(stats)
    }
}

fn validate(record: &SourceRecord) -> Result<CommitteeFields, String> {
    let name = record
        .text("name")
        .ok_or_else(|| "skipping committee with missing name".to_string())?;
    let division_raw = record
        .text("division")
        .ok_or_else(|| format!("skipping committee '{name}' with missing division"))?;
    let division = Division::parse(&division_raw)
        .ok_or_else(|| format!("invalid division '{division_raw}' for committee '{name}'"))?;
    Ok(CommitteeFields { name, division })
}

fn upsert(store: &mut dyn RecordStore, fields: CommitteeFields) -> RecordOutcome {
    let existing = match store.find_committee(&fields.name) {
        Ok(existing) => existing,
        Err(err) => {
            return RecordOutcome::Error(format!(
                "error checking for existing committee '{}': {err}",
                fields.name
            ))
        }
    };

    match existing {
        Some(id) => match store.update_committee(id, &fields) {
            Ok(()) => {
                info!("updated committee '{}'", fields.name);
                RecordOutcome::Updated
            }
            Err(err) => {
                RecordOutcome::Error(format!("error updating committee '{}': {err}", fields.name))
            }
        },
        None => match store.insert_committee(&fields) {
            Ok(_) => {
                info!("created new committee '{}'", fields.name);
                RecordOutcome::Created
            }
            Err(err) => {
                RecordOutcome::Error(format!("error creating committee '{}': {err}", fields.name))
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importers::testutil::record;
    use crate::store::MemoryStore;
    use serde_json::json;

    #[test]
    fn creates_then_updates_by_name() {
        let mut store = MemoryStore::new();
        let importer = CommitteeImporter;

        let first = vec![record(json!({"name": "Finance", "division": "Operations"}))];
        let stats = importer
            .import_records(&mut store, &first)
            .expect("first run");
        assert_eq!(stats.created, 1);
        assert_eq!(store.committed().committees.len(), 1);

        let second = vec![record(json!({"name": "Finance", "division": "Internal"}))];
        let stats = importer
            .import_records(&mut store, &second)
            .expect("second run");
        assert_eq!(stats.created, 0);
        assert_eq!(stats.updated, 1);

        let committees = &store.committed().committees;
        assert_eq!(committees.len(), 1, "no duplicate for the same name");
        assert_eq!(committees[0].1.division, Division::Internal);
    }

    #[test]
    fn missing_division_is_skipped_not_imported() {
        let mut store = MemoryStore::new();
        let records = vec![record(json!({"name": "Finance"}))];
        let stats = CommitteeImporter
            .import_records(&mut store, &records)
            .expect("run");

        assert_eq!(stats.processed, 1);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.created, 0);
        assert_eq!(stats.imported(), 0, "driver treats this run as a failure");
        assert!(store.committed().committees.is_empty());
    }

    #[test]
    fn unknown_division_is_skipped() {
        let mut store = MemoryStore::new();
        let records = vec![record(json!({"name": "Finance", "division": "Sideways"}))];
        let stats = CommitteeImporter
            .import_records(&mut store, &records)
            .expect("run");
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.errors, 0, "validation failures are skips, not errors");
    }

    #[test]
    fn commit_failure_rolls_back_the_batch() {
        let mut store = MemoryStore::new();
        store.fail_next_commit();
        let records = vec![record(json!({"name": "Finance", "division": "Operations"}))];
        let err = CommitteeImporter
            .import_records(&mut store, &records)
            .expect_err("commit fails");
        assert!(matches!(err, ImportError::Commit { .. }));
        assert!(store.committed().committees.is_empty());
    }
}
