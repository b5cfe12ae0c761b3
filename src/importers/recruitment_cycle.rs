//! Recruitment cycle importer: JSON source, natural key = (semester, year).

use std::path::Path;

use tracing::info;

use super::{commit_batch, log_summary, ImportError, ImportStats, Importer, RecordOutcome};
use crate::domain::{CycleFields, Semester};
use crate::source::{self, SourceRecord};
use crate::store::RecordStore;

pub struct RecruitmentCycleImporter;

impl Importer for RecruitmentCycleImporter {
    fn name(&self) -> &'static str {
        "recruitment-cycle"
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

impl RecruitmentCycleImporter {
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

        commit_batch(store, "recruitment cycle", &stats)?;
        log_summary("recruitment cycle", &stats);
        Ok(stats)
    }
}

fn validate(record: &SourceRecord) -> Result<CycleFields, String> {
    let semester_raw = record
        .text("semester")
        .ok_or_else(|| "skipping cycle with missing semester".to_string())?;
    let year = record
        .integer("year")
        .ok_or_else(|| "skipping cycle with missing year".to_string())?;
    let semester = Semester::parse(&semester_raw)
        .ok_or_else(|| format!("invalid semester '{semester_raw}' for cycle"))?;
    Ok(CycleFields {
        semester,
        year: year as i32,
    })
}

fn upsert(store: &mut dyn RecordStore, fields: CycleFields) -> RecordOutcome {
    let label = format!("{} {}", fields.semester.label(), fields.year);
    let existing = match store.find_cycle(fields.semester, fields.year) {
        Ok(existing) => existing,
        Err(err) => {
            return RecordOutcome::Error(format!(
                "error checking for existing cycle {label}: {err}"
            ))
        }
    };

    match existing {
        Some(id) => match store.update_cycle(id, &fields) {
            Ok(()) => {
                info!("updated cycle {label}");
                RecordOutcome::Updated
            }
            Err(err) => RecordOutcome::Error(format!("error updating cycle {label}: {err}")),
        },
        None => match store.insert_cycle(&fields) {
            Ok(_) => {
                info!("created new cycle {label}");
                RecordOutcome::Created
            }
            Err(err) => RecordOutcome::Error(format!("error creating cycle {label}: {err}")),
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
    fn second_run_updates_instead_of_duplicating() {
        let mut store = MemoryStore::new();
        let importer = RecruitmentCycleImporter;
        let records = vec![
            record(json!({"semester": "Fall", "year": 2023})),
            record(json!({"semester": "Spring", "year": 2024})),
        ];

        let stats = importer.import_records(&mut store, &records).expect("run");
        assert_eq!(stats.created, 2);

        let stats = importer.import_records(&mut store, &records).expect("rerun");
        assert_eq!(stats.created, 0);
        assert_eq!(stats.updated, 2);
        assert_eq!(store.committed().cycles.len(), 2);
    }

    #[test]
    fn year_may_arrive_as_numeric_string() {
        let mut store = MemoryStore::new();
        let records = vec![record(json!({"semester": "fall", "year": "2023"}))];
        let stats = RecruitmentCycleImporter
            .import_records(&mut store, &records)
            .expect("run");
        assert_eq!(stats.created, 1);
        assert_eq!(store.committed().cycles[0].1.year, 2023);
    }

    #[test]
    fn unknown_semester_is_skipped() {
        let mut store = MemoryStore::new();
        let records = vec![record(json!({"semester": "Summer", "year": 2023}))];
        let stats = RecruitmentCycleImporter
            .import_records(&mut store, &records)
            .expect("run");
        assert_eq!(stats.skipped, 1);
    }
}
