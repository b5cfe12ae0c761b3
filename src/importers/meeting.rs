//! Meeting importer: CSV source, natural key = title.

use std::path::Path;

use chrono::NaiveDate;
use tracing::info;

use super::{commit_batch, log_summary, ImportError, ImportStats, Importer, RecordOutcome};
use crate::domain::MeetingFields;
use crate::source::{self, SourceRecord};
use crate::store::RecordStore;

pub struct MeetingImporter;

impl Importer for MeetingImporter {
    fn name(&self) -> &'static str {
        "meeting"
    }

    fn import(
        &self,
        store: &mut dyn RecordStore,
        path: &Path,
    ) -> Result<ImportStats, ImportError> {
        let records = source::load_csv(path)?;
        self.import_records(store, &records)
    }
}

impl MeetingImporter {
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

        commit_batch(store, "meeting", &stats)?;
        log_summary("meeting", &stats);
        Ok(stats)
    }
}

fn validate(record: &SourceRecord) -> Result<MeetingFields, String> {
    let title = record
        .text("title")
        .ok_or_else(|| "skipping meeting with missing title".to_string())?;
    let description = record
        .text("description")
        .ok_or_else(|| format!("skipping meeting '{title}' with missing description"))?;
    let date_raw = record
        .text("date")
        .ok_or_else(|| format!("skipping meeting '{title}' with missing date"))?;
    let location = record
        .text("location")
        .ok_or_else(|| format!("skipping meeting '{title}' with missing location"))?;
    let date = NaiveDate::parse_from_str(&date_raw, "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{date_raw}' for meeting '{title}'"))?;
    Ok(MeetingFields {
        title,
        description,
        date,
        location,
    })
}

fn upsert(store: &mut dyn RecordStore, fields: MeetingFields) -> RecordOutcome {
    let existing = match store.find_meeting(&fields.title) {
        Ok(existing) => existing,
        Err(err) => {
            return RecordOutcome::Error(format!(
                "error checking for existing meeting '{}': {err}",
                fields.title
            ))
        }
    };

    match existing {
        Some(id) => match store.update_meeting(id, &fields) {
            Ok(()) => {
                info!("updated meeting '{}'", fields.title);
                RecordOutcome::Updated
            }
            Err(err) => {
                RecordOutcome::Error(format!("error updating meeting '{}': {err}", fields.title))
            }
        },
        None => match store.insert_meeting(&fields) {
            Ok(_) => {
                info!("created new meeting '{}'", fields.title);
                RecordOutcome::Created
            }
            Err(err) => {
                RecordOutcome::Error(format!("error creating meeting '{}': {err}", fields.title))
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
    fn creates_and_updates_by_title() {
        let mut store = MemoryStore::new();
        let importer = MeetingImporter;
        let records = vec![record(json!({
            "title": "General Meeting 1",
            "description": "Kickoff",
            "date": "2024-09-04",
            "location": "ZACH 310",
        }))];
        let stats = importer.import_records(&mut store, &records).expect("run");
        assert_eq!(stats.created, 1);

        let records = vec![record(json!({
            "title": "General Meeting 1",
            "description": "Kickoff and intro",
            "date": "2024-09-05",
            "location": "ZACH 310",
        }))];
        let stats = importer.import_records(&mut store, &records).expect("run");
        assert_eq!(stats.updated, 1);

        let meetings = &store.committed().meetings;
        assert_eq!(meetings.len(), 1);
        assert_eq!(
            meetings[0].1.date,
            NaiveDate::from_ymd_opt(2024, 9, 5).expect("valid date")
        );
    }

    #[test]
    fn unparseable_date_is_skipped() {
        let mut store = MemoryStore::new();
        let records = vec![record(json!({
            "title": "General Meeting 1",
            "description": "Kickoff",
            "date": "next wednesday",
            "location": "ZACH 310",
        }))];
        let stats = MeetingImporter
            .import_records(&mut store, &records)
            .expect("run");
        assert_eq!(stats.skipped, 1);
        assert!(store.committed().meetings.is_empty());
    }
}
