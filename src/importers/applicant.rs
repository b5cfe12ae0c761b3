//! Applicant importer: JSON source, natural key = uin.
//!
//! Field names follow the application-form export headers ("UIN", "Email",
//! "Grad Semester", ...).

use std::path::Path;

use tracing::info;

use super::{commit_batch, log_summary, ImportError, ImportStats, Importer, RecordOutcome};
use crate::domain::ApplicantFields;
use crate::source::{self, SourceRecord};
use crate::store::RecordStore;

pub struct ApplicantImporter;

impl Importer for ApplicantImporter {
    fn name(&self) -> &'static str {
        "applicant"
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

impl ApplicantImporter {
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

        commit_batch(store, "applicant", &stats)?;
        log_summary("applicant", &stats);
        Ok(stats)
    }
}

fn validate(record: &SourceRecord) -> Result<ApplicantFields, String> {
    let uin = record
        .text("UIN")
        .ok_or_else(|| "skipping applicant with missing UIN".to_string())?;

    let email = record
        .text("Email")
        .ok_or_else(|| format!("skipping applicant '{uin}' with missing email"))?;
    let major = record
        .text("Major")
        .ok_or_else(|| format!("skipping applicant '{uin}' with missing major"))?;
    let grad_sem = record
        .text("Grad Semester")
        .ok_or_else(|| format!("skipping applicant '{uin}' with missing grad semester"))?;
    let grad_year = record
        .integer("Grad Year")
        .ok_or_else(|| format!("skipping applicant '{uin}' with missing grad year"))?;
    // Admission may legitimately be false; only absence is invalid.
    let admission = record
        .boolean("Admission")
        .ok_or_else(|| format!("skipping applicant '{uin}' with missing admission status"))?;

    Ok(ApplicantFields {
        uin,
        email,
        major,
        grad_sem,
        grad_year: grad_year as i32,
        admission,
    })
}

fn upsert(store: &mut dyn RecordStore, fields: ApplicantFields) -> RecordOutcome {
    let existing = match store.find_applicant(&fields.uin) {
        Ok(existing) => existing,
        Err(err) => {
            return RecordOutcome::Error(format!(
                "error checking for existing applicant '{}': {err}",
                fields.uin
            ))
        }
    };

    match existing {
        Some(id) => match store.update_applicant(id, &fields) {
            Ok(()) => {
                info!("updated applicant '{}'", fields.uin);
                RecordOutcome::Updated
            }
            Err(err) => {
                RecordOutcome::Error(format!("error updating applicant '{}': {err}", fields.uin))
            }
        },
        None => match store.insert_applicant(&fields) {
            Ok(_) => {
                info!("created new applicant '{}'", fields.uin);
                RecordOutcome::Created
            }
            Err(err) => {
                RecordOutcome::Error(format!("error creating applicant '{}': {err}", fields.uin))
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

    fn applicant(uin: &str, admission: bool) -> SourceRecord {
        record(json!({
            "UIN": uin,
            "Email": "applicant@tamu.edu",
            "Major": "CPSC",
            "Grad Semester": "Spring",
            "Grad Year": 2026,
            "Admission": admission,
        }))
    }

    #[test]
    fn admission_false_is_still_valid() {
        let mut store = MemoryStore::new();
        let stats = ApplicantImporter
            .import_records(&mut store, &[applicant("727000001", false)])
            .expect("run");
        assert_eq!(stats.created, 1);
        assert!(!store.committed().applicants[0].1.admission);
    }

    #[test]
    fn missing_admission_is_skipped() {
        let mut store = MemoryStore::new();
        let incomplete = record(json!({
            "UIN": "727000001",
            "Email": "applicant@tamu.edu",
            "Major": "CPSC",
            "Grad Semester": "Spring",
            "Grad Year": 2026,
        }));
        let stats = ApplicantImporter
            .import_records(&mut store, &[incomplete])
            .expect("run");
        assert_eq!(stats.skipped, 1);
        assert!(store.committed().applicants.is_empty());
    }

    #[test]
    fn numeric_uin_exports_are_accepted() {
        let mut store = MemoryStore::new();
        let numeric = record(json!({
            "UIN": 727000001_i64,
            "Email": "applicant@tamu.edu",
            "Major": "CPSC",
            "Grad Semester": "Spring",
            "Grad Year": "2026",
            "Admission": true,
        }));
        let stats = ApplicantImporter
            .import_records(&mut store, &[numeric])
            .expect("run");
        assert_eq!(stats.created, 1);
        assert_eq!(store.committed().applicants[0].1.uin, "727000001");
    }

    #[test]
    fn rerun_with_same_uin_updates() {
        let mut store = MemoryStore::new();
        let importer = ApplicantImporter;
        importer
            .import_records(&mut store, &[applicant("727000001", false)])
            .expect("first run");
        let stats = importer
            .import_records(&mut store, &[applicant("727000001", true)])
            .expect("second run");
        assert_eq!(stats.updated, 1);

        let applicants = &store.committed().applicants;
        assert_eq!(applicants.len(), 1);
        assert!(applicants[0].1.admission);
    }
}
