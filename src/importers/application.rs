//! Application importer: JSON source, natural key = (title, cycle).
//!
//! Depends on the recruitment cycle importer having run first; records whose
//! semester/year do not resolve to a stored cycle are counted as errors and
//! nothing is staged for them.

use std::path::Path;

use chrono::NaiveDateTime;
use tracing::info;

use super::{commit_batch, log_summary, ImportError, ImportStats, Importer, RecordOutcome};
use crate::domain::{ApplicationFields, CycleId, Semester};
use crate::source::{self, SourceRecord};
use crate::store::RecordStore;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct ApplicationImporter;

impl Importer for ApplicationImporter {
    fn name(&self) -> &'static str {
        "application"
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

/// Validated but not yet cycle-resolved application data.
struct ValidatedApplication {
    title: String,
    semester: Semester,
    year: i32,
    active: bool,
    published_time: String,
    closed_time: String,
    review_completion_time: String,
}

impl ApplicationImporter {
    pub(crate) fn import_records(
        &self,
        store: &mut dyn RecordStore,
        records: &[SourceRecord],
    ) -> Result<ImportStats, ImportError> {
        let mut stats = ImportStats::default();

        for record in records {
            stats.processed += 1;
            let validated = match validate(record) {
                Ok(validated) => validated,
                Err(reason) => {
                    stats.apply(RecordOutcome::Skipped(reason));
                    continue;
                }
            };

            let cycle_id = match resolve_cycle(store, &validated) {
                Ok(Some(cycle_id)) => cycle_id,
                Ok(None) => {
                    stats.apply(RecordOutcome::Error(format!(
                        "skipping application '{}' - no cycle found for {} {}",
                        validated.title,
                        validated.semester.label(),
                        validated.year
                    )));
                    continue;
                }
                Err(reason) => {
                    stats.apply(RecordOutcome::Error(reason));
                    continue;
                }
            };

            stats.apply(upsert(store, validated, cycle_id));
        }

        commit_batch(store, "application", &stats)?;
        log_summary("application", &stats);
        Ok(stats)
    }
}

fn validate(record: &SourceRecord) -> Result<ValidatedApplication, String> {
    let title = record
        .text("title")
        .ok_or_else(|| "skipping application with missing title".to_string())?;

    let require = |key: &str| {
        record
            .text(key)
            .ok_or_else(|| format!("skipping application '{title}' with missing {key}"))
    };
    let semester_raw = require("semester")?;
    let year = record
        .integer("year")
        .ok_or_else(|| format!("skipping application '{title}' with missing year"))?;
    let published_time = require("published_time")?;
    let closed_time = require("closed_time")?;
    let review_completion_time = require("review_completion_time")?;

    let semester = Semester::parse(&semester_raw)
        .ok_or_else(|| format!("invalid semester '{semester_raw}' for application '{title}'"))?;

    Ok(ValidatedApplication {
        title,
        semester,
        year: year as i32,
        active: record.boolean("active").unwrap_or(false),
        published_time,
        closed_time,
        review_completion_time,
    })
}

fn resolve_cycle(
    store: &dyn RecordStore,
    validated: &ValidatedApplication,
) -> Result<Option<CycleId>, String> {
    store
        .find_cycle(validated.semester, validated.year)
        .map_err(|err| {
            format!(
                "error finding cycle for {} {}: {err}",
                validated.semester.label(),
                validated.year
            )
        })
}

fn build_fields(validated: &ValidatedApplication, cycle_id: CycleId) -> Result<ApplicationFields, String> {
    let parse_time = |label: &str, raw: &str| {
        NaiveDateTime::parse_from_str(raw, TIME_FORMAT).map_err(|_| {
            format!(
                "failed to parse {label} '{raw}' for application '{}'",
                validated.title
            )
        })
    };

    // The source's published time becomes the stored creation time.
    Ok(ApplicationFields {
        title: validated.title.clone(),
        active: validated.active,
        created_time: parse_time("published_time", &validated.published_time)?,
        closed_time: parse_time("closed_time", &validated.closed_time)?,
        review_completion_time: parse_time(
            "review_completion_time",
            &validated.review_completion_time,
        )?,
        cycle_id,
    })
}

fn upsert(
    store: &mut dyn RecordStore,
    validated: ValidatedApplication,
    cycle_id: CycleId,
) -> RecordOutcome {
    let fields = match build_fields(&validated, cycle_id) {
        Ok(fields) => fields,
        Err(reason) => return RecordOutcome::Error(reason),
    };

    let existing = match store.find_application(&fields.title, cycle_id) {
        Ok(existing) => existing,
        Err(err) => {
            return RecordOutcome::Error(format!(
                "error checking for existing application '{}': {err}",
                fields.title
            ))
        }
    };

    match existing {
        Some(id) => match store.update_application(id, &fields) {
            Ok(()) => {
                info!("updated application '{}'", fields.title);
                RecordOutcome::Updated
            }
            Err(err) => RecordOutcome::Error(format!(
                "error updating application '{}': {err}",
                fields.title
            )),
        },
        None => match store.insert_application(&fields) {
            Ok(_) => {
                info!("created new application '{}'", fields.title);
                RecordOutcome::Created
            }
            Err(err) => RecordOutcome::Error(format!(
                "error creating application '{}': {err}",
                fields.title
            )),
        },
    }
}
