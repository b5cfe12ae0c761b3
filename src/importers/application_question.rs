//! Application-question link importer.
//!
//! Reads the question source again and, for every cycle code a question
//! lists, links the question to that cycle's application. The question is
//! resolved by its own (text, type) pair, so interview questions that list
//! cycles are linked too. Natural key = (app_id, question_id): a link is
//! created at most once and a rerun skips it.
//!
//! Unlike every other importer this one commits per link rather than per
//! batch, and a failed commit aborts the rest of the file. The asymmetry is
//! kept deliberately so a partial run leaves every successful link durable.

use std::path::Path;

use tracing::info;

use super::{log_summary, ImportError, ImportStats, Importer, RecordOutcome};
use crate::domain::{decode_cycle_code, QuestionType};
use crate::source::{self, SourceRecord};
use crate::store::RecordStore;

pub struct ApplicationQuestionImporter;

impl Importer for ApplicationQuestionImporter {
    fn name(&self) -> &'static str {
        "application-question"
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

impl ApplicationQuestionImporter {
    pub(crate) fn import_records(
        &self,
        store: &mut dyn RecordStore,
        records: &[SourceRecord],
    ) -> Result<ImportStats, ImportError> {
        let mut stats = ImportStats::default();

        for record in records {
            stats.processed += 1;
            let text = match record.text("text") {
                Some(text) => text,
                None => {
                    stats.apply(RecordOutcome::Skipped(
                        "skipping question record with missing text".to_string(),
                    ));
                    continue;
                }
            };

            let kind = match record.text("type").as_deref().map(QuestionType::parse) {
                Some(Some(kind)) => kind,
                Some(None) | None => {
                    stats.apply(RecordOutcome::Skipped(format!(
                        "skipping question '{text}' with missing or invalid type"
                    )));
                    continue;
                }
            };

            let question_id = match store.find_question(&text, kind) {
                Ok(Some(id)) => id,
                Ok(None) => {
                    stats.apply(RecordOutcome::Error(format!(
                        "question not found: '{text}'"
                    )));
                    continue;
                }
                Err(err) => {
                    stats.apply(RecordOutcome::Error(format!(
                        "error looking up question '{text}': {err}"
                    )));
                    continue;
                }
            };

            for code in record.text_list("cycles") {
                let (semester, year) = match decode_cycle_code(&code) {
                    Some(decoded) => decoded,
                    None => {
                        stats.apply(RecordOutcome::Error(format!(
                            "invalid cycle code '{code}' for question '{text}'"
                        )));
                        continue;
                    }
                };

                let cycle_id = match store.find_cycle(semester, year) {
                    Ok(Some(id)) => id,
                    Ok(None) => {
                        stats.apply(RecordOutcome::Error(format!(
                            "cycle not found: {} {year}",
                            semester.label()
                        )));
                        continue;
                    }
                    Err(err) => {
                        stats.apply(RecordOutcome::Error(format!(
                            "error looking up cycle {} {year}: {err}",
                            semester.label()
                        )));
                        continue;
                    }
                };

                let app_id = match store.find_application_for_cycle(cycle_id) {
                    Ok(Some(id)) => id,
                    Ok(None) => {
                        stats.apply(RecordOutcome::Error(format!(
                            "application not found for cycle '{code}'"
                        )));
                        continue;
                    }
                    Err(err) => {
                        stats.apply(RecordOutcome::Error(format!(
                            "error looking up application for cycle '{code}': {err}"
                        )));
                        continue;
                    }
                };

                match store.find_application_question(app_id, question_id) {
                    Ok(Some(_)) => {
                        stats.apply(RecordOutcome::Skipped(format!(
                            "link already exists for application {} and question {}",
                            app_id.0, question_id.0
                        )));
                        continue;
                    }
                    Ok(None) => {}
                    Err(err) => {
                        stats.apply(RecordOutcome::Error(format!(
                            "error checking for existing link: {err}"
                        )));
                        continue;
                    }
                }

                if let Err(err) = store.insert_application_question(app_id, question_id) {
                    store.rollback();
                    stats.apply(RecordOutcome::Error(format!(
                        "error creating application question link: {err}"
                    )));
                    continue;
                }

                // Per-link commit; a failure here ends the whole run.
                if let Err(source) = store.commit() {
                    store.rollback();
                    return Err(ImportError::Commit {
                        entity: "application question",
                        source,
                    });
                }

                info!(
                    "linked question {} to application {}",
                    question_id.0, app_id.0
                );
                stats.apply(RecordOutcome::Created);
            }
        }

        log_summary("application question", &stats);
        Ok(stats)
    }
}
