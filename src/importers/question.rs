//! Question importer: JSON source, natural key = (text, type).

use std::path::Path;

use tracing::info;

use super::{commit_batch, log_summary, ImportError, ImportStats, Importer, RecordOutcome};
use crate::domain::{QuestionAudience, QuestionFields, QuestionType};
use crate::source::{self, SourceRecord};
use crate::store::RecordStore;

pub struct QuestionImporter;

impl Importer for QuestionImporter {
    fn name(&self) -> &'static str {
        "question"
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

impl QuestionImporter {
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

        commit_batch(store, "question", &stats)?;
        log_summary("question", &stats);
        Ok(stats)
    }
}

/// Shorten long question text for log lines.
fn preview(text: &str) -> String {
    let snippet: String = text.chars().take(30).collect();
    if snippet.len() < text.len() {
        format!("{snippet}...")
    } else {
        snippet
    }
}

fn validate(record: &SourceRecord) -> Result<QuestionFields, String> {
    let text = record
        .text("text")
        .ok_or_else(|| "skipping question with missing text".to_string())?;
    let kind_raw = record
        .text("type")
        .ok_or_else(|| format!("skipping question '{}' with missing type", preview(&text)))?;
    let audience_raw = record
        .text("audience")
        .ok_or_else(|| format!("skipping question '{}' with missing audience", preview(&text)))?;

    let kind = QuestionType::parse(&kind_raw).ok_or_else(|| {
        format!(
            "invalid type '{kind_raw}' for question '{}'",
            preview(&text)
        )
    })?;
    let audience = QuestionAudience::parse(&audience_raw).ok_or_else(|| {
        format!(
            "invalid audience '{audience_raw}' for question '{}'",
            preview(&text)
        )
    })?;

    Ok(QuestionFields {
        text,
        kind,
        audience,
        word_limit: record.integer("word_limit"),
        max_score: record.integer("max_score"),
        required: record.boolean("required").unwrap_or(true),
    })
}

fn upsert(store: &mut dyn RecordStore, fields: QuestionFields) -> RecordOutcome {
    let label = preview(&fields.text);
    let existing = match store.find_question(&fields.text, fields.kind) {
        Ok(existing) => existing,
        Err(err) => {
            return RecordOutcome::Error(format!(
                "error checking for existing question '{label}': {err}"
            ))
        }
    };

    match existing {
        Some(id) => match store.update_question(id, &fields) {
            Ok(()) => {
                info!("updated question '{label}'");
                RecordOutcome::Updated
            }
            Err(err) => RecordOutcome::Error(format!("error updating question '{label}': {err}")),
        },
        None => match store.insert_question(&fields) {
            Ok(_) => {
                info!("created new question '{label}'");
                RecordOutcome::Created
            }
            Err(err) => RecordOutcome::Error(format!("error creating question '{label}': {err}")),
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
    fn same_text_different_type_are_distinct_questions() {
        let mut store = MemoryStore::new();
        let records = vec![
            record(json!({
                "text": "Why do you want to join?",
                "type": "application",
                "audience": "non_member",
                "word_limit": 250,
            })),
            record(json!({
                "text": "Why do you want to join?",
                "type": "interview",
                "audience": "non_member",
                "max_score": 5,
            })),
        ];
        let stats = QuestionImporter
            .import_records(&mut store, &records)
            .expect("run");
        assert_eq!(stats.created, 2);
        assert_eq!(store.committed().questions.len(), 2);
    }

    #[test]
    fn required_defaults_to_true_and_optionals_stay_empty() {
        let mut store = MemoryStore::new();
        let records = vec![record(json!({
            "text": "Resume link",
            "type": "Application",
            "audience": "member",
        }))];
        QuestionImporter
            .import_records(&mut store, &records)
            .expect("run");

        let question = &store.committed().questions[0].1;
        assert!(question.required);
        assert_eq!(question.word_limit, None);
        assert_eq!(question.max_score, None);
    }

    #[test]
    fn invalid_audience_is_skipped() {
        let mut store = MemoryStore::new();
        let records = vec![record(json!({
            "text": "Resume link",
            "type": "application",
            "audience": "everyone",
        }))];
        let stats = QuestionImporter
            .import_records(&mut store, &records)
            .expect("run");
        assert_eq!(stats.skipped, 1);
        assert!(store.committed().questions.is_empty());
    }
}
