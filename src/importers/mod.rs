//! Per-entity importers and the machinery they share.
//!
//! Every importer follows the same shape: load the source file (a broken file
//! fails the importer before any record is touched), then per record
//! validate, resolve references, look up the existing row by natural key, and
//! create or update. Batched importers commit once at the end; the
//! application-question importer commits per link (see its module).

pub mod applicant;
pub mod application;
pub mod application_question;
pub mod committee;
pub mod meeting;
pub mod member;
pub mod position;
pub mod question;
pub mod recruitment_cycle;

pub use applicant::ApplicantImporter;
pub use application::ApplicationImporter;
pub use application_question::ApplicationQuestionImporter;
pub use committee::CommitteeImporter;
pub use meeting::MeetingImporter;
pub use member::MemberImporter;
pub use position::PositionImporter;
pub use question::QuestionImporter;
pub use recruitment_cycle::RecruitmentCycleImporter;

use std::path::Path;

use tracing::{error, info, warn};

use crate::source::SourceError;
use crate::store::{RecordStore, StoreError};

/// Terminal state of one source record within one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Created,
    Updated,
    /// Failed validation or was already present where only creation applies.
    Skipped(String),
    /// Unresolved reference or a staging/mutation failure.
    Error(String),
}

/// Counters accumulated over one importer run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportStats {
    pub processed: usize,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl ImportStats {
    /// Records successfully created or updated.
    pub fn imported(&self) -> usize {
        self.created + self.updated
    }

    /// Count an outcome, logging skip/error reasons.
    pub fn apply(&mut self, outcome: RecordOutcome) {
        match outcome {
            RecordOutcome::Created => self.created += 1,
            RecordOutcome::Updated => self.updated += 1,
            RecordOutcome::Skipped(reason) => {
                self.skipped += 1;
                warn!("{reason}");
            }
            RecordOutcome::Error(reason) => {
                self.errors += 1;
                error!("{reason}");
            }
        }
    }

    pub fn merge(&mut self, other: &ImportStats) {
        self.processed += other.processed;
        self.created += other.created;
        self.updated += other.updated;
        self.skipped += other.skipped;
        self.errors += other.errors;
    }
}

/// Failure that aborts a whole importer run.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("failed to commit {entity} batch: {source}")]
    Commit {
        entity: &'static str,
        #[source]
        source: StoreError,
    },
}

/// One importer per entity type.
///
/// `import` returns the run's counters; hard failures (unreadable source,
/// failed commit) are errors. Whether a run with zero imported records counts
/// as a success is the driver's call, not the importer's.
pub trait Importer {
    /// Name used for `--importer` selection and log lines.
    fn name(&self) -> &'static str;
    fn import(
        &self,
        store: &mut dyn RecordStore,
        path: &Path,
    ) -> Result<ImportStats, ImportError>;
}

/// Commit the staged batch if anything was imported; roll back on failure.
///
/// Note the counters in `stats` were tallied before this point, so a failed
/// commit leaves logged per-record statistics ahead of what was persisted.
pub(crate) fn commit_batch(
    store: &mut dyn RecordStore,
    entity: &'static str,
    stats: &ImportStats,
) -> Result<(), ImportError> {
    if stats.imported() == 0 {
        return Ok(());
    }
    if let Err(source) = store.commit() {
        store.rollback();
        return Err(ImportError::Commit { entity, source });
    }
    info!(
        "successfully committed {} {entity} records",
        stats.imported()
    );
    Ok(())
}

#[cfg(test)]
pub(crate) mod testutil {
    use crate::source::SourceRecord;
    use serde_json::Value;

    pub fn record(value: Value) -> SourceRecord {
        match value {
            Value::Object(fields) => SourceRecord::new(fields),
            _ => panic!("record fixture must be a JSON object"),
        }
    }
}

pub(crate) fn log_summary(entity: &str, stats: &ImportStats) {
    info!(
        "{entity} import summary: {} imported, {} skipped, {} errors out of {} total",
        stats.imported(),
        stats.skipped,
        stats.errors,
        stats.processed
    );
}
