//! Record store adapter consumed by the importers.
//!
//! Natural-key lookups are the only mechanism the pipeline has for detecting
//! previously imported rows; there is no separate import ledger. Keeping that
//! behind this trait means an alternate backend (or a dedup strategy such as
//! content hashing) can be swapped in without touching importer logic.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::domain::{
    ApplicantFields, ApplicantId, ApplicationFields, ApplicationId, ApplicationQuestionId,
    CommitteeFields, CommitteeId, CycleFields, CycleId, MeetingFields, MeetingId, MemberFields,
    MemberId, PositionFields, PositionId, QuestionFields, QuestionId, QuestionType, Semester,
};

/// Backend failure surfaced to the importers.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Query, stage, and transaction operations against the relational backend.
///
/// Staged inserts and updates become durable only at [`RecordStore::commit`];
/// [`RecordStore::rollback`] discards everything staged since the last commit.
pub trait RecordStore {
    fn find_committee(&self, name: &str) -> Result<Option<CommitteeId>, StoreError>;
    fn insert_committee(&mut self, fields: &CommitteeFields) -> Result<CommitteeId, StoreError>;
    fn update_committee(
        &mut self,
        id: CommitteeId,
        fields: &CommitteeFields,
    ) -> Result<(), StoreError>;

    fn find_position(&self, title: &str) -> Result<Option<PositionId>, StoreError>;
    fn insert_position(&mut self, fields: &PositionFields) -> Result<PositionId, StoreError>;
    fn update_position(
        &mut self,
        id: PositionId,
        fields: &PositionFields,
    ) -> Result<(), StoreError>;

    fn find_meeting(&self, title: &str) -> Result<Option<MeetingId>, StoreError>;
    fn insert_meeting(&mut self, fields: &MeetingFields) -> Result<MeetingId, StoreError>;
    fn update_meeting(&mut self, id: MeetingId, fields: &MeetingFields) -> Result<(), StoreError>;

    fn find_cycle(&self, semester: Semester, year: i32) -> Result<Option<CycleId>, StoreError>;
    fn insert_cycle(&mut self, fields: &CycleFields) -> Result<CycleId, StoreError>;
    fn update_cycle(&mut self, id: CycleId, fields: &CycleFields) -> Result<(), StoreError>;

    fn find_question(
        &self,
        text: &str,
        kind: QuestionType,
    ) -> Result<Option<QuestionId>, StoreError>;
    fn insert_question(&mut self, fields: &QuestionFields) -> Result<QuestionId, StoreError>;
    fn update_question(
        &mut self,
        id: QuestionId,
        fields: &QuestionFields,
    ) -> Result<(), StoreError>;

    fn find_application(
        &self,
        title: &str,
        cycle_id: CycleId,
    ) -> Result<Option<ApplicationId>, StoreError>;
    /// First application recorded for the cycle, if any.
    fn find_application_for_cycle(
        &self,
        cycle_id: CycleId,
    ) -> Result<Option<ApplicationId>, StoreError>;
    fn insert_application(
        &mut self,
        fields: &ApplicationFields,
    ) -> Result<ApplicationId, StoreError>;
    fn update_application(
        &mut self,
        id: ApplicationId,
        fields: &ApplicationFields,
    ) -> Result<(), StoreError>;

    fn find_application_question(
        &self,
        app_id: ApplicationId,
        question_id: QuestionId,
    ) -> Result<Option<ApplicationQuestionId>, StoreError>;
    fn insert_application_question(
        &mut self,
        app_id: ApplicationId,
        question_id: QuestionId,
    ) -> Result<ApplicationQuestionId, StoreError>;

    fn find_applicant(&self, uin: &str) -> Result<Option<ApplicantId>, StoreError>;
    fn insert_applicant(&mut self, fields: &ApplicantFields) -> Result<ApplicantId, StoreError>;
    fn update_applicant(
        &mut self,
        id: ApplicantId,
        fields: &ApplicantFields,
    ) -> Result<(), StoreError>;

    fn find_member(&self, uin: &str) -> Result<Option<MemberId>, StoreError>;
    fn insert_member(&mut self, fields: &MemberFields) -> Result<MemberId, StoreError>;
    /// Overwrites member data in place. The applicant link and the
    /// is_active/probation flags keep their stored values.
    fn update_member(&mut self, id: MemberId, fields: &MemberFields) -> Result<(), StoreError>;

    /// Make everything staged since the last commit durable.
    fn commit(&mut self) -> Result<(), StoreError>;
    /// Discard everything staged since the last commit.
    fn rollback(&mut self);
}
