//! In-memory record store used by the importer unit tests.
//!
//! Mirrors the transactional shape of the SQLite backend: mutations land in a
//! working copy and only become visible through [`MemoryStore::committed`]
//! after a commit. A forced commit failure can be armed to exercise the
//! batch-rollback path.

use super::{RecordStore, StoreError};
use crate::domain::{
    ApplicantFields, ApplicantId, ApplicationFields, ApplicationId, ApplicationQuestionId,
    CommitteeFields, CommitteeId, CycleFields, CycleId, MeetingFields, MeetingId, MemberFields,
    MemberId, PositionFields, PositionId, QuestionFields, QuestionId, QuestionType, Semester,
};

/// Snapshot of every table, keyed by surrogate id.
#[derive(Debug, Default, Clone)]
pub struct MemoryState {
    pub committees: Vec<(CommitteeId, CommitteeFields)>,
    pub positions: Vec<(PositionId, PositionFields)>,
    pub meetings: Vec<(MeetingId, MeetingFields)>,
    pub cycles: Vec<(CycleId, CycleFields)>,
    pub questions: Vec<(QuestionId, QuestionFields)>,
    pub applications: Vec<(ApplicationId, ApplicationFields)>,
    pub application_questions: Vec<(ApplicationQuestionId, ApplicationId, QuestionId)>,
    pub applicants: Vec<(ApplicantId, ApplicantFields)>,
    pub members: Vec<(MemberId, MemberFields)>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    committed: MemoryState,
    working: MemoryState,
    next_id: i64,
    fail_next_commit: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Self::default()
        }
    }

    /// State as of the last successful commit.
    pub fn committed(&self) -> &MemoryState {
        &self.committed
    }

    /// Arm a one-shot commit failure.
    pub fn fail_next_commit(&mut self) {
        self.fail_next_commit = true;
    }

    fn next_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl RecordStore for MemoryStore {
    fn find_committee(&self, name: &str) -> Result<Option<CommitteeId>, StoreError> {
        Ok(self
            .working
            .committees
            .iter()
            .find(|(_, fields)| fields.name == name)
            .map(|(id, _)| *id))
    }

    fn insert_committee(&mut self, fields: &CommitteeFields) -> Result<CommitteeId, StoreError> {
        let id = CommitteeId(self.next_id());
        self.working.committees.push((id, fields.clone()));
        Ok(id)
    }

    fn update_committee(
        &mut self,
        id: CommitteeId,
        fields: &CommitteeFields,
    ) -> Result<(), StoreError> {
        let row = self
            .working
            .committees
            .iter_mut()
            .find(|(row_id, _)| *row_id == id)
            .ok_or_else(|| StoreError::Unavailable(format!("no committee row {}", id.0)))?;
        row.1 = fields.clone();
        Ok(())
    }

    fn find_position(&self, title: &str) -> Result<Option<PositionId>, StoreError> {
        Ok(self
            .working
            .positions
            .iter()
            .find(|(_, fields)| fields.title == title)
            .map(|(id, _)| *id))
    }

    fn insert_position(&mut self, fields: &PositionFields) -> Result<PositionId, StoreError> {
        let id = PositionId(self.next_id());
        self.working.positions.push((id, fields.clone()));
        Ok(id)
    }

    fn update_position(
        &mut self,
        id: PositionId,
        fields: &PositionFields,
    ) -> Result<(), StoreError> {
        let row = self
            .working
            .positions
            .iter_mut()
            .find(|(row_id, _)| *row_id == id)
            .ok_or_else(|| StoreError::Unavailable(format!("no position row {}", id.0)))?;
        row.1 = fields.clone();
        Ok(())
    }

    fn find_meeting(&self, title: &str) -> Result<Option<MeetingId>, StoreError> {
        Ok(self
            .working
            .meetings
            .iter()
            .find(|(_, fields)| fields.title == title)
            .map(|(id, _)| *id))
    }

    fn insert_meeting(&mut self, fields: &MeetingFields) -> Result<MeetingId, StoreError> {
        let id = MeetingId(self.next_id());
        self.working.meetings.push((id, fields.clone()));
        Ok(id)
    }

    fn update_meeting(&mut self, id: MeetingId, fields: &MeetingFields) -> Result<(), StoreError> {
        let row = self
            .working
            .meetings
            .iter_mut()
            .find(|(row_id, _)| *row_id == id)
            .ok_or_else(|| StoreError::Unavailable(format!("no meeting row {}", id.0)))?;
        row.1 = fields.clone();
        Ok(())
    }

    fn find_cycle(&self, semester: Semester, year: i32) -> Result<Option<CycleId>, StoreError> {
        Ok(self
            .working
            .cycles
            .iter()
            .find(|(_, fields)| fields.semester == semester && fields.year == year)
            .map(|(id, _)| *id))
    }

    fn insert_cycle(&mut self, fields: &CycleFields) -> Result<CycleId, StoreError> {
        let id = CycleId(self.next_id());
        self.working.cycles.push((id, fields.clone()));
        Ok(id)
    }

    fn update_cycle(&mut self, id: CycleId, fields: &CycleFields) -> Result<(), StoreError> {
        let row = self
            .working
            .cycles
            .iter_mut()
            .find(|(row_id, _)| *row_id == id)
            .ok_or_else(|| StoreError::Unavailable(format!("no cycle row {}", id.0)))?;
        row.1 = fields.clone();
        Ok(())
    }

    fn find_question(
        &self,
        text: &str,
        kind: QuestionType,
    ) -> Result<Option<QuestionId>, StoreError> {
        Ok(self
            .working
            .questions
            .iter()
            .find(|(_, fields)| fields.text == text && fields.kind == kind)
            .map(|(id, _)| *id))
    }

    fn insert_question(&mut self, fields: &QuestionFields) -> Result<QuestionId, StoreError> {
        let id = QuestionId(self.next_id());
        self.working.questions.push((id, fields.clone()));
        Ok(id)
    }

    fn update_question(
        &mut self,
        id: QuestionId,
        fields: &QuestionFields,
    ) -> Result<(), StoreError> {
        let row = self
            .working
            .questions
            .iter_mut()
            .find(|(row_id, _)| *row_id == id)
            .ok_or_else(|| StoreError::Unavailable(format!("no question row {}", id.0)))?;
        row.1 = fields.clone();
        Ok(())
    }

    fn find_application(
        &self,
        title: &str,
        cycle_id: CycleId,
    ) -> Result<Option<ApplicationId>, StoreError> {
        Ok(self
            .working
            .applications
            .iter()
            .find(|(_, fields)| fields.title == title && fields.cycle_id == cycle_id)
            .map(|(id, _)| *id))
    }

    fn find_application_for_cycle(
        &self,
        cycle_id: CycleId,
    ) -> Result<Option<ApplicationId>, StoreError> {
        Ok(self
            .working
            .applications
            .iter()
            .find(|(_, fields)| fields.cycle_id == cycle_id)
            .map(|(id, _)| *id))
    }

    fn insert_application(
        &mut self,
        fields: &ApplicationFields,
    ) -> Result<ApplicationId, StoreError> {
        let id = ApplicationId(self.next_id());
        self.working.applications.push((id, fields.clone()));
        Ok(id)
    }

    fn update_application(
        &mut self,
        id: ApplicationId,
        fields: &ApplicationFields,
    ) -> Result<(), StoreError> {
        let row = self
            .working
            .applications
            .iter_mut()
            .find(|(row_id, _)| *row_id == id)
            .ok_or_else(|| StoreError::Unavailable(format!("no application row {}", id.0)))?;
        row.1 = fields.clone();
        Ok(())
    }

    fn find_application_question(
        &self,
        app_id: ApplicationId,
        question_id: QuestionId,
    ) -> Result<Option<ApplicationQuestionId>, StoreError> {
        Ok(self
            .working
            .application_questions
            .iter()
            .find(|(_, row_app, row_question)| *row_app == app_id && *row_question == question_id)
            .map(|(id, _, _)| *id))
    }

    fn insert_application_question(
        &mut self,
        app_id: ApplicationId,
        question_id: QuestionId,
    ) -> Result<ApplicationQuestionId, StoreError> {
        let id = ApplicationQuestionId(self.next_id());
        self.working
            .application_questions
            .push((id, app_id, question_id));
        Ok(id)
    }

    fn find_applicant(&self, uin: &str) -> Result<Option<ApplicantId>, StoreError> {
        Ok(self
            .working
            .applicants
            .iter()
            .find(|(_, fields)| fields.uin == uin)
            .map(|(id, _)| *id))
    }

    fn insert_applicant(&mut self, fields: &ApplicantFields) -> Result<ApplicantId, StoreError> {
        let id = ApplicantId(self.next_id());
        self.working.applicants.push((id, fields.clone()));
        Ok(id)
    }

    fn update_applicant(
        &mut self,
        id: ApplicantId,
        fields: &ApplicantFields,
    ) -> Result<(), StoreError> {
        let row = self
            .working
            .applicants
            .iter_mut()
            .find(|(row_id, _)| *row_id == id)
            .ok_or_else(|| StoreError::Unavailable(format!("no applicant row {}", id.0)))?;
        row.1 = fields.clone();
        Ok(())
    }

    fn find_member(&self, uin: &str) -> Result<Option<MemberId>, StoreError> {
        Ok(self
            .working
            .members
            .iter()
            .find(|(_, fields)| fields.uin == uin)
            .map(|(id, _)| *id))
    }

    fn insert_member(&mut self, fields: &MemberFields) -> Result<MemberId, StoreError> {
        let id = MemberId(self.next_id());
        self.working.members.push((id, fields.clone()));
        Ok(id)
    }

    fn update_member(&mut self, id: MemberId, fields: &MemberFields) -> Result<(), StoreError> {
        let row = self
            .working
            .members
            .iter_mut()
            .find(|(row_id, _)| *row_id == id)
            .ok_or_else(|| StoreError::Unavailable(format!("no member row {}", id.0)))?;
        let existing = &mut row.1;
        let mut updated = fields.clone();
        updated.applicant_id = existing.applicant_id;
        updated.is_active = existing.is_active;
        updated.probation = existing.probation;
        *existing = updated;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        if self.fail_next_commit {
            self.fail_next_commit = false;
            return Err(StoreError::Unavailable("forced commit failure".to_string()));
        }
        self.committed = self.working.clone();
        Ok(())
    }

    fn rollback(&mut self) {
        self.working = self.committed.clone();
    }
}
