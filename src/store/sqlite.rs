//! SQLite-backed record store.
//!
//! The connection runs with autocommit off: a deferred transaction is opened
//! on connect and re-opened after every commit or rollback, so everything an
//! importer stages stays invisible to other connections until its batch
//! commit.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::warn;

use super::{RecordStore, StoreError};
use crate::domain::{
    ApplicantFields, ApplicantId, ApplicationFields, ApplicationId, ApplicationQuestionId,
    CommitteeFields, CommitteeId, CycleFields, CycleId, MeetingFields, MeetingId, MemberFields,
    MemberId, PositionFields, PositionId, QuestionFields, QuestionId, QuestionType, Semester,
};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS committee (
    committee_id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    division TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS position (
    position_id INTEGER PRIMARY KEY,
    title TEXT NOT NULL UNIQUE,
    level TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS meeting (
    meeting_id INTEGER PRIMARY KEY,
    title TEXT NOT NULL UNIQUE,
    description TEXT NOT NULL,
    date TEXT NOT NULL,
    location TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS recruitment_cycle (
    cycle_id INTEGER PRIMARY KEY,
    semester TEXT NOT NULL,
    year INTEGER NOT NULL,
    UNIQUE (semester, year)
);
CREATE TABLE IF NOT EXISTS question (
    question_id INTEGER PRIMARY KEY,
    text TEXT NOT NULL,
    type TEXT NOT NULL,
    audience TEXT NOT NULL,
    word_limit INTEGER,
    max_score INTEGER,
    required INTEGER NOT NULL,
    UNIQUE (text, type)
);
CREATE TABLE IF NOT EXISTS application (
    app_id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    active INTEGER NOT NULL,
    created_time TEXT NOT NULL,
    closed_time TEXT NOT NULL,
    review_completion_time TEXT NOT NULL,
    cycle_id INTEGER NOT NULL REFERENCES recruitment_cycle (cycle_id),
    UNIQUE (title, cycle_id)
);
CREATE TABLE IF NOT EXISTS application_question (
    application_question_id INTEGER PRIMARY KEY,
    app_id INTEGER NOT NULL REFERENCES application (app_id),
    question_id INTEGER NOT NULL REFERENCES question (question_id),
    UNIQUE (app_id, question_id)
);
CREATE TABLE IF NOT EXISTS applicant (
    applicant_id INTEGER PRIMARY KEY,
    uin TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL,
    major TEXT NOT NULL,
    grad_sem TEXT NOT NULL,
    grad_year INTEGER NOT NULL,
    admission INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS member (
    member_id INTEGER PRIMARY KEY,
    applicant_id INTEGER REFERENCES applicant (applicant_id),
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    uin TEXT NOT NULL UNIQUE,
    tamu_email TEXT NOT NULL,
    phone TEXT NOT NULL,
    major TEXT NOT NULL,
    cohort_sem TEXT,
    cohort_year INTEGER,
    grad_sem TEXT NOT NULL,
    grad_year INTEGER NOT NULL,
    is_active INTEGER NOT NULL,
    probation INTEGER NOT NULL,
    linkedin TEXT,
    insta TEXT,
    birthday_month INTEGER NOT NULL,
    birthday_day INTEGER NOT NULL,
    birthday_year INTEGER NOT NULL
);
";

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path` and begin a session
    /// transaction.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Self::from_connection(Connection::open(path)?)
    }

    /// Private database for tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        conn.execute_batch("BEGIN")?;
        Ok(Self { conn })
    }
}

impl RecordStore for SqliteStore {
    fn find_committee(&self, name: &str) -> Result<Option<CommitteeId>, StoreError> {
        let id = self
            .conn
            .query_row(
                "SELECT committee_id FROM committee WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id.map(CommitteeId))
    }

    fn insert_committee(&mut self, fields: &CommitteeFields) -> Result<CommitteeId, StoreError> {
        self.conn.execute(
            "INSERT INTO committee (name, division) VALUES (?1, ?2)",
            params![fields.name, fields.division.label()],
        )?;
        Ok(CommitteeId(self.conn.last_insert_rowid()))
    }

    fn update_committee(
        &mut self,
        id: CommitteeId,
        fields: &CommitteeFields,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            "UPDATE committee SET name = ?1, division = ?2 WHERE committee_id = ?3",
            params![fields.name, fields.division.label(), id.0],
        )?;
        Ok(())
    }

    fn find_position(&self, title: &str) -> Result<Option<PositionId>, StoreError> {
        let id = self
            .conn
            .query_row(
                "SELECT position_id FROM position WHERE title = ?1",
                params![title],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id.map(PositionId))
    }

    fn insert_position(&mut self, fields: &PositionFields) -> Result<PositionId, StoreError> {
        self.conn.execute(
            "INSERT INTO position (title, level) VALUES (?1, ?2)",
            params![fields.title, fields.level.label()],
        )?;
        Ok(PositionId(self.conn.last_insert_rowid()))
    }

    fn update_position(
        &mut self,
        id: PositionId,
        fields: &PositionFields,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            "UPDATE position SET title = ?1, level = ?2 WHERE position_id = ?3",
            params![fields.title, fields.level.label(), id.0],
        )?;
        Ok(())
    }

    fn find_meeting(&self, title: &str) -> Result<Option<MeetingId>, StoreError> {
        let id = self
            .conn
            .query_row(
                "SELECT meeting_id FROM meeting WHERE title = ?1",
                params![title],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id.map(MeetingId))
    }

    fn insert_meeting(&mut self, fields: &MeetingFields) -> Result<MeetingId, StoreError> {
        self.conn.execute(
            "INSERT INTO meeting (title, description, date, location) VALUES (?1, ?2, ?3, ?4)",
            params![
                fields.title,
                fields.description,
                fields.date.format(DATE_FORMAT).to_string(),
                fields.location
            ],
        )?;
        Ok(MeetingId(self.conn.last_insert_rowid()))
    }

    fn update_meeting(&mut self, id: MeetingId, fields: &MeetingFields) -> Result<(), StoreError> {
        self.conn.execute(
            "UPDATE meeting SET title = ?1, description = ?2, date = ?3, location = ?4
             WHERE meeting_id = ?5",
            params![
                fields.title,
                fields.description,
                fields.date.format(DATE_FORMAT).to_string(),
                fields.location,
                id.0
            ],
        )?;
        Ok(())
    }

    fn find_cycle(&self, semester: Semester, year: i32) -> Result<Option<CycleId>, StoreError> {
        let id = self
            .conn
            .query_row(
                "SELECT cycle_id FROM recruitment_cycle WHERE semester = ?1 AND year = ?2",
                params![semester.label(), year],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id.map(CycleId))
    }

    fn insert_cycle(&mut self, fields: &CycleFields) -> Result<CycleId, StoreError> {
        self.conn.execute(
            "INSERT INTO recruitment_cycle (semester, year) VALUES (?1, ?2)",
            params![fields.semester.label(), fields.year],
        )?;
        Ok(CycleId(self.conn.last_insert_rowid()))
    }

    fn update_cycle(&mut self, id: CycleId, fields: &CycleFields) -> Result<(), StoreError> {
        self.conn.execute(
            "UPDATE recruitment_cycle SET semester = ?1, year = ?2 WHERE cycle_id = ?3",
            params![fields.semester.label(), fields.year, id.0],
        )?;
        Ok(())
    }

    fn find_question(
        &self,
        text: &str,
        kind: QuestionType,
    ) -> Result<Option<QuestionId>, StoreError> {
        let id = self
            .conn
            .query_row(
                "SELECT question_id FROM question WHERE text = ?1 AND type = ?2",
                params![text, kind.label()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id.map(QuestionId))
    }

    fn insert_question(&mut self, fields: &QuestionFields) -> Result<QuestionId, StoreError> {
        self.conn.execute(
            "INSERT INTO question (text, type, audience, word_limit, max_score, required)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                fields.text,
                fields.kind.label(),
                fields.audience.label(),
                fields.word_limit,
                fields.max_score,
                fields.required
            ],
        )?;
        Ok(QuestionId(self.conn.last_insert_rowid()))
    }

    fn update_question(
        &mut self,
        id: QuestionId,
        fields: &QuestionFields,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            "UPDATE question SET text = ?1, type = ?2, audience = ?3, word_limit = ?4,
                 max_score = ?5, required = ?6
             WHERE question_id = ?7",
            params![
                fields.text,
                fields.kind.label(),
                fields.audience.label(),
                fields.word_limit,
                fields.max_score,
                fields.required,
                id.0
            ],
        )?;
        Ok(())
    }

    fn find_application(
        &self,
        title: &str,
        cycle_id: CycleId,
    ) -> Result<Option<ApplicationId>, StoreError> {
        let id = self
            .conn
            .query_row(
                "SELECT app_id FROM application WHERE title = ?1 AND cycle_id = ?2",
                params![title, cycle_id.0],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id.map(ApplicationId))
    }

    fn find_application_for_cycle(
        &self,
        cycle_id: CycleId,
    ) -> Result<Option<ApplicationId>, StoreError> {
        let id = self
            .conn
            .query_row(
                "SELECT app_id FROM application WHERE cycle_id = ?1 ORDER BY app_id LIMIT 1",
                params![cycle_id.0],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id.map(ApplicationId))
    }

    fn insert_application(
        &mut self,
        fields: &ApplicationFields,
    ) -> Result<ApplicationId, StoreError> {
        self.conn.execute(
            "INSERT INTO application
                 (title, active, created_time, closed_time, review_completion_time, cycle_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                fields.title,
                fields.active,
                fields.created_time.format(TIME_FORMAT).to_string(),
                fields.closed_time.format(TIME_FORMAT).to_string(),
                fields.review_completion_time.format(TIME_FORMAT).to_string(),
                fields.cycle_id.0
            ],
        )?;
        Ok(ApplicationId(self.conn.last_insert_rowid()))
    }

    fn update_application(
        &mut self,
        id: ApplicationId,
        fields: &ApplicationFields,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            "UPDATE application SET title = ?1, active = ?2, created_time = ?3,
                 closed_time = ?4, review_completion_time = ?5, cycle_id = ?6
             WHERE app_id = ?7",
            params![
                fields.title,
                fields.active,
                fields.created_time.format(TIME_FORMAT).to_string(),
                fields.closed_time.format(TIME_FORMAT).to_string(),
                fields.review_completion_time.format(TIME_FORMAT).to_string(),
                fields.cycle_id.0,
                id.0
            ],
        )?;
        Ok(())
    }

    fn find_application_question(
        &self,
        app_id: ApplicationId,
        question_id: QuestionId,
    ) -> Result<Option<ApplicationQuestionId>, StoreError> {
        let id = self
            .conn
            .query_row(
                "SELECT application_question_id FROM application_question
                 WHERE app_id = ?1 AND question_id = ?2",
                params![app_id.0, question_id.0],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id.map(ApplicationQuestionId))
    }

    fn insert_application_question(
        &mut self,
        app_id: ApplicationId,
        question_id: QuestionId,
    ) -> Result<ApplicationQuestionId, StoreError> {
        self.conn.execute(
            "INSERT INTO application_question (app_id, question_id) VALUES (?1, ?2)",
            params![app_id.0, question_id.0],
        )?;
        Ok(ApplicationQuestionId(self.conn.last_insert_rowid()))
    }

    fn find_applicant(&self, uin: &str) -> Result<Option<ApplicantId>, StoreError> {
        let id = self
            .conn
            .query_row(
                "SELECT applicant_id FROM applicant WHERE uin = ?1",
                params![uin],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id.map(ApplicantId))
    }

    fn insert_applicant(&mut self, fields: &ApplicantFields) -> Result<ApplicantId, StoreError> {
        self.conn.execute(
            "INSERT INTO applicant (uin, email, major, grad_sem, grad_year, admission)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                fields.uin,
                fields.email,
                fields.major,
                fields.grad_sem,
                fields.grad_year,
                fields.admission
            ],
        )?;
        Ok(ApplicantId(self.conn.last_insert_rowid()))
    }

    fn update_applicant(
        &mut self,
        id: ApplicantId,
        fields: &ApplicantFields,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            "UPDATE applicant SET uin = ?1, email = ?2, major = ?3, grad_sem = ?4,
                 grad_year = ?5, admission = ?6
             WHERE applicant_id = ?7",
            params![
                fields.uin,
                fields.email,
                fields.major,
                fields.grad_sem,
                fields.grad_year,
                fields.admission,
                id.0
            ],
        )?;
        Ok(())
    }

    fn find_member(&self, uin: &str) -> Result<Option<MemberId>, StoreError> {
        let id = self
            .conn
            .query_row(
                "SELECT member_id FROM member WHERE uin = ?1",
                params![uin],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id.map(MemberId))
    }

    fn insert_member(&mut self, fields: &MemberFields) -> Result<MemberId, StoreError> {
        self.conn.execute(
            "INSERT INTO member
                 (applicant_id, first_name, last_name, uin, tamu_email, phone, major,
                  cohort_sem, cohort_year, grad_sem, grad_year, is_active, probation,
                  linkedin, insta, birthday_month, birthday_day, birthday_year)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                     ?16, ?17, ?18)",
            params![
                fields.applicant_id.map(|id| id.0),
                fields.first_name,
                fields.last_name,
                fields.uin,
                fields.tamu_email,
                fields.phone,
                fields.major,
                fields.cohort_sem,
                fields.cohort_year,
                fields.grad_sem,
                fields.grad_year,
                fields.is_active,
                fields.probation,
                fields.linkedin,
                fields.instagram,
                fields.birthday_month,
                fields.birthday_day,
                fields.birthday_year
            ],
        )?;
        Ok(MemberId(self.conn.last_insert_rowid()))
    }

    fn update_member(&mut self, id: MemberId, fields: &MemberFields) -> Result<(), StoreError> {
        // The applicant link and membership flags are creation-time values.
        self.conn.execute(
            "UPDATE member SET first_name = ?1, last_name = ?2, tamu_email = ?3, phone = ?4,
                 major = ?5, cohort_sem = ?6, cohort_year = ?7, grad_sem = ?8, grad_year = ?9,
                 linkedin = ?10, insta = ?11, birthday_month = ?12, birthday_day = ?13,
                 birthday_year = ?14
             WHERE member_id = ?15",
            params![
                fields.first_name,
                fields.last_name,
                fields.tamu_email,
                fields.phone,
                fields.major,
                fields.cohort_sem,
                fields.cohort_year,
                fields.grad_sem,
                fields.grad_year,
                fields.linkedin,
                fields.instagram,
                fields.birthday_month,
                fields.birthday_day,
                fields.birthday_year,
                id.0
            ],
        )?;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        self.conn.execute_batch("COMMIT")?;
        self.conn.execute_batch("BEGIN")?;
        Ok(())
    }

    fn rollback(&mut self) {
        if let Err(err) = self.conn.execute_batch("ROLLBACK") {
            warn!("rollback failed: {err}");
        }
        if let Err(err) = self.conn.execute_batch("BEGIN") {
            warn!("could not reopen session transaction: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Division;

    fn committee(name: &str) -> CommitteeFields {
        CommitteeFields {
            name: name.to_string(),
            division: Division::Operations,
        }
    }

    #[test]
    fn upsert_round_trips_through_natural_key() {
        let mut store = SqliteStore::open_in_memory().expect("open store");

        let id = store
            .insert_committee(&committee("Career Fair"))
            .expect("insert");
        assert_eq!(
            store.find_committee("Career Fair").expect("find"),
            Some(id)
        );

        let mut fields = committee("Career Fair");
        fields.division = Division::External;
        store.update_committee(id, &fields).expect("update");
        store.commit().expect("commit");

        let division: String = store
            .conn
            .query_row(
                "SELECT division FROM committee WHERE committee_id = ?1",
                params![id.0],
                |row| row.get(0),
            )
            .expect("read back");
        assert_eq!(division, "External");
    }

    #[test]
    fn rollback_discards_staged_rows() {
        let mut store = SqliteStore::open_in_memory().expect("open store");
        store
            .insert_committee(&committee("Finance"))
            .expect("insert");
        store.rollback();
        assert_eq!(store.find_committee("Finance").expect("find"), None);
    }

    #[test]
    fn duplicate_natural_key_insert_is_rejected() {
        let mut store = SqliteStore::open_in_memory().expect("open store");
        store
            .insert_committee(&committee("Finance"))
            .expect("insert");
        assert!(store.insert_committee(&committee("Finance")).is_err());
    }

    #[test]
    fn member_update_preserves_link_and_flags() {
        use crate::domain::MemberFields;

        let mut store = SqliteStore::open_in_memory().expect("open store");
        let fields = MemberFields {
            applicant_id: None,
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            uin: "727000001".to_string(),
            tamu_email: "ada@tamu.edu".to_string(),
            phone: "1234567890".to_string(),
            major: "CPSC".to_string(),
            cohort_sem: None,
            cohort_year: None,
            grad_sem: "Spring".to_string(),
            grad_year: 2026,
            is_active: true,
            probation: false,
            linkedin: None,
            instagram: None,
            birthday_month: 12,
            birthday_day: 10,
            birthday_year: 2004,
        };
        let id = store.insert_member(&fields).expect("insert");

        let mut changed = fields.clone();
        changed.major = "MATH".to_string();
        changed.is_active = false;
        store.update_member(id, &changed).expect("update");
        store.commit().expect("commit");

        let (major, is_active): (String, bool) = store
            .conn
            .query_row(
                "SELECT major, is_active FROM member WHERE member_id = ?1",
                params![id.0],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .expect("read back");
        assert_eq!(major, "MATH");
        assert!(is_active, "is_active is fixed at creation time");
    }
}
