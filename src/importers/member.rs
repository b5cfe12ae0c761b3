//! Member importer: CSV directory export, natural key = uin.
//!
//! The directory spreadsheet is the messiest source in the pipeline. Names
//! arrive as one free-text column, graduation as "Spring 2026", birthdays as
//! float-rendered numbers, and phone numbers with formatting beyond ten
//! digits. Presence failures skip the row; parse failures on a present value
//! count as errors.
//!
//! A member row is linked to its applicant row (matched by uin) only when the
//! member is first created. A missing applicant match is logged but does not
//! block creation, so directory rows that predate the application form still
//! load. Updates never touch the applicant link or the membership flags.

use std::path::Path;

use tracing::{error, info};

use super::{commit_batch, log_summary, ImportError, ImportStats, Importer, RecordOutcome};
use crate::domain::{
    parse_fractional_int, split_expected_grad, split_full_name, ApplicantId, MemberFields,
};
use crate::source::{self, SourceRecord};
use crate::store::RecordStore;

const PHONE_DIGITS: usize = 10;

pub struct MemberImporter;

impl Importer for MemberImporter {
    fn name(&self) -> &'static str {
        "member"
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

impl MemberImporter {
    pub(crate) fn import_records(
        &self,
        store: &mut dyn RecordStore,
        records: &[SourceRecord],
    ) -> Result<ImportStats, ImportError> {
        let mut stats = ImportStats::default();

        for record in records {
            stats.processed += 1;
            let raw = match validate(record) {
                Ok(raw) => raw,
                Err(reason) => {
                    stats.apply(RecordOutcome::Skipped(reason));
                    continue;
                }
            };
            let fields = match build_fields(&raw) {
                Ok(fields) => fields,
                Err(reason) => {
                    stats.apply(RecordOutcome::Error(reason));
                    continue;
                }
            };
            stats.apply(upsert(store, fields));
        }

        commit_batch(store, "member", &stats)?;
        log_summary("member", &stats);
        Ok(stats)
    }
}

/// Raw column values after presence validation, before parsing.
struct RawMember {
    uin: String,
    full_name: String,
    tamu_email: String,
    phone: String,
    major: String,
    expected_grad: String,
    cohort_sem: Option<String>,
    cohort_year: Option<i32>,
    linkedin: Option<String>,
    instagram: Option<String>,
    birthday_month: String,
    birthday_day: String,
    birthday_year: String,
}

fn validate(record: &SourceRecord) -> Result<RawMember, String> {
    let uin = record
        .text("uin")
        .ok_or_else(|| "skipping member with missing uin".to_string())?;

    let require = |key: &str| {
        record
            .text(key)
            .ok_or_else(|| format!("skipping member '{uin}' with missing {key}"))
    };

    // The social columns must exist but may be blank.
    for key in ["Instagram", "LinkedIn"] {
        if !record.has(key) {
            return Err(format!("skipping member '{uin}' with missing {key}"));
        }
    }

    Ok(RawMember {
        full_name: require("Full Name")?,
        tamu_email: require("TAMU Email")?,
        phone: require("Phone Number")?,
        major: require("Major")?,
        expected_grad: require("Expected Grad")?,
        birthday_month: require("Birthday Month")?,
        birthday_day: require("Birthday Date")?,
        birthday_year: require("Birthday Year")?,
        cohort_sem: record.text("cohort_sem"),
        cohort_year: record.integer("cohort_year").map(|year| year as i32),
        linkedin: record.text("LinkedIn"),
        instagram: record.text("Instagram"),
        uin,
    })
}

fn build_fields(raw: &RawMember) -> Result<MemberFields, String> {
    let (first_name, last_name) = split_full_name(&raw.full_name).ok_or_else(|| {
        format!(
            "cannot split name '{}' for member '{}'",
            raw.full_name, raw.uin
        )
    })?;
    let (grad_sem, grad_year) = split_expected_grad(&raw.expected_grad).ok_or_else(|| {
        format!(
            "cannot parse expected graduation '{}' for member '{}'",
            raw.expected_grad, raw.uin
        )
    })?;

    let parse_birthday = |label: &str, value: &str| {
        parse_fractional_int(value)
            .ok_or_else(|| format!("invalid {label} '{value}' for member '{}'", raw.uin))
    };
    let birthday_month = parse_birthday("birthday month", &raw.birthday_month)?;
    let birthday_day = parse_birthday("birthday date", &raw.birthday_day)?;
    let birthday_year = parse_birthday("birthday year", &raw.birthday_year)?;

    // Directory numbers carry punctuation past ten digits; keep the prefix.
    let phone: String = raw.phone.chars().take(PHONE_DIGITS).collect();

    Ok(MemberFields {
        applicant_id: None,
        first_name,
        last_name,
        uin: raw.uin.clone(),
        tamu_email: raw.tamu_email.clone(),
        phone,
        major: raw.major.clone(),
        cohort_sem: raw.cohort_sem.clone(),
        cohort_year: raw.cohort_year,
        grad_sem,
        grad_year,
        is_active: true,
        probation: false,
        linkedin: raw.linkedin.clone(),
        instagram: raw.instagram.clone(),
        birthday_month,
        birthday_day,
        birthday_year,
    })
}

/// Look up the applicant row matching the member's uin. Only consulted on
/// create; a miss is logged and the member is created unlinked.
fn resolve_applicant(store: &dyn RecordStore, uin: &str) -> Result<Option<ApplicantId>, String> {
    match store.find_applicant(uin) {
        Ok(Some(id)) => Ok(Some(id)),
        Ok(None) => {
            error!("no applicant found for member '{uin}'");
            Ok(None)
        }
        Err(err) => Err(format!("error finding applicant for member '{uin}': {err}")),
    }
}

fn upsert(store: &mut dyn RecordStore, mut fields: MemberFields) -> RecordOutcome {
    let existing = match store.find_member(&fields.uin) {
        Ok(existing) => existing,
        Err(err) => {
            return RecordOutcome::Error(format!(
                "error checking for existing member '{}': {err}",
                fields.uin
            ))
        }
    };

    match existing {
        Some(id) => match store.update_member(id, &fields) {
            Ok(()) => {
                info!("updated member '{}'", fields.uin);
                RecordOutcome::Updated
            }
            Err(err) => {
                RecordOutcome::Error(format!("error updating member '{}': {err}", fields.uin))
            }
        },
        None => {
            fields.applicant_id = match resolve_applicant(store, &fields.uin) {
                Ok(applicant_id) => applicant_id,
                Err(reason) => return RecordOutcome::Error(reason),
            };
            match store.insert_member(&fields) {
                Ok(_) => {
                    info!("created new member '{}'", fields.uin);
                    RecordOutcome::Created
                }
                Err(err) => {
                    RecordOutcome::Error(format!("error creating member '{}': {err}", fields.uin))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ApplicantFields;
    use crate::importers::testutil::record;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn seed_applicant(store: &mut MemoryStore, uin: &str) {
        store
            .insert_applicant(&ApplicantFields {
                uin: uin.to_string(),
                email: "applicant@tamu.edu".to_string(),
                major: "CPSC".to_string(),
                grad_sem: "Spring".to_string(),
                grad_year: 2026,
                admission: true,
            })
            .expect("seed applicant");
        store.commit().expect("commit seed");
    }

    fn directory_row(uin: &str) -> SourceRecord {
        record(json!({
            "uin": uin,
            "Full Name": "Ada Lovelace",
            "TAMU Email": "ada@tamu.edu",
            "Phone Number": "(979) 555-0101",
            "Major": "CPSC",
            "Expected Grad": "Spring 2026",
            "cohort_sem": "Fall",
            "cohort_year": 2023,
            "LinkedIn": "https://linkedin.com/in/ada",
            "Instagram": "@ada",
            "Birthday Month": "12.0",
            "Birthday Date": "10.0",
            "Birthday Year": "2004.0",
        }))
    }

    #[test]
    fn creates_member_linked_to_matching_applicant() {
        let mut store = MemoryStore::new();
        seed_applicant(&mut store, "727000001");

        let stats = MemberImporter
            .import_records(&mut store, &[directory_row("727000001")])
            .expect("run");
        assert_eq!(stats.created, 1);

        let member = &store.committed().members[0].1;
        assert!(member.applicant_id.is_some());
        assert_eq!(member.first_name, "Ada");
        assert_eq!(member.last_name, "Lovelace");
        assert_eq!(member.grad_sem, "Spring");
        assert_eq!(member.grad_year, 2026);
        assert_eq!(member.birthday_month, 12);
        assert_eq!(member.birthday_day, 10);
        assert_eq!(member.birthday_year, 2004);
        assert!(member.is_active);
        assert!(!member.probation);
    }

    #[test]
    fn unmatched_uin_still_creates_member_without_link() {
        let mut store = MemoryStore::new();
        let stats = MemberImporter
            .import_records(&mut store, &[directory_row("727999999")])
            .expect("run");
        assert_eq!(stats.created, 1);
        assert_eq!(store.committed().members[0].1.applicant_id, None);
    }

    #[test]
    fn phone_is_truncated_to_ten_characters() {
        let mut store = MemoryStore::new();
        MemberImporter
            .import_records(&mut store, &[directory_row("727000001")])
            .expect("run");
        assert_eq!(store.committed().members[0].1.phone, "(979) 555-");
    }

    #[test]
    fn update_preserves_link_and_membership_flags() {
        let mut store = MemoryStore::new();
        seed_applicant(&mut store, "727000001");
        let importer = MemberImporter;
        importer
            .import_records(&mut store, &[directory_row("727000001")])
            .expect("first run");

        let mut changed = directory_row("727000001");
        changed.set_text("Major", "MEEN");
        let stats = importer
            .import_records(&mut store, &[changed])
            .expect("second run");
        assert_eq!(stats.updated, 1);

        let member = &store.committed().members[0].1;
        assert_eq!(member.major, "MEEN");
        assert!(member.applicant_id.is_some(), "link survives the update");
        assert!(member.is_active);
    }

    #[test]
    fn single_token_name_counts_as_error() {
        let mut store = MemoryStore::new();
        let mut row = directory_row("727000001");
        row.set_text("Full Name", "Prince");
        let stats = MemberImporter
            .import_records(&mut store, &[row])
            .expect("run");
        assert_eq!(stats.errors, 1);
        assert!(store.committed().members.is_empty());
    }

    #[test]
    fn non_numeric_birthday_counts_as_error() {
        let mut store = MemoryStore::new();
        let mut row = directory_row("727000001");
        row.set_text("Birthday Month", "December");
        let stats = MemberImporter
            .import_records(&mut store, &[row])
            .expect("run");
        assert_eq!(stats.errors, 1);
    }

    #[test]
    fn absent_social_column_is_skipped_but_blank_is_fine() {
        let mut store = MemoryStore::new();
        let importer = MemberImporter;

        let mut no_column = directory_row("727000001");
        no_column.remove("Instagram");
        let stats = importer
            .import_records(&mut store, &[no_column])
            .expect("run");
        assert_eq!(stats.skipped, 1);
        assert!(store.committed().members.is_empty());

        let mut blank = directory_row("727000002");
        blank.set_text("Instagram", "");
        let stats = importer.import_records(&mut store, &[blank]).expect("run");
        assert_eq!(stats.created, 1);
        assert_eq!(store.committed().members[0].1.instagram, None);
    }

    #[test]
    fn missing_required_column_is_skipped() {
        let mut store = MemoryStore::new();
        let incomplete = record(json!({
            "uin": "727000001",
            "Full Name": "Ada Lovelace",
        }));
        let stats = MemberImporter
            .import_records(&mut store, &[incomplete])
            .expect("run");
        assert_eq!(stats.skipped, 1);
        assert!(store.committed().members.is_empty());
    }
}
