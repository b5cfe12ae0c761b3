//! Pipeline driver: runs every importer in dependency order against the
//! files in a data directory.
//!
//! The order is fixed so referenced entities load before the records that
//! resolve them (cycles before applications, questions and applications
//! before the links, applicants before members). A failed importer never
//! stops its siblings; the aggregate report decides the process exit code.

use std::path::PathBuf;

use tracing::{error, info};

use crate::importers::{
    ApplicantImporter, ApplicationImporter, ApplicationQuestionImporter, CommitteeImporter,
    ImportStats, Importer, MeetingImporter, MemberImporter, PositionImporter, QuestionImporter,
    RecruitmentCycleImporter,
};
use crate::store::RecordStore;

/// Importers in run order, each paired with its source files.
///
/// Most entities have a single export; applicants arrive as one form export
/// per recruitment cycle. The question source appears twice: once to load the
/// questions themselves and again to derive the application-question links
/// from the cycle codes.
fn registry() -> Vec<(Box<dyn Importer>, &'static [&'static str])> {
    vec![
        (Box::new(CommitteeImporter), &["committee.json"]),
        (Box::new(PositionImporter), &["position.json"]),
        (Box::new(MeetingImporter), &["meeting.csv"]),
        (
            Box::new(RecruitmentCycleImporter),
            &["recruitment_cycle.json"],
        ),
        (Box::new(QuestionImporter), &["question.json"]),
        (Box::new(ApplicationImporter), &["application.json"]),
        (
            Box::new(ApplicantImporter),
            &["Fall_2023_NM_App.json", "Spring_2024_NM_App.json"],
        ),
        (Box::new(ApplicationQuestionImporter), &["question.json"]),
        (Box::new(MemberImporter), &["member_directory.csv"]),
    ]
}

/// Names accepted by `--importer`, in run order.
pub fn importer_names() -> Vec<&'static str> {
    registry().iter().map(|(importer, _)| importer.name()).collect()
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub data_dir: PathBuf,
    /// Restrict the run to the named importer.
    pub only: Option<String>,
}

/// One importer's aggregate outcome over all of its source files.
#[derive(Debug)]
pub struct ImporterRun {
    pub name: &'static str,
    /// Counters merged across every file that ran.
    pub stats: ImportStats,
    /// One entry per file that went missing, failed, or imported nothing.
    pub failures: Vec<String>,
}

impl ImporterRun {
    pub fn succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct PipelineReport {
    pub runs: Vec<ImporterRun>,
}

impl PipelineReport {
    pub fn all_succeeded(&self) -> bool {
        self.runs.iter().all(ImporterRun::succeeded)
    }

    pub fn totals(&self) -> ImportStats {
        let mut totals = ImportStats::default();
        for run in &self.runs {
            totals.merge(&run.stats);
        }
        totals
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("unknown importer '{name}'; valid importers: {known}")]
    UnknownImporter { name: String, known: String },
}

/// Run the pipeline (or one selected importer) over `options.data_dir`.
pub fn run(
    store: &mut dyn RecordStore,
    options: &PipelineOptions,
) -> Result<PipelineReport, PipelineError> {
    let selected: Vec<(Box<dyn Importer>, &'static [&'static str])> = match &options.only {
        Some(name) => {
            let matched: Vec<_> = registry()
                .into_iter()
                .filter(|(importer, _)| importer.name() == name)
                .collect();
            if matched.is_empty() {
                return Err(PipelineError::UnknownImporter {
                    name: name.clone(),
                    known: importer_names().join(", "),
                });
            }
            matched
        }
        None => registry(),
    };

    let mut report = PipelineReport::default();
    for (importer, file_names) in selected {
        let name = importer.name();
        let mut stats = ImportStats::default();
        let mut failures = Vec::new();

        // Every file runs; any missing or failed file marks the importer
        // failed without stopping the remaining files.
        for file_name in file_names {
            let path = options.data_dir.join(file_name);
            if !path.is_file() {
                error!("{name} importer: source file {} not found", path.display());
                failures.push(format!("source file {} not found", path.display()));
                continue;
            }
            info!("running {name} importer over {}", path.display());
            match importer.import(store, &path) {
                Ok(file_stats) => {
                    if file_stats.imported() == 0 {
                        error!(
                            "{name} importer imported no records from {}",
                            path.display()
                        );
                        failures.push(format!("no records imported from {}", path.display()));
                    }
                    stats.merge(&file_stats);
                }
                Err(err) => {
                    error!("{name} importer failed on {}: {err}", path.display());
                    failures.push(format!("{}: {err}", path.display()));
                }
            }
        }

        if failures.is_empty() {
            info!("{name} importer succeeded");
        }
        report.runs.push(ImporterRun {
            name,
            stats,
            failures,
        });
    }

    let totals = report.totals();
    info!(
        "pipeline finished: {} imported, {} skipped, {} errors across {} importer runs",
        totals.imported(),
        totals.skipped,
        totals.errors,
        report.runs.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::fs;

    #[test]
    fn unknown_importer_name_is_rejected_with_the_valid_names() {
        let mut store = MemoryStore::new();
        let options = PipelineOptions {
            data_dir: PathBuf::from("data"),
            only: Some("payroll".to_string()),
        };
        let err = run(&mut store, &options).expect_err("unknown name");
        let message = err.to_string();
        assert!(message.contains("payroll"));
        assert!(message.contains("committee"));
        assert!(message.contains("member"));
    }

    #[test]
    fn missing_source_file_fails_only_that_importer() {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::write(
            dir.path().join("committee.json"),
            r#"[{"name": "Finance", "division": "Internal"}]"#,
        )
        .expect("write");

        let mut store = MemoryStore::new();
        let options = PipelineOptions {
            data_dir: dir.path().to_path_buf(),
            only: None,
        };
        let report = run(&mut store, &options).expect("pipeline runs");

        assert_eq!(report.runs.len(), 9);
        assert!(report.runs[0].succeeded(), "committee import succeeds");
        assert!(!report.runs[1].succeeded(), "position source is absent");
        assert!(!report.all_succeeded());
        assert_eq!(store.committed().committees.len(), 1);
    }

    #[test]
    fn applicant_files_are_merged_into_one_run() {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::write(
            dir.path().join("Fall_2023_NM_App.json"),
            r#"[{"UIN": "727000001", "Email": "a@tamu.edu", "Major": "CPSC",
                 "Grad Semester": "Spring", "Grad Year": 2026, "Admission": true}]"#,
        )
        .expect("write fall export");
        fs::write(
            dir.path().join("Spring_2024_NM_App.json"),
            r#"[{"UIN": "727000002", "Email": "b@tamu.edu", "Major": "MATH",
                 "Grad Semester": "Fall", "Grad Year": 2027, "Admission": false}]"#,
        )
        .expect("write spring export");

        let mut store = MemoryStore::new();
        let options = PipelineOptions {
            data_dir: dir.path().to_path_buf(),
            only: Some("applicant".to_string()),
        };
        let report = run(&mut store, &options).expect("pipeline runs");

        assert_eq!(report.runs.len(), 1);
        let run = &report.runs[0];
        assert!(run.succeeded());
        assert_eq!(run.stats.processed, 2);
        assert_eq!(run.stats.created, 2);
        assert_eq!(store.committed().applicants.len(), 2);
    }

    #[test]
    fn one_missing_applicant_file_fails_the_importer_but_the_other_loads() {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::write(
            dir.path().join("Fall_2023_NM_App.json"),
            r#"[{"UIN": "727000001", "Email": "a@tamu.edu", "Major": "CPSC",
                 "Grad Semester": "Spring", "Grad Year": 2026, "Admission": true}]"#,
        )
        .expect("write fall export");

        let mut store = MemoryStore::new();
        let options = PipelineOptions {
            data_dir: dir.path().to_path_buf(),
            only: Some("applicant".to_string()),
        };
        let report = run(&mut store, &options).expect("pipeline runs");

        let run = &report.runs[0];
        assert!(!run.succeeded());
        assert_eq!(run.failures.len(), 1);
        assert_eq!(run.stats.created, 1, "the present file still imported");
        assert_eq!(store.committed().applicants.len(), 1);
    }

    #[test]
    fn single_importer_selection_runs_one_importer() {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::write(
            dir.path().join("committee.json"),
            r#"[{"name": "Finance", "division": "Internal"}]"#,
        )
        .expect("write");

        let mut store = MemoryStore::new();
        let options = PipelineOptions {
            data_dir: dir.path().to_path_buf(),
            only: Some("committee".to_string()),
        };
        let report = run(&mut store, &options).expect("pipeline runs");
        assert_eq!(report.runs.len(), 1);
        assert!(report.all_succeeded());
    }

    #[test]
    fn importer_names_follow_run_order() {
        let names = importer_names();
        assert_eq!(names.first(), Some(&"committee"));
        assert_eq!(names.last(), Some(&"member"));
        assert_eq!(names.len(), 9);
    }
}
