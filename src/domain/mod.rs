use chrono::{NaiveDate, NaiveDateTime};

/// Organizational division a committee belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Division {
    Development,
    External,
    Internal,
    Operations,
}

impl Division {
    pub fn parse(value: &str) -> Option<Self> {
        match normalize(value).as_str() {
            "development" => Some(Self::Development),
            "external" => Some(Self::External),
            "internal" => Some(Self::Internal),
            "operations" => Some(Self::Operations),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Development => "Development",
            Self::External => "External",
            Self::Internal => "Internal",
            Self::Operations => "Operations",
        }
    }
}

/// Leadership tier for an officer position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionLevel {
    GeneralCouncil,
    ExecutiveCouncil,
    ExecutiveBoard,
}

impl PositionLevel {
    /// Accepts both the full tier name and the short form used in older exports.
    pub fn parse(value: &str) -> Option<Self> {
        match normalize(value).as_str() {
            "gc" | "generalcouncil" => Some(Self::GeneralCouncil),
            "ec" | "executivecouncil" => Some(Self::ExecutiveCouncil),
            "eb" | "executiveboard" => Some(Self::ExecutiveBoard),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::GeneralCouncil => "General Council",
            Self::ExecutiveCouncil => "Executive Council",
            Self::ExecutiveBoard => "Executive Board",
        }
    }
}

/// Recruitment semester.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Semester {
    Fall,
    Spring,
}

impl Semester {
    pub fn parse(value: &str) -> Option<Self> {
        match normalize(value).as_str() {
            "fall" => Some(Self::Fall),
            "spring" => Some(Self::Spring),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Fall => "Fall",
            Self::Spring => "Spring",
        }
    }
}

/// Where a question is asked during recruitment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionType {
    Application,
    Interview,
}

impl QuestionType {
    pub fn parse(value: &str) -> Option<Self> {
        match normalize(value).as_str() {
            "application" => Some(Self::Application),
            "interview" => Some(Self::Interview),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Application => "application",
            Self::Interview => "interview",
        }
    }
}

/// Who a question is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionAudience {
    Member,
    NonMember,
}

impl QuestionAudience {
    pub fn parse(value: &str) -> Option<Self> {
        match normalize(value).as_str() {
            "member" => Some(Self::Member),
            "nonmember" => Some(Self::NonMember),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::NonMember => "non_member",
        }
    }
}

fn normalize(value: &str) -> String {
    value
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Decode a short cycle code such as "F23" into its semester and year.
///
/// The first character picks the season ('F' means Fall, anything else
/// Spring) and the remaining digits are prefixed with "20" to form the year.
pub fn decode_cycle_code(code: &str) -> Option<(Semester, i32)> {
    let code = code.trim();
    let mut chars = code.chars();
    let season = chars.next()?;
    let rest = chars.as_str();
    if rest.is_empty() {
        return None;
    }
    let year: i32 = format!("20{rest}").parse().ok()?;
    let semester = if season.eq_ignore_ascii_case(&'F') {
        Semester::Fall
    } else {
        Semester::Spring
    };
    Some((semester, year))
}

/// Parse an integer that may be serialized with a decimal fraction ("5.0").
///
/// Spreadsheet exports render whole numbers as floats, so the value is parsed
/// as a float and truncated. Non-numeric input is rejected, not zeroed.
pub fn parse_fractional_int(raw: &str) -> Option<i32> {
    let value: f64 = raw.trim().parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(value as i32)
}

/// Split a free-text full name into its first two whitespace-delimited tokens.
pub fn split_full_name(raw: &str) -> Option<(String, String)> {
    let mut tokens = raw.split_whitespace();
    let first = tokens.next()?.to_string();
    let last = tokens.next()?.to_string();
    Some((first, last))
}

/// Split an expected-graduation string like "Spring 2026" into semester and year.
pub fn split_expected_grad(raw: &str) -> Option<(String, i32)> {
    let mut tokens = raw.split_whitespace();
    let semester = tokens.next()?.to_string();
    let year = tokens.next()?.parse().ok()?;
    Some((semester, year))
}

/// Surrogate key of a committee row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommitteeId(pub i64);

/// Surrogate key of a position row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PositionId(pub i64);

/// Surrogate key of a meeting row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeetingId(pub i64);

/// Surrogate key of a recruitment cycle row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CycleId(pub i64);

/// Surrogate key of a question row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QuestionId(pub i64);

/// Surrogate key of an application row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ApplicationId(pub i64);

/// Surrogate key of an application-question link row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ApplicationQuestionId(pub i64);

/// Surrogate key of an applicant row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ApplicantId(pub i64);

/// Surrogate key of a member row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemberId(pub i64);

/// Committee fields as staged by the importer. Natural key: name.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitteeFields {
    pub name: String,
    pub division: Division,
}

/// Position fields. Natural key: title.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionFields {
    pub title: String,
    pub level: PositionLevel,
}

/// Meeting fields. Natural key: title.
#[derive(Debug, Clone, PartialEq)]
pub struct MeetingFields {
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub location: String,
}

/// Recruitment cycle fields. Natural key: (semester, year).
#[derive(Debug, Clone, PartialEq)]
pub struct CycleFields {
    pub semester: Semester,
    pub year: i32,
}

/// Question fields. Natural key: (text, kind).
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionFields {
    pub text: String,
    pub kind: QuestionType,
    pub audience: QuestionAudience,
    pub word_limit: Option<i64>,
    pub max_score: Option<i64>,
    pub required: bool,
}

/// Application fields. Natural key: (title, cycle_id).
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationFields {
    pub title: String,
    pub active: bool,
    pub created_time: NaiveDateTime,
    pub closed_time: NaiveDateTime,
    pub review_completion_time: NaiveDateTime,
    pub cycle_id: CycleId,
}

/// Applicant fields. Natural key: uin.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicantFields {
    pub uin: String,
    pub email: String,
    pub major: String,
    pub grad_sem: String,
    pub grad_year: i32,
    pub admission: bool,
}

/// Member fields. Natural key: uin.
///
/// The applicant link and the membership flags are set when the row is
/// created; updates overwrite the remaining fields only.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberFields {
    pub applicant_id: Option<ApplicantId>,
    pub first_name: String,
    pub last_name: String,
    pub uin: String,
    pub tamu_email: String,
    pub phone: String,
    pub major: String,
    pub cohort_sem: Option<String>,
    pub cohort_year: Option<i32>,
    pub grad_sem: String,
    pub grad_year: i32,
    pub is_active: bool,
    pub probation: bool,
    pub linkedin: Option<String>,
    pub instagram: Option<String>,
    pub birthday_month: i32,
    pub birthday_day: i32,
    pub birthday_year: i32,
}
