use std::fmt;
use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::discovery::DiscoveryStatus;
use crate::error::TrackerError;

pub const JOB_STATUSES: &[&str] = &["open", "closed", "expired"];
pub const REMOTE_OPTIONS: &[&str] = &["remote", "hybrid", "onsite"];
pub const APPLICATION_STATUSES: &[&str] = &[
    "applied",
    "screening",
    "interview",
    "rejected",
    "offer",
    "ghosted",
    "withdrawn",
];
pub const INTERVIEW_TYPES: &[&str] = &["recruiter", "technical", "sql-challenge", "culture", "final"];
pub const INTERVIEW_OUTCOMES: &[&str] = &["pending", "passed", "failed", "cancelled"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: i64,
    pub name: String,
    pub website: Option<String>,
    pub sector: Option<String>,      // DeFi, NFT, Infrastructure, Exchange, Analytics, Other
    pub chain_focus: Option<String>, // free text, e.g. "Ethereum, Solana"
    pub size: Option<String>,        // startup, small, medium, large
    pub notes: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Default)]
pub struct NewCompany {
    pub name: String,
    pub website: Option<String>,
    pub sector: Option<String>,
    pub chain_focus: Option<String>,
    pub size: Option<String>,
    pub notes: Option<String>,
}

impl NewCompany {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: i64,
    pub company_id: i64,
    pub company_name: String, // denormalized for convenience
    pub title: String,
    pub url: Option<String>,
    pub salary_min: Option<i64>, // USD annual
    pub salary_max: Option<i64>,
    pub remote_status: Option<String>,
    pub date_posted: Option<String>,
    pub date_found: Option<String>,
    pub closing_date: Option<String>,
    pub status: String, // "open", "closed", "expired"
    pub source: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewJob {
    pub company_id: i64,
    pub title: String,
    pub url: Option<String>,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub remote_status: Option<String>,
    pub date_posted: Option<String>,
    pub closing_date: Option<String>,
    pub status: String,
    pub source: Option<String>,
    pub notes: Option<String>,
}

impl NewJob {
    pub fn new(company_id: i64, title: impl Into<String>) -> Self {
        Self {
            company_id,
            title: title.into(),
            url: None,
            salary_min: None,
            salary_max: None,
            remote_status: None,
            date_posted: None,
            closing_date: None,
            status: "open".to_string(),
            source: None,
            notes: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skill {
    pub id: i64,
    pub name: String,
    pub category: Option<String>, // SQL, Programming, Cloud, BI, Blockchain
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Importance {
    Required,
    NiceToHave,
}

impl Importance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Importance::Required => "required",
            Importance::NiceToHave => "nice-to-have",
        }
    }
}

impl fmt::Display for Importance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Importance {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "required" => Ok(Importance::Required),
            "nice-to-have" | "nice" => Ok(Importance::NiceToHave),
            other => Err(TrackerError::invalid(format!(
                "unknown importance '{other}' (expected required or nice-to-have)"
            ))),
        }
    }
}

impl ToSql for Importance {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Importance {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: TrackerError| FromSqlError::Other(Box::new(e)))
    }
}

/// A skill attached to a job, as read back through `job_skills`.
#[derive(Debug, Clone)]
pub struct TaggedSkill {
    pub skill: Skill,
    pub importance: Importance,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub id: i64,
    pub job_id: i64,
    pub date_applied: Option<String>,
    pub resume_version: Option<String>,
    pub cover_letter_sent: bool,
    pub status: String, // see APPLICATION_STATUSES; transitions are not enforced
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewApplication {
    pub job_id: i64,
    pub date_applied: Option<String>,
    pub resume_version: Option<String>,
    pub cover_letter_sent: bool,
    pub status: String,
    pub notes: Option<String>,
}

impl NewApplication {
    pub fn for_job(job_id: i64) -> Self {
        Self {
            job_id,
            date_applied: None,
            resume_version: None,
            cover_letter_sent: false,
            status: "applied".to_string(),
            notes: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interview {
    pub id: i64,
    pub application_id: i64,
    pub scheduled_at: Option<String>,
    pub interview_type: Option<String>,
    pub notes: Option<String>,
    pub outcome: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewInterview {
    pub application_id: i64,
    pub scheduled_at: Option<String>,
    pub interview_type: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveredJob {
    pub id: i64,
    pub title: Option<String>,
    pub company_name: Option<String>,
    pub url: String,
    pub requirements_raw: Option<String>,
    pub source: Option<String>,
    pub raw_response: Option<String>,
    pub discovered_at: String,
    pub status: DiscoveryStatus,
    pub promoted_to_job_id: Option<i64>,
}
