//! Read-only aggregate queries. Empty results are returned as empty collections.

use rusqlite::params;
use serde::Serialize;

use crate::db::{Database, validate_remote};
use crate::discovery::DiscoveryStatus;
use crate::error::{Result, TrackerError};
use crate::models::APPLICATION_STATUSES;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub rows: Vec<StatusCount>,
    pub total: i64,
}

impl PipelineReport {
    pub fn count_of(&self, status: &str) -> i64 {
        self.rows
            .iter()
            .find(|row| row.status == status)
            .map_or(0, |row| row.count)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillDemand {
    pub name: String,
    pub category: Option<String>,
    pub total: i64,
    pub required: i64,
    pub nice_to_have: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnappliedJob {
    pub job_id: i64,
    pub title: String,
    pub company_name: String,
    pub remote_status: Option<String>,
    pub url: Option<String>,
    pub date_found: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SqlMatch {
    pub job_id: i64,
    pub title: String,
    pub company_name: String,
    pub status: String,
    /// Required SQL-category skills, comma separated.
    pub sql_skills: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Summary {
    pub companies: i64,
    pub jobs: i64,
    pub open_jobs: i64,
    pub applications: i64,
    pub active_applications: i64,
    pub offers: i64,
    pub rejections: i64,
    pub pending_interviews: i64,
}

impl Summary {
    /// Offers as a percentage of applications; `None` before the first application.
    pub fn offer_rate(&self) -> Option<f64> {
        (self.applications > 0).then(|| self.offers as f64 * 100.0 / self.applications as f64)
    }
}

/// Application counts per status, in workflow order; unknown statuses sort last by name.
pub fn pipeline(db: &Database) -> Result<PipelineReport> {
    let order = APPLICATION_STATUSES
        .iter()
        .enumerate()
        .map(|(i, status)| format!("WHEN '{status}' THEN {i}"))
        .collect::<Vec<_>>()
        .join(" ");
    let sql = format!(
        "SELECT status, COUNT(*) FROM applications
         GROUP BY status
         ORDER BY CASE status {order} ELSE {} END, status",
        APPLICATION_STATUSES.len()
    );
    let mut stmt = db.conn().prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(StatusCount {
                status: row.get(0)?,
                count: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    let total = rows.iter().map(|row| row.count).sum();
    Ok(PipelineReport { rows, total })
}

/// Skills ranked by how many jobs they are tagged on.
pub fn skill_demand(db: &Database, limit: Option<usize>) -> Result<Vec<SkillDemand>> {
    if limit == Some(0) {
        return Err(TrackerError::invalid("limit must be at least 1"));
    }
    // SQLite treats a negative LIMIT as unbounded.
    let limit = limit.map_or(-1, |n| i64::try_from(n).unwrap_or(i64::MAX));
    let mut stmt = db.conn().prepare(
        "SELECT s.name, s.category,
                COUNT(*) AS total,
                SUM(CASE WHEN js.importance = 'required' THEN 1 ELSE 0 END),
                SUM(CASE WHEN js.importance = 'nice-to-have' THEN 1 ELSE 0 END)
         FROM job_skills js
         JOIN skills s ON s.id = js.skill_id
         GROUP BY s.id
         ORDER BY total DESC, s.name
         LIMIT ?1",
    )?;
    let rows = stmt.query_map([limit], |row| {
        Ok(SkillDemand {
            name: row.get(0)?,
            category: row.get(1)?,
            total: row.get(2)?,
            required: row.get(3)?,
            nice_to_have: row.get(4)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Open jobs with no application yet, newest first.
pub fn unapplied(db: &Database, remote: Option<&str>) -> Result<Vec<UnappliedJob>> {
    if let Some(remote) = remote {
        validate_remote(remote)?;
    }
    let mut stmt = db.conn().prepare(
        "SELECT j.id, j.title, c.name, j.remote_status, j.url, j.date_found
         FROM jobs j
         JOIN companies c ON c.id = j.company_id
         LEFT JOIN applications a ON a.job_id = j.id
         WHERE j.status = 'open'
           AND a.id IS NULL
           AND (?1 IS NULL OR j.remote_status = ?1)
         ORDER BY j.date_found DESC, j.id DESC",
    )?;
    let rows = stmt.query_map(params![remote], |row| {
        Ok(UnappliedJob {
            job_id: row.get(0)?,
            title: row.get(1)?,
            company_name: row.get(2)?,
            remote_status: row.get(3)?,
            url: row.get(4)?,
            date_found: row.get(5)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Jobs with at least one required skill in the `SQL` category.
pub fn sql_matches(db: &Database) -> Result<Vec<SqlMatch>> {
    let mut stmt = db.conn().prepare(
        "SELECT j.id, j.title, c.name, j.status, GROUP_CONCAT(s.name, ', ')
         FROM jobs j
         JOIN companies c ON c.id = j.company_id
         JOIN job_skills js ON js.job_id = j.id
         JOIN skills s ON s.id = js.skill_id
         WHERE s.category = 'SQL' AND js.importance = 'required'
         GROUP BY j.id
         ORDER BY j.id",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(SqlMatch {
            job_id: row.get(0)?,
            title: row.get(1)?,
            company_name: row.get(2)?,
            status: row.get(3)?,
            sql_skills: row.get(4)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn summary(db: &Database) -> Result<Summary> {
    let conn = db.conn();
    let count = |sql: &str| -> Result<i64> { Ok(conn.query_row(sql, [], |row| row.get(0))?) };
    Ok(Summary {
        companies: count("SELECT COUNT(*) FROM companies")?,
        jobs: count("SELECT COUNT(*) FROM jobs")?,
        open_jobs: count("SELECT COUNT(*) FROM jobs WHERE status = 'open'")?,
        applications: count("SELECT COUNT(*) FROM applications")?,
        active_applications: count(
            "SELECT COUNT(*) FROM applications WHERE status IN ('applied', 'screening', 'interview')",
        )?,
        offers: count("SELECT COUNT(*) FROM applications WHERE status = 'offer'")?,
        rejections: count("SELECT COUNT(*) FROM applications WHERE status = 'rejected'")?,
        pending_interviews: count("SELECT COUNT(*) FROM interviews WHERE outcome = 'pending'")?,
    })
}

/// Staged row counts for every discovery status, including zeroes.
pub fn discovery_status(db: &Database) -> Result<Vec<(DiscoveryStatus, i64)>> {
    let mut stmt = db
        .conn()
        .prepare("SELECT COUNT(*) FROM discovered_jobs WHERE status = ?1")?;
    DiscoveryStatus::ALL
        .iter()
        .map(|status| -> Result<(DiscoveryStatus, i64)> {
            let n: i64 = stmt.query_row([status], |row| row.get(0))?;
            Ok((*status, n))
        })
        .collect()
}
