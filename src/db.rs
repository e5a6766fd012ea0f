use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use crate::discovery::DiscoveryStatus;
use crate::error::{Result, TrackerError};
use crate::models::{
    APPLICATION_STATUSES, Application, Company, DiscoveredJob, Importance, Interview, JOB_STATUSES,
    Job, NewApplication, NewCompany, NewInterview, NewJob, REMOTE_OPTIONS, Skill, TaggedSkill,
};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS companies (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    website TEXT,
    sector TEXT,
    chain_focus TEXT,
    size TEXT,
    notes TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS jobs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    company_id INTEGER NOT NULL REFERENCES companies(id),
    title TEXT NOT NULL,
    url TEXT UNIQUE,
    salary_min INTEGER,
    salary_max INTEGER,
    remote_status TEXT,
    date_posted TEXT,
    date_found TEXT DEFAULT (date('now')),
    closing_date TEXT,
    status TEXT NOT NULL DEFAULT 'open',
    source TEXT,
    notes TEXT
);

CREATE TABLE IF NOT EXISTS skills (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    category TEXT
);

CREATE TABLE IF NOT EXISTS job_skills (
    job_id INTEGER NOT NULL REFERENCES jobs(id) ON DELETE CASCADE,
    skill_id INTEGER NOT NULL REFERENCES skills(id),
    importance TEXT NOT NULL DEFAULT 'required' CHECK (importance IN ('required', 'nice-to-have')),
    PRIMARY KEY (job_id, skill_id)
);

CREATE TABLE IF NOT EXISTS applications (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    job_id INTEGER NOT NULL REFERENCES jobs(id),
    date_applied TEXT DEFAULT (date('now')),
    resume_version TEXT,
    cover_letter_sent INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL DEFAULT 'applied',
    notes TEXT
);

CREATE TABLE IF NOT EXISTS interviews (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    application_id INTEGER NOT NULL REFERENCES applications(id),
    scheduled_at TEXT,
    type TEXT,
    notes TEXT,
    outcome TEXT DEFAULT 'pending'
);

CREATE TABLE IF NOT EXISTS discovered_jobs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT,
    company_name TEXT,
    url TEXT NOT NULL UNIQUE,
    requirements_raw TEXT,
    source TEXT,
    raw_response TEXT,
    discovered_at TEXT NOT NULL DEFAULT (datetime('now')),
    status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'saved', 'dismissed', 'promoted')),
    promoted_to_job_id INTEGER REFERENCES jobs(id)
);

CREATE INDEX IF NOT EXISTS idx_jobs_company ON jobs(company_id);
CREATE INDEX IF NOT EXISTS idx_jobs_status ON jobs(status);
CREATE INDEX IF NOT EXISTS idx_applications_job ON applications(job_id);
CREATE INDEX IF NOT EXISTS idx_interviews_application ON interviews(application_id);
CREATE INDEX IF NOT EXISTS idx_discovered_status ON discovered_jobs(status);
"#;

const SEED_SKILLS: &[(&str, &str)] = &[
    ("SQL", "SQL"),
    ("PostgreSQL", "SQL"),
    ("MySQL", "SQL"),
    ("BigQuery", "SQL"),
    ("Snowflake", "SQL"),
    ("dbt", "SQL"),
    ("Dune Analytics", "SQL"),
    ("Flipside", "SQL"),
    ("Python", "Programming"),
    ("Rust", "Programming"),
    ("Solidity", "Programming"),
    ("TypeScript", "Programming"),
    ("Go", "Programming"),
    ("AWS", "Cloud"),
    ("GCP", "Cloud"),
    ("Tableau", "BI"),
    ("Looker", "BI"),
    ("Metabase", "BI"),
    ("Ethereum", "Blockchain"),
    ("Solana", "Blockchain"),
    ("The Graph", "Blockchain"),
];

const JOB_COLUMNS: &str = "j.id, j.company_id, c.name, j.title, j.url, j.salary_min, j.salary_max,
     j.remote_status, j.date_posted, j.date_found, j.closing_date, j.status, j.source, j.notes";

const DISCOVERED_COLUMNS: &str = "id, title, company_name, url, requirements_raw, source,
     raw_response, discovered_at, status, promoted_to_job_id";

pub struct Database {
    conn: Connection,
    path: PathBuf,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::configure(&conn)?;
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::configure(&conn)?;
        Ok(Self {
            conn,
            path: PathBuf::from(":memory:"),
        })
    }

    fn configure(conn: &Connection) -> Result<()> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Apply the schema and seed the skill catalog. Safe to run repeatedly.
    pub fn init(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;
        let mut stmt = self
            .conn
            .prepare("INSERT OR IGNORE INTO skills (name, category) VALUES (?1, ?2)")?;
        for (name, category) in SEED_SKILLS {
            stmt.execute(params![name, category])?;
        }
        debug!(path = %self.path.display(), "schema applied");
        Ok(())
    }

    pub fn is_initialized(&self) -> Result<bool> {
        let tables: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='discovered_jobs'",
            [],
            |row| row.get(0),
        )?;
        Ok(tables > 0)
    }

    /// Filters accept the known statuses plus any custom value already stored in `table`.
    fn check_status_filter(&self, table: &str, status: &str, known: &[&str]) -> Result<()> {
        if known.contains(&status) {
            return Ok(());
        }
        let stored: bool = self.conn.query_row(
            &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE status = ?1)"),
            [status],
            |row| row.get(0),
        )?;
        if stored {
            Ok(())
        } else {
            Err(TrackerError::invalid(format!(
                "unknown status filter '{status}' (expected one of {})",
                known.join(", ")
            )))
        }
    }

    // --- Company operations ---

    pub fn create_company(&self, company: &NewCompany) -> Result<i64> {
        insert_company(&self.conn, company)
    }

    pub fn get_company(&self, id: i64) -> Result<Company> {
        self.conn
            .query_row(
                "SELECT id, name, website, sector, chain_focus, size, notes, created_at
                 FROM companies WHERE id = ?1",
                [id],
                Self::row_to_company,
            )
            .optional()?
            .ok_or(TrackerError::not_found("company", id))
    }

    /// Exact, case-sensitive name lookup.
    pub fn get_company_by_name(&self, name: &str) -> Result<Option<Company>> {
        let company = self
            .conn
            .query_row(
                "SELECT id, name, website, sector, chain_focus, size, notes, created_at
                 FROM companies WHERE name = ?1",
                [name],
                Self::row_to_company,
            )
            .optional()?;
        Ok(company)
    }

    pub fn list_companies(&self) -> Result<Vec<Company>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, website, sector, chain_focus, size, notes, created_at
             FROM companies ORDER BY name",
        )?;
        let rows = stmt.query_map([], Self::row_to_company)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn update_company(&self, company: &Company) -> Result<()> {
        require_non_empty("company name", &company.name)?;
        let changed = self.conn.execute(
            "UPDATE companies
             SET name = ?1, website = ?2, sector = ?3, chain_focus = ?4, size = ?5, notes = ?6
             WHERE id = ?7",
            params![
                company.name,
                company.website,
                company.sector,
                company.chain_focus,
                company.size,
                company.notes,
                company.id
            ],
        )?;
        if changed == 0 {
            return Err(TrackerError::not_found("company", company.id));
        }
        Ok(())
    }

    fn row_to_company(row: &rusqlite::Row) -> rusqlite::Result<Company> {
        Ok(Company {
            id: row.get(0)?,
            name: row.get(1)?,
            website: row.get(2)?,
            sector: row.get(3)?,
            chain_focus: row.get(4)?,
            size: row.get(5)?,
            notes: row.get(6)?,
            created_at: row.get(7)?,
        })
    }

    // --- Job operations ---

    pub fn create_job(&self, job: &NewJob) -> Result<i64> {
        // Surface a missing company as NotFound rather than a bare FK failure.
        self.get_company(job.company_id)?;
        insert_job(&self.conn, job)
    }

    pub fn get_job(&self, id: i64) -> Result<Job> {
        let sql = format!(
            "SELECT {JOB_COLUMNS} FROM jobs j JOIN companies c ON j.company_id = c.id WHERE j.id = ?1"
        );
        self.conn
            .query_row(&sql, [id], Self::row_to_job)
            .optional()?
            .ok_or(TrackerError::not_found("job", id))
    }

    /// List jobs, newest first. `sql_only` keeps jobs tagged with any SQL-category skill.
    pub fn list_jobs(&self, status: Option<&str>, sql_only: bool) -> Result<Vec<Job>> {
        if let Some(status) = status {
            self.check_status_filter("jobs", status, JOB_STATUSES)?;
        }
        let mut sql = format!(
            "SELECT {JOB_COLUMNS} FROM jobs j JOIN companies c ON j.company_id = c.id WHERE 1=1"
        );
        if status.is_some() {
            sql.push_str(" AND j.status = ?1");
        }
        if sql_only {
            sql.push_str(
                " AND EXISTS (SELECT 1 FROM job_skills js JOIN skills s ON js.skill_id = s.id
                              WHERE js.job_id = j.id AND s.category = 'SQL')",
            );
        }
        sql.push_str(" ORDER BY j.date_found DESC, j.id DESC");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = match status {
            Some(s) => stmt.query_map([s], Self::row_to_job)?,
            None => stmt.query_map([], Self::row_to_job)?,
        };
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn list_jobs_for_company(&self, company_id: i64) -> Result<Vec<Job>> {
        let sql = format!(
            "SELECT {JOB_COLUMNS} FROM jobs j JOIN companies c ON j.company_id = c.id
             WHERE j.company_id = ?1 ORDER BY j.id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([company_id], Self::row_to_job)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn set_job_status(&self, id: i64, status: &str) -> Result<()> {
        require_non_empty("job status", status)?;
        let changed = self
            .conn
            .execute("UPDATE jobs SET status = ?1 WHERE id = ?2", params![status, id])?;
        if changed == 0 {
            return Err(TrackerError::not_found("job", id));
        }
        Ok(())
    }

    fn row_to_job(row: &rusqlite::Row) -> rusqlite::Result<Job> {
        Ok(Job {
            id: row.get(0)?,
            company_id: row.get(1)?,
            company_name: row.get(2)?,
            title: row.get(3)?,
            url: row.get(4)?,
            salary_min: row.get(5)?,
            salary_max: row.get(6)?,
            remote_status: row.get(7)?,
            date_posted: row.get(8)?,
            date_found: row.get(9)?,
            closing_date: row.get(10)?,
            status: row.get(11)?,
            source: row.get(12)?,
            notes: row.get(13)?,
        })
    }

    // --- Skill operations ---

    pub fn list_skills(&self, category: Option<&str>) -> Result<Vec<Skill>> {
        let mut sql = String::from("SELECT id, name, category FROM skills");
        if category.is_some() {
            sql.push_str(" WHERE category = ?1");
        }
        sql.push_str(" ORDER BY name");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = match category {
            Some(c) => stmt.query_map([c], Self::row_to_skill)?,
            None => stmt.query_map([], Self::row_to_skill)?,
        };
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Case-insensitive lookup; skill names are typed by hand on the command line.
    pub fn get_skill_by_name(&self, name: &str) -> Result<Option<Skill>> {
        let skill = self
            .conn
            .query_row(
                "SELECT id, name, category FROM skills WHERE LOWER(name) = LOWER(?1)",
                [name],
                Self::row_to_skill,
            )
            .optional()?;
        Ok(skill)
    }

    pub fn create_skill(&self, name: &str, category: Option<&str>) -> Result<i64> {
        require_non_empty("skill name", name)?;
        self.conn.execute(
            "INSERT INTO skills (name, category) VALUES (?1, ?2)",
            params![name.trim(), category],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn row_to_skill(row: &rusqlite::Row) -> rusqlite::Result<Skill> {
        Ok(Skill {
            id: row.get(0)?,
            name: row.get(1)?,
            category: row.get(2)?,
        })
    }

    // --- Job skill tagging ---

    /// Tag a job with a skill. Re-tagging replaces the importance.
    pub fn tag_job(&self, job_id: i64, skill_id: i64, importance: Importance) -> Result<()> {
        self.get_job(job_id)?;
        let skill_exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM skills WHERE id = ?1)",
            [skill_id],
            |row| row.get(0),
        )?;
        if !skill_exists {
            return Err(TrackerError::not_found("skill", skill_id));
        }
        self.conn.execute(
            "INSERT INTO job_skills (job_id, skill_id, importance) VALUES (?1, ?2, ?3)
             ON CONFLICT (job_id, skill_id) DO UPDATE SET importance = excluded.importance",
            params![job_id, skill_id, importance],
        )?;
        Ok(())
    }

    pub fn untag_job(&self, job_id: i64, skill_id: i64) -> Result<()> {
        let removed = self.conn.execute(
            "DELETE FROM job_skills WHERE job_id = ?1 AND skill_id = ?2",
            params![job_id, skill_id],
        )?;
        if removed == 0 {
            return Err(TrackerError::not_found("job skill tag", skill_id));
        }
        Ok(())
    }

    pub fn job_skills(&self, job_id: i64) -> Result<Vec<TaggedSkill>> {
        let mut stmt = self.conn.prepare(
            "SELECT s.id, s.name, s.category, js.importance
             FROM skills s
             JOIN job_skills js ON s.id = js.skill_id
             WHERE js.job_id = ?1
             ORDER BY js.importance, s.name",
        )?;
        let rows = stmt.query_map([job_id], |row| {
            Ok(TaggedSkill {
                skill: Self::row_to_skill(row)?,
                importance: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    // --- Application operations ---

    pub fn create_application(&self, app: &NewApplication) -> Result<i64> {
        require_non_empty("application status", &app.status)?;
        if let Some(date) = &app.date_applied {
            parse_date(date)?;
        }
        self.get_job(app.job_id)?;
        let date_applied = app
            .date_applied
            .clone()
            .unwrap_or_else(|| chrono::Local::now().format("%Y-%m-%d").to_string());
        self.conn.execute(
            "INSERT INTO applications (job_id, date_applied, resume_version, cover_letter_sent, status, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                app.job_id,
                date_applied,
                app.resume_version,
                app.cover_letter_sent,
                app.status,
                app.notes
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_application(&self, id: i64) -> Result<Application> {
        self.conn
            .query_row(
                "SELECT id, job_id, date_applied, resume_version, cover_letter_sent, status, notes
                 FROM applications WHERE id = ?1",
                [id],
                Self::row_to_application,
            )
            .optional()?
            .ok_or(TrackerError::not_found("application", id))
    }

    pub fn list_applications(&self, status: Option<&str>) -> Result<Vec<Application>> {
        if let Some(status) = status {
            self.check_status_filter("applications", status, APPLICATION_STATUSES)?;
        }
        let mut sql = String::from(
            "SELECT id, job_id, date_applied, resume_version, cover_letter_sent, status, notes
             FROM applications",
        );
        if status.is_some() {
            sql.push_str(" WHERE status = ?1");
        }
        sql.push_str(" ORDER BY date_applied DESC, id DESC");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = match status {
            Some(s) => stmt.query_map([s], Self::row_to_application)?,
            None => stmt.query_map([], Self::row_to_application)?,
        };
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Set an application's status. A note is appended as `[status] note`.
    pub fn update_application_status(
        &self,
        id: i64,
        status: &str,
        note: Option<&str>,
    ) -> Result<()> {
        require_non_empty("application status", status)?;
        let app = self.get_application(id)?;
        let notes = append_note(app.notes.as_deref(), status, note);
        self.conn.execute(
            "UPDATE applications SET status = ?1, notes = ?2 WHERE id = ?3",
            params![status, notes, id],
        )?;
        Ok(())
    }

    fn row_to_application(row: &rusqlite::Row) -> rusqlite::Result<Application> {
        Ok(Application {
            id: row.get(0)?,
            job_id: row.get(1)?,
            date_applied: row.get(2)?,
            resume_version: row.get(3)?,
            cover_letter_sent: row.get(4)?,
            status: row.get(5)?,
            notes: row.get(6)?,
        })
    }

    // --- Interview operations ---

    pub fn create_interview(&self, interview: &NewInterview) -> Result<i64> {
        let scheduled_at = interview
            .scheduled_at
            .as_deref()
            .map(parse_datetime)
            .transpose()?;
        self.get_application(interview.application_id)?;
        self.conn.execute(
            "INSERT INTO interviews (application_id, scheduled_at, type, notes, outcome)
             VALUES (?1, ?2, ?3, ?4, 'pending')",
            params![
                interview.application_id,
                scheduled_at,
                interview.interview_type,
                interview.notes
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_interview(&self, id: i64) -> Result<Interview> {
        self.conn
            .query_row(
                "SELECT id, application_id, scheduled_at, type, notes, outcome
                 FROM interviews WHERE id = ?1",
                [id],
                Self::row_to_interview,
            )
            .optional()?
            .ok_or(TrackerError::not_found("interview", id))
    }

    pub fn list_interviews(&self, application_id: Option<i64>) -> Result<Vec<Interview>> {
        let mut stmt;
        let rows = match application_id {
            Some(app_id) => {
                stmt = self.conn.prepare(
                    "SELECT id, application_id, scheduled_at, type, notes, outcome
                     FROM interviews WHERE application_id = ?1 ORDER BY scheduled_at",
                )?;
                stmt.query_map([app_id], Self::row_to_interview)?
            }
            None => {
                stmt = self.conn.prepare(
                    "SELECT id, application_id, scheduled_at, type, notes, outcome
                     FROM interviews ORDER BY scheduled_at DESC",
                )?;
                stmt.query_map([], Self::row_to_interview)?
            }
        };
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn record_interview_outcome(
        &self,
        id: i64,
        outcome: &str,
        note: Option<&str>,
    ) -> Result<()> {
        require_non_empty("interview outcome", outcome)?;
        let interview = self.get_interview(id)?;
        let notes = append_note(interview.notes.as_deref(), outcome, note);
        self.conn.execute(
            "UPDATE interviews SET outcome = ?1, notes = ?2 WHERE id = ?3",
            params![outcome, notes, id],
        )?;
        Ok(())
    }

    fn row_to_interview(row: &rusqlite::Row) -> rusqlite::Result<Interview> {
        Ok(Interview {
            id: row.get(0)?,
            application_id: row.get(1)?,
            scheduled_at: row.get(2)?,
            interview_type: row.get(3)?,
            notes: row.get(4)?,
            outcome: row.get(5)?,
        })
    }

    // --- Discovered job operations ---

    pub fn get_discovered_job(&self, id: i64) -> Result<DiscoveredJob> {
        get_discovered_job(&self.conn, id)
    }

    pub fn list_discovered_jobs(&self, status: Option<DiscoveryStatus>) -> Result<Vec<DiscoveredJob>> {
        let mut sql = format!("SELECT {DISCOVERED_COLUMNS} FROM discovered_jobs");
        if status.is_some() {
            sql.push_str(" WHERE status = ?1");
        }
        sql.push_str(" ORDER BY discovered_at DESC, id DESC");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = match status {
            Some(s) => stmt.query_map([s], row_to_discovered_job)?,
            None => stmt.query_map([], row_to_discovered_job)?,
        };
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

// Connection-level helpers shared by `Database` and the promote transaction.

pub(crate) fn insert_company(conn: &Connection, company: &NewCompany) -> Result<i64> {
    require_non_empty("company name", &company.name)?;
    conn.execute(
        "INSERT INTO companies (name, website, sector, chain_focus, size, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            company.name.trim(),
            company.website,
            company.sector,
            company.chain_focus,
            company.size,
            company.notes
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub(crate) fn company_id_by_name(conn: &Connection, name: &str) -> Result<Option<i64>> {
    let id = conn
        .query_row("SELECT id FROM companies WHERE name = ?1", [name], |row| row.get(0))
        .optional()?;
    Ok(id)
}

pub(crate) fn company_names(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM companies ORDER BY name")?;
    let rows = stmt.query_map([], |row| row.get(0))?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub(crate) fn insert_job(conn: &Connection, job: &NewJob) -> Result<i64> {
    validate_new_job(job)?;
    conn.execute(
        "INSERT INTO jobs (company_id, title, url, salary_min, salary_max, remote_status,
                           date_posted, closing_date, status, source, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            job.company_id,
            job.title.trim(),
            job.url,
            job.salary_min,
            job.salary_max,
            job.remote_status,
            job.date_posted,
            job.closing_date,
            job.status,
            job.source,
            job.notes
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub(crate) fn job_url_exists(conn: &Connection, url: &str) -> Result<bool> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM jobs WHERE url = ?1)",
        [url],
        |row| row.get(0),
    )?;
    Ok(exists)
}

pub(crate) fn get_discovered_job(conn: &Connection, id: i64) -> Result<DiscoveredJob> {
    let sql = format!("SELECT {DISCOVERED_COLUMNS} FROM discovered_jobs WHERE id = ?1");
    conn.query_row(&sql, [id], row_to_discovered_job)
        .optional()?
        .ok_or(TrackerError::not_found("discovered job", id))
}

fn row_to_discovered_job(row: &rusqlite::Row) -> rusqlite::Result<DiscoveredJob> {
    Ok(DiscoveredJob {
        id: row.get(0)?,
        title: row.get(1)?,
        company_name: row.get(2)?,
        url: row.get(3)?,
        requirements_raw: row.get(4)?,
        source: row.get(5)?,
        raw_response: row.get(6)?,
        discovered_at: row.get(7)?,
        status: row.get(8)?,
        promoted_to_job_id: row.get(9)?,
    })
}

// --- Input validation ---

fn validate_new_job(job: &NewJob) -> Result<()> {
    require_non_empty("job title", &job.title)?;
    require_non_empty("job status", &job.status)?;
    if let (Some(min), Some(max)) = (job.salary_min, job.salary_max) {
        if min > max {
            return Err(TrackerError::invalid(format!(
                "salary min {min} is greater than salary max {max}"
            )));
        }
    }
    if let Some(remote) = &job.remote_status {
        validate_remote(remote)?;
    }
    for date in [&job.date_posted, &job.closing_date].into_iter().flatten() {
        parse_date(date)?;
    }
    Ok(())
}

pub fn validate_remote(remote: &str) -> Result<()> {
    if REMOTE_OPTIONS.contains(&remote) {
        Ok(())
    } else {
        Err(TrackerError::invalid(format!(
            "unknown remote status '{remote}' (expected one of {})",
            REMOTE_OPTIONS.join(", ")
        )))
    }
}

pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| TrackerError::invalid(format!("'{value}' is not a YYYY-MM-DD date")))
}

/// Accepts `YYYY-MM-DD HH:MM` or `YYYY-MM-DDTHH:MM` and normalizes to ISO 8601.
pub fn parse_datetime(value: &str) -> Result<String> {
    let value = value.trim();
    ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|dt| dt.format("%Y-%m-%dT%H:%M").to_string())
        .ok_or_else(|| TrackerError::invalid(format!("'{value}' is not a YYYY-MM-DD HH:MM datetime")))
}

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(TrackerError::invalid(format!("{field} must not be empty")));
    }
    Ok(())
}

fn append_note(existing: Option<&str>, label: &str, note: Option<&str>) -> Option<String> {
    match (existing, note.map(str::trim).filter(|n| !n.is_empty())) {
        (Some(prev), Some(note)) => Some(format!("{prev}\n[{label}] {note}")),
        (None, Some(note)) => Some(format!("[{label}] {note}")),
        (prev, None) => prev.map(str::to_string),
    }
}
