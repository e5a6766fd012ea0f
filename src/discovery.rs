//! Staging pipeline for externally discovered job postings.
//!
//! Candidates land in `discovered_jobs` as `pending`, deduplicated by URL against
//! both the staging table and the main `jobs` table. From there a row is saved,
//! dismissed, or promoted into the main dataset. Promotion runs in one
//! transaction so a job is never created without its staging row being marked.

use std::fmt;
use std::str::FromStr;

use rusqlite::params;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::db::{self, Database};
use crate::error::{Result, TrackerError};
use crate::models::{NewCompany, NewJob};
use crate::parser::{Candidate, parse_response};
use crate::search::SearchProvider;

/// Company name used when a promoted posting carries none.
pub const UNKNOWN_COMPANY: &str = "Unknown";
const UNTITLED: &str = "[No Title]";

// Names at or above this Jaro-Winkler score are reported as likely duplicates.
const SIMILAR_NAME_THRESHOLD: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscoveryStatus {
    Pending,
    Saved,
    Dismissed,
    Promoted,
}

impl DiscoveryStatus {
    pub const ALL: [DiscoveryStatus; 4] = [
        DiscoveryStatus::Pending,
        DiscoveryStatus::Saved,
        DiscoveryStatus::Dismissed,
        DiscoveryStatus::Promoted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DiscoveryStatus::Pending => "pending",
            DiscoveryStatus::Saved => "saved",
            DiscoveryStatus::Dismissed => "dismissed",
            DiscoveryStatus::Promoted => "promoted",
        }
    }

    /// Allowed moves: pending -> saved | dismissed | promoted, and a saved row
    /// may still be dismissed or promoted. Dismissed and promoted are final.
    pub fn can_transition_to(self, next: DiscoveryStatus) -> bool {
        use DiscoveryStatus::*;
        matches!(
            (self, next),
            (Pending, Saved) | (Pending, Dismissed) | (Pending, Promoted) | (Saved, Dismissed) | (Saved, Promoted)
        )
    }

    fn check_transition(self, id: i64, next: DiscoveryStatus) -> Result<()> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(TrackerError::InvalidTransition {
                id,
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}

impl fmt::Display for DiscoveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for DiscoveryStatus {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(DiscoveryStatus::Pending),
            "saved" => Ok(DiscoveryStatus::Saved),
            "dismissed" => Ok(DiscoveryStatus::Dismissed),
            "promoted" => Ok(DiscoveryStatus::Promoted),
            other => Err(TrackerError::invalid(format!(
                "unknown discovery status '{other}' (expected pending, saved, dismissed or promoted)"
            ))),
        }
    }
}

impl ToSql for DiscoveryStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for DiscoveryStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: TrackerError| FromSqlError::Other(Box::new(e)))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Newly staged rows.
    pub inserted: usize,
    /// Candidates whose URL already exists in `jobs` or `discovered_jobs`.
    pub duplicates: usize,
    /// Candidates without a usable URL, plus entries the parser dropped.
    pub skipped: usize,
}

/// Stage candidates that are not already known by URL.
pub fn ingest(
    db: &Database,
    candidates: &[Candidate],
    source: &str,
    raw_response: &str,
) -> Result<IngestReport> {
    let tx = db.conn().unchecked_transaction()?;
    let mut report = IngestReport::default();

    for candidate in candidates {
        let Some(url) = candidate.url.as_deref().map(str::trim).filter(|u| !u.is_empty()) else {
            report.skipped += 1;
            continue;
        };

        let staged: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM discovered_jobs WHERE url = ?1)",
            [url],
            |row| row.get(0),
        )?;
        if staged || db::job_url_exists(&tx, url)? {
            debug!(url, "skipping known url");
            report.duplicates += 1;
            continue;
        }

        tx.execute(
            "INSERT INTO discovered_jobs (title, company_name, url, requirements_raw, source, raw_response, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                candidate.title,
                candidate.company_name,
                url,
                candidate.requirements_raw,
                source,
                raw_response,
                DiscoveryStatus::Pending
            ],
        )?;
        report.inserted += 1;
    }

    tx.commit()?;
    info!(
        inserted = report.inserted,
        duplicates = report.duplicates,
        skipped = report.skipped,
        "ingested discovery candidates"
    );
    Ok(report)
}

/// Run one discovery pass: search, parse, stage.
///
/// A failed search returns `SearchUnavailable` before anything is written.
pub fn discover(db: &Database, provider: &dyn SearchProvider, query: &str) -> Result<IngestReport> {
    info!(source = provider.source_label(), query, "running discovery search");
    let raw = provider.search(query)?;
    let parsed = parse_response(&raw);
    if parsed.candidates.is_empty() {
        warn!(dropped = parsed.dropped, "search response held no usable candidates");
    }
    let mut report = ingest(db, &parsed.candidates, provider.source_label(), &parsed.raw)?;
    report.skipped += parsed.dropped;
    Ok(report)
}

/// Move a staged row to `saved` or `dismissed`.
pub fn mark(db: &Database, id: i64, target: DiscoveryStatus) -> Result<()> {
    if !matches!(target, DiscoveryStatus::Saved | DiscoveryStatus::Dismissed) {
        return Err(TrackerError::invalid(format!(
            "cannot mark a discovered job '{target}'; use saved or dismissed"
        )));
    }
    let staged = db.get_discovered_job(id)?;
    staged.status.check_transition(id, target)?;
    db.conn().execute(
        "UPDATE discovered_jobs SET status = ?1 WHERE id = ?2",
        params![target, id],
    )?;
    info!(id, from = %staged.status, to = %target, "discovered job marked");
    Ok(())
}

/// Optional job fields supplied at promotion time.
#[derive(Debug, Clone, Default)]
pub struct PromoteOptions {
    pub remote_status: Option<String>,
    pub source: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PromoteOutcome {
    pub job_id: i64,
    pub company_id: i64,
    pub company_name: String,
    pub company_created: bool,
    /// Closest existing company name when a new company had to be created.
    pub similar_company: Option<String>,
}

/// Copy a staged posting into `jobs`, creating its company if needed.
pub fn promote(db: &Database, id: i64, options: &PromoteOptions) -> Result<PromoteOutcome> {
    let remote_status = non_blank(&options.remote_status);
    if let Some(remote) = &remote_status {
        db::validate_remote(remote)?;
    }

    // Dropped without commit on any error, which rolls everything back.
    let tx = db.conn().unchecked_transaction()?;

    let staged = db::get_discovered_job(&tx, id)?;
    staged.status.check_transition(id, DiscoveryStatus::Promoted)?;

    let company_name = staged
        .company_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(UNKNOWN_COMPANY)
        .to_string();

    let (company_id, company_created, similar_company) =
        match db::company_id_by_name(&tx, &company_name)? {
            Some(existing) => (existing, false, None),
            None => {
                let similar = closest_company(&db::company_names(&tx)?, &company_name);
                let created = db::insert_company(&tx, &NewCompany::named(company_name.clone()))?;
                (created, true, similar)
            }
        };

    let title = staged
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(UNTITLED);
    let mut job = NewJob::new(company_id, title);
    job.url = Some(staged.url.clone());
    job.source = non_blank(&options.source).or(staged.source.clone());
    job.remote_status = remote_status;
    job.notes = non_blank(&options.notes);
    let job_id = db::insert_job(&tx, &job)?;

    tx.execute(
        "UPDATE discovered_jobs SET status = ?1, promoted_to_job_id = ?2 WHERE id = ?3",
        params![DiscoveryStatus::Promoted, job_id, id],
    )?;
    tx.commit()?;

    info!(id, job_id, company_id, company_created, "discovered job promoted");
    Ok(PromoteOutcome {
        job_id,
        company_id,
        company_name,
        company_created,
        similar_company,
    })
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn closest_company(existing: &[String], name: &str) -> Option<String> {
    existing
        .iter()
        .map(|candidate| (strsim::jaro_winkler(&candidate.to_lowercase(), &name.to_lowercase()), candidate))
        .filter(|(score, _)| *score >= SIMILAR_NAME_THRESHOLD)
        .max_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(_, candidate)| candidate.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::{seed_job, test_db};
    use crate::models::NewCompany;

    fn candidate(url: Option<&str>, company: Option<&str>) -> Candidate {
        Candidate {
            title: Some("Data Analyst".to_string()),
            company_name: company.map(str::to_string),
            url: url.map(str::to_string),
            requirements_raw: Some("SQL, Python, 3+ years".to_string()),
        }
    }

    fn stage(db: &Database, url: &str, company: &str) -> i64 {
        let report = ingest(db, &[candidate(Some(url), Some(company))], "perplexity", "[]").unwrap();
        assert_eq!(report.inserted, 1);
        db.list_discovered_jobs(None)
            .unwrap()
            .into_iter()
            .find(|d| d.url == url)
            .map(|d| d.id)
            .unwrap()
    }

    fn count(db: &Database, table: &str) -> i64 {
        db.conn()
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .unwrap()
    }

    struct CannedSearch(std::result::Result<String, String>);

    impl SearchProvider for CannedSearch {
        fn search(&self, _query: &str) -> Result<String> {
            self.0.clone().map_err(TrackerError::SearchUnavailable)
        }

        fn source_label(&self) -> &str {
            "canned"
        }
    }

    #[test]
    fn transition_table() {
        use DiscoveryStatus::*;
        assert!(Pending.can_transition_to(Saved));
        assert!(Pending.can_transition_to(Dismissed));
        assert!(Pending.can_transition_to(Promoted));
        assert!(Saved.can_transition_to(Promoted));
        assert!(Saved.can_transition_to(Dismissed));
        assert!(!Saved.can_transition_to(Saved));
        assert!(!Pending.can_transition_to(Pending));
        for next in DiscoveryStatus::ALL {
            assert!(!Dismissed.can_transition_to(next));
            assert!(!Promoted.can_transition_to(next));
        }
    }

    #[test]
    fn status_parses_and_displays() {
        for status in DiscoveryStatus::ALL {
            assert_eq!(status.to_string().parse::<DiscoveryStatus>().unwrap(), status);
        }
        assert!(matches!(
            "archived".parse::<DiscoveryStatus>(),
            Err(TrackerError::InvalidArgument(_))
        ));
    }

    #[test]
    fn ingest_skips_candidates_without_url() {
        let db = test_db();
        let report = ingest(
            &db,
            &[candidate(Some("https://a.example/job1"), Some("Acme")), candidate(None, Some("Acme"))],
            "perplexity",
            "raw",
        )
        .unwrap();
        assert_eq!(report.inserted, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(count(&db, "discovered_jobs"), 1);
    }

    #[test]
    fn ingest_treats_blank_url_as_missing() {
        let db = test_db();
        let report = ingest(&db, &[candidate(Some("   "), None)], "perplexity", "raw").unwrap();
        assert_eq!(report.inserted, 0);
        assert_eq!(report.skipped, 1);
    }

    #[test]
    fn ingest_is_idempotent() {
        let db = test_db();
        let batch = [
            candidate(Some("https://a.example/1"), Some("Acme")),
            candidate(Some("https://a.example/2"), Some("Beta")),
        ];
        let first = ingest(&db, &batch, "perplexity", "raw").unwrap();
        let second = ingest(&db, &batch, "perplexity", "raw").unwrap();
        assert_eq!(first.inserted, 2);
        assert_eq!(second.inserted, 0);
        assert_eq!(second.duplicates, 2);
        assert_eq!(count(&db, "discovered_jobs"), 2);
    }

    #[test]
    fn ingest_dedupes_within_a_batch() {
        let db = test_db();
        let batch = [
            candidate(Some("https://a.example/1"), Some("Acme")),
            candidate(Some("https://a.example/1"), Some("Acme Inc")),
        ];
        let report = ingest(&db, &batch, "perplexity", "raw").unwrap();
        assert_eq!(report.inserted, 1);
        assert_eq!(report.duplicates, 1);
    }

    #[test]
    fn ingest_skips_urls_already_in_jobs() {
        let db = test_db();
        seed_job(&db, "Acme", "https://a.example/known");
        let report = ingest(
            &db,
            &[candidate(Some("https://a.example/known"), Some("Acme"))],
            "perplexity",
            "raw",
        )
        .unwrap();
        assert_eq!(report.inserted, 0);
        assert_eq!(report.duplicates, 1);
        assert_eq!(count(&db, "discovered_jobs"), 0);
    }

    #[test]
    fn ingest_retains_raw_response_and_defaults() {
        let db = test_db();
        let raw = r#"[{"title": "Data Analyst", "url": "https://a.example/1"}]"#;
        ingest(&db, &[candidate(Some("https://a.example/1"), Some("Acme"))], "perplexity", raw)
            .unwrap();
        let staged = &db.list_discovered_jobs(Some(DiscoveryStatus::Pending)).unwrap()[0];
        assert_eq!(staged.raw_response.as_deref(), Some(raw));
        assert_eq!(staged.source.as_deref(), Some("perplexity"));
        assert_eq!(staged.status, DiscoveryStatus::Pending);
        assert!(staged.promoted_to_job_id.is_none());
        assert!(!staged.discovered_at.is_empty());
    }

    #[test]
    fn mark_moves_pending_rows() {
        let db = test_db();
        let id = stage(&db, "https://a.example/1", "Acme");
        mark(&db, id, DiscoveryStatus::Saved).unwrap();
        assert_eq!(db.get_discovered_job(id).unwrap().status, DiscoveryStatus::Saved);
        mark(&db, id, DiscoveryStatus::Dismissed).unwrap();
        assert_eq!(db.get_discovered_job(id).unwrap().status, DiscoveryStatus::Dismissed);
    }

    #[test]
    fn mark_after_dismiss_is_invalid_transition() {
        let db = test_db();
        let id = stage(&db, "https://a.example/1", "Acme");
        mark(&db, id, DiscoveryStatus::Dismissed).unwrap();
        let err = mark(&db, id, DiscoveryStatus::Saved).unwrap_err();
        assert!(matches!(err, TrackerError::InvalidTransition { .. }));
        assert_eq!(db.get_discovered_job(id).unwrap().status, DiscoveryStatus::Dismissed);
    }

    #[test]
    fn mark_rejects_non_review_targets() {
        let db = test_db();
        let id = stage(&db, "https://a.example/1", "Acme");
        for target in [DiscoveryStatus::Pending, DiscoveryStatus::Promoted] {
            assert!(matches!(mark(&db, id, target), Err(TrackerError::InvalidArgument(_))));
        }
    }

    #[test]
    fn unknown_ids_are_not_found() {
        let db = test_db();
        assert!(matches!(
            mark(&db, 42, DiscoveryStatus::Saved),
            Err(TrackerError::NotFound { entity: "discovered job", id: 42 })
        ));
        assert!(matches!(
            promote(&db, 42, &PromoteOptions::default()),
            Err(TrackerError::NotFound { entity: "discovered job", id: 42 })
        ));
    }

    #[test]
    fn promote_creates_company_and_job() {
        let db = test_db();
        let id = stage(&db, "https://x.example", "Acme");

        let outcome = promote(&db, id, &PromoteOptions::default()).unwrap();
        assert!(outcome.company_created);

        let companies = db.list_companies().unwrap();
        assert_eq!(companies.len(), 1);
        assert_eq!(companies[0].name, "Acme");
        assert!(companies[0].website.is_none());

        let jobs = db.list_jobs(None, false).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].company_id, companies[0].id);
        assert_eq!(jobs[0].url.as_deref(), Some("https://x.example"));
        assert_eq!(jobs[0].status, "open");
        assert_eq!(jobs[0].source.as_deref(), Some("perplexity"));
        assert_eq!(jobs[0].title, "Data Analyst");

        let staged = db.get_discovered_job(id).unwrap();
        assert_eq!(staged.status, DiscoveryStatus::Promoted);
        assert_eq!(staged.promoted_to_job_id, Some(outcome.job_id));
    }

    #[test]
    fn promote_reuses_existing_company_by_exact_name() {
        let db = test_db();
        let existing = db.create_company(&NewCompany::named("Acme")).unwrap();
        let id = stage(&db, "https://x.example", "Acme");

        let outcome = promote(&db, id, &PromoteOptions::default()).unwrap();
        assert!(!outcome.company_created);
        assert_eq!(outcome.company_id, existing);
        assert_eq!(db.list_companies().unwrap().len(), 1);
    }

    #[test]
    fn promote_flags_similar_company_names() {
        let db = test_db();
        db.create_company(&NewCompany::named("Uniswap Labs")).unwrap();
        let id = stage(&db, "https://x.example", "Uniswap Labs.");

        let outcome = promote(&db, id, &PromoteOptions::default()).unwrap();
        assert!(outcome.company_created);
        assert_eq!(outcome.similar_company.as_deref(), Some("Uniswap Labs"));
    }

    #[test]
    fn promote_without_company_uses_placeholder() {
        let db = test_db();
        ingest(&db, &[candidate(Some("https://x.example"), None)], "perplexity", "raw").unwrap();
        let id = db.list_discovered_jobs(None).unwrap()[0].id;
        let outcome = promote(&db, id, &PromoteOptions::default()).unwrap();
        assert_eq!(outcome.company_name, UNKNOWN_COMPANY);
    }

    #[test]
    fn promote_applies_options() {
        let db = test_db();
        let id = stage(&db, "https://x.example", "Acme");
        let options = PromoteOptions {
            remote_status: Some("hybrid".to_string()),
            source: Some("referral".to_string()),
            notes: Some("ping Alex".to_string()),
        };
        let outcome = promote(&db, id, &options).unwrap();
        let job = db.get_job(outcome.job_id).unwrap();
        assert_eq!(job.remote_status.as_deref(), Some("hybrid"));
        assert_eq!(job.source.as_deref(), Some("referral"));
        assert_eq!(job.notes.as_deref(), Some("ping Alex"));
    }

    #[test]
    fn promote_ignores_blank_options() {
        let db = test_db();
        let id = stage(&db, "https://x.example", "Acme");
        let options = PromoteOptions {
            remote_status: Some(" ".to_string()),
            source: Some(String::new()),
            notes: Some("   ".to_string()),
        };
        let outcome = promote(&db, id, &options).unwrap();
        let job = db.get_job(outcome.job_id).unwrap();
        assert!(job.remote_status.is_none());
        assert_eq!(job.source.as_deref(), Some("perplexity"));
        assert!(job.notes.is_none());
    }

    #[test]
    fn promote_saved_row_is_allowed() {
        let db = test_db();
        let id = stage(&db, "https://x.example", "Acme");
        mark(&db, id, DiscoveryStatus::Saved).unwrap();
        promote(&db, id, &PromoteOptions::default()).unwrap();
        assert_eq!(db.get_discovered_job(id).unwrap().status, DiscoveryStatus::Promoted);
    }

    #[test]
    fn promote_twice_is_invalid_transition() {
        let db = test_db();
        let id = stage(&db, "https://x.example", "Acme");
        promote(&db, id, &PromoteOptions::default()).unwrap();
        let err = promote(&db, id, &PromoteOptions::default()).unwrap_err();
        assert!(matches!(err, TrackerError::InvalidTransition { .. }));
        assert_eq!(count(&db, "jobs"), 1);
        assert!(matches!(
            mark(&db, id, DiscoveryStatus::Dismissed),
            Err(TrackerError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn promote_dismissed_is_invalid_transition() {
        let db = test_db();
        let id = stage(&db, "https://x.example", "Acme");
        mark(&db, id, DiscoveryStatus::Dismissed).unwrap();
        assert!(matches!(
            promote(&db, id, &PromoteOptions::default()),
            Err(TrackerError::InvalidTransition { .. })
        ));
        assert_eq!(count(&db, "jobs"), 0);
        assert_eq!(count(&db, "companies"), 0);
    }

    #[test]
    fn promote_rolls_back_when_job_insert_fails() {
        let db = test_db();
        // The staged URL collides with a job added afterwards.
        let id = stage(&db, "https://x.example/dup", "Newco");
        seed_job(&db, "Oldco", "https://x.example/dup");
        let companies_before = count(&db, "companies");
        let jobs_before = count(&db, "jobs");

        let err = promote(&db, id, &PromoteOptions::default()).unwrap_err();
        assert!(matches!(err, TrackerError::ConstraintViolation(_)));

        assert_eq!(count(&db, "companies"), companies_before);
        assert_eq!(count(&db, "jobs"), jobs_before);
        assert!(db.get_company_by_name("Newco").unwrap().is_none());
        let staged = db.get_discovered_job(id).unwrap();
        assert_eq!(staged.status, DiscoveryStatus::Pending);
        assert!(staged.promoted_to_job_id.is_none());
    }

    #[test]
    fn promote_rejects_bad_remote_before_writing() {
        let db = test_db();
        let id = stage(&db, "https://x.example", "Acme");
        let options = PromoteOptions {
            remote_status: Some("mars".to_string()),
            ..Default::default()
        };
        assert!(matches!(promote(&db, id, &options), Err(TrackerError::InvalidArgument(_))));
        assert_eq!(count(&db, "companies"), 0);
    }

    #[test]
    fn promoted_rows_reference_existing_jobs() {
        let db = test_db();
        for n in 0..3 {
            let id = stage(&db, &format!("https://x.example/{n}"), "Acme");
            if n != 1 {
                promote(&db, id, &PromoteOptions::default()).unwrap();
            }
        }
        for staged in db.list_discovered_jobs(None).unwrap() {
            match staged.status {
                DiscoveryStatus::Promoted => {
                    let job_id = staged.promoted_to_job_id.unwrap();
                    assert!(db.get_job(job_id).is_ok());
                }
                _ => assert!(staged.promoted_to_job_id.is_none()),
            }
        }
    }

    #[test]
    fn discover_stages_parsed_results() {
        let db = test_db();
        let provider = CannedSearch(Ok(r#"```json
[{"title": "Data Analyst", "company": "Dune", "url": "https://dune.com/jobs/1"},
 {"title": "No link", "company": "Dune"}]
```"#
            .to_string()));

        let report = discover(&db, &provider, "sql jobs").unwrap();
        assert_eq!(report.inserted, 1);
        assert_eq!(report.skipped, 1);

        let staged = &db.list_discovered_jobs(None).unwrap()[0];
        assert_eq!(staged.source.as_deref(), Some("canned"));
        assert_eq!(staged.company_name.as_deref(), Some("Dune"));
        assert!(staged.raw_response.as_deref().unwrap().starts_with("```json"));

        let again = discover(&db, &provider, "sql jobs").unwrap();
        assert_eq!(again.inserted, 0);
    }

    #[test]
    fn discover_failure_writes_nothing() {
        let db = test_db();
        let provider = CannedSearch(Err("HTTP 429 rate limited".to_string()));
        let err = discover(&db, &provider, "sql jobs").unwrap_err();
        assert!(matches!(err, TrackerError::SearchUnavailable(_)));
        assert_eq!(count(&db, "discovered_jobs"), 0);
    }
}
