mod config;
mod db;
mod discovery;
mod error;
mod logging;
mod models;
mod parser;
mod reports;
mod search;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use config::{Config, SearchConfig};
use db::Database;
use discovery::{DiscoveryStatus, PromoteOptions};
use models::{
    APPLICATION_STATUSES, Company, INTERVIEW_OUTCOMES, INTERVIEW_TYPES, Importance, JOB_STATUSES,
    NewApplication, NewCompany, NewInterview, NewJob,
};
use search::PerplexityProvider;
use std::path::PathBuf;
use tracing::warn;

#[derive(Parser)]
#[command(name = "cjobs")]
#[command(about = "Crypto/web3 job tracker - companies, postings, applications and discovery")]
struct Cli {
    /// Database file (overrides CJOBS_DB)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database and seed the skill catalog
    Init,

    /// Manage companies
    Company {
        #[command(subcommand)]
        command: CompanyCommands,
    },

    /// Manage job postings
    Job {
        #[command(subcommand)]
        command: JobCommands,
    },

    /// Manage the skill catalog
    Skill {
        #[command(subcommand)]
        command: SkillCommands,
    },

    /// Track applications
    Application {
        #[command(subcommand)]
        command: ApplicationCommands,
    },

    /// Track interviews
    Interview {
        #[command(subcommand)]
        command: InterviewCommands,
    },

    /// Aggregate reports
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },

    /// Find postings through web search and review them before tracking
    Discover {
        #[command(subcommand)]
        command: DiscoverCommands,
    },
}

#[derive(Subcommand)]
enum CompanyCommands {
    /// Add a company
    Add {
        name: String,
        #[arg(short, long)]
        website: Option<String>,
        /// DeFi, NFT, Infrastructure, Exchange, Analytics, Other
        #[arg(short, long)]
        sector: Option<String>,
        /// Chains the company builds on, e.g. "Ethereum, Solana"
        #[arg(short, long)]
        chain: Option<String>,
        /// startup, small, medium, large
        #[arg(long)]
        size: Option<String>,
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// List all companies
    List,

    /// Show company details and its jobs
    Show {
        /// Company name or ID
        company: String,
    },

    /// Edit company fields
    Edit {
        /// Company name or ID
        company: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(short, long)]
        website: Option<String>,
        #[arg(short, long)]
        sector: Option<String>,
        #[arg(short, long)]
        chain: Option<String>,
        #[arg(long)]
        size: Option<String>,
        #[arg(short, long)]
        notes: Option<String>,
    },
}

#[derive(Subcommand)]
enum JobCommands {
    /// Add a job posting
    Add {
        /// Company name or ID (must already exist)
        #[arg(short, long)]
        company: String,
        title: String,
        #[arg(short, long)]
        url: Option<String>,
        /// Minimum annual salary (USD)
        #[arg(long)]
        salary_min: Option<i64>,
        /// Maximum annual salary (USD)
        #[arg(long)]
        salary_max: Option<i64>,
        /// remote, hybrid, onsite
        #[arg(short, long)]
        remote: Option<String>,
        /// Posting date (YYYY-MM-DD)
        #[arg(long)]
        posted: Option<String>,
        /// Closing date (YYYY-MM-DD)
        #[arg(long)]
        closes: Option<String>,
        /// Where the posting was found
        #[arg(long)]
        source: Option<String>,
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// List jobs
    List {
        /// Filter by status (open, closed, expired)
        #[arg(short, long)]
        status: Option<String>,

        /// Only jobs tagged with an SQL-category skill
        #[arg(long)]
        sql: bool,
    },

    /// Show job details and skill tags
    Show { id: i64 },

    /// Set a job's status (open, closed, expired)
    Status { id: i64, status: String },

    /// Tag a job with a skill
    Tag {
        id: i64,
        /// Skill name (case-insensitive)
        skill: String,
        /// required or nice-to-have
        #[arg(short, long, default_value = "required")]
        importance: String,
    },

    /// Remove a skill tag from a job
    Untag { id: i64, skill: String },
}

#[derive(Subcommand)]
enum SkillCommands {
    /// List skills
    List {
        /// Filter by category (SQL, Programming, Cloud, BI, Blockchain)
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Add a skill to the catalog
    Add {
        name: String,
        #[arg(short, long)]
        category: Option<String>,
    },
}

#[derive(Subcommand)]
enum ApplicationCommands {
    /// Record an application for a job
    Add {
        job_id: i64,
        /// Date applied (YYYY-MM-DD, default today)
        #[arg(short, long)]
        date: Option<String>,
        /// Resume version used
        #[arg(short, long)]
        resume: Option<String>,
        /// A cover letter was sent
        #[arg(long)]
        cover_letter: bool,
        #[arg(short, long, default_value = "applied")]
        status: String,
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// List applications
    List {
        /// Filter by status (applied, screening, interview, rejected, offer, ghosted, withdrawn)
        #[arg(short, long)]
        status: Option<String>,
    },

    /// Show application details and interviews
    Show { id: i64 },

    /// Update an application's status
    Update {
        id: i64,
        status: String,
        /// Note appended as "[status] note"
        #[arg(short, long)]
        note: Option<String>,
    },
}

#[derive(Subcommand)]
enum InterviewCommands {
    /// Schedule an interview
    Add {
        application_id: i64,
        /// When (YYYY-MM-DD HH:MM)
        #[arg(short, long)]
        at: Option<String>,
        /// recruiter, technical, sql-challenge, culture, final
        #[arg(short = 't', long = "type")]
        interview_type: Option<String>,
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// List interviews
    List {
        /// Only interviews for this application
        #[arg(short, long)]
        application: Option<i64>,
    },

    /// Show interview details
    Show { id: i64 },

    /// Record an interview outcome (pending, passed, failed, cancelled)
    Outcome {
        id: i64,
        outcome: String,
        #[arg(short, long)]
        note: Option<String>,
    },
}

#[derive(Subcommand)]
enum ReportCommands {
    /// Applications per status
    Pipeline,

    /// Skills ranked by how many jobs ask for them
    Skills {
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Open jobs not applied to yet
    Unapplied {
        /// remote, hybrid, onsite
        #[arg(short, long)]
        remote: Option<String>,
    },

    /// Jobs that require an SQL skill
    Sql,

    /// Overall counts
    Summary,

    /// Discovered jobs per review status
    Discovery,
}

#[derive(Subcommand)]
enum DiscoverCommands {
    /// Search the web and stage new postings for review
    Run {
        /// Search query (overrides CJOBS_SEARCH_QUERY)
        #[arg(short, long)]
        query: Option<String>,
    },

    /// Show postings waiting for review
    Review,

    /// List discovered postings
    List {
        /// Filter by status (pending, saved, dismissed, promoted)
        #[arg(short, long)]
        status: Option<String>,
    },

    /// Show a discovered posting in full
    View {
        id: i64,
        /// Also print the raw search response it came from
        #[arg(long)]
        raw: bool,
    },

    /// Keep a posting for later
    Save { id: i64 },

    /// Dismiss a posting
    Dismiss { id: i64 },

    /// Promote a posting into the tracked jobs
    Promote {
        id: i64,
        /// remote, hybrid, onsite
        #[arg(short, long)]
        remote: Option<String>,
        /// Override the recorded source
        #[arg(long)]
        source: Option<String>,
        #[arg(short, long)]
        notes: Option<String>,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    logging::setup_logging(&format!("{}={level}", env!("CARGO_CRATE_NAME")));

    let db_path = cli.db.clone().unwrap_or_else(|| Config::from_env().db_path);
    let db = Database::open(&db_path)
        .with_context(|| format!("Failed to open database at {}", db_path.display()))?;

    if let Commands::Init = cli.command {
        db.init()?;
        println!("Database initialized at {}", db.path().display());
        return Ok(());
    }
    ensure_initialized(&db)?;

    match cli.command {
        Commands::Init => {}
        Commands::Company { command } => run_company(&db, command)?,
        Commands::Job { command } => run_job(&db, command)?,
        Commands::Skill { command } => run_skill(&db, command)?,
        Commands::Application { command } => run_application(&db, command)?,
        Commands::Interview { command } => run_interview(&db, command)?,
        Commands::Report { command } => run_report(&db, command)?,
        Commands::Discover { command } => run_discover(&db, command)?,
    }

    Ok(())
}

fn run_company(db: &Database, command: CompanyCommands) -> Result<()> {
    match command {
        CompanyCommands::Add {
            name,
            website,
            sector,
            chain,
            size,
            notes,
        } => {
            let id = db.create_company(&NewCompany {
                name: name.clone(),
                website,
                sector,
                chain_focus: chain,
                size,
                notes,
            })?;
            println!("Added company '{}' (ID: {})", name.trim(), id);
        }

        CompanyCommands::List => {
            let companies = db.list_companies()?;
            if companies.is_empty() {
                println!("No companies found.");
            } else {
                println!("{:<6} {:<25} {:<15} {:<20} {:<10}", "ID", "NAME", "SECTOR", "CHAINS", "SIZE");
                println!("{}", "-".repeat(80));
                for c in companies {
                    println!(
                        "{:<6} {:<25} {:<15} {:<20} {:<10}",
                        c.id,
                        truncate(&c.name, 23),
                        truncate(or_dash(&c.sector), 13),
                        truncate(or_dash(&c.chain_focus), 18),
                        or_dash(&c.size)
                    );
                }
            }
        }

        CompanyCommands::Show { company } => {
            let company = find_company(db, &company)?;
            println!("Company #{}", company.id);
            println!("Name: {}", company.name);
            if let Some(website) = &company.website {
                println!("Website: {}", website);
            }
            if let Some(sector) = &company.sector {
                println!("Sector: {}", sector);
            }
            if let Some(chain) = &company.chain_focus {
                println!("Chains: {}", chain);
            }
            if let Some(size) = &company.size {
                println!("Size: {}", size);
            }
            if let Some(notes) = &company.notes {
                println!("Notes: {}", notes);
            }
            println!("Added: {}", company.created_at);
            let jobs = db.list_jobs_for_company(company.id)?;
            if !jobs.is_empty() {
                println!("\nJobs ({}):", jobs.len());
                for job in jobs {
                    println!("  #{} - {} ({})", job.id, job.title, job.status);
                }
            }
        }

        CompanyCommands::Edit {
            company,
            name,
            website,
            sector,
            chain,
            size,
            notes,
        } => {
            let mut existing = find_company(db, &company)?;
            if let Some(name) = name {
                existing.name = name.trim().to_string();
            }
            existing.website = website.or(existing.website);
            existing.sector = sector.or(existing.sector);
            existing.chain_focus = chain.or(existing.chain_focus);
            existing.size = size.or(existing.size);
            existing.notes = notes.or(existing.notes);
            db.update_company(&existing)?;
            println!("Updated company #{} ({}).", existing.id, existing.name);
        }
    }
    Ok(())
}

fn run_job(db: &Database, command: JobCommands) -> Result<()> {
    match command {
        JobCommands::Add {
            company,
            title,
            url,
            salary_min,
            salary_max,
            remote,
            posted,
            closes,
            source,
            notes,
        } => {
            let company = find_company(db, &company)?;
            let mut job = NewJob::new(company.id, title.trim());
            job.url = url;
            job.salary_min = salary_min;
            job.salary_max = salary_max;
            job.remote_status = remote;
            job.date_posted = posted;
            job.closing_date = closes;
            job.source = source;
            job.notes = notes;
            let id = db.create_job(&job)?;
            println!("Added job #{} at {}", id, company.name);
        }

        JobCommands::List { status, sql } => {
            let jobs = db.list_jobs(status.as_deref(), sql)?;
            if jobs.is_empty() {
                println!("No jobs found.");
            } else {
                println!(
                    "{:<6} {:<8} {:<30} {:<20} {:<8} {:>12}",
                    "ID", "STATUS", "TITLE", "COMPANY", "REMOTE", "SALARY"
                );
                println!("{}", "-".repeat(89));
                for job in jobs {
                    println!(
                        "{:<6} {:<8} {:<30} {:<20} {:<8} {:>12}",
                        job.id,
                        job.status,
                        truncate(&job.title, 28),
                        truncate(&job.company_name, 18),
                        or_dash(&job.remote_status),
                        salary_short(job.salary_min, job.salary_max)
                    );
                }
            }
        }

        JobCommands::Show { id } => {
            let job = db.get_job(id)?;
            println!("Job #{}", job.id);
            println!("Title: {}", job.title);
            println!("Company: {} (#{})", job.company_name, job.company_id);
            println!("Status: {}", job.status);
            if let Some(url) = &job.url {
                println!("URL: {}", url);
            }
            match (job.salary_min, job.salary_max) {
                (Some(min), Some(max)) => println!("Salary: ${} - ${}", min, max),
                (Some(min), None) => println!("Salary: ${}+", min),
                (None, Some(max)) => println!("Salary: up to ${}", max),
                (None, None) => {}
            }
            if let Some(remote) = &job.remote_status {
                println!("Remote: {}", remote);
            }
            if let Some(posted) = &job.date_posted {
                println!("Posted: {}", posted);
            }
            if let Some(found) = &job.date_found {
                println!("Found: {}", found);
            }
            if let Some(closes) = &job.closing_date {
                println!("Closes: {}", closes);
            }
            if let Some(source) = &job.source {
                println!("Source: {}", source);
            }
            if let Some(notes) = &job.notes {
                println!("Notes: {}", notes);
            }
            let skills = db.job_skills(id)?;
            if !skills.is_empty() {
                println!("\nSkills:");
                for tagged in skills {
                    println!("  {} [{}]", tagged.skill.name, tagged.importance);
                }
            }
        }

        JobCommands::Status { id, status } => {
            warn_if_unknown("job status", &status, JOB_STATUSES);
            db.set_job_status(id, &status)?;
            println!("Job #{} is now {}.", id, status);
        }

        JobCommands::Tag {
            id,
            skill,
            importance,
        } => {
            let importance: Importance = importance.parse()?;
            let found = find_skill(db, &skill)?;
            db.tag_job(id, found.id, importance)?;
            println!("Tagged job #{} with {} ({}).", id, found.name, importance);
        }

        JobCommands::Untag { id, skill } => {
            let found = find_skill(db, &skill)?;
            db.untag_job(id, found.id)?;
            println!("Removed {} from job #{}.", found.name, id);
        }
    }
    Ok(())
}

fn run_skill(db: &Database, command: SkillCommands) -> Result<()> {
    match command {
        SkillCommands::List { category } => {
            let skills = db.list_skills(category.as_deref())?;
            if skills.is_empty() {
                println!("No skills found.");
            } else {
                println!("{:<6} {:<20} {:<12}", "ID", "NAME", "CATEGORY");
                println!("{}", "-".repeat(40));
                for skill in skills {
                    println!(
                        "{:<6} {:<20} {:<12}",
                        skill.id,
                        truncate(&skill.name, 18),
                        or_dash(&skill.category)
                    );
                }
            }
        }

        SkillCommands::Add { name, category } => {
            if let Some(existing) = db.get_skill_by_name(&name)? {
                return Err(anyhow!("Skill '{}' already exists (ID: {})", existing.name, existing.id));
            }
            let id = db.create_skill(&name, category.as_deref())?;
            println!("Added skill '{}' (ID: {})", name.trim(), id);
        }
    }
    Ok(())
}

fn run_application(db: &Database, command: ApplicationCommands) -> Result<()> {
    match command {
        ApplicationCommands::Add {
            job_id,
            date,
            resume,
            cover_letter,
            status,
            notes,
        } => {
            warn_if_unknown("application status", &status, APPLICATION_STATUSES);
            let mut app = NewApplication::for_job(job_id);
            app.date_applied = date;
            app.resume_version = resume;
            app.cover_letter_sent = cover_letter;
            app.status = status;
            app.notes = notes;
            let id = db.create_application(&app)?;
            println!("Recorded application #{} for job #{}", id, job_id);
        }

        ApplicationCommands::List { status } => {
            let apps = db.list_applications(status.as_deref())?;
            if apps.is_empty() {
                println!("No applications found.");
            } else {
                println!("{:<6} {:<12} {:<11} {:<30} {:<20}", "ID", "STATUS", "APPLIED", "JOB", "COMPANY");
                println!("{}", "-".repeat(83));
                for app in apps {
                    let job = db.get_job(app.job_id)?;
                    println!(
                        "{:<6} {:<12} {:<11} {:<30} {:<20}",
                        app.id,
                        app.status,
                        or_dash(&app.date_applied),
                        truncate(&job.title, 28),
                        truncate(&job.company_name, 18)
                    );
                }
            }
        }

        ApplicationCommands::Show { id } => {
            let app = db.get_application(id)?;
            let job = db.get_job(app.job_id)?;
            println!("Application #{}", app.id);
            println!("Job: #{} {} at {}", job.id, job.title, job.company_name);
            println!("Status: {}", app.status);
            println!("Applied: {}", or_dash(&app.date_applied));
            if let Some(resume) = &app.resume_version {
                println!("Resume: {}", resume);
            }
            println!("Cover letter: {}", if app.cover_letter_sent { "yes" } else { "no" });
            if let Some(notes) = &app.notes {
                println!("\n--- Notes ---\n{}", notes);
            }
            let interviews = db.list_interviews(Some(id))?;
            if !interviews.is_empty() {
                println!("\nInterviews ({}):", interviews.len());
                for iv in interviews {
                    println!(
                        "  #{} {} {} ({})",
                        iv.id,
                        or_dash(&iv.scheduled_at),
                        or_dash(&iv.interview_type),
                        or_dash(&iv.outcome)
                    );
                }
            }
        }

        ApplicationCommands::Update { id, status, note } => {
            warn_if_unknown("application status", &status, APPLICATION_STATUSES);
            db.update_application_status(id, &status, note.as_deref())?;
            println!("Application #{} is now {}.", id, status);
        }
    }
    Ok(())
}

fn run_interview(db: &Database, command: InterviewCommands) -> Result<()> {
    match command {
        InterviewCommands::Add {
            application_id,
            at,
            interview_type,
            notes,
        } => {
            if let Some(kind) = &interview_type {
                warn_if_unknown("interview type", kind, INTERVIEW_TYPES);
            }
            let id = db.create_interview(&NewInterview {
                application_id,
                scheduled_at: at,
                interview_type,
                notes,
            })?;
            println!("Scheduled interview #{} for application #{}", id, application_id);
        }

        InterviewCommands::List { application } => {
            let interviews = db.list_interviews(application)?;
            if interviews.is_empty() {
                println!("No interviews found.");
            } else {
                println!("{:<6} {:<6} {:<17} {:<14} {:<10}", "ID", "APP", "SCHEDULED", "TYPE", "OUTCOME");
                println!("{}", "-".repeat(57));
                for iv in interviews {
                    println!(
                        "{:<6} {:<6} {:<17} {:<14} {:<10}",
                        iv.id,
                        iv.application_id,
                        or_dash(&iv.scheduled_at),
                        truncate(or_dash(&iv.interview_type), 14),
                        or_dash(&iv.outcome)
                    );
                }
            }
        }

        InterviewCommands::Show { id } => {
            let iv = db.get_interview(id)?;
            println!("Interview #{}", iv.id);
            println!("Application: #{}", iv.application_id);
            println!("Scheduled: {}", or_dash(&iv.scheduled_at));
            println!("Type: {}", or_dash(&iv.interview_type));
            println!("Outcome: {}", or_dash(&iv.outcome));
            if let Some(notes) = &iv.notes {
                println!("\n--- Notes ---\n{}", notes);
            }
        }

        InterviewCommands::Outcome { id, outcome, note } => {
            warn_if_unknown("interview outcome", &outcome, INTERVIEW_OUTCOMES);
            db.record_interview_outcome(id, &outcome, note.as_deref())?;
            println!("Interview #{} marked {}.", id, outcome);
        }
    }
    Ok(())
}

fn run_report(db: &Database, command: ReportCommands) -> Result<()> {
    match command {
        ReportCommands::Pipeline => {
            let report = reports::pipeline(db)?;
            if report.rows.is_empty() {
                println!("No applications yet.");
            } else {
                println!("{:<12} {:>6}", "STATUS", "COUNT");
                println!("{}", "-".repeat(19));
                for row in &report.rows {
                    println!("{:<12} {:>6}", row.status, row.count);
                }
                println!("{}", "-".repeat(19));
                println!("{:<12} {:>6}", "total", report.total);
                let responses = report.total - report.count_of("applied") - report.count_of("ghosted");
                println!("\nHeard back on {} of {} applications.", responses, report.total);
            }
        }

        ReportCommands::Skills { limit } => {
            let rows = reports::skill_demand(db, limit)?;
            if rows.is_empty() {
                println!("No skill tags yet.");
            } else {
                println!("{:<5} {:<20} {:<12} {:>6} {:>9} {:>6}", "RANK", "SKILL", "CATEGORY", "TOTAL", "REQUIRED", "NICE");
                println!("{}", "-".repeat(63));
                for (i, row) in rows.iter().enumerate() {
                    println!(
                        "{:<5} {:<20} {:<12} {:>6} {:>9} {:>6}",
                        i + 1,
                        truncate(&row.name, 18),
                        or_dash(&row.category),
                        row.total,
                        row.required,
                        row.nice_to_have
                    );
                }
            }
        }

        ReportCommands::Unapplied { remote } => {
            let rows = reports::unapplied(db, remote.as_deref())?;
            if rows.is_empty() {
                println!("No open jobs waiting for an application.");
            } else {
                println!("{:<6} {:<30} {:<20} {:<8} {:<11}", "ID", "TITLE", "COMPANY", "REMOTE", "FOUND");
                println!("{}", "-".repeat(79));
                for row in rows {
                    println!(
                        "{:<6} {:<30} {:<20} {:<8} {:<11}",
                        row.job_id,
                        truncate(&row.title, 28),
                        truncate(&row.company_name, 18),
                        or_dash(&row.remote_status),
                        or_dash(&row.date_found)
                    );
                }
            }
        }

        ReportCommands::Sql => {
            let rows = reports::sql_matches(db)?;
            if rows.is_empty() {
                println!("No jobs require an SQL skill yet.");
            } else {
                println!("{:<6} {:<8} {:<28} {:<18} {:<25}", "ID", "STATUS", "TITLE", "COMPANY", "SQL SKILLS");
                println!("{}", "-".repeat(89));
                for row in rows {
                    println!(
                        "{:<6} {:<8} {:<28} {:<18} {:<25}",
                        row.job_id,
                        row.status,
                        truncate(&row.title, 26),
                        truncate(&row.company_name, 16),
                        truncate(&row.sql_skills, 25)
                    );
                }
            }
        }

        ReportCommands::Summary => {
            let s = reports::summary(db)?;
            println!("Companies:          {}", s.companies);
            println!("Jobs:               {} ({} open)", s.jobs, s.open_jobs);
            println!("Applications:       {}", s.applications);
            println!("  Active:           {}", s.active_applications);
            println!("  Offers:           {}", s.offers);
            println!("  Rejected:         {}", s.rejections);
            println!("Pending interviews: {}", s.pending_interviews);
            match s.offer_rate() {
                Some(rate) => println!("Offer rate:         {:.1}%", rate),
                None => println!("Offer rate:         -"),
            }
        }

        ReportCommands::Discovery => {
            println!("{:<10} {:>6}", "STATUS", "COUNT");
            println!("{}", "-".repeat(17));
            for (status, count) in reports::discovery_status(db)? {
                println!("{:<10} {:>6}", status, count);
            }
        }
    }
    Ok(())
}

fn run_discover(db: &Database, command: DiscoverCommands) -> Result<()> {
    match command {
        DiscoverCommands::Run { query } => {
            let search = SearchConfig::from_env()?;
            let provider = PerplexityProvider::new(&search)?;
            let query = query.unwrap_or(search.query);
            println!("Searching: {}", query);
            let report = discovery::discover(db, &provider, &query)?;
            println!("\nResults:");
            println!("  New postings: {}", report.inserted);
            println!("  Already known: {}", report.duplicates);
            if report.skipped > 0 {
                println!("  Skipped:      {}", report.skipped);
            }
            if report.inserted > 0 {
                println!("\nReview them with: cjobs discover review");
            }
        }

        DiscoverCommands::Review => {
            let pending = db.list_discovered_jobs(Some(DiscoveryStatus::Pending))?;
            if pending.is_empty() {
                println!("Nothing to review.");
            }
            for staged in &pending {
                println!(
                    "#{} {} - {}",
                    staged.id,
                    staged.title.as_deref().unwrap_or("[No Title]"),
                    staged.company_name.as_deref().unwrap_or(discovery::UNKNOWN_COMPANY)
                );
                println!("    {}", staged.url);
                if let Some(req) = &staged.requirements_raw {
                    println!("    {}", truncate(req, 100));
                }
            }
            if !pending.is_empty() {
                println!("\n{} pending. Use save, dismiss or promote with the ID.", pending.len());
            }
        }

        DiscoverCommands::List { status } => {
            let status = status.as_deref().map(str::parse::<DiscoveryStatus>).transpose()?;
            let rows = db.list_discovered_jobs(status)?;
            if rows.is_empty() {
                println!("No discovered jobs found.");
            } else {
                println!("{:<6} {:<10} {:<30} {:<20} {:<8}", "ID", "STATUS", "TITLE", "COMPANY", "JOB");
                println!("{}", "-".repeat(78));
                for staged in rows {
                    let job = staged
                        .promoted_to_job_id
                        .map_or_else(|| "-".to_string(), |id| format!("#{id}"));
                    println!(
                        "{:<6} {:<10} {:<30} {:<20} {:<8}",
                        staged.id,
                        staged.status,
                        truncate(or_dash(&staged.title), 28),
                        truncate(or_dash(&staged.company_name), 18),
                        job
                    );
                }
            }
        }

        DiscoverCommands::View { id, raw } => {
            let staged = db.get_discovered_job(id)?;
            println!("Discovered job #{}", staged.id);
            println!("Title: {}", or_dash(&staged.title));
            println!("Company: {}", or_dash(&staged.company_name));
            println!("URL: {}", staged.url);
            println!("Status: {}", staged.status);
            if let Some(job_id) = staged.promoted_to_job_id {
                println!("Promoted to: job #{}", job_id);
            }
            println!("Source: {}", or_dash(&staged.source));
            println!("Discovered: {}", staged.discovered_at);
            if let Some(req) = &staged.requirements_raw {
                println!("\n--- Requirements ---\n{}", textwrap::fill(req, 80));
            }
            if raw {
                if let Some(response) = &staged.raw_response {
                    println!("\n--- Raw Response ---\n{}", response);
                }
            }
        }

        DiscoverCommands::Save { id } => {
            discovery::mark(db, id, DiscoveryStatus::Saved)?;
            println!("Saved discovered job #{}.", id);
        }

        DiscoverCommands::Dismiss { id } => {
            discovery::mark(db, id, DiscoveryStatus::Dismissed)?;
            println!("Dismissed discovered job #{}.", id);
        }

        DiscoverCommands::Promote {
            id,
            remote,
            source,
            notes,
        } => {
            let outcome = discovery::promote(
                db,
                id,
                &PromoteOptions {
                    remote_status: remote,
                    source,
                    notes,
                },
            )?;
            if outcome.company_created {
                println!("Created company '{}' (ID: {})", outcome.company_name, outcome.company_id);
                if let Some(similar) = &outcome.similar_company {
                    println!("  Note: similar to existing company '{}'", similar);
                }
            }
            println!("Promoted discovered job #{} to job #{}", id, outcome.job_id);
        }
    }
    Ok(())
}

fn ensure_initialized(db: &Database) -> Result<()> {
    if !db.is_initialized()? {
        return Err(anyhow!("Database not initialized. Run 'cjobs init' first."));
    }
    Ok(())
}

/// Look a company up by numeric ID or exact name, suggesting a close name on a miss.
fn find_company(db: &Database, key: &str) -> Result<Company> {
    if let Ok(id) = key.parse::<i64>() {
        return Ok(db.get_company(id)?);
    }
    if let Some(company) = db.get_company_by_name(key.trim())? {
        return Ok(company);
    }
    let suggestion = db
        .list_companies()?
        .into_iter()
        .map(|c| (strsim::jaro_winkler(&c.name.to_lowercase(), &key.to_lowercase()), c.name))
        .filter(|(score, _)| *score >= 0.85)
        .max_by(|a, b| a.0.total_cmp(&b.0));
    match suggestion {
        Some((_, name)) => Err(anyhow!("Company '{}' not found. Did you mean '{}'?", key, name)),
        None => Err(anyhow!("Company '{}' not found.", key)),
    }
}

fn find_skill(db: &Database, name: &str) -> Result<models::Skill> {
    db.get_skill_by_name(name)?
        .ok_or_else(|| anyhow!("Skill '{}' not found. Add it with: cjobs skill add", name))
}

fn warn_if_unknown(kind: &str, value: &str, known: &[&str]) {
    if !known.contains(&value) {
        warn!("{} '{}' is not one of: {}", kind, value, known.join(", "));
    }
}

fn salary_short(min: Option<i64>, max: Option<i64>) -> String {
    match (min, max) {
        (Some(min), Some(max)) => format!("${}k-${}k", min / 1000, max / 1000),
        (Some(min), None) => format!("${}k+", min / 1000),
        (None, Some(max)) => format!("<${}k", max / 1000),
        (None, None) => "-".to_string(),
    }
}

fn or_dash(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("-")
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
