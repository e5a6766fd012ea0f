use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

pub const DEFAULT_QUERY: &str = "find crypto/web3 job postings that require or prefer SQL skills";
pub const DEFAULT_SEARCH_MODEL: &str = "sonar";
pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://api.perplexity.ai/chat/completions";
pub const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 60;

#[derive(Clone, Debug)]
pub struct SearchConfig {
    pub api_key: Option<String>,
    pub query: String,
    pub model: String,
    pub endpoint: String,
    pub timeout: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            query: DEFAULT_QUERY.to_string(),
            model: DEFAULT_SEARCH_MODEL.to_string(),
            endpoint: DEFAULT_SEARCH_ENDPOINT.to_string(),
            timeout: Duration::from_secs(DEFAULT_SEARCH_TIMEOUT_SECS),
        }
    }
}

impl SearchConfig {
    /// Read only by commands that search.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| non_blank(&lookup, key);

        let timeout_secs = match get("CJOBS_SEARCH_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .with_context(|| {
                    format!("CJOBS_SEARCH_TIMEOUT_SECS must be a positive integer, got '{raw}'")
                })?,
            None => DEFAULT_SEARCH_TIMEOUT_SECS,
        };

        Ok(Self {
            api_key: get("PERPLEXITY_API_KEY"),
            query: get("CJOBS_SEARCH_QUERY").unwrap_or_else(|| DEFAULT_QUERY.to_string()),
            model: get("CJOBS_SEARCH_MODEL").unwrap_or_else(|| DEFAULT_SEARCH_MODEL.to_string()),
            endpoint: get("CJOBS_SEARCH_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_SEARCH_ENDPOINT.to_string()),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub db_path: PathBuf,
}

impl Config {
    /// Read configuration from the process environment (after `.env` is loaded).
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let db_path = non_blank(&lookup, "CJOBS_DB")
            .map(PathBuf::from)
            .unwrap_or_else(default_db_path);
        Self { db_path }
    }
}

fn non_blank(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn default_db_path() -> PathBuf {
    // Use XDG data directory or fallback
    if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "cryptojobs") {
        proj_dirs.data_dir().join("crypto_jobs.db")
    } else {
        PathBuf::from("crypto_jobs.db")
    }
}
