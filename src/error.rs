use rusqlite::ErrorCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TrackerError>;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("{entity} #{id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("discovered job #{id} is {from}; cannot move it to {to}")]
    InvalidTransition {
        id: i64,
        from: String,
        to: String,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("search unavailable: {0}")]
    SearchUnavailable(String),

    #[error("storage error: {0}")]
    Storage(rusqlite::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl TrackerError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

// Uniqueness and foreign-key failures surface as ConstraintViolation; everything
// else from SQLite is a storage fault.
impl From<rusqlite::Error> for TrackerError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, msg) if e.code == ErrorCode::ConstraintViolation => {
                let detail = msg.clone().unwrap_or_else(|| e.to_string());
                TrackerError::ConstraintViolation(detail)
            }
            _ => TrackerError::Storage(err),
        }
    }
}
