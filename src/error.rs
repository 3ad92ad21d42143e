use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Player not found: {game_name}#{tag_line}")]
    IdentityNotFound { game_name: String, tag_line: String },

    #[error("Remote error on {endpoint}{}: {message}", status_suffix(.status))]
    Remote {
        endpoint: String,
        status: Option<u16>,
        message: String,
    },

    #[error("Cache corrupted: match {match_id} is indexed at '{locator}' but the payload cannot be loaded")]
    CacheCorruption { match_id: String, locator: String },

    #[error("Failed to persist payload at '{locator}': {reason}")]
    WriteFailure { locator: String, reason: String },

    #[error("No participant {account_id} in match {match_id}")]
    ParticipantNotFound { account_id: String, match_id: String },

    #[error("Cached payload not found: {0}")]
    BlobNotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, Error>;

pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const INVALID_ARGUMENTS: i32 = 2;
    pub const PLAYER_NOT_FOUND: i32 = 3;
    pub const REMOTE_ERROR: i32 = 4;
    pub const CACHE_ERROR: i32 = 5;
}

impl Error {
    pub fn remote(endpoint: &str, status: Option<u16>, message: impl Into<String>) -> Self {
        Error::Remote {
            endpoint: endpoint.to_string(),
            status,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Error::IdentityNotFound { .. } => exit_code::PLAYER_NOT_FOUND,
            Error::Remote { .. } => exit_code::REMOTE_ERROR,
            Error::CacheCorruption { .. }
            | Error::WriteFailure { .. }
            | Error::BlobNotFound(_)
            | Error::Database(_) => exit_code::CACHE_ERROR,
            Error::InvalidArgument(_) | Error::Config(_) => exit_code::INVALID_ARGUMENTS,
            _ => exit_code::GENERAL_ERROR,
        }
    }
}
