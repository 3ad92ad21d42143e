use crate::error::{Error, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://americas.api.riotgames.com";
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct Settings {
    pub riot_api_key: String,
    pub base_url: String,
    pub data_dir: PathBuf,
    pub request_timeout: Duration,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup so tests don't touch the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let riot_api_key = lookup("RIOT_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| Error::Config("RIOT_API_KEY is not set".to_string()))?;

        let base_url = lookup("TFT_API_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let data_dir = lookup("TFT_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        let timeout_secs = match lookup("TFT_REQUEST_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                Error::Config(format!(
                    "TFT_REQUEST_TIMEOUT_SECS must be a whole number of seconds, got '{raw}'"
                ))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            riot_api_key,
            base_url,
            data_dir,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }

    pub fn with_data_dir(mut self, data_dir: PathBuf) -> Self {
        self.data_dir = data_dir;
        self
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("data.db")
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.data_dir.join("cache")
    }
}
