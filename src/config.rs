use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use validator::Validate;

use crate::error::Result;
use crate::processors::DuplicatePolicy;
use crate::readers::RetryPolicy;
use crate::utils::constants::{
    AQS_BASE_URL, DEFAULT_MAX_CONCURRENT_REQUESTS, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_RETRY_ATTEMPTS,
    DEFAULT_RETRY_BACKOFF_MS,
};

/// Settings file looked up in the working directory when no path is given.
pub const DEFAULT_SETTINGS_FILE: &str = "aqs-pipeline.toml";

/// Environment variable prefix, e.g. `AQS_EMAIL`.
pub const ENV_PREFIX: &str = "AQS";

/// Runtime settings: defaults, then the TOML file, then `AQS_*` variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Settings {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 1))]
    pub key: String,

    #[validate(url)]
    pub base_url: String,

    #[validate(range(min = 1, max = 64))]
    pub max_concurrent_requests: usize,

    #[validate(range(min = 1))]
    pub request_timeout_secs: u64,

    #[validate(range(max = 10))]
    pub retry_attempts: u32,

    pub retry_backoff_ms: u64,

    pub duplicate_policy: DuplicatePolicy,
}

impl Settings {
    /// Load and validate. A missing settings file is fine; a malformed one
    /// is not.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, Environment::with_prefix(ENV_PREFIX).try_parsing(true))
    }

    fn load_with_env(path: Option<&Path>, environment: Environment) -> Result<Self> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(DEFAULT_SETTINGS_FILE).required(false),
        };

        let settings: Settings = Config::builder()
            .set_default("email", "")?
            .set_default("key", "")?
            .set_default("base_url", AQS_BASE_URL)?
            .set_default("max_concurrent_requests", DEFAULT_MAX_CONCURRENT_REQUESTS as u64)?
            .set_default("request_timeout_secs", DEFAULT_REQUEST_TIMEOUT_SECS)?
            .set_default("retry_attempts", DEFAULT_RETRY_ATTEMPTS as u64)?
            .set_default("retry_backoff_ms", DEFAULT_RETRY_BACKOFF_MS)?
            .set_default("duplicate_policy", DuplicatePolicy::default().to_string())?
            .add_source(file)
            .add_source(environment)
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_attempts, Duration::from_millis(self.retry_backoff_ms))
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            email: String::new(),
            key: String::new(),
            base_url: AQS_BASE_URL.to_string(),
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
            duplicate_policy: DuplicatePolicy::default(),
        }
    }
}
