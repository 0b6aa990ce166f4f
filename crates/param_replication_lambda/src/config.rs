use param_replication_core::completion::ErrorPolicy;
use thiserror::Error;

use crate::logging::LogFormat;

pub const TARGET_REGION_VAR: &str = "AWS_TARGET_REGION";
pub const SOURCE_REGION_VAR: &str = "REPLICATION_SOURCE_REGION";
pub const ERROR_POLICY_VAR: &str = "REPLICATION_ERROR_POLICY";
pub const LOG_FORMAT_VAR: &str = "REPLICATION_LOG_FORMAT";

/// Fallbacks for the source region, in lookup order. Lambda sets both.
const SOURCE_REGION_FALLBACK_VARS: [&str; 2] = ["AWS_DEFAULT_REGION", "AWS_REGION"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be configured")]
    Missing(&'static str),

    #[error("source region is not configured (set REPLICATION_SOURCE_REGION, AWS_DEFAULT_REGION or AWS_REGION)")]
    MissingSourceRegion,

    #[error("invalid {var}: {message}")]
    Invalid { var: &'static str, message: String },
}

/// Settings read once at cold start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicatorConfig {
    pub source_region: String,
    pub target_region: String,
    pub error_policy: ErrorPolicy,
    pub log_format: LogFormat,
}

impl ReplicatorConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let target_region =
            non_empty(TARGET_REGION_VAR).ok_or(ConfigError::Missing(TARGET_REGION_VAR))?;

        let source_region = std::iter::once(SOURCE_REGION_VAR)
            .chain(SOURCE_REGION_FALLBACK_VARS)
            .find_map(&non_empty)
            .ok_or(ConfigError::MissingSourceRegion)?;

        let error_policy = match non_empty(ERROR_POLICY_VAR) {
            Some(raw) => raw.parse::<ErrorPolicy>().map_err(|message| ConfigError::Invalid {
                var: ERROR_POLICY_VAR,
                message,
            })?,
            None => ErrorPolicy::default(),
        };

        let log_format = match non_empty(LOG_FORMAT_VAR) {
            Some(raw) => raw.parse::<LogFormat>().map_err(|message| ConfigError::Invalid {
                var: LOG_FORMAT_VAR,
                message,
            })?,
            None => LogFormat::default(),
        };

        Ok(Self {
            source_region,
            target_region,
            error_policy,
            log_format,
        })
    }

    pub fn same_region(&self) -> bool {
        self.source_region == self.target_region
    }
}
