//! Typed configuration.
//!
//! Values are read once at startup from, in increasing precedence: built-in
//! defaults, an optional YAML file, `NOVA_REGISTRAR_*` environment variables
//! (nested keys separated by `__`, e.g. `NOVA_REGISTRAR_RETRY__MAX_RETRIES`),
//! and command-line overrides. [`RegistrarConfig::validate`] turns the raw
//! values into immutable [`RegistrarSettings`].

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Yaml},
};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::observability::LogFormat;
use crate::registration::domain::{
    AttributeSchema, PolicyError, RegistrationProfile, RetryPolicy, SchemaError,
    default_entity_attributes,
};

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "NOVA_REGISTRAR_";

/// Topic carrying nova notifications.
pub const DEFAULT_TOPIC: &str = "notifications.info";

/// Raw configuration as read from its sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrarConfig {
    /// Context broker endpoint receiving registrations.
    pub broker_url: String,
    /// Providing application declared in registrations.
    pub register_app_url: String,
    /// Registration duration (ISO 8601).
    pub register_duration: String,
    /// Attributes declared per entity type.
    pub register_attributes: BTreeMap<String, Vec<String>>,
    /// Retry policy.
    pub retry: RetryConfig,
    /// Whether 5xx answers consume a retry.
    pub retry_server_errors: bool,
    /// Bus topic to consume.
    pub topic: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Time granted to in-flight tasks at shutdown, in seconds.
    pub shutdown_grace_secs: u64,
    /// Logging options.
    pub log: LogConfig,
}

impl Default for RegistrarConfig {
    fn default() -> Self {
        Self {
            broker_url: "http://127.0.0.1:1338/".to_owned(),
            register_app_url: "http://fiware/vm/".to_owned(),
            register_duration: "P99Y".to_owned(),
            register_attributes: default_entity_attributes(),
            retry: RetryConfig::default(),
            retry_server_errors: false,
            topic: DEFAULT_TOPIC.to_owned(),
            request_timeout_secs: 30,
            shutdown_grace_secs: 10,
            log: LogConfig::default(),
        }
    }
}

/// Raw retry policy values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Exponential growth factor.
    pub factor: u32,
    /// Whether delays get a random multiplier in `[1, 2]`.
    pub randomize: bool,
    /// Delay before the first retry, in seconds.
    pub min_delay_secs: u64,
    /// Upper bound of any delay, in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_retries: policy.max_retries(),
            factor: policy.factor(),
            randomize: policy.randomize(),
            min_delay_secs: policy.min_delay().as_secs(),
            max_delay_secs: policy.max_delay().as_secs(),
        }
    }
}

/// Logging options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter directive, e.g. `info` or `nova_registrar=debug`.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: LogFormat::default(),
        }
    }
}

/// Command-line values that take precedence over every other source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    /// Context broker endpoint.
    pub broker_url: Option<String>,
    /// Log filter directive.
    pub log_level: Option<String>,
    /// Log output format.
    pub log_format: Option<LogFormat>,
}

/// Validated, immutable settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrarSettings {
    /// Context broker endpoint.
    pub broker_url: String,
    /// Registration contents shared by every task.
    pub profile: RegistrationProfile,
    /// Retry policy shared by every task.
    pub policy: RetryPolicy,
    /// Whether 5xx answers consume a retry.
    pub retry_server_errors: bool,
    /// Bus topic to consume.
    pub topic: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Time granted to in-flight tasks at shutdown.
    pub shutdown_grace: Duration,
    /// Logging options.
    pub log: LogConfig,
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file passed explicitly does not exist.
    #[error("configuration file {} does not exist", .0.display())]
    MissingFile(PathBuf),

    /// A source could not be read or does not match the expected shape.
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    /// A URL setting cannot be parsed or uses an unsupported scheme.
    #[error("invalid {field} '{value}': {reason}")]
    InvalidUrl {
        /// Setting name.
        field: &'static str,
        /// Offending value.
        value: String,
        /// Parser diagnostic.
        reason: String,
    },

    /// A mandatory text setting is empty.
    #[error("{0} must not be empty")]
    Empty(&'static str),

    /// The request timeout is zero.
    #[error("request_timeout_secs must be greater than zero")]
    ZeroTimeout,

    /// The attribute schema is invalid.
    #[error("invalid register_attributes: {0}")]
    Schema(#[from] SchemaError),

    /// The retry policy is invalid.
    #[error("invalid retry policy: {0}")]
    Policy(#[from] PolicyError),
}

impl RegistrarConfig {
    /// Returns the layered configuration sources.
    #[must_use]
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(config_path) = path {
            figment = figment.merge(Yaml::file(config_path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Loads configuration from defaults, `path`, and the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `path` is missing or a source is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, &ConfigOverrides::default())
    }

    /// Loads configuration and applies command-line overrides last.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `path` is missing or a source is invalid.
    pub fn load_with(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        if let Some(config_path) = path
            && !config_path.is_file()
        {
            return Err(ConfigError::MissingFile(config_path.to_path_buf()));
        }

        let mut figment = Self::figment(path);
        if let Some(broker_url) = &overrides.broker_url {
            figment = figment.merge(Serialized::default("broker_url", broker_url));
        }
        if let Some(level) = &overrides.log_level {
            figment = figment.merge(Serialized::default("log.level", level));
        }
        if let Some(format) = overrides.log_format {
            figment = figment.merge(Serialized::default("log.format", format));
        }
        figment.extract().map_err(|err| ConfigError::Load(Box::new(err)))
    }

    /// Validates the raw values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] describing the first invalid setting.
    pub fn validate(&self) -> Result<RegistrarSettings, ConfigError> {
        let broker_url = parse_http_url("broker_url", &self.broker_url)?;
        parse_http_url("register_app_url", &self.register_app_url)?;

        let duration = self.register_duration.trim();
        if duration.is_empty() {
            return Err(ConfigError::Empty("register_duration"));
        }
        let topic = self.topic.trim();
        if topic.is_empty() {
            return Err(ConfigError::Empty("topic"));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        let schema = AttributeSchema::new(self.register_attributes.clone())?;
        let policy = RetryPolicy::new(
            self.retry.max_retries,
            self.retry.factor,
            self.retry.min_delay_secs,
            self.retry.max_delay_secs,
        )?
        .with_randomization(self.retry.randomize);

        Ok(RegistrarSettings {
            broker_url,
            profile: RegistrationProfile::new(self.register_app_url.trim(), duration, schema),
            policy,
            retry_server_errors: self.retry_server_errors,
            topic: topic.to_owned(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            shutdown_grace: Duration::from_secs(self.shutdown_grace_secs),
            log: self.log.clone(),
        })
    }
}

fn parse_http_url(field: &'static str, value: &str) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    let url = Url::parse(trimmed).map_err(|err| ConfigError::InvalidUrl {
        field,
        value: value.to_owned(),
        reason: err.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl {
            field,
            value: value.to_owned(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }
    Ok(trimmed.to_owned())
}
