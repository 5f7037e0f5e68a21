//! Detection job configuration.
//!
//! `recdupe run` executes an ordered list of jobs from a TOML file. Each
//! job is an independent rule set with its own input:
//!
//! ```toml
//! [defaults]
//! strategy = "highest"
//! output = "text"
//!
//! [[job]]
//! name = "accounts by email"
//! input = "accounts.csv"
//! match_fields = ["email"]
//! master_field = "score"
//!
//! [[job]]
//! input = "contacts.json"
//! match_fields = ["email", "zip"]
//! master_field = "updated_at"
//! strategy = "lowest"
//! output = "csv"
//! ```
//!
//! The file is merged with `RECDUPE_`-prefixed environment variables
//! (double underscore for nesting, e.g. `RECDUPE_DEFAULTS__STRATEGY`).
//! Every job is validated up front, before any input file is read.

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::cli::OutputFormat;
use crate::detect::{MasterRule, MatchingRule, RuleError, Strategy};

/// Errors raised while loading or validating a jobs file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file does not exist.
    #[error("config file '{path}' not found")]
    Missing {
        /// The path as given.
        path: String,
    },

    /// The config file could not be parsed or merged.
    #[error("failed to load config from '{path}': {source}")]
    Load {
        /// The path as given.
        path: String,
        /// The underlying figment failure.
        #[source]
        source: Box<figment::Error>,
    },

    /// The config declares no jobs at all.
    #[error("config declares no jobs (expected at least one [[job]] table)")]
    NoJobs,

    /// One job's rule set failed validation.
    #[error("job '{job}': {source}")]
    InvalidJob {
        /// The job's display name.
        job: String,
        /// The underlying rule failure.
        #[source]
        source: RuleError,
    },
}

/// Defaults applied to jobs that omit a setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDefaults {
    /// Strategy token for jobs without an explicit one.
    pub strategy: String,
    /// Output format for jobs without an explicit one.
    pub output: OutputFormat,
}

impl Default for JobDefaults {
    fn default() -> Self {
        Self {
            strategy: Strategy::Highest.as_str().to_string(),
            output: OutputFormat::Text,
        }
    }
}

/// One detection job: an input file plus a complete rule set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobConfig {
    /// Optional display name; reporting falls back to the input path.
    #[serde(default)]
    pub name: Option<String>,
    /// Input file (CSV or JSON).
    pub input: PathBuf,
    /// Fields used to detect duplicates, in order.
    pub match_fields: Vec<String>,
    /// Field used to select the master record.
    pub master_field: String,
    /// Strategy token; falls back to `[defaults]`.
    #[serde(default)]
    pub strategy: Option<String>,
    /// Output format; falls back to `[defaults]`.
    #[serde(default)]
    pub output: Option<OutputFormat>,
}

impl JobConfig {
    /// The job's name for logs and error messages.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.input.display().to_string())
    }

    /// Build the job's matching rule.
    ///
    /// # Errors
    ///
    /// Propagates [`RuleError`] for an empty or invalid field list.
    pub fn matching_rule(&self) -> Result<MatchingRule, RuleError> {
        MatchingRule::new(self.match_fields.iter().cloned())
    }

    /// Resolve the job's strategy against the defaults.
    ///
    /// # Errors
    ///
    /// Propagates [`RuleError::UnknownStrategy`] for a bad token.
    pub fn strategy(&self, defaults: &JobDefaults) -> Result<Strategy, RuleError> {
        self.strategy
            .as_deref()
            .unwrap_or(&defaults.strategy)
            .parse()
    }

    /// Build the job's master-selection rule.
    ///
    /// # Errors
    ///
    /// Propagates [`RuleError`] for a bad strategy token or empty field.
    pub fn master_rule(&self, defaults: &JobDefaults) -> Result<MasterRule, RuleError> {
        MasterRule::new(self.master_field.clone(), self.strategy(defaults)?)
    }

    /// Resolve the job's output format against the defaults.
    #[must_use]
    pub fn output(&self, defaults: &JobDefaults) -> OutputFormat {
        self.output.unwrap_or(defaults.output)
    }

    /// Check the whole rule set without building anything.
    ///
    /// # Errors
    ///
    /// The first [`RuleError`] found, if any.
    pub fn validate(&self, defaults: &JobDefaults) -> Result<(), RuleError> {
        self.matching_rule()?;
        self.master_rule(defaults)?;
        Ok(())
    }
}

/// The full jobs file: shared defaults plus jobs in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobsConfig {
    /// Defaults for settings individual jobs omit.
    #[serde(default)]
    pub defaults: JobDefaults,
    /// Jobs, run in declaration order.
    #[serde(rename = "job", default)]
    pub jobs: Vec<JobConfig>,
}

impl JobsConfig {
    /// Load and validate a jobs file, applying environment overrides.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] for a missing file, a parse/merge failure, an
    /// empty job list, or an invalid job.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::Missing {
                path: path.display().to_string(),
            });
        }

        let figment = Figment::from(Serialized::defaults(JobsConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("RECDUPE_").split("__"));

        let config: JobsConfig = figment.extract().map_err(|source| ConfigError::Load {
            path: path.display().to_string(),
            source: Box::new(source),
        })?;
        config.validate()?;

        log::debug!(
            "loaded {} job(s) from {}",
            config.jobs.len(),
            path.display()
        );
        Ok(config)
    }

    /// Validate every job against the defaults, fail-fast.
    ///
    /// # Errors
    ///
    /// [`ConfigError::NoJobs`] for an empty job list, otherwise the first
    /// invalid job as [`ConfigError::InvalidJob`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jobs.is_empty() {
            return Err(ConfigError::NoJobs);
        }
        for job in &self.jobs {
            job.validate(&self.defaults)
                .map_err(|source| ConfigError::InvalidJob {
                    job: job.display_name(),
                    source,
                })?;
        }
        Ok(())
    }
}
