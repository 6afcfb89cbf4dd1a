//! Configuration System
//!
//! Hierarchical configuration loading from:
//! - config.toml (base configuration)
//! - config.local.toml (git-ignored local overrides)
//! - Environment variables (`TOPICMATCH_*` prefix, `__` as nesting separator)
//!
//! ## Example
//!
//! ```toml
//! # config.toml
//! [matching]
//! strict_preference_count = true
//! retry_on_eviction = false
//!
//! [programs]
//! # alias = canonical tag
//! prefixes = { DBA = "BDBA" }
//!
//! [report]
//! format = "json"
//! ```
//!
//! Environment variable overrides:
//! ```bash
//! TOPICMATCH_MATCHING__STRICT_PREFERENCE_COUNT=true
//! TOPICMATCH_LOGGING__LEVEL=debug
//! ```

use crate::engine::MatchOptions;
use crate::programs::ProgramTable;
use crate::validate::ValidationOptions;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub programs: ProgramsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

/// Matching behavior switches.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Require exactly 5 preferences per student instead of accepting 1 to 5.
    #[serde(default)]
    pub strict_preference_count: bool,

    /// Non-default mode: let an evicted student retry the topic it was just
    /// displaced from. The default rule advances cursors monotonically and
    /// never retries a used preference.
    #[serde(default)]
    pub retry_on_eviction: bool,
}

/// Bachelor-program inference table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgramsConfig {
    /// Extra alias-to-canonical-tag mappings applied when inferring a
    /// student's program from its id prefix and when reading supervisor
    /// entries. `_` and `+` are interchangeable in both sides.
    #[serde(default)]
    pub prefixes: BTreeMap<String, String>,
}

/// Logging configuration (consumed by the CLI; the library only emits).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: "text" or "json".
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Report output configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub format: ReportFormat,
}

/// Rendering of the output report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Human-readable tables.
    #[default]
    Text,
    /// The full structured payload.
    Json,
    /// Assignment table only, for spreadsheet import.
    Csv,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// Merges in order:
    /// 1. config.toml (base configuration)
    /// 2. config.local.toml (local overrides, git-ignored)
    /// 3. Environment variables (`TOPICMATCH_*` prefix)
    pub fn load() -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file("config.toml"))
            .merge(Toml::file("config.local.toml"))
            .merge(Env::prefixed("TOPICMATCH_").split("__"))
            .extract()
    }

    /// Load configuration from a specific file path.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("TOPICMATCH_").split("__"))
            .extract()
    }

    /// The validation switches this configuration selects.
    pub fn validation_options(&self) -> ValidationOptions {
        ValidationOptions {
            strict_preference_count: self.matching.strict_preference_count,
        }
    }

    /// The engine switches this configuration selects.
    pub fn match_options(&self) -> MatchOptions {
        MatchOptions {
            retry_on_eviction: self.matching.retry_on_eviction,
        }
    }

    /// The program inference table this configuration selects.
    pub fn program_table(&self) -> ProgramTable {
        ProgramTable::with_aliases(&self.programs.prefixes)
    }
}
