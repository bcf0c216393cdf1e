//! Configuration management for the enrichment pipeline.
//!
//! Supports three-layer configuration loading:
//! 1. Built-in defaults
//! 2. TOML config file (`~/.enrich/config.toml`)
//! 3. Environment variable overrides (`ENRICH_` prefix)

mod defaults;
mod env_overrides;
mod validation;

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level configuration for the enrichment pipeline.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Stage-1 classification settings.
    #[serde(default)]
    pub classification: ClassificationConfig,

    /// Stage-2 link extractor settings.
    #[serde(default)]
    pub link_extractor: LinkExtractorConfig,

    /// Stage-2 thread grouper settings.
    #[serde(default)]
    pub thread_grouper: ThreadGrouperConfig,

    /// Stage-5 context builder budgets.
    #[serde(default)]
    pub context_builder: ContextBuilderConfig,

    /// Stage-5 LLM extractor settings.
    #[serde(default)]
    pub llm_extractor: LlmExtractorSettings,

    /// Stage-3/4 pipeline wiring: subtype ownership and profile behavior,
    /// validated against the live `ProcessorRegistry` at startup.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Data storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Stage-1 classifier settings (spec.md §4.1).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClassificationConfig {
    /// Email domains treated as internal when resolving participants.
    #[serde(default)]
    pub internal_domains: Vec<String>,
}

/// Stage-2 link extractor settings (spec.md §4.2).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LinkExtractorConfig {
    /// Whether links appearing only in a signature block still count.
    #[serde(default = "defaults::default_extract_from_signatures")]
    pub extract_from_signatures: bool,

    /// Characters of surrounding text captured as `ExtractedLink::context`.
    #[serde(default = "defaults::default_context_chars")]
    pub context_chars: usize,
}

/// Stage-2 thread grouper settings (spec.md §4.2).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ThreadGrouperConfig {
    /// Fall back to normalized-subject matching when no `In-Reply-To`/
    /// `References` header resolves a thread.
    #[serde(default = "defaults::default_fallback_to_subject")]
    pub fallback_to_subject: bool,

    /// Subject-fallback messages must land within this many hours of each
    /// other to be grouped into the same thread.
    #[serde(default = "defaults::default_subject_time_window_hours")]
    pub subject_time_window_hours: u32,
}

/// Stage-5 context assembly budgets (spec.md §4.5 step 2-3).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContextBuilderConfig {
    #[serde(default = "defaults::default_max_participants")]
    pub max_participants: usize,
    #[serde(default = "defaults::default_max_prior_messages")]
    pub max_prior_messages: usize,
    #[serde(default = "defaults::default_max_prior_decisions")]
    pub max_prior_decisions: usize,
    #[serde(default = "defaults::default_max_tickets")]
    pub max_tickets: usize,
    #[serde(default = "defaults::default_message_preview_len")]
    pub message_preview_len: usize,
    #[serde(default = "defaults::default_full_token_budget")]
    pub full_token_budget: u32,
    #[serde(default = "defaults::default_standard_token_budget")]
    pub standard_token_budget: u32,
    #[serde(default = "defaults::default_minimal_token_budget")]
    pub minimal_token_budget: u32,
}

/// Stage-5 LLM extractor settings (spec.md §4.5 step 6).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmExtractorSettings {
    #[serde(default = "defaults::default_model_id")]
    pub model_id: String,
    #[serde(default = "defaults::default_model_version")]
    pub model_version: String,
    #[serde(default = "defaults::default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "defaults::default_temperature")]
    pub temperature: f32,
    #[serde(default = "defaults::default_timeout_ms")]
    pub timeout_ms: u64,
}

impl From<&LlmExtractorSettings> for crate::ai::LlmExtractorConfig {
    fn from(settings: &LlmExtractorSettings) -> Self {
        crate::ai::LlmExtractorConfig {
            model_id: settings.model_id.clone(),
            model_version: settings.model_version.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            timeout_ms: settings.timeout_ms,
        }
    }
}

/// Expected profile behavior, validated against `ai::router::route` at
/// startup rather than driving it directly (the router's skip/call mapping
/// is a pure function of `ProcessingProfile`, not runtime-configurable).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProfileExpectation {
    pub skip_ai: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Stage-3/4 wiring expectations, cross-checked against the live
/// `ProcessorRegistry` and `ai::router` by `validate_against_registry`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// subtype -> expected stage-3 processor name.
    #[serde(default)]
    pub subtype_processors: HashMap<String, String>,
    /// profile name (`ProcessingProfile::as_str`) -> expected routing behavior.
    #[serde(default)]
    pub profiles: HashMap<String, ProfileExpectation>,
}

/// Data storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "defaults::default_db_path")]
    pub db_path: String,
}

impl Config {
    /// Load configuration from a TOML file with environment variable
    /// overrides.
    ///
    /// 1. Determine config file path (argument > `ENRICH_CONFIG` env var > default)
    /// 2. Parse TOML file (or use defaults if the default path doesn't exist)
    /// 3. Apply environment variable overrides
    pub fn load(config_path: Option<&str>) -> Result<Config, ConfigError> {
        let (path, explicit) = Self::resolve_config_path(config_path);

        let mut config = match std::fs::read_to_string(&path) {
            Ok(contents) => toml::from_str::<Config>(&contents)
                .map_err(|e| ConfigError::ParseError { source: e })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if explicit {
                    return Err(ConfigError::FileNotFound {
                        path: path.display().to_string(),
                    });
                }
                Config::default()
            }
            Err(_) => {
                return Err(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                });
            }
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    pub fn load_and_validate(config_path: Option<&str>) -> Result<Config, Vec<ConfigError>> {
        let config = Config::load(config_path).map_err(|e| vec![e])?;
        config.validate()?;
        Ok(config)
    }

    fn resolve_config_path(config_path: Option<&str>) -> (PathBuf, bool) {
        if let Some(path) = config_path {
            return (expand_tilde(path), true);
        }
        if let Ok(env_path) = env::var("ENRICH_CONFIG") {
            return (expand_tilde(&env_path), true);
        }
        (expand_tilde("~/.enrich/config.toml"), false)
    }
}

/// Expand `~` at the start of a path to the user's home directory.
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    } else if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_sections_use_defaults() {
        let toml_str = r#"
[classification]
internal_domains = ["acme.com"]
"#;
        let config: Config = toml::from_str(toml_str).expect("valid TOML");
        assert_eq!(config.classification.internal_domains, vec!["acme.com"]);
        assert!(config.link_extractor.extract_from_signatures);
        assert_eq!(config.context_builder.full_token_budget, 500);
        assert_eq!(config.llm_extractor.model_id, "claude-sonnet-4-5");
    }

    #[test]
    fn config_file_not_found_explicit_path() {
        let result = Config::load(Some("/nonexistent/path/config.toml"));
        assert!(result.is_err());
        match result.unwrap_err() {
            ConfigError::FileNotFound { path } => {
                assert_eq!(path, "/nonexistent/path/config.toml");
            }
            other => panic!("expected FileNotFound, got: {other}"),
        }
    }

    #[test]
    fn expand_tilde_works() {
        let expanded = expand_tilde("~/.enrich/config.toml");
        assert!(!expanded.to_string_lossy().starts_with('~'));
    }
}
