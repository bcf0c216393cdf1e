//! Environment variable overrides for configuration.

use std::env;

use super::Config;
use crate::error::ConfigError;

impl Config {
    /// Environment variables use the `ENRICH_` prefix with double
    /// underscores separating nested keys (e.g. `ENRICH_LLM_EXTRACTOR__MODEL_ID`).
    pub(super) fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = env::var("ENRICH_CLASSIFICATION__INTERNAL_DOMAINS") {
            self.classification.internal_domains = split_csv(&val);
        }

        if let Ok(val) = env::var("ENRICH_LINK_EXTRACTOR__EXTRACT_FROM_SIGNATURES") {
            self.link_extractor.extract_from_signatures =
                parse_env_bool("ENRICH_LINK_EXTRACTOR__EXTRACT_FROM_SIGNATURES", &val)?;
        }
        if let Ok(val) = env::var("ENRICH_LINK_EXTRACTOR__CONTEXT_CHARS") {
            self.link_extractor.context_chars =
                parse_env_usize("ENRICH_LINK_EXTRACTOR__CONTEXT_CHARS", &val)?;
        }

        if let Ok(val) = env::var("ENRICH_THREAD_GROUPER__FALLBACK_TO_SUBJECT") {
            self.thread_grouper.fallback_to_subject =
                parse_env_bool("ENRICH_THREAD_GROUPER__FALLBACK_TO_SUBJECT", &val)?;
        }
        if let Ok(val) = env::var("ENRICH_THREAD_GROUPER__SUBJECT_TIME_WINDOW_HOURS") {
            self.thread_grouper.subject_time_window_hours =
                parse_env_u32("ENRICH_THREAD_GROUPER__SUBJECT_TIME_WINDOW_HOURS", &val)?;
        }

        if let Ok(val) = env::var("ENRICH_CONTEXT_BUILDER__MAX_PARTICIPANTS") {
            self.context_builder.max_participants =
                parse_env_usize("ENRICH_CONTEXT_BUILDER__MAX_PARTICIPANTS", &val)?;
        }
        if let Ok(val) = env::var("ENRICH_CONTEXT_BUILDER__MAX_PRIOR_MESSAGES") {
            self.context_builder.max_prior_messages =
                parse_env_usize("ENRICH_CONTEXT_BUILDER__MAX_PRIOR_MESSAGES", &val)?;
        }
        if let Ok(val) = env::var("ENRICH_CONTEXT_BUILDER__MAX_PRIOR_DECISIONS") {
            self.context_builder.max_prior_decisions =
                parse_env_usize("ENRICH_CONTEXT_BUILDER__MAX_PRIOR_DECISIONS", &val)?;
        }
        if let Ok(val) = env::var("ENRICH_CONTEXT_BUILDER__MAX_TICKETS") {
            self.context_builder.max_tickets =
                parse_env_usize("ENRICH_CONTEXT_BUILDER__MAX_TICKETS", &val)?;
        }
        if let Ok(val) = env::var("ENRICH_CONTEXT_BUILDER__MESSAGE_PREVIEW_LEN") {
            self.context_builder.message_preview_len =
                parse_env_usize("ENRICH_CONTEXT_BUILDER__MESSAGE_PREVIEW_LEN", &val)?;
        }
        if let Ok(val) = env::var("ENRICH_CONTEXT_BUILDER__FULL_TOKEN_BUDGET") {
            self.context_builder.full_token_budget =
                parse_env_u32("ENRICH_CONTEXT_BUILDER__FULL_TOKEN_BUDGET", &val)?;
        }
        if let Ok(val) = env::var("ENRICH_CONTEXT_BUILDER__STANDARD_TOKEN_BUDGET") {
            self.context_builder.standard_token_budget =
                parse_env_u32("ENRICH_CONTEXT_BUILDER__STANDARD_TOKEN_BUDGET", &val)?;
        }
        if let Ok(val) = env::var("ENRICH_CONTEXT_BUILDER__MINIMAL_TOKEN_BUDGET") {
            self.context_builder.minimal_token_budget =
                parse_env_u32("ENRICH_CONTEXT_BUILDER__MINIMAL_TOKEN_BUDGET", &val)?;
        }

        if let Ok(val) = env::var("ENRICH_LLM_EXTRACTOR__MODEL_ID") {
            self.llm_extractor.model_id = val;
        }
        if let Ok(val) = env::var("ENRICH_LLM_EXTRACTOR__MODEL_VERSION") {
            self.llm_extractor.model_version = val;
        }
        if let Ok(val) = env::var("ENRICH_LLM_EXTRACTOR__MAX_TOKENS") {
            self.llm_extractor.max_tokens = parse_env_u32("ENRICH_LLM_EXTRACTOR__MAX_TOKENS", &val)?;
        }
        if let Ok(val) = env::var("ENRICH_LLM_EXTRACTOR__TEMPERATURE") {
            self.llm_extractor.temperature = parse_env_f32("ENRICH_LLM_EXTRACTOR__TEMPERATURE", &val)?;
        }
        if let Ok(val) = env::var("ENRICH_LLM_EXTRACTOR__TIMEOUT_MS") {
            self.llm_extractor.timeout_ms = parse_env_u64("ENRICH_LLM_EXTRACTOR__TIMEOUT_MS", &val)?;
        }

        if let Ok(val) = env::var("ENRICH_STORAGE__DB_PATH") {
            self.storage.db_path = val;
        }

        Ok(())
    }
}

/// Split a comma-separated string into trimmed, non-empty values.
pub(super) fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

pub(super) fn parse_env_u32(var_name: &str, val: &str) -> Result<u32, ConfigError> {
    val.parse::<u32>().map_err(|_| ConfigError::InvalidValue {
        field: var_name.to_string(),
        message: format!("'{val}' is not a valid u32"),
    })
}

pub(super) fn parse_env_u64(var_name: &str, val: &str) -> Result<u64, ConfigError> {
    val.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
        field: var_name.to_string(),
        message: format!("'{val}' is not a valid u64"),
    })
}

pub(super) fn parse_env_usize(var_name: &str, val: &str) -> Result<usize, ConfigError> {
    val.parse::<usize>().map_err(|_| ConfigError::InvalidValue {
        field: var_name.to_string(),
        message: format!("'{val}' is not a valid usize"),
    })
}

pub(super) fn parse_env_f32(var_name: &str, val: &str) -> Result<f32, ConfigError> {
    val.parse::<f32>().map_err(|_| ConfigError::InvalidValue {
        field: var_name.to_string(),
        message: format!("'{val}' is not a valid f32"),
    })
}

pub(super) fn parse_env_bool(var_name: &str, val: &str) -> Result<bool, ConfigError> {
    match val.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            field: var_name.to_string(),
            message: format!("'{val}' is not a valid boolean (use true/false/1/0/yes/no)"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_var_override_string() {
        env::set_var("ENRICH_LLM_EXTRACTOR__MODEL_ID", "claude-opus-4");
        let mut config = Config::default();
        config.apply_env_overrides().expect("env override");
        assert_eq!(config.llm_extractor.model_id, "claude-opus-4");
        env::remove_var("ENRICH_LLM_EXTRACTOR__MODEL_ID");
    }

    #[test]
    fn env_var_override_numeric() {
        env::set_var("ENRICH_LLM_EXTRACTOR__MAX_TOKENS", "4096");
        let mut config = Config::default();
        config.apply_env_overrides().expect("env override");
        assert_eq!(config.llm_extractor.max_tokens, 4096);
        env::remove_var("ENRICH_LLM_EXTRACTOR__MAX_TOKENS");
    }

    #[test]
    fn env_var_override_csv() {
        env::set_var("ENRICH_CLASSIFICATION__INTERNAL_DOMAINS", "acme.com, example.org");
        let mut config = Config::default();
        config.apply_env_overrides().expect("env override");
        assert_eq!(
            config.classification.internal_domains,
            vec!["acme.com", "example.org"]
        );
        env::remove_var("ENRICH_CLASSIFICATION__INTERNAL_DOMAINS");
    }

    #[test]
    fn env_var_invalid_numeric_returns_error() {
        let result = parse_env_u32("ENRICH_LLM_EXTRACTOR__MAX_TOKENS", "not_a_number");
        assert!(result.is_err());
    }

    #[test]
    fn split_csv_trims_and_filters() {
        assert_eq!(split_csv("  a , b ,, c  "), vec!["a", "b", "c"]);
    }
}
