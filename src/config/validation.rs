//! Config validation, separate from loading/parsing so callers can choose
//! `Config::load` (lenient) or `Config::load_and_validate` (strict).

use crate::error::ConfigError;
use crate::model::ProcessingProfile;
use crate::registry::ProcessorRegistry;

use super::Config;

const ALL_PROFILES: [ProcessingProfile; 6] = [
    ProcessingProfile::FullAi,
    ProcessingProfile::FullAiChunked,
    ProcessingProfile::MetadataOnly,
    ProcessingProfile::StateTracking,
    ProcessingProfile::StructureOnly,
    ProcessingProfile::OcrIfText,
];

impl Config {
    /// Structural checks that don't require a live `ProcessorRegistry`.
    /// Accumulates every violation rather than stopping at the first.
    pub fn validate(&self) -> Result<(), Vec<ConfigError>> {
        let mut errors = Vec::new();

        if self.llm_extractor.max_tokens == 0 {
            errors.push(ConfigError::InvalidValue {
                field: "llm_extractor.max_tokens".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if !(0.0..=2.0).contains(&self.llm_extractor.temperature) {
            errors.push(ConfigError::InvalidValue {
                field: "llm_extractor.temperature".to_string(),
                message: "must be between 0.0 and 2.0".to_string(),
            });
        }
        if self.llm_extractor.timeout_ms == 0 {
            errors.push(ConfigError::InvalidValue {
                field: "llm_extractor.timeout_ms".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if self.llm_extractor.model_id.trim().is_empty() {
            errors.push(ConfigError::MissingField {
                field: "llm_extractor.model_id".to_string(),
            });
        }

        if self.context_builder.max_participants == 0 {
            errors.push(ConfigError::InvalidValue {
                field: "context_builder.max_participants".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if self.context_builder.message_preview_len == 0 {
            errors.push(ConfigError::InvalidValue {
                field: "context_builder.message_preview_len".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        for (field, value) in [
            ("full_token_budget", self.context_builder.full_token_budget),
            ("standard_token_budget", self.context_builder.standard_token_budget),
            ("minimal_token_budget", self.context_builder.minimal_token_budget),
        ] {
            if value == 0 {
                errors.push(ConfigError::InvalidValue {
                    field: format!("context_builder.{field}"),
                    message: "must be greater than 0".to_string(),
                });
            }
        }
        if self.context_builder.full_token_budget < self.context_builder.standard_token_budget
            || self.context_builder.standard_token_budget < self.context_builder.minimal_token_budget
        {
            errors.push(ConfigError::InvalidValue {
                field: "context_builder".to_string(),
                message: "token budgets must satisfy full >= standard >= minimal".to_string(),
            });
        }

        if self.thread_grouper.subject_time_window_hours == 0 {
            errors.push(ConfigError::InvalidValue {
                field: "thread_grouper.subject_time_window_hours".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }

        if self.storage.db_path.trim().is_empty() {
            errors.push(ConfigError::MissingField {
                field: "storage.db_path".to_string(),
            });
        }

        for (profile_name, _) in &self.pipeline.profiles {
            if ALL_PROFILES.iter().all(|p| p.as_str() != profile_name) {
                errors.push(ConfigError::InvalidValue {
                    field: format!("pipeline.profiles.{profile_name}"),
                    message: "not a known processing profile".to_string(),
                });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Cross-checks `pipeline.subtype_processors` and `pipeline.profiles`
    /// against a live registry. Used only to validate registry wiring at
    /// startup (spec.md §4.5) — it does not drive routing or dispatch.
    pub fn validate_against_registry(
        &self,
        registry: &ProcessorRegistry,
    ) -> Result<(), Vec<ConfigError>> {
        let mut errors = Vec::new();

        for (subtype, expected_processor) in &self.pipeline.subtype_processors {
            match registry.typed_for(subtype) {
                Some(owner) if owner.name() == expected_processor => {}
                Some(owner) => {
                    errors.push(ConfigError::InvalidValue {
                        field: format!("pipeline.subtype_processors.{subtype}"),
                        message: format!(
                            "expected owner '{expected_processor}', registry has '{}'",
                            owner.name()
                        ),
                    });
                }
                None => {
                    errors.push(ConfigError::InvalidValue {
                        field: format!("pipeline.subtype_processors.{subtype}"),
                        message: format!(
                            "expected owner '{expected_processor}', but no processor owns this subtype"
                        ),
                    });
                }
            }
        }

        for (profile_name, expectation) in &self.pipeline.profiles {
            let Some(profile) = ALL_PROFILES.iter().find(|p| p.as_str() == profile_name) else {
                continue;
            };
            let actual_skip = profile.skip_reason().is_some();
            if actual_skip != expectation.skip_ai {
                errors.push(ConfigError::InvalidValue {
                    field: format!("pipeline.profiles.{profile_name}.skip_ai"),
                    message: format!(
                        "config expects skip_ai={}, but the router {} this profile",
                        expectation.skip_ai,
                        if actual_skip { "skips" } else { "calls" }
                    ),
                });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn zero_max_tokens_is_rejected() {
        let mut config = Config::default();
        config.llm_extractor.max_tokens = 0;
        let errors = config.validate().unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.to_string().contains("max_tokens")));
    }

    #[test]
    fn out_of_range_temperature_is_rejected() {
        let mut config = Config::default();
        config.llm_extractor.temperature = 5.0;
        let errors = config.validate().unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.to_string().contains("temperature")));
    }

    #[test]
    fn inverted_token_budgets_are_rejected() {
        let mut config = Config::default();
        config.context_builder.minimal_token_budget = 1000;
        let errors = config.validate().unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.to_string().contains("context_builder")));
    }

    #[test]
    fn accumulates_multiple_errors() {
        let mut config = Config::default();
        config.llm_extractor.max_tokens = 0;
        config.storage.db_path = String::new();
        let errors = config.validate().unwrap_err();
        assert!(errors.len() >= 2);
    }

    #[test]
    fn unknown_profile_name_is_rejected() {
        let mut config = Config::default();
        config.pipeline.profiles.insert(
            "not_a_real_profile".to_string(),
            super::super::ProfileExpectation {
                skip_ai: true,
                reason: None,
            },
        );
        let errors = config.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.to_string().contains("not_a_real_profile")));
    }

    #[test]
    fn registry_check_passes_when_empty() {
        let config = Config::default();
        let registry = ProcessorRegistry::new();
        assert!(config.validate_against_registry(&registry).is_ok());
    }

    #[test]
    fn registry_check_flags_missing_subtype_owner() {
        let mut config = Config::default();
        config
            .pipeline
            .subtype_processors
            .insert("notification/jira".to_string(), "jira_processor".to_string());
        let registry = ProcessorRegistry::new();
        let errors = config.validate_against_registry(&registry).unwrap_err();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn registry_check_flags_profile_mismatch() {
        let mut config = Config::default();
        config.pipeline.profiles.insert(
            "metadata_only".to_string(),
            super::super::ProfileExpectation {
                skip_ai: false,
                reason: None,
            },
        );
        let registry = ProcessorRegistry::new();
        let errors = config.validate_against_registry(&registry).unwrap_err();
        assert_eq!(errors.len(), 1);
    }
}
