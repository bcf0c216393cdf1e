//! Default values for all configuration sections.

use super::{
    ClassificationConfig, ContextBuilderConfig, LinkExtractorConfig, LlmExtractorSettings,
    StorageConfig, ThreadGrouperConfig,
};

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            internal_domains: Vec::new(),
        }
    }
}

impl Default for LinkExtractorConfig {
    fn default() -> Self {
        Self {
            extract_from_signatures: default_extract_from_signatures(),
            context_chars: default_context_chars(),
        }
    }
}

impl Default for ThreadGrouperConfig {
    fn default() -> Self {
        Self {
            fallback_to_subject: default_fallback_to_subject(),
            subject_time_window_hours: default_subject_time_window_hours(),
        }
    }
}

impl Default for ContextBuilderConfig {
    fn default() -> Self {
        Self {
            max_participants: default_max_participants(),
            max_prior_messages: default_max_prior_messages(),
            max_prior_decisions: default_max_prior_decisions(),
            max_tickets: default_max_tickets(),
            message_preview_len: default_message_preview_len(),
            full_token_budget: default_full_token_budget(),
            standard_token_budget: default_standard_token_budget(),
            minimal_token_budget: default_minimal_token_budget(),
        }
    }
}

impl Default for LlmExtractorSettings {
    fn default() -> Self {
        Self {
            model_id: default_model_id(),
            model_version: default_model_version(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

pub(super) fn default_extract_from_signatures() -> bool {
    true
}
pub(super) fn default_context_chars() -> usize {
    80
}
pub(super) fn default_fallback_to_subject() -> bool {
    true
}
pub(super) fn default_subject_time_window_hours() -> u32 {
    72
}
pub(super) fn default_max_participants() -> usize {
    10
}
pub(super) fn default_max_prior_messages() -> usize {
    5
}
pub(super) fn default_max_prior_decisions() -> usize {
    5
}
pub(super) fn default_max_tickets() -> usize {
    5
}
pub(super) fn default_message_preview_len() -> usize {
    200
}
pub(super) fn default_full_token_budget() -> u32 {
    500
}
pub(super) fn default_standard_token_budget() -> u32 {
    200
}
pub(super) fn default_minimal_token_budget() -> u32 {
    150
}
pub(super) fn default_model_id() -> String {
    "claude-sonnet-4-5".to_string()
}
pub(super) fn default_model_version() -> String {
    "2025-09-29".to_string()
}
pub(super) fn default_max_tokens() -> u32 {
    2048
}
pub(super) fn default_temperature() -> f32 {
    0.2
}
pub(super) fn default_timeout_ms() -> u64 {
    30_000
}
pub(super) fn default_db_path() -> String {
    "~/.enrich/enrich.db".to_string()
}
