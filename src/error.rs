//! Error types for the enrichment core library.
//!
//! Each module has its own error enum to provide clear error boundaries.
//! The library uses `thiserror` for structured, typed errors, following
//! the same one-enum-per-concern layout as the upstream core library this
//! crate was adapted from.

/// Errors related to configuration loading, parsing, and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required config field: {field}")]
    MissingField { field: String },

    #[error("invalid value for config field '{field}': {message}")]
    InvalidValue { field: String, message: String },

    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    #[error("failed to parse config file: {source}")]
    ParseError {
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid environment variable {var}: {message}")]
    InvalidEnvVar { var: String, message: String },
}

/// Errors from the Repository contract (persistence of Enrichment and its
/// audit trail).
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("database connection error: {source}")]
    Connection {
        #[source]
        source: sqlx::Error,
    },

    #[error("database migration error: {source}")]
    Migration {
        #[source]
        source: sqlx::migrate::MigrateError,
    },

    #[error("database query error: {source}")]
    Query {
        #[source]
        source: sqlx::Error,
    },

    #[error("record not found: {what}")]
    NotFound { what: String },

    #[error("malformed stored data for {what}: {message}")]
    Decode { what: String, message: String },
}

impl From<sqlx::Error> for RepositoryError {
    fn from(source: sqlx::Error) -> Self {
        RepositoryError::Query { source }
    }
}

/// Errors from interacting with LLM providers.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("LLM HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("LLM API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM rate limited, retry after {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },

    #[error("failed to parse LLM response: {0}")]
    Parse(String),

    #[error("no LLM provider configured")]
    NotConfigured,

    #[error("LLM call cancelled")]
    Cancelled,
}

/// Errors surfaced by stage-2/3/6 processors. Non-fatal: the orchestrator
/// records these into a `StageResult` row and continues.
#[derive(Debug, thiserror::Error)]
pub enum ProcessorError {
    #[error("processor '{processor}' failed: {message}")]
    Failed { processor: String, message: String },

    #[error("malformed input for processor '{processor}': {message}")]
    InputError { processor: String, message: String },
}

/// Errors from the Template Resolver.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("no template found: {what}")]
    NotFound { what: String },

    #[error("template repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Errors from the Mention Resolver.
#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    #[error("entity lookup failed: {0}")]
    EntityLookup(String),

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Top-level errors from a single pipeline invocation.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("classification failed: {0}")]
    Classification(String),

    #[error("ai extraction failed: {0}")]
    AiExtraction(#[from] LlmError),

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    #[error("cancelled before stage '{stage}' began")]
    Cancelled { stage: &'static str },
}
