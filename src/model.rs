//! Domain types shared across the pipeline.
//!
//! These are plain data definitions; CRUD operations over them live in
//! `storage`. Keeping the types here (rather than colocated with their
//! storage module, as `tuitbot-core` does for single-owner entities) avoids
//! a dependency cycle: almost every processor constructs or reads these
//! types, but only `storage` needs to persist them.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A normalized raw content item delivered to the pipeline. Immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub id: String,
    pub tenant_id: String,
    /// Free-form origin label supplied by the ingest connector.
    pub source_system: String,
    pub external_id: Option<String>,
    pub content_hash: String,
    pub raw_content: String,
    /// MIME-style declared content type.
    pub content_type: String,
    /// subject, from, to, cc, headers, attachments, in_reply_to, references, date, ...
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Source {
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(|v| v.as_str())
    }
}

// ---------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Email,
    Calendar,
    Document,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingProfile {
    FullAi,
    FullAiChunked,
    MetadataOnly,
    StateTracking,
    StructureOnly,
    OcrIfText,
}

impl ProcessingProfile {
    /// Whether this profile directs the AI router to skip the LLM call,
    /// and the reason text recorded in `ai_skip_reason` (spec.md §4.5).
    pub fn skip_reason(self) -> Option<&'static str> {
        match self {
            ProcessingProfile::MetadataOnly => Some("Structured extraction only"),
            ProcessingProfile::StateTracking => Some("State machine updates only"),
            ProcessingProfile::StructureOnly => Some("Spreadsheet structure only"),
            ProcessingProfile::FullAi
            | ProcessingProfile::FullAiChunked
            | ProcessingProfile::OcrIfText => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProcessingProfile::FullAi => "full_ai",
            ProcessingProfile::FullAiChunked => "full_ai_chunked",
            ProcessingProfile::MetadataOnly => "metadata_only",
            ProcessingProfile::StateTracking => "state_tracking",
            ProcessingProfile::StructureOnly => "structure_only",
            ProcessingProfile::OcrIfText => "ocr_if_text",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceSystem {
    Jira,
    Aha,
    GoogleDocs,
    Webex,
    Smartsheet,
    AutoReply,
    OutlookCalendar,
    HumanEmail,
}

impl SourceSystem {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceSystem::Jira => "jira",
            SourceSystem::Aha => "aha",
            SourceSystem::GoogleDocs => "google_docs",
            SourceSystem::Webex => "webex",
            SourceSystem::Smartsheet => "smartsheet",
            SourceSystem::AutoReply => "auto_reply",
            SourceSystem::OutlookCalendar => "outlook_calendar",
            SourceSystem::HumanEmail => "human_email",
        }
    }
}

/// The result of stage-1 classification. Set exactly once per Enrichment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub content_type: ContentType,
    /// e.g. "email/standalone", "calendar/invite", "notification/jira".
    pub subtype: String,
    pub profile: ProcessingProfile,
    pub source_system: SourceSystem,
    pub rule_name: String,
    pub reason: String,
    pub rule_priority: u32,
    pub confidence: f64,
}

// ---------------------------------------------------------------------
// Enrichment
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentStatus {
    Pending,
    Classifying,
    Enriching,
    Extracting,
    AiProcessing,
    Completed,
    Failed,
    Skipped,
}

impl EnrichmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EnrichmentStatus::Pending => "pending",
            EnrichmentStatus::Classifying => "classifying",
            EnrichmentStatus::Enriching => "enriching",
            EnrichmentStatus::Extracting => "extracting",
            EnrichmentStatus::AiProcessing => "ai_processing",
            EnrichmentStatus::Completed => "completed",
            EnrichmentStatus::Failed => "failed",
            EnrichmentStatus::Skipped => "skipped",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            EnrichmentStatus::Completed | EnrichmentStatus::Failed | EnrichmentStatus::Skipped
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Classification,
    CommonEnrichment,
    TypeExtraction,
    AiRouting,
    AiExtraction,
    PostProcessing,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Classification => "classification",
            Stage::CommonEnrichment => "common_enrichment",
            Stage::TypeExtraction => "type_extraction",
            Stage::AiRouting => "ai_routing",
            Stage::AiExtraction => "ai_processing",
            Stage::PostProcessing => "post_processing",
        }
    }

    pub fn ordinal(self) -> u8 {
        match self {
            Stage::Classification => 1,
            Stage::CommonEnrichment => 2,
            Stage::TypeExtraction => 3,
            Stage::AiRouting => 4,
            Stage::AiExtraction => 5,
            Stage::PostProcessing => 6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedParticipant {
    pub name: Option<String>,
    pub email: String,
    pub role: ParticipantRole,
    pub is_internal: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantRole {
    Sender,
    Recipient,
    Cc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkCategory {
    GoogleDoc,
    GoogleSheet,
    GoogleSlides,
    GoogleDrive,
    JiraTicket,
    JiraBoard,
    Confluence,
    WebexRecording,
    ZoomRecording,
    Sharepoint,
    Onedrive,
    Github,
    Gitlab,
    Bitbucket,
    Slack,
    Teams,
    GenericUrl,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedLink {
    pub url: String,
    pub category: LinkCategory,
    pub service_id: Option<String>,
    pub context: String,
    pub anchor_text: Option<String>,
    pub is_inline: bool,
    pub source_field: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThreadData {
    pub message_id: Option<String>,
    pub in_reply_to: Option<String>,
    pub references: Vec<String>,
    pub normalized_subject: Option<String>,
    pub thread_root: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JiraData {
    pub ticket_key: Option<String>,
    pub project_key: Option<String>,
    pub summary: Option<String>,
    pub change_type: Option<String>,
    pub from_value: Option<String>,
    pub to_value: Option<String>,
    pub priority: Option<String>,
    pub assignee: Option<String>,
    pub reporter: Option<String>,
    pub changed_by: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeetingData {
    pub title: Option<String>,
    pub ical_uid: Option<String>,
    pub organizer_name: Option<String>,
    pub organizer_email: Option<String>,
    pub attendees: Vec<String>,
    pub video_url: Option<String>,
    pub event_type: String,
    pub status: String,
}

/// Subtype-keyed bag of the structured extraction output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jira: Option<JiraData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting: Option<MeetingData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread: Option<ThreadData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forwarded_from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrichment {
    pub id: String,
    pub source_id: String,
    pub tenant_id: String,

    pub classification: Option<Classification>,

    pub status: EnrichmentStatus,
    pub current_stage: Option<Stage>,
    pub error_message: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub ai_processed: bool,
    pub ai_processed_at: Option<DateTime<Utc>>,
    pub ai_skip_reason: Option<String>,

    pub thread_id: Option<String>,
    pub project_id: Option<String>,
    pub resolved_participants: Vec<ResolvedParticipant>,

    pub extracted_links: Vec<ExtractedLink>,
    pub extracted_data: ExtractedData,
}

impl Enrichment {
    pub fn new_pending(source: &Source, classification: Classification) -> Self {
        Self {
            id: uuid_like(&source.id, "enr"),
            source_id: source.id.clone(),
            tenant_id: source.tenant_id.clone(),
            classification: Some(classification),
            status: EnrichmentStatus::Pending,
            current_stage: None,
            error_message: None,
            completed_at: None,
            ai_processed: false,
            ai_processed_at: None,
            ai_skip_reason: None,
            thread_id: None,
            project_id: None,
            resolved_participants: Vec::new(),
            extracted_links: Vec::new(),
            extracted_data: ExtractedData::default(),
        }
    }

    pub fn mark_failed(&mut self, stage: Stage, message: impl Into<String>) {
        self.status = EnrichmentStatus::Failed;
        self.current_stage = Some(stage);
        self.error_message = Some(message.into());
        self.completed_at = Some(Utc::now());
    }

    pub fn mark_completed(&mut self) {
        self.status = EnrichmentStatus::Completed;
        self.completed_at = Some(Utc::now());
    }
}

/// Deterministic id derived from the source id; avoids depending on a
/// random UUID generator inside pure/testable pipeline code.
pub fn uuid_like(seed: &str, prefix: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(prefix.as_bytes());
    hasher.update(b":");
    hasher.update(seed.as_bytes());
    let digest = hasher.finalize();
    format!("{prefix}_{}", hex::encode(&digest[..12]))
}

// ---------------------------------------------------------------------
// StageResult (audit)
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Completed,
    Failed,
    Skipped,
}

impl StageStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StageStatus::Completed => "completed",
            StageStatus::Failed => "failed",
            StageStatus::Skipped => "skipped",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageResult {
    pub id: i64,
    pub enrichment_id: String,
    pub stage_name: String,
    pub processor_name: String,
    pub status: StageStatus,
    pub input_data: Option<serde_json::Value>,
    pub output_data: Option<serde_json::Value>,
    pub error_message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: i64,
}

// ---------------------------------------------------------------------
// ExtractionRun (LLM audit)
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStatus {
    Completed,
    Partial,
    Failed,
}

impl ExtractionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ExtractionStatus::Completed => "completed",
            ExtractionStatus::Partial => "partial",
            ExtractionStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionRun {
    pub id: String,
    pub tenant_id: String,
    pub source_id: String,
    pub thread_id: Option<String>,
    pub project_id: Option<String>,
    pub template_id: String,
    pub template_version: i64,
    pub model_id: String,
    pub model_version: String,
    pub rendered_prompt: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub latency_ms: u64,
    pub raw_response: String,
    pub parsed: Option<serde_json::Value>,
    pub parse_errors: Vec<String>,
    pub status: ExtractionStatus,
}

// ---------------------------------------------------------------------
// Assertion
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssertionType {
    Risk,
    Action,
    Decision,
    Commitment,
    Issue,
    Question,
}

impl AssertionType {
    pub fn as_str(self) -> &'static str {
        match self {
            AssertionType::Risk => "risk",
            AssertionType::Action => "action",
            AssertionType::Decision => "decision",
            AssertionType::Commitment => "commitment",
            AssertionType::Issue => "issue",
            AssertionType::Question => "question",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assertion {
    pub id: String,
    pub tenant_id: String,
    pub source_id: String,
    pub extraction_run_id: String,
    pub assertion_type: AssertionType,
    pub description: String,
    pub source_quote: Option<String>,
    pub confidence: f64,
    /// owner/assignee/decision_maker/committer/... depending on `assertion_type`.
    pub role: Option<String>,
    pub role_slot: Option<String>,
    pub project_id: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub severity: Option<String>,
    pub status: Option<String>,
    pub answered: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentSentiment {
    pub source_id: String,
    pub extraction_run_id: String,
    pub overall: String,
    pub detail: Option<serde_json::Value>,
}

// ---------------------------------------------------------------------
// Mention
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Person,
    Term,
    Product,
    Company,
    Project,
    Ticket,
}

impl EntityType {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityType::Person => "person",
            EntityType::Term => "term",
            EntityType::Product => "product",
            EntityType::Company => "company",
            EntityType::Project => "project",
            EntityType::Ticket => "ticket",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MentionStatus {
    AutoLinked,
    PatternLinked,
    Ambiguous,
    QueuedForReview,
    Dismissed,
}

impl MentionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MentionStatus::AutoLinked => "auto_linked",
            MentionStatus::PatternLinked => "pattern_linked",
            MentionStatus::Ambiguous => "ambiguous",
            MentionStatus::QueuedForReview => "queued_for_review",
            MentionStatus::Dismissed => "dismissed",
        }
    }

    pub fn requires_entity_id(self) -> bool {
        matches!(self, MentionStatus::AutoLinked | MentionStatus::PatternLinked)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MentionTier {
    ExactIdentity,
    PatternCache,
    Affinity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mention {
    pub id: String,
    pub content_id: String,
    pub entity_type: EntityType,
    pub mentioned_text: String,
    pub context_snippet: String,
    pub project_context_id: Option<String>,
    pub entity_id: Option<String>,
    pub status: MentionStatus,
    pub confidence: f64,
    pub tier: MentionTier,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MentionPattern {
    pub id: i64,
    pub tenant_id: String,
    pub entity_type: EntityType,
    pub text: String,
    pub project_context_id: Option<String>,
    pub entity_id: String,
    pub times_linked: i64,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityProjectAffinity {
    pub entity_id: String,
    pub project_id: String,
    pub sightings: i64,
}

// ---------------------------------------------------------------------
// Context Builder read-side DTOs (spec.md §6, GetPerson/GetProject/...)
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonInfo {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadMessageInfo {
    pub message_id: String,
    pub from_name: String,
    pub preview: String,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketInfo {
    pub ticket_key: String,
    pub summary: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionInfo {
    pub description: String,
    pub decided_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingInfo {
    pub title: String,
    pub occurred_at: DateTime<Utc>,
}
