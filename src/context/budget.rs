//! Token budgets and per-section cost estimates (spec.md §4.5 step 2-3).

use serde::{Deserialize, Serialize};

use crate::model::ProcessingProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextTier {
    Full,
    Standard,
    Minimal,
    None,
}

impl ContextTier {
    pub fn for_profile(profile: ProcessingProfile) -> Self {
        match profile {
            ProcessingProfile::FullAi => ContextTier::Full,
            ProcessingProfile::FullAiChunked => ContextTier::Minimal,
            ProcessingProfile::MetadataOnly
            | ProcessingProfile::StateTracking
            | ProcessingProfile::StructureOnly => ContextTier::None,
            ProcessingProfile::OcrIfText => ContextTier::Standard,
        }
    }

    pub fn token_budget(self) -> u32 {
        match self {
            ContextTier::Full => 500,
            ContextTier::Standard => 200,
            ContextTier::Minimal => 150,
            ContextTier::None => 0,
        }
    }
}

/// Estimated token cost of a single instance of each context section.
pub mod cost {
    pub const PARTICIPANT: u32 = 15;
    pub const PROJECT: u32 = 30;
    pub const MESSAGE_PREVIEW: u32 = 50;
    pub const TICKET: u32 = 20;
    pub const DECISION: u32 = 25;
    pub const MEETING: u32 = 20;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_ai_maps_to_full_tier_and_budget() {
        assert_eq!(ContextTier::for_profile(ProcessingProfile::FullAi), ContextTier::Full);
        assert_eq!(ContextTier::Full.token_budget(), 500);
    }

    #[test]
    fn chunked_maps_to_minimal_tier() {
        assert_eq!(
            ContextTier::for_profile(ProcessingProfile::FullAiChunked),
            ContextTier::Minimal
        );
        assert_eq!(ContextTier::Minimal.token_budget(), 150);
    }

    #[test]
    fn metadata_only_maps_to_none_tier() {
        assert_eq!(
            ContextTier::for_profile(ProcessingProfile::MetadataOnly),
            ContextTier::None
        );
        assert_eq!(ContextTier::None.token_budget(), 0);
    }

    #[test]
    fn ocr_maps_to_standard_tier() {
        assert_eq!(ContextTier::for_profile(ProcessingProfile::OcrIfText), ContextTier::Standard);
        assert_eq!(ContextTier::Standard.token_budget(), 200);
    }
}
