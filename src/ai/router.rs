//! AI Router (Stage 4). A pure function of `classification.profile`
//! deciding whether stage 5 runs at all (spec.md §4.5).

use crate::model::ProcessingProfile;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Skip { reason: String },
    Call,
}

pub fn route(profile: ProcessingProfile) -> RouteDecision {
    match profile.skip_reason() {
        Some(reason) => RouteDecision::Skip {
            reason: format!("profile:{} - {reason}", profile.as_str()),
        },
        None => RouteDecision::Call,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_only_skips_with_reason() {
        let decision = route(ProcessingProfile::MetadataOnly);
        assert_eq!(
            decision,
            RouteDecision::Skip {
                reason: "profile:metadata_only - Structured extraction only".to_string(),
            }
        );
    }

    #[test]
    fn state_tracking_skips() {
        assert!(matches!(
            route(ProcessingProfile::StateTracking),
            RouteDecision::Skip { .. }
        ));
    }

    #[test]
    fn structure_only_skips() {
        assert!(matches!(
            route(ProcessingProfile::StructureOnly),
            RouteDecision::Skip { .. }
        ));
    }

    #[test]
    fn full_ai_calls() {
        assert_eq!(route(ProcessingProfile::FullAi), RouteDecision::Call);
    }

    #[test]
    fn full_ai_chunked_calls() {
        assert_eq!(route(ProcessingProfile::FullAiChunked), RouteDecision::Call);
    }

    #[test]
    fn ocr_if_text_calls() {
        assert_eq!(route(ProcessingProfile::OcrIfText), RouteDecision::Call);
    }
}
