//! Context Builder (spec.md §4.5 steps 2-3).
//!
//! Assembles the bounded context passed to the LLM extractor: participants,
//! project, prior thread messages, linked tickets, and prior decisions,
//! included or omitted as whole sections under a per-tier token budget.

pub mod budget;

use crate::model::Enrichment;
use crate::storage::Repository;
use budget::{cost, ContextTier};

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct AssembledContext {
    pub participants: Vec<String>,
    pub project_name: Option<String>,
    pub thread_messages: Vec<String>,
    pub tickets: Vec<String>,
    pub decisions: Vec<String>,
    pub meetings: Vec<String>,
    pub estimated_tokens: u32,
}

impl AssembledContext {
    /// Render into the flat string substituted for `{context}` in a template.
    pub fn render(&self) -> String {
        let mut sections = Vec::new();

        if !self.participants.is_empty() {
            sections.push(format!("Participants: {}", self.participants.join(", ")));
        }
        if let Some(project) = &self.project_name {
            sections.push(format!("Project: {project}"));
        }
        if !self.thread_messages.is_empty() {
            sections.push(format!("Prior messages:\n{}", self.thread_messages.join("\n")));
        }
        if !self.tickets.is_empty() {
            sections.push(format!("Linked tickets:\n{}", self.tickets.join("\n")));
        }
        if !self.decisions.is_empty() {
            sections.push(format!("Prior decisions:\n{}", self.decisions.join("\n")));
        }
        if !self.meetings.is_empty() {
            sections.push(format!("Recent meetings:\n{}", self.meetings.join("\n")));
        }

        sections.join("\n\n")
    }
}

const MAX_THREAD_MESSAGES: usize = 5;
const MAX_TICKETS: usize = 10;
const MAX_DECISIONS: usize = 5;
const MAX_MEETINGS: usize = 5;

/// Build the bounded context for an enrichment at the given tier. Each
/// section is either fully included or dropped entirely; nothing is
/// truncated mid-section once accounted for in the running budget.
pub async fn build(
    repo: &dyn Repository,
    enrichment: &Enrichment,
    tier: ContextTier,
) -> Result<AssembledContext, crate::error::RepositoryError> {
    let mut ctx = AssembledContext::default();
    if tier == ContextTier::None {
        return Ok(ctx);
    }

    let budget = tier.token_budget();
    let mut spent = 0u32;

    // Participants: always included when room allows.
    let participant_cost = enrichment.resolved_participants.len() as u32 * cost::PARTICIPANT;
    if spent + participant_cost <= budget {
        ctx.participants = enrichment
            .resolved_participants
            .iter()
            .map(|p| p.name.clone().unwrap_or_else(|| p.email.clone()))
            .collect();
        spent += participant_cost;
    }

    // Project: included if known and tier is not minimal.
    if tier != ContextTier::Minimal {
        if let Some(project_id) = &enrichment.project_id {
            if spent + cost::PROJECT <= budget {
                if let Some(project) = repo.get_project(project_id).await? {
                    ctx.project_name = Some(project.name);
                    spent += cost::PROJECT;
                }
            }
        }
    }

    // Thread: only at full tier.
    if tier == ContextTier::Full {
        if let Some(thread_id) = &enrichment.thread_id {
            let messages = repo.get_thread_messages(thread_id, MAX_THREAD_MESSAGES).await?;
            let section_cost = messages.len() as u32 * cost::MESSAGE_PREVIEW;
            if !messages.is_empty() && spent + section_cost <= budget {
                ctx.thread_messages = messages
                    .into_iter()
                    .map(|m| format!("{}: {}", m.from_name, m.preview))
                    .collect();
                spent += section_cost;
            }
        }
    }

    // Linked tickets.
    if let Some(project_id) = &enrichment.project_id {
        let tickets = repo.get_project_tickets(project_id, MAX_TICKETS).await?;
        let section_cost = tickets.len() as u32 * cost::TICKET;
        if !tickets.is_empty() && spent + section_cost <= budget {
            ctx.tickets = tickets
                .into_iter()
                .map(|t| format!("{} ({}): {}", t.ticket_key, t.status, t.summary))
                .collect();
            spent += section_cost;
        }
    }

    // Prior decisions: only at full tier.
    if tier == ContextTier::Full {
        if let Some(project_id) = &enrichment.project_id {
            let decisions = repo.get_project_decisions(project_id, MAX_DECISIONS).await?;
            let section_cost = decisions.len() as u32 * cost::DECISION;
            if !decisions.is_empty() && spent + section_cost <= budget {
                ctx.decisions = decisions.into_iter().map(|d| d.description).collect();
                spent += section_cost;
            }
        }

        if let Some(project_id) = &enrichment.project_id {
            let meetings = repo.get_recent_meetings(project_id, MAX_MEETINGS).await?;
            let section_cost = meetings.len() as u32 * cost::MEETING;
            if !meetings.is_empty() && spent + section_cost <= budget {
                ctx.meetings = meetings.into_iter().map(|m| m.title).collect();
                spent += section_cost;
            }
        }
    }

    ctx.estimated_tokens = spent;
    Ok(ctx)
}
