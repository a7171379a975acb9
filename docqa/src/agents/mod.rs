pub mod generator;
pub mod retriever;
pub mod router;
pub mod verifier;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::models::RetrievalHit;

/// The closed set of retrieval domains the router may consult.
///
/// `Factcheck` is not a retrieval namespace; it only gates the
/// verification pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentName {
    Pdf,
    Law,
    Factcheck,
}

impl AgentName {
    pub fn all() -> HashSet<AgentName> {
        [AgentName::Pdf, AgentName::Law, AgentName::Factcheck]
            .into_iter()
            .collect()
    }

    /// Document-store namespace this agent searches, if it is a
    /// retrieval agent.
    pub fn namespace(self) -> Option<&'static str> {
        match self {
            AgentName::Pdf => Some("pdf"),
            AgentName::Law => Some("law"),
            AgentName::Factcheck => None,
        }
    }
}

/// Which agents to consult for one question. Membership only; no ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDecision {
    pub agents: HashSet<AgentName>,
}

impl RouteDecision {
    pub fn contains(&self, agent: AgentName) -> bool {
        self.agents.contains(&agent)
    }
}

/// Render retrieved context as the numbered excerpt list both generation
/// prompts share. Source numbering matches the citation list.
pub fn render_context(context: &[RetrievalHit]) -> String {
    context
        .iter()
        .enumerate()
        .map(|(i, hit)| format!("[{}] {}", i + 1, hit.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}
