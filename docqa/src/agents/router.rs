use std::collections::HashSet;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use super::{AgentName, RouteDecision};
use crate::services::Generation;

const ROUTE_SYSTEM_PROMPT: &str = "You are a routing classifier for a document \
question-answering system. Decide which knowledge agents should handle the \
question: \"pdf\" for questions about ingested document content, \"law\" for \
legal or regulatory questions, \"factcheck\" when the answer should be \
verified against the sources before it is returned. Respond with a JSON \
object of the form {\"agents\": [\"pdf\", \"law\", \"factcheck\"]} listing \
only the agents that apply. Respond with JSON only, no prose.";

#[derive(Debug, Deserialize)]
struct RoutePayload {
    agents: Vec<AgentName>,
}

/// Classifies a question into the set of agents to consult.
///
/// The classifier's free-text output is untrusted: anything that is not
/// the expected JSON shape, including unknown agent names, falls open to
/// all agents so a bad classification can never block the pipeline.
pub struct Router {
    llm: Arc<dyn Generation>,
}

impl Router {
    pub fn new(llm: Arc<dyn Generation>) -> Self {
        Self { llm }
    }

    pub async fn route(&self, question: &str) -> RouteDecision {
        let agents = match self.llm.complete(ROUTE_SYSTEM_PROMPT, question, 0.0).await {
            Ok(raw) => parse_route(&raw).unwrap_or_else(|| {
                warn!(raw = %raw, "unparseable route output, selecting all agents");
                AgentName::all()
            }),
            Err(e) => {
                warn!(error = %e, "route classification failed, selecting all agents");
                AgentName::all()
            }
        };
        debug!(?agents, "route decision");
        RouteDecision { agents }
    }
}

fn parse_route(raw: &str) -> Option<HashSet<AgentName>> {
    let payload: RoutePayload = serde_json::from_str(raw.trim()).ok()?;
    Some(payload.agents.into_iter().collect())
}
