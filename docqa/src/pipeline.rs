use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, warn};

use crate::agents::generator::Generator;
use crate::agents::retriever::Retriever;
use crate::agents::router::Router;
use crate::agents::verifier::Verifier;
use crate::agents::AgentName;
use crate::citations::build_citations;
use crate::error::ApiError;
use crate::models::{AnswerResult, RetrievalHit, Role};
use crate::services::ConversationStore;

const SOURCES_LABEL: &str = "Sources: ";

/// Retrieval agents in the fixed order their contexts are concatenated.
const RETRIEVAL_AGENTS: [AgentName; 2] = [AgentName::Pdf, AgentName::Law];

/// One-pass QA pipeline:
/// save question → load memory → route → retrieve per agent → generate →
/// optional verification → citations → save answer.
pub struct Pipeline {
    router: Router,
    retriever: Retriever,
    generator: Generator,
    verifier: Verifier,
    memory: Arc<dyn ConversationStore>,
    memory_limit: usize,
}

impl Pipeline {
    pub fn new(
        router: Router,
        retriever: Retriever,
        generator: Generator,
        verifier: Verifier,
        memory: Arc<dyn ConversationStore>,
        memory_limit: usize,
    ) -> Self {
        Self {
            router,
            retriever,
            generator,
            verifier,
            memory,
            memory_limit,
        }
    }

    pub async fn ask(&self, question: &str, user_id: &str) -> Result<AnswerResult, ApiError> {
        // The question is saved before anything else runs, so a concurrent
        // history read may see it before the answer exists.
        if let Err(e) = self.memory.append(user_id, Role::User, question).await {
            warn!(user_id, error = %e, "failed to save question to history");
        }

        let enriched = self.enrich(question, user_id).await;

        let decision = self.router.route(&enriched).await;
        info!(agents = ?decision.agents, "route decision");

        let context = self.retrieve_all(&decision.agents, &enriched).await;
        info!(sources = context.len(), "retrieval complete");

        let draft = self
            .generator
            .generate(&enriched, &context)
            .await
            .map_err(|e| ApiError::Upstream(e.to_string()))?;

        let answer = if decision.contains(AgentName::Factcheck) {
            self.verifier
                .verify(&enriched, &draft, &context)
                .await
                .map_err(|e| ApiError::Upstream(e.to_string()))?
        } else {
            draft
        };

        let text = format!(
            "{}\n\n{}{}",
            answer,
            SOURCES_LABEL,
            build_citations(&context)
        )
        .trim()
        .to_string();

        if let Err(e) = self.memory.append(user_id, Role::Assistant, &text).await {
            warn!(user_id, error = %e, "failed to save answer to history");
        }

        Ok(AnswerResult {
            text,
            used_context: context,
        })
    }

    /// Prepend the user's recent history (newest first) to the question.
    /// A failed history read degrades to the bare question.
    async fn enrich(&self, question: &str, user_id: &str) -> String {
        let history = match self.memory.recent(user_id, self.memory_limit).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(user_id, error = %e, "failed to load history, continuing without it");
                Vec::new()
            }
        };
        if history.is_empty() {
            return question.to_string();
        }

        let rendered = history
            .iter()
            .map(|entry| {
                let role = match entry.role {
                    Role::User => "user",
                    Role::Assistant => "assistant",
                };
                format!("{}: {}", role, entry.content)
            })
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "Recent conversation (newest first):\n{}\n\nQuestion: {}",
            rendered, question
        )
    }

    /// Fan out retrieval across the selected agents. Join-all semantics:
    /// every agent completes and a failed channel inside one agent never
    /// cancels the others. Contexts concatenate in fixed agent order.
    async fn retrieve_all(
        &self,
        agents: &std::collections::HashSet<AgentName>,
        question: &str,
    ) -> Vec<RetrievalHit> {
        let selected: Vec<&'static str> = RETRIEVAL_AGENTS
            .iter()
            .copied()
            .filter(|agent| agents.contains(agent))
            .filter_map(AgentName::namespace)
            .collect();

        let windows = join_all(
            selected
                .iter()
                .map(|namespace| self.retriever.retrieve(namespace, question)),
        )
        .await;

        windows.into_iter().flatten().collect()
    }
}
