use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use super::render_context;
use crate::models::RetrievalHit;
use crate::services::Generation;

const ANSWER_SYSTEM_PROMPT: &str = "You answer questions using only the \
numbered source excerpts provided. If the excerpts do not support an \
answer, say that no grounding evidence was found instead of guessing. \
Cite the sources you rely on inline by their numbers, e.g. [1] or [2].";

/// Produces the grounded draft answer from the packed context.
pub struct Generator {
    llm: Arc<dyn Generation>,
}

impl Generator {
    pub fn new(llm: Arc<dyn Generation>) -> Self {
        Self { llm }
    }

    /// The service is invoked even with empty context; it is expected to
    /// state that no evidence was found.
    pub async fn generate(&self, question: &str, context: &[RetrievalHit]) -> Result<String> {
        let prompt = format!(
            "Source excerpts:\n{}\n\nQuestion: {}",
            render_context(context),
            question
        );
        debug!(sources = context.len(), "generating draft answer");
        self.llm.complete(ANSWER_SYSTEM_PROMPT, &prompt, 0.2).await
    }
}
