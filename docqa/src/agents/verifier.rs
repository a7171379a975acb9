use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use super::render_context;
use crate::models::RetrievalHit;
use crate::services::Generation;

const VERIFY_SYSTEM_PROMPT: &str = "You are a fact checker. Compare the \
draft answer against the numbered source excerpts. If the draft \
contradicts the excerpts, return a corrected answer; if it does not, \
return the draft unchanged. When the excerpts are insufficient to decide, \
say so plainly rather than asserting certainty. Keep the inline source \
citations.";

/// Cross-checks a draft answer against the same context that produced it.
/// Returns the replacement final answer; the draft is never mutated.
pub struct Verifier {
    llm: Arc<dyn Generation>,
}

impl Verifier {
    pub fn new(llm: Arc<dyn Generation>) -> Self {
        Self { llm }
    }

    pub async fn verify(
        &self,
        question: &str,
        draft: &str,
        context: &[RetrievalHit],
    ) -> Result<String> {
        let prompt = format!(
            "Source excerpts:\n{}\n\nQuestion: {}\n\nDraft answer:\n{}",
            render_context(context),
            question,
            draft
        );
        debug!(sources = context.len(), "verifying draft answer");
        self.llm.complete(VERIFY_SYSTEM_PROMPT, &prompt, 0.0).await
    }
}
