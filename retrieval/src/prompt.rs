//! Prompt assembly for the completion model.

use vector_store::VectorMatch;

/// Fixed system instruction for every completion call.
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant. Use the provided context to \
answer questions accurately. When asked about quantities, count distinct items by filename.";

/// Fixed reply for the no-knowledge state. Returned without calling the
/// completion model when retrieval produced no context.
pub const NO_KNOWLEDGE_REPLY: &str = "I don't have any information to answer that yet. \
Please upload a document first.";

/// Joins matched chunk texts in ranked order with newline separators.
pub fn join_context(matches: &[VectorMatch]) -> String {
    matches
        .iter()
        .map(|m| m.meta.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Builds the user turn from the assembled context and the question.
pub fn build_user_prompt(context: &str, question: &str) -> String {
    format!("Context: {context}\n\nQuestion: {question}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use vector_store::{ChunkMeta, VectorMatch};

    fn hit(text: &str) -> VectorMatch {
        VectorMatch {
            id: "t_v_f_0".into(),
            score: 0.9,
            meta: ChunkMeta {
                tenant_id: "t".into(),
                visitor_id: "v".into(),
                filename: "f".into(),
                text: text.into(),
            },
        }
    }

    #[test]
    fn context_preserves_rank_order() {
        let ctx = join_context(&[hit("first"), hit("second"), hit("third")]);
        assert_eq!(ctx, "first\nsecond\nthird");
    }

    #[test]
    fn user_prompt_embeds_context_and_question() {
        let p = build_user_prompt("some context", "what?");
        assert_eq!(p, "Context: some context\n\nQuestion: what?");
    }
}
