//! Prompt construction for grounded answers.

use sift_core::SearchResult;
use std::fmt::Write;

/// Instructions given to the model on every grounded query.
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant that answers questions \
about the user's own files. Answer using only the numbered information provided \
with the question. If that information does not contain the answer, say that you \
don't know. State facts directly: never mention documents, sources, context, \
excerpts or item numbers, and never add citation markers.";

/// Build the user prompt: numbered information items followed by the question.
pub fn build_user_prompt(question: &str, results: &[SearchResult]) -> String {
    let mut prompt = String::from("Information:\n\n");

    for (i, result) in results.iter().enumerate() {
        // Writing into a String cannot fail
        let _ = writeln!(prompt, "[{}]\n{}\n", i + 1, result.content.trim());
    }

    let _ = write!(prompt, "Question: {}", question);
    prompt
}
