//! Example-question generation grounded in the uploaded documents.
//!
//! Generation never fails its caller: any remote error or unusable output
//! degrades to [`FALLBACK_QUESTIONS`].

use minijinja::{Environment, context};
use ragchat_core::{RagError, RagService, Result, StoreId};
use regex::Regex;
use serde_json::Value;
use std::sync::{Arc, LazyLock};

/// Questions offered when the model's suggestions cannot be used.
pub const FALLBACK_QUESTIONS: [&str; 4] = [
    "What are the main topics covered in this document?",
    "Can you summarize the key points?",
    "What safety procedures are mentioned?",
    "What are the technical specifications?",
];

const PROMPT_TEMPLATE: &str = r#"You are analyzing documents that have been uploaded to a retrieval system. Your task is to:

1. Read and understand the ACTUAL content of the uploaded documents
2. Generate {{ count }} specific, relevant questions based on what is ACTUALLY in these documents
3. Make the questions practical and answerable from the document content
4. Focus on key topics, technical details, procedures, specifications, dates, requirements, or other important information found in the documents

IMPORTANT: Base your questions on the ACTUAL document content, not on generic topics.

Return ONLY a JSON array of {{ count }} question strings in this exact format:
[{% for i in range(count) %}"Question {{ i + 1 }} about a specific detail from the documents?"{% if not loop.last %}, {% endif %}{% endfor %}]

Generate the questions now based on the uploaded documents:"#;

static FENCED_JSON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```json[ \t]*\r?\n(.*?)\r?\n[ \t]*```").expect("valid fenced block pattern")
});

pub fn fallback_questions() -> Vec<String> {
    FALLBACK_QUESTIONS.iter().map(|q| q.to_string()).collect()
}

/// Renders the generation prompt asking for `count` questions.
pub fn render_prompt(count: usize) -> Result<String> {
    Environment::new()
        .render_str(PROMPT_TEMPLATE, context! { count => count })
        .map_err(|err| RagError::unknown(format!("Failed to render suggestion prompt: {err}")))
}

/// Narrows raw model output down to the JSON it most likely contains.
fn extract_json_text(text: &str) -> &str {
    if let Some(inner) = FENCED_JSON.captures(text).and_then(|caps| caps.get(1)) {
        return inner.as_str();
    }
    match (text.find('['), text.rfind(']')) {
        (Some(first), Some(last)) if last > first => &text[first..=last],
        _ => text,
    }
}

/// Parses model output into questions.
///
/// Accepts either an array of strings or an array of objects that each carry
/// a `questions` array. Non-string entries are dropped. Anything else is a
/// [`RagError::MalformedResponse`].
pub fn parse_suggestions(text: &str) -> Result<Vec<String>> {
    let json_text = extract_json_text(text.trim());
    let value: Value = serde_json::from_str(json_text)?;

    let Value::Array(items) = value else {
        return Err(RagError::malformed("suggestions are not a JSON array"));
    };
    let Some(first) = items.first() else {
        return Ok(Vec::new());
    };

    if first.get("questions").is_some_and(Value::is_array) {
        return Ok(items
            .iter()
            .filter_map(|item| item.get("questions").and_then(Value::as_array))
            .flatten()
            .filter_map(|q| q.as_str().map(str::to_string))
            .collect());
    }

    if first.is_string() {
        return Ok(items
            .iter()
            .filter_map(|q| q.as_str().map(str::to_string))
            .collect());
    }

    Err(RagError::malformed(format!(
        "unexpected suggestion format: {first}"
    )))
}

pub struct SuggestionGenerator {
    service: Arc<dyn RagService>,
    count: usize,
}

impl SuggestionGenerator {
    pub fn new(service: Arc<dyn RagService>, count: usize) -> Self {
        Self { service, count }
    }

    /// Returns up to `count` example questions for `store`.
    pub async fn generate(&self, store: &StoreId) -> Vec<String> {
        match self.try_generate(store).await {
            Ok(mut questions) => {
                questions.truncate(self.count);
                tracing::debug!(
                    store = %store,
                    count = questions.len(),
                    "Generated example questions"
                );
                questions
            }
            Err(err) => {
                tracing::warn!(
                    store = %store,
                    error = %err,
                    "Failed to generate or parse example questions"
                );
                fallback_questions()
            }
        }
    }

    async fn try_generate(&self, store: &StoreId) -> Result<Vec<String>> {
        let prompt = render_prompt(self.count)?;
        let answer = self.service.generate_answer(store, &prompt).await?;
        parse_suggestions(&answer.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_block() {
        let parsed = parse_suggestions("```json\n[\"Q1?\",\"Q2?\"]\n```").unwrap();
        assert_eq!(parsed, vec!["Q1?", "Q2?"]);
    }

    #[test]
    fn test_bracket_substring_with_chatter() {
        let text = "Sure! Here you go:\n[\"What is A?\", \"What is B?\"]\nHope this helps.";
        assert_eq!(parse_suggestions(text).unwrap(), vec!["What is A?", "What is B?"]);
    }

    #[test]
    fn test_grouped_questions_are_flattened() {
        let text = r#"[{"product":"A","questions":["Qa?"]},{"product":"B","questions":["Qb?","Qc?"]}]"#;
        assert_eq!(parse_suggestions(text).unwrap(), vec!["Qa?", "Qb?", "Qc?"]);
    }

    #[test]
    fn test_non_strings_are_dropped() {
        let text = r#"["Q1?", 42, null, "Q2?"]"#;
        assert_eq!(parse_suggestions(text).unwrap(), vec!["Q1?", "Q2?"]);

        let text = r#"[{"questions":["Q1?", {"nested": true}]}, {"other": 1}]"#;
        assert_eq!(parse_suggestions(text).unwrap(), vec!["Q1?"]);
    }

    #[test]
    fn test_malformed_inputs() {
        assert!(matches!(
            parse_suggestions("not json at all"),
            Err(RagError::MalformedResponse(_))
        ));
        assert!(parse_suggestions(r#"{"count": 6}"#).is_err());
        assert!(parse_suggestions("[1, 2, 3]").is_err());
    }

    #[test]
    fn test_empty_array_is_empty() {
        assert!(parse_suggestions("[]").unwrap().is_empty());
    }

    #[test]
    fn test_prompt_mentions_count() {
        let prompt = render_prompt(6).unwrap();
        assert!(prompt.contains("Generate 6 specific"));
        assert!(prompt.contains("JSON array of 6 question strings"));
        assert!(prompt.contains("\"Question 6 about"));
        assert!(!prompt.contains("\"Question 7 about"));
    }
}
