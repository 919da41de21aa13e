mod common;

use common::MockRagService;
use ragchat_application::suggestions::{FALLBACK_QUESTIONS, SuggestionGenerator, render_prompt};
use ragchat_core::StoreId;
use std::sync::Arc;

fn store() -> StoreId {
    StoreId::new("fileSearchStores/store-1")
}

#[tokio::test]
async fn test_fenced_output_is_parsed() {
    let service = Arc::new(MockRagService::new());
    service.set_suggestion_text("Here they are:\n```json\n[\"Q1?\", \"Q2?\"]\n```");

    let questions = SuggestionGenerator::new(service.clone(), 6).generate(&store()).await;

    assert_eq!(questions, vec!["Q1?", "Q2?"]);
    assert_eq!(service.suggestion_calls(), 1);
}

#[tokio::test]
async fn test_grouped_output_is_flattened() {
    let service = Arc::new(MockRagService::new());
    service.set_suggestion_text(r#"[{"questions":["A?","B?"]},{"questions":["C?"]}]"#);

    let questions = SuggestionGenerator::new(service, 6).generate(&store()).await;

    assert_eq!(questions, vec!["A?", "B?", "C?"]);
}

#[tokio::test]
async fn test_unparsable_output_falls_back() {
    let service = Arc::new(MockRagService::new());
    service.set_suggestion_text("I could not find any documents.");

    let questions = SuggestionGenerator::new(service, 6).generate(&store()).await;

    assert_eq!(questions, FALLBACK_QUESTIONS.to_vec());
}

#[tokio::test]
async fn test_output_is_capped_at_requested_count() {
    let service = Arc::new(MockRagService::new());
    service.set_suggestion_text(r#"["1?","2?","3?","4?"]"#);

    let questions = SuggestionGenerator::new(service, 2).generate(&store()).await;

    assert_eq!(questions, vec!["1?", "2?"]);
}

#[test]
fn test_prompt_asks_for_count_questions() {
    let prompt = render_prompt(3).unwrap();
    assert!(prompt.contains("Generate 3 specific, relevant questions"));
    assert!(prompt.contains("Question 3 about a specific detail"));
    assert!(!prompt.contains("Question 4 about"));
}
