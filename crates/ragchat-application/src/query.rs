//! Grounded query execution with bounded retry.

use ragchat_core::{
    AccuracyMode, Citation, ContextWindow, GeneratedAnswer, QueryRequest, QueryResult, RagService,
    Result, SessionConfig, Sleeper, StoreId,
};
use std::sync::Arc;
use std::time::Duration;

const BASE_INSTRUCTION: &str = "Do not tell the user to go and read the manual; point to the relevant sections in the answer itself.";

const VERY_ACCURATE_INSTRUCTION: &str = "IMPORTANT: Only provide information that is explicitly stated in the uploaded documents. If the answer is not in the documents, say clearly that the provided materials do not contain that information.";
const MODERATE_INSTRUCTION: &str = "Primarily use information from the uploaded documents, but you may supplement it with general knowledge when appropriate.";
const CREATIVE_INSTRUCTION: &str = "Use the uploaded documents as a reference, and feel free to give comprehensive answers drawing on general knowledge when helpful.";

const SHORT_CONTEXT_HINT: &str = "Keep the response concise and focused.";
const HIGH_CONTEXT_HINT: &str = "Provide a comprehensive and detailed response.";

/// How often and how patiently a query is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Attempt `n` waits `n * base_delay` before the next attempt.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            max_attempts: config.max_query_attempts.max(1),
            base_delay: config.retry_base_delay(),
        }
    }

    /// Delay after the failed attempt number `attempt` (1-based). No jitter.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

/// Builds the instruction appended to every question.
pub fn build_instruction(mode: AccuracyMode, window: ContextWindow) -> String {
    let accuracy = match mode {
        AccuracyMode::VeryAccurate => VERY_ACCURATE_INSTRUCTION,
        AccuracyMode::Moderate => MODERATE_INSTRUCTION,
        AccuracyMode::Creative => CREATIVE_INSTRUCTION,
    };

    let mut instruction = format!("{BASE_INSTRUCTION} {accuracy}");
    match window {
        ContextWindow::Short => {
            instruction.push(' ');
            instruction.push_str(SHORT_CONTEXT_HINT);
        }
        ContextWindow::Medium => {}
        ContextWindow::High => {
            instruction.push(' ');
            instruction.push_str(HIGH_CONTEXT_HINT);
        }
    }
    instruction
}

/// The full prompt sent for `request`: the question followed by its instruction.
pub fn build_prompt(request: &QueryRequest) -> String {
    format!(
        "{} {}",
        request.text,
        build_instruction(request.accuracy_mode, request.context_window)
    )
}

/// Executes single grounded queries against a store.
///
/// Retries only connection-level failures. Overlapping queries are not
/// serialized here; callers keep one query in flight per store.
pub struct QueryExecutor {
    service: Arc<dyn RagService>,
    sleeper: Arc<dyn Sleeper>,
    retry: RetryPolicy,
}

impl QueryExecutor {
    pub fn new(
        service: Arc<dyn RagService>,
        sleeper: Arc<dyn Sleeper>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            service,
            sleeper,
            retry,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub async fn execute(&self, store: &StoreId, request: &QueryRequest) -> Result<QueryResult> {
        let prompt = build_prompt(request);
        let mut attempt = 1;

        loop {
            match self.service.generate_answer(store, &prompt).await {
                Ok(answer) => return Ok(into_query_result(answer)),
                Err(err) if err.is_transient() && attempt < self.retry.max_attempts => {
                    let delay = self.retry.delay_after(attempt);
                    tracing::warn!(
                        store = %store,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Query attempt failed, retrying"
                    );
                    self.sleeper.sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    tracing::error!(store = %store, attempt, error = %err, "Query failed");
                    return Err(err);
                }
            }
        }
    }
}

/// Keeps only chunks that carry text, in response order.
fn into_query_result(answer: GeneratedAnswer) -> QueryResult {
    let citations = answer
        .grounding_chunks
        .into_iter()
        .filter_map(|chunk| {
            let source_text = chunk.text.filter(|text| !text.is_empty())?;
            let source_ref = chunk.title.or(chunk.uri).unwrap_or_default();
            Some(Citation {
                source_text,
                source_ref,
            })
        })
        .collect();

    QueryResult {
        answer_text: answer.text,
        citations,
    }
}
