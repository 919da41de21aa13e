//! GeminiFileSearchClient - Direct REST API implementation of [`RagService`].
//!
//! Talks to the Gemini File Search endpoints: stores, uploads as long-running
//! operations, grounded generation through the `fileSearch` tool, and deletion.
//! Credentials are loaded from secret.json or `GEMINI_API_KEY`.

use crate::config::{API_KEY_ENV, load_secret_config, resolve_gemini_config};
use async_trait::async_trait;
use ragchat_core::config::DEFAULT_MODEL;
use ragchat_core::{
    GeneratedAnswer, GroundingChunk, Operation, OperationHandle, RagError, RagService, Result,
    SourceFile, StoreId,
};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const UPLOAD_BASE: &str = "https://generativelanguage.googleapis.com/upload/v1beta";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const UPLOAD_TIMEOUT_SECS: u64 = 120;
const API_KEY_HEADER: &str = "x-goog-api-key";

/// [`RagService`] implementation that talks to the Gemini HTTP API.
#[derive(Clone)]
pub struct GeminiFileSearchClient {
    client: Client,
    api_key: String,
    model: String,
    api_base: String,
    upload_base: String,
}

impl GeminiFileSearchClient {
    /// Creates a new client with the provided API key and the default model.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            api_base: API_BASE.to_string(),
            upload_base: UPLOAD_BASE.to_string(),
        }
    }

    /// Loads credentials from `GEMINI_API_KEY` or secret.json.
    ///
    /// Model name defaults to `gemini-2.5-flash` if not specified.
    pub fn try_from_env() -> Result<Self> {
        let secrets = load_secret_config()?;
        let gemini = resolve_gemini_config(secrets, std::env::var(API_KEY_ENV).ok())?;

        let client = Self::new(gemini.api_key);
        Ok(match gemini.model_name {
            Some(model) => client.with_model(model),
            None => client,
        })
    }

    /// Overrides the model after construction.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Points the client at a different host, e.g. a regional endpoint or a proxy.
    pub fn with_base_urls(
        mut self,
        api_base: impl Into<String>,
        upload_base: impl Into<String>,
    ) -> Self {
        self.api_base = api_base.into();
        self.upload_base = upload_base.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        context: &str,
    ) -> Result<T> {
        let response = self.send(request, context).await?;
        response
            .json::<T>()
            .await
            .map_err(|err| map_decode_error(err, context))
    }

    /// Sends `request` with the API key attached as a header, never in the URL.
    async fn send(&self, request: RequestBuilder, context: &str) -> Result<reqwest::Response> {
        let response = request
            .header(API_KEY_HEADER, self.api_key.as_str())
            .send()
            .await
            .map_err(|err| map_transport_error(err, context))?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(map_http_error(status, &body_text));
        }

        Ok(response)
    }
}

#[async_trait]
impl RagService for GeminiFileSearchClient {
    async fn create_store(&self, display_name: &str) -> Result<StoreId> {
        let request = CreateStoreRequest {
            display_name: display_name.to_string(),
        };

        let store: FileSearchStore = self
            .send_json(
                self.client
                    .post(self.api_url("fileSearchStores"))
                    .json(&request)
                    .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
                "create store",
            )
            .await?;

        match store.name {
            Some(name) if !name.is_empty() => {
                tracing::info!(store = %name, "Created file search store");
                Ok(StoreId::new(name))
            }
            _ => Err(RagError::unknown("Failed to create RAG store: name is missing.")),
        }
    }

    async fn upload_file(&self, store: &StoreId, file: &SourceFile) -> Result<Operation> {
        let mime_type = file.mime_type();
        let metadata = serde_json::json!({
            "displayName": file.name,
            "mimeType": mime_type,
        });

        let part = reqwest::multipart::Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&mime_type)
            .map_err(|err| RagError::unknown(format!("Invalid MIME type {mime_type}: {err}")))?;
        let form = reqwest::multipart::Form::new()
            .text("metadata", metadata.to_string())
            .part("file", part);

        let url = format!("{}/{}:uploadToFileSearchStore", self.upload_base, store);

        let operation: OperationResource = self
            .send_json(
                self.client
                    .post(url)
                    .multipart(form)
                    .timeout(Duration::from_secs(UPLOAD_TIMEOUT_SECS)),
                "upload",
            )
            .await?;

        tracing::debug!(operation = %operation.name, file = %file.name, "Started upload operation");
        Ok(operation.into_operation())
    }

    async fn poll_operation(&self, handle: &OperationHandle) -> Result<Operation> {
        let operation: OperationResource = self
            .send_json(
                self.client
                    .get(self.api_url(handle.as_str()))
                    .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
                "operation",
            )
            .await?;
        Ok(operation.into_operation())
    }

    async fn generate_answer(&self, store: &StoreId, prompt: &str) -> Result<GeneratedAnswer> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![TextPart {
                    text: prompt.to_string(),
                }],
            }],
            tools: vec![Tool {
                file_search: FileSearchTool {
                    file_search_store_names: vec![store.to_string()],
                },
            }],
        };

        let url = self.api_url(&format!("models/{}:generateContent", self.model));
        let response: GenerateContentResponse = self
            .send_json(
                self.client
                    .post(url)
                    .json(&request)
                    .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
                "generateContent",
            )
            .await?;

        Ok(extract_answer(response))
    }

    async fn delete_store(&self, store: &StoreId, force: bool) -> Result<()> {
        let url = format!("{}/{}?force={}", self.api_base, store, force);
        self.send(
            self.client
                .delete(url)
                .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            "delete store",
        )
        .await?;

        tracing::info!(store = %store, "Deleted file search store");
        Ok(())
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateStoreRequest {
    display_name: String,
}

#[derive(Deserialize)]
struct FileSearchStore {
    name: Option<String>,
}

#[derive(Deserialize)]
struct OperationResource {
    name: String,
    #[serde(default)]
    done: Option<bool>,
    #[serde(default)]
    error: Option<OperationError>,
}

#[derive(Deserialize)]
struct OperationError {
    #[serde(default)]
    code: Option<i32>,
    #[serde(default)]
    message: Option<String>,
}

impl OperationResource {
    fn into_operation(self) -> Operation {
        let handle = OperationHandle::new(self.name);
        match (self.done.unwrap_or(false), self.error) {
            (_, Some(error)) => {
                let message = error.message.unwrap_or_else(|| "operation failed".to_string());
                let message = match error.code {
                    Some(code) => format!("{code}: {message}"),
                    None => message,
                };
                Operation::failed(handle, message)
            }
            (true, None) => Operation::succeeded(handle),
            (false, None) => Operation::pending(handle),
        }
    }
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    tools: Vec<Tool>,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<TextPart>,
}

#[derive(Serialize)]
struct TextPart {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    file_search: FileSearchTool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FileSearchTool {
    file_search_store_names: Vec<String>,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ContentResponse>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunkResponse>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingChunkResponse {
    retrieved_context: Option<RetrievedContext>,
}

#[derive(Deserialize)]
struct RetrievedContext {
    text: Option<String>,
    title: Option<String>,
    uri: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[allow(dead_code)]
    code: Option<i32>,
    message: Option<String>,
    status: Option<String>,
    #[serde(default)]
    details: Vec<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    reason: Option<String>,
}

/// Takes the first candidate's text parts and grounding chunks.
fn extract_answer(response: GenerateContentResponse) -> GeneratedAnswer {
    let Some(candidate) = response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
    else {
        return GeneratedAnswer::default();
    };

    let text = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<String>()
        })
        .unwrap_or_default();

    let grounding_chunks = candidate
        .grounding_metadata
        .map(|metadata| {
            metadata
                .grounding_chunks
                .into_iter()
                .filter_map(|chunk| chunk.retrieved_context)
                .map(|context| GroundingChunk {
                    text: context.text,
                    title: context.title,
                    uri: context.uri,
                })
                .collect()
        })
        .unwrap_or_default();

    GeneratedAnswer {
        text,
        grounding_chunks,
    }
}

/// A response body that is not the expected JSON.
fn map_decode_error(err: reqwest::Error, context: &str) -> RagError {
    let err = err.without_url();
    RagError::unknown(format!("Failed to parse Gemini {context} response: {err}"))
}

/// Classifies a failure that produced no HTTP response.
fn map_transport_error(err: reqwest::Error, context: &str) -> RagError {
    let err = err.without_url();
    if err.is_connect() || err.is_timeout() || err.is_request() {
        RagError::transient(format!("Gemini {context} request failed: {err}"))
    } else {
        RagError::unknown(format!("Gemini {context} request failed: {err}"))
    }
}

/// Classifies an HTTP error response by status code and error status, never by text.
fn map_http_error(status: StatusCode, body: &str) -> RagError {
    let parsed = serde_json::from_str::<ErrorWrapper>(body).ok();

    let (status_text, message, reasons) = match parsed {
        Some(wrapper) => {
            let reasons: Vec<String> = wrapper
                .error
                .details
                .into_iter()
                .filter_map(|detail| detail.reason)
                .collect();
            (
                wrapper.error.status.unwrap_or_default(),
                wrapper.error.message.unwrap_or_else(|| body.to_string()),
                reasons,
            )
        }
        None => (String::new(), body.to_string(), Vec::new()),
    };

    let message = if status_text.is_empty() {
        message
    } else {
        format!("{status_text}: {message}")
    };

    let credential = matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
        || matches!(status_text.as_str(), "UNAUTHENTICATED" | "PERMISSION_DENIED")
        || reasons.iter().any(|reason| reason == "API_KEY_INVALID");

    if credential {
        RagError::credential(message)
    } else if status == StatusCode::NOT_FOUND || status_text == "NOT_FOUND" {
        RagError::not_found(message)
    } else {
        RagError::unknown(format!("HTTP {}: {message}", status.as_u16()))
    }
}
