//! Client for the Gemini `models/{model}:generateContent` REST endpoint.

use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ApiConfig;
use crate::dispatch::GenerationRequest;
use crate::providers::http_errors::api_request_error;

const API_KEY_HEADER: &str = "x-goog-api-key";
const USER_ROLE: &str = "user";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

impl<'a> Content<'a> {
    fn user_text(text: &'a str) -> Self {
        Self {
            role: USER_ROLE,
            parts: vec![Part { text }],
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

fn generate_url(base_url: &str, model: &str) -> String {
    format!(
        "{}/models/{}:generateContent",
        base_url.trim_end_matches('/'),
        model.trim().trim_start_matches("models/")
    )
}

fn build_body(request: &GenerationRequest) -> GenerateContentRequest<'_> {
    GenerateContentRequest {
        contents: vec![Content::user_text(&request.prompt)],
        system_instruction: request.system_instruction.as_deref().map(Content::user_text),
    }
}

/// Concatenates the non-thought text parts of the first candidate.
fn extract_text(response: GenerateContentResponse) -> Result<String> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason)
            .map(|reason| format!(" (block reason: {reason})"))
            .unwrap_or_default();
        return Err(anyhow!("Model returned no candidates{}", reason));
    };

    Ok(candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter(|part| !part.thought)
                .filter_map(|part| part.text)
                .collect::<String>()
        })
        .unwrap_or_default())
}

fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.to_string())
}

pub async fn generate(
    client: &Client,
    cfg: &ApiConfig,
    request: &GenerationRequest,
) -> Result<String> {
    let api_url = generate_url(&cfg.api_base_url, &request.model);
    let body = build_body(request);
    debug!(
        api_url = %api_url,
        model = %request.model,
        prompt_len = request.prompt.len(),
        has_system_instruction = request.system_instruction.is_some(),
        "sending gemini generateContent request"
    );

    let response = client
        .post(&api_url)
        .header(API_KEY_HEADER, &cfg.api_key)
        .json(&body)
        .send()
        .await
        .map_err(|err| {
            debug!(
                api_url = %api_url,
                model = %request.model,
                error = %err,
                "gemini request failed"
            );
            api_request_error(err, &api_url)
        })?;

    if !response.status().is_success() {
        let status = response.status();
        let response_body = response
            .text()
            .await
            .unwrap_or_else(|_| "<failed to read response body>".to_string());
        debug!(
            api_url = %api_url,
            model = %request.model,
            status = %status,
            response_body_len = response_body.len(),
            "gemini returned non-success status"
        );
        return Err(anyhow!(
            "Gemini API request failed with status {}: {}",
            status,
            api_error_message(&response_body)
        ));
    }

    let parsed: GenerateContentResponse = response
        .json()
        .await
        .context("Failed to parse Gemini generateContent response")?;
    let text = extract_text(parsed)?;
    debug!(
        model = %request.model,
        response_len = text.len(),
        "received gemini response"
    );
    Ok(text)
}
