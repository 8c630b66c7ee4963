use anyhow::Result;
use reqwest::Client;
use std::future::Future;
use std::pin::Pin;
use tracing::debug;

use crate::config::ApiConfig;
use crate::providers;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    pub system_instruction: Option<String>,
}

impl GenerationRequest {
    pub fn new(cfg: &ApiConfig, prompt: impl Into<String>) -> Self {
        Self {
            model: cfg.model_name.clone(),
            prompt: prompt.into(),
            system_instruction: cfg.system_instruction.clone(),
        }
    }
}

pub type GenerationFuture<'a> = Pin<Box<dyn Future<Output = Result<String>> + 'a>>;

pub trait GenerationBackend {
    fn generate<'a>(&'a self, cfg: &'a ApiConfig, request: GenerationRequest)
    -> GenerationFuture<'a>;
}

#[derive(Debug, Clone)]
pub struct GeminiBackend {
    client: Client,
}

impl GeminiBackend {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl GenerationBackend for GeminiBackend {
    fn generate<'a>(
        &'a self,
        cfg: &'a ApiConfig,
        request: GenerationRequest,
    ) -> GenerationFuture<'a> {
        Box::pin(async move { providers::gemini::generate(&self.client, cfg, &request).await })
    }
}

/// Issues exactly one generation call per question.
pub struct Dispatcher<'a, B = GeminiBackend> {
    cfg: &'a ApiConfig,
    backend: B,
}

impl<'a> Dispatcher<'a, GeminiBackend> {
    pub fn new(client: Client, cfg: &'a ApiConfig) -> Self {
        Self {
            cfg,
            backend: GeminiBackend::new(client),
        }
    }
}

impl<'a, B> Dispatcher<'a, B>
where
    B: GenerationBackend,
{
    pub fn with_backend(cfg: &'a ApiConfig, backend: B) -> Self {
        Self { cfg, backend }
    }

    pub async fn ask(&self, prompt: &str) -> Result<String> {
        let request = GenerationRequest::new(self.cfg, prompt);
        debug!(
            model = %request.model,
            prompt_len = request.prompt.len(),
            "dispatching generation request"
        );
        self.backend.generate(self.cfg, request).await
    }
}
