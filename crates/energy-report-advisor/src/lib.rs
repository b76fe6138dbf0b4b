// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! Advisory paragraph from an OpenAI-compatible chat-completion endpoint.
//!
//! The report pipeline never sees a failure from this crate: every error is
//! logged with its cause and replaced by [`FALLBACK_MESSAGE`].

mod prompts;

use async_trait::async_trait;
use energy_report_core::AdviceProvider;
use energy_report_i18n::Language;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

pub use prompts::{Prompts, user_message};

/// Substituted for the advice whenever it cannot be produced
pub const FALLBACK_MESSAGE: &str = "La fonction n’est pas active actuellement.";

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TEMPERATURE: f64 = 0.6;
pub const DEFAULT_MAX_TOKENS: u32 = 600;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(25);

#[derive(Debug, Error)]
pub enum AdviceError {
    #[error("no API key configured")]
    MissingCredential,

    #[error("the conclusion is empty")]
    EmptyConclusion,

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("API returned status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response structure: {0}")]
    MalformedResponse(String),

    #[error("the generated content is empty")]
    EmptyContent,
}

pub type AdviceResult<T> = Result<T, AdviceError>;

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: Option<ChatReply>,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Value,
}

/// Text of a reply: a plain string, or the concatenated `text` parts
fn reply_text(content: &Value) -> String {
    match content {
        Value::String(text) => text.trim().to_owned(),
        Value::Array(parts) => parts
            .iter()
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .collect::<String>()
            .trim()
            .to_owned(),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::Object(_) => String::new(),
    }
}

#[derive(Clone)]
pub struct OpenAiAdvisor {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
    temperature: f64,
    max_tokens: u32,
    timeout: Duration,
}

impl std::fmt::Debug for OpenAiAdvisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiAdvisor")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("enabled", &self.is_enabled())
            .finish_non_exhaustive()
    }
}

impl OpenAiAdvisor {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into().trim().to_owned(),
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            model: DEFAULT_MODEL.to_owned(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_enabled(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Ask the endpoint for advice on `conclusion`
    pub async fn request_advice(
        &self,
        conclusion: &str,
        language: Language,
    ) -> AdviceResult<String> {
        if !self.is_enabled() {
            return Err(AdviceError::MissingCredential);
        }
        let conclusion = conclusion.trim();
        if conclusion.is_empty() {
            return Err(AdviceError::EmptyConclusion);
        }

        let prompts = Prompts::for_language(language);
        let user = user_message(conclusion, prompts.instruction);
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: prompts.system,
                },
                ChatMessage {
                    role: "user",
                    content: &user,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        debug!("🤖 Requesting advice from {} ({})", self.endpoint, self.model);

        let response = tokio::time::timeout(self.timeout, self.send(&request))
            .await
            .map_err(|_| AdviceError::Timeout(self.timeout))??;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .ok_or_else(|| AdviceError::MalformedResponse("no message in choices".to_owned()))?
            .content;

        let advice = reply_text(&content);
        if advice.is_empty() {
            return Err(AdviceError::EmptyContent);
        }
        info!("✅ Advice received ({} chars)", advice.chars().count());
        Ok(advice)
    }

    async fn send(&self, request: &ChatRequest<'_>) -> AdviceResult<ChatResponse> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(AdviceError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| AdviceError::MalformedResponse(format!("{e}: {body}")))
    }
}

/// Advice text, or the fallback with the cause logged
pub fn or_fallback(result: AdviceResult<String>) -> String {
    match result {
        Ok(advice) => advice,
        Err(AdviceError::MissingCredential) => {
            debug!("Advice disabled: no API key configured");
            FALLBACK_MESSAGE.to_owned()
        }
        Err(e) => {
            warn!("⚠️ Advice unavailable, using fallback: {}", e);
            FALLBACK_MESSAGE.to_owned()
        }
    }
}

#[async_trait]
impl AdviceProvider for OpenAiAdvisor {
    async fn advise(&self, conclusion: &str, language: Language) -> String {
        or_fallback(self.request_advice(conclusion, language).await)
    }
}
