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

use crate::errors::{HaError, HaResult};
use crate::types::{HaEntityState, HaHistoryState};
use chrono::{DateTime, Utc};
use energy_report_types::StateChange;
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

const SUPERVISOR_BASE_URL: &str = "http://supervisor/core";

/// Home Assistant REST API client
#[derive(Clone)]
pub struct HomeAssistantClient {
    base_url: String,
    token: String,
    client: Client,
    max_retries: u32,
    retry_delay: Duration,
}

impl std::fmt::Debug for HomeAssistantClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HomeAssistantClient")
            .field("base_url", &self.base_url)
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl HomeAssistantClient {
    /// Create a new HA client with custom configuration
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> HaResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| HaError::ConfigError(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            token: token.into(),
            client,
            max_retries: 3,
            retry_delay: Duration::from_millis(500),
        })
    }

    /// Create HA client using Supervisor API environment variables
    /// This is the standard method for HA addons
    pub fn from_supervisor() -> HaResult<Self> {
        let token = std::env::var("SUPERVISOR_TOKEN").map_err(|_| {
            HaError::ConfigError(
                "SUPERVISOR_TOKEN environment variable not set. Are you running as an HA addon?"
                    .to_owned(),
            )
        })?;

        info!("Initializing HA client using Supervisor API");
        Self::new(SUPERVISOR_BASE_URL, token)
    }

    /// Create HA client from configuration values
    /// Falls back to environment variables, then to the Supervisor API
    pub fn from_config(ha_base_url: Option<String>, ha_token: Option<String>) -> HaResult<Self> {
        let token = ha_token
            .filter(|t| !t.trim().is_empty())
            .or_else(|| std::env::var("HA_TOKEN").ok());

        let Some(token) = token else {
            if std::env::var("SUPERVISOR_TOKEN").is_ok() {
                return Self::from_supervisor();
            }
            return Err(HaError::ConfigError(
                "HA token not found in config, HA_TOKEN or SUPERVISOR_TOKEN".to_owned(),
            ));
        };

        let base_url = ha_base_url
            .filter(|u| !u.trim().is_empty())
            .or_else(|| std::env::var("HA_BASE_URL").ok())
            .unwrap_or_else(|| "http://localhost:8123".to_owned());

        info!("Initializing HA client from configuration: {}", base_url);
        Self::new(base_url, token)
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// WebSocket endpoint matching the REST base URL
    pub fn websocket_url(&self) -> HaResult<String> {
        websocket_url(&self.base_url)
    }

    /// Get the state of a specific entity
    pub async fn get_state(&self, entity_id: &str) -> HaResult<HaEntityState> {
        let url = format!("{}/api/states/{}", self.base_url, entity_id);
        debug!("🔍 [HA QUERY] Getting state for entity: {}", entity_id);

        let response = self
            .retry_request(|| async { self.client.get(&url).bearer_auth(&self.token).send().await })
            .await?;

        match response.status() {
            StatusCode::OK => {
                let state = response.json::<HaEntityState>().await?;
                trace!("   Attributes: {:?}", state.attributes);
                Ok(state)
            }
            StatusCode::NOT_FOUND => {
                debug!("[HA QUERY] Entity not found: {}", entity_id);
                Err(HaError::EntityNotFound(entity_id.to_owned()))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                error!("❌ [HA ERROR] Authentication failed for entity: {}", entity_id);
                Err(HaError::AuthenticationFailed)
            }
            status => {
                let error_text = response.text().await.unwrap_or_default();
                error!("❌ [HA ERROR] Status {}: {}", status, error_text);
                Err(HaError::ApiError {
                    status: status.as_u16(),
                    message: error_text,
                })
            }
        }
    }

    /// Call a Home Assistant service
    ///
    /// # Arguments
    /// * `service` - Service name in format "domain.service" (e.g., "persistent_notification.create")
    /// * `data` - JSON data to send with the service call
    pub async fn call_service(&self, service: &str, data: Value) -> HaResult<()> {
        let Some((domain, name)) = service
            .split_once('.')
            .filter(|(domain, name)| !domain.is_empty() && !name.is_empty() && !name.contains('.'))
        else {
            error!("❌ [HA ERROR] Invalid service format: {}", service);
            return Err(HaError::ServiceCallFailed {
                service: service.to_owned(),
                reason: "Invalid service format, expected 'domain.service'".to_owned(),
            });
        };

        let url = format!("{}/api/services/{}/{}", self.base_url, domain, name);
        info!("📞 [HA SERVICE] Calling: {}", service);
        debug!("   Data: {}", data);

        let response = self
            .retry_request(|| async {
                self.client
                    .post(&url)
                    .bearer_auth(&self.token)
                    .json(&data)
                    .send()
                    .await
            })
            .await?;

        let status = response.status();
        match status {
            StatusCode::OK => {
                debug!("✅ [HA SERVICE] Success: {}", service);
                Ok(())
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                error!("❌ [HA SERVICE] Authentication failed for: {}", service);
                Err(HaError::AuthenticationFailed)
            }
            _status => {
                let error_msg = response.text().await.unwrap_or_default();
                error!("❌ [HA SERVICE] Failed: {} (status: {})", service, status);
                Err(HaError::ServiceCallFailed {
                    service: service.to_owned(),
                    reason: error_msg,
                })
            }
        }
    }

    /// Post a persistent notification, replacing any with the same id
    pub async fn create_notification(
        &self,
        title: &str,
        message: &str,
        notification_id: &str,
    ) -> HaResult<()> {
        self.call_service(
            "persistent_notification.create",
            json!({
                "title": title,
                "message": message,
                "notification_id": notification_id,
            }),
        )
        .await
    }

    /// Get Home Assistant configuration (including timezone and currency)
    pub async fn get_config(&self) -> HaResult<Value> {
        let url = format!("{}/api/config", self.base_url);
        debug!("Fetching Home Assistant configuration");

        let response = self
            .retry_request(|| async { self.client.get(&url).bearer_auth(&self.token).send().await })
            .await?;

        match response.status() {
            StatusCode::OK => Ok(response.json::<Value>().await?),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(HaError::AuthenticationFailed),
            status => Err(HaError::ApiError {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            }),
        }
    }

    /// Raw state changes of one entity, oldest first.
    ///
    /// Unlike a numeric series, every state is kept (including `unknown` and
    /// `unavailable`) so callers decide what to skip.
    pub async fn get_history(
        &self,
        entity_id: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> HaResult<Vec<StateChange>> {
        let start_encoded = urlencoding::encode(&start_time.to_rfc3339()).into_owned();
        let end_encoded = urlencoding::encode(&end_time.to_rfc3339()).into_owned();

        let url = format!(
            "{}/api/history/period/{}?filter_entity_id={}&end_time={}&minimal_response&no_attributes",
            self.base_url, start_encoded, entity_id, end_encoded
        );

        debug!("📊 [HA HISTORY] Fetching history for: {}", entity_id);
        debug!("   Time range: {} to {}", start_time, end_time);

        let response = self
            .retry_request(|| async { self.client.get(&url).bearer_auth(&self.token).send().await })
            .await?;

        match response.status() {
            StatusCode::OK => {
                // One inner array per entity
                let history: Vec<Vec<HaHistoryState>> = response.json().await?;
                let Some(entity_history) = history.into_iter().next() else {
                    debug!("⚠️ [HA HISTORY] No history data returned for {}", entity_id);
                    return Ok(Vec::new());
                };

                let changes: Vec<StateChange> = entity_history
                    .iter()
                    .filter_map(|state| {
                        let change = state.to_state_change();
                        if change.is_none() {
                            trace!("Could not parse timestamp: {}", state.last_changed);
                        }
                        change
                    })
                    .collect();

                debug!(
                    "✅ [HA HISTORY] Retrieved {} state change(s) for {}",
                    changes.len(),
                    entity_id
                );
                Ok(changes)
            }
            StatusCode::NOT_FOUND => Err(HaError::EntityNotFound(entity_id.to_owned())),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                error!("❌ [HA HISTORY] Authentication failed for: {}", entity_id);
                Err(HaError::AuthenticationFailed)
            }
            status => {
                let error_text = response.text().await.unwrap_or_default();
                error!("❌ [HA HISTORY] Status {}: {}", status, error_text);
                Err(HaError::ApiError {
                    status: status.as_u16(),
                    message: error_text,
                })
            }
        }
    }

    /// Retry a request with exponential backoff
    async fn retry_request<F, Fut>(&self, mut request_fn: F) -> HaResult<reqwest::Response>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<reqwest::Response, reqwest::Error>>,
    {
        let mut attempts = 0;
        let mut delay = self.retry_delay;

        loop {
            attempts += 1;
            match request_fn().await {
                Ok(response) => return Ok(response),
                Err(e) if attempts >= self.max_retries => {
                    error!("Request failed after {} attempts: {}", attempts, e);
                    return Err(HaError::HttpError(e));
                }
                Err(e) => {
                    warn!(
                        "Request failed (attempt {}/{}): {}. Retrying in {:?}",
                        attempts, self.max_retries, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2; // Exponential backoff
                }
            }
        }
    }

    /// Set custom retry configuration
    pub fn with_retry_config(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = retry_delay;
        self
    }
}

/// Derive the WebSocket API endpoint from a REST base URL.
///
/// `http` maps to `ws` and `https` to `wss`. The Supervisor proxy serves the
/// socket at `/core/websocket`, a direct core at `/api/websocket`.
pub fn websocket_url(base_url: &str) -> HaResult<String> {
    let base = base_url.trim().trim_end_matches('/');
    let (scheme, rest) = base
        .split_once("://")
        .ok_or_else(|| HaError::ConfigError(format!("Invalid Home Assistant URL: {base_url}")))?;

    let ws_scheme = match scheme.to_ascii_lowercase().as_str() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(HaError::ConfigError(format!(
                "Unsupported URL scheme '{other}' in {base_url}"
            )));
        }
    };

    if base == SUPERVISOR_BASE_URL {
        return Ok("ws://supervisor/core/websocket".to_owned());
    }
    Ok(format!("{ws_scheme}://{rest}/api/websocket"))
}
