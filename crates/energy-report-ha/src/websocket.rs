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

//! Minimal Home Assistant WebSocket API client.
//!
//! The recorder and energy commands are only reachable over the WebSocket
//! API. One authenticated session is kept open and reused; commands are
//! serialized over it and the session is rebuilt after a transport failure.

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, trace, warn};

use crate::client::HomeAssistantClient;
use crate::errors::{HaError, HaResult};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct Session {
    stream: WsStream,
    next_id: u64,
}

pub struct HaWebSocketClient {
    url: String,
    token: String,
    timeout: Duration,
    session: Mutex<Option<Session>>,
}

impl std::fmt::Debug for HaWebSocketClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HaWebSocketClient")
            .field("url", &self.url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl HaWebSocketClient {
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
            timeout: Duration::from_secs(30),
            session: Mutex::new(None),
        }
    }

    /// Same host and token as an existing REST client
    pub fn from_client(client: &HomeAssistantClient) -> HaResult<Self> {
        Ok(Self::new(client.websocket_url()?, client.token()))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send one command and return its `result` payload.
    ///
    /// `payload` must be a JSON object (or null); its fields are merged next
    /// to `id` and `type`. A `success: false` answer becomes
    /// [`HaError::CommandFailed`] carrying the server's code and message.
    pub async fn command(&self, command_type: &str, payload: Value) -> HaResult<Value> {
        let mut message = match payload {
            Value::Object(map) => map,
            Value::Null => serde_json::Map::new(),
            other => {
                return Err(HaError::InvalidResponse(format!(
                    "command payload must be an object, got {other}"
                )));
            }
        };
        message.insert("type".to_owned(), Value::String(command_type.to_owned()));

        let mut guard = self.session.lock().await;
        let reused = guard.is_some();

        match self.exchange(&mut guard, command_type, &message).await {
            Err(e) if reused && is_transport_error(&e) => {
                debug!("🔄 [HA WS] Session dropped ({}), reconnecting", e);
                *guard = None;
                self.exchange(&mut guard, command_type, &message).await
            }
            other => other,
        }
    }

    /// Close the session if one is open
    pub async fn close(&self) {
        if let Some(mut session) = self.session.lock().await.take()
            && let Err(e) = session.stream.close(None).await
        {
            trace!("Closing WebSocket session failed: {}", e);
        }
    }

    async fn exchange(
        &self,
        slot: &mut Option<Session>,
        command_type: &str,
        message: &serde_json::Map<String, Value>,
    ) -> HaResult<Value> {
        let outcome = tokio::time::timeout(self.timeout, async {
            if slot.is_none() {
                *slot = Some(self.connect().await?);
            }
            let Some(session) = slot.as_mut() else {
                return Err(HaError::InvalidResponse("no WebSocket session".to_owned()));
            };

            let id = session.next_id;
            session.next_id += 1;

            let mut message = message.clone();
            message.insert("id".to_owned(), json!(id));
            debug!("📡 [HA WS] → {} (id {})", command_type, id);
            session
                .stream
                .send(Message::Text(Value::Object(message).to_string()))
                .await?;

            loop {
                let frame = next_json(&mut session.stream).await?;
                if frame.get("id").and_then(Value::as_u64) != Some(id)
                    || frame.get("type").and_then(Value::as_str) != Some("result")
                {
                    trace!("Skipping unrelated WebSocket message: {}", frame);
                    continue;
                }
                return command_result(command_type, frame);
            }
        })
        .await;

        let result = outcome.unwrap_or(Err(HaError::Timeout));
        if result.as_ref().is_err_and(is_transport_error) {
            *slot = None;
        }
        result
    }

    async fn connect(&self) -> HaResult<Session> {
        debug!("🔌 [HA WS] Connecting to {}", self.url);
        let (mut stream, _) = connect_async(self.url.as_str()).await?;

        let greeting = next_json(&mut stream).await?;
        if greeting.get("type").and_then(Value::as_str) != Some("auth_required") {
            return Err(HaError::InvalidResponse(format!(
                "expected auth_required, got {greeting}"
            )));
        }

        let auth = json!({"type": "auth", "access_token": self.token});
        stream.send(Message::Text(auth.to_string())).await?;

        let answer = next_json(&mut stream).await?;
        match answer.get("type").and_then(Value::as_str) {
            Some("auth_ok") => {
                info!(
                    "✅ [HA WS] Authenticated (Home Assistant {})",
                    answer
                        .get("ha_version")
                        .and_then(serde_json::Value::as_str)
                        .unwrap_or("unknown")
                );
                Ok(Session { stream, next_id: 1 })
            }
            Some("auth_invalid") => {
                warn!("❌ [HA WS] Authentication rejected");
                Err(HaError::AuthenticationFailed)
            }
            Some(_) | None => Err(HaError::InvalidResponse(format!(
                "unexpected authentication answer: {answer}"
            ))),
        }
    }
}

fn is_transport_error(error: &HaError) -> bool {
    matches!(error, HaError::WebSocket(_) | HaError::Timeout)
}

/// Next JSON text frame; control frames are skipped
async fn next_json(stream: &mut WsStream) -> HaResult<Value> {
    loop {
        let Some(message) = stream.next().await else {
            return Err(HaError::WebSocket(
                tokio_tungstenite::tungstenite::Error::ConnectionClosed,
            ));
        };

        match message? {
            Message::Text(text) => return Ok(serde_json::from_str(&text)?),
            Message::Binary(bytes) => return Ok(serde_json::from_slice(&bytes)?),
            Message::Close(_) => {
                return Err(HaError::WebSocket(
                    tokio_tungstenite::tungstenite::Error::ConnectionClosed,
                ));
            }
            Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
        }
    }
}

fn command_result(command_type: &str, mut frame: Value) -> HaResult<Value> {
    if frame.get("success").and_then(Value::as_bool) == Some(true) {
        return Ok(frame.get_mut("result").map(Value::take).unwrap_or(Value::Null));
    }

    let error = frame.get("error");
    let field = |name: &str| {
        error
            .and_then(|e| e.get(name))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned()
    };
    let code = field("code");
    let message = field("message");
    debug!("⚠️ [HA WS] {} failed: {} ({})", command_type, message, code);

    Err(HaError::CommandFailed {
        command: command_type.to_owned(),
        code,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server::{GOOD_TOKEN, failure, ok, spawn_server};
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn test_command_result_and_session_reuse() {
        let (url, connections) = spawn_server(|command| {
            ok(json!({"echo": command["type"], "ids": command["statistic_ids"]}))
        })
        .await;

        let client = HaWebSocketClient::new(url, GOOD_TOKEN);
        let first = client
            .command("recorder/info", Value::Null)
            .await
            .unwrap();
        let second = client
            .command(
                "recorder/get_statistics_metadata",
                json!({"statistic_ids": ["sensor.a"]}),
            )
            .await
            .unwrap();

        assert_eq!(first["echo"], "recorder/info");
        assert_eq!(second["ids"], json!(["sensor.a"]));
        assert_eq!(connections.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_command_keeps_server_message() {
        let (url, _) = spawn_server(|_| failure("unknown_command", "Unknown command.")).await;

        let client = HaWebSocketClient::new(url, GOOD_TOKEN);
        let err = client.command("energy/list", Value::Null).await.unwrap_err();

        assert_eq!(err.command_code(), Some("unknown_command"));
        assert_eq!(err.to_string(), "Unknown command.");
    }

    #[tokio::test]
    async fn test_invalid_token() {
        let (url, _) = spawn_server(|_| ok(Value::Null)).await;

        let client = HaWebSocketClient::new(url, "bad_token");
        let err = client.command("recorder/info", Value::Null).await.unwrap_err();

        assert!(matches!(err, HaError::AuthenticationFailed));
    }

    #[tokio::test]
    async fn test_reconnects_after_dropped_session() {
        let (url, connections) = spawn_server(|_| ok(json!("ok"))).await;

        let client = HaWebSocketClient::new(url, GOOD_TOKEN).with_timeout(Duration::from_secs(5));
        client.command("recorder/info", Value::Null).await.unwrap();
        assert!(client.command("drop_connection", Value::Null).await.is_err());

        let result = client.command("recorder/info", Value::Null).await.unwrap();
        assert_eq!(result, "ok");
        assert!(connections.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn test_rejects_non_object_payload() {
        let client = HaWebSocketClient::new("ws://127.0.0.1:1/api/websocket", "token");
        let err = client.command("recorder/info", json!([1, 2])).await.unwrap_err();
        assert!(matches!(err, HaError::InvalidResponse(_)));
    }
}
