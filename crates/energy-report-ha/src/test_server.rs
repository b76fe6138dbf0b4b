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

//! In-process fake of the Home Assistant WebSocket API

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;

pub const GOOD_TOKEN: &str = "good_token";

async fn send(ws: &mut WebSocketStream<TcpStream>, value: Value) {
    ws.send(Message::Text(value.to_string())).await.unwrap();
}

async fn receive(ws: &mut WebSocketStream<TcpStream>) -> Option<Value> {
    while let Some(Ok(message)) = ws.next().await {
        if let Message::Text(text) = message {
            return Some(serde_json::from_str(&text).unwrap());
        }
    }
    None
}

pub fn ok(result: Value) -> Value {
    json!({"success": true, "result": result})
}

pub fn failure(code: &str, message: &str) -> Value {
    json!({"success": false, "error": {"code": code, "message": message}})
}

/// Serve until the test ends, answering each command through `respond`.
///
/// Returns the socket URL and a connection counter. A command of type
/// `drop_connection` closes the socket without answering.
pub async fn spawn_server<F>(respond: F) -> (String, Arc<AtomicUsize>)
where
    F: Fn(&Value) -> Value + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/api/websocket", listener.local_addr().unwrap());
    let connections = Arc::new(AtomicUsize::new(0));
    let counter = connections.clone();
    let respond = Arc::new(respond);

    tokio::spawn(async move {
        while let Ok((tcp, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            let respond = respond.clone();
            tokio::spawn(async move {
                let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
                send(&mut ws, json!({"type": "auth_required"})).await;
                let Some(auth) = receive(&mut ws).await else {
                    return;
                };
                if auth["access_token"] != GOOD_TOKEN {
                    send(&mut ws, json!({"type": "auth_invalid"})).await;
                    return;
                }
                send(&mut ws, json!({"type": "auth_ok", "ha_version": "2024.6.0"})).await;

                while let Some(command) = receive(&mut ws).await {
                    if command["type"] == "drop_connection" {
                        return;
                    }
                    let mut answer = respond(&command);
                    answer["id"] = command["id"].clone();
                    answer["type"] = json!("result");
                    // Unrelated traffic the client has to skip
                    send(&mut ws, json!({"id": 999, "type": "event"})).await;
                    send(&mut ws, answer).await;
                }
            });
        }
    });

    (url, connections)
}
