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

use energy_report_core::StoreError;
use thiserror::Error;

/// Home Assistant API error types
#[derive(Error, Debug)]
pub enum HaError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("HA API returned error status {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Entity not found: {0}")]
    EntityNotFound(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Service call failed: {service} - {reason}")]
    ServiceCallFailed { service: String, reason: String },

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// The server answered a WebSocket command with `success: false`
    #[error("{message}")]
    CommandFailed {
        command: String,
        code: String,
        message: String,
    },

    #[error("Connection timeout")]
    Timeout,

    #[error("Authentication failed")]
    AuthenticationFailed,

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl HaError {
    /// Error code of a failed WebSocket command, if this is one
    pub fn command_code(&self) -> Option<&str> {
        match self {
            Self::CommandFailed { code, .. } => Some(code),
            Self::HttpError(_)
            | Self::ApiError { .. }
            | Self::EntityNotFound(_)
            | Self::InvalidResponse(_)
            | Self::JsonError(_)
            | Self::ServiceCallFailed { .. }
            | Self::WebSocket(_)
            | Self::Timeout
            | Self::AuthenticationFailed
            | Self::ConfigError(_) => None,
        }
    }
}

impl From<HaError> for StoreError {
    fn from(error: HaError) -> Self {
        match error {
            // Keep the server's text verbatim: callers match on it
            HaError::CommandFailed { message, .. } => StoreError::Call(message),
            HaError::InvalidResponse(message) => StoreError::InvalidResponse(message),
            HaError::JsonError(e) => StoreError::InvalidResponse(e.to_string()),
            other @ (HaError::HttpError(_)
            | HaError::ApiError { .. }
            | HaError::EntityNotFound(_)
            | HaError::ServiceCallFailed { .. }
            | HaError::WebSocket(_)
            | HaError::Timeout
            | HaError::AuthenticationFailed
            | HaError::ConfigError(_)) => StoreError::Call(other.to_string()),
        }
    }
}

pub type HaResult<T> = Result<T, HaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_code() {
        let failed = HaError::CommandFailed {
            command: "recorder/info".to_owned(),
            code: "unknown_command".to_owned(),
            message: "Unknown command.".to_owned(),
        };
        assert_eq!(failed.command_code(), Some("unknown_command"));
        assert_eq!(HaError::Timeout.command_code(), None);
        assert_eq!(
            HaError::EntityNotFound("sensor.x".to_owned()).command_code(),
            None
        );
    }

    #[test]
    fn test_store_error_keeps_command_message() {
        let failed = HaError::CommandFailed {
            command: "recorder/get_statistics_metadata".to_owned(),
            code: "home_assistant_error".to_owned(),
            message: "missing 1 required positional argument: 'hass'".to_owned(),
        };
        let error = StoreError::from(failed);
        assert!(matches!(error, StoreError::Call(_)));
        assert_eq!(
            error.message(),
            "missing 1 required positional argument: 'hass'"
        );
    }
}
