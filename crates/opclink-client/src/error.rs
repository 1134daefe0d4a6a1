// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Client runtime error types.
//!
//! [`ClientError`] covers the four failure families the runtime surfaces:
//! codec errors, protocol status errors, connectivity errors and local
//! validation/lifecycle errors. Every variant maps to an OPC UA status
//! code for recording on bindings, and [`ClientError::is_retryable`]
//! drives the subscription retry loop.

use std::time::Duration;

use thiserror::Error;

use opclink_core::{CodecError, StatusCode};

// =============================================================================
// ClientError
// =============================================================================

/// Errors produced by the client runtime.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// A value failed to encode or decode.
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// The server returned a bad status code.
    #[error("Service failed with {status}")]
    Service {
        /// The returned status code.
        status: StatusCode,
    },

    /// No channel to the server is available.
    #[error("Not connected to the server")]
    NotConnected,

    /// Transport connect did not finish within the timeout.
    #[error("Connect timed out after {duration:?}")]
    ConnectTimeout {
        /// The timeout that elapsed.
        duration: Duration,
    },

    /// The transport or secure conversation failed.
    #[error("Transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
    },

    /// The channel was closed while an operation was in flight.
    #[error("Channel closed")]
    ChannelClosed,

    /// The operation was cancelled.
    #[error("Operation cancelled")]
    Cancelled,

    /// A local value failed the declared validation rules.
    #[error("Validation failed for '{field}': {message}")]
    Validation {
        /// The binding name that failed.
        field: String,
        /// Error message.
        message: String,
    },

    /// The application or subscription was already disposed.
    #[error("The application has been disposed")]
    Disposed,

    /// A second application instance was constructed.
    #[error("Only one application instance may exist per process")]
    AlreadyRunning,

    /// The application or subscription is misconfigured.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message.
        message: String,
    },

    /// The server answered with a different service than requested.
    #[error("Unexpected response, expected {expected}")]
    UnexpectedResponse {
        /// Name of the expected response.
        expected: &'static str,
    },
}

impl ClientError {
    /// Creates a service error from a status code.
    pub fn service(status: StatusCode) -> Self {
        Self::Service { status }
    }

    /// Creates a connect timeout error.
    pub fn connect_timeout(duration: Duration) -> Self {
        Self::ConnectTimeout { duration }
    }

    /// Creates a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a validation error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates an unexpected response error.
    pub fn unexpected_response(expected: &'static str) -> Self {
        Self::UnexpectedResponse { expected }
    }

    /// Returns `true` if retrying the operation may succeed.
    ///
    /// The subscription state machine retries on connectivity failures and
    /// bad service results; codec, validation and lifecycle errors are
    /// permanent.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClientError::Service { .. }
                | ClientError::NotConnected
                | ClientError::ConnectTimeout { .. }
                | ClientError::Transport { .. }
                | ClientError::ChannelClosed
        )
    }

    /// Returns the OPC UA status code that corresponds to this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ClientError::Codec(e) => e.status_code(),
            ClientError::Service { status } => *status,
            ClientError::NotConnected | ClientError::ChannelClosed => {
                StatusCode::BAD_SERVER_NOT_CONNECTED
            }
            ClientError::ConnectTimeout { .. } => StatusCode::BAD_TIMEOUT,
            ClientError::Transport { .. } => StatusCode::BAD_COMMUNICATION_ERROR,
            ClientError::Cancelled => StatusCode::BAD_REQUEST_CANCELLED_BY_CLIENT,
            ClientError::Validation { .. } => StatusCode::BAD_OUT_OF_RANGE,
            ClientError::Disposed
            | ClientError::AlreadyRunning
            | ClientError::Configuration { .. } => StatusCode::BAD_INVALID_STATE,
            ClientError::UnexpectedResponse { .. } => StatusCode::BAD_UNEXPECTED_ERROR,
        }
    }

    /// Returns the error type for logging/metrics.
    pub fn error_type(&self) -> &'static str {
        match self {
            ClientError::Codec(_) => "codec",
            ClientError::Service { .. } => "service",
            ClientError::NotConnected => "not_connected",
            ClientError::ConnectTimeout { .. } => "connect_timeout",
            ClientError::Transport { .. } => "transport",
            ClientError::ChannelClosed => "channel_closed",
            ClientError::Cancelled => "cancelled",
            ClientError::Validation { .. } => "validation",
            ClientError::Disposed => "disposed",
            ClientError::AlreadyRunning => "already_running",
            ClientError::Configuration { .. } => "configuration",
            ClientError::UnexpectedResponse { .. } => "unexpected_response",
        }
    }

    /// Returns a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Codec(_) => "데이터 변환 오류가 발생했습니다".to_string(),
            ClientError::Service { status } => format!("서버 오류 응답 ({})", status),
            ClientError::NotConnected => "서버에 연결되어 있지 않습니다".to_string(),
            ClientError::ConnectTimeout { duration } => {
                format!("연결 시간 초과 ({:.1}초)", duration.as_secs_f64())
            }
            ClientError::Transport { .. } => "통신 오류가 발생했습니다".to_string(),
            ClientError::ChannelClosed => "연결이 종료되었습니다".to_string(),
            ClientError::Cancelled => "작업이 취소되었습니다".to_string(),
            ClientError::Validation { field, message } => {
                format!("입력 검증 실패 ({}): {}", field, message)
            }
            ClientError::Disposed => "이미 종료되었습니다".to_string(),
            ClientError::AlreadyRunning => "애플리케이션이 이미 실행 중입니다".to_string(),
            ClientError::Configuration { .. } => "설정이 올바르지 않습니다".to_string(),
            ClientError::UnexpectedResponse { .. } => "잘못된 응답을 받았습니다".to_string(),
        }
    }
}

/// A Result type with ClientError.
pub type ClientResult<T> = Result<T, ClientError>;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        assert!(ClientError::NotConnected.is_retryable());
        assert!(ClientError::transport("reset").is_retryable());
        assert!(ClientError::connect_timeout(Duration::from_secs(2)).is_retryable());
        assert!(ClientError::service(StatusCode::BAD_TIMEOUT).is_retryable());
        assert!(!ClientError::validation("speed", "out of range").is_retryable());
        assert!(!ClientError::Disposed.is_retryable());
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ClientError::NotConnected.status_code(),
            StatusCode::BAD_SERVER_NOT_CONNECTED
        );
        assert_eq!(
            ClientError::Cancelled.status_code(),
            StatusCode::BAD_REQUEST_CANCELLED_BY_CLIENT
        );
        assert_eq!(
            ClientError::service(StatusCode::BAD_NODE_ID_UNKNOWN).status_code(),
            StatusCode::BAD_NODE_ID_UNKNOWN
        );
    }

    #[test]
    fn test_codec_conversion() {
        let codec = CodecError::unregistered_type("RecipeStep");
        let error: ClientError = codec.into();
        assert_eq!(
            error.status_code(),
            StatusCode::BAD_DATA_ENCODING_UNSUPPORTED
        );
        assert_eq!(error.error_type(), "codec");
    }
}
