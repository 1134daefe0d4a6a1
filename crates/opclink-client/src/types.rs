// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Application, endpoint and option types.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// =============================================================================
// SecurityMode
// =============================================================================

/// Message security applied to a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SecurityMode {
    /// No message security.
    #[default]
    None,

    /// Messages are signed.
    Sign,

    /// Messages are signed and encrypted.
    SignAndEncrypt,
}

impl fmt::Display for SecurityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Sign => write!(f, "Sign"),
            Self::SignAndEncrypt => write!(f, "SignAndEncrypt"),
        }
    }
}

// =============================================================================
// ApplicationDescription
// =============================================================================

/// Describes the local client application to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ApplicationDescription {
    /// Human readable application name.
    pub application_name: String,

    /// Globally unique application uri.
    pub application_uri: String,

    /// Product uri.
    pub product_uri: String,
}

impl ApplicationDescription {
    /// Creates an application description.
    pub fn new(
        application_name: impl Into<String>,
        application_uri: impl Into<String>,
        product_uri: impl Into<String>,
    ) -> Self {
        Self {
            application_name: application_name.into(),
            application_uri: application_uri.into(),
            product_uri: product_uri.into(),
        }
    }
}

// =============================================================================
// EndpointDescription
// =============================================================================

/// Describes a remote server endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EndpointDescription {
    /// The endpoint url, e.g. `opc.tcp://plc-01:4840`.
    pub endpoint_url: String,

    /// Security mode required by the endpoint.
    pub security_mode: SecurityMode,

    /// Security policy uri required by the endpoint.
    pub security_policy_uri: Option<String>,

    /// DER-encoded server certificate, when known up front.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_certificate: Option<Vec<u8>>,
}

impl EndpointDescription {
    /// Creates an endpoint description for a url with no security.
    pub fn new(endpoint_url: impl Into<String>) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            ..Default::default()
        }
    }

    /// Sets the security mode.
    pub fn with_security_mode(mut self, mode: SecurityMode) -> Self {
        self.security_mode = mode;
        self
    }

    /// Sets the security policy uri.
    pub fn with_security_policy(mut self, uri: impl Into<String>) -> Self {
        self.security_policy_uri = Some(uri.into());
        self
    }
}

// =============================================================================
// MappedEndpoint
// =============================================================================

/// Maps a requested endpoint url to a concrete endpoint description.
///
/// When several mappings share a requested url, the last one wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappedEndpoint {
    /// The url callers ask for.
    pub requested_url: String,

    /// The endpoint actually connected to.
    pub endpoint: EndpointDescription,
}

impl MappedEndpoint {
    /// Creates a mapping.
    pub fn new(requested_url: impl Into<String>, endpoint: EndpointDescription) -> Self {
        Self {
            requested_url: requested_url.into(),
            endpoint,
        }
    }
}

// =============================================================================
// ClientOptions
// =============================================================================

/// Tunables for channels and subscriptions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientOptions {
    /// Transport connect timeout.
    #[serde(with = "duration_millis")]
    pub connect_timeout: Duration,

    /// Per-channel close wait during application disposal.
    #[serde(with = "duration_millis")]
    pub close_timeout: Duration,

    /// Session timeout requested from servers.
    #[serde(with = "duration_millis")]
    pub session_timeout: Duration,

    /// Capacity of the per-channel publish notification fan-out.
    pub publish_buffer_size: usize,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            close_timeout: Duration::from_secs(2),
            session_timeout: Duration::from_secs(120),
            publish_buffer_size: 64,
        }
    }
}

// Duration serialization helper
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_builder() {
        let endpoint = EndpointDescription::new("opc.tcp://plc-01:4840")
            .with_security_mode(SecurityMode::SignAndEncrypt)
            .with_security_policy("http://opcfoundation.org/UA/SecurityPolicy#Basic256Sha256");

        assert_eq!(endpoint.endpoint_url, "opc.tcp://plc-01:4840");
        assert_eq!(endpoint.security_mode, SecurityMode::SignAndEncrypt);
        assert!(endpoint.security_policy_uri.is_some());
    }

    #[test]
    fn test_default_options() {
        let options = ClientOptions::default();
        assert_eq!(options.close_timeout, Duration::from_secs(2));
        assert!(options.publish_buffer_size > 0);
    }
}
