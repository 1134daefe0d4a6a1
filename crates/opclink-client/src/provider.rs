// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Collaborator boundaries: certificates, transport and the secure
//! conversation.
//!
//! The runtime never touches cryptographic material or raw sockets
//! directly. The certificate store, the byte-stream transport and the
//! secure-conversation layer (handshake, chunking, token renewal, request
//! correlation) live behind these traits, and a production deployment
//! plugs in concrete implementations at application build time.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;

use crate::error::ClientResult;
use crate::services::{ServiceRequest, ServiceResponse};
use crate::types::{ApplicationDescription, EndpointDescription};
use crate::identity::UserIdentity;

// =============================================================================
// CertificateStore
// =============================================================================

/// Supplies the local instance certificate and validates remote ones.
#[async_trait]
pub trait CertificateStore: Send + Sync {
    /// Returns the DER certificate and PKCS#8 key for the local
    /// application, or `None` when the application runs without one.
    async fn local_certificate(
        &self,
        application: &ApplicationDescription,
    ) -> ClientResult<Option<(Vec<u8>, Vec<u8>)>>;

    /// Validates a remote certificate against the trust store.
    async fn validate_remote_certificate(&self, certificate: &[u8]) -> ClientResult<bool>;
}

// =============================================================================
// Transport
// =============================================================================

/// An established byte stream to a server.
pub trait TransportConnection: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T> TransportConnection for T where T: AsyncRead + AsyncWrite + Send + Unpin {}

/// Establishes raw transport connections.
#[async_trait]
pub trait TransportConnector: Send + Sync {
    /// Connects to the given connection string within the timeout.
    async fn connect(
        &self,
        connection_string: &str,
        timeout: Duration,
    ) -> ClientResult<Box<dyn TransportConnection>>;
}

// =============================================================================
// RequestChannel
// =============================================================================

/// The request/response exchange primitive.
///
/// Sends a service request and suspends until the correlated response
/// arrives, the token fires, or the underlying transport/security layer
/// fails. Both the secure conversation and the session channel wrapped
/// around it speak this contract.
#[async_trait]
pub trait RequestChannel: Send + Sync {
    /// Sends a request and returns the correlated response.
    async fn request(
        &self,
        request: ServiceRequest,
        token: &CancellationToken,
    ) -> ClientResult<ServiceResponse>;
}

// =============================================================================
// Conversation
// =============================================================================

/// An opened secure conversation with one endpoint.
///
/// A conversation owns request correlation and handles chunking and
/// security-token renewal internally.
#[async_trait]
pub trait Conversation: RequestChannel {
    /// Returns the server's namespace table.
    fn namespace_uris(&self) -> Vec<String> {
        vec!["http://opcfoundation.org/UA/".to_string()]
    }

    /// Gracefully closes the conversation.
    async fn close(&self) -> ClientResult<()>;
}

/// Produces opened conversations.
#[async_trait]
pub trait ConversationProvider: Send + Sync {
    /// Opens a conversation to the endpoint using the supplied identity.
    ///
    /// Implementations perform transport establishment, the secure
    /// handshake and session creation/activation before returning.
    async fn connect(
        &self,
        endpoint: &EndpointDescription,
        identity: &UserIdentity,
        token: &CancellationToken,
    ) -> ClientResult<Box<dyn Conversation>>;
}
