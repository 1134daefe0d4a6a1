// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The session channel: one secure conversation, one endpoint.

use std::sync::Arc;

use tokio::sync::{broadcast, watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use async_trait::async_trait;

use crate::channel::CommunicationState;
use crate::error::{ClientError, ClientResult};
use crate::identity::{IdentityProvider, UserIdentity};
use crate::provider::{Conversation, ConversationProvider, RequestChannel};
use crate::services::{PublishRequest, ServiceRequest, ServiceResponse, SubscriptionAcknowledgement};
use crate::types::{ClientOptions, EndpointDescription};

// =============================================================================
// ClientSessionChannel
// =============================================================================

/// A stateful wrapper around one secure conversation to one endpoint.
///
/// The channel owns:
/// - the [`CommunicationState`] machine, observable via
///   [`ClientSessionChannel::state_changes`]
/// - service request forwarding with state checks
/// - the publish pump: a task that keeps one Publish request in flight and
///   fans received notification messages out to subscribers of
///   [`ClientSessionChannel::notifications`]
///
/// `Closed` and `Faulted` are terminal; reconnection means asking the
/// application pool for a channel again, which creates a fresh instance.
pub struct ClientSessionChannel {
    endpoint: EndpointDescription,
    identity_provider: Option<IdentityProvider>,
    provider: Arc<dyn ConversationProvider>,
    options: ClientOptions,

    state_tx: watch::Sender<CommunicationState>,
    publish_tx: broadcast::Sender<Arc<crate::services::PublishResponse>>,
    conversation: RwLock<Option<Arc<dyn Conversation>>>,
    namespace_uris: RwLock<Vec<String>>,
    pump: Mutex<Option<JoinHandle<()>>>,

    /// Fires when the channel begins closing; unblocks waiters and stops
    /// the pump.
    closing_token: CancellationToken,
}

impl ClientSessionChannel {
    /// Creates an unopened channel for an endpoint.
    pub fn new(
        endpoint: EndpointDescription,
        identity_provider: Option<IdentityProvider>,
        provider: Arc<dyn ConversationProvider>,
        options: ClientOptions,
    ) -> Self {
        let (state_tx, _) = watch::channel(CommunicationState::Created);
        let (publish_tx, _) = broadcast::channel(options.publish_buffer_size);
        Self {
            endpoint,
            identity_provider,
            provider,
            options,
            state_tx,
            publish_tx,
            conversation: RwLock::new(None),
            namespace_uris: RwLock::new(vec!["http://opcfoundation.org/UA/".to_string()]),
            pump: Mutex::new(None),
            closing_token: CancellationToken::new(),
        }
    }

    /// Returns the endpoint this channel talks to.
    pub fn endpoint(&self) -> &EndpointDescription {
        &self.endpoint
    }

    /// Returns the current state.
    pub fn state(&self) -> CommunicationState {
        *self.state_tx.borrow()
    }

    /// Returns a stream of state transitions.
    pub fn state_changes(&self) -> watch::Receiver<CommunicationState> {
        self.state_tx.subscribe()
    }

    /// Returns a stream of inbound publish notification messages.
    ///
    /// Every subscriber sees every message; filtering by subscription id
    /// is the consumer's business.
    pub fn notifications(&self) -> broadcast::Receiver<Arc<crate::services::PublishResponse>> {
        self.publish_tx.subscribe()
    }

    /// Returns the server namespace table learned at open.
    pub async fn namespace_uris(&self) -> Vec<String> {
        self.namespace_uris.read().await.clone()
    }

    /// Completes when the channel begins closing.
    pub async fn closing(&self) {
        self.closing_token.cancelled().await;
    }

    /// Opens the channel: resolves the identity, connects the secure
    /// conversation within the connect timeout and starts the publish pump.
    pub async fn open(self: &Arc<Self>, token: &CancellationToken) -> ClientResult<()> {
        if self.state() != CommunicationState::Created {
            return Err(ClientError::configuration(
                "a session channel can only be opened once",
            ));
        }
        self.set_state(CommunicationState::Opening);

        let identity = match &self.identity_provider {
            Some(provider) => provider(&self.endpoint).await?,
            None => UserIdentity::Anonymous,
        };

        let connect = self.provider.connect(&self.endpoint, &identity, token);
        let conversation: Arc<dyn Conversation> =
            match tokio::time::timeout(self.options.connect_timeout, connect).await {
                Ok(Ok(conversation)) => Arc::from(conversation),
                Ok(Err(error)) => {
                    self.set_state(CommunicationState::Faulted);
                    return Err(error);
                }
                Err(_) => {
                    self.set_state(CommunicationState::Faulted);
                    return Err(ClientError::connect_timeout(self.options.connect_timeout));
                }
            };

        *self.namespace_uris.write().await = conversation.namespace_uris();
        *self.conversation.write().await = Some(Arc::clone(&conversation));
        self.set_state(CommunicationState::Opened);

        let pump = tokio::spawn(Self::publish_pump(Arc::clone(self), conversation));
        *self.pump.lock().await = Some(pump);

        tracing::info!(endpoint = %self.endpoint.endpoint_url, "Session channel opened");
        Ok(())
    }

    /// Sends a request and suspends until the correlated response arrives.
    pub async fn request(
        &self,
        request: ServiceRequest,
        token: &CancellationToken,
    ) -> ClientResult<ServiceResponse> {
        if !self.state().is_opened() {
            return Err(ClientError::NotConnected);
        }
        let conversation = {
            let guard = self.conversation.read().await;
            guard.clone().ok_or(ClientError::NotConnected)?
        };

        tokio::select! {
            _ = self.closing_token.cancelled() => Err(ClientError::ChannelClosed),
            _ = token.cancelled() => Err(ClientError::Cancelled),
            result = conversation.request(request, token) => result,
        }
    }

    /// Gracefully closes the channel.
    ///
    /// Signals `Closing` first (evicting the channel from the pool), stops
    /// the pump, then closes the conversation best effort.
    pub async fn close(&self) -> ClientResult<()> {
        if self.state().is_terminal() {
            return Ok(());
        }
        self.set_state(CommunicationState::Closing);
        self.closing_token.cancel();
        self.stop_pump().await;

        let conversation = self.conversation.write().await.take();
        if let Some(conversation) = conversation {
            if let Err(error) = conversation.close().await {
                tracing::debug!(
                    endpoint = %self.endpoint.endpoint_url,
                    error = %error,
                    "Error closing conversation"
                );
            }
        }

        self.set_state(CommunicationState::Closed);
        tracing::info!(endpoint = %self.endpoint.endpoint_url, "Session channel closed");
        Ok(())
    }

    /// Aborts the channel without server round trips.
    pub async fn abort(&self) {
        if self.state().is_terminal() {
            return;
        }
        self.set_state(CommunicationState::Closing);
        self.closing_token.cancel();
        self.stop_pump().await;
        self.conversation.write().await.take();
        self.set_state(CommunicationState::Closed);
        tracing::debug!(endpoint = %self.endpoint.endpoint_url, "Session channel aborted");
    }

    /// Marks the channel faulted; requests fail from here on.
    fn fault(&self) {
        if !self.state().is_terminal() {
            self.set_state(CommunicationState::Faulted);
        }
    }

    fn set_state(&self, new_state: CommunicationState) {
        let old_state = self.state_tx.send_replace(new_state);
        if old_state != new_state {
            tracing::trace!(
                endpoint = %self.endpoint.endpoint_url,
                old_state = %old_state,
                new_state = %new_state,
                "Channel state changed"
            );
        }
    }

    async fn stop_pump(&self) {
        if let Some(pump) = self.pump.lock().await.take() {
            // The pump watches the closing token; give it a moment, then
            // drop the handle. Aborting is safe, the task holds no locks
            // across awaits.
            pump.abort();
            let _ = pump.await;
        }
    }

    /// Keeps one Publish request in flight, acknowledging delivered
    /// messages and fanning responses out to subscribers.
    async fn publish_pump(channel: Arc<Self>, conversation: Arc<dyn Conversation>) {
        let token = channel.closing_token.child_token();
        let mut acknowledgements: Vec<SubscriptionAcknowledgement> = Vec::new();

        loop {
            let request = ServiceRequest::Publish(PublishRequest {
                subscription_acknowledgements: std::mem::take(&mut acknowledgements),
            });

            let response = tokio::select! {
                _ = token.cancelled() => break,
                result = conversation.request(request, &token) => result,
            };

            match response {
                Ok(ServiceResponse::Publish(response)) => {
                    acknowledgements.push(SubscriptionAcknowledgement {
                        subscription_id: response.subscription_id,
                        sequence_number: response.notification_message.sequence_number,
                    });
                    // No receivers is fine; subscriptions come and go.
                    let _ = channel.publish_tx.send(Arc::new(response));
                }
                Ok(other) => {
                    tracing::error!(
                        endpoint = %channel.endpoint.endpoint_url,
                        response = ?other,
                        "Publish returned a mismatched response"
                    );
                }
                Err(ClientError::Cancelled) | Err(ClientError::ChannelClosed) => break,
                Err(error) => {
                    tracing::warn!(
                        endpoint = %channel.endpoint.endpoint_url,
                        error = %error,
                        "Publish pump failed, faulting channel"
                    );
                    channel.fault();
                    break;
                }
            }
        }
    }
}

#[async_trait]
impl RequestChannel for ClientSessionChannel {
    async fn request(
        &self,
        request: ServiceRequest,
        token: &CancellationToken,
    ) -> ClientResult<ServiceResponse> {
        ClientSessionChannel::request(self, request, token).await
    }
}

impl std::fmt::Debug for ClientSessionChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSessionChannel")
            .field("endpoint", &self.endpoint.endpoint_url)
            .field("state", &self.state())
            .finish()
    }
}
