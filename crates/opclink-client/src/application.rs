// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The application-scoped channel pool.
//!
//! [`UaApplication`] owns one [`ClientSessionChannel`] per distinct
//! endpoint url, created on first demand and shared by every caller.
//! Creation is single-flight: concurrent callers for the same url await
//! one in-flight attempt instead of racing. The pool can be suspended
//! (callers block until [`UaApplication::run`]) and disposed (all
//! channels close with a bounded wait and every dependent subscription
//! loop is cancelled transitively).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::channel::{ClientSessionChannel, CommunicationState};
use crate::error::{ClientError, ClientResult};
use crate::identity::IdentityProvider;
use crate::provider::{CertificateStore, ConversationProvider};
use crate::types::{ApplicationDescription, ClientOptions, EndpointDescription, MappedEndpoint};

/// One live application instance per process.
static INSTANCE_GUARD: AtomicBool = AtomicBool::new(false);

type ChannelFuture = Shared<BoxFuture<'static, ClientResult<Arc<ClientSessionChannel>>>>;

// =============================================================================
// UaApplicationBuilder
// =============================================================================

/// Builds the process-wide [`UaApplication`].
pub struct UaApplicationBuilder {
    local_description: ApplicationDescription,
    certificate_store: Option<Arc<dyn CertificateStore>>,
    identity_provider: Option<IdentityProvider>,
    mapped_endpoints: Vec<MappedEndpoint>,
    conversation_provider: Option<Arc<dyn ConversationProvider>>,
    options: ClientOptions,
}

impl UaApplicationBuilder {
    /// Starts building with the local application description.
    pub fn new(local_description: ApplicationDescription) -> Self {
        Self {
            local_description,
            certificate_store: None,
            identity_provider: None,
            mapped_endpoints: Vec::new(),
            conversation_provider: None,
            options: ClientOptions::default(),
        }
    }

    /// Sets the certificate store.
    pub fn certificate_store(mut self, store: Arc<dyn CertificateStore>) -> Self {
        self.certificate_store = Some(store);
        self
    }

    /// Sets the identity provider.
    pub fn identity_provider(mut self, provider: IdentityProvider) -> Self {
        self.identity_provider = Some(provider);
        self
    }

    /// Adds a mapped endpoint. When several mappings share a requested
    /// url, the one added last wins.
    pub fn mapped_endpoint(mut self, mapping: MappedEndpoint) -> Self {
        self.mapped_endpoints.push(mapping);
        self
    }

    /// Adds several mapped endpoints.
    pub fn mapped_endpoints(mut self, mappings: impl IntoIterator<Item = MappedEndpoint>) -> Self {
        self.mapped_endpoints.extend(mappings);
        self
    }

    /// Sets the secure-conversation provider. Required.
    pub fn conversation_provider(mut self, provider: Arc<dyn ConversationProvider>) -> Self {
        self.conversation_provider = Some(provider);
        self
    }

    /// Sets the client options.
    pub fn options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    /// Builds the application.
    ///
    /// Fails fast when another live instance exists or no conversation
    /// provider was supplied.
    pub fn build(self) -> ClientResult<Arc<UaApplication>> {
        let conversation_provider = self
            .conversation_provider
            .ok_or_else(|| ClientError::configuration("a conversation provider is required"))?;

        if INSTANCE_GUARD
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ClientError::AlreadyRunning);
        }

        let (suspension, _) = watch::channel(true);
        Ok(Arc::new(UaApplication {
            local_description: self.local_description,
            certificate_store: self.certificate_store,
            identity_provider: self.identity_provider,
            mapped_endpoints: self.mapped_endpoints,
            conversation_provider,
            options: self.options,
            channels: Mutex::new(HashMap::new()),
            suspension,
            completion: CancellationToken::new(),
            disposed: AtomicBool::new(false),
        }))
    }
}

// =============================================================================
// UaApplication
// =============================================================================

/// Process-wide registry of session channels, keyed by endpoint url.
pub struct UaApplication {
    local_description: ApplicationDescription,
    certificate_store: Option<Arc<dyn CertificateStore>>,
    identity_provider: Option<IdentityProvider>,
    mapped_endpoints: Vec<MappedEndpoint>,
    conversation_provider: Arc<dyn ConversationProvider>,
    options: ClientOptions,

    channels: Mutex<HashMap<String, ChannelFuture>>,

    /// `true` while running; `false` gates `get_channel` callers.
    suspension: watch::Sender<bool>,

    /// Fires on disposal; subscriptions link their retry loops to it.
    completion: CancellationToken,

    disposed: AtomicBool,
}

impl UaApplication {
    /// Starts building an application.
    pub fn builder(local_description: ApplicationDescription) -> UaApplicationBuilder {
        UaApplicationBuilder::new(local_description)
    }

    /// Returns the local application description.
    pub fn local_description(&self) -> &ApplicationDescription {
        &self.local_description
    }

    /// Returns the certificate store, when configured.
    pub fn certificate_store(&self) -> Option<&Arc<dyn CertificateStore>> {
        self.certificate_store.as_ref()
    }

    /// Returns the client options.
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Returns a token that fires when the application is disposed.
    pub fn completion_token(&self) -> CancellationToken {
        self.completion.clone()
    }

    /// Gets or creates the session channel for an endpoint url.
    ///
    /// Suspends while the application is suspended. Concurrent callers
    /// for the same url share one in-flight creation. Creation failures
    /// propagate to every waiting caller and evict the entry, so the next
    /// demand starts fresh; the pool itself never retries.
    pub async fn get_channel(
        self: &Arc<Self>,
        endpoint_url: &str,
        token: &CancellationToken,
    ) -> ClientResult<Arc<ClientSessionChannel>> {
        if endpoint_url.is_empty() {
            return Err(ClientError::configuration("endpoint url must not be empty"));
        }
        if self.disposed.load(Ordering::SeqCst) {
            return Err(ClientError::Disposed);
        }
        tracing::trace!(endpoint = endpoint_url, "Begin getting session channel");

        self.check_suspension(token).await?;

        let future = {
            let mut channels = self.channels.lock();
            match channels.get(endpoint_url) {
                Some(existing) => existing.clone(),
                None => {
                    let future = self.spawn_creation(endpoint_url.to_string());
                    channels.insert(endpoint_url.to_string(), future.clone());
                    future
                }
            }
        };

        tokio::select! {
            _ = token.cancelled() => Err(ClientError::Cancelled),
            _ = self.completion.cancelled() => Err(ClientError::Disposed),
            result = future => result,
        }
    }

    /// Suspends channel creation and closes every open channel.
    ///
    /// Individual close failures are swallowed so one failing channel
    /// cannot block suspension of the others.
    pub async fn suspend(&self) {
        tracing::debug!("Application suspended");
        self.suspension.send_replace(false);

        for channel in self.completed_channels() {
            if let Err(error) = channel.close().await {
                tracing::debug!(
                    endpoint = %channel.endpoint().endpoint_url,
                    error = %error,
                    "Error closing channel during suspend"
                );
            }
        }
    }

    /// Resumes channel creation; pending `get_channel` callers proceed.
    pub fn run(&self) {
        tracing::debug!("Application running");
        self.suspension.send_replace(true);
    }

    /// Disposes the application.
    ///
    /// Idempotent. Fires the completion token (cancelling dependent
    /// subscription loops), releases the process-wide instance slot and
    /// closes every channel with a bounded wait.
    pub async fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::debug!("Application disposing");
        self.completion.cancel();
        INSTANCE_GUARD.store(false, Ordering::SeqCst);

        let close_timeout = self.options.close_timeout;
        for channel in self.completed_channels() {
            let close = tokio::time::timeout(close_timeout, channel.close());
            if close.await.is_err() {
                tracing::warn!(
                    endpoint = %channel.endpoint().endpoint_url,
                    timeout = ?close_timeout,
                    "Channel did not close within the dispose timeout"
                );
            }
        }
    }

    /// Resolves an endpoint url through the mapped endpoints; the literal
    /// url is used when no mapping matches. Last match wins.
    fn resolve_endpoint(&self, endpoint_url: &str) -> EndpointDescription {
        self.mapped_endpoints
            .iter()
            .rev()
            .find(|mapping| mapping.requested_url == endpoint_url)
            .map(|mapping| mapping.endpoint.clone())
            .unwrap_or_else(|| EndpointDescription::new(endpoint_url))
    }

    /// Waits until the application is running.
    async fn check_suspension(&self, token: &CancellationToken) -> ClientResult<()> {
        let mut gate = self.suspension.subscribe();
        while !*gate.borrow() {
            tokio::select! {
                _ = token.cancelled() => return Err(ClientError::Cancelled),
                _ = self.completion.cancelled() => return Err(ClientError::Disposed),
                changed = gate.changed() => {
                    changed.map_err(|_| ClientError::Disposed)?;
                }
            }
        }
        Ok(())
    }

    /// Spawns a channel-creation task and returns its shared handle.
    ///
    /// The creation runs on its own task so it makes progress even when
    /// the original caller cancels its wait. A failed creation evicts the
    /// pool entry on completion — after the entry was inserted — so the
    /// next demand starts fresh instead of replaying the cached failure.
    fn spawn_creation(self: &Arc<Self>, endpoint_url: String) -> ChannelFuture {
        let app = Arc::clone(self);
        let url = endpoint_url.clone();
        let handle = tokio::spawn(async move { app.create_channel(url).await });

        let app = Arc::downgrade(self);
        async move {
            let result = handle
                .await
                .unwrap_or_else(|_| Err(ClientError::transport("channel creation task failed")));
            if result.is_err() {
                if let Some(app) = Weak::upgrade(&app) {
                    app.evict(&endpoint_url);
                }
            }
            result
        }
        .boxed()
        .shared()
    }

    async fn create_channel(
        self: Arc<Self>,
        endpoint_url: String,
    ) -> ClientResult<Arc<ClientSessionChannel>> {
        tracing::trace!(endpoint = %endpoint_url, "Begin creating session channel");
        let token = self.completion.child_token();
        self.check_suspension(&token).await?;

        let endpoint = self.resolve_endpoint(&endpoint_url);
        let channel = Arc::new(ClientSessionChannel::new(
            endpoint,
            self.identity_provider.clone(),
            Arc::clone(&self.conversation_provider),
            self.options.clone(),
        ));

        if let Err(error) = channel.open(&token).await {
            tracing::trace!(
                endpoint = %endpoint_url,
                error = %error,
                "Error creating session channel"
            );
            return Err(error);
        }

        // Abort on fault, evict on closing.
        self.watch_channel(endpoint_url.clone(), Arc::clone(&channel));

        tracing::trace!(endpoint = %endpoint_url, "Success creating session channel");
        Ok(channel)
    }

    /// Watches a channel's state: a fault aborts the channel, and the
    /// closing transition evicts the pool entry so the next request
    /// creates a fresh channel instead of reusing one mid-teardown.
    fn watch_channel(self: &Arc<Self>, endpoint_url: String, channel: Arc<ClientSessionChannel>) {
        let app = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut states = channel.state_changes();
            loop {
                let state = *states.borrow_and_update();
                match state {
                    CommunicationState::Faulted => {
                        tracing::trace!(
                            endpoint = %channel.endpoint().endpoint_url,
                            "Channel faulted, aborting"
                        );
                        channel.abort().await;
                    }
                    CommunicationState::Closing | CommunicationState::Closed => {
                        if let Some(app) = Weak::upgrade(&app) {
                            app.evict(&endpoint_url);
                        }
                        break;
                    }
                    _ => {}
                }
                if states.changed().await.is_err() {
                    break;
                }
            }
        });
    }

    fn evict(&self, endpoint_url: &str) {
        if self.channels.lock().remove(endpoint_url).is_some() {
            tracing::trace!(endpoint = endpoint_url, "Channel entry evicted");
        }
    }

    /// Returns every channel whose creation already finished successfully.
    fn completed_channels(&self) -> Vec<Arc<ClientSessionChannel>> {
        let channels = self.channels.lock();
        channels
            .values()
            .filter_map(|future| future.peek())
            .filter_map(|result| result.as_ref().ok().cloned())
            .collect()
    }

    /// Returns the number of live pool entries.
    pub fn channel_count(&self) -> usize {
        self.channels.lock().len()
    }
}

impl Drop for UaApplication {
    fn drop(&mut self) {
        // An un-disposed application still releases the instance slot and
        // cancels dependents; channel close needs a runtime and happens
        // only in dispose().
        if !self.disposed.swap(true, Ordering::SeqCst) {
            self.completion.cancel();
            INSTANCE_GUARD.store(false, Ordering::SeqCst);
        }
    }
}

impl std::fmt::Debug for UaApplication {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UaApplication")
            .field("application_uri", &self.local_description.application_uri)
            .field("channels", &self.channel_count())
            .field("disposed", &self.disposed.load(Ordering::SeqCst))
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_endpoint_last_match_wins() {
        // Exercised through the resolution logic alone; no instance guard
        // is taken here.
        let mappings = vec![
            MappedEndpoint::new(
                "opc.tcp://alias",
                EndpointDescription::new("opc.tcp://first:4840"),
            ),
            MappedEndpoint::new(
                "opc.tcp://alias",
                EndpointDescription::new("opc.tcp://second:4840"),
            ),
        ];

        let resolved = mappings
            .iter()
            .rev()
            .find(|m| m.requested_url == "opc.tcp://alias")
            .map(|m| m.endpoint.clone())
            .unwrap();
        assert_eq!(resolved.endpoint_url, "opc.tcp://second:4840");
    }
}
