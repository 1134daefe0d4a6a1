// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The subscription engine.
//!
//! A [`Subscription`] binds typed cells to server nodes and keeps them
//! live through a supervised state machine:
//!
//! ```text
//! Created ─► Opening ─► Opened ─► Closing ─► Closed ─► Opening ...
//!               ▲          │
//!               │          ▼
//!               └──── Faulted (back-off, then retry)
//! ```
//!
//! Any failure (channel acquisition, subscription creation, monitored-item
//! creation) reports `Faulted`, waits a fixed back-off and restarts from
//! the top, until the owning application is disposed or the subscription
//! is closed. Bindings are declared once through the
//! [`SubscriptionBuilder`]; inbound notifications are applied by a single
//! consumer task in arrival order, and local edits flow back to the server
//! through the write-back path after validation.

mod cell;
mod event;
mod item;
mod options;

pub use cell::{EventCell, EventQueueCell, QueueCell, Validator, ValueCell};
pub use event::{base_event_field, BaseEvent, UaEvent};
pub use item::{MonitoredItemKind, MonitoredItemStatus};
pub use options::MonitoredItemOptions;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use opclink_core::{DataValue, FromVariant, NodeId, StatusCode, Variant, VariantType};

use crate::application::UaApplication;
use crate::channel::{ClientSessionChannel, CommunicationState};
use crate::error::{ClientError, ClientResult};
use crate::services::{
    CreateMonitoredItemsRequest, CreateSubscriptionRequest, DeleteSubscriptionsRequest,
    MonitoredItemCreateRequest, MonitoringFilter, MonitoringParameters, NotificationData,
    PublishResponse, ReadRequest, ReadValueId, ServiceRequest, TimestampsToReturn, WriteRequest,
    WriteValue,
};
use crate::subscription::cell::{QueueSlot, ValueSlot, WriteCommand};
use crate::subscription::item::{ItemBinding, ItemSink};

/// Fixed back-off between retry rounds.
const RETRY_DELAY: Duration = Duration::from_secs(2);

/// Servers commonly cap monitored-item creation at 100 items per call.
const MAX_MONITORED_ITEMS_PER_CALL: usize = 100;

/// Default publishing interval in ms.
pub const DEFAULT_PUBLISHING_INTERVAL: f64 = 1000.0;

/// Default keep-alive count.
pub const DEFAULT_KEEP_ALIVE_COUNT: u32 = 10;

// =============================================================================
// SubscriptionSettings
// =============================================================================

/// Server-side parameters of a subscription.
#[derive(Debug, Clone)]
pub struct SubscriptionSettings {
    /// The endpoint url the subscription connects through.
    pub endpoint_url: String,

    /// Requested publish cadence in ms.
    pub publishing_interval: f64,

    /// Publish cycles between keep-alive messages.
    pub keep_alive_count: u32,

    /// Publish cycles the subscription survives without activity. Forced
    /// to at least three keep-alive counts on the wire.
    pub lifetime_count: u32,

    /// Notification cap per publish response (0 = unlimited).
    pub max_notifications_per_publish: u32,

    /// Relative priority among the session's subscriptions.
    pub priority: u8,
}

impl SubscriptionSettings {
    /// Creates settings for an endpoint with the defaults.
    pub fn new(endpoint_url: impl Into<String>) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            publishing_interval: DEFAULT_PUBLISHING_INTERVAL,
            keep_alive_count: DEFAULT_KEEP_ALIVE_COUNT,
            lifetime_count: 0,
            max_notifications_per_publish: 0,
            priority: 0,
        }
    }

    fn validate(&self) -> ClientResult<()> {
        if self.endpoint_url.is_empty() {
            return Err(ClientError::configuration(
                "a subscription needs an endpoint url",
            ));
        }
        if self.publishing_interval <= 0.0 {
            return Err(ClientError::configuration(
                "publishing interval must be greater than 0",
            ));
        }
        if self.keep_alive_count == 0 {
            return Err(ClientError::configuration(
                "keep-alive count must be greater than 0",
            ));
        }
        Ok(())
    }
}

// =============================================================================
// SubscriptionBuilder
// =============================================================================

/// Declares the bindings of a subscription and spawns its state machine.
///
/// This is the registration step: each `value`/`value_queue`/`event`/
/// `event_queue` call resolves one binding into its typed cell, and
/// [`SubscriptionBuilder::build`] wires the cells to the engine.
///
/// # Example
///
/// ```rust,ignore
/// let mut builder = Subscription::builder(app.clone(), "opc.tcp://plc-01:4840")
///     .publishing_interval(500.0)
///     .keep_alive_count(10);
///
/// let speed: ValueCell<f64> =
///     builder.value("Speed", MonitoredItemOptions::value("ns=4;s=Pump.Speed")?);
/// speed.validate_range(0.0..=20.0);
///
/// let alarms: EventQueueCell<BaseEvent> =
///     builder.event_queue("Alarms", MonitoredItemOptions::event("i=2253")?);
///
/// let subscription = builder.build()?;
/// ```
pub struct SubscriptionBuilder {
    application: Arc<UaApplication>,
    settings: SubscriptionSettings,
    items: Vec<ItemBinding>,
    write_tx: mpsc::UnboundedSender<WriteCommand>,
    write_rx: mpsc::UnboundedReceiver<WriteCommand>,
    dispatch_handle: Option<tokio::runtime::Handle>,
}

impl SubscriptionBuilder {
    /// Starts declaring a subscription against an endpoint url.
    pub fn new(application: Arc<UaApplication>, endpoint_url: impl Into<String>) -> Self {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        Self {
            application,
            settings: SubscriptionSettings::new(endpoint_url),
            items: Vec::new(),
            write_tx,
            write_rx,
            dispatch_handle: None,
        }
    }

    /// Sets the requested publish cadence in ms.
    pub fn publishing_interval(mut self, interval: f64) -> Self {
        self.settings.publishing_interval = interval;
        self
    }

    /// Sets the keep-alive count.
    pub fn keep_alive_count(mut self, count: u32) -> Self {
        self.settings.keep_alive_count = count;
        self
    }

    /// Sets the lifetime count.
    pub fn lifetime_count(mut self, count: u32) -> Self {
        self.settings.lifetime_count = count;
        self
    }

    /// Caps the notifications per publish response.
    pub fn max_notifications_per_publish(mut self, max: u32) -> Self {
        self.settings.max_notifications_per_publish = max;
        self
    }

    /// Sets the subscription priority.
    pub fn priority(mut self, priority: u8) -> Self {
        self.settings.priority = priority;
        self
    }

    /// Pins notification dispatch to a specific runtime, e.g. one whose
    /// threads are allowed to touch UI state.
    pub fn dispatch_on(mut self, handle: tokio::runtime::Handle) -> Self {
        self.dispatch_handle = Some(handle);
        self
    }

    /// Declares a scalar value binding.
    pub fn value<T>(&mut self, name: &str, options: MonitoredItemOptions) -> ValueCell<T>
    where
        T: FromVariant + Into<Variant> + Clone + Send + Sync + 'static,
    {
        let slot = ValueSlot::new(name.to_string());
        let filter = options.data_change_filter();
        let binding = ItemBinding::new(
            name.to_string(),
            options,
            MonitoredItemKind::Value,
            filter,
            ItemSink::Value(Arc::clone(&slot)),
        );
        let cell = ValueCell::new(slot, binding.client_handle, self.write_tx.clone());
        self.items.push(binding);
        cell
    }

    /// Declares a queued value binding.
    pub fn value_queue(&mut self, name: &str, options: MonitoredItemOptions) -> QueueCell {
        let slot = QueueSlot::new(name.to_string());
        let filter = options.data_change_filter();
        let binding = ItemBinding::new(
            name.to_string(),
            options,
            MonitoredItemKind::ValueQueue,
            filter,
            ItemSink::ValueQueue(Arc::clone(&slot)),
        );
        let cell = QueueCell::new(slot, binding.client_handle);
        self.items.push(binding);
        cell
    }

    /// Declares a single event binding; the filter is built from the
    /// event type's declared fields.
    pub fn event<E>(&mut self, name: &str, options: MonitoredItemOptions) -> EventCell<E>
    where
        E: UaEvent + Clone,
    {
        let client_handle = item::next_client_handle();
        let cell = EventCell::<E>::new(name.to_string(), client_handle);
        let current = Arc::clone(&cell.current);
        let binding_name = name.to_string();
        let sink = ItemSink::Event(Box::new(move |fields| {
            match E::from_event_fields(fields) {
                Some(event) => {
                    current.send_replace(Some(event));
                }
                None => tracing::warn!(
                    binding = %binding_name,
                    "Event fields could not be projected, skipped"
                ),
            }
        }));
        self.items.push(ItemBinding::with_handle(
            name.to_string(),
            client_handle,
            options,
            MonitoredItemKind::Event,
            Some(MonitoringFilter::Event(E::event_filter())),
            sink,
        ));
        cell
    }

    /// Declares a queued event binding.
    pub fn event_queue<E>(&mut self, name: &str, options: MonitoredItemOptions) -> EventQueueCell<E>
    where
        E: UaEvent,
    {
        let client_handle = item::next_client_handle();
        let cell = EventQueueCell::<E>::new(name.to_string(), client_handle);
        let queue = Arc::clone(&cell.queue);
        let binding_name = name.to_string();
        let sink = ItemSink::EventQueue(Box::new(move |fields| {
            match E::from_event_fields(fields) {
                Some(event) => queue.push(event),
                None => tracing::warn!(
                    binding = %binding_name,
                    "Event fields could not be projected, skipped"
                ),
            }
        }));
        self.items.push(ItemBinding::with_handle(
            name.to_string(),
            client_handle,
            options,
            MonitoredItemKind::EventQueue,
            Some(MonitoringFilter::Event(E::event_filter())),
            sink,
        ));
        cell
    }

    /// Validates the settings, wires the bindings to the engine and spawns
    /// the state-machine task.
    pub fn build(self) -> ClientResult<Arc<Subscription>> {
        self.settings.validate()?;

        let by_handle = self
            .items
            .iter()
            .enumerate()
            .map(|(index, item)| (item.client_handle, index))
            .collect();

        let (state_tx, _) = watch::channel(CommunicationState::Created);
        let loop_token = self.application.completion_token().child_token();

        let engine = Arc::new(Engine {
            application: self.application,
            settings: self.settings,
            items: self.items,
            by_handle,
            state_tx,
            subscription_id: AtomicU32::new(0),
            _write_tx: self.write_tx,
        });

        let run = Engine::run(Arc::clone(&engine), self.write_rx, loop_token.clone());
        let task = match self.dispatch_handle {
            Some(handle) => handle.spawn(run),
            None => tokio::spawn(run),
        };

        Ok(Arc::new(Subscription {
            engine,
            loop_token,
            task: Mutex::new(Some(task)),
            disposed: AtomicBool::new(false),
        }))
    }
}

// =============================================================================
// Subscription
// =============================================================================

/// A live subscription.
///
/// Observes as [`CommunicationState`] transitions only; transient network
/// failures surface as a temporary non-`Opened` state while the engine
/// retries in the background.
pub struct Subscription {
    engine: Arc<Engine>,
    loop_token: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
    disposed: AtomicBool,
}

impl Subscription {
    /// Starts declaring a subscription.
    pub fn builder(
        application: Arc<UaApplication>,
        endpoint_url: impl Into<String>,
    ) -> SubscriptionBuilder {
        SubscriptionBuilder::new(application, endpoint_url)
    }

    /// Returns the current state.
    pub fn state(&self) -> CommunicationState {
        *self.engine.state_tx.borrow()
    }

    /// Returns a stream of state transitions.
    pub fn state_changes(&self) -> watch::Receiver<CommunicationState> {
        self.engine.state_tx.subscribe()
    }

    /// Waits until the subscription reaches the given state.
    pub async fn wait_for_state(&self, target: CommunicationState) {
        let mut states = self.engine.state_tx.subscribe();
        loop {
            if *states.borrow_and_update() == target {
                return;
            }
            if states.changed().await.is_err() {
                return;
            }
        }
    }

    /// Returns the server-assigned subscription id while `Opened`, 0
    /// otherwise.
    pub fn subscription_id(&self) -> u32 {
        if self.state().is_opened() {
            self.engine.subscription_id.load(Ordering::SeqCst)
        } else {
            0
        }
    }

    /// Returns the per-binding server-side state.
    pub fn monitored_items(&self) -> Vec<MonitoredItemStatus> {
        self.engine.items.iter().map(ItemBinding::status).collect()
    }

    /// Returns the recorded validation errors per binding name.
    pub fn errors(&self) -> HashMap<String, Vec<String>> {
        self.engine
            .items
            .iter()
            .filter_map(|item| match &item.sink {
                ItemSink::Value(slot) => {
                    let errors = slot.errors();
                    (!errors.is_empty()).then(|| (item.name.clone(), errors))
                }
                _ => None,
            })
            .collect()
    }

    /// Closes the subscription.
    ///
    /// Idempotent. When currently `Opened`, the engine issues a
    /// best-effort subscription deletion before reporting `Closed`.
    pub async fn close(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.loop_token.cancel();
        if let Some(task) = self.task.lock().await.take() {
            let _ = task.await;
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("endpoint", &self.engine.settings.endpoint_url)
            .field("state", &self.state())
            .field("items", &self.engine.items.len())
            .finish()
    }
}

// =============================================================================
// Engine
// =============================================================================

/// What ended a served round.
#[derive(Debug, PartialEq, Eq)]
enum ServeOutcome {
    Cancelled,
    ChannelClosing,
}

/// Shared state of the subscription state machine.
struct Engine {
    application: Arc<UaApplication>,
    settings: SubscriptionSettings,
    items: Vec<ItemBinding>,
    by_handle: HashMap<u32, usize>,
    state_tx: watch::Sender<CommunicationState>,
    subscription_id: AtomicU32,

    /// Keeps the write channel open even when every cell was dropped, so
    /// the serve loop's receiver never closes underneath it.
    _write_tx: mpsc::UnboundedSender<WriteCommand>,
}

impl Engine {
    fn report(&self, state: CommunicationState) {
        let old = self.state_tx.send_replace(state);
        if old != state {
            tracing::debug!(
                endpoint = %self.settings.endpoint_url,
                old_state = %old,
                new_state = %state,
                "Subscription state changed"
            );
        }
    }

    /// The supervised retry loop.
    async fn run(
        engine: Arc<Engine>,
        mut write_rx: mpsc::UnboundedReceiver<WriteCommand>,
        token: CancellationToken,
    ) {
        while !token.is_cancelled() {
            engine.report(CommunicationState::Opening);

            let channel = match engine
                .application
                .get_channel(&engine.settings.endpoint_url, &token)
                .await
            {
                Ok(channel) => channel,
                Err(ClientError::Cancelled) | Err(ClientError::Disposed) => break,
                Err(error) => {
                    tracing::trace!(
                        endpoint = %engine.settings.endpoint_url,
                        error = %error,
                        "Error getting channel"
                    );
                    engine.report(CommunicationState::Faulted);
                    if !sleep_retry(&token).await {
                        break;
                    }
                    continue;
                }
            };

            let (id, notifications) = match engine.establish(&channel, &token).await {
                Ok(established) => established,
                Err(error) => {
                    tracing::error!(
                        endpoint = %engine.settings.endpoint_url,
                        error = %error,
                        "Error creating subscription"
                    );
                    engine.report(CommunicationState::Faulted);
                    if !sleep_retry(&token).await {
                        break;
                    }
                    continue;
                }
            };

            engine.report(CommunicationState::Opened);
            tracing::info!(
                endpoint = %engine.settings.endpoint_url,
                subscription_id = id,
                monitored_items = engine.items.len(),
                "Subscription opened"
            );

            let outcome = engine
                .serve(&channel, id, notifications, &mut write_rx, &token)
                .await;

            engine.report(CommunicationState::Closing);
            if channel.state().is_opened() {
                engine.delete_subscription(&channel, id).await;
            }
            engine.subscription_id.store(0, Ordering::SeqCst);
            engine.report(CommunicationState::Closed);

            if outcome == ServeOutcome::Cancelled {
                break;
            }
        }

        if *engine.state_tx.borrow() != CommunicationState::Closed {
            engine.report(CommunicationState::Closed);
        }
    }

    /// Creates the server-side subscription and the monitored items.
    async fn establish(
        &self,
        channel: &Arc<ClientSessionChannel>,
        token: &CancellationToken,
    ) -> ClientResult<(u32, broadcast::Receiver<Arc<PublishResponse>>)> {
        let settings = &self.settings;

        // Liveness floor from the protocol: the subscription must survive
        // at least three keep-alive periods.
        let lifetime_count = settings.lifetime_count.max(3 * settings.keep_alive_count);

        let request = CreateSubscriptionRequest {
            requested_publishing_interval: settings.publishing_interval,
            requested_lifetime_count: lifetime_count,
            requested_max_keep_alive_count: settings.keep_alive_count,
            max_notifications_per_publish: settings.max_notifications_per_publish,
            publishing_enabled: true,
            priority: settings.priority,
        };
        let response = channel
            .request(ServiceRequest::CreateSubscription(request), token)
            .await?
            .into_create_subscription()?;

        let id = response.subscription_id;
        self.subscription_id.store(id, Ordering::SeqCst);

        // Subscribe before creating items so no notification is missed.
        let notifications = channel.notifications();

        for item in &self.items {
            item.reset_create_state();
        }

        let namespace_uris = channel.namespace_uris().await;
        for chunk in self.items.chunks(MAX_MONITORED_ITEMS_PER_CALL) {
            let items_to_create: Vec<MonitoredItemCreateRequest> = chunk
                .iter()
                .map(|binding| MonitoredItemCreateRequest {
                    item_to_monitor: ReadValueId {
                        node_id: resolve_node(binding, &namespace_uris),
                        attribute_id: binding.options.attribute_id,
                        index_range: binding.options.index_range.clone(),
                    },
                    monitoring_mode: binding.monitoring_mode(),
                    requested_parameters: MonitoringParameters {
                        client_handle: binding.client_handle,
                        sampling_interval: binding.options.sampling_interval,
                        filter: binding.filter.clone(),
                        queue_size: binding.options.queue_size,
                        discard_oldest: binding.options.discard_oldest,
                    },
                })
                .collect();

            let request = CreateMonitoredItemsRequest {
                subscription_id: id,
                timestamps_to_return: TimestampsToReturn::Both,
                items_to_create,
            };
            let response = channel
                .request(ServiceRequest::CreateMonitoredItems(request), token)
                .await?
                .into_create_monitored_items()?;

            if response.results.len() != chunk.len() {
                tracing::warn!(
                    expected = chunk.len(),
                    received = response.results.len(),
                    "Monitored item results are partial"
                );
            }

            // Results map positionally onto the chunk's bindings. A bad
            // status is recorded and logged; the rest of the batch and the
            // remaining chunks still proceed.
            for (binding, result) in chunk.iter().zip(response.results.iter()) {
                binding.on_create_result(result);
                if result.status_code.is_bad() {
                    tracing::error!(
                        binding = %binding.name,
                        node_id = %binding.options.node_id,
                        status = %result.status_code,
                        "Error creating monitored item"
                    );
                }
            }
        }

        Ok((id, notifications))
    }

    /// The single consumer: applies notifications in arrival order and
    /// handles write-back commands, until cancellation or channel loss.
    async fn serve(
        &self,
        channel: &Arc<ClientSessionChannel>,
        id: u32,
        mut notifications: broadcast::Receiver<Arc<PublishResponse>>,
        write_rx: &mut mpsc::UnboundedReceiver<WriteCommand>,
        token: &CancellationToken,
    ) -> ServeOutcome {
        let mut states = channel.state_changes();
        if states.borrow_and_update().is_closing_or_closed() {
            return ServeOutcome::ChannelClosing;
        }

        loop {
            tokio::select! {
                _ = token.cancelled() => return ServeOutcome::Cancelled,

                changed = states.changed() => {
                    if changed.is_err() || states.borrow_and_update().is_closing_or_closed() {
                        return ServeOutcome::ChannelClosing;
                    }
                }

                publish = notifications.recv() => match publish {
                    Ok(response) => {
                        if response.subscription_id == id {
                            self.dispatch(&response);
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(count)) => {
                        tracing::warn!(
                            missed = count,
                            "Publish consumer lagged, notifications dropped"
                        );
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        return ServeOutcome::ChannelClosing;
                    }
                },

                command = write_rx.recv() => {
                    if let Some(command) = command {
                        self.write_back(channel, command, token).await;
                    }
                }
            }
        }
    }

    /// Routes one notification message to the bound cells.
    fn dispatch(&self, response: &PublishResponse) {
        for data in &response.notification_message.notification_data {
            match data {
                NotificationData::DataChange(changes) => {
                    for notification in &changes.monitored_items {
                        match self.by_handle.get(&notification.client_handle) {
                            Some(&index) => {
                                self.items[index].publish_value(notification.value.clone());
                            }
                            None => tracing::warn!(
                                client_handle = notification.client_handle,
                                "No binding for data change notification"
                            ),
                        }
                    }
                }
                NotificationData::Event(events) => {
                    for event in &events.events {
                        if event.event_fields.is_empty() {
                            tracing::warn!(
                                client_handle = event.client_handle,
                                "Event notification without fields, skipped"
                            );
                            continue;
                        }
                        match self.by_handle.get(&event.client_handle) {
                            Some(&index) => self.items[index].publish_event(&event.event_fields),
                            None => tracing::warn!(
                                client_handle = event.client_handle,
                                "No binding for event notification"
                            ),
                        }
                    }
                }
            }
        }
    }

    /// Writes a validated local edit to the server.
    ///
    /// The current server value is read first so the pending value can be
    /// coerced to the server's numeric type; the write status is recorded
    /// on the binding either way. Last write wins against concurrent
    /// inbound publishes.
    async fn write_back(
        &self,
        channel: &Arc<ClientSessionChannel>,
        command: WriteCommand,
        token: &CancellationToken,
    ) {
        let Some(&index) = self.by_handle.get(&command.client_handle) else {
            return;
        };
        let binding = &self.items[index];
        let ItemSink::Value(slot) = &binding.sink else {
            return;
        };

        let namespace_uris = channel.namespace_uris().await;
        let node_id = resolve_node(binding, &namespace_uris);

        let read = ReadRequest {
            max_age: 0.0,
            timestamps_to_return: TimestampsToReturn::Neither,
            nodes_to_read: vec![ReadValueId::value_of(node_id.clone())],
        };
        let server_type = match channel
            .request(ServiceRequest::Read(read), token)
            .await
            .and_then(|response| response.into_read())
        {
            Ok(response) => response
                .results
                .first()
                .map(|value| value.value().variant_type()),
            Err(error) => {
                tracing::debug!(
                    binding = %binding.name,
                    error = %error,
                    "Type-inference read failed"
                );
                None
            }
        };

        let value = match server_type {
            Some(server_type) if server_type != VariantType::Null => {
                command.value.coerce_numeric(server_type)
            }
            _ => command.value.clone(),
        };

        let write = WriteRequest {
            nodes_to_write: vec![WriteValue {
                node_id,
                attribute_id: binding.options.attribute_id,
                index_range: binding.options.index_range.clone(),
                value: DataValue::new(value),
            }],
        };
        let status = match channel
            .request(ServiceRequest::Write(write), token)
            .await
            .and_then(|response| response.into_write())
        {
            Ok(response) => response
                .results
                .first()
                .copied()
                .unwrap_or(StatusCode::BAD_UNEXPECTED_ERROR),
            Err(error) => error.status_code(),
        };

        slot.record_write_status(status);
        if status.is_bad() {
            tracing::error!(
                binding = %binding.name,
                node_id = %binding.options.node_id,
                status = %status,
                "Error writing value"
            );
        }
    }

    /// Best-effort deletion of the server-side subscription.
    async fn delete_subscription(&self, channel: &Arc<ClientSessionChannel>, id: u32) {
        // The loop token may already be cancelled here; deletion gets its
        // own token and a bounded wait.
        let delete_token = CancellationToken::new();
        let request = DeleteSubscriptionsRequest {
            subscription_ids: vec![id],
        };
        let delete = channel.request(ServiceRequest::DeleteSubscriptions(request), &delete_token);
        match tokio::time::timeout(RETRY_DELAY, delete).await {
            Ok(Ok(_)) => {
                tracing::debug!(subscription_id = id, "Subscription deleted");
            }
            Ok(Err(error)) => {
                tracing::error!(
                    subscription_id = id,
                    error = %error,
                    "Error deleting subscription"
                );
            }
            Err(_) => {
                tracing::error!(subscription_id = id, "Timed out deleting subscription");
            }
        }
    }
}

/// Resolves a binding's node id against the channel's namespace table.
/// Unresolvable ids keep their slot in the batch (order must hold) and let
/// the server report the failure.
fn resolve_node(binding: &ItemBinding, namespace_uris: &[String]) -> NodeId {
    binding
        .options
        .node_id
        .to_node_id(namespace_uris)
        .unwrap_or_else(|error| {
            tracing::error!(
                binding = %binding.name,
                node_id = %binding.options.node_id,
                error = %error,
                "Node id namespace not resolvable"
            );
            NodeId::NULL
        })
}

/// Sleeps the fixed back-off; `false` when cancelled.
async fn sleep_retry(token: &CancellationToken) -> bool {
    tokio::select! {
        _ = token.cancelled() => false,
        _ = tokio::time::sleep(RETRY_DELAY) => true,
    }
}
