// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Scripted mock conversation for integration tests.
//!
//! The mock plays the server side of the conversation boundary:
//! configurable failure injection, recorded interactions for
//! verification, and a push channel for publish notifications so tests
//! control exactly when and in what order notifications arrive.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio_util::sync::CancellationToken;

use opclink_client::core::{DataValue, NodeId, StatusCode, Variant};
use opclink_client::services::{
    CreateMonitoredItemsResponse, CreateSubscriptionResponse, DataChangeNotification,
    DeleteSubscriptionsResponse, EventFieldList, EventNotificationList,
    MonitoredItemCreateResult, MonitoredItemNotification, NotificationData, NotificationMessage,
    PublishResponse, ReadResponse, ServiceRequest, ServiceResponse, WriteResponse,
};
use opclink_client::{
    ApplicationDescription, ClientError, ClientResult, Conversation, ConversationProvider,
    RequestChannel, UaApplication, UserIdentity,
};

// =============================================================================
// MockServer
// =============================================================================

/// Shared state scripted by the test and observed by every conversation.
pub struct MockServer {
    /// Node values served to Read calls.
    values: Mutex<HashMap<NodeId, Variant>>,

    /// Client handles that get a bad create status.
    bad_create_handles: Mutex<HashSet<u32>>,

    /// Recorded writes, in order.
    write_history: Mutex<Vec<(NodeId, Variant)>>,

    /// Item counts of each CreateMonitoredItems call, in order.
    create_item_calls: Mutex<Vec<usize>>,

    /// Node ids of every created item, in request order.
    created_item_nodes: Mutex<Vec<NodeId>>,

    /// Deleted subscription ids.
    deleted_subscriptions: Mutex<Vec<u32>>,

    /// Pushed publish responses, consumed by the publish pump.
    publish_rx: AsyncMutex<mpsc::UnboundedReceiver<PublishResponse>>,
    publish_tx: mpsc::UnboundedSender<PublishResponse>,

    /// Force connection attempts to fail.
    fail_connections: AtomicBool,

    /// Artificial connect latency, widens single-flight race windows.
    connect_delay: Mutex<Duration>,

    connect_count: AtomicU32,
    read_count: AtomicU32,
    write_count: AtomicU32,
    next_subscription_id: AtomicU32,
    next_monitored_item_id: AtomicU32,
}

impl MockServer {
    pub fn new() -> Arc<Self> {
        let (publish_tx, publish_rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            values: Mutex::new(HashMap::new()),
            bad_create_handles: Mutex::new(HashSet::new()),
            write_history: Mutex::new(Vec::new()),
            create_item_calls: Mutex::new(Vec::new()),
            created_item_nodes: Mutex::new(Vec::new()),
            deleted_subscriptions: Mutex::new(Vec::new()),
            publish_rx: AsyncMutex::new(publish_rx),
            publish_tx,
            fail_connections: AtomicBool::new(false),
            connect_delay: Mutex::new(Duration::ZERO),
            connect_count: AtomicU32::new(0),
            read_count: AtomicU32::new(0),
            write_count: AtomicU32::new(0),
            next_subscription_id: AtomicU32::new(1),
            next_monitored_item_id: AtomicU32::new(100),
        })
    }

    // -------------------------------------------------------------------------
    // Scripting
    // -------------------------------------------------------------------------

    pub fn set_value(&self, node_id: NodeId, value: Variant) {
        self.values.lock().insert(node_id, value);
    }

    pub fn fail_connections(&self, fail: bool) {
        self.fail_connections.store(fail, Ordering::SeqCst);
    }

    pub fn set_connect_delay(&self, delay: Duration) {
        *self.connect_delay.lock() = delay;
    }

    pub fn fail_create_for_handle(&self, client_handle: u32) {
        self.bad_create_handles.lock().insert(client_handle);
    }

    /// Pushes a data-change notification for one monitored item.
    pub fn push_data_change(&self, subscription_id: u32, client_handle: u32, value: Variant) {
        self.push_publish(PublishResponse {
            subscription_id,
            available_sequence_numbers: Vec::new(),
            more_notifications: false,
            notification_message: NotificationMessage {
                sequence_number: 0,
                publish_time: None,
                notification_data: vec![NotificationData::DataChange(DataChangeNotification {
                    monitored_items: vec![MonitoredItemNotification {
                        client_handle,
                        value: DataValue::new(value),
                    }],
                })],
            },
            results: Vec::new(),
        });
    }

    /// Pushes an event notification for one monitored item.
    pub fn push_event(&self, subscription_id: u32, client_handle: u32, fields: Vec<Variant>) {
        self.push_publish(PublishResponse {
            subscription_id,
            available_sequence_numbers: Vec::new(),
            more_notifications: false,
            notification_message: NotificationMessage {
                sequence_number: 0,
                publish_time: None,
                notification_data: vec![NotificationData::Event(EventNotificationList {
                    events: vec![EventFieldList {
                        client_handle,
                        event_fields: fields,
                    }],
                })],
            },
            results: Vec::new(),
        });
    }

    /// Pushes a raw publish response.
    pub fn push_publish(&self, response: PublishResponse) {
        let _ = self.publish_tx.send(response);
    }

    // -------------------------------------------------------------------------
    // Verification
    // -------------------------------------------------------------------------

    pub fn connect_count(&self) -> u32 {
        self.connect_count.load(Ordering::SeqCst)
    }

    pub fn read_count(&self) -> u32 {
        self.read_count.load(Ordering::SeqCst)
    }

    pub fn write_count(&self) -> u32 {
        self.write_count.load(Ordering::SeqCst)
    }

    pub fn write_history(&self) -> Vec<(NodeId, Variant)> {
        self.write_history.lock().clone()
    }

    pub fn create_item_calls(&self) -> Vec<usize> {
        self.create_item_calls.lock().clone()
    }

    pub fn created_item_nodes(&self) -> Vec<NodeId> {
        self.created_item_nodes.lock().clone()
    }

    pub fn deleted_subscriptions(&self) -> Vec<u32> {
        self.deleted_subscriptions.lock().clone()
    }

    pub fn last_subscription_id(&self) -> u32 {
        self.next_subscription_id.load(Ordering::SeqCst) - 1
    }
}

// =============================================================================
// MockConversation
// =============================================================================

pub struct MockProvider {
    server: Arc<MockServer>,
}

impl MockProvider {
    pub fn new(server: Arc<MockServer>) -> Arc<Self> {
        Arc::new(Self { server })
    }
}

#[async_trait]
impl ConversationProvider for MockProvider {
    async fn connect(
        &self,
        _endpoint: &opclink_client::EndpointDescription,
        _identity: &UserIdentity,
        _token: &CancellationToken,
    ) -> ClientResult<Box<dyn Conversation>> {
        let delay = *self.server.connect_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.server.fail_connections.load(Ordering::SeqCst) {
            return Err(ClientError::transport("connection refused"));
        }
        self.server.connect_count.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockConversation {
            server: Arc::clone(&self.server),
        }))
    }
}

struct MockConversation {
    server: Arc<MockServer>,
}

#[async_trait]
impl RequestChannel for MockConversation {
    async fn request(
        &self,
        request: ServiceRequest,
        token: &CancellationToken,
    ) -> ClientResult<ServiceResponse> {
        let server = &self.server;
        match request {
            ServiceRequest::Read(request) => {
                server.read_count.fetch_add(1, Ordering::SeqCst);
                let values = server.values.lock();
                let results = request
                    .nodes_to_read
                    .iter()
                    .map(|read| match values.get(&read.node_id) {
                        Some(value) => DataValue::new(value.clone()),
                        None => DataValue::from_status(StatusCode::BAD_NODE_ID_UNKNOWN),
                    })
                    .collect();
                Ok(ServiceResponse::Read(ReadResponse { results }))
            }

            ServiceRequest::Write(request) => {
                server.write_count.fetch_add(1, Ordering::SeqCst);
                let mut results = Vec::new();
                for write in &request.nodes_to_write {
                    server
                        .write_history
                        .lock()
                        .push((write.node_id.clone(), write.value.value().clone()));
                    server
                        .values
                        .lock()
                        .insert(write.node_id.clone(), write.value.value().clone());
                    results.push(StatusCode::GOOD);
                }
                Ok(ServiceResponse::Write(WriteResponse { results }))
            }

            ServiceRequest::CreateSubscription(request) => {
                let id = server.next_subscription_id.fetch_add(1, Ordering::SeqCst);
                Ok(ServiceResponse::CreateSubscription(
                    CreateSubscriptionResponse {
                        subscription_id: id,
                        revised_publishing_interval: request.requested_publishing_interval,
                        revised_lifetime_count: request.requested_lifetime_count,
                        revised_max_keep_alive_count: request.requested_max_keep_alive_count,
                    },
                ))
            }

            ServiceRequest::CreateMonitoredItems(request) => {
                server
                    .create_item_calls
                    .lock()
                    .push(request.items_to_create.len());
                let bad = server.bad_create_handles.lock().clone();
                let results = request
                    .items_to_create
                    .iter()
                    .map(|item| {
                        server
                            .created_item_nodes
                            .lock()
                            .push(item.item_to_monitor.node_id.clone());
                        let handle = item.requested_parameters.client_handle;
                        let status_code = if bad.contains(&handle) {
                            StatusCode::BAD_NODE_ID_UNKNOWN
                        } else {
                            StatusCode::GOOD
                        };
                        MonitoredItemCreateResult {
                            status_code,
                            monitored_item_id: server
                                .next_monitored_item_id
                                .fetch_add(1, Ordering::SeqCst),
                            revised_sampling_interval: item
                                .requested_parameters
                                .sampling_interval,
                            revised_queue_size: item.requested_parameters.queue_size,
                        }
                    })
                    .collect();
                Ok(ServiceResponse::CreateMonitoredItems(
                    CreateMonitoredItemsResponse { results },
                ))
            }

            ServiceRequest::DeleteSubscriptions(request) => {
                let mut deleted = server.deleted_subscriptions.lock();
                let results = request
                    .subscription_ids
                    .iter()
                    .map(|id| {
                        deleted.push(*id);
                        StatusCode::GOOD
                    })
                    .collect();
                Ok(ServiceResponse::DeleteSubscriptions(
                    DeleteSubscriptionsResponse { results },
                ))
            }

            ServiceRequest::Publish(_) => {
                let mut publish_rx = server.publish_rx.lock().await;
                tokio::select! {
                    _ = token.cancelled() => Err(ClientError::Cancelled),
                    response = publish_rx.recv() => match response {
                        Some(response) => Ok(ServiceResponse::Publish(response)),
                        // The test dropped its sender; park forever.
                        None => {
                            drop(publish_rx);
                            futures::future::pending().await
                        }
                    },
                }
            }
        }
    }
}

#[async_trait]
impl Conversation for MockConversation {
    async fn close(&self) -> ClientResult<()> {
        Ok(())
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Installs a subscriber once so `RUST_LOG=trace` lights the tests up.
fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Builds an application wired to the mock server.
pub fn build_app(server: &Arc<MockServer>) -> Arc<UaApplication> {
    init_tracing();
    UaApplication::builder(ApplicationDescription::new(
        "opclink-tests",
        "urn:opclink:tests",
        "urn:opclink",
    ))
    .conversation_provider(MockProvider::new(Arc::clone(server)))
    .build()
    .expect("application builds")
}

/// Polls a condition until it holds or the timeout elapses.
pub async fn wait_until<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
