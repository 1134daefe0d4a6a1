// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Service request/response pairs used by the runtime.
//!
//! The runtime treats services as opaque request/response pairs; the
//! conversation layer owns their wire form. Only the services the channel
//! pool and the subscription engine actually call are modelled here: Read,
//! Write, CreateSubscription, CreateMonitoredItems, DeleteSubscriptions
//! and Publish, plus the notification payloads Publish delivers.

use chrono::{DateTime, Utc};

use opclink_core::{
    DataValue, ExpandedNodeId, NodeId, QualifiedName, StatusCode, UaEnum, Variant,
};

use crate::error::{ClientError, ClientResult};

/// Well-known attribute ids.
pub mod attribute_ids {
    /// The NodeId attribute.
    pub const NODE_ID: u32 = 1;
    /// The BrowseName attribute.
    pub const BROWSE_NAME: u32 = 3;
    /// The DisplayName attribute.
    pub const DISPLAY_NAME: u32 = 4;
    /// The EventNotifier attribute.
    pub const EVENT_NOTIFIER: u32 = 12;
    /// The Value attribute.
    pub const VALUE: u32 = 13;
    /// The DataType attribute.
    pub const DATA_TYPE: u32 = 14;
}

// =============================================================================
// Common enumerations
// =============================================================================

/// Which timestamps the server returns with values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimestampsToReturn {
    /// Source timestamps only.
    Source = 0,
    /// Server timestamps only.
    Server = 1,
    /// Both timestamps.
    #[default]
    Both = 2,
    /// No timestamps.
    Neither = 3,
}

/// Sampling behavior of a monitored item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MonitoringMode {
    /// Item exists but does not sample.
    Disabled = 0,
    /// Item samples but does not report.
    Sampling = 1,
    /// Item samples and reports.
    #[default]
    Reporting = 2,
}

/// Which value changes trigger a data-change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataChangeTrigger {
    /// Status changes only.
    Status = 0,
    /// Status or value changes.
    #[default]
    StatusValue = 1,
    /// Status, value or source-timestamp changes.
    StatusValueTimestamp = 2,
}

impl UaEnum for DataChangeTrigger {
    fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Status),
            1 => Some(Self::StatusValue),
            2 => Some(Self::StatusValueTimestamp),
            _ => None,
        }
    }

    fn to_i32(&self) -> i32 {
        *self as i32
    }
}

/// Deadband calculation applied to value changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeadbandType {
    /// No deadband.
    #[default]
    None = 0,
    /// Absolute difference threshold.
    Absolute = 1,
    /// Percent-of-range threshold.
    Percent = 2,
}

impl UaEnum for DeadbandType {
    fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::Absolute),
            2 => Some(Self::Percent),
            _ => None,
        }
    }

    fn to_i32(&self) -> i32 {
        *self as i32
    }
}

// =============================================================================
// Attribute services
// =============================================================================

/// Identifies one node attribute to read or monitor.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadValueId {
    /// The node.
    pub node_id: NodeId,

    /// The attribute, usually [`attribute_ids::VALUE`].
    pub attribute_id: u32,

    /// Array index range, e.g. `"2:4"`.
    pub index_range: Option<String>,
}

impl ReadValueId {
    /// Reads the Value attribute of a node.
    pub fn value_of(node_id: NodeId) -> Self {
        Self {
            node_id,
            attribute_id: attribute_ids::VALUE,
            index_range: None,
        }
    }
}

/// Reads attributes from nodes.
#[derive(Debug, Clone, Default)]
pub struct ReadRequest {
    /// Maximum age of cached values the server may return, in ms.
    pub max_age: f64,

    /// Which timestamps to return.
    pub timestamps_to_return: TimestampsToReturn,

    /// The attributes to read.
    pub nodes_to_read: Vec<ReadValueId>,
}

/// Response to [`ReadRequest`]; results are positional.
#[derive(Debug, Clone, Default)]
pub struct ReadResponse {
    /// One result per requested attribute.
    pub results: Vec<DataValue>,
}

/// One attribute write.
#[derive(Debug, Clone)]
pub struct WriteValue {
    /// The node.
    pub node_id: NodeId,

    /// The attribute to write.
    pub attribute_id: u32,

    /// Array index range.
    pub index_range: Option<String>,

    /// The value.
    pub value: DataValue,
}

/// Writes attributes to nodes.
#[derive(Debug, Clone, Default)]
pub struct WriteRequest {
    /// The attributes to write.
    pub nodes_to_write: Vec<WriteValue>,
}

/// Response to [`WriteRequest`]; results are positional.
#[derive(Debug, Clone, Default)]
pub struct WriteResponse {
    /// One status per write.
    pub results: Vec<StatusCode>,
}

// =============================================================================
// Subscription services
// =============================================================================

/// Creates a server-side subscription.
#[derive(Debug, Clone)]
pub struct CreateSubscriptionRequest {
    /// Requested publish cadence in ms.
    pub requested_publishing_interval: f64,

    /// Publish cycles the subscription survives without activity.
    pub requested_lifetime_count: u32,

    /// Publish cycles between keep-alive messages.
    pub requested_max_keep_alive_count: u32,

    /// Notification cap per publish response (0 = unlimited).
    pub max_notifications_per_publish: u32,

    /// Whether publishing starts enabled.
    pub publishing_enabled: bool,

    /// Relative priority among subscriptions of the session.
    pub priority: u8,
}

/// Response to [`CreateSubscriptionRequest`].
#[derive(Debug, Clone)]
pub struct CreateSubscriptionResponse {
    /// Server-assigned subscription id.
    pub subscription_id: u32,

    /// Revised publish cadence in ms.
    pub revised_publishing_interval: f64,

    /// Revised lifetime count.
    pub revised_lifetime_count: u32,

    /// Revised keep-alive count.
    pub revised_max_keep_alive_count: u32,
}

/// A data-change filter attached to a value monitored item.
#[derive(Debug, Clone, PartialEq)]
pub struct DataChangeFilter {
    /// What triggers a notification.
    pub trigger: DataChangeTrigger,

    /// Deadband kind.
    pub deadband_type: DeadbandType,

    /// Deadband threshold.
    pub deadband_value: f64,
}

/// Selects one event field by browse path.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleAttributeOperand {
    /// Event type that declares the field.
    pub type_definition_id: Option<ExpandedNodeId>,

    /// Browse path from the event type to the field.
    pub browse_path: Vec<QualifiedName>,

    /// Attribute to select.
    pub attribute_id: u32,

    /// Array index range.
    pub index_range: Option<String>,
}

/// An event filter attached to an event monitored item.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EventFilter {
    /// The event fields delivered with each notification, in order.
    pub select_clauses: Vec<SimpleAttributeOperand>,
}

/// Filter of a monitored item.
#[derive(Debug, Clone, PartialEq)]
pub enum MonitoringFilter {
    /// Data-change filter for value items.
    DataChange(DataChangeFilter),

    /// Event filter for event items.
    Event(EventFilter),
}

/// Client-requested monitoring parameters.
#[derive(Debug, Clone)]
pub struct MonitoringParameters {
    /// Client-assigned handle correlating notifications to the item.
    pub client_handle: u32,

    /// Sampling cadence in ms (-1 = publishing interval).
    pub sampling_interval: f64,

    /// Optional data-change or event filter.
    pub filter: Option<MonitoringFilter>,

    /// Server-side queue depth.
    pub queue_size: u32,

    /// Whether the oldest queued value is discarded on overflow.
    pub discard_oldest: bool,
}

/// One monitored item to create.
#[derive(Debug, Clone)]
pub struct MonitoredItemCreateRequest {
    /// The attribute to monitor.
    pub item_to_monitor: ReadValueId,

    /// Sampling behavior.
    pub monitoring_mode: MonitoringMode,

    /// Requested parameters.
    pub requested_parameters: MonitoringParameters,
}

/// Per-item result of a create call.
#[derive(Debug, Clone)]
pub struct MonitoredItemCreateResult {
    /// Status of this item.
    pub status_code: StatusCode,

    /// Server-assigned monitored item id.
    pub monitored_item_id: u32,

    /// Revised sampling cadence in ms.
    pub revised_sampling_interval: f64,

    /// Revised queue depth.
    pub revised_queue_size: u32,
}

/// Creates monitored items within a subscription.
#[derive(Debug, Clone)]
pub struct CreateMonitoredItemsRequest {
    /// The owning subscription.
    pub subscription_id: u32,

    /// Which timestamps notifications carry.
    pub timestamps_to_return: TimestampsToReturn,

    /// The items to create, order preserved in the results.
    pub items_to_create: Vec<MonitoredItemCreateRequest>,
}

/// Response to [`CreateMonitoredItemsRequest`]; results are positional.
#[derive(Debug, Clone, Default)]
pub struct CreateMonitoredItemsResponse {
    /// One result per requested item.
    pub results: Vec<MonitoredItemCreateResult>,
}

/// Deletes subscriptions.
#[derive(Debug, Clone, Default)]
pub struct DeleteSubscriptionsRequest {
    /// The subscriptions to delete.
    pub subscription_ids: Vec<u32>,
}

/// Response to [`DeleteSubscriptionsRequest`].
#[derive(Debug, Clone, Default)]
pub struct DeleteSubscriptionsResponse {
    /// One status per subscription.
    pub results: Vec<StatusCode>,
}

// =============================================================================
// Publish
// =============================================================================

/// Acknowledges a previously delivered notification message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionAcknowledgement {
    /// The subscription.
    pub subscription_id: u32,

    /// The acknowledged sequence number.
    pub sequence_number: u32,
}

/// Requests the next notification message for any subscription.
#[derive(Debug, Clone, Default)]
pub struct PublishRequest {
    /// Acknowledgements for messages processed so far.
    pub subscription_acknowledgements: Vec<SubscriptionAcknowledgement>,
}

/// One notification delivered for a data-change monitored item.
#[derive(Debug, Clone)]
pub struct MonitoredItemNotification {
    /// The client handle of the item.
    pub client_handle: u32,

    /// The new value.
    pub value: DataValue,
}

/// Data-change notifications of one publish cycle.
#[derive(Debug, Clone, Default)]
pub struct DataChangeNotification {
    /// The changed items.
    pub monitored_items: Vec<MonitoredItemNotification>,
}

/// The fields of one event occurrence.
#[derive(Debug, Clone)]
pub struct EventFieldList {
    /// The client handle of the event item.
    pub client_handle: u32,

    /// Field values in select-clause order.
    pub event_fields: Vec<Variant>,
}

/// Event notifications of one publish cycle.
#[derive(Debug, Clone, Default)]
pub struct EventNotificationList {
    /// The event occurrences.
    pub events: Vec<EventFieldList>,
}

/// One entry of a notification message.
#[derive(Debug, Clone)]
pub enum NotificationData {
    /// Data-change notifications.
    DataChange(DataChangeNotification),

    /// Event notifications.
    Event(EventNotificationList),
}

/// The notifications of one publish cycle.
#[derive(Debug, Clone, Default)]
pub struct NotificationMessage {
    /// Sequence number of this message.
    pub sequence_number: u32,

    /// When the server published it.
    pub publish_time: Option<DateTime<Utc>>,

    /// The notifications; empty for a keep-alive.
    pub notification_data: Vec<NotificationData>,
}

impl NotificationMessage {
    /// Returns `true` when this message is a keep-alive.
    pub fn is_keep_alive(&self) -> bool {
        self.notification_data.is_empty()
    }
}

/// Response to [`PublishRequest`].
#[derive(Debug, Clone)]
pub struct PublishResponse {
    /// The subscription this message belongs to.
    pub subscription_id: u32,

    /// Sequence numbers available for republish.
    pub available_sequence_numbers: Vec<u32>,

    /// Whether more notifications are queued server-side.
    pub more_notifications: bool,

    /// The notifications.
    pub notification_message: NotificationMessage,

    /// Acknowledgement results for the request.
    pub results: Vec<StatusCode>,
}

// =============================================================================
// Service envelopes
// =============================================================================

/// A request sent through a request channel.
#[derive(Debug, Clone)]
pub enum ServiceRequest {
    /// Read service.
    Read(ReadRequest),
    /// Write service.
    Write(WriteRequest),
    /// CreateSubscription service.
    CreateSubscription(CreateSubscriptionRequest),
    /// CreateMonitoredItems service.
    CreateMonitoredItems(CreateMonitoredItemsRequest),
    /// DeleteSubscriptions service.
    DeleteSubscriptions(DeleteSubscriptionsRequest),
    /// Publish service.
    Publish(PublishRequest),
}

impl ServiceRequest {
    /// Returns the service name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Read(_) => "Read",
            Self::Write(_) => "Write",
            Self::CreateSubscription(_) => "CreateSubscription",
            Self::CreateMonitoredItems(_) => "CreateMonitoredItems",
            Self::DeleteSubscriptions(_) => "DeleteSubscriptions",
            Self::Publish(_) => "Publish",
        }
    }
}

/// A correlated response received from a request channel.
#[derive(Debug, Clone)]
pub enum ServiceResponse {
    /// Read response.
    Read(ReadResponse),
    /// Write response.
    Write(WriteResponse),
    /// CreateSubscription response.
    CreateSubscription(CreateSubscriptionResponse),
    /// CreateMonitoredItems response.
    CreateMonitoredItems(CreateMonitoredItemsResponse),
    /// DeleteSubscriptions response.
    DeleteSubscriptions(DeleteSubscriptionsResponse),
    /// Publish response.
    Publish(PublishResponse),
}

impl ServiceResponse {
    /// Unwraps a Read response.
    pub fn into_read(self) -> ClientResult<ReadResponse> {
        match self {
            Self::Read(response) => Ok(response),
            _ => Err(ClientError::unexpected_response("ReadResponse")),
        }
    }

    /// Unwraps a Write response.
    pub fn into_write(self) -> ClientResult<WriteResponse> {
        match self {
            Self::Write(response) => Ok(response),
            _ => Err(ClientError::unexpected_response("WriteResponse")),
        }
    }

    /// Unwraps a CreateSubscription response.
    pub fn into_create_subscription(self) -> ClientResult<CreateSubscriptionResponse> {
        match self {
            Self::CreateSubscription(response) => Ok(response),
            _ => Err(ClientError::unexpected_response("CreateSubscriptionResponse")),
        }
    }

    /// Unwraps a CreateMonitoredItems response.
    pub fn into_create_monitored_items(self) -> ClientResult<CreateMonitoredItemsResponse> {
        match self {
            Self::CreateMonitoredItems(response) => Ok(response),
            _ => Err(ClientError::unexpected_response(
                "CreateMonitoredItemsResponse",
            )),
        }
    }

    /// Unwraps a DeleteSubscriptions response.
    pub fn into_delete_subscriptions(self) -> ClientResult<DeleteSubscriptionsResponse> {
        match self {
            Self::DeleteSubscriptions(response) => Ok(response),
            _ => Err(ClientError::unexpected_response(
                "DeleteSubscriptionsResponse",
            )),
        }
    }

    /// Unwraps a Publish response.
    pub fn into_publish(self) -> ClientResult<PublishResponse> {
        match self {
            Self::Publish(response) => Ok(response),
            _ => Err(ClientError::unexpected_response("PublishResponse")),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unwrap_mismatch() {
        let response = ServiceResponse::Write(WriteResponse::default());
        assert!(response.clone().into_write().is_ok());
        assert!(matches!(
            response.into_read(),
            Err(ClientError::UnexpectedResponse { .. })
        ));
    }

    #[test]
    fn test_keep_alive() {
        let message = NotificationMessage {
            sequence_number: 4,
            publish_time: None,
            notification_data: Vec::new(),
        };
        assert!(message.is_keep_alive());
    }

    #[test]
    fn test_enum_wire_values() {
        assert_eq!(DataChangeTrigger::StatusValue.to_i32(), 1);
        assert_eq!(DeadbandType::from_i32(2), Some(DeadbandType::Percent));
        assert_eq!(DeadbandType::from_i32(9), None);
    }
}
