// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Engine-side monitored items.
//!
//! Each binding owns exactly one [`ItemBinding`]: the declared options,
//! the process-unique client handle, the dispatch sink feeding the typed
//! cell, and the server-assigned state recorded from create results.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use opclink_core::{DataValue, ExpandedNodeId, StatusCode, Variant};

use crate::services::{MonitoredItemCreateResult, MonitoringFilter, MonitoringMode};
use crate::subscription::cell::{QueueSlot, ValueSlot};
use crate::subscription::options::MonitoredItemOptions;

/// Client handles are unique across the process so one channel can carry
/// many subscriptions without collisions.
static NEXT_CLIENT_HANDLE: AtomicU32 = AtomicU32::new(1);

pub(crate) fn next_client_handle() -> u32 {
    NEXT_CLIENT_HANDLE.fetch_add(1, Ordering::Relaxed)
}

// =============================================================================
// MonitoredItemKind
// =============================================================================

/// The closed set of binding shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MonitoredItemKind {
    /// Scalar value binding.
    Value,

    /// Queued value binding.
    ValueQueue,

    /// Single event binding.
    Event,

    /// Queued event binding.
    EventQueue,
}

// =============================================================================
// ItemSink
// =============================================================================

/// Where inbound notifications for one binding land.
pub(crate) enum ItemSink {
    /// Scalar value slot.
    Value(Arc<ValueSlot>),

    /// Queued value slot.
    ValueQueue(Arc<QueueSlot>),

    /// Typed event application (captures the event cell).
    Event(Box<dyn Fn(&[Variant]) + Send + Sync>),

    /// Typed queued-event application.
    EventQueue(Box<dyn Fn(&[Variant]) + Send + Sync>),
}

// =============================================================================
// ItemBinding
// =============================================================================

/// Server-assigned state, updated from create results.
#[derive(Debug, Clone, Default)]
pub(crate) struct CreateState {
    pub server_id: u32,
    pub status: Option<StatusCode>,
    pub revised_sampling_interval: f64,
    pub revised_queue_size: u32,
}

/// One monitored-item binding of a subscription.
pub(crate) struct ItemBinding {
    pub name: String,
    pub client_handle: u32,
    pub options: MonitoredItemOptions,
    pub kind: MonitoredItemKind,
    pub filter: Option<MonitoringFilter>,
    pub sink: ItemSink,
    pub create_state: RwLock<CreateState>,
}

impl ItemBinding {
    pub(crate) fn new(
        name: String,
        options: MonitoredItemOptions,
        kind: MonitoredItemKind,
        filter: Option<MonitoringFilter>,
        sink: ItemSink,
    ) -> Self {
        Self::with_handle(name, next_client_handle(), options, kind, filter, sink)
    }

    pub(crate) fn with_handle(
        name: String,
        client_handle: u32,
        options: MonitoredItemOptions,
        kind: MonitoredItemKind,
        filter: Option<MonitoringFilter>,
        sink: ItemSink,
    ) -> Self {
        Self {
            name,
            client_handle,
            options,
            kind,
            filter,
            sink,
            create_state: RwLock::new(CreateState::default()),
        }
    }

    /// All bindings report; sampling-only items have no use here.
    pub(crate) fn monitoring_mode(&self) -> MonitoringMode {
        MonitoringMode::Reporting
    }

    /// Applies an inbound data change.
    pub(crate) fn publish_value(&self, value: DataValue) {
        match &self.sink {
            ItemSink::Value(slot) => slot.publish(value),
            ItemSink::ValueQueue(slot) => slot.publish(value),
            _ => {
                tracing::warn!(
                    binding = %self.name,
                    client_handle = self.client_handle,
                    "Data change delivered to an event binding, ignored"
                );
            }
        }
    }

    /// Applies an inbound event occurrence.
    pub(crate) fn publish_event(&self, fields: &[Variant]) {
        match &self.sink {
            ItemSink::Event(apply) | ItemSink::EventQueue(apply) => apply(fields),
            _ => {
                tracing::warn!(
                    binding = %self.name,
                    client_handle = self.client_handle,
                    "Event delivered to a value binding, ignored"
                );
            }
        }
    }

    /// Records a create result for this binding.
    pub(crate) fn on_create_result(&self, result: &MonitoredItemCreateResult) {
        let mut state = self.create_state.write();
        state.server_id = result.monitored_item_id;
        state.status = Some(result.status_code);
        state.revised_sampling_interval = result.revised_sampling_interval;
        state.revised_queue_size = result.revised_queue_size;
    }

    /// Clears the server-assigned state when the subscription restarts.
    pub(crate) fn reset_create_state(&self) {
        *self.create_state.write() = CreateState::default();
    }
}

// =============================================================================
// MonitoredItemStatus
// =============================================================================

/// Public summary of one binding's server-side state.
#[derive(Debug, Clone)]
pub struct MonitoredItemStatus {
    /// Binding name.
    pub name: String,

    /// The monitored node.
    pub node_id: ExpandedNodeId,

    /// Binding shape.
    pub kind: MonitoredItemKind,

    /// Client-assigned handle.
    pub client_handle: u32,

    /// Server-assigned monitored item id (0 before creation).
    pub server_id: u32,

    /// Status of the most recent create call, when one happened.
    pub create_status: Option<StatusCode>,
}

impl ItemBinding {
    pub(crate) fn status(&self) -> MonitoredItemStatus {
        let state = self.create_state.read();
        MonitoredItemStatus {
            name: self.name.clone(),
            node_id: self.options.node_id.clone(),
            kind: self.kind,
            client_handle: self.client_handle,
            server_id: state.server_id,
            create_status: state.status,
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
    fn test_client_handles_unique() {
        let a = next_client_handle();
        let b = next_client_handle();
        assert_ne!(a, b);
    }

    #[test]
    fn test_create_result_recorded() {
        let options = MonitoredItemOptions::value("ns=4;s=Value").unwrap();
        let slot = ValueSlot::new("Value".to_string());
        let binding = ItemBinding::new(
            "Value".to_string(),
            options,
            MonitoredItemKind::Value,
            None,
            ItemSink::Value(slot),
        );

        binding.on_create_result(&MonitoredItemCreateResult {
            status_code: StatusCode::GOOD,
            monitored_item_id: 1234,
            revised_sampling_interval: 500.0,
            revised_queue_size: 10,
        });

        let status = binding.status();
        assert_eq!(status.server_id, 1234);
        assert_eq!(status.create_status, Some(StatusCode::GOOD));

        binding.reset_create_state();
        assert_eq!(binding.status().server_id, 0);
        assert!(binding.status().create_status.is_none());
    }
}
