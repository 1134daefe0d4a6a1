// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Monitoring options declared per binding.

use opclink_core::ExpandedNodeId;

use crate::error::ClientResult;
use crate::services::{
    attribute_ids, DataChangeFilter, DataChangeTrigger, DeadbandType, MonitoringFilter,
};

// =============================================================================
// MonitoredItemOptions
// =============================================================================

/// Everything a binding declares about the server-side monitored item:
/// target node, attribute, index range, sampling cadence, queueing and
/// change filtering.
#[derive(Debug, Clone)]
pub struct MonitoredItemOptions {
    /// The node to monitor.
    pub node_id: ExpandedNodeId,

    /// The attribute to monitor.
    pub attribute_id: u32,

    /// Array index range.
    pub index_range: Option<String>,

    /// Sampling cadence in ms; -1 defers to the publishing interval.
    pub sampling_interval: f64,

    /// Server-side queue depth (0 = server default).
    pub queue_size: u32,

    /// Whether the oldest queued value is discarded on overflow.
    pub discard_oldest: bool,

    /// What triggers a data-change notification.
    pub data_change_trigger: DataChangeTrigger,

    /// Deadband kind.
    pub deadband_type: DeadbandType,

    /// Deadband threshold.
    pub deadband_value: f64,
}

impl MonitoredItemOptions {
    /// Options for a value binding on the Value attribute.
    pub fn value(node_id: &str) -> ClientResult<Self> {
        Ok(Self::for_node(ExpandedNodeId::parse(node_id)?, attribute_ids::VALUE))
    }

    /// Options for an event binding on the EventNotifier attribute.
    pub fn event(node_id: &str) -> ClientResult<Self> {
        Ok(Self::for_node(
            ExpandedNodeId::parse(node_id)?,
            attribute_ids::EVENT_NOTIFIER,
        ))
    }

    /// Options for an already parsed node id.
    pub fn for_node(node_id: ExpandedNodeId, attribute_id: u32) -> Self {
        Self {
            node_id,
            attribute_id,
            index_range: None,
            sampling_interval: -1.0,
            queue_size: 0,
            discard_oldest: true,
            data_change_trigger: DataChangeTrigger::StatusValue,
            deadband_type: DeadbandType::None,
            deadband_value: 0.0,
        }
    }

    /// Sets the attribute to monitor.
    pub fn attribute(mut self, attribute_id: u32) -> Self {
        self.attribute_id = attribute_id;
        self
    }

    /// Sets the array index range.
    pub fn index_range(mut self, range: impl Into<String>) -> Self {
        self.index_range = Some(range.into());
        self
    }

    /// Sets the sampling cadence in ms.
    pub fn sampling_interval(mut self, interval: f64) -> Self {
        self.sampling_interval = interval;
        self
    }

    /// Sets the server-side queue depth.
    pub fn queue_size(mut self, size: u32) -> Self {
        self.queue_size = size;
        self
    }

    /// Sets the queue overflow policy.
    pub fn discard_oldest(mut self, discard: bool) -> Self {
        self.discard_oldest = discard;
        self
    }

    /// Sets the data-change trigger.
    pub fn trigger(mut self, trigger: DataChangeTrigger) -> Self {
        self.data_change_trigger = trigger;
        self
    }

    /// Sets the deadband filter.
    pub fn deadband(mut self, deadband_type: DeadbandType, value: f64) -> Self {
        self.deadband_type = deadband_type;
        self.deadband_value = value;
        self
    }

    /// Builds the data-change filter for a value binding.
    ///
    /// Only a non-default trigger or an active deadband produces a filter;
    /// the plain status-value trigger with no deadband sends none.
    pub(crate) fn data_change_filter(&self) -> Option<MonitoringFilter> {
        if self.attribute_id == attribute_ids::VALUE
            && (self.data_change_trigger != DataChangeTrigger::StatusValue
                || self.deadband_type != DeadbandType::None)
        {
            Some(MonitoringFilter::DataChange(DataChangeFilter {
                trigger: self.data_change_trigger,
                deadband_type: self.deadband_type,
                deadband_value: self.deadband_value,
            }))
        } else {
            None
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
    fn test_value_defaults() {
        let options = MonitoredItemOptions::value("ns=4;s=Value").unwrap();
        assert_eq!(options.attribute_id, attribute_ids::VALUE);
        assert_eq!(options.sampling_interval, -1.0);
        assert!(options.discard_oldest);
        assert!(options.data_change_filter().is_none());
    }

    #[test]
    fn test_deadband_attaches_filter() {
        let options = MonitoredItemOptions::value("ns=4;s=Value")
            .unwrap()
            .deadband(DeadbandType::Absolute, 0.5);

        match options.data_change_filter() {
            Some(MonitoringFilter::DataChange(filter)) => {
                assert_eq!(filter.deadband_type, DeadbandType::Absolute);
                assert_eq!(filter.deadband_value, 0.5);
            }
            other => panic!("expected a data change filter, got {other:?}"),
        }
    }

    #[test]
    fn test_trigger_attaches_filter() {
        let options = MonitoredItemOptions::value("ns=4;s=Value")
            .unwrap()
            .trigger(DataChangeTrigger::StatusValueTimestamp);
        assert!(options.data_change_filter().is_some());
    }

    #[test]
    fn test_non_value_attribute_has_no_filter() {
        let options = MonitoredItemOptions::event("i=2253").unwrap();
        assert!(options.data_change_filter().is_none());
    }

    #[test]
    fn test_bad_node_id() {
        assert!(MonitoredItemOptions::value("nope").is_err());
    }
}
