// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Typed event models.
//!
//! An event binding declares its fields up front: [`UaEvent::select_clauses`]
//! lists the fields the server delivers with every occurrence, in order,
//! and [`UaEvent::from_event_fields`] rebuilds the typed event from that
//! positional field list. [`BaseEvent`] models the standard BaseEventType
//! fields and is the usual starting point.

use chrono::{DateTime, Utc};

use opclink_core::{ExpandedNodeId, FromVariant, LocalizedText, NodeId, Variant};

use crate::services::{attribute_ids, EventFilter, SimpleAttributeOperand};

/// The BaseEventType node (`i=2041`).
const BASE_EVENT_TYPE: u32 = 2041;

// =============================================================================
// UaEvent
// =============================================================================

/// A typed event received through an event binding.
pub trait UaEvent: Send + Sync + Sized + 'static {
    /// The fields requested from the server, in delivery order.
    fn select_clauses() -> Vec<SimpleAttributeOperand>;

    /// Rebuilds the event from the delivered fields.
    ///
    /// Fields arrive positionally in select-clause order; absent fields
    /// are the null variant. Returns `None` when the list is unusable.
    fn from_event_fields(fields: &[Variant]) -> Option<Self>;

    /// The event filter for this event type.
    fn event_filter() -> EventFilter {
        EventFilter {
            select_clauses: Self::select_clauses(),
        }
    }
}

/// A select clause for one field of BaseEventType.
pub fn base_event_field(browse_name: &str) -> SimpleAttributeOperand {
    SimpleAttributeOperand {
        type_definition_id: Some(ExpandedNodeId::numeric(0, BASE_EVENT_TYPE)),
        browse_path: vec![opclink_core::QualifiedName::new(0, browse_name)],
        attribute_id: attribute_ids::VALUE,
        index_range: None,
    }
}

// =============================================================================
// BaseEvent
// =============================================================================

/// The standard fields shared by every OPC UA event.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BaseEvent {
    /// Unique id of this occurrence.
    pub event_id: Vec<u8>,

    /// The event type node.
    pub event_type: Option<NodeId>,

    /// Name of the originating source.
    pub source_name: Option<String>,

    /// When the event occurred.
    pub time: Option<DateTime<Utc>>,

    /// Human readable description.
    pub message: Option<LocalizedText>,

    /// Urgency, 1 (lowest) to 1000 (highest).
    pub severity: u16,
}

impl UaEvent for BaseEvent {
    fn select_clauses() -> Vec<SimpleAttributeOperand> {
        vec![
            base_event_field("EventId"),
            base_event_field("EventType"),
            base_event_field("SourceName"),
            base_event_field("Time"),
            base_event_field("Message"),
            base_event_field("Severity"),
        ]
    }

    fn from_event_fields(fields: &[Variant]) -> Option<Self> {
        if fields.is_empty() {
            return None;
        }
        let field = |index: usize| fields.get(index).unwrap_or(&Variant::Null);

        Some(Self {
            event_id: Vec::<u8>::from_variant(field(0)).unwrap_or_default(),
            event_type: NodeId::from_variant(field(1)),
            source_name: String::from_variant(field(2)),
            time: DateTime::<Utc>::from_variant(field(3)),
            message: LocalizedText::from_variant(field(4)),
            severity: u16::from_variant(field(5)).unwrap_or(0),
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_select_clauses_order() {
        let clauses = BaseEvent::select_clauses();
        let names: Vec<&str> = clauses
            .iter()
            .map(|c| c.browse_path[0].name.as_str())
            .collect();
        assert_eq!(
            names,
            ["EventId", "EventType", "SourceName", "Time", "Message", "Severity"]
        );
        assert!(clauses
            .iter()
            .all(|c| c.attribute_id == attribute_ids::VALUE));
    }

    #[test]
    fn test_from_event_fields() {
        let time = Utc.with_ymd_and_hms(2025, 5, 20, 6, 30, 0).unwrap();
        let fields = vec![
            Variant::ByteString(vec![1, 2, 3]),
            Variant::NodeId(NodeId::numeric(0, BASE_EVENT_TYPE)),
            Variant::String("boiler-7".to_string()),
            Variant::DateTime(time),
            Variant::LocalizedText(LocalizedText::new("pressure high")),
            Variant::UInt16(700),
        ];

        let event = BaseEvent::from_event_fields(&fields).unwrap();
        assert_eq!(event.event_id, vec![1, 2, 3]);
        assert_eq!(event.source_name.as_deref(), Some("boiler-7"));
        assert_eq!(event.time, Some(time));
        assert_eq!(event.severity, 700);
    }

    #[test]
    fn test_partial_fields() {
        // A server may deliver fewer fields than selected; the rest stay
        // at their defaults.
        let fields = vec![Variant::ByteString(vec![9])];
        let event = BaseEvent::from_event_fields(&fields).unwrap();
        assert_eq!(event.event_id, vec![9]);
        assert_eq!(event.severity, 0);
        assert!(event.message.is_none());

        assert!(BaseEvent::from_event_fields(&[]).is_none());
    }
}
