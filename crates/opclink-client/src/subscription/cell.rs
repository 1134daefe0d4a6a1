// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Typed binding cells.
//!
//! A cell is the subscriber-facing end of one monitored-item binding.
//! Inbound publish dispatch lands on the cell's `publish` path, which
//! updates the local view and notifies observers but never triggers a
//! server write; only an explicit [`ValueCell::set`] enqueues a write-back.
//! That separation is what keeps publish dispatch from feeding back into
//! the server.

use std::collections::VecDeque;
use std::fmt;
use std::marker::PhantomData;
use std::ops::RangeInclusive;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::{mpsc, watch, Notify};

use opclink_core::{DataValue, FromVariant, StatusCode, Variant};

use crate::subscription::event::UaEvent;

// =============================================================================
// WriteCommand
// =============================================================================

/// A validated local edit on its way to the server.
#[derive(Debug, Clone)]
pub(crate) struct WriteCommand {
    /// Client handle of the originating binding.
    pub client_handle: u32,

    /// The value to write.
    pub value: Variant,
}

/// A validation rule applied before a local edit is written.
pub type Validator<T> = Box<dyn Fn(&T) -> Result<(), String> + Send + Sync>;

// =============================================================================
// Slots (untyped, shared with the engine)
// =============================================================================

/// Shared state of a scalar value binding.
pub(crate) struct ValueSlot {
    name: String,
    current: watch::Sender<DataValue>,
    errors: RwLock<Vec<String>>,
    write_status: RwLock<Option<StatusCode>>,
}

impl ValueSlot {
    pub(crate) fn new(name: String) -> Arc<Self> {
        let (current, _) = watch::channel(DataValue::default());
        Arc::new(Self {
            name,
            current,
            errors: RwLock::new(Vec::new()),
            write_status: RwLock::new(None),
        })
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// Applies an inbound data change. Never triggers write-back.
    pub(crate) fn publish(&self, value: DataValue) {
        self.current.send_replace(value);
    }

    pub(crate) fn data_value(&self) -> DataValue {
        self.current.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<DataValue> {
        self.current.subscribe()
    }

    pub(crate) fn set_errors(&self, errors: Vec<String>) {
        *self.errors.write() = errors;
    }

    pub(crate) fn errors(&self) -> Vec<String> {
        self.errors.read().clone()
    }

    pub(crate) fn record_write_status(&self, status: StatusCode) {
        *self.write_status.write() = Some(status);
    }

    pub(crate) fn write_status(&self) -> Option<StatusCode> {
        *self.write_status.read()
    }
}

/// Shared state of a queued value binding.
pub(crate) struct QueueSlot {
    name: String,
    queue: Mutex<VecDeque<DataValue>>,
    notify: Notify,
}

impl QueueSlot {
    pub(crate) fn new(name: String) -> Arc<Self> {
        Arc::new(Self {
            name,
            queue: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
        })
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn publish(&self, value: DataValue) {
        self.queue.lock().push_back(value);
        self.notify.notify_one();
    }

    pub(crate) fn pop(&self) -> Option<DataValue> {
        self.queue.lock().pop_front()
    }

    pub(crate) fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub(crate) async fn next(&self) -> DataValue {
        loop {
            if let Some(value) = self.pop() {
                return value;
            }
            self.notify.notified().await;
        }
    }
}

// =============================================================================
// ValueCell
// =============================================================================

/// A scalar value binding.
///
/// `get` projects the last received [`DataValue`] onto the declared type;
/// `set` validates the pending value against the declared rules and, when
/// valid, updates the local view and enqueues the server write. An edit
/// that fails validation is recorded on the binding and never sent.
pub struct ValueCell<T> {
    slot: Arc<ValueSlot>,
    client_handle: u32,
    writes: mpsc::UnboundedSender<WriteCommand>,
    validators: Arc<RwLock<Vec<Validator<T>>>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for ValueCell<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
            client_handle: self.client_handle,
            writes: self.writes.clone(),
            validators: Arc::clone(&self.validators),
            _marker: PhantomData,
        }
    }
}

impl<T> ValueCell<T>
where
    T: FromVariant + Into<Variant> + Clone + Send + Sync + 'static,
{
    pub(crate) fn new(
        slot: Arc<ValueSlot>,
        client_handle: u32,
        writes: mpsc::UnboundedSender<WriteCommand>,
    ) -> Self {
        Self {
            slot,
            client_handle,
            writes,
            validators: Arc::new(RwLock::new(Vec::new())),
            _marker: PhantomData,
        }
    }

    /// Returns the binding name.
    pub fn name(&self) -> &str {
        self.slot.name()
    }

    /// Returns the client handle correlating notifications to this cell.
    pub fn client_handle(&self) -> u32 {
        self.client_handle
    }

    /// Returns the current value when the variant tag matches `T`.
    pub fn get(&self) -> Option<T> {
        T::from_variant(self.slot.data_value().value())
    }

    /// Returns the full current data value.
    pub fn data_value(&self) -> DataValue {
        self.slot.data_value()
    }

    /// Returns a stream of value updates (inbound and local).
    pub fn subscribe(&self) -> watch::Receiver<DataValue> {
        self.slot.subscribe()
    }

    /// Adds a validation rule checked before every write-back.
    pub fn add_validator(
        &self,
        validator: impl Fn(&T) -> Result<(), String> + Send + Sync + 'static,
    ) {
        self.validators.write().push(Box::new(validator));
    }

    /// Adds an inclusive-range validation rule.
    pub fn validate_range(&self, range: RangeInclusive<T>)
    where
        T: PartialOrd + fmt::Display,
    {
        self.add_validator(move |value| {
            if range.contains(value) {
                Ok(())
            } else {
                Err(format!(
                    "value {value} is outside the range [{}, {}]",
                    range.start(),
                    range.end()
                ))
            }
        });
    }

    /// Sets the value locally and schedules the server write.
    ///
    /// Validation failures are recorded as the binding's error strings and
    /// the write is suppressed; the local view still reflects the edit so
    /// the caller sees what it typed.
    pub fn set(&self, value: T) {
        let failures: Vec<String> = {
            let validators = self.validators.read();
            validators
                .iter()
                .filter_map(|validate| validate(&value).err())
                .collect()
        };

        if !failures.is_empty() {
            tracing::warn!(
                binding = self.slot.name(),
                errors = ?failures,
                "Local edit failed validation, write suppressed"
            );
            self.slot.publish(DataValue::new(value.into()));
            self.slot.set_errors(failures);
            return;
        }

        self.slot.set_errors(Vec::new());
        let variant: Variant = value.into();
        self.slot.publish(DataValue::new(variant.clone()));

        if self
            .writes
            .send(WriteCommand {
                client_handle: self.client_handle,
                value: variant,
            })
            .is_err()
        {
            tracing::debug!(
                binding = self.slot.name(),
                "Write dropped, subscription is gone"
            );
        }
    }

    /// Returns the recorded validation errors.
    pub fn errors(&self) -> Vec<String> {
        self.slot.errors()
    }

    /// Returns the status of the most recent server write.
    pub fn last_write_status(&self) -> Option<StatusCode> {
        self.slot.write_status()
    }
}

impl<T> fmt::Debug for ValueCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueCell")
            .field("name", &self.slot.name())
            .field("client_handle", &self.client_handle)
            .finish()
    }
}

// =============================================================================
// QueueCell
// =============================================================================

/// A queued value binding: every inbound data change is retained in
/// arrival order until the subscriber consumes it.
#[derive(Clone)]
pub struct QueueCell {
    slot: Arc<QueueSlot>,
    client_handle: u32,
}

impl QueueCell {
    pub(crate) fn new(slot: Arc<QueueSlot>, client_handle: u32) -> Self {
        Self {
            slot,
            client_handle,
        }
    }

    /// Returns the binding name.
    pub fn name(&self) -> &str {
        self.slot.name()
    }

    /// Returns the client handle.
    pub fn client_handle(&self) -> u32 {
        self.client_handle
    }

    /// Pops the oldest queued value.
    pub fn pop(&self) -> Option<DataValue> {
        self.slot.pop()
    }

    /// Returns the queued value count.
    pub fn len(&self) -> usize {
        self.slot.len()
    }

    /// Returns `true` when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.slot.len() == 0
    }

    /// Waits for and pops the next value.
    pub async fn next(&self) -> DataValue {
        self.slot.next().await
    }
}

impl fmt::Debug for QueueCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueCell")
            .field("name", &self.slot.name())
            .field("len", &self.len())
            .finish()
    }
}

// =============================================================================
// EventCell
// =============================================================================

/// A single event binding holding the most recent occurrence.
pub struct EventCell<E: UaEvent> {
    pub(crate) current: Arc<watch::Sender<Option<E>>>,
    client_handle: u32,
    name: String,
}

impl<E: UaEvent> Clone for EventCell<E> {
    fn clone(&self) -> Self {
        Self {
            current: Arc::clone(&self.current),
            client_handle: self.client_handle,
            name: self.name.clone(),
        }
    }
}

impl<E: UaEvent + Clone> EventCell<E> {
    pub(crate) fn new(name: String, client_handle: u32) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            current: Arc::new(current),
            client_handle,
            name,
        }
    }

    /// Returns the binding name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the client handle.
    pub fn client_handle(&self) -> u32 {
        self.client_handle
    }

    /// Returns the most recent event, if any arrived yet.
    pub fn last(&self) -> Option<E> {
        self.current.borrow().clone()
    }

    /// Returns a stream of event arrivals.
    pub fn subscribe(&self) -> watch::Receiver<Option<E>> {
        self.current.subscribe()
    }
}

impl<E: UaEvent> fmt::Debug for EventCell<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventCell").field("name", &self.name).finish()
    }
}

// =============================================================================
// EventQueueCell
// =============================================================================

/// A queued event binding: occurrences are retained in arrival order.
pub struct EventQueueCell<E: UaEvent> {
    pub(crate) queue: Arc<EventQueue<E>>,
    client_handle: u32,
    name: String,
}

/// Shared queue behind an [`EventQueueCell`].
pub(crate) struct EventQueue<E> {
    items: Mutex<VecDeque<E>>,
    notify: Notify,
}

impl<E> EventQueue<E> {
    pub(crate) fn push(&self, event: E) {
        self.items.lock().push_back(event);
        self.notify.notify_one();
    }
}

impl<E: UaEvent> Clone for EventQueueCell<E> {
    fn clone(&self) -> Self {
        Self {
            queue: Arc::clone(&self.queue),
            client_handle: self.client_handle,
            name: self.name.clone(),
        }
    }
}

impl<E: UaEvent> EventQueueCell<E> {
    pub(crate) fn new(name: String, client_handle: u32) -> Self {
        Self {
            queue: Arc::new(EventQueue {
                items: Mutex::new(VecDeque::new()),
                notify: Notify::new(),
            }),
            client_handle,
            name,
        }
    }

    /// Returns the binding name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the client handle.
    pub fn client_handle(&self) -> u32 {
        self.client_handle
    }

    /// Pops the oldest queued event.
    pub fn pop(&self) -> Option<E> {
        self.queue.items.lock().pop_front()
    }

    /// Returns the queued event count.
    pub fn len(&self) -> usize {
        self.queue.items.lock().len()
    }

    /// Returns `true` when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Waits for and pops the next event.
    pub async fn next(&self) -> E {
        loop {
            if let Some(event) = self.pop() {
                return event;
            }
            self.queue.notify.notified().await;
        }
    }
}

impl<E: UaEvent> fmt::Debug for EventQueueCell<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventQueueCell")
            .field("name", &self.name)
            .field("len", &self.len())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn value_cell() -> (ValueCell<f64>, mpsc::UnboundedReceiver<WriteCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let slot = ValueSlot::new("Speed".to_string());
        (ValueCell::new(slot, 7, tx), rx)
    }

    #[test]
    fn test_publish_does_not_write_back() {
        let (cell, mut writes) = value_cell();

        // Engine-side dispatch path.
        cell.slot.publish(DataValue::new(42.5f64));

        assert_eq!(cell.get(), Some(42.5));
        assert!(writes.try_recv().is_err());
    }

    #[test]
    fn test_set_enqueues_write() {
        let (cell, mut writes) = value_cell();
        cell.validate_range(0.0..=20.0);

        cell.set(10.0);

        let command = writes.try_recv().unwrap();
        assert_eq!(command.client_handle, 7);
        assert_eq!(command.value.as_f64(), Some(10.0));
        assert!(cell.errors().is_empty());
    }

    #[test]
    fn test_invalid_set_never_writes() {
        let (cell, mut writes) = value_cell();
        cell.validate_range(0.0..=20.0);

        cell.set(25.0);

        assert!(writes.try_recv().is_err());
        let errors = cell.errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("outside the range"));

        // A later valid edit clears the errors and writes.
        cell.set(5.0);
        assert!(writes.try_recv().is_ok());
        assert!(cell.errors().is_empty());
    }

    #[test]
    fn test_typed_projection() {
        let (cell, _writes) = value_cell();
        cell.slot.publish(DataValue::new(Variant::String("nope".into())));
        assert_eq!(cell.get(), None);
    }

    #[tokio::test]
    async fn test_queue_cell_order() {
        let slot = QueueSlot::new("Samples".to_string());
        let cell = QueueCell::new(Arc::clone(&slot), 3);

        slot.publish(DataValue::new(1i32));
        slot.publish(DataValue::new(2i32));
        slot.publish(DataValue::new(3i32));

        assert_eq!(cell.len(), 3);
        assert_eq!(cell.next().await.value().as_i32(), Some(1));
        assert_eq!(cell.next().await.value().as_i32(), Some(2));
        assert_eq!(cell.pop().unwrap().value().as_i32(), Some(3));
        assert!(cell.is_empty());
    }
}
