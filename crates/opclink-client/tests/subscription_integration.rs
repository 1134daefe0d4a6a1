// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Subscription engine integration tests against the scripted mock
//! conversation.

mod common;

use std::sync::Arc;
use std::time::Duration;

use serial_test::serial;

use opclink_client::core::{NodeId, StatusCode, Variant};
use opclink_client::{
    BaseEvent, CommunicationState, MonitoredItemOptions, Subscription, UaApplication, ValueCell,
};

use common::{build_app, wait_until, MockServer};

const ENDPOINT: &str = "opc.tcp://plc-01:4840";

async fn wait_opened(subscription: &Subscription) {
    tokio::time::timeout(
        Duration::from_secs(5),
        subscription.wait_for_state(CommunicationState::Opened),
    )
    .await
    .expect("subscription opened");
}

async fn teardown(subscription: Arc<Subscription>, app: Arc<UaApplication>) {
    subscription.close().await;
    app.dispose().await;
}

#[tokio::test]
#[serial]
async fn data_change_updates_cell_without_write_back() {
    let server = MockServer::new();
    let app = build_app(&server);

    let mut builder = Subscription::builder(Arc::clone(&app), ENDPOINT);
    let value: ValueCell<f64> = builder.value(
        "Value",
        MonitoredItemOptions::value("ns=4;s=Value").unwrap(),
    );
    let subscription = builder.build().unwrap();

    wait_opened(&subscription).await;
    let id = server.last_subscription_id();
    assert_eq!(subscription.subscription_id(), id);

    let mut updates = value.subscribe();
    server.push_data_change(id, value.client_handle(), Variant::Double(42.5));

    tokio::time::timeout(Duration::from_secs(2), updates.changed())
        .await
        .expect("data change dispatched")
        .unwrap();

    assert_eq!(value.get(), Some(42.5));
    // Publish dispatch never feeds back into the server.
    assert_eq!(server.write_count(), 0);

    teardown(subscription, app).await;
}

#[tokio::test]
#[serial]
async fn monitored_items_are_created_in_chunks_of_100() {
    let server = MockServer::new();
    let app = build_app(&server);

    let mut builder = Subscription::builder(Arc::clone(&app), ENDPOINT);
    let mut cells: Vec<ValueCell<f64>> = Vec::new();
    for i in 0..250 {
        cells.push(builder.value(
            &format!("Item{i}"),
            MonitoredItemOptions::value(&format!("ns=2;s=Item{i}")).unwrap(),
        ));
    }

    // One bad item in the second chunk must not disturb the rest.
    server.fail_create_for_handle(cells[149].client_handle());

    let subscription = builder.build().unwrap();
    wait_opened(&subscription).await;

    assert_eq!(server.create_item_calls(), vec![100, 100, 50]);

    // Request order matches declaration order across all chunks.
    let expected: Vec<NodeId> = (0..250)
        .map(|i| NodeId::string(2, format!("Item{i}")))
        .collect();
    assert_eq!(server.created_item_nodes(), expected);

    let items = subscription.monitored_items();
    assert_eq!(items.len(), 250);
    assert_eq!(
        items[149].create_status,
        Some(StatusCode::BAD_NODE_ID_UNKNOWN)
    );
    for index in [0, 99, 100, 148, 150, 249] {
        assert_eq!(
            items[index].create_status,
            Some(StatusCode::GOOD),
            "item {index} should be unaffected"
        );
    }

    teardown(subscription, app).await;
}

#[tokio::test]
#[serial]
async fn valid_write_is_sent_invalid_write_is_suppressed() {
    let server = MockServer::new();
    let node = NodeId::string(4, "Setpoint");
    server.set_value(node.clone(), Variant::Double(1.0));
    let app = build_app(&server);

    let mut builder = Subscription::builder(Arc::clone(&app), ENDPOINT);
    let setpoint: ValueCell<f64> = builder.value(
        "Setpoint",
        MonitoredItemOptions::value("ns=4;s=Setpoint").unwrap(),
    );
    setpoint.validate_range(0.0..=20.0);
    let subscription = builder.build().unwrap();
    wait_opened(&subscription).await;

    // Valid: exactly one write with the edited value.
    setpoint.set(10.0);
    assert!(wait_until(Duration::from_secs(2), || server.write_count() == 1).await);
    let history = server.write_history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].0, node);
    assert_eq!(history[0].1.as_f64(), Some(10.0));
    assert!(wait_until(Duration::from_secs(2), || {
        setpoint.last_write_status() == Some(StatusCode::GOOD)
    })
    .await);

    // Invalid: no network write, error recorded on the binding.
    setpoint.set(25.0);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(server.write_count(), 1);
    assert_eq!(setpoint.errors().len(), 1);
    let errors = subscription.errors();
    assert!(errors.get("Setpoint").is_some());

    teardown(subscription, app).await;
}

#[tokio::test]
#[serial]
async fn notifications_apply_in_arrival_order() {
    let server = MockServer::new();
    let app = build_app(&server);

    let mut builder = Subscription::builder(Arc::clone(&app), ENDPOINT);
    let samples = builder.value_queue(
        "Samples",
        MonitoredItemOptions::value("ns=4;s=Samples").unwrap(),
    );
    let subscription = builder.build().unwrap();
    wait_opened(&subscription).await;
    let id = server.last_subscription_id();

    for i in 1..=5 {
        server.push_data_change(id, samples.client_handle(), Variant::Int32(i));
    }

    assert!(wait_until(Duration::from_secs(2), || samples.len() == 5).await);
    for expected in 1..=5 {
        let value = samples.pop().unwrap();
        assert_eq!(value.value().as_i32(), Some(expected));
    }

    teardown(subscription, app).await;
}

#[tokio::test]
#[serial]
async fn unmatched_handle_is_skipped_not_fatal() {
    let server = MockServer::new();
    let app = build_app(&server);

    let mut builder = Subscription::builder(Arc::clone(&app), ENDPOINT);
    let value: ValueCell<i32> = builder.value(
        "Value",
        MonitoredItemOptions::value("ns=4;s=Value").unwrap(),
    );
    let subscription = builder.build().unwrap();
    wait_opened(&subscription).await;
    let id = server.last_subscription_id();

    // An unknown handle is logged and skipped; the next notification in
    // the stream still lands.
    server.push_data_change(id, 0xDEAD_BEEF, Variant::Int32(-1));
    server.push_data_change(id, value.client_handle(), Variant::Int32(7));

    assert!(wait_until(Duration::from_secs(2), || value.get() == Some(7)).await);
    assert_eq!(subscription.state(), CommunicationState::Opened);

    teardown(subscription, app).await;
}

#[tokio::test]
#[serial]
async fn events_project_onto_typed_cells() {
    let server = MockServer::new();
    let app = build_app(&server);

    let mut builder = Subscription::builder(Arc::clone(&app), ENDPOINT);
    let alarms = builder.event_queue::<BaseEvent>(
        "Alarms",
        MonitoredItemOptions::event("i=2253").unwrap(),
    );
    let subscription = builder.build().unwrap();
    wait_opened(&subscription).await;
    let id = server.last_subscription_id();

    server.push_event(
        id,
        alarms.client_handle(),
        vec![
            Variant::ByteString(vec![1]),
            Variant::Null,
            Variant::String("boiler-7".to_string()),
            Variant::Null,
            Variant::Null,
            Variant::UInt16(900),
        ],
    );

    let event = tokio::time::timeout(Duration::from_secs(2), alarms.next())
        .await
        .expect("event dispatched");
    assert_eq!(event.source_name.as_deref(), Some("boiler-7"));
    assert_eq!(event.severity, 900);

    teardown(subscription, app).await;
}

#[tokio::test]
#[serial]
async fn connection_failure_faults_then_recovers() {
    let server = MockServer::new();
    server.fail_connections(true);
    let app = build_app(&server);

    let mut builder = Subscription::builder(Arc::clone(&app), ENDPOINT);
    let _value: ValueCell<f64> = builder.value(
        "Value",
        MonitoredItemOptions::value("ns=4;s=Value").unwrap(),
    );
    let subscription = builder.build().unwrap();

    tokio::time::timeout(
        Duration::from_secs(5),
        subscription.wait_for_state(CommunicationState::Faulted),
    )
    .await
    .expect("subscription faults while the server is unreachable");

    // Server comes back; the retry loop reopens on its own.
    server.fail_connections(false);
    tokio::time::timeout(
        Duration::from_secs(10),
        subscription.wait_for_state(CommunicationState::Opened),
    )
    .await
    .expect("subscription recovers after back-off");

    teardown(subscription, app).await;
}

#[tokio::test]
#[serial]
async fn close_deletes_the_server_subscription() {
    let server = MockServer::new();
    let app = build_app(&server);

    let mut builder = Subscription::builder(Arc::clone(&app), ENDPOINT);
    let _value: ValueCell<f64> = builder.value(
        "Value",
        MonitoredItemOptions::value("ns=4;s=Value").unwrap(),
    );
    let subscription = builder.build().unwrap();
    wait_opened(&subscription).await;
    let id = server.last_subscription_id();

    subscription.close().await;
    subscription.close().await; // idempotent

    assert_eq!(subscription.state(), CommunicationState::Closed);
    assert_eq!(server.deleted_subscriptions(), vec![id]);
    assert_eq!(subscription.subscription_id(), 0);

    app.dispose().await;
}
