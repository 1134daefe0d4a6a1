// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Channel pool integration tests.
//!
//! The application enforces one live instance per process, so every test
//! that builds one runs serially and disposes it before returning.

mod common;

use std::sync::Arc;
use std::time::Duration;

use serial_test::serial;
use tokio_util::sync::CancellationToken;

use opclink_client::{ClientError, CommunicationState};

use common::{build_app, wait_until, MockServer};

const ENDPOINT: &str = "opc.tcp://plc-01:4840";

#[tokio::test]
#[serial]
async fn concurrent_get_channel_is_single_flight() {
    let server = MockServer::new();
    server.set_connect_delay(Duration::from_millis(50));
    let app = build_app(&server);

    let token = CancellationToken::new();
    let mut joins = Vec::new();
    for _ in 0..8 {
        let app = Arc::clone(&app);
        let token = token.clone();
        joins.push(tokio::spawn(async move {
            app.get_channel(ENDPOINT, &token).await
        }));
    }

    let mut channels = Vec::new();
    for join in joins {
        channels.push(join.await.unwrap().unwrap());
    }

    // All callers share the one channel created by the one connect.
    assert_eq!(server.connect_count(), 1);
    for channel in &channels[1..] {
        assert!(Arc::ptr_eq(&channels[0], channel));
    }

    app.dispose().await;
}

#[tokio::test]
#[serial]
async fn distinct_urls_get_distinct_channels() {
    let server = MockServer::new();
    let app = build_app(&server);
    let token = CancellationToken::new();

    let first = app.get_channel("opc.tcp://plc-01:4840", &token).await.unwrap();
    let second = app.get_channel("opc.tcp://plc-02:4840", &token).await.unwrap();

    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(server.connect_count(), 2);
    assert_eq!(app.channel_count(), 2);

    app.dispose().await;
}

#[tokio::test]
#[serial]
async fn suspend_gates_get_channel_until_run() {
    let server = MockServer::new();
    let app = build_app(&server);

    app.suspend().await;

    let waiting = {
        let app = Arc::clone(&app);
        tokio::spawn(async move {
            let token = CancellationToken::new();
            app.get_channel(ENDPOINT, &token).await
        })
    };

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!waiting.is_finished(), "get_channel completed while suspended");

    app.run();
    let channel = tokio::time::timeout(Duration::from_secs(2), waiting)
        .await
        .expect("get_channel resumed after run")
        .unwrap()
        .unwrap();
    assert_eq!(channel.state(), CommunicationState::Opened);

    app.dispose().await;
}

#[tokio::test]
#[serial]
async fn creation_failure_propagates_and_is_not_cached() {
    let server = MockServer::new();
    let app = build_app(&server);
    let token = CancellationToken::new();

    server.fail_connections(true);
    let error = app.get_channel(ENDPOINT, &token).await.unwrap_err();
    assert!(matches!(error, ClientError::Transport { .. }));

    // The failed entry is evicted; the next demand connects fresh.
    server.fail_connections(false);
    let channel = app.get_channel(ENDPOINT, &token).await.unwrap();
    assert_eq!(channel.state(), CommunicationState::Opened);
    assert_eq!(server.connect_count(), 1);

    app.dispose().await;
}

#[tokio::test]
#[serial]
async fn closing_channel_evicts_pool_entry() {
    let server = MockServer::new();
    let app = build_app(&server);
    let token = CancellationToken::new();

    let channel = app.get_channel(ENDPOINT, &token).await.unwrap();
    assert_eq!(app.channel_count(), 1);

    channel.close().await.unwrap();
    assert!(wait_until(Duration::from_secs(1), || app.channel_count() == 0).await);

    // A fresh request creates a fresh channel, never one mid-teardown.
    let replacement = app.get_channel(ENDPOINT, &token).await.unwrap();
    assert!(!Arc::ptr_eq(&channel, &replacement));
    assert_eq!(server.connect_count(), 2);

    app.dispose().await;
}

#[tokio::test]
#[serial]
async fn dispose_is_idempotent_and_releases_the_instance_slot() {
    let server = MockServer::new();
    let app = build_app(&server);

    // Only one live application per process.
    let second = opclink_client::UaApplication::builder(
        opclink_client::ApplicationDescription::new("dup", "urn:dup", "urn:dup"),
    )
    .conversation_provider(common::MockProvider::new(Arc::clone(&server)))
    .build();
    assert!(matches!(second, Err(ClientError::AlreadyRunning)));

    let token = CancellationToken::new();
    let channel = app.get_channel(ENDPOINT, &token).await.unwrap();

    app.dispose().await;
    app.dispose().await; // idempotent

    assert!(channel.state().is_terminal());
    assert!(matches!(
        app.get_channel(ENDPOINT, &token).await,
        Err(ClientError::Disposed)
    ));

    // The slot is free again.
    let next = build_app(&server);
    next.dispose().await;
}

#[tokio::test]
#[serial]
async fn cancelled_wait_unblocks_with_cancellation_error() {
    let server = MockServer::new();
    let app = build_app(&server);

    app.suspend().await;
    let token = CancellationToken::new();

    let waiting = {
        let app = Arc::clone(&app);
        let token = token.clone();
        tokio::spawn(async move { app.get_channel(ENDPOINT, &token).await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    token.cancel();

    let result = tokio::time::timeout(Duration::from_secs(1), waiting)
        .await
        .expect("cancellation unblocks the waiter")
        .unwrap();
    assert!(matches!(result, Err(ClientError::Cancelled)));

    app.dispose().await;
}
