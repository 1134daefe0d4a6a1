// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # opclink-client
//!
//! Asynchronous OPC UA client runtime: session channels, the
//! application-scoped channel pool and the subscription engine.
//!
//! The moving parts, leaf first:
//!
//! - **Providers**: trait boundaries for certificates, transport and the
//!   secure conversation ([`provider`])
//! - **Services**: the opaque request/response pairs the runtime calls
//!   ([`services`])
//! - **Channel**: [`ClientSessionChannel`] with its state machine and
//!   publish pump ([`channel`])
//! - **Application**: the one-per-process channel pool with suspend/run
//!   and single-flight creation ([`application`])
//! - **Subscription**: typed bindings, monitored-item lifecycle, publish
//!   dispatch, write-back and the supervised retry loop ([`subscription`])
//!
//! # Example
//!
//! ```rust,ignore
//! let app = UaApplication::builder(ApplicationDescription::new(
//!         "boiler-hmi", "urn:factory:boiler-hmi", "urn:factory:opclink"))
//!     .conversation_provider(provider)
//!     .build()?;
//!
//! let mut builder = Subscription::builder(app.clone(), "opc.tcp://plc-01:4840");
//! let temperature: ValueCell<f64> =
//!     builder.value("Temperature", MonitoredItemOptions::value("ns=4;s=Boiler.Temp")?);
//! let subscription = builder.build()?;
//!
//! subscription.wait_for_state(CommunicationState::Opened).await;
//! println!("temperature: {:?}", temperature.get());
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Core Modules
// =============================================================================

pub mod error;
pub mod identity;
pub mod provider;
pub mod services;
pub mod types;

// =============================================================================
// Runtime Modules
// =============================================================================

pub mod application;
pub mod channel;
pub mod subscription;

// =============================================================================
// Re-exports for convenience
// =============================================================================

pub use application::{UaApplication, UaApplicationBuilder};
pub use channel::{ClientSessionChannel, CommunicationState};
pub use error::{ClientError, ClientResult};
pub use identity::{anonymous_provider, identity_provider, IdentityProvider, UserIdentity};
pub use provider::{
    CertificateStore, Conversation, ConversationProvider, RequestChannel, TransportConnection,
    TransportConnector,
};
pub use subscription::{
    BaseEvent, EventCell, EventQueueCell, MonitoredItemKind, MonitoredItemOptions,
    MonitoredItemStatus, QueueCell, Subscription, SubscriptionBuilder, SubscriptionSettings,
    UaEvent, ValueCell,
};
pub use types::{
    ApplicationDescription, ClientOptions, EndpointDescription, MappedEndpoint, SecurityMode,
};

// Re-export the value model; nearly every caller needs it.
pub use opclink_core as core;
pub use opclink_core::{DataValue, ExpandedNodeId, NodeId, StatusCode, Variant};
