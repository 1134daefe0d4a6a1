// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # opclink-core
//!
//! OPC UA value model and binary codec for the opclink client runtime.
//!
//! This crate provides the protocol's type system and its wire form:
//!
//! - **Variant**: the tagged union over the built-in types, with explicit
//!   per-type conversions and rectangular arrays
//! - **DataValue**: a variant wrapped with status and timestamps
//! - **ExtensionObject**: the self-describing container for structured
//!   values, keyed by binary-encoding id
//! - **Codec**: the `Encodable` contract plus the OPC UA Binary
//!   encoder/decoder
//! - **TypeLibrary**: the process-wide registry resolving runtime types to
//!   binary-encoding ids and back
//!
//! # Example
//!
//! ```rust,ignore
//! use opclink_core::{BinaryDecoder, BinaryEncoder, Encoder, Decoder, Variant};
//!
//! let mut encoder = BinaryEncoder::new();
//! encoder.write_variant("Value", &Variant::from(42.5f64))?;
//!
//! let mut decoder = BinaryDecoder::new(encoder.finish());
//! let value = decoder.read_variant("Value")?;
//! assert_eq!(value.as_f64(), Some(42.5));
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Core Modules
// =============================================================================

pub mod codec;
pub mod data_value;
pub mod error;
pub mod extension_object;
pub mod node_id;
pub mod registry;
pub mod status;
pub mod types;
pub mod variant;

// =============================================================================
// Re-exports for convenience
// =============================================================================

pub use codec::{BinaryDecoder, BinaryEncoder, Decoder, Encodable, Encoder};
pub use data_value::DataValue;
pub use error::{CodecError, CodecResult};
pub use extension_object::{BodyType, ExtensionBody, ExtensionObject};
pub use node_id::{ExpandedNodeId, NodeId, NodeIdentifier};
pub use registry::{TypeLibrary, TypeLibraryBuilder, TypeRegistration};
pub use status::StatusCode;
pub use types::{DiagnosticInfo, LocalizedText, QualifiedName, XmlElement};
pub use variant::{FromVariant, UaEnum, Variant, VariantArray, VariantType};
