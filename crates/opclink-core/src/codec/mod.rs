// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The encode/decode contract and the OPC UA Binary codec.
//!
//! Every structured type implements [`Encodable`]: it writes its members
//! through an [`Encoder`] and reads them back through a [`Decoder`],
//! pushing a namespace scope around its member names so the same member
//! name stays unambiguous across nested types from different namespaces.
//!
//! The concrete wire format lives in [`BinaryEncoder`] and
//! [`BinaryDecoder`], which implement OPC UA Binary DataEncoding
//! (little-endian, length-prefixed strings, compact node ids).

mod decoder;
mod encoder;

pub use decoder::{BinaryDecoder, Decoder};
pub use encoder::{BinaryEncoder, Encoder};

use std::any::Any;
use std::fmt;

use crate::error::CodecResult;

/// Maximum nesting depth for variants, extension objects and diagnostics.
pub(crate) const MAX_NESTING_DEPTH: u32 = 100;

// =============================================================================
// Encodable
// =============================================================================

/// A structured value that can be written to and read from an encoder.
///
/// Decoding is performed into a default-constructed instance (the registry
/// creates one via its factory and then calls [`Encodable::decode`]), which
/// keeps the trait object-safe.
pub trait Encodable: fmt::Debug + Send + Sync + 'static {
    /// Writes the members of this value.
    fn encode(&self, encoder: &mut dyn Encoder) -> CodecResult<()>;

    /// Reads the members of this value, replacing the current contents.
    fn decode(&mut self, decoder: &mut dyn Decoder) -> CodecResult<()>;

    /// Returns `true` when the value is semantically absent, allowing an
    /// optional member to be omitted on the wire.
    fn is_default(&self) -> bool {
        false
    }

    /// Upcast for typed recovery of decoded bodies.
    fn as_any(&self) -> &dyn Any;

    /// Clones into a boxed trait object.
    fn clone_encodable(&self) -> Box<dyn Encodable>;

    /// Returns the concrete type name for diagnostics.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl Clone for Box<dyn Encodable> {
    fn clone(&self) -> Self {
        self.clone_encodable()
    }
}
