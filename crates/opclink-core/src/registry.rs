// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Process-wide registry of structured types.
//!
//! The [`TypeLibrary`] maps concrete Rust types to their binary-encoding
//! ids and back. Registration is an explicit step at startup: collect the
//! types with a [`TypeLibraryBuilder`] and install the finished library
//! once; it is read-only afterwards. A structured type used as an
//! extension-object body without a registration is an error, never a
//! silent fallback.
//!
//! # Example
//!
//! ```rust,ignore
//! TypeLibrary::builder()
//!     .register::<MachineStatus>("ns=2;i=3001")?
//!     .register::<RecipeStep>("ns=2;i=3007")?
//!     .install()?;
//! ```

use std::any::TypeId;
use std::collections::HashMap;

use once_cell::sync::OnceCell;

use crate::codec::Encodable;
use crate::error::{CodecError, CodecResult};
use crate::node_id::ExpandedNodeId;

static GLOBAL: OnceCell<TypeLibrary> = OnceCell::new();

/// Creates a default instance of a registered type for decoding into.
pub type EncodableFactory = fn() -> Box<dyn Encodable>;

// =============================================================================
// TypeRegistration
// =============================================================================

/// One registered structured type.
#[derive(Debug, Clone)]
pub struct TypeRegistration {
    /// Concrete type name, for diagnostics.
    pub type_name: &'static str,

    /// The namespace-qualified binary-encoding id.
    pub binary_encoding_id: ExpandedNodeId,

    /// Default-constructs an instance for decode-into.
    pub factory: EncodableFactory,
}

// =============================================================================
// TypeLibrary
// =============================================================================

/// Read-only mapping between runtime types and binary-encoding ids.
#[derive(Debug, Default)]
pub struct TypeLibrary {
    by_type: HashMap<TypeId, ExpandedNodeId>,
    by_id: HashMap<ExpandedNodeId, TypeRegistration>,
}

impl TypeLibrary {
    /// Starts building a library.
    pub fn builder() -> TypeLibraryBuilder {
        TypeLibraryBuilder {
            library: TypeLibrary::default(),
        }
    }

    /// Returns the installed process-wide library, if any.
    pub fn global() -> Option<&'static TypeLibrary> {
        GLOBAL.get()
    }

    /// Returns the binary-encoding id registered for a runtime type.
    pub fn binary_encoding_id(&self, type_id: TypeId) -> Option<&ExpandedNodeId> {
        self.by_type.get(&type_id)
    }

    /// Returns the binary-encoding id registered for `T`.
    pub fn binary_encoding_id_of<T: 'static>(&self) -> Option<&ExpandedNodeId> {
        self.binary_encoding_id(TypeId::of::<T>())
    }

    /// Returns the decode factory registered for a binary-encoding id.
    pub fn decode_factory(&self, id: &ExpandedNodeId) -> Option<EncodableFactory> {
        self.by_id.get(id).map(|r| r.factory)
    }

    /// Returns the registration for a binary-encoding id.
    pub fn registration(&self, id: &ExpandedNodeId) -> Option<&TypeRegistration> {
        self.by_id.get(id)
    }

    /// Returns the number of registered types.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Returns `true` when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

// =============================================================================
// TypeLibraryBuilder
// =============================================================================

/// Collects type registrations before the library is installed.
#[derive(Debug)]
pub struct TypeLibraryBuilder {
    library: TypeLibrary,
}

impl TypeLibraryBuilder {
    /// Registers `T` under the given binary-encoding id (text form).
    pub fn register<T>(self, binary_encoding_id: &str) -> CodecResult<Self>
    where
        T: Encodable + Default,
    {
        let id = ExpandedNodeId::parse(binary_encoding_id)?;
        self.register_with_id::<T>(id)
    }

    /// Registers `T` under an already parsed binary-encoding id.
    pub fn register_with_id<T>(mut self, binary_encoding_id: ExpandedNodeId) -> CodecResult<Self>
    where
        T: Encodable + Default,
    {
        fn construct<T: Encodable + Default>() -> Box<dyn Encodable> {
            Box::new(T::default())
        }

        let registration = TypeRegistration {
            type_name: std::any::type_name::<T>(),
            binary_encoding_id: binary_encoding_id.clone(),
            factory: construct::<T>,
        };

        self.library
            .by_type
            .insert(TypeId::of::<T>(), binary_encoding_id.clone());
        self.library.by_id.insert(binary_encoding_id, registration);
        Ok(self)
    }

    /// Finishes building without installing, for explicitly scoped use.
    pub fn build(self) -> TypeLibrary {
        self.library
    }

    /// Installs the library as the process-wide instance.
    ///
    /// Fails if a library is already installed; the library is built once
    /// and read-only thereafter.
    pub fn install(self) -> CodecResult<()> {
        let count = self.library.len();
        GLOBAL
            .set(self.library)
            .map_err(|_| CodecError::LibraryAlreadyInstalled)?;
        tracing::debug!(types = count, "Type library installed");
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Decoder, Encoder};

    #[derive(Debug, Clone, Default, PartialEq)]
    struct SamplePoint {
        x: f64,
        y: f64,
    }

    impl Encodable for SamplePoint {
        fn encode(&self, encoder: &mut dyn Encoder) -> CodecResult<()> {
            encoder.write_f64("X", self.x)?;
            encoder.write_f64("Y", self.y)
        }

        fn decode(&mut self, decoder: &mut dyn Decoder) -> CodecResult<()> {
            self.x = decoder.read_f64("X")?;
            self.y = decoder.read_f64("Y")?;
            Ok(())
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }

        fn clone_encodable(&self) -> Box<dyn Encodable> {
            Box::new(self.clone())
        }
    }

    #[test]
    fn test_builder_lookup() {
        let library = TypeLibrary::builder()
            .register::<SamplePoint>("ns=2;i=5001")
            .unwrap()
            .build();

        let id = library.binary_encoding_id_of::<SamplePoint>().unwrap();
        assert_eq!(*id, ExpandedNodeId::parse("ns=2;i=5001").unwrap());

        let factory = library.decode_factory(id).unwrap();
        let instance = factory();
        assert!(instance.as_any().downcast_ref::<SamplePoint>().is_some());

        assert_eq!(library.len(), 1);
    }

    #[test]
    fn test_unregistered_lookup() {
        let library = TypeLibrary::builder().build();
        assert!(library.binary_encoding_id_of::<SamplePoint>().is_none());
        assert!(library
            .decode_factory(&ExpandedNodeId::parse("i=1").unwrap())
            .is_none());
        assert!(library.is_empty());
    }

    #[test]
    fn test_bad_encoding_id() {
        let result = TypeLibrary::builder().register::<SamplePoint>("not-a-node-id");
        assert!(result.is_err());
    }
}
