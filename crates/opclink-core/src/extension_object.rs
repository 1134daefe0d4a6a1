// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Self-describing containers for structured values.
//!
//! An [`ExtensionObject`] carries a structured value together with the
//! namespace-qualified binary-encoding id that identifies its type on the
//! wire. The body is one of: absent, an undecoded byte string, an XML
//! fragment, or a decoded structure. An undecoded body is not an error;
//! it is how values of unknown types survive a round trip.

use crate::codec::Encodable;
use crate::error::{CodecError, CodecResult};
use crate::node_id::ExpandedNodeId;
use crate::registry::TypeLibrary;
use crate::types::XmlElement;

// =============================================================================
// BodyType
// =============================================================================

/// Discriminates the body representation of an [`ExtensionObject`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyType {
    /// No body.
    None,
    /// Undecoded binary body.
    ByteString,
    /// XML body.
    XmlElement,
    /// Decoded structure.
    Structure,
}

// =============================================================================
// ExtensionBody
// =============================================================================

/// The body of an [`ExtensionObject`].
#[derive(Debug, Clone, Default)]
pub enum ExtensionBody {
    /// No body.
    #[default]
    None,
    /// Undecoded binary body.
    ByteString(Vec<u8>),
    /// XML body.
    XmlElement(XmlElement),
    /// Decoded structure.
    Structure(Box<dyn Encodable>),
}

impl ExtensionBody {
    /// Returns the discriminant of this body.
    pub fn body_type(&self) -> BodyType {
        match self {
            ExtensionBody::None => BodyType::None,
            ExtensionBody::ByteString(_) => BodyType::ByteString,
            ExtensionBody::XmlElement(_) => BodyType::XmlElement,
            ExtensionBody::Structure(_) => BodyType::Structure,
        }
    }
}

// =============================================================================
// ExtensionObject
// =============================================================================

/// A structured value tagged with its binary-encoding id.
///
/// Invariant: when a body is present, the body kind and the type id are
/// consistent; a missing body clears the type id regardless of what was
/// supplied.
#[derive(Debug, Clone, Default)]
pub struct ExtensionObject {
    body: ExtensionBody,
    type_id: Option<ExpandedNodeId>,
}

impl ExtensionObject {
    /// Creates an empty extension object.
    pub fn null() -> Self {
        Self::default()
    }

    /// Creates an extension object from an undecoded binary body.
    ///
    /// A `None` body produces an empty object regardless of the type id.
    pub fn from_bytes(body: Option<Vec<u8>>, type_id: Option<ExpandedNodeId>) -> Self {
        match body {
            None => Self::null(),
            Some(bytes) => Self {
                body: ExtensionBody::ByteString(bytes),
                type_id,
            },
        }
    }

    /// Creates an extension object from an XML body.
    pub fn from_xml(body: Option<XmlElement>, type_id: Option<ExpandedNodeId>) -> Self {
        match body {
            None => Self::null(),
            Some(xml) => Self {
                body: ExtensionBody::XmlElement(xml),
                type_id,
            },
        }
    }

    /// Creates an extension object from a decoded structure, resolving the
    /// binary-encoding id through the installed [`TypeLibrary`].
    ///
    /// Fails with a data-encoding-unsupported error when the concrete type
    /// has no registration.
    pub fn from_value<T: Encodable>(value: T) -> CodecResult<Self> {
        Self::from_structure(Box::new(value))
    }

    /// Boxed-body variant of [`ExtensionObject::from_value`].
    pub fn from_structure(body: Box<dyn Encodable>) -> CodecResult<Self> {
        let type_id = TypeLibrary::global()
            .and_then(|lib| lib.binary_encoding_id(body.as_any().type_id()))
            .cloned()
            .ok_or_else(|| CodecError::unregistered_type(body.type_name()))?;

        Ok(Self {
            body: ExtensionBody::Structure(body),
            type_id: Some(type_id),
        })
    }

    /// Creates an extension object from a decoded structure with an
    /// explicit type id, bypassing the registry.
    pub fn from_structure_with_id(body: Box<dyn Encodable>, type_id: ExpandedNodeId) -> Self {
        Self {
            body: ExtensionBody::Structure(body),
            type_id: Some(type_id),
        }
    }

    /// Returns the body.
    pub fn body(&self) -> &ExtensionBody {
        &self.body
    }

    /// Returns the body discriminant.
    pub fn body_type(&self) -> BodyType {
        self.body.body_type()
    }

    /// Returns the binary-encoding id, when known.
    pub fn type_id(&self) -> Option<&ExpandedNodeId> {
        self.type_id.as_ref()
    }

    /// Returns `true` when no body is present.
    pub fn is_null(&self) -> bool {
        matches!(self.body, ExtensionBody::None)
    }

    /// Downcasts a decoded structure body to a concrete type.
    pub fn decoded<T: Encodable>(&self) -> Option<&T> {
        match &self.body {
            ExtensionBody::Structure(body) => body.as_any().downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl PartialEq for ExtensionObject {
    fn eq(&self, other: &Self) -> bool {
        if self.type_id != other.type_id {
            return false;
        }
        match (&self.body, &other.body) {
            (ExtensionBody::None, ExtensionBody::None) => true,
            (ExtensionBody::ByteString(a), ExtensionBody::ByteString(b)) => a == b,
            (ExtensionBody::XmlElement(a), ExtensionBody::XmlElement(b)) => a == b,
            // Structures compare by identity of their encoded form; callers
            // that need deep equality should downcast and compare directly.
            _ => false,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node_id::NodeId;

    #[test]
    fn test_null_body_ignores_type_id() {
        let type_id = ExpandedNodeId::new(NodeId::numeric(2, 99));
        let object = ExtensionObject::from_bytes(None, Some(type_id));
        assert_eq!(object.body_type(), BodyType::None);
        assert!(object.type_id().is_none());
        assert!(object.is_null());
    }

    #[test]
    fn test_byte_string_body() {
        let type_id = ExpandedNodeId::new(NodeId::numeric(2, 99));
        let object = ExtensionObject::from_bytes(Some(vec![1, 2, 3]), Some(type_id.clone()));
        assert_eq!(object.body_type(), BodyType::ByteString);
        assert_eq!(object.type_id(), Some(&type_id));
    }

    #[test]
    fn test_xml_body() {
        let object = ExtensionObject::from_xml(Some(XmlElement::new("<a/>")), None);
        assert_eq!(object.body_type(), BodyType::XmlElement);

        let object = ExtensionObject::from_xml(None, None);
        assert_eq!(object.body_type(), BodyType::None);
    }
}
