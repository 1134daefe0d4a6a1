// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The OPC UA tagged value union.
//!
//! [`Variant`] carries every value the protocol can express: the scalar
//! built-in types and rectangular arrays of them. The discriminant always
//! matches the runtime shape of the held value; conversions from native
//! types are explicit (`From` impls for supported scalars, fallible
//! accessors back out), and structured values are always boxed as an
//! [`ExtensionObject`](crate::extension_object::ExtensionObject), never
//! held as a bare trait object.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::codec::Encodable;
use crate::error::{CodecError, CodecResult};
use crate::extension_object::ExtensionObject;
use crate::node_id::{ExpandedNodeId, NodeId};
use crate::status::StatusCode;
use crate::types::{DiagnosticInfo, LocalizedText, QualifiedName, XmlElement};

// =============================================================================
// VariantType
// =============================================================================

/// Wire tag of a [`Variant`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum VariantType {
    /// No value.
    Null = 0,
    /// Boolean.
    Boolean = 1,
    /// Signed 8-bit integer.
    SByte = 2,
    /// Unsigned 8-bit integer.
    Byte = 3,
    /// Signed 16-bit integer.
    Int16 = 4,
    /// Unsigned 16-bit integer.
    UInt16 = 5,
    /// Signed 32-bit integer.
    Int32 = 6,
    /// Unsigned 32-bit integer.
    UInt32 = 7,
    /// Signed 64-bit integer.
    Int64 = 8,
    /// Unsigned 64-bit integer.
    UInt64 = 9,
    /// 32-bit float.
    Float = 10,
    /// 64-bit float.
    Double = 11,
    /// UTF-8 string.
    String = 12,
    /// Timestamp.
    DateTime = 13,
    /// GUID.
    Guid = 14,
    /// Byte string.
    ByteString = 15,
    /// XML fragment.
    XmlElement = 16,
    /// Node id.
    NodeId = 17,
    /// Expanded node id.
    ExpandedNodeId = 18,
    /// Status code.
    StatusCode = 19,
    /// Qualified name.
    QualifiedName = 20,
    /// Localized text.
    LocalizedText = 21,
    /// Extension object.
    ExtensionObject = 22,
    /// Data value (array element only).
    DataValue = 23,
    /// Nested variant (array element only).
    Variant = 24,
    /// Diagnostic info.
    DiagnosticInfo = 25,
}

impl VariantType {
    /// Returns the wire tag value.
    #[inline]
    pub const fn tag(&self) -> u8 {
        *self as u8
    }

    /// Resolves a wire tag back to a variant type.
    pub const fn from_tag(tag: u8) -> Option<Self> {
        let ty = match tag {
            0 => Self::Null,
            1 => Self::Boolean,
            2 => Self::SByte,
            3 => Self::Byte,
            4 => Self::Int16,
            5 => Self::UInt16,
            6 => Self::Int32,
            7 => Self::UInt32,
            8 => Self::Int64,
            9 => Self::UInt64,
            10 => Self::Float,
            11 => Self::Double,
            12 => Self::String,
            13 => Self::DateTime,
            14 => Self::Guid,
            15 => Self::ByteString,
            16 => Self::XmlElement,
            17 => Self::NodeId,
            18 => Self::ExpandedNodeId,
            19 => Self::StatusCode,
            20 => Self::QualifiedName,
            21 => Self::LocalizedText,
            22 => Self::ExtensionObject,
            23 => Self::DataValue,
            24 => Self::Variant,
            25 => Self::DiagnosticInfo,
            _ => return None,
        };
        Some(ty)
    }

    /// Returns `true` for the numeric scalar tags.
    pub const fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::SByte
                | Self::Byte
                | Self::Int16
                | Self::UInt16
                | Self::Int32
                | Self::UInt32
                | Self::Int64
                | Self::UInt64
                | Self::Float
                | Self::Double
        )
    }
}

// =============================================================================
// Variant
// =============================================================================

/// An immutable tagged union over the OPC UA built-in types.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Variant {
    /// No value.
    #[default]
    Null,
    /// Boolean.
    Boolean(bool),
    /// Signed 8-bit integer.
    SByte(i8),
    /// Unsigned 8-bit integer.
    Byte(u8),
    /// Signed 16-bit integer.
    Int16(i16),
    /// Unsigned 16-bit integer.
    UInt16(u16),
    /// Signed 32-bit integer.
    Int32(i32),
    /// Unsigned 32-bit integer.
    UInt32(u32),
    /// Signed 64-bit integer.
    Int64(i64),
    /// Unsigned 64-bit integer.
    UInt64(u64),
    /// 32-bit float.
    Float(f32),
    /// 64-bit float.
    Double(f64),
    /// UTF-8 string.
    String(String),
    /// Timestamp.
    DateTime(DateTime<Utc>),
    /// GUID.
    Guid(Uuid),
    /// Byte string.
    ByteString(Vec<u8>),
    /// XML fragment.
    XmlElement(XmlElement),
    /// Node id.
    NodeId(NodeId),
    /// Expanded node id.
    ExpandedNodeId(ExpandedNodeId),
    /// Status code.
    StatusCode(StatusCode),
    /// Qualified name.
    QualifiedName(QualifiedName),
    /// Localized text.
    LocalizedText(LocalizedText),
    /// Boxed extension object.
    ExtensionObject(Box<ExtensionObject>),
    /// Nested variant. Only valid as an array element.
    Variant(Box<Variant>),
    /// Diagnostic info.
    DiagnosticInfo(Box<DiagnosticInfo>),
    /// Rectangular array of one scalar kind.
    Array(Box<VariantArray>),
}

impl Variant {
    /// Returns the scalar wire tag of this value. For arrays this is the
    /// element tag; the array shape is reported by [`Variant::is_array`].
    pub fn variant_type(&self) -> VariantType {
        match self {
            Variant::Null => VariantType::Null,
            Variant::Boolean(_) => VariantType::Boolean,
            Variant::SByte(_) => VariantType::SByte,
            Variant::Byte(_) => VariantType::Byte,
            Variant::Int16(_) => VariantType::Int16,
            Variant::UInt16(_) => VariantType::UInt16,
            Variant::Int32(_) => VariantType::Int32,
            Variant::UInt32(_) => VariantType::UInt32,
            Variant::Int64(_) => VariantType::Int64,
            Variant::UInt64(_) => VariantType::UInt64,
            Variant::Float(_) => VariantType::Float,
            Variant::Double(_) => VariantType::Double,
            Variant::String(_) => VariantType::String,
            Variant::DateTime(_) => VariantType::DateTime,
            Variant::Guid(_) => VariantType::Guid,
            Variant::ByteString(_) => VariantType::ByteString,
            Variant::XmlElement(_) => VariantType::XmlElement,
            Variant::NodeId(_) => VariantType::NodeId,
            Variant::ExpandedNodeId(_) => VariantType::ExpandedNodeId,
            Variant::StatusCode(_) => VariantType::StatusCode,
            Variant::QualifiedName(_) => VariantType::QualifiedName,
            Variant::LocalizedText(_) => VariantType::LocalizedText,
            Variant::ExtensionObject(_) => VariantType::ExtensionObject,
            Variant::Variant(_) => VariantType::Variant,
            Variant::DiagnosticInfo(_) => VariantType::DiagnosticInfo,
            Variant::Array(array) => array.element_type(),
        }
    }

    /// Returns `true` if this is the null variant.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Variant::Null)
    }

    /// Returns `true` if this holds an array.
    #[inline]
    pub fn is_array(&self) -> bool {
        matches!(self, Variant::Array(_))
    }

    /// Boxes a structured value as an extension object variant.
    ///
    /// Fails with a data-encoding-unsupported error when the value's type
    /// has no registered binary-encoding id.
    pub fn structure<T: Encodable>(value: T) -> CodecResult<Self> {
        let object = ExtensionObject::from_value(value)?;
        Ok(Variant::ExtensionObject(Box::new(object)))
    }

    /// Wraps an enumeration value, normalized to its `Int32` representation.
    pub fn from_enum<E: UaEnum>(value: E) -> Self {
        Variant::Int32(value.to_i32())
    }

    /// Recovers an enumeration value from an `Int32` variant.
    pub fn as_enum<E: UaEnum>(&self) -> Option<E> {
        match self {
            Variant::Int32(v) => E::from_i32(*v),
            _ => None,
        }
    }

    /// Returns the value as a boolean if the tag matches.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Variant::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as an i8 if the tag matches.
    pub fn as_sbyte(&self) -> Option<i8> {
        match self {
            Variant::SByte(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as a u8 if the tag matches.
    pub fn as_byte(&self) -> Option<u8> {
        match self {
            Variant::Byte(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as an i16 if the tag matches.
    pub fn as_i16(&self) -> Option<i16> {
        match self {
            Variant::Int16(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as a u16 if the tag matches.
    pub fn as_u16(&self) -> Option<u16> {
        match self {
            Variant::UInt16(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as an i32 if the tag matches.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Variant::Int32(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as a u32 if the tag matches.
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Variant::UInt32(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as an i64 if the tag matches.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Variant::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as a u64 if the tag matches.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Variant::UInt64(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as an f32 if the tag matches.
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Variant::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as an f64 if the tag matches.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Variant::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as a string slice if the tag matches.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Variant::String(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the value as a timestamp if the tag matches.
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Variant::DateTime(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as a GUID if the tag matches.
    pub fn as_guid(&self) -> Option<Uuid> {
        match self {
            Variant::Guid(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as a byte string if the tag matches.
    pub fn as_byte_string(&self) -> Option<&[u8]> {
        match self {
            Variant::ByteString(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the value as a node id if the tag matches.
    pub fn as_node_id(&self) -> Option<&NodeId> {
        match self {
            Variant::NodeId(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the value as a status code if the tag matches.
    pub fn as_status_code(&self) -> Option<StatusCode> {
        match self {
            Variant::StatusCode(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as localized text if the tag matches.
    pub fn as_localized_text(&self) -> Option<&LocalizedText> {
        match self {
            Variant::LocalizedText(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the extension object if the tag matches.
    pub fn as_extension_object(&self) -> Option<&ExtensionObject> {
        match self {
            Variant::ExtensionObject(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the array if the value holds one.
    pub fn as_array(&self) -> Option<&VariantArray> {
        match self {
            Variant::Array(v) => Some(v),
            _ => None,
        }
    }

    /// Widens any numeric scalar to i64, losing fractional parts.
    pub fn to_i64(&self) -> Option<i64> {
        match self {
            Variant::SByte(v) => Some(i64::from(*v)),
            Variant::Byte(v) => Some(i64::from(*v)),
            Variant::Int16(v) => Some(i64::from(*v)),
            Variant::UInt16(v) => Some(i64::from(*v)),
            Variant::Int32(v) => Some(i64::from(*v)),
            Variant::UInt32(v) => Some(i64::from(*v)),
            Variant::Int64(v) => Some(*v),
            Variant::UInt64(v) => i64::try_from(*v).ok(),
            Variant::Float(v) => Some(*v as i64),
            Variant::Double(v) => Some(*v as i64),
            _ => None,
        }
    }

    /// Widens any numeric scalar to f64.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Variant::SByte(v) => Some(f64::from(*v)),
            Variant::Byte(v) => Some(f64::from(*v)),
            Variant::Int16(v) => Some(f64::from(*v)),
            Variant::UInt16(v) => Some(f64::from(*v)),
            Variant::Int32(v) => Some(f64::from(*v)),
            Variant::UInt32(v) => Some(f64::from(*v)),
            Variant::Int64(v) => Some(*v as f64),
            Variant::UInt64(v) => Some(*v as f64),
            Variant::Float(v) => Some(f64::from(*v)),
            Variant::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// Casts a numeric scalar into the requested numeric tag.
    ///
    /// Used by write-back type inference: a local `Double` destined for a
    /// server `Float` node is narrowed before the write. Non-numeric values
    /// and non-numeric targets are returned unchanged.
    pub fn coerce_numeric(&self, target: VariantType) -> Variant {
        if !self.variant_type().is_numeric() || !target.is_numeric() {
            return self.clone();
        }
        let Some(value) = self.to_f64() else {
            return self.clone();
        };
        match target {
            VariantType::SByte => Variant::SByte(value as i8),
            VariantType::Byte => Variant::Byte(value as u8),
            VariantType::Int16 => Variant::Int16(value as i16),
            VariantType::UInt16 => Variant::UInt16(value as u16),
            VariantType::Int32 => Variant::Int32(value as i32),
            VariantType::UInt32 => Variant::UInt32(value as u32),
            VariantType::Int64 => Variant::Int64(value as i64),
            VariantType::UInt64 => Variant::UInt64(value as u64),
            VariantType::Float => Variant::Float(value as f32),
            VariantType::Double => Variant::Double(value),
            _ => self.clone(),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Null => write!(f, "null"),
            Variant::Boolean(v) => write!(f, "{}", v),
            Variant::SByte(v) => write!(f, "{}", v),
            Variant::Byte(v) => write!(f, "{}", v),
            Variant::Int16(v) => write!(f, "{}", v),
            Variant::UInt16(v) => write!(f, "{}", v),
            Variant::Int32(v) => write!(f, "{}", v),
            Variant::UInt32(v) => write!(f, "{}", v),
            Variant::Int64(v) => write!(f, "{}", v),
            Variant::UInt64(v) => write!(f, "{}", v),
            Variant::Float(v) => write!(f, "{}", v),
            Variant::Double(v) => write!(f, "{}", v),
            Variant::String(v) => write!(f, "{}", v),
            Variant::DateTime(v) => write!(f, "{}", v.to_rfc3339()),
            Variant::Guid(v) => write!(f, "{}", v),
            Variant::ByteString(v) => write!(f, "<{} bytes>", v.len()),
            Variant::XmlElement(v) => write!(f, "{}", v),
            Variant::NodeId(v) => write!(f, "{}", v),
            Variant::ExpandedNodeId(v) => write!(f, "{}", v),
            Variant::StatusCode(v) => write!(f, "{}", v),
            Variant::QualifiedName(v) => write!(f, "{}", v),
            Variant::LocalizedText(v) => write!(f, "{}", v),
            Variant::ExtensionObject(_) => write!(f, "<extension object>"),
            Variant::Variant(v) => write!(f, "{}", v),
            Variant::DiagnosticInfo(_) => write!(f, "<diagnostic info>"),
            Variant::Array(v) => write!(f, "[{} items]", v.len()),
        }
    }
}

// =============================================================================
// Scalar conversions
// =============================================================================

macro_rules! impl_scalar_from {
    ($($native:ty => $variant:ident),+ $(,)?) => {
        $(
            impl From<$native> for Variant {
                fn from(value: $native) -> Self {
                    Variant::$variant(value)
                }
            }
        )+
    };
}

impl_scalar_from! {
    bool => Boolean,
    i8 => SByte,
    u8 => Byte,
    i16 => Int16,
    u16 => UInt16,
    i32 => Int32,
    u32 => UInt32,
    i64 => Int64,
    u64 => UInt64,
    f32 => Float,
    f64 => Double,
    String => String,
    DateTime<Utc> => DateTime,
    Uuid => Guid,
    XmlElement => XmlElement,
    NodeId => NodeId,
    ExpandedNodeId => ExpandedNodeId,
    StatusCode => StatusCode,
    QualifiedName => QualifiedName,
    LocalizedText => LocalizedText,
}

impl From<&str> for Variant {
    fn from(value: &str) -> Self {
        Variant::String(value.to_string())
    }
}

impl From<Vec<u8>> for Variant {
    fn from(value: Vec<u8>) -> Self {
        Variant::ByteString(value)
    }
}

impl From<ExtensionObject> for Variant {
    fn from(value: ExtensionObject) -> Self {
        Variant::ExtensionObject(Box::new(value))
    }
}

impl<T> From<Option<T>> for Variant
where
    T: Into<Variant>,
{
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => Variant::Null,
        }
    }
}

macro_rules! impl_array_from {
    ($($native:ty => $variant:ident / $ty:ident),+ $(,)?) => {
        $(
            impl From<Vec<$native>> for Variant {
                fn from(values: Vec<$native>) -> Self {
                    let elements = values.into_iter().map(Variant::$variant).collect();
                    // Uniform by construction; the constructor cannot fail.
                    let array = VariantArray::from_elements(VariantType::$ty, elements)
                        .expect("uniform scalar array");
                    Variant::Array(Box::new(array))
                }
            }
        )+
    };
}

impl_array_from! {
    bool => Boolean / Boolean,
    i8 => SByte / SByte,
    i16 => Int16 / Int16,
    u16 => UInt16 / UInt16,
    i32 => Int32 / Int32,
    u32 => UInt32 / UInt32,
    i64 => Int64 / Int64,
    u64 => UInt64 / UInt64,
    f32 => Float / Float,
    f64 => Double / Double,
    String => String / String,
}

// =============================================================================
// FromVariant
// =============================================================================

/// Typed, fallible extraction from a [`Variant`].
///
/// The tag must match exactly; no numeric widening happens here. This is
/// what the typed subscription cells use to project inbound data changes
/// onto their declared member type.
pub trait FromVariant: Sized {
    /// Extracts a value when the variant tag matches.
    fn from_variant(value: &Variant) -> Option<Self>;
}

macro_rules! impl_from_variant {
    ($($native:ty => $accessor:ident),+ $(,)?) => {
        $(
            impl FromVariant for $native {
                fn from_variant(value: &Variant) -> Option<Self> {
                    value.$accessor()
                }
            }
        )+
    };
}

impl_from_variant! {
    bool => as_bool,
    i8 => as_sbyte,
    u8 => as_byte,
    i16 => as_i16,
    u16 => as_u16,
    i32 => as_i32,
    u32 => as_u32,
    i64 => as_i64,
    u64 => as_u64,
    f32 => as_f32,
    f64 => as_f64,
    DateTime<Utc> => as_datetime,
    Uuid => as_guid,
    StatusCode => as_status_code,
}

impl FromVariant for String {
    fn from_variant(value: &Variant) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl FromVariant for Vec<u8> {
    fn from_variant(value: &Variant) -> Option<Self> {
        value.as_byte_string().map(<[u8]>::to_vec)
    }
}

impl FromVariant for LocalizedText {
    fn from_variant(value: &Variant) -> Option<Self> {
        value.as_localized_text().cloned()
    }
}

impl FromVariant for NodeId {
    fn from_variant(value: &Variant) -> Option<Self> {
        value.as_node_id().cloned()
    }
}

impl FromVariant for Variant {
    fn from_variant(value: &Variant) -> Option<Self> {
        Some(value.clone())
    }
}

// =============================================================================
// UaEnum
// =============================================================================

/// An enumeration carried on the wire as `Int32`.
pub trait UaEnum: Sized {
    /// Recovers the enumeration from its wire value.
    fn from_i32(value: i32) -> Option<Self>;

    /// Returns the wire value.
    fn to_i32(&self) -> i32;
}

// =============================================================================
// VariantArray
// =============================================================================

/// A rectangular array of one scalar kind.
///
/// Elements are stored flattened in row-major order; `dimensions` carries
/// the per-dimension lengths. A one-dimensional array has a single entry.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantArray {
    element_type: VariantType,
    elements: Vec<Variant>,
    dimensions: Vec<u32>,
}

impl VariantArray {
    /// Creates an array, validating shape and element uniformity.
    pub fn new(
        element_type: VariantType,
        elements: Vec<Variant>,
        dimensions: Vec<u32>,
    ) -> CodecResult<Self> {
        if element_type == VariantType::Null {
            return Err(CodecError::unsupported_type("array of Null"));
        }
        for element in &elements {
            // Null elements are allowed for nullable kinds; any other
            // mismatch is rejected outright.
            let found = element.variant_type();
            if found != element_type && found != VariantType::Null {
                return Err(CodecError::UnsupportedArrayElement {
                    expected: element_type,
                    found,
                });
            }
        }
        let expected: usize = dimensions.iter().map(|d| *d as usize).product();
        if dimensions.is_empty() || expected != elements.len() {
            return Err(CodecError::DimensionMismatch {
                expected,
                actual: elements.len(),
            });
        }
        Ok(Self {
            element_type,
            elements,
            dimensions,
        })
    }

    /// Creates a one-dimensional array.
    pub fn from_elements(element_type: VariantType, elements: Vec<Variant>) -> CodecResult<Self> {
        let len = elements.len() as u32;
        Self::new(element_type, elements, vec![len])
    }

    /// Returns the element type.
    #[inline]
    pub fn element_type(&self) -> VariantType {
        self.element_type
    }

    /// Returns the flattened elements.
    pub fn elements(&self) -> &[Variant] {
        &self.elements
    }

    /// Returns the per-dimension lengths.
    pub fn dimensions(&self) -> &[u32] {
        &self.dimensions
    }

    /// Returns the total element count.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns `true` if the array is empty.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Returns `true` for arrays with more than one dimension.
    pub fn is_multi_dimensional(&self) -> bool {
        self.dimensions.len() > 1
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
    fn test_tag_matches_shape() {
        assert_eq!(Variant::from(true).variant_type(), VariantType::Boolean);
        assert_eq!(Variant::from(42i32).variant_type(), VariantType::Int32);
        assert_eq!(Variant::from(2.5f64).variant_type(), VariantType::Double);
        assert_eq!(Variant::from("abc").variant_type(), VariantType::String);
        assert_eq!(Variant::Null.variant_type(), VariantType::Null);
    }

    #[test]
    fn test_strict_accessors() {
        let value = Variant::from(42i32);
        assert_eq!(value.as_i32(), Some(42));
        assert_eq!(value.as_i64(), None);
        assert_eq!(value.as_f64(), None);
        assert_eq!(value.as_str(), None);
    }

    #[test]
    fn test_numeric_widening() {
        assert_eq!(Variant::from(42u16).to_i64(), Some(42));
        assert_eq!(Variant::from(2.5f32).to_f64(), Some(2.5));
        assert_eq!(Variant::from("x").to_f64(), None);
    }

    #[test]
    fn test_coerce_numeric() {
        let value = Variant::Double(25.5);
        assert_eq!(
            value.coerce_numeric(VariantType::Float),
            Variant::Float(25.5)
        );
        assert_eq!(value.coerce_numeric(VariantType::Int32), Variant::Int32(25));
        // Non-numeric targets leave the value alone.
        assert_eq!(value.coerce_numeric(VariantType::String), value);
    }

    #[test]
    fn test_null_from_option() {
        let value: Variant = Option::<i32>::None.into();
        assert!(value.is_null());

        let value: Variant = Some(7i32).into();
        assert_eq!(value.as_i32(), Some(7));
    }

    #[test]
    fn test_array_construction() {
        let value: Variant = vec![1.0f64, 2.0, 3.0].into();
        let array = value.as_array().unwrap();
        assert_eq!(array.element_type(), VariantType::Double);
        assert_eq!(array.dimensions(), &[3]);
        assert_eq!(array.len(), 3);
        assert_eq!(value.variant_type(), VariantType::Double);
        assert!(value.is_array());
    }

    #[test]
    fn test_array_element_mismatch() {
        let result = VariantArray::from_elements(
            VariantType::Int32,
            vec![Variant::Int32(1), Variant::Double(2.0)],
        );
        assert!(matches!(
            result,
            Err(CodecError::UnsupportedArrayElement { .. })
        ));
    }

    #[test]
    fn test_array_dimension_mismatch() {
        let result = VariantArray::new(
            VariantType::Int32,
            vec![Variant::Int32(1), Variant::Int32(2), Variant::Int32(3)],
            vec![2, 2],
        );
        assert!(matches!(result, Err(CodecError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_matrix_dimensions() {
        let elements = (0..6).map(Variant::Int32).collect();
        let array = VariantArray::new(VariantType::Int32, elements, vec![2, 3]).unwrap();
        assert!(array.is_multi_dimensional());
        assert_eq!(array.dimensions(), &[2, 3]);
    }

    #[test]
    fn test_enum_normalization() {
        #[derive(Debug, PartialEq)]
        enum Mode {
            Off,
            On,
        }

        impl UaEnum for Mode {
            fn from_i32(value: i32) -> Option<Self> {
                match value {
                    0 => Some(Mode::Off),
                    1 => Some(Mode::On),
                    _ => None,
                }
            }

            fn to_i32(&self) -> i32 {
                match self {
                    Mode::Off => 0,
                    Mode::On => 1,
                }
            }
        }

        let value = Variant::from_enum(Mode::On);
        assert_eq!(value.variant_type(), VariantType::Int32);
        assert_eq!(value.as_enum::<Mode>(), Some(Mode::On));
        assert_eq!(Variant::Int32(9).as_enum::<Mode>(), None);
    }

    #[test]
    fn test_datetime_variant() {
        let dt = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let value = Variant::from(dt);
        assert_eq!(value.as_datetime(), Some(dt));
    }
}
