// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The encoder contract and the binary implementation.

use bytes::{BufMut, Bytes, BytesMut};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::codec::{Encodable, MAX_NESTING_DEPTH};
use crate::data_value::DataValue;
use crate::error::{CodecError, CodecResult};
use crate::extension_object::{ExtensionBody, ExtensionObject};
use crate::node_id::{ExpandedNodeId, NodeId, NodeIdentifier};
use crate::status::StatusCode;
use crate::types::{datetime_to_ticks, DiagnosticInfo, LocalizedText, QualifiedName, XmlElement};
use crate::variant::{Variant, VariantArray, VariantType};

// =============================================================================
// Encoder
// =============================================================================

/// Writes the members of structured values.
///
/// The `name` parameter identifies the member being written; the binary
/// encoding ignores it, but the contract keeps member names available to
/// alternative encodings and diagnostics. Namespace scopes pushed around
/// nested types disambiguate identical member names across namespaces.
pub trait Encoder {
    /// Pushes a namespace scope for the members that follow.
    fn push_namespace(&mut self, uri: &str);

    /// Pops the innermost namespace scope.
    fn pop_namespace(&mut self);

    /// Writes a boolean member.
    fn write_bool(&mut self, name: &str, value: bool) -> CodecResult<()>;

    /// Writes a signed 8-bit member.
    fn write_sbyte(&mut self, name: &str, value: i8) -> CodecResult<()>;

    /// Writes an unsigned 8-bit member.
    fn write_byte(&mut self, name: &str, value: u8) -> CodecResult<()>;

    /// Writes a signed 16-bit member.
    fn write_i16(&mut self, name: &str, value: i16) -> CodecResult<()>;

    /// Writes an unsigned 16-bit member.
    fn write_u16(&mut self, name: &str, value: u16) -> CodecResult<()>;

    /// Writes a signed 32-bit member.
    fn write_i32(&mut self, name: &str, value: i32) -> CodecResult<()>;

    /// Writes an unsigned 32-bit member.
    fn write_u32(&mut self, name: &str, value: u32) -> CodecResult<()>;

    /// Writes a signed 64-bit member.
    fn write_i64(&mut self, name: &str, value: i64) -> CodecResult<()>;

    /// Writes an unsigned 64-bit member.
    fn write_u64(&mut self, name: &str, value: u64) -> CodecResult<()>;

    /// Writes a 32-bit float member.
    fn write_f32(&mut self, name: &str, value: f32) -> CodecResult<()>;

    /// Writes a 64-bit float member.
    fn write_f64(&mut self, name: &str, value: f64) -> CodecResult<()>;

    /// Writes a string member; `None` writes the null sentinel.
    fn write_string(&mut self, name: &str, value: Option<&str>) -> CodecResult<()>;

    /// Writes a timestamp member.
    fn write_datetime(&mut self, name: &str, value: DateTime<Utc>) -> CodecResult<()>;

    /// Writes a GUID member.
    fn write_guid(&mut self, name: &str, value: Uuid) -> CodecResult<()>;

    /// Writes a byte-string member; `None` writes the null sentinel.
    fn write_byte_string(&mut self, name: &str, value: Option<&[u8]>) -> CodecResult<()>;

    /// Writes an XML member.
    fn write_xml_element(&mut self, name: &str, value: Option<&XmlElement>) -> CodecResult<()>;

    /// Writes a node id member.
    fn write_node_id(&mut self, name: &str, value: &NodeId) -> CodecResult<()>;

    /// Writes an expanded node id member.
    fn write_expanded_node_id(&mut self, name: &str, value: &ExpandedNodeId) -> CodecResult<()>;

    /// Writes a status code member.
    fn write_status_code(&mut self, name: &str, value: StatusCode) -> CodecResult<()>;

    /// Writes a qualified name member.
    fn write_qualified_name(&mut self, name: &str, value: &QualifiedName) -> CodecResult<()>;

    /// Writes a localized text member.
    fn write_localized_text(&mut self, name: &str, value: &LocalizedText) -> CodecResult<()>;

    /// Writes a variant member.
    fn write_variant(&mut self, name: &str, value: &Variant) -> CodecResult<()>;

    /// Writes a data value member.
    fn write_data_value(&mut self, name: &str, value: &DataValue) -> CodecResult<()>;

    /// Writes an extension object member.
    fn write_extension_object(&mut self, name: &str, value: &ExtensionObject) -> CodecResult<()>;

    /// Writes a diagnostic info member.
    fn write_diagnostic_info(&mut self, name: &str, value: &DiagnosticInfo) -> CodecResult<()>;

    /// Writes a nested structure member.
    fn write_encodable(&mut self, name: &str, value: &dyn Encodable) -> CodecResult<()>;

    /// Writes an i32 array member.
    fn write_i32_array(&mut self, name: &str, value: Option<&[i32]>) -> CodecResult<()>;

    /// Writes a u32 array member.
    fn write_u32_array(&mut self, name: &str, value: Option<&[u32]>) -> CodecResult<()>;

    /// Writes an f64 array member.
    fn write_f64_array(&mut self, name: &str, value: Option<&[f64]>) -> CodecResult<()>;

    /// Writes a string array member.
    fn write_string_array(&mut self, name: &str, value: Option<&[String]>) -> CodecResult<()>;

    /// Writes a status code array member.
    fn write_status_code_array(&mut self, name: &str, value: Option<&[StatusCode]>)
        -> CodecResult<()>;

    /// Writes a variant array member.
    fn write_variant_array(&mut self, name: &str, value: Option<&[Variant]>) -> CodecResult<()>;

    /// Writes a qualified name array member.
    fn write_qualified_name_array(
        &mut self,
        name: &str,
        value: Option<&[QualifiedName]>,
    ) -> CodecResult<()>;
}

// =============================================================================
// BinaryEncoder
// =============================================================================

/// OPC UA Binary DataEncoding writer.
///
/// Little-endian throughout; strings and byte strings are length-prefixed
/// with `-1` as the null sentinel. An encoding context (the server's
/// namespace table) is needed to reduce expanded node ids on type ids to
/// wire node ids.
#[derive(Debug)]
pub struct BinaryEncoder {
    buf: BytesMut,
    namespace_uris: Vec<String>,
    scopes: Vec<String>,
    depth: u32,
}

impl BinaryEncoder {
    /// Creates an encoder with the default namespace table.
    pub fn new() -> Self {
        Self::with_context(vec!["http://opcfoundation.org/UA/".to_string()])
    }

    /// Creates an encoder with the given server namespace table.
    pub fn with_context(namespace_uris: Vec<String>) -> Self {
        Self {
            buf: BytesMut::with_capacity(256),
            namespace_uris,
            scopes: Vec::new(),
            depth: 0,
        }
    }

    /// Returns the number of bytes written.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Finishes encoding and returns the buffer.
    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }

    fn enter(&mut self) -> CodecResult<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(CodecError::DepthExceeded {
                limit: MAX_NESTING_DEPTH,
            });
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn put_length_prefixed(&mut self, value: Option<&[u8]>) -> CodecResult<()> {
        match value {
            None => self.buf.put_i32_le(-1),
            Some(bytes) => {
                let len = i32::try_from(bytes.len())
                    .map_err(|_| CodecError::encoding("byte string exceeds i32 length"))?;
                self.buf.put_i32_le(len);
                self.buf.put_slice(bytes);
            }
        }
        Ok(())
    }

    fn put_node_id(&mut self, value: &NodeId) -> CodecResult<()> {
        self.put_node_id_with_mask(value, 0)
    }

    /// Writes a node id with extra bits or-ed into the encoding byte
    /// (used by the expanded node id form).
    fn put_node_id_with_mask(&mut self, value: &NodeId, mask: u8) -> CodecResult<()> {
        match &value.identifier {
            NodeIdentifier::Numeric(id) => {
                if *id <= 0xFF && value.namespace_index == 0 {
                    self.buf.put_u8(0x00 | mask);
                    self.buf.put_u8(*id as u8);
                } else if *id <= 0xFFFF && value.namespace_index <= 0xFF {
                    self.buf.put_u8(0x01 | mask);
                    self.buf.put_u8(value.namespace_index as u8);
                    self.buf.put_u16_le(*id as u16);
                } else {
                    self.buf.put_u8(0x02 | mask);
                    self.buf.put_u16_le(value.namespace_index);
                    self.buf.put_u32_le(*id);
                }
            }
            NodeIdentifier::String(id) => {
                self.buf.put_u8(0x03 | mask);
                self.buf.put_u16_le(value.namespace_index);
                self.put_length_prefixed(Some(id.as_bytes()))?;
            }
            NodeIdentifier::Guid(id) => {
                self.buf.put_u8(0x04 | mask);
                self.buf.put_u16_le(value.namespace_index);
                self.put_guid(*id);
            }
            NodeIdentifier::Opaque(id) => {
                self.buf.put_u8(0x05 | mask);
                self.buf.put_u16_le(value.namespace_index);
                self.put_length_prefixed(Some(id))?;
            }
        }
        Ok(())
    }

    fn put_guid(&mut self, value: Uuid) {
        let (d1, d2, d3, d4) = value.as_fields();
        self.buf.put_u32_le(d1);
        self.buf.put_u16_le(d2);
        self.buf.put_u16_le(d3);
        self.buf.put_slice(d4);
    }

    /// Reduces an expanded type id to a wire node id through the context.
    fn resolve_type_id(&self, type_id: &ExpandedNodeId) -> CodecResult<NodeId> {
        type_id
            .to_node_id(&self.namespace_uris)
            .map_err(|_| match &type_id.namespace_uri {
                Some(uri) => CodecError::encoding(format!(
                    "type id namespace '{uri}' is not in the encoding context"
                )),
                None => CodecError::encoding("unresolvable type id"),
            })
    }

    /// Writes one array element without its own variant tag.
    fn put_variant_scalar(&mut self, element: &Variant, ty: VariantType) -> CodecResult<()> {
        match (element, ty) {
            (Variant::Boolean(v), VariantType::Boolean) => self.buf.put_u8(u8::from(*v)),
            (Variant::SByte(v), VariantType::SByte) => self.buf.put_i8(*v),
            (Variant::Byte(v), VariantType::Byte) => self.buf.put_u8(*v),
            (Variant::Int16(v), VariantType::Int16) => self.buf.put_i16_le(*v),
            (Variant::UInt16(v), VariantType::UInt16) => self.buf.put_u16_le(*v),
            (Variant::Int32(v), VariantType::Int32) => self.buf.put_i32_le(*v),
            (Variant::UInt32(v), VariantType::UInt32) => self.buf.put_u32_le(*v),
            (Variant::Int64(v), VariantType::Int64) => self.buf.put_i64_le(*v),
            (Variant::UInt64(v), VariantType::UInt64) => self.buf.put_u64_le(*v),
            (Variant::Float(v), VariantType::Float) => self.buf.put_f32_le(*v),
            (Variant::Double(v), VariantType::Double) => self.buf.put_f64_le(*v),
            (Variant::String(v), VariantType::String) => {
                self.put_length_prefixed(Some(v.as_bytes()))?
            }
            (Variant::Null, VariantType::String) => self.put_length_prefixed(None)?,
            (Variant::DateTime(v), VariantType::DateTime) => {
                self.buf.put_i64_le(datetime_to_ticks(*v))
            }
            (Variant::Guid(v), VariantType::Guid) => self.put_guid(*v),
            (Variant::ByteString(v), VariantType::ByteString) => {
                self.put_length_prefixed(Some(v))?
            }
            (Variant::Null, VariantType::ByteString) => self.put_length_prefixed(None)?,
            (Variant::XmlElement(v), VariantType::XmlElement) => {
                self.put_length_prefixed(Some(v.as_str().as_bytes()))?
            }
            (Variant::Null, VariantType::XmlElement) => self.put_length_prefixed(None)?,
            (Variant::NodeId(v), VariantType::NodeId) => self.put_node_id(v)?,
            (Variant::ExpandedNodeId(v), VariantType::ExpandedNodeId) => {
                self.write_expanded_node_id("", v)?
            }
            (Variant::StatusCode(v), VariantType::StatusCode) => self.buf.put_u32_le(v.0),
            (Variant::QualifiedName(v), VariantType::QualifiedName) => {
                self.write_qualified_name("", v)?
            }
            (Variant::LocalizedText(v), VariantType::LocalizedText) => {
                self.write_localized_text("", v)?
            }
            (Variant::ExtensionObject(v), VariantType::ExtensionObject) => {
                self.write_extension_object("", v)?
            }
            (Variant::Null, VariantType::ExtensionObject) => {
                self.write_extension_object("", &ExtensionObject::null())?
            }
            (Variant::Variant(v), VariantType::Variant) => self.write_variant("", v)?,
            (Variant::DiagnosticInfo(v), VariantType::DiagnosticInfo) => {
                self.write_diagnostic_info("", v)?
            }
            (element, ty) => {
                return Err(CodecError::encoding(format!(
                    "cannot encode {:?} element as {ty:?}",
                    element.variant_type()
                )));
            }
        }
        Ok(())
    }

    fn put_variant_array(&mut self, array: &VariantArray) -> CodecResult<()> {
        let mut encoding = array.element_type().tag() | 0x80;
        if array.is_multi_dimensional() {
            encoding |= 0x40;
        }
        self.buf.put_u8(encoding);

        let len = i32::try_from(array.len())
            .map_err(|_| CodecError::encoding("array exceeds i32 length"))?;
        self.buf.put_i32_le(len);
        for element in array.elements() {
            self.put_variant_scalar(element, array.element_type())?;
        }

        if array.is_multi_dimensional() {
            self.buf.put_i32_le(array.dimensions().len() as i32);
            for dim in array.dimensions() {
                self.buf.put_i32_le(*dim as i32);
            }
        }
        Ok(())
    }
}

impl Default for BinaryEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder for BinaryEncoder {
    fn push_namespace(&mut self, uri: &str) {
        self.scopes.push(uri.to_string());
    }

    fn pop_namespace(&mut self) {
        self.scopes.pop();
    }

    fn write_bool(&mut self, _name: &str, value: bool) -> CodecResult<()> {
        self.buf.put_u8(u8::from(value));
        Ok(())
    }

    fn write_sbyte(&mut self, _name: &str, value: i8) -> CodecResult<()> {
        self.buf.put_i8(value);
        Ok(())
    }

    fn write_byte(&mut self, _name: &str, value: u8) -> CodecResult<()> {
        self.buf.put_u8(value);
        Ok(())
    }

    fn write_i16(&mut self, _name: &str, value: i16) -> CodecResult<()> {
        self.buf.put_i16_le(value);
        Ok(())
    }

    fn write_u16(&mut self, _name: &str, value: u16) -> CodecResult<()> {
        self.buf.put_u16_le(value);
        Ok(())
    }

    fn write_i32(&mut self, _name: &str, value: i32) -> CodecResult<()> {
        self.buf.put_i32_le(value);
        Ok(())
    }

    fn write_u32(&mut self, _name: &str, value: u32) -> CodecResult<()> {
        self.buf.put_u32_le(value);
        Ok(())
    }

    fn write_i64(&mut self, _name: &str, value: i64) -> CodecResult<()> {
        self.buf.put_i64_le(value);
        Ok(())
    }

    fn write_u64(&mut self, _name: &str, value: u64) -> CodecResult<()> {
        self.buf.put_u64_le(value);
        Ok(())
    }

    fn write_f32(&mut self, _name: &str, value: f32) -> CodecResult<()> {
        self.buf.put_f32_le(value);
        Ok(())
    }

    fn write_f64(&mut self, _name: &str, value: f64) -> CodecResult<()> {
        self.buf.put_f64_le(value);
        Ok(())
    }

    fn write_string(&mut self, _name: &str, value: Option<&str>) -> CodecResult<()> {
        self.put_length_prefixed(value.map(str::as_bytes))
    }

    fn write_datetime(&mut self, _name: &str, value: DateTime<Utc>) -> CodecResult<()> {
        self.buf.put_i64_le(datetime_to_ticks(value));
        Ok(())
    }

    fn write_guid(&mut self, _name: &str, value: Uuid) -> CodecResult<()> {
        self.put_guid(value);
        Ok(())
    }

    fn write_byte_string(&mut self, _name: &str, value: Option<&[u8]>) -> CodecResult<()> {
        self.put_length_prefixed(value)
    }

    fn write_xml_element(&mut self, _name: &str, value: Option<&XmlElement>) -> CodecResult<()> {
        self.put_length_prefixed(value.map(|v| v.as_str().as_bytes()))
    }

    fn write_node_id(&mut self, _name: &str, value: &NodeId) -> CodecResult<()> {
        self.put_node_id(value)
    }

    fn write_expanded_node_id(&mut self, _name: &str, value: &ExpandedNodeId) -> CodecResult<()> {
        let mut mask = 0u8;
        if value.namespace_uri.is_some() {
            mask |= 0x80;
        }
        if value.server_index != 0 {
            mask |= 0x40;
        }
        self.put_node_id_with_mask(&value.node_id, mask)?;
        if let Some(uri) = &value.namespace_uri {
            self.put_length_prefixed(Some(uri.as_bytes()))?;
        }
        if value.server_index != 0 {
            self.buf.put_u32_le(value.server_index);
        }
        Ok(())
    }

    fn write_status_code(&mut self, _name: &str, value: StatusCode) -> CodecResult<()> {
        self.buf.put_u32_le(value.0);
        Ok(())
    }

    fn write_qualified_name(&mut self, _name: &str, value: &QualifiedName) -> CodecResult<()> {
        self.buf.put_u16_le(value.namespace_index);
        self.put_length_prefixed(Some(value.name.as_bytes()))
    }

    fn write_localized_text(&mut self, _name: &str, value: &LocalizedText) -> CodecResult<()> {
        let mut mask = 0u8;
        if value.locale.is_some() {
            mask |= 0x01;
        }
        if value.text.is_some() {
            mask |= 0x02;
        }
        self.buf.put_u8(mask);
        if let Some(locale) = &value.locale {
            self.put_length_prefixed(Some(locale.as_bytes()))?;
        }
        if let Some(text) = &value.text {
            self.put_length_prefixed(Some(text.as_bytes()))?;
        }
        Ok(())
    }

    fn write_variant(&mut self, _name: &str, value: &Variant) -> CodecResult<()> {
        self.enter()?;
        let result = (|| {
            match value {
                Variant::Null => {
                    self.buf.put_u8(0);
                    Ok(())
                }
                Variant::Array(array) => self.put_variant_array(array),
                Variant::Variant(_) => Err(CodecError::encoding(
                    "a nested variant is only valid as an array element",
                )),
                scalar => {
                    self.buf.put_u8(scalar.variant_type().tag());
                    self.put_variant_scalar(scalar, scalar.variant_type())
                }
            }
        })();
        self.leave();
        result
    }

    fn write_data_value(&mut self, _name: &str, value: &DataValue) -> CodecResult<()> {
        let mut mask = 0u8;
        if !value.value().is_null() {
            mask |= 0x01;
        }
        if value.status_code() != StatusCode::GOOD {
            mask |= 0x02;
        }
        if value.source_timestamp().is_some() {
            mask |= 0x04;
        }
        if value.server_timestamp().is_some() {
            mask |= 0x08;
        }
        if value.source_picoseconds() != 0 {
            mask |= 0x10;
        }
        if value.server_picoseconds() != 0 {
            mask |= 0x20;
        }
        self.buf.put_u8(mask);

        if mask & 0x01 != 0 {
            self.write_variant("Value", value.value())?;
        }
        if mask & 0x02 != 0 {
            self.buf.put_u32_le(value.status_code().0);
        }
        if let Some(ts) = value.source_timestamp() {
            self.buf.put_i64_le(datetime_to_ticks(ts));
        }
        if mask & 0x10 != 0 {
            self.buf.put_u16_le(value.source_picoseconds());
        }
        if let Some(ts) = value.server_timestamp() {
            self.buf.put_i64_le(datetime_to_ticks(ts));
        }
        if mask & 0x20 != 0 {
            self.buf.put_u16_le(value.server_picoseconds());
        }
        Ok(())
    }

    fn write_extension_object(&mut self, _name: &str, value: &ExtensionObject) -> CodecResult<()> {
        self.enter()?;
        let result = (|| {
            match value.body() {
                ExtensionBody::None => {
                    self.put_node_id(&NodeId::NULL)?;
                    self.buf.put_u8(0x00);
                    Ok(())
                }
                ExtensionBody::ByteString(bytes) => {
                    let type_id = value
                        .type_id()
                        .map(|id| self.resolve_type_id(id))
                        .transpose()?
                        .unwrap_or(NodeId::NULL);
                    self.put_node_id(&type_id)?;
                    self.buf.put_u8(0x01);
                    self.put_length_prefixed(Some(bytes))
                }
                ExtensionBody::XmlElement(xml) => {
                    let type_id = value
                        .type_id()
                        .map(|id| self.resolve_type_id(id))
                        .transpose()?
                        .unwrap_or(NodeId::NULL);
                    self.put_node_id(&type_id)?;
                    self.buf.put_u8(0x02);
                    self.put_length_prefixed(Some(xml.as_str().as_bytes()))
                }
                ExtensionBody::Structure(body) => {
                    let type_id = value.type_id().ok_or_else(|| {
                        CodecError::unregistered_type(body.type_name())
                    })?;
                    let type_id = self.resolve_type_id(type_id)?;
                    self.put_node_id(&type_id)?;
                    self.buf.put_u8(0x01);

                    let mut inner = BinaryEncoder::with_context(self.namespace_uris.clone());
                    body.encode(&mut inner)?;
                    self.put_length_prefixed(Some(&inner.finish()))
                }
            }
        })();
        self.leave();
        result
    }

    fn write_diagnostic_info(&mut self, _name: &str, value: &DiagnosticInfo) -> CodecResult<()> {
        self.enter()?;
        let result = (|| {
            let mut mask = 0u8;
            if value.symbolic_id.is_some() {
                mask |= 0x01;
            }
            if value.namespace_uri.is_some() {
                mask |= 0x02;
            }
            if value.localized_text.is_some() {
                mask |= 0x04;
            }
            if value.locale.is_some() {
                mask |= 0x08;
            }
            if value.additional_info.is_some() {
                mask |= 0x10;
            }
            if value.inner_status_code.is_some() {
                mask |= 0x20;
            }
            if value.inner_diagnostic_info.is_some() {
                mask |= 0x40;
            }
            self.buf.put_u8(mask);

            if let Some(v) = value.symbolic_id {
                self.buf.put_i32_le(v);
            }
            if let Some(v) = value.namespace_uri {
                self.buf.put_i32_le(v);
            }
            if let Some(v) = value.locale {
                self.buf.put_i32_le(v);
            }
            if let Some(v) = value.localized_text {
                self.buf.put_i32_le(v);
            }
            if let Some(v) = &value.additional_info {
                self.put_length_prefixed(Some(v.as_bytes()))?;
            }
            if let Some(v) = value.inner_status_code {
                self.buf.put_u32_le(v.0);
            }
            if let Some(v) = &value.inner_diagnostic_info {
                self.write_diagnostic_info("InnerDiagnosticInfo", v)?;
            }
            Ok(())
        })();
        self.leave();
        result
    }

    fn write_encodable(&mut self, _name: &str, value: &dyn Encodable) -> CodecResult<()> {
        value.encode(self)
    }

    fn write_i32_array(&mut self, _name: &str, value: Option<&[i32]>) -> CodecResult<()> {
        match value {
            None => self.buf.put_i32_le(-1),
            Some(values) => {
                self.buf.put_i32_le(values.len() as i32);
                for v in values {
                    self.buf.put_i32_le(*v);
                }
            }
        }
        Ok(())
    }

    fn write_u32_array(&mut self, _name: &str, value: Option<&[u32]>) -> CodecResult<()> {
        match value {
            None => self.buf.put_i32_le(-1),
            Some(values) => {
                self.buf.put_i32_le(values.len() as i32);
                for v in values {
                    self.buf.put_u32_le(*v);
                }
            }
        }
        Ok(())
    }

    fn write_f64_array(&mut self, _name: &str, value: Option<&[f64]>) -> CodecResult<()> {
        match value {
            None => self.buf.put_i32_le(-1),
            Some(values) => {
                self.buf.put_i32_le(values.len() as i32);
                for v in values {
                    self.buf.put_f64_le(*v);
                }
            }
        }
        Ok(())
    }

    fn write_string_array(&mut self, name: &str, value: Option<&[String]>) -> CodecResult<()> {
        match value {
            None => {
                self.buf.put_i32_le(-1);
                Ok(())
            }
            Some(values) => {
                self.buf.put_i32_le(values.len() as i32);
                for v in values {
                    self.write_string(name, Some(v))?;
                }
                Ok(())
            }
        }
    }

    fn write_status_code_array(
        &mut self,
        _name: &str,
        value: Option<&[StatusCode]>,
    ) -> CodecResult<()> {
        match value {
            None => self.buf.put_i32_le(-1),
            Some(values) => {
                self.buf.put_i32_le(values.len() as i32);
                for v in values {
                    self.buf.put_u32_le(v.0);
                }
            }
        }
        Ok(())
    }

    fn write_variant_array(&mut self, name: &str, value: Option<&[Variant]>) -> CodecResult<()> {
        match value {
            None => {
                self.buf.put_i32_le(-1);
                Ok(())
            }
            Some(values) => {
                self.buf.put_i32_le(values.len() as i32);
                for v in values {
                    self.write_variant(name, v)?;
                }
                Ok(())
            }
        }
    }

    fn write_qualified_name_array(
        &mut self,
        name: &str,
        value: Option<&[QualifiedName]>,
    ) -> CodecResult<()> {
        match value {
            None => {
                self.buf.put_i32_le(-1);
                Ok(())
            }
            Some(values) => {
                self.buf.put_i32_le(values.len() as i32);
                for v in values {
                    self.write_qualified_name(name, v)?;
                }
                Ok(())
            }
        }
    }
}
