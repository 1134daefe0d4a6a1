// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The decoder contract and the binary implementation.

use bytes::{Buf, Bytes};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::codec::MAX_NESTING_DEPTH;
use crate::data_value::DataValue;
use crate::error::{CodecError, CodecResult};
use crate::extension_object::ExtensionObject;
use crate::node_id::{ExpandedNodeId, NodeId, NodeIdentifier};
use crate::registry::TypeLibrary;
use crate::status::StatusCode;
use crate::types::{ticks_to_datetime, DiagnosticInfo, LocalizedText, QualifiedName, XmlElement};
use crate::variant::{Variant, VariantArray, VariantType};

// =============================================================================
// Decoder
// =============================================================================

/// Reads the members of structured values.
///
/// Mirrors [`Encoder`](crate::codec::Encoder); members must be read in the
/// order they were written.
pub trait Decoder {
    /// Pushes a namespace scope for the members that follow.
    fn push_namespace(&mut self, uri: &str);

    /// Pops the innermost namespace scope.
    fn pop_namespace(&mut self);

    /// Reads a boolean member.
    fn read_bool(&mut self, name: &str) -> CodecResult<bool>;

    /// Reads a signed 8-bit member.
    fn read_sbyte(&mut self, name: &str) -> CodecResult<i8>;

    /// Reads an unsigned 8-bit member.
    fn read_byte(&mut self, name: &str) -> CodecResult<u8>;

    /// Reads a signed 16-bit member.
    fn read_i16(&mut self, name: &str) -> CodecResult<i16>;

    /// Reads an unsigned 16-bit member.
    fn read_u16(&mut self, name: &str) -> CodecResult<u16>;

    /// Reads a signed 32-bit member.
    fn read_i32(&mut self, name: &str) -> CodecResult<i32>;

    /// Reads an unsigned 32-bit member.
    fn read_u32(&mut self, name: &str) -> CodecResult<u32>;

    /// Reads a signed 64-bit member.
    fn read_i64(&mut self, name: &str) -> CodecResult<i64>;

    /// Reads an unsigned 64-bit member.
    fn read_u64(&mut self, name: &str) -> CodecResult<u64>;

    /// Reads a 32-bit float member.
    fn read_f32(&mut self, name: &str) -> CodecResult<f32>;

    /// Reads a 64-bit float member.
    fn read_f64(&mut self, name: &str) -> CodecResult<f64>;

    /// Reads a string member; the null sentinel yields `None`.
    fn read_string(&mut self, name: &str) -> CodecResult<Option<String>>;

    /// Reads a timestamp member.
    fn read_datetime(&mut self, name: &str) -> CodecResult<DateTime<Utc>>;

    /// Reads a GUID member.
    fn read_guid(&mut self, name: &str) -> CodecResult<Uuid>;

    /// Reads a byte-string member; the null sentinel yields `None`.
    fn read_byte_string(&mut self, name: &str) -> CodecResult<Option<Vec<u8>>>;

    /// Reads an XML member.
    fn read_xml_element(&mut self, name: &str) -> CodecResult<Option<XmlElement>>;

    /// Reads a node id member.
    fn read_node_id(&mut self, name: &str) -> CodecResult<NodeId>;

    /// Reads an expanded node id member.
    fn read_expanded_node_id(&mut self, name: &str) -> CodecResult<ExpandedNodeId>;

    /// Reads a status code member.
    fn read_status_code(&mut self, name: &str) -> CodecResult<StatusCode>;

    /// Reads a qualified name member.
    fn read_qualified_name(&mut self, name: &str) -> CodecResult<QualifiedName>;

    /// Reads a localized text member.
    fn read_localized_text(&mut self, name: &str) -> CodecResult<LocalizedText>;

    /// Reads a variant member.
    fn read_variant(&mut self, name: &str) -> CodecResult<Variant>;

    /// Reads a data value member.
    fn read_data_value(&mut self, name: &str) -> CodecResult<DataValue>;

    /// Reads an extension object member.
    fn read_extension_object(&mut self, name: &str) -> CodecResult<ExtensionObject>;

    /// Reads a diagnostic info member.
    fn read_diagnostic_info(&mut self, name: &str) -> CodecResult<DiagnosticInfo>;

    /// Reads an i32 array member.
    fn read_i32_array(&mut self, name: &str) -> CodecResult<Option<Vec<i32>>>;

    /// Reads a u32 array member.
    fn read_u32_array(&mut self, name: &str) -> CodecResult<Option<Vec<u32>>>;

    /// Reads an f64 array member.
    fn read_f64_array(&mut self, name: &str) -> CodecResult<Option<Vec<f64>>>;

    /// Reads a string array member.
    fn read_string_array(&mut self, name: &str) -> CodecResult<Option<Vec<String>>>;

    /// Reads a status code array member.
    fn read_status_code_array(&mut self, name: &str) -> CodecResult<Option<Vec<StatusCode>>>;

    /// Reads a variant array member.
    fn read_variant_array(&mut self, name: &str) -> CodecResult<Option<Vec<Variant>>>;

    /// Reads a qualified name array member.
    fn read_qualified_name_array(&mut self, name: &str)
        -> CodecResult<Option<Vec<QualifiedName>>>;
}

// =============================================================================
// BinaryDecoder
// =============================================================================

/// OPC UA Binary DataEncoding reader.
///
/// Truncated input surfaces as [`CodecError::EndOfStream`] rather than a
/// panic; unknown extension-object type ids keep their raw body so the
/// value survives re-encoding.
#[derive(Debug)]
pub struct BinaryDecoder {
    buf: Bytes,
    namespace_uris: Vec<String>,
    scopes: Vec<String>,
    depth: u32,
}

impl BinaryDecoder {
    /// Creates a decoder over a buffer with the default namespace table.
    pub fn new(buf: Bytes) -> Self {
        Self::with_context(buf, vec!["http://opcfoundation.org/UA/".to_string()])
    }

    /// Creates a decoder with the given server namespace table.
    pub fn with_context(buf: Bytes, namespace_uris: Vec<String>) -> Self {
        Self {
            buf,
            namespace_uris,
            scopes: Vec::new(),
            depth: 0,
        }
    }

    /// Returns the number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    /// Returns `true` when the input is fully consumed.
    pub fn is_exhausted(&self) -> bool {
        !self.buf.has_remaining()
    }

    fn ensure(&self, needed: usize) -> CodecResult<()> {
        let remaining = self.buf.remaining();
        if remaining < needed {
            return Err(CodecError::EndOfStream { needed, remaining });
        }
        Ok(())
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

    fn take_length_prefixed(&mut self) -> CodecResult<Option<Vec<u8>>> {
        self.ensure(4)?;
        let len = self.buf.get_i32_le();
        if len < 0 {
            return Ok(None);
        }
        let len = len as usize;
        self.ensure(len)?;
        let mut bytes = vec![0u8; len];
        self.buf.copy_to_slice(&mut bytes);
        Ok(Some(bytes))
    }

    fn take_string(&mut self) -> CodecResult<Option<String>> {
        match self.take_length_prefixed()? {
            None => Ok(None),
            Some(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|_| CodecError::decoding("string is not valid UTF-8")),
        }
    }

    fn take_guid(&mut self) -> CodecResult<Uuid> {
        self.ensure(16)?;
        let d1 = self.buf.get_u32_le();
        let d2 = self.buf.get_u16_le();
        let d3 = self.buf.get_u16_le();
        let mut d4 = [0u8; 8];
        self.buf.copy_to_slice(&mut d4);
        Ok(Uuid::from_fields(d1, d2, d3, &d4))
    }

    /// Reads a node id, returning the encoding byte's upper bits alongside
    /// (the expanded form stores its flags there).
    fn take_node_id_with_mask(&mut self) -> CodecResult<(NodeId, u8)> {
        self.ensure(1)?;
        let encoding = self.buf.get_u8();
        let mask = encoding & 0xC0;
        let node_id = match encoding & 0x3F {
            0x00 => {
                self.ensure(1)?;
                NodeId::numeric(0, u32::from(self.buf.get_u8()))
            }
            0x01 => {
                self.ensure(3)?;
                let ns = u16::from(self.buf.get_u8());
                let id = u32::from(self.buf.get_u16_le());
                NodeId::numeric(ns, id)
            }
            0x02 => {
                self.ensure(6)?;
                let ns = self.buf.get_u16_le();
                let id = self.buf.get_u32_le();
                NodeId::numeric(ns, id)
            }
            0x03 => {
                self.ensure(2)?;
                let ns = self.buf.get_u16_le();
                let id = self
                    .take_string()?
                    .ok_or_else(|| CodecError::decoding("string node id has a null identifier"))?;
                NodeId::string(ns, id)
            }
            0x04 => {
                self.ensure(2)?;
                let ns = self.buf.get_u16_le();
                NodeId::guid(ns, self.take_guid()?)
            }
            0x05 => {
                self.ensure(2)?;
                let ns = self.buf.get_u16_le();
                let id = self.take_length_prefixed()?.ok_or_else(|| {
                    CodecError::decoding("opaque node id has a null identifier")
                })?;
                NodeId::opaque(ns, id)
            }
            other => {
                return Err(CodecError::decoding(format!(
                    "unknown node id encoding 0x{other:02X}"
                )));
            }
        };
        Ok((node_id, mask))
    }

    fn take_variant_scalar(&mut self, ty: VariantType) -> CodecResult<Variant> {
        let value = match ty {
            VariantType::Null => Variant::Null,
            VariantType::Boolean => {
                self.ensure(1)?;
                Variant::Boolean(self.buf.get_u8() != 0)
            }
            VariantType::SByte => {
                self.ensure(1)?;
                Variant::SByte(self.buf.get_i8())
            }
            VariantType::Byte => {
                self.ensure(1)?;
                Variant::Byte(self.buf.get_u8())
            }
            VariantType::Int16 => {
                self.ensure(2)?;
                Variant::Int16(self.buf.get_i16_le())
            }
            VariantType::UInt16 => {
                self.ensure(2)?;
                Variant::UInt16(self.buf.get_u16_le())
            }
            VariantType::Int32 => {
                self.ensure(4)?;
                Variant::Int32(self.buf.get_i32_le())
            }
            VariantType::UInt32 => {
                self.ensure(4)?;
                Variant::UInt32(self.buf.get_u32_le())
            }
            VariantType::Int64 => {
                self.ensure(8)?;
                Variant::Int64(self.buf.get_i64_le())
            }
            VariantType::UInt64 => {
                self.ensure(8)?;
                Variant::UInt64(self.buf.get_u64_le())
            }
            VariantType::Float => {
                self.ensure(4)?;
                Variant::Float(self.buf.get_f32_le())
            }
            VariantType::Double => {
                self.ensure(8)?;
                Variant::Double(self.buf.get_f64_le())
            }
            VariantType::String => match self.take_string()? {
                Some(v) => Variant::String(v),
                None => Variant::Null,
            },
            VariantType::DateTime => {
                self.ensure(8)?;
                Variant::DateTime(ticks_to_datetime(self.buf.get_i64_le()))
            }
            VariantType::Guid => Variant::Guid(self.take_guid()?),
            VariantType::ByteString => match self.take_length_prefixed()? {
                Some(v) => Variant::ByteString(v),
                None => Variant::Null,
            },
            VariantType::XmlElement => match self.take_string()? {
                Some(v) => Variant::XmlElement(XmlElement::new(v)),
                None => Variant::Null,
            },
            VariantType::NodeId => Variant::NodeId(self.read_node_id("")?),
            VariantType::ExpandedNodeId => {
                Variant::ExpandedNodeId(self.read_expanded_node_id("")?)
            }
            VariantType::StatusCode => {
                self.ensure(4)?;
                Variant::StatusCode(StatusCode(self.buf.get_u32_le()))
            }
            VariantType::QualifiedName => Variant::QualifiedName(self.read_qualified_name("")?),
            VariantType::LocalizedText => Variant::LocalizedText(self.read_localized_text("")?),
            VariantType::ExtensionObject => {
                let object = self.read_extension_object("")?;
                if object.is_null() {
                    Variant::Null
                } else {
                    Variant::ExtensionObject(Box::new(object))
                }
            }
            VariantType::Variant => Variant::Variant(Box::new(self.read_variant("")?)),
            VariantType::DiagnosticInfo => {
                Variant::DiagnosticInfo(Box::new(self.read_diagnostic_info("")?))
            }
            VariantType::DataValue => {
                return Err(CodecError::decoding(
                    "DataValue is not supported as a variant scalar",
                ));
            }
        };
        Ok(value)
    }
}

impl Decoder for BinaryDecoder {
    fn push_namespace(&mut self, uri: &str) {
        self.scopes.push(uri.to_string());
    }

    fn pop_namespace(&mut self) {
        self.scopes.pop();
    }

    fn read_bool(&mut self, _name: &str) -> CodecResult<bool> {
        self.ensure(1)?;
        Ok(self.buf.get_u8() != 0)
    }

    fn read_sbyte(&mut self, _name: &str) -> CodecResult<i8> {
        self.ensure(1)?;
        Ok(self.buf.get_i8())
    }

    fn read_byte(&mut self, _name: &str) -> CodecResult<u8> {
        self.ensure(1)?;
        Ok(self.buf.get_u8())
    }

    fn read_i16(&mut self, _name: &str) -> CodecResult<i16> {
        self.ensure(2)?;
        Ok(self.buf.get_i16_le())
    }

    fn read_u16(&mut self, _name: &str) -> CodecResult<u16> {
        self.ensure(2)?;
        Ok(self.buf.get_u16_le())
    }

    fn read_i32(&mut self, _name: &str) -> CodecResult<i32> {
        self.ensure(4)?;
        Ok(self.buf.get_i32_le())
    }

    fn read_u32(&mut self, _name: &str) -> CodecResult<u32> {
        self.ensure(4)?;
        Ok(self.buf.get_u32_le())
    }

    fn read_i64(&mut self, _name: &str) -> CodecResult<i64> {
        self.ensure(8)?;
        Ok(self.buf.get_i64_le())
    }

    fn read_u64(&mut self, _name: &str) -> CodecResult<u64> {
        self.ensure(8)?;
        Ok(self.buf.get_u64_le())
    }

    fn read_f32(&mut self, _name: &str) -> CodecResult<f32> {
        self.ensure(4)?;
        Ok(self.buf.get_f32_le())
    }

    fn read_f64(&mut self, _name: &str) -> CodecResult<f64> {
        self.ensure(8)?;
        Ok(self.buf.get_f64_le())
    }

    fn read_string(&mut self, _name: &str) -> CodecResult<Option<String>> {
        self.take_string()
    }

    fn read_datetime(&mut self, _name: &str) -> CodecResult<DateTime<Utc>> {
        self.ensure(8)?;
        Ok(ticks_to_datetime(self.buf.get_i64_le()))
    }

    fn read_guid(&mut self, _name: &str) -> CodecResult<Uuid> {
        self.take_guid()
    }

    fn read_byte_string(&mut self, _name: &str) -> CodecResult<Option<Vec<u8>>> {
        self.take_length_prefixed()
    }

    fn read_xml_element(&mut self, _name: &str) -> CodecResult<Option<XmlElement>> {
        Ok(self.take_string()?.map(XmlElement::new))
    }

    fn read_node_id(&mut self, _name: &str) -> CodecResult<NodeId> {
        let (node_id, mask) = self.take_node_id_with_mask()?;
        if mask != 0 {
            return Err(CodecError::decoding(
                "expanded node id flags on a plain node id",
            ));
        }
        Ok(node_id)
    }

    fn read_expanded_node_id(&mut self, _name: &str) -> CodecResult<ExpandedNodeId> {
        let (node_id, mask) = self.take_node_id_with_mask()?;
        let namespace_uri = if mask & 0x80 != 0 {
            self.take_string()?
        } else {
            None
        };
        let server_index = if mask & 0x40 != 0 {
            self.ensure(4)?;
            self.buf.get_u32_le()
        } else {
            0
        };
        Ok(ExpandedNodeId {
            node_id,
            namespace_uri,
            server_index,
        })
    }

    fn read_status_code(&mut self, _name: &str) -> CodecResult<StatusCode> {
        self.ensure(4)?;
        Ok(StatusCode(self.buf.get_u32_le()))
    }

    fn read_qualified_name(&mut self, _name: &str) -> CodecResult<QualifiedName> {
        self.ensure(2)?;
        let namespace_index = self.buf.get_u16_le();
        let name = self.take_string()?.unwrap_or_default();
        Ok(QualifiedName {
            namespace_index,
            name,
        })
    }

    fn read_localized_text(&mut self, _name: &str) -> CodecResult<LocalizedText> {
        self.ensure(1)?;
        let mask = self.buf.get_u8();
        let locale = if mask & 0x01 != 0 {
            self.take_string()?
        } else {
            None
        };
        let text = if mask & 0x02 != 0 {
            self.take_string()?
        } else {
            None
        };
        Ok(LocalizedText { text, locale })
    }

    fn read_variant(&mut self, _name: &str) -> CodecResult<Variant> {
        self.enter()?;
        let result = (|| {
            self.ensure(1)?;
            let encoding = self.buf.get_u8();
            if encoding == 0 {
                return Ok(Variant::Null);
            }

            let ty = VariantType::from_tag(encoding & 0x3F).ok_or_else(|| {
                CodecError::decoding(format!("unknown variant tag {}", encoding & 0x3F))
            })?;

            if encoding & 0x80 == 0 {
                if ty == VariantType::Variant {
                    return Err(CodecError::decoding(
                        "a nested variant is only valid as an array element",
                    ));
                }
                return self.take_variant_scalar(ty);
            }

            // Array form.
            self.ensure(4)?;
            let len = self.buf.get_i32_le();
            if len < 0 {
                return Ok(Variant::Null);
            }
            let mut elements = Vec::with_capacity(len as usize);
            for _ in 0..len {
                elements.push(self.take_variant_scalar(ty)?);
            }

            let dimensions = if encoding & 0x40 != 0 {
                self.ensure(4)?;
                let count = self.buf.get_i32_le();
                if count < 0 {
                    return Err(CodecError::decoding("negative array dimension count"));
                }
                let mut dims = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    self.ensure(4)?;
                    let dim = self.buf.get_i32_le();
                    if dim < 0 {
                        return Err(CodecError::decoding("negative array dimension"));
                    }
                    dims.push(dim as u32);
                }
                dims
            } else {
                vec![len as u32]
            };

            let array = VariantArray::new(ty, elements, dimensions)?;
            Ok(Variant::Array(Box::new(array)))
        })();
        self.leave();
        result
    }

    fn read_data_value(&mut self, _name: &str) -> CodecResult<DataValue> {
        self.ensure(1)?;
        let mask = self.buf.get_u8();

        let variant = if mask & 0x01 != 0 {
            self.read_variant("Value")?
        } else {
            Variant::Null
        };
        let status_code = if mask & 0x02 != 0 {
            self.read_status_code("StatusCode")?
        } else {
            StatusCode::GOOD
        };
        let source_timestamp = if mask & 0x04 != 0 {
            Some(self.read_datetime("SourceTimestamp")?)
        } else {
            None
        };
        let source_picoseconds = if mask & 0x10 != 0 {
            self.read_u16("SourcePicoseconds")?
        } else {
            0
        };
        let server_timestamp = if mask & 0x08 != 0 {
            Some(self.read_datetime("ServerTimestamp")?)
        } else {
            None
        };
        let server_picoseconds = if mask & 0x20 != 0 {
            self.read_u16("ServerPicoseconds")?
        } else {
            0
        };

        Ok(DataValue::from_parts(
            variant,
            status_code,
            source_timestamp,
            source_picoseconds,
            server_timestamp,
            server_picoseconds,
        ))
    }

    fn read_extension_object(&mut self, _name: &str) -> CodecResult<ExtensionObject> {
        self.enter()?;
        let result = (|| {
            let (node_id, _) = self.take_node_id_with_mask()?;
            self.ensure(1)?;
            let encoding = self.buf.get_u8();
            let type_id = ExpandedNodeId::new(node_id);

            match encoding {
                0x00 => Ok(ExtensionObject::null()),
                0x01 => {
                    let body = self.take_length_prefixed()?.ok_or_else(|| {
                        CodecError::decoding("extension object body is the null byte string")
                    })?;

                    // Known types decode in place; unknown types keep the
                    // raw body so the value survives re-encoding.
                    if let Some(factory) =
                        TypeLibrary::global().and_then(|lib| lib.decode_factory(&type_id))
                    {
                        let mut value = factory();
                        let mut inner = BinaryDecoder::with_context(
                            Bytes::from(body),
                            self.namespace_uris.clone(),
                        );
                        value.decode(&mut inner)?;
                        Ok(ExtensionObject::from_structure_with_id(value, type_id))
                    } else {
                        Ok(ExtensionObject::from_bytes(Some(body), Some(type_id)))
                    }
                }
                0x02 => {
                    let body = self.take_string()?.map(XmlElement::new);
                    Ok(ExtensionObject::from_xml(body, Some(type_id)))
                }
                other => Err(CodecError::decoding(format!(
                    "unknown extension object encoding 0x{other:02X}"
                ))),
            }
        })();
        self.leave();
        result
    }

    fn read_diagnostic_info(&mut self, _name: &str) -> CodecResult<DiagnosticInfo> {
        self.enter()?;
        let result = (|| {
            self.ensure(1)?;
            let mask = self.buf.get_u8();
            let mut info = DiagnosticInfo::default();

            if mask & 0x01 != 0 {
                info.symbolic_id = Some(self.read_i32("SymbolicId")?);
            }
            if mask & 0x02 != 0 {
                info.namespace_uri = Some(self.read_i32("NamespaceUri")?);
            }
            if mask & 0x08 != 0 {
                info.locale = Some(self.read_i32("Locale")?);
            }
            if mask & 0x04 != 0 {
                info.localized_text = Some(self.read_i32("LocalizedText")?);
            }
            if mask & 0x10 != 0 {
                info.additional_info = self.take_string()?;
            }
            if mask & 0x20 != 0 {
                info.inner_status_code = Some(self.read_status_code("InnerStatusCode")?);
            }
            if mask & 0x40 != 0 {
                info.inner_diagnostic_info =
                    Some(Box::new(self.read_diagnostic_info("InnerDiagnosticInfo")?));
            }
            Ok(info)
        })();
        self.leave();
        result
    }

    fn read_i32_array(&mut self, _name: &str) -> CodecResult<Option<Vec<i32>>> {
        self.ensure(4)?;
        let len = self.buf.get_i32_le();
        if len < 0 {
            return Ok(None);
        }
        let mut values = Vec::with_capacity(len as usize);
        for _ in 0..len {
            self.ensure(4)?;
            values.push(self.buf.get_i32_le());
        }
        Ok(Some(values))
    }

    fn read_u32_array(&mut self, _name: &str) -> CodecResult<Option<Vec<u32>>> {
        self.ensure(4)?;
        let len = self.buf.get_i32_le();
        if len < 0 {
            return Ok(None);
        }
        let mut values = Vec::with_capacity(len as usize);
        for _ in 0..len {
            self.ensure(4)?;
            values.push(self.buf.get_u32_le());
        }
        Ok(Some(values))
    }

    fn read_f64_array(&mut self, _name: &str) -> CodecResult<Option<Vec<f64>>> {
        self.ensure(4)?;
        let len = self.buf.get_i32_le();
        if len < 0 {
            return Ok(None);
        }
        let mut values = Vec::with_capacity(len as usize);
        for _ in 0..len {
            self.ensure(8)?;
            values.push(self.buf.get_f64_le());
        }
        Ok(Some(values))
    }

    fn read_string_array(&mut self, _name: &str) -> CodecResult<Option<Vec<String>>> {
        self.ensure(4)?;
        let len = self.buf.get_i32_le();
        if len < 0 {
            return Ok(None);
        }
        let mut values = Vec::with_capacity(len as usize);
        for _ in 0..len {
            values.push(self.take_string()?.unwrap_or_default());
        }
        Ok(Some(values))
    }

    fn read_status_code_array(&mut self, _name: &str) -> CodecResult<Option<Vec<StatusCode>>> {
        self.ensure(4)?;
        let len = self.buf.get_i32_le();
        if len < 0 {
            return Ok(None);
        }
        let mut values = Vec::with_capacity(len as usize);
        for _ in 0..len {
            self.ensure(4)?;
            values.push(StatusCode(self.buf.get_u32_le()));
        }
        Ok(Some(values))
    }

    fn read_variant_array(&mut self, name: &str) -> CodecResult<Option<Vec<Variant>>> {
        self.ensure(4)?;
        let len = self.buf.get_i32_le();
        if len < 0 {
            return Ok(None);
        }
        let mut values = Vec::with_capacity(len as usize);
        for _ in 0..len {
            values.push(self.read_variant(name)?);
        }
        Ok(Some(values))
    }

    fn read_qualified_name_array(
        &mut self,
        name: &str,
    ) -> CodecResult<Option<Vec<QualifiedName>>> {
        self.ensure(4)?;
        let len = self.buf.get_i32_le();
        if len < 0 {
            return Ok(None);
        }
        let mut values = Vec::with_capacity(len as usize);
        for _ in 0..len {
            values.push(self.read_qualified_name(name)?);
        }
        Ok(Some(values))
    }
}
