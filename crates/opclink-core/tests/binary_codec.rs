// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Binary codec round-trip tests.
//!
//! One process-wide type library is installed for the whole binary, so the
//! structured-type cases share it; the unregistered-type cases use a type
//! that is deliberately left out of the registrations.

use std::any::Any;
use std::sync::Once;

use chrono::{TimeZone, Utc};
use uuid::Uuid;

use opclink_core::{
    BinaryDecoder, BinaryEncoder, BodyType, CodecError, CodecResult, DataValue, Decoder,
    Encodable, Encoder, ExpandedNodeId, ExtensionObject, LocalizedText, NodeId, QualifiedName,
    StatusCode, TypeLibrary, Variant, VariantArray, VariantType,
};

// =============================================================================
// Test Types
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
struct MachineStatus {
    name: Option<String>,
    speed: f64,
    running: bool,
}

impl Encodable for MachineStatus {
    fn encode(&self, encoder: &mut dyn Encoder) -> CodecResult<()> {
        encoder.push_namespace("urn:factory:types");
        encoder.write_string("Name", self.name.as_deref())?;
        encoder.write_f64("Speed", self.speed)?;
        encoder.write_bool("Running", self.running)?;
        encoder.pop_namespace();
        Ok(())
    }

    fn decode(&mut self, decoder: &mut dyn Decoder) -> CodecResult<()> {
        decoder.push_namespace("urn:factory:types");
        self.name = decoder.read_string("Name")?;
        self.speed = decoder.read_f64("Speed")?;
        self.running = decoder.read_bool("Running")?;
        decoder.pop_namespace();
        Ok(())
    }

    fn is_default(&self) -> bool {
        self.name.is_none() && self.speed == 0.0 && !self.running
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_encodable(&self) -> Box<dyn Encodable> {
        Box::new(self.clone())
    }
}

/// Deliberately never registered.
#[derive(Debug, Clone, Default)]
struct UnregisteredRecipe {
    steps: i32,
}

impl Encodable for UnregisteredRecipe {
    fn encode(&self, encoder: &mut dyn Encoder) -> CodecResult<()> {
        encoder.write_i32("Steps", self.steps)
    }

    fn decode(&mut self, decoder: &mut dyn Decoder) -> CodecResult<()> {
        self.steps = decoder.read_i32("Steps")?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_encodable(&self) -> Box<dyn Encodable> {
        Box::new(self.clone())
    }
}

static INSTALL: Once = Once::new();

fn ensure_library() {
    INSTALL.call_once(|| {
        TypeLibrary::builder()
            .register::<MachineStatus>("ns=2;i=5001")
            .unwrap()
            .install()
            .unwrap();
    });
}

fn round_trip(value: &Variant) -> Variant {
    let mut encoder = BinaryEncoder::new();
    encoder.write_variant("Value", value).unwrap();
    let mut decoder = BinaryDecoder::new(encoder.finish());
    let decoded = decoder.read_variant("Value").unwrap();
    assert!(decoder.is_exhausted(), "trailing bytes after {value:?}");
    decoded
}

// =============================================================================
// Variant round trips
// =============================================================================

#[test]
fn scalar_round_trip() {
    let guid = Uuid::parse_str("09087e75-8e5e-499b-954f-f2a9603db28a").unwrap();
    let when = Utc.with_ymd_and_hms(2025, 7, 1, 13, 45, 30).unwrap();

    let values = vec![
        Variant::Null,
        Variant::from(true),
        Variant::from(-5i8),
        Variant::from(200u8),
        Variant::from(-12_345i16),
        Variant::from(54_321u16),
        Variant::from(-7_000_000i32),
        Variant::from(4_000_000_000u32),
        Variant::from(i64::MIN + 1),
        Variant::from(u64::MAX),
        Variant::from(2.5f32),
        Variant::from(42.5f64),
        Variant::from("überdruck"),
        Variant::from(when),
        Variant::from(guid),
        Variant::from(vec![0u8, 1, 254, 255]),
        Variant::from(NodeId::string(4, "Pump.Speed")),
        Variant::from(ExpandedNodeId::parse("nsu=urn:factory:line1;i=7").unwrap()),
        Variant::from(StatusCode::BAD_NODE_ID_UNKNOWN),
        Variant::from(QualifiedName::new(2, "Temperature")),
        Variant::from(LocalizedText::with_locale("stopped", "en-US")),
    ];

    for value in values {
        assert_eq!(round_trip(&value), value);
    }
}

#[test]
fn array_round_trip() {
    let values: Vec<Variant> = vec![
        vec![1.5f64, -2.5, 3.25].into(),
        vec![true, false, true].into(),
        vec!["a".to_string(), "b".to_string()].into(),
        vec![-1i32, 0, 1].into(),
    ];

    for value in values {
        assert_eq!(round_trip(&value), value);
    }
}

#[test]
fn matrix_round_trip() {
    let elements = (0..6).map(Variant::Int32).collect();
    let array = VariantArray::new(VariantType::Int32, elements, vec![2, 3]).unwrap();
    let value = Variant::Array(Box::new(array));

    let decoded = round_trip(&value);
    let decoded_array = decoded.as_array().unwrap();
    assert_eq!(decoded_array.dimensions(), &[2, 3]);
    assert_eq!(decoded, value);
}

#[test]
fn node_id_compact_encodings() {
    // Each form picks the smallest wire encoding; all must survive.
    let ids = vec![
        NodeId::numeric(0, 85),      // two-byte form
        NodeId::numeric(3, 1001),    // four-byte form
        NodeId::numeric(300, 70000), // full numeric form
        NodeId::string(2, "Demo"),
        NodeId::guid(1, Uuid::parse_str("09087e75-8e5e-499b-954f-f2a9603db28a").unwrap()),
        NodeId::opaque(1, vec![9, 8, 7]),
    ];

    for id in ids {
        let mut encoder = BinaryEncoder::new();
        encoder.write_node_id("NodeId", &id).unwrap();
        let mut decoder = BinaryDecoder::new(encoder.finish());
        assert_eq!(decoder.read_node_id("NodeId").unwrap(), id);
    }
}

#[test]
fn data_value_round_trip() {
    let ts = Utc.with_ymd_and_hms(2025, 7, 1, 9, 0, 0).unwrap();
    let dv = DataValue::new(42.5f64)
        .with_status(StatusCode::GOOD)
        .with_source_timestamp(ts)
        .with_server_timestamp(ts)
        .with_picoseconds(120, 0);

    let mut encoder = BinaryEncoder::new();
    encoder.write_data_value("Value", &dv).unwrap();
    let mut decoder = BinaryDecoder::new(encoder.finish());
    let decoded = decoder.read_data_value("Value").unwrap();

    assert_eq!(decoded, dv);
}

#[test]
fn truncated_input_is_an_error() {
    let mut encoder = BinaryEncoder::new();
    encoder.write_variant("Value", &Variant::from(42.5f64)).unwrap();
    let bytes = encoder.finish();

    let mut decoder = BinaryDecoder::new(bytes.slice(0..4));
    let result = decoder.read_variant("Value");
    assert!(matches!(result, Err(CodecError::EndOfStream { .. })));
}

// =============================================================================
// Structured values
// =============================================================================

#[test]
fn structure_round_trip() {
    ensure_library();

    let status = MachineStatus {
        name: Some("press-1".to_string()),
        speed: 120.5,
        running: true,
    };

    let value = Variant::structure(status.clone()).unwrap();
    let decoded = round_trip(&value);

    let object = decoded.as_extension_object().unwrap();
    assert_eq!(object.body_type(), BodyType::Structure);
    assert_eq!(
        object.type_id(),
        Some(&ExpandedNodeId::parse("ns=2;i=5001").unwrap())
    );
    assert_eq!(object.decoded::<MachineStatus>(), Some(&status));
}

#[test]
fn unregistered_structure_fails() {
    ensure_library();

    let result = Variant::structure(UnregisteredRecipe { steps: 3 });
    let err = result.unwrap_err();
    assert!(matches!(err, CodecError::UnregisteredType { .. }));
    assert_eq!(err.status_code(), StatusCode::BAD_DATA_ENCODING_UNSUPPORTED);
}

#[test]
fn unknown_type_id_preserves_raw_body() {
    ensure_library();

    // Hand-assemble an extension object whose type id is not registered.
    let raw = ExtensionObject::from_bytes(
        Some(vec![1, 2, 3, 4]),
        Some(ExpandedNodeId::parse("ns=9;i=9999").unwrap()),
    );

    let mut encoder = BinaryEncoder::new();
    encoder.write_extension_object("Body", &raw).unwrap();
    let mut decoder = BinaryDecoder::new(encoder.finish());
    let decoded = decoder.read_extension_object("Body").unwrap();

    assert_eq!(decoded.body_type(), BodyType::ByteString);
    assert_eq!(decoded, raw);

    // ...and survives a second encode unchanged.
    let mut encoder = BinaryEncoder::new();
    encoder.write_extension_object("Body", &decoded).unwrap();
    let mut decoder = BinaryDecoder::new(encoder.finish());
    assert_eq!(decoder.read_extension_object("Body").unwrap(), raw);
}

#[test]
fn null_extension_object_body() {
    let object = ExtensionObject::from_bytes(
        None,
        Some(ExpandedNodeId::parse("ns=2;i=5001").unwrap()),
    );
    assert_eq!(object.body_type(), BodyType::None);

    let mut encoder = BinaryEncoder::new();
    encoder.write_extension_object("Body", &object).unwrap();
    let mut decoder = BinaryDecoder::new(encoder.finish());
    let decoded = decoder.read_extension_object("Body").unwrap();
    assert_eq!(decoded.body_type(), BodyType::None);
    assert!(decoded.type_id().is_none());
}
