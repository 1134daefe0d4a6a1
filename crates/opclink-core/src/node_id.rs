// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! OPC UA node identifiers.
//!
//! A [`NodeId`] addresses a node within one server using a namespace index
//! and one of four identifier kinds. An [`ExpandedNodeId`] additionally
//! carries an optional namespace uri (resolved against the server's
//! namespace table) and a server index, which makes it stable across
//! servers whose namespace tables differ.
//!
//! The text forms follow the OPC UA notation:
//!
//! ```text
//! i=85                    numeric, namespace 0
//! ns=2;s=Demo.Static      string, namespace 2
//! ns=4;g=09087e75-8e5e-499b-954f-f2a9603db28a
//! ns=3;b=dGVzdA==         opaque (base64)
//! svr=1;nsu=http://a/b;i=42
//! ```

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CodecError, CodecResult};

// =============================================================================
// NodeIdentifier
// =============================================================================

/// The identifier part of a [`NodeId`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeIdentifier {
    /// Numeric identifier (`i=`).
    Numeric(u32),

    /// String identifier (`s=`).
    String(String),

    /// GUID identifier (`g=`).
    Guid(Uuid),

    /// Opaque identifier (`b=`, base64 on the text form).
    Opaque(Vec<u8>),
}

impl NodeIdentifier {
    /// Returns `true` if this is the null numeric identifier.
    pub fn is_null(&self) -> bool {
        matches!(self, NodeIdentifier::Numeric(0))
    }
}

impl fmt::Display for NodeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeIdentifier::Numeric(v) => write!(f, "i={}", v),
            NodeIdentifier::String(v) => write!(f, "s={}", v),
            NodeIdentifier::Guid(v) => write!(f, "g={}", v),
            NodeIdentifier::Opaque(v) => {
                write!(f, "b={}", base64::engine::general_purpose::STANDARD.encode(v))
            }
        }
    }
}

// =============================================================================
// NodeId
// =============================================================================

/// Identifies a node within one server address space.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId {
    /// Namespace index (0 = OPC UA standard namespace).
    pub namespace_index: u16,

    /// The node identifier.
    pub identifier: NodeIdentifier,
}

impl NodeId {
    /// The null node id (`ns=0;i=0`).
    pub const NULL: NodeId = NodeId {
        namespace_index: 0,
        identifier: NodeIdentifier::Numeric(0),
    };

    /// Creates a numeric node id.
    pub fn numeric(namespace_index: u16, value: u32) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::Numeric(value),
        }
    }

    /// Creates a string node id.
    pub fn string(namespace_index: u16, value: impl Into<String>) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::String(value.into()),
        }
    }

    /// Creates a GUID node id.
    pub fn guid(namespace_index: u16, value: Uuid) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::Guid(value),
        }
    }

    /// Creates an opaque node id.
    pub fn opaque(namespace_index: u16, value: Vec<u8>) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::Opaque(value),
        }
    }

    /// Parses a node id from its text form.
    pub fn parse(text: &str) -> CodecResult<Self> {
        text.parse()
    }

    /// Returns `true` if this is the null node id.
    pub fn is_null(&self) -> bool {
        self.namespace_index == 0 && self.identifier.is_null()
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace_index != 0 {
            write!(f, "ns={};", self.namespace_index)?;
        }
        write!(f, "{}", self.identifier)
    }
}

impl FromStr for NodeId {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut namespace_index = 0u16;
        let mut rest = s;

        if let Some(after) = rest.strip_prefix("ns=") {
            let (ns, tail) = after
                .split_once(';')
                .ok_or_else(|| CodecError::invalid_node_id(s, "missing ';' after namespace"))?;
            namespace_index = ns
                .parse()
                .map_err(|_| CodecError::invalid_node_id(s, "namespace index is not a u16"))?;
            rest = tail;
        }

        let identifier = parse_identifier(s, rest)?;
        Ok(NodeId {
            namespace_index,
            identifier,
        })
    }
}

fn parse_identifier(full: &str, rest: &str) -> CodecResult<NodeIdentifier> {
    if let Some(value) = rest.strip_prefix("i=") {
        let value = value
            .parse()
            .map_err(|_| CodecError::invalid_node_id(full, "numeric identifier is not a u32"))?;
        return Ok(NodeIdentifier::Numeric(value));
    }
    if let Some(value) = rest.strip_prefix("s=") {
        return Ok(NodeIdentifier::String(value.to_string()));
    }
    if let Some(value) = rest.strip_prefix("g=") {
        let value = Uuid::parse_str(value)
            .map_err(|_| CodecError::invalid_node_id(full, "guid identifier is malformed"))?;
        return Ok(NodeIdentifier::Guid(value));
    }
    if let Some(value) = rest.strip_prefix("b=") {
        let value = base64::engine::general_purpose::STANDARD
            .decode(value)
            .map_err(|_| CodecError::invalid_node_id(full, "opaque identifier is not base64"))?;
        return Ok(NodeIdentifier::Opaque(value));
    }
    Err(CodecError::invalid_node_id(
        full,
        "identifier must start with i=, s=, g= or b=",
    ))
}

// =============================================================================
// ExpandedNodeId
// =============================================================================

/// A [`NodeId`] qualified by an optional namespace uri and server index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ExpandedNodeId {
    /// The inner node id. When `namespace_uri` is set, the inner namespace
    /// index is meaningless and the uri wins.
    pub node_id: NodeId,

    /// Namespace uri, resolved against the server namespace table.
    pub namespace_uri: Option<String>,

    /// Index into the server table (0 = local server).
    pub server_index: u32,
}

impl ExpandedNodeId {
    /// The null expanded node id.
    pub const NULL: ExpandedNodeId = ExpandedNodeId {
        node_id: NodeId::NULL,
        namespace_uri: None,
        server_index: 0,
    };

    /// Creates an expanded node id from a plain node id.
    pub fn new(node_id: NodeId) -> Self {
        Self {
            node_id,
            namespace_uri: None,
            server_index: 0,
        }
    }

    /// Creates a numeric expanded node id.
    pub fn numeric(namespace_index: u16, value: u32) -> Self {
        Self::new(NodeId::numeric(namespace_index, value))
    }

    /// Parses an expanded node id from its text form.
    pub fn parse(text: &str) -> CodecResult<Self> {
        text.parse()
    }

    /// Returns `true` if this is the null expanded node id.
    pub fn is_null(&self) -> bool {
        self.namespace_uri.is_none() && self.server_index == 0 && self.node_id.is_null()
    }

    /// Resolves this id to a local [`NodeId`] against a namespace table.
    ///
    /// When a namespace uri is present it must appear in `namespace_uris`;
    /// otherwise the inner node id is returned unchanged.
    pub fn to_node_id(&self, namespace_uris: &[String]) -> CodecResult<NodeId> {
        match &self.namespace_uri {
            None => Ok(self.node_id.clone()),
            Some(uri) => {
                let index = namespace_uris
                    .iter()
                    .position(|u| u == uri)
                    .ok_or_else(|| CodecError::UnknownNamespaceUri {
                        namespace_uri: uri.clone(),
                    })?;
                Ok(NodeId {
                    namespace_index: index as u16,
                    identifier: self.node_id.identifier.clone(),
                })
            }
        }
    }
}

impl From<NodeId> for ExpandedNodeId {
    fn from(node_id: NodeId) -> Self {
        Self::new(node_id)
    }
}

impl fmt::Display for ExpandedNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.server_index != 0 {
            write!(f, "svr={};", self.server_index)?;
        }
        if let Some(uri) = &self.namespace_uri {
            write!(f, "nsu={};{}", uri, self.node_id.identifier)
        } else {
            write!(f, "{}", self.node_id)
        }
    }
}

impl FromStr for ExpandedNodeId {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut server_index = 0u32;
        let mut rest = s;

        if let Some(after) = rest.strip_prefix("svr=") {
            let (svr, tail) = after
                .split_once(';')
                .ok_or_else(|| CodecError::invalid_node_id(s, "missing ';' after server index"))?;
            server_index = svr
                .parse()
                .map_err(|_| CodecError::invalid_node_id(s, "server index is not a u32"))?;
            rest = tail;
        }

        if let Some(after) = rest.strip_prefix("nsu=") {
            let (uri, tail) = after
                .split_once(';')
                .ok_or_else(|| CodecError::invalid_node_id(s, "missing ';' after namespace uri"))?;
            let identifier = parse_identifier(s, tail)?;
            return Ok(ExpandedNodeId {
                node_id: NodeId {
                    namespace_index: 0,
                    identifier,
                },
                namespace_uri: Some(uri.to_string()),
                server_index,
            });
        }

        let node_id: NodeId = rest.parse()?;
        Ok(ExpandedNodeId {
            node_id,
            namespace_uri: None,
            server_index,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numeric() {
        let id: NodeId = "i=85".parse().unwrap();
        assert_eq!(id, NodeId::numeric(0, 85));

        let id: NodeId = "ns=2;i=1001".parse().unwrap();
        assert_eq!(id, NodeId::numeric(2, 1001));
    }

    #[test]
    fn test_parse_string() {
        let id: NodeId = "ns=4;s=Demo.Static.Scalar".parse().unwrap();
        assert_eq!(id, NodeId::string(4, "Demo.Static.Scalar"));
    }

    #[test]
    fn test_parse_guid() {
        let uuid = Uuid::parse_str("09087e75-8e5e-499b-954f-f2a9603db28a").unwrap();
        let id: NodeId = "ns=3;g=09087e75-8e5e-499b-954f-f2a9603db28a".parse().unwrap();
        assert_eq!(id, NodeId::guid(3, uuid));
    }

    #[test]
    fn test_parse_opaque() {
        let id: NodeId = "ns=1;b=dGVzdA==".parse().unwrap();
        assert_eq!(id, NodeId::opaque(1, b"test".to_vec()));
    }

    #[test]
    fn test_parse_invalid() {
        assert!(NodeId::parse("x=1").is_err());
        assert!(NodeId::parse("ns=2").is_err());
        assert!(NodeId::parse("ns=nope;i=1").is_err());
        assert!(NodeId::parse("g=not-a-guid").is_err());
    }

    #[test]
    fn test_display_round_trip() {
        for text in ["i=85", "ns=2;i=1001", "ns=4;s=Value", "ns=1;b=dGVzdA=="] {
            let id: NodeId = text.parse().unwrap();
            assert_eq!(id.to_string(), text);
        }
    }

    #[test]
    fn test_expanded_parse() {
        let id: ExpandedNodeId = "nsu=http://opcfoundation.org/UA/;i=2253".parse().unwrap();
        assert_eq!(
            id.namespace_uri.as_deref(),
            Some("http://opcfoundation.org/UA/")
        );
        assert_eq!(id.node_id.identifier, NodeIdentifier::Numeric(2253));

        let id: ExpandedNodeId = "svr=1;ns=2;i=5".parse().unwrap();
        assert_eq!(id.server_index, 1);
        assert_eq!(id.node_id, NodeId::numeric(2, 5));
    }

    #[test]
    fn test_expanded_to_node_id() {
        let uris = vec![
            "http://opcfoundation.org/UA/".to_string(),
            "urn:factory:line1".to_string(),
        ];

        let id: ExpandedNodeId = "nsu=urn:factory:line1;s=Pump.Speed".parse().unwrap();
        let resolved = id.to_node_id(&uris).unwrap();
        assert_eq!(resolved, NodeId::string(1, "Pump.Speed"));

        let id: ExpandedNodeId = "nsu=urn:missing;i=1".parse().unwrap();
        assert!(id.to_node_id(&uris).is_err());

        let id: ExpandedNodeId = "ns=2;i=7".parse().unwrap();
        assert_eq!(id.to_node_id(&uris).unwrap(), NodeId::numeric(2, 7));
    }

    #[test]
    fn test_null() {
        assert!(NodeId::NULL.is_null());
        assert!(ExpandedNodeId::NULL.is_null());
        assert!(!NodeId::numeric(0, 85).is_null());
    }
}
