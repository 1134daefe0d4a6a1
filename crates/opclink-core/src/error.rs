// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Codec error types.
//!
//! All failures of the value model and the binary codec are reported through
//! [`CodecError`]. Each variant maps to a well-known OPC UA status code via
//! [`CodecError::status_code`], which the client layer uses when a codec
//! failure has to be surfaced as a service result.

use thiserror::Error;

use crate::status::StatusCode;
use crate::variant::VariantType;

// =============================================================================
// CodecError
// =============================================================================

/// Errors produced by the value model and the binary codec.
#[derive(Debug, Clone, Error)]
pub enum CodecError {
    /// A native type has no `Variant` representation.
    #[error("Type '{type_name}' is not supported as a Variant value")]
    UnsupportedType {
        /// Name of the offending type.
        type_name: String,
    },

    /// An array element does not match the array's element type.
    #[error("Array element type mismatch: expected {expected:?}, found {found:?}")]
    UnsupportedArrayElement {
        /// The declared element type.
        expected: VariantType,
        /// The offending element's type.
        found: VariantType,
    },

    /// Array dimensions do not describe the element buffer.
    #[error("Array dimensions describe {expected} elements but buffer holds {actual}")]
    DimensionMismatch {
        /// Element count implied by the dimensions.
        expected: usize,
        /// Actual element count.
        actual: usize,
    },

    /// A structured type has no registered binary-encoding id.
    #[error("Type '{type_name}' has no registered binary encoding id")]
    UnregisteredType {
        /// Name of the unregistered type.
        type_name: String,
    },

    /// Encoding failed.
    #[error("Encoding failed: {message}")]
    Encoding {
        /// Error message.
        message: String,
    },

    /// Decoding failed.
    #[error("Decoding failed: {message}")]
    Decoding {
        /// Error message.
        message: String,
    },

    /// The input buffer ended before the value was complete.
    #[error("Unexpected end of stream: needed {needed} bytes, {remaining} remaining")]
    EndOfStream {
        /// Bytes required by the pending read.
        needed: usize,
        /// Bytes left in the buffer.
        remaining: usize,
    },

    /// Nested values exceeded the maximum depth.
    #[error("Nesting depth exceeded the limit of {limit}")]
    DepthExceeded {
        /// The configured depth limit.
        limit: u32,
    },

    /// The global type library was installed twice.
    #[error("The type library is already installed")]
    LibraryAlreadyInstalled,

    /// A namespace uri could not be resolved to an index.
    #[error("Namespace uri '{namespace_uri}' is not present in the server namespace table")]
    UnknownNamespaceUri {
        /// The unresolved uri.
        namespace_uri: String,
    },

    /// A node id string could not be parsed.
    #[error("Invalid node id '{text}': {message}")]
    InvalidNodeId {
        /// The offending text.
        text: String,
        /// Error message.
        message: String,
    },
}

impl CodecError {
    /// Creates an unsupported type error.
    pub fn unsupported_type(type_name: impl Into<String>) -> Self {
        Self::UnsupportedType {
            type_name: type_name.into(),
        }
    }

    /// Creates an unregistered type error.
    pub fn unregistered_type(type_name: impl Into<String>) -> Self {
        Self::UnregisteredType {
            type_name: type_name.into(),
        }
    }

    /// Creates an encoding error.
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding {
            message: message.into(),
        }
    }

    /// Creates a decoding error.
    pub fn decoding(message: impl Into<String>) -> Self {
        Self::Decoding {
            message: message.into(),
        }
    }

    /// Creates an invalid node id error.
    pub fn invalid_node_id(text: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidNodeId {
            text: text.into(),
            message: message.into(),
        }
    }

    /// Returns the OPC UA status code that corresponds to this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            CodecError::UnsupportedType { .. }
            | CodecError::UnsupportedArrayElement { .. }
            | CodecError::DimensionMismatch { .. } => StatusCode::BAD_OUT_OF_RANGE,
            CodecError::UnregisteredType { .. } => StatusCode::BAD_DATA_ENCODING_UNSUPPORTED,
            CodecError::Encoding { .. } | CodecError::DepthExceeded { .. } => {
                StatusCode::BAD_ENCODING_ERROR
            }
            CodecError::Decoding { .. } | CodecError::EndOfStream { .. } => {
                StatusCode::BAD_DECODING_ERROR
            }
            CodecError::LibraryAlreadyInstalled => StatusCode::BAD_INVALID_STATE,
            CodecError::UnknownNamespaceUri { .. } | CodecError::InvalidNodeId { .. } => {
                StatusCode::BAD_NODE_ID_INVALID
            }
        }
    }

    /// Returns the error type for logging/metrics.
    pub fn error_type(&self) -> &'static str {
        match self {
            CodecError::UnsupportedType { .. } => "unsupported_type",
            CodecError::UnsupportedArrayElement { .. } => "unsupported_array_element",
            CodecError::DimensionMismatch { .. } => "dimension_mismatch",
            CodecError::UnregisteredType { .. } => "unregistered_type",
            CodecError::Encoding { .. } => "encoding",
            CodecError::Decoding { .. } => "decoding",
            CodecError::EndOfStream { .. } => "end_of_stream",
            CodecError::DepthExceeded { .. } => "depth_exceeded",
            CodecError::LibraryAlreadyInstalled => "library_already_installed",
            CodecError::UnknownNamespaceUri { .. } => "unknown_namespace_uri",
            CodecError::InvalidNodeId { .. } => "invalid_node_id",
        }
    }
}

/// A Result type with CodecError.
pub type CodecResult<T> = Result<T, CodecError>;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_mapping() {
        assert_eq!(
            CodecError::unregistered_type("Foo").status_code(),
            StatusCode::BAD_DATA_ENCODING_UNSUPPORTED
        );
        assert_eq!(
            CodecError::decoding("short read").status_code(),
            StatusCode::BAD_DECODING_ERROR
        );
        assert_eq!(
            CodecError::unsupported_type("Bar").status_code(),
            StatusCode::BAD_OUT_OF_RANGE
        );
    }

    #[test]
    fn test_error_type() {
        assert_eq!(CodecError::encoding("x").error_type(), "encoding");
        assert_eq!(
            CodecError::EndOfStream {
                needed: 4,
                remaining: 1
            }
            .error_type(),
            "end_of_stream"
        );
    }
}
