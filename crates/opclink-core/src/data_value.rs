// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Attribute values with quality and timestamps.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::status::StatusCode;
use crate::variant::Variant;

// =============================================================================
// DataValue
// =============================================================================

/// A [`Variant`] wrapped with a status code and source/server timestamps.
///
/// Immutable after construction; the accessors expose the parts, and
/// [`DataValue::value`] is derived from the inner variant rather than being
/// an independently settable field.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataValue {
    variant: Variant,
    status_code: StatusCode,
    source_timestamp: Option<DateTime<Utc>>,
    source_picoseconds: u16,
    server_timestamp: Option<DateTime<Utc>>,
    server_picoseconds: u16,
}

impl DataValue {
    /// Creates a data value with Good status and no timestamps.
    pub fn new(value: impl Into<Variant>) -> Self {
        Self {
            variant: value.into(),
            ..Default::default()
        }
    }

    /// Creates a data value carrying only a status code.
    pub fn from_status(status_code: StatusCode) -> Self {
        Self {
            status_code,
            ..Default::default()
        }
    }

    /// Sets the status code.
    pub fn with_status(mut self, status_code: StatusCode) -> Self {
        self.status_code = status_code;
        self
    }

    /// Sets the source timestamp.
    pub fn with_source_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.source_timestamp = Some(timestamp);
        self
    }

    /// Sets the server timestamp.
    pub fn with_server_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.server_timestamp = Some(timestamp);
        self
    }

    /// Sets the sub-tick parts of both timestamps.
    pub fn with_picoseconds(mut self, source: u16, server: u16) -> Self {
        self.source_picoseconds = source;
        self.server_picoseconds = server;
        self
    }

    /// Reassembles a data value from decoded parts.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        variant: Variant,
        status_code: StatusCode,
        source_timestamp: Option<DateTime<Utc>>,
        source_picoseconds: u16,
        server_timestamp: Option<DateTime<Utc>>,
        server_picoseconds: u16,
    ) -> Self {
        Self {
            variant,
            status_code,
            source_timestamp,
            source_picoseconds,
            server_timestamp,
            server_picoseconds,
        }
    }

    /// Returns the wrapped value.
    pub fn value(&self) -> &Variant {
        &self.variant
    }

    /// Consumes the data value, returning the wrapped value.
    pub fn into_value(self) -> Variant {
        self.variant
    }

    /// Returns the status code.
    pub fn status_code(&self) -> StatusCode {
        self.status_code
    }

    /// Returns the source timestamp.
    pub fn source_timestamp(&self) -> Option<DateTime<Utc>> {
        self.source_timestamp
    }

    /// Returns the source sub-tick picoseconds.
    pub fn source_picoseconds(&self) -> u16 {
        self.source_picoseconds
    }

    /// Returns the server timestamp.
    pub fn server_timestamp(&self) -> Option<DateTime<Utc>> {
        self.server_timestamp
    }

    /// Returns the server sub-tick picoseconds.
    pub fn server_picoseconds(&self) -> u16 {
        self.server_picoseconds
    }

    /// Returns `true` if the status severity is good.
    pub fn is_good(&self) -> bool {
        self.status_code.is_good()
    }
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}; status: {}", self.variant, self.status_code)?;
        if let Some(ts) = self.source_timestamp {
            write!(f, "; ts: {}", ts.to_rfc3339())?;
        }
        Ok(())
    }
}

impl From<Variant> for DataValue {
    fn from(variant: Variant) -> Self {
        Self::new(variant)
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
    fn test_value_is_derived() {
        let dv = DataValue::new(42.5f64);
        assert_eq!(dv.value().as_f64(), Some(42.5));
        assert_eq!(dv.status_code(), StatusCode::GOOD);
        assert!(dv.is_good());
    }

    #[test]
    fn test_status_only() {
        let dv = DataValue::from_status(StatusCode::BAD_NODE_ID_UNKNOWN);
        assert!(dv.value().is_null());
        assert!(!dv.is_good());
    }

    #[test]
    fn test_builder() {
        let ts = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();
        let dv = DataValue::new(1i32)
            .with_source_timestamp(ts)
            .with_server_timestamp(ts)
            .with_picoseconds(100, 200);

        assert_eq!(dv.source_timestamp(), Some(ts));
        assert_eq!(dv.server_timestamp(), Some(ts));
        assert_eq!(dv.source_picoseconds(), 100);
        assert_eq!(dv.server_picoseconds(), 200);
    }
}
