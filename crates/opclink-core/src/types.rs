// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Supporting wire types: qualified names, localized text, XML fragments,
//! diagnostic info and the OPC UA timestamp representation.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CodecError, CodecResult};
use crate::status::StatusCode;

// =============================================================================
// QualifiedName
// =============================================================================

/// A name qualified by a namespace index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct QualifiedName {
    /// Namespace index of the name.
    pub namespace_index: u16,

    /// The unqualified name.
    pub name: String,
}

impl QualifiedName {
    /// Creates a qualified name.
    pub fn new(namespace_index: u16, name: impl Into<String>) -> Self {
        Self {
            namespace_index,
            name: name.into(),
        }
    }

    /// Parses the `<ns>:<name>` text form; a bare name means namespace 0.
    pub fn parse(text: &str) -> CodecResult<Self> {
        text.parse()
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace_index != 0 {
            write!(f, "{}:{}", self.namespace_index, self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

impl FromStr for QualifiedName {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((ns, name)) => {
                let namespace_index = ns.parse().map_err(|_| {
                    CodecError::decoding(format!("Invalid qualified name '{s}': bad namespace"))
                })?;
                Ok(Self::new(namespace_index, name))
            }
            None => Ok(Self::new(0, s)),
        }
    }
}

// =============================================================================
// LocalizedText
// =============================================================================

/// Human readable text with an optional locale.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct LocalizedText {
    /// The text.
    pub text: Option<String>,

    /// The locale, e.g. `en-US`.
    pub locale: Option<String>,
}

impl LocalizedText {
    /// Creates localized text without a locale.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            locale: None,
        }
    }

    /// Creates localized text with a locale.
    pub fn with_locale(text: impl Into<String>, locale: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            locale: Some(locale.into()),
        }
    }
}

impl fmt::Display for LocalizedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text.as_deref().unwrap_or(""))
    }
}

impl From<&str> for LocalizedText {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for LocalizedText {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

// =============================================================================
// XmlElement
// =============================================================================

/// A raw XML fragment carried opaquely on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct XmlElement(pub String);

impl XmlElement {
    /// Creates an XML element from its text form.
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Returns the raw text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for XmlElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// DiagnosticInfo
// =============================================================================

/// Vendor-specific diagnostic information attached to a service result.
///
/// The numeric members index into the string table of the response that
/// carried this value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DiagnosticInfo {
    /// Index of the symbolic id in the string table.
    pub symbolic_id: Option<i32>,

    /// Index of the namespace uri in the string table.
    pub namespace_uri: Option<i32>,

    /// Index of the locale in the string table.
    pub locale: Option<i32>,

    /// Index of the localized text in the string table.
    pub localized_text: Option<i32>,

    /// Additional free-form diagnostic text.
    pub additional_info: Option<String>,

    /// Status code of the inner operation.
    pub inner_status_code: Option<StatusCode>,

    /// Nested diagnostic info.
    pub inner_diagnostic_info: Option<Box<DiagnosticInfo>>,
}

// =============================================================================
// OPC UA timestamps
// =============================================================================

/// Seconds between 1601-01-01 and the Unix epoch.
const EPOCH_OFFSET_SECS: i64 = 11_644_473_600;

/// The largest representable tick value (9999-12-31T23:59:59).
const MAX_TICKS: i64 = 2_650_467_743_990_000_000;

/// Converts a UTC timestamp to 100 ns ticks since 1601-01-01.
///
/// Values before 1601 clamp to 0 and values at or beyond the year 9999
/// clamp to `i64::MAX`, matching the wire convention for "no meaningful
/// timestamp".
pub fn datetime_to_ticks(value: DateTime<Utc>) -> i64 {
    let secs = value.timestamp().saturating_add(EPOCH_OFFSET_SECS);
    if secs <= 0 {
        return 0;
    }
    let Some(base) = secs.checked_mul(10_000_000) else {
        return i64::MAX;
    };
    let ticks = base.saturating_add(i64::from(value.timestamp_subsec_nanos()) / 100);
    if ticks >= MAX_TICKS {
        i64::MAX
    } else {
        ticks
    }
}

/// Converts 100 ns ticks since 1601-01-01 to a UTC timestamp.
pub fn ticks_to_datetime(ticks: i64) -> DateTime<Utc> {
    if ticks <= 0 {
        return Utc.timestamp_opt(-EPOCH_OFFSET_SECS, 0).unwrap();
    }
    let clamped = ticks.min(MAX_TICKS);
    let secs = clamped / 10_000_000 - EPOCH_OFFSET_SECS;
    let nanos = (clamped % 10_000_000) * 100;
    Utc.timestamp_opt(secs, nanos as u32).unwrap()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualified_name_parse() {
        let qn: QualifiedName = "2:Temperature".parse().unwrap();
        assert_eq!(qn, QualifiedName::new(2, "Temperature"));

        let qn: QualifiedName = "Message".parse().unwrap();
        assert_eq!(qn, QualifiedName::new(0, "Message"));

        assert!("x:Name".parse::<QualifiedName>().is_err());
    }

    #[test]
    fn test_localized_text() {
        let text = LocalizedText::with_locale("Pumpe gestoppt", "de-DE");
        assert_eq!(text.to_string(), "Pumpe gestoppt");
        assert_eq!(text.locale.as_deref(), Some("de-DE"));
    }

    #[test]
    fn test_ticks_round_trip() {
        let dt = Utc.with_ymd_and_hms(2025, 6, 15, 12, 30, 45).unwrap();
        let ticks = datetime_to_ticks(dt);
        assert_eq!(ticks_to_datetime(ticks), dt);
    }

    #[test]
    fn test_ticks_clamping() {
        let before_1601 = Utc.with_ymd_and_hms(1500, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(datetime_to_ticks(before_1601), 0);

        let far_future = Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(datetime_to_ticks(far_future), i64::MAX);
    }

    #[test]
    fn test_ticks_epoch() {
        // Tick 0 is 1601-01-01T00:00:00Z.
        let epoch = ticks_to_datetime(0);
        assert_eq!(epoch, Utc.with_ymd_and_hms(1601, 1, 1, 0, 0, 0).unwrap());
    }
}
