// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Log index representations (measured depth or date-time).
//!
//! A log's data range is bounded by two index values of the same kind. Depth
//! indexes compare with a small epsilon so unit-conversion and rounding noise
//! does not make equal depths unequal; date-time indexes carry a fixed
//! millisecond pattern and compare by exact formatted string.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, WitsmlError};

/// Depth values closer than this compare as equal.
pub const DEPTH_EPSILON: f64 = 1e-3;

/// Fixed millisecond pattern for date-time index values.
pub const DATETIME_PATTERN: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Start or end bound of log-curve data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Index {
    /// Measured depth with its unit of measure.
    Depth {
        /// Numeric depth value.
        value: f64,
        /// Unit of measure, e.g. `m` or `ft`.
        uom: String,
    },
    /// Date-time, formatted with [`DATETIME_PATTERN`].
    DateTime {
        /// Formatted timestamp string.
        value: String,
    },
}

impl Index {
    /// A depth index.
    pub fn depth(value: f64, uom: impl Into<String>) -> Self {
        Self::Depth {
            value,
            uom: uom.into(),
        }
    }

    /// A date-time index from a UTC timestamp, truncated to milliseconds.
    pub fn date_time(timestamp: DateTime<Utc>) -> Self {
        Self::DateTime {
            value: timestamp.format(DATETIME_PATTERN).to_string(),
        }
    }

    /// Parse a date-time index, validating the fixed pattern.
    pub fn parse_date_time(value: &str) -> Result<Self> {
        NaiveDateTime::parse_from_str(value, DATETIME_PATTERN)
            .map_err(|e| WitsmlError::Envelope(format!("invalid index timestamp '{value}': {e}")))?;
        Ok(Self::DateTime {
            value: value.to_string(),
        })
    }

    /// True for the depth kind.
    pub fn is_depth(&self) -> bool {
        matches!(self, Self::Depth { .. })
    }

    /// True for the date-time kind.
    pub fn is_date_time(&self) -> bool {
        matches!(self, Self::DateTime { .. })
    }

    /// Value formatted for a query document bound: a plain numeric string for
    /// depth, the fixed-pattern timestamp for date-time.
    pub fn to_query_value(&self) -> String {
        match self {
            Self::Depth { value, .. } => format!("{value}"),
            Self::DateTime { value } => value.clone(),
        }
    }

    /// Unit of measure for depth indexes.
    pub fn uom(&self) -> Option<&str> {
        match self {
            Self::Depth { uom, .. } => Some(uom),
            Self::DateTime { .. } => None,
        }
    }
}

impl PartialEq for Index {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Depth { value: a, .. }, Self::Depth { value: b, .. }) => {
                (a - b).abs() <= DEPTH_EPSILON
            }
            (Self::DateTime { value: a }, Self::DateTime { value: b }) => a == b,
            _ => false,
        }
    }
}

impl PartialOrd for Index {
    /// Same-kind ordering only; comparing a depth to a date-time is `None`.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Depth { value: a, .. }, Self::Depth { value: b, .. }) => {
                if (a - b).abs() <= DEPTH_EPSILON {
                    Some(Ordering::Equal)
                } else {
                    a.partial_cmp(b)
                }
            }
            // The fixed pattern makes lexicographic and chronological order agree.
            (Self::DateTime { value: a }, Self::DateTime { value: b }) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Depth { value, uom } => write!(f, "{value} {uom}"),
            Self::DateTime { value } => f.write_str(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_depth_equality_within_epsilon() {
        let a = Index::depth(1500.0005, "m");
        let b = Index::depth(1500.0009, "m");
        assert_eq!(a, b);
        assert_eq!(a.partial_cmp(&b), Some(Ordering::Equal));
    }

    #[test]
    fn test_depth_inequality_beyond_epsilon() {
        let a = Index::depth(1500.0, "m");
        let b = Index::depth(1500.002, "m");
        assert_ne!(a, b);
        assert_eq!(a.partial_cmp(&b), Some(Ordering::Less));
    }

    #[test]
    fn test_depth_ordering() {
        let shallow = Index::depth(100.0, "m");
        let deep = Index::depth(2500.0, "m");
        assert!(shallow < deep);
        assert!(deep > shallow);
    }

    #[test]
    fn test_date_time_fixed_pattern() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 15, 12, 30, 45).unwrap()
            + chrono::Duration::milliseconds(120);
        let index = Index::date_time(ts);
        assert_eq!(index.to_query_value(), "2024-03-15T12:30:45.120Z");
    }

    #[test]
    fn test_date_time_exact_string_equality() {
        let a = Index::parse_date_time("2024-03-15T12:30:45.120Z").unwrap();
        let b = Index::parse_date_time("2024-03-15T12:30:45.120Z").unwrap();
        let c = Index::parse_date_time("2024-03-15T12:30:45.121Z").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.partial_cmp(&c), Some(Ordering::Less));
    }

    #[test]
    fn test_parse_date_time_rejects_other_patterns() {
        assert!(Index::parse_date_time("2024-03-15 12:30:45").is_err());
        assert!(Index::parse_date_time("2024-03-15T12:30:45Z").is_err());
        assert!(Index::parse_date_time("not a timestamp").is_err());
    }

    #[test]
    fn test_cross_kind_never_equal_or_ordered() {
        let depth = Index::depth(100.0, "m");
        let time = Index::parse_date_time("2024-03-15T12:30:45.120Z").unwrap();
        assert_ne!(depth, time);
        assert_eq!(depth.partial_cmp(&time), None);
    }

    #[test]
    fn test_depth_query_value_is_numeric_string() {
        assert_eq!(Index::depth(1500.25, "ft").to_query_value(), "1500.25");
        assert_eq!(Index::depth(1500.0, "ft").to_query_value(), "1500");
    }

    #[test]
    fn test_uom_accessor() {
        assert_eq!(Index::depth(1.0, "m").uom(), Some("m"));
        assert_eq!(
            Index::parse_date_time("2024-03-15T12:30:45.120Z")
                .unwrap()
                .uom(),
            None
        );
    }
}
