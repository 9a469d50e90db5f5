//! Type-safe region identifier.
//!
//! Source tables key regions by ids that are often numeric (dissemination
//! area codes, health unit numbers). Everything downstream compares them as
//! strings, so [`RegionId`] stores the canonical string form and never the
//! parsed number.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Identifier of one geographic region, and therefore of one cell.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(transparent)]
#[ts(export, export_to = "bindings/")]
pub struct RegionId(pub String);

impl RegionId {
    /// Create an identifier from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Create an identifier from a raw table value.
    ///
    /// Surrounding whitespace is trimmed, and an integral value written in
    /// float form (`"35060001.0"`) is reduced to its integer digits so that
    /// float-coerced id columns still match their integer counterparts.
    pub fn normalized(raw: &str) -> Self {
        let trimmed = raw.trim();
        if let Some(int_part) = trimmed.strip_suffix(".0")
            && !int_part.is_empty()
            && int_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Self(int_part.to_owned());
        }
        Self(trimmed.to_owned())
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Return the inner [`String`].
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl core::fmt::Display for RegionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RegionId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for RegionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for RegionId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl core::borrow::Borrow<str> for RegionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}
