//! Shared types for journalscope
//!
//! This crate contains data structures used across multiple journalscope crates.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// Journal Field Names
// ============================================================================

/// Wall-clock time of the entry, microseconds since the epoch
pub const FIELD_REALTIME_TIMESTAMP: &str = "__REALTIME_TIMESTAMP";
/// Host the entry originated from
pub const FIELD_HOSTNAME: &str = "_HOSTNAME";
/// Syslog identifier (usually the program name)
pub const FIELD_SYSLOG_IDENTIFIER: &str = "SYSLOG_IDENTIFIER";
/// Process ID of the logging process
pub const FIELD_PID: &str = "_PID";
/// The human-readable message
pub const FIELD_MESSAGE: &str = "MESSAGE";
/// Opaque cursor identifying the entry, usable to resume reading
pub const FIELD_CURSOR: &str = "__CURSOR";
/// systemd unit the entry belongs to
pub const FIELD_SYSTEMD_UNIT: &str = "_SYSTEMD_UNIT";

// ============================================================================
// Output Formats
// ============================================================================

/// How a journal record is rendered as a line
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormatter {
    /// Message text only
    #[default]
    Simple,
    /// `<timestamp> <host> <identifier>[<pid>]: <message>`
    Verbose,
}

// ============================================================================
// Wire Types
// ============================================================================

/// Media type requested from the gateway for the journal export format
pub const JOURNAL_EXPORT_MIME: &str = "application/vnd.fdo.journal";

/// A structural token of the journal export format
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JournalToken {
    /// One decoded field, text- or binary-encoded on the wire
    Field { name: String, value: String },
    /// Blank line terminating a record
    RecordBoundary,
}

impl JournalToken {
    pub fn field(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Field {
            name: name.into(),
            value: value.into(),
        }
    }
}

// ============================================================================
// Record Types
// ============================================================================

/// One journal entry: field name to value
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct JournalRecord {
    fields: HashMap<String, String>,
}

impl JournalRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing any earlier value with the same name
    pub fn insert(&mut self, name: String, value: String) {
        self.fields.insert(name, value);
    }

    /// Get a field value
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Get a field value, or an empty string if absent
    pub fn get_or_empty(&self, name: &str) -> &str {
        self.get(name).unwrap_or_default()
    }

    /// The `MESSAGE` field, if present
    pub fn message(&self) -> Option<&str> {
        self.get(FIELD_MESSAGE)
    }

    /// The `__CURSOR` field, if present
    pub fn cursor(&self) -> Option<&str> {
        self.get(FIELD_CURSOR)
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if no fields have been set
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for JournalRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (name, value) in iter {
            record.insert(name.into(), value.into());
        }
        record
    }
}
