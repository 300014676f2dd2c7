//! STEP physical file output for IFC documents.
//!
//! Serialization is infallible and deterministic: entities are numbered
//! `#1..#N` in store order on every call, so writing the same document twice
//! with a fixed timestamp yields identical text.

mod step;

pub use step::{escape_step_string, format_real, to_step};

use chrono::{DateTime, Utc};

/// Options for writing a document.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SerializeOptions {
    /// `FILE_DESCRIPTION` text.
    pub description: String,
    pub author: String,
    pub application_name: String,
    pub application_version: String,
    /// Header timestamp; the current time when unset.
    pub timestamp: Option<DateTime<Utc>>,
}

impl SerializeOptions {
    /// Organization written when the document has no project owner history.
    pub const DEFAULT_ORGANIZATION: &'static str = "Unknown Organization";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn application(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.application_name = name.into();
        self.application_version = version.into();
        self
    }

    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            description: "ViewDefinition [CoordinationView]".to_string(),
            author: String::new(),
            application_name: env!("CARGO_PKG_NAME").to_string(),
            application_version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: None,
        }
    }
}
