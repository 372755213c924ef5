//! Parse and report configuration

use serde::{Deserialize, Serialize};

/// Record number NTFS reserves for the volume's root directory
pub const NTFS_ROOT_RECORD: u64 = 5;

/// Default timestamp layout, locale-style date then time
pub const DEFAULT_DATE_FORMAT: &str = "%x - %X";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseConfig {
    /// Id of the entry that becomes the tree root
    pub root_id: u64,
    /// Check once at load time that ids are strictly ascending
    pub verify_order: bool,
    /// chrono format string for the modified time column
    pub date_format: String,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            root_id: NTFS_ROOT_RECORD,
            verify_order: true,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

impl ParseConfig {
    pub fn with_root_id(mut self, root_id: u64) -> Self {
        self.root_id = root_id;
        self
    }

    pub fn with_verify_order(mut self, verify: bool) -> Self {
        self.verify_order = verify;
        self
    }

    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }
}

/// Output layout for the rendered tree
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    /// Tab-indented text, one line per entry
    #[default]
    Text,
    /// Nested JSON document
    Json,
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportFormat::Text => write!(f, "text"),
            ReportFormat::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            other => Err(format!("unknown report format: {}", other)),
        }
    }
}
