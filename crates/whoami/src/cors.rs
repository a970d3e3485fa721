//! Origin allow-list for cross-origin browser calls.

use std::fmt;

/// Ordered list of exact origins allowed to call the service.
///
/// Built once at startup and shared read-only by every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedOrigins(Vec<String>);

impl AllowedOrigins {
    /// Parse a comma-separated list, trimming whitespace around each entry.
    ///
    /// Order is preserved; empty entries are kept so that validation can
    /// reject them.
    pub fn parse(raw: &str) -> Self {
        Self(raw.split(',').map(|o| o.trim().to_owned()).collect())
    }

    /// The configured entry equal to `origin`, if any.
    pub fn matching(&self, origin: &str) -> Option<&str> {
        self.0.iter().map(String::as_str).find(|o| *o == origin)
    }

    /// Entries in configuration order.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Returns `true` if any entry is empty after trimming.
    pub fn has_empty_entry(&self) -> bool {
        self.0.iter().any(String::is_empty)
    }
}

impl fmt::Display for AllowedOrigins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_slice().join(","))
    }
}
