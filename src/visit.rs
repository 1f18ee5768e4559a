//! Data structures representing parsed access-log records.

use std::fmt;

/// A single successfully parsed access-log line.
///
/// A raw line like:
/// ```text
/// 127.0.0.1 - - [10/Oct/2023:13:55:36 +0000] "GET /index.html HTTP/1.1" 200 512
/// ```
///
/// Would be parsed into a `ParsedVisit` with:
/// - `client_address`: "127.0.0.1"
/// - `hour`: 13
/// - `path`: "/index.html"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedVisit {
    /// The client address exactly as it appears in the log (not validated).
    pub client_address: String,

    /// Hour-of-day bucket of the request, 0 through 23.
    pub hour: u8,

    /// URL path of the requested resource, query string stripped.
    pub path: String,
}

impl ParsedVisit {
    pub fn new(client_address: impl Into<String>, hour: u8, path: impl Into<String>) -> Self {
        Self {
            client_address: client_address.into(),
            hour,
            path: path.into(),
        }
    }
}

impl fmt::Display for ParsedVisit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:02}:00 {}", self.client_address, self.hour, self.path)
    }
}
