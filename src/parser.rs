//! Parser for space-delimited web server access-log lines.
//!
//! Lines are split on single spaces and only three positional fields are
//! interpreted; everything else on the line is ignored. The parser is
//! intentionally permissive so that the usual variability of access logs does
//! not abort an analysis run.
//!
//! # Line Format
//!
//! ```text
//! ADDR IDENT USER [DD/Mon/YYYY:HH:MM:SS ±HHMM] "METHOD TARGET PROTO" STATUS BYTES
//! ```
//!
//! Example:
//! ```text
//! 127.0.0.1 - - [10/Oct/2023:13:55:36 +0000] "GET /index.html HTTP/1.1" 200 512
//! ```
//!
//! Field 0 is the client address, field 3 the timestamp (with its leading
//! bracket), field 4 the zone offset and field 6 the request target.

use chrono::{FixedOffset, NaiveDateTime, TimeZone, Timelike};
use nom::{
    IResult, Parser,
    bytes::complete::{take_till1, take_while_m_n},
    character::complete::{char, one_of},
    combinator::{all_consuming, map_res, opt},
    sequence::{delimited, terminated},
};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::visit::ParsedVisit;

/// Minimum number of space-delimited fields a line must have.
pub const MIN_FIELDS: usize = 7;

const ADDRESS_FIELD: usize = 0;
const TIMESTAMP_FIELD: usize = 3;
const OFFSET_FIELD: usize = 4;
const TARGET_FIELD: usize = 6;

/// `strftime`-style layout of the bracketed timestamp.
const TIMESTAMP_FORMAT: &str = "%d/%b/%Y:%H:%M:%S";

/// Errors that can occur while parsing a log line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Too few fields: expected at least 7, found {found}")]
    TooFewFields { found: usize },

    #[error("Missing client address")]
    MissingClientAddress,

    #[error("Malformed timestamp: {0}")]
    MalformedTimestamp(String),

    #[error("Malformed request target: {0}")]
    MalformedRequestTarget(String),
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// How the hour bucket is derived from a line's timestamp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HourSource {
    /// The wall-clock hour as written in the log, ignoring the zone offset.
    #[default]
    LogWallClock,
    /// The hour in UTC, after applying the line's own `±HHMM` offset.
    Utc,
}

/// Parse the bracketed timestamp field, e.g. `[10/Oct/2023:13:55:36`.
///
/// Both brackets are optional so that a field like `[10/Oct/2023:13:55:36]`
/// (no offset) is accepted too.
fn parse_timestamp(input: &str) -> IResult<&str, NaiveDateTime> {
    map_res(
        delimited(
            opt(char('[')),
            take_till1(|c: char| c == ']'),
            opt(char(']')),
        ),
        |s: &str| NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT),
    )
    .parse(input)
}

/// Parse a zone offset field like `+0000]` or `-0730`.
fn parse_offset(input: &str) -> IResult<&str, FixedOffset> {
    map_res(
        terminated(
            (
                one_of("+-"),
                take_while_m_n(4, 4, |c: char| c.is_ascii_digit()),
            ),
            opt(char(']')),
        ),
        |(sign, digits): (char, &str)| {
            let hours: i32 = digits[0..2].parse().map_err(|_| "Invalid offset hours")?;
            let minutes: i32 = digits[2..4].parse().map_err(|_| "Invalid offset minutes")?;
            let seconds = (hours * 3600 + minutes * 60) * if sign == '-' { -1 } else { 1 };
            FixedOffset::east_opt(seconds).ok_or("Offset out of range")
        },
    )
    .parse(input)
}

/// Build the synthetic base URL used to resolve a request target.
///
/// The address is used as the authority verbatim, so `host:port` forms work.
/// Bare IPv6 literals like `::1` are not valid authorities and are retried in
/// brackets.
fn base_url(client_address: &str) -> Result<Url, url::ParseError> {
    Url::parse(&format!("http://{}", client_address)).or_else(|e| {
        if client_address.contains(':') && !client_address.starts_with('[') {
            Url::parse(&format!("http://[{}]", client_address))
        } else {
            Err(e)
        }
    })
}

/// Resolve a request target against the client's synthetic base and return
/// its path, with the query string and fragment dropped.
fn resolve_path(client_address: &str, target: &str) -> ParseResult<String> {
    let url = base_url(client_address)
        .and_then(|base| base.join(target))
        .map_err(|e| ParseError::MalformedRequestTarget(format!("{}: {}", target, e)))?;
    Ok(url.path().to_string())
}

/// Extract the hour bucket from the timestamp (and, for UTC, offset) fields.
fn parse_hour(timestamp: &str, offset: &str, source: HourSource) -> ParseResult<u8> {
    let (_, datetime) = all_consuming(parse_timestamp)
        .parse(timestamp)
        .map_err(|_| ParseError::MalformedTimestamp(timestamp.to_string()))?;

    let hour = match source {
        HourSource::LogWallClock => datetime.hour(),
        HourSource::Utc => {
            let (_, offset) = all_consuming(parse_offset)
                .parse(offset)
                .map_err(|_| ParseError::MalformedTimestamp(format!("bad offset {}", offset)))?;
            offset
                .from_local_datetime(&datetime)
                .single()
                .ok_or_else(|| ParseError::MalformedTimestamp(timestamp.to_string()))?
                .naive_utc()
                .hour()
        }
    };

    Ok(hour as u8)
}

/// Parse a log line, taking the hour as written in the log.
///
/// # Example
///
/// ```
/// use weblog_stats::parser::parse_line;
///
/// let line = r#"127.0.0.1 - - [10/Oct/2023:13:55:36 +0000] "GET /index.html HTTP/1.1" 200 512"#;
/// let visit = parse_line(line).unwrap();
/// assert_eq!(visit.client_address, "127.0.0.1");
/// assert_eq!(visit.hour, 13);
/// assert_eq!(visit.path, "/index.html");
/// ```
pub fn parse_line(line: &str) -> ParseResult<ParsedVisit> {
    parse_line_with(line, HourSource::default())
}

/// Parse a log line using the given hour interpretation.
pub fn parse_line_with(line: &str, source: HourSource) -> ParseResult<ParsedVisit> {
    let fields: Vec<&str> = line.split(' ').collect();
    if fields.len() < MIN_FIELDS {
        return Err(ParseError::TooFewFields {
            found: fields.len(),
        });
    }

    let client_address = fields[ADDRESS_FIELD];
    if client_address.is_empty() {
        return Err(ParseError::MissingClientAddress);
    }

    let hour = parse_hour(fields[TIMESTAMP_FIELD], fields[OFFSET_FIELD], source)?;
    let path = resolve_path(client_address, fields[TARGET_FIELD])?;

    Ok(ParsedVisit {
        client_address: client_address.to_string(),
        hour,
        path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str =
        r#"127.0.0.1 - - [10/Oct/2023:13:55:36 +0000] "GET /index.html HTTP/1.1" 200 512"#;

    #[test]
    fn test_parse_basic_line() {
        let visit = parse_line(SAMPLE).expect("Should parse successfully");

        assert_eq!(visit.client_address, "127.0.0.1");
        assert_eq!(visit.hour, 13);
        assert_eq!(visit.path, "/index.html");
    }

    #[test]
    fn test_query_string_stripped() {
        let line = r#"10.0.0.1 - - [10/Oct/2023:08:00:00 +0000] "GET /search?q=rust&page=2 HTTP/1.1" 200 10"#;
        let visit = parse_line(line).expect("Should parse");
        assert_eq!(visit.path, "/search");
    }

    #[test]
    fn test_fragment_stripped_and_dot_segments_resolved() {
        let line = r#"10.0.0.1 - - [10/Oct/2023:08:00:00 +0000] "GET /a/../b/./c#top HTTP/1.1" 200 10"#;
        let visit = parse_line(line).expect("Should parse");
        assert_eq!(visit.path, "/b/c");
    }

    #[test]
    fn test_absolute_target_keeps_only_path() {
        let line = r#"10.0.0.1 - - [10/Oct/2023:08:00:00 +0000] "GET http://example.com/x?y=1 HTTP/1.1" 200 10"#;
        let visit = parse_line(line).expect("Should parse");
        assert_eq!(visit.path, "/x");
    }

    #[test]
    fn test_relative_target_resolves_against_root() {
        let line = r#"10.0.0.1 - - [10/Oct/2023:08:00:00 +0000] "GET about.html HTTP/1.1" 200 10"#;
        let visit = parse_line(line).expect("Should parse");
        assert_eq!(visit.path, "/about.html");
    }

    #[test]
    fn test_client_address_with_port() {
        for addr in ["1.2.3.4:8080", "myhost:8080"] {
            let line = format!(
                r#"{} - - [10/Oct/2023:13:55:36 +0000] "GET /index.html HTTP/1.1" 200 512"#,
                addr
            );
            let visit = parse_line(&line).unwrap_or_else(|e| panic!("Should parse {}: {}", addr, e));
            assert_eq!(visit.client_address, addr);
            assert_eq!(visit.path, "/index.html");
        }
    }

    #[test]
    fn test_bracketed_and_full_ipv6_addresses() {
        for addr in ["[::1]", "2001:db8::1", "fe80::1"] {
            let line = format!(
                r#"{} - - [10/Oct/2023:13:55:36 +0000] "GET /v6?x=1 HTTP/1.1" 200 512"#,
                addr
            );
            let visit = parse_line(&line).unwrap_or_else(|e| panic!("Should parse {}: {}", addr, e));
            assert_eq!(visit.client_address, addr);
            assert_eq!(visit.path, "/v6");
        }
    }

    #[test]
    fn test_ipv6_client_address() {
        let line = r#"::1 - - [10/Oct/2023:23:01:02 +0000] "GET /v6 HTTP/1.1" 200 10"#;
        let visit = parse_line(line).expect("Should parse IPv6 address");
        assert_eq!(visit.client_address, "::1");
        assert_eq!(visit.hour, 23);
        assert_eq!(visit.path, "/v6");
    }

    #[test]
    fn test_too_few_fields() {
        assert_eq!(
            parse_line("1.2.3.4 - -"),
            Err(ParseError::TooFewFields { found: 3 })
        );
        assert_eq!(parse_line(""), Err(ParseError::TooFewFields { found: 1 }));
    }

    #[test]
    fn test_missing_client_address() {
        let line = r#" 127.0.0.1 - [10/Oct/2023:13:55:36 +0000] "GET /index.html HTTP/1.1" 200 512"#;
        assert_eq!(parse_line(line), Err(ParseError::MissingClientAddress));
    }

    #[test]
    fn test_malformed_timestamp() {
        let line = r#"127.0.0.1 - - [yesterday +0000] "GET /index.html HTTP/1.1" 200 512"#;
        assert!(matches!(
            parse_line(line),
            Err(ParseError::MalformedTimestamp(_))
        ));

        let line = r#"127.0.0.1 - - [10/Oct/2023:25:00:00 +0000] "GET /index.html HTTP/1.1" 200 512"#;
        assert!(matches!(
            parse_line(line),
            Err(ParseError::MalformedTimestamp(_))
        ));
    }

    #[test]
    fn test_double_space_shifts_fields() {
        // An extra space moves the timestamp out of field 3.
        let line = r#"127.0.0.1 -  - [10/Oct/2023:13:55:36 +0000] "GET /index.html HTTP/1.1" 200 512"#;
        assert!(matches!(
            parse_line(line),
            Err(ParseError::MalformedTimestamp(_))
        ));
    }

    #[test]
    fn test_malformed_request_target() {
        // Not a valid IPv4 literal, so the synthetic base cannot be built.
        let line = r#"999.1.1.1 - - [10/Oct/2023:13:55:36 +0000] "GET /index.html HTTP/1.1" 200 512"#;
        assert!(matches!(
            parse_line(line),
            Err(ParseError::MalformedRequestTarget(_))
        ));

        let line = r#"1.2.3.4 - - [10/Oct/2023:13:55:36 +0000] "GET http://[bad HTTP/1.1" 200 512"#;
        assert!(matches!(
            parse_line(line),
            Err(ParseError::MalformedRequestTarget(_))
        ));
    }

    #[test]
    fn test_utc_hour_applies_offset() {
        let line = r#"1.2.3.4 - - [10/Oct/2023:01:30:00 +0200] "GET / HTTP/1.1" 200 1"#;
        assert_eq!(parse_line(line).unwrap().hour, 1);
        assert_eq!(parse_line_with(line, HourSource::Utc).unwrap().hour, 23);

        let line = r#"1.2.3.4 - - [10/Oct/2023:22:15:00 -0330] "GET / HTTP/1.1" 200 1"#;
        assert_eq!(parse_line_with(line, HourSource::Utc).unwrap().hour, 1);
    }

    #[test]
    fn test_utc_hour_requires_offset() {
        let line = r#"1.2.3.4 - - [10/Oct/2023:01:30:00 UTC] "GET / HTTP/1.1" 200 1"#;
        assert!(parse_line(line).is_ok());
        assert!(matches!(
            parse_line_with(line, HourSource::Utc),
            Err(ParseError::MalformedTimestamp(_))
        ));
    }

    #[test]
    fn test_parse_offset() {
        let (_, offset) = parse_offset("+0000]").unwrap();
        assert_eq!(offset.local_minus_utc(), 0);
        let (_, offset) = parse_offset("-0730").unwrap();
        assert_eq!(offset.local_minus_utc(), -(7 * 3600 + 30 * 60));
        assert!(parse_offset("0000").is_err());
    }

    #[test]
    fn test_midnight_hour() {
        let line = r#"1.2.3.4 - - [01/Jan/2024:00:00:00 +0000] "GET / HTTP/1.1" 200 1"#;
        let visit = parse_line(line).expect("Should parse midnight");
        assert_eq!(visit.hour, 0);
        assert_eq!(visit.path, "/");
    }
}
