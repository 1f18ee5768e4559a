//! weblog-stats - Offline traffic statistics for web server access logs.
//!
//! This crate provides:
//! - A permissive parser for space-delimited access-log lines
//! - A single-owner aggregator counting visits by page, hour and location
//! - A text and JSON reporter over the aggregated counters
//!
//! # Example
//!
//! ```rust
//! use weblog_stats::{parser::parse_line, report::{Report, ReportOptions}, stats::TrafficAggregator};
//!
//! let line = r#"192.168.0.7 - - [10/Oct/2023:13:55:36 +0000] "GET /index.html HTTP/1.1" 200 512"#;
//! let visit = parse_line(line).expect("Failed to parse line");
//!
//! let mut aggregator = TrafficAggregator::new();
//! aggregator.ingest(visit);
//!
//! println!("{}", Report::new(aggregator.snapshot(), ReportOptions::default()));
//! ```

pub mod analyzer;
pub mod config;
pub mod parser;
pub mod report;
pub mod stats;
pub mod visit;

pub use analyzer::{analyze, process_line};
pub use config::Config;
pub use parser::{HourSource, ParseError, parse_line, parse_line_with};
pub use report::{OutputFormat, Report, ReportOptions};
pub use stats::{HourOrder, TrafficAggregator, TrafficStats, classify};
pub use visit::ParsedVisit;
