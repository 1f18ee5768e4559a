//! Rendering of traffic statistics for the terminal.

use serde::Deserialize;
use std::fmt;

use crate::stats::{HourOrder, TrafficStats};

/// Output format of the final report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Plain text listing.
    #[default]
    Text,
    /// Pretty-printed JSON document.
    Json,
}

/// Options controlling how a report is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportOptions {
    pub hour_order: HourOrder,
    /// Maximum number of pages listed; `None` lists every page.
    pub top_pages: Option<usize>,
}

/// Text report over a statistics snapshot.
///
/// ```text
/// Total Visits: 3
/// Unique Visitors: 2
/// Top Pages:
///   /a: 2 visits
///   /b: 1 visits
/// Hourly Trend:
///   13:00 - 3 visits
/// Visitor Locations:
///   Local Network: 3 visits
/// ```
pub struct Report<'a> {
    stats: &'a TrafficStats,
    options: ReportOptions,
}

impl<'a> Report<'a> {
    pub fn new(stats: &'a TrafficStats, options: ReportOptions) -> Self {
        Self { stats, options }
    }

    /// Render the report as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        let summary = self
            .stats
            .summary(self.options.hour_order, self.options.top_pages);
        serde_json::to_string_pretty(&summary)
    }

    /// Render in the requested format.
    pub fn render(&self, format: OutputFormat) -> serde_json::Result<String> {
        match format {
            OutputFormat::Text => Ok(self.to_string()),
            OutputFormat::Json => self.to_json(),
        }
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total Visits: {}", self.stats.total_visits())?;
        writeln!(f, "Unique Visitors: {}", self.stats.unique_visitors())?;

        writeln!(f, "Top Pages:")?;
        let limit = self.options.top_pages.unwrap_or(usize::MAX);
        for (page, visits) in self.stats.top_pages().into_iter().take(limit) {
            writeln!(f, "  {}: {} visits", page, visits)?;
        }

        writeln!(f, "Hourly Trend:")?;
        for (hour, visits) in self.stats.hourly_trend(self.options.hour_order) {
            writeln!(f, "  {}:00 - {} visits", hour, visits)?;
        }

        writeln!(f, "Visitor Locations:")?;
        for (location, visits) in self.stats.locations() {
            writeln!(f, "  {}: {} visits", location, visits)?;
        }

        Ok(())
    }
}
