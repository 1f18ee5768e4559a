//! Line-by-line driver feeding the parser into the aggregator.

use tracing::{debug, info, trace};

use crate::parser::{HourSource, parse_line_with};
use crate::stats::TrafficAggregator;

/// Process a single log line.
///
/// Lines the parser rejects are counted as skipped and otherwise ignored.
/// Returns `true` if the line was counted as a visit.
pub fn process_line(line: &str, aggregator: &mut TrafficAggregator, source: HourSource) -> bool {
    match parse_line_with(line, source) {
        Ok(visit) => {
            trace!("Counted visit {}", visit);
            aggregator.ingest(visit);
            true
        }
        Err(e) => {
            aggregator.record_skipped();
            debug!("Skipping line '{}': {}", line, e);
            false
        }
    }
}

/// Analyze the full contents of a log file.
pub fn analyze(content: &str, source: HourSource) -> TrafficAggregator {
    let mut aggregator = TrafficAggregator::new();

    for line in content.lines() {
        process_line(line, &mut aggregator, source);
    }

    let stats = aggregator.snapshot();
    let total = stats.total_visits();
    debug_assert_eq!(stats.breakdown_totals(), (total, total, total));
    info!(
        "Analyzed {} visits, skipped {} malformed lines",
        stats.total_visits(),
        stats.skipped_lines()
    );

    aggregator
}
