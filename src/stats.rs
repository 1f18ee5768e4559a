//! Traffic aggregation for parsed access-log visits.
//!
//! The [`TrafficAggregator`] owns every running counter and is the only thing
//! that mutates them. Reporting code reads the counters through the
//! [`TrafficStats`] snapshot.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use crate::visit::ParsedVisit;

/// Geo bucket for private IPv4 ranges.
pub const LOCAL_NETWORK: &str = "Local Network";

/// Geo bucket for everything else.
pub const UNKNOWN_LOCATION: &str = "Unknown";

/// Classify a client address into a coarse geo bucket.
///
/// This is a stand-in and performs no lookup. Addresses starting with `::`
/// are always `Unknown`; that check runs before the private-range prefixes.
pub fn classify(address: &str) -> &'static str {
    if address.starts_with("::") {
        return UNKNOWN_LOCATION;
    }
    if address.starts_with("192.168.") || address.starts_with("10.") {
        LOCAL_NETWORK
    } else {
        UNKNOWN_LOCATION
    }
}

/// Order in which hour buckets are listed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum HourOrder {
    /// The order in which each hour was first seen in the log.
    #[default]
    FirstSeen,
    /// Ascending hour, 0 through 23.
    Numeric,
}

/// Counter keyed by `K` that remembers the order keys were first seen.
#[derive(Debug, Clone)]
pub struct CountMap<K> {
    index: HashMap<K, usize>,
    entries: Vec<(K, u64)>,
}

impl<K: Eq + Hash + Clone> CountMap<K> {
    pub fn new() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }

    /// Add one to the count for `key`, creating it at zero first.
    pub fn increment(&mut self, key: K) {
        match self.index.get(&key) {
            Some(&i) => self.entries[i].1 += 1,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, 1));
            }
        }
    }

    /// Count for `key`, zero if never seen.
    pub fn get<Q>(&self, key: &Q) -> u64
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.get(key).map_or(0, |&i| self.entries[i].1)
    }

    /// Entries in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, u64)> {
        self.entries.iter().map(|(k, v)| (k, *v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of every count.
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, v)| v).sum()
    }
}

impl<K: Eq + Hash + Clone> Default for CountMap<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Accumulated traffic counters.
#[derive(Debug, Clone, Default)]
pub struct TrafficStats {
    total_visits: u64,
    unique_visitors: HashSet<String>,
    page_visits: CountMap<String>,
    hourly_visits: CountMap<u8>,
    geo_visits: CountMap<&'static str>,
    skipped_lines: u64,
}

impl TrafficStats {
    /// Number of successfully parsed lines.
    pub fn total_visits(&self) -> u64 {
        self.total_visits
    }

    /// Number of distinct client addresses.
    pub fn unique_visitors(&self) -> usize {
        self.unique_visitors.len()
    }

    /// Whether `address` has been seen at least once.
    #[cfg(test)]
    pub(crate) fn has_visitor(&self, address: &str) -> bool {
        self.unique_visitors.contains(address)
    }

    /// Visits recorded for a single path.
    pub fn page_visits(&self, path: &str) -> u64 {
        self.page_visits.get(path)
    }

    /// Visits recorded for a single hour bucket.
    pub fn hour_visits(&self, hour: u8) -> u64 {
        self.hourly_visits.get(&hour)
    }

    /// Visits recorded for a single geo bucket.
    pub fn location_visits(&self, bucket: &str) -> u64 {
        self.geo_visits.get(bucket)
    }

    /// Pages ranked by visit count, highest first.
    ///
    /// Pages with equal counts are ordered by path so the ranking is stable.
    pub fn top_pages(&self) -> Vec<(&str, u64)> {
        let mut pages: Vec<_> = self
            .page_visits
            .iter()
            .map(|(path, count)| (path.as_str(), count))
            .collect();
        pages.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        pages
    }

    /// Hour buckets with their visit counts.
    pub fn hourly_trend(&self, order: HourOrder) -> Vec<(u8, u64)> {
        let mut hours: Vec<_> = self.hourly_visits.iter().map(|(h, c)| (*h, c)).collect();
        if order == HourOrder::Numeric {
            hours.sort_by_key(|(hour, _)| *hour);
        }
        hours
    }

    /// Geo buckets in first-seen order.
    pub fn locations(&self) -> Vec<(&'static str, u64)> {
        self.geo_visits.iter().map(|(g, c)| (*g, c)).collect()
    }

    /// Number of lines that were rejected by the parser.
    pub fn skipped_lines(&self) -> u64 {
        self.skipped_lines
    }

    /// Sums of the page, hourly and geo breakdowns, in that order.
    pub(crate) fn breakdown_totals(&self) -> (u64, u64, u64) {
        (
            self.page_visits.total(),
            self.hourly_visits.total(),
            self.geo_visits.total(),
        )
    }
}

/// Single-owner aggregator over parsed visits.
#[derive(Debug, Default)]
pub struct TrafficAggregator {
    stats: TrafficStats,
}

impl TrafficAggregator {
    /// Create an aggregator with every counter empty.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one successfully parsed visit.
    pub fn ingest(&mut self, visit: ParsedVisit) {
        let stats = &mut self.stats;
        let geo = classify(&visit.client_address);

        stats.total_visits += 1;
        stats.page_visits.increment(visit.path);
        stats.hourly_visits.increment(visit.hour);
        stats.geo_visits.increment(geo);
        stats.unique_visitors.insert(visit.client_address);
    }

    /// Record a line the parser rejected.
    pub fn record_skipped(&mut self) {
        self.stats.skipped_lines += 1;
    }

    /// Read-only view of the current counters.
    pub fn snapshot(&self) -> &TrafficStats {
        &self.stats
    }

    /// Consume the aggregator and return its final counters.
    pub fn into_stats(self) -> TrafficStats {
        self.stats
    }
}

/// Serializable view of a [`TrafficStats`] snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSummary {
    pub total_visits: u64,
    pub unique_visitors: usize,
    pub skipped_lines: u64,
    pub top_pages: Vec<PageCount>,
    pub hourly_trend: Vec<HourCount>,
    pub locations: Vec<LocationCount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageCount {
    pub path: String,
    pub visits: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HourCount {
    pub hour: u8,
    pub visits: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LocationCount {
    pub location: String,
    pub visits: u64,
}

impl TrafficStats {
    /// Build a serializable summary, keeping at most `top_pages` pages.
    pub fn summary(&self, order: HourOrder, top_pages: Option<usize>) -> StatsSummary {
        let mut pages = self.top_pages();
        if let Some(limit) = top_pages {
            pages.truncate(limit);
        }

        StatsSummary {
            total_visits: self.total_visits,
            unique_visitors: self.unique_visitors(),
            skipped_lines: self.skipped_lines,
            top_pages: pages
                .into_iter()
                .map(|(path, visits)| PageCount {
                    path: path.to_string(),
                    visits,
                })
                .collect(),
            hourly_trend: self
                .hourly_trend(order)
                .into_iter()
                .map(|(hour, visits)| HourCount { hour, visits })
                .collect(),
            locations: self
                .locations()
                .into_iter()
                .map(|(location, visits)| LocationCount {
                    location: location.to_string(),
                    visits,
                })
                .collect(),
        }
    }
}
