use chrono::{DateTime, TimeDelta, Timelike, Utc};
use clap::ValueEnum;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::io::BufRead;
use tracing::{debug, info};

use crate::error::LognormResult;
use crate::models::{LogLevel, LogRecord};
use crate::parsers::{GenericParser, JsonParser};
use crate::patterns::ErrorKeywords;
use crate::pipeline::decode_line;

/// Service name used when a record names neither `service` nor `logger`
pub const UNKNOWN_SERVICE: &str = "unknown";

/// Counter that remembers the order in which keys were first seen
#[derive(Debug, Clone)]
pub struct FrequencyTable<K> {
    entries: Vec<(K, usize)>,
    index: HashMap<K, usize>,
}

impl<K> Default for FrequencyTable<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Clone> FrequencyTable<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, key: K) {
        match self.index.get(&key) {
            Some(&slot) => self.entries[slot].1 += 1,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, 1));
            }
        }
    }

    pub fn get(&self, key: &K) -> usize {
        self.index.get(key).map_or(0, |&slot| self.entries[slot].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, count)| count).sum()
    }

    /// Entries in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&K, usize)> {
        self.entries.iter().map(|(key, count)| (key, *count))
    }

    /// Highest counts first; equal counts keep first-seen order
    pub fn most_common(&self, limit: Option<usize>) -> Vec<(&K, usize)> {
        let mut ranked: Vec<(&K, usize)> = self.iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        if let Some(limit) = limit {
            ranked.truncate(limit);
        }
        ranked
    }
}

impl<K: Eq + Hash + Clone + fmt::Display> Serialize for FrequencyTable<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let ranked = self.most_common(None);
        let mut map = serializer.serialize_map(Some(ranked.len()))?;
        for (key, count) in ranked {
            map.serialize_entry(&key.to_string(), &count)?;
        }
        map.end()
    }
}

/// How the lines of an analyzed stream are read
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RecordSource {
    /// One JSON record per line; other lines are counted but not analyzed
    #[default]
    Json,
    /// Free text through the generic parser
    Text,
}

impl fmt::Display for RecordSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordSource::Json => write!(f, "json"),
            RecordSource::Text => write!(f, "text"),
        }
    }
}

/// Counters accumulated over one analysis run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunStatistics {
    pub total_lines: usize,
    pub valid_entries: usize,
    pub error_count: usize,
    pub levels: FrequencyTable<LogLevel>,
    /// Records per UTC hour of day
    pub hourly: [usize; 24],
    /// Error events by event text
    pub top_errors: FrequencyTable<String>,
    pub services: FrequencyTable<String>,
    pub first_timestamp: Option<DateTime<Utc>>,
    pub last_timestamp: Option<DateTime<Utc>>,
}

impl RunStatistics {
    /// Errors as a percentage of valid entries
    pub fn error_rate(&self) -> Option<f64> {
        if self.valid_entries == 0 {
            None
        } else {
            Some(self.error_count as f64 / self.valid_entries as f64 * 100.0)
        }
    }

    /// Span between the earliest and latest timestamp seen
    pub fn duration(&self) -> Option<TimeDelta> {
        Some(self.last_timestamp? - self.first_timestamp?)
    }

    /// Share of valid entries, as a percentage
    pub fn share(&self, count: usize) -> f64 {
        if self.valid_entries == 0 {
            0.0
        } else {
            count as f64 / self.valid_entries as f64 * 100.0
        }
    }
}

/// Single-pass fold of a record stream into [`RunStatistics`]
#[derive(Debug, Clone, Default)]
pub struct StatsAggregator {
    source: RecordSource,
    json: JsonParser,
    generic: GenericParser,
    stats: RunStatistics,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(source: RecordSource) -> Self {
        Self {
            source,
            ..Self::default()
        }
    }

    /// Year for year-less syslog stamps in text sources
    pub fn with_reference_year(mut self, year: Option<i32>) -> Self {
        self.generic = GenericParser::with_reference_year(year);
        self
    }

    /// Count one raw line and fold it when it decodes. Blank lines are ignored.
    pub fn observe_line(&mut self, line: &str) {
        if line.trim().is_empty() {
            return;
        }
        self.stats.total_lines += 1;

        match self.source {
            RecordSource::Json => match self.json.decode(line) {
                Ok(record) => self.observe_record(&record),
                Err(err) => debug!(line = self.stats.total_lines, "excluded from analysis: {}", err),
            },
            RecordSource::Text => {
                let record = self.generic.parse_at(line, None);
                self.observe_record(&record);
            }
        }
    }

    /// Fold a decoded record; does not touch the line count
    pub fn observe_record(&mut self, record: &LogRecord) {
        let stats = &mut self.stats;
        stats.valid_entries += 1;
        stats.levels.increment(record.level);

        if record.level.is_error() || ErrorKeywords::matches(&record.event) {
            stats.error_count += 1;
            stats.top_errors.increment(record.event.clone());
        }

        if let Some(ts) = record.timestamp {
            stats.hourly[ts.hour() as usize] += 1;
            if stats.first_timestamp.map_or(true, |first| ts < first) {
                stats.first_timestamp = Some(ts);
            }
            if stats.last_timestamp.map_or(true, |last| ts > last) {
                stats.last_timestamp = Some(ts);
            }
        }

        let service = record
            .field_display("service")
            .or_else(|| record.field_display("logger"))
            .unwrap_or_else(|| UNKNOWN_SERVICE.to_string());
        stats.services.increment(service);
    }

    pub fn run<R: BufRead>(&mut self, reader: R) -> LognormResult<()> {
        for chunk in reader.split(b'\n') {
            let bytes = chunk?;
            self.observe_line(&decode_line(&bytes));
        }
        info!(
            total = self.stats.total_lines,
            valid = self.stats.valid_entries,
            errors = self.stats.error_count,
            "analysis pass finished"
        );
        Ok(())
    }

    pub fn statistics(&self) -> &RunStatistics {
        &self.stats
    }

    pub fn finish(self) -> RunStatistics {
        self.stats
    }
}
