use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::RwLock;

use logcascade_types::{Level, LogRecord};

/// Thread-safe ring buffer for log records
#[derive(Clone)]
pub struct RecordBuffer {
    /// Internal storage
    records: Arc<RwLock<VecDeque<LogRecord>>>,

    /// Maximum capacity
    capacity: usize,
}

impl RecordBuffer {
    /// Create a new buffer with the given capacity
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    /// Push every record of a batch, evicting the oldest at capacity
    pub fn extend(&self, batch: impl IntoIterator<Item = LogRecord>) {
        let mut records = self.records.write();
        for record in batch {
            if records.len() >= self.capacity {
                records.pop_front();
            }
            records.push_back(record);
        }
    }

    /// Record counts per level, keyed by dotted logger name
    pub fn counts_by_logger(&self) -> HashMap<String, LevelCounts> {
        let mut counts: HashMap<String, LevelCounts> = HashMap::new();
        for record in self.records.read().iter() {
            counts
                .entry(record.path().dotted())
                .or_default()
                .add(record.level());
        }
        counts
    }

    /// Total record count
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

/// Counts per log level
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LevelCounts {
    counts: [usize; Level::ALL.len()],
}

impl LevelCounts {
    pub fn add(&mut self, level: Level) {
        self.counts[level.index()] += 1;
    }

    pub fn get(&self, level: Level) -> usize {
        self.counts[level.index()]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evicts_oldest() {
        let buffer = RecordBuffer::new(2);
        buffer.extend([
            LogRecord::new("a", 10, "one"),
            LogRecord::new("b", 10, "two"),
        ]);
        buffer.extend([LogRecord::new("c", 10, "three")]);

        assert_eq!(buffer.len(), 2);
        let counts = buffer.counts_by_logger();
        assert!(!counts.contains_key("a"));
        assert_eq!(counts["b"].total(), 1);
        assert_eq!(counts["c"].total(), 1);
    }

    #[test]
    fn test_counts_by_logger() {
        let buffer = RecordBuffer::new(100);
        assert!(buffer.is_empty());
        buffer.extend([
            LogRecord::new("app.db", 30, "slow"),
            LogRecord::new("app..db", 35, "slower"),
            LogRecord::new("app", 20, "ok"),
            LogRecord::new("app", 5, "noise"),
        ]);

        let counts = buffer.counts_by_logger();
        assert_eq!(counts["app.db"].get(Level::Warning), 2);
        assert_eq!(counts["app"].get(Level::Info), 1);
        assert_eq!(counts["app"].get(Level::NotSet), 1);
        assert_eq!(counts["app"].total(), 2);
        assert_eq!(buffer.len(), 4);
    }
}
