//! Bounded in-process record of recent tool invocations, for diagnostics
//! only — never forwarded to a client. Grounded on the teacher's
//! `ToolCallTracker` in `tools::registry`.

use crate::outcome::ToolStatus;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;

const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct ToolCallRecord {
    pub tool_name: String,
    pub user_id: String,
    pub status: ToolStatus,
    pub duration: Duration,
    pub at: DateTime<Utc>,
}

pub struct ToolCallTracker {
    capacity: usize,
    records: Mutex<VecDeque<ToolCallRecord>>,
}

impl ToolCallTracker {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            records: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn record(&self, tool_name: &str, user_id: &str, status: ToolStatus, duration: Duration) {
        let mut records = self.records.lock();
        if records.len() == self.capacity {
            records.pop_front();
        }
        records.push_back(ToolCallRecord {
            tool_name: tool_name.to_string(),
            user_id: user_id.to_string(),
            status,
            duration,
            at: Utc::now(),
        });
    }

    pub fn recent(&self, n: usize) -> Vec<ToolCallRecord> {
        let records = self.records.lock();
        records.iter().rev().take(n).cloned().collect()
    }
}

impl Default for ToolCallTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracker_evicts_oldest_past_capacity() {
        let tracker = ToolCallTracker::with_capacity(2);
        tracker.record("a", "u1", ToolStatus::Success, Duration::from_millis(1));
        tracker.record("b", "u1", ToolStatus::Success, Duration::from_millis(1));
        tracker.record("c", "u1", ToolStatus::Success, Duration::from_millis(1));

        let recent = tracker.recent(10);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].tool_name, "c");
        assert_eq!(recent[1].tool_name, "b");
    }
}
