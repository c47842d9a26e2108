//! Duplicate suppression for detections merged from overlapping scans.
//!
//! A detection is keyed by `(category, subject, bucket)`, where the bucket is
//! the detection time divided into windows of `window_days`. Two detections
//! of the same category and subject closer than the window are the same
//! event; only neighbouring buckets need to be inspected to find them.

use std::collections::HashMap;

use orrery_time::TimePoint;

/// Identity of a detection for duplicate suppression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    /// Event kind, e.g. an aspect name.
    pub category: String,
    /// The pair or body the event belongs to.
    pub subject: String,
    /// `floor(jd / window_days)`.
    pub bucket: i64,
}

/// Record of admitted detections.
#[derive(Debug, Clone)]
pub struct DedupLedger {
    window_days: f64,
    seen: HashMap<DedupKey, Vec<TimePoint>>,
    admitted: usize,
}

impl DedupLedger {
    /// A ledger treating detections closer than `window_days` as duplicates.
    ///
    /// Non-positive or non-finite windows disable suppression.
    pub fn new(window_days: f64) -> Self {
        Self {
            window_days,
            seen: HashMap::new(),
            admitted: 0,
        }
    }

    pub fn window_days(&self) -> f64 {
        self.window_days
    }

    fn bucket(&self, time: TimePoint) -> i64 {
        (time.jd() / self.window_days).floor() as i64
    }

    /// Key under which `time` would be recorded.
    pub fn key(&self, category: &str, subject: &str, time: TimePoint) -> DedupKey {
        DedupKey {
            category: category.to_owned(),
            subject: subject.to_owned(),
            bucket: self.bucket(time),
        }
    }

    /// Record a detection; returns `false` if it duplicates an earlier one.
    pub fn admit(&mut self, category: &str, subject: &str, time: TimePoint) -> bool {
        if !(self.window_days.is_finite() && self.window_days > 0.0) {
            self.admitted += 1;
            return true;
        }

        let mut key = self.key(category, subject, time);
        let center = key.bucket;
        for bucket in center - 1..=center + 1 {
            key.bucket = bucket;
            if let Some(times) = self.seen.get(&key) {
                if times.iter().any(|&t| (t - time).abs() < self.window_days) {
                    return false;
                }
            }
        }

        key.bucket = center;
        self.seen.entry(key).or_default().push(time);
        self.admitted += 1;
        true
    }

    /// Number of admitted detections.
    pub fn len(&self) -> usize {
        self.admitted
    }

    pub fn is_empty(&self) -> bool {
        self.admitted == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tp(jd: f64) -> TimePoint {
        TimePoint::new(jd)
    }

    #[test]
    fn rejects_close_repeat() {
        let mut ledger = DedupLedger::new(0.1);
        assert!(ledger.admit("Square", "Mars-Jupiter", tp(2_460_000.50)));
        assert!(!ledger.admit("Square", "Mars-Jupiter", tp(2_460_000.55)));
        assert!(ledger.admit("Square", "Mars-Jupiter", tp(2_460_000.70)));
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn detects_across_bucket_edge() {
        let mut ledger = DedupLedger::new(0.1);
        // 0.999 and 1.001 fall in different buckets but are 0.002 d apart.
        assert!(ledger.admit("Trine", "Venus-Saturn", tp(0.999)));
        assert_ne!(
            ledger.key("Trine", "Venus-Saturn", tp(0.999)),
            ledger.key("Trine", "Venus-Saturn", tp(1.001))
        );
        assert!(!ledger.admit("Trine", "Venus-Saturn", tp(1.001)));
    }

    #[test]
    fn different_subject_or_category_is_distinct() {
        let mut ledger = DedupLedger::new(0.1);
        assert!(ledger.admit("Square", "Mars-Jupiter", tp(10.0)));
        assert!(ledger.admit("Square", "Mars-Saturn", tp(10.0)));
        assert!(ledger.admit("Trine", "Mars-Jupiter", tp(10.0)));
        assert_eq!(ledger.len(), 3);
    }

    #[test]
    fn zero_window_disables_suppression() {
        let mut ledger = DedupLedger::new(0.0);
        assert!(ledger.admit("a", "b", tp(1.0)));
        assert!(ledger.admit("a", "b", tp(1.0)));
        assert_eq!(ledger.len(), 2);
        assert!(!ledger.is_empty());
    }
}
