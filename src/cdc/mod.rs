//! Synthetic change-data-capture event logs.
//!
//! A snapshot table is turned into an insert/update/delete history per
//! business key:
//!
//! - rows with a null key are never tracked
//! - every tracked key gets exactly one `I` event with sequence 1
//! - at most one `U` (sequence 2) carrying a mutated copy of the row
//! - at most one `D` carrying the latest row state
//! - timestamps never decrease within a key and stay inside the date range
//!
//! The log is sorted by (key, timestamp, sequence) before it is returned.

pub mod mutation;
pub mod synth;

pub use mutation::Mutation;
pub use synth::{synthesize, CdcTarget};

use crate::table::Row;
use chrono::NaiveDate;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// Metadata columns prepended to every CDC file
pub const CDC_COLUMNS: &[&str] = &["cdc_table", "cdc_op", "cdc_ts", "cdc_seq"];

/// Change operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CdcOp {
    /// Row inserted
    Insert,
    /// Row updated
    Update,
    /// Row deleted
    Delete,
}

impl CdcOp {
    /// Single-letter code written to `cdc_op`
    pub fn code(&self) -> &'static str {
        match self {
            CdcOp::Insert => "I",
            CdcOp::Update => "U",
            CdcOp::Delete => "D",
        }
    }
}

impl std::str::FromStr for CdcOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "I" => Ok(CdcOp::Insert),
            "U" => Ok(CdcOp::Update),
            "D" => Ok(CdcOp::Delete),
            _ => Err(format!("Unknown CDC operation: {}. Expected I, U or D", s)),
        }
    }
}

impl fmt::Display for CdcOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One change event with a full copy of the row as of that operation
#[derive(Debug, Clone, PartialEq)]
pub struct CdcEvent {
    pub table: String,
    pub op: CdcOp,
    pub ts: NaiveDate,
    pub seq: u32,
    pub key: String,
    pub row: Row,
}

impl CdcEvent {
    fn sort_cmp(&self, other: &Self) -> Ordering {
        self.key
            .cmp(&other.key)
            .then(self.ts.cmp(&other.ts))
            .then(self.seq.cmp(&other.seq))
    }
}

/// Ordered CDC events of one table
#[derive(Debug, Clone)]
pub struct EventLog {
    pub table: String,
    /// Columns of the source table, in source order
    pub columns: Vec<String>,
    pub events: Vec<CdcEvent>,
}

impl EventLog {
    pub fn new(table: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            table: table.into(),
            columns,
            events: Vec::new(),
        }
    }

    /// Output file stem, e.g. `erp_customers_cdc`
    pub fn file_stem(&self) -> String {
        format!("{}_cdc", self.table)
    }

    /// CDC metadata columns followed by the source columns
    pub fn header(&self) -> Vec<String> {
        CDC_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(self.columns.iter().cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Stable sort by (key, timestamp, sequence)
    pub fn sort(&mut self) {
        self.events.sort_by(CdcEvent::sort_cmp);
    }

    pub fn is_sorted(&self) -> bool {
        self.events
            .windows(2)
            .all(|w| w[0].sort_cmp(&w[1]) != Ordering::Greater)
    }

    pub fn count(&self, op: CdcOp) -> usize {
        self.events.iter().filter(|e| e.op == op).count()
    }

    /// Events grouped by key, assuming the log is sorted
    pub fn histories(&self) -> Vec<(&str, Vec<HistoryEntry>)> {
        let mut groups: Vec<(&str, Vec<HistoryEntry>)> = Vec::new();
        for event in &self.events {
            let entry = HistoryEntry {
                op: event.op,
                ts: event.ts,
                seq: event.seq,
            };
            let same_key = matches!(groups.last(), Some((key, _)) if *key == event.key);
            match groups.last_mut() {
                Some((_, entries)) if same_key => entries.push(entry),
                _ => groups.push((event.key.as_str(), vec![entry])),
            }
        }
        groups
    }
}

/// The ordering-relevant part of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryEntry {
    pub op: CdcOp,
    pub ts: NaiveDate,
    pub seq: u32,
}

/// Why a key's event history is malformed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryViolation {
    /// Operations or sequence numbers out of the I(1) [U(2)] [D(n+1)] shape
    Sequence(String),
    /// A timestamp earlier than its predecessor
    Timestamp(String),
}

impl fmt::Display for HistoryViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryViolation::Sequence(msg) | HistoryViolation::Timestamp(msg) => f.write_str(msg),
        }
    }
}

/// Check one key's history (in log order) against the I/U/D shape.
pub fn check_history(history: &[HistoryEntry]) -> Result<(), HistoryViolation> {
    let Some(first) = history.first() else {
        return Ok(());
    };
    if first.op != CdcOp::Insert || first.seq != 1 {
        return Err(HistoryViolation::Sequence(format!(
            "history starts with {}{} instead of I1",
            first.op, first.seq
        )));
    }

    let mut prev = *first;
    for entry in &history[1..] {
        if entry.seq != prev.seq + 1 {
            return Err(HistoryViolation::Sequence(format!(
                "sequence jumps from {} to {}",
                prev.seq, entry.seq
            )));
        }
        match (entry.op, prev.op) {
            (CdcOp::Update, CdcOp::Insert)
            | (CdcOp::Delete, CdcOp::Insert)
            | (CdcOp::Delete, CdcOp::Update) => {}
            _ => {
                return Err(HistoryViolation::Sequence(format!(
                    "{} not allowed after {}",
                    entry.op, prev.op
                )))
            }
        }
        if entry.ts < prev.ts {
            return Err(HistoryViolation::Timestamp(format!(
                "{}{} at {} precedes {}{} at {}",
                entry.op, entry.seq, entry.ts, prev.op, prev.seq, prev.ts
            )));
        }
        prev = *entry;
    }

    Ok(())
}

/// Per-table synthesis statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CdcStats {
    pub table: String,
    pub source_rows: usize,
    pub tracked_keys: usize,
    pub skipped_null_key: usize,
    pub skipped_duplicate_key: usize,
    pub fallback_timestamps: usize,
    pub inserts: usize,
    pub updates: usize,
    pub deletes: usize,
}

impl CdcStats {
    pub fn events(&self) -> usize {
        self.inserts + self.updates + self.deletes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 1, day).unwrap()
    }

    fn e(op: CdcOp, seq: u32, day: u32) -> HistoryEntry {
        HistoryEntry { op, ts: d(day), seq }
    }

    #[test]
    fn test_valid_histories() {
        assert!(check_history(&[e(CdcOp::Insert, 1, 1)]).is_ok());
        assert!(check_history(&[e(CdcOp::Insert, 1, 1), e(CdcOp::Update, 2, 5)]).is_ok());
        assert!(check_history(&[e(CdcOp::Insert, 1, 1), e(CdcOp::Delete, 2, 1)]).is_ok());
        assert!(check_history(&[
            e(CdcOp::Insert, 1, 1),
            e(CdcOp::Update, 2, 3),
            e(CdcOp::Delete, 3, 3),
        ])
        .is_ok());
    }

    #[test]
    fn test_invalid_histories() {
        assert!(matches!(
            check_history(&[e(CdcOp::Update, 1, 1)]),
            Err(HistoryViolation::Sequence(_))
        ));
        assert!(matches!(
            check_history(&[e(CdcOp::Insert, 1, 1), e(CdcOp::Insert, 2, 2)]),
            Err(HistoryViolation::Sequence(_))
        ));
        assert!(matches!(
            check_history(&[e(CdcOp::Insert, 1, 1), e(CdcOp::Update, 3, 2)]),
            Err(HistoryViolation::Sequence(_))
        ));
        assert!(matches!(
            check_history(&[
                e(CdcOp::Insert, 1, 1),
                e(CdcOp::Delete, 2, 2),
                e(CdcOp::Update, 3, 3),
            ]),
            Err(HistoryViolation::Sequence(_))
        ));
        assert!(matches!(
            check_history(&[e(CdcOp::Insert, 1, 5), e(CdcOp::Update, 2, 4)]),
            Err(HistoryViolation::Timestamp(_))
        ));
    }

    #[test]
    fn test_op_codes_round_trip() {
        for op in [CdcOp::Insert, CdcOp::Update, CdcOp::Delete] {
            assert_eq!(op.code().parse::<CdcOp>().unwrap(), op);
        }
        assert!("X".parse::<CdcOp>().is_err());
    }

    #[test]
    fn test_sort_orders_by_key_then_ts_then_seq() {
        let event = |key: &str, day: u32, seq: u32| CdcEvent {
            table: "t".to_string(),
            op: CdcOp::Insert,
            ts: d(day),
            seq,
            key: key.to_string(),
            row: Vec::new(),
        };
        let mut log = EventLog::new("t", vec![]);
        log.events = vec![event("b", 1, 1), event("a", 3, 2), event("a", 3, 1), event("a", 1, 1)];
        assert!(!log.is_sorted());
        log.sort();
        assert!(log.is_sorted());

        let order: Vec<(&str, u32, u32)> = log
            .events
            .iter()
            .map(|e| (e.key.as_str(), e.ts.day0() + 1, e.seq))
            .collect();
        assert_eq!(order, vec![("a", 1, 1), ("a", 3, 1), ("a", 3, 2), ("b", 1, 1)]);
    }
}
