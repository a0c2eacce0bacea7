//! CDC event synthesis from a snapshot table.

use super::{CdcEvent, CdcOp, CdcStats, EventLog, Mutation};
use crate::config::{CdcConfig, DateRange};
use crate::fake::FakeData;
use crate::snapshot::{ERP_CUSTOMERS, ERP_CUSTOMER_ADDRESSES, ERP_PRODUCTS};
use crate::table::{Row, Table, Value};
use ahash::AHashSet;
use chrono::{Days, NaiveDate};
use rand::Rng;

/// Column a base timestamp is derived from when present
const CREATED_AT: &str = "created_at";

/// A table tracked by CDC: label written to `cdc_table`, business key column,
/// and the mutation applied on update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CdcTarget {
    pub label: String,
    pub key_column: String,
    pub mutation: Mutation,
}

impl CdcTarget {
    pub fn new(label: impl Into<String>, key_column: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            mutation: Mutation::for_table(&label),
            key_column: key_column.into(),
            label,
        }
    }

    /// The ERP source-of-truth tables and their business keys
    pub fn erp() -> [CdcTarget; 3] {
        [
            CdcTarget::new(ERP_CUSTOMERS, "customer_id"),
            CdcTarget::new(ERP_CUSTOMER_ADDRESSES, "customer_id"),
            CdcTarget::new(ERP_PRODUCTS, "product_id"),
        ]
    }
}

/// Derive a sorted insert/update/delete log from `source`.
///
/// Rows whose key is null, empty, or missing are skipped, as are rows
/// repeating a key already tracked earlier in the table. Malformed
/// `created_at` values fall back to a random in-range date.
pub fn synthesize<R: Rng>(
    source: &Table,
    target: &CdcTarget,
    dates: &DateRange,
    params: &CdcConfig,
    fake: &mut FakeData<R>,
) -> (EventLog, CdcStats) {
    let mut log = EventLog::new(target.label.clone(), source.columns.clone());
    let mut stats = CdcStats {
        table: target.label.clone(),
        source_rows: source.len(),
        ..CdcStats::default()
    };

    let key_idx = source.column_index(&target.key_column);
    let created_idx = source.column_index(CREATED_AT);
    let mut tracked: AHashSet<String> = AHashSet::new();

    for row in &source.rows {
        let Some(key) = key_idx.and_then(|idx| business_key(row, idx)) else {
            stats.skipped_null_key += 1;
            continue;
        };
        if !tracked.insert(key.clone()) {
            stats.skipped_duplicate_key += 1;
            continue;
        }

        let base = match created_idx.and_then(|idx| parse_date(row.get(idx))) {
            Some(date) => date,
            None => {
                stats.fallback_timestamps += 1;
                fake.date_between(dates)
            }
        };
        let mut ts = dates.clamp(base);
        let mut seq = 1;
        let mut state = row.clone();

        log.events.push(event(target, CdcOp::Insert, ts, seq, &key, state.clone()));
        stats.inserts += 1;

        if fake.chance(params.p_update) {
            ts = shift_forward(fake, ts, dates, params.max_shift_days);
            seq += 1;
            state = target.mutation.apply(&source.columns, &state, fake);
            log.events.push(event(target, CdcOp::Update, ts, seq, &key, state.clone()));
            stats.updates += 1;
        }

        if fake.chance(params.p_delete) {
            ts = shift_forward(fake, ts, dates, params.max_shift_days);
            seq += 1;
            log.events.push(event(target, CdcOp::Delete, ts, seq, &key, state));
            stats.deletes += 1;
        }
    }

    stats.tracked_keys = tracked.len();
    log.sort();
    (log, stats)
}

fn event(target: &CdcTarget, op: CdcOp, ts: NaiveDate, seq: u32, key: &str, row: Row) -> CdcEvent {
    CdcEvent {
        table: target.label.clone(),
        op,
        ts,
        seq,
        key: key.to_string(),
        row,
    }
}

/// Key as written to CSV; null and empty keys cannot be tracked
fn business_key(row: &Row, idx: usize) -> Option<String> {
    match row.get(idx)? {
        Value::Null => None,
        value => Some(value.to_csv_field()).filter(|k| !k.is_empty()),
    }
}

fn parse_date(value: Option<&Value>) -> Option<NaiveDate> {
    let text = value?.as_str()?;
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()
}

/// `ts` plus 1..=max_days days, clamped to the range end
fn shift_forward<R: Rng>(
    fake: &mut FakeData<R>,
    ts: NaiveDate,
    dates: &DateRange,
    max_days: i64,
) -> NaiveDate {
    let days = fake.int_range(1, max_days.max(1)) as u64;
    ts.checked_add_days(Days::new(days))
        .unwrap_or(dates.end)
        .min(dates.end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn fake() -> FakeData<ChaCha8Rng> {
        FakeData::new(ChaCha8Rng::seed_from_u64(21))
    }

    fn customers(rows: Vec<Row>) -> Table {
        let mut table = Table::new(
            ERP_CUSTOMERS,
            &["customer_id", "customer_name", "country", "created_at"],
        );
        for row in rows {
            table.push(row);
        }
        table
    }

    fn row(id: Option<&str>, created_at: &str) -> Row {
        vec![
            id.map(Value::text).unwrap_or(Value::Null),
            Value::text("Acme Original Holdings"),
            Value::text("Atlantis"),
            Value::text(created_at),
        ]
    }

    #[test]
    fn test_insert_only_uses_created_at() {
        let table = customers(vec![row(Some("CUST1"), "2021-06-15")]);
        let params = CdcConfig {
            p_update: 0.0,
            p_delete: 0.0,
            ..CdcConfig::default()
        };
        let (log, stats) =
            synthesize(&table, &CdcTarget::erp()[0], &DateRange::default(), &params, &mut fake());

        assert_eq!(log.len(), 1);
        let event = &log.events[0];
        assert_eq!(event.op, CdcOp::Insert);
        assert_eq!(event.seq, 1);
        assert_eq!(event.ts, NaiveDate::from_ymd_opt(2021, 6, 15).unwrap());
        assert_eq!(event.row, table.rows[0]);
        assert_eq!(stats.fallback_timestamps, 0);
    }

    #[test]
    fn test_full_history_with_certain_update_and_delete() {
        let table = customers(vec![row(Some("CUST1"), "2021-06-15")]);
        let params = CdcConfig {
            p_update: 1.0,
            p_delete: 1.0,
            ..CdcConfig::default()
        };
        let (log, stats) =
            synthesize(&table, &CdcTarget::erp()[0], &DateRange::default(), &params, &mut fake());

        let ops: Vec<(CdcOp, u32)> = log.events.iter().map(|e| (e.op, e.seq)).collect();
        assert_eq!(ops, vec![(CdcOp::Insert, 1), (CdcOp::Update, 2), (CdcOp::Delete, 3)]);
        assert!(log.events[0].ts < log.events[1].ts);
        assert!(log.events[1].ts <= log.events[2].ts);
        assert_ne!(log.events[1].row, log.events[0].row);
        // Delete carries the post-update state
        assert_eq!(log.events[2].row, log.events[1].row);
        assert_eq!(stats.events(), 3);
    }

    #[test]
    fn test_null_and_duplicate_keys_skipped() {
        let table = customers(vec![
            row(None, "2021-01-01"),
            row(Some("CUST1"), "2021-01-01"),
            row(Some(""), "2021-01-01"),
            row(Some("CUST1"), "2022-01-01"),
            row(Some("cust-1"), "2021-01-01"),
        ]);
        let (log, stats) = synthesize(
            &table,
            &CdcTarget::erp()[0],
            &DateRange::default(),
            &CdcConfig::default(),
            &mut fake(),
        );

        assert_eq!(stats.skipped_null_key, 2);
        assert_eq!(stats.skipped_duplicate_key, 1);
        assert_eq!(stats.tracked_keys, 2);
        assert_eq!(log.count(CdcOp::Insert), 2);
        assert!(log.events.iter().all(|e| !e.key.is_empty()));
    }

    #[test]
    fn test_malformed_created_at_falls_back_in_range() {
        let table = customers(vec![row(Some("CUST1"), "not-a-date"), row(Some("CUST2"), "")]);
        let dates = DateRange::default();
        let (log, stats) =
            synthesize(&table, &CdcTarget::erp()[0], &dates, &CdcConfig::default(), &mut fake());

        assert_eq!(stats.fallback_timestamps, 2);
        assert!(log.events.iter().all(|e| dates.contains(e.ts)));
    }

    #[test]
    fn test_timestamps_clamped_to_range_end() {
        let dates = DateRange::new(
            NaiveDate::from_ymd_opt(2022, 12, 30).unwrap(),
            NaiveDate::from_ymd_opt(2022, 12, 31).unwrap(),
        );
        let table = customers(vec![row(Some("CUST1"), "2025-01-01")]);
        let params = CdcConfig {
            p_update: 1.0,
            p_delete: 1.0,
            ..CdcConfig::default()
        };
        let (log, _) = synthesize(&table, &CdcTarget::erp()[0], &dates, &params, &mut fake());

        assert_eq!(log.len(), 3);
        assert!(log.events.iter().all(|e| e.ts == dates.end));
        let seqs: Vec<u32> = log.events.iter().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
    }

    #[test]
    fn test_missing_key_column_tracks_nothing() {
        let table = customers(vec![row(Some("CUST1"), "2021-01-01")]);
        let target = CdcTarget::new(ERP_CUSTOMERS, "no_such_column");
        let (log, stats) = synthesize(
            &table,
            &target,
            &DateRange::default(),
            &CdcConfig::default(),
            &mut fake(),
        );
        assert!(log.is_empty());
        assert_eq!(stats.skipped_null_key, 1);
    }
}
