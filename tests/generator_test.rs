//! Integration tests for the generator: row counts, CDC invariants,
//! reference noise and byte-for-byte determinism.

use chrono::NaiveDate;
use dv_datagen::cdc::check_history;
use dv_datagen::snapshot::{self, ERP_CUSTOMERS};
use dv_datagen::validate::expected_files;
use dv_datagen::{CdcOp, Counts, DateRange, GenerateConfig, Generator, Value};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn small_config(seed: u64) -> GenerateConfig {
    GenerateConfig {
        seed,
        counts: Counts {
            customers: 60,
            addresses: 80,
            products: 40,
            orders: 100,
            order_items: 300,
            users: 70,
            payments: 120,
        },
        ..GenerateConfig::default()
    }
}

fn generate_into(dir: &Path, seed: u64) {
    let mut config = small_config(seed);
    config.output_dir = dir.to_path_buf();
    Generator::new(config).run(false).unwrap();
}

#[test]
fn test_row_counts_match_config() {
    let config = small_config(42);
    let dataset = Generator::new(config.clone()).generate().unwrap();
    let snap = &dataset.snapshot;

    assert_eq!(snap.customers.len(), config.counts.customers);
    assert_eq!(snap.addresses.len(), config.counts.addresses);
    assert_eq!(snap.products.len(), config.counts.products);
    assert_eq!(snap.users.len(), config.counts.users);
    assert_eq!(snap.orders.len(), config.counts.orders);
    assert_eq!(snap.order_items.len(), config.counts.order_items);
    assert_eq!(snap.payment_methods.len(), snapshot::payments::METHODS.len());
    assert_eq!(snap.payments.len(), config.counts.payments);
}

#[test]
fn test_cdc_histories_hold_invariants() {
    let config = small_config(7);
    let dataset = Generator::new(config.clone()).generate().unwrap();

    assert_eq!(dataset.cdc_logs.len(), 3);
    for log in &dataset.cdc_logs {
        assert!(log.is_sorted(), "{} not sorted", log.table);
        for (key, history) in log.histories() {
            assert!(!key.is_empty());
            check_history(&history).unwrap();
            assert_eq!(history[0].op, CdcOp::Insert);
            assert_eq!(history[0].seq, 1);
        }
        for event in &log.events {
            assert!(config.dates.contains(event.ts), "{} out of range", event.ts);
        }
    }
}

#[test]
fn test_no_events_for_null_keys() {
    let mut config = small_config(3);
    config.noise.customer_id_null = 0.5;
    let dataset = Generator::new(config).generate().unwrap();

    let customers = &dataset.snapshot.customers;
    let non_null = customers
        .text_values("customer_id")
        .into_iter()
        .filter(|id| !id.is_empty())
        .count();
    let log = &dataset.cdc_logs[0];
    let stats = &dataset.cdc_stats[0];

    assert_eq!(log.table, ERP_CUSTOMERS);
    assert_eq!(log.count(CdcOp::Insert), non_null);
    assert_eq!(stats.skipped_null_key, customers.len() - non_null);

    let key_idx = customers.column_index("customer_id").unwrap();
    assert!(log.events.iter().all(|e| !e.row[key_idx].is_null()));
}

#[test]
fn test_ten_customers_example() {
    let mut config = small_config(42);
    config.counts.customers = 10;
    config.cdc.p_update = 0.4;
    config.cdc.p_delete = 0.15;
    let dataset = Generator::new(config.clone()).generate().unwrap();

    let non_null = dataset
        .snapshot
        .customers
        .text_values("customer_id")
        .len();
    let log = &dataset.cdc_logs[0];

    assert_eq!(log.count(CdcOp::Insert), non_null);
    assert!(log.len() >= non_null);
    assert!(log.len() <= 3 * non_null);
    assert!(log.count(CdcOp::Update) <= non_null);
    assert!(log.count(CdcOp::Delete) <= non_null);
    for event in &log.events {
        assert!(config.dates.contains(event.ts));
    }
}

#[test]
fn test_address_keys_tracked_once() {
    let dataset = Generator::new(small_config(11)).generate().unwrap();
    let log = &dataset.cdc_logs[1];
    let stats = &dataset.cdc_stats[1];

    assert_eq!(log.count(CdcOp::Insert), stats.tracked_keys);
    assert_eq!(
        stats.tracked_keys + stats.skipped_null_key + stats.skipped_duplicate_key,
        stats.source_rows
    );
}

#[test]
fn test_payment_refs_are_orders_or_noise() {
    let mut config = small_config(5);
    config.counts.payments = 2000;
    let dataset = Generator::new(config.clone()).generate().unwrap();
    let snap = &dataset.snapshot;

    let order_ids: Vec<&str> = snap.orders.iter().map(|o| o.order_id.as_str()).collect();
    let refs = snap.payments.column_index("order_ref").unwrap();
    let dangling = snap
        .payments
        .rows
        .iter()
        .filter(|row| match &row[refs] {
            Value::Text(r) => !order_ids.contains(&r.as_str()),
            _ => false,
        })
        .count();

    let ratio = dangling as f64 / snap.payments.len() as f64;
    assert!(ratio > 0.0);
    assert!(ratio < config.noise.payment_dangling_ref * 2.0);
}

#[test]
fn test_inverted_date_range_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = small_config(42);
    config.output_dir = temp_dir.path().join("data");
    config.dates = DateRange::new(
        NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2022, 12, 31).unwrap(),
    );

    let err = Generator::new(config.clone()).run(true).unwrap_err();
    assert!(err.to_string().contains("dates.start"));

    assert!(Generator::new(config.clone()).generate().is_err());
    assert!(Generator::new(config).run(false).is_err());
    assert!(!temp_dir.path().join("data").exists());
}

#[test]
fn test_out_of_range_probability_is_rejected() {
    let mut config = small_config(42);
    config.cdc.p_update = 1.5;

    let err = Generator::new(config).run(true).unwrap_err();
    assert!(err.to_string().contains("cdc.p_update"));
}

#[test]
fn test_dry_run_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let out = temp_dir.path().join("data");
    let mut config = small_config(1);
    config.output_dir = out.clone();

    let summary = Generator::new(config).run(true).unwrap();

    assert!(summary.dry_run);
    assert!(summary.files.is_empty());
    assert_eq!(summary.tables.len(), 8);
    assert!(!out.exists());
}

#[test]
fn test_writes_every_expected_file() {
    let temp_dir = TempDir::new().unwrap();
    let out = temp_dir.path().join("nested").join("data");
    let mut config = small_config(9);
    config.output_dir = out.clone();

    let summary = Generator::new(config).run(false).unwrap();

    let names: Vec<&str> = summary.files.iter().map(|f| f.name.as_str()).collect();
    let expected = expected_files();
    assert_eq!(names, expected.iter().map(String::as_str).collect::<Vec<_>>());
    for name in expected {
        assert!(out.join(name).is_file());
    }
}

#[test]
fn test_same_seed_is_byte_identical() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    generate_into(first.path(), 42);
    generate_into(second.path(), 42);

    for name in expected_files() {
        let a = fs::read(first.path().join(&name)).unwrap();
        let b = fs::read(second.path().join(&name)).unwrap();
        assert_eq!(a, b, "{} differs between runs", name);
    }
}

#[test]
fn test_different_seed_differs() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    generate_into(first.path(), 1);
    generate_into(second.path(), 2);

    let a = fs::read(first.path().join("erp_customers.csv")).unwrap();
    let b = fs::read(second.path().join("erp_customers.csv")).unwrap();
    assert_ne!(a, b);
}

#[test]
fn test_cdc_csv_header_and_ops() {
    let temp_dir = TempDir::new().unwrap();
    generate_into(temp_dir.path(), 21);

    let content = fs::read_to_string(temp_dir.path().join("erp_products_cdc.csv")).unwrap();
    let mut lines = content.lines();
    assert_eq!(
        lines.next().unwrap(),
        "cdc_table,cdc_op,cdc_ts,cdc_seq,product_id,product_name,category,price"
    );
    for line in lines {
        let fields: Vec<&str> = line.splitn(5, ',').collect();
        assert_eq!(fields[0], "erp_products");
        assert!(matches!(fields[1], "I" | "U" | "D"));
        assert_eq!(fields[2].len(), 10);
    }
}

#[test]
fn test_orders_json_document() {
    let temp_dir = TempDir::new().unwrap();
    generate_into(temp_dir.path(), 13);

    let content = fs::read_to_string(temp_dir.path().join("saas_orders.json")).unwrap();
    assert!(content.starts_with("[\n  {\n    \"order_id\""));

    let orders: Vec<serde_json::Value> = serde_json::from_str(&content).unwrap();
    assert_eq!(orders.len(), 100);
    for order in &orders {
        for field in ["order_id", "customer_ref", "order_date", "amount", "currency", "status"] {
            assert!(order.get(field).is_some(), "missing {}", field);
        }
    }
}
