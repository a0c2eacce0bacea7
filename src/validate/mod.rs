//! Validate a generated output directory.
//!
//! This module checks:
//! - every expected file is present
//! - table row counts match the configuration (when one is given)
//! - CDC logs: key present, I/U/D sequence shape, non-decreasing and
//!   in-range timestamps, (key, ts, seq) ordering
//! - the share of dangling payment `order_ref` values

use crate::cdc::{check_history, CdcOp, CdcTarget, HistoryEntry, HistoryViolation, CDC_COLUMNS};
use crate::config::GenerateConfig;
use crate::snapshot::{self, Order};
use crate::writer::sha256_file;
use ahash::{AHashMap, AHashSet};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Maximum number of issues to collect before stopping
const MAX_ISSUES: usize = 1000;

/// Issue severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Warning => write!(f, "WARNING"),
            Severity::Info => write!(f, "INFO"),
        }
    }
}

/// Where in the output an issue was found
#[derive(Debug, Clone, Default, Serialize)]
pub struct Location {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl Location {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            file: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_line(mut self, line: Option<u64>) -> Self {
        self.line = line;
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }
}

/// A validation issue found in the output directory
#[derive(Debug, Clone, Serialize)]
pub struct ValidationIssue {
    pub code: &'static str,
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl ValidationIssue {
    pub fn error(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            severity: Severity::Error,
            message: message.into(),
            location: None,
        }
    }

    pub fn warning(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            severity: Severity::Warning,
            message: message.into(),
            location: None,
        }
    }

    pub fn info(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            severity: Severity::Info,
            message: message.into(),
            location: None,
        }
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.severity, self.code)?;
        if let Some(ref loc) = self.location {
            if let Some(ref file) = loc.file {
                write!(f, " file={}", file)?;
            }
            if let Some(line) = loc.line {
                write!(f, " line={}", line)?;
            }
            if let Some(ref key) = loc.key {
                write!(f, " key={}", key)?;
            }
        }
        write!(f, ": {}", self.message)
    }
}

/// Validation options
#[derive(Debug, Clone)]
pub struct ValidateOptions {
    pub dir: PathBuf,
    /// Configuration the directory was generated with. Enables row-count
    /// checks and supplies the date range and dangling-ref probability.
    pub expected: Option<GenerateConfig>,
}

/// Validation summary with collected issues
#[derive(Debug, Serialize)]
pub struct ValidationSummary {
    pub dir: PathBuf,
    pub issues: Vec<ValidationIssue>,
    pub summary: SummaryStats,
    pub checks: CheckResults,
    pub cdc: Vec<CdcLogStats>,
    pub files: Vec<FileDigest>,
}

#[derive(Debug, Default, Serialize)]
pub struct SummaryStats {
    pub errors: usize,
    pub warnings: usize,
    pub info: usize,
    pub files_checked: usize,
}

#[derive(Debug, Serialize)]
pub struct CheckResults {
    pub files_present: CheckStatus,
    pub row_counts: CheckStatus,
    pub cdc_sequence: CheckStatus,
    pub cdc_timestamps: CheckStatus,
    pub cdc_order: CheckStatus,
    pub cdc_null_keys: CheckStatus,
    pub dangling_refs: CheckStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Ok,
    Failed(usize),
    Skipped(String),
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckStatus::Ok => write!(f, "OK"),
            CheckStatus::Failed(n) => write!(f, "{} issues", n),
            CheckStatus::Skipped(reason) => write!(f, "Skipped ({})", reason),
        }
    }
}

/// Per-log counts gathered while checking a CDC file
#[derive(Debug, Clone, Default, Serialize)]
pub struct CdcLogStats {
    pub file: String,
    pub events: usize,
    pub keys: usize,
    pub inserts: usize,
    pub updates: usize,
    pub deletes: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileDigest {
    pub name: String,
    pub sha256: String,
}

impl ValidationSummary {
    pub fn has_errors(&self) -> bool {
        self.summary.errors > 0
    }

    pub fn has_warnings(&self) -> bool {
        self.summary.warnings > 0
    }
}

/// Names of every file a run writes, in write order
pub fn expected_files() -> Vec<String> {
    let mut files = vec![
        format!("{}.csv", snapshot::ERP_CUSTOMERS),
        format!("{}.csv", snapshot::ERP_CUSTOMER_ADDRESSES),
        format!("{}.csv", snapshot::ERP_PRODUCTS),
    ];
    files.extend(
        CdcTarget::erp()
            .iter()
            .map(|t| format!("{}_cdc.csv", t.label)),
    );
    files.push(format!("{}.csv", snapshot::SAAS_USERS));
    files.push(format!("{}.json", snapshot::SAAS_ORDERS));
    files.push(format!("{}.csv", snapshot::SAAS_ORDER_ITEMS));
    files.push(format!("{}.csv", snapshot::PAYMENT_METHODS));
    files.push(format!("{}.csv", snapshot::PAYMENTS));
    files
}

/// Output directory validator
pub struct Validator {
    options: ValidateOptions,
    config: GenerateConfig,
    issues: Vec<ValidationIssue>,
    cdc_stats: Vec<CdcLogStats>,
    files: Vec<FileDigest>,

    // Counters
    missing_files: usize,
    row_count_errors: usize,
    sequence_errors: usize,
    timestamp_errors: usize,
    order_errors: usize,
    null_key_errors: usize,
    dangling_warnings: usize,
}

impl Validator {
    pub fn new(options: ValidateOptions) -> Self {
        Self {
            config: options.expected.clone().unwrap_or_default(),
            options,
            issues: Vec::new(),
            cdc_stats: Vec::new(),
            files: Vec::new(),
            missing_files: 0,
            row_count_errors: 0,
            sequence_errors: 0,
            timestamp_errors: 0,
            order_errors: 0,
            null_key_errors: 0,
            dangling_warnings: 0,
        }
    }

    fn add_issue(&mut self, issue: ValidationIssue) {
        match (issue.severity, issue.code) {
            (Severity::Error, "MISSING_FILE") => self.missing_files += 1,
            (Severity::Error, "ROW_COUNT") => self.row_count_errors += 1,
            (Severity::Error, "CDC_SEQUENCE") => self.sequence_errors += 1,
            (Severity::Error, "CDC_TIMESTAMP") => self.timestamp_errors += 1,
            (Severity::Error, "CDC_ORDER") => self.order_errors += 1,
            (Severity::Error, "CDC_NULL_KEY") => self.null_key_errors += 1,
            (Severity::Warning, "DANGLING_REF") => self.dangling_warnings += 1,
            _ => {}
        }

        if self.issues.len() < MAX_ISSUES {
            self.issues.push(issue);
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.options.dir.join(name)
    }

    pub fn validate(mut self) -> anyhow::Result<ValidationSummary> {
        if !self.options.dir.is_dir() {
            anyhow::bail!(
                "output directory does not exist: {}",
                self.options.dir.display()
            );
        }

        for name in expected_files() {
            let path = self.path(&name);
            if path.is_file() {
                let sha256 = sha256_file(&path)?;
                self.files.push(FileDigest { name, sha256 });
            } else {
                self.add_issue(
                    ValidationIssue::error("MISSING_FILE", "expected output file is missing")
                        .with_location(Location::file(name)),
                );
            }
        }

        if self.options.expected.is_some() {
            self.check_row_counts()?;
        }

        for target in CdcTarget::erp() {
            let name = format!("{}_cdc.csv", target.label);
            if self.path(&name).is_file() {
                self.check_cdc_log(&name, &target)?;
            }
        }

        self.check_dangling_refs()?;

        Ok(self.build_summary())
    }

    fn check_row_counts(&mut self) -> anyhow::Result<()> {
        let counts = self.config.counts.clone();
        let expected = [
            (format!("{}.csv", snapshot::ERP_CUSTOMERS), counts.customers),
            (format!("{}.csv", snapshot::ERP_CUSTOMER_ADDRESSES), counts.addresses),
            (format!("{}.csv", snapshot::ERP_PRODUCTS), counts.products),
            (format!("{}.csv", snapshot::SAAS_USERS), counts.users),
            (format!("{}.json", snapshot::SAAS_ORDERS), counts.orders),
            (format!("{}.csv", snapshot::SAAS_ORDER_ITEMS), counts.order_items),
            (
                format!("{}.csv", snapshot::PAYMENT_METHODS),
                snapshot::payments::METHODS.len(),
            ),
            (format!("{}.csv", snapshot::PAYMENTS), counts.payments),
        ];

        for (name, want) in expected {
            let path = self.path(&name);
            if !path.is_file() {
                continue;
            }
            let got = if name.ends_with(".json") {
                read_orders(&path)?.len()
            } else {
                csv_reader(&path)?.records().count()
            };
            if got != want {
                self.add_issue(
                    ValidationIssue::error(
                        "ROW_COUNT",
                        format!("expected {} rows, found {}", want, got),
                    )
                    .with_location(Location::file(name)),
                );
            }
        }

        Ok(())
    }

    fn check_cdc_log(&mut self, name: &str, target: &CdcTarget) -> anyhow::Result<()> {
        let mut reader = csv_reader(&self.path(name))?;
        let headers = reader.headers()?.clone();

        let meta: Vec<&str> = headers.iter().take(CDC_COLUMNS.len()).collect();
        let key_idx = headers.iter().position(|h| h == target.key_column);
        let (true, Some(key_idx)) = (meta == CDC_COLUMNS, key_idx) else {
            self.add_issue(
                ValidationIssue::error(
                    "CDC_SEQUENCE",
                    format!(
                        "header must start with {} and contain {}",
                        CDC_COLUMNS.join(","),
                        target.key_column
                    ),
                )
                .with_location(Location::file(name)),
            );
            return Ok(());
        };

        let dates = self.config.dates;
        let mut stats = CdcLogStats {
            file: name.to_string(),
            ..CdcLogStats::default()
        };
        // Histories in file order, keyed by business key
        let mut histories: AHashMap<String, Vec<HistoryEntry>> = AHashMap::new();
        let mut key_order: Vec<String> = Vec::new();
        let mut prev: Option<(String, NaiveDate, u32)> = None;

        for record in reader.records() {
            let record = record?;
            let line = record.position().map(|p| p.line());
            let at = || Location::file(name).with_line(line);

            let parsed = (
                record.get(1).and_then(|op| op.parse::<CdcOp>().ok()),
                record
                    .get(2)
                    .and_then(|ts| NaiveDate::parse_from_str(ts, "%Y-%m-%d").ok()),
                record.get(3).and_then(|seq| seq.parse::<u32>().ok()),
            );
            let (Some(op), Some(ts), Some(seq)) = parsed else {
                self.add_issue(
                    ValidationIssue::error("CDC_SEQUENCE", "unparseable cdc_op/cdc_ts/cdc_seq")
                        .with_location(at()),
                );
                continue;
            };
            stats.events += 1;
            match op {
                CdcOp::Insert => stats.inserts += 1,
                CdcOp::Update => stats.updates += 1,
                CdcOp::Delete => stats.deletes += 1,
            }

            let key = record.get(key_idx).unwrap_or_default().to_string();
            if key.is_empty() {
                self.add_issue(
                    ValidationIssue::error("CDC_NULL_KEY", "event without a business key")
                        .with_location(at()),
                );
                continue;
            }

            if !dates.contains(ts) {
                self.add_issue(
                    ValidationIssue::error(
                        "CDC_TIMESTAMP",
                        format!("cdc_ts {} outside {}..{}", ts, dates.start, dates.end),
                    )
                    .with_location(at().with_key(&key)),
                );
            }

            let current = (key.clone(), ts, seq);
            if let Some(ref p) = prev {
                if *p > current {
                    self.add_issue(
                        ValidationIssue::error(
                            "CDC_ORDER",
                            "log is not sorted by (key, cdc_ts, cdc_seq)",
                        )
                        .with_location(at().with_key(&key)),
                    );
                }
            }
            prev = Some(current);

            let entry = HistoryEntry { op, ts, seq };
            match histories.get_mut(&key) {
                Some(entries) => entries.push(entry),
                None => {
                    key_order.push(key.clone());
                    histories.insert(key, vec![entry]);
                }
            }
        }

        stats.keys = key_order.len();
        for key in key_order {
            let Some(history) = histories.get(&key) else {
                continue;
            };
            if let Err(violation) = check_history(history) {
                let code = match violation {
                    HistoryViolation::Sequence(_) => "CDC_SEQUENCE",
                    HistoryViolation::Timestamp(_) => "CDC_TIMESTAMP",
                };
                self.add_issue(
                    ValidationIssue::error(code, violation.to_string())
                        .with_location(Location::file(name).with_key(key)),
                );
            }
        }

        self.cdc_stats.push(stats);
        Ok(())
    }

    fn check_dangling_refs(&mut self) -> anyhow::Result<()> {
        let orders_name = format!("{}.json", snapshot::SAAS_ORDERS);
        let payments_name = format!("{}.csv", snapshot::PAYMENTS);
        let orders_path = self.path(&orders_name);
        let payments_path = self.path(&payments_name);
        if !orders_path.is_file() || !payments_path.is_file() {
            return Ok(());
        }

        let order_ids: AHashSet<String> = read_orders(&orders_path)?
            .into_iter()
            .map(|o| o.order_id)
            .collect();

        let mut reader = csv_reader(&payments_path)?;
        let Some(ref_idx) = reader.headers()?.iter().position(|h| h == "order_ref") else {
            self.add_issue(
                ValidationIssue::error("DANGLING_REF", "payments.csv has no order_ref column")
                    .with_location(Location::file(payments_name)),
            );
            return Ok(());
        };

        let (mut total, mut empty, mut dangling) = (0usize, 0usize, 0usize);
        for record in reader.records() {
            let record = record?;
            total += 1;
            match record.get(ref_idx).unwrap_or_default() {
                "" => empty += 1,
                order_ref if !order_ids.contains(order_ref) => dangling += 1,
                _ => {}
            }
        }

        let ratio = if total > 0 {
            dangling as f64 / total as f64
        } else {
            0.0
        };
        let limit = self.config.noise.payment_dangling_ref * 2.0;
        let message = format!(
            "{} of {} payments reference unknown orders ({:.1}%), {} have no order",
            dangling,
            total,
            ratio * 100.0,
            empty
        );
        let issue = if ratio > limit {
            ValidationIssue::warning("DANGLING_REF", message)
        } else {
            ValidationIssue::info("DANGLING_REF", message)
        };
        self.add_issue(issue.with_location(Location::file(payments_name)));

        Ok(())
    }

    fn build_summary(self) -> ValidationSummary {
        let count = |severity: Severity| {
            self.issues
                .iter()
                .filter(|i| i.severity == severity)
                .count()
        };
        let summary = SummaryStats {
            errors: count(Severity::Error),
            warnings: count(Severity::Warning),
            info: count(Severity::Info),
            files_checked: self.files.len(),
        };

        let status = |n: usize| {
            if n == 0 {
                CheckStatus::Ok
            } else {
                CheckStatus::Failed(n)
            }
        };
        let checks = CheckResults {
            files_present: status(self.missing_files),
            row_counts: if self.options.expected.is_some() {
                status(self.row_count_errors)
            } else {
                CheckStatus::Skipped("no --expect-config".to_string())
            },
            cdc_sequence: status(self.sequence_errors),
            cdc_timestamps: status(self.timestamp_errors),
            cdc_order: status(self.order_errors),
            cdc_null_keys: status(self.null_key_errors),
            dangling_refs: status(self.dangling_warnings),
        };

        ValidationSummary {
            dir: self.options.dir,
            issues: self.issues,
            summary,
            checks,
            cdc: self.cdc_stats,
            files: self.files,
        }
    }
}

fn csv_reader(path: &Path) -> anyhow::Result<csv::Reader<File>> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| anyhow::anyhow!("failed to open {}: {}", path.display(), e))
}

fn read_orders(path: &Path) -> anyhow::Result<Vec<Order>> {
    let file = File::open(path)
        .map_err(|e| anyhow::anyhow!("failed to open {}: {}", path.display(), e))?;
    let orders = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| anyhow::anyhow!("failed to parse {}: {}", path.display(), e))?;
    Ok(orders)
}
