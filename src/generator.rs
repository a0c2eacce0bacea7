//! Run orchestration: snapshot, then CDC, then write.
//!
//! All randomness comes from one `ChaCha8Rng` seeded with
//! [`GenerateConfig::seed`], so a run is reproducible byte for byte.

use crate::cdc::{self, CdcStats, CdcTarget, EventLog};
use crate::config::GenerateConfig;
use crate::fake::FakeData;
use crate::snapshot::{Snapshot, SAAS_ORDERS};
use crate::writer::{OutputWriter, WrittenFile};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Snapshot tables plus their CDC logs
#[derive(Debug, Clone)]
pub struct Dataset {
    pub snapshot: Snapshot,
    pub cdc_logs: Vec<EventLog>,
    pub cdc_stats: Vec<CdcStats>,
}

impl Dataset {
    /// Write every table, log and document into `dir`
    pub fn write(&self, dir: &Path) -> anyhow::Result<Vec<WrittenFile>> {
        let mut writer = OutputWriter::new(dir.to_path_buf());
        writer.ensure_output_dir()?;

        let snapshot = &self.snapshot;
        writer.write_table(&snapshot.customers)?;
        writer.write_table(&snapshot.addresses)?;
        writer.write_table(&snapshot.products)?;
        for log in &self.cdc_logs {
            writer.write_event_log(log)?;
        }
        writer.write_table(&snapshot.users)?;
        writer.write_orders(SAAS_ORDERS, &snapshot.orders)?;
        writer.write_table(&snapshot.order_items)?;
        writer.write_table(&snapshot.payment_methods)?;
        writer.write_table(&snapshot.payments)?;

        Ok(writer.finish())
    }
}

/// Row count of one generated table
#[derive(Debug, Clone, Serialize)]
pub struct TableCount {
    pub table: String,
    pub rows: usize,
}

/// Statistics of a generation run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub seed: u64,
    pub output_dir: PathBuf,
    pub dry_run: bool,
    pub tables: Vec<TableCount>,
    pub cdc: Vec<CdcStats>,
    pub files: Vec<WrittenFile>,
}

/// Main data generator
pub struct Generator {
    config: GenerateConfig,
    fake: FakeData<ChaCha8Rng>,
    progress_fn: Option<Box<dyn Fn(&str)>>,
}

impl Generator {
    pub fn new(config: GenerateConfig) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self {
            config,
            fake: FakeData::new(rng),
            progress_fn: None,
        }
    }

    /// Set a callback receiving a short message as each stage starts
    pub fn with_progress<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + 'static,
    {
        self.progress_fn = Some(Box::new(f));
        self
    }

    fn report(&self, msg: &str) {
        if let Some(ref f) = self.progress_fn {
            f(msg);
        }
    }

    /// Build the snapshot and derive the ERP CDC logs.
    ///
    /// Fails without drawing any data if the configuration is invalid.
    pub fn generate(&mut self) -> anyhow::Result<Dataset> {
        self.config.validate()?;

        self.report("Building entity snapshots...");
        let snapshot = Snapshot::build(&mut self.fake, &self.config);

        self.report("Synthesizing CDC events...");
        let sources = [&snapshot.customers, &snapshot.addresses, &snapshot.products];
        let mut cdc_logs = Vec::with_capacity(sources.len());
        let mut cdc_stats = Vec::with_capacity(sources.len());
        for (source, target) in sources.into_iter().zip(CdcTarget::erp()) {
            let (log, stats) = cdc::synthesize(
                source,
                &target,
                &self.config.dates,
                &self.config.cdc,
                &mut self.fake,
            );
            cdc_logs.push(log);
            cdc_stats.push(stats);
        }

        Ok(Dataset {
            snapshot,
            cdc_logs,
            cdc_stats,
        })
    }

    /// Generate and, unless `dry_run`, write into the configured output directory
    pub fn run(mut self, dry_run: bool) -> anyhow::Result<RunSummary> {
        let dataset = self.generate()?;

        let files = if dry_run {
            Vec::new()
        } else {
            self.report("Writing output files...");
            dataset.write(&self.config.output_dir)?
        };

        let tables = dataset
            .snapshot
            .row_counts()
            .into_iter()
            .map(|(table, rows)| TableCount {
                table: table.to_string(),
                rows,
            })
            .collect();

        Ok(RunSummary {
            seed: self.config.seed,
            output_dir: self.config.output_dir,
            dry_run,
            tables,
            cdc: dataset.cdc_stats,
            files,
        })
    }
}
