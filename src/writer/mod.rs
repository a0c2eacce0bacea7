//! Output writer: CSV tables, CDC logs and the orders JSON document.

use crate::cdc::EventLog;
use crate::snapshot::Order;
use crate::table::Table;
use anyhow::Context;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

pub const WRITER_BUFFER_SIZE: usize = 256 * 1024;

/// A file produced by a run
#[derive(Debug, Clone, Serialize)]
pub struct WrittenFile {
    pub name: String,
    #[serde(skip)]
    pub path: PathBuf,
    pub rows: usize,
    pub bytes: u64,
    pub sha256: String,
}

/// CSV writer with a header row and `\n` record terminators
pub struct CsvTableWriter {
    writer: csv::Writer<File>,
    rows: usize,
}

impl CsvTableWriter {
    pub fn new<S: AsRef<str>>(filename: &Path, header: &[S]) -> anyhow::Result<Self> {
        let mut writer = csv::WriterBuilder::new()
            .buffer_capacity(WRITER_BUFFER_SIZE)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_path(filename)
            .with_context(|| format!("failed to create {}", filename.display()))?;
        writer.write_record(header.iter().map(|h| h.as_ref()))?;

        Ok(Self { writer, rows: 0 })
    }

    pub fn write_record<I, T>(&mut self, record: I) -> anyhow::Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        self.writer.write_record(record)?;
        self.rows += 1;
        Ok(())
    }

    /// Flush and return the number of data rows written
    pub fn finish(mut self) -> anyhow::Result<usize> {
        self.writer.flush()?;
        Ok(self.rows)
    }
}

/// Writes every output of a run into one directory
pub struct OutputWriter {
    output_dir: PathBuf,
    written: Vec<WrittenFile>,
}

impl OutputWriter {
    pub fn new(output_dir: PathBuf) -> Self {
        Self {
            output_dir,
            written: Vec::new(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn ensure_output_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.output_dir)
    }

    /// `<table>.csv` with the table's own columns
    pub fn write_table(&mut self, table: &Table) -> anyhow::Result<()> {
        let name = format!("{}.csv", table.name);
        let path = self.output_dir.join(&name);

        let mut writer = CsvTableWriter::new(&path, &table.columns)?;
        for row in &table.rows {
            writer.write_record(row.iter().map(|v| v.to_csv_field()))?;
        }
        let rows = writer.finish()?;

        self.record(name, path, rows)
    }

    /// `<table>_cdc.csv`: `cdc_table, cdc_op, cdc_ts, cdc_seq` then the source columns
    pub fn write_event_log(&mut self, log: &EventLog) -> anyhow::Result<()> {
        let name = format!("{}.csv", log.file_stem());
        let path = self.output_dir.join(&name);

        let mut writer = CsvTableWriter::new(&path, &log.header())?;
        for event in &log.events {
            let meta = [
                event.table.clone(),
                event.op.code().to_string(),
                event.ts.to_string(),
                event.seq.to_string(),
            ];
            let values = event.row.iter().map(|v| v.to_csv_field());
            writer.write_record(meta.into_iter().chain(values))?;
        }
        let rows = writer.finish()?;

        self.record(name, path, rows)
    }

    /// Pretty-printed JSON array (two-space indent)
    pub fn write_orders(&mut self, name: &str, orders: &[Order]) -> anyhow::Result<()> {
        let name = format!("{}.json", name);
        let path = self.output_dir.join(&name);

        let file =
            File::create(&path).with_context(|| format!("failed to create {}", path.display()))?;
        let mut writer = BufWriter::with_capacity(WRITER_BUFFER_SIZE, file);
        serde_json::to_writer_pretty(&mut writer, orders)?;
        writer.flush()?;

        self.record(name, path, orders.len())
    }

    /// Files written so far, in write order
    pub fn finish(self) -> Vec<WrittenFile> {
        self.written
    }

    fn record(&mut self, name: String, path: PathBuf, rows: usize) -> anyhow::Result<()> {
        let bytes = fs::metadata(&path)?.len();
        let sha256 = sha256_file(&path)?;
        self.written.push(WrittenFile {
            name,
            path,
            rows,
            bytes,
            sha256,
        });
        Ok(())
    }
}

/// Hex-encoded SHA-256 of a file's contents
pub fn sha256_file(path: &Path) -> anyhow::Result<String> {
    let mut file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}
