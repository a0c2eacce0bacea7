//! Generate command CLI handler.

use dv_datagen::{GenerateConfig, Generator};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;

pub fn run(
    output: Option<PathBuf>,
    seed: Option<u64>,
    config: Option<PathBuf>,
    progress: bool,
    dry_run: bool,
    json: bool,
) -> anyhow::Result<()> {
    let mut config = match config {
        Some(ref path) => GenerateConfig::load(path)?,
        None => GenerateConfig::default(),
    };
    if let Some(output) = output {
        config.output_dir = output;
    }
    if let Some(seed) = seed {
        config.seed = seed;
    }
    config.validate()?;

    if progress && !json {
        eprintln!(
            "Generating fixtures (seed: {}) into {}",
            config.seed,
            config.output_dir.display()
        );
    }

    let start_time = Instant::now();

    let pb = if progress && !json {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")?
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let mut generator = Generator::new(config);
    if let Some(ref pb) = pb {
        let pb = pb.clone();
        generator = generator.with_progress(move |msg| pb.set_message(msg.to_string()));
    }

    let summary = generator.run(dry_run)?;

    if let Some(pb) = pb {
        pb.finish_with_message("done");
    }

    let elapsed = start_time.elapsed();

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    if dry_run {
        eprintln!("Dry run - no files written");
    } else {
        eprintln!("Data generated under: {}", summary.output_dir.display());
    }

    if progress || dry_run {
        eprintln!();
        eprintln!("Tables:");
        for table in &summary.tables {
            eprintln!("  {:<28} {:>8} rows", table.table, table.rows);
        }
        eprintln!();
        eprintln!("CDC logs:");
        for stats in &summary.cdc {
            eprintln!(
                "  {:<28} {:>8} events ({} I / {} U / {} D), {} keys",
                stats.table,
                stats.events(),
                stats.inserts,
                stats.updates,
                stats.deletes,
                stats.tracked_keys
            );
            if stats.skipped_null_key > 0 || stats.skipped_duplicate_key > 0 {
                eprintln!(
                    "  {:<28} skipped {} null-key and {} duplicate-key rows",
                    "", stats.skipped_null_key, stats.skipped_duplicate_key
                );
            }
        }
        eprintln!();
        eprintln!("  Time: {:.3?}", elapsed);
    }

    Ok(())
}
