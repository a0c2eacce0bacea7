use dv_datagen::validate::{ValidateOptions, Validator};
use dv_datagen::GenerateConfig;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;

pub fn run(
    dir: PathBuf,
    expect_config: Option<PathBuf>,
    strict: bool,
    json: bool,
    progress: bool,
) -> anyhow::Result<()> {
    if !dir.is_dir() {
        anyhow::bail!("output directory does not exist: {}", dir.display());
    }

    let expected = match expect_config {
        Some(ref path) => Some(GenerateConfig::load(path)?),
        None => None,
    };

    if !json {
        eprintln!("Validating fixtures in: {}", dir.display());
        eprintln!();
    }

    let start_time = Instant::now();

    let pb = if progress && !json {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")?
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb.set_message("Validating...");
        Some(pb)
    } else {
        None
    };

    let validator = Validator::new(ValidateOptions { dir, expected });
    let summary = validator.validate()?;

    if let Some(pb) = pb {
        pb.finish_with_message("done");
    }

    let elapsed = start_time.elapsed();

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        for issue in &summary.issues {
            eprintln!("{}", issue);
        }

        if !summary.issues.is_empty() {
            eprintln!();
        }

        eprintln!("Validation summary:");
        eprintln!("  Files checked: {}", summary.summary.files_checked);
        for log in &summary.cdc {
            eprintln!(
                "  {}: {} events, {} keys ({} I / {} U / {} D)",
                log.file, log.events, log.keys, log.inserts, log.updates, log.deletes
            );
        }
        eprintln!("  Time: {:.3?}", elapsed);
        eprintln!();
        eprintln!("  Checks:");
        eprintln!("    - Files present:     {}", summary.checks.files_present);
        eprintln!("    - Row counts:        {}", summary.checks.row_counts);
        eprintln!("    - CDC sequence:      {}", summary.checks.cdc_sequence);
        eprintln!("    - CDC timestamps:    {}", summary.checks.cdc_timestamps);
        eprintln!("    - CDC ordering:      {}", summary.checks.cdc_order);
        eprintln!("    - CDC null keys:     {}", summary.checks.cdc_null_keys);
        eprintln!("    - Dangling refs:     {}", summary.checks.dangling_refs);
        eprintln!();
        eprintln!(
            "  Total: {} errors, {} warnings",
            summary.summary.errors, summary.summary.warnings
        );
        eprintln!();

        if summary.has_errors() {
            eprintln!("Result: FAILED");
        } else if summary.has_warnings() && strict {
            eprintln!("Result: FAILED (--strict mode, warnings treated as errors)");
        } else if summary.has_warnings() {
            eprintln!("Result: PASSED (with warnings)");
        } else {
            eprintln!("Result: PASSED");
        }
    }

    // Exit code
    if summary.has_errors() || (strict && summary.has_warnings()) {
        std::process::exit(1);
    }

    Ok(())
}
