mod generate;
mod validate;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dv-datagen")]
#[command(author = "dv-datagen contributors")]
#[command(version)]
#[command(
    about = "Generate synthetic ERP, SaaS and payment fixtures with a CDC event stream",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate all snapshot tables, CDC logs and the orders document
    Generate {
        /// Output directory (overrides output_dir from --config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Random seed for reproducibility (overrides seed from --config)
        #[arg(long)]
        seed: Option<u64>,

        /// YAML config file with counts, date range, CDC and noise settings
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Show progress while generating
        #[arg(short, long)]
        progress: bool,

        /// Generate everything but write no files
        #[arg(long)]
        dry_run: bool,

        /// Print run statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check a generated output directory for CDC and reference invariants
    Validate {
        /// Directory containing generated files
        dir: PathBuf,

        /// YAML config the directory was generated with (enables row-count checks)
        #[arg(long)]
        expect_config: Option<PathBuf>,

        /// Treat warnings as errors (non-zero exit on any warning)
        #[arg(long)]
        strict: bool,

        /// Output results as JSON instead of human-readable text
        #[arg(long)]
        json: bool,

        /// Show progress during validation
        #[arg(short, long)]
        progress: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Generate {
            output,
            seed,
            config,
            progress,
            dry_run,
            json,
        } => generate::run(output, seed, config, progress, dry_run, json),
        Commands::Validate {
            dir,
            expect_config,
            strict,
            json,
            progress,
        } => validate::run(dir, expect_config, strict, json, progress),
        Commands::Completions { shell } => {
            generate(
                shell,
                &mut Cli::command(),
                "dv-datagen",
                &mut io::stdout(),
            );
            Ok(())
        }
    }
}
