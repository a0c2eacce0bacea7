//! Generation configuration.
//!
//! Defaults give the stock fixture set (seed 42, 2020-01-01..2022-12-31).
//! A YAML file can override any subset of the fields:
//!
//! ```yaml
//! seed: 7
//! counts:
//!   customers: 100
//! cdc:
//!   p_update: 0.5
//! ```

use anyhow::Context;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Row counts per generated table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Counts {
    pub customers: usize,
    pub addresses: usize,
    pub products: usize,
    pub orders: usize,
    pub order_items: usize,
    pub users: usize,
    pub payments: usize,
}

impl Default for Counts {
    fn default() -> Self {
        Self {
            customers: 3000,
            addresses: 4000,
            products: 2000,
            orders: 5000,
            order_items: 15000,
            users: 3500,
            payments: 6000,
        }
    }
}

/// Inclusive date range every generated date falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Default for DateRange {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2022, 12, 31).unwrap_or_default(),
        }
    }
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Number of days between start and end (0 when start == end)
    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn clamp(&self, date: NaiveDate) -> NaiveDate {
        date.clamp(self.start, self.end)
    }
}

/// CDC synthesis parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CdcConfig {
    /// Probability that a tracked row receives an Update event
    pub p_update: f64,
    /// Probability that a tracked row receives a Delete event
    pub p_delete: f64,
    /// Upper bound of the random forward shift between two events of a key
    pub max_shift_days: i64,
}

impl Default for CdcConfig {
    fn default() -> Self {
        Self {
            p_update: 0.4,
            p_delete: 0.15,
            max_shift_days: 365,
        }
    }
}

/// Data-quality defect probabilities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    pub customer_id_null: f64,
    pub customer_id_dash: f64,
    pub customer_id_lowercase: f64,
    pub country_null: f64,
    pub order_amount_null: f64,
    pub payment_dangling_ref: f64,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            customer_id_null: 0.025,
            customer_id_dash: 0.2,
            customer_id_lowercase: 0.1,
            country_null: 0.05,
            order_amount_null: 0.035,
            payment_dangling_ref: 0.065,
        }
    }
}

/// Complete generator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateConfig {
    pub seed: u64,
    pub output_dir: PathBuf,
    pub counts: Counts,
    pub dates: DateRange,
    pub cdc: CdcConfig,
    pub noise: NoiseConfig,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            output_dir: PathBuf::from("data"),
            counts: Counts::default(),
            dates: DateRange::default(),
            cdc: CdcConfig::default(),
            noise: NoiseConfig::default(),
        }
    }
}

impl GenerateConfig {
    /// Load configuration from a YAML file, falling back to defaults for missing fields
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        let config: GenerateConfig = serde_yaml_ng::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject parameter combinations the generator cannot honor
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.dates.start > self.dates.end {
            anyhow::bail!(
                "dates.start ({}) must not be after dates.end ({})",
                self.dates.start,
                self.dates.end
            );
        }
        if self.cdc.max_shift_days < 1 {
            anyhow::bail!("cdc.max_shift_days must be at least 1");
        }
        if self.output_dir.as_os_str().is_empty() {
            anyhow::bail!("output_dir must not be empty");
        }

        let probabilities = [
            ("cdc.p_update", self.cdc.p_update),
            ("cdc.p_delete", self.cdc.p_delete),
            ("noise.customer_id_null", self.noise.customer_id_null),
            ("noise.customer_id_dash", self.noise.customer_id_dash),
            ("noise.customer_id_lowercase", self.noise.customer_id_lowercase),
            ("noise.country_null", self.noise.country_null),
            ("noise.order_amount_null", self.noise.order_amount_null),
            ("noise.payment_dangling_ref", self.noise.payment_dangling_ref),
        ];
        for (name, p) in probabilities {
            if !(0.0..=1.0).contains(&p) {
                anyhow::bail!("{} must be between 0 and 1, got {}", name, p);
            }
        }

        Ok(())
    }
}
