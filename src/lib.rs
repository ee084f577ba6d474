//! # Monthly Unit Cost
//!
//! A library for turning monthly transaction extracts (quantity and amount per
//! product, entity and month) into per product/entity unit-cost statistics.
//!
//! ## Core Concepts
//!
//! - **Unit Cost**: `amount / quantity` for one transaction line. Lines with a zero
//!   quantity carry no unit cost and are dropped.
//! - **Monthly Average**: the mean unit cost of every line sharing a
//!   (product, entity, month) key.
//! - **Pivot Row**: one row per (product, entity) with twelve monthly slots. Months
//!   without trades stay empty, they are never zero-filled.
//! - **Period Averages**: Q1-Q4, first half (Jan-Jun), second half (Aug-Dec) and
//!   full year, each the mean of the months that have a value.
//!
//! ## Example
//!
//! ```rust,ignore
//! use monthly_unit_cost::*;
//!
//! let records = vec![
//!     RawRecord::new(1, 2.0, 10.0, "P", "E")?,
//!     RawRecord::new(1, 5.0, 10.0, "P", "E")?,
//!     RawRecord::new(4, 1.0, 4.0, "P", "E")?,
//! ];
//!
//! let summary = process_monthly_statistics(records)?;
//! assert_eq!(summary[0].q1, Some(3.5));
//! assert_eq!(summary[0].one_year, Some(3.75));
//!
//! // Or run the whole thing from a directory of extracts:
//! let config = StatisticsConfig::new("extracts/");
//! let report = MonthlyStatisticsProcessor::run(&config)?;
//! ```

pub mod aggregation;
pub mod engine;
pub mod error;
pub mod ingestion;
pub mod output;
pub mod pivot;
pub mod rollup;
pub mod schema;
pub mod unit_cost;
pub mod utils;

pub use aggregation::{aggregate_monthly, MonthlyAggregator};
pub use engine::{process_records, ProcessingReport, StatisticsEngine};
pub use error::{MonthlyStatisticsError, Result};
pub use ingestion::{
    discover_source_files, load_partitions, read_records, read_records_from_path,
    IngestedPartition,
};
pub use output::{
    project_summary, summary_headers, write_summary, write_summary_csv, write_wide,
    write_wide_csv,
};
pub use pivot::pivot_monthly_averages;
pub use rollup::{compute_period_averages, roll_up, AggregatePeriod};
pub use schema::*;
pub use unit_cost::{derive_unit_cost, derive_unit_costs};
pub use utils::null_aware_mean;

use log::{debug, info};

pub struct MonthlyStatisticsProcessor;

impl MonthlyStatisticsProcessor {
    /// Reads every extract in `config.source_dir`, computes the statistics and
    /// writes the summary table (plus the wide table when requested).
    pub fn run(config: &StatisticsConfig) -> Result<ProcessingReport> {
        config.validate()?;
        info!(
            "Computing monthly unit costs from {}",
            config.source_dir.display()
        );

        let format = config.csv_format();
        let files = discover_source_files(&config.source_dir)?;
        let partitions = load_partitions(&files, format.delimiter)?;

        let rows_read: usize = partitions.iter().map(|p| p.rows_read).sum();
        let rows_missing_values: usize = partitions.iter().map(|p| p.rows_missing_values).sum();
        debug!(
            "Loaded {} rows from {} partitions ({} without quantity)",
            rows_read,
            partitions.len(),
            rows_missing_values
        );

        let mut engine = StatisticsEngine::new();
        let rows = engine.compute(partitions.into_iter().flat_map(|p| p.records))?;

        write_summary_csv(&config.output_path, &project_summary(&rows), &format)?;

        if config.include_monthly_columns {
            if let Some(wide_path) = &config.wide_output_path {
                write_wide_csv(wide_path, &rows, &format)?;
            }
        }

        let mut report = engine.into_report();
        report.files_read = files.len();
        report.rows_read = rows_read;
        report.rows_missing_values = rows_missing_values;

        info!(
            "Processed {} files: {} observations, {} product/entity rows",
            report.files_read, report.observations, report.output_rows
        );

        Ok(report)
    }

    pub fn process<I>(records: I) -> Result<Vec<SummaryRow>>
    where
        I: IntoIterator<Item = RawRecord>,
    {
        let rows = process_records(records)?;
        Ok(project_summary(&rows))
    }
}

pub fn process_monthly_statistics<I>(records: I) -> Result<Vec<SummaryRow>>
where
    I: IntoIterator<Item = RawRecord>,
{
    MonthlyStatisticsProcessor::process(records)
}

pub fn run_from_config(config: &StatisticsConfig) -> Result<ProcessingReport> {
    MonthlyStatisticsProcessor::run(config)
}
