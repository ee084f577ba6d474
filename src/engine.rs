use crate::aggregation::MonthlyAggregator;
use crate::error::Result;
use crate::pivot::pivot_monthly_averages;
use crate::rollup::roll_up;
use crate::schema::{AggregateRow, RawRecord};
use crate::unit_cost::derive_unit_costs;
use log::debug;
use serde::{Deserialize, Serialize};

/// Counters collected while a run moves through the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingReport {
    pub files_read: usize,
    pub rows_read: usize,
    pub rows_missing_values: usize,
    pub records: usize,
    pub zero_quantity_dropped: usize,
    pub observations: usize,
    pub monthly_averages: usize,
    pub output_rows: usize,
}

/// Runs unit-cost derivation, monthly aggregation, pivoting and the period rollup.
#[derive(Debug, Default)]
pub struct StatisticsEngine {
    report: ProcessingReport,
}

impl StatisticsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&self) -> &ProcessingReport {
        &self.report
    }

    pub fn into_report(self) -> ProcessingReport {
        self.report
    }

    pub fn compute<I>(&mut self, records: I) -> Result<Vec<AggregateRow>>
    where
        I: IntoIterator<Item = RawRecord>,
    {
        let mut record_count = 0usize;
        let counted = records.into_iter().inspect(|_| record_count += 1);

        let mut aggregator = MonthlyAggregator::new();
        aggregator.extend(derive_unit_costs(counted));

        let observations = aggregator.observation_count();
        self.report.records += record_count;
        self.report.observations += observations;
        self.report.zero_quantity_dropped += record_count - observations;
        debug!(
            "Derived {} unit costs from {} records ({} with zero quantity)",
            observations,
            record_count,
            record_count - observations
        );

        let averages = aggregator.finish();
        self.report.monthly_averages += averages.len();

        let pivoted = pivot_monthly_averages(averages)?;
        let rows = roll_up(pivoted);
        self.report.output_rows += rows.len();

        Ok(rows)
    }
}

/// Computes the aggregate table for a set of records.
pub fn process_records<I>(records: I) -> Result<Vec<AggregateRow>>
where
    I: IntoIterator<Item = RawRecord>,
{
    StatisticsEngine::new().compute(records)
}
