use crate::schema::{AggregateRow, PeriodAverages, PivotRow, MONTHS_PER_YEAR};
use crate::utils::null_aware_mean;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// The month ranges averaged into the summary table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregatePeriod {
    Q1,
    Q2,
    Q3,
    Q4,
    FirstHalfYear,
    /// August to December. July is not part of either half.
    SecondHalfYear,
    OneYear,
}

impl AggregatePeriod {
    /// All periods in output column order.
    pub const ALL: [AggregatePeriod; 7] = [
        AggregatePeriod::Q1,
        AggregatePeriod::Q2,
        AggregatePeriod::Q3,
        AggregatePeriod::Q4,
        AggregatePeriod::FirstHalfYear,
        AggregatePeriod::SecondHalfYear,
        AggregatePeriod::OneYear,
    ];

    /// Calendar month numbers (1-based, inclusive) covered by the period.
    pub fn months(self) -> RangeInclusive<u32> {
        match self {
            AggregatePeriod::Q1 => 1..=3,
            AggregatePeriod::Q2 => 4..=6,
            AggregatePeriod::Q3 => 7..=9,
            AggregatePeriod::Q4 => 10..=12,
            AggregatePeriod::FirstHalfYear => 1..=6,
            AggregatePeriod::SecondHalfYear => 8..=12,
            AggregatePeriod::OneYear => 1..=12,
        }
    }

    pub fn column_name(self) -> &'static str {
        match self {
            AggregatePeriod::Q1 => "Q1",
            AggregatePeriod::Q2 => "Q2",
            AggregatePeriod::Q3 => "Q3",
            AggregatePeriod::Q4 => "Q4",
            AggregatePeriod::FirstHalfYear => "first half year",
            AggregatePeriod::SecondHalfYear => "second half year",
            AggregatePeriod::OneYear => "one year",
        }
    }

    /// Null-aware mean over the period's slots of a full calendar year.
    pub fn mean(self, months: &[Option<f64>; MONTHS_PER_YEAR]) -> Option<f64> {
        let range = self.months();
        let start = *range.start() as usize - 1;
        let end = *range.end() as usize;
        null_aware_mean(months[start..end].iter().copied())
    }
}

impl PeriodAverages {
    pub fn get(&self, period: AggregatePeriod) -> Option<f64> {
        match period {
            AggregatePeriod::Q1 => self.q1,
            AggregatePeriod::Q2 => self.q2,
            AggregatePeriod::Q3 => self.q3,
            AggregatePeriod::Q4 => self.q4,
            AggregatePeriod::FirstHalfYear => self.first_half_year,
            AggregatePeriod::SecondHalfYear => self.second_half_year,
            AggregatePeriod::OneYear => self.one_year,
        }
    }
}

pub fn compute_period_averages(row: &PivotRow) -> PeriodAverages {
    let months = &row.months;
    PeriodAverages {
        q1: AggregatePeriod::Q1.mean(months),
        q2: AggregatePeriod::Q2.mean(months),
        q3: AggregatePeriod::Q3.mean(months),
        q4: AggregatePeriod::Q4.mean(months),
        first_half_year: AggregatePeriod::FirstHalfYear.mean(months),
        second_half_year: AggregatePeriod::SecondHalfYear.mean(months),
        one_year: AggregatePeriod::OneYear.mean(months),
    }
}

pub fn roll_up_row(row: PivotRow) -> AggregateRow {
    let averages = compute_period_averages(&row);
    AggregateRow {
        key: row.key,
        months: row.months,
        averages,
    }
}

/// Adds the period averages to every pivot row. Rows are independent and are
/// processed on the rayon pool; the input order is kept.
pub fn roll_up(rows: Vec<PivotRow>) -> Vec<AggregateRow> {
    rows.into_par_iter().map(roll_up_row).collect()
}
