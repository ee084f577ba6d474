use crate::error::{MonthlyStatisticsError, Result};
use crate::schema::{MonthlyAverage, PivotRow, MONTHS_PER_YEAR};
use crate::utils::month_index;
use log::debug;
use std::collections::BTreeMap;

/// Reshapes long-form monthly averages into one wide row per (product, entity).
///
/// Every key present in `averages` appears exactly once, whatever subset of
/// months it covers, even when none of its averages carries a value. Months
/// without an average stay `None`. Rows are returned ordered by product code
/// then entity code.
///
/// A (key, month) pair must occur at most once; a repeat is reported as
/// [`MonthlyStatisticsError::DuplicateMonthlyAverage`].
pub fn pivot_monthly_averages<I>(averages: I) -> Result<Vec<PivotRow>>
where
    I: IntoIterator<Item = MonthlyAverage>,
{
    // A null average still occupies its month, so seen slots are tracked apart from values.
    let mut rows: BTreeMap<_, (PivotRow, [bool; MONTHS_PER_YEAR])> = BTreeMap::new();

    for average in averages {
        let slot = month_index(average.month);
        let (row, seen) = rows
            .entry(average.key.clone())
            .or_insert_with(|| (PivotRow::empty(average.key.clone()), [false; MONTHS_PER_YEAR]));

        if seen[slot] {
            return Err(MonthlyStatisticsError::DuplicateMonthlyAverage {
                product_code: average.key.product_code,
                entity_code: average.key.entity_code,
                month: average.month.number_from_month(),
            });
        }
        seen[slot] = true;
        row.months[slot] = average.unit_cost;
    }

    debug!("Pivoted monthly averages into {} rows", rows.len());

    Ok(rows.into_values().map(|(row, _)| row).collect())
}
