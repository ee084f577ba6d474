use crate::error::{MonthlyStatisticsError, Result};
use chrono::Month;

/// Converts a 1-based month number into a `chrono::Month`.
pub fn month_from_number(number: i64) -> Result<Month> {
    if !(1..=12).contains(&number) {
        return Err(MonthlyStatisticsError::InvalidMonth(number));
    }
    Month::try_from(number as u8).map_err(|_| MonthlyStatisticsError::InvalidMonth(number))
}

/// 0-based slot of a month inside a pivot row (January = 0).
pub fn month_index(month: Month) -> usize {
    month.number_from_month() as usize - 1
}

/// Mean of the present values; `None` when nothing is present.
pub fn null_aware_mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let (sum, count) = values
        .into_iter()
        .flatten()
        .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));

    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

pub fn format_optional(value: Option<f64>, null_value: &str) -> String {
    match value {
        Some(v) => v.to_string(),
        None => null_value.to_string(),
    }
}
