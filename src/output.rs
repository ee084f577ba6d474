use crate::error::Result;
use crate::rollup::AggregatePeriod;
use crate::schema::{AggregateRow, CsvFormat, SummaryRow, MONTHS_PER_YEAR};
use crate::utils::format_optional;
use log::info;
use std::fs::File;
use std::io::Write;
use std::path::Path;

pub const KEY_COLUMNS: [&str; 2] = ["ProductCode", "EntityCode"];

/// Header of the emitted summary table.
pub fn summary_headers() -> Vec<&'static str> {
    KEY_COLUMNS
        .iter()
        .copied()
        .chain(AggregatePeriod::ALL.iter().map(|p| p.column_name()))
        .collect()
}

/// Header of the wide table: keys, months 1 to 12, then the period averages.
pub fn wide_headers() -> Vec<String> {
    let mut headers: Vec<String> = KEY_COLUMNS.iter().map(|c| c.to_string()).collect();
    headers.extend((1..=MONTHS_PER_YEAR).map(|m| m.to_string()));
    headers.extend(AggregatePeriod::ALL.iter().map(|p| p.column_name().to_string()));
    headers
}

/// Drops the monthly columns, keeping keys and period averages.
pub fn project_summary(rows: &[AggregateRow]) -> Vec<SummaryRow> {
    rows.iter().map(SummaryRow::from).collect()
}

fn summary_fields(row: &SummaryRow, null_value: &str) -> Vec<String> {
    let values = [
        row.q1,
        row.q2,
        row.q3,
        row.q4,
        row.first_half_year,
        row.second_half_year,
        row.one_year,
    ];

    let mut fields = vec![row.product_code.clone(), row.entity_code.clone()];
    fields.extend(values.iter().map(|v| format_optional(*v, null_value)));
    fields
}

pub fn write_summary<W: Write>(writer: W, rows: &[SummaryRow], format: &CsvFormat) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(format.delimiter)
        .from_writer(writer);

    csv_writer.write_record(summary_headers())?;
    for row in rows {
        csv_writer.write_record(summary_fields(row, &format.null_value))?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_summary_csv(path: &Path, rows: &[SummaryRow], format: &CsvFormat) -> Result<()> {
    let file = File::create(path)?;
    write_summary(file, rows, format)?;
    info!("Wrote {} summary rows to {}", rows.len(), path.display());
    Ok(())
}

pub fn write_wide<W: Write>(writer: W, rows: &[AggregateRow], format: &CsvFormat) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(format.delimiter)
        .from_writer(writer);

    csv_writer.write_record(wide_headers())?;
    for row in rows {
        let mut fields = vec![row.key.product_code.clone(), row.key.entity_code.clone()];
        fields.extend(row.months.iter().map(|v| format_optional(*v, &format.null_value)));
        fields.extend(
            AggregatePeriod::ALL
                .iter()
                .map(|p| format_optional(row.averages.get(*p), &format.null_value)),
        );
        csv_writer.write_record(&fields)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_wide_csv(path: &Path, rows: &[AggregateRow], format: &CsvFormat) -> Result<()> {
    let file = File::create(path)?;
    write_wide(file, rows, format)?;
    info!("Wrote {} wide rows to {}", rows.len(), path.display());
    Ok(())
}
