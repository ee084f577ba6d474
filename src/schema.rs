use crate::error::{MonthlyStatisticsError, Result};
use crate::utils::{month_from_number, month_index};
use chrono::Month;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Number of monthly slots in a pivot row.
pub const MONTHS_PER_YEAR: usize = 12;

/// Identifies one output row: a product traded by an entity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SeriesKey {
    pub product_code: String,
    pub entity_code: String,
}

impl SeriesKey {
    pub fn new(product_code: impl Into<String>, entity_code: impl Into<String>) -> Self {
        Self {
            product_code: product_code.into(),
            entity_code: entity_code.into(),
        }
    }
}

/// One transaction line from a monthly extract.
///
/// The month is a `chrono::Month`, so a record can only exist for a valid
/// calendar month. Construct from raw integers with [`RawRecord::new`].
/// A missing amount is kept as `None`: the line still registers its key.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub month: Month,
    pub quantity: f64,
    pub amount: Option<f64>,
    pub product_code: String,
    pub entity_code: String,
}

impl RawRecord {
    pub fn new(
        month: u32,
        quantity: f64,
        amount: f64,
        product_code: impl Into<String>,
        entity_code: impl Into<String>,
    ) -> Result<Self> {
        Self::with_optional_amount(month, quantity, Some(amount), product_code, entity_code)
    }

    pub fn with_optional_amount(
        month: u32,
        quantity: f64,
        amount: Option<f64>,
        product_code: impl Into<String>,
        entity_code: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            month: month_from_number(i64::from(month))?,
            quantity,
            amount,
            product_code: product_code.into(),
            entity_code: entity_code.into(),
        })
    }

    pub fn key(&self) -> SeriesKey {
        SeriesKey::new(self.product_code.clone(), self.entity_code.clone())
    }
}

/// Amount per unit for a single record with a non-zero quantity.
/// `None` when the record had no amount.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitCostObservation {
    pub key: SeriesKey,
    pub month: Month,
    pub unit_cost: Option<f64>,
}

/// Mean unit cost of every observation sharing a (product, entity, month) key.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyAverage {
    pub key: SeriesKey,
    pub month: Month,
    /// `None` when no observation in the group carried a unit cost.
    pub unit_cost: Option<f64>,
    /// How many unit costs went into the mean.
    pub observations: usize,
}

/// Wide form of a series: one optional value per calendar month.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotRow {
    pub key: SeriesKey,
    pub months: [Option<f64>; MONTHS_PER_YEAR],
}

impl PivotRow {
    pub fn empty(key: SeriesKey) -> Self {
        Self {
            key,
            months: [None; MONTHS_PER_YEAR],
        }
    }

    pub fn get(&self, month: Month) -> Option<f64> {
        self.months[month_index(month)]
    }

    /// Months that carry a value, in calendar order.
    pub fn populated_months(&self) -> Vec<Month> {
        self.months
            .iter()
            .enumerate()
            .filter(|(_, value)| value.is_some())
            .filter_map(|(idx, _)| month_from_number(idx as i64 + 1).ok())
            .collect()
    }
}

/// Null-aware period means derived from a pivot row.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PeriodAverages {
    pub q1: Option<f64>,
    pub q2: Option<f64>,
    pub q3: Option<f64>,
    pub q4: Option<f64>,
    pub first_half_year: Option<f64>,
    pub second_half_year: Option<f64>,
    pub one_year: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRow {
    pub key: SeriesKey,
    pub months: [Option<f64>; MONTHS_PER_YEAR],
    pub averages: PeriodAverages,
}

/// The emitted shape: keys plus the seven period averages, monthly values dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    #[serde(rename = "ProductCode")]
    pub product_code: String,
    #[serde(rename = "EntityCode")]
    pub entity_code: String,
    #[serde(rename = "Q1")]
    pub q1: Option<f64>,
    #[serde(rename = "Q2")]
    pub q2: Option<f64>,
    #[serde(rename = "Q3")]
    pub q3: Option<f64>,
    #[serde(rename = "Q4")]
    pub q4: Option<f64>,
    #[serde(rename = "first half year")]
    pub first_half_year: Option<f64>,
    #[serde(rename = "second half year")]
    pub second_half_year: Option<f64>,
    #[serde(rename = "one year")]
    pub one_year: Option<f64>,
}

impl From<&AggregateRow> for SummaryRow {
    fn from(row: &AggregateRow) -> Self {
        let averages = row.averages;
        Self {
            product_code: row.key.product_code.clone(),
            entity_code: row.key.entity_code.clone(),
            q1: averages.q1,
            q2: averages.q2,
            q3: averages.q3,
            q4: averages.q4,
            first_half_year: averages.first_half_year,
            second_half_year: averages.second_half_year,
            one_year: averages.one_year,
        }
    }
}

fn default_output_path() -> PathBuf {
    PathBuf::from("p.csv")
}

fn default_delimiter() -> char {
    ','
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StatisticsConfig {
    #[schemars(
        description = "Directory holding the monthly transaction extracts. Every regular file whose name contains '.csv' is read."
    )]
    pub source_dir: PathBuf,

    #[serde(default = "default_output_path")]
    #[schemars(description = "Where the summary table (keys plus period averages) is written. Defaults to 'p.csv'.")]
    pub output_path: PathBuf,

    #[serde(default = "default_delimiter")]
    #[schemars(description = "Single ASCII field delimiter used for both input and output files.")]
    pub delimiter: char,

    #[serde(default)]
    #[schemars(description = "Text written for a missing average. Defaults to an empty field.")]
    pub null_value: String,

    #[serde(default)]
    #[schemars(
        description = "If true, also write the wide table including the twelve monthly columns to 'wide_output_path'."
    )]
    pub include_monthly_columns: bool,

    #[serde(default)]
    #[schemars(description = "Destination of the wide table. Required when 'include_monthly_columns' is true.")]
    pub wide_output_path: Option<PathBuf>,
}

impl StatisticsConfig {
    pub fn new(source_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            output_path: default_output_path(),
            delimiter: default_delimiter(),
            null_value: String::new(),
            include_monthly_columns: false,
            wide_output_path: None,
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.delimiter.is_ascii() {
            return Err(MonthlyStatisticsError::ConfigError(format!(
                "delimiter '{}' is not a single ASCII character",
                self.delimiter
            )));
        }

        if self.include_monthly_columns && self.wide_output_path.is_none() {
            return Err(MonthlyStatisticsError::ConfigError(
                "include_monthly_columns is set but wide_output_path is missing".to_string(),
            ));
        }

        Ok(())
    }

    pub fn csv_format(&self) -> CsvFormat {
        CsvFormat {
            delimiter: self.delimiter as u8,
            null_value: self.null_value.clone(),
        }
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(StatisticsConfig)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

/// Field delimiter and null marker shared by the readers and writers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvFormat {
    pub delimiter: u8,
    pub null_value: String,
}

impl Default for CsvFormat {
    fn default() -> Self {
        Self {
            delimiter: b',',
            null_value: String::new(),
        }
    }
}
