//! Frame encoders for the supported output formats

use polars::prelude::{CsvWriter, DataFrame, ParquetWriter, SerWriter};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::SinkError;

/// Decimal places for floating point cells in CSV output
pub const CSV_FLOAT_PRECISION: usize = 5;

const CSV_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%:z";

/// Output file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    #[default]
    Parquet,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Parquet => "parquet",
        }
    }

    /// Encode `frame` into the bytes of a complete file
    pub fn encode(&self, frame: &DataFrame) -> Result<Vec<u8>, SinkError> {
        match self {
            OutputFormat::Csv => encode_csv(frame),
            OutputFormat::Parquet => encode_parquet(frame),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = SinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "parquet" => Ok(OutputFormat::Parquet),
            other => Err(SinkError::InvalidFormat(other.to_string())),
        }
    }
}

/// CSV without a row index; floats use fixed precision
fn encode_csv(frame: &DataFrame) -> Result<Vec<u8>, SinkError> {
    let mut frame = frame.clone();
    let mut buffer = Vec::new();

    CsvWriter::new(&mut buffer)
        .include_header(true)
        .with_float_precision(Some(CSV_FLOAT_PRECISION))
        .with_datetime_format(Some(CSV_TIMESTAMP_FORMAT.to_string()))
        .finish(&mut frame)
        .map_err(|e| SinkError::Encode(format!("write csv: {e}")))?;

    Ok(buffer)
}

fn encode_parquet(frame: &DataFrame) -> Result<Vec<u8>, SinkError> {
    let mut frame = frame.clone();
    let mut buffer = Vec::new();

    ParquetWriter::new(&mut buffer)
        .finish(&mut frame)
        .map_err(|e| SinkError::Encode(format!("write parquet: {e}")))?;

    Ok(buffer)
}
