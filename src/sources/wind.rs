use polars::prelude::{CsvReadOptions, DataFrame, IntoLazy, LazyFrame, SerReader};
use std::io::Cursor;

use crate::fetch::{FetchResult, Payload};
use crate::frame::concat_diagonal;
use crate::pipeline::{TransformError, Transformer};

use super::normalize::{normalize, text_timestamps};

/// Wind generation: one CSV document per day
#[derive(Debug, Clone, Copy, Default)]
pub struct WindTransformer;

impl WindTransformer {
    pub fn new() -> Self {
        Self
    }

    fn parse_day(result: &FetchResult) -> Result<LazyFrame, TransformError> {
        let text = match &result.payload {
            Payload::Csv(text) => text,
            other => {
                return Err(TransformError::UnexpectedPayload {
                    date: result.date,
                    expected: "csv",
                    found: other.kind(),
                });
            }
        };

        let frame = CsvReadOptions::default()
            .with_has_header(true)
            .into_reader_with_file_handle(Cursor::new(text.clone().into_bytes()))
            .finish()
            .map_err(|e| TransformError::Malformed {
                date: result.date,
                message: e.to_string(),
            })?;

        Ok(frame.lazy())
    }
}

impl Transformer for WindTransformer {
    fn transform(&self, payloads: &[FetchResult]) -> Result<DataFrame, TransformError> {
        let days = payloads.iter().map(Self::parse_day).collect::<Result<Vec<_>, _>>()?;

        let mut frame = concat_diagonal(days)?;
        normalize(&mut frame, text_timestamps)?;
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::utc_datetime;
    use crate::sources::normalize::{LAST_MODIFIED_UTC, TIMESTAMP_UTC};
    use chrono::NaiveDate;
    use polars::prelude::DataType;

    fn csv_day(day: u32, body: &str) -> FetchResult {
        FetchResult::new(NaiveDate::from_ymd_opt(2023, 1, day).unwrap(), Payload::Csv(body.to_string()))
    }

    fn sample_payloads() -> Vec<FetchResult> {
        vec![
            csv_day(
                1,
                "naive_timestamp, variable, value, last_modified_utc\n2023-01-01,729,38.0098121304,2023-01-01",
            ),
            csv_day(
                2,
                "naive_timestamp, variable, value, last_modified_utc\n2023-01-02,846,31.2335398111,2023-01-02",
            ),
        ]
    }

    #[test]
    fn test_transform_concatenates_in_date_order() {
        let frame = WindTransformer::new().transform(&sample_payloads()).unwrap();

        let names: Vec<String> = frame.get_column_names().iter().map(|n| n.to_string()).collect();
        assert_eq!(names, vec![TIMESTAMP_UTC, "variable", "value", LAST_MODIFIED_UTC]);
        assert_eq!(frame.height(), 2);

        assert_eq!(frame.column(TIMESTAMP_UTC).unwrap().dtype(), &utc_datetime());
        assert_eq!(frame.column(LAST_MODIFIED_UTC).unwrap().dtype(), &utc_datetime());
        let millis = frame.column(TIMESTAMP_UTC).unwrap().cast(&DataType::Int64).unwrap();
        assert_eq!(millis.i64().unwrap().get(0), Some(1672531200000));
        assert_eq!(millis.i64().unwrap().get(1), Some(1672617600000));

        let variable = frame.column("variable").unwrap().i64().unwrap();
        assert_eq!(variable.get(0), Some(729));
        assert_eq!(variable.get(1), Some(846));
        assert_eq!(frame.column("value").unwrap().f64().unwrap().get(0), Some(38.0098121304));
    }

    #[test]
    fn test_transform_rejects_json_payload() {
        let payloads = vec![FetchResult::new(
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            Payload::Json(serde_json::json!([])),
        )];
        let err = WindTransformer::new().transform(&payloads).unwrap_err();
        assert!(matches!(err, TransformError::UnexpectedPayload { expected: "csv", .. }));
    }

    #[test]
    fn test_transform_requires_timestamp_column() {
        let payloads = vec![csv_day(1, "variable,value\n1,2.0")];
        let err = WindTransformer::new().transform(&payloads).unwrap_err();
        assert!(matches!(err, TransformError::Polars(_)));
    }
}
