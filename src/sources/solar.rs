use polars::prelude::DataFrame;
use serde_json::{Map, Value as Json};

use crate::fetch::{FetchResult, Payload};
use crate::frame::from_records;
use crate::pipeline::{TransformError, Transformer};

use super::normalize::{epoch_millis_timestamps, normalize};

/// Solar generation: one JSON array of records per day, timestamps in epoch ms
#[derive(Debug, Clone, Copy, Default)]
pub struct SolarTransformer;

impl SolarTransformer {
    pub fn new() -> Self {
        Self
    }

    fn day_records(result: &FetchResult) -> Result<Vec<&Map<String, Json>>, TransformError> {
        let records = match &result.payload {
            Payload::Json(Json::Array(records)) => records,
            Payload::Json(_) => {
                return Err(TransformError::Malformed {
                    date: result.date,
                    message: "expected a JSON array of records".to_string(),
                });
            }
            other => {
                return Err(TransformError::UnexpectedPayload {
                    date: result.date,
                    expected: "json",
                    found: other.kind(),
                });
            }
        };

        records
            .iter()
            .map(|record| {
                record.as_object().ok_or_else(|| TransformError::Malformed {
                    date: result.date,
                    message: format!("expected a JSON object, got {record}"),
                })
            })
            .collect()
    }
}

impl Transformer for SolarTransformer {
    fn transform(&self, payloads: &[FetchResult]) -> Result<DataFrame, TransformError> {
        let mut records = Vec::new();
        for payload in payloads {
            records.extend(Self::day_records(payload)?);
        }

        let mut frame = from_records(records)?;
        normalize(&mut frame, epoch_millis_timestamps)?;
        Ok(frame)
    }
}
