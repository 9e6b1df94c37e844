//! Column and timestamp normalization shared by the built-in sources

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use polars::prelude::{DataFrame, DataType, NamedFrom, Series};

use crate::frame::utc_datetime;
use crate::pipeline::TransformError;

pub const NAIVE_TIMESTAMP: &str = "naive_timestamp";
pub const TIMESTAMP_UTC: &str = "timestamp_utc";
pub const LAST_MODIFIED_UTC: &str = "last_modified_utc";

/// Converts one column of a frame into UTC datetimes in place
pub type TimestampParser = fn(&mut DataFrame, &str) -> Result<(), TransformError>;

/// Trim, replace spaces with underscores and lowercase
pub fn sanitize_column_name(name: &str) -> String {
    name.trim().replace(' ', "_").to_lowercase()
}

/// Rename every column of `frame` to its sanitized form
pub fn sanitize_columns(frame: &mut DataFrame) -> Result<(), TransformError> {
    let names: Vec<String> = frame.get_column_names().iter().map(|name| name.to_string()).collect();

    for name in names {
        let sanitized = sanitize_column_name(&name);
        if sanitized != name {
            frame.rename(&name, sanitized.into())?;
        }
    }
    Ok(())
}

/// Parse text timestamps; values without an offset are taken as UTC
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(ts.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|day| day.and_time(NaiveTime::MIN).and_utc())
}

fn invalid(column: &str, message: impl ToString) -> TransformError {
    TransformError::InvalidColumn {
        column: column.to_string(),
        message: message.to_string(),
    }
}

/// Column parser for text timestamps
pub fn text_timestamps(frame: &mut DataFrame, column: &str) -> Result<(), TransformError> {
    let strings = frame.column(column)?.str().map_err(|e| invalid(column, e))?;

    let millis = strings
        .into_iter()
        .enumerate()
        .map(|(row, cell)| match cell {
            None => Ok(None),
            Some(raw) => parse_timestamp(raw)
                .map(|ts| Some(ts.timestamp_millis()))
                .ok_or_else(|| invalid(column, format!("unparseable timestamp '{raw}' at row {row}"))),
        })
        .collect::<Result<Vec<Option<i64>>, _>>()?;

    let parsed = Series::new(column.into(), millis).cast(&utc_datetime())?;
    frame.with_column(parsed)?;
    Ok(())
}

/// Column parser for epoch-millisecond timestamps
pub fn epoch_millis_timestamps(frame: &mut DataFrame, column: &str) -> Result<(), TransformError> {
    let parsed = frame
        .column(column)?
        .as_materialized_series()
        .strict_cast(&DataType::Int64)
        .and_then(|millis| millis.cast(&utc_datetime()))
        .map_err(|e| invalid(column, e))?;

    frame.with_column(parsed)?;
    Ok(())
}

/// Sanitize names, convert both timestamp columns and rename
/// `naive_timestamp` to `timestamp_utc`
pub fn normalize(frame: &mut DataFrame, parse: TimestampParser) -> Result<(), TransformError> {
    sanitize_columns(frame)?;
    parse(frame, NAIVE_TIMESTAMP)?;
    frame.rename(NAIVE_TIMESTAMP, TIMESTAMP_UTC.into())?;
    parse(frame, LAST_MODIFIED_UTC)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn epoch_millis(frame: &DataFrame, column: &str) -> Vec<Option<i64>> {
        frame
            .column(column)
            .unwrap()
            .cast(&DataType::Int64)
            .unwrap()
            .i64()
            .unwrap()
            .into_iter()
            .collect()
    }

    #[test]
    fn test_sanitize_column_name() {
        assert_eq!(sanitize_column_name(" Naive_Timestamp "), "naive_timestamp");
        assert_eq!(sanitize_column_name("Last Modified utc"), "last_modified_utc");
        assert_eq!(sanitize_column_name(" Variable"), "variable");
    }

    #[test]
    fn test_sanitize_columns_renames_in_place() {
        let mut frame = polars::df!(" Variable" => &[1i64], "Last Modified utc" => &[2i64]).unwrap();
        sanitize_columns(&mut frame).unwrap();

        let names: Vec<String> = frame.get_column_names().iter().map(|n| n.to_string()).collect();
        assert_eq!(names, vec!["variable", "last_modified_utc"]);
    }

    #[test]
    fn test_parse_timestamp_forms() {
        let midnight = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2023-01-01"), Some(midnight));
        assert_eq!(parse_timestamp("2023-01-01 00:00:00"), Some(midnight));
        assert_eq!(parse_timestamp("2023-01-01T00:00:00"), Some(midnight));
        assert_eq!(parse_timestamp("2023-01-01T01:00:00+01:00"), Some(midnight));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_text_timestamps_become_utc_datetimes() {
        let mut frame = polars::df!("ts" => &[Some("2023-01-01"), None, Some("2023-01-02T00:00:00Z")]).unwrap();
        text_timestamps(&mut frame, "ts").unwrap();

        assert_eq!(frame.column("ts").unwrap().dtype(), &utc_datetime());
        assert_eq!(epoch_millis(&frame, "ts"), vec![Some(1672531200000), None, Some(1672617600000)]);
    }

    #[test]
    fn test_text_timestamps_reject_garbage() {
        let mut frame = polars::df!("ts" => &["2023-01-01", "soon"]).unwrap();
        let err = text_timestamps(&mut frame, "ts").unwrap_err();
        assert!(matches!(err, TransformError::InvalidColumn { ref column, .. } if column == "ts"));
    }

    #[test]
    fn test_epoch_millis_timestamps() {
        let mut frame = polars::df!("ts" => &[1672531200000i64]).unwrap();
        epoch_millis_timestamps(&mut frame, "ts").unwrap();

        assert_eq!(frame.column("ts").unwrap().dtype(), &utc_datetime());
        assert_eq!(epoch_millis(&frame, "ts"), vec![Some(1672531200000)]);

        let mut frame = polars::df!("ts" => &["soon"]).unwrap();
        assert!(epoch_millis_timestamps(&mut frame, "ts").is_err());
    }
}
