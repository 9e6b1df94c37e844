//! Helpers over polars frames shared by the sources and the orchestrator

use polars::prelude::{
    AnyValue, DataFrame, DataType, IntoColumn, LazyFrame, PolarsResult, Series, TimeUnit, UnionArgs,
    concat_lf_diagonal,
};
use serde_json::{Map, Value as Json};

/// Dtype every normalized timestamp column ends up with
pub fn utc_datetime() -> DataType {
    DataType::Datetime(TimeUnit::Milliseconds, Some("UTC".into()))
}

/// Stack frames vertically, aligning columns by name in first-seen order.
/// Columns missing from a frame are null-filled; clashing dtypes are widened.
pub fn concat_diagonal<I>(frames: I) -> PolarsResult<DataFrame>
where
    I: IntoIterator<Item = LazyFrame>,
{
    let frames: Vec<LazyFrame> = frames.into_iter().collect();
    if frames.is_empty() {
        return Ok(DataFrame::empty());
    }

    let args = UnionArgs {
        to_supertypes: true,
        ..UnionArgs::default()
    };
    concat_lf_diagonal(frames, args)?.collect()
}

fn json_cell(value: &Json) -> AnyValue<'static> {
    match value {
        Json::Null => AnyValue::Null,
        Json::Bool(b) => AnyValue::Boolean(*b),
        Json::Number(n) => match n.as_i64() {
            Some(i) => AnyValue::Int64(i),
            None => n.as_f64().map_or(AnyValue::Null, AnyValue::Float64),
        },
        Json::String(s) => AnyValue::StringOwned(s.as_str().into()),
        nested => AnyValue::StringOwned(nested.to_string().into()),
    }
}

/// Build a frame from JSON objects.
///
/// Columns follow key order, first record first; a key absent from a record
/// is null for that row.
pub fn from_records<'a, I>(records: I) -> PolarsResult<DataFrame>
where
    I: IntoIterator<Item = &'a Map<String, Json>>,
{
    let mut columns: Vec<(String, Vec<AnyValue<'static>>)> = Vec::new();
    let mut height = 0;

    for record in records {
        for (key, value) in record {
            let idx = match columns.iter().position(|(name, _)| name == key) {
                Some(idx) => idx,
                None => {
                    columns.push((key.clone(), vec![AnyValue::Null; height]));
                    columns.len() - 1
                }
            };
            columns[idx].1.push(json_cell(value));
        }

        height += 1;
        for (_, cells) in columns.iter_mut() {
            cells.resize(height, AnyValue::Null);
        }
    }

    let columns = columns
        .into_iter()
        .map(|(name, cells)| Series::from_any_values(name.into(), &cells, false).map(IntoColumn::into_column))
        .collect::<PolarsResult<Vec<_>>>()?;

    DataFrame::new(columns)
}
