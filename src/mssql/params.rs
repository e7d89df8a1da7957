use std::borrow::Cow;

use tiberius::{ColumnData, IntoSql, Query};

use crate::types::SqlValue;

/// Owned conversion of a coerced value into a Tiberius column value.
impl<'a> IntoSql<'a> for SqlValue {
    fn into_sql(self) -> ColumnData<'a> {
        match self {
            SqlValue::Null => ColumnData::String(None),
            SqlValue::Bool(b) => ColumnData::Bit(Some(b)),
            SqlValue::Int(i) => ColumnData::I64(Some(i)),
            SqlValue::Float(f) => ColumnData::F64(Some(f)),
            SqlValue::Text(s) | SqlValue::Json(s) => ColumnData::String(Some(Cow::Owned(s))),
            SqlValue::Timestamp(dt) => dt.into_sql(),
            SqlValue::TimestampTz(dt) => dt.into_sql(),
        }
    }
}

/// Build a Tiberius query for `sql` (already using `@P1..@Pn`) with `params` bound in order.
pub fn bind_query_params<'a>(sql: &'a str, params: &[SqlValue]) -> Query<'a> {
    let mut query = Query::new(sql);
    for param in params {
        query.bind(param.clone());
    }
    query
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn maps_values_to_column_data() {
        assert!(matches!(SqlValue::Int(7).into_sql(), ColumnData::I64(Some(7))));
        assert!(matches!(SqlValue::Null.into_sql(), ColumnData::String(None)));
        assert!(matches!(
            SqlValue::Json(r#"{"a": "b"}"#.into()).into_sql(),
            ColumnData::String(Some(ref s)) if s == r#"{"a": "b"}"#
        ));
        let dt = NaiveDate::from_ymd_opt(2024, 3, 5)
            .and_then(|d| d.and_hms_opt(1, 2, 3))
            .unwrap();
        assert!(matches!(SqlValue::Timestamp(dt).into_sql(), ColumnData::DateTime2(Some(_))));
    }
}
