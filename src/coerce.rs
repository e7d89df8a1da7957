//! Conversion of declared-type/raw-value pairs into bindable [`SqlValue`]s.

use std::io;

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::config::UnknownTypePolicy;
use crate::error::SprocError;
use crate::types::{ParamType, ParameterSet, ParameterSpec, SqlValue};

mod iso8601;

pub use iso8601::parse_iso8601;

/// Convert one parameter to the value that will be bound for it.
///
/// # Errors
/// Returns `SprocError::TypeCoercion` when the raw value does not fit the declared type, and
/// `SprocError::UnknownParamType` for an unknown tag under [`UnknownTypePolicy::Reject`].
pub fn coerce(spec: &ParameterSpec, policy: UnknownTypePolicy) -> Result<SqlValue, SprocError> {
    let fail = |reason: String| SprocError::TypeCoercion {
        name: spec.name.clone(),
        target: spec.declared.clone(),
        reason,
    };

    match &spec.declared {
        ParamType::Str => Ok(coerce_str(&spec.raw)),
        ParamType::Int => coerce_int(&spec.raw).map(SqlValue::Int).map_err(fail),
        ParamType::Float => coerce_float(&spec.raw).map(SqlValue::Float).map_err(fail),
        ParamType::DateTime => match &spec.raw {
            JsonValue::String(s) => parse_iso8601(s)
                .ok_or_else(|| fail(format!("`{s}` is not an ISO-8601 timestamp"))),
            other => Err(fail(format!("expected an ISO-8601 string, found {other}"))),
        },
        ParamType::Json => to_json_text(&spec.raw)
            .map(SqlValue::Json)
            .map_err(|e| fail(e.to_string())),
        ParamType::Unknown(tag) => match policy {
            UnknownTypePolicy::PassThrough => {
                tracing::warn!(
                    parameter = %spec.name,
                    tag = %tag,
                    "unknown parameter type; binding raw value unchanged"
                );
                Ok(pass_through(&spec.raw))
            }
            UnknownTypePolicy::Reject => Err(SprocError::UnknownParamType {
                name: spec.name.clone(),
                tag: tag.clone(),
            }),
        },
    }
}

/// Validate and convert every entry of a parameter set, in placeholder order.
///
/// # Errors
/// Stops at the first entry that is malformed or cannot be converted.
pub fn coerce_all(
    params: &ParameterSet,
    policy: UnknownTypePolicy,
) -> Result<Vec<(String, SqlValue)>, SprocError> {
    params
        .entries()
        .map(|(name, entry)| {
            let spec = ParameterSpec::from_entry(name, entry)?;
            let value = coerce(&spec, policy)?;
            Ok((spec.name, value))
        })
        .collect()
}

fn coerce_str(raw: &JsonValue) -> SqlValue {
    match raw {
        JsonValue::String(s) => SqlValue::Text(s.clone()),
        JsonValue::Null => SqlValue::Null,
        JsonValue::Bool(b) => SqlValue::Text(b.to_string()),
        JsonValue::Number(n) => SqlValue::Text(n.to_string()),
        structured => SqlValue::Text(structured.to_string()),
    }
}

fn coerce_int(raw: &JsonValue) -> Result<i64, String> {
    match raw {
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(i);
            }
            match n.as_f64() {
                // exclusive upper bound: i64::MAX is not representable as f64
                Some(f) if f.is_finite() && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
                    Ok(f.trunc() as i64)
                }
                _ => Err(format!("{n} does not fit in a 64-bit integer")),
            }
        }
        JsonValue::Bool(b) => Ok(i64::from(*b)),
        JsonValue::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|e| format!("`{s}` is not an integer ({e})")),
        other => Err(format!("expected a number or numeric string, found {other}")),
    }
}

fn coerce_float(raw: &JsonValue) -> Result<f64, String> {
    match raw {
        JsonValue::Number(n) => n
            .as_f64()
            .ok_or_else(|| format!("{n} is not representable as a float")),
        JsonValue::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        JsonValue::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| format!("`{s}` is not a number ({e})")),
        other => Err(format!("expected a number or numeric string, found {other}")),
    }
}

/// Serialize `value` the way the stored procedures expect JSON text: `", "` between items,
/// `": "` between key and value, non-ASCII characters written as-is.
///
/// # Errors
/// Returns the serializer error if `value` cannot be written.
pub fn to_json_text(value: &JsonValue) -> Result<String, serde_json::Error> {
    let mut buf = Vec::with_capacity(64);
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
    value.serialize(&mut ser)?;
    // serde_json only ever writes valid UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

struct SpacedFormatter;

impl serde_json::ser::Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

fn pass_through(raw: &JsonValue) -> SqlValue {
    match raw {
        JsonValue::Null => SqlValue::Null,
        JsonValue::Bool(b) => SqlValue::Bool(*b),
        JsonValue::String(s) => SqlValue::Text(s.clone()),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Int(i),
            None => SqlValue::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        structured => SqlValue::Json(to_json_text(structured).unwrap_or_else(|_| structured.to_string())),
    }
}
