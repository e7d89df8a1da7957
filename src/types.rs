use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde_json::Value as JsonValue;

use crate::error::SprocError;

/// Declared type of a stored-procedure parameter.
///
/// Parsed from the short tags callers use in a parameter set:
/// ```rust
/// use sproc_middleware::prelude::*;
///
/// assert_eq!(ParamType::from_tag("datetime"), ParamType::DateTime);
/// assert_eq!(ParamType::from_tag("money"), ParamType::Unknown("money".into()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamType {
    /// `"str"`
    Str,
    /// `"int"`
    Int,
    /// `"float"`
    Float,
    /// `"datetime"`, an ISO-8601 timestamp
    DateTime,
    /// `"json"`, any structured value serialized to text
    Json,
    /// Any other tag; handled according to [`UnknownTypePolicy`](crate::config::UnknownTypePolicy).
    Unknown(String),
}

impl ParamType {
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "str" => ParamType::Str,
            "int" => ParamType::Int,
            "float" => ParamType::Float,
            "datetime" => ParamType::DateTime,
            "json" => ParamType::Json,
            other => ParamType::Unknown(other.to_string()),
        }
    }

    #[must_use]
    pub fn tag(&self) -> &str {
        match self {
            ParamType::Str => "str",
            ParamType::Int => "int",
            ParamType::Float => "float",
            ParamType::DateTime => "datetime",
            ParamType::Json => "json",
            ParamType::Unknown(tag) => tag,
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A value ready to be bound to a statement placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL value
    Null,
    /// Boolean value (bit)
    Bool(bool),
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Timestamp without offset (datetime2)
    Timestamp(NaiveDateTime),
    /// Timestamp with offset (datetimeoffset)
    TimestampTz(DateTime<FixedOffset>),
    /// Serialized JSON text
    Json(String),
}

impl SqlValue {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        if let SqlValue::Int(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        if let SqlValue::Float(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    /// Text of a `Text` or `Json` value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            SqlValue::Text(value) | SqlValue::Json(value) => Some(value),
            _ => None,
        }
    }
}

/// One named parameter with its declared type and the raw value to convert.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    pub name: String,
    pub declared: ParamType,
    pub raw: JsonValue,
}

impl ParameterSpec {
    pub fn new(name: impl Into<String>, declared: ParamType, raw: JsonValue) -> Self {
        Self {
            name: name.into(),
            declared,
            raw,
        }
    }

    /// Read a `[type_tag, value]` entry.
    ///
    /// # Errors
    /// Returns `SprocError::InvalidParameterShape` unless `entry` is a two-element array.
    ///
    /// A type tag that is not a string is kept as [`ParamType::Unknown`] holding its JSON text.
    pub fn from_entry(name: &str, entry: &JsonValue) -> Result<Self, SprocError> {
        let shape_error = |found: String| SprocError::InvalidParameterShape {
            name: name.to_string(),
            found,
        };
        match entry {
            JsonValue::Array(items) if items.len() == 2 => match &items[0] {
                JsonValue::String(tag) => Ok(Self::new(name, ParamType::from_tag(tag), items[1].clone())),
                other => Ok(Self::new(name, ParamType::Unknown(other.to_string()), items[1].clone())),
            },
            JsonValue::Array(items) => Err(shape_error(format!("an array of {} elements", items.len()))),
            other => Err(shape_error(describe(other).to_string())),
        }
    }
}

fn describe(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

/// Named parameters for one procedure call.
///
/// Entries are kept sorted by name, and that order is the placeholder order of the generated
/// statement. Build one from JSON or directly:
/// ```rust
/// use serde_json::json;
/// use sproc_middleware::prelude::*;
///
/// let from_json = ParameterSet::from_json(&json!({
///     "FormId": ["int", 42],
///     "Note": ["str", "purged"],
/// }))?;
/// let built = ParameterSet::new()
///     .with("Note", ParamType::Str, json!("purged"))
///     .with("FormId", ParamType::Int, json!(42));
/// assert_eq!(from_json, built);
/// assert_eq!(built.names().collect::<Vec<_>>(), ["FormId", "Note"]);
/// # Ok::<(), SprocError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    entries: BTreeMap<String, JsonValue>,
}

impl ParameterSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object mapping names to `[type_tag, value]` entries.
    ///
    /// Entries are not validated here; malformed ones are reported when the call runs.
    ///
    /// # Errors
    /// Returns `SprocError::InvalidParameterShape` if `value` is not an object.
    pub fn from_json(value: &JsonValue) -> Result<Self, SprocError> {
        match value {
            JsonValue::Object(map) => Ok(Self {
                entries: map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            }),
            JsonValue::Null => Ok(Self::new()),
            other => Err(SprocError::InvalidParameterShape {
                name: "<parameters>".to_string(),
                found: describe(other).to_string(),
            }),
        }
    }

    /// Add a typed parameter.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, declared: ParamType, raw: JsonValue) -> Self {
        self.insert(name, declared, raw);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, declared: ParamType, raw: JsonValue) {
        let entry = JsonValue::Array(vec![JsonValue::String(declared.tag().to_string()), raw]);
        self.entries.insert(name.into(), entry);
    }

    /// Add a raw entry without checking its shape.
    pub fn insert_entry(&mut self, name: impl Into<String>, entry: JsonValue) {
        self.entries.insert(name.into(), entry);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Parameter names in placeholder order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Raw entries in placeholder order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &JsonValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Name of a catalog object to `EXEC`, possibly schema-qualified.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProcedureName(String);

impl ProcedureName {
    /// # Errors
    /// Returns `SprocError::InvalidProcedureName` if `name` is empty or only whitespace.
    pub fn new(name: impl Into<String>) -> Result<Self, SprocError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(SprocError::InvalidProcedureName);
        }
        Ok(Self(name))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProcedureName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for ProcedureName {
    type Error = SprocError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tags_round_trip() {
        for tag in ["str", "int", "float", "datetime", "json", "decimal"] {
            assert_eq!(ParamType::from_tag(tag).tag(), tag);
        }
    }

    #[test]
    fn entry_must_be_a_pair() {
        let ok = ParameterSpec::from_entry("a", &json!(["int", "5"])).unwrap();
        assert_eq!(ok.declared, ParamType::Int);
        assert_eq!(ok.raw, json!("5"));

        for bad in [json!(5), json!(["int"]), json!(["int", 1, 2]), json!(null)] {
            let err = ParameterSpec::from_entry("a", &bad).unwrap_err();
            assert!(matches!(err, SprocError::InvalidParameterShape { .. }), "{bad}");
        }
    }

    #[test]
    fn non_string_tag_is_an_unknown_type() {
        let spec = ParameterSpec::from_entry("X", &json!([1, "x"])).unwrap();
        assert_eq!(spec.declared, ParamType::Unknown("1".into()));
        assert_eq!(spec.raw, json!("x"));

        let spec = ParameterSpec::from_entry("Y", &json!([null, 3])).unwrap();
        assert_eq!(spec.declared, ParamType::Unknown("null".into()));
    }

    #[test]
    fn procedure_name_rejects_blank() {
        assert!(ProcedureName::new("  ").is_err());
        assert_eq!(
            ProcedureName::new("RPA.journalizing.sp_UpdatePurgeMarker")
                .unwrap()
                .as_str(),
            "RPA.journalizing.sp_UpdatePurgeMarker"
        );
    }

    #[test]
    fn parameter_set_rejects_non_objects() {
        assert!(ParameterSet::from_json(&json!([1, 2])).is_err());
        assert!(ParameterSet::from_json(&json!(null)).unwrap().is_empty());
    }
}
