//! Boundary validation for histograms that arrive already built.

use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;

use super::HistogramSummary;

/// JSON kinds a histogram field may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Float,
    List,
}

impl FieldKind {
    fn matches(self, value: &Value) -> bool {
        match self {
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Float => value.is_f64(),
            Self::List => value.is_array(),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::List => "list",
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kinds: &'static [FieldKind],
    pub required: bool,
}

/// Field table of a pre-built histogram.
#[derive(Debug, Clone, Copy)]
pub struct HistogramSchema {
    pub fields: &'static [FieldSpec],
}

const NUMBER: &[FieldKind] = &[FieldKind::Float, FieldKind::Integer];

pub const HISTOGRAM_SCHEMA: HistogramSchema = HistogramSchema {
    fields: &[
        FieldSpec { name: "min", kinds: NUMBER, required: true },
        FieldSpec { name: "max", kinds: NUMBER, required: true },
        FieldSpec { name: "num", kinds: &[FieldKind::Integer], required: true },
        FieldSpec { name: "bucket_limit", kinds: &[FieldKind::List], required: true },
        FieldSpec { name: "bucket", kinds: &[FieldKind::List], required: true },
        FieldSpec { name: "sum", kinds: NUMBER, required: false },
        FieldSpec { name: "sum_squares", kinds: NUMBER, required: false },
    ],
};

#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("histogram should be an object and is {0}")]
    NotAnObject(&'static str),

    #[error("Missing argument {0} to the given histogram")]
    Missing(&'static str),

    #[error("Argument {field} should be of type {expected} and is {actual}")]
    WrongType {
        field: &'static str,
        expected: String,
        actual: &'static str,
    },

    #[error("Argument {field} should only contain numbers, element {index} is {actual}")]
    NonNumericElement {
        field: &'static str,
        index: usize,
        actual: &'static str,
    },
}

/// Name of a JSON value's kind, as reported in error messages.
pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

impl HistogramSchema {
    /// Checks every field against the table, then converts.
    pub fn validate(&self, value: &Value) -> Result<HistogramSummary, SchemaError> {
        let object = value
            .as_object()
            .ok_or_else(|| SchemaError::NotAnObject(kind_name(value)))?;

        for spec in self.fields {
            match object.get(spec.name) {
                None if spec.required => return Err(SchemaError::Missing(spec.name)),
                None => {}
                Some(v) if spec.kinds.iter().any(|k| k.matches(v)) => {}
                Some(v) => {
                    let expected = spec
                        .kinds
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(" or ");
                    return Err(SchemaError::WrongType {
                        field: spec.name,
                        expected,
                        actual: kind_name(v),
                    });
                }
            }
        }

        Ok(HistogramSummary {
            min: number(object, "min"),
            max: number(object, "max"),
            num: number(object, "num"),
            sum: object.get("sum").and_then(Value::as_f64),
            sum_squares: object.get("sum_squares").and_then(Value::as_f64),
            bucket_limit: numbers(object, "bucket_limit")?,
            bucket: numbers(object, "bucket")?,
        })
    }
}

// Fields are already type-checked when these run.

fn number(object: &Map<String, Value>, field: &str) -> f64 {
    object.get(field).and_then(Value::as_f64).unwrap_or_default()
}

fn numbers(object: &Map<String, Value>, field: &'static str) -> Result<Vec<f64>, SchemaError> {
    let items = object
        .get(field)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            item.as_f64().ok_or(SchemaError::NonNumericElement {
                field,
                index,
                actual: kind_name(item),
            })
        })
        .collect()
}
