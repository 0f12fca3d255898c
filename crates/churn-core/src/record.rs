//! Raw attribute records
//!
//! A record is the flat key/value body of a single prediction request. It is
//! built per request, encoded once and dropped.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::{ChurnError, Result};
use crate::schema::FeatureSchema;

/// A raw attribute value as sent by the client
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Text(String),
    Number(f64),
}

impl RawValue {
    /// Interpret as a float, accepting numeric strings
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RawValue::Number(n) => Some(*n),
            RawValue::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }

    /// Interpret as an integer. Numbers must have no fractional part.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            RawValue::Number(n) if n.is_finite() && n.fract() == 0.0 => Some(*n as i64),
            RawValue::Number(_) => None,
            RawValue::Text(s) => s.trim().parse::<i64>().ok(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            RawValue::Text(s) => Some(s),
            RawValue::Number(_) => None,
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Number(value as f64)
    }
}

/// Attribute name to raw value, one entry per recognised field
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    values: HashMap<String, RawValue>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a request body.
    ///
    /// The body must be an object. `null` counts as absent. Keys the schema
    /// does not read are dropped whatever their type. Numeric columns must
    /// hold a string or a number; any other value in a categorical field is
    /// treated as absent.
    pub fn from_json(body: &Value, schema: &FeatureSchema) -> Result<Self> {
        let object = body.as_object().ok_or_else(|| {
            ChurnError::MalformedRequest(format!(
                "expected a JSON object, got {}",
                json_type_name(body)
            ))
        })?;

        let mut record = Self::new();
        for (key, value) in object {
            if !schema.uses_field(key) {
                continue;
            }
            match value {
                Value::Null => {}
                Value::String(s) => record.insert(key.clone(), s.as_str()),
                Value::Number(n) => {
                    let n = n.as_f64().ok_or_else(|| {
                        ChurnError::MalformedRequest(format!("{} is not representable as a float", key))
                    })?;
                    record.insert(key.clone(), n);
                }
                other if schema.range(key).is_some() => {
                    return Err(ChurnError::MalformedRequest(format!(
                        "{} must be a string or number, got {}",
                        key,
                        json_type_name(other)
                    )))
                }
                other => {
                    tracing::debug!(
                        field = %key,
                        "categorical value is a {}, treated as absent",
                        json_type_name(other)
                    );
                }
            }
        }
        Ok(record)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<RawValue>) {
        self.values.insert(name.into(), value.into());
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&RawValue> {
        self.values.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<RawValue> {
        self.values.remove(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
