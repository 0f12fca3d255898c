//! Feature encoder
//!
//! Rebuilds the numeric feature vector the model was trained on from a raw
//! attribute record:
//!
//! - numeric columns are cast to `f64` and min-max scaled with the fixed
//!   training ranges (never recomputed, never clamped)
//! - each categorical field becomes a group of 0/1 indicator columns
//! - the output order is the schema order, numeric columns first
//!
//! Categorical values outside a field's domain, and absent categorical
//! fields, leave the whole group at zero. This is not an error.

use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::{ChurnError, Result};
use crate::record::{RawRecord, RawValue};
use crate::schema::{CategoricalField, CategoryValue, FeatureSchema};

/// One encoded row, laid out as the schema declares
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    /// Normalized numeric columns
    pub numeric: Vec<f64>,
    /// One-hot indicator columns
    pub one_hot: Vec<u8>,
}

impl FeatureVector {
    /// Total number of columns
    pub fn width(&self) -> usize {
        self.numeric.len() + self.one_hot.len()
    }

    /// Dense row: numeric columns followed by indicators as floats
    pub fn to_dense(&self) -> Vec<f64> {
        self.numeric
            .iter()
            .copied()
            .chain(self.one_hot.iter().map(|&v| f64::from(v)))
            .collect()
    }

    /// Indicator slice for one categorical field.
    ///
    /// `None` when the field is unknown or this vector is narrower than the schema.
    pub fn one_hot_group(&self, schema: &FeatureSchema, field: &str) -> Option<Vec<u8>> {
        let domain = schema.domain(field)?;
        domain
            .members
            .iter()
            .map(|(_, idx)| self.one_hot.get(*idx).copied())
            .collect()
    }

    /// Check that this vector has exactly the schema's layout
    pub fn check_layout(&self, schema: &FeatureSchema) -> Result<()> {
        if self.numeric.len() != schema.numeric_columns().len()
            || self.one_hot.len() != schema.one_hot_columns().len()
        {
            return Err(ChurnError::SchemaMismatch(format!(
                "vector has {} numeric and {} one-hot columns, schema expects {} and {}",
                self.numeric.len(),
                self.one_hot.len(),
                schema.numeric_columns().len(),
                schema.one_hot_columns().len()
            )));
        }
        Ok(())
    }

    /// Named view of this vector that serializes as an ordered JSON object
    pub fn to_record<'a>(&'a self, schema: &'a FeatureSchema) -> FeatureRecord<'a> {
        FeatureRecord {
            vector: self,
            schema,
        }
    }
}

/// A feature vector paired with its column names
pub struct FeatureRecord<'a> {
    vector: &'a FeatureVector,
    schema: &'a FeatureSchema,
}

impl Serialize for FeatureRecord<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.vector.width()))?;
        for (name, value) in self
            .schema
            .numeric_columns()
            .iter()
            .zip(&self.vector.numeric)
        {
            map.serialize_entry(name, value)?;
        }
        for (column, value) in self
            .schema
            .one_hot_columns()
            .iter()
            .zip(&self.vector.one_hot)
        {
            map.serialize_entry(&column.name, value)?;
        }
        map.end()
    }
}

/// Encode a raw record against a schema.
///
/// Numeric columns reject non-finite input, including the strings `"NaN"` and `"inf"`.
pub fn encode(raw: &RawRecord, schema: &FeatureSchema) -> Result<FeatureVector> {
    let mut numeric = Vec::with_capacity(schema.numeric_columns().len());
    for (idx, column) in schema.numeric_columns().iter().enumerate() {
        let value = raw
            .get(column)
            .ok_or_else(|| ChurnError::MalformedRequest(format!("missing required field {}", column)))?;
        let x = value
            .as_f64()
            .filter(|x| x.is_finite())
            .ok_or_else(|| {
                ChurnError::MalformedRequest(format!(
                    "{} must be numeric, got {}",
                    column,
                    describe(value)
                ))
            })?;
        numeric.push(schema.numeric_range(idx).normalize(x));
    }

    let mut one_hot = vec![0u8; schema.one_hot_columns().len()];
    for field in schema.categorical_fields() {
        if let Some(idx) = raw.get(&field.name).and_then(|v| match_domain(field, v)) {
            one_hot[idx] = 1;
        }
    }

    Ok(FeatureVector { numeric, one_hot })
}

/// One-hot index a raw value selects in a field's domain
fn match_domain(field: &CategoricalField, value: &RawValue) -> Option<usize> {
    if field.integer {
        field.index_of(&CategoryValue::Integer(value.as_i64()?))
    } else {
        field.index_of(&CategoryValue::Text(value.as_text()?.to_string()))
    }
}

fn describe(value: &RawValue) -> String {
    match value {
        RawValue::Text(s) => format!("{:?}", s),
        RawValue::Number(n) => n.to_string(),
    }
}

/// Encoder bound to a shared, read-only schema
#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    schema: Arc<FeatureSchema>,
}

impl FeatureEncoder {
    pub fn new(schema: Arc<FeatureSchema>) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Encode, logging categorical values that fall outside their domain
    pub fn encode(&self, raw: &RawRecord) -> Result<FeatureVector> {
        let vector = encode(raw, &self.schema)?;

        for field in self.schema.categorical_fields() {
            match raw.get(&field.name) {
                None => tracing::debug!(field = %field.name, "categorical field absent, group left at zero"),
                Some(value) if match_domain(field, value).is_none() => {
                    tracing::debug!(field = %field.name, value = ?value, "value outside domain, group left at zero")
                }
                Some(_) => {}
            }
        }

        Ok(vector)
    }
}
