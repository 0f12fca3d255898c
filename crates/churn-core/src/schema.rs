//! Feature schema for the churn model
//!
//! The schema is the ordered list of columns the scorer was trained against:
//! normalized numeric columns first, then one-hot indicator columns named
//! `<field>_<value>`. Column names are parsed once, when the schema is built,
//! into an explicit per-field domain table so that encoding never has to split
//! strings.
//!
//! Integer-valued categorical fields (`SeniorCitizen`) are declared up front.
//! Their columns are recognised by the `<field>_` prefix and the remainder is
//! parsed as an integer. Every other column splits on its first underscore.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Numeric columns of the trained churn model, in training order
pub const CHURN_NUMERIC_COLUMNS: [&str; 3] = ["tenure", "MonthlyCharges", "TotalCharges"];

/// One-hot columns of the trained churn model, in training order
pub const CHURN_ONE_HOT_COLUMNS: [&str; 43] = [
    "gender_Female",
    "gender_Male",
    "SeniorCitizen_0",
    "SeniorCitizen_1",
    "Partner_No",
    "Partner_Yes",
    "Dependents_No",
    "Dependents_Yes",
    "PhoneService_No",
    "PhoneService_Yes",
    "MultipleLines_No phone service",
    "MultipleLines_No",
    "MultipleLines_Yes",
    "InternetService_DSL",
    "InternetService_Fiber optic",
    "InternetService_No",
    "OnlineSecurity_No",
    "OnlineSecurity_Yes",
    "OnlineSecurity_No internet service",
    "OnlineBackup_No",
    "OnlineBackup_Yes",
    "OnlineBackup_No internet service",
    "DeviceProtection_No",
    "DeviceProtection_Yes",
    "DeviceProtection_No internet service",
    "TechSupport_No",
    "TechSupport_Yes",
    "TechSupport_No internet service",
    "StreamingTV_No",
    "StreamingTV_Yes",
    "StreamingTV_No internet service",
    "StreamingMovies_No",
    "StreamingMovies_Yes",
    "StreamingMovies_No internet service",
    "Contract_Month-to-month",
    "Contract_One year",
    "Contract_Two year",
    "PaperlessBilling_No",
    "PaperlessBilling_Yes",
    "PaymentMethod_Credit card (automatic)",
    "PaymentMethod_Mailed check",
    "PaymentMethod_Bank transfer (automatic)",
    "PaymentMethod_Electronic check",
];

/// Categorical fields whose values are integers rather than strings
pub const CHURN_INTEGER_FIELDS: [&str; 1] = ["SeniorCitizen"];

/// Training-time (min, max) for each numeric column
pub const CHURN_RANGES: [(&str, f64, f64); 3] = [
    ("tenure", 0.0, 72.0),
    ("MonthlyCharges", 18.25, 118.75),
    ("TotalCharges", 18.8, 8684.8),
];

/// A value in a categorical field's domain
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryValue {
    Integer(i64),
    Text(String),
}

impl fmt::Display for CategoryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryValue::Integer(v) => write!(f, "{}", v),
            CategoryValue::Text(v) => f.write_str(v),
        }
    }
}

/// A single one-hot indicator column
#[derive(Debug, Clone, PartialEq)]
pub struct OneHotColumn {
    /// Full column name as the scorer knows it
    pub name: String,
    /// Raw attribute the column indicates on
    pub field: String,
    /// Value the attribute must equal for the column to be 1
    pub value: CategoryValue,
}

/// Fixed training-time scaling range for a numeric column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinMax {
    pub min: f64,
    pub max: f64,
}

impl MinMax {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Scale `x` into the training range. Not clamped.
    pub fn normalize(&self, x: f64) -> f64 {
        (x - self.min) / (self.max - self.min)
    }

    fn validate(&self, column: &str) -> Result<(), ConfigError> {
        if !self.min.is_finite() || !self.max.is_finite() || self.max <= self.min {
            return Err(ConfigError::InvalidRange {
                column: column.to_string(),
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// Domain of one categorical field
#[derive(Debug, Clone)]
pub struct CategoricalField {
    pub name: String,
    pub integer: bool,
    /// Domain values paired with their index into the one-hot columns
    pub members: Vec<(CategoryValue, usize)>,
}

impl CategoricalField {
    /// One-hot index for `value`, if it is in the domain
    pub fn index_of(&self, value: &CategoryValue) -> Option<usize> {
        self.members
            .iter()
            .find(|(v, _)| v == value)
            .map(|(_, idx)| *idx)
    }
}

/// Serializable description of a schema, as it appears in configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaConfig {
    pub numeric_columns: Vec<String>,
    pub one_hot_columns: Vec<String>,
    #[serde(default)]
    pub integer_fields: Vec<String>,
    pub ranges: BTreeMap<String, MinMax>,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            numeric_columns: CHURN_NUMERIC_COLUMNS.iter().map(|s| s.to_string()).collect(),
            one_hot_columns: CHURN_ONE_HOT_COLUMNS.iter().map(|s| s.to_string()).collect(),
            integer_fields: CHURN_INTEGER_FIELDS.iter().map(|s| s.to_string()).collect(),
            ranges: CHURN_RANGES
                .iter()
                .map(|(name, min, max)| (name.to_string(), MinMax::new(*min, *max)))
                .collect(),
        }
    }
}

impl SchemaConfig {
    /// Parse and validate into a [`FeatureSchema`]
    pub fn build(&self) -> Result<FeatureSchema, ConfigError> {
        FeatureSchema::new(
            self.numeric_columns.clone(),
            &self.one_hot_columns,
            &self.integer_fields,
            &self.ranges,
        )
    }
}

/// The ordered, immutable column layout the scorer expects
#[derive(Debug, Clone)]
pub struct FeatureSchema {
    numeric: Vec<String>,
    ranges: Vec<MinMax>,
    one_hot: Vec<OneHotColumn>,
    integer_fields: Vec<String>,
    fields: Vec<CategoricalField>,
    field_index: HashMap<String, usize>,
}

impl FeatureSchema {
    /// Build a schema from column names and the numeric range table
    pub fn new(
        numeric: Vec<String>,
        one_hot_names: &[String],
        integer_fields: &[String],
        ranges: &BTreeMap<String, MinMax>,
    ) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        for name in numeric.iter().chain(one_hot_names) {
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::DuplicateColumn(name.clone()));
            }
        }

        let mut numeric_ranges = Vec::with_capacity(numeric.len());
        for column in &numeric {
            let range = ranges
                .get(column)
                .ok_or_else(|| ConfigError::MissingRange(column.clone()))?;
            range.validate(column)?;
            numeric_ranges.push(*range);
        }

        let mut one_hot = Vec::with_capacity(one_hot_names.len());
        let mut fields: Vec<CategoricalField> = Vec::new();
        let mut field_index: HashMap<String, usize> = HashMap::new();

        for (idx, name) in one_hot_names.iter().enumerate() {
            let column = parse_column(name, integer_fields)?;

            if numeric.contains(&column.field) {
                return Err(ConfigError::InvalidColumn {
                    column: name.clone(),
                    reason: format!("{} is already a numeric column", column.field),
                });
            }

            let slot = match field_index.get(&column.field) {
                Some(&slot) => slot,
                None => {
                    fields.push(CategoricalField {
                        name: column.field.clone(),
                        integer: matches!(column.value, CategoryValue::Integer(_)),
                        members: Vec::new(),
                    });
                    field_index.insert(column.field.clone(), fields.len() - 1);
                    fields.len() - 1
                }
            };

            let field = &mut fields[slot];
            if field.index_of(&column.value).is_some() {
                return Err(ConfigError::DuplicateColumn(name.clone()));
            }
            field.members.push((column.value.clone(), idx));
            one_hot.push(column);
        }

        Ok(Self {
            numeric,
            ranges: numeric_ranges,
            one_hot,
            integer_fields: integer_fields.to_vec(),
            fields,
            field_index,
        })
    }

    /// The schema the churn model was trained against
    pub fn churn_default() -> Result<Self, ConfigError> {
        SchemaConfig::default().build()
    }

    /// Numeric column names, in order
    pub fn numeric_columns(&self) -> &[String] {
        &self.numeric
    }

    /// One-hot columns, in order
    pub fn one_hot_columns(&self) -> &[OneHotColumn] {
        &self.one_hot
    }

    /// Scaling range for the i-th numeric column
    pub fn numeric_range(&self, idx: usize) -> MinMax {
        self.ranges[idx]
    }

    /// Scaling range for a numeric column by name
    pub fn range(&self, column: &str) -> Option<MinMax> {
        self.numeric
            .iter()
            .position(|c| c == column)
            .map(|idx| self.ranges[idx])
    }

    /// Categorical fields in order of first appearance
    pub fn categorical_fields(&self) -> &[CategoricalField] {
        &self.fields
    }

    /// Domain of a categorical field
    pub fn domain(&self, field: &str) -> Option<&CategoricalField> {
        self.field_index.get(field).map(|&slot| &self.fields[slot])
    }

    /// Whether `name` is a raw attribute the schema reads
    pub fn uses_field(&self, name: &str) -> bool {
        self.field_index.contains_key(name) || self.numeric.iter().any(|c| c == name)
    }

    /// All output column names: numeric first, then one-hot
    pub fn column_names(&self) -> Vec<String> {
        self.numeric
            .iter()
            .cloned()
            .chain(self.one_hot.iter().map(|c| c.name.clone()))
            .collect()
    }

    /// Number of output columns
    pub fn width(&self) -> usize {
        self.numeric.len() + self.one_hot.len()
    }

    /// Turn back into its configuration form
    pub fn to_config(&self) -> SchemaConfig {
        SchemaConfig {
            numeric_columns: self.numeric.clone(),
            one_hot_columns: self.one_hot.iter().map(|c| c.name.clone()).collect(),
            integer_fields: self.integer_fields.clone(),
            ranges: self
                .numeric
                .iter()
                .cloned()
                .zip(self.ranges.iter().copied())
                .collect(),
        }
    }
}

/// Split a one-hot column name into its field and domain value.
///
/// Integer fields are matched by prefix before the generic first-underscore
/// split is attempted.
fn parse_column(name: &str, integer_fields: &[String]) -> Result<OneHotColumn, ConfigError> {
    for field in integer_fields {
        let Some(suffix) = name
            .strip_prefix(field.as_str())
            .and_then(|rest| rest.strip_prefix('_'))
        else {
            continue;
        };
        let value = suffix
            .parse::<i64>()
            .map_err(|_| ConfigError::InvalidColumn {
                column: name.to_string(),
                reason: format!("{} is an integer field but {:?} is not an integer", field, suffix),
            })?;
        return Ok(OneHotColumn {
            name: name.to_string(),
            field: field.clone(),
            value: CategoryValue::Integer(value),
        });
    }

    match name.split_once('_') {
        Some((field, value)) if !field.is_empty() => Ok(OneHotColumn {
            name: name.to_string(),
            field: field.to_string(),
            value: CategoryValue::Text(value.to_string()),
        }),
        _ => Err(ConfigError::InvalidColumn {
            column: name.to_string(),
            reason: "expected <field>_<value>".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn ranges(items: &[(&str, f64, f64)]) -> BTreeMap<String, MinMax> {
        items
            .iter()
            .map(|(n, lo, hi)| (n.to_string(), MinMax::new(*lo, *hi)))
            .collect()
    }

    #[test]
    fn test_default_schema_shape() {
        let schema = FeatureSchema::churn_default().unwrap();
        assert_eq!(schema.width(), 46);
        assert_eq!(schema.numeric_columns(), &["tenure", "MonthlyCharges", "TotalCharges"]);
        assert_eq!(schema.categorical_fields().len(), 16);

        let names = schema.column_names();
        assert_eq!(names[0], "tenure");
        assert_eq!(names[3], "gender_Female");
        assert_eq!(names[45], "PaymentMethod_Electronic check");
    }

    #[test]
    fn test_senior_citizen_is_integer_categorical() {
        let schema = FeatureSchema::churn_default().unwrap();
        let senior = schema.domain("SeniorCitizen").unwrap();

        assert!(senior.integer);
        assert_eq!(senior.members.len(), 2);
        assert_eq!(senior.index_of(&CategoryValue::Integer(0)), Some(2));
        assert_eq!(senior.index_of(&CategoryValue::Integer(1)), Some(3));
        assert!(schema.range("SeniorCitizen").is_none());
        assert!(!schema.numeric_columns().contains(&"SeniorCitizen".to_string()));
    }

    #[test]
    fn test_split_on_first_underscore_only() {
        let schema = FeatureSchema::new(
            vec![],
            &strings(&["Plan_basic_monthly", "Plan_pro"]),
            &[],
            &BTreeMap::new(),
        )
        .unwrap();

        let plan = schema.domain("Plan").unwrap();
        assert_eq!(
            plan.index_of(&CategoryValue::Text("basic_monthly".to_string())),
            Some(0)
        );
        assert!(schema.domain("Plan_basic").is_none());
    }

    #[test]
    fn test_values_with_spaces_and_dashes() {
        let schema = FeatureSchema::churn_default().unwrap();
        let contract = schema.domain("Contract").unwrap();
        assert!(contract
            .index_of(&CategoryValue::Text("Month-to-month".to_string()))
            .is_some());

        let lines = schema.domain("MultipleLines").unwrap();
        assert_eq!(
            lines.index_of(&CategoryValue::Text("No phone service".to_string())),
            Some(10)
        );
    }

    #[test]
    fn test_integer_field_rejects_text_suffix() {
        let err = FeatureSchema::new(
            vec![],
            &strings(&["SeniorCitizen_yes"]),
            &strings(&["SeniorCitizen"]),
            &BTreeMap::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidColumn { .. }));
    }

    #[test]
    fn test_column_without_underscore_rejected() {
        let err = FeatureSchema::new(vec![], &strings(&["gender"]), &[], &BTreeMap::new())
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidColumn { .. }));
    }

    #[test]
    fn test_duplicate_columns_rejected() {
        let err = FeatureSchema::new(
            vec![],
            &strings(&["gender_Male", "gender_Male"]),
            &[],
            &BTreeMap::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateColumn(_)));

        // Distinct names, same integer value
        let err = FeatureSchema::new(
            vec![],
            &strings(&["SeniorCitizen_1", "SeniorCitizen_01"]),
            &strings(&["SeniorCitizen"]),
            &BTreeMap::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateColumn(_)));
    }

    #[test]
    fn test_numeric_column_needs_valid_range() {
        let err = FeatureSchema::new(strings(&["tenure"]), &[], &[], &BTreeMap::new())
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingRange(_)));

        let err = FeatureSchema::new(
            strings(&["tenure"]),
            &[],
            &[],
            &ranges(&[("tenure", 5.0, 5.0)]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRange { .. }));
    }

    #[test]
    fn test_numeric_name_cannot_be_categorical_field() {
        let err = FeatureSchema::new(
            strings(&["tenure"]),
            &strings(&["tenure_long"]),
            &[],
            &ranges(&[("tenure", 0.0, 72.0)]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidColumn { .. }));
    }

    #[test]
    fn test_minmax_is_not_clamped() {
        let range = MinMax::new(0.0, 72.0);
        assert_eq!(range.normalize(0.0), 0.0);
        assert_eq!(range.normalize(72.0), 1.0);
        assert_eq!(range.normalize(144.0), 2.0);
        assert!(range.normalize(-36.0) < 0.0);
    }

    #[test]
    fn test_config_round_trip_preserves_order() {
        let schema = FeatureSchema::churn_default().unwrap();
        let config = schema.to_config();
        assert_eq!(config, SchemaConfig::default());
        assert_eq!(config.build().unwrap().column_names(), schema.column_names());
    }
}
