//! Scorer contract and the file-backed logistic model
//!
//! The scorer is an opaque trained artifact: it receives a batch of encoded
//! rows and returns a serializable result that is handed back to the caller
//! untouched.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::encoder::FeatureVector;
use crate::error::{ChurnError, ConfigError, Result};
use crate::schema::FeatureSchema;

/// Scorer output, serialized verbatim into the response body
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ScoreOutput(pub Value);

impl ScoreOutput {
    pub fn into_inner(self) -> Value {
        self.0
    }
}

/// A trained model that turns feature rows into predictions
pub trait Scorer: Send + Sync {
    /// Score a batch of rows laid out as the feature schema declares
    fn predict(&self, batch: &[FeatureVector]) -> Result<ScoreOutput>;

    /// Column names the model was trained on, if the artifact records them
    fn feature_names(&self) -> Option<&[String]> {
        None
    }
}

/// Refuse a scorer whose recorded columns differ from the schema
pub fn verify_against(scorer: &dyn Scorer, schema: &FeatureSchema) -> Result<()> {
    let Some(names) = scorer.feature_names() else {
        tracing::warn!("scorer does not record its feature names, skipping schema check");
        return Ok(());
    };

    let expected = schema.column_names();
    if names.len() != expected.len() {
        return Err(ChurnError::SchemaMismatch(format!(
            "scorer expects {} columns, schema has {}",
            names.len(),
            expected.len()
        )));
    }
    if let Some((pos, (got, want))) = names
        .iter()
        .zip(&expected)
        .enumerate()
        .find(|(_, (got, want))| got != want)
    {
        return Err(ChurnError::SchemaMismatch(format!(
            "column {} is {:?} in the scorer but {:?} in the schema",
            pos, got, want
        )));
    }
    Ok(())
}

/// Logistic regression artifact exported from training
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticScorer {
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_threshold() -> f64 {
    0.5
}

impl LogisticScorer {
    /// Parse an artifact from JSON
    pub fn from_json(json_str: &str) -> Result<Self> {
        let scorer: Self = serde_json::from_str(json_str)
            .map_err(|e| ConfigError::Parse(format!("model artifact: {}", e)))?;
        scorer.validate()?;
        Ok(scorer)
    }

    /// Load an artifact from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&content)
    }

    fn validate(&self) -> Result<()> {
        if self.feature_names.len() != self.coefficients.len() {
            return Err(ConfigError::Parse(format!(
                "model artifact has {} feature names but {} coefficients",
                self.feature_names.len(),
                self.coefficients.len()
            ))
            .into());
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ConfigError::Parse("model artifact has non-finite weights".to_string()).into());
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ConfigError::OutOfRange(format!(
                "threshold must be between 0.0 and 1.0, got {}",
                self.threshold
            ))
            .into());
        }
        Ok(())
    }

    /// Churn probability for a single dense row
    pub fn probability(&self, row: &[f64]) -> Result<f64> {
        if row.len() != self.coefficients.len() {
            return Err(ChurnError::ScorerFailure(format!(
                "row has {} columns, model expects {}",
                row.len(),
                self.coefficients.len()
            )));
        }
        let z = self.intercept
            + row
                .iter()
                .zip(&self.coefficients)
                .map(|(x, w)| x * w)
                .sum::<f64>();
        let p = 1.0 / (1.0 + (-z).exp());
        if !p.is_finite() {
            return Err(ChurnError::ScorerFailure(format!("non-finite probability for logit {}", z)));
        }
        Ok(p)
    }
}

impl Scorer for LogisticScorer {
    fn predict(&self, batch: &[FeatureVector]) -> Result<ScoreOutput> {
        let records = batch
            .iter()
            .map(|row| {
                let p = self.probability(&row.to_dense())?;
                Ok(json!({
                    "churn_probability": p,
                    "churn": u8::from(p >= self.threshold),
                }))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(ScoreOutput(Value::Array(records)))
    }

    fn feature_names(&self) -> Option<&[String]> {
        Some(&self.feature_names)
    }
}

/// Load the scorer artifact at `path`
pub fn load_scorer(path: &Path) -> Result<Arc<dyn Scorer>> {
    let scorer = LogisticScorer::from_file(path)?;
    tracing::info!(
        "Loaded model from {:?} ({} features)",
        path,
        scorer.feature_names.len()
    );
    Ok(Arc::new(scorer))
}
