//! Request-to-prediction pipeline

use std::sync::Arc;

use crate::encoder::{FeatureEncoder, FeatureVector};
use crate::error::Result;
use crate::record::RawRecord;
use crate::schema::FeatureSchema;
use crate::scorer::{verify_against, ScoreOutput, Scorer};

/// Encoder and scorer, shared read-only across requests
#[derive(Clone)]
pub struct Predictor {
    encoder: FeatureEncoder,
    scorer: Arc<dyn Scorer>,
}

impl Predictor {
    /// Pair a schema with a scorer, refusing a scorer trained on other columns
    pub fn new(schema: Arc<FeatureSchema>, scorer: Arc<dyn Scorer>) -> Result<Self> {
        verify_against(scorer.as_ref(), &schema)?;
        Ok(Self {
            encoder: FeatureEncoder::new(schema),
            scorer,
        })
    }

    pub fn schema(&self) -> &FeatureSchema {
        self.encoder.schema()
    }

    /// Encode only
    pub fn encode(&self, raw: &RawRecord) -> Result<FeatureVector> {
        self.encoder.encode(raw)
    }

    /// Encode, score a batch of one and return the scorer's output unchanged
    pub fn predict(&self, raw: &RawRecord) -> Result<ScoreOutput> {
        let vector = self.encoder.encode(raw)?;
        vector.check_layout(self.encoder.schema())?;

        let output = self.scorer.predict(std::slice::from_ref(&vector))?;
        tracing::info!("Predictions: {}", output.0);
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use crate::error::ChurnError;
    use crate::scorer::LogisticScorer;

    /// Records every batch it sees
    struct CountingScorer {
        calls: AtomicUsize,
        widths: std::sync::Mutex<Vec<(usize, usize)>>,
    }

    impl CountingScorer {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                widths: std::sync::Mutex::new(Vec::new()),
            }
        }
    }

    impl Scorer for CountingScorer {
        fn predict(&self, batch: &[FeatureVector]) -> Result<ScoreOutput> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.widths
                .lock()
                .unwrap()
                .push((batch.len(), batch[0].width()));
            Ok(ScoreOutput(json!([{"label": "No"}])))
        }
    }

    struct FailingScorer;

    impl Scorer for FailingScorer {
        fn predict(&self, _batch: &[FeatureVector]) -> Result<ScoreOutput> {
            Err(ChurnError::ScorerFailure("model crashed".to_string()))
        }
    }

    fn record() -> RawRecord {
        RawRecord::new()
            .with("gender", "Male")
            .with("SeniorCitizen", 1i64)
            .with("tenure", 24i64)
            .with("MonthlyCharges", 70.0)
            .with("TotalCharges", "1680.0")
    }

    #[test]
    fn test_output_passes_through() {
        let schema = Arc::new(FeatureSchema::churn_default().unwrap());
        let scorer = Arc::new(CountingScorer::new());
        let predictor = Predictor::new(schema, scorer.clone()).unwrap();

        let output = predictor.predict(&record()).unwrap();
        assert_eq!(output.into_inner(), json!([{"label": "No"}]));
        assert_eq!(*scorer.widths.lock().unwrap(), vec![(1, 46)]);
    }

    #[test]
    fn test_malformed_request_never_reaches_scorer() {
        let schema = Arc::new(FeatureSchema::churn_default().unwrap());
        let scorer = Arc::new(CountingScorer::new());
        let predictor = Predictor::new(schema, scorer.clone()).unwrap();

        let mut raw = record();
        raw.remove("tenure");
        let err = predictor.predict(&raw).unwrap_err();

        assert!(matches!(err, ChurnError::MalformedRequest(_)));
        assert_eq!(scorer.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_scorer_failure_propagates() {
        let schema = Arc::new(FeatureSchema::churn_default().unwrap());
        let predictor = Predictor::new(schema, Arc::new(FailingScorer)).unwrap();
        let err = predictor.predict(&record()).unwrap_err();
        assert!(matches!(err, ChurnError::ScorerFailure(_)));
    }

    #[test]
    fn test_rejects_scorer_trained_on_other_columns() {
        let schema = Arc::new(FeatureSchema::churn_default().unwrap());
        let mut names = schema.column_names();
        names.reverse();
        let scorer = LogisticScorer {
            coefficients: vec![0.0; names.len()],
            feature_names: names,
            intercept: 0.0,
            threshold: 0.5,
        };

        let result = Predictor::new(schema, Arc::new(scorer));
        assert!(matches!(result, Err(ChurnError::SchemaMismatch(_))));
    }
}
