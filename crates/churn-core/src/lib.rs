//! Churn Core - feature reconstruction for the churn classifier
//!
//! This crate turns the flat, human-readable attributes of a customer into the
//! exact numeric row the trained churn model expects:
//!
//! - **Schema**: ordered numeric and one-hot columns plus training-time min/max ranges
//! - **Record**: the raw attribute map sent by a client
//! - **Encoder**: one-hot encoding and min-max normalization into a fixed-order vector
//! - **Scorer**: the opaque model contract and a file-backed logistic model
//! - **Pipeline**: encode, score a batch of one, pass the output through
//! - **Config**: schema, model location and listener settings
//!
//! # Flow
//!
//! ```text
//! RawRecord → FeatureEncoder → FeatureVector → Scorer → ScoreOutput
//! ```
//!
//! The schema and scorer are built once at startup and shared read-only.

pub mod config;
pub mod encoder;
pub mod error;
pub mod pipeline;
pub mod record;
pub mod schema;
pub mod scorer;

pub use config::{ChurnConfig, ModelConfig, ServerConfig};
pub use encoder::{encode, FeatureEncoder, FeatureRecord, FeatureVector};
pub use error::{ChurnError, ConfigError, Result};
pub use pipeline::Predictor;
pub use record::{RawRecord, RawValue};
pub use schema::{CategoricalField, CategoryValue, FeatureSchema, MinMax, OneHotColumn, SchemaConfig};
pub use scorer::{load_scorer, verify_against, LogisticScorer, ScoreOutput, Scorer};
