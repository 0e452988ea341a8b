//! Inference - feature encoding and fraud classification
//!
//! - [`layout`] - fixed, versioned model input order
//! - [`vector`] - versioned feature vector
//! - [`encoding`] - categorical encoding table and the record encoder
//! - [`model`] - ONNX classifier wrapper
//! - [`pipeline`] - per-request orchestration

pub mod encoding;
pub mod layout;
pub mod model;
pub mod pipeline;
pub mod vector;

pub use encoding::{encode, EncodingTable, SENTINEL_CODE};
pub use layout::{FEATURE_COUNT, FEATURE_LAYOUT, FEATURE_VERSION};
pub use model::{FraudClassifier, FraudModel, ModelError};
pub use pipeline::{predict_transaction, Prediction};
pub use vector::FeatureVector;
