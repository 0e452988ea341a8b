//! Fraud classifier - ONNX Runtime wrapper
//!
//! The model artifact is loaded exactly once at process start. A failed load
//! leaves the classifier permanently unavailable: every subsequent predict
//! fails fast with `ModelError::Unavailable` - no retry, no reload, no
//! heuristic fallback.

use chrono::{DateTime, Utc};
use ndarray::Array2;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::layout::FEATURE_COUNT;
use super::vector::FeatureVector;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model unavailable: {0}")]
    Unavailable(String),
    #[error("feature vector incompatible with loaded model: {0}")]
    IncompatibleFeatures(String),
    #[error("inference failed: {0}")]
    Inference(String),
}

/// Binary fraud classifier over a fixed-order feature vector.
///
/// Behind a trait so the ONNX engine can be swapped (tests use a stub).
pub trait FraudModel: Send + Sync {
    /// 1 = fraud, 0 = legitimate
    fn predict(&self, features: &FeatureVector) -> Result<u8, ModelError>;

    fn is_loaded(&self) -> bool;
}

/// Model artifact metadata captured at load time
#[derive(Debug, Clone)]
pub struct ModelMetadata {
    pub path: String,
    pub sha256: String,
    pub feature_count: usize,
    pub loaded_at: DateTime<Utc>,
}

enum ClassifierState {
    Ready {
        // ort requires &mut to run; semantically the session is read-only
        session: Mutex<Session>,
        metadata: ModelMetadata,
    },
    Unavailable {
        reason: String,
    },
}

/// Production `FraudModel` over an ONNX Runtime session
pub struct FraudClassifier {
    state: ClassifierState,
}

impl FraudClassifier {
    /// Load the model artifact. Never panics or errors out of startup: a
    /// failed load is recorded and surfaced per request as 503.
    pub fn load(path: &str) -> Self {
        match Self::try_load(path) {
            Ok((session, metadata)) => {
                tracing::info!(
                    "Fraud model loaded from {} (sha256: {}, {} features)",
                    metadata.path,
                    metadata.sha256,
                    metadata.feature_count
                );
                Self {
                    state: ClassifierState::Ready {
                        session: Mutex::new(session),
                        metadata,
                    },
                }
            }
            Err(reason) => {
                tracing::error!("Could not load fraud model: {}", reason);
                Self {
                    state: ClassifierState::Unavailable { reason },
                }
            }
        }
    }

    fn try_load(path: &str) -> Result<(Session, ModelMetadata), String> {
        let bytes =
            std::fs::read(path).map_err(|e| format!("failed to read {}: {}", path, e))?;

        let sha256 = format!("{:x}", Sha256::digest(&bytes));

        let session = Session::builder()
            .map_err(|e| format!("failed to create session builder: {}", e))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| format!("failed to set optimization: {}", e))?
            .commit_from_memory(&bytes)
            .map_err(|e| format!("failed to load model: {}", e))?;

        let metadata = ModelMetadata {
            path: path.to_string(),
            sha256,
            feature_count: FEATURE_COUNT,
            loaded_at: Utc::now(),
        };

        Ok((session, metadata))
    }

    pub fn metadata(&self) -> Option<&ModelMetadata> {
        match &self.state {
            ClassifierState::Ready { metadata, .. } => Some(metadata),
            ClassifierState::Unavailable { .. } => None,
        }
    }
}

impl FraudModel for FraudClassifier {
    fn is_loaded(&self) -> bool {
        matches!(self.state, ClassifierState::Ready { .. })
    }

    fn predict(&self, features: &FeatureVector) -> Result<u8, ModelError> {
        let session = match &self.state {
            ClassifierState::Ready { session, .. } => session,
            ClassifierState::Unavailable { reason } => {
                return Err(ModelError::Unavailable(reason.clone()))
            }
        };

        // A vector built against a different layout is rejected, never coerced
        features
            .validate()
            .map_err(|e| ModelError::IncompatibleFeatures(e.to_string()))?;

        let input = Array2::<f32>::from_shape_vec((1, FEATURE_COUNT), features.values.to_vec())
            .map_err(|e| ModelError::Inference(e.to_string()))?;

        let input_tensor =
            Value::from_array(input).map_err(|e| ModelError::Inference(e.to_string()))?;

        let mut session = session.lock();

        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| ModelError::Inference("model has no outputs".to_string()))?;

        let outputs = session
            .run(ort::inputs![input_tensor])
            .map_err(|e| ModelError::Inference(e.to_string()))?;

        let output = outputs
            .get(&output_name)
            .ok_or_else(|| ModelError::Inference("model produced no output".to_string()))?;

        // Classifier exports emit either an int64 label tensor or a float
        // score; both collapse to the same binary verdict.
        if let Ok(labels) = output.try_extract_tensor::<i64>() {
            let label = labels
                .1
                .first()
                .copied()
                .ok_or_else(|| ModelError::Inference("empty output tensor".to_string()))?;
            return Ok(u8::from(label != 0));
        }

        let scores = output
            .try_extract_tensor::<f32>()
            .map_err(|e| ModelError::Inference(e.to_string()))?;
        let score = scores
            .1
            .first()
            .copied()
            .ok_or_else(|| ModelError::Inference("empty output tensor".to_string()))?;

        Ok(u8::from(score >= 0.5))
    }
}
