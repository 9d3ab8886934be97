//! Trained fare model artifacts: feature scaler, regressor and declared feature
//! order.
//!
//! Artifacts are JSON documents:
//!
//! ```json
//! {
//!   "feature_columns": ["distance_km", "surge_multiplier"],
//!   "scaler": {"mean": [8.0, 1.2], "scale": [4.0, 0.2]},
//!   "regressor": {"kind": "linear", "intercept": 150.0, "coefficients": [40.0, 25.0]},
//!   "is_fitted": true,
//!   "trained_at": "2024-05-01T10:00:00Z"
//! }
//! ```
//!
//! A `forest` regressor carries `trees`, each a flat node list whose first entry
//! is the root. Split nodes send `x <= threshold` left.

use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ArtifactError, PredictionError};
use crate::features::{FeatureName, FeatureVector};

/// Standard scaling: `(x - mean) / scale`, with a zero scale read as 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl FeatureScaler {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Self {
        Self { mean, scale }
    }

    /// Pass-through scaler for `n` features.
    pub fn identity(n: usize) -> Self {
        Self {
            mean: vec![0.0; n],
            scale: vec![1.0; n],
        }
    }

    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    pub fn transform(&self, values: &[f64]) -> Result<Vec<f64>, PredictionError> {
        if self.mean.len() != self.scale.len() {
            return Err(PredictionError::DimensionMismatch {
                component: "scaler scale",
                expected: self.mean.len(),
                actual: self.scale.len(),
            });
        }
        if values.len() != self.mean.len() {
            return Err(PredictionError::DimensionMismatch {
                component: "scaler",
                expected: self.mean.len(),
                actual: values.len(),
            });
        }
        Ok(values
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (mean, scale))| {
                let scale = if *scale == 0.0 { 1.0 } else { *scale };
                (x - mean) / scale
            })
            .collect())
    }
}

/// A fitted regression model over scaled features.
pub trait Regressor: Send + Sync + fmt::Debug {
    /// Number of input features the model reads.
    fn n_features(&self) -> usize;

    fn predict(&self, features: &[f64]) -> Result<f64, PredictionError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinearRegressor {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl Regressor for LinearRegressor {
    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn predict(&self, features: &[f64]) -> Result<f64, PredictionError> {
        if features.len() != self.coefficients.len() {
            return Err(PredictionError::DimensionMismatch {
                component: "linear regressor",
                expected: self.coefficients.len(),
                actual: features.len(),
            });
        }
        Ok(self.intercept
            + features
                .iter()
                .zip(&self.coefficients)
                .map(|(x, w)| x * w)
                .sum::<f64>())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// One regression tree stored as a flat node list, root at index 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Walk from the root to a leaf. A walk longer than the node count must
    /// have revisited a node, so it is reported as a cycle.
    fn evaluate(&self, index: usize, features: &[f64]) -> Result<f64, PredictionError> {
        let malformed = |reason: String| PredictionError::MalformedTree {
            tree: index,
            reason,
        };

        let mut cursor = 0usize;
        for _ in 0..=self.nodes.len() {
            match self.nodes.get(cursor) {
                None => return Err(malformed(format!("node index {cursor} out of range"))),
                Some(TreeNode::Leaf { value }) => return Ok(*value),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let x = features.get(*feature).copied().ok_or_else(|| {
                        malformed(format!("feature index {feature} out of range"))
                    })?;
                    cursor = if x <= *threshold { *left } else { *right };
                }
            }
        }
        Err(malformed("cycle detected".to_string()))
    }

    fn max_feature(&self) -> Option<usize> {
        self.nodes
            .iter()
            .filter_map(|node| match node {
                TreeNode::Split { feature, .. } => Some(*feature),
                TreeNode::Leaf { .. } => None,
            })
            .max()
    }
}

/// Averaging ensemble of regression trees.
#[derive(Debug, Clone, PartialEq)]
pub struct ForestRegressor {
    pub trees: Vec<DecisionTree>,
    pub n_features: usize,
}

impl Regressor for ForestRegressor {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, features: &[f64]) -> Result<f64, PredictionError> {
        if features.len() != self.n_features {
            return Err(PredictionError::DimensionMismatch {
                component: "forest regressor",
                expected: self.n_features,
                actual: features.len(),
            });
        }
        if self.trees.is_empty() {
            return Err(PredictionError::Regressor("forest has no trees".to_string()));
        }
        let mut total = 0.0;
        for (index, tree) in self.trees.iter().enumerate() {
            total += tree.evaluate(index, features)?;
        }
        Ok(total / self.trees.len() as f64)
    }
}

/// Serialized regressor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RegressorSpec {
    Linear {
        intercept: f64,
        coefficients: Vec<f64>,
    },
    Forest {
        trees: Vec<DecisionTree>,
    },
}

impl RegressorSpec {
    fn build(self, n_features: usize) -> Result<Box<dyn Regressor>, ArtifactError> {
        match self {
            RegressorSpec::Linear {
                intercept,
                coefficients,
            } => {
                if coefficients.len() != n_features {
                    return Err(ArtifactError::Invalid(format!(
                        "linear regressor has {} coefficients for {n_features} features",
                        coefficients.len()
                    )));
                }
                Ok(Box::new(LinearRegressor {
                    intercept,
                    coefficients,
                }))
            }
            RegressorSpec::Forest { trees } => {
                if trees.is_empty() {
                    return Err(ArtifactError::Invalid("forest has no trees".to_string()));
                }
                for (index, tree) in trees.iter().enumerate() {
                    if tree.nodes.is_empty() {
                        return Err(ArtifactError::Invalid(format!("tree {index} has no nodes")));
                    }
                    if let Some(feature) = tree.max_feature().filter(|f| *f >= n_features) {
                        return Err(ArtifactError::Invalid(format!(
                            "tree {index} splits on feature {feature} of {n_features}"
                        )));
                    }
                }
                Ok(Box::new(ForestRegressor { trees, n_features }))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ArtifactDocument {
    feature_columns: Vec<FeatureName>,
    scaler: FeatureScaler,
    regressor: RegressorSpec,
    #[serde(default = "default_fitted")]
    is_fitted: bool,
    #[serde(default)]
    trained_at: Option<DateTime<Utc>>,
}

fn default_fitted() -> bool {
    true
}

/// Loaded fare model.
#[derive(Debug)]
pub struct ModelArtifact {
    feature_columns: Vec<FeatureName>,
    scaler: FeatureScaler,
    regressor: Box<dyn Regressor>,
    is_fitted: bool,
    trained_at: Option<DateTime<Utc>>,
}

impl ModelArtifact {
    /// Assemble an artifact in memory. Dimensions are checked at prediction
    /// time, not here.
    pub fn new(
        feature_columns: Vec<FeatureName>,
        scaler: FeatureScaler,
        regressor: Box<dyn Regressor>,
    ) -> Self {
        Self {
            feature_columns,
            scaler,
            regressor,
            is_fitted: true,
            trained_at: None,
        }
    }

    pub fn with_fitted(mut self, is_fitted: bool) -> Self {
        self.is_fitted = is_fitted;
        self
    }

    pub fn with_trained_at(mut self, trained_at: DateTime<Utc>) -> Self {
        self.trained_at = Some(trained_at);
        self
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ArtifactError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// Parse and check an artifact document. Scaler and regressor must both
    /// match the declared feature count.
    pub fn from_json(json: &str) -> Result<Self, ArtifactError> {
        let doc: ArtifactDocument = serde_json::from_str(json)?;
        let n = doc.feature_columns.len();
        if doc.scaler.mean.len() != n || doc.scaler.scale.len() != n {
            return Err(ArtifactError::Invalid(format!(
                "scaler has {}/{} entries for {n} features",
                doc.scaler.mean.len(),
                doc.scaler.scale.len()
            )));
        }
        let regressor = doc.regressor.build(n)?;
        Ok(Self {
            feature_columns: doc.feature_columns,
            scaler: doc.scaler,
            regressor,
            is_fitted: doc.is_fitted,
            trained_at: doc.trained_at,
        })
    }

    pub fn feature_columns(&self) -> &[FeatureName] {
        &self.feature_columns
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    pub fn trained_at(&self) -> Option<DateTime<Utc>> {
        self.trained_at
    }

    /// Raw model output for a vector assembled against [`Self::feature_columns`].
    pub fn predict(&self, vector: &FeatureVector) -> Result<f64, PredictionError> {
        if !self.is_fitted {
            return Err(PredictionError::NotFitted);
        }
        if vector.len() != self.feature_columns.len() {
            return Err(PredictionError::DimensionMismatch {
                component: "feature vector",
                expected: self.feature_columns.len(),
                actual: vector.len(),
            });
        }
        if let Some((name, value)) = vector.iter().find(|(_, value)| !value.is_finite()) {
            return Err(PredictionError::NonFiniteFeature {
                name: name.to_string(),
                value,
            });
        }

        let scaled = self.scaler.transform(vector.values())?;
        if self.regressor.n_features() != scaled.len() {
            return Err(PredictionError::DimensionMismatch {
                component: "regressor",
                expected: self.regressor.n_features(),
                actual: scaled.len(),
            });
        }
        let output = self.regressor.predict(&scaled)?;
        if !output.is_finite() {
            return Err(PredictionError::NonFiniteOutput(output));
        }
        Ok(output)
    }
}
