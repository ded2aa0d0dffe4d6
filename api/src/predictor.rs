//! Regression artifact loading and inference.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::schema::BuildingFeatures;

pub const FEATURE_COUNT: usize = 6;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Performance {
    pub rmse: f64,
    pub mae: f64,
    pub wape: f64,
    pub r2_score: f64,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ModelInfo {
    pub model_type: String,
    pub performance: Performance,
    pub description: String,
}

#[derive(Debug, Deserialize)]
struct ModelArtifact {
    model_type: String,
    description: String,
    performance: Performance,
    categories: Vocabularies,
    regressor: Regressor,
}

#[derive(Debug, Deserialize)]
struct Vocabularies {
    #[serde(rename = "PrimaryPropertyType")]
    primary_property_type: Vec<String>,
    #[serde(rename = "LargestPropertyUseType")]
    largest_property_use_type: Vec<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Regressor {
    Linear {
        intercept: f64,
        coefficients: Vec<f64>,
    },
    TreeEnsemble {
        base_score: f64,
        learning_rate: f64,
        trees: Vec<Tree>,
    },
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Tree {
    nodes: Vec<Node>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Node {
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

impl Regressor {
    fn check(&self) -> ApiResult<()> {
        match self {
            Regressor::Linear { coefficients, .. } => {
                if coefficients.len() != FEATURE_COUNT {
                    return Err(ApiError::Prediction(format!(
                        "linear model expects {FEATURE_COUNT} coefficients, found {}",
                        coefficients.len()
                    )));
                }
            }
            Regressor::TreeEnsemble { trees, .. } => {
                for (t, tree) in trees.iter().enumerate() {
                    tree.check().map_err(|reason| {
                        ApiError::Prediction(format!("tree {t} is malformed: {reason}"))
                    })?;
                }
            }
        }
        Ok(())
    }

    fn predict(&self, x: &[f64; FEATURE_COUNT]) -> f64 {
        match self {
            Regressor::Linear {
                intercept,
                coefficients,
            } => intercept + coefficients.iter().zip(x).map(|(c, v)| c * v).sum::<f64>(),
            Regressor::TreeEnsemble {
                base_score,
                learning_rate,
                trees,
            } => base_score + learning_rate * trees.iter().map(|t| t.leaf_value(x)).sum::<f64>(),
        }
    }
}

impl Tree {
    // Children must sit after their parent, so every walk from the root ends.
    fn check(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("no nodes".into());
        }
        for (i, node) in self.nodes.iter().enumerate() {
            if let Node::Split {
                feature,
                left,
                right,
                ..
            } = node
            {
                if *feature >= FEATURE_COUNT {
                    return Err(format!("node {i} splits on unknown feature {feature}"));
                }
                for child in [*left, *right] {
                    if child <= i || child >= self.nodes.len() {
                        return Err(format!("node {i} has invalid child {child}"));
                    }
                }
            }
        }
        Ok(())
    }

    fn leaf_value(&self, x: &[f64; FEATURE_COUNT]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => idx = if x[*feature] <= *threshold { *left } else { *right },
            }
        }
    }
}

/// Label encoding over a fixed, sorted vocabulary.
#[derive(Clone, Debug)]
pub struct CategoryEncoder {
    codes: HashMap<String, usize>,
}

impl CategoryEncoder {
    pub fn fit(values: &[String]) -> Self {
        let mut vocabulary: Vec<&str> = values.iter().map(|v| v.trim()).collect();
        vocabulary.sort_unstable();
        vocabulary.dedup();

        let codes = vocabulary
            .into_iter()
            .enumerate()
            .map(|(code, value)| (value.to_string(), code))
            .collect();
        Self { codes }
    }

    /// Unknown categories share the code one past the vocabulary.
    pub fn encode(&self, value: &str) -> usize {
        self.codes
            .get(value)
            .copied()
            .unwrap_or(self.codes.len())
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.codes.len()
    }
}

#[derive(Debug)]
pub struct Predictor {
    info: ModelInfo,
    primary_property_type: CategoryEncoder,
    largest_property_use_type: CategoryEncoder,
    regressor: Regressor,
}

impl Predictor {
    pub fn from_json(raw: &str) -> ApiResult<Self> {
        let artifact: ModelArtifact = serde_json::from_str(raw)
            .map_err(|e| ApiError::Prediction(format!("invalid model artifact: {e}")))?;
        artifact.regressor.check()?;

        Ok(Self {
            info: ModelInfo {
                model_type: artifact.model_type,
                performance: artifact.performance,
                description: artifact.description,
            },
            primary_property_type: CategoryEncoder::fit(&artifact.categories.primary_property_type),
            largest_property_use_type: CategoryEncoder::fit(
                &artifact.categories.largest_property_use_type,
            ),
            regressor: artifact.regressor,
        })
    }

    pub fn model_info(&self) -> &ModelInfo {
        &self.info
    }

    pub fn encode(&self, features: &BuildingFeatures) -> [f64; FEATURE_COUNT] {
        [
            self.primary_property_type
                .encode(&features.primary_property_type) as f64,
            features.year_built as f64,
            features.number_of_buildings as f64,
            features.number_of_floors as f64,
            self.largest_property_use_type
                .encode(&features.largest_property_use_type) as f64,
            features.largest_property_use_type_gfa,
        ]
    }

    /// Estimates emissions in metric tons CO2e.
    pub fn predict(&self, features: &BuildingFeatures) -> ApiResult<f64> {
        let value = self.regressor.predict(&self.encode(features));
        if !value.is_finite() {
            return Err(ApiError::Prediction(format!(
                "model produced a non-finite estimate ({value})"
            )));
        }
        Ok(value)
    }
}

/// Load-once handle to the model artifact. A failed load leaves it empty
/// so a later call retries.
#[derive(Clone, Debug)]
pub struct ModelHandle {
    path: PathBuf,
    cell: Arc<OnceCell<Arc<Predictor>>>,
}

impl ModelHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cell: Arc::new(OnceCell::new()),
        }
    }

    pub async fn load(&self) -> ApiResult<Arc<Predictor>> {
        self.cell
            .get_or_try_init(|| read_artifact(&self.path))
            .await
            .cloned()
    }

    #[cfg(test)]
    pub(crate) fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

async fn read_artifact(path: &Path) -> ApiResult<Arc<Predictor>> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ApiError::NotFound(path.display().to_string()))
        }
        Err(e) => {
            return Err(ApiError::Prediction(format!(
                "cannot read {}: {e}",
                path.display()
            )))
        }
    };

    let predictor = Predictor::from_json(&raw)?;
    info!(
        path = %path.display(),
        model_type = %predictor.info.model_type,
        "Loaded model artifact"
    );
    Ok(Arc::new(predictor))
}
