use ::serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use crate::predictor::ModelInfo;

pub const EMISSIONS_UNIT: &str = "Metric Tons CO2e";

pub const EMISSIONS_DESCRIPTION: &str = "Total greenhouse gas emissions (CO2, CH4, N2O) from \
    energy consumption, expressed in CO2-equivalent using 2023 utility-specific emissions factors.";

/// A JSON number or a numeric string, coerced during validation.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum NumberLike {
    Int(i64),
    Float(f64),
    Text(String),
}

/// Prediction request body as received, before validation.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct RawBuildingInput {
    #[serde(rename = "PrimaryPropertyType", default)]
    pub primary_property_type: Option<String>,
    #[serde(rename = "YearBuilt", default)]
    pub year_built: Option<NumberLike>,
    #[serde(rename = "NumberofBuildings", default)]
    pub number_of_buildings: Option<NumberLike>,
    #[serde(rename = "NumberofFloors", default)]
    pub number_of_floors: Option<NumberLike>,
    #[serde(rename = "LargestPropertyUseType", default)]
    pub largest_property_use_type: Option<String>,
    #[serde(rename = "LargestPropertyUseTypeGFA", default)]
    pub largest_property_use_type_gfa: Option<NumberLike>,
}

/// Validated, normalized building characteristics.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct BuildingFeatures {
    #[serde(rename = "PrimaryPropertyType")]
    pub primary_property_type: String,
    #[serde(rename = "YearBuilt")]
    pub year_built: i64,
    #[serde(rename = "NumberofBuildings")]
    pub number_of_buildings: i64,
    #[serde(rename = "NumberofFloors")]
    pub number_of_floors: i64,
    #[serde(rename = "LargestPropertyUseType")]
    pub largest_property_use_type: String,
    #[serde(rename = "LargestPropertyUseTypeGFA")]
    pub largest_property_use_type_gfa: f64,
}

/// Model metadata in the flattened shape returned alongside a prediction.
#[derive(Debug, Deserialize, Serialize)]
pub struct PredictionModelInfo {
    pub model_type: String,
    #[serde(rename = "RMSE")]
    pub rmse: f64,
    #[serde(rename = "MAE")]
    pub mae: f64,
    #[serde(rename = "WAPE")]
    pub wape: f64,
    #[serde(rename = "performance_R2")]
    pub r2: f64,
    pub description: String,
}

impl From<&ModelInfo> for PredictionModelInfo {
    fn from(info: &ModelInfo) -> Self {
        Self {
            model_type: info.model_type.clone(),
            rmse: info.performance.rmse,
            mae: info.performance.mae,
            wape: info.performance.wape,
            r2: info.performance.r2_score,
            description: info.description.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct PredictionResponse {
    pub prediction: f64,
    pub unit: String,
    pub description: String,
    pub model_info: PredictionModelInfo,
    pub input_features: BuildingFeatures,
}

#[derive(Debug, Deserialize, Serialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
}

/// One prediction joined back to the input it was computed from.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct HistoryEntry {
    pub prediction_id: i64,
    pub input_id: i64,
    pub predicted_co2: f64,
    pub prediction_date: DateTime<Utc>,
    pub input_data: BuildingFeatures,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct HistoryResponse {
    pub total_predictions: usize,
    /// Predictions left out because their input row no longer resolves.
    pub orphaned_predictions: usize,
    pub predictions: Vec<HistoryEntry>,
}
