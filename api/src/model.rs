use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::schema::BuildingFeatures;

/// A row of the `inputs` table.
#[derive(Clone, Debug, Deserialize, FromRow, Serialize)]
pub struct BuildingInput {
    pub id: i64,
    #[sqlx(rename = "PrimaryPropertyType")]
    #[serde(rename = "PrimaryPropertyType")]
    pub primary_property_type: String,
    #[sqlx(rename = "YearBuilt")]
    #[serde(rename = "YearBuilt")]
    pub year_built: i64,
    #[sqlx(rename = "NumberofBuildings")]
    #[serde(rename = "NumberofBuildings")]
    pub number_of_buildings: i64,
    #[sqlx(rename = "NumberofFloors")]
    #[serde(rename = "NumberofFloors")]
    pub number_of_floors: i64,
    #[sqlx(rename = "LargestPropertyUseType")]
    #[serde(rename = "LargestPropertyUseType")]
    pub largest_property_use_type: String,
    #[sqlx(rename = "LargestPropertyUseTypeGFA")]
    #[serde(rename = "LargestPropertyUseTypeGFA")]
    pub largest_property_use_type_gfa: f64,
    pub created_at: DateTime<Utc>,
}

impl BuildingInput {
    pub fn features(&self) -> BuildingFeatures {
        BuildingFeatures {
            primary_property_type: self.primary_property_type.clone(),
            year_built: self.year_built,
            number_of_buildings: self.number_of_buildings,
            number_of_floors: self.number_of_floors,
            largest_property_use_type: self.largest_property_use_type.clone(),
            largest_property_use_type_gfa: self.largest_property_use_type_gfa,
        }
    }
}

/// A row of the `predictions` table.
#[derive(Clone, Debug, Deserialize, FromRow, Serialize)]
pub struct PredictionRecord {
    pub id: i64,
    pub input_id: i64, // references inputs.id
    pub predicted_co2: f64,
    pub created_at: DateTime<Utc>,
}
