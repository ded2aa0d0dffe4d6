use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::ApiResult;
use crate::model::{BuildingInput, PredictionRecord};
use crate::schema::BuildingFeatures;

/// Append-only persistence for building inputs and their predictions.
#[derive(Clone, Debug)]
pub struct Store {
    pool: SqlitePool,
}

/// Creates a connection pool with foreign keys enforced, creating the
/// database file if needed.
///
/// # Errors
///
/// Returns an error if the URL is invalid or the connection fails.
pub async fn create_pool(
    database_url: &str,
    max_connections: u32,
) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
}

impl Store {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Creates the `inputs` and `predictions` tables if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the DDL fails.
    pub async fn init_schema(&self) -> ApiResult<()> {
        // created_at defaults are evaluated under the write lock, so they
        // never decrease in id order.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS inputs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                PrimaryPropertyType TEXT NOT NULL,
                YearBuilt INTEGER NOT NULL,
                NumberofBuildings INTEGER NOT NULL,
                NumberofFloors INTEGER NOT NULL,
                LargestPropertyUseType TEXT NOT NULL,
                LargestPropertyUseTypeGFA REAL NOT NULL,
                created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS predictions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                input_id INTEGER NOT NULL REFERENCES inputs(id),
                predicted_co2 REAL NOT NULL,
                created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Records a validated input and returns its generated id.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::ApiError::Storage`] if the transaction fails; nothing is written.
    pub async fn save_input(&self, features: &BuildingFeatures) -> ApiResult<i64> {
        let mut tx = self.pool.begin().await?;
        let id = insert_input(&mut *tx, features).await?;
        tx.commit().await?;
        Ok(id)
    }

    /// Records a prediction for an existing input.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::ApiError::Storage`] if the transaction fails,
    /// including when `input_id` does not reference an input.
    pub async fn save_prediction(&self, input_id: i64, predicted_co2: f64) -> ApiResult<()> {
        let mut tx = self.pool.begin().await?;
        insert_prediction(&mut *tx, input_id, predicted_co2).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Records an input and its prediction in a single transaction, so a
    /// failure on either write leaves neither row behind.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::ApiError::Storage`] if the transaction fails.
    pub async fn save_input_with_prediction(
        &self,
        features: &BuildingFeatures,
        predicted_co2: f64,
    ) -> ApiResult<i64> {
        let mut tx = self.pool.begin().await?;
        let id = insert_input(&mut *tx, features).await?;
        tracing::debug!(input_id = id, "input staged");
        insert_prediction(&mut *tx, id, predicted_co2).await?;
        tx.commit().await?;
        Ok(id)
    }

    /// Lists every stored input in id order.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::ApiError::Storage`] if the query fails.
    pub async fn list_inputs(&self) -> ApiResult<Vec<BuildingInput>> {
        let inputs = sqlx::query_as::<_, BuildingInput>(
            r#"
            SELECT id, PrimaryPropertyType, YearBuilt, NumberofBuildings, NumberofFloors,
                   LargestPropertyUseType, LargestPropertyUseTypeGFA, created_at
            FROM inputs
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(inputs)
    }

    /// Lists every stored prediction in id order.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::ApiError::Storage`] if the query fails.
    pub async fn list_predictions(&self) -> ApiResult<Vec<PredictionRecord>> {
        let predictions = sqlx::query_as::<_, PredictionRecord>(
            r#"
            SELECT id, input_id, predicted_co2, created_at
            FROM predictions
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(predictions)
    }
}

async fn insert_input(conn: &mut SqliteConnection, features: &BuildingFeatures) -> ApiResult<i64> {
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO inputs (PrimaryPropertyType, YearBuilt, NumberofBuildings, NumberofFloors,
                            LargestPropertyUseType, LargestPropertyUseTypeGFA)
        VALUES (?, ?, ?, ?, ?, ?) RETURNING id
        "#,
    )
    .bind(&features.primary_property_type)
    .bind(features.year_built)
    .bind(features.number_of_buildings)
    .bind(features.number_of_floors)
    .bind(&features.largest_property_use_type)
    .bind(features.largest_property_use_type_gfa)
    .fetch_one(&mut *conn)
    .await?;
    Ok(id)
}

async fn insert_prediction(
    conn: &mut SqliteConnection,
    input_id: i64,
    predicted_co2: f64,
) -> ApiResult<()> {
    sqlx::query(
        r#"
        INSERT INTO predictions (input_id, predicted_co2)
        VALUES (?, ?)
        "#,
    )
    .bind(input_id)
    .bind(predicted_co2)
    .execute(&mut *conn)
    .await?;
    Ok(())
}
