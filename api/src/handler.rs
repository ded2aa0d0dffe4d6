use axum::extract::rejection::JsonRejection;
use axum::{
    extract::{Json, State},
    response::IntoResponse,
};
use tracing::{debug, info, warn};

use crate::app::AppState;
use crate::error::{ApiError, ApiResult};
use crate::history::build_history;
use crate::schema::{
    HealthResponse, PredictionModelInfo, PredictionResponse, RawBuildingInput,
    EMISSIONS_DESCRIPTION, EMISSIONS_UNIT,
};
use crate::validation::validate;

pub async fn home() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "CO2 emissions prediction API",
        "endpoints": ["/predict", "/predictions", "/model_info", "/health"]
    }))
}

pub async fn predict_emissions(
    State(state): State<AppState>,
    payload: Result<Json<RawBuildingInput>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(raw) = payload.map_err(|e| ApiError::Validation(e.body_text()))?;
    let response = run_prediction(&state, &raw).await?;
    Ok(Json(response))
}

/// Validates, predicts and persists one request.
///
/// Nothing is written unless validation and prediction both succeed. The
/// input and its prediction are then stored in one transaction, and the
/// value is only returned once that transaction has committed.
///
/// # Errors
///
/// Returns the [`ApiError`] of the first stage that failed.
pub async fn run_prediction(
    state: &AppState,
    raw: &RawBuildingInput,
) -> ApiResult<PredictionResponse> {
    let features = validate(raw)?;
    debug!(stage = "validated", "prediction request");

    let predictor = state.model.load().await.map_err(|e| match e {
        ApiError::NotFound(path) => {
            ApiError::Prediction(format!("model artifact not found: {path}"))
        }
        other => other,
    })?;
    let prediction = predictor.predict(&features)?;
    debug!(stage = "predicted", prediction, "prediction request");

    let input_id = state
        .store
        .save_input_with_prediction(&features, prediction)
        .await?;
    info!(input_id, prediction, "prediction recorded");

    Ok(PredictionResponse {
        prediction,
        unit: EMISSIONS_UNIT.to_string(),
        description: EMISSIONS_DESCRIPTION.to_string(),
        model_info: PredictionModelInfo::from(predictor.model_info()),
        input_features: features,
    })
}

pub async fn get_model_info(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let predictor = state.model.load().await?;
    Ok(Json(predictor.model_info().clone()))
}

// reports healthy even without a model, the service itself is reachable
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let model_loaded = match state.model.load().await {
        Ok(_) => true,
        Err(ApiError::NotFound(path)) => {
            debug!(%path, "model artifact missing");
            false
        }
        Err(e) => {
            warn!(error = %e, "model artifact failed to load");
            false
        }
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        model_loaded,
    })
}

pub async fn get_prediction_history(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let history = build_history(&state.store).await?;
    Ok(Json(history))
}
