use axum::{
    routing::{get, post},
    Router,
};

use crate::handler::{get_model_info, get_prediction_history, health, home, predict_emissions};
use crate::predictor::ModelHandle;
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub model: ModelHandle,
}

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/predict", post(predict_emissions))
        .route("/model_info", get(get_model_info))
        .route("/health", get(health))
        .route("/predictions", get(get_prediction_history)) // joined input/prediction history
        .with_state(app_state)
}
