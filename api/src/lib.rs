//! HTTP service estimating CO2 emissions of non-residential buildings from a
//! pre-trained regression artifact, with a persisted request history.

pub mod app;
pub mod config;
pub mod error;
pub mod handler;
pub mod history;
pub mod model;
pub mod predictor;
pub mod schema;
pub mod store;
pub mod validation;

pub use app::{create_router, AppState};
pub use error::{ApiError, ApiResult};
