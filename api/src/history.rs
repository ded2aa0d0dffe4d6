use std::collections::HashMap;

use tracing::warn;

use crate::error::ApiResult;
use crate::model::{BuildingInput, PredictionRecord};
use crate::schema::{HistoryEntry, HistoryResponse};
use crate::store::Store;

pub async fn build_history(store: &Store) -> ApiResult<HistoryResponse> {
    let predictions = store.list_predictions().await?;
    let inputs = store.list_inputs().await?;
    Ok(reconcile(&predictions, &inputs))
}

// Orphaned predictions are counted, not listed.
pub fn reconcile(predictions: &[PredictionRecord], inputs: &[BuildingInput]) -> HistoryResponse {
    let mut by_id: HashMap<i64, &BuildingInput> = HashMap::with_capacity(inputs.len());
    for input in inputs {
        by_id.entry(input.id).or_insert(input);
    }

    let mut entries = Vec::with_capacity(predictions.len());
    let mut orphaned = 0;
    for prediction in predictions {
        match by_id.get(&prediction.input_id) {
            Some(input) => entries.push(HistoryEntry {
                prediction_id: prediction.id,
                input_id: prediction.input_id,
                predicted_co2: prediction.predicted_co2,
                prediction_date: prediction.created_at,
                input_data: input.features(),
            }),
            None => orphaned += 1,
        }
    }

    if orphaned > 0 {
        warn!(orphaned, "predictions reference missing inputs");
    }

    HistoryResponse {
        total_predictions: entries.len(),
        orphaned_predictions: orphaned,
        predictions: entries,
    }
}
