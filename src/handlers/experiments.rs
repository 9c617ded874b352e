use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use crate::AppState;

use super::AppError;

/// Data types TensorBoard reports that the relay cannot write or proxy.
pub const UNSUPPORTED_TYPES: &[&str] = &[
    "audio",
    "compressedHistograms",
    "graph",
    "images",
    "meta_graph",
    "run_metadata",
];

#[derive(Debug, Deserialize)]
pub struct ExperimentQuery {
    pub xp: Option<String>,
}

// ─── GET /data[?xp=NAME] ─────────────────────────────────────────

pub async fn list_experiments(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ExperimentQuery>, QueryRejection>,
) -> Result<Json<Value>, AppError> {
    let Query(query) = query?;

    let mut runs = state.tensorboard.runs().await.map_err(|e| {
        AppError::BadRequest(format!(
            "Cannot list experiments from TensorBoard at {}: {e}",
            state.tensorboard.base_url()
        ))
    })?;

    let Some(xp) = query.xp.filter(|xp| !xp.is_empty()) else {
        let names: Vec<Value> = runs.keys().cloned().map(Value::String).collect();
        return Ok(Json(Value::Array(names)));
    };

    let mut metadata = runs
        .remove(&xp)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown experiment name '{xp}'")))?;

    if let Some(types) = metadata.as_object_mut() {
        for unsupported in UNSUPPORTED_TYPES {
            types.remove(*unsupported);
        }
    }

    Ok(Json(metadata))
}
