use axum::{
    extract::{
        rejection::{FormRejection, QueryRejection},
        Query, State,
    },
    response::Response,
    Form,
};
use std::sync::Arc;

use crate::tensorboard::SeriesKind;
use crate::AppState;

use super::{json_body, parse_event_tuple, AppError, SeriesQuery};

// ─── GET /data/scalars?xp=..&name=.. ─────────────────────────────

pub async fn get_scalars(
    State(state): State<Arc<AppState>>,
    query: Result<Query<SeriesQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(query) = query?;
    let (xp, name) = query.series()?;

    proxy_series(&state, SeriesKind::Scalars, xp, name).await
}

// ─── POST /data/scalars?xp=..&name=.. ────────────────────────────

pub async fn post_scalar(
    State(state): State<Arc<AppState>>,
    query: Result<Query<SeriesQuery>, QueryRejection>,
    form: Result<Form<Vec<(String, String)>>, FormRejection>,
) -> Result<&'static str, AppError> {
    let Query(query) = query?;
    let (xp, name) = query.series()?;
    let Form(fields) = form?;

    let event = parse_event_tuple(fields)?;
    let value = event.payload.as_f64().ok_or_else(|| {
        AppError::BadRequest(format!(
            "scalar value should be a number but is '{}'",
            event.payload
        ))
    })?;

    let writer = state.writers.get_or_create(xp)?;
    writer
        .lock()
        .add_scalar(name, event.wall_time, event.step, value as f32)?;

    tracing::info!(xp, name, step = event.step, value, "scalar written");
    Ok("ok")
}

/// Shared by the scalar and histogram GET routes.
pub(super) async fn proxy_series(
    state: &AppState,
    kind: SeriesKind,
    xp: &str,
    name: &str,
) -> Result<Response, AppError> {
    match state.tensorboard.series(kind, xp, name).await {
        Ok(body) => Ok(json_body(body)),
        Err(e) => {
            tracing::debug!(xp, name, error = %e, "TensorBoard lookup failed");
            Err(AppError::BadRequest(format!(
                "Combination of experiment '{xp}' and name '{name}' does not exist"
            )))
        }
    }
}
