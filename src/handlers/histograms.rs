use axum::{
    extract::{
        rejection::{FormRejection, QueryRejection},
        Query, State,
    },
    response::Response,
    Form,
};
use serde_json::Value;
use std::sync::Arc;

use crate::histogram::{HistogramSummary, HISTOGRAM_SCHEMA};
use crate::tensorboard::SeriesKind;
use crate::AppState;

use super::scalars::proxy_series;
use super::{non_empty, parse_event_tuple, AppError, SeriesQuery};

// ─── GET /data/histograms?xp=..&name=.. ──────────────────────────

pub async fn get_histograms(
    State(state): State<Arc<AppState>>,
    query: Result<Query<SeriesQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(query) = query?;
    let (xp, name) = query.series()?;

    proxy_series(&state, SeriesKind::Histograms, xp, name).await
}

// ─── POST /data/histograms?xp=..&name=..&tobuild=.. ──────────────

pub async fn post_histogram(
    State(state): State<Arc<AppState>>,
    query: Result<Query<SeriesQuery>, QueryRejection>,
    form: Result<Form<Vec<(String, String)>>, FormRejection>,
) -> Result<&'static str, AppError> {
    let Query(query) = query?;
    let (Some(xp), Some(name), Some(tobuild)) = (
        non_empty(&query.xp),
        non_empty(&query.name),
        non_empty(&query.tobuild),
    ) else {
        return Err(AppError::BadRequest(
            "xp, name and tobuild arguments are required".into(),
        ));
    };
    let Form(fields) = form?;

    let event = parse_event_tuple(fields)?;
    let histogram = if tobuild == "true" {
        build_from_samples(&event.payload)?
    } else {
        HISTOGRAM_SCHEMA.validate(&event.payload)?
    };

    let writer = state.writers.get_or_create(xp)?;
    writer
        .lock()
        .add_histogram(name, event.wall_time, event.step, &histogram)?;

    tracing::info!(xp, name, step = event.step, num = histogram.num, "histogram written");
    Ok("ok")
}

fn build_from_samples(payload: &Value) -> Result<HistogramSummary, AppError> {
    let items = payload
        .as_array()
        .filter(|items| !items.is_empty())
        .ok_or_else(|| {
            AppError::BadRequest(format!(
                "elements to build the histogram are not in a list but '{payload}'"
            ))
        })?;

    let samples = items
        .iter()
        .map(|item| {
            item.as_f64().ok_or_else(|| {
                AppError::BadRequest(format!(
                    "elements to build the histogram should be numbers but got '{item}'"
                ))
            })
        })
        .collect::<Result<Vec<f64>, AppError>>()?;

    Ok(HistogramSummary::from_samples(&samples)?)
}
