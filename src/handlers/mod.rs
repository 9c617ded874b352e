pub mod experiments;
pub mod histograms;
pub mod scalars;

use axum::{
    extract::rejection::{FormRejection, QueryRejection},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::Value;

use crate::events::EventError;
use crate::histogram::{HistogramError, SchemaError};

pub const NOT_FOUND_MESSAGE: &str = "This is not the web page you are looking for.";

// ─── Query string ────────────────────────────────────────────────

/// `?xp=..&name=..[&tobuild=..]`. Empty values count as missing.
#[derive(Debug, Default, Deserialize)]
pub struct SeriesQuery {
    pub xp: Option<String>,
    pub name: Option<String>,
    pub tobuild: Option<String>,
}

fn non_empty(v: &Option<String>) -> Option<&str> {
    v.as_deref().filter(|s| !s.is_empty())
}

impl SeriesQuery {
    /// `(xp, name)` or the standard 400.
    pub fn series(&self) -> Result<(&str, &str), AppError> {
        match (non_empty(&self.xp), non_empty(&self.name)) {
            (Some(xp), Some(name)) => Ok((xp, name)),
            _ => Err(AppError::BadRequest(
                "xp and name arguments are required".into(),
            )),
        }
    }
}

// ─── POST body ───────────────────────────────────────────────────

/// A decoded `[wall_time, step, payload]` body.
#[derive(Debug)]
pub struct EventTuple {
    pub wall_time: f64,
    pub step: i64,
    pub payload: Value,
}

/// The body is form-encoded with exactly one field whose *key* is the
/// JSON-encoded tuple.
pub fn parse_event_tuple(fields: Vec<(String, String)>) -> Result<EventTuple, AppError> {
    let [(key, _)] = <[(String, String); 1]>::try_from(fields).map_err(|fields| {
        let keys: Vec<&str> = fields.iter().map(|(k, _)| k.as_str()).collect();
        AppError::BadRequest(format!("POST content is not correct: {keys:?}"))
    })?;

    let data: Value = serde_json::from_str(&key)
        .map_err(|e| AppError::BadRequest(format!("POST content is not valid JSON: {e}")))?;

    let Some([wall_time, step, payload]) = data
        .as_array()
        .and_then(|items| <&[Value; 3]>::try_from(items.as_slice()).ok())
    else {
        return Err(AppError::BadRequest(format!(
            "POST does not contain a list of 3 elements but '{data}'"
        )));
    };

    let wall_time = wall_time.as_f64().ok_or_else(|| {
        AppError::BadRequest(format!("wall_time should be a number but is '{wall_time}'"))
    })?;
    let step = step.as_i64().ok_or_else(|| {
        AppError::BadRequest(format!("step should be an integer but is '{step}'"))
    })?;

    Ok(EventTuple {
        wall_time,
        step,
        payload: payload.clone(),
    })
}

/// Relays a TensorBoard JSON body as-is.
pub fn json_body(body: String) -> Response {
    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}

pub async fn not_found() -> AppError {
    AppError::NotFound(NOT_FOUND_MESSAGE.into())
}

// ─── Unified error type ──────────────────────────────────────────

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::BadRequest(msg) => {
                tracing::warn!(%msg, "wrong argument");
                (StatusCode::BAD_REQUEST, msg)
            }
            Self::Internal(msg) => {
                tracing::error!(%msg, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        (status, message).into_response()
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<FormRejection> for AppError {
    fn from(rejection: FormRejection) -> Self {
        Self::BadRequest(format!("POST content is not correct: {}", rejection.body_text()))
    }
}

impl From<EventError> for AppError {
    fn from(err: EventError) -> Self {
        match err {
            EventError::InvalidExperiment(_) => Self::BadRequest(err.to_string()),
            EventError::Io(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<HistogramError> for AppError {
    fn from(err: HistogramError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<SchemaError> for AppError {
    fn from(err: SchemaError) -> Self {
        Self::BadRequest(err.to_string())
    }
}
