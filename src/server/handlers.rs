use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    Extension, Json,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};

use super::{auth::AuthUser, AppState};
use crate::analysis::{
    AnalysisRequest, CodeAnalysisResult, CodeSubmission, DebugRequest, DebugResult,
    ErrorAnalysisRequest, ErrorAnalysisResult, PerformanceResult, Recorded, SecurityResult,
};
use crate::error::{ApiError, ApiResult};
use crate::store::{AnalysisRecord, DebugListQuery, DebugSessionRecord, HistoryStats, ListQuery};

/// `{success: true, data, count?}`
#[derive(Debug, Serialize)]
pub struct Success<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<usize>,
}

impl<T> Success<T> {
    fn data(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
            count: None,
        })
    }
}

impl<T> Success<Vec<T>> {
    fn list(data: Vec<T>) -> Json<Self> {
        let count = data.len();
        Json(Self {
            success: true,
            data,
            count: Some(count),
        })
    }
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|e| ApiError::Validation(e.body_text()))
}

fn query<T: DeserializeOwned>(params: Result<Query<T>, QueryRejection>) -> ApiResult<T> {
    params
        .map(|Query(value)| value)
        .map_err(|e| ApiError::Validation(e.body_text()))
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn analyze_code(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<AnalysisRequest>, JsonRejection>,
) -> ApiResult<Json<Success<Recorded<CodeAnalysisResult>>>> {
    let request = body(payload)?;
    let recorded = state
        .service
        .analyze_code(&user.id.to_string(), &request)
        .await?;
    Ok(Success::data(recorded))
}

pub async fn analyze_security(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<CodeSubmission>, JsonRejection>,
) -> ApiResult<Json<Success<Recorded<SecurityResult>>>> {
    let submission = body(payload)?;
    let recorded = state
        .service
        .analyze_security(&user.id.to_string(), &submission)
        .await?;
    Ok(Success::data(recorded))
}

pub async fn analyze_performance(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<CodeSubmission>, JsonRejection>,
) -> ApiResult<Json<Success<Recorded<PerformanceResult>>>> {
    let submission = body(payload)?;
    let recorded = state
        .service
        .analyze_performance(&user.id.to_string(), &submission)
        .await?;
    Ok(Success::data(recorded))
}

pub async fn debug_error(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<DebugRequest>, JsonRejection>,
) -> ApiResult<Json<Success<Recorded<DebugResult>>>> {
    let request = body(payload)?;
    let recorded = state
        .service
        .debug_error(&user.id.to_string(), &request)
        .await?;
    Ok(Success::data(recorded))
}

pub async fn analyze_error(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<ErrorAnalysisRequest>, JsonRejection>,
) -> ApiResult<Json<Success<Recorded<ErrorAnalysisResult>>>> {
    let request = body(payload)?;
    let recorded = state
        .service
        .analyze_error(&user.id.to_string(), &request)
        .await?;
    Ok(Success::data(recorded))
}

pub async fn list_analyses(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    params: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Json<Success<Vec<AnalysisRecord>>>> {
    let params = query(params)?;
    let rows = state
        .service
        .store()
        .list_analyses(&user.id.to_string(), &params)?;
    Ok(Success::list(rows))
}

pub async fn analysis_stats(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<Success<HistoryStats>>> {
    let stats = state.service.store().stats(&user.id.to_string())?;
    Ok(Success::data(stats))
}

pub async fn get_analysis(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<Success<AnalysisRecord>>> {
    let record = state
        .service
        .store()
        .get_analysis(&id, &user.id.to_string())?
        .ok_or(ApiError::NotFound("Analysis"))?;
    Ok(Success::data(record))
}

pub async fn list_debug_sessions(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    params: Result<Query<DebugListQuery>, QueryRejection>,
) -> ApiResult<Json<Success<Vec<DebugSessionRecord>>>> {
    let params = query(params)?;
    let rows = state
        .service
        .store()
        .list_debug_sessions(&user.id.to_string(), &params)?;
    Ok(Success::list(rows))
}

pub async fn get_debug_session(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<Success<DebugSessionRecord>>> {
    let record = state
        .service
        .store()
        .get_debug_session(&id, &user.id.to_string())?
        .ok_or(ApiError::NotFound("Debugging session"))?;
    Ok(Success::data(record))
}
