use axum::{
	Json, Router,
	extract::{Query, State},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;

use crate::state::AppState;
use sift_service::{
	Error as ServiceError, HistoryClearRequest, HistoryClearResponse, HistoryDeleteRequest,
	HistoryDeleteResponse, HistoryListRequest, HistoryListResponse, HistoryRecordRequest,
	HistoryRecordResponse, SearchRequest, SearchResponse,
};

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/search", post(search))
		.route("/v1/history", get(history_list))
		.route("/v1/history/record", post(history_record))
		.route("/v1/history/delete", post(history_delete))
		.route("/v1/history/clear", post(history_clear))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn search(
	State(state): State<AppState>,
	Json(payload): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
	let response = state.service.search(payload).await?;

	Ok(Json(response))
}

async fn history_list(
	State(state): State<AppState>,
	Query(params): Query<HistoryListRequest>,
) -> Result<Json<HistoryListResponse>, ApiError> {
	let response = state.service.history_list(params).await?;

	Ok(Json(response))
}

async fn history_record(
	State(state): State<AppState>,
	Json(payload): Json<HistoryRecordRequest>,
) -> Result<Json<HistoryRecordResponse>, ApiError> {
	let response = state.service.history_record(payload).await?;

	Ok(Json(response))
}

async fn history_delete(
	State(state): State<AppState>,
	Json(payload): Json<HistoryDeleteRequest>,
) -> Result<Json<HistoryDeleteResponse>, ApiError> {
	let response = state.service.history_delete(payload).await?;

	Ok(Json(response))
}

async fn history_clear(
	State(state): State<AppState>,
	Json(payload): Json<HistoryClearRequest>,
) -> Result<Json<HistoryClearResponse>, ApiError> {
	let response = state.service.history_clear(payload).await?;

	Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: &'static str,
	message: String,
}
impl ApiError {
	fn new(status: StatusCode, error_code: &'static str, message: impl Into<String>) -> Self {
		Self { status, error_code, message: message.into() }
	}
}
impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::InvalidRequest { message } =>
				Self::new(StatusCode::BAD_REQUEST, "invalid_request", message),
			ServiceError::NotFound { message } =>
				Self::new(StatusCode::NOT_FOUND, "not_found", message),
			ServiceError::EmbeddingFailed { message }
			| ServiceError::StoreUnavailable { message } => {
				tracing::error!(error = %message, "Search failed.");

				Self::new(StatusCode::INTERNAL_SERVER_ERROR, "search_failed", "Search failed.")
			},
			ServiceError::Provider { message } => {
				tracing::error!(error = %message, "Provider error.");

				Self::new(StatusCode::INTERNAL_SERVER_ERROR, "provider_error", "Provider error.")
			},
			ServiceError::Storage { message } => {
				tracing::error!(error = %message, "Storage error.");

				Self::new(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", "Storage error.")
			},
		}
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code.to_string(), message: self.message };

		(self.status, Json(body)).into_response()
	}
}
