use axum::{
	Json, Router,
	extract::{Query, State},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::get,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use jobshelf_service::{SearchResponse, TrendingSnapshot, Video};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/api/health", get(health))
		.route("/api/search", get(search))
		.route("/api/jobs/hot", get(hot_jobs))
		.route("/api/videos", get(videos))
		.with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct KeywordParams {
	pub keyword: Option<String>,
}
impl KeywordParams {
	fn require(self) -> Result<String, ApiError> {
		self.keyword.ok_or_else(|| {
			json_error(StatusCode::BAD_REQUEST, "invalid_request", "keyword is required.")
		})
	}
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
	pub status: &'static str,
	#[serde(with = "jobshelf_service::time_serde::option")]
	pub trending_updated_at: Option<OffsetDateTime>,
	pub trending_entries: usize,
}

#[derive(Debug, Serialize)]
pub struct VideosResponse {
	pub keyword: String,
	pub videos: Vec<Video>,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
	let snapshot = state.service.trending.snapshot();

	Json(HealthResponse {
		status: "ok",
		trending_updated_at: snapshot.last_updated,
		trending_entries: snapshot.entries.len(),
	})
}

async fn search(
	State(state): State<AppState>,
	Query(params): Query<KeywordParams>,
) -> Result<Json<SearchResponse>, ApiError> {
	let keyword = params.require()?;
	let response = state.service.resolve_and_search(&keyword).await;

	Ok(Json(response))
}

async fn hot_jobs(State(state): State<AppState>) -> Json<TrendingSnapshot> {
	Json(state.service.trending().await)
}

async fn videos(
	State(state): State<AppState>,
	Query(params): Query<KeywordParams>,
) -> Result<Json<VideosResponse>, ApiError> {
	let keyword = params.require()?;
	let videos = state.service.suggest_videos(&keyword).await;

	Ok(Json(VideosResponse { keyword, videos }))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}

pub fn json_error(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
	ApiError { status, error_code: code.to_string(), message: message.into() }
}
