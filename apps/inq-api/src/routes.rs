use axum::{
	Json, Router,
	extract::State,
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;

use inq_service::{
	EmbedRequest, EmbedResponse, Error as ServiceError, ModelSpecsRequest, ModelSpecsResponse,
	RefreshReport, ReindexReport, ReindexRequest, SearchRequest, SearchResponse, SuggestRequest,
	SuggestResponse,
};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/config", get(config_summary))
		.route("/v1/search/hybrid", post(search))
		.route("/v1/identifiers/suggest", post(suggest_identifiers))
		.route("/v1/models/specs", post(model_specs))
		.route("/v1/embeddings", post(embeddings))
		.with_state(state)
}

pub fn admin_router(state: AppState) -> Router {
	Router::new()
		.route("/v1/admin/refresh_identifiers", post(refresh_identifiers))
		.route("/v1/admin/reindex_asset", post(reindex_asset))
		.with_state(state)
}

/// Runtime settings without credentials or connection strings.
#[derive(Debug, Serialize)]
pub struct ConfigSummary {
	pub collection: String,
	pub vector_dim: u32,
	pub embedding_provider: String,
	pub embedding_model: String,
	pub llm_provider: String,
	pub llm_model: String,
	pub top_k: u32,
	pub rrf_k: u32,
	pub fuzzy_max_distance: u32,
	pub rerank_enabled: bool,
	pub rerank_top_n: u32,
}
impl From<&inq_config::Config> for ConfigSummary {
	fn from(cfg: &inq_config::Config) -> Self {
		Self {
			collection: cfg.storage.qdrant.collection.clone(),
			vector_dim: cfg.storage.qdrant.vector_dim,
			embedding_provider: cfg.providers.embedding.provider_id.clone(),
			embedding_model: cfg.providers.embedding.model.clone(),
			llm_provider: cfg.providers.llm.provider_id.clone(),
			llm_model: cfg.providers.llm.model.clone(),
			top_k: cfg.search.top_k,
			rrf_k: cfg.search.rrf_k,
			fuzzy_max_distance: cfg.search.fuzzy.max_distance,
			rerank_enabled: cfg.search.rerank.enabled,
			rerank_top_n: cfg.search.rerank.top_n,
		}
	}
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn config_summary(State(state): State<AppState>) -> Json<ConfigSummary> {
	Json(ConfigSummary::from(&state.service.cfg))
}

async fn search(
	State(state): State<AppState>,
	Json(payload): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
	let response = state.service.search(payload).await?;

	Ok(Json(response))
}

async fn suggest_identifiers(
	State(state): State<AppState>,
	Json(payload): Json<SuggestRequest>,
) -> Result<Json<SuggestResponse>, ApiError> {
	let response = state.service.suggest_identifiers(payload).await?;

	Ok(Json(response))
}

async fn model_specs(
	State(state): State<AppState>,
	Json(payload): Json<ModelSpecsRequest>,
) -> Result<Json<ModelSpecsResponse>, ApiError> {
	let response = state.service.model_specs(payload).await?;

	Ok(Json(response))
}

async fn embeddings(
	State(state): State<AppState>,
	Json(payload): Json<EmbedRequest>,
) -> Result<Json<EmbedResponse>, ApiError> {
	let response = state.service.embed_texts(payload).await?;

	Ok(Json(response))
}

async fn refresh_identifiers(
	State(state): State<AppState>,
) -> Result<Json<RefreshReport>, ApiError> {
	let response = state.service.refresh_identifier_index().await?;

	Ok(Json(response))
}

async fn reindex_asset(
	State(state): State<AppState>,
	Json(payload): Json<ReindexRequest>,
) -> Result<Json<ReindexReport>, ApiError> {
	let response = state.service.reindex_asset(payload).await?;

	Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: &'static str,
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
				Self::new(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message),
			ServiceError::NotFound { message } =>
				Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message),
			ServiceError::Provider { message } =>
				Self::new(StatusCode::BAD_GATEWAY, "PROVIDER_ERROR", message),
			ServiceError::Storage { message } => {
				tracing::error!(error = %message, "Catalog request failed.");

				Self::new(StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR", message)
			},
			ServiceError::Qdrant { message } => {
				tracing::error!(error = %message, "Vector store request failed.");

				Self::new(StatusCode::INTERNAL_SERVER_ERROR, "VECTOR_STORE_ERROR", message)
			},
			ServiceError::Serialization { message } =>
				Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message),
		}
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}
