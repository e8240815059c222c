use axum::{
	Json, Router,
	body::Bytes,
	extract::{Path, State},
	http::{HeaderMap, HeaderValue, Method, StatusCode, header},
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;
use tower_http::cors::{Any, CorsLayer};

use shoplens_service::{
	Error as ServiceError, IngestResponse, SearchRequest, SearchResponse, WebhookEvent,
	WebhookResponse,
};

use crate::{cli, state::AppState};

const HEADER_TOPIC: &str = "x-shopify-topic";
const HEADER_SHOP_DOMAIN: &str = "x-shopify-shop-domain";
const ENDPOINTS: [&str; 5] =
	["/semantic-search/", "/receive-products/", "/product-webhook/", "/test", "/test-search/{query}"];

#[derive(Debug, Serialize)]
struct RootStatus {
	status: &'static str,
	version: &'static str,
	endpoints: [&'static str; 5],
	index_backend: &'static str,
	index_name: String,
	embedding_status: &'static str,
	index_status: &'static str,
}

#[derive(Debug, Serialize)]
struct TestStatus {
	status: &'static str,
	#[serde(with = "time::serde::rfc3339")]
	timestamp: OffsetDateTime,
	embedding_configured: bool,
	rerank_configured: bool,
	index_configured: bool,
	index_backend: &'static str,
	index_name: String,
}

pub fn router(state: AppState) -> Router {
	let cors = cors_layer(&state.service.cfg.service);

	Router::new()
		.route("/", get(root))
		.route("/test", get(test_status))
		.route("/test-search/{query}", get(test_search))
		.route("/semantic-search/", post(semantic_search))
		.route("/semantic-search", post(semantic_search))
		.route("/receive-products/", post(receive_products))
		.route("/receive-products", post(receive_products))
		.route("/product-webhook/", post(product_webhook))
		.route("/product-webhook", post(product_webhook))
		.layer(cors)
		.with_state(state)
}

fn cors_layer(cfg: &shoplens_config::Service) -> CorsLayer {
	if cfg.cors_allows_any() {
		return CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
	}

	let origins: Vec<HeaderValue> = cfg
		.cors_allowed_origins
		.iter()
		.filter_map(|origin| match HeaderValue::from_str(origin) {
			Ok(value) => Some(value),
			Err(err) => {
				tracing::warn!(%origin, error = %err, "Skipping invalid CORS origin.");

				None
			},
		})
		.collect();

	CorsLayer::new()
		.allow_origin(origins)
		.allow_credentials(true)
		.allow_methods([Method::GET, Method::POST, Method::OPTIONS])
		.allow_headers([header::CONTENT_TYPE])
}

async fn root(State(state): State<AppState>) -> Json<RootStatus> {
	Json(RootStatus {
		status: "Backend is running!",
		version: cli::VERSION,
		endpoints: ENDPOINTS,
		index_backend: state.service.index_backend().as_str(),
		index_name: state.service.index_name().to_string(),
		embedding_status: "configured",
		index_status: "configured",
	})
}

async fn test_status(State(state): State<AppState>) -> Json<TestStatus> {
	let cfg = &state.service.cfg;

	Json(TestStatus {
		status: "Backend is working!",
		timestamp: OffsetDateTime::now_utc(),
		embedding_configured: !cfg.providers.embedding.api_key.is_empty(),
		rerank_configured: !cfg.providers.rerank.api_key.is_empty(),
		index_configured: !cfg.storage.index.url.is_empty(),
		index_backend: state.service.index_backend().as_str(),
		index_name: state.service.index_name().to_string(),
	})
}

async fn test_search(
	State(state): State<AppState>,
	Path(query): Path<String>,
) -> Json<SearchResponse> {
	tracing::debug!(%query, "Test search.");

	Json(state.service.search(SearchRequest { query }).await)
}

async fn semantic_search(State(state): State<AppState>, body: Bytes) -> Json<SearchResponse> {
	let response = match serde_json::from_slice::<SearchRequest>(&body) {
		Ok(request) => state.service.search(request).await,
		Err(err) => {
			tracing::warn!(error = %err, "Rejected search request body.");

			SearchResponse::failed("", format!("Invalid request body: {err}."))
		},
	};

	Json(response)
}

async fn receive_products(
	State(state): State<AppState>,
	body: Bytes,
) -> Result<Json<IngestResponse>, ApiError> {
	let payload: Value = serde_json::from_slice(&body).map_err(|err| {
		json_error(
			StatusCode::BAD_REQUEST,
			"INVALID_REQUEST",
			format!("Request body must be JSON: {err}."),
			Some(vec!["$".to_string()]),
		)
	})?;
	let response = state.service.ingest_catalog(payload).await?;

	Ok(Json(response))
}

async fn product_webhook(
	State(state): State<AppState>,
	headers: HeaderMap,
	body: Bytes,
) -> Json<WebhookResponse> {
	let header_text = |name: &str| {
		headers.get(name).and_then(|value| value.to_str().ok()).map(str::to_string)
	};
	let payload = serde_json::from_slice(&body).unwrap_or(Value::Null);
	let event = WebhookEvent {
		topic: header_text(HEADER_TOPIC),
		shop_domain: header_text(HEADER_SHOP_DOMAIN),
		payload,
	};
	let receipt = state.service.handle_webhook(event).await;

	Json(receipt.response())
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}
impl ApiError {
	fn new(
		status: StatusCode,
		error_code: impl Into<String>,
		message: impl Into<String>,
		fields: Option<Vec<String>>,
	) -> Self {
		Self { status, error_code: error_code.into(), message: message.into(), fields }
	}
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::InvalidRequest { message, field } => json_error(
				StatusCode::BAD_REQUEST,
				"INVALID_REQUEST",
				message,
				field.map(|field| vec![field]),
			),
			ServiceError::Storage { message } => {
				tracing::error!(error = %message, "Catalog snapshot write failed.");

				json_error(StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR", message, None)
			},
			ServiceError::Provider { message } =>
				json_error(StatusCode::BAD_GATEWAY, "PROVIDER_ERROR", message, None),
			ServiceError::Index { message } =>
				json_error(StatusCode::BAD_GATEWAY, "INDEX_ERROR", message, None),
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body =
			ErrorBody { error_code: self.error_code, message: self.message, fields: self.fields };

		(self.status, Json(body)).into_response()
	}
}

pub fn json_error(
	status: StatusCode,
	code: &str,
	message: impl Into<String>,
	fields: Option<Vec<String>>,
) -> ApiError {
	ApiError::new(status, code, message, fields)
}
