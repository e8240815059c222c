use axum::{
	Router,
	body::{self, Body},
	http::{Request, Response, StatusCode},
};
use serde_json::{Value, json};
use tower::util::ServiceExt;

use shoplens_api::{routes, state::AppState};
use shoplens_testkit::TestWorkspace;

fn app(workspace: &TestWorkspace) -> Router {
	let state = AppState::new(workspace.config()).expect("Failed to initialize app state.");

	routes::router(state)
}

fn post_json(uri: &str, payload: &str) -> Request<Body> {
	Request::builder()
		.method("POST")
		.uri(uri)
		.header("content-type", "application/json")
		.body(Body::from(payload.to_string()))
		.expect("Failed to build request.")
}

fn get(uri: &str) -> Request<Body> {
	Request::builder().uri(uri).body(Body::empty()).expect("Failed to build request.")
}

async fn json_body(response: Response<Body>) -> Value {
	let body = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Failed to read response body.");

	serde_json::from_slice(&body).expect("Failed to parse response.")
}

#[tokio::test]
async fn root_lists_endpoints() {
	let workspace = TestWorkspace::new().expect("Failed to create workspace.");
	let response = app(&workspace).oneshot(get("/")).await.expect("Failed to call /.");

	assert_eq!(response.status(), StatusCode::OK);

	let json = json_body(response).await;

	assert_eq!(json["status"], "Backend is running!");
	assert_eq!(json["index_backend"], "pinecone");
	assert_eq!(json["index_name"], "productdisc-test");
	assert_eq!(json["endpoints"][0], "/semantic-search/");
	assert_eq!(json["endpoints"].as_array().map(Vec::len), Some(5));
}

#[tokio::test]
async fn test_route_reports_configuration() {
	let workspace = TestWorkspace::new().expect("Failed to create workspace.");
	let response = app(&workspace).oneshot(get("/test")).await.expect("Failed to call /test.");
	let json = json_body(response).await;

	assert_eq!(json["status"], "Backend is working!");
	assert_eq!(json["embedding_configured"], true);
	assert_eq!(json["rerank_configured"], true);
	assert_eq!(json["index_configured"], true);
	assert!(json["timestamp"].as_str().is_some_and(|ts| ts.ends_with('Z')));
}

#[tokio::test]
async fn unreachable_provider_yields_failure_body_with_ok_status() {
	let workspace = TestWorkspace::new().expect("Failed to create workspace.");

	for uri in ["/semantic-search/", "/semantic-search"] {
		let response = app(&workspace)
			.oneshot(post_json(uri, r#"{"query":"red shoes"}"#))
			.await
			.expect("Failed to call search.");

		assert_eq!(response.status(), StatusCode::OK);

		let json = json_body(response).await;

		assert_eq!(json["success"], false);
		assert_eq!(json["query"], "red shoes");
		assert_eq!(json["products"], json!([]));
		assert_eq!(json["count"], 0);
		assert_eq!(json["mode"], "error");
		assert!(json["error"].is_string());
	}
}

#[tokio::test]
async fn malformed_search_body_yields_failure_body() {
	let workspace = TestWorkspace::new().expect("Failed to create workspace.");
	let response = app(&workspace)
		.oneshot(post_json("/semantic-search/", "{not json"))
		.await
		.expect("Failed to call search.");

	assert_eq!(response.status(), StatusCode::OK);

	let json = json_body(response).await;

	assert_eq!(json["success"], false);
	assert_eq!(json["count"], 0);
	assert!(json["error"].as_str().is_some_and(|error| error.contains("Invalid request body")));
}

#[tokio::test]
async fn test_search_decodes_path_query() {
	let workspace = TestWorkspace::new().expect("Failed to create workspace.");
	let response = app(&workspace)
		.oneshot(get("/test-search/red%20shoes"))
		.await
		.expect("Failed to call test search.");
	let json = json_body(response).await;

	assert_eq!(json["query"], "red shoes");
	assert_eq!(json["success"], false);
}

#[tokio::test]
async fn receive_products_writes_snapshot() {
	let workspace = TestWorkspace::new().expect("Failed to create workspace.");
	let payload = json!([
		{
			"handle": "red-shoe",
			"title": "Red Shoe",
			"description": "Leather upper",
			"price": "89.00",
			"images": [{ "url": "https://cdn/red-1.jpg" }]
		}
	]);
	let response = app(&workspace)
		.oneshot(post_json("/receive-products", &payload.to_string()))
		.await
		.expect("Failed to call receive-products.");

	assert_eq!(response.status(), StatusCode::OK);

	let json = json_body(response).await;

	assert_eq!(json["status"], "received");
	assert_eq!(json["product_count"], 1);
	assert_eq!(json["csv_saved"], true);
	assert_eq!(json["statistics"]["products_with_images"], 1);
	assert_eq!(json["statistics"]["average_images_per_product"], 1.0);

	let files = workspace.list(&workspace.catalog_dir()).expect("Failed to list catalog dir.");

	assert!(files.contains(&"shopify_products_latest.csv".to_string()));
	assert!(json["csv_filename"].as_str().is_some_and(|name| files.contains(&name.to_string())));
}

#[tokio::test]
async fn receive_products_rejects_non_array() {
	let workspace = TestWorkspace::new().expect("Failed to create workspace.");

	for (payload, field) in [(r#"{"handle":"solo"}"#, "$"), ("[1, 2]", "$[0]"), ("not json", "$")] {
		let response = app(&workspace)
			.oneshot(post_json("/receive-products/", payload))
			.await
			.expect("Failed to call receive-products.");

		assert_eq!(response.status(), StatusCode::BAD_REQUEST);

		let json = json_body(response).await;

		assert_eq!(json["error_code"], "INVALID_REQUEST");
		assert_eq!(json["fields"], json!([field]));
		assert!(json["message"].is_string());
	}
}

#[tokio::test]
async fn product_webhook_acknowledges_and_logs() {
	let workspace = TestWorkspace::new().expect("Failed to create workspace.");
	let request = Request::builder()
		.method("POST")
		.uri("/product-webhook/")
		.header("content-type", "application/json")
		.header("X-Shopify-Topic", "products/update")
		.header("X-Shopify-Shop-Domain", "demo.myshopify.com")
		.body(Body::from(r#"{"id":7,"title":"Red Shoe"}"#))
		.expect("Failed to build request.");
	let response = app(&workspace).oneshot(request).await.expect("Failed to call webhook.");

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(
		json_body(response).await,
		json!({ "status": "processed", "event": "products/update" })
	);

	let log = std::fs::read_to_string(workspace.webhook_log_path()).expect("Failed to read log.");
	let entry: Value = serde_json::from_str(log.trim_end()).expect("Log line must be JSON.");

	assert_eq!(entry["shop"], "demo.myshopify.com");
	assert_eq!(entry["product_id"], 7);
	assert_eq!(entry["title"], "Red Shoe");
}

#[tokio::test]
async fn product_webhook_tolerates_invalid_json() {
	let workspace = TestWorkspace::new().expect("Failed to create workspace.");
	let request = Request::builder()
		.method("POST")
		.uri("/product-webhook")
		.header("X-Shopify-Topic", "products/delete")
		.body(Body::from("garbage"))
		.expect("Failed to build request.");
	let response = app(&workspace).oneshot(request).await.expect("Failed to call webhook.");
	let json = json_body(response).await;

	assert_eq!(json["event"], "products/delete");

	let log = std::fs::read_to_string(workspace.webhook_log_path()).expect("Failed to read log.");
	let entry: Value = serde_json::from_str(log.trim_end()).expect("Log line must be JSON.");

	assert_eq!(entry["product_id"], Value::Null);
	assert_eq!(entry["shop"], Value::Null);
}

#[tokio::test]
async fn wildcard_cors_allows_any_origin() {
	let workspace = TestWorkspace::new().expect("Failed to create workspace.");
	let request = Request::builder()
		.method("OPTIONS")
		.uri("/semantic-search/")
		.header("origin", "https://demo.myshopify.com")
		.header("access-control-request-method", "POST")
		.body(Body::empty())
		.expect("Failed to build request.");
	let response = app(&workspace).oneshot(request).await.expect("Failed to send preflight.");

	assert_eq!(
		response.headers().get("access-control-allow-origin").and_then(|v| v.to_str().ok()),
		Some("*")
	);
}

#[tokio::test]
async fn explicit_cors_origins_allow_credentials() {
	let workspace = TestWorkspace::new().expect("Failed to create workspace.");
	let mut cfg = workspace.config();

	cfg.service.cors_allowed_origins = vec!["https://demo.myshopify.com".to_string()];

	let state = AppState::new(cfg).expect("Failed to initialize app state.");
	let request = Request::builder()
		.method("OPTIONS")
		.uri("/semantic-search/")
		.header("origin", "https://demo.myshopify.com")
		.header("access-control-request-method", "POST")
		.body(Body::empty())
		.expect("Failed to build request.");
	let response = routes::router(state).oneshot(request).await.expect("Failed to send preflight.");
	let headers = response.headers();

	assert_eq!(
		headers.get("access-control-allow-origin").and_then(|v| v.to_str().ok()),
		Some("https://demo.myshopify.com")
	);
	assert_eq!(
		headers.get("access-control-allow-credentials").and_then(|v| v.to_str().ok()),
		Some("true")
	);
}
