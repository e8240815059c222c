use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub providers: Providers,
	pub storage: Storage,
	pub search: Search,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
	/// `["*"]` allows every origin without credentials.
	#[serde(default = "default_cors_allowed_origins")]
	pub cors_allowed_origins: Vec<String>,
}
impl Service {
	pub fn cors_allows_any(&self) -> bool {
		self.cors_allowed_origins.iter().any(|origin| origin == "*")
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub rerank: ProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
	pub index: Index,
	pub catalog: Catalog,
	pub webhook_log: WebhookLog,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexBackend {
	Pinecone,
	Qdrant,
}
impl IndexBackend {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Pinecone => "pinecone",
			Self::Qdrant => "qdrant",
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct Index {
	pub backend: IndexBackend,
	/// Pinecone index host or Qdrant gRPC URL.
	pub url: String,
	/// Required for Pinecone; optional for a local Qdrant.
	pub api_key: Option<String>,
	/// Pinecone index name or Qdrant collection.
	pub name: String,
	#[serde(default)]
	pub namespace: String,
	pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Catalog {
	pub dir: PathBuf,
	#[serde(default = "default_catalog_file_prefix")]
	pub file_prefix: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookLog {
	pub path: PathBuf,
	#[serde(default = "default_webhook_queue_capacity")]
	pub queue_capacity: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Search {
	/// Nearest neighbours requested from the vector index.
	pub candidate_k: u32,
	/// Groups kept after score averaging and sent to the reranker.
	pub aggregate_k: u32,
	/// Results requested from the reranker.
	pub rerank_top_k: u32,
	#[serde(default = "default_group_key_field")]
	pub group_key_field: String,
}

fn default_cors_allowed_origins() -> Vec<String> {
	vec!["*".to_string()]
}

fn default_catalog_file_prefix() -> String {
	"shopify_products".to_string()
}

fn default_webhook_queue_capacity() -> usize {
	256
}

fn default_group_key_field() -> String {
	"keywords".to_string()
}
