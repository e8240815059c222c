pub mod aggregate;
pub mod catalog;
pub mod format;
pub mod search;
pub mod webhook;

mod error;

pub use aggregate::{AggregatedGroup, Aggregation, Candidate, CandidateMetadata, aggregate};
pub use catalog::{CatalogRecord, CatalogStatistics, IngestResponse};
pub use error::{Error, Result};
pub use format::{RankedProduct, format_results};
pub use search::{SearchMode, SearchRequest, SearchResponse};
pub use webhook::{WebhookEvent, WebhookLogEntry, WebhookOutcome, WebhookReceipt, WebhookResponse};

use std::{future::Future, pin::Pin, sync::Arc};

use reqwest::Client;

use shoplens_config::{Config, EmbeddingProviderConfig, IndexBackend, ProviderConfig};
use shoplens_providers::{RerankHit, embedding, rerank};
use shoplens_storage::{
	catalog::CatalogStore, index::VectorIndex, models::IndexMatch, webhook_log::WebhookLog,
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>>;
}

pub trait RerankProvider
where
	Self: Send + Sync,
{
	fn rerank<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		query: &'a str,
		docs: &'a [String],
		top_k: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<RerankHit>>>;
}

pub trait CandidateRetriever
where
	Self: Send + Sync,
{
	fn retrieve<'a>(
		&'a self,
		vector: &'a [f32],
		top_k: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<IndexMatch>>>;
}

/// HTTP-backed embedding and rerank clients, built once per process.
pub struct HttpProviders {
	embedding_client: Client,
	rerank_client: Client,
}
impl HttpProviders {
	pub fn new(cfg: &Config) -> color_eyre::Result<Self> {
		Ok(Self {
			embedding_client: shoplens_providers::http_client(cfg.providers.embedding.timeout_ms)?,
			rerank_client: shoplens_providers::http_client(cfg.providers.rerank.timeout_ms)?,
		})
	}
}
impl EmbeddingProvider for HttpProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(&self.embedding_client, cfg, texts))
	}
}
impl RerankProvider for HttpProviders {
	fn rerank<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		query: &'a str,
		docs: &'a [String],
		top_k: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<RerankHit>>> {
		Box::pin(rerank::rerank(&self.rerank_client, cfg, query, docs, top_k))
	}
}

impl CandidateRetriever for VectorIndex {
	fn retrieve<'a>(
		&'a self,
		vector: &'a [f32],
		top_k: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<IndexMatch>>> {
		Box::pin(async move { Ok(VectorIndex::query(self, vector, top_k).await?) })
	}
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub rerank: Arc<dyn RerankProvider>,
	pub retriever: Arc<dyn CandidateRetriever>,
}
impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		rerank: Arc<dyn RerankProvider>,
		retriever: Arc<dyn CandidateRetriever>,
	) -> Self {
		Self { embedding, rerank, retriever }
	}

	/// Builds the production clients from config.
	pub fn connect(cfg: &Config) -> color_eyre::Result<Self> {
		let http = Arc::new(HttpProviders::new(cfg)?);
		let index = Arc::new(VectorIndex::connect(&cfg.storage.index)?);

		Ok(Self { embedding: http.clone(), rerank: http, retriever: index })
	}
}

pub struct ShopLensService {
	pub cfg: Config,
	pub providers: Providers,
	pub catalog: CatalogStore,
	pub webhook_log: WebhookLog,
}
impl ShopLensService {
	/// Must be called inside a tokio runtime; the webhook log writer is spawned here.
	pub fn new(cfg: Config) -> color_eyre::Result<Self> {
		let providers = Providers::connect(&cfg)?;

		Ok(Self::with_providers(cfg, providers))
	}

	pub fn with_providers(cfg: Config, providers: Providers) -> Self {
		let catalog = CatalogStore::new(&cfg.storage.catalog);
		let webhook_log = WebhookLog::spawn(&cfg.storage.webhook_log);

		Self { cfg, providers, catalog, webhook_log }
	}

	pub fn index_backend(&self) -> IndexBackend {
		self.cfg.storage.index.backend
	}

	pub fn index_name(&self) -> &str {
		&self.cfg.storage.index.name
	}
}
