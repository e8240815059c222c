mod error;

pub use error::{Error, Result};

use std::{
	env, fs,
	path::{Path, PathBuf},
};

use serde_json::Map;
use uuid::Uuid;

use shoplens_config::{
	Catalog, Config, EmbeddingProviderConfig, Index, IndexBackend, ProviderConfig, Providers,
	Search, Service, Storage, WebhookLog,
};

/// Address that refuses connections, for configs whose providers must never be reached.
pub const UNREACHABLE_BASE: &str = "http://127.0.0.1:1";

/// A scratch directory removed on drop.
pub struct TestWorkspace {
	root: PathBuf,
	cleaned: bool,
}
impl TestWorkspace {
	pub fn new() -> Result<Self> {
		let root = env::temp_dir().join(format!("shoplens_test_{}", Uuid::new_v4().simple()));

		fs::create_dir_all(&root).map_err(|err| {
			Error::Message(format!("Failed to create test workspace {root:?}: {err}."))
		})?;

		Ok(Self { root, cleaned: false })
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	pub fn path(&self, relative: &str) -> PathBuf {
		self.root.join(relative)
	}

	pub fn catalog_dir(&self) -> PathBuf {
		self.path("catalog")
	}

	pub fn webhook_log_path(&self) -> PathBuf {
		self.path("product_webhook_log.json")
	}

	/// Lists file names in `dir`, sorted.
	pub fn list(&self, dir: &Path) -> Result<Vec<String>> {
		let mut names = fs::read_dir(dir)?
			.map(|entry| entry.map(|entry| entry.file_name().to_string_lossy().into_owned()))
			.collect::<Result<Vec<_>, _>>()?;

		names.sort();

		Ok(names)
	}

	/// A config whose files live under this workspace and whose providers are unreachable.
	pub fn config(&self) -> Config {
		test_config(self.catalog_dir(), self.webhook_log_path())
	}

	pub fn cleanup(mut self) -> Result<()> {
		self.cleanup_inner()
	}

	fn cleanup_inner(&mut self) -> Result<()> {
		if self.cleaned {
			return Ok(());
		}

		match fs::remove_dir_all(&self.root) {
			Ok(()) => {},
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => {},
			Err(err) => return Err(err.into()),
		}

		self.cleaned = true;

		Ok(())
	}
}
impl Drop for TestWorkspace {
	fn drop(&mut self) {
		if let Err(err) = self.cleanup_inner() {
			eprintln!("Test workspace cleanup failed: {err}.");
		}
	}
}

pub fn test_config(catalog_dir: PathBuf, webhook_log_path: PathBuf) -> Config {
	Config {
		service: Service {
			http_bind: "127.0.0.1:0".to_string(),
			log_level: "info".to_string(),
			cors_allowed_origins: vec!["*".to_string()],
		},
		providers: Providers {
			embedding: EmbeddingProviderConfig {
				provider_id: "test".to_string(),
				api_base: UNREACHABLE_BASE.to_string(),
				api_key: "test-key".to_string(),
				path: "/v1/multimodalembeddings".to_string(),
				model: "test-embed".to_string(),
				dimensions: 3,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
			rerank: ProviderConfig {
				provider_id: "test".to_string(),
				api_base: UNREACHABLE_BASE.to_string(),
				api_key: "test-key".to_string(),
				path: "/v1/rerank".to_string(),
				model: "test-rerank".to_string(),
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
		},
		storage: Storage {
			index: Index {
				backend: IndexBackend::Pinecone,
				url: UNREACHABLE_BASE.to_string(),
				api_key: Some("test-key".to_string()),
				name: "productdisc-test".to_string(),
				namespace: "multimodal".to_string(),
				timeout_ms: 1_000,
			},
			catalog: Catalog { dir: catalog_dir, file_prefix: "shopify_products".to_string() },
			webhook_log: WebhookLog { path: webhook_log_path, queue_capacity: 16 },
		},
		search: Search {
			candidate_k: 200,
			aggregate_k: 50,
			rerank_top_k: 50,
			group_key_field: "keywords".to_string(),
		},
	}
}
