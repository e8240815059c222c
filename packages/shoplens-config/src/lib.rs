mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Catalog, Config, EmbeddingProviderConfig, Index, IndexBackend, ProviderConfig, Providers,
	Search, Service, Storage, WebhookLog,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|source| Error::Read { path: path.to_path_buf(), source })?;

	parse(&raw).map_err(|err| match err {
		Error::Parse { source, .. } => Error::Parse { path: path.to_path_buf(), source },
		other => other,
	})
}

/// Parses, normalizes, and validates a config document.
pub fn parse(raw: &str) -> Result<Config> {
	let mut cfg: Config =
		toml::from_str(raw).map_err(|source| Error::Parse { path: Default::default(), source })?;

	normalize(&mut cfg);
	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::invalid("service.http_bind", "must be non-empty."));
	}
	if cfg.service.cors_allowed_origins.is_empty() {
		return Err(Error::invalid(
			"service.cors_allowed_origins",
			"must list at least one origin, or \"*\".",
		));
	}
	if cfg.service.cors_allows_any() && cfg.service.cors_allowed_origins.len() > 1 {
		return Err(Error::invalid(
			"service.cors_allowed_origins",
			"\"*\" cannot be combined with explicit origins.",
		));
	}

	for (field, key) in [
		("providers.embedding.api_key", &cfg.providers.embedding.api_key),
		("providers.rerank.api_key", &cfg.providers.rerank.api_key),
	] {
		if key.trim().is_empty() {
			return Err(Error::invalid(field, "must be non-empty."));
		}
	}
	for (field, base) in [
		("providers.embedding.api_base", &cfg.providers.embedding.api_base),
		("providers.rerank.api_base", &cfg.providers.rerank.api_base),
		("storage.index.url", &cfg.storage.index.url),
	] {
		if !(base.starts_with("http://") || base.starts_with("https://")) {
			return Err(Error::invalid(field, "must be an http(s) URL."));
		}
	}
	for (field, model) in [
		("providers.embedding.model", &cfg.providers.embedding.model),
		("providers.rerank.model", &cfg.providers.rerank.model),
	] {
		if model.trim().is_empty() {
			return Err(Error::invalid(field, "must be non-empty."));
		}
	}
	for (field, headers) in [
		("providers.embedding.default_headers", &cfg.providers.embedding.default_headers),
		("providers.rerank.default_headers", &cfg.providers.rerank.default_headers),
	] {
		if headers.values().any(|value| !value.is_string()) {
			return Err(Error::invalid(field, "values must be strings."));
		}
	}

	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::invalid("providers.embedding.dimensions", "must be greater than zero."));
	}
	if cfg.providers.embedding.timeout_ms == 0 || cfg.providers.rerank.timeout_ms == 0 {
		return Err(Error::invalid("providers.*.timeout_ms", "must be greater than zero."));
	}

	let index = &cfg.storage.index;

	if index.name.trim().is_empty() {
		return Err(Error::invalid("storage.index.name", "must be non-empty."));
	}
	if index.timeout_ms == 0 {
		return Err(Error::invalid("storage.index.timeout_ms", "must be greater than zero."));
	}
	if index.backend == IndexBackend::Pinecone && index.api_key.is_none() {
		return Err(Error::invalid(
			"storage.index.api_key",
			"must be set when storage.index.backend is pinecone.",
		));
	}

	if cfg.storage.catalog.file_prefix.trim().is_empty() {
		return Err(Error::invalid("storage.catalog.file_prefix", "must be non-empty."));
	}
	if cfg.storage.catalog.file_prefix.contains(['/', '\\']) {
		return Err(Error::invalid(
			"storage.catalog.file_prefix",
			"must not contain path separators.",
		));
	}
	if cfg.storage.webhook_log.path.as_os_str().is_empty() {
		return Err(Error::invalid("storage.webhook_log.path", "must be non-empty."));
	}
	if cfg.storage.webhook_log.queue_capacity == 0 {
		return Err(Error::invalid(
			"storage.webhook_log.queue_capacity",
			"must be greater than zero.",
		));
	}

	let search = &cfg.search;

	if search.candidate_k == 0 {
		return Err(Error::invalid("search.candidate_k", "must be greater than zero."));
	}
	if search.aggregate_k == 0 {
		return Err(Error::invalid("search.aggregate_k", "must be greater than zero."));
	}
	if search.rerank_top_k == 0 {
		return Err(Error::invalid("search.rerank_top_k", "must be greater than zero."));
	}
	if search.aggregate_k > search.candidate_k {
		return Err(Error::invalid(
			"search.aggregate_k",
			"must be less than or equal to search.candidate_k.",
		));
	}
	if search.rerank_top_k > search.aggregate_k {
		return Err(Error::invalid(
			"search.rerank_top_k",
			"must be less than or equal to search.aggregate_k.",
		));
	}
	if search.group_key_field.trim().is_empty() {
		return Err(Error::invalid("search.group_key_field", "must be non-empty."));
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.providers.embedding.api_key = cfg.providers.embedding.api_key.trim().to_string();
	cfg.providers.rerank.api_key = cfg.providers.rerank.api_key.trim().to_string();
	cfg.providers.embedding.api_base =
		cfg.providers.embedding.api_base.trim_end_matches('/').to_string();
	cfg.providers.rerank.api_base = cfg.providers.rerank.api_base.trim_end_matches('/').to_string();
	cfg.storage.index.url = cfg.storage.index.url.trim_end_matches('/').to_string();
	cfg.search.group_key_field = cfg.search.group_key_field.trim().to_string();

	if cfg.storage.index.api_key.as_deref().map(|key| key.trim().is_empty()).unwrap_or(false) {
		cfg.storage.index.api_key = None;
	}

	cfg.service.cors_allowed_origins = cfg
		.service
		.cors_allowed_origins
		.iter()
		.map(|origin| origin.trim().trim_end_matches('/').to_string())
		.filter(|origin| !origin.is_empty())
		.collect();
}
