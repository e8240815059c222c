use serde::{Deserialize, Serialize};

use crate::{
	Error, Result, ShopLensService,
	aggregate::{Candidate, aggregate},
	format::{RankedProduct, format_results},
};

const EMPTY_MESSAGE: &str = "No products found matching your search";
const FAILURE_MESSAGE: &str = "Search service temporarily unavailable. Showing default results.";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchRequest {
	#[serde(default)]
	pub query: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
	Semantic,
	Error,
}

/// Body returned by the search routes for every outcome, including failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
	pub success: bool,
	pub query: String,
	pub products: Vec<RankedProduct>,
	pub count: usize,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub mode: Option<SearchMode>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}
impl SearchResponse {
	pub fn found(query: impl Into<String>, products: Vec<RankedProduct>) -> Self {
		Self {
			success: true,
			query: query.into(),
			count: products.len(),
			products,
			mode: Some(SearchMode::Semantic),
			message: None,
			error: None,
		}
	}

	pub fn empty(query: impl Into<String>) -> Self {
		Self {
			success: true,
			query: query.into(),
			products: Vec::new(),
			count: 0,
			mode: None,
			message: Some(EMPTY_MESSAGE.to_string()),
			error: None,
		}
	}

	pub fn failed(query: impl Into<String>, error: impl Into<String>) -> Self {
		Self {
			success: false,
			query: query.into(),
			products: Vec::new(),
			count: 0,
			mode: Some(SearchMode::Error),
			message: Some(FAILURE_MESSAGE.to_string()),
			error: Some(error.into()),
		}
	}
}

enum SearchOutcome {
	NoMatches,
	Ranked(Vec<RankedProduct>),
}

impl ShopLensService {
	/// Runs the search pipeline. Failures are folded into the response body.
	pub async fn search(&self, req: SearchRequest) -> SearchResponse {
		match self.run_search(&req.query).await {
			Ok(SearchOutcome::Ranked(products)) => {
				tracing::info!(query = %req.query, count = products.len(), "Search completed.");

				SearchResponse::found(req.query, products)
			},
			Ok(SearchOutcome::NoMatches) => {
				tracing::info!(query = %req.query, "Search found no grouped candidates.");

				SearchResponse::empty(req.query)
			},
			Err(err) => {
				tracing::error!(query = %req.query, error = %err, "Search failed.");

				SearchResponse::failed(req.query, err.to_string())
			},
		}
	}

	async fn run_search(&self, query: &str) -> Result<SearchOutcome> {
		let query = query.trim();

		if query.is_empty() {
			return Err(Error::invalid_request("query must be non-empty."));
		}

		let embed_cfg = &self.cfg.providers.embedding;
		let search_cfg = &self.cfg.search;
		let texts = vec![query.to_string()];
		let vectors = self
			.providers
			.embedding
			.embed(embed_cfg, &texts)
			.await
			.map_err(|err| Error::Provider { message: format!("{err:#}") })?;
		let vector = vectors.into_iter().next().ok_or_else(|| Error::Provider {
			message: "Embedding provider returned no vectors.".to_string(),
		})?;

		if vector.len() != embed_cfg.dimensions as usize {
			return Err(Error::Provider {
				message: format!(
					"Embedding dimension mismatch: expected {}, got {}.",
					embed_cfg.dimensions,
					vector.len()
				),
			});
		}

		let matches = self
			.providers
			.retriever
			.retrieve(&vector, search_cfg.candidate_k)
			.await
			.map_err(|err| Error::Index { message: format!("{err:#}") })?;

		tracing::debug!(candidates = matches.len(), "Retrieved candidates.");

		let aggregation = aggregate(
			matches.iter().map(|raw| Candidate::from_match(raw, &search_cfg.group_key_field)),
			search_cfg.aggregate_k as usize,
		);

		if aggregation.is_empty() {
			return Ok(SearchOutcome::NoMatches);
		}

		let documents = aggregation.documents();
		let hits = self
			.providers
			.rerank
			.rerank(&self.cfg.providers.rerank, query, &documents, search_cfg.rerank_top_k)
			.await
			.map_err(|err| Error::Provider { message: format!("{err:#}") })?;
		let reranked = hits.iter().filter_map(|hit| {
			documents.get(hit.index).map(|key| (key.as_str(), hit.relevance_score))
		});
		let products =
			format_results(reranked, &aggregation, search_cfg.rerank_top_k as usize);

		Ok(SearchOutcome::Ranked(products))
	}
}
