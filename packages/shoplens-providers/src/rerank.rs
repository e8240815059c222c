use std::cmp::Ordering;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde_json::Value;

use shoplens_config::ProviderConfig;

/// One reranked document, referenced by its position in the request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RerankHit {
	pub index: usize,
	pub relevance_score: f32,
}

/// Returns at most `top_k` hits, most relevant first.
pub async fn rerank(
	client: &Client,
	cfg: &ProviderConfig,
	query: &str,
	docs: &[String],
	top_k: u32,
) -> Result<Vec<RerankHit>> {
	if docs.is_empty() {
		return Ok(Vec::new());
	}

	let top_k = (top_k as usize).min(docs.len());
	let body = serde_json::json!({
		"model": cfg.model,
		"query": query,
		"documents": docs,
		"top_k": top_k,
	});
	let res = client
		.post(crate::endpoint(&cfg.api_base, &cfg.path))
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;
	let mut hits = parse_rerank_response(json, docs.len())?;

	hits.truncate(top_k);

	Ok(hits)
}

fn parse_rerank_response(json: Value, doc_count: usize) -> Result<Vec<RerankHit>> {
	let results = json
		.get("data")
		.or_else(|| json.get("results"))
		.and_then(|v| v.as_array())
		.ok_or_else(|| eyre::eyre!("Rerank response is missing results array."))?;
	let mut hits = Vec::with_capacity(results.len());

	for item in results {
		let index = item
			.get("index")
			.and_then(|v| v.as_u64())
			.ok_or_else(|| eyre::eyre!("Rerank result missing index."))? as usize;
		let relevance_score = item
			.get("relevance_score")
			.or_else(|| item.get("score"))
			.and_then(|v| v.as_f64())
			.ok_or_else(|| eyre::eyre!("Rerank result missing score."))? as f32;

		if index >= doc_count {
			return Err(eyre::eyre!(
				"Rerank result index {index} is out of range for {doc_count} documents."
			));
		}

		hits.push(RerankHit { index, relevance_score });
	}

	// Stable: equal scores keep provider order.
	hits.sort_by(|left, right| {
		right.relevance_score.partial_cmp(&left.relevance_score).unwrap_or(Ordering::Equal)
	});

	Ok(hits)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn orders_hits_by_relevance() {
		let json = serde_json::json!({
			"data": [
				{ "index": 1, "relevance_score": 0.2 },
				{ "index": 0, "relevance_score": 0.9 }
			]
		});
		let hits = parse_rerank_response(json, 2).expect("parse failed");

		assert_eq!(hits, vec![
			RerankHit { index: 0, relevance_score: 0.9 },
			RerankHit { index: 1, relevance_score: 0.2 },
		]);
	}

	#[test]
	fn accepts_results_key_and_score_alias() {
		let json = serde_json::json!({ "results": [{ "index": 0, "score": 0.5 }] });
		let hits = parse_rerank_response(json, 1).expect("parse failed");

		assert_eq!(hits, vec![RerankHit { index: 0, relevance_score: 0.5 }]);
	}

	#[test]
	fn rejects_out_of_range_index() {
		let json = serde_json::json!({ "data": [{ "index": 3, "relevance_score": 0.5 }] });

		assert!(parse_rerank_response(json, 2).is_err());
	}
}
