use std::{collections::HashMap, time::Duration};

use reqwest::{
	Client,
	header::{HeaderMap, HeaderValue},
};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::{Error, Result, models::IndexMatch};

const API_VERSION: &str = "2024-07";

#[derive(Debug, Deserialize)]
struct QueryResponse {
	#[serde(default)]
	matches: Vec<QueryMatch>,
}

#[derive(Debug, Deserialize)]
struct QueryMatch {
	id: String,
	#[serde(default)]
	score: Option<f32>,
	#[serde(default)]
	metadata: Option<Map<String, Value>>,
}

/// Pinecone data-plane client for a single index host.
pub struct PineconeIndex {
	client: Client,
	url: String,
	namespace: String,
}
impl PineconeIndex {
	pub fn new(cfg: &shoplens_config::Index) -> Result<Self> {
		let api_key = cfg.api_key.as_deref().ok_or_else(|| {
			Error::InvalidArgument("Pinecone requires storage.index.api_key.".to_string())
		})?;
		let mut headers = HeaderMap::new();
		let mut key = HeaderValue::from_str(api_key)
			.map_err(|err| Error::InvalidArgument(format!("Invalid Pinecone API key: {err}.")))?;

		key.set_sensitive(true);
		headers.insert("Api-Key", key);
		headers.insert("X-Pinecone-API-Version", HeaderValue::from_static(API_VERSION));

		let client = Client::builder()
			.timeout(Duration::from_millis(cfg.timeout_ms))
			.default_headers(headers)
			.build()?;

		Ok(Self { client, url: cfg.url.clone(), namespace: cfg.namespace.clone() })
	}

	pub async fn query(&self, vector: &[f32], top_k: u32) -> Result<Vec<IndexMatch>> {
		let body = serde_json::json!({
			"vector": vector,
			"topK": top_k,
			"namespace": self.namespace,
			"includeMetadata": true,
		});
		let res = self.client.post(format!("{}/query", self.url)).json(&body).send().await?;
		let response: QueryResponse = res.error_for_status()?.json().await?;

		response.matches.into_iter().map(into_index_match).collect()
	}
}

fn into_index_match(raw: QueryMatch) -> Result<IndexMatch> {
	let score = raw
		.score
		.ok_or_else(|| Error::InvalidResponse(format!("Match {} is missing a score.", raw.id)))?;

	let metadata = flatten_metadata(raw.metadata.unwrap_or_default());

	Ok(IndexMatch { id: raw.id, score, metadata })
}

/// Keeps scalar metadata as text; nested values and nulls are dropped.
pub(crate) fn flatten_metadata(metadata: Map<String, Value>) -> HashMap<String, String> {
	metadata
		.into_iter()
		.filter_map(|(key, value)| {
			let text = match value {
				Value::String(text) => text,
				Value::Number(number) => number.to_string(),
				Value::Bool(flag) => flag.to_string(),
				_ => return None,
			};

			Some((key, text))
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn flattens_scalars_and_drops_nested_values() {
		let metadata = serde_json::json!({
			"title": "Red Leather Shoe",
			"price": 49.5,
			"in_stock": true,
			"tags": ["red"],
			"vendor": null
		});
		let Value::Object(map) = metadata else { unreachable!() };
		let flat = flatten_metadata(map);

		assert_eq!(flat.get("title").map(String::as_str), Some("Red Leather Shoe"));
		assert_eq!(flat.get("price").map(String::as_str), Some("49.5"));
		assert_eq!(flat.get("in_stock").map(String::as_str), Some("true"));
		assert!(!flat.contains_key("tags"));
		assert!(!flat.contains_key("vendor"));
	}

	#[test]
	fn missing_score_is_invalid() {
		let raw = QueryMatch { id: "p-1".to_string(), score: None, metadata: None };

		assert!(matches!(into_index_match(raw), Err(Error::InvalidResponse(_))));
	}
}
