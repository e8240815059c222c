pub mod embedding;
pub mod rerank;

use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::{
	Client,
	header::{AUTHORIZATION, HeaderMap, HeaderName},
};
use serde_json::{Map, Value};

pub use rerank::RerankHit;

pub fn auth_headers(api_key: &str, default_headers: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	headers.insert(AUTHORIZATION, format!("Bearer {api_key}").parse()?);

	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(eyre::eyre!("Default header {key:?} must be a string."));
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}

/// Builds the shared HTTP client for one provider; reused across requests.
pub fn http_client(timeout_ms: u64) -> Result<Client> {
	Ok(Client::builder().timeout(Duration::from_millis(timeout_ms)).build()?)
}

pub(crate) fn endpoint(api_base: &str, path: &str) -> String {
	if path.is_empty() || path.starts_with('/') {
		format!("{api_base}{path}")
	} else {
		format!("{api_base}/{path}")
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn joins_endpoint_with_or_without_leading_slash() {
		let base = "https://api.voyageai.com";

		assert_eq!(endpoint(base, "/v1/rerank"), "https://api.voyageai.com/v1/rerank");
		assert_eq!(endpoint(base, "v1/rerank"), "https://api.voyageai.com/v1/rerank");
	}
}
