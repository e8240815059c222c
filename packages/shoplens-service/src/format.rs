use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregation;

/// One product in a search response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedProduct {
	pub title: String,
	pub relevance_score: f32,
	pub id: String,
	pub handle: String,
	pub description: String,
	pub price: String,
	pub image: String,
	pub vendor: String,
}

/// Joins reranked group keys with the aggregated metadata.
///
/// Order follows `reranked`. Keys with no aggregated group are dropped; the output is capped
/// at `limit`.
pub fn format_results<'a, I>(
	reranked: I,
	aggregation: &Aggregation,
	limit: usize,
) -> Vec<RankedProduct>
where
	I: IntoIterator<Item = (&'a str, f32)>,
{
	let mut out = Vec::new();

	for (key, relevance_score) in reranked {
		if out.len() >= limit {
			break;
		}

		let Some(group) = aggregation.get(key) else {
			tracing::debug!(key, "Reranked key has no aggregated group.");

			continue;
		};
		let metadata = &group.metadata;

		out.push(RankedProduct {
			title: metadata.title.clone(),
			relevance_score,
			id: metadata.id.clone(),
			handle: metadata.handle.clone(),
			description: metadata.description.clone(),
			price: metadata.price.clone(),
			image: metadata.image.clone(),
			vendor: metadata.vendor.clone(),
		});
	}

	out
}

#[cfg(test)]
mod tests {
	use std::collections::HashMap;

	use super::*;
	use crate::aggregate::{Candidate, CandidateMetadata, aggregate};

	fn aggregation() -> Aggregation {
		let candidate = |key: &str, score: f32, title: &str, handle: &str| {
			let mut metadata = CandidateMetadata::from_fields(&HashMap::new());

			metadata.title = title.to_string();
			metadata.handle = handle.to_string();

			Candidate { score, group_key: Some(key.to_string()), metadata }
		};

		aggregate(
			vec![
				candidate("red,shoe", 0.9, "Red Shoe", "red-shoe"),
				candidate("blue,hat", 0.8, "Blue Hat", "blue-hat"),
				candidate("green,scarf", 0.7, "Green Scarf", "green-scarf"),
			],
			10,
		)
	}

	#[test]
	fn follows_rerank_order_and_scores() {
		let aggregation = aggregation();
		let products =
			format_results([("green,scarf", 0.95), ("red,shoe", 0.4)], &aggregation, 10);

		assert_eq!(products.len(), 2);
		assert_eq!(products[0].title, "Green Scarf");
		assert_eq!(products[0].handle, "green-scarf");
		assert!((products[0].relevance_score - 0.95).abs() < f32::EPSILON);
		assert_eq!(products[1].title, "Red Shoe");
	}

	#[test]
	fn drops_unknown_keys() {
		let aggregation = aggregation();
		let products = format_results([("missing", 0.99), ("blue,hat", 0.5)], &aggregation, 10);

		assert_eq!(products.len(), 1);
		assert_eq!(products[0].title, "Blue Hat");
	}

	#[test]
	fn caps_output_at_limit() {
		let aggregation = aggregation();
		let products = format_results(
			[("red,shoe", 0.9), ("blue,hat", 0.8), ("green,scarf", 0.7)],
			&aggregation,
			2,
		);

		assert_eq!(products.len(), 2);
	}

	#[test]
	fn serializes_expected_field_names() {
		let aggregation = aggregation();
		let products = format_results([("red,shoe", 0.5)], &aggregation, 10);
		let value = serde_json::to_value(&products[0]).expect("Failed to serialize product.");

		let fields =
			["title", "relevance_score", "id", "handle", "description", "price", "image", "vendor"];

		for field in fields {
			assert!(value.get(field).is_some(), "missing field {field}");
		}
		assert_eq!(value["price"], "0.00");
	}
}
