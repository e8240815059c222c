use std::{collections::HashMap, time::Duration};

use qdrant_client::{
	Qdrant,
	qdrant::{
		Condition, Filter, PointId, Query, QueryPointsBuilder, Value, point_id::PointIdOptions,
		value::Kind,
	},
};

use crate::{Result, models::IndexMatch};

/// Payload field carrying the logical namespace of a point.
pub const NAMESPACE_FIELD: &str = "namespace";

pub struct QdrantIndex {
	pub client: Qdrant,
	pub collection: String,
	pub namespace: String,
}
impl QdrantIndex {
	pub fn new(cfg: &shoplens_config::Index) -> Result<Self> {
		let client = Qdrant::from_url(&cfg.url)
			.api_key(cfg.api_key.clone())
			.timeout(Duration::from_millis(cfg.timeout_ms))
			.build()?;

		Ok(Self { client, collection: cfg.name.clone(), namespace: cfg.namespace.clone() })
	}

	pub async fn query(&self, vector: &[f32], top_k: u32) -> Result<Vec<IndexMatch>> {
		let mut search = QueryPointsBuilder::new(self.collection.clone())
			.query(Query::new_nearest(vector.to_vec()))
			.limit(top_k as u64)
			.with_payload(true);

		if !self.namespace.is_empty() {
			search = search
				.filter(Filter::must([Condition::matches(NAMESPACE_FIELD, self.namespace.clone())]));
		}

		let response = self.client.query(search).await?;

		Ok(response
			.result
			.into_iter()
			.map(|point| IndexMatch {
				id: point.id.as_ref().map(point_id_to_string).unwrap_or_default(),
				score: point.score,
				metadata: flatten_payload(point.payload),
			})
			.collect())
	}
}

fn point_id_to_string(id: &PointId) -> String {
	match &id.point_id_options {
		Some(PointIdOptions::Num(num)) => num.to_string(),
		Some(PointIdOptions::Uuid(uuid)) => uuid.clone(),
		None => String::new(),
	}
}

fn flatten_payload(payload: HashMap<String, Value>) -> HashMap<String, String> {
	payload
		.into_iter()
		.filter_map(|(key, value)| {
			let text = match value.kind? {
				Kind::StringValue(text) => text,
				Kind::IntegerValue(number) => number.to_string(),
				Kind::DoubleValue(number) => number.to_string(),
				Kind::BoolValue(flag) => flag.to_string(),
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
	fn flattens_scalar_payload_values() {
		let payload = HashMap::from([
			("keywords".to_string(), Value { kind: Some(Kind::StringValue("red,shoe".into())) }),
			("stock".to_string(), Value { kind: Some(Kind::IntegerValue(3)) }),
			("empty".to_string(), Value { kind: None }),
		]);
		let flat = flatten_payload(payload);

		assert_eq!(flat.get("keywords").map(String::as_str), Some("red,shoe"));
		assert_eq!(flat.get("stock").map(String::as_str), Some("3"));
		assert!(!flat.contains_key("empty"));
	}

	#[test]
	fn renders_numeric_and_uuid_point_ids() {
		let num = PointId { point_id_options: Some(PointIdOptions::Num(42)) };
		let uuid = PointId {
			point_id_options: Some(PointIdOptions::Uuid(
				"6f1c1a4e-2b1d-4c55-9d0e-3a7c2f7b9e10".to_string(),
			)),
		};

		assert_eq!(point_id_to_string(&num), "42");
		assert_eq!(point_id_to_string(&uuid), "6f1c1a4e-2b1d-4c55-9d0e-3a7c2f7b9e10");
	}
}
