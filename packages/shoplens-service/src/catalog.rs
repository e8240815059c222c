//! Catalog ingestion: normalize raw storefront records and persist CSV snapshots.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

use shoplens_storage::models::CatalogRow;

use crate::{Error, Result, ShopLensService};

const DEFAULT_PRICE: &str = "0.00";

/// One storefront product after image and price normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogRecord {
	pub handle: String,
	pub title: String,
	pub description: String,
	pub price: String,
	pub image_urls: Vec<String>,
}
impl CatalogRecord {
	pub fn from_raw(raw: &Map<String, Value>) -> Self {
		Self {
			handle: text_field(raw, "handle").unwrap_or_default(),
			title: text_field(raw, "title").unwrap_or_default(),
			description: text_field(raw, "description").unwrap_or_default(),
			price: text_field(raw, "price").unwrap_or_else(|| DEFAULT_PRICE.to_string()),
			image_urls: image_urls(raw),
		}
	}

	fn to_row(&self) -> Result<CatalogRow> {
		Ok(CatalogRow::new(
			self.handle.clone(),
			self.title.clone(),
			self.description.clone(),
			self.price.clone(),
			&self.image_urls,
		)?)
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogStatistics {
	pub total_products: usize,
	pub products_with_descriptions: usize,
	pub products_with_images: usize,
	pub average_images_per_product: f64,
}
impl CatalogStatistics {
	pub fn compute(records: &[CatalogRecord]) -> Self {
		let total_products = records.len();
		let image_count: usize = records.iter().map(|record| record.image_urls.len()).sum();
		let average_images_per_product = if total_products == 0 {
			0.0
		} else {
			image_count as f64 / total_products as f64
		};

		Self {
			total_products,
			products_with_descriptions: records
				.iter()
				.filter(|record| !record.description.is_empty())
				.count(),
			products_with_images: records
				.iter()
				.filter(|record| !record.image_urls.is_empty())
				.count(),
			average_images_per_product,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResponse {
	pub status: String,
	pub product_count: usize,
	pub csv_filename: String,
	pub csv_saved: bool,
	pub statistics: CatalogStatistics,
}

impl ShopLensService {
	/// Normalizes a batch of raw records and writes the timestamped and latest snapshots.
	pub async fn ingest_catalog(&self, body: Value) -> Result<IngestResponse> {
		let Value::Array(items) = body else {
			return Err(Error::invalid_field("$", "Catalog payload must be a JSON array."));
		};
		let records = items
			.iter()
			.enumerate()
			.map(|(idx, item)| match item {
				Value::Object(raw) => Ok(CatalogRecord::from_raw(raw)),
				_ => Err(Error::invalid_field(
					format!("$[{idx}]"),
					"Catalog items must be objects.",
				)),
			})
			.collect::<Result<Vec<_>>>()?;

		tracing::info!(count = records.len(), "Received catalog batch.");

		if let Some(first) = records.first() {
			tracing::debug!(handle = %first.handle, title = %first.title, "First catalog record.");
		}

		let rows = records.iter().map(CatalogRecord::to_row).collect::<Result<Vec<_>>>()?;
		let files = self.catalog.write_snapshot(&rows, OffsetDateTime::now_utc()).await?;
		let statistics = CatalogStatistics::compute(&records);

		Ok(IngestResponse {
			status: "received".to_string(),
			product_count: records.len(),
			csv_filename: files.file_name,
			csv_saved: true,
			statistics,
		})
	}
}

fn text_field(raw: &Map<String, Value>, key: &str) -> Option<String> {
	match raw.get(key)? {
		Value::String(text) => Some(text.clone()),
		Value::Number(number) => Some(number.to_string()),
		Value::Bool(flag) => Some(flag.to_string()),
		_ => None,
	}
}

fn image_urls(raw: &Map<String, Value>) -> Vec<String> {
	if let Some(urls) = non_empty_array(raw, "imageUrls") {
		return urls.iter().filter_map(|url| url.as_str().map(str::to_string)).collect();
	}
	if let Some(images) = non_empty_array(raw, "images") {
		return images.iter().filter_map(object_url).collect();
	}

	match raw.get("image") {
		Some(Value::String(url)) if !url.is_empty() => vec![url.clone()],
		Some(image @ Value::Object(_)) => object_url(image).into_iter().collect(),
		_ => Vec::new(),
	}
}

fn non_empty_array<'a>(raw: &'a Map<String, Value>, key: &str) -> Option<&'a Vec<Value>> {
	raw.get(key).and_then(Value::as_array).filter(|items| !items.is_empty())
}

fn object_url(value: &Value) -> Option<String> {
	value.get("url").and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	fn record(value: Value) -> CatalogRecord {
		match value {
			Value::Object(raw) => CatalogRecord::from_raw(&raw),
			other => panic!("Expected object, got {other}."),
		}
	}

	#[test]
	fn image_urls_take_precedence_over_images() {
		let record = record(json!({
			"imageUrls": ["https://cdn/a.jpg", "https://cdn/b.jpg"],
			"images": [{ "url": "https://cdn/ignored.jpg" }],
			"image": "https://cdn/also-ignored.jpg"
		}));

		assert_eq!(record.image_urls, vec!["https://cdn/a.jpg", "https://cdn/b.jpg"]);
	}

	#[test]
	fn images_objects_yield_their_urls() {
		let record = record(json!({
			"imageUrls": [],
			"images": [
				{ "url": "https://cdn/a.jpg" },
				{ "alt": "no url" },
				{ "url": "https://cdn/b.jpg" }
			]
		}));

		assert_eq!(record.image_urls, vec!["https://cdn/a.jpg", "https://cdn/b.jpg"]);
	}

	#[test]
	fn single_image_yields_one_url() {
		assert_eq!(record(json!({ "image": "https://cdn/a.jpg" })).image_urls, vec![
			"https://cdn/a.jpg"
		]);
		assert_eq!(record(json!({ "image": { "url": "https://cdn/b.jpg" } })).image_urls, vec![
			"https://cdn/b.jpg"
		]);
	}

	#[test]
	fn missing_images_yield_empty_list() {
		let record = record(json!({ "handle": "plain", "image": "" }));

		assert!(record.image_urls.is_empty());
	}

	#[test]
	fn price_accepts_numbers_and_defaults() {
		assert_eq!(record(json!({ "price": 19.5 })).price, "19.5");
		assert_eq!(record(json!({ "price": "24.00" })).price, "24.00");
		assert_eq!(record(json!({ "price": null })).price, "0.00");
		assert_eq!(record(json!({})).price, "0.00");
	}

	#[test]
	fn statistics_for_empty_batch_are_zero() {
		let stats = CatalogStatistics::compute(&[]);

		assert_eq!(stats.total_products, 0);
		assert_eq!(stats.average_images_per_product, 0.0);
	}

	#[test]
	fn statistics_count_descriptions_and_images() {
		let records = vec![
			record(json!({ "description": "Soft", "imageUrls": ["a", "b", "c"] })),
			record(json!({ "description": "", "image": "d" })),
			record(json!({ "title": "Bare" })),
		];
		let stats = CatalogStatistics::compute(&records);

		assert_eq!(stats.total_products, 3);
		assert_eq!(stats.products_with_descriptions, 1);
		assert_eq!(stats.products_with_images, 2);
		assert!((stats.average_images_per_product - 4.0 / 3.0).abs() < 1e-9);
	}
}
