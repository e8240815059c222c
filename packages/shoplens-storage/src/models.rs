use std::collections::HashMap;

use serde::Serialize;

/// A nearest-neighbour hit with its metadata flattened to text.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexMatch {
	pub id: String,
	pub score: f32,
	pub metadata: HashMap<String, String>,
}

/// One CSV row of a catalog snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogRow {
	pub product_handle: String,
	pub title: String,
	pub description: String,
	pub price: String,
	/// JSON-encoded array of image URLs.
	pub images: String,
}
impl CatalogRow {
	pub fn new(
		product_handle: String,
		title: String,
		description: String,
		price: String,
		image_urls: &[String],
	) -> crate::Result<Self> {
		Ok(Self {
			product_handle,
			title,
			description,
			price,
			images: serde_json::to_string(image_urls)?,
		})
	}
}
