//! Score aggregation over retrieved candidates.
//!
//! Candidates that share a grouping key are merged into one group whose score is the
//! arithmetic mean of the members' similarity scores. Distinct catalog items that happen to
//! carry the same key are therefore ranked as one; per-item scores are not preserved.

use std::{cmp::Ordering, collections::HashMap};

use ahash::AHashMap;

use shoplens_storage::models::IndexMatch;

const DEFAULT_TITLE: &str = "Unknown Product";
const DEFAULT_PRICE: &str = "0.00";

/// Display fields carried alongside a candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateMetadata {
	pub id: String,
	pub handle: String,
	pub title: String,
	pub description: String,
	pub price: String,
	pub image: String,
	pub vendor: String,
}
impl CandidateMetadata {
	pub fn from_fields(fields: &HashMap<String, String>) -> Self {
		let text = |key: &str, default: &str| {
			fields.get(key).cloned().unwrap_or_else(|| default.to_string())
		};

		Self {
			id: text("id", ""),
			handle: text("handle", ""),
			title: text("title", DEFAULT_TITLE),
			description: text("description", ""),
			price: text("price", DEFAULT_PRICE),
			image: text("image", ""),
			vendor: text("vendor", ""),
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
	pub score: f32,
	pub group_key: Option<String>,
	pub metadata: CandidateMetadata,
}
impl Candidate {
	pub fn from_match(raw: &IndexMatch, group_key_field: &str) -> Self {
		Self {
			score: raw.score,
			group_key: raw.metadata.get(group_key_field).cloned(),
			metadata: CandidateMetadata::from_fields(&raw.metadata),
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedGroup {
	pub key: String,
	pub mean_score: f32,
	pub member_count: usize,
	pub metadata: CandidateMetadata,
}

/// The top groups by mean score, highest first.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
	groups: Vec<AggregatedGroup>,
	by_key: AHashMap<String, usize>,
}
impl Aggregation {
	pub fn groups(&self) -> &[AggregatedGroup] {
		&self.groups
	}

	pub fn is_empty(&self) -> bool {
		self.groups.is_empty()
	}

	pub fn len(&self) -> usize {
		self.groups.len()
	}

	pub fn get(&self, key: &str) -> Option<&AggregatedGroup> {
		self.by_key.get(key).map(|idx| &self.groups[*idx])
	}

	/// Group keys in rank order; these are the documents sent to the reranker.
	pub fn documents(&self) -> Vec<String> {
		self.groups.iter().map(|group| group.key.clone()).collect()
	}
}

struct Accumulator {
	key: String,
	score_sum: f64,
	count: usize,
	metadata: CandidateMetadata,
}

/// Groups candidates by key, averages their scores, and keeps the best `top_k` groups.
///
/// Candidates with an absent or empty key are skipped. The metadata of the last candidate
/// seen for a key wins. Groups with equal means keep first-seen order.
pub fn aggregate<I>(candidates: I, top_k: usize) -> Aggregation
where
	I: IntoIterator<Item = Candidate>,
{
	let mut slots: AHashMap<String, usize> = AHashMap::new();
	let mut accumulators: Vec<Accumulator> = Vec::new();

	for candidate in candidates {
		let Some(key) = candidate.group_key.filter(|key| !key.is_empty()) else {
			continue;
		};

		match slots.get(&key) {
			Some(&slot) => {
				let acc = &mut accumulators[slot];

				acc.score_sum += f64::from(candidate.score);
				acc.count += 1;
				acc.metadata = candidate.metadata;
			},
			None => {
				slots.insert(key.clone(), accumulators.len());
				accumulators.push(Accumulator {
					key,
					score_sum: f64::from(candidate.score),
					count: 1,
					metadata: candidate.metadata,
				});
			},
		}
	}

	let mut groups: Vec<AggregatedGroup> = accumulators
		.into_iter()
		.map(|acc| AggregatedGroup {
			mean_score: (acc.score_sum / acc.count as f64) as f32,
			member_count: acc.count,
			key: acc.key,
			metadata: acc.metadata,
		})
		.collect();

	// `sort_by` is stable, which gives the first-seen tie-break.
	groups.sort_by(|left, right| cmp_f32_desc(left.mean_score, right.mean_score));
	groups.truncate(top_k);

	let by_key =
		groups.iter().enumerate().map(|(idx, group)| (group.key.clone(), idx)).collect();

	Aggregation { groups, by_key }
}

pub(crate) fn cmp_f32_desc(a: f32, b: f32) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}
