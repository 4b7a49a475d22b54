//! Reciprocal rank fusion: score(id) = sum over lists of 1 / (k + rank + 1), rank zero-based.
//!
//! Only ranks matter, so provider scores on different scales never need normalizing.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_RRF_K: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
	Semantic,
	Keyword,
	Fuzzy,
}

/// A provider hit. `score` is on the provider's own scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
	pub id: String,
	pub score: f32,
	pub provenance: Provenance,
	pub payload: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedResult {
	pub id: String,
	pub fused_score: f64,
	pub payload: Value,
}

/// Fuses ranked lists into one ranking, highest fused score first.
///
/// Ties keep first-seen order (lists in input order, then rank order), and each id carries the
/// payload of its first occurrence.
pub fn fuse(lists: &[Vec<Candidate>], k: u32) -> Vec<FusedResult> {
	let mut fused: Vec<FusedResult> = Vec::new();
	let mut positions: HashMap<&str, usize> = HashMap::new();

	for list in lists {
		for (rank, candidate) in list.iter().enumerate() {
			let contribution = 1.0 / (f64::from(k) + rank as f64 + 1.0);

			match positions.get(candidate.id.as_str()) {
				Some(&position) => fused[position].fused_score += contribution,
				None => {
					positions.insert(candidate.id.as_str(), fused.len());
					fused.push(FusedResult {
						id: candidate.id.clone(),
						fused_score: contribution,
						payload: candidate.payload.clone(),
					});
				},
			}
		}
	}

	fused.sort_by(|a, b| b.fused_score.total_cmp(&a.fused_score));

	fused
}
