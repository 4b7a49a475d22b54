//! Approximate identifier (serial number / asset tag) matching.
//!
//! Identifiers are compared in normalized form: upper-cased with every non-alphanumeric
//! character removed. An [`IdentifierIndex`] is an immutable snapshot built from a full catalog
//! read; callers replace it wholesale to refresh.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::AssetId;

/// One identifier field of one catalog asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierRecord {
	pub asset_id: AssetId,
	pub identifier: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedAsset {
	pub normalized: String,
	pub asset_id: AssetId,
	pub original: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchReason {
	DropFirst,
	DropLast,
	LeadingLetterExtra,
	Levenshtein,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierMatch {
	/// Normalized identifier that matched.
	pub identifier: String,
	pub asset_id: AssetId,
	/// Identifier as stored in the catalog.
	pub original: String,
	pub distance: u32,
	pub reason: MatchReason,
}

#[derive(Debug, Default)]
pub struct IdentifierIndex {
	// Distinct normalized keys in first-seen order, so lookups are deterministic.
	keys: Vec<String>,
	by_key: HashMap<String, Vec<IndexedAsset>>,
}
impl IdentifierIndex {
	pub fn build(records: impl IntoIterator<Item = IdentifierRecord>) -> Self {
		let mut index = Self::default();

		for record in records {
			let normalized = normalize(&record.identifier);

			if normalized.is_empty() {
				continue;
			}

			if !index.by_key.contains_key(&normalized) {
				index.keys.push(normalized.clone());
			}

			index.by_key.entry(normalized.clone()).or_default().push(IndexedAsset {
				normalized,
				asset_id: record.asset_id,
				original: record.identifier,
			});
		}

		index
	}

	/// Number of distinct normalized identifiers.
	pub fn len(&self) -> usize {
		self.keys.len()
	}

	pub fn is_empty(&self) -> bool {
		self.keys.is_empty()
	}

	pub fn contains(&self, normalized: &str) -> bool {
		self.by_key.contains_key(normalized)
	}

	pub fn assets(&self, normalized: &str) -> &[IndexedAsset] {
		self.by_key.get(normalized).map(Vec::as_slice).unwrap_or_default()
	}

	/// Suggests indexed identifiers close to `token`, nearest first.
	///
	/// Cheap truncation heuristics run first and are recorded at distance 1; the bounded edit
	/// distance scan then lowers distances where it finds a closer match. Each (identifier,
	/// asset) pair appears once, keeping its smallest distance and first recorded reason.
	pub fn lookup(&self, token: &str, max_distance: u32, top_k: usize) -> Vec<IdentifierMatch> {
		let query = normalize(token);

		if query.is_empty() || top_k == 0 {
			return Vec::new();
		}

		let mut merged = MatchSet::default();

		for (candidate, reason) in heuristic_candidates(&query) {
			for asset in self.assets(&candidate) {
				merged.offer(asset, 1, reason);
			}
		}

		let max = max_distance as usize;

		for key in &self.keys {
			if key.len().abs_diff(query.len()) > max {
				continue;
			}

			let distance = bounded_levenshtein(&query, key, max);

			if distance > max {
				continue;
			}

			for asset in self.assets(key) {
				merged.offer(asset, distance as u32, MatchReason::Levenshtein);
			}
		}

		let mut matches = merged.entries;

		matches.sort_by_key(|entry| entry.distance);
		matches.truncate(top_k);

		matches
	}
}

#[derive(Default)]
struct MatchSet {
	entries: Vec<IdentifierMatch>,
	positions: HashMap<(String, AssetId), usize>,
}
impl MatchSet {
	fn offer(&mut self, asset: &IndexedAsset, distance: u32, reason: MatchReason) {
		let key = (asset.normalized.clone(), asset.asset_id);

		if let Some(&position) = self.positions.get(&key) {
			let existing = &mut self.entries[position];

			if distance < existing.distance {
				existing.distance = distance;
			}

			return;
		}

		self.positions.insert(key, self.entries.len());
		self.entries.push(IdentifierMatch {
			identifier: asset.normalized.clone(),
			asset_id: asset.asset_id,
			original: asset.original.clone(),
			distance,
			reason,
		});
	}
}

/// Upper-cases and keeps ASCII letters and digits only.
pub fn normalize(raw: &str) -> String {
	raw.chars().filter(char::is_ascii_alphanumeric).map(|ch| ch.to_ascii_uppercase()).collect()
}

/// Levenshtein distance evaluated only within `max_distance` of the diagonal.
///
/// Returns `max_distance + 1` as soon as the answer is known to exceed `max_distance`, so the
/// result is exact only when it is `<= max_distance`.
pub fn bounded_levenshtein(a: &str, b: &str, max_distance: usize) -> usize {
	let a = a.as_bytes();
	let b = b.as_bytes();
	let over = max_distance + 1;

	if a.len().abs_diff(b.len()) > max_distance {
		return over;
	}
	if b.is_empty() {
		return a.len().min(over);
	}

	let mut prev: Vec<usize> = (0..=b.len()).collect();
	let mut cur = vec![over; b.len() + 1];

	for i in 1..=a.len() {
		let from = i.saturating_sub(max_distance).max(1);
		let to = (i + max_distance).min(b.len());

		cur.fill(over);
		cur[0] = i;

		let mut row_min = over;

		for j in from..=to {
			let cost = usize::from(a[i - 1] != b[j - 1]);
			let value = (cur[j - 1] + 1).min(prev[j] + 1).min(prev[j - 1] + cost);

			cur[j] = value;
			row_min = row_min.min(value);
		}

		if row_min > max_distance {
			return over;
		}

		std::mem::swap(&mut prev, &mut cur);
	}

	prev[b.len()].min(over)
}

fn heuristic_candidates(query: &str) -> Vec<(String, MatchReason)> {
	let mut out = Vec::with_capacity(3);

	if query.len() > 1 {
		out.push((query[1..].to_string(), MatchReason::DropFirst));
		out.push((query[..query.len() - 1].to_string(), MatchReason::DropLast));
	}
	if starts_with_single_letter(query) {
		out.push((query[1..].to_string(), MatchReason::LeadingLetterExtra));
	}

	out
}

// A letter followed by at least one more character; the query is already normalized.
fn starts_with_single_letter(query: &str) -> bool {
	query.len() > 1 && query.as_bytes()[0].is_ascii_uppercase()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn record(asset_id: AssetId, identifier: &str) -> IdentifierRecord {
		IdentifierRecord { asset_id, identifier: identifier.to_string() }
	}

	#[test]
	fn normalization_strips_separators_and_upper_cases() {
		assert_eq!(normalize("AB-1234"), "AB1234");
		assert_eq!(normalize("ab1234"), "AB1234");
		assert_eq!(normalize(" 5cg 12/34 "), "5CG1234");
	}

	#[test]
	fn banded_distance_matches_full_distance_inside_band() {
		assert_eq!(bounded_levenshtein("ABCDEFGH", "XBCDEFGH", 2), 1);
		assert_eq!(bounded_levenshtein("AB1234", "AB12345", 2), 1);
		assert_eq!(bounded_levenshtein("AB1234", "AB1234", 2), 0);
		assert_eq!(bounded_levenshtein("KITTEN", "SITTING", 3), 3);
	}

	#[test]
	fn banded_distance_gives_up_outside_band() {
		assert!(bounded_levenshtein("ABCDEFGH", "ZZZZZZZZ", 2) > 2);
		assert_eq!(bounded_levenshtein("AB", "ABCDEF", 2), 3);
		assert_eq!(bounded_levenshtein("AB", "", 2), 2);
		assert_eq!(bounded_levenshtein("ABC", "", 2), 3);
	}

	#[test]
	fn colliding_identifiers_stay_distinct_hits() {
		let index = IdentifierIndex::build([record(1, "AB-1234"), record(2, "ab1234")]);

		assert_eq!(index.len(), 1);
		assert_eq!(index.assets("AB1234").len(), 2);

		let hits = index.lookup("AB1234", 2, 8);

		assert_eq!(hits.len(), 2);
		assert!(hits.iter().all(|hit| hit.distance == 0));
		assert_eq!(hits[0].original, "AB-1234");
		assert_eq!(hits[1].original, "ab1234");
	}

	#[test]
	fn heuristic_reason_survives_equal_distance() {
		let index = IdentifierIndex::build([record(7, "BC12345")]);
		let hits = index.lookup("ABC12345", 2, 8);

		assert_eq!(hits.len(), 1);
		assert_eq!(hits[0].distance, 1);
		assert_eq!(hits[0].reason, MatchReason::DropFirst);
	}

	#[test]
	fn drop_last_heuristic() {
		let index = IdentifierIndex::build([record(3, "XY98765")]);
		let hits = index.lookup("XY987650", 1, 8);

		assert_eq!(hits[0].reason, MatchReason::DropLast);
		assert_eq!(hits[0].distance, 1);
	}

	#[test]
	fn empty_query_yields_nothing() {
		let index = IdentifierIndex::build([record(1, "AB")]);

		assert!(index.lookup("--", 2, 8).is_empty());
		assert!(index.lookup("AB", 2, 0).is_empty());
	}
}
