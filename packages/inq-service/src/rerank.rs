//! Advisory reranking of the fused head through the generation provider.
//!
//! The provider sees the first `top_n` candidates addressed by position and must answer with a
//! JSON array of `{"idx": n, "score": s}`. Any failure (transport, timeout, malformed or
//! inconsistent output) yields [`RerankOutcome::Degraded`] carrying the fused order untouched.

use std::{collections::HashSet, time::Duration};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use inq_config::LlmProviderConfig;
use inq_domain::fusion::FusedResult;

use crate::GenerationProvider;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RerankedResult {
	pub id: String,
	pub fused_score: f64,
	/// Present only for candidates the provider scored.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub relevance_score: Option<f64>,
	pub payload: Value,
}
impl From<FusedResult> for RerankedResult {
	fn from(result: FusedResult) -> Self {
		Self {
			id: result.id,
			fused_score: result.fused_score,
			relevance_score: None,
			payload: result.payload,
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub enum RerankOutcome {
	Reranked(Vec<RerankedResult>),
	Degraded { results: Vec<RerankedResult>, reason: String },
}
impl RerankOutcome {
	pub fn is_degraded(&self) -> bool {
		matches!(self, Self::Degraded { .. })
	}

	pub fn into_results(self) -> Vec<RerankedResult> {
		match self {
			Self::Reranked(results) | Self::Degraded { results, .. } => results,
		}
	}
}

pub async fn rerank(
	provider: &dyn GenerationProvider,
	cfg: &LlmProviderConfig,
	query: &str,
	candidates: Vec<FusedResult>,
	top_n: usize,
) -> RerankOutcome {
	let top_n = top_n.min(candidates.len());

	if top_n == 0 {
		return RerankOutcome::Reranked(
			candidates.into_iter().map(RerankedResult::from).collect(),
		);
	}

	let prompt = build_prompt(query, &candidates[..top_n]);
	let timeout = Duration::from_millis(cfg.timeout_ms);
	let scores = match tokio::time::timeout(timeout, provider.generate(cfg, &prompt)).await {
		Ok(Ok(text)) => parse_scores(&text, top_n),
		Ok(Err(err)) => Err(err.to_string()),
		Err(_) => Err(format!("Reranker timed out after {} ms.", cfg.timeout_ms)),
	};

	match scores {
		Ok(scores) => RerankOutcome::Reranked(apply_scores(candidates, &scores)),
		Err(reason) => RerankOutcome::Degraded {
			results: candidates.into_iter().map(RerankedResult::from).collect(),
			reason,
		},
	}
}

/// One line per candidate, as `brand model [type] SN:serial ST:status`.
pub fn candidate_text(payload: &Value) -> String {
	let field = |key: &str| payload.get(key).and_then(Value::as_str).unwrap_or_default();

	format!(
		"{} {} [{}] SN:{} ST:{}",
		field("brandName"),
		field("modelName"),
		field("typeName"),
		field("serialNumber"),
		field("status")
	)
	.trim()
	.to_string()
}

fn build_prompt(query: &str, head: &[FusedResult]) -> String {
	let mut prompt = String::from(
		"You are a search reranker. Score each listed inventory item from 0 to 1 by how well it \
		 matches the query.\n\
		 Reply with JSON only, in this exact shape: [{\"idx\":<n>,\"score\":<float>}, ...]\n\n",
	);

	prompt.push_str(&format!("Query: {query}\n\nItems:\n"));

	for (idx, result) in head.iter().enumerate() {
		prompt.push_str(&format!("{idx}. {}\n", candidate_text(&result.payload)));
	}

	prompt.push_str("JSON:");

	prompt
}

/// Scores by submitted position, clamped to [0, 1]; omitted positions score 0.
fn parse_scores(text: &str, expected: usize) -> Result<Vec<f64>, String> {
	let start = text.find('[').ok_or("Reranker reply has no JSON array.")?;
	let end = text
		.rfind(']')
		.filter(|end| *end > start)
		.ok_or("Reranker reply has no JSON array.")?;
	let entries: Vec<Value> = serde_json::from_str(&text[start..=end])
		.map_err(|err| format!("Reranker reply is not valid JSON: {err}."))?;

	if entries.is_empty() {
		return Err("Reranker reply scored no candidates.".to_string());
	}

	let mut scores = vec![0.0; expected];
	let mut seen = HashSet::new();

	for entry in entries {
		let idx = entry
			.get("idx")
			.and_then(Value::as_u64)
			.map(|idx| idx as usize)
			.ok_or("Reranker entry is missing a numeric idx.")?;
		let score = entry
			.get("score")
			.and_then(|score| {
				score.as_f64().or_else(|| score.as_str().and_then(|raw| raw.trim().parse().ok()))
			})
			.filter(|score| score.is_finite())
			.ok_or("Reranker entry is missing a finite score.")?;

		if idx >= expected {
			return Err(format!("Reranker idx {idx} is out of range for {expected} candidates."));
		}
		if !seen.insert(idx) {
			return Err(format!("Reranker scored idx {idx} more than once."));
		}

		scores[idx] = score.clamp(0.0, 1.0);
	}

	Ok(scores)
}

fn apply_scores(candidates: Vec<FusedResult>, scores: &[f64]) -> Vec<RerankedResult> {
	let mut head = Vec::with_capacity(scores.len());
	let mut tail = Vec::new();

	for (position, candidate) in candidates.into_iter().enumerate() {
		match scores.get(position) {
			Some(score) => head.push(RerankedResult {
				relevance_score: Some(*score),
				..RerankedResult::from(candidate)
			}),
			None => tail.push(RerankedResult::from(candidate)),
		}
	}

	head.sort_by(|a, b| {
		b.relevance_score.unwrap_or_default().total_cmp(&a.relevance_score.unwrap_or_default())
	});
	head.extend(tail);

	head
}
