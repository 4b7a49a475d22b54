//! Bounded-concurrency embedding with per-text retry.
//!
//! A fixed pool of workers drains a shared queue of `(index, text)` pairs. Each worker finishes
//! one text, retries included, before taking the next, so at most `concurrency` provider calls
//! are in flight. Outcomes are placed by index, so output order always matches input order.

use std::time::Duration;

use futures::future;
use parking_lot::Mutex;
use serde::Serialize;

use inq_config::{Config, EmbeddingProviderConfig};

use crate::EmbeddingProvider;

// Sent in place of blank input; some providers reject empty prompts.
const BLANK_TEXT_PLACEHOLDER: &str = "n/a";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOptions {
	pub concurrency: usize,
	pub timeout: Duration,
	pub max_retries: u32,
	pub base_delay: Duration,
	pub dimensions: usize,
}
impl BatchOptions {
	pub fn from_config(cfg: &Config) -> Self {
		Self {
			concurrency: cfg.embedding.concurrency as usize,
			timeout: Duration::from_millis(cfg.providers.embedding.timeout_ms),
			max_retries: cfg.embedding.max_retries,
			base_delay: Duration::from_millis(cfg.embedding.base_delay_ms),
			dimensions: cfg.providers.embedding.dimensions as usize,
		}
	}
}

/// Final state of one input slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EmbedOutcome {
	Embedded { vector: Vec<f32> },
	Failed { error: String },
}
impl EmbedOutcome {
	pub fn is_embedded(&self) -> bool {
		matches!(self, Self::Embedded { .. })
	}

	pub fn into_vector(self) -> Option<Vec<f32>> {
		match self {
			Self::Embedded { vector } => Some(vector),
			Self::Failed { .. } => None,
		}
	}
}

/// Embeds every text and resolves once each slot has a final outcome.
pub async fn embed_batch(
	provider: &dyn EmbeddingProvider,
	cfg: &EmbeddingProviderConfig,
	texts: &[String],
	opts: &BatchOptions,
) -> Vec<EmbedOutcome> {
	if texts.is_empty() {
		return Vec::new();
	}

	let queue = Mutex::new(texts.iter().enumerate());
	let queue = &queue;
	let workers = opts.concurrency.clamp(1, texts.len());
	let finished = future::join_all((0..workers).map(move |_| async move {
		let mut done = Vec::new();

		loop {
			let next = queue.lock().next();
			let Some((index, text)) = next else {
				break;
			};

			done.push((index, embed_with_retry(provider, cfg, text, opts).await));
		}

		done
	}))
	.await;
	let mut slots: Vec<Option<EmbedOutcome>> = vec![None; texts.len()];

	for (index, outcome) in finished.into_iter().flatten() {
		slots[index] = Some(outcome);
	}

	slots
		.into_iter()
		.map(|slot| {
			slot.unwrap_or_else(|| EmbedOutcome::Failed {
				error: "Embedding slot was never scheduled.".to_string(),
			})
		})
		.collect()
}

async fn embed_with_retry(
	provider: &dyn EmbeddingProvider,
	cfg: &EmbeddingProviderConfig,
	text: &str,
	opts: &BatchOptions,
) -> EmbedOutcome {
	let text = if text.trim().is_empty() { BLANK_TEXT_PLACEHOLDER } else { text };
	let mut delay = opts.base_delay;
	let mut last_error = String::new();

	for attempt in 0..=opts.max_retries {
		let result = match tokio::time::timeout(opts.timeout, provider.embed(cfg, text)).await {
			Ok(Ok(vector)) => validate_vector(vector, opts.dimensions),
			Ok(Err(err)) => Err(err.to_string()),
			Err(_) => Err(format!("Embedding timed out after {} ms.", opts.timeout.as_millis())),
		};

		match result {
			Ok(vector) => return EmbedOutcome::Embedded { vector },
			Err(error) => {
				tracing::debug!(attempt, error = %error, "Embedding attempt failed.");

				last_error = error;
			},
		}

		if attempt < opts.max_retries {
			tokio::time::sleep(delay).await;

			delay = delay.saturating_mul(2);
		}
	}

	tracing::warn!(
		attempts = opts.max_retries + 1,
		error = %last_error,
		"Embedding failed after retries."
	);

	EmbedOutcome::Failed { error: last_error }
}

fn validate_vector(vector: Vec<f32>, dimensions: usize) -> Result<Vec<f32>, String> {
	if vector.len() != dimensions {
		return Err(format!(
			"Embedding dimension mismatch: expected {dimensions}, got {}.",
			vector.len()
		));
	}
	if vector.iter().any(|value| !value.is_finite()) {
		return Err("Embedding contains non-finite values.".to_string());
	}

	Ok(vector)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn rejects_wrong_dimensions_and_non_finite_values() {
		assert!(validate_vector(vec![0.1, 0.2], 2).is_ok());
		assert!(validate_vector(vec![0.1], 2).is_err());
		assert!(validate_vector(vec![0.1, f32::NAN], 2).is_err());
	}

	#[test]
	fn outcome_serializes_with_status_tag() {
		let embedded = serde_json::to_value(EmbedOutcome::Embedded { vector: vec![0.5] })
			.expect("Failed to serialize.");
		let failed = serde_json::to_value(EmbedOutcome::Failed { error: "boom".to_string() })
			.expect("Failed to serialize.");

		assert_eq!(embedded, serde_json::json!({ "status": "embedded", "vector": [0.5] }));
		assert_eq!(failed, serde_json::json!({ "status": "failed", "error": "boom" }));
	}
}
