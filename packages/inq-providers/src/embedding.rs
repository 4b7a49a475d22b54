use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result};

/// Embeds one text. The body carries both `prompt` and `input` so Ollama-style and
/// OpenAI-style endpoints accept it.
pub async fn embed(cfg: &inq_config::EmbeddingProviderConfig, text: &str) -> Result<Vec<f32>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"prompt": text,
		"input": text,
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_embedding_response(&json)
}

fn parse_embedding_response(json: &Value) -> Result<Vec<f32>> {
	let values = json
		.get("embedding")
		.and_then(Value::as_array)
		.or_else(|| {
			let embeddings = json.get("embeddings").and_then(Value::as_array)?;

			match embeddings.first() {
				Some(Value::Array(first)) => Some(first),
				_ => Some(embeddings),
			}
		})
		.or_else(|| {
			json.get("data")
				.and_then(Value::as_array)
				.and_then(|data| data.first())
				.and_then(|item| item.get("embedding"))
				.and_then(Value::as_array)
		})
		.ok_or_else(|| Error::InvalidResponse {
			message: "Embedding response is missing an embedding array.".to_string(),
		})?;
	let mut vector = Vec::with_capacity(values.len());

	for value in values {
		let number = value.as_f64().ok_or_else(|| Error::InvalidResponse {
			message: "Embedding value must be numeric.".to_string(),
		})?;

		vector.push(number as f32);
	}

	Ok(vector)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_single_embedding_field() {
		let json = serde_json::json!({ "embedding": [0.5, 1.5, -2.0] });
		let parsed = parse_embedding_response(&json).expect("parse failed");

		assert_eq!(parsed, vec![0.5, 1.5, -2.0]);
	}

	#[test]
	fn parses_nested_and_flat_embeddings_field() {
		let nested = serde_json::json!({ "embeddings": [[1.0, 2.0]] });
		let flat = serde_json::json!({ "embeddings": [3.0, 4.0] });

		assert_eq!(parse_embedding_response(&nested).expect("parse failed"), vec![1.0, 2.0]);
		assert_eq!(parse_embedding_response(&flat).expect("parse failed"), vec![3.0, 4.0]);
	}

	#[test]
	fn parses_openai_data_shape() {
		let json = serde_json::json!({ "data": [{ "index": 0, "embedding": [0.25] }] });

		assert_eq!(parse_embedding_response(&json).expect("parse failed"), vec![0.25]);
	}

	#[test]
	fn rejects_non_numeric_values() {
		let json = serde_json::json!({ "embedding": [0.1, "x"] });

		assert!(matches!(parse_embedding_response(&json), Err(Error::InvalidResponse { .. })));
	}

	#[test]
	fn rejects_missing_vector() {
		let json = serde_json::json!({ "error": "model not found" });

		assert!(parse_embedding_response(&json).is_err());
	}
}
