use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result};

/// Single-turn, non-streaming completion; returns the trimmed text.
pub async fn generate(cfg: &inq_config::LlmProviderConfig, prompt: &str) -> Result<String> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"prompt": prompt,
		"stream": false,
		"options": { "temperature": cfg.temperature },
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_generation_response(&json)
}

fn parse_generation_response(json: &Value) -> Result<String> {
	if let Some(text) = json.get("response").and_then(Value::as_str) {
		return Ok(text.trim().to_string());
	}

	let choice = json.get("choices").and_then(Value::as_array).and_then(|choices| choices.first());
	let text = choice
		.and_then(|choice| choice.get("message"))
		.and_then(|message| message.get("content"))
		.and_then(Value::as_str)
		.or_else(|| choice.and_then(|choice| choice.get("text")).and_then(Value::as_str));

	text.map(|text| text.trim().to_string()).ok_or_else(|| Error::InvalidResponse {
		message: "Generation response is missing text content.".to_string(),
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_ollama_response() {
		let json =
			serde_json::json!({ "response": "  [{\"idx\":0,\"score\":0.9}]\n", "done": true });

		assert_eq!(
			parse_generation_response(&json).expect("parse failed"),
			"[{\"idx\":0,\"score\":0.9}]"
		);
	}

	#[test]
	fn parses_chat_choice_content() {
		let json = serde_json::json!({
			"choices": [
				{ "message": { "role": "assistant", "content": "CPU: i5" } }
			]
		});

		assert_eq!(parse_generation_response(&json).expect("parse failed"), "CPU: i5");
	}

	#[test]
	fn parses_completion_choice_text() {
		let json = serde_json::json!({ "choices": [{ "text": " RAM: 8GB " }] });

		assert_eq!(parse_generation_response(&json).expect("parse failed"), "RAM: 8GB");
	}

	#[test]
	fn missing_text_is_invalid() {
		let json = serde_json::json!({ "choices": [] });

		assert!(matches!(parse_generation_response(&json), Err(Error::InvalidResponse { .. })));
	}
}
