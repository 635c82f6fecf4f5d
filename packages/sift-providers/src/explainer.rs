use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result};

/// Sends a chat completion request and returns the first choice's message content verbatim.
///
/// The content is free text; locating and validating the structured fragment inside it is the
/// caller's job.
pub async fn complete(cfg: &sift_config::LlmProviderConfig, messages: &[Value]) -> Result<String> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"messages": messages,
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_completion_content(json)
}

fn parse_completion_content(json: Value) -> Result<String> {
	let content = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
		.ok_or_else(|| Error::InvalidResponse {
			message: "Explainer response is missing message content.".to_string(),
		})?;

	if content.trim().is_empty() {
		return Err(Error::InvalidResponse {
			message: "Explainer response content is empty.".to_string(),
		});
	}

	Ok(content.to_string())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn returns_first_choice_content() {
		let json = serde_json::json!({
			"choices": [
				{ "message": { "content": "Here you go: [{\"index\": 1}]" } },
				{ "message": { "content": "ignored" } }
			]
		});
		let content = parse_completion_content(json).expect("parse failed");

		assert_eq!(content, "Here you go: [{\"index\": 1}]");
	}

	#[test]
	fn rejects_blank_content() {
		let json = serde_json::json!({ "choices": [{ "message": { "content": "  " } }] });

		assert!(matches!(parse_completion_content(json), Err(Error::InvalidResponse { .. })));
	}

	#[test]
	fn rejects_missing_choices() {
		let json = serde_json::json!({ "id": "chatcmpl-1" });

		assert!(parse_completion_content(json).is_err());
	}
}
