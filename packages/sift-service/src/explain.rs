use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use unicode_segmentation::UnicodeSegmentation;

use sift_config::Search;
use sift_storage::models::CandidateRow;

use crate::{SiftService, ranking::ScoredCandidate};

/// Rationale and excerpt attached to one result. Both fields are non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
	pub rationale: String,
	pub excerpt: String,
}

/// Outcome of decoding the explanation provider's reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationParse {
	Parsed(Vec<RawAnnotation>),
	Unparseable,
}

/// One entry of the provider's reply, keyed by the 1-based position of the result it explains.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawAnnotation {
	pub index: usize,
	pub rationale: String,
	pub excerpt: String,
}

impl SiftService {
	/// Annotates `results` in order. Provider failures degrade to deterministic fallbacks.
	pub(crate) async fn annotate(
		&self,
		query: &str,
		results: &[ScoredCandidate],
	) -> Vec<Annotation> {
		if results.is_empty() {
			return Vec::new();
		}

		let cfg = &self.cfg.providers.llm_explainer;
		let messages =
			build_explanation_messages(query, results, self.cfg.search.annotation_content_chars);
		let reply = tokio::time::timeout(
			Duration::from_millis(cfg.timeout_ms),
			self.providers.explanation.complete(cfg, &messages),
		)
		.await;
		let parsed = match reply {
			Ok(Ok(raw)) => {
				let parsed = parse_annotations(&raw);

				if parsed == AnnotationParse::Unparseable {
					tracing::warn!(
						provider_id = cfg.provider_id.as_str(),
						"Explanation reply is unparseable. Using fallback annotations."
					);
				}

				parsed
			},
			Ok(Err(err)) => {
				tracing::warn!(
					error = %err,
					provider_id = cfg.provider_id.as_str(),
					"Explanation request failed. Using fallback annotations."
				);

				AnnotationParse::Unparseable
			},
			Err(_) => {
				tracing::warn!(
					timeout_ms = cfg.timeout_ms,
					provider_id = cfg.provider_id.as_str(),
					"Explanation request timed out. Using fallback annotations."
				);

				AnnotationParse::Unparseable
			},
		};

		resolve_annotations(parsed, results, &self.cfg.search)
	}
}

pub fn build_explanation_messages(
	query: &str,
	results: &[ScoredCandidate],
	content_chars: u32,
) -> Vec<Value> {
	let items: Vec<Value> = results
		.iter()
		.enumerate()
		.map(|(i, scored)| {
			serde_json::json!({
				"index": i + 1,
				"title": scored.item.title,
				"content": truncate_chars(&scored.item.content, content_chars as usize),
			})
		})
		.collect();
	let items_text = serde_json::to_string_pretty(&items).unwrap_or_else(|_| "[]".to_string());
	let system_prompt = "You explain why search results are relevant to a user's query. \
Output must be a JSON array only, with one object per result: \
{\"index\": number, \"rationale\": string, \"excerpt\": string}. \
The index is the result's 1-based position. The rationale is one short sentence. \
The excerpt is a short passage copied verbatim from the result's content. \
Do not add commentary or extra fields.";
	let user_prompt = format!("Query:\n{query}\nResults:\n{items_text}");

	vec![
		serde_json::json!({ "role": "system", "content": system_prompt }),
		serde_json::json!({ "role": "user", "content": user_prompt }),
	]
}

/// Decodes the first JSON array in `raw` that holds at least one object. Text after the array is
/// ignored.
///
/// Elements that do not match the annotation shape are dropped one by one, so their results fall
/// back while the rest keep their generated text.
pub fn parse_annotations(raw: &str) -> AnnotationParse {
	for (start, _) in raw.match_indices('[') {
		let Some(Ok(items)) =
			serde_json::Deserializer::from_str(&raw[start..]).into_iter::<Vec<Value>>().next()
		else {
			continue;
		};

		if !items.iter().any(Value::is_object) {
			continue;
		}

		return AnnotationParse::Parsed(
			items.into_iter().filter_map(|item| serde_json::from_value(item).ok()).collect(),
		);
	}

	AnnotationParse::Unparseable
}

/// Pairs each result with its parsed annotation, or a fallback when none was accepted.
///
/// An entry is ignored when its index is out of range, already taken, or its text is blank.
pub fn resolve_annotations(
	parsed: AnnotationParse,
	results: &[ScoredCandidate],
	cfg: &Search,
) -> Vec<Annotation> {
	let mut slots: Vec<Option<Annotation>> = vec![None; results.len()];

	if let AnnotationParse::Parsed(items) = parsed {
		for item in items {
			let Some(slot) = item.index.checked_sub(1).and_then(|pos| slots.get_mut(pos)) else {
				continue;
			};

			if slot.is_some() {
				continue;
			}

			let rationale = item.rationale.trim();
			let excerpt = item.excerpt.trim();

			if rationale.is_empty() || excerpt.is_empty() {
				continue;
			}

			*slot = Some(Annotation {
				rationale: rationale.to_string(),
				excerpt: excerpt.to_string(),
			});
		}
	}

	slots
		.into_iter()
		.zip(results)
		.map(|(slot, scored)| slot.unwrap_or_else(|| fallback_annotation(&scored.item, cfg)))
		.collect()
}

pub fn fallback_annotation(item: &CandidateRow, cfg: &Search) -> Annotation {
	let limit = cfg.fallback_excerpt_chars as usize;
	let excerpt = [item.content.trim(), item.title.trim(), cfg.fallback_rationale.as_str()]
		.into_iter()
		.find(|text| !text.is_empty())
		.map(|text| truncate_chars(text, limit))
		.unwrap_or_default();

	Annotation { rationale: cfg.fallback_rationale.clone(), excerpt }
}

fn truncate_chars(text: &str, limit: usize) -> String {
	text.graphemes(true).take(limit).collect()
}
