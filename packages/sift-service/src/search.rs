use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
	Error, Result, SiftService,
	explain::Annotation,
	history,
	ranking::{self, ScoredCandidate},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
	pub query: String,
	/// Anonymous searches are served but leave no history.
	#[serde(default)]
	pub user_id: Option<String>,
	#[serde(default)]
	pub top_k: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchItem {
	pub item_id: Uuid,
	pub title: String,
	pub media_url: Option<String>,
	pub duration_secs: Option<i32>,
	pub thumbnail_url: Option<String>,
	pub similarity: f32,
	pub rationale: String,
	pub excerpt: String,
}
impl SearchItem {
	fn new(scored: ScoredCandidate, annotation: Annotation) -> Self {
		let ScoredCandidate { item, similarity } = scored;

		Self {
			item_id: item.item_id,
			title: item.title,
			media_url: item.media_url,
			duration_secs: item.duration_secs,
			thumbnail_url: item.thumbnail_url,
			similarity,
			rationale: annotation.rationale,
			excerpt: annotation.excerpt,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
	pub results: Vec<SearchItem>,
}

impl SiftService {
	pub async fn search(&self, req: SearchRequest) -> Result<SearchResponse> {
		let query = req.query.trim();

		if query.is_empty() {
			return Err(Error::InvalidRequest { message: "query must be non-empty.".to_string() });
		}
		if query.chars().count() > self.cfg.search.max_query_chars as usize {
			return Err(Error::InvalidRequest {
				message: format!(
					"query must be at most {} characters.",
					self.cfg.search.max_query_chars
				),
			});
		}

		let top_k = req.top_k.unwrap_or(self.cfg.search.top_k);

		if top_k == 0 || top_k > self.cfg.search.max_top_k {
			return Err(Error::InvalidRequest {
				message: format!("top_k must be in the range 1-{}.", self.cfg.search.max_top_k),
			});
		}

		let user_id = req.user_id.as_deref().map(str::trim).filter(|value| !value.is_empty());
		let (query_vec, candidates) =
			tokio::try_join!(self.embed_query(query), self.fetch_candidates()).inspect_err(
				|err| tracing::error!(error = %err, "Search aborted."),
			)?;
		let ranking = ranking::rank_candidates(&query_vec, candidates, top_k as usize);

		if ranking.invalid > 0 {
			tracing::warn!(
				invalid = ranking.invalid,
				scanned = ranking.scanned,
				"Candidates with unusable embeddings scored as zero."
			);
		}

		let annotations = self.annotate(query, &ranking.results).await;
		let results: Vec<SearchItem> = ranking
			.results
			.into_iter()
			.zip(annotations)
			.map(|(scored, annotation)| SearchItem::new(scored, annotation))
			.collect();

		if let Some(user_id) = user_id
			&& self.cfg.history.record_on_search
		{
			self.record_history_best_effort(user_id, query, results.len()).await;
		}

		tracing::info!(
			scanned = ranking.scanned,
			returned = results.len(),
			top_k,
			"Search completed."
		);

		Ok(SearchResponse { results })
	}

	/// Records the query for `user_id` within the configured write budget. Failures are logged and
	/// dropped.
	async fn record_history_best_effort(&self, user_id: &str, query: &str, result_count: usize) {
		let timeout_ms = self.cfg.history.write_timeout_ms;
		let normalized = history::normalize_query(query);
		let result_count = i32::try_from(result_count).unwrap_or(i32::MAX);
		let outcome = tokio::time::timeout(
			Duration::from_millis(timeout_ms),
			self.record_history(user_id, &normalized, result_count),
		)
		.await;

		match outcome {
			Ok(Ok(_)) => {},
			Ok(Err(err)) => {
				tracing::warn!(error = %err, user_id, "Failed to record search history.");
			},
			Err(_) => {
				tracing::warn!(timeout_ms, user_id, "Recording search history timed out.");
			},
		}
	}
}
