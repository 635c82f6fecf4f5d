use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use sift_storage::{models::SearchHistoryEntry, queries};

use crate::{Error, Result, SiftService};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HistoryOp {
	Add,
	Update,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecordRequest {
	pub user_id: String,
	pub query: String,
	pub result_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecordResponse {
	pub entry_id: Uuid,
	pub op: HistoryOp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryListRequest {
	pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
	pub entry_id: Uuid,
	pub query: String,
	pub result_count: u32,
	#[serde(with = "crate::time_serde")]
	pub last_searched_at: OffsetDateTime,
}
impl From<SearchHistoryEntry> for HistoryEntry {
	fn from(row: SearchHistoryEntry) -> Self {
		Self {
			entry_id: row.entry_id,
			query: row.query,
			result_count: u32::try_from(row.result_count).unwrap_or(0),
			last_searched_at: row.last_searched_at,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryListResponse {
	pub items: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryDeleteRequest {
	pub user_id: String,
	pub entry_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryDeleteResponse {
	pub entry_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryClearRequest {
	pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryClearResponse {
	pub deleted: u64,
}

impl SiftService {
	pub async fn history_record(&self, req: HistoryRecordRequest) -> Result<HistoryRecordResponse> {
		let user_id = require_user_id(&req.user_id)?;
		let query = normalize_query(&req.query);

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

		let result_count = i32::try_from(req.result_count).map_err(|_| Error::InvalidRequest {
			message: "result_count is out of range.".to_string(),
		})?;

		self.record_history(user_id, &query, result_count).await
	}

	pub async fn history_list(&self, req: HistoryListRequest) -> Result<HistoryListResponse> {
		let user_id = require_user_id(&req.user_id)?;
		let rows = queries::list_history(&self.db, user_id, self.cfg.history.max_entries).await?;

		Ok(HistoryListResponse { items: rows.into_iter().map(HistoryEntry::from).collect() })
	}

	pub async fn history_delete(&self, req: HistoryDeleteRequest) -> Result<HistoryDeleteResponse> {
		let user_id = require_user_id(&req.user_id)?;

		queries::delete_history_entry(&self.db, user_id, req.entry_id).await?;

		Ok(HistoryDeleteResponse { entry_id: req.entry_id })
	}

	pub async fn history_clear(&self, req: HistoryClearRequest) -> Result<HistoryClearResponse> {
		let user_id = require_user_id(&req.user_id)?;
		let deleted = queries::clear_history(&self.db, user_id).await?;

		tracing::info!(user_id, deleted, "Search history cleared.");

		Ok(HistoryClearResponse { deleted })
	}

	/// Upserts one already-normalized query, then evicts the user's oldest entries beyond the cap.
	pub(crate) async fn record_history(
		&self,
		user_id: &str,
		query: &str,
		result_count: i32,
	) -> Result<HistoryRecordResponse> {
		let now = OffsetDateTime::now_utc();
		let mut tx = self.db.pool.begin().await?;

		queries::lock_user_history_tx(&mut tx, user_id).await?;

		let upsert = queries::upsert_history_tx(&mut tx, user_id, query, result_count, now).await?;
		let evicted =
			queries::trim_history_tx(&mut tx, user_id, self.cfg.history.max_entries).await?;

		tx.commit().await?;

		if evicted > 0 {
			tracing::debug!(user_id, evicted, "Evicted old search history entries.");
		}

		let op = if upsert.inserted { HistoryOp::Add } else { HistoryOp::Update };

		Ok(HistoryRecordResponse { entry_id: upsert.entry_id, op })
	}
}

/// Canonical form used to deduplicate history: trimmed, single-spaced, lowercase.
pub fn normalize_query(query: &str) -> String {
	query.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

fn require_user_id(user_id: &str) -> Result<&str> {
	let trimmed = user_id.trim();

	if trimmed.is_empty() {
		return Err(Error::InvalidRequest { message: "user_id is required.".to_string() });
	}

	Ok(trimmed)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn normalization_collapses_whitespace_and_case() {
		assert_eq!(normalize_query("  Product   Market\tFIT \n"), "product market fit");
		assert_eq!(normalize_query("pmf"), normalize_query(" PMF "));
		assert_eq!(normalize_query(" \t "), "");
	}

	#[test]
	fn blank_user_id_is_rejected() {
		assert!(matches!(require_user_id("  "), Err(Error::InvalidRequest { .. })));
		assert_eq!(require_user_id(" u1 ").expect("valid user id"), "u1");
	}

	#[test]
	fn history_op_serializes_in_screaming_case() {
		assert_eq!(serde_json::to_string(&HistoryOp::Update).expect("serialize"), "\"UPDATE\"");
	}
}
