use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

/// A searchable item as read by the candidate scan.
///
/// `embedding` is returned exactly as stored. It may hold a numeric array, a string with a
/// serialized array, or anything else a writer put there.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CandidateRow {
	pub item_id: Uuid,
	pub title: String,
	pub content: String,
	pub media_url: Option<String>,
	pub duration_secs: Option<i32>,
	pub thumbnail_url: Option<String>,
	pub embedding: Option<Value>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SearchHistoryEntry {
	pub entry_id: Uuid,
	pub user_id: String,
	pub query: String,
	pub result_count: i32,
	pub last_searched_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryUpsert {
	pub entry_id: Uuid,
	pub inserted: bool,
}
