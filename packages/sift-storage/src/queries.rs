use sqlx::{Executor, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	Error, Result,
	db::Db,
	models::{CandidateRow, HistoryUpsert, SearchHistoryEntry},
};

/// Every item carrying a stored embedding, in insertion order.
///
/// JSON `null` counts as missing. Anything else is returned untouched, malformed or not.
pub async fn list_candidates(db: &Db) -> Result<Vec<CandidateRow>> {
	let rows = sqlx::query_as::<_, CandidateRow>(
		"\
SELECT
	item_id,
	title,
	content,
	media_url,
	duration_secs,
	thumbnail_url,
	embedding
FROM content_items
WHERE embedding IS NOT NULL
	AND jsonb_typeof(embedding) <> 'null'
ORDER BY created_at ASC, item_id ASC",
	)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

/// Serializes history writers of one user until the transaction ends, so the cap is applied
/// against every committed entry.
pub async fn lock_user_history_tx(
	tx: &mut Transaction<'_, Postgres>,
	user_id: &str,
) -> Result<()> {
	sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
		.bind(user_id)
		.execute(&mut **tx)
		.await?;

	Ok(())
}

pub async fn upsert_history_tx(
	tx: &mut Transaction<'_, Postgres>,
	user_id: &str,
	query: &str,
	result_count: i32,
	now: OffsetDateTime,
) -> Result<HistoryUpsert> {
	upsert_history_exec(&mut **tx, user_id, query, result_count, now).await
}

/// Deletes every entry of `user_id` beyond the `max_entries` most recent ones.
pub async fn trim_history_tx(
	tx: &mut Transaction<'_, Postgres>,
	user_id: &str,
	max_entries: u32,
) -> Result<u64> {
	trim_history_exec(&mut **tx, user_id, max_entries).await
}

pub async fn list_history(db: &Db, user_id: &str, limit: u32) -> Result<Vec<SearchHistoryEntry>> {
	let rows = sqlx::query_as::<_, SearchHistoryEntry>(
		"\
SELECT entry_id, user_id, query, result_count, last_searched_at
FROM search_history
WHERE user_id = $1
ORDER BY last_searched_at DESC, entry_id DESC
LIMIT $2",
	)
	.bind(user_id)
	.bind(i64::from(limit))
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

/// Deletes one entry owned by `user_id`. An entry owned by someone else is reported as missing.
pub async fn delete_history_entry(db: &Db, user_id: &str, entry_id: Uuid) -> Result<()> {
	let result = sqlx::query("DELETE FROM search_history WHERE entry_id = $1 AND user_id = $2")
		.bind(entry_id)
		.bind(user_id)
		.execute(&db.pool)
		.await?;

	if result.rows_affected() == 0 {
		return Err(Error::NotFound(format!("History entry {entry_id} not found.")));
	}

	Ok(())
}

pub async fn clear_history(db: &Db, user_id: &str) -> Result<u64> {
	let result = sqlx::query("DELETE FROM search_history WHERE user_id = $1")
		.bind(user_id)
		.execute(&db.pool)
		.await?;

	Ok(result.rows_affected())
}

async fn upsert_history_exec<'e, E>(
	executor: E,
	user_id: &str,
	query: &str,
	result_count: i32,
	now: OffsetDateTime,
) -> Result<HistoryUpsert>
where
	E: Executor<'e, Database = Postgres>,
{
	if result_count < 0 {
		return Err(Error::InvalidArgument("result_count must be zero or greater.".to_string()));
	}

	let (entry_id, inserted): (Uuid, bool) = sqlx::query_as(
		"\
INSERT INTO search_history (entry_id, user_id, query, result_count, last_searched_at)
VALUES ($1, $2, $3, $4, $5)
ON CONFLICT (user_id, query) DO UPDATE
SET
	result_count = EXCLUDED.result_count,
	last_searched_at = EXCLUDED.last_searched_at
RETURNING entry_id, (xmax = 0) AS inserted",
	)
	.bind(Uuid::new_v4())
	.bind(user_id)
	.bind(query)
	.bind(result_count)
	.bind(now)
	.fetch_one(executor)
	.await?;

	Ok(HistoryUpsert { entry_id, inserted })
}

async fn trim_history_exec<'e, E>(executor: E, user_id: &str, max_entries: u32) -> Result<u64>
where
	E: Executor<'e, Database = Postgres>,
{
	let result = sqlx::query(
		"\
DELETE FROM search_history
WHERE entry_id IN (
	SELECT entry_id
	FROM search_history
	WHERE user_id = $1
	ORDER BY last_searched_at DESC, entry_id DESC
	OFFSET $2
)",
	)
	.bind(user_id)
	.bind(i64::from(max_entries))
	.execute(executor)
	.await?;

	Ok(result.rows_affected())
}
