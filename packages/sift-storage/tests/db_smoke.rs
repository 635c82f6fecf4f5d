use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use sift_config::Postgres;
use sift_storage::{Error, db::Db, queries};
use sift_testkit::TestDatabase;

async fn bootstrap(test_db: &TestDatabase) -> Db {
	let cfg = Postgres {
		dsn: test_db.dsn().to_string(),
		pool_max_conns: 2,
		query_timeout_ms: 5_000,
	};
	let db = Db::connect(&cfg).await.expect("Failed to connect to Postgres.");

	db.ensure_schema().await.expect("Failed to ensure schema.");

	db
}

async fn insert_item(db: &Db, title: &str, embedding: Option<serde_json::Value>, offset_secs: i64) {
	sqlx::query(
		"\
INSERT INTO content_items (item_id, title, content, embedding, created_at)
VALUES ($1, $2, $3, $4, $5)",
	)
	.bind(Uuid::new_v4())
	.bind(title)
	.bind(format!("{title} transcript"))
	.bind(embedding)
	.bind(OffsetDateTime::now_utc() + Duration::seconds(offset_secs))
	.execute(&db.pool)
	.await
	.expect("Failed to insert content item.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SIFT_PG_DSN to run."]
async fn db_connects_and_bootstraps_twice() {
	let Some(base_dsn) = sift_testkit::env_dsn() else {
		eprintln!("Skipping db_connects_and_bootstraps_twice; set SIFT_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = bootstrap(&test_db).await;

	db.ensure_schema().await.expect("Schema bootstrap must be idempotent.");

	for table in ["content_items", "search_history"] {
		let count: i64 = sqlx::query_scalar(
			"SELECT count(*) FROM information_schema.tables WHERE table_name = $1",
		)
		.bind(table)
		.fetch_one(&db.pool)
		.await
		.expect("Failed to query schema tables.");

		assert_eq!(count, 1, "Missing table {table}.");
	}

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SIFT_PG_DSN to run."]
async fn candidates_skip_missing_embeddings_and_keep_insert_order() {
	let Some(base_dsn) = sift_testkit::env_dsn() else {
		eprintln!("Skipping candidate listing test; set SIFT_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = bootstrap(&test_db).await;

	insert_item(&db, "first", Some(serde_json::json!([0.1, 0.2, 0.3])), 0).await;
	insert_item(&db, "sql null", None, 1).await;
	insert_item(&db, "json null", Some(serde_json::Value::Null), 2).await;
	insert_item(&db, "string", Some(serde_json::json!("[0.3, 0.2, 0.1]")), 3).await;
	insert_item(&db, "garbage", Some(serde_json::json!("not a vector")), 4).await;

	let rows = queries::list_candidates(&db).await.expect("Failed to list candidates.");
	let titles: Vec<&str> = rows.iter().map(|row| row.title.as_str()).collect();

	assert_eq!(titles, vec!["first", "string", "garbage"]);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SIFT_PG_DSN to run."]
async fn history_upsert_reports_insert_then_update() {
	let Some(base_dsn) = sift_testkit::env_dsn() else {
		eprintln!("Skipping history upsert test; set SIFT_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = bootstrap(&test_db).await;
	let now = OffsetDateTime::now_utc();
	let mut tx = db.pool.begin().await.expect("Failed to begin transaction.");
	let first = queries::upsert_history_tx(&mut tx, "u1", "pmf", 3, now)
		.await
		.expect("Failed to insert history.");
	let second = queries::upsert_history_tx(&mut tx, "u1", "pmf", 5, now + Duration::seconds(1))
		.await
		.expect("Failed to update history.");

	tx.commit().await.expect("Failed to commit transaction.");

	assert!(first.inserted);
	assert!(!second.inserted);
	assert_eq!(first.entry_id, second.entry_id);

	let entries = queries::list_history(&db, "u1", 20).await.expect("Failed to list history.");

	assert_eq!(entries.len(), 1);
	assert_eq!(entries[0].result_count, 5);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SIFT_PG_DSN to run."]
async fn delete_history_entry_is_scoped_to_owner() {
	let Some(base_dsn) = sift_testkit::env_dsn() else {
		eprintln!("Skipping history ownership test; set SIFT_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = bootstrap(&test_db).await;
	let mut tx = db.pool.begin().await.expect("Failed to begin transaction.");
	let now = OffsetDateTime::now_utc();
	let upsert = queries::upsert_history_tx(&mut tx, "owner", "retention", 2, now)
		.await
		.expect("Failed to insert history.");

	tx.commit().await.expect("Failed to commit transaction.");

	let err = queries::delete_history_entry(&db, "intruder", upsert.entry_id)
		.await
		.expect_err("Foreign delete must fail.");

	assert!(matches!(err, Error::NotFound(_)));

	queries::delete_history_entry(&db, "owner", upsert.entry_id)
		.await
		.expect("Owner delete must succeed.");

	assert!(queries::list_history(&db, "owner", 20).await.expect("list").is_empty());

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
