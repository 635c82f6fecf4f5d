use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use sift_config::Error;

const SAMPLE_CONFIG_TOML: &str = include_str!("fixtures/sample_config.toml");

static COUNTER: AtomicU64 = AtomicU64::new(0);

fn sample_with(section: &str, key: &str, value: Value) -> String {
	let mut root: Value = toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse sample config.");
	let mut table = root.as_table_mut().expect("Sample config must be a table.");

	for part in section.split('.') {
		table = table
			.get_mut(part)
			.and_then(Value::as_table_mut)
			.unwrap_or_else(|| panic!("Sample config must include [{section}]."));
	}

	table.insert(key.to_string(), value);

	toml::to_string(&root).expect("Failed to render sample config.")
}

fn sample_without(section: &str) -> String {
	let mut root: Value = toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse sample config.");

	root.as_table_mut().expect("Sample config must be a table.").remove(section);

	toml::to_string(&root).expect("Failed to render sample config.")
}

fn write_temp_config(payload: &str) -> PathBuf {
	let nanos = SystemTime::now().duration_since(UNIX_EPOCH).expect("Clock went backwards.").as_nanos();
	let seq = COUNTER.fetch_add(1, Ordering::SeqCst);
	let path = env::temp_dir().join(format!("sift_config_test_{nanos}_{seq}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn expect_validation(payload: &str, needle: &str) {
	let err = sift_config::parse(payload).expect_err("Expected validation error.");

	match err {
		Error::Validation { message } => assert!(
			message.contains(needle),
			"Unexpected validation message {message:?}; expected it to mention {needle:?}."
		),
		other => panic!("Expected validation error, got {other:?}."),
	}
}

#[test]
fn sample_config_loads_from_disk() {
	let path = write_temp_config(SAMPLE_CONFIG_TOML);
	let cfg = sift_config::load(&path).expect("Failed to load sample config.");

	fs::remove_file(&path).expect("Failed to remove test config.");

	assert_eq!(cfg.search.top_k, 5);
	assert_eq!(cfg.history.max_entries, 20);
	assert_eq!(cfg.providers.embedding.dimensions, 1_536);
	assert_eq!(cfg.storage.postgres.query_timeout_ms, 5_000);
}

#[test]
fn api_base_trailing_slash_is_trimmed() {
	let cfg = sift_config::parse(SAMPLE_CONFIG_TOML).expect("Failed to parse sample config.");

	assert_eq!(cfg.providers.embedding.api_base, "https://api.openai.com/v1");
}

#[test]
fn search_and_history_sections_default_when_missing() {
	let payload = sample_without("search");
	let payload = {
		let mut root: Value = toml::from_str(&payload).expect("Failed to parse payload.");

		root.as_table_mut().expect("Payload must be a table.").remove("history");

		toml::to_string(&root).expect("Failed to render payload.")
	};
	let cfg = sift_config::parse(&payload).expect("Failed to parse config without defaults.");

	assert_eq!(cfg.search.top_k, 5);
	assert_eq!(cfg.search.annotation_content_chars, 500);
	assert_eq!(cfg.search.fallback_excerpt_chars, 100);
	assert_eq!(cfg.search.fallback_rationale, "Relevant result.");
	assert_eq!(cfg.history.max_entries, 20);
	assert!(cfg.history.record_on_search);
}

#[test]
fn missing_config_file_reports_read_error() {
	let path = env::temp_dir().join("sift_config_test_missing_file.toml");
	let err = sift_config::load(&path).expect_err("Expected read error.");

	assert!(matches!(err, Error::ReadConfig { .. }));
}

#[test]
fn malformed_toml_reports_parse_error_with_path() {
	let path = write_temp_config("[service\nhttp_bind = ");
	let err = sift_config::load(&path).expect_err("Expected parse error.");

	fs::remove_file(&path).expect("Failed to remove test config.");

	match err {
		Error::ParseConfig { path: reported, .. } => assert_eq!(reported, path),
		other => panic!("Expected parse error, got {other:?}."),
	}
}

#[test]
fn zero_dimensions_are_rejected() {
	expect_validation(
		&sample_with("providers.embedding", "dimensions", Value::Integer(0)),
		"providers.embedding.dimensions",
	);
}

#[test]
fn blank_api_key_is_rejected() {
	expect_validation(
		&sample_with("providers.llm_explainer", "api_key", Value::String("  ".to_string())),
		"llm_explainer api_key",
	);
}

#[test]
fn top_k_above_max_is_rejected() {
	expect_validation(&sample_with("search", "top_k", Value::Integer(51)), "search.top_k");
	expect_validation(&sample_with("search", "top_k", Value::Integer(0)), "search.top_k");
}

#[test]
fn zero_history_cap_is_rejected() {
	expect_validation(
		&sample_with("history", "max_entries", Value::Integer(0)),
		"history.max_entries",
	);
}

#[test]
fn zero_timeouts_are_rejected() {
	expect_validation(
		&sample_with("providers.embedding", "timeout_ms", Value::Integer(0)),
		"providers.embedding.timeout_ms",
	);
	expect_validation(
		&sample_with("history", "write_timeout_ms", Value::Integer(0)),
		"history.write_timeout_ms",
	);
}

#[test]
fn blank_fallback_rationale_is_rejected() {
	expect_validation(
		&sample_with("search", "fallback_rationale", Value::String(" ".to_string())),
		"search.fallback_rationale",
	);
}
