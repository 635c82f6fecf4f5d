use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub search: Search,
	#[serde(default)]
	pub history: History,
	#[serde(default)]
	pub security: Security,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
	/// Upper bound for a single candidate or history query, including pool acquisition.
	#[serde(default = "default_query_timeout_ms")]
	pub query_timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub llm_explainer: LlmProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Search {
	/// Number of results returned when a request does not ask for a specific count.
	pub top_k: u32,
	pub max_top_k: u32,
	pub max_query_chars: u32,
	/// Content prefix length handed to the explanation provider per result.
	pub annotation_content_chars: u32,
	pub fallback_excerpt_chars: u32,
	pub fallback_rationale: String,
}
impl Default for Search {
	fn default() -> Self {
		Self {
			top_k: 5,
			max_top_k: 50,
			max_query_chars: 2_000,
			annotation_content_chars: 500,
			fallback_excerpt_chars: 100,
			fallback_rationale: "Relevant result.".to_string(),
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct History {
	pub max_entries: u32,
	pub record_on_search: bool,
	pub write_timeout_ms: u64,
}
impl Default for History {
	fn default() -> Self {
		Self { max_entries: 20, record_on_search: true, write_timeout_ms: 2_000 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Security {
	pub bind_localhost_only: bool,
}
impl Default for Security {
	fn default() -> Self {
		Self { bind_localhost_only: true }
	}
}

fn default_query_timeout_ms() -> u64 {
	5_000
}
