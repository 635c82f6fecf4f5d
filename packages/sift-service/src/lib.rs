pub mod explain;
pub mod history;
pub mod ranking;
pub mod search;
pub mod time_serde;
pub mod vector;

mod candidates;
mod embedding;
mod error;

pub use error::{Error, Result};
pub use explain::{Annotation, AnnotationParse};
pub use history::{
	HistoryClearRequest, HistoryClearResponse, HistoryDeleteRequest, HistoryDeleteResponse,
	HistoryEntry, HistoryListRequest, HistoryListResponse, HistoryOp, HistoryRecordRequest,
	HistoryRecordResponse,
};
pub use ranking::{Ranking, ScoredCandidate};
pub use search::{SearchItem, SearchRequest, SearchResponse};
pub use vector::ParsedVector;

use std::{future::Future, pin::Pin, sync::Arc};

use serde_json::Value;

use sift_config::{Config, EmbeddingProviderConfig, LlmProviderConfig};
use sift_providers::{embedding as embedding_api, explainer};
use sift_storage::db::Db;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>>;
}

pub trait ExplanationProvider
where
	Self: Send + Sync,
{
	/// Returns the provider's free-text reply to a chat prompt.
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, Result<String>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub explanation: Arc<dyn ExplanationProvider>,
}
impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		explanation: Arc<dyn ExplanationProvider>,
	) -> Self {
		Self { embedding, explanation }
	}
}
impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(HttpProviders);

		Self { embedding: provider.clone(), explanation: provider }
	}
}

pub struct SiftService {
	pub cfg: Config,
	pub db: Db,
	pub providers: Providers,
}
impl SiftService {
	pub fn new(cfg: Config, db: Db) -> Self {
		Self { cfg, db, providers: Providers::default() }
	}

	pub fn with_providers(cfg: Config, db: Db, providers: Providers) -> Self {
		Self { cfg, db, providers }
	}
}

struct HttpProviders;
impl EmbeddingProvider for HttpProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>> {
		Box::pin(async move { Ok(embedding_api::embed(cfg, texts).await?) })
	}
}
impl ExplanationProvider for HttpProviders {
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, Result<String>> {
		Box::pin(async move { Ok(explainer::complete(cfg, messages).await?) })
	}
}

#[cfg(test)]
mod tests {
	use serde_json::Map;

	use super::*;

	fn unreachable_embedding() -> EmbeddingProviderConfig {
		EmbeddingProviderConfig {
			provider_id: "test".to_string(),
			api_base: "http://127.0.0.1:1".to_string(),
			api_key: "test-key".to_string(),
			path: "/embeddings".to_string(),
			model: "test".to_string(),
			dimensions: 3,
			timeout_ms: 1_000,
			default_headers: Map::new(),
		}
	}

	#[tokio::test]
	async fn default_embedding_provider_calls_http_client() {
		let providers = Providers::default();
		let cfg = unreachable_embedding();
		let texts = vec!["pmf".to_string()];
		let result = providers.embedding.embed(&cfg, &texts).await;

		assert!(matches!(result, Err(Error::Provider { .. })));
	}
}
