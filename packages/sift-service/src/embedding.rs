use std::{slice, time::Duration};

use crate::{Error, Result, SiftService};

impl SiftService {
	/// Embeds one query. Any failure, including a timeout or a dimension mismatch, is fatal to the
	/// search that asked for it.
	pub(crate) async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
		let cfg = &self.cfg.providers.embedding;
		let text = query.to_string();
		let embedded = tokio::time::timeout(
			Duration::from_millis(cfg.timeout_ms),
			self.providers.embedding.embed(cfg, slice::from_ref(&text)),
		)
		.await
		.map_err(|_| Error::EmbeddingFailed {
			message: format!("Embedding provider timed out after {} ms.", cfg.timeout_ms),
		})?
		.map_err(|err| Error::EmbeddingFailed { message: err.to_string() })?;
		let vector = embedded.into_iter().next().ok_or_else(|| Error::EmbeddingFailed {
			message: "Embedding provider returned no vectors.".to_string(),
		})?;

		if vector.len() != cfg.dimensions as usize {
			return Err(Error::EmbeddingFailed {
				message: format!(
					"Embedding vector dimension mismatch: expected {}, got {}.",
					cfg.dimensions,
					vector.len()
				),
			});
		}

		Ok(vector)
	}
}
