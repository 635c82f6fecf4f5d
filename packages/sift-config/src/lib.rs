mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, EmbeddingProviderConfig, History, LlmProviderConfig, Postgres, Providers, Search,
	Security, Service, Storage,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	parse(&raw).map_err(|err| match err {
		Error::ParseConfig { source, .. } =>
			Error::ParseConfig { path: path.to_path_buf(), source },
		other => other,
	})
}

pub fn parse(raw: &str) -> Result<Config> {
	let mut cfg: Config = toml::from_str(raw)
		.map_err(|err| Error::ParseConfig { path: Default::default(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}

	for (label, key) in [
		("embedding", &cfg.providers.embedding.api_key),
		("llm_explainer", &cfg.providers.llm_explainer.api_key),
	] {
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}
	for (label, value) in [
		("storage.postgres.query_timeout_ms", cfg.storage.postgres.query_timeout_ms),
		("providers.embedding.timeout_ms", cfg.providers.embedding.timeout_ms),
		("providers.llm_explainer.timeout_ms", cfg.providers.llm_explainer.timeout_ms),
		("history.write_timeout_ms", cfg.history.write_timeout_ms),
	] {
		if value == 0 {
			return Err(Error::Validation { message: format!("{label} must be greater than zero.") });
		}
	}

	if !cfg.providers.llm_explainer.temperature.is_finite()
		|| cfg.providers.llm_explainer.temperature < 0.0
	{
		return Err(Error::Validation {
			message: "providers.llm_explainer.temperature must be a finite number, zero or greater."
				.to_string(),
		});
	}
	if cfg.search.max_top_k == 0 {
		return Err(Error::Validation {
			message: "search.max_top_k must be greater than zero.".to_string(),
		});
	}
	if cfg.search.top_k == 0 || cfg.search.top_k > cfg.search.max_top_k {
		return Err(Error::Validation {
			message: "search.top_k must be in the range 1-search.max_top_k.".to_string(),
		});
	}
	if cfg.search.max_query_chars == 0 {
		return Err(Error::Validation {
			message: "search.max_query_chars must be greater than zero.".to_string(),
		});
	}
	if cfg.search.annotation_content_chars == 0 || cfg.search.fallback_excerpt_chars == 0 {
		return Err(Error::Validation {
			message: "search.annotation_content_chars and search.fallback_excerpt_chars must be \
greater than zero."
				.to_string(),
		});
	}
	if cfg.search.fallback_rationale.trim().is_empty() {
		return Err(Error::Validation {
			message: "search.fallback_rationale must be non-empty.".to_string(),
		});
	}
	if cfg.history.max_entries == 0 {
		return Err(Error::Validation {
			message: "history.max_entries must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	for api_base in
		[&mut cfg.providers.embedding.api_base, &mut cfg.providers.llm_explainer.api_base]
	{
		let trimmed = api_base.trim().trim_end_matches('/');

		if trimmed.len() != api_base.len() {
			*api_base = trimmed.to_string();
		}
	}

	cfg.search.fallback_rationale = cfg.search.fallback_rationale.trim().to_string();
}
