mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Assembly, Config, Discovery, EmbeddingProviderConfig, ImageStoreConfig, Postgres, Providers,
	Qdrant, Search, Service, Storage,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
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
	if cfg.storage.qdrant.vector_dim == 0 {
		return Err(Error::Validation {
			message: "storage.qdrant.vector_dim must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.storage.qdrant.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.qdrant.vector_dim."
				.to_string(),
		});
	}
	if cfg.providers.embedding.api_key.trim().is_empty() {
		return Err(Error::Validation {
			message: "providers.embedding.api_key must be non-empty.".to_string(),
		});
	}
	if cfg.providers.image_store.api_base.trim().is_empty() {
		return Err(Error::Validation {
			message: "providers.image_store.api_base must be non-empty.".to_string(),
		});
	}

	for (label, value) in [
		("search.english_sim_threshold", cfg.search.english_sim_threshold),
		("search.foreign_sim_threshold", cfg.search.foreign_sim_threshold),
	] {
		if !value.is_finite() || !(0.0..=1.0).contains(&value) {
			return Err(Error::Validation {
				message: format!("{label} must be in the range 0.0-1.0."),
			});
		}
	}

	if cfg.search.foreign_sim_threshold > cfg.search.english_sim_threshold {
		return Err(Error::Validation {
			message:
				"search.foreign_sim_threshold must not exceed search.english_sim_threshold."
					.to_string(),
		});
	}
	if !cfg.search.fuzzy_relax.is_finite()
		|| cfg.search.fuzzy_relax <= 0.0
		|| cfg.search.fuzzy_relax > 1.0
	{
		return Err(Error::Validation {
			message: "search.fuzzy_relax must be greater than zero and at most 1.0.".to_string(),
		});
	}
	if cfg.search.oversample_factor == 0 {
		return Err(Error::Validation {
			message: "search.oversample_factor must be greater than zero.".to_string(),
		});
	}
	if cfg.search.fuzzy_prefix_len == 0 {
		return Err(Error::Validation {
			message: "search.fuzzy_prefix_len must be greater than zero.".to_string(),
		});
	}
	if cfg.search.fuzzy_scan_cap == 0 {
		return Err(Error::Validation {
			message: "search.fuzzy_scan_cap must be greater than zero.".to_string(),
		});
	}

	for (label, value) in [
		("search.vector_weight", cfg.search.vector_weight),
		("search.text_weight", cfg.search.text_weight),
	] {
		if !value.is_finite() || value <= 0.0 {
			return Err(Error::Validation {
				message: format!("{label} must be a finite number greater than zero."),
			});
		}
	}

	if cfg.search.vector_weight <= cfg.search.text_weight {
		return Err(Error::Validation {
			message: "search.vector_weight must exceed search.text_weight.".to_string(),
		});
	}
	if cfg.search.strategy_timeout_ms == 0 {
		return Err(Error::Validation {
			message: "search.strategy_timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.discovery.default_limit == 0 {
		return Err(Error::Validation {
			message: "discovery.default_limit must be greater than zero.".to_string(),
		});
	}
	if cfg.discovery.max_limit < cfg.discovery.default_limit {
		return Err(Error::Validation {
			message: "discovery.max_limit must be at least discovery.default_limit.".to_string(),
		});
	}
	if cfg.assembly.image_concurrency == 0 {
		return Err(Error::Validation {
			message: "assembly.image_concurrency must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg
		.providers
		.image_store
		.api_key
		.as_deref()
		.map(|key| key.trim().is_empty())
		.unwrap_or(false)
	{
		cfg.providers.image_store.api_key = None;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn base_config() -> Config {
		toml::from_str(
			r#"
			[service]
			log_level = "info"

			[storage.postgres]
			dsn = "postgres://localhost/glossa"
			pool_max_conns = 8

			[storage.qdrant]
			url = "http://localhost:6334"
			collection = "objects"
			vector_dim = 1536

			[providers.embedding]
			provider_id = "openai"
			api_base = "https://api.openai.com"
			api_key = "sk-test"
			path = "/v1/embeddings"
			model = "text-embedding-3-small"
			dimensions = 1536
			timeout_ms = 10000
			default_headers = {}

			[providers.image_store]
			api_base = "http://localhost:9000"
			image_path = "/images"
			thumbnail_path = "/thumbnails"
			timeout_ms = 5000

			[search]
			english_sim_threshold = 0.82
			foreign_sim_threshold = 0.70
			oversample_factor = 4
			fuzzy_prefix_len = 3
			fuzzy_scan_cap = 200
			vector_weight = 2.0
			text_weight = 1.0
			strategy_timeout_ms = 4000

			[discovery]
			default_limit = 9
			max_limit = 27

			[assembly]
			image_concurrency = 8
			"#,
		)
		.expect("base config must parse")
	}

	#[test]
	fn base_config_is_valid() {
		assert!(validate(&base_config()).is_ok());
	}

	#[test]
	fn fuzzy_relax_defaults_when_omitted() {
		let cfg = base_config();

		assert!((cfg.search.fuzzy_relax - 0.9).abs() < f32::EPSILON);
	}

	#[test]
	fn rejects_foreign_threshold_above_english() {
		let mut cfg = base_config();
		cfg.search.foreign_sim_threshold = 0.95;

		assert!(validate(&cfg).is_err());
	}

	#[test]
	fn rejects_vector_weight_not_exceeding_text_weight() {
		let mut cfg = base_config();
		cfg.search.vector_weight = 1.0;

		assert!(validate(&cfg).is_err());
	}

	#[test]
	fn normalize_drops_blank_image_store_key() {
		let mut cfg = base_config();
		cfg.providers.image_store.api_key = Some("  ".to_string());

		normalize(&mut cfg);

		assert!(cfg.providers.image_store.api_key.is_none());
	}
}
