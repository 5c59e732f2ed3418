use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	pub search: Search,
	pub discovery: Discovery,
	pub assembly: Assembly,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	pub qdrant: Qdrant,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Qdrant {
	pub url: String,
	pub collection: String,
	pub vector_dim: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub image_store: ImageStoreConfig,
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
	pub default_headers: Map<String, Value>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ImageStoreConfig {
	pub api_base: String,
	pub api_key: Option<String>,
	pub image_path: String,
	pub thumbnail_path: String,
	pub timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct Search {
	/// Minimum vector similarity accepted for queries classified as English.
	pub english_sim_threshold: f32,
	/// Looser floor for non-English queries; cross-lingual embeddings score lower.
	pub foreign_sim_threshold: f32,
	/// Multiplier applied to the active vector threshold to derive the fuzzy
	/// floor. Tunable; no measured precision/recall pins it to one value.
	#[serde(default = "default_fuzzy_relax")]
	pub fuzzy_relax: f32,
	pub oversample_factor: u32,
	pub fuzzy_prefix_len: usize,
	pub fuzzy_scan_cap: u32,
	pub vector_weight: f32,
	pub text_weight: f32,
	pub strategy_timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct Discovery {
	pub default_limit: u32,
	pub max_limit: u32,
}

#[derive(Debug, Deserialize)]
pub struct Assembly {
	pub image_concurrency: usize,
}

fn default_fuzzy_relax() -> f32 {
	0.9
}
