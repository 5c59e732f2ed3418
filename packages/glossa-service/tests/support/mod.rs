#![allow(dead_code)]

use std::sync::Arc;

use glossa_config::{Config, EmbeddingProviderConfig, ImageStoreConfig};
use glossa_service::{
	BoxFuture, EmbeddingProvider, GlossaService, ImageStoreProvider, PoolRequest, Providers,
};
use glossa_store::models::{ObjectRecord, TranslationRecord, fields};
use glossa_testkit::MemoryCollection;

pub fn test_config() -> Config {
	let cfg: Config = toml::from_str(
		r#"
		[service]
		log_level = "info"

		[storage.postgres]
		dsn = "postgres://localhost/glossa_test"
		pool_max_conns = 2

		[storage.qdrant]
		url = "http://localhost:6334"
		collection = "objects_test"
		vector_dim = 3

		[providers.embedding]
		provider_id = "test"
		api_base = "http://localhost:9990"
		api_key = "test-key"
		path = "/v1/embeddings"
		model = "test-embedding"
		dimensions = 3
		timeout_ms = 2000
		default_headers = {}

		[providers.image_store]
		api_base = "http://localhost:9991"
		image_path = "/images"
		thumbnail_path = "/thumbnails"
		timeout_ms = 2000

		[search]
		english_sim_threshold = 0.82
		foreign_sim_threshold = 0.70
		oversample_factor = 4
		fuzzy_prefix_len = 3
		fuzzy_scan_cap = 200
		vector_weight = 2.0
		text_weight = 1.0
		strategy_timeout_ms = 2000

		[discovery]
		default_limit = 9
		max_limit = 27

		[assembly]
		image_concurrency = 4
		"#,
	)
	.expect("test config must parse");

	glossa_config::validate(&cfg).expect("test config must validate");

	cfg
}

/// Embeds every text to the same fixed vector.
pub struct StaticEmbedding {
	pub vector: Vec<f32>,
}
impl EmbeddingProvider for StaticEmbedding {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		let vector = self.vector.clone();

		Box::pin(async move { Ok(vec![vector; texts.len()]) })
	}
}

pub struct FailingEmbedding;
impl EmbeddingProvider for FailingEmbedding {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		_texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(async { Err(color_eyre::eyre::eyre!("embedding provider unavailable")) })
	}
}

/// Serves deterministic bytes per descriptor; descriptors listed in
/// `fail_for` error instead.
pub struct StaticImages {
	pub fail_for: Vec<String>,
}
impl StaticImages {
	pub fn ok() -> Self {
		Self { fail_for: Vec::new() }
	}

	pub fn failing(descriptor: &str) -> Self {
		Self { fail_for: vec![descriptor.to_string()] }
	}

	fn fetch(&self, prefix: &str, descriptor: &str) -> color_eyre::Result<Vec<u8>> {
		if self.fail_for.iter().any(|failing| descriptor.contains(failing.as_str())) {
			return Err(color_eyre::eyre::eyre!("image store unavailable for {descriptor}"));
		}

		Ok(format!("{prefix}:{descriptor}").into_bytes())
	}
}
impl ImageStoreProvider for StaticImages {
	fn retrieve<'a>(
		&'a self,
		_cfg: &'a ImageStoreConfig,
		descriptor: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Vec<u8>>> {
		let result = self.fetch("img", descriptor);

		Box::pin(async move { result })
	}

	fn retrieve_thumbnail<'a>(
		&'a self,
		_cfg: &'a ImageStoreConfig,
		descriptor: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Vec<u8>>> {
		let result = self.fetch("thumb", descriptor);

		Box::pin(async move { result })
	}
}

pub fn service_with(
	objects: Vec<ObjectRecord>,
	translations: Vec<TranslationRecord>,
	embedding: Arc<dyn EmbeddingProvider>,
	images: Arc<dyn ImageStoreProvider>,
) -> GlossaService {
	glossa_testkit::init_logging();

	let objects: Arc<MemoryCollection<ObjectRecord>> =
		Arc::new(MemoryCollection::with_records(fields::OBJECT_ID, objects));
	let translations: Arc<MemoryCollection<TranslationRecord>> =
		Arc::new(MemoryCollection::with_records(fields::TRANSLATION_ID, translations));

	GlossaService::with_providers(
		test_config(),
		objects,
		translations,
		Providers::new(embedding, images),
	)
}

pub fn text_only_service(
	objects: Vec<ObjectRecord>,
	translations: Vec<TranslationRecord>,
) -> GlossaService {
	service_with(objects, translations, Arc::new(FailingEmbedding), Arc::new(StaticImages::ok()))
}

pub fn discovery_request(user_id: &str, languages: &[&str]) -> PoolRequest {
	PoolRequest {
		user_id: user_id.to_string(),
		org_id: None,
		languages_allowed: languages.iter().map(|s| s.to_string()).collect(),
		search_query: None,
		language: None,
		limit: None,
		skip: None,
		last_object_id: None,
		use_vector_search: false,
	}
}

pub fn search_request(user_id: &str, query: &str) -> PoolRequest {
	PoolRequest {
		user_id: user_id.to_string(),
		org_id: None,
		languages_allowed: Vec::new(),
		search_query: Some(query.to_string()),
		language: None,
		limit: None,
		skip: None,
		last_object_id: None,
		use_vector_search: false,
	}
}
