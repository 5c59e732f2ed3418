pub mod assemble;
pub mod discover;
pub mod pool;
pub mod recompute;
pub mod search;

use std::{future::Future, pin::Pin, sync::Arc};

use glossa_config::{Config, EmbeddingProviderConfig, ImageStoreConfig};
use glossa_providers::{embedding, image};
use glossa_store::{
	collection::Collection,
	filter::Filter,
	models::{ImageStatus, ObjectRecord, TranslationRecord, fields},
	tenant::{TenantCollection, TenantScope},
};
pub use pool::{PoolItem, PoolRequest, PoolResponse};

pub type ServiceResult<T> = Result<T, ServiceError>;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>>;
}

pub trait ImageStoreProvider
where
	Self: Send + Sync,
{
	fn retrieve<'a>(
		&'a self,
		cfg: &'a ImageStoreConfig,
		descriptor: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Vec<u8>>>;

	fn retrieve_thumbnail<'a>(
		&'a self,
		cfg: &'a ImageStoreConfig,
		descriptor: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Vec<u8>>>;
}

#[derive(Debug)]
pub enum ServiceError {
	InvalidRequest { message: String },
	Provider { message: String },
	Storage { message: String },
}
impl std::fmt::Display for ServiceError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::InvalidRequest { message } => write!(f, "Invalid request: {message}"),
			Self::Provider { message } => write!(f, "Provider error: {message}"),
			Self::Storage { message } => write!(f, "Storage error: {message}"),
		}
	}
}
impl std::error::Error for ServiceError {}
impl From<glossa_store::Error> for ServiceError {
	fn from(err: glossa_store::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}
impl From<color_eyre::Report> for ServiceError {
	fn from(err: color_eyre::Report) -> Self {
		Self::Provider { message: err.to_string() }
	}
}
impl From<serde_json::Error> for ServiceError {
	fn from(err: serde_json::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}

struct DefaultProviders;

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, texts))
	}
}

impl ImageStoreProvider for DefaultProviders {
	fn retrieve<'a>(
		&'a self,
		cfg: &'a ImageStoreConfig,
		descriptor: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Vec<u8>>> {
		Box::pin(image::retrieve(cfg, descriptor))
	}

	fn retrieve_thumbnail<'a>(
		&'a self,
		cfg: &'a ImageStoreConfig,
		descriptor: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Vec<u8>>> {
		Box::pin(image::retrieve_thumbnail(cfg, descriptor))
	}
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub image_store: Arc<dyn ImageStoreProvider>,
}
impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		image_store: Arc<dyn ImageStoreProvider>,
	) -> Self {
		Self { embedding, image_store }
	}
}
impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { embedding: provider.clone(), image_store: provider }
	}
}

/// The content-discovery engine. Holds the raw collections; every request
/// builds tenant-scoped views from its own `TenantScope`, so no cross-request
/// state ever carries an org.
pub struct GlossaService {
	pub cfg: Config,
	pub objects: Arc<dyn Collection<ObjectRecord>>,
	pub translations: Arc<dyn Collection<TranslationRecord>>,
	pub providers: Providers,
}
impl GlossaService {
	pub fn new(
		cfg: Config,
		objects: Arc<dyn Collection<ObjectRecord>>,
		translations: Arc<dyn Collection<TranslationRecord>>,
	) -> Self {
		Self { cfg, objects, translations, providers: Providers::default() }
	}

	pub fn with_providers(
		cfg: Config,
		objects: Arc<dyn Collection<ObjectRecord>>,
		translations: Arc<dyn Collection<TranslationRecord>>,
		providers: Providers,
	) -> Self {
		Self { cfg, objects, translations, providers }
	}

	/// The shared object catalog: an org sees its own records plus approved
	/// global ones.
	pub(crate) fn scoped_objects(&self, scope: &TenantScope) -> TenantCollection<ObjectRecord> {
		TenantCollection::fallback(self.objects.clone(), scope.clone(), approved_objects())
	}

	/// Translations never fall back across scopes.
	pub(crate) fn scoped_translations(
		&self,
		scope: &TenantScope,
	) -> TenantCollection<TranslationRecord> {
		TenantCollection::strict(self.translations.clone(), scope.clone())
	}
}

pub(crate) fn approved_objects() -> Filter {
	Filter::eq(fields::IMAGE_STATUS, ImageStatus::Approved.as_str())
}
