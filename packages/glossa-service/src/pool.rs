use uuid::Uuid;

use glossa_domain::gap;
use glossa_store::{models::ObjectMetadata, tenant::TenantScope};

use crate::{
	GlossaService, ServiceError, ServiceResult,
	assemble::AssembleArgs,
	discover::DiscoverArgs,
	search::SearchArgs,
};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PoolRequest {
	pub user_id: String,
	#[serde(default)]
	pub org_id: Option<String>,
	#[serde(default)]
	pub languages_allowed: Vec<String>,
	#[serde(default)]
	pub search_query: Option<String>,
	/// Target language for name resolution.
	#[serde(default)]
	pub language: Option<String>,
	#[serde(default)]
	pub limit: Option<u32>,
	/// Search-mode offset; discovery paginates with `last_object_id`.
	#[serde(default)]
	pub skip: Option<u32>,
	#[serde(default)]
	pub last_object_id: Option<String>,
	#[serde(default = "default_use_vector")]
	pub use_vector_search: bool,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PoolItem {
	pub object_id: Uuid,
	pub image_hash: String,
	pub object_name: String,
	pub image_base64: String,
	pub thumbnail_base64: String,
	pub metadata: ObjectMetadata,
	pub popularity_stars: f32,
	pub total_net_votes: i64,
	pub total_vote_count_human: String,
	pub languages_translated: Vec<String>,
	pub untranslated_languages: Vec<String>,
	pub org_id: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PoolResponse {
	pub items: Vec<PoolItem>,
	pub total: u64,
	pub has_more: bool,
}

impl GlossaService {
	/// The discovery/search entry point: a non-empty query runs the hybrid
	/// engine (finished objects stay visible), no query surfaces the
	/// highest-ranked objects that still need translation work.
	pub async fn pool(&self, req: PoolRequest) -> ServiceResult<PoolResponse> {
		let user_id = req.user_id.trim();

		if user_id.is_empty() {
			return Err(ServiceError::InvalidRequest {
				message: "user_id is required.".to_string(),
			});
		}
		if let Some(org_id) = req.org_id.as_ref()
			&& org_id.trim().is_empty()
		{
			return Err(ServiceError::InvalidRequest {
				message: "org_id must not be empty when provided.".to_string(),
			});
		}

		let scope =
			TenantScope::new(user_id, req.org_id.as_deref().map(str::trim).map(str::to_string));
		let limit = req
			.limit
			.unwrap_or(self.cfg.discovery.default_limit)
			.clamp(1, self.cfg.discovery.max_limit) as usize;
		let target_language = req.language.as_deref().map(str::trim).filter(|l| !l.is_empty());
		let query = req.search_query.as_deref().map(str::trim).filter(|q| !q.is_empty());

		match query {
			Some(query) => {
				let outcome = self
					.hybrid_search(SearchArgs {
						scope: &scope,
						query,
						limit,
						skip: req.skip.unwrap_or(0) as usize,
						use_vector: req.use_vector_search,
					})
					.await?;
				let records =
					outcome.candidates.into_iter().map(|candidate| candidate.record).collect();
				let items = self
					.assemble(records, AssembleArgs {
						scope: &scope,
						languages_allowed: &req.languages_allowed,
						target_language,
					})
					.await?;

				Ok(PoolResponse { items, total: outcome.total, has_more: outcome.has_more })
			},
			None => {
				let outcome = self
					.discover(DiscoverArgs {
						scope: &scope,
						languages_allowed: &req.languages_allowed,
						limit,
						last_object_id: req.last_object_id.as_deref(),
					})
					.await?;
				// The store-level gap filter ran against a snapshot; a summary
				// approved since then still must not reach the response.
				let records: Vec<_> = outcome
					.records
					.into_iter()
					.filter(|record| {
						!gap::is_fully_translated(
							&record.translation_summary,
							scope.org_id(),
							&req.languages_allowed,
						)
					})
					.collect();
				let items = self
					.assemble(records, AssembleArgs {
						scope: &scope,
						languages_allowed: &req.languages_allowed,
						target_language,
					})
					.await?;

				Ok(PoolResponse { items, total: outcome.total, has_more: outcome.has_more })
			},
		}
	}
}

fn default_use_vector() -> bool {
	true
}
