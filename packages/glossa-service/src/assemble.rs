use std::sync::Arc;

use base64::{Engine, engine::general_purpose::STANDARD};
use tokio::{sync::Semaphore, task::JoinSet};
use tracing::warn;

use glossa_config::ImageStoreConfig;
use glossa_domain::{gap, votes};
use glossa_store::{
	collection::Collection,
	filter::Filter,
	models::{ObjectRecord, TranslationRecord, TranslationStatus, fields},
	tenant::{TenantCollection, TenantScope},
};

use crate::{GlossaService, ImageStoreProvider, PoolItem, ServiceResult};

pub(crate) struct AssembleArgs<'a> {
	pub(crate) scope: &'a TenantScope,
	pub(crate) languages_allowed: &'a [String],
	pub(crate) target_language: Option<&'a str>,
}

struct EnrichTask {
	index: usize,
	record: ObjectRecord,
	languages_translated: Vec<String>,
	untranslated_languages: Vec<String>,
	resolve_language: Option<String>,
}

impl GlossaService {
	/// Builds the response items: image payloads resolved concurrently under
	/// a bounded cap, vote counts humanized, names localized when the target
	/// language is already translated for this scope. A candidate whose
	/// image cannot be resolved is skipped; the batch continues.
	pub(crate) async fn assemble(
		&self,
		records: Vec<ObjectRecord>,
		args: AssembleArgs<'_>,
	) -> ServiceResult<Vec<PoolItem>> {
		let AssembleArgs { scope, languages_allowed, target_language } = args;
		let semaphore = Arc::new(Semaphore::new(self.cfg.assembly.image_concurrency));
		let image_cfg = self.cfg.providers.image_store.clone();
		let mut join_set = JoinSet::new();
		let count = records.len();

		for (index, record) in records.into_iter().enumerate() {
			let languages_translated =
				record.translation_summary.translated_for_scope(scope.org_id()).to_vec();
			let untranslated_languages = gap::untranslated_languages(
				&record.translation_summary,
				scope.org_id(),
				languages_allowed,
			);
			let resolve_language = target_language
				.filter(|language| {
					languages_translated.iter().any(|translated| translated == language)
				})
				.map(str::to_string);
			let task = EnrichTask {
				index,
				record,
				languages_translated,
				untranslated_languages,
				resolve_language,
			};
			let semaphore = semaphore.clone();
			let image_store = self.providers.image_store.clone();
			let image_cfg = image_cfg.clone();
			let translations = self.translations.clone();
			let scope = scope.clone();

			join_set.spawn(async move {
				let Ok(_permit) = semaphore.acquire_owned().await else {
					return (task.index, None);
				};

				enrich(task, image_store.as_ref(), &image_cfg, translations, scope).await
			});
		}

		let mut slots: Vec<Option<PoolItem>> = (0..count).map(|_| None).collect();

		while let Some(joined) = join_set.join_next().await {
			let Ok((index, item)) = joined else {
				continue;
			};

			slots[index] = item;
		}

		Ok(slots.into_iter().flatten().collect())
	}
}

async fn enrich(
	task: EnrichTask,
	image_store: &dyn ImageStoreProvider,
	image_cfg: &ImageStoreConfig,
	translations: Arc<dyn Collection<TranslationRecord>>,
	scope: TenantScope,
) -> (usize, Option<PoolItem>) {
	let EnrichTask { index, record, languages_translated, untranslated_languages, resolve_language } =
		task;
	let image = match image_store.retrieve(image_cfg, &record.image_ref).await {
		Ok(bytes) => bytes,
		Err(err) => {
			warn!(
				object_id = %record.object_id,
				error = %err,
				"Image retrieval failed; skipping candidate."
			);

			return (index, None);
		},
	};
	let thumbnail = match image_store.retrieve_thumbnail(image_cfg, &record.image_ref).await {
		Ok(bytes) => bytes,
		Err(err) => {
			warn!(
				object_id = %record.object_id,
				error = %err,
				"Thumbnail retrieval failed; skipping candidate."
			);

			return (index, None);
		},
	};
	let object_name = match resolve_language.as_deref() {
		Some(language) => resolved_name(&record, language, translations, scope)
			.await
			.unwrap_or_else(|| record.object_name_en.clone()),
		None => record.object_name_en.clone(),
	};
	let item = PoolItem {
		object_id: record.object_id,
		image_hash: record.image_hash,
		object_name,
		image_base64: STANDARD.encode(&image),
		thumbnail_base64: STANDARD.encode(&thumbnail),
		metadata: record.metadata,
		popularity_stars: record.votes_summary.fair_star_rating,
		total_net_votes: record.votes_summary.total_net_votes,
		total_vote_count_human: votes::format_vote_count(record.votes_summary.total_vote_count),
		languages_translated,
		untranslated_languages,
		org_id: record.org_id,
	};

	(index, Some(item))
}

/// Fetches the approved translation the summary promised. A summary that is
/// ahead of the translation rows falls back to the English name.
async fn resolved_name(
	record: &ObjectRecord,
	language: &str,
	translations: Arc<dyn Collection<TranslationRecord>>,
	scope: TenantScope,
) -> Option<String> {
	let translations = TenantCollection::strict(translations, scope);
	let filter = Filter::And(vec![
		Filter::eq(fields::OBJECT_ID, record.object_id.to_string()),
		Filter::eq(fields::REQUESTED_LANGUAGE, language),
		Filter::eq(fields::TRANSLATION_STATUS, TranslationStatus::Approved.as_str()),
	]);

	match translations.find_one(filter).await {
		Ok(Some(translation)) => Some(translation.object_name),
		Ok(None) => {
			warn!(
				object_id = %record.object_id,
				language,
				"Summary lists a language with no approved translation; using the English name."
			);

			None
		},
		Err(err) => {
			warn!(
				object_id = %record.object_id,
				language,
				error = %err,
				"Translation lookup failed; using the English name."
			);

			None
		},
	}
}
