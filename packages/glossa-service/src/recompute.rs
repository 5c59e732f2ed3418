use uuid::Uuid;

use glossa_domain::gap::TranslationSummary;
use glossa_store::{
	collection::{Collection, FindQuery},
	filter::{Filter, Update},
	models::{TranslationStatus, fields},
};

use crate::{GlossaService, ServiceResult};

impl GlossaService {
	/// Rebuilds one object's denormalized translation summary from the
	/// approved translation rows. Runs outside any request scope — the
	/// summary spans every org, so the raw collections are read here on
	/// purpose — and is triggered whenever moderation approves or rejects a
	/// translation.
	pub async fn recompute_translation_summary(&self, object_id: Uuid) -> ServiceResult<()> {
		let translations = self
			.translations
			.find(FindQuery::filtered(Filter::And(vec![
				Filter::eq(fields::OBJECT_ID, object_id.to_string()),
				Filter::eq(fields::TRANSLATION_STATUS, TranslationStatus::Approved.as_str()),
			])))
			.await?;
		let mut summary = TranslationSummary::default();

		for translation in translations {
			let languages = match translation.org_id.as_deref() {
				Some(org_id) =>
					&mut summary.orgs.entry(org_id.to_string()).or_default().translated_languages,
				None => &mut summary.global.translated_languages,
			};

			if !languages.contains(&translation.requested_language) {
				languages.push(translation.requested_language);
			}
		}

		summary.global.translated_languages.sort();

		for set in summary.orgs.values_mut() {
			set.translated_languages.sort();
		}

		let matched = self
			.objects
			.update_one(
				Filter::eq(fields::OBJECT_ID, object_id.to_string()),
				Update::set(fields::TRANSLATION_SUMMARY, serde_json::to_value(&summary)?),
			)
			.await?;

		if matched == 0 {
			tracing::warn!(
				%object_id,
				"Translation summary recompute found no such object; skipping."
			);
		}

		Ok(())
	}
}
