use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Denormalized per-object record of which languages already carry an
/// approved translation, split by visibility scope. Gap detection reads this
/// instead of scanning the translation collection at discovery time.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TranslationSummary {
	#[serde(default)]
	pub global: LanguageSet,
	#[serde(default)]
	pub orgs: HashMap<String, LanguageSet>,
}
impl TranslationSummary {
	pub fn translated_for_scope(&self, org_id: Option<&str>) -> &[String] {
		match org_id {
			Some(org_id) => self
				.orgs
				.get(org_id)
				.map(|set| set.translated_languages.as_slice())
				.unwrap_or_default(),
			None => self.global.translated_languages.as_slice(),
		}
	}
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LanguageSet {
	#[serde(default)]
	pub translated_languages: Vec<String>,
}

/// The user's allowed languages that the object still lacks in the user's
/// scope, in the order the user listed them.
pub fn untranslated_languages(
	summary: &TranslationSummary,
	org_id: Option<&str>,
	languages_allowed: &[String],
) -> Vec<String> {
	let translated = summary.translated_for_scope(org_id);

	languages_allowed
		.iter()
		.filter(|language| !translated.iter().any(|translated| translated == *language))
		.cloned()
		.collect()
}

pub fn is_fully_translated(
	summary: &TranslationSummary,
	org_id: Option<&str>,
	languages_allowed: &[String],
) -> bool {
	untranslated_languages(summary, org_id, languages_allowed).is_empty()
}
