use glossa_domain::{
	gap::{self, LanguageSet, TranslationSummary},
	language::{self, QueryLanguage, SimilarityThresholds},
};

fn search_config() -> glossa_config::Search {
	toml::from_str::<toml::Value>(
		r#"
		english_sim_threshold = 0.82
		foreign_sim_threshold = 0.70
		fuzzy_relax = 0.9
		oversample_factor = 4
		fuzzy_prefix_len = 3
		fuzzy_scan_cap = 200
		vector_weight = 2.0
		text_weight = 1.0
		strategy_timeout_ms = 4000
		"#,
	)
	.expect("search config must parse")
	.try_into()
	.expect("search config must deserialize")
}

fn summary(global: &[&str], orgs: &[(&str, &[&str])]) -> TranslationSummary {
	TranslationSummary {
		global: LanguageSet {
			translated_languages: global.iter().map(|s| s.to_string()).collect(),
		},
		orgs: orgs
			.iter()
			.map(|(org, languages)| {
				(
					org.to_string(),
					LanguageSet {
						translated_languages: languages.iter().map(|s| s.to_string()).collect(),
					},
				)
			})
			.collect(),
	}
}

fn languages(values: &[&str]) -> Vec<String> {
	values.iter().map(|s| s.to_string()).collect()
}

#[test]
fn plain_english_classifies_as_english() {
	assert_eq!(language::classify_query("a red apple on a table"), QueryLanguage::English);
}

#[test]
fn confident_foreign_text_classifies_as_foreign() {
	let query = "una manzana roja madura sobre la mesa de madera en la cocina";

	assert_eq!(language::classify_query(query), QueryLanguage::Foreign);
}

#[test]
fn detection_failure_defaults_to_english() {
	assert_eq!(language::classify_query("12345 !!!"), QueryLanguage::English);
}

#[test]
fn thresholds_follow_classification() {
	let cfg = search_config();
	let english = SimilarityThresholds::select(&cfg, QueryLanguage::English);
	let foreign = SimilarityThresholds::select(&cfg, QueryLanguage::Foreign);

	assert!(english.vector > foreign.vector);
	assert!((english.fuzzy - english.vector * 0.9).abs() < 1e-6);
	assert!((foreign.fuzzy - foreign.vector * 0.9).abs() < 1e-6);
}

#[test]
fn normalize_query_applies_nfkc_and_lowercases() {
	assert_eq!(language::normalize_query("  Ｆｕｌｌ Apple  "), "full apple");
}

#[test]
fn gap_uses_global_scope_for_anonymous_users() {
	let summary = summary(&["English", "Hindi"], &[("acme", &["French"])]);
	let allowed = languages(&["Hindi", "French"]);

	assert_eq!(gap::untranslated_languages(&summary, None, &allowed), languages(&["French"]));
}

#[test]
fn gap_uses_org_scope_for_org_users() {
	let summary = summary(&["English", "Hindi"], &[("acme", &["French"])]);
	let allowed = languages(&["Hindi", "French"]);

	assert_eq!(
		gap::untranslated_languages(&summary, Some("acme"), &allowed),
		languages(&["Hindi"]),
	);
}

#[test]
fn unknown_org_scope_has_everything_untranslated() {
	let summary = summary(&["English"], &[]);
	let allowed = languages(&["English", "Tamil"]);

	assert_eq!(
		gap::untranslated_languages(&summary, Some("zenith"), &allowed),
		languages(&["English", "Tamil"]),
	);
}

#[test]
fn fully_translated_scope_is_detected() {
	let summary = summary(&["English", "Hindi"], &[]);

	assert!(gap::is_fully_translated(&summary, None, &languages(&["English", "Hindi"])));
	assert!(!gap::is_fully_translated(&summary, None, &languages(&["English", "Tamil"])));
}

#[test]
fn adding_a_language_never_grows_the_gap() {
	let allowed = languages(&["English", "Hindi", "Tamil"]);
	let before = summary(&["English"], &[]);
	let mut after = before.clone();

	after.global.translated_languages.push("Hindi".to_string());

	let gap_before = gap::untranslated_languages(&before, None, &allowed);
	let gap_after = gap::untranslated_languages(&after, None, &allowed);

	assert!(gap_after.len() <= gap_before.len());
	assert!(gap_after.iter().all(|language| gap_before.contains(language)));
}
