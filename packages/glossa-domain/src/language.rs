use unicode_normalization::UnicodeNormalization;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryLanguage {
	English,
	Foreign,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimilarityThresholds {
	pub vector: f32,
	pub fuzzy: f32,
}
impl SimilarityThresholds {
	pub fn select(cfg: &glossa_config::Search, language: QueryLanguage) -> Self {
		let vector = match language {
			QueryLanguage::English => cfg.english_sim_threshold,
			QueryLanguage::Foreign => cfg.foreign_sim_threshold,
		};

		Self { vector, fuzzy: vector * cfg.fuzzy_relax }
	}
}

pub fn normalize_query(query: &str) -> String {
	query.nfkc().collect::<String>().trim().to_lowercase()
}

/// Best-effort classification. Anything the detector cannot call with
/// confidence is treated as English.
pub fn classify_query(query: &str) -> QueryLanguage {
	let Some(info) = whatlang::detect(query) else {
		return QueryLanguage::English;
	};

	if !info.is_reliable() {
		return QueryLanguage::English;
	}
	if info.lang() == whatlang::Lang::Eng {
		return QueryLanguage::English;
	}

	QueryLanguage::Foreign
}
