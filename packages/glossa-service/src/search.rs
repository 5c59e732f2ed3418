use std::{collections::HashMap, time::Duration};

use tracing::warn;

use glossa_domain::{
	fuzzy,
	language::{self, SimilarityThresholds},
};
use glossa_store::{
	collection::{Collection, FindQuery, Scored},
	filter::Filter,
	models::{ObjectRecord, fields},
	pipeline::{Pipeline, Stage},
	tenant::{TenantCollection, TenantScope},
};

use crate::{GlossaService, ServiceResult, approved_objects};

/// One deduplicated search hit with its accumulated cross-strategy score.
#[derive(Clone, Debug)]
pub(crate) struct Candidate {
	pub(crate) record: ObjectRecord,
	pub(crate) score: f32,
}

pub(crate) struct SearchArgs<'a> {
	pub(crate) scope: &'a TenantScope,
	pub(crate) query: &'a str,
	pub(crate) limit: usize,
	pub(crate) skip: usize,
	pub(crate) use_vector: bool,
}

pub(crate) struct SearchOutcome {
	pub(crate) candidates: Vec<Candidate>,
	pub(crate) total: u64,
	pub(crate) has_more: bool,
}

impl GlossaService {
	/// Fuses vector, lexical, and (when the window is still short) fuzzy
	/// retrieval into one ranked, deduplicated slice. Any single strategy's
	/// failure degrades to whatever the others found.
	pub(crate) async fn hybrid_search(
		&self,
		args: SearchArgs<'_>,
	) -> ServiceResult<SearchOutcome> {
		let SearchArgs { scope, query, limit, skip, use_vector } = args;
		let normalized = language::normalize_query(query);
		let thresholds =
			SimilarityThresholds::select(&self.cfg.search, language::classify_query(query));
		let window = (skip + limit).max(1);
		let objects = self.scoped_objects(scope);
		let timeout = Duration::from_millis(self.cfg.search.strategy_timeout_ms);

		let (vector_hits, text_hits) = tokio::join!(
			self.vector_strategy(&objects, query, window, thresholds.vector, use_vector, timeout),
			self.text_strategy(&objects, query, window, timeout),
		);

		let mut merged: HashMap<String, Candidate> = HashMap::new();

		merge_candidates(&mut merged, vector_hits, self.cfg.search.vector_weight);
		merge_candidates(&mut merged, text_hits, self.cfg.search.text_weight);

		if merged.len() < window {
			let fuzzy_hits =
				self.fuzzy_strategy(&objects, &normalized, thresholds.fuzzy, timeout).await;

			merge_candidates(&mut merged, fuzzy_hits, self.cfg.search.text_weight);
		}

		let total = merged.len() as u64;
		let mut candidates: Vec<Candidate> = merged.into_values().collect();

		candidates.sort_by(|a, b| {
			b.score
				.partial_cmp(&a.score)
				.unwrap_or(std::cmp::Ordering::Equal)
				.then_with(|| b.record.object_id.cmp(&a.record.object_id))
		});

		let candidates: Vec<Candidate> =
			candidates.into_iter().skip(skip).take(limit).collect();
		let has_more = candidates.len() == limit;

		Ok(SearchOutcome { candidates, total, has_more })
	}

	async fn vector_strategy(
		&self,
		objects: &TenantCollection<ObjectRecord>,
		query: &str,
		window: usize,
		threshold: f32,
		use_vector: bool,
		timeout: Duration,
	) -> Vec<Scored<ObjectRecord>> {
		if !use_vector {
			return Vec::new();
		}

		let texts = [query.to_string()];
		let embedded = match tokio::time::timeout(
			timeout,
			self.providers.embedding.embed(&self.cfg.providers.embedding, &texts),
		)
		.await
		{
			Ok(Ok(embedded)) => embedded,
			Ok(Err(err)) => {
				warn!(error = %err, "Embedding provider failed; skipping vector strategy.");

				return Vec::new();
			},
			Err(_) => {
				warn!("Embedding provider timed out; skipping vector strategy.");

				return Vec::new();
			},
		};
		let Some(vector) = embedded.into_iter().next() else {
			warn!("Embedding provider returned no vectors; skipping vector strategy.");

			return Vec::new();
		};

		if vector.len() != self.cfg.providers.embedding.dimensions as usize {
			warn!("Embedding vector dimension mismatch; skipping vector strategy.");

			return Vec::new();
		}

		let pipeline = Pipeline::new(vec![Stage::VectorSearch {
			vector,
			filter: Some(approved_objects()),
			limit: window as u32,
			oversample: self.cfg.search.oversample_factor,
		}]);

		match tokio::time::timeout(timeout, objects.aggregate(pipeline)).await {
			Ok(Ok(mut scored)) => {
				scored.retain(|hit| hit.score >= threshold);

				scored
			},
			Ok(Err(err)) => {
				warn!(error = %err, "Vector search failed; degrading to other strategies.");

				Vec::new()
			},
			Err(_) => {
				warn!("Vector search timed out; degrading to other strategies.");

				Vec::new()
			},
		}
	}

	async fn text_strategy(
		&self,
		objects: &TenantCollection<ObjectRecord>,
		query: &str,
		window: usize,
		timeout: Duration,
	) -> Vec<Scored<ObjectRecord>> {
		match tokio::time::timeout(
			timeout,
			objects.text_search(query, approved_objects(), window as u32),
		)
		.await
		{
			Ok(Ok(scored)) => scored,
			Ok(Err(err)) => {
				warn!(error = %err, "Text search failed; degrading to other strategies.");

				Vec::new()
			},
			Err(_) => {
				warn!("Text search timed out; degrading to other strategies.");

				Vec::new()
			},
		}
	}

	/// Bounded approximate pass: a cheap substring prefilter on a short
	/// query prefix caps the scan, then surviving records are scored by
	/// their best token-level fuzzy ratio.
	async fn fuzzy_strategy(
		&self,
		objects: &TenantCollection<ObjectRecord>,
		normalized_query: &str,
		threshold: f32,
		timeout: Duration,
	) -> Vec<Scored<ObjectRecord>> {
		let prefix: String =
			normalized_query.chars().take(self.cfg.search.fuzzy_prefix_len).collect();

		if prefix.trim().is_empty() {
			return Vec::new();
		}

		let query = FindQuery::filtered(Filter::And(vec![
			approved_objects(),
			Filter::contains_text(fields::EMBEDDING_TEXT, prefix),
		]))
		.limited(u64::from(self.cfg.search.fuzzy_scan_cap));
		let records = match tokio::time::timeout(timeout, objects.find(query)).await {
			Ok(Ok(records)) => records,
			Ok(Err(err)) => {
				warn!(error = %err, "Fuzzy prefilter failed; degrading to other strategies.");

				return Vec::new();
			},
			Err(_) => {
				warn!("Fuzzy prefilter timed out; degrading to other strategies.");

				return Vec::new();
			},
		};
		let mut scored = Vec::new();

		for record in records {
			let text = record
				.embedding_text
				.clone()
				.unwrap_or_else(|| record.object_name_en.to_lowercase());
			let score = fuzzy::best_token_score(&text, normalized_query) as f32;

			if score >= threshold {
				scored.push(Scored { doc: record, score });
			}
		}

		scored
	}
}

/// Folds one strategy's hits into the dedup map. The key prefers the image
/// fingerprint so the same subject found through different records counts
/// once; scores accumulate across strategies, and an org-tagged record
/// replaces a colliding global one.
pub(crate) fn merge_candidates(
	merged: &mut HashMap<String, Candidate>,
	hits: Vec<Scored<ObjectRecord>>,
	weight: f32,
) {
	for Scored { doc, score } in hits {
		let key = if doc.image_hash.is_empty() {
			doc.object_id.to_string()
		} else {
			doc.image_hash.clone()
		};
		let weighted = score * weight;

		match merged.get_mut(&key) {
			Some(existing) => {
				existing.score += weighted;

				if existing.record.org_id.is_none() && doc.org_id.is_some() {
					existing.record = doc;
				}
			},
			None => {
				merged.insert(key, Candidate { record: doc, score: weighted });
			},
		}
	}
}
