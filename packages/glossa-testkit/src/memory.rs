use std::{marker::PhantomData, sync::Mutex};

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use uuid::Uuid;

use glossa_store::{
	Result,
	collection::{BoxFuture, Collection, FindQuery, Scored},
	filter::{self, Filter, Update},
	pipeline::{self, Pipeline, Stage},
};

/// Deterministic in-process stand-in for the document store. Filters run
/// through the typed expression's own evaluation, text relevance is plain
/// query-token frequency, and vector scores are exact cosine similarity over
/// the document's embedding field.
pub struct MemoryCollection<D> {
	docs: Mutex<Vec<Value>>,
	id_field: &'static str,
	_marker: PhantomData<fn() -> D>,
}
impl<D> MemoryCollection<D>
where
	D: Serialize + DeserializeOwned + Send + Sync + 'static,
{
	pub fn new(id_field: &'static str) -> Self {
		Self { docs: Mutex::new(Vec::new()), id_field, _marker: PhantomData }
	}

	pub fn with_records(id_field: &'static str, records: Vec<D>) -> Self {
		let docs = records
			.into_iter()
			.map(|record| serde_json::to_value(record).expect("record must serialize"))
			.collect();

		Self { docs: Mutex::new(docs), id_field, _marker: PhantomData }
	}

	pub fn len(&self) -> usize {
		self.docs.lock().unwrap_or_else(|err| err.into_inner()).len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn snapshot(&self, filter: &Filter) -> Vec<Value> {
		self.docs.lock().unwrap_or_else(|err| err.into_inner()).iter().filter(|doc| filter.evaluate(doc)).cloned().collect()
	}
}
impl<D> Collection<D> for MemoryCollection<D>
where
	D: Serialize + DeserializeOwned + Send + Sync + 'static,
{
	fn find<'a>(&'a self, query: FindQuery) -> BoxFuture<'a, Result<Vec<D>>> {
		Box::pin(async move {
			let mut docs = self.snapshot(&query.filter);

			if !query.sort.is_empty() {
				docs.sort_by(|a, b| filter::compare_documents(a, b, &query.sort));
			}

			let skip = query.skip.unwrap_or(0) as usize;
			let docs: Vec<Value> = docs
				.into_iter()
				.skip(skip)
				.take(query.limit.map(|limit| limit as usize).unwrap_or(usize::MAX))
				.collect();
			let mut out = Vec::with_capacity(docs.len());

			for doc in docs {
				out.push(serde_json::from_value(doc)?);
			}

			Ok(out)
		})
	}

	fn find_one<'a>(&'a self, filter: Filter) -> BoxFuture<'a, Result<Option<D>>> {
		Box::pin(async move {
			match self.snapshot(&filter).into_iter().next() {
				Some(doc) => Ok(Some(serde_json::from_value(doc)?)),
				None => Ok(None),
			}
		})
	}

	fn count<'a>(&'a self, filter: Filter) -> BoxFuture<'a, Result<u64>> {
		Box::pin(async move { Ok(self.snapshot(&filter).len() as u64) })
	}

	fn insert_one<'a>(&'a self, doc: D) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let doc = serde_json::to_value(&doc)?;

			self.docs.lock().unwrap_or_else(|err| err.into_inner()).push(doc);

			Ok(())
		})
	}

	fn update_one<'a>(&'a self, filter: Filter, update: Update) -> BoxFuture<'a, Result<u64>> {
		Box::pin(async move {
			let mut docs = self.docs.lock().unwrap_or_else(|err| err.into_inner());

			if let Some(doc) = docs.iter_mut().find(|doc| filter.evaluate(doc)) {
				update.apply_to(doc);

				return Ok(1);
			}

			if update.upsert {
				let mut doc = update.build_insert_doc();

				if filter::value_at_path(&doc, self.id_field).is_none() {
					filter::set_at_path(
						&mut doc,
						self.id_field,
						Uuid::new_v4().to_string().into(),
					);
				}

				docs.push(doc);
			}

			Ok(0)
		})
	}

	fn text_search<'a>(
		&'a self,
		query: &'a str,
		filter: Filter,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<Scored<D>>>> {
		Box::pin(async move {
			let query_tokens: Vec<String> =
				query.split_whitespace().map(str::to_lowercase).collect();
			let mut scored: Vec<Scored<Value>> = self
				.snapshot(&filter)
				.into_iter()
				.filter_map(|doc| {
					let score = text_score(&doc, &query_tokens);

					(score > 0.0).then_some(Scored { doc, score })
				})
				.collect();

			scored.sort_by(|a, b| {
				b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal)
			});
			scored.truncate(limit as usize);

			let mut out = Vec::with_capacity(scored.len());

			for Scored { doc, score } in scored {
				out.push(Scored { doc: serde_json::from_value(doc)?, score });
			}

			Ok(out)
		})
	}

	fn aggregate<'a>(&'a self, pipeline: Pipeline) -> BoxFuture<'a, Result<Vec<Scored<D>>>> {
		Box::pin(async move {
			match pipeline.stages.split_first() {
				Some((Stage::VectorSearch { vector, filter, limit, oversample }, rest)) => {
					let visible =
						self.snapshot(filter.as_ref().unwrap_or(&Filter::All));
					let mut scored: Vec<Scored<Value>> = visible
						.into_iter()
						.filter_map(|doc| {
							let score = cosine_score(&doc, vector)?;

							Some(Scored { doc, score })
						})
						.collect();

					scored.sort_by(|a, b| {
						b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal)
					});
					scored.truncate((*limit as usize) * (*oversample as usize).max(1));

					pipeline::apply_stages(&mut scored, rest)?;

					let mut out = Vec::with_capacity(scored.len());

					for Scored { doc, score } in scored {
						out.push(Scored { doc: serde_json::from_value(doc)?, score });
					}

					Ok(out)
				},
				_ => {
					let query = pipeline::plan_find(&pipeline)?;
					let docs = self.find(query).await?;

					Ok(docs.into_iter().map(|doc| Scored { doc, score: 0.0 }).collect())
				},
			}
		})
	}
}

fn text_score(doc: &Value, query_tokens: &[String]) -> f32 {
	let Some(text) = filter::value_at_path(doc, "embedding_text").and_then(Value::as_str) else {
		return 0.0;
	};
	let doc_tokens: Vec<String> = text.split_whitespace().map(str::to_lowercase).collect();

	if doc_tokens.is_empty() || query_tokens.is_empty() {
		return 0.0;
	}

	let matched = doc_tokens
		.iter()
		.filter(|token| query_tokens.iter().any(|query| query == *token))
		.count();

	matched as f32 / doc_tokens.len() as f32
}

fn cosine_score(doc: &Value, query: &[f32]) -> Option<f32> {
	let vector: Vec<f32> = filter::value_at_path(doc, "embedding_vector")?
		.as_array()?
		.iter()
		.filter_map(Value::as_f64)
		.map(|v| v as f32)
		.collect();

	if vector.len() != query.len() || vector.is_empty() {
		return None;
	}

	let dot: f32 = vector.iter().zip(query).map(|(a, b)| a * b).sum();
	let norm_a: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
	let norm_b: f32 = query.iter().map(|v| v * v).sum::<f32>().sqrt();

	if norm_a == 0.0 || norm_b == 0.0 {
		return None;
	}

	Some(dot / (norm_a * norm_b))
}
