use std::{collections::HashMap, marker::PhantomData, sync::Arc};

use qdrant_client::client::Payload;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use sqlx::{PgPool, Postgres, QueryBuilder, postgres::PgPoolOptions, types::Json};
use uuid::Uuid;

use crate::{
	Error, Result,
	collection::{BoxFuture, Collection, FindQuery, Scored},
	filter::{self, Filter, SortOrder, Update},
	models::{ObjectRecord, TranslationRecord, fields},
	pipeline::{self, Pipeline, Stage},
	schema,
	vector::{QdrantIndex, to_qdrant_filter},
};

/// Production document store: JSONB rows in Postgres plus a Qdrant index for
/// the object embeddings.
pub struct CatalogStore {
	pub pool: PgPool,
	pub vectors: Arc<QdrantIndex>,
}
impl CatalogStore {
	pub async fn connect(cfg: &glossa_config::Storage) -> Result<Self> {
		let pool = PgPoolOptions::new()
			.max_connections(cfg.postgres.pool_max_conns)
			.connect(&cfg.postgres.dsn)
			.await?;
		let vectors = Arc::new(QdrantIndex::new(&cfg.qdrant)?);

		Ok(Self { pool, vectors })
	}

	pub async fn ensure_schema(&self) -> Result<()> {
		let lock_id: i64 = 7_220_115;
		// Advisory locks are held per connection. A single transaction scopes
		// the lock to one connection and releases it when the transaction ends.
		let mut tx = self.pool.begin().await?;

		sqlx::query("SELECT pg_advisory_xact_lock($1)").bind(lock_id).execute(&mut *tx).await?;

		for statement in schema::render_schema().split(';') {
			let trimmed = statement.trim();

			if trimmed.is_empty() {
				continue;
			}

			sqlx::query(trimmed).execute(&mut *tx).await?;
		}

		tx.commit().await?;

		self.vectors.ensure_collection().await?;

		Ok(())
	}

	pub fn objects(&self) -> Arc<dyn Collection<ObjectRecord>> {
		Arc::new(JsonCollection::<ObjectRecord>::new(
			self.pool.clone(),
			"objects",
			fields::OBJECT_ID,
			Some(self.vectors.clone()),
		))
	}

	pub fn translations(&self) -> Arc<dyn Collection<TranslationRecord>> {
		Arc::new(JsonCollection::<TranslationRecord>::new(
			self.pool.clone(),
			"translations",
			fields::TRANSLATION_ID,
			None,
		))
	}
}

/// One JSONB-backed table exposed through the `Collection` contract. The id
/// column mirrors the named document id field so vector hits can be hydrated
/// back into full documents.
pub struct JsonCollection<D> {
	pool: PgPool,
	table: &'static str,
	id_field: &'static str,
	vectors: Option<Arc<QdrantIndex>>,
	_marker: PhantomData<fn() -> D>,
}
impl<D> JsonCollection<D>
where
	D: Serialize + DeserializeOwned + Send + Sync + Unpin + 'static,
{
	pub fn new(
		pool: PgPool,
		table: &'static str,
		id_field: &'static str,
		vectors: Option<Arc<QdrantIndex>>,
	) -> Self {
		Self { pool, table, id_field, vectors, _marker: PhantomData }
	}

	async fn fetch_docs(&self, query: &FindQuery) -> Result<Vec<D>> {
		let mut builder = QueryBuilder::<Postgres>::new("SELECT doc FROM ");

		builder.push(self.table);
		builder.push(" WHERE ");
		push_predicate(&mut builder, &query.filter);
		push_sort(&mut builder, &query.sort);

		if let Some(skip) = query.skip {
			builder.push(" OFFSET ");
			builder.push_bind(skip as i64);
		}
		if let Some(limit) = query.limit {
			builder.push(" LIMIT ");
			builder.push_bind(limit as i64);
		}

		let rows: Vec<(Json<D>,)> = builder.build_query_as().fetch_all(&self.pool).await?;

		Ok(rows.into_iter().map(|(Json(doc),)| doc).collect())
	}

	async fn sync_vector(&self, doc: &Value) -> Result<()> {
		let Some(vectors) = self.vectors.as_ref() else {
			return Ok(());
		};
		let Some(vector) = doc
			.get("embedding_vector")
			.and_then(Value::as_array)
			.map(|values| values.iter().filter_map(Value::as_f64).map(|v| v as f32).collect::<Vec<_>>())
		else {
			return Ok(());
		};
		let id = doc_id(doc, self.id_field)?;
		let mut payload = Payload::new();

		for field in [fields::ORG_ID, fields::IMAGE_STATUS, fields::IMAGE_HASH] {
			if let Some(value) = doc.get(field).filter(|value| !value.is_null()) {
				payload.insert(field, value.clone());
			}
		}

		vectors.upsert(id, vector, payload).await
	}

	async fn run_vector_stage(
		&self,
		vector: &[f32],
		stage_filter: Option<&Filter>,
		limit: u32,
		oversample: u32,
	) -> Result<Vec<Scored<Value>>> {
		let vectors = self.vectors.as_ref().ok_or_else(|| {
			Error::InvalidArgument(format!("collection {} has no vector index", self.table))
		})?;
		let qdrant_filter = stage_filter.map(to_qdrant_filter).transpose()?;
		let candidate_count = u64::from(limit) * u64::from(oversample.max(1));
		let hits = vectors.search(vector.to_vec(), qdrant_filter, candidate_count).await?;

		if hits.is_empty() {
			return Ok(Vec::new());
		}

		let ids: Vec<Uuid> = hits.iter().map(|(id, _)| *id).collect();
		let mut builder = QueryBuilder::<Postgres>::new("SELECT id, doc FROM ");

		builder.push(self.table);
		builder.push(" WHERE id = ANY(");
		builder.push_bind(ids);
		builder.push(")");

		let rows: Vec<(Uuid, Json<Value>)> =
			builder.build_query_as().fetch_all(&self.pool).await?;
		let mut by_id: HashMap<Uuid, Value> =
			rows.into_iter().map(|(id, Json(doc))| (id, doc)).collect();
		let mut scored = Vec::with_capacity(hits.len());

		for (id, score) in hits {
			// The index is eventually consistent with the rows; a point whose
			// row vanished in between is dropped.
			match by_id.remove(&id) {
				Some(doc) => scored.push(Scored { doc, score }),
				None => tracing::debug!(%id, table = self.table, "Vector hit has no row; dropped."),
			}
		}

		Ok(scored)
	}
}
impl<D> Collection<D> for JsonCollection<D>
where
	D: Serialize + DeserializeOwned + Send + Sync + Unpin + 'static,
{
	fn find<'a>(&'a self, query: FindQuery) -> BoxFuture<'a, Result<Vec<D>>> {
		Box::pin(async move { self.fetch_docs(&query).await })
	}

	fn find_one<'a>(&'a self, filter: Filter) -> BoxFuture<'a, Result<Option<D>>> {
		Box::pin(async move {
			let query = FindQuery::filtered(filter).limited(1);

			Ok(self.fetch_docs(&query).await?.pop())
		})
	}

	fn count<'a>(&'a self, filter: Filter) -> BoxFuture<'a, Result<u64>> {
		Box::pin(async move {
			let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM ");

			builder.push(self.table);
			builder.push(" WHERE ");
			push_predicate(&mut builder, &filter);

			let count: i64 = builder.build_query_scalar().fetch_one(&self.pool).await?;

			Ok(count.max(0) as u64)
		})
	}

	fn insert_one<'a>(&'a self, doc: D) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let doc = serde_json::to_value(&doc)?;
			let id = doc_id(&doc, self.id_field)?;

			sqlx::query(&format!("INSERT INTO {} (id, doc) VALUES ($1, $2)", self.table))
				.bind(id)
				.bind(Json(&doc))
				.execute(&self.pool)
				.await?;

			self.sync_vector(&doc).await
		})
	}

	fn update_one<'a>(&'a self, filter: Filter, update: Update) -> BoxFuture<'a, Result<u64>> {
		Box::pin(async move {
			let mut builder = QueryBuilder::<Postgres>::new("SELECT id, doc FROM ");

			builder.push(self.table);
			builder.push(" WHERE ");
			push_predicate(&mut builder, &filter);
			builder.push(" LIMIT 1");

			let matched: Option<(Uuid, Json<Value>)> =
				builder.build_query_as().fetch_optional(&self.pool).await?;

			if let Some((id, Json(mut doc))) = matched {
				update.apply_to(&mut doc);

				sqlx::query(&format!("UPDATE {} SET doc = $1 WHERE id = $2", self.table))
					.bind(Json(&doc))
					.bind(id)
					.execute(&self.pool)
					.await?;

				self.sync_vector(&doc).await?;

				return Ok(1);
			}

			if update.upsert {
				let mut doc = update.build_insert_doc();

				if doc_id(&doc, self.id_field).is_err() {
					filter::set_at_path(&mut doc, self.id_field, Uuid::new_v4().to_string().into());
				}

				let id = doc_id(&doc, self.id_field)?;

				sqlx::query(&format!("INSERT INTO {} (id, doc) VALUES ($1, $2)", self.table))
					.bind(id)
					.bind(Json(&doc))
					.execute(&self.pool)
					.await?;

				self.sync_vector(&doc).await?;
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
			let mut builder = QueryBuilder::<Postgres>::new(
				"SELECT doc, ts_rank(to_tsvector('english', COALESCE(doc->>'embedding_text', '')), plainto_tsquery('english', ",
			);

			builder.push_bind(query);
			builder.push(
				"))::real AS score FROM ",
			);
			builder.push(self.table);
			builder.push(
				" WHERE to_tsvector('english', COALESCE(doc->>'embedding_text', '')) @@ plainto_tsquery('english', ",
			);
			builder.push_bind(query);
			builder.push(") AND (");
			push_predicate(&mut builder, &filter);
			builder.push(") ORDER BY score DESC LIMIT ");
			builder.push_bind(i64::from(limit));

			let rows: Vec<(Json<D>, f32)> = builder.build_query_as().fetch_all(&self.pool).await?;

			Ok(rows.into_iter().map(|(Json(doc), score)| Scored { doc, score }).collect())
		})
	}

	fn aggregate<'a>(&'a self, pipeline: Pipeline) -> BoxFuture<'a, Result<Vec<Scored<D>>>> {
		Box::pin(async move {
			match pipeline.stages.split_first() {
				Some((Stage::VectorSearch { vector, filter, limit, oversample }, rest)) => {
					let mut scored = self
						.run_vector_stage(vector, filter.as_ref(), *limit, *oversample)
						.await?;

					pipeline::apply_stages(&mut scored, rest)?;

					let mut out = Vec::with_capacity(scored.len());

					for Scored { doc, score } in scored {
						out.push(Scored { doc: serde_json::from_value(doc)?, score });
					}

					Ok(out)
				},
				_ => {
					let query = pipeline::plan_find(&pipeline)?;
					let docs = self.fetch_docs(&query).await?;

					Ok(docs.into_iter().map(|doc| Scored { doc, score: 0.0 }).collect())
				},
			}
		})
	}
}

fn doc_id(doc: &Value, id_field: &str) -> Result<Uuid> {
	doc.get(id_field)
		.and_then(Value::as_str)
		.ok_or_else(|| Error::InvalidArgument(format!("document carries no {id_field}")))?
		.parse::<Uuid>()
		.map_err(|_| Error::InvalidArgument(format!("{id_field} is not a uuid")))
}

fn path_segments(path: &str) -> Vec<String> {
	path.split('.').map(str::to_string).collect()
}

fn like_pattern(value: &str) -> String {
	let escaped = value.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");

	format!("%{escaped}%")
}

/// Renders the typed filter as one self-contained SQL predicate. Every leaf
/// is COALESCEd to FALSE so `NOT` over an absent path matches, mirroring the
/// in-memory semantics.
fn push_predicate(builder: &mut QueryBuilder<'_, Postgres>, filter: &Filter) {
	match filter {
		Filter::All => {
			builder.push("TRUE");
		},
		Filter::And(nodes) => push_group(builder, nodes, " AND ", "TRUE"),
		Filter::Or(nodes) => push_group(builder, nodes, " OR ", "FALSE"),
		Filter::Not(node) => {
			builder.push("NOT (");
			push_predicate(builder, node);
			builder.push(")");
		},
		Filter::Eq { field, value } => {
			builder.push("COALESCE(doc #> ");
			builder.push_bind(path_segments(field));
			builder.push(" = ");
			builder.push_bind(Json(value.clone()));
			builder.push(", FALSE)");
		},
		Filter::In { field, values } => {
			if values.is_empty() {
				builder.push("FALSE");

				return;
			}

			builder.push("COALESCE(doc #> ");
			builder.push_bind(path_segments(field));
			builder.push(" = ANY(ARRAY[");

			for (index, value) in values.iter().enumerate() {
				if index > 0 {
					builder.push(", ");
				}

				builder.push_bind(Json(value.clone()));
			}

			builder.push("]), FALSE)");
		},
		Filter::Contains { field, value } => {
			builder.push("COALESCE(doc #> ");
			builder.push_bind(path_segments(field));
			builder.push(" @> ");
			builder.push_bind(Json(value.clone()));
			builder.push(", FALSE)");
		},
		Filter::ContainsText { field, value } => {
			builder.push("COALESCE(doc #>> ");
			builder.push_bind(path_segments(field));
			builder.push(" ILIKE ");
			builder.push_bind(like_pattern(value));
			builder.push(", FALSE)");
		},
		Filter::Exists { field } => {
			builder.push("(doc #> ");
			builder.push_bind(path_segments(field));
			builder.push(" IS NOT NULL AND doc #> ");
			builder.push_bind(path_segments(field));
			builder.push(" <> 'null'::jsonb)");
		},
		Filter::Missing { field } => {
			builder.push("(doc #> ");
			builder.push_bind(path_segments(field));
			builder.push(" IS NULL OR doc #> ");
			builder.push_bind(path_segments(field));
			builder.push(" = 'null'::jsonb)");
		},
		Filter::Gt { field, value } => push_comparison(builder, field, value, " > "),
		Filter::Gte { field, value } => push_comparison(builder, field, value, " >= "),
		Filter::Lt { field, value } => push_comparison(builder, field, value, " < "),
		Filter::Lte { field, value } => push_comparison(builder, field, value, " <= "),
	}
}

fn push_group(
	builder: &mut QueryBuilder<'_, Postgres>,
	nodes: &[Filter],
	joiner: &str,
	empty: &str,
) {
	if nodes.is_empty() {
		builder.push(empty);

		return;
	}

	builder.push("(");

	for (index, node) in nodes.iter().enumerate() {
		if index > 0 {
			builder.push(joiner);
		}

		push_predicate(builder, node);
	}

	builder.push(")");
}

fn push_comparison(
	builder: &mut QueryBuilder<'_, Postgres>,
	field: &str,
	value: &Value,
	operator: &str,
) {
	builder.push("COALESCE(doc #> ");
	builder.push_bind(path_segments(field));
	builder.push(operator);
	builder.push_bind(Json(value.clone()));
	builder.push(", FALSE)");
}

fn push_sort(builder: &mut QueryBuilder<'_, Postgres>, sort: &[(String, SortOrder)]) {
	if sort.is_empty() {
		return;
	}

	builder.push(" ORDER BY ");

	for (index, (path, order)) in sort.iter().enumerate() {
		if index > 0 {
			builder.push(", ");
		}

		builder.push("doc #> ");
		builder.push_bind(path_segments(path));
		builder.push(match order {
			SortOrder::Asc => " ASC NULLS LAST",
			SortOrder::Desc => " DESC NULLS LAST",
		});
	}
}
