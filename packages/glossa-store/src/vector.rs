use qdrant_client::{
	Qdrant,
	client::Payload,
	qdrant::{
		Condition, CreateCollectionBuilder, Distance, Filter as QdrantFilter, MinShould,
		PointStruct, Query, QueryPointsBuilder, Range, UpsertPointsBuilder, VectorParamsBuilder,
		point_id::PointIdOptions,
	},
};
use serde_json::Value;
use uuid::Uuid;

use crate::{Error, Result, filter::Filter};

/// Approximate-nearest-neighbor index over object embeddings. Point ids are
/// the object ids; the payload mirrors the handful of document fields tenant
/// and visibility filters touch.
pub struct QdrantIndex {
	pub client: Qdrant,
	pub collection: String,
	pub vector_dim: u32,
}
impl QdrantIndex {
	pub fn new(cfg: &glossa_config::Qdrant) -> Result<Self> {
		let client = Qdrant::from_url(&cfg.url).build()?;

		Ok(Self { client, collection: cfg.collection.clone(), vector_dim: cfg.vector_dim })
	}

	pub async fn ensure_collection(&self) -> Result<()> {
		if self.client.collection_exists(self.collection.as_str()).await? {
			return Ok(());
		}

		self.client
			.create_collection(CreateCollectionBuilder::new(self.collection.clone()).vectors_config(
				VectorParamsBuilder::new(u64::from(self.vector_dim), Distance::Cosine),
			))
			.await?;

		Ok(())
	}

	pub async fn upsert(&self, id: Uuid, vector: Vec<f32>, payload: Payload) -> Result<()> {
		let point = PointStruct::new(id.to_string(), vector, payload);

		self.client
			.upsert_points(UpsertPointsBuilder::new(self.collection.clone(), vec![point]))
			.await?;

		Ok(())
	}

	pub async fn search(
		&self,
		vector: Vec<f32>,
		filter: Option<QdrantFilter>,
		limit: u64,
	) -> Result<Vec<(Uuid, f32)>> {
		let mut search = QueryPointsBuilder::new(self.collection.clone())
			.query(Query::new_nearest(vector))
			.limit(limit);

		if let Some(filter) = filter {
			search = search.filter(filter);
		}

		let response = self.client.query(search).await?;
		let mut hits = Vec::with_capacity(response.result.len());

		for point in response.result {
			let Some(PointIdOptions::Uuid(raw)) =
				point.id.and_then(|id| id.point_id_options)
			else {
				continue;
			};
			let Ok(id) = raw.parse::<Uuid>() else {
				continue;
			};

			hits.push((id, point.score));
		}

		Ok(hits)
	}
}

/// Translates the typed filter into qdrant conditions over payload fields.
/// Or-branches become a min-should group, the way a should-of-one filter is
/// expressed on this index.
pub fn to_qdrant_filter(filter: &Filter) -> Result<QdrantFilter> {
	match filter {
		Filter::All => Ok(QdrantFilter::default()),
		Filter::And(nodes) => {
			let mut must = Vec::with_capacity(nodes.len());

			for node in nodes {
				must.push(to_condition(node)?);
			}

			Ok(QdrantFilter { must, ..QdrantFilter::default() })
		},
		other => Ok(QdrantFilter { must: vec![to_condition(other)?], ..QdrantFilter::default() }),
	}
}

fn to_condition(filter: &Filter) -> Result<Condition> {
	match filter {
		Filter::All => Ok(Condition::from(QdrantFilter::default())),
		Filter::And(nodes) => {
			let mut must = Vec::with_capacity(nodes.len());

			for node in nodes {
				must.push(to_condition(node)?);
			}

			Ok(Condition::from(QdrantFilter { must, ..QdrantFilter::default() }))
		},
		Filter::Or(nodes) => {
			let mut conditions = Vec::with_capacity(nodes.len());

			for node in nodes {
				conditions.push(to_condition(node)?);
			}

			Ok(Condition::from(QdrantFilter {
				min_should: Some(MinShould { min_count: 1, conditions }),
				..QdrantFilter::default()
			}))
		},
		Filter::Not(node) => Ok(Condition::from(QdrantFilter {
			must_not: vec![to_condition(node)?],
			..QdrantFilter::default()
		})),
		Filter::Eq { field, value } => match value {
			Value::String(text) => Ok(Condition::matches(field.clone(), text.clone())),
			Value::Bool(flag) => Ok(Condition::matches(field.clone(), *flag)),
			Value::Number(number) if number.is_i64() => Ok(Condition::matches(
				field.clone(),
				number.as_i64().unwrap_or_default(),
			)),
			other => Err(Error::UnsupportedFilter(format!(
				"equality on {other:?} has no payload-index form"
			))),
		},
		Filter::In { field, values } => {
			let mut keywords = Vec::with_capacity(values.len());

			for value in values {
				let Value::String(text) = value else {
					return Err(Error::UnsupportedFilter(
						"membership lists must be strings".to_string(),
					));
				};

				keywords.push(text.clone());
			}

			Ok(Condition::matches(field.clone(), keywords))
		},
		Filter::Contains { field, value } => match value {
			Value::String(text) => Ok(Condition::matches(field.clone(), text.clone())),
			other => Err(Error::UnsupportedFilter(format!(
				"array containment on {other:?} has no payload-index form"
			))),
		},
		Filter::ContainsText { field, .. } => Err(Error::UnsupportedFilter(format!(
			"substring matching on {field} has no payload-index form"
		))),
		Filter::Exists { field } => Ok(Condition::from(QdrantFilter {
			must_not: vec![Condition::is_empty(field.clone())],
			..QdrantFilter::default()
		})),
		Filter::Missing { field } => Ok(Condition::is_empty(field.clone())),
		Filter::Gt { field, value } => range_condition(field, value, |v| Range {
			gt: Some(v),
			..Range::default()
		}),
		Filter::Gte { field, value } => range_condition(field, value, |v| Range {
			gte: Some(v),
			..Range::default()
		}),
		Filter::Lt { field, value } => range_condition(field, value, |v| Range {
			lt: Some(v),
			..Range::default()
		}),
		Filter::Lte { field, value } => range_condition(field, value, |v| Range {
			lte: Some(v),
			..Range::default()
		}),
	}
}

fn range_condition(
	field: &str,
	value: &Value,
	build: impl FnOnce(f64) -> Range,
) -> Result<Condition> {
	let number = value.as_f64().ok_or_else(|| {
		Error::UnsupportedFilter("range comparisons require numeric bounds".to_string())
	})?;

	Ok(Condition::range(field, build(number)))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::models::fields;

	#[test]
	fn or_branches_become_min_should() {
		let filter = Filter::Or(vec![
			Filter::eq(fields::ORG_ID, "acme"),
			Filter::missing(fields::ORG_ID),
		]);
		let translated = to_qdrant_filter(&filter).unwrap();
		let condition = &translated.must[0];
		let Some(qdrant_client::qdrant::condition::ConditionOneOf::Filter(inner)) =
			&condition.condition_one_of
		else {
			panic!("or must translate to a nested filter");
		};

		assert_eq!(inner.min_should.as_ref().unwrap().min_count, 1);
		assert_eq!(inner.min_should.as_ref().unwrap().conditions.len(), 2);
	}

	#[test]
	fn float_equality_is_rejected() {
		let filter = Filter::eq(fields::FAIR_STAR_RATING, 4.5);

		assert!(matches!(to_qdrant_filter(&filter), Err(Error::UnsupportedFilter(_))));
	}
}
