use serde_json::Value;

use crate::{
	Error, Result,
	collection::{FindQuery, Scored},
	filter::{self, Filter, SortOrder},
};

/// One aggregation step. `VectorSearch` is only meaningful as the first
/// stage; vector indexes resolve similarity before anything else can run.
#[derive(Clone, Debug, PartialEq)]
pub enum Stage {
	Match(Filter),
	VectorSearch { vector: Vec<f32>, filter: Option<Filter>, limit: u32, oversample: u32 },
	Sort(Vec<(String, SortOrder)>),
	Skip(u64),
	Limit(u64),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Pipeline {
	pub stages: Vec<Stage>,
}
impl Pipeline {
	pub fn new(stages: Vec<Stage>) -> Self {
		Self { stages }
	}

	pub fn references(&self, field: &str) -> bool {
		self.stages.iter().any(|stage| match stage {
			Stage::Match(filter) => filter.references(field),
			Stage::VectorSearch { filter, .. } =>
				filter.as_ref().is_some_and(|filter| filter.references(field)),
			Stage::Sort(_) | Stage::Skip(_) | Stage::Limit(_) => false,
		})
	}

	pub fn starts_with_vector_search(&self) -> bool {
		matches!(self.stages.first(), Some(Stage::VectorSearch { .. }))
	}
}

/// Folds a pure match/sort/skip/limit pipeline into one find query.
pub fn plan_find(pipeline: &Pipeline) -> Result<FindQuery> {
	let mut query = FindQuery::default();
	let mut filters = Vec::new();

	for stage in &pipeline.stages {
		match stage {
			Stage::Match(filter) => filters.push(filter.clone()),
			Stage::Sort(sort) => query.sort = sort.clone(),
			Stage::Skip(skip) => query.skip = Some(*skip),
			Stage::Limit(limit) => query.limit = Some(*limit),
			Stage::VectorSearch { .. } =>
				return Err(Error::InvalidArgument(
					"vector search is only valid as the first pipeline stage".to_string(),
				)),
		}
	}

	query.filter = match filters.len() {
		0 => Filter::All,
		1 => filters.remove(0),
		_ => Filter::And(filters),
	};

	Ok(query)
}

/// Applies the stages that follow a vector-search head to already-hydrated
/// candidates.
pub fn apply_stages(scored: &mut Vec<Scored<Value>>, stages: &[Stage]) -> Result<()> {
	for stage in stages {
		match stage {
			Stage::Match(filter) => scored.retain(|entry| filter.evaluate(&entry.doc)),
			Stage::Sort(sort) =>
				scored.sort_by(|a, b| filter::compare_documents(&a.doc, &b.doc, sort)),
			Stage::Skip(skip) => {
				let skip = (*skip as usize).min(scored.len());

				scored.drain(..skip);
			},
			Stage::Limit(limit) => scored.truncate(*limit as usize),
			Stage::VectorSearch { .. } =>
				return Err(Error::InvalidArgument(
					"vector search is only valid as the first pipeline stage".to_string(),
				)),
		}
	}

	Ok(())
}
