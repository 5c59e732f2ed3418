use std::{future::Future, pin::Pin};

use crate::{
	Result,
	filter::{Filter, SortOrder, Update},
	pipeline::Pipeline,
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Clone, Debug, PartialEq)]
pub struct Scored<T> {
	pub doc: T,
	pub score: f32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FindQuery {
	pub filter: Filter,
	pub sort: Vec<(String, SortOrder)>,
	pub skip: Option<u64>,
	pub limit: Option<u64>,
}
impl FindQuery {
	pub fn filtered(filter: Filter) -> Self {
		Self { filter, ..Self::default() }
	}

	pub fn sorted(mut self, sort: Vec<(String, SortOrder)>) -> Self {
		self.sort = sort;

		self
	}

	pub fn limited(mut self, limit: u64) -> Self {
		self.limit = Some(limit);

		self
	}
}

/// Documents that carry the tenancy attribute. The write path stamps it on
/// insert; absence marks a globally-shared record.
pub trait OrgScoped {
	fn org_id(&self) -> Option<&str>;
	fn assign_org(&mut self, org_id: String);
}

/// A single document collection. Backends: Postgres+Qdrant in production,
/// the testkit's in-memory store under test. Find/count/update take typed
/// filters; `text_search` exposes the store's native relevance score;
/// `aggregate` runs a staged pipeline whose first stage may be a vector
/// similarity search.
pub trait Collection<D>
where
	Self: Send + Sync,
{
	fn find<'a>(&'a self, query: FindQuery) -> BoxFuture<'a, Result<Vec<D>>>;

	fn find_one<'a>(&'a self, filter: Filter) -> BoxFuture<'a, Result<Option<D>>>;

	fn count<'a>(&'a self, filter: Filter) -> BoxFuture<'a, Result<u64>>;

	fn insert_one<'a>(&'a self, doc: D) -> BoxFuture<'a, Result<()>>;

	/// Updates the first matching document; with `update.upsert`, inserts
	/// the `set` + `set_on_insert` document when nothing matched. Returns
	/// the matched count.
	fn update_one<'a>(&'a self, filter: Filter, update: Update) -> BoxFuture<'a, Result<u64>>;

	fn text_search<'a>(
		&'a self,
		query: &'a str,
		filter: Filter,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<Scored<D>>>>;

	fn aggregate<'a>(&'a self, pipeline: Pipeline) -> BoxFuture<'a, Result<Vec<Scored<D>>>>;
}
