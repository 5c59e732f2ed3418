use std::sync::Arc;

use crate::{
	Result,
	collection::{BoxFuture, Collection, FindQuery, OrgScoped, Scored},
	filter::{Filter, Update},
	models::fields,
	pipeline::{Pipeline, Stage},
};

/// Read-only ambient request state. Built once per request from the tenant
/// context collaborator and threaded explicitly; never stored process-wide.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TenantScope {
	pub user_id: String,
	pub org_id: Option<String>,
}
impl TenantScope {
	pub fn new(user_id: impl Into<String>, org_id: Option<String>) -> Self {
		Self { user_id: user_id.into(), org_id }
	}

	pub fn org_id(&self) -> Option<&str> {
		self.org_id.as_deref()
	}
}

/// How globally-shared records mix into an org's view.
///
/// `Strict`: org users see their org's records only; anonymous users see
/// no-org records only. `Fallback`: org users additionally see no-org
/// records matching the caller-supplied `public` predicate — the repository
/// itself never hard-codes what counts as publicly visible.
#[derive(Clone, Debug, PartialEq)]
pub enum Visibility {
	Strict,
	Fallback { public: Filter },
}

/// Wraps a collection so every read and write is tenant-safe. A caller
/// filter that already constrains the org attribute anywhere passes through
/// untouched; everything else gets the scope's visibility condition
/// injected. This layer raises no errors of its own.
pub struct TenantCollection<D> {
	inner: Arc<dyn Collection<D>>,
	scope: TenantScope,
	visibility: Visibility,
}
impl<D> TenantCollection<D> {
	pub fn strict(inner: Arc<dyn Collection<D>>, scope: TenantScope) -> Self {
		Self { inner, scope, visibility: Visibility::Strict }
	}

	pub fn fallback(inner: Arc<dyn Collection<D>>, scope: TenantScope, public: Filter) -> Self {
		Self { inner, scope, visibility: Visibility::Fallback { public } }
	}

	pub fn scope(&self) -> &TenantScope {
		&self.scope
	}

	fn tenant_filter(&self) -> Filter {
		match (&self.visibility, self.scope.org_id()) {
			(Visibility::Strict, Some(org_id)) => Filter::eq(fields::ORG_ID, org_id),
			(Visibility::Fallback { public }, Some(org_id)) => Filter::Or(vec![
				Filter::eq(fields::ORG_ID, org_id),
				Filter::And(vec![Filter::missing(fields::ORG_ID), public.clone()]),
			]),
			(_, None) => Filter::missing(fields::ORG_ID),
		}
	}

	fn rewrite(&self, filter: Filter) -> Filter {
		if filter.references(fields::ORG_ID) {
			return filter;
		}
		if filter.is_all() {
			return self.tenant_filter();
		}

		Filter::And(vec![self.tenant_filter(), filter])
	}

	fn rewrite_pipeline(&self, mut pipeline: Pipeline) -> Pipeline {
		if pipeline.references(fields::ORG_ID) {
			return pipeline;
		}

		// Vector indexes require the similarity stage to come first, so the
		// tenant condition moves into that stage's own filter clause.
		if let Some(Stage::VectorSearch { filter, .. }) = pipeline.stages.first_mut() {
			let combined = match filter.take() {
				Some(existing) if !existing.is_all() =>
					Filter::And(vec![self.tenant_filter(), existing]),
				_ => self.tenant_filter(),
			};

			*filter = Some(combined);

			return pipeline;
		}

		pipeline.stages.insert(0, Stage::Match(self.tenant_filter()));

		pipeline
	}

	fn rewrite_update(&self, mut update: Update) -> Update {
		if update.upsert
			&& let Some(org_id) = self.scope.org_id()
			&& !update.touches(fields::ORG_ID)
		{
			update.set_on_insert.push((fields::ORG_ID.to_string(), org_id.into()));
		}

		update
	}
}
impl<D> Collection<D> for TenantCollection<D>
where
	D: OrgScoped + Send + Sync + 'static,
{
	fn find<'a>(&'a self, mut query: FindQuery) -> BoxFuture<'a, Result<Vec<D>>> {
		query.filter = self.rewrite(query.filter);

		self.inner.find(query)
	}

	fn find_one<'a>(&'a self, filter: Filter) -> BoxFuture<'a, Result<Option<D>>> {
		self.inner.find_one(self.rewrite(filter))
	}

	fn count<'a>(&'a self, filter: Filter) -> BoxFuture<'a, Result<u64>> {
		self.inner.count(self.rewrite(filter))
	}

	fn insert_one<'a>(&'a self, mut doc: D) -> BoxFuture<'a, Result<()>> {
		// Stamp the scope's org on new documents, but never overwrite a
		// caller-supplied value.
		if let Some(org_id) = self.scope.org_id()
			&& doc.org_id().is_none()
		{
			doc.assign_org(org_id.to_string());
		}

		self.inner.insert_one(doc)
	}

	fn update_one<'a>(&'a self, filter: Filter, update: Update) -> BoxFuture<'a, Result<u64>> {
		self.inner.update_one(self.rewrite(filter), self.rewrite_update(update))
	}

	fn text_search<'a>(
		&'a self,
		query: &'a str,
		filter: Filter,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<Scored<D>>>> {
		self.inner.text_search(query, self.rewrite(filter), limit)
	}

	fn aggregate<'a>(&'a self, pipeline: Pipeline) -> BoxFuture<'a, Result<Vec<Scored<D>>>> {
		self.inner.aggregate(self.rewrite_pipeline(pipeline))
	}
}
