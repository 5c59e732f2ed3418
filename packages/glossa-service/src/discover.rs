use uuid::Uuid;

use glossa_store::{
	collection::{Collection, FindQuery},
	filter::{Filter, SortOrder},
	models::{ObjectRecord, fields},
	tenant::{TenantCollection, TenantScope},
};

use crate::{GlossaService, ServiceError, ServiceResult, approved_objects};

pub(crate) struct DiscoverArgs<'a> {
	pub(crate) scope: &'a TenantScope,
	pub(crate) languages_allowed: &'a [String],
	pub(crate) limit: usize,
	pub(crate) last_object_id: Option<&'a str>,
}

pub(crate) struct DiscoverOutcome {
	pub(crate) records: Vec<ObjectRecord>,
	pub(crate) total: u64,
	pub(crate) has_more: bool,
}

impl GlossaService {
	/// Surfaces the highest-ranked objects that still have a translation gap
	/// for this user, paginated with a compound cursor so pages stay stable
	/// while popularity mutates underneath.
	pub(crate) async fn discover(&self, args: DiscoverArgs<'_>) -> ServiceResult<DiscoverOutcome> {
		let DiscoverArgs { scope, languages_allowed, limit, last_object_id } = args;

		if languages_allowed.is_empty() {
			return Ok(DiscoverOutcome { records: Vec::new(), total: 0, has_more: false });
		}

		let objects = self.scoped_objects(scope);
		let base = Filter::And(vec![
			approved_objects(),
			work_gap_filter(&summary_languages_path(scope), languages_allowed),
		]);
		let filter = match last_object_id {
			Some(raw) => {
				let cursor = self.cursor_filter(&objects, raw).await?;

				Filter::And(vec![base.clone(), cursor])
			},
			None => base.clone(),
		};
		let mut records = objects
			.find(
				FindQuery::filtered(filter)
					.sorted(popularity_sort())
					.limited(limit as u64 + 1),
			)
			.await?;
		let has_more = records.len() > limit;

		records.truncate(limit);

		let total = objects.count(base).await?;

		Ok(DiscoverOutcome { records, total, has_more })
	}

	/// Resolves the previous page's last object into a disjunctive boundary
	/// over `(rating, net votes, id)`. Ids that do not parse or no longer
	/// resolve are the caller's error, not a silent restart from page one.
	async fn cursor_filter(
		&self,
		objects: &TenantCollection<ObjectRecord>,
		raw: &str,
	) -> ServiceResult<Filter> {
		let object_id = raw.trim().parse::<Uuid>().map_err(|_| ServiceError::InvalidRequest {
			message: "last_object_id is not a valid object id.".to_string(),
		})?;
		let last = objects
			.find_one(Filter::eq(fields::OBJECT_ID, object_id.to_string()))
			.await?
			.ok_or_else(|| ServiceError::InvalidRequest {
				message: "last_object_id does not resolve to a visible object.".to_string(),
			})?;
		let rating = last.votes_summary.fair_star_rating;
		let votes = last.votes_summary.total_net_votes;

		Ok(Filter::Or(vec![
			Filter::Lt { field: fields::FAIR_STAR_RATING.to_string(), value: rating.into() },
			Filter::And(vec![
				Filter::eq(fields::FAIR_STAR_RATING, rating),
				Filter::Lt { field: fields::TOTAL_NET_VOTES.to_string(), value: votes.into() },
			]),
			Filter::And(vec![
				Filter::eq(fields::FAIR_STAR_RATING, rating),
				Filter::eq(fields::TOTAL_NET_VOTES, votes),
				Filter::Lt {
					field: fields::OBJECT_ID.to_string(),
					value: last.object_id.to_string().into(),
				},
			]),
		]))
	}
}

pub(crate) fn popularity_sort() -> Vec<(String, SortOrder)> {
	vec![
		(fields::FAIR_STAR_RATING.to_string(), SortOrder::Desc),
		(fields::TOTAL_NET_VOTES.to_string(), SortOrder::Desc),
		(fields::OBJECT_ID.to_string(), SortOrder::Desc),
	]
}

/// At least one allowed language must be absent from the scope's translated
/// set; an object with no summary entry for the scope has every language
/// missing.
pub(crate) fn work_gap_filter(summary_path: &str, languages_allowed: &[String]) -> Filter {
	Filter::Or(
		languages_allowed
			.iter()
			.map(|language| Filter::not(Filter::contains(summary_path, language.as_str())))
			.collect(),
	)
}

pub(crate) fn summary_languages_path(scope: &TenantScope) -> String {
	match scope.org_id() {
		Some(org_id) =>
			format!("{}.orgs.{}.translated_languages", fields::TRANSLATION_SUMMARY, org_id),
		None => format!("{}.global.translated_languages", fields::TRANSLATION_SUMMARY),
	}
}
