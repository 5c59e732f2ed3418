use time::OffsetDateTime;
use uuid::Uuid;

use glossa_domain::gap::{LanguageSet, TranslationSummary};
use glossa_store::models::{
	ImageStatus, ObjectMetadata, ObjectRecord, TranslationRecord, TranslationStatus, VotesSummary,
};

/// Builder for catalog objects with sensible defaults: approved, global,
/// searchable under its lowercased name.
pub struct ObjectFixture {
	record: ObjectRecord,
}
impl ObjectFixture {
	pub fn new(name: &str) -> Self {
		let now = OffsetDateTime::UNIX_EPOCH;
		let slug = name.to_lowercase().replace(' ', "-");

		Self {
			record: ObjectRecord {
				object_id: Uuid::new_v4(),
				image_hash: glossa_store::models::image_fingerprint(slug.as_bytes()),
				image_ref: format!("images/{slug}"),
				image_status: ImageStatus::Approved,
				object_name_en: name.to_string(),
				metadata: ObjectMetadata::default(),
				org_id: None,
				embedding_text: Some(name.to_lowercase()),
				embedding_vector: None,
				translation_summary: TranslationSummary::default(),
				votes_summary: VotesSummary::default(),
				created_at: now,
				updated_at: now,
			},
		}
	}

	pub fn id(mut self, object_id: Uuid) -> Self {
		self.record.object_id = object_id;

		self
	}

	pub fn hash(mut self, image_hash: &str) -> Self {
		self.record.image_hash = image_hash.to_string();

		self
	}

	pub fn org(mut self, org_id: &str) -> Self {
		self.record.org_id = Some(org_id.to_string());

		self
	}

	pub fn status(mut self, status: ImageStatus) -> Self {
		self.record.image_status = status;

		self
	}

	pub fn embedding_text(mut self, text: &str) -> Self {
		self.record.embedding_text = Some(text.to_string());

		self
	}

	pub fn embedding_vector(mut self, vector: Vec<f32>) -> Self {
		self.record.embedding_vector = Some(vector);

		self
	}

	pub fn rating(mut self, fair_star_rating: f32) -> Self {
		self.record.votes_summary.fair_star_rating = fair_star_rating;

		self
	}

	pub fn net_votes(mut self, total_net_votes: i64) -> Self {
		self.record.votes_summary.total_net_votes = total_net_votes;

		self
	}

	pub fn vote_count(mut self, total_vote_count: i64) -> Self {
		self.record.votes_summary.total_vote_count = total_vote_count;

		self
	}

	pub fn global_languages(mut self, languages: &[&str]) -> Self {
		self.record.translation_summary.global = LanguageSet {
			translated_languages: languages.iter().map(|s| s.to_string()).collect(),
		};

		self
	}

	pub fn org_languages(mut self, org_id: &str, languages: &[&str]) -> Self {
		self.record.translation_summary.orgs.insert(
			org_id.to_string(),
			LanguageSet {
				translated_languages: languages.iter().map(|s| s.to_string()).collect(),
			},
		);

		self
	}

	pub fn tags(mut self, tags: &[&str]) -> Self {
		self.record.metadata.tags = tags.iter().map(|s| s.to_string()).collect();

		self
	}

	pub fn build(self) -> ObjectRecord {
		self.record
	}
}

/// Builder for translation rows; defaults to an approved global translation.
pub struct TranslationFixture {
	record: TranslationRecord,
}
impl TranslationFixture {
	pub fn new(object_id: Uuid, language: &str, object_name: &str) -> Self {
		let now = OffsetDateTime::UNIX_EPOCH;

		Self {
			record: TranslationRecord {
				translation_id: Uuid::new_v4(),
				object_id,
				requested_language: language.to_string(),
				translation_status: TranslationStatus::Approved,
				object_name: object_name.to_string(),
				description: None,
				org_id: None,
				embedding_text: Some(object_name.to_lowercase()),
				embedding_vector: None,
				created_at: now,
				updated_at: now,
			},
		}
	}

	pub fn org(mut self, org_id: &str) -> Self {
		self.record.org_id = Some(org_id.to_string());

		self
	}

	pub fn status(mut self, status: TranslationStatus) -> Self {
		self.record.translation_status = status;

		self
	}

	pub fn build(self) -> TranslationRecord {
		self.record
	}
}
