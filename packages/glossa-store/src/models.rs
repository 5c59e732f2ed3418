use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use glossa_domain::gap::TranslationSummary;

use crate::collection::OrgScoped;

/// Content fingerprint for a canonical image. Two submissions of the same
/// bytes collapse onto one object.
pub fn image_fingerprint(bytes: &[u8]) -> String {
	blake3::hash(bytes).to_hex().to_string()
}

/// Document field paths shared by the repository layer and query builders.
pub mod fields {
	pub const ORG_ID: &str = "org_id";
	pub const OBJECT_ID: &str = "object_id";
	pub const TRANSLATION_ID: &str = "translation_id";
	pub const IMAGE_HASH: &str = "image_hash";
	pub const IMAGE_STATUS: &str = "image_status";
	pub const EMBEDDING_TEXT: &str = "embedding_text";
	pub const REQUESTED_LANGUAGE: &str = "requested_language";
	pub const TRANSLATION_STATUS: &str = "translation_status";
	pub const FAIR_STAR_RATING: &str = "votes_summary.fair_star_rating";
	pub const TOTAL_NET_VOTES: &str = "votes_summary.total_net_votes";
	pub const TRANSLATION_SUMMARY: &str = "translation_summary";
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageStatus {
	None,
	Submitted,
	Verified,
	Approved,
	Rejected,
}
impl ImageStatus {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::None => "none",
			Self::Submitted => "submitted",
			Self::Verified => "verified",
			Self::Approved => "approved",
			Self::Rejected => "rejected",
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslationStatus {
	None,
	Draft,
	Submitted,
	Verified,
	Approved,
	Rejected,
}
impl TranslationStatus {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::None => "none",
			Self::Draft => "draft",
			Self::Submitted => "submitted",
			Self::Verified => "verified",
			Self::Approved => "approved",
			Self::Rejected => "rejected",
		}
	}
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectMetadata {
	#[serde(default)]
	pub category: Option<String>,
	#[serde(default)]
	pub field_of_study: Option<String>,
	#[serde(default)]
	pub tags: Vec<String>,
	#[serde(default)]
	pub age_appropriate: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VotesSummary {
	#[serde(default)]
	pub fair_star_rating: f32,
	#[serde(default)]
	pub total_net_votes: i64,
	#[serde(default)]
	pub total_vote_count: i64,
	#[serde(default)]
	pub net_votes_by_language: HashMap<String, i64>,
}

/// One distinct real-world subject captured in one canonical image. Never
/// hard-deleted by this core; summaries are rebuilt out of band.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
	pub object_id: Uuid,
	pub image_hash: String,
	pub image_ref: String,
	pub image_status: ImageStatus,
	pub object_name_en: String,
	#[serde(default)]
	pub metadata: ObjectMetadata,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub org_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub embedding_text: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub embedding_vector: Option<Vec<f32>>,
	#[serde(default)]
	pub translation_summary: TranslationSummary,
	#[serde(default)]
	pub votes_summary: VotesSummary,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
	#[serde(with = "time::serde::rfc3339")]
	pub updated_at: OffsetDateTime,
}
impl OrgScoped for ObjectRecord {
	fn org_id(&self) -> Option<&str> {
		self.org_id.as_deref()
	}

	fn assign_org(&mut self, org_id: String) {
		self.org_id = Some(org_id);
	}
}

/// One object's content in one language. Read-only from this core's
/// perspective; the moderation workflow owns its lifecycle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TranslationRecord {
	pub translation_id: Uuid,
	pub object_id: Uuid,
	pub requested_language: String,
	pub translation_status: TranslationStatus,
	pub object_name: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub org_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub embedding_text: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub embedding_vector: Option<Vec<f32>>,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
	#[serde(with = "time::serde::rfc3339")]
	pub updated_at: OffsetDateTime,
}
impl OrgScoped for TranslationRecord {
	fn org_id(&self) -> Option<&str> {
		self.org_id.as_deref()
	}

	fn assign_org(&mut self, org_id: String) {
		self.org_id = Some(org_id);
	}
}
