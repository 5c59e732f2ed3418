use std::env;

use time::OffsetDateTime;
use uuid::Uuid;

use glossa_config::{Postgres, Qdrant, Storage};
use glossa_store::{
	catalog::CatalogStore,
	collection::{Collection, FindQuery},
	filter::Filter,
	models::{ImageStatus, ObjectRecord, fields},
};

fn env_storage() -> Option<Storage> {
	let dsn = env::var("GLOSSA_PG_DSN").ok()?;
	let qdrant_url = env::var("GLOSSA_QDRANT_URL").ok()?;

	Some(Storage {
		postgres: Postgres { dsn, pool_max_conns: 2 },
		qdrant: Qdrant {
			url: qdrant_url,
			collection: format!("glossa_smoke_{}", Uuid::new_v4().simple()),
			vector_dim: 4,
		},
	})
}

fn object(name: &str, hash: &str) -> ObjectRecord {
	let now = OffsetDateTime::now_utc();

	ObjectRecord {
		object_id: Uuid::new_v4(),
		image_hash: hash.to_string(),
		image_ref: format!("images/{hash}"),
		image_status: ImageStatus::Approved,
		object_name_en: name.to_string(),
		metadata: Default::default(),
		org_id: None,
		embedding_text: Some(name.to_lowercase()),
		embedding_vector: Some(vec![0.1, 0.2, 0.3, 0.4]),
		translation_summary: Default::default(),
		votes_summary: Default::default(),
		created_at: now,
		updated_at: now,
	}
}

#[tokio::test]
#[ignore = "Requires external Postgres and Qdrant. Set GLOSSA_PG_DSN and GLOSSA_QDRANT_URL to run."]
async fn bootstrap_creates_catalog_tables() {
	let Some(cfg) = env_storage() else {
		eprintln!(
			"Skipping bootstrap_creates_catalog_tables; set GLOSSA_PG_DSN and GLOSSA_QDRANT_URL to run this test."
		);

		return;
	};
	let store = CatalogStore::connect(&cfg).await.expect("Failed to connect to storage.");

	store.ensure_schema().await.expect("Failed to ensure schema.");

	for table in ["objects", "translations"] {
		let count: i64 = sqlx::query_scalar(
			"SELECT count(*) FROM information_schema.tables WHERE table_name = $1",
		)
		.bind(table)
		.fetch_one(&store.pool)
		.await
		.expect("Failed to query schema tables.");

		assert_eq!(count, 1, "table {table} must exist after bootstrap");
	}

	let _ = store.vectors.client.delete_collection(cfg.qdrant.collection.clone()).await;
}

#[tokio::test]
#[ignore = "Requires external Postgres and Qdrant. Set GLOSSA_PG_DSN and GLOSSA_QDRANT_URL to run."]
async fn insert_and_filtered_find_roundtrip() {
	let Some(cfg) = env_storage() else {
		eprintln!(
			"Skipping insert_and_filtered_find_roundtrip; set GLOSSA_PG_DSN and GLOSSA_QDRANT_URL to run this test."
		);

		return;
	};
	let store = CatalogStore::connect(&cfg).await.expect("Failed to connect to storage.");

	store.ensure_schema().await.expect("Failed to ensure schema.");

	let objects = store.objects();
	let hash = format!("smoke-{}", Uuid::new_v4().simple());
	let record = object("Smoke Apple", &hash);

	objects.insert_one(record.clone()).await.expect("Failed to insert object.");

	let found = objects
		.find(FindQuery::filtered(Filter::eq(fields::IMAGE_HASH, hash.as_str())))
		.await
		.expect("Failed to find object.");

	assert_eq!(found.len(), 1);
	assert_eq!(found[0].object_id, record.object_id);

	let missing_org = objects
		.count(Filter::And(vec![
			Filter::eq(fields::IMAGE_HASH, hash.as_str()),
			Filter::missing(fields::ORG_ID),
		]))
		.await
		.expect("Failed to count objects.");

	assert_eq!(missing_org, 1);

	let _ = store.vectors.client.delete_collection(cfg.qdrant.collection.clone()).await;
}
