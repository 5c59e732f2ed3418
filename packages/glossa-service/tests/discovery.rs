mod support;

use glossa_service::ServiceError;
use glossa_testkit::ObjectFixture;
use support::{discovery_request, text_only_service};

#[tokio::test]
async fn discovery_pages_stably_through_a_tied_ranking() {
	let first = ObjectFixture::new("Star").rating(5.0).net_votes(10).build();
	let second = ObjectFixture::new("Popular Four").rating(4.0).net_votes(50).build();
	let third = ObjectFixture::new("Quiet Four").rating(4.0).net_votes(20).build();
	let second_id = second.object_id;
	let service = text_only_service(vec![third.clone(), first.clone(), second], Vec::new());
	let mut request = discovery_request("user-1", &["Hindi"]);
	request.limit = Some(2);

	let page_one = service.pool(request.clone()).await.unwrap();

	assert_eq!(page_one.items.len(), 2);
	assert_eq!(page_one.items[0].object_id, first.object_id);
	assert_eq!(page_one.items[1].object_id, second_id);
	assert!(page_one.has_more);
	assert_eq!(page_one.total, 3);

	request.last_object_id = Some(second_id.to_string());

	let page_two = service.pool(request).await.unwrap();

	assert_eq!(page_two.items.len(), 1);
	assert_eq!(page_two.items[0].object_id, third.object_id);
	assert!(!page_two.has_more);
}

#[tokio::test]
async fn cursor_walk_never_repeats_or_skips() {
	let objects: Vec<_> = (0..7)
		.map(|index| {
			ObjectFixture::new(&format!("Object {index}"))
				.hash(&format!("object-{index}"))
				.rating(if index % 2 == 0 { 4.0 } else { 3.0 })
				.net_votes((index % 3) as i64 * 10)
				.build()
		})
		.collect();
	let service = text_only_service(objects, Vec::new());
	let mut request = discovery_request("user-1", &["Hindi"]);
	request.limit = Some(3);

	let mut seen = Vec::new();
	let mut cursor: Option<String> = None;

	loop {
		request.last_object_id = cursor.clone();

		let page = service.pool(request.clone()).await.unwrap();

		for item in &page.items {
			assert!(!seen.contains(&item.object_id), "an item repeated across pages");

			seen.push(item.object_id);
		}

		if !page.has_more {
			break;
		}

		cursor = page.items.last().map(|item| item.object_id.to_string());
	}

	assert_eq!(seen.len(), 7, "every item must appear exactly once");
}

#[tokio::test]
async fn discovery_shows_objects_with_a_gap_and_hides_finished_ones() {
	let object = ObjectFixture::new("Apple").global_languages(&["English", "Hindi"]).build();
	let service = text_only_service(vec![object], Vec::new());

	let partly_covered =
		service.pool(discovery_request("user-1", &["Hindi", "French"])).await.unwrap();

	assert_eq!(partly_covered.items.len(), 1);
	assert_eq!(partly_covered.items[0].untranslated_languages, vec!["French".to_string()]);
	assert_eq!(
		partly_covered.items[0].languages_translated,
		vec!["English".to_string(), "Hindi".to_string()],
	);

	let fully_covered =
		service.pool(discovery_request("user-2", &["English", "Hindi"])).await.unwrap();

	assert!(fully_covered.items.is_empty());
	assert_eq!(fully_covered.total, 0);
}

#[tokio::test]
async fn org_users_gap_is_judged_by_their_org_scope() {
	let object = ObjectFixture::new("Apple")
		.global_languages(&["Hindi"])
		.org_languages("acme", &["French"])
		.build();
	let service = text_only_service(vec![object], Vec::new());
	let mut request = discovery_request("user-1", &["Hindi"]);
	request.org_id = Some("acme".to_string());

	// Global Hindi coverage does not count inside the org scope.
	let response = service.pool(request).await.unwrap();

	assert_eq!(response.items.len(), 1);
	assert_eq!(response.items[0].untranslated_languages, vec!["Hindi".to_string()]);
}

#[tokio::test]
async fn strict_isolation_holds_across_org_scopes() {
	let acme = ObjectFixture::new("Acme Apple").hash("acme-apple").org("acme").build();
	let zenith = ObjectFixture::new("Zenith Apple").hash("zenith-apple").org("zenith").build();
	let global = ObjectFixture::new("Shared Apple").hash("shared-apple").build();
	let unapproved_global = ObjectFixture::new("Draft Apple")
		.hash("draft-apple")
		.status(glossa_store::models::ImageStatus::Submitted)
		.build();
	let service =
		text_only_service(vec![acme.clone(), zenith, global.clone(), unapproved_global], Vec::new());
	let mut request = discovery_request("user-1", &["Hindi"]);
	request.org_id = Some("acme".to_string());

	let acme_view = service.pool(request).await.unwrap();
	let ids: Vec<_> = acme_view.items.iter().map(|item| item.object_id).collect();

	// Own org plus approved global fallback; never another org, never an
	// unapproved global.
	assert!(ids.contains(&acme.object_id));
	assert!(ids.contains(&global.object_id));
	assert_eq!(ids.len(), 2);

	let anonymous_view = service.pool(discovery_request("user-2", &["Hindi"])).await.unwrap();
	let ids: Vec<_> = anonymous_view.items.iter().map(|item| item.object_id).collect();

	assert_eq!(ids, vec![global.object_id]);
}

#[tokio::test]
async fn malformed_cursor_is_a_client_error() {
	let service = text_only_service(
		vec![ObjectFixture::new("Apple").build()],
		Vec::new(),
	);
	let mut request = discovery_request("user-1", &["Hindi"]);
	request.last_object_id = Some("not-a-uuid".to_string());

	let error = service.pool(request).await.unwrap_err();

	assert!(matches!(error, ServiceError::InvalidRequest { .. }));
}

#[tokio::test]
async fn unresolvable_cursor_is_a_client_error() {
	let service = text_only_service(
		vec![ObjectFixture::new("Apple").build()],
		Vec::new(),
	);
	let mut request = discovery_request("user-1", &["Hindi"]);
	request.last_object_id = Some(uuid::Uuid::new_v4().to_string());

	let error = service.pool(request).await.unwrap_err();

	assert!(matches!(error, ServiceError::InvalidRequest { .. }));
}

#[tokio::test]
async fn no_allowed_languages_means_nothing_to_work_on() {
	let service = text_only_service(
		vec![ObjectFixture::new("Apple").build()],
		Vec::new(),
	);
	let response = service.pool(discovery_request("user-1", &[])).await.unwrap();

	assert!(response.items.is_empty());
	assert_eq!(response.total, 0);
	assert!(!response.has_more);
}

#[tokio::test]
async fn missing_user_id_is_rejected() {
	let service = text_only_service(Vec::new(), Vec::new());
	let error = service.pool(discovery_request("  ", &["Hindi"])).await.unwrap_err();

	assert!(matches!(error, ServiceError::InvalidRequest { .. }));
}
