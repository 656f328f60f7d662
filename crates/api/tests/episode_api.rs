//! HTTP-level integration tests for the resource endpoints: CRUD, the
//! version-checked update protocol, listing, and nested listings.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use common::{
    body_json, delete_auth, episode_body, get_auth, patch_json_auth, post_json_auth,
    user_with_token, writer,
};
use episodic_core::filters::Filters;
use episodic_core::types::DbId;
use episodic_db::memory::MemoryStore;
use episodic_db::models::episode::{Episode, EpisodeFilter, NewEpisode};
use episodic_db::resource::ResourceStore;
use episodic_db::DbResult;
use serde_json::json;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Wraps a memory store and counts every call that reaches it.
#[derive(Default)]
struct CountingStore {
    inner: MemoryStore<Episode>,
    calls: AtomicUsize,
}

impl CountingStore {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ResourceStore<Episode> for CountingStore {
    async fn insert(&self, draft: &NewEpisode) -> DbResult<Episode> {
        self.hit();
        self.inner.insert(draft).await
    }

    async fn find_by_id(&self, id: DbId) -> DbResult<Option<Episode>> {
        self.hit();
        self.inner.find_by_id(id).await
    }

    async fn update_if_version(&self, record: &Episode) -> DbResult<Option<i32>> {
        self.hit();
        self.inner.update_if_version(record).await
    }

    async fn delete_by_id(&self, id: DbId) -> DbResult<bool> {
        self.hit();
        self.inner.delete_by_id(id).await
    }

    async fn list_page(
        &self,
        filter: &EpisodeFilter,
        filters: &Filters,
    ) -> DbResult<(Vec<Episode>, i64)> {
        self.hit();
        self.inner.list_page(filter, filters).await
    }
}

async fn create_episode(app: axum::Router, token: &str, title: &str) -> serde_json::Value {
    let response = post_json_auth(app, "/v1/episodes", episode_body(title), token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_create_sets_location_and_version_one() {
    let state = common::test_state();
    let token = writer(&state).await;
    let app = common::build_test_app(state);

    let response = post_json_auth(app, "/v1/episodes", episode_body("Pilot"), &token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.headers()["location"], "/v1/episodes/1");

    let json = body_json(response).await;
    assert_eq!(json["episode"]["id"], 1);
    assert_eq!(json["episode"]["version"], 1);
    assert_eq!(json["episode"]["runtime"], "42 mins");
    assert!(json["episode"].get("created_at").is_none());
}

#[tokio::test]
async fn test_create_reports_every_invalid_field() {
    let state = common::test_state();
    let token = writer(&state).await;
    let app = common::build_test_app(state);

    let response = post_json_auth(app, "/v1/episodes", json!({}), &token).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let json = body_json(response).await;
    for field in ["title", "year", "runtime", "characters"] {
        assert_eq!(json["error"][field], "must be provided", "field {field}");
    }
}

#[tokio::test]
async fn test_bad_runtime_shape_is_400() {
    let state = common::test_state();
    let token = writer(&state).await;
    let app = common::build_test_app(state);

    let mut body = episode_body("Pilot");
    body["runtime"] = json!(42);
    let response = post_json_auth(app, "/v1/episodes", body, &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_show_and_delete() {
    let state = common::test_state();
    let token = writer(&state).await;
    let app = common::build_test_app(state);
    create_episode(app.clone(), &token, "Pilot").await;

    let response = get_auth(app.clone(), "/v1/episodes/1", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["episode"]["title"], "Pilot");

    let response = delete_auth(app.clone(), "/v1/episodes/1", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await["message"],
        "episode successfully deleted"
    );

    let response = get_auth(app.clone(), "/v1/episodes/1", &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = delete_auth(app, "/v1/episodes/1", &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_ids_never_reach_the_store() {
    let mut state = common::test_state();
    let token = writer(&state).await;
    let counting = Arc::new(CountingStore::default());
    state.stores.episodes = counting.clone();
    let app = common::build_test_app(state);

    for uri in ["/v1/episodes/0", "/v1/episodes/-5", "/v1/episodes/abc"] {
        let response = get_auth(app.clone(), uri, &token).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "uri {uri}");

        let response = delete_auth(app.clone(), uri, &token).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "uri {uri}");
    }

    assert_eq!(counting.calls(), 0);
}

// ---------------------------------------------------------------------------
// Version-checked updates
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_update_increments_version_and_stale_version_conflicts() {
    let state = common::test_state();
    let token = writer(&state).await;
    let app = common::build_test_app(state);
    create_episode(app.clone(), &token, "Pilot").await;

    let response = patch_json_auth(
        app.clone(),
        "/v1/episodes/1",
        json!({ "title": "Pilot, Part 1", "version": 1 }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["episode"]["version"], 2);
    assert_eq!(json["episode"]["title"], "Pilot, Part 1");
    assert_eq!(json["episode"]["year"], 2004);

    let response = patch_json_auth(
        app.clone(),
        "/v1/episodes/1",
        json!({ "year": 2005, "version": 2 }),
        &token,
    )
    .await;
    assert_eq!(body_json(response).await["episode"]["version"], 3);

    let response = patch_json_auth(
        app.clone(),
        "/v1/episodes/1",
        json!({ "title": "Overwrite", "version": 1 }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(
        body_json(response).await["error"],
        "unable to update the record due to an edit conflict, please try again"
    );

    let current = body_json(get_auth(app, "/v1/episodes/1", &token).await).await;
    assert_eq!(current["episode"]["title"], "Pilot, Part 1");
    assert_eq!(current["episode"]["version"], 3);
}

#[tokio::test]
async fn test_update_requires_version() {
    let state = common::test_state();
    let token = writer(&state).await;
    let app = common::build_test_app(state);
    create_episode(app.clone(), &token, "Pilot").await;

    let response = patch_json_auth(
        app,
        "/v1/episodes/1",
        json!({ "title": "No version" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["error"]["version"], "must be provided");
}

#[tokio::test]
async fn test_invalid_update_is_not_stored() {
    let state = common::test_state();
    let token = writer(&state).await;
    let app = common::build_test_app(state);
    create_episode(app.clone(), &token, "Pilot").await;

    let response = patch_json_auth(
        app.clone(),
        "/v1/episodes/1",
        json!({ "year": 1700, "version": 1 }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let current = body_json(get_auth(app, "/v1/episodes/1", &token).await).await;
    assert_eq!(current["episode"]["year"], 2004);
    assert_eq!(current["episode"]["version"], 1);
}

#[tokio::test]
async fn test_concurrent_patches_have_one_winner() {
    let state = common::test_state();
    let token = writer(&state).await;
    let app = common::build_test_app(state);
    create_episode(app.clone(), &token, "Pilot").await;

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let app = app.clone();
            let token = token.clone();
            tokio::spawn(async move {
                patch_json_auth(
                    app,
                    "/v1/episodes/1",
                    json!({ "title": format!("Writer {i}"), "version": 1 }),
                    &token,
                )
                .await
                .status()
            })
        })
        .collect();

    let mut statuses = Vec::new();
    for handle in handles {
        statuses.push(handle.await.unwrap());
    }

    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::OK).count(), 1);
    assert!(statuses
        .iter()
        .all(|s| *s == StatusCode::OK || *s == StatusCode::CONFLICT));
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_listing_paginates_with_metadata() {
    let state = common::test_state();
    let token = writer(&state).await;
    let app = common::build_test_app(state);
    for i in 1..=17 {
        create_episode(app.clone(), &token, &format!("Episode {i}")).await;
    }

    let response = get_auth(app, "/v1/episodes?page=2&page_size=5", &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let ids: Vec<i64> = json["episodes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![6, 7, 8, 9, 10]);
    assert_eq!(json["metadata"]["current_page"], 2);
    assert_eq!(json["metadata"]["page_size"], 5);
    assert_eq!(json["metadata"]["first_page"], 1);
    assert_eq!(json["metadata"]["last_page"], 4);
    assert_eq!(json["metadata"]["total_records"], 17);
}

#[tokio::test]
async fn test_descending_sort_and_title_filter() {
    let state = common::test_state();
    let token = writer(&state).await;
    let app = common::build_test_app(state);
    for title in ["The Pilot", "Walkabout", "Pilot Redux"] {
        create_episode(app.clone(), &token, title).await;
    }

    let json = body_json(get_auth(app.clone(), "/v1/episodes?sort=-id", &token).await).await;
    assert_eq!(json["episodes"][0]["title"], "Pilot Redux");

    let json = body_json(get_auth(app, "/v1/episodes?title=pilot", &token).await).await;
    assert_eq!(json["episodes"].as_array().unwrap().len(), 2);
    assert_eq!(json["metadata"]["total_records"], 2);
}

#[tokio::test]
async fn test_empty_listing_omits_metadata_fields() {
    let state = common::test_state();
    let token = writer(&state).await;
    let app = common::build_test_app(state);

    let json = body_json(get_auth(app, "/v1/episodes", &token).await).await;
    assert_eq!(json["episodes"], json!([]));
    assert_eq!(json["metadata"], json!({}));
}

#[tokio::test]
async fn test_bad_query_is_rejected_before_the_store() {
    let mut state = common::test_state();
    let token = writer(&state).await;
    let counting = Arc::new(CountingStore::default());
    state.stores.episodes = counting.clone();
    let app = common::build_test_app(state);

    let response = get_auth(
        app,
        "/v1/episodes?sort=version;DROP&page=0&page_size=101",
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let json = body_json(response).await;
    assert_eq!(json["error"]["sort"], "invalid sort value");
    assert_eq!(json["error"]["page"], "must be a positive integer");
    assert_eq!(json["error"]["page_size"], "must be a maximum of 100");
    assert_eq!(counting.calls(), 0);
}

// ---------------------------------------------------------------------------
// Characters, comments, and nested listings
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_nested_listings_are_scoped_to_the_episode() {
    let state = common::test_state();
    let token = writer(&state).await;
    let app = common::build_test_app(state);
    create_episode(app.clone(), &token, "Pilot").await;
    create_episode(app.clone(), &token, "Tabula Rasa").await;

    for (episode_id, name) in [(1, "Jack"), (1, "Kate"), (2, "Sawyer")] {
        let response = post_json_auth(
            app.clone(),
            "/v1/characters",
            json!({ "episode_id": episode_id, "name": name, "age": 35 }),
            &token,
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let json = body_json(get_auth(app.clone(), "/v1/episodes/1/characters", &token).await).await;
    let names: Vec<&str> = json["characters"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Jack", "Kate"]);

    let response = get_auth(app.clone(), "/v1/episodes/99/characters", &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get_auth(app, "/v1/episodes/99/comments", &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_comment_author_is_the_caller() {
    let state = common::test_state();
    let (user, token) = user_with_token(
        &state,
        "author@example.com",
        true,
        &["episodes:read", "episodes:write"],
    )
    .await;
    let app = common::build_test_app(state);
    create_episode(app.clone(), &token, "Pilot").await;

    let response = post_json_auth(
        app.clone(),
        "/v1/comments",
        json!({ "episode_id": 1, "comment_text": "what a start", "user_id": 999 }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.headers()["location"], "/v1/comments/1");

    let json = body_json(response).await;
    assert_eq!(json["comment"]["user_id"], user.id);
    assert_eq!(json["comment"]["like_count"], 0);

    let json = body_json(
        get_auth(app.clone(), "/v1/episodes/1/comments?sort=-created_at", &token).await,
    )
    .await;
    assert_eq!(json["comments"].as_array().unwrap().len(), 1);

    // created_at is only sortable on the nested listing.
    let response = get_auth(app, "/v1/comments?sort=created_at", &token).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_character_validation_is_keyed_by_field() {
    let state = common::test_state();
    let token = writer(&state).await;
    let app = common::build_test_app(state);

    let response = post_json_auth(
        app,
        "/v1/characters",
        json!({ "episode_id": 1, "name": "Richard", "age": 1001 }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body_json(response).await["error"]["age"],
        "must not be more than 1000"
    );
}

#[tokio::test]
async fn test_children_must_reference_an_existing_episode() {
    let state = common::test_state();
    let token = writer(&state).await;
    let app = common::build_test_app(state);

    for (uri, body) in [
        ("/v1/characters", json!({ "episode_id": 999, "name": "Ghost", "age": 30 })),
        ("/v1/comments", json!({ "episode_id": 999, "comment_text": "boo" })),
    ] {
        let response = post_json_auth(app.clone(), uri, body, &token).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY, "uri {uri}");
        assert_eq!(
            body_json(response).await["error"]["episode_id"],
            "must reference an existing record"
        );
    }

    let json = body_json(get_auth(app, "/v1/characters", &token).await).await;
    assert!(json["characters"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_deleting_an_episode_removes_its_characters_and_comments() {
    let state = common::test_state();
    let token = writer(&state).await;
    let app = common::build_test_app(state);
    create_episode(app.clone(), &token, "Pilot").await;
    create_episode(app.clone(), &token, "Tabula Rasa").await;

    for (uri, body) in [
        ("/v1/characters", json!({ "episode_id": 1, "name": "Jack", "age": 35 })),
        ("/v1/characters", json!({ "episode_id": 2, "name": "Kate", "age": 30 })),
        ("/v1/comments", json!({ "episode_id": 1, "comment_text": "great" })),
    ] {
        let response = post_json_auth(app.clone(), uri, body, &token).await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = delete_auth(app.clone(), "/v1/episodes/1", &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(get_auth(app.clone(), "/v1/characters", &token).await).await;
    let names: Vec<&str> = json["characters"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Kate"]);

    let json = body_json(get_auth(app, "/v1/comments", &token).await).await;
    assert!(json["comments"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_episode_id_filter_is_rejected() {
    let state = common::test_state();
    let token = writer(&state).await;
    let app = common::build_test_app(state);

    for uri in [
        "/v1/comments?episode_id=abc",
        "/v1/comments?episode_id=0",
        "/v1/characters?episode_id=-2",
    ] {
        let response = get_auth(app.clone(), uri, &token).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY, "uri {uri}");
        assert_eq!(
            body_json(response).await["error"]["episode_id"],
            "must be a positive integer"
        );
    }
}
