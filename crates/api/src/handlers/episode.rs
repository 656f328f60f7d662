//! Handlers for the `/episodes` resource and its nested listings.
//!
//! CRUD is served by the generic handlers in [`super::resource`]; this
//! module supplies the episode bindings plus:
//!
//! `/v1/episodes/{id}/characters` and `/v1/episodes/{id}/comments`

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use episodic_core::validator::Validator;
use episodic_db::models::character::{Character, CharacterFilter};
use episodic_db::models::comment::{Comment, CommentFilter, EPISODE_COMMENTS_SORT_SAFELIST};
use episodic_db::models::episode::{Episode, EpisodeFilter};
use episodic_db::resource::{Resource, ResourceStore};

use super::resource::ApiResource;
use crate::error::AppResult;
use crate::extract::ResourceId;
use crate::middleware::rbac::{EpisodesRead, RequirePermission};
use crate::query::QueryParams;
use crate::response::ListEnvelope;
use crate::state::AppState;

impl ApiResource for Episode {
    fn store(state: &AppState) -> &Arc<dyn ResourceStore<Self>> {
        &state.stores.episodes
    }

    fn filter_from_query(query: &QueryParams, _v: &mut Validator) -> EpisodeFilter {
        EpisodeFilter {
            title: query.string("title"),
            characters: query.csv("characters"),
        }
    }
}

/// GET /v1/episodes/{id}/characters
///
/// 404 when the episode itself does not exist.
pub async fn list_characters(
    State(state): State<AppState>,
    _: RequirePermission<EpisodesRead>,
    ResourceId(id): ResourceId,
    query: QueryParams,
) -> AppResult<Json<ListEnvelope<Character>>> {
    let mut v = Validator::new();
    let filters = query.filters(Character::SORT_SAFELIST, &mut v);
    v.into_result()?;

    state.stores.episodes.get(id).await?;

    let filter = CharacterFilter {
        name: query.string("name"),
        episode_id: Some(id),
    };
    let (rows, metadata) = state.stores.characters.get_all(&filter, &filters).await?;
    Ok(Json(ListEnvelope::new(Character::COLLECTION, rows, metadata)))
}

/// GET /v1/episodes/{id}/comments
///
/// Comments may additionally be sorted by `created_at` here.
pub async fn list_comments(
    State(state): State<AppState>,
    _: RequirePermission<EpisodesRead>,
    ResourceId(id): ResourceId,
    query: QueryParams,
) -> AppResult<Json<ListEnvelope<Comment>>> {
    let mut v = Validator::new();
    let filters = query.filters(EPISODE_COMMENTS_SORT_SAFELIST, &mut v);
    v.into_result()?;

    state.stores.episodes.get(id).await?;

    let filter = CommentFilter {
        comment_text: query.string("comment_text"),
        episode_id: Some(id),
    };
    let (rows, metadata) = state.stores.comments.get_all(&filter, &filters).await?;
    Ok(Json(ListEnvelope::new(Comment::COLLECTION, rows, metadata)))
}
