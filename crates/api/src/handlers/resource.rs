//! CRUD handlers shared by every version-stamped resource.
//!
//! Each handler is generic over an [`ApiResource`]; the routes in
//! [`crate::routes`] instantiate them per resource type. Reads require
//! `episodes:read`, writes require `episodes:write`.

use std::sync::Arc;

use axum::extract::State;
use axum::http::header::LOCATION;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use episodic_core::error::CoreError;
use episodic_core::validator::Validator;
use episodic_db::resource::{Changeset, Resource, ResourceStore, Validate, Versioned};
use serde_json::{json, Value};

use crate::error::AppResult;
use crate::extract::{AppJson, ResourceId};
use crate::middleware::rbac::{EpisodesRead, EpisodesWrite, RequirePermission};
use crate::query::QueryParams;
use crate::response::{Envelope, ListEnvelope};
use crate::state::AppState;

/// Binds a [`Resource`] to its store handle and its listing filter.
pub trait ApiResource: Resource {
    fn store(state: &AppState) -> &Arc<dyn ResourceStore<Self>>;

    /// Build the resource-specific listing filter from the query string,
    /// recording malformed values in `v`.
    fn filter_from_query(query: &QueryParams, v: &mut Validator) -> Self::Filter;
}

/// GET /v1/{collection}
///
/// Pagination, sort, and filter values are validated before the store is
/// touched.
pub async fn list<R: ApiResource>(
    State(state): State<AppState>,
    _: RequirePermission<EpisodesRead>,
    query: QueryParams,
) -> AppResult<Json<ListEnvelope<R>>> {
    let mut v = Validator::new();
    let filters = query.filters(R::SORT_SAFELIST, &mut v);
    let filter = R::filter_from_query(&query, &mut v);
    v.into_result()?;

    let (rows, metadata) = R::store(&state).get_all(&filter, &filters).await?;
    Ok(Json(ListEnvelope::new(R::COLLECTION, rows, metadata)))
}

/// POST /v1/{collection}
pub async fn create<R: ApiResource>(
    State(state): State<AppState>,
    RequirePermission(user, _): RequirePermission<EpisodesWrite>,
    AppJson(mut draft): AppJson<R::Draft>,
) -> AppResult<impl IntoResponse> {
    let mut v = Validator::new();
    draft.validate(&mut v);
    v.into_result()?;

    R::assign_author(&mut draft, user.id);
    let record = R::store(&state).insert(&draft).await?;
    tracing::info!(entity = R::ENTITY, id = record.id(), user_id = user.id, "Record created");

    let location = format!("/v1/{}/{}", R::COLLECTION, record.id());
    Ok((
        StatusCode::CREATED,
        [(LOCATION, location)],
        Json(Envelope::new(R::ENTITY, record)),
    ))
}

/// GET /v1/{collection}/{id}
pub async fn show<R: ApiResource>(
    State(state): State<AppState>,
    _: RequirePermission<EpisodesRead>,
    ResourceId(id): ResourceId,
) -> AppResult<Json<Envelope<R>>> {
    let record = R::store(&state).get(id).await?;
    Ok(Json(Envelope::new(R::ENTITY, record)))
}

/// PATCH /v1/{collection}/{id}
///
/// The body must carry the `version` the caller last read. A stale version,
/// or a concurrent write landing between the read and the conditional
/// update, is answered with 409.
pub async fn update<R: ApiResource>(
    State(state): State<AppState>,
    _: RequirePermission<EpisodesWrite>,
    ResourceId(id): ResourceId,
    AppJson(changes): AppJson<R::Changes>,
) -> AppResult<Json<Envelope<R>>> {
    let Some(expected) = changes.expected_version() else {
        return Err(CoreError::field("version", "must be provided").into());
    };

    let store = R::store(&state);
    let mut record = store.get(id).await?;
    if record.version() != expected {
        return Err(CoreError::EditConflict.into());
    }

    changes.apply(&mut record);

    let mut v = Validator::new();
    record.validate(&mut v);
    v.into_result()?;

    store.update(&mut record).await?;
    Ok(Json(Envelope::new(R::ENTITY, record)))
}

/// DELETE /v1/{collection}/{id}
pub async fn delete<R: ApiResource>(
    State(state): State<AppState>,
    _: RequirePermission<EpisodesWrite>,
    ResourceId(id): ResourceId,
) -> AppResult<Json<Value>> {
    R::store(&state).delete(id).await?;
    tracing::info!(entity = R::ENTITY, id, "Record deleted");
    Ok(Json(
        json!({ "message": format!("{} successfully deleted", R::ENTITY) }),
    ))
}
