pub mod health;

use axum::routing::{get, post, put};
use axum::Router;
use episodic_db::models::character::Character;
use episodic_db::models::comment::Comment;
use episodic_db::models::episode::Episode;

use crate::handlers::resource::{self, ApiResource};
use crate::handlers::{episode, token, user};
use crate::state::AppState;

/// Build the `/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /healthcheck                       health (public)
///
/// /episodes                          list, create
/// /episodes/{id}                     get, patch, delete
/// /episodes/{id}/characters          characters in the episode
/// /episodes/{id}/comments            comments on the episode
///
/// /characters                        list, create
/// /characters/{id}                   get, patch, delete
///
/// /comments                          list, create
/// /comments/{id}                     get, patch, delete
///
/// /users                             register (public)
/// /users/activated                   activate (public, PUT)
///
/// /tokens/authentication             issue (POST, public), revoke (DELETE)
/// ```
///
/// Reads need `episodes:read`, writes need `episodes:write`; the check is
/// made by the handlers' extractors.
pub fn api_routes() -> Router<AppState> {
    let episode_routes = resource_routes::<Episode>()
        .route("/{id}/characters", get(episode::list_characters))
        .route("/{id}/comments", get(episode::list_comments));

    Router::new()
        .merge(health::router())
        .nest("/episodes", episode_routes)
        .nest("/characters", resource_routes::<Character>())
        .nest("/comments", resource_routes::<Comment>())
        .route("/users", post(user::register))
        .route("/users/activated", put(user::activate))
        .route(
            "/tokens/authentication",
            post(token::create_authentication_token).delete(token::revoke_authentication_tokens),
        )
}

/// The five CRUD routes for one resource, to be nested at its collection
/// path.
///
/// ```text
/// GET    /          -> list
/// POST   /          -> create
/// GET    /{id}      -> show
/// PATCH  /{id}      -> update
/// DELETE /{id}      -> delete
/// ```
pub fn resource_routes<R: ApiResource>() -> Router<AppState> {
    Router::new()
        .route("/", get(resource::list::<R>).post(resource::create::<R>))
        .route(
            "/{id}",
            get(resource::show::<R>)
                .patch(resource::update::<R>)
                .delete(resource::delete::<R>),
        )
}
