//! Bindings for the `/comments` resource.
//!
//! The author of a new comment is always the authenticated caller; a
//! `user_id` in the request body is ignored.

use std::sync::Arc;

use episodic_core::validator::Validator;
use episodic_db::models::comment::{Comment, CommentFilter};
use episodic_db::resource::ResourceStore;

use super::resource::ApiResource;
use crate::query::QueryParams;
use crate::state::AppState;

impl ApiResource for Comment {
    fn store(state: &AppState) -> &Arc<dyn ResourceStore<Self>> {
        &state.stores.comments
    }

    fn filter_from_query(query: &QueryParams, v: &mut Validator) -> CommentFilter {
        CommentFilter {
            comment_text: query.string("comment_text"),
            episode_id: query.optional_id("episode_id", v),
        }
    }
}
