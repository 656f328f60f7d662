//! Bindings for the `/characters` resource.

use std::sync::Arc;

use episodic_core::validator::Validator;
use episodic_db::models::character::{Character, CharacterFilter};
use episodic_db::resource::ResourceStore;

use super::resource::ApiResource;
use crate::query::QueryParams;
use crate::state::AppState;

impl ApiResource for Character {
    fn store(state: &AppState) -> &Arc<dyn ResourceStore<Self>> {
        &state.stores.characters
    }

    /// `?name=` full-text match, `?episode_id=` exact match.
    fn filter_from_query(query: &QueryParams, v: &mut Validator) -> CharacterFilter {
        CharacterFilter {
            name: query.string("name"),
            episode_id: query.optional_id("episode_id", v),
        }
    }
}
