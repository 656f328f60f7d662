use episodic_core::types::{DbId, Timestamp};

use super::{contains_words, InMemoryRow, SortKey};
use crate::models::character::{Character, CharacterFilter, NewCharacter};
use crate::models::comment::{Comment, CommentFilter, NewComment};
use crate::models::episode::{Episode, EpisodeFilter, NewEpisode};

impl InMemoryRow for Episode {
    fn from_draft(id: DbId, created_at: Timestamp, draft: &NewEpisode) -> Self {
        Episode {
            id,
            created_at,
            title: draft.title.clone(),
            year: draft.year,
            runtime: draft.runtime,
            characters: draft.characters.clone().unwrap_or_default(),
            version: 1,
        }
    }

    fn matches(&self, filter: &EpisodeFilter) -> bool {
        contains_words(&self.title, &filter.title)
            && filter.characters.iter().all(|c| self.characters.contains(c))
    }

    fn sort_key(&self, column: &str) -> SortKey {
        match column {
            "title" => SortKey::Text(self.title.clone()),
            "year" => SortKey::Int(self.year.into()),
            "runtime" => SortKey::Int(self.runtime.0.into()),
            _ => SortKey::Int(self.id),
        }
    }
}

impl InMemoryRow for Character {
    fn from_draft(id: DbId, _created_at: Timestamp, draft: &NewCharacter) -> Self {
        Character {
            id,
            episode_id: draft.episode_id,
            name: draft.name.clone(),
            age: draft.age.unwrap_or_default(),
            version: 1,
        }
    }

    fn matches(&self, filter: &CharacterFilter) -> bool {
        contains_words(&self.name, &filter.name)
            && filter.episode_id.map_or(true, |id| id == self.episode_id)
    }

    fn sort_key(&self, column: &str) -> SortKey {
        match column {
            "name" => SortKey::Text(self.name.clone()),
            "age" => SortKey::Int(self.age),
            _ => SortKey::Int(self.id),
        }
    }

    fn parent_ref(&self) -> Option<(&'static str, DbId)> {
        Some(("episode_id", self.episode_id))
    }
}

impl InMemoryRow for Comment {
    fn from_draft(id: DbId, created_at: Timestamp, draft: &NewComment) -> Self {
        Comment {
            id,
            user_id: draft.user_id,
            episode_id: draft.episode_id,
            comment_text: draft.comment_text.clone(),
            like_count: draft.like_count,
            created_at,
            version: 1,
        }
    }

    fn matches(&self, filter: &CommentFilter) -> bool {
        contains_words(&self.comment_text, &filter.comment_text)
            && filter.episode_id.map_or(true, |id| id == self.episode_id)
    }

    fn sort_key(&self, column: &str) -> SortKey {
        match column {
            "user_id" => SortKey::Int(self.user_id),
            "episode_id" => SortKey::Int(self.episode_id),
            "like_count" => SortKey::Int(self.like_count),
            "comment_text" => SortKey::Text(self.comment_text.clone()),
            "created_at" => SortKey::Int(self.created_at.timestamp_micros()),
            _ => SortKey::Int(self.id),
        }
    }

    fn parent_ref(&self) -> Option<(&'static str, DbId)> {
        Some(("episode_id", self.episode_id))
    }
}
