//! One handle per store, erased behind the capability traits.

use std::sync::Arc;

use crate::accounts::{PermissionStore, TokenStore, UserStore};
use crate::memory::{MemoryPermissionStore, MemoryStore, MemoryTokenStore, MemoryUserStore};
use crate::models::character::Character;
use crate::models::comment::Comment;
use crate::models::episode::Episode;
use crate::repositories::{
    CharacterRepo, CommentRepo, EpisodeRepo, PermissionRepo, TokenRepo, UserRepo,
};
use crate::resource::ResourceStore;
use crate::DbPool;

#[derive(Clone)]
pub struct Stores {
    pub episodes: Arc<dyn ResourceStore<Episode>>,
    pub characters: Arc<dyn ResourceStore<Character>>,
    pub comments: Arc<dyn ResourceStore<Comment>>,
    pub users: Arc<dyn UserStore>,
    pub tokens: Arc<dyn TokenStore>,
    pub permissions: Arc<dyn PermissionStore>,
}

impl Stores {
    /// PostgreSQL-backed stores sharing one pool.
    pub fn postgres(pool: DbPool) -> Self {
        Self {
            episodes: Arc::new(EpisodeRepo::new(pool.clone())),
            characters: Arc::new(CharacterRepo::new(pool.clone())),
            comments: Arc::new(CommentRepo::new(pool.clone())),
            users: Arc::new(UserRepo::new(pool.clone())),
            tokens: Arc::new(TokenRepo::new(pool.clone())),
            permissions: Arc::new(PermissionRepo::new(pool)),
        }
    }

    /// Fresh, empty in-process stores.
    ///
    /// Characters and comments reference episodes the way the PostgreSQL
    /// schema does.
    pub fn in_memory() -> Self {
        let episodes = Arc::new(MemoryStore::<Episode>::new());
        let characters = Arc::new(MemoryStore::<Character>::with_parent(episodes.clone()));
        let comments = Arc::new(MemoryStore::<Comment>::with_parent(episodes.clone()));
        episodes.cascade_to(&characters);
        episodes.cascade_to(&comments);

        let users = Arc::new(MemoryUserStore::new());
        Self {
            episodes,
            characters,
            comments,
            users: users.clone(),
            tokens: Arc::new(MemoryTokenStore::new(users)),
            permissions: Arc::new(MemoryPermissionStore::new()),
        }
    }
}
