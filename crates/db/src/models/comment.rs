//! Comment (like/comment) entity model and DTOs.

use episodic_core::types::{DbId, Timestamp};
use episodic_core::validator::Validator;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::resource::{Changeset, Resource, Validate, Versioned};

pub const SORT_SAFELIST: &[&str] = &[
    "id",
    "user_id",
    "episode_id",
    "like_count",
    "comment_text",
    "-id",
    "-user_id",
    "-episode_id",
    "-like_count",
    "-comment_text",
];

/// Sort keys for the comments nested under one episode.
pub const EPISODE_COMMENTS_SORT_SAFELIST: &[&str] = &[
    "id",
    "user_id",
    "like_count",
    "comment_text",
    "created_at",
    "-id",
    "-user_id",
    "-like_count",
    "-comment_text",
    "-created_at",
];

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Comment {
    pub id: DbId,
    pub user_id: DbId,
    pub episode_id: DbId,
    pub comment_text: String,
    pub like_count: i64,
    pub created_at: Timestamp,
    pub version: i32,
}

/// DTO for creating a comment. `user_id` is never read from the body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewComment {
    #[serde(skip)]
    pub user_id: DbId,
    pub episode_id: DbId,
    pub comment_text: String,
    pub like_count: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateComment {
    pub comment_text: Option<String>,
    pub like_count: Option<i64>,
    pub version: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct CommentFilter {
    pub comment_text: String,
    pub episode_id: Option<DbId>,
}

fn check_comment(v: &mut Validator, comment_text: &str, like_count: i64) {
    v.check(!comment_text.is_empty(), "comment_text", "must be provided");
    v.check(
        comment_text.len() <= 100,
        "comment_text",
        "must not be more than 100 bytes long",
    );
    v.check(like_count >= 0, "like_count", "must not be negative");
}

impl Validate for Comment {
    fn validate(&self, v: &mut Validator) {
        check_comment(v, &self.comment_text, self.like_count);
    }
}

impl Validate for NewComment {
    fn validate(&self, v: &mut Validator) {
        v.check(self.episode_id > 0, "episode_id", "must be provided");
        check_comment(v, &self.comment_text, self.like_count);
    }
}

impl Versioned for Comment {
    fn version(&self) -> i32 {
        self.version
    }

    fn set_version(&mut self, version: i32) {
        self.version = version;
    }
}

impl Changeset<Comment> for UpdateComment {
    fn expected_version(&self) -> Option<i32> {
        self.version
    }

    fn apply(self, comment: &mut Comment) {
        if let Some(text) = self.comment_text {
            comment.comment_text = text;
        }
        if let Some(likes) = self.like_count {
            comment.like_count = likes;
        }
    }
}

impl Resource for Comment {
    const ENTITY: &'static str = "comment";
    const COLLECTION: &'static str = "comments";
    const SORT_SAFELIST: &'static [&'static str] = SORT_SAFELIST;

    type Draft = NewComment;
    type Changes = UpdateComment;
    type Filter = CommentFilter;

    fn id(&self) -> DbId {
        self.id
    }

    fn assign_author(draft: &mut NewComment, user_id: DbId) {
        draft.user_id = user_id;
    }
}
