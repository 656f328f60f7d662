//! Character entity model and DTOs.

use episodic_core::types::DbId;
use episodic_core::validator::Validator;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::resource::{Changeset, Resource, Validate, Versioned};

pub const MAX_AGE: i64 = 1000;

pub const SORT_SAFELIST: &[&str] = &["id", "name", "age", "-id", "-name", "-age"];

/// A character row from the `characters` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Character {
    pub id: DbId,
    pub episode_id: DbId,
    pub name: String,
    pub age: i64,
    pub version: i32,
}

/// DTO for creating a new character.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewCharacter {
    pub episode_id: DbId,
    pub name: String,
    pub age: Option<i64>,
}

/// DTO for updating an existing character. All fields but `version` are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCharacter {
    pub name: Option<String>,
    pub age: Option<i64>,
    pub version: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct CharacterFilter {
    pub name: String,
    /// Restrict to characters appearing in one episode.
    pub episode_id: Option<DbId>,
}

fn check_character(v: &mut Validator, name: &str, age: Option<i64>) {
    v.check(!name.is_empty(), "name", "must be provided");
    v.check(name.len() <= 500, "name", "must not be more than 500 bytes long");

    match age {
        None => v.add_error("age", "must be provided"),
        Some(age) => {
            v.check(age >= 0, "age", "must not be negative");
            v.check(age <= MAX_AGE, "age", "must not be more than 1000");
        }
    }
}

impl Validate for Character {
    fn validate(&self, v: &mut Validator) {
        check_character(v, &self.name, Some(self.age));
    }
}

impl Validate for NewCharacter {
    fn validate(&self, v: &mut Validator) {
        v.check(self.episode_id > 0, "episode_id", "must be provided");
        check_character(v, &self.name, self.age);
    }
}

impl Versioned for Character {
    fn version(&self) -> i32 {
        self.version
    }

    fn set_version(&mut self, version: i32) {
        self.version = version;
    }
}

impl Changeset<Character> for UpdateCharacter {
    fn expected_version(&self) -> Option<i32> {
        self.version
    }

    fn apply(self, character: &mut Character) {
        if let Some(name) = self.name {
            character.name = name;
        }
        if let Some(age) = self.age {
            character.age = age;
        }
    }
}

impl Resource for Character {
    const ENTITY: &'static str = "character";
    const COLLECTION: &'static str = "characters";
    const SORT_SAFELIST: &'static [&'static str] = SORT_SAFELIST;

    type Draft = NewCharacter;
    type Changes = UpdateCharacter;
    type Filter = CharacterFilter;

    fn id(&self) -> DbId {
        self.id
    }
}
