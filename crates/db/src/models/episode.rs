//! Episode entity model and DTOs.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Utc};
use episodic_core::types::{DbId, Timestamp};
use episodic_core::validator::{unique, Validator};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sqlx::FromRow;

use crate::resource::{Changeset, Resource, Validate, Versioned};

/// Earliest year a moving picture could have been produced.
pub const MIN_YEAR: i32 = 1888;

pub const SORT_SAFELIST: &[&str] = &[
    "id", "title", "year", "runtime", "-id", "-title", "-year", "-runtime",
];

/// Running time in minutes. Travels over JSON as `"<n> mins"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, sqlx::Type)]
#[sqlx(transparent)]
pub struct Runtime(pub i32);

#[derive(Debug, thiserror::Error)]
#[error("invalid runtime format")]
pub struct InvalidRuntimeFormat;

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} mins", self.0)
    }
}

impl FromStr for Runtime {
    type Err = InvalidRuntimeFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (minutes, unit) = s.split_once(' ').ok_or(InvalidRuntimeFormat)?;
        if unit != "mins" {
            return Err(InvalidRuntimeFormat);
        }
        minutes
            .parse::<i32>()
            .map(Runtime)
            .map_err(|_| InvalidRuntimeFormat)
    }
}

impl Serialize for Runtime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Runtime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// An episode row from the `episodes` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Episode {
    pub id: DbId,
    #[serde(skip)]
    pub created_at: Timestamp,
    pub title: String,
    pub year: i32,
    pub runtime: Runtime,
    pub characters: Vec<String>,
    pub version: i32,
}

/// DTO for creating an episode. Missing fields decode to their zero value
/// and are reported by validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewEpisode {
    pub title: String,
    pub year: i32,
    pub runtime: Runtime,
    pub characters: Option<Vec<String>>,
}

/// DTO for a partial update. `version` is the version the caller last read.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEpisode {
    pub title: Option<String>,
    pub year: Option<i32>,
    pub runtime: Option<Runtime>,
    pub characters: Option<Vec<String>>,
    pub version: Option<i32>,
}

/// Listing filters for `GET /v1/episodes`.
#[derive(Debug, Clone, Default)]
pub struct EpisodeFilter {
    /// Every word must appear in the title. Empty matches all.
    pub title: String,
    /// The episode must list every one of these characters. Empty matches all.
    pub characters: Vec<String>,
}

fn check_episode(
    v: &mut Validator,
    title: &str,
    year: i32,
    runtime: Runtime,
    characters: Option<&[String]>,
) {
    v.check(!title.is_empty(), "title", "must be provided");
    v.check(title.len() <= 500, "title", "must not be more than 500 bytes long");

    v.check(year != 0, "year", "must be provided");
    v.check(year >= MIN_YEAR, "year", "must be greater than 1888");
    v.check(year <= Utc::now().year(), "year", "must not be in the future");

    v.check(runtime.0 != 0, "runtime", "must be provided");
    v.check(runtime.0 > 0, "runtime", "must be a positive integer");

    match characters {
        None => v.add_error("characters", "must be provided"),
        Some(names) => {
            v.check(!names.is_empty(), "characters", "must contain at least 1 character");
            v.check(names.len() <= 20, "characters", "must not contain more than 20 characters");
            v.check(unique(names), "characters", "must not contain duplicate values");
        }
    }
}

impl Validate for Episode {
    fn validate(&self, v: &mut Validator) {
        check_episode(v, &self.title, self.year, self.runtime, Some(&self.characters));
    }
}

impl Validate for NewEpisode {
    fn validate(&self, v: &mut Validator) {
        check_episode(v, &self.title, self.year, self.runtime, self.characters.as_deref());
    }
}

impl Versioned for Episode {
    fn version(&self) -> i32 {
        self.version
    }

    fn set_version(&mut self, version: i32) {
        self.version = version;
    }
}

impl Changeset<Episode> for UpdateEpisode {
    fn expected_version(&self) -> Option<i32> {
        self.version
    }

    fn apply(self, episode: &mut Episode) {
        if let Some(title) = self.title {
            episode.title = title;
        }
        if let Some(year) = self.year {
            episode.year = year;
        }
        if let Some(runtime) = self.runtime {
            episode.runtime = runtime;
        }
        if let Some(characters) = self.characters {
            episode.characters = characters;
        }
    }
}

impl Resource for Episode {
    const ENTITY: &'static str = "episode";
    const COLLECTION: &'static str = "episodes";
    const SORT_SAFELIST: &'static [&'static str] = SORT_SAFELIST;

    type Draft = NewEpisode;
    type Changes = UpdateEpisode;
    type Filter = EpisodeFilter;

    fn id(&self) -> DbId {
        self.id
    }
}
