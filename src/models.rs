use jiff::{Timestamp, civil::Date};
use serde::{Deserialize, Serialize};

use crate::{
    error::{CatalogError, CatalogResult},
    object_id::ObjectId,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Series {
    Saga,
    Animated,
    Anthology,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trilogy {
    Original,
    Prequel,
    Sequel,
}

/// The mutable attributes of a film: what clients send on create and update,
/// and what an update replaces wholesale.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilmDetails {
    pub title: String,
    #[serde(default)]
    pub episode_number: Option<i32>,
    #[serde(default)]
    pub storyline: String,
    pub series: Series,
    #[serde(default)]
    pub trilogy: Option<Trilogy>,
    pub release_date: Date,
    #[serde(default)]
    pub director: String,
    #[serde(default)]
    pub screenwriters: Vec<String>,
    #[serde(default)]
    pub story_by: Vec<String>,
    #[serde(default)]
    pub producers: Vec<String>,
    pub imdb_score: f64,
}

impl FilmDetails {
    pub fn validate(&self) -> CatalogResult<()> {
        if self.title.trim().is_empty() {
            return Err(CatalogError::InvalidFilm("title must not be empty".to_string()));
        }
        if !self.imdb_score.is_finite() {
            return Err(CatalogError::InvalidFilm("imdbScore must be a finite number".to_string()));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Film {
    pub id: ObjectId,
    #[serde(flatten)]
    pub details: FilmDetails,
    pub created_at: Timestamp,
    pub edited_at: Timestamp,
}
