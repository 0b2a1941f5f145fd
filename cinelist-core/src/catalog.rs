//! Movie catalog rows and the join shapes returned by the catalog procedures.
//!
//! `movies.director_id` is nullable and set to NULL when the director row is
//! deleted, so every join from a movie to its director yields an `Option`.

use crate::identity::RowTimestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A row of the `directors` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Director {
    pub id: Uuid,
    pub name: String,
    pub bio: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<chrono::NaiveDateTime>))]
    pub birth_date: Option<RowTimestamp>,
    pub nationality: Option<String>,
    pub image_url: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = chrono::NaiveDateTime))]
    pub created_at: RowTimestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = chrono::NaiveDateTime))]
    pub updated_at: RowTimestamp,
}

/// A row of the `movies` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<chrono::NaiveDateTime>))]
    pub release_date: Option<RowTimestamp>,
    /// Running time in minutes.
    pub duration: Option<i32>,
    pub genre: Option<String>,
    /// Certification such as "PG-13" or "R".
    pub rating: Option<String>,
    pub poster_url: Option<String>,
    pub director_id: Option<Uuid>,
    #[cfg_attr(feature = "openapi", schema(value_type = chrono::NaiveDateTime))]
    pub created_at: RowTimestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = chrono::NaiveDateTime))]
    pub updated_at: RowTimestamp,
}

/// Director columns joined onto a single movie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct DirectorProfile {
    pub id: Uuid,
    pub name: String,
    pub bio: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<chrono::NaiveDateTime>))]
    pub birth_date: Option<RowTimestamp>,
    pub nationality: Option<String>,
    pub image_url: Option<String>,
}

impl From<&Director> for DirectorProfile {
    fn from(d: &Director) -> Self {
        Self {
            id: d.id,
            name: d.name.clone(),
            bio: d.bio.clone(),
            birth_date: d.birth_date,
            nationality: d.nationality.clone(),
            image_url: d.image_url.clone(),
        }
    }
}

/// Director columns joined onto each movie of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct DirectorSummary {
    pub id: Uuid,
    pub name: String,
    pub nationality: Option<String>,
}

impl From<&Director> for DirectorSummary {
    fn from(d: &Director) -> Self {
        Self {
            id: d.id,
            name: d.name.clone(),
            nationality: d.nationality.clone(),
        }
    }
}

/// Movie columns attached to a director.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct MovieSummary {
    pub id: Uuid,
    pub title: String,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<chrono::NaiveDateTime>))]
    pub release_date: Option<RowTimestamp>,
    pub genre: Option<String>,
    pub rating: Option<String>,
    pub poster_url: Option<String>,
}

impl From<&Movie> for MovieSummary {
    fn from(m: &Movie) -> Self {
        Self {
            id: m.id,
            title: m.title.clone(),
            release_date: m.release_date,
            genre: m.genre.clone(),
            rating: m.rating.clone(),
            poster_url: m.poster_url.clone(),
        }
    }
}

/// A movie left-joined with its director's full profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MovieWithDirector {
    #[serde(flatten)]
    pub movie: Movie,
    pub director: Option<DirectorProfile>,
}

/// A movie left-joined with a director summary, as returned by listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MovieListEntry {
    #[serde(flatten)]
    pub movie: Movie,
    pub director: Option<DirectorSummary>,
}

/// A director with the movies they directed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DirectorWithMovies {
    #[serde(flatten)]
    pub director: Director,
    pub movies: Vec<MovieSummary>,
}
