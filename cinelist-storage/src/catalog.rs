//! Catalog storage seam.
//!
//! [`CatalogStore`] is the read side of the movies/directors schema and
//! [`SessionLookup`] resolves session tokens issued by the authentication
//! provider. The Postgres client in `cinelist-api` implements both;
//! [`InMemoryCatalog`] implements both for development and tests.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::NaiveDate;
use cinelist_core::{
    new_row_id, Director, DirectorProfile, DirectorSummary, Movie, MovieListEntry, MovieSummary,
    MovieWithDirector, Session, StorageError, StorageResult, User,
};
use uuid::Uuid;

/// Read access to movies and directors.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// One movie left-joined with its director's profile.
    async fn find_movie(&self, id: Uuid) -> StorageResult<Option<MovieWithDirector>>;

    /// Every movie left-joined with a director summary.
    async fn list_movies(&self) -> StorageResult<Vec<MovieListEntry>>;

    async fn find_director(&self, id: Uuid) -> StorageResult<Option<Director>>;

    async fn list_directors(&self) -> StorageResult<Vec<Director>>;

    /// Movies directed by one director.
    async fn movies_for_director(&self, director_id: Uuid) -> StorageResult<Vec<MovieSummary>>;

    /// Movies for several directors in one round trip, grouped by director.
    ///
    /// Directors without movies may be absent from the map.
    async fn movies_for_directors(
        &self,
        director_ids: &[Uuid],
    ) -> StorageResult<HashMap<Uuid, Vec<MovieSummary>>>;
}

/// A session row joined with its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionWithUser {
    pub session: Session,
    pub user: User,
}

/// Resolves session tokens.
#[async_trait]
pub trait SessionLookup: Send + Sync {
    /// Find the session with the given token, regardless of expiry.
    async fn find_session(&self, token: &str) -> StorageResult<Option<SessionWithUser>>;
}

#[derive(Debug, Default)]
struct CatalogData {
    directors: Vec<Director>,
    movies: Vec<Movie>,
    users: Vec<User>,
    sessions: Vec<Session>,
    /// When set, every call fails with this backend error.
    failure: Option<String>,
}

/// Catalog held in process memory, with the foreign key rules of the schema.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    data: RwLock<CatalogData>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_director(&self, director: Director) -> StorageResult<()> {
        let mut data = self.data.write().map_err(|_| StorageError::LockPoisoned)?;
        data.directors.push(director);
        Ok(())
    }

    /// Insert a movie. A `director_id` that does not exist is rejected.
    pub fn insert_movie(&self, movie: Movie) -> StorageResult<()> {
        let mut data = self.data.write().map_err(|_| StorageError::LockPoisoned)?;
        if let Some(director_id) = movie.director_id {
            if !data.directors.iter().any(|d| d.id == director_id) {
                return Err(StorageError::backend(format!(
                    "movies.director_id references missing director {}",
                    director_id
                )));
            }
        }
        data.movies.push(movie);
        Ok(())
    }

    /// Delete a director, setting `director_id` to NULL on their movies.
    pub fn delete_director(&self, id: Uuid) -> StorageResult<bool> {
        let mut data = self.data.write().map_err(|_| StorageError::LockPoisoned)?;
        let before = data.directors.len();
        data.directors.retain(|d| d.id != id);
        let removed = data.directors.len() != before;
        for movie in data.movies.iter_mut().filter(|m| m.director_id == Some(id)) {
            movie.director_id = None;
        }
        Ok(removed)
    }

    pub fn insert_user(&self, user: User) -> StorageResult<()> {
        let mut data = self.data.write().map_err(|_| StorageError::LockPoisoned)?;
        data.users.push(user);
        Ok(())
    }

    /// Insert a session. Tokens are unique and the user must exist.
    pub fn insert_session(&self, session: Session) -> StorageResult<()> {
        let mut data = self.data.write().map_err(|_| StorageError::LockPoisoned)?;
        if data.sessions.iter().any(|s| s.token == session.token) {
            return Err(StorageError::backend("sessions.token must be unique"));
        }
        if !data.users.iter().any(|u| u.id == session.user_id) {
            return Err(StorageError::backend(format!(
                "sessions.user_id references missing user {}",
                session.user_id
            )));
        }
        data.sessions.push(session);
        Ok(())
    }

    /// Delete a user and, by cascade, their sessions.
    pub fn delete_user(&self, id: Uuid) -> StorageResult<bool> {
        let mut data = self.data.write().map_err(|_| StorageError::LockPoisoned)?;
        let before = data.users.len();
        data.users.retain(|u| u.id != id);
        data.sessions.retain(|s| s.user_id != id);
        Ok(data.users.len() != before)
    }

    /// Make every subsequent read fail with a backend error, or clear the failure.
    pub fn set_failure(&self, reason: Option<&str>) -> StorageResult<()> {
        let mut data = self.data.write().map_err(|_| StorageError::LockPoisoned)?;
        data.failure = reason.map(str::to_string);
        Ok(())
    }

    fn read<T>(&self, f: impl FnOnce(&CatalogData) -> T) -> StorageResult<T> {
        let data = self.data.read().map_err(|_| StorageError::LockPoisoned)?;
        if let Some(reason) = &data.failure {
            return Err(StorageError::backend(reason));
        }
        Ok(f(&data))
    }
}

/// Catalog seeded with a handful of directors and movies, including one
/// movie without a director.
pub fn sample_catalog() -> StorageResult<InMemoryCatalog> {
    let catalog = InMemoryCatalog::new();
    let at = |y: i32, m: u32, d: u32| {
        NaiveDate::from_ymd_opt(y, m, d).and_then(|date| date.and_hms_opt(0, 0, 0))
    };
    let created = at(2024, 1, 1).unwrap_or_default();

    let directors = [
        ("Agnes Varda", "French", at(1928, 5, 30)),
        ("Yasujiro Ozu", "Japanese", at(1903, 12, 12)),
        ("Satyajit Ray", "Indian", at(1921, 5, 2)),
    ];
    let mut ids = Vec::with_capacity(directors.len());
    for (name, nationality, birth_date) in directors {
        let id = new_row_id();
        ids.push(id);
        catalog.insert_director(Director {
            id,
            name: name.to_string(),
            bio: None,
            birth_date,
            nationality: Some(nationality.to_string()),
            image_url: None,
            created_at: created,
            updated_at: created,
        })?;
    }

    let movies = [
        ("Cleo from 5 to 7", Some(ids[0]), at(1962, 4, 11), 90, "Drama"),
        ("Vagabond", Some(ids[0]), at(1985, 12, 4), 105, "Drama"),
        ("Tokyo Story", Some(ids[1]), at(1953, 11, 3), 136, "Drama"),
        ("Pather Panchali", Some(ids[2]), at(1955, 8, 26), 125, "Drama"),
        ("Untitled Restoration", None, None, 80, "Documentary"),
    ];
    for (title, director_id, release_date, duration, genre) in movies {
        catalog.insert_movie(Movie {
            id: new_row_id(),
            title: title.to_string(),
            description: None,
            release_date,
            duration: Some(duration),
            genre: Some(genre.to_string()),
            rating: None,
            poster_url: None,
            director_id,
            created_at: created,
            updated_at: created,
        })?;
    }
    Ok(catalog)
}

fn director_movies(data: &CatalogData, director_id: Uuid) -> Vec<MovieSummary> {
    data.movies
        .iter()
        .filter(|m| m.director_id == Some(director_id))
        .map(MovieSummary::from)
        .collect()
}

fn director_of<'a>(data: &'a CatalogData, movie: &Movie) -> Option<&'a Director> {
    movie
        .director_id
        .and_then(|id| data.directors.iter().find(|d| d.id == id))
}

#[async_trait]
impl CatalogStore for InMemoryCatalog {
    async fn find_movie(&self, id: Uuid) -> StorageResult<Option<MovieWithDirector>> {
        self.read(|data| {
            data.movies.iter().find(|m| m.id == id).map(|movie| MovieWithDirector {
                movie: movie.clone(),
                director: director_of(data, movie).map(DirectorProfile::from),
            })
        })
    }

    async fn list_movies(&self) -> StorageResult<Vec<MovieListEntry>> {
        self.read(|data| {
            data.movies
                .iter()
                .map(|movie| MovieListEntry {
                    movie: movie.clone(),
                    director: director_of(data, movie).map(DirectorSummary::from),
                })
                .collect()
        })
    }

    async fn find_director(&self, id: Uuid) -> StorageResult<Option<Director>> {
        self.read(|data| data.directors.iter().find(|d| d.id == id).cloned())
    }

    async fn list_directors(&self) -> StorageResult<Vec<Director>> {
        self.read(|data| data.directors.clone())
    }

    async fn movies_for_director(&self, director_id: Uuid) -> StorageResult<Vec<MovieSummary>> {
        self.read(|data| director_movies(data, director_id))
    }

    async fn movies_for_directors(
        &self,
        director_ids: &[Uuid],
    ) -> StorageResult<HashMap<Uuid, Vec<MovieSummary>>> {
        self.read(|data| {
            director_ids
                .iter()
                .map(|id| (*id, director_movies(data, *id)))
                .filter(|(_, movies)| !movies.is_empty())
                .collect()
        })
    }
}

#[async_trait]
impl SessionLookup for InMemoryCatalog {
    async fn find_session(&self, token: &str) -> StorageResult<Option<SessionWithUser>> {
        self.read(|data| {
            let session = data.sessions.iter().find(|s| s.token == token)?;
            let user = data.users.iter().find(|u| u.id == session.user_id)?;
            Some(SessionWithUser {
                session: session.clone(),
                user: user.clone(),
            })
        })
    }
}
