//! Catalog Procedures
//!
//! Authenticated reads over movies and directors. Each call writes exactly
//! one security record. Lookup misses surface as 404 with the id in the
//! message; any other failure is audited with its original message and
//! reaches the client only as a generic 500.

use std::sync::Arc;

use cinelist_core::{
    DirectorWithMovies, EntityType, MovieListEntry, MovieWithDirector, StorageError,
};
use cinelist_storage::CatalogStore;
use uuid::Uuid;

use crate::audit::{SecurityEvent, SecurityLogger};
use crate::auth::AuthContext;
use crate::error::{ApiError, ApiResult};

/// The four catalog procedures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogProcedure {
    MoviesGetOne,
    MoviesGetMany,
    DirectorsGetOne,
    DirectorsGetMany,
}

impl CatalogProcedure {
    /// Audit action name.
    pub fn action(&self) -> &'static str {
        match self {
            CatalogProcedure::MoviesGetOne => "movies.getOne",
            CatalogProcedure::MoviesGetMany => "movies.getMany",
            CatalogProcedure::DirectorsGetOne => "directors.getOne",
            CatalogProcedure::DirectorsGetMany => "directors.getMany",
        }
    }

    pub fn entity(&self) -> EntityType {
        match self {
            CatalogProcedure::MoviesGetOne | CatalogProcedure::MoviesGetMany => EntityType::Movie,
            CatalogProcedure::DirectorsGetOne | CatalogProcedure::DirectorsGetMany => {
                EntityType::Director
            }
        }
    }

    /// Message returned to the client when the store fails.
    pub fn failure_message(&self) -> &'static str {
        match self {
            CatalogProcedure::MoviesGetOne => "Failed to fetch movie",
            CatalogProcedure::MoviesGetMany => "Failed to fetch movies",
            CatalogProcedure::DirectorsGetOne => "Failed to fetch director",
            CatalogProcedure::DirectorsGetMany => "Failed to fetch directors",
        }
    }
}

/// Outcome of the store part of a procedure, before auditing.
enum Lookup<T> {
    Found(T),
    Missing,
}

/// Catalog read procedures with auditing.
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
    audit: SecurityLogger,
}

impl std::fmt::Debug for CatalogService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogService")
            .field("audit", &self.audit)
            .finish_non_exhaustive()
    }
}

impl CatalogService {
    pub fn new(store: Arc<dyn CatalogStore>, audit: SecurityLogger) -> Self {
        Self { store, audit }
    }

    /// `movies.getOne`: a movie with its director's full profile.
    pub async fn get_movie(&self, actor: &AuthContext, id: &str) -> ApiResult<MovieWithDirector> {
        let procedure = CatalogProcedure::MoviesGetOne;
        let lookup = match Uuid::parse_str(id) {
            Ok(uuid) => self.store.find_movie(uuid).await.map(found_or_missing),
            Err(_) => Ok(Lookup::Missing),
        };
        self.finish(procedure, actor, Some(id), lookup)
    }

    /// `movies.getMany`: every movie with a director summary.
    pub async fn list_movies(&self, actor: &AuthContext) -> ApiResult<Vec<MovieListEntry>> {
        let lookup = self.store.list_movies().await.map(Lookup::Found);
        self.finish(CatalogProcedure::MoviesGetMany, actor, None, lookup)
    }

    /// `directors.getOne`: a director with the movies they directed.
    pub async fn get_director(
        &self,
        actor: &AuthContext,
        id: &str,
    ) -> ApiResult<DirectorWithMovies> {
        let procedure = CatalogProcedure::DirectorsGetOne;
        let lookup = match Uuid::parse_str(id) {
            Ok(uuid) => self.load_director(uuid).await,
            Err(_) => Ok(Lookup::Missing),
        };
        self.finish(procedure, actor, Some(id), lookup)
    }

    /// `directors.getMany`: every director, each with its own movies.
    pub async fn list_directors(&self, actor: &AuthContext) -> ApiResult<Vec<DirectorWithMovies>> {
        let lookup = self.load_directors().await.map(Lookup::Found);
        self.finish(CatalogProcedure::DirectorsGetMany, actor, None, lookup)
    }

    async fn load_director(&self, id: Uuid) -> Result<Lookup<DirectorWithMovies>, StorageError> {
        let Some(director) = self.store.find_director(id).await? else {
            return Ok(Lookup::Missing);
        };
        let movies = self.store.movies_for_director(id).await?;
        Ok(Lookup::Found(DirectorWithMovies { director, movies }))
    }

    async fn load_directors(&self) -> Result<Vec<DirectorWithMovies>, StorageError> {
        let directors = self.store.list_directors().await?;
        if directors.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = directors.iter().map(|d| d.id).collect();
        let mut by_director = self.store.movies_for_directors(&ids).await?;
        Ok(directors
            .into_iter()
            .map(|director| {
                let movies = by_director.remove(&director.id).unwrap_or_default();
                DirectorWithMovies { director, movies }
            })
            .collect())
    }

    fn finish<T>(
        &self,
        procedure: CatalogProcedure,
        actor: &AuthContext,
        resource_id: Option<&str>,
        lookup: Result<Lookup<T>, StorageError>,
    ) -> ApiResult<T> {
        let entity = procedure.entity();
        let event = |e: SecurityEvent| {
            let e = e
                .with_user(actor.user_id.clone())
                .with_resource(entity.as_str(), resource_id.map(str::to_string));
            match resource_id {
                Some(id) => e.with_details(serde_json::json!({ "input": { "id": id } })),
                None => e,
            }
        };

        match lookup {
            Ok(Lookup::Found(value)) => {
                self.audit.log(event(SecurityEvent::success(procedure.action())));
                Ok(value)
            }
            Ok(Lookup::Missing) => {
                let id = resource_id.unwrap_or_default();
                self.audit.log(event(
                    SecurityEvent::failure(procedure.action())
                        .with_error(format!("{} not found", entity.display_name())),
                ));
                Err(ApiError::entity_not_found(entity.display_name(), id))
            }
            Err(err) => {
                self.audit.log(event(
                    SecurityEvent::failure(procedure.action()).with_error(err.to_string()),
                ));
                Err(ApiError::internal_error(procedure.failure_message()))
            }
        }
    }
}

fn found_or_missing<T>(value: Option<T>) -> Lookup<T> {
    match value {
        Some(v) => Lookup::Found(v),
        None => Lookup::Missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{AuditStatus, MemoryAuditSink};
    use crate::auth::AuthMethod;
    use crate::error::ErrorCode;
    use cinelist_storage::{sample_catalog, InMemoryCatalog};

    struct Fixture {
        catalog: Arc<InMemoryCatalog>,
        sink: Arc<MemoryAuditSink>,
        service: CatalogService,
        actor: AuthContext,
    }

    fn fixture() -> Fixture {
        let catalog = Arc::new(sample_catalog().expect("sample catalog"));
        let sink = Arc::new(MemoryAuditSink::new());
        let service = CatalogService::new(catalog.clone(), SecurityLogger::new(sink.clone()));
        let actor = AuthContext::new("user-1".to_string(), vec![], AuthMethod::Session);
        Fixture {
            catalog,
            sink,
            service,
            actor,
        }
    }

    #[tokio::test]
    async fn test_get_movie_success_is_audited() -> ApiResult<()> {
        let f = fixture();
        let listed = f.service.list_movies(&f.actor).await?;
        let target = listed
            .iter()
            .find(|m| m.movie.title == "Tokyo Story")
            .expect("seeded movie");
        let id = target.movie.id.to_string();

        let movie = f.service.get_movie(&f.actor, &id).await?;
        assert_eq!(
            movie.director.map(|d| d.name),
            Some("Yasujiro Ozu".to_string())
        );

        let events = f.sink.events();
        assert_eq!(events.len(), 2);
        let last = &events[1];
        assert_eq!(last.action, "movies.getOne");
        assert_eq!(last.status, AuditStatus::Success);
        assert_eq!(last.user_id.as_deref(), Some("user-1"));
        assert_eq!(last.resource.as_deref(), Some("movie"));
        assert_eq!(last.resource_id.as_deref(), Some(id.as_str()));
        assert_eq!(
            last.details,
            Some(serde_json::json!({ "input": { "id": id.clone() } }))
        );
        assert_eq!(events[0].details, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_get_movie_miss_is_not_found() {
        let f = fixture();
        let id = Uuid::new_v4().to_string();
        let err = f.service.get_movie(&f.actor, &id).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::EntityNotFound);
        assert_eq!(err.message, format!("Movie with id {} not found", id));
        let events = f.sink.events();
        assert_eq!(events[0].status, AuditStatus::Failure);
        assert_eq!(events[0].error.as_deref(), Some("Movie not found"));
    }

    #[tokio::test]
    async fn test_malformed_id_is_not_found() {
        let f = fixture();
        let err = f.service.get_director(&f.actor, "not-a-uuid").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::EntityNotFound);
        assert_eq!(err.message, "Director with id not-a-uuid not found");
        let events = f.sink.events();
        let event = &events[0];
        assert_eq!(event.error.as_deref(), Some("Director not found"));
        assert!(event
            .format_line()
            .ends_with(r#"Error: Director not found | Details: {"input":{"id":"not-a-uuid"}}"#));
    }

    #[tokio::test]
    async fn test_store_failure_is_opaque() -> Result<(), StorageError> {
        let f = fixture();
        f.catalog.set_failure(Some("connection reset by peer"))?;

        let err = f.service.list_movies(&f.actor).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InternalError);
        assert_eq!(err.message, "Failed to fetch movies");

        let err = f
            .service
            .get_director(&f.actor, &Uuid::new_v4().to_string())
            .await
            .unwrap_err();
        assert_eq!(err.message, "Failed to fetch director");

        let events = f.sink.events();
        assert!(events
            .iter()
            .all(|e| e.error.as_deref().is_some_and(|m| m.contains("connection reset"))));
        Ok(())
    }

    #[tokio::test]
    async fn test_list_directors_attaches_each_directors_movies() -> ApiResult<()> {
        let f = fixture();
        let directors = f.service.list_directors(&f.actor).await?;
        assert_eq!(directors.len(), 3);

        for entry in &directors {
            let expected = match entry.director.name.as_str() {
                "Agnes Varda" => 2,
                _ => 1,
            };
            assert_eq!(entry.movies.len(), expected, "{}", entry.director.name);
        }
        assert_eq!(f.sink.events()[0].action, "directors.getMany");
        Ok(())
    }

    #[tokio::test]
    async fn test_get_director_with_movies() -> ApiResult<()> {
        let f = fixture();
        let directors = f.service.list_directors(&f.actor).await?;
        let varda = directors
            .iter()
            .find(|d| d.director.name == "Agnes Varda")
            .expect("seeded director");

        let loaded = f
            .service
            .get_director(&f.actor, &varda.director.id.to_string())
            .await?;
        let mut titles: Vec<_> = loaded.movies.iter().map(|m| m.title.as_str()).collect();
        titles.sort();
        assert_eq!(titles, vec!["Cleo from 5 to 7", "Vagabond"]);
        Ok(())
    }
}
