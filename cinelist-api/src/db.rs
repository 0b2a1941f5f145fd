//! Database Connection Pool Module
//!
//! PostgreSQL connection pooling with deadpool-postgres, and the catalog and
//! session reads issued against the `directors`, `movies`, `sessions` and
//! `users` tables. Schema management happens outside this service.

use std::collections::HashMap;
use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use cinelist_core::{
    Director, DirectorProfile, DirectorSummary, Movie, MovieListEntry, MovieSummary,
    MovieWithDirector, Session, StorageError, StorageResult, User,
};
use cinelist_storage::{CatalogStore, SessionLookup, SessionWithUser};
use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime};
use tokio_postgres::{NoTls, Row};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::telemetry::metrics;

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// Connection timeout
    pub timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "cinelist".to_string(),
            user: "postgres".to_string(),
            password: "".to_string(),
            max_size: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("CINELIST_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("CINELIST_DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5432),
            dbname: std::env::var("CINELIST_DB_NAME").unwrap_or_else(|_| "cinelist".to_string()),
            user: std::env::var("CINELIST_DB_USER").unwrap_or_else(|_| "postgres".to_string()),
            password: std::env::var("CINELIST_DB_PASSWORD").unwrap_or_default(),
            max_size: std::env::var("CINELIST_DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(16),
            timeout: Duration::from_secs(
                std::env::var("CINELIST_DB_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }

    /// Create a connection pool from this configuration.
    pub fn create_pool(&self) -> ApiResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let mut pool_cfg = deadpool_postgres::PoolConfig::new(self.max_size);
        pool_cfg.timeouts.wait = Some(self.timeout);
        cfg.pool = Some(pool_cfg);

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| ApiError::database_error(format!("Failed to create pool: {}", e)))?;

        Ok(pool)
    }
}

// ============================================================================
// DATABASE CLIENT WRAPPER
// ============================================================================

const MOVIE_COLUMNS: &str = "m.id, m.title, m.description, m.release_date, m.duration, \
     m.genre, m.rating, m.poster_url, m.director_id, m.created_at, m.updated_at";

const DIRECTOR_COLUMNS: &str =
    "id, name, bio, birth_date, nationality, image_url, created_at, updated_at";

const MOVIE_SUMMARY_COLUMNS: &str = "id, title, release_date, genre, rating, poster_url";

/// Database client that wraps a connection pool.
#[derive(Clone)]
pub struct DbClient {
    pool: Pool,
}

impl DbClient {
    /// Create a new database client with the given pool.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create a new database client from configuration.
    pub fn from_config(config: &DbConfig) -> ApiResult<Self> {
        let pool = config.create_pool()?;
        Ok(Self::new(pool))
    }

    /// Get the current pool size for observability.
    pub fn pool_size(&self) -> usize {
        self.pool.status().size
    }

    /// Round-trip a trivial query. Used by the readiness probe.
    pub async fn ping(&self) -> ApiResult<()> {
        let conn = self.pool.get().await?;
        conn.query_one("SELECT 1", &[]).await?;
        Ok(())
    }

    async fn get_conn(&self) -> StorageResult<deadpool_postgres::Object> {
        self.pool.get().await.map_err(StorageError::backend)
    }

    async fn query(
        &self,
        sql: &str,
        params: &[&(dyn tokio_postgres::types::ToSql + Sync)],
    ) -> StorageResult<Vec<Row>> {
        let conn = self.get_conn().await?;
        conn.query(sql, params).await.map_err(StorageError::backend)
    }
}

/// Run a database operation and record its outcome and duration.
async fn timed<T, F>(operation: &str, entity: &str, fut: F) -> StorageResult<T>
where
    F: Future<Output = StorageResult<T>>,
{
    let start = Instant::now();
    let result = fut.await;
    if let Some(metrics) = metrics() {
        metrics.record_db_operation(
            operation,
            entity,
            result.is_ok(),
            start.elapsed().as_secs_f64(),
        );
    }
    if let Err(e) = &result {
        tracing::error!(operation, entity, error = %e, "Database operation failed");
    }
    result
}

// ============================================================================
// ROW MAPPING
// ============================================================================

fn get<'a, T: tokio_postgres::types::FromSql<'a>>(row: &'a Row, column: &str) -> StorageResult<T> {
    row.try_get(column).map_err(StorageError::backend)
}

fn movie_from_row(row: &Row) -> StorageResult<Movie> {
    Ok(Movie {
        id: get(row, "id")?,
        title: get(row, "title")?,
        description: get(row, "description")?,
        release_date: get(row, "release_date")?,
        duration: get(row, "duration")?,
        genre: get(row, "genre")?,
        rating: get(row, "rating")?,
        poster_url: get(row, "poster_url")?,
        director_id: get(row, "director_id")?,
        created_at: get(row, "created_at")?,
        updated_at: get(row, "updated_at")?,
    })
}

fn director_from_row(row: &Row) -> StorageResult<Director> {
    Ok(Director {
        id: get(row, "id")?,
        name: get(row, "name")?,
        bio: get(row, "bio")?,
        birth_date: get(row, "birth_date")?,
        nationality: get(row, "nationality")?,
        image_url: get(row, "image_url")?,
        created_at: get(row, "created_at")?,
        updated_at: get(row, "updated_at")?,
    })
}

fn movie_summary_from_row(row: &Row) -> StorageResult<MovieSummary> {
    Ok(MovieSummary {
        id: get(row, "id")?,
        title: get(row, "title")?,
        release_date: get(row, "release_date")?,
        genre: get(row, "genre")?,
        rating: get(row, "rating")?,
        poster_url: get(row, "poster_url")?,
    })
}

/// Left-joined director columns are prefixed `d_` and all NULL on a miss.
fn joined_profile(row: &Row) -> StorageResult<Option<DirectorProfile>> {
    let Some(id) = get::<Option<Uuid>>(row, "d_id")? else {
        return Ok(None);
    };
    Ok(Some(DirectorProfile {
        id,
        name: get(row, "d_name")?,
        bio: get(row, "d_bio")?,
        birth_date: get(row, "d_birth_date")?,
        nationality: get(row, "d_nationality")?,
        image_url: get(row, "d_image_url")?,
    }))
}

fn joined_summary(row: &Row) -> StorageResult<Option<DirectorSummary>> {
    let Some(id) = get::<Option<Uuid>>(row, "d_id")? else {
        return Ok(None);
    };
    Ok(Some(DirectorSummary {
        id,
        name: get(row, "d_name")?,
        nationality: get(row, "d_nationality")?,
    }))
}

fn session_with_user_from_row(row: &Row) -> StorageResult<SessionWithUser> {
    let user = User {
        id: get(row, "u_id")?,
        name: get(row, "u_name")?,
        email: get(row, "u_email")?,
        email_verified: get::<Option<bool>>(row, "u_email_verified")?.unwrap_or(false),
        image: get(row, "u_image")?,
        created_at: get(row, "u_created_at")?,
        updated_at: get(row, "u_updated_at")?,
    };
    let session = Session {
        id: get(row, "id")?,
        user_id: get(row, "user_id")?,
        expires_at: get(row, "expires_at")?,
        token: get(row, "token")?,
        ip_address: get(row, "ip_address")?,
        user_agent: get(row, "user_agent")?,
        created_at: get(row, "created_at")?,
        updated_at: get(row, "updated_at")?,
    };
    Ok(SessionWithUser { session, user })
}

// ============================================================================
// CATALOG
// ============================================================================

#[async_trait]
impl CatalogStore for DbClient {
    async fn find_movie(&self, id: Uuid) -> StorageResult<Option<MovieWithDirector>> {
        timed("get", "movie", async {
            let sql = format!(
                "SELECT {MOVIE_COLUMNS}, d.id AS d_id, d.name AS d_name, d.bio AS d_bio, \
                 d.birth_date AS d_birth_date, d.nationality AS d_nationality, \
                 d.image_url AS d_image_url \
                 FROM movies m LEFT JOIN directors d ON m.director_id = d.id \
                 WHERE m.id = $1 LIMIT 1"
            );
            let rows = self.query(&sql, &[&id]).await?;
            rows.first()
                .map(|row| {
                    Ok(MovieWithDirector {
                        movie: movie_from_row(row)?,
                        director: joined_profile(row)?,
                    })
                })
                .transpose()
        })
        .await
    }

    async fn list_movies(&self) -> StorageResult<Vec<MovieListEntry>> {
        timed("list", "movie", async {
            let sql = format!(
                "SELECT {MOVIE_COLUMNS}, d.id AS d_id, d.name AS d_name, \
                 d.nationality AS d_nationality \
                 FROM movies m LEFT JOIN directors d ON m.director_id = d.id"
            );
            self.query(&sql, &[])
                .await?
                .iter()
                .map(|row| {
                    Ok(MovieListEntry {
                        movie: movie_from_row(row)?,
                        director: joined_summary(row)?,
                    })
                })
                .collect()
        })
        .await
    }

    async fn find_director(&self, id: Uuid) -> StorageResult<Option<Director>> {
        timed("get", "director", async {
            let sql = format!("SELECT {DIRECTOR_COLUMNS} FROM directors WHERE id = $1 LIMIT 1");
            self.query(&sql, &[&id])
                .await?
                .first()
                .map(director_from_row)
                .transpose()
        })
        .await
    }

    async fn list_directors(&self) -> StorageResult<Vec<Director>> {
        timed("list", "director", async {
            let sql = format!("SELECT {DIRECTOR_COLUMNS} FROM directors");
            self.query(&sql, &[])
                .await?
                .iter()
                .map(director_from_row)
                .collect()
        })
        .await
    }

    async fn movies_for_director(&self, director_id: Uuid) -> StorageResult<Vec<MovieSummary>> {
        timed("list_by_director", "movie", async {
            let sql = format!("SELECT {MOVIE_SUMMARY_COLUMNS} FROM movies WHERE director_id = $1");
            self.query(&sql, &[&director_id])
                .await?
                .iter()
                .map(movie_summary_from_row)
                .collect()
        })
        .await
    }

    async fn movies_for_directors(
        &self,
        director_ids: &[Uuid],
    ) -> StorageResult<HashMap<Uuid, Vec<MovieSummary>>> {
        if director_ids.is_empty() {
            return Ok(HashMap::new());
        }
        timed("list_by_directors", "movie", async {
            let sql = format!(
                "SELECT {MOVIE_SUMMARY_COLUMNS}, director_id FROM movies \
                 WHERE director_id = ANY($1)"
            );
            let ids = director_ids.to_vec();
            let mut grouped: HashMap<Uuid, Vec<MovieSummary>> = HashMap::new();
            for row in self.query(&sql, &[&ids]).await? {
                let director_id: Uuid = get(&row, "director_id")?;
                grouped
                    .entry(director_id)
                    .or_default()
                    .push(movie_summary_from_row(&row)?);
            }
            Ok(grouped)
        })
        .await
    }
}

// ============================================================================
// SESSIONS
// ============================================================================

#[async_trait]
impl SessionLookup for DbClient {
    async fn find_session(&self, token: &str) -> StorageResult<Option<SessionWithUser>> {
        timed("get", "session", async {
            let sql = "SELECT s.id, s.user_id, s.expires_at, s.token, s.ip_address, \
                       s.user_agent, s.created_at, s.updated_at, \
                       u.id AS u_id, u.name AS u_name, u.email AS u_email, \
                       u.email_verified AS u_email_verified, u.image AS u_image, \
                       u.created_at AS u_created_at, u.updated_at AS u_updated_at \
                       FROM sessions s JOIN users u ON s.user_id = u.id \
                       WHERE s.token = $1 LIMIT 1";
            self.query(sql, &[&token])
                .await?
                .first()
                .map(session_with_user_from_row)
                .transpose()
        })
        .await
    }
}
