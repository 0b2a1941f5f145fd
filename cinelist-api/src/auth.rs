//! Authentication Module
//!
//! The catalog routes require an authenticated actor. Three credentials are
//! accepted, checked in this order:
//! 1. API Key (via X-API-Key header)
//! 2. JWT token (via Authorization: Bearer header)
//! 3. Session token issued by the authentication provider (via X-Session-Token
//!    header or the `cinelist_session` cookie), resolved through [`SessionLookup`]

use crate::error::{ApiError, ApiResult};
use cinelist_core::{CinelistError, ConfigError};
use cinelist_storage::SessionLookup;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "cinelist_session";

const INSECURE_DEFAULT_SECRET: &str = "INSECURE_DEFAULT_SECRET_CHANGE_IN_PRODUCTION";

// ============================================================================
// CLOCK ABSTRACTION
// ============================================================================

/// Clock used for JWT and session expiry checks.
///
/// Time validation is done here rather than inside `jsonwebtoken` so tests
/// can inject a fixed instant and a broken system clock surfaces as an error
/// instead of a panic.
pub trait JwtClock: Send + Sync {
    /// Current time as Unix epoch seconds. Negative on a pre-1970 clock.
    fn now_epoch_secs(&self) -> i64;
}

/// Production clock using system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl JwtClock for SystemClock {
    fn now_epoch_secs(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Fixed clock for deterministic tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl JwtClock for FixedClock {
    fn now_epoch_secs(&self) -> i64 {
        self.0
    }
}


// ============================================================================
// JWT SECRET (TYPE-SAFE)
// ============================================================================

/// JWT secret that never appears in logs or debug output.
#[derive(Clone)]
pub struct JwtSecret(SecretString);

impl JwtSecret {
    /// Create a new JWT secret.
    ///
    /// # Errors
    /// Returns error if the secret is empty.
    pub fn new(secret: String) -> Result<Self, CinelistError> {
        if secret.is_empty() {
            return Err(CinelistError::Config(ConfigError::MissingRequired {
                field: "jwt_secret".to_string(),
            }));
        }
        Ok(Self(SecretString::new(secret.into())))
    }

    /// Expose the secret value (only for cryptographic operations).
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    pub fn len(&self) -> usize {
        self.0.expose_secret().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.expose_secret().is_empty()
    }

    pub fn is_insecure_default(&self) -> bool {
        self.0.expose_secret() == INSECURE_DEFAULT_SECRET
    }
}

impl std::fmt::Debug for JwtSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JwtSecret([REDACTED, {} chars])", self.len())
    }
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Authentication configuration.
#[derive(Clone)]
pub struct AuthConfig {
    /// Valid API keys
    pub api_keys: HashSet<String>,

    /// JWT secret key for signing and verification
    pub jwt_secret: JwtSecret,

    /// JWT algorithm (default: HS256)
    pub jwt_algorithm: Algorithm,

    /// JWT token expiration in seconds (default: 1 hour)
    pub jwt_expiration_secs: i64,

    /// JWT clock skew tolerance in seconds (default: 60)
    pub jwt_clock_skew_secs: i64,

    /// Clock for JWT and session time validation (injected for testing)
    pub clock: Arc<dyn JwtClock>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("api_keys", &format!("[{} keys]", self.api_keys.len()))
            .field("jwt_secret", &self.jwt_secret)
            .field("jwt_algorithm", &self.jwt_algorithm)
            .field("jwt_expiration_secs", &self.jwt_expiration_secs)
            .field("jwt_clock_skew_secs", &self.jwt_clock_skew_secs)
            .field("clock", &"<JwtClock>")
            .finish()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            api_keys: HashSet::new(),
            jwt_secret: build_jwt_secret(INSECURE_DEFAULT_SECRET.to_string()),
            jwt_algorithm: Algorithm::HS256,
            jwt_expiration_secs: 3600,
            jwt_clock_skew_secs: 60,
            clock: Arc::new(SystemClock),
        }
    }
}

impl AuthConfig {
    /// Create authentication configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `CINELIST_API_KEYS`: Comma-separated list of valid API keys
    /// - `CINELIST_JWT_SECRET`: JWT signing secret
    /// - `CINELIST_JWT_EXPIRATION_SECS`: JWT token expiration (default: 3600)
    /// - `CINELIST_JWT_CLOCK_SKEW_SECS`: JWT clock skew tolerance (default: 60)
    pub fn from_env() -> Self {
        let api_keys = std::env::var("CINELIST_API_KEYS")
            .map(|keys| {
                keys.split(',')
                    .map(str::trim)
                    .filter(|k| !k.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let secret_str = std::env::var("CINELIST_JWT_SECRET")
            .unwrap_or_else(|_| INSECURE_DEFAULT_SECRET.to_string());

        Self {
            api_keys,
            jwt_secret: build_jwt_secret(secret_str),
            jwt_algorithm: Algorithm::HS256,
            jwt_expiration_secs: std::env::var("CINELIST_JWT_EXPIRATION_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3600),
            jwt_clock_skew_secs: std::env::var("CINELIST_JWT_CLOCK_SKEW_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60),
            clock: Arc::new(SystemClock),
        }
    }

    /// Refuse insecure secrets in production, warn about them elsewhere.
    ///
    /// Production is detected from `CINELIST_ENVIRONMENT`.
    pub fn validate_for_production(&self) -> ApiResult<()> {
        let environment = std::env::var("CINELIST_ENVIRONMENT")
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase();
        let is_production = environment == "production" || environment == "prod";

        if self.jwt_secret.is_insecure_default() {
            if is_production {
                return Err(ApiError::invalid_input(format!(
                    "Cannot start server in production with insecure JWT secret. \
                     Set CINELIST_JWT_SECRET to a secure value. CINELIST_ENVIRONMENT={}",
                    environment
                )));
            }
            tracing::warn!(
                "Using insecure default JWT secret. Set CINELIST_JWT_SECRET before deploying."
            );
        }

        if self.jwt_secret.len() < 32 {
            if is_production {
                return Err(ApiError::invalid_input(format!(
                    "JWT secret is too short for production use ({} chars). \
                     It must be at least 32 characters long.",
                    self.jwt_secret.len()
                )));
            } else if !self.jwt_secret.is_insecure_default() {
                tracing::warn!(
                    "JWT secret is short ({} chars). Use at least 32 characters in production.",
                    self.jwt_secret.len()
                );
            }
        }

        Ok(())
    }

    pub fn add_api_key(&mut self, key: String) {
        self.api_keys.insert(key);
    }

    pub fn is_valid_api_key(&self, key: &str) -> bool {
        self.api_keys.contains(key)
    }
}

fn build_jwt_secret(secret_str: String) -> JwtSecret {
    let normalized = if secret_str.trim().is_empty() {
        INSECURE_DEFAULT_SECRET.to_string()
    } else {
        secret_str
    };

    JwtSecret::new(normalized)
        .unwrap_or_else(|_| JwtSecret(SecretString::new(INSECURE_DEFAULT_SECRET.into())))
}

// ============================================================================
// JWT CLAIMS
// ============================================================================

/// JWT claims structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default)]
    pub roles: Vec<String>,
}

impl Claims {
    pub fn new(user_id: String, expiration_secs: i64, clock: &dyn JwtClock) -> Self {
        let now = clock.now_epoch_secs();
        Self {
            sub: user_id,
            iat: now,
            exp: now + expiration_secs,
            email: None,
            roles: Vec::new(),
        }
    }

    pub fn with_roles(mut self, roles: Vec<String>) -> Self {
        self.roles.extend(roles);
        self
    }

    pub fn is_expired(&self, clock: &dyn JwtClock) -> bool {
        self.exp < clock.now_epoch_secs()
    }
}

// ============================================================================
// AUTHENTICATION CONTEXT
// ============================================================================

/// Authenticated actor, injected into request extensions by the auth middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    /// User ID (JWT subject, session owner, or API key identifier)
    pub user_id: String,

    pub roles: Vec<String>,

    pub auth_method: AuthMethod,

    pub email: Option<String>,
}

impl AuthContext {
    pub fn new(user_id: String, roles: Vec<String>, auth_method: AuthMethod) -> Self {
        Self {
            user_id,
            roles,
            auth_method,
            email: None,
        }
    }

    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.email = email;
        self
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// Authentication method used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    ApiKey,
    Jwt,
    Session,
}

impl AuthMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMethod::ApiKey => "api_key",
            AuthMethod::Jwt => "jwt",
            AuthMethod::Session => "session",
        }
    }
}

// ============================================================================
// AUTHENTICATION FUNCTIONS
// ============================================================================

pub fn validate_api_key(config: &AuthConfig, api_key: &str) -> ApiResult<()> {
    if config.is_valid_api_key(api_key) {
        Ok(())
    } else {
        Err(ApiError::unauthorized("Invalid API key"))
    }
}

/// Check `exp` and `nbf` against `now` with `leeway_secs` tolerance either way.
fn validate_claim_times(now: i64, exp: i64, nbf: Option<i64>, leeway_secs: i64) -> ApiResult<()> {
    if let Some(nbf) = nbf {
        if now + leeway_secs < nbf {
            return Err(ApiError::unauthorized("Token not yet valid (nbf)"));
        }
    }

    if exp < now - leeway_secs {
        return Err(ApiError::token_expired());
    }

    Ok(())
}

fn checked_now(config: &AuthConfig) -> ApiResult<i64> {
    let now = config.clock.now_epoch_secs();
    if now < 0 {
        tracing::error!(
            timestamp = now,
            "System clock returned pre-epoch time - server time is broken"
        );
        return Err(ApiError::internal_error(
            "Server time configuration error - please contact support",
        ));
    }
    Ok(now)
}

/// Validate a JWT token and extract claims.
///
/// `jsonwebtoken` checks the signature only. Expiry is checked against the
/// configured clock.
pub fn validate_jwt_token(config: &AuthConfig, token: &str) -> ApiResult<Claims> {
    let decoding_key = DecodingKey::from_secret(config.jwt_secret.expose().as_bytes());

    let mut validation = Validation::new(config.jwt_algorithm);
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.required_spec_claims = HashSet::from(["exp".to_string()]);

    let token_data =
        decode::<Claims>(token, &decoding_key, &validation).map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::InvalidToken => {
                ApiError::invalid_token("Token is invalid")
            }
            jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                ApiError::invalid_token("Token signature is invalid")
            }
            _ => ApiError::invalid_token(format!("Token validation failed: {}", e)),
        })?;

    let claims = token_data.claims;
    let now = checked_now(config)?;
    validate_claim_times(now, claims.exp, None, config.jwt_clock_skew_secs)?;

    Ok(claims)
}

/// Generate a JWT token for a user.
pub fn generate_jwt_token(
    config: &AuthConfig,
    user_id: String,
    roles: Vec<String>,
) -> ApiResult<String> {
    let claims = Claims::new(user_id, config.jwt_expiration_secs, &*config.clock).with_roles(roles);

    let encoding_key = EncodingKey::from_secret(config.jwt_secret.expose().as_bytes());
    let header = Header::new(config.jwt_algorithm);

    encode(&header, &claims, &encoding_key)
        .map_err(|e| ApiError::internal_error(format!("Failed to generate token: {}", e)))
}

/// Authenticate a request using an API key.
pub fn authenticate_api_key(config: &AuthConfig, api_key: &str) -> ApiResult<AuthContext> {
    validate_api_key(config, api_key)?;

    // The key itself is the only identity an API key carries.
    let prefix: String = api_key.chars().take(8).collect();
    Ok(AuthContext::new(
        format!("api_key_{}", prefix),
        vec!["api_user".to_string()],
        AuthMethod::ApiKey,
    ))
}

/// Authenticate a request using a JWT bearer token.
pub fn authenticate_jwt(config: &AuthConfig, token: &str) -> ApiResult<AuthContext> {
    let claims = validate_jwt_token(config, token)?;
    Ok(AuthContext::new(claims.sub, claims.roles, AuthMethod::Jwt).with_email(claims.email))
}

/// Authenticate a request using a provider-issued session token.
pub async fn authenticate_session(
    config: &AuthConfig,
    sessions: &dyn SessionLookup,
    token: &str,
) -> ApiResult<AuthContext> {
    let found = sessions
        .find_session(token)
        .await?
        .ok_or_else(|| ApiError::invalid_token("Session not found"))?;

    let now = checked_now(config)?;
    let now = chrono::DateTime::from_timestamp(now, 0)
        .map(|t| t.naive_utc())
        .ok_or_else(|| ApiError::internal_error("Server time out of range"))?;
    if found.session.is_expired(now) {
        return Err(ApiError::token_expired());
    }

    Ok(AuthContext::new(
        found.user.id.to_string(),
        vec!["user".to_string()],
        AuthMethod::Session,
    )
    .with_email(Some(found.user.email)))
}

/// Extract the session token from a `Cookie` header value.
pub fn session_token_from_cookie(cookie_header: &str) -> Option<&str> {
    cookie_header.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE && !value.is_empty()).then_some(value)
    })
}

/// Authenticate a request using API key or JWT token.
///
/// Checks X-API-Key first, then the Authorization: Bearer header.
pub fn authenticate(
    config: &AuthConfig,
    api_key_header: Option<&str>,
    auth_header: Option<&str>,
) -> ApiResult<AuthContext> {
    if let Some(api_key) = api_key_header {
        return authenticate_api_key(config, api_key);
    }

    if let Some(auth_value) = auth_header {
        return match auth_value.strip_prefix("Bearer ") {
            Some(token) => authenticate_jwt(config, token),
            None => Err(ApiError::invalid_token(
                "Authorization header must use Bearer scheme",
            )),
        };
    }

    Err(ApiError::unauthorized(
        "Authentication required: provide X-API-Key, Authorization or a session",
    ))
}

// ============================================================================
// TESTS
// ============================================================================
