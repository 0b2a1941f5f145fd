//! Users and sessions backing authentication.

use crate::identity::RowTimestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A row of the `users` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
    pub email_verified: bool,
    pub image: Option<String>,
    pub created_at: RowTimestamp,
    pub updated_at: RowTimestamp,
}

/// A row of the `sessions` table. Issued by the authentication provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub expires_at: RowTimestamp,
    #[serde(skip_serializing)]
    pub token: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: RowTimestamp,
    pub updated_at: RowTimestamp,
}

impl Session {
    /// A session is expired once `now` reaches `expires_at`.
    pub fn is_expired(&self, now: RowTimestamp) -> bool {
        now >= self.expires_at
    }
}
