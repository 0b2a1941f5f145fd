//! Identity and time types for Cinelist entities

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Timestamp as stored in the relational schema (`timestamp` without zone).
pub type RowTimestamp = NaiveDateTime;

/// Generate a fresh item identifier.
///
/// Items are keyed by opaque strings so seeded rows ("1", "2", ...) and
/// generated rows (UUID v4) live side by side.
pub fn new_item_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generate a fresh row identifier for catalog and account tables.
pub fn new_row_id() -> Uuid {
    Uuid::new_v4()
}

/// Entity type discriminator used in errors, audit records and cache keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Item,
    Movie,
    Director,
    Comment,
    User,
    Session,
}

impl EntityType {
    /// Resource name used by the audit log and the comment discriminator.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Item => "item",
            EntityType::Movie => "movie",
            EntityType::Director => "director",
            EntityType::Comment => "comment",
            EntityType::User => "user",
            EntityType::Session => "session",
        }
    }

    /// Capitalized name for human-facing messages ("Movie with id ... not found").
    pub fn display_name(&self) -> &'static str {
        match self {
            EntityType::Item => "Item",
            EntityType::Movie => "Movie",
            EntityType::Director => "Director",
            EntityType::Comment => "Comment",
            EntityType::User => "User",
            EntityType::Session => "Session",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_item_ids_are_unique() {
        let a = new_item_id();
        let b = new_item_id();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(&a).is_ok());
    }

    #[test]
    fn test_entity_type_names() {
        assert_eq!(EntityType::Movie.as_str(), "movie");
        assert_eq!(EntityType::Director.display_name(), "Director");
        assert_eq!(format!("{}", EntityType::Item), "item");
    }

    #[test]
    fn test_entity_type_serde_lowercase() {
        let json = serde_json::to_string(&EntityType::Director).unwrap();
        assert_eq!(json, "\"director\"");
    }
}
