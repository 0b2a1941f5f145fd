//! Cinelist Test Utilities
//!
//! Shared test infrastructure for the Cinelist workspace:
//! - Proptest generators for labels, items and catalog rows
//! - Fixtures for stores, catalogs and sessions
//! - Assertions for Cinelist-specific results

// Re-export core types for convenience
pub use cinelist_core::{
    CinelistError, CinelistResult, Comment, CommentTarget, Director, EntityType, Item,
    ItemSnapshot, Movie, RowTimestamp, Session, Stats, StorageError, StorageResult, User,
    FAULT_TRIGGER,
};
pub use cinelist_storage::{InMemoryCatalog, ItemQueries, ItemStore, SessionWithUser};

// ============================================================================
// GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for Cinelist entity types.

    use super::*;
    use chrono::{DateTime, NaiveDateTime};
    use proptest::prelude::*;
    use uuid::Uuid;

    /// Generate a random UUID.
    pub fn arb_uuid() -> impl Strategy<Value = Uuid> {
        any::<[u8; 16]>().prop_map(Uuid::from_bytes)
    }

    /// Generate a naive timestamp between 2020 and 2030.
    pub fn arb_row_timestamp() -> impl Strategy<Value = NaiveDateTime> {
        (1577836800i64..1893456000i64).prop_map(|secs| {
            DateTime::from_timestamp(secs, 0)
                .unwrap_or_default()
                .naive_utc()
        })
    }

    /// A label that is accepted as-is: non-blank, already trimmed, and free
    /// of the fault trigger.
    pub fn arb_label() -> impl Strategy<Value = String> {
        "[A-Za-z0-9][A-Za-z0-9 ]{0,22}[A-Za-z0-9]"
            .prop_filter("fault trigger", |s| {
                !s.to_lowercase().contains(FAULT_TRIGGER)
            })
    }

    /// A label surrounded by whitespace that normalizes to a valid label.
    pub fn arb_padded_label() -> impl Strategy<Value = (String, String)> {
        (arb_label(), "[ \t]{0,3}", "[ \t]{0,3}")
            .prop_map(|(label, pre, post)| (format!("{}{}{}", pre, label, post), label))
    }

    /// Whitespace only, including the empty string.
    pub fn arb_blank_label() -> impl Strategy<Value = String> {
        "[ \t\n]{0,6}"
    }

    /// A label containing the fault trigger in any casing.
    pub fn arb_fault_label() -> impl Strategy<Value = String> {
        (
            "[A-Za-z ]{0,8}",
            prop_oneof![Just("error"), Just("Error"), Just("ERROR"), Just("eRrOr")],
            "[A-Za-z ]{0,8}",
        )
            .prop_map(|(pre, word, post)| format!("{}{}{}", pre, word, post))
    }

    /// Generate an item with a numeric-string id.
    pub fn arb_item() -> impl Strategy<Value = Item> {
        (1u64..1_000_000, arb_label()).prop_map(|(id, label)| Item::new(id.to_string(), label))
    }

    /// Generate a list of items with distinct ids.
    pub fn arb_items(max: usize) -> impl Strategy<Value = Vec<Item>> {
        prop::collection::vec(arb_label(), 0..max).prop_map(|labels| {
            labels
                .into_iter()
                .enumerate()
                .map(|(i, label)| Item::new((i + 1).to_string(), label))
                .collect()
        })
    }

    /// Generate a director row.
    pub fn arb_director() -> impl Strategy<Value = Director> {
        (
            arb_uuid(),
            "[A-Z][a-z]{2,10} [A-Z][a-z]{2,12}",
            prop::option::of("[A-Z][a-z]{3,10}"),
            arb_row_timestamp(),
        )
            .prop_map(|(id, name, nationality, created_at)| Director {
                id,
                name,
                bio: None,
                birth_date: None,
                nationality,
                image_url: None,
                created_at,
                updated_at: created_at,
            })
    }

    /// Generate a movie row directed by `director_id`.
    pub fn arb_movie(director_id: Option<Uuid>) -> impl Strategy<Value = Movie> {
        (
            arb_uuid(),
            "[A-Z][a-z]{2,12}( [A-Z][a-z]{2,8}){0,2}",
            prop::option::of(60i32..240),
            arb_row_timestamp(),
        )
            .prop_map(move |(id, title, duration, created_at)| Movie {
                id,
                title,
                description: None,
                release_date: None,
                duration,
                genre: None,
                rating: None,
                poster_url: None,
                director_id,
                created_at,
                updated_at: created_at,
            })
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built fixtures for common testing scenarios.

    use super::*;
    use chrono::{Duration as ChronoDuration, Utc};
    use std::sync::Arc;
    use std::time::Duration;
    use uuid::Uuid;

    /// A store with the three seed items and no simulated latency.
    pub fn seeded_store() -> Arc<ItemStore> {
        Arc::new(ItemStore::seeded(Duration::ZERO))
    }

    /// Cached queries over [`seeded_store`].
    pub fn seeded_queries() -> ItemQueries {
        ItemQueries::in_memory(seeded_store())
    }

    pub fn now() -> RowTimestamp {
        Utc::now().naive_utc()
    }

    pub fn director(name: &str) -> Director {
        let at = now();
        Director {
            id: Uuid::new_v4(),
            name: name.to_string(),
            bio: None,
            birth_date: None,
            nationality: None,
            image_url: None,
            created_at: at,
            updated_at: at,
        }
    }

    pub fn movie(title: &str, director_id: Option<Uuid>) -> Movie {
        let at = now();
        Movie {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: None,
            release_date: None,
            duration: None,
            genre: None,
            rating: None,
            poster_url: None,
            director_id,
            created_at: at,
            updated_at: at,
        }
    }

    pub fn user(email: &str) -> User {
        let at = now();
        User {
            id: Uuid::new_v4(),
            name: None,
            email: email.to_string(),
            email_verified: true,
            image: None,
            created_at: at,
            updated_at: at,
        }
    }

    /// A session for `user` expiring `ttl_secs` from now. Negative values
    /// produce an already expired session.
    pub fn session(user: &User, token: &str, ttl_secs: i64) -> Session {
        let at = now();
        Session {
            id: Uuid::new_v4(),
            user_id: user.id,
            expires_at: at + ChronoDuration::seconds(ttl_secs),
            token: token.to_string(),
            ip_address: None,
            user_agent: None,
            created_at: at,
            updated_at: at,
        }
    }

    pub fn comment(
        target: CommentTarget,
        user_id: Uuid,
        parent: Option<Uuid>,
        content: &str,
    ) -> Comment {
        let at = now();
        Comment {
            id: Uuid::new_v4(),
            content: content.to_string(),
            user_id,
            target,
            parent_comment_id: parent,
            created_at: at,
            updated_at: at,
        }
    }

    /// Insert a user with one valid and one expired session.
    ///
    /// Returns the user; the session tokens are `valid_token` and
    /// `expired_token`.
    pub fn with_sessions(
        catalog: &InMemoryCatalog,
        email: &str,
        valid_token: &str,
        expired_token: &str,
    ) -> StorageResult<User> {
        let owner = user(email);
        catalog.insert_user(owner.clone())?;
        catalog.insert_session(session(&owner, valid_token, 3600))?;
        catalog.insert_session(session(&owner, expired_token, -60))?;
        Ok(owner)
    }
}

// ============================================================================
// ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertion helpers for Cinelist-specific validation.

    use super::*;

    /// Assert that a StorageResult is a NotFound error for `entity_type`.
    #[track_caller]
    pub fn assert_not_found<T: std::fmt::Debug>(
        result: &StorageResult<T>,
        entity_type: EntityType,
    ) {
        match result {
            Err(StorageError::NotFound {
                entity_type: et, ..
            }) => {
                assert_eq!(*et, entity_type, "Wrong entity type in NotFound error");
            }
            other => panic!("Expected NotFound error for {:?}, got: {:?}", entity_type, other),
        }
    }

    /// Assert that a StorageResult is a simulated fault.
    #[track_caller]
    pub fn assert_simulated_fault<T: std::fmt::Debug>(result: &StorageResult<T>) {
        match result {
            Err(StorageError::SimulatedFault { .. }) => {}
            other => panic!("Expected SimulatedFault, got: {:?}", other),
        }
    }

    /// Assert that the stats agree with the item list.
    #[track_caller]
    pub fn assert_snapshot_consistent(snapshot: &ItemSnapshot) {
        assert!(
            snapshot.is_consistent(),
            "Stats total {} disagrees with {} items",
            snapshot.stats.total,
            snapshot.items.len()
        );
    }

    /// Assert that item ids are unique.
    #[track_caller]
    pub fn assert_unique_ids(items: &[Item]) {
        let mut ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        ids.sort_unstable();
        let before = ids.len();
        ids.dedup();
        assert_eq!(before, ids.len(), "Duplicate item ids in {:?}", items);
    }
}

pub use assertions::*;
pub use fixtures::*;
pub use generators::*;
