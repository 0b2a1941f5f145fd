//! Cinelist Core - Entity Types
//!
//! Pure data structures shared by every other crate in the workspace:
//! the task list (items and stats), the movie catalog (movies, directors,
//! comments), account rows (users, sessions) and the error taxonomy.
//!
//! Behavior lives elsewhere. The only logic here is the label rules that
//! both the store and the request boundary must agree on.

pub mod account;
pub mod catalog;
pub mod comment;
pub mod error;
pub mod identity;
pub mod item;
pub mod labels;

pub use account::{Session, User};
pub use catalog::{
    Director, DirectorProfile, DirectorSummary, DirectorWithMovies, Movie, MovieListEntry,
    MovieSummary, MovieWithDirector,
};
pub use comment::{build_threads, Comment, CommentTarget, CommentThread};
pub use error::{
    CinelistError, CinelistResult, ConfigError, StorageError, StorageResult, ValidationError,
};
pub use identity::{new_item_id, new_row_id, EntityType, RowTimestamp, Timestamp};
pub use item::{Item, ItemSnapshot, Stats};
pub use labels::{contains_fault_trigger, normalize_label, FAULT_TRIGGER, SIMULATED_FAULT_MESSAGE};
