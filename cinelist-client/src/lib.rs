//! Cinelist terminal client.
//!
//! A searchable item list with keyboard and mouse navigation, inline
//! editing and an add form. Writes are shown optimistically and reconciled
//! against the server snapshot once they settle.

pub mod api_client;
pub mod config;
pub mod controller;
pub mod debounce;
pub mod error;
pub mod events;
pub mod keys;
pub mod optimistic;
pub mod state;
pub mod theme;
pub mod views;
pub mod widgets;

pub use api_client::{ApiClientError, ItemsApi, RestClient};
pub use config::{ClientConfig, ConfigError};
pub use controller::{ListController, Pointer};
pub use error::ClientError;
pub use optimistic::{MutationId, MutationPhase, OptimisticAction, OptimisticList, RefreshTicket};
pub use state::{ListCommand, ListMode, ListState};
