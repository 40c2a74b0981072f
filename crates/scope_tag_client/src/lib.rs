pub mod api;
pub mod auth;
pub mod client_trait;
pub mod config;
pub mod error;
pub mod scope_tag;
pub mod updater;
pub mod utils;

pub use api::client::GraphClient;
pub use auth::SessionContext;
pub use client_trait::ResourceClient;
pub use config::Config;
pub use error::{ConfigError, GraphError, SessionError, ValidationError};
pub use scope_tag::{AppId, ScopeTagId};
pub use updater::{AddOptions, NoOpReason, ScopeTagUpdater, ScopeTagsLookup, UpdateOutcome};
