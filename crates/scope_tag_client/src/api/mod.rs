pub mod client;
pub mod models;

pub use client::GraphClient;
pub use models::{MobileApp, ScopeTagPatch};
