//! Shared fixtures for the wiremock-backed tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{Duration, Utc};
use scope_tag_client::{AppId, Config, GraphClient, SessionContext};
use wiremock::MockServer;

pub const APP_ID: &str = "4bc7a0a5-7c3b-4c52-9d46-7f6a0fb2a7e1";
pub const TOKEN: &str = "test-graph-token";

pub fn app_path() -> String {
    format!("/beta/deviceAppManagement/mobileApps/{APP_ID}")
}

pub fn app_id() -> AppId {
    APP_ID.parse().expect("app id")
}

/// Graph client pointed at the mock server.
pub fn graph_client(server: &MockServer, max_retries: u32) -> GraphClient {
    let config = Config {
        graph_base_url: server.uri(),
        max_retries,
        ..Config::default()
    };
    GraphClient::new(&config).expect("graph client")
}

pub fn live_session() -> SessionContext {
    SessionContext::new(TOKEN, Utc::now() + Duration::hours(1))
}

pub fn expired_session() -> SessionContext {
    SessionContext::new(TOKEN, Utc::now() - Duration::minutes(1))
}

/// Counter for tracking request attempts in tests
#[derive(Debug, Clone, Default)]
pub struct RequestCounter {
    count: Arc<AtomicUsize>,
}

impl RequestCounter {
    pub fn increment(&self) -> usize {
        self.count.fetch_add(1, Ordering::SeqCst)
    }

    pub fn get(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

/// Canned Graph payloads
pub struct GraphResponses;

impl GraphResponses {
    pub fn win32_app(scope_tags: &[&str]) -> serde_json::Value {
        serde_json::json!({
            "@odata.context": "https://graph.microsoft.com/beta/$metadata#deviceAppManagement/mobileApps/$entity",
            "@odata.type": "#microsoft.graph.win32LobApp",
            "id": APP_ID,
            "displayName": "Contoso Agent",
            "publisher": "Contoso",
            "fileName": "ContosoAgent.intunewin",
            "roleScopeTagIds": scope_tags
        })
    }

    pub fn win32_app_without_tags() -> serde_json::Value {
        serde_json::json!({
            "@odata.type": "#microsoft.graph.win32LobApp",
            "id": APP_ID,
            "displayName": "Contoso Agent",
            "roleScopeTagIds": null
        })
    }

    pub fn graph_error(code: &str, message: &str) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "code": code,
                "message": message
            }
        })
    }
}
