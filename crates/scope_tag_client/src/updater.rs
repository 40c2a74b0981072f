use chrono::Utc;
use log::{info, warn};

use crate::api::models::{MobileApp, ScopeTagPatch};
use crate::auth::session::{require_active, SessionContext};
use crate::client_trait::ResourceClient;
use crate::error::SessionError;
use crate::scope_tag::{plan_add, plan_remove, AppId, ScopeTagId, ScopeTagPlan};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddOptions {
    /// Drop the default tag "0" when at least one other tag remains.
    pub remove_default: bool,
    /// Compute the new list but do not submit it.
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoOpReason {
    AlreadyPresent,
    NotPresent,
    WouldEmptyList,
    DryRun { scope_tag_ids: Vec<String> },
}

/// How a single update ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Patched { scope_tag_ids: Vec<String> },
    NotFound,
    NoOp(NoOpReason),
    TransportError { message: String },
    Aborted(SessionError),
}

impl UpdateOutcome {
    /// Patched and no-op outcomes leave the record in the requested state.
    pub fn is_success(&self) -> bool {
        matches!(self, UpdateOutcome::Patched { .. } | UpdateOutcome::NoOp(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScopeTagsLookup {
    Found(MobileApp),
    NotFound,
    TransportError { message: String },
    Aborted(SessionError),
}

enum FetchFailure {
    NotFound,
    Transport(String),
}

impl From<FetchFailure> for UpdateOutcome {
    fn from(failure: FetchFailure) -> Self {
        match failure {
            FetchFailure::NotFound => UpdateOutcome::NotFound,
            FetchFailure::Transport(message) => UpdateOutcome::TransportError { message },
        }
    }
}

/// Reads an app's scope tags, applies the requested change locally and
/// writes the list back only when it differs.
pub struct ScopeTagUpdater<C> {
    client: C,
    session: Option<SessionContext>,
}

impl<C: ResourceClient> ScopeTagUpdater<C> {
    pub fn new(client: C, session: Option<SessionContext>) -> Self {
        Self { client, session }
    }

    pub async fn add_scope_tag(
        &self,
        app_id: &AppId,
        scope_tag: &ScopeTagId,
        options: AddOptions,
    ) -> UpdateOutcome {
        let session = match self.active_session() {
            Ok(session) => session,
            Err(e) => return UpdateOutcome::Aborted(e),
        };
        let app = match self.fetch(session, app_id).await {
            Ok(app) => app,
            Err(failure) => return failure.into(),
        };

        match plan_add(&app.role_scope_tag_ids, scope_tag, options.remove_default) {
            ScopeTagPlan::Update(scope_tag_ids) if options.dry_run => {
                info!("Dry run: would set scope tags of {app_id} to {scope_tag_ids:?}");
                UpdateOutcome::NoOp(NoOpReason::DryRun { scope_tag_ids })
            }
            ScopeTagPlan::Update(scope_tag_ids) => {
                self.submit(session, app_id, &app, scope_tag_ids).await
            }
            ScopeTagPlan::AlreadyPresent => {
                info!("Scope tag {scope_tag} is already assigned to {app_id}, nothing to update");
                UpdateOutcome::NoOp(NoOpReason::AlreadyPresent)
            }
            ScopeTagPlan::WouldEmptyList | ScopeTagPlan::NotPresent => {
                warn!(
                    "Not updating {app_id}: removing the default scope tag would leave no scope tags"
                );
                UpdateOutcome::NoOp(NoOpReason::WouldEmptyList)
            }
        }
    }

    pub async fn remove_scope_tag(&self, app_id: &AppId, scope_tag: &ScopeTagId) -> UpdateOutcome {
        let session = match self.active_session() {
            Ok(session) => session,
            Err(e) => return UpdateOutcome::Aborted(e),
        };
        let app = match self.fetch(session, app_id).await {
            Ok(app) => app,
            Err(failure) => return failure.into(),
        };

        match plan_remove(&app.role_scope_tag_ids, scope_tag) {
            ScopeTagPlan::Update(scope_tag_ids) => {
                self.submit(session, app_id, &app, scope_tag_ids).await
            }
            ScopeTagPlan::NotPresent | ScopeTagPlan::AlreadyPresent => {
                info!("Scope tag {scope_tag} is not assigned to {app_id}, nothing to remove");
                UpdateOutcome::NoOp(NoOpReason::NotPresent)
            }
            ScopeTagPlan::WouldEmptyList => {
                warn!("Not updating {app_id}: {scope_tag} is its only scope tag");
                UpdateOutcome::NoOp(NoOpReason::WouldEmptyList)
            }
        }
    }

    pub async fn scope_tags(&self, app_id: &AppId) -> ScopeTagsLookup {
        let session = match self.active_session() {
            Ok(session) => session,
            Err(e) => return ScopeTagsLookup::Aborted(e),
        };
        match self.fetch(session, app_id).await {
            Ok(app) => ScopeTagsLookup::Found(app),
            Err(FetchFailure::NotFound) => ScopeTagsLookup::NotFound,
            Err(FetchFailure::Transport(message)) => ScopeTagsLookup::TransportError { message },
        }
    }

    fn active_session(&self) -> Result<&SessionContext, SessionError> {
        require_active(self.session.as_ref(), Utc::now()).map_err(|e| {
            warn!("Aborting: {e}. Authenticate and retry");
            e
        })
    }

    async fn fetch(
        &self,
        session: &SessionContext,
        app_id: &AppId,
    ) -> Result<MobileApp, FetchFailure> {
        let value = match self.client.get(session, &app_id.resource_path()).await {
            Ok(Some(value)) => value,
            Ok(None) => {
                warn!("No Win32 app found with id {app_id}");
                return Err(FetchFailure::NotFound);
            }
            Err(e) => {
                warn!("Failed to fetch Win32 app {app_id}: {e}");
                return Err(FetchFailure::Transport(e.to_string()));
            }
        };

        match serde_json::from_value::<MobileApp>(value) {
            Ok(app) => {
                info!(
                    "Fetched {} ({app_id}) with scope tags {:?}",
                    app.display_name.as_deref().unwrap_or("unnamed app"),
                    app.role_scope_tag_ids
                );
                Ok(app)
            }
            Err(e) => {
                warn!("Unexpected response body for Win32 app {app_id}: {e}");
                Err(FetchFailure::Transport(e.to_string()))
            }
        }
    }

    async fn submit(
        &self,
        session: &SessionContext,
        app_id: &AppId,
        app: &MobileApp,
        scope_tag_ids: Vec<String>,
    ) -> UpdateOutcome {
        let body = match serde_json::to_value(ScopeTagPatch::new(app, &scope_tag_ids)) {
            Ok(body) => body,
            Err(e) => {
                return UpdateOutcome::TransportError {
                    message: e.to_string(),
                }
            }
        };

        info!("Updating scope tags of {app_id} to {scope_tag_ids:?}");
        match self
            .client
            .patch(session, &app_id.resource_path(), &body)
            .await
        {
            Ok(()) => {
                info!("Updated scope tags of {app_id}");
                UpdateOutcome::Patched { scope_tag_ids }
            }
            Err(e) => {
                warn!("Failed to update scope tags of {app_id}: {e}");
                UpdateOutcome::TransportError {
                    message: e.to_string(),
                }
            }
        }
    }
}
