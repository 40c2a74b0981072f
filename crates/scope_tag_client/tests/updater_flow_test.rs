//! End-to-end scope tag updates through GraphClient

mod test_utils;

use scope_tag_client::{
    AddOptions, NoOpReason, ScopeTagId, ScopeTagUpdater, ScopeTagsLookup, SessionError,
    UpdateOutcome,
};
use serde_json::json;
use test_utils::*;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn tag(id: &str) -> ScopeTagId {
    id.parse().expect("scope tag")
}

const REMOVE_DEFAULT: AddOptions = AddOptions {
    remove_default: true,
    dry_run: false,
};

async fn serve_app(server: &MockServer, record: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(app_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(record))
        .expect(1)
        .mount(server)
        .await;
}

async fn expect_patch(server: &MockServer, scope_tags: &[&str]) {
    Mock::given(method("PATCH"))
        .and(path(app_path()))
        .and(body_json(json!({
            "@odata.type": "#microsoft.graph.win32LobApp",
            "roleScopeTagIds": scope_tags
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(server)
        .await;
}

async fn forbid_patch(server: &MockServer) {
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(server)
        .await;
}

#[tokio::test]
async fn default_tag_is_swapped_for_requested_tag() {
    let server = MockServer::start().await;
    serve_app(&server, GraphResponses::win32_app(&["0"])).await;
    expect_patch(&server, &["5"]).await;

    let updater = ScopeTagUpdater::new(graph_client(&server, 0), Some(live_session()));
    let outcome = updater
        .add_scope_tag(&app_id(), &tag("5"), REMOVE_DEFAULT)
        .await;

    assert_eq!(
        outcome,
        UpdateOutcome::Patched {
            scope_tag_ids: vec!["5".to_string()]
        }
    );
}

#[tokio::test]
async fn new_tag_is_appended_alongside_existing_ones() {
    let server = MockServer::start().await;
    serve_app(&server, GraphResponses::win32_app(&["0", "3"])).await;
    expect_patch(&server, &["0", "3", "5"]).await;

    let updater = ScopeTagUpdater::new(graph_client(&server, 0), Some(live_session()));
    let outcome = updater
        .add_scope_tag(&app_id(), &tag("5"), AddOptions::default())
        .await;

    assert!(matches!(outcome, UpdateOutcome::Patched { .. }));
}

#[tokio::test]
async fn null_tag_list_is_treated_as_empty() {
    let server = MockServer::start().await;
    serve_app(&server, GraphResponses::win32_app_without_tags()).await;
    expect_patch(&server, &["5"]).await;

    let updater = ScopeTagUpdater::new(graph_client(&server, 0), Some(live_session()));
    let outcome = updater
        .add_scope_tag(&app_id(), &tag("5"), REMOVE_DEFAULT)
        .await;

    assert_eq!(
        outcome,
        UpdateOutcome::Patched {
            scope_tag_ids: vec!["5".to_string()]
        }
    );
}

#[tokio::test]
async fn already_assigned_tag_is_left_alone() {
    let server = MockServer::start().await;
    serve_app(&server, GraphResponses::win32_app(&["5"])).await;
    forbid_patch(&server).await;

    let updater = ScopeTagUpdater::new(graph_client(&server, 0), Some(live_session()));
    let outcome = updater
        .add_scope_tag(&app_id(), &tag("5"), AddOptions::default())
        .await;

    assert_eq!(outcome, UpdateOutcome::NoOp(NoOpReason::AlreadyPresent));
}

#[tokio::test]
async fn lone_default_tag_is_not_removed() {
    let server = MockServer::start().await;
    serve_app(&server, GraphResponses::win32_app(&["0"])).await;
    forbid_patch(&server).await;

    let updater = ScopeTagUpdater::new(graph_client(&server, 0), Some(live_session()));
    let outcome = updater
        .add_scope_tag(&app_id(), &tag("0"), REMOVE_DEFAULT)
        .await;

    assert_eq!(outcome, UpdateOutcome::NoOp(NoOpReason::AlreadyPresent));
}

#[tokio::test]
async fn missing_app_is_reported_without_patch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(app_path()))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(GraphResponses::graph_error("ResourceNotFound", "no such app")),
        )
        .expect(1)
        .mount(&server)
        .await;
    forbid_patch(&server).await;

    let updater = ScopeTagUpdater::new(graph_client(&server, 0), Some(live_session()));
    let outcome = updater
        .add_scope_tag(&app_id(), &tag("5"), AddOptions::default())
        .await;

    assert_eq!(outcome, UpdateOutcome::NotFound);
    assert!(!outcome.is_success());
}

#[tokio::test]
async fn forbidden_read_is_reported_without_patch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(app_path()))
        .respond_with(
            ResponseTemplate::new(403)
                .set_body_json(GraphResponses::graph_error("Forbidden", "nope")),
        )
        .expect(1)
        .mount(&server)
        .await;
    forbid_patch(&server).await;

    let updater = ScopeTagUpdater::new(graph_client(&server, 0), Some(live_session()));
    let outcome = updater
        .add_scope_tag(&app_id(), &tag("5"), REMOVE_DEFAULT)
        .await;

    match &outcome {
        UpdateOutcome::TransportError { message } => {
            assert!(message.contains("403"), "message was {message}");
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    assert!(!outcome.is_success());
}

#[tokio::test]
async fn malformed_tag_list_is_reported_without_patch() {
    let server = MockServer::start().await;
    serve_app(
        &server,
        json!({
            "@odata.type": "#microsoft.graph.win32LobApp",
            "id": APP_ID,
            "roleScopeTagIds": "0"
        }),
    )
    .await;
    forbid_patch(&server).await;

    let updater = ScopeTagUpdater::new(graph_client(&server, 0), Some(live_session()));
    let outcome = updater
        .add_scope_tag(&app_id(), &tag("5"), REMOVE_DEFAULT)
        .await;

    match &outcome {
        UpdateOutcome::TransportError { message } => {
            assert!(message.contains("expected a sequence"), "message was {message}");
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    assert!(!outcome.is_success());
}

#[tokio::test]
async fn expired_session_never_reaches_the_service() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    forbid_patch(&server).await;

    let updater = ScopeTagUpdater::new(graph_client(&server, 0), Some(expired_session()));
    let outcome = updater
        .add_scope_tag(&app_id(), &tag("5"), REMOVE_DEFAULT)
        .await;

    assert!(matches!(
        outcome,
        UpdateOutcome::Aborted(SessionError::Expired { .. })
    ));
}

#[tokio::test]
async fn failed_patch_is_returned_as_transport_error() {
    let server = MockServer::start().await;
    serve_app(&server, GraphResponses::win32_app(&["0"])).await;
    Mock::given(method("PATCH"))
        .and(path(app_path()))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(GraphResponses::graph_error("BadRequest", "unknown scope tag 5")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let updater = ScopeTagUpdater::new(graph_client(&server, 0), Some(live_session()));
    let outcome = updater
        .add_scope_tag(&app_id(), &tag("5"), REMOVE_DEFAULT)
        .await;

    match outcome {
        UpdateOutcome::TransportError { message } => {
            assert!(message.contains("unknown scope tag 5"), "message was {message}");
        }
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[tokio::test]
async fn second_identical_call_is_a_no_op() {
    let server = MockServer::start().await;
    let counter = RequestCounter::default();
    let reads = counter.clone();

    // First read sees the default tag, later reads see the patched list.
    Mock::given(method("GET"))
        .and(path(app_path()))
        .respond_with(move |_req: &wiremock::Request| {
            let tags: &[&str] = if reads.increment() == 0 { &["0"] } else { &["5"] };
            ResponseTemplate::new(200).set_body_json(GraphResponses::win32_app(tags))
        })
        .expect(2)
        .mount(&server)
        .await;
    expect_patch(&server, &["5"]).await;

    let updater = ScopeTagUpdater::new(graph_client(&server, 0), Some(live_session()));
    let first = updater
        .add_scope_tag(&app_id(), &tag("5"), REMOVE_DEFAULT)
        .await;
    let second = updater
        .add_scope_tag(&app_id(), &tag("5"), REMOVE_DEFAULT)
        .await;

    assert!(matches!(first, UpdateOutcome::Patched { .. }));
    assert_eq!(second, UpdateOutcome::NoOp(NoOpReason::AlreadyPresent));
    assert_eq!(counter.get(), 2);
}

#[tokio::test]
async fn remove_subcommand_patches_remaining_tags() {
    let server = MockServer::start().await;
    serve_app(&server, GraphResponses::win32_app(&["0", "5"])).await;
    expect_patch(&server, &["0"]).await;

    let updater = ScopeTagUpdater::new(graph_client(&server, 0), Some(live_session()));
    let outcome = updater.remove_scope_tag(&app_id(), &tag("5")).await;

    assert_eq!(
        outcome,
        UpdateOutcome::Patched {
            scope_tag_ids: vec!["0".to_string()]
        }
    );
}

#[tokio::test]
async fn lookup_reads_current_tags() {
    let server = MockServer::start().await;
    serve_app(&server, GraphResponses::win32_app(&["0", "3"])).await;
    forbid_patch(&server).await;

    let updater = ScopeTagUpdater::new(graph_client(&server, 0), Some(live_session()));
    match updater.scope_tags(&app_id()).await {
        ScopeTagsLookup::Found(app) => {
            assert_eq!(app.display_name.as_deref(), Some("Contoso Agent"));
            assert_eq!(app.role_scope_tag_ids, vec!["0", "3"]);
        }
        other => panic!("unexpected lookup {other:?}"),
    }
}
