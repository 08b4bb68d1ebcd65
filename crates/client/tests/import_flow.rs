//! End-to-end tests for the client library against a live server.
//!
//! Binds the real application router to an ephemeral port and drives
//! the workflow and poller over actual HTTP, demo-seeded catalog and
//! background executors included.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use chorus_api::config::ServerConfig;
use chorus_api::routes;
use chorus_api::state::AppState;
use chorus_client::api::ImportApi;
use chorus_client::poller::{poll_until_terminal, PollOutcome};
use chorus_client::workflow::{ImportTarget, ImportWorkflow, Phase, Preview};
use chorus_core::EventKind;
use chorus_jobs::{Catalog, JobRegistry, MemoryCatalog};

const EVENT_SHEET: &[u8] =
    b"reference;title;date\nX1;Abendlied;01.01.2024\nX2;Lobet den Herrn;15.01.2024\n";

/// Serve the real application on an ephemeral port.
///
/// Returns the base URL plus the server's registry so tests can plant
/// jobs in specific states.
async fn spawn_server() -> (String, Arc<JobRegistry>) {
    let catalog: Arc<dyn Catalog> = Arc::new(
        MemoryCatalog::with_demo_seed()
            .await
            .expect("demo seed should build"),
    );
    let registry = Arc::new(JobRegistry::new());
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec![],
        request_timeout_secs: 30,
        job_ttl_secs: 300,
    };

    let state = AppState {
        registry: Arc::clone(&registry),
        catalog,
        config: Arc::new(config),
    };

    let app = axum::Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_routes())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("listener address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve test app");
    });

    (format!("http://{addr}"), registry)
}

// ---------------------------------------------------------------------------
// Test: Full event import flow ends in Done with the server's result message
// ---------------------------------------------------------------------------

#[tokio::test]
async fn event_import_flow_runs_to_done() {
    let (base_url, _registry) = spawn_server().await;
    let mut workflow = ImportWorkflow::new(
        ImportApi::new(base_url),
        ImportTarget::Events {
            kind: EventKind::Rehearsal,
        },
    );

    assert!(workflow.select_file(EVENT_SHEET.to_vec()).await);
    assert_eq!(workflow.phase(), Phase::Ready);
    match workflow.preview() {
        Some(Preview::Events(rows)) => {
            assert_eq!(rows.len(), 2);
            assert_eq!(rows[0].reference, "X1");
        }
        other => panic!("expected an event preview, got {other:?}"),
    }

    assert!(workflow.submit().await);
    assert_eq!(workflow.phase(), Phase::Polling);
    assert_eq!(workflow.logs(), ["Importvorgang wird gestartet..."]);

    let mut last_percent = 0;
    let phase = workflow
        .poll_to_end(|percent, _logs| last_percent = percent)
        .await;

    assert_eq!(phase, Phase::Done);
    assert_eq!(last_percent, 100);
    assert!(
        !workflow.logs().is_empty(),
        "server log lines should have replaced the start placeholder"
    );

    let notices = workflow.take_notices();
    assert_eq!(notices, ["Imported 2 rows"]);
}

// ---------------------------------------------------------------------------
// Test: A failed job leaves the workflow recoverable with the error on show
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_import_keeps_workflow_open() {
    let (base_url, _registry) = spawn_server().await;
    let mut workflow = ImportWorkflow::new(
        ImportApi::new(base_url),
        ImportTarget::Events {
            kind: EventKind::Service,
        },
    );

    let bad_sheet = b"reference;title;date\nX1;Abendlied;01.01.2024\nX2;Lobet den Herrn;kaputt\n";
    assert!(workflow.select_file(bad_sheet.to_vec()).await);
    assert!(workflow.submit().await);

    let phase = workflow.poll_to_end(|_, _| {}).await;
    assert_eq!(phase, Phase::Failed);

    let notices = workflow.take_notices();
    assert_eq!(notices, ["Import fehlgeschlagen: Invalid date in row 2"]);
    assert_eq!(
        workflow.logs().last().map(String::as_str),
        Some("ERROR: Invalid date in row 2")
    );

    // Failed is not the end of the dialog: a new sheet starts over.
    assert!(workflow.select_file(EVENT_SHEET.to_vec()).await);
    assert_eq!(workflow.phase(), Phase::Ready);
}

// ---------------------------------------------------------------------------
// Test: Preview failure queues a notice with detail and hint, no job
// ---------------------------------------------------------------------------

#[tokio::test]
async fn preview_failure_reports_notice() {
    let (base_url, registry) = spawn_server().await;
    let mut workflow = ImportWorkflow::new(
        ImportApi::new(base_url),
        ImportTarget::Events {
            kind: EventKind::Rehearsal,
        },
    );

    let ragged = b"reference;title;date\nX1;Abendlied\n";
    assert!(!workflow.select_file(ragged.to_vec()).await);
    assert_eq!(workflow.phase(), Phase::Idle);

    let notices = workflow.take_notices();
    assert_eq!(notices.len(), 1);
    assert!(
        notices[0].starts_with("Fehler beim Laden der Vorschau: Could not parse CSV file. - "),
        "unexpected notice: {}",
        notices[0]
    );
    assert!(
        notices[0].ends_with("(Expected a semicolon-delimited UTF-8 CSV sheet with a header line.)"),
        "unexpected notice: {}",
        notices[0]
    );

    assert_eq!(registry.job_count().await, 0);
}

// ---------------------------------------------------------------------------
// Test: Collection import forwards resolutions and finishes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn collection_import_forwards_resolutions() {
    let (base_url, _registry) = spawn_server().await;
    let mut workflow = ImportWorkflow::new(
        ImportApi::new(base_url),
        ImportTarget::Collection {
            collection_id: 1,
            resolutions: Some(r#"{"0": {"createNewComposer": true}}"#.to_string()),
        },
    );

    let sheet = b"nummer;titel;komponist\n10;Neue Kantate;Schmidt, Anna\n";
    assert!(workflow.select_file(sheet.to_vec()).await);
    match workflow.preview() {
        Some(Preview::Collection(rows)) => {
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].composer.as_deref(), Some("Schmidt, Anna"));
        }
        other => panic!("expected a collection preview, got {other:?}"),
    }

    assert!(workflow.submit().await);
    let phase = workflow.poll_to_end(|_, _| {}).await;

    assert_eq!(phase, Phase::Done);
    let notices = workflow.take_notices();
    assert_eq!(notices, ["Import complete. 1 pieces processed."]);
}

// ---------------------------------------------------------------------------
// Test: Cancellation mid-poll issues no further status requests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cancellation_mid_poll_stops_requests() {
    let (base_url, registry) = spawn_server().await;

    // A job that is never picked up stays pending, so polling would
    // continue indefinitely without the cancellation.
    let job_id = registry.create().await;

    let api = ImportApi::new(base_url);
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();

    let mut updates = 0;
    let outcome = poll_until_terminal(&api, &job_id, &cancel, |_, _| {
        updates += 1;
        trigger.cancel();
    })
    .await;

    assert_eq!(outcome, PollOutcome::Cancelled);
    assert_eq!(updates, 1, "exactly one snapshot before the cancellation");
}

// ---------------------------------------------------------------------------
// Test: Unreachable server surfaces as the generic preview failure
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unreachable_server_notice_is_generic() {
    let mut workflow = ImportWorkflow::new(
        ImportApi::new("http://127.0.0.1:1".to_string()),
        ImportTarget::Events {
            kind: EventKind::Rehearsal,
        },
    );

    assert!(!workflow.select_file(EVENT_SHEET.to_vec()).await);
    let notices = workflow.take_notices();
    assert_eq!(notices, ["Fehler beim Laden der Vorschau: Unbekannter Fehler"]);
}
