//! End-to-end tests against an in-process sync server.
//!
//! Each test starts a real server on a loopback port, connects over
//! WebSocket, and drives the client stack the way the binary does:
//! auth flow, task actions, and the list manager.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::similar_names,
    clippy::redundant_clone
)]

use std::net::SocketAddr;
use std::sync::Arc;

use taskdesk::auth::{AuthError, AuthFlow};
use taskdesk::session::{Session, SessionFile};
use taskdesk::store::remote::RemoteStore;
use taskdesk::store::{StoreError, TaskStore};
use taskdesk::tasks::{ActionError, TaskActions, TaskListManager};
use taskdesk_proto::task::{TASKS_PER_PAGE, TaskDraft, TaskPatch};

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

/// Starts the task server in-process and returns its bound address.
async fn start_test_server() -> (SocketAddr, tokio::task::JoinHandle<()>) {
    taskdesk_server::server::start_server("127.0.0.1:0")
        .await
        .expect("failed to start test server")
}

/// Opens a fresh client connection to the test server.
async fn connect_client(addr: SocketAddr) -> (Arc<RemoteStore>, Arc<Session>) {
    let session = Arc::new(Session::new());
    let store = RemoteStore::connect(&format!("ws://{addr}/ws"), Arc::clone(&session))
        .await
        .expect("connect to test server");
    (Arc::new(store), session)
}

/// Signs up a fresh account on an existing connection.
async fn sign_up(
    store: &Arc<RemoteStore>,
    session: &Arc<Session>,
    email: &str,
    name: &str,
) -> AuthFlow {
    let flow = AuthFlow::new(Arc::clone(store), Arc::clone(session), None);
    flow.sign_up(email, "password123", name)
        .await
        .expect("sign up");
    flow
}

// ===========================================================================
// Full client flow
// ===========================================================================

#[tokio::test]
async fn sign_up_create_list_complete_delete_round_trip() {
    let (addr, handle) = start_test_server().await;
    let (store, session) = connect_client(addr).await;
    sign_up(&store, &session, "roundtrip@example.com", "Round Tripper").await;

    let actions = TaskActions::new(Arc::clone(&store), Arc::clone(&session));
    let (manager, _notices) = TaskListManager::new(actions, 64);

    assert!(manager.create_task(TaskDraft::new("Write report")).await);
    let described = TaskDraft {
        description: Some("After the draft lands".to_string()),
        ..TaskDraft::new("Review report")
    };
    assert!(manager.create_task(described).await);

    let state = manager.snapshot().await;
    assert_eq!(state.total_count, 2);
    assert_eq!(state.tasks[0].title, "Review report");
    assert_eq!(
        state.tasks[0].description.as_deref(),
        Some("After the draft lands")
    );

    let id = state.tasks[0].id;
    assert!(manager.toggle_complete(id, true).await);
    assert!(manager.snapshot().await.tasks[0].completed);

    let patch = TaskPatch {
        title: Some("Review final report".to_string()),
        ..TaskPatch::default()
    };
    assert!(manager.update_task(id, patch).await);

    assert!(manager.delete_task(id).await);
    assert!(manager.load_page(1).await);

    let state = manager.snapshot().await;
    assert_eq!(state.total_count, 1);
    assert_eq!(state.tasks[0].title, "Write report");
    assert!(!state.tasks[0].completed);

    handle.abort();
}

// ===========================================================================
// Owner isolation
// ===========================================================================

#[tokio::test]
async fn two_accounts_never_see_each_others_tasks() {
    let (addr, handle) = start_test_server().await;

    let (store_a, session_a) = connect_client(addr).await;
    sign_up(&store_a, &session_a, "alice@example.com", "Alice A").await;
    let (store_b, session_b) = connect_client(addr).await;
    sign_up(&store_b, &session_b, "bob@example.com", "Bob B").await;

    let actions_a = TaskActions::new(Arc::clone(&store_a), Arc::clone(&session_a));
    let hers = actions_a
        .create_task(TaskDraft::new("Hers"))
        .await
        .expect("create");
    actions_a
        .create_task(TaskDraft::new("Also hers"))
        .await
        .expect("create");

    let actions_b = TaskActions::new(Arc::clone(&store_b), Arc::clone(&session_b));
    let page = actions_b.get_tasks(1).await.expect("list");
    assert_eq!(page.total_count, 0);
    assert!(page.tasks.is_empty());

    let err = actions_b.delete_task(hers.id).await.unwrap_err();
    assert!(matches!(err, ActionError::NotFound));

    let page = actions_a.get_tasks(1).await.expect("list");
    assert_eq!(page.total_count, 2);

    handle.abort();
}

// ===========================================================================
// Token lifecycle
// ===========================================================================

#[tokio::test]
async fn sign_out_revokes_the_token_for_later_calls() {
    let (addr, handle) = start_test_server().await;
    let (store, session) = connect_client(addr).await;
    let flow = sign_up(&store, &session, "leaver@example.com", "Leaving Lee").await;

    let token = session.token().expect("token present");
    let profile = session.current_user().expect("profile present");
    flow.sign_out().await.expect("sign out");
    assert!(!session.is_authenticated());

    // Replay the revoked token: the server must refuse it.
    session.set(token, profile.clone());
    let err = store.fetch_profile().await.unwrap_err();
    assert!(matches!(err, StoreError::Unauthorized));

    let err = store
        .fetch_page(profile.id, 1, TASKS_PER_PAGE)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Unauthorized));

    handle.abort();
}

#[tokio::test]
async fn wrong_password_and_duplicate_email_are_rejected() {
    let (addr, handle) = start_test_server().await;
    let (store, session) = connect_client(addr).await;
    let flow = sign_up(&store, &session, "taken@example.com", "First Claimer").await;
    flow.sign_out().await.expect("sign out");

    let err = flow
        .sign_in("taken@example.com", "not-the-password")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));
    assert!(!session.is_authenticated());

    let err = flow
        .sign_up("taken@example.com", "password456", "Second Claimer")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::EmailTaken));

    // The original credentials still work.
    let profile = flow
        .sign_in("taken@example.com", "password123")
        .await
        .expect("sign in");
    assert_eq!(profile.full_name, "First Claimer");

    handle.abort();
}

// ===========================================================================
// Pagination over the wire
// ===========================================================================

#[tokio::test]
async fn pagination_over_the_wire_returns_fixed_pages() {
    let (addr, handle) = start_test_server().await;
    let (store, session) = connect_client(addr).await;
    sign_up(&store, &session, "pager@example.com", "Page Turner").await;

    let actions = TaskActions::new(Arc::clone(&store), Arc::clone(&session));
    for i in 0..12 {
        actions
            .create_task(TaskDraft::new(format!("Task {i:02}")))
            .await
            .expect("create");
    }

    let first = actions.get_tasks(1).await.expect("page 1");
    assert_eq!(first.tasks.len(), TASKS_PER_PAGE as usize);
    assert_eq!(first.total_count, 12);
    assert_eq!(first.tasks[0].title, "Task 11");

    let second = actions.get_tasks(2).await.expect("page 2");
    assert_eq!(second.tasks.len(), 3);
    assert_eq!(second.total_count, 12);
    assert_eq!(second.tasks[2].title, "Task 00");

    handle.abort();
}

// ===========================================================================
// Session persistence
// ===========================================================================

#[tokio::test]
async fn restored_session_survives_a_new_connection() {
    let (addr, handle) = start_test_server().await;
    let path = std::env::temp_dir().join(format!("taskdesk-remote-{}.json", uuid::Uuid::new_v4()));

    {
        let (store, session) = connect_client(addr).await;
        let flow = AuthFlow::new(store, session, Some(SessionFile::new(path.clone())));
        flow.sign_up("persist@example.com", "password123", "Persistent Pat")
            .await
            .expect("sign up");
    }

    // A brand new connection and session, sharing only the session file.
    let (store, session) = connect_client(addr).await;
    let flow = AuthFlow::new(
        Arc::clone(&store),
        Arc::clone(&session),
        Some(SessionFile::new(path.clone())),
    );

    let restored = flow
        .restore()
        .await
        .expect("restore")
        .expect("stored session");
    assert_eq!(restored.email, "persist@example.com");
    assert!(session.is_authenticated());

    let actions = TaskActions::new(Arc::clone(&store), Arc::clone(&session));
    let created = actions
        .create_task(TaskDraft::new("After restart"))
        .await
        .expect("create");
    assert_eq!(created.title, "After restart");

    let _ = std::fs::remove_file(&path);
    handle.abort();
}
