//! Integration tests for the task list manager over the in-memory store.
//!
//! Covers the full edit cycle against store contents, rollback for every
//! failure kind, page bookkeeping across mutations, the signed-out guard,
//! and the fixed notification wordings.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::similar_names,
    clippy::redundant_clone
)]

use std::sync::Arc;

use tokio::sync::mpsc;

use taskdesk::notify::{Notification, messages};
use taskdesk::session::Session;
use taskdesk::store::TaskStore;
use taskdesk::store::memory::{FailureMode, MemoryStore};
use taskdesk::tasks::{TaskActions, TaskListManager};
use taskdesk_proto::task::{TASKS_PER_PAGE, TaskDraft, TaskId, TaskPatch};
use taskdesk_proto::user::{OwnerId, SessionToken, UserProfile};

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

/// Creates a session already signed in as a fresh test user.
fn signed_in_session() -> (Arc<Session>, OwnerId) {
    let owner = OwnerId::new();
    let session = Session::new();
    session.set(
        SessionToken::new("list-sync-token"),
        UserProfile {
            id: owner,
            email: "sync@example.com".to_string(),
            full_name: "Sync Tester".to_string(),
            avatar_url: None,
        },
    );
    (Arc::new(session), owner)
}

/// Builds a list manager over the given store and session.
fn make_manager(
    store: &Arc<MemoryStore>,
    session: &Arc<Session>,
) -> (TaskListManager<MemoryStore>, mpsc::Receiver<Notification>) {
    let actions = TaskActions::new(Arc::clone(store), Arc::clone(session));
    TaskListManager::new(actions, 64)
}

/// Collects every notification currently queued.
fn drain(notices: &mut mpsc::Receiver<Notification>) -> Vec<Notification> {
    let mut out = Vec::new();
    while let Ok(notice) = notices.try_recv() {
        out.push(notice);
    }
    out
}

// ===========================================================================
// Edit cycle consistency
// ===========================================================================

#[tokio::test]
async fn full_edit_cycle_matches_the_store() {
    let store = Arc::new(MemoryStore::new());
    let (session, owner) = signed_in_session();
    let (manager, _notices) = make_manager(&store, &session);

    assert!(manager.create_task(TaskDraft::new("Book flights")).await);
    assert!(manager.create_task(TaskDraft::new("Pack bags")).await);
    assert!(manager.create_task(TaskDraft::new("Water plants")).await);

    let tasks = manager.snapshot().await.tasks;
    assert!(manager.toggle_complete(tasks[1].id, true).await);
    let retitle = TaskPatch {
        title: Some("Water plants twice".to_string()),
        ..TaskPatch::default()
    };
    assert!(manager.update_task(tasks[0].id, retitle).await);
    assert!(manager.delete_task(tasks[2].id).await);

    assert!(manager.load_page(1).await);
    let state = manager.snapshot().await;
    let page = store
        .fetch_page(owner, 1, TASKS_PER_PAGE)
        .await
        .expect("direct fetch");

    assert_eq!(state.tasks, page.tasks);
    assert_eq!(state.total_count, page.total_count);
    assert_eq!(state.total_count, 2);
    assert_eq!(state.tasks[0].title, "Water plants twice");
    assert!(state.tasks[1].completed);
    assert_eq!(store.task_count(owner).await, 2);
}

#[tokio::test]
async fn reloading_the_same_page_changes_nothing() {
    let store = Arc::new(MemoryStore::new());
    let (session, _owner) = signed_in_session();
    let (manager, _notices) = make_manager(&store, &session);

    manager.create_task(TaskDraft::new("Stable")).await;
    assert!(manager.load_page(1).await);
    let first = manager.snapshot().await;

    assert!(manager.load_page(1).await);
    let second = manager.snapshot().await;

    assert_eq!(first.tasks, second.tasks);
    assert_eq!(first.total_count, second.total_count);
    assert_eq!(first.current_page, second.current_page);
}

// ===========================================================================
// Rollback behaviour
// ===========================================================================

#[tokio::test]
async fn every_failure_kind_rolls_back_the_same_way() {
    let store = Arc::new(MemoryStore::new());
    let (session, _owner) = signed_in_session();
    let (manager, mut notices) = make_manager(&store, &session);

    manager.create_task(TaskDraft::new("First")).await;
    manager.create_task(TaskDraft::new("Second")).await;
    let before = manager.snapshot().await;
    drain(&mut notices);

    for mode in [
        FailureMode::Unauthorized,
        FailureMode::NotFound,
        FailureMode::Backend,
    ] {
        store.fail_next(mode).await;
        assert!(!manager.toggle_complete(before.tasks[0].id, true).await);

        let state = manager.snapshot().await;
        assert_eq!(state.tasks, before.tasks);
        assert_eq!(state.total_count, before.total_count);

        let notes = drain(&mut notices);
        assert_eq!(notes.len(), 1);
        assert!(!notes[0].is_success());
        assert_eq!(notes[0].message(), messages::UPDATE_ERROR);
    }
}

#[tokio::test]
async fn interleaved_failures_keep_totals_accurate() {
    let store = Arc::new(MemoryStore::new());
    let (session, owner) = signed_in_session();
    let (manager, mut notices) = make_manager(&store, &session);

    for title in ["One", "Two", "Three"] {
        assert!(manager.create_task(TaskDraft::new(title)).await);
    }
    let ids: Vec<TaskId> = manager.snapshot().await.tasks.iter().map(|t| t.id).collect();
    drain(&mut notices);

    store.fail_next(FailureMode::Backend).await;
    assert!(!manager.delete_task(ids[0]).await);
    assert_eq!(manager.snapshot().await.total_count, 3);
    assert_eq!(store.task_count(owner).await, 3);

    assert!(manager.delete_task(ids[0]).await);
    assert_eq!(manager.snapshot().await.total_count, 2);
    assert_eq!(store.task_count(owner).await, 2);

    store.fail_next(FailureMode::Backend).await;
    assert!(!manager.create_task(TaskDraft::new("Rejected")).await);
    assert_eq!(manager.snapshot().await.total_count, 2);
    assert_eq!(store.task_count(owner).await, 2);

    assert!(manager.create_task(TaskDraft::new("Four")).await);
    let state = manager.snapshot().await;
    assert_eq!(state.total_count, 3);
    assert_eq!(state.tasks[0].title, "Four");
    assert_eq!(store.task_count(owner).await, 3);
}

// ===========================================================================
// Page bookkeeping
// ===========================================================================

#[tokio::test]
async fn create_from_a_later_page_returns_to_page_one() {
    let store = Arc::new(MemoryStore::new());
    let (session, _owner) = signed_in_session();
    let (manager, _notices) = make_manager(&store, &session);

    for i in 0..10 {
        assert!(manager.create_task(TaskDraft::new(format!("Task {i}"))).await);
    }
    assert!(manager.load_page(2).await);
    assert_eq!(manager.snapshot().await.current_page, 2);

    assert!(manager.create_task(TaskDraft::new("Latest")).await);

    let state = manager.snapshot().await;
    assert_eq!(state.current_page, 1);
    assert_eq!(state.total_count, 11);
    assert_eq!(state.tasks.len(), TASKS_PER_PAGE as usize);
    assert_eq!(state.tasks[0].title, "Latest");
}

#[tokio::test]
async fn deleting_the_sole_task_on_page_two_steps_back() {
    let store = Arc::new(MemoryStore::new());
    let (session, owner) = signed_in_session();
    let (manager, _notices) = make_manager(&store, &session);

    for i in 0..10 {
        assert!(manager.create_task(TaskDraft::new(format!("Task {i}"))).await);
    }
    assert!(manager.load_page(2).await);
    let state = manager.snapshot().await;
    assert_eq!(state.tasks.len(), 1);

    assert!(manager.delete_task(state.tasks[0].id).await);

    let state = manager.snapshot().await;
    assert_eq!(state.current_page, 1);
    assert_eq!(state.tasks.len(), 9);
    assert_eq!(state.total_count, 9);
    assert_eq!(store.task_count(owner).await, 9);
}

// ===========================================================================
// Signed-out guard
// ===========================================================================

#[tokio::test]
async fn signed_out_calls_never_reach_the_store() {
    let store = Arc::new(MemoryStore::new());
    let session = Arc::new(Session::new());
    let (manager, mut notices) = make_manager(&store, &session);

    // Arm a one-shot failure. If any signed-out call reached the store it
    // would consume this; the signed-in probe below proves none did.
    store.fail_next(FailureMode::Backend).await;

    assert!(!manager.create_task(TaskDraft::new("No owner")).await);
    assert!(!manager.toggle_complete(TaskId::new(), true).await);
    assert!(!manager.delete_task(TaskId::new()).await);

    let notes = drain(&mut notices);
    assert_eq!(notes.len(), 3);
    assert!(notes.iter().all(|n| !n.is_success()));
    assert_eq!(notes[0].message(), messages::CREATE_ERROR);
    assert_eq!(notes[1].message(), messages::UPDATE_ERROR);
    assert_eq!(notes[2].message(), messages::DELETE_ERROR);

    session.set(
        SessionToken::new("late-token"),
        UserProfile {
            id: OwnerId::new(),
            email: "late@example.com".to_string(),
            full_name: "Late Arrival".to_string(),
            avatar_url: None,
        },
    );

    assert!(!manager.create_task(TaskDraft::new("Probe")).await);
    assert!(manager.create_task(TaskDraft::new("Landed")).await);
    assert_eq!(manager.snapshot().await.total_count, 1);
}

// ===========================================================================
// Notification wording
// ===========================================================================

#[tokio::test]
async fn notification_wording_matches_the_catalog() {
    let store = Arc::new(MemoryStore::new());
    let (session, _owner) = signed_in_session();
    let (manager, mut notices) = make_manager(&store, &session);

    assert!(manager.create_task(TaskDraft::new("Wordy")).await);
    let id = manager.snapshot().await.tasks[0].id;
    assert!(manager.toggle_complete(id, true).await);
    assert!(manager.toggle_complete(id, false).await);
    let patch = TaskPatch {
        title: Some("Wordier".to_string()),
        ..TaskPatch::default()
    };
    assert!(manager.update_task(id, patch).await);
    assert!(manager.delete_task(id).await);
    store.fail_next(FailureMode::Backend).await;
    assert!(!manager.load_page(1).await);

    let messages_seen: Vec<String> = drain(&mut notices)
        .iter()
        .map(|n| n.message().to_string())
        .collect();
    assert_eq!(
        messages_seen,
        vec![
            messages::CREATE_SUCCESS.to_string(),
            messages::COMPLETE_SUCCESS.to_string(),
            messages::INCOMPLETE_SUCCESS.to_string(),
            messages::UPDATE_SUCCESS.to_string(),
            messages::DELETE_SUCCESS.to_string(),
            messages::LOAD_ERROR.to_string(),
        ]
    );
}
