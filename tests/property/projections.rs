//! Property-based tests for the list projections and the page strip.
//!
//! Uses proptest to verify:
//! 1. Filtering partitions a list without inventing or losing tasks.
//! 2. Sorting is a permutation with the documented order per key.
//! 3. The page strip always brackets with the first and last page,
//!    contains the current page, and never degenerates.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use chrono::NaiveDate;
use proptest::prelude::*;
use uuid::Uuid;

use taskdesk::tasks::pagination::{
    MAX_VISIBLE_PAGES, PageItem, clamp_page, page_numbers, total_pages,
};
use taskdesk::tasks::view::{SortKey, StatusFilter, filtered, sorted};
use taskdesk_proto::task::{Priority, Task, TaskId, Timestamp};
use taskdesk_proto::user::OwnerId;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn arb_priority() -> impl Strategy<Value = Priority> {
    prop_oneof![
        Just(Priority::Low),
        Just(Priority::Medium),
        Just(Priority::High),
    ]
}

fn arb_due_date() -> impl Strategy<Value = NaiveDate> {
    (2020i32..2036, 1u32..=12, 1u32..=28)
        .prop_filter_map("valid date", |(y, m, d)| NaiveDate::from_ymd_opt(y, m, d))
}

/// Strategy for tasks with the fields the projections look at.
fn arb_task() -> impl Strategy<Value = Task> {
    (
        any::<u128>(),
        any::<bool>(),
        arb_priority(),
        proptest::option::of(arb_due_date()),
        any::<u64>(),
    )
        .prop_map(|(id, completed, priority, due_date, created)| Task {
            id: TaskId::from_uuid(Uuid::from_u128(id)),
            owner: OwnerId::from_uuid(Uuid::from_u128(1)),
            title: "task".to_string(),
            description: None,
            priority,
            due_date,
            completed,
            created_at: Timestamp::from_millis(created),
            updated_at: Timestamp::from_millis(created),
        })
}

fn arb_tasks() -> impl Strategy<Value = Vec<Task>> {
    prop::collection::vec(arb_task(), 0..40)
}

fn arb_sort_key() -> impl Strategy<Value = SortKey> {
    prop_oneof![
        Just(SortKey::CreatedAt),
        Just(SortKey::Priority),
        Just(SortKey::DueDate),
    ]
}

/// The multiset of task ids, in a comparable order.
fn id_multiset(tasks: &[Task]) -> Vec<Uuid> {
    let mut ids: Vec<Uuid> = tasks.iter().map(|t| *t.id.as_uuid()).collect();
    ids.sort_unstable();
    ids
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    /// Pending and completed partition the list; `All` is the identity.
    #[test]
    fn filter_partitions_the_list(tasks in arb_tasks()) {
        let pending = filtered(&tasks, StatusFilter::Pending);
        let completed = filtered(&tasks, StatusFilter::Completed);

        prop_assert_eq!(pending.len() + completed.len(), tasks.len());
        prop_assert!(pending.iter().all(|t| !t.completed));
        prop_assert!(completed.iter().all(|t| t.completed));
        prop_assert_eq!(filtered(&tasks, StatusFilter::All), tasks);
    }

    /// Sorting by any key is a permutation of the input.
    #[test]
    fn sort_is_a_permutation(tasks in arb_tasks(), key in arb_sort_key()) {
        let out = sorted(&tasks, key);
        prop_assert_eq!(out.len(), tasks.len());
        prop_assert_eq!(id_multiset(&out), id_multiset(&tasks));
    }

    /// The creation-time order is newest first.
    #[test]
    fn created_at_sort_is_newest_first(tasks in arb_tasks()) {
        let out = sorted(&tasks, SortKey::CreatedAt);
        for pair in out.windows(2) {
            prop_assert!(pair[0].created_at >= pair[1].created_at);
        }
    }

    /// The priority order is highest first.
    #[test]
    fn priority_sort_is_highest_first(tasks in arb_tasks()) {
        let out = sorted(&tasks, SortKey::Priority);
        for pair in out.windows(2) {
            prop_assert!(pair[0].priority >= pair[1].priority);
        }
    }

    /// A chain of projections ends where it started: re-sorting by
    /// creation time restores the server-provided order, so intermediate
    /// sorts never disturb the canonical page.
    #[test]
    fn chained_sorts_return_to_server_order(tasks in arb_tasks()) {
        // Server pages arrive newest first with distinct timestamps.
        let mut canonical = tasks;
        for (i, task) in canonical.iter_mut().enumerate() {
            task.created_at = Timestamp::from_millis(u64::MAX - i as u64);
        }

        let by_priority = sorted(&canonical, SortKey::Priority);
        let by_due = sorted(&by_priority, SortKey::DueDate);
        let restored = sorted(&by_due, SortKey::CreatedAt);
        prop_assert_eq!(restored, canonical);
    }

    /// Dated tasks come earliest first; undated tasks form the tail.
    #[test]
    fn due_date_sort_puts_undated_last(tasks in arb_tasks()) {
        let out = sorted(&tasks, SortKey::DueDate);

        if let Some(first_undated) = out.iter().position(|t| t.due_date.is_none()) {
            prop_assert!(out[first_undated..].iter().all(|t| t.due_date.is_none()));
        }

        let dated: Vec<NaiveDate> = out.iter().filter_map(|t| t.due_date).collect();
        for pair in dated.windows(2) {
            prop_assert!(pair[0] <= pair[1]);
        }
    }

    /// Page count covers every item with no page to spare.
    #[test]
    fn total_pages_covers_all_items(total_count in 0u64..100_000, per_page in 1u32..500) {
        let pages = total_pages(total_count, per_page);
        prop_assert!(u64::from(pages) * u64::from(per_page) >= total_count);
        if total_count == 0 {
            prop_assert_eq!(pages, 0);
        } else {
            prop_assert!(u64::from(pages - 1) * u64::from(per_page) < total_count);
        }
    }

    /// The strip brackets with first and last, contains the current page,
    /// never repeats an ellipsis, and keeps page numbers increasing.
    #[test]
    fn page_strip_invariants(current in 0u32..600, total in 0u32..600) {
        let items = page_numbers(current, total);
        let total = total.max(1);

        prop_assert_eq!(items.first(), Some(&PageItem::Page(1)));
        prop_assert_eq!(items.last(), Some(&PageItem::Page(total)));
        prop_assert!(items.contains(&PageItem::Page(clamp_page(current, total))));

        let mut last_page = 0u32;
        let mut prev_was_ellipsis = false;
        for item in &items {
            match item {
                PageItem::Page(page) => {
                    prop_assert!(*page > last_page);
                    last_page = *page;
                    prev_was_ellipsis = false;
                }
                PageItem::Ellipsis => {
                    prop_assert!(!prev_was_ellipsis);
                    prev_was_ellipsis = true;
                }
            }
        }

        // First + last + the window + at most two ellipses.
        prop_assert!(items.len() <= MAX_VISIBLE_PAGES as usize + 4);
    }
}
