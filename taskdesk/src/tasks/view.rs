//! Pure projections over a task list.
//!
//! Filtering and sorting never touch the store; they reshape whatever
//! page the list manager currently holds.

use taskdesk_proto::task::Task;

/// Which tasks to show.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Completed,
}

/// How to order the shown tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum SortKey {
    /// Newest first.
    #[default]
    CreatedAt,
    /// Highest priority first.
    Priority,
    /// Earliest due date first; tasks without one go last.
    DueDate,
}

/// Keep only the tasks matching the filter.
#[must_use]
pub fn filtered(tasks: &[Task], filter: StatusFilter) -> Vec<Task> {
    tasks
        .iter()
        .filter(|task| match filter {
            StatusFilter::All => true,
            StatusFilter::Pending => !task.completed,
            StatusFilter::Completed => task.completed,
        })
        .cloned()
        .collect()
}

/// Order tasks by the given key.
///
/// The sort is stable, so tasks that compare equal keep the order the
/// server returned them in.
#[must_use]
pub fn sorted(tasks: &[Task], key: SortKey) -> Vec<Task> {
    let mut out = tasks.to_vec();
    match key {
        SortKey::CreatedAt => out.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortKey::Priority => out.sort_by(|a, b| b.priority.cmp(&a.priority)),
        SortKey::DueDate => out.sort_by(|a, b| match (a.due_date, b.due_date) {
            (None, None) => std::cmp::Ordering::Equal,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (Some(_), None) => std::cmp::Ordering::Less,
            (Some(x), Some(y)) => x.cmp(&y),
        }),
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
