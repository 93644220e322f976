//! `TaskDesk` — terminal task manager backed by a sync server.
//!
//! Talks to a `taskdesk-server` over WebSocket. Configuration via CLI
//! flags, environment variables, or config file
//! (`~/.config/taskdesk/config.toml`).
//!
//! ```bash
//! # Create an account and sign in
//! taskdesk signup alice@example.com --name "Alice" --password secret123
//!
//! # Add and list tasks
//! taskdesk add "Buy milk" --priority high --due 2026-09-01
//! taskdesk list --filter pending --sort due-date
//!
//! # Complete and remove
//! taskdesk done <task-id>
//! taskdesk rm <task-id>
//! ```

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::mpsc;
use tracing_appender::non_blocking::WorkerGuard;

use taskdesk::auth::{AuthError, AuthFlow};
use taskdesk::config::{CliArgs, ClientConfig, Command};
use taskdesk::notify::{Notification, messages};
use taskdesk::session::{Session, SessionFile};
use taskdesk::store::remote::RemoteStore;
use taskdesk::tasks::list::ListState;
use taskdesk::tasks::pagination::{self, PageItem};
use taskdesk::tasks::view;
use taskdesk::tasks::{TaskActions, TaskListManager};
use taskdesk_proto::task::{TASKS_PER_PAGE, Task, TaskDraft, TaskPatch};
use taskdesk_proto::user::UserProfile;

/// Capacity of the notification channel; a single command never comes
/// close to filling it.
const NOTICE_BUFFER: usize = 32;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = CliArgs::parse();

    // Load config from CLI args + config file + env vars + defaults.
    let config = match ClientConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config file: {e}");
            ClientConfig::default()
        }
    };

    // Initialize logging before any work (logs go to file, not stdout,
    // which belongs to command output).
    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());

    tracing::info!("taskdesk starting");

    match run(cli.command, &config).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize file-based logging.
///
/// Logs are written to a file (never stdout, which carries the command's
/// output). Returns a [`WorkerGuard`] that must be held until shutdown to
/// ensure all buffered log entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("taskdesk.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

/// Connect to the server and run one command.
#[allow(clippy::too_many_lines)]
async fn run(
    command: Command,
    config: &ClientConfig,
) -> Result<ExitCode, Box<dyn std::error::Error + Send + Sync>> {
    let session = Arc::new(Session::new());
    let session_file = config
        .session_file
        .clone()
        .map(SessionFile::new)
        .or_else(SessionFile::default_location);

    let store = Arc::new(
        RemoteStore::connect(&config.server_url, Arc::clone(&session))
            .await?
            .with_request_timeout(config.request_timeout),
    );
    let auth = AuthFlow::new(Arc::clone(&store), Arc::clone(&session), session_file);

    match command {
        Command::Signup {
            email,
            name,
            password,
        } => match auth.sign_up(&email, &password, &name).await {
            Ok(profile) => {
                println!("{}", messages::SIGN_UP_SUCCESS);
                println!("Signed in as {} <{}>", profile.full_name, profile.email);
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => {
                eprintln!("{}: {e}", messages::SIGN_UP_ERROR);
                Ok(ExitCode::FAILURE)
            }
        },

        Command::Signin { email, password } => match auth.sign_in(&email, &password).await {
            Ok(profile) => {
                println!("{}", messages::SIGN_IN_SUCCESS);
                println!("Signed in as {} <{}>", profile.full_name, profile.email);
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => {
                eprintln!("{}: {e}", messages::SIGN_IN_ERROR);
                Ok(ExitCode::FAILURE)
            }
        },

        Command::Signout => {
            let _ = auth.restore().await;
            match auth.sign_out().await {
                Ok(()) => {
                    println!("Signed out.");
                    Ok(ExitCode::SUCCESS)
                }
                Err(AuthError::NotSignedIn) => {
                    println!("Not signed in.");
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    eprintln!("Sign out failed: {e}");
                    Ok(ExitCode::FAILURE)
                }
            }
        }

        Command::Whoami => {
            let profile = require_session(&auth).await?;
            println!("{} <{}>", profile.full_name, profile.email);
            if let Some(avatar) = profile.avatar_url {
                println!("Avatar: {avatar}");
            }
            Ok(ExitCode::SUCCESS)
        }

        Command::Profile { name } => {
            require_session(&auth).await?;
            match auth.update_profile(&name).await {
                Ok(profile) => {
                    println!("{}", messages::PROFILE_UPDATE_SUCCESS);
                    println!("{} <{}>", profile.full_name, profile.email);
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    eprintln!("{}: {e}", messages::PROFILE_UPDATE_ERROR);
                    Ok(ExitCode::FAILURE)
                }
            }
        }

        Command::List { page, filter, sort } => {
            require_session(&auth).await?;
            let (manager, mut notices) = make_manager(&store, &session);
            let ok = manager.load_page(page).await;
            if ok {
                let state = manager.snapshot().await;
                let shown = view::sorted(&view::filtered(&state.tasks, filter), sort);
                render_list(&shown, &state);
            }
            Ok(finish(ok, &mut notices))
        }

        Command::Add {
            title,
            description,
            priority,
            due,
        } => {
            require_session(&auth).await?;
            let (manager, mut notices) = make_manager(&store, &session);
            let mut draft = TaskDraft::new(title);
            draft.description = description;
            draft.priority = priority;
            draft.due_date = due;
            let ok = manager.create_task(draft).await;
            Ok(finish(ok, &mut notices))
        }

        Command::Edit {
            id,
            title,
            description,
            priority,
            due,
        } => {
            require_session(&auth).await?;
            let due_date = match due.as_deref() {
                None => None,
                Some("none") => Some(None),
                Some(s) => Some(Some(s.parse::<chrono::NaiveDate>()?)),
            };
            let patch = TaskPatch {
                title,
                description: description.map(|d| if d.is_empty() { None } else { Some(d) }),
                priority,
                due_date,
                completed: None,
            };
            if patch.is_empty() {
                return Err(
                    "nothing to change (pass --title, --description, --priority, or --due)".into(),
                );
            }
            let (manager, mut notices) = make_manager(&store, &session);
            let ok = manager.update_task(id, patch).await;
            Ok(finish(ok, &mut notices))
        }

        Command::Done { id } => {
            require_session(&auth).await?;
            let (manager, mut notices) = make_manager(&store, &session);
            let ok = manager.toggle_complete(id, true).await;
            Ok(finish(ok, &mut notices))
        }

        Command::Reopen { id } => {
            require_session(&auth).await?;
            let (manager, mut notices) = make_manager(&store, &session);
            let ok = manager.toggle_complete(id, false).await;
            Ok(finish(ok, &mut notices))
        }

        Command::Rm { id } => {
            require_session(&auth).await?;
            let (manager, mut notices) = make_manager(&store, &session);
            let ok = manager.delete_task(id).await;
            Ok(finish(ok, &mut notices))
        }
    }
}

/// Restore the saved session or explain how to get one.
async fn require_session(
    auth: &AuthFlow,
) -> Result<UserProfile, Box<dyn std::error::Error + Send + Sync>> {
    match auth.restore().await? {
        Some(profile) => Ok(profile),
        None => Err("not signed in (run `taskdesk signin` first)".into()),
    }
}

fn make_manager(
    store: &Arc<RemoteStore>,
    session: &Arc<Session>,
) -> (TaskListManager<RemoteStore>, mpsc::Receiver<Notification>) {
    let actions = TaskActions::new(Arc::clone(store), Arc::clone(session));
    TaskListManager::new(actions, NOTICE_BUFFER)
}

/// Print queued notifications and turn the outcome into an exit code.
fn finish(ok: bool, notices: &mut mpsc::Receiver<Notification>) -> ExitCode {
    while let Ok(notice) = notices.try_recv() {
        match notice {
            Notification::Success { message, .. } => println!("{message}"),
            Notification::Error {
                message,
                description,
            } => match description {
                Some(detail) => eprintln!("{message}: {detail}"),
                None => eprintln!("{message}"),
            },
        }
    }
    if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

/// Print the visible tasks followed by the paging summary.
fn render_list(tasks: &[Task], state: &ListState) {
    use std::fmt::Write;

    if tasks.is_empty() {
        println!("No tasks.");
        return;
    }

    for task in tasks {
        let marker = if task.completed { "[x]" } else { "[ ]" };
        let mut line = format!("{marker} {} {:>6} {}", task.id, task.priority, task.title);
        if let Some(due) = task.due_date {
            let _ = write!(line, "  due {due}");
        }
        println!("{line}");
    }

    let pages = pagination::total_pages(state.total_count, TASKS_PER_PAGE);
    if pages > 1 {
        println!("{}", render_page_strip(state.current_page, pages));
    }
    let mut summary = format!(
        "{} tasks total, page {} of {}",
        state.total_count,
        state.current_page,
        pages.max(1)
    );
    if pagination::has_previous(state.current_page) {
        let _ = write!(summary, "  (previous: --page {})", state.current_page - 1);
    }
    if pagination::has_next(state.current_page, pages) {
        let _ = write!(summary, "  (next: --page {})", state.current_page + 1);
    }
    println!("{summary}");
}

/// Format the page strip, e.g. `1 ... 4 [5] 6 ... 12`.
fn render_page_strip(current: u32, total_pages: u32) -> String {
    use std::fmt::Write;

    let mut out = String::new();
    for item in pagination::page_numbers(current, total_pages) {
        if !out.is_empty() {
            out.push(' ');
        }
        match item {
            PageItem::Page(page) if page == current => {
                let _ = write!(out, "[{page}]");
            }
            PageItem::Page(page) => {
                let _ = write!(out, "{page}");
            }
            PageItem::Ellipsis => out.push_str("..."),
        }
    }
    out
}
