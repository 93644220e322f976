//! Configuration system for the `TaskDesk` client.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/taskdesk/config.toml`)
//! 4. Compiled defaults
//!
//! Missing config file is not an error (defaults are used). An explicit
//! `--config` path that doesn't exist is an error.

use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;

use taskdesk_proto::task::{Priority, TaskId};

use crate::tasks::view::{SortKey, StatusFilter};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    server: ServerFileConfig,
    session: SessionFileConfig,
}

/// `[server]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ServerFileConfig {
    url: Option<String>,
    request_timeout_secs: Option<u64>,
}

/// `[session]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct SessionFileConfig {
    file: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Resolved configuration (concrete types, all fields populated)
// ---------------------------------------------------------------------------

/// Fully resolved client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// WebSocket URL of the sync server.
    pub server_url: String,
    /// Timeout for a single request/response exchange.
    pub request_timeout: Duration,
    /// Where the session is persisted between runs (`None` for the
    /// platform default).
    pub session_file: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "ws://127.0.0.1:9100/ws".to_string(),
            request_timeout: Duration::from_secs(10),
            session_file: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// CLI args and env vars are parsed via `clap`. If `--config` is given
    /// and the file does not exist, returns an error. If no `--config` is
    /// given, the default path (`~/.config/taskdesk/config.toml`) is tried
    /// and silently ignored if missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit config file cannot be read
    /// or parsed.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Ok(Self::resolve(cli, &file))
    }

    /// Resolve a `ClientConfig` from CLI args and a parsed config file.
    ///
    /// Priority: CLI > file > default. This is separated from `load()` to
    /// enable unit testing without CLI parsing.
    #[must_use]
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            server_url: cli
                .server_url
                .clone()
                .or_else(|| file.server.url.clone())
                .unwrap_or(defaults.server_url),
            request_timeout: file
                .server
                .request_timeout_secs
                .map_or(defaults.request_timeout, Duration::from_secs),
            session_file: cli
                .session_file
                .clone()
                .or_else(|| file.session.file.clone()),
        }
    }
}

/// CLI arguments parsed by clap.
#[derive(clap::Parser, Debug)]
#[command(
    version,
    about = "Terminal task manager backed by a sync server",
    arg_required_else_help = true
)]
pub struct CliArgs {
    /// WebSocket URL of the sync server.
    #[arg(long, env = "TASKDESK_SERVER_URL")]
    pub server_url: Option<String>,

    /// Path to config file (default: `~/.config/taskdesk/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Path to the saved session file.
    #[arg(long)]
    pub session_file: Option<PathBuf>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "TASKDESK_LOG")]
    pub log_level: String,

    /// Path to log file (default: `$TMPDIR/taskdesk.log`).
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// The operation to run.
#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Create an account and sign in.
    Signup {
        /// Email address for the new account.
        email: String,
        /// Display name (at least 2 characters).
        #[arg(long)]
        name: String,
        /// Password (at least 8 characters).
        #[arg(long, env = "TASKDESK_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Sign into an existing account.
    Signin {
        /// Email address of the account.
        email: String,
        /// Account password.
        #[arg(long, env = "TASKDESK_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// End the current session.
    Signout,

    /// Show who is signed in.
    Whoami,

    /// Update the signed-in user's profile.
    Profile {
        /// New display name.
        #[arg(long)]
        name: String,
    },

    /// List tasks, one page at a time.
    List {
        /// Page to show (1-based).
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Show all, pending, or completed tasks.
        #[arg(long, value_enum, default_value_t)]
        filter: StatusFilter,
        /// Ordering of the shown tasks.
        #[arg(long, value_enum, default_value_t)]
        sort: SortKey,
    },

    /// Create a task.
    Add {
        /// Task title.
        title: String,
        /// Longer description.
        #[arg(long)]
        description: Option<String>,
        /// Task priority (low, medium, high).
        #[arg(long, default_value_t = Priority::Medium)]
        priority: Priority,
        /// Due date (YYYY-MM-DD).
        #[arg(long)]
        due: Option<NaiveDate>,
    },

    /// Edit fields of an existing task.
    Edit {
        /// Id of the task to edit.
        id: TaskId,
        /// New title.
        #[arg(long)]
        title: Option<String>,
        /// New description; pass an empty string to clear it.
        #[arg(long)]
        description: Option<String>,
        /// New priority (low, medium, high).
        #[arg(long)]
        priority: Option<Priority>,
        /// New due date (YYYY-MM-DD), or `none` to clear it.
        #[arg(long)]
        due: Option<String>,
    },

    /// Mark a task as completed.
    Done {
        /// Id of the task.
        id: TaskId,
    },

    /// Mark a completed task as pending again.
    Reopen {
        /// Id of the task.
        id: TaskId,
    },

    /// Delete a task.
    Rm {
        /// Id of the task to delete.
        id: TaskId,
    },
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Load and parse a TOML config file.
///
/// If `explicit_path` is `Some`, the file must exist (error if not).
/// If `explicit_path` is `None`, the default path is tried and missing file
/// is treated as empty config.
fn load_config_file(explicit_path: Option<&std::path::Path>) -> Result<ConfigFile, ConfigError> {
    let path = if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    } else {
        let Some(config_dir) = dirs::config_dir() else {
            // No config dir on this platform, run on defaults.
            return Ok(ConfigFile::default());
        };
        config_dir.join("taskdesk").join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
