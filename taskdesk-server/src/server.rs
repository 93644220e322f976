//! Task server core: shared state, WebSocket handler, and request dispatch.
//!
//! The server accepts WebSocket connections and answers each decoded
//! [`ClientRequest`] with exactly one [`ServerResponse`] before reading the
//! next frame, so replies match requests by position. Accounts, sessions,
//! and tasks live in [`AppState`] shared across connections; clients can
//! drop and reconnect freely as long as they keep their session token.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use taskdesk_proto::codec;
use taskdesk_proto::task::ValidationError;
use taskdesk_proto::user::{CredentialError, validate_sign_up};
use taskdesk_proto::wire::{ClientRequest, ErrorKind, ServerResponse};

use crate::auth::{AuthError, AuthRegistry};
use crate::tasks::{TaskNotFound, TaskTable};

/// Shared server state: account/session registries and the task table.
#[derive(Default)]
pub struct AppState {
    /// Accounts and live sessions.
    pub auth: AuthRegistry,
    /// Owner-scoped task storage.
    pub tasks: TaskTable,
}

impl AppState {
    /// Creates empty state with default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates empty state with a custom page size ceiling from the
    /// resolved [`crate::config::ServerConfig`].
    #[must_use]
    pub fn with_config(max_per_page: u32) -> Self {
        Self {
            auth: AuthRegistry::new(),
            tasks: TaskTable::with_max_per_page(max_per_page),
        }
    }
}

/// An error reply before it is wrapped in [`ServerResponse::Error`].
///
/// Exists so request handlers can bubble failures with `?` from the
/// registries and the task table.
struct ErrorReply {
    kind: ErrorKind,
    reason: String,
}

impl ErrorReply {
    fn into_response(self) -> ServerResponse {
        ServerResponse::Error {
            kind: self.kind,
            reason: self.reason,
        }
    }
}

impl From<AuthError> for ErrorReply {
    fn from(e: AuthError) -> Self {
        let kind = match e {
            AuthError::EmailTaken => ErrorKind::EmailTaken,
            AuthError::InvalidCredentials => ErrorKind::InvalidCredentials,
            AuthError::Unauthorized => ErrorKind::Unauthorized,
            AuthError::Hash(_) => ErrorKind::Internal,
        };
        Self {
            kind,
            reason: e.to_string(),
        }
    }
}

impl From<TaskNotFound> for ErrorReply {
    fn from(e: TaskNotFound) -> Self {
        Self {
            kind: ErrorKind::NotFound,
            reason: e.to_string(),
        }
    }
}

impl From<ValidationError> for ErrorReply {
    fn from(e: ValidationError) -> Self {
        Self {
            kind: ErrorKind::InvalidRequest,
            reason: e.to_string(),
        }
    }
}

impl From<CredentialError> for ErrorReply {
    fn from(e: CredentialError) -> Self {
        Self {
            kind: ErrorKind::InvalidRequest,
            reason: e.to_string(),
        }
    }
}

/// Handles an upgraded WebSocket connection for a single client.
///
/// Reads binary frames in order and answers each with exactly one
/// response. A frame that fails to decode gets an `InvalidRequest` error
/// reply rather than a disconnect, keeping the reply stream aligned with
/// the request stream.
pub async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    while let Some(Ok(msg)) = ws_receiver.next().await {
        match msg {
            Message::Binary(data) => {
                let response = dispatch(&data, &state).await;
                if let Err(e) = send_response(&mut ws_sender, &response).await {
                    tracing::warn!(err = %e, "failed to send response, closing connection");
                    break;
                }
            }
            Message::Close(_) => {
                tracing::debug!("received close frame");
                break;
            }
            _ => {
                // Ignore text, ping, pong frames.
            }
        }
    }
}

/// Decodes one request frame and produces the response for it.
async fn dispatch(data: &[u8], state: &Arc<AppState>) -> ServerResponse {
    let request = match codec::decode::<ClientRequest>(data) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(err = %e, "failed to decode request frame");
            return ServerResponse::Error {
                kind: ErrorKind::InvalidRequest,
                reason: format!("undecodable request: {e}"),
            };
        }
    };

    match handle_request(request, state).await {
        Ok(response) => response,
        Err(reply) => {
            tracing::debug!(kind = %reply.kind, reason = %reply.reason, "request failed");
            reply.into_response()
        }
    }
}

async fn handle_request(
    request: ClientRequest,
    state: &Arc<AppState>,
) -> Result<ServerResponse, ErrorReply> {
    match request {
        ClientRequest::SignUp {
            email,
            password,
            full_name,
        } => {
            validate_sign_up(&email, &password, &full_name)?;
            let (token, profile) = state.auth.sign_up(&email, &password, &full_name).await?;
            tracing::info!(owner = %profile.id, "account created");
            Ok(ServerResponse::SessionStarted { token, profile })
        }
        ClientRequest::SignIn { email, password } => {
            let (token, profile) = state.auth.sign_in(&email, &password).await?;
            tracing::info!(owner = %profile.id, "session started");
            Ok(ServerResponse::SessionStarted { token, profile })
        }
        ClientRequest::SignOut { token } => {
            state.auth.sign_out(&token).await;
            Ok(ServerResponse::SignedOut)
        }
        ClientRequest::GetUser { token } => {
            let profile = state.auth.profile_of(&token).await?;
            Ok(ServerResponse::Profile(profile))
        }
        ClientRequest::UpdateProfile { token, full_name } => {
            let profile = state.auth.update_profile(&token, &full_name).await?;
            tracing::info!(owner = %profile.id, "profile updated");
            Ok(ServerResponse::Profile(profile))
        }
        ClientRequest::ListTasks {
            token,
            page,
            per_page,
        } => {
            let owner = state.auth.resolve(&token).await?;
            let page = state.tasks.page(owner, page, per_page).await;
            Ok(ServerResponse::TaskPage(page))
        }
        ClientRequest::CreateTask { token, mut draft } => {
            let owner = state.auth.resolve(&token).await?;
            draft.normalize();
            draft.validate()?;
            let task = state.tasks.insert(owner, draft).await;
            tracing::debug!(owner = %owner, task_id = %task.id, "task created");
            Ok(ServerResponse::TaskCreated(task))
        }
        ClientRequest::UpdateTask { token, id, patch } => {
            let owner = state.auth.resolve(&token).await?;
            patch.validate()?;
            let task = state.tasks.update(owner, id, &patch).await?;
            tracing::debug!(owner = %owner, task_id = %task.id, "task updated");
            Ok(ServerResponse::TaskUpdated(task))
        }
        ClientRequest::DeleteTask { token, id } => {
            let owner = state.auth.resolve(&token).await?;
            state.tasks.delete(owner, id).await?;
            tracing::debug!(owner = %owner, task_id = %id, "task deleted");
            Ok(ServerResponse::TaskDeleted(id))
        }
    }
}

/// Encodes and sends a response directly on a WebSocket sender.
async fn send_response(
    ws_sender: &mut (impl SinkExt<Message, Error = axum::Error> + Unpin),
    response: &ServerResponse,
) -> Result<(), String> {
    let bytes = codec::encode(response).map_err(|e| e.to_string())?;
    ws_sender
        .send(Message::Binary(bytes.into()))
        .await
        .map_err(|e| format!("WebSocket send error: {e}"))
}

/// Starts the task server on the given address and returns the bound
/// address and a join handle.
///
/// This is the primary entry point used by both `main.rs` and test code.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server(
    addr: &str,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    start_server_with_state(addr, Arc::new(AppState::new())).await
}

/// Starts the task server with a pre-configured [`AppState`].
///
/// Use [`AppState::with_config`] to create state with custom limits from
/// the resolved [`crate::config::ServerConfig`].
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server_with_state(
    addr: &str,
    state: Arc<AppState>,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    let app = axum::Router::new()
        .route("/ws", axum::routing::get(ws_handler))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "task server error");
        }
    });

    Ok((bound_addr, handle))
}

/// Starts the task server in-process for testing.
///
/// Binds to `127.0.0.1:0` (OS-assigned port) and returns the bound address
/// and a [`tokio::task::JoinHandle`] for cleanup.
#[cfg(test)]
pub async fn start_test_server() -> (std::net::SocketAddr, tokio::task::JoinHandle<()>) {
    start_server("127.0.0.1:0")
        .await
        .expect("failed to start test server")
}

/// axum handler that upgrades an HTTP request to a WebSocket connection.
async fn ws_handler(
    ws: axum::extract::ws::WebSocketUpgrade,
    axum::extract::State(state): axum::extract::State<Arc<AppState>>,
) -> impl axum::response::IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}
