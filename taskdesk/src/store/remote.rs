//! WebSocket-backed store talking to a `TaskDesk` sync server.
//!
//! One connection carries one strictly ordered request/response stream:
//! every [`ClientRequest`] is answered by exactly one [`ServerResponse`],
//! in order, so no correlation ids are needed on the wire.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use taskdesk_proto::codec;
use taskdesk_proto::task::{Task, TaskDraft, TaskId, TaskPage, TaskPatch};
use taskdesk_proto::user::{OwnerId, SessionToken, UserProfile};
use taskdesk_proto::wire::{ClientRequest, ErrorKind, ServerResponse};

use crate::session::Session;
use crate::store::{StoreError, TaskStore};

/// Timeout for establishing the WebSocket connection.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for a single request/response exchange.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

type WsSender = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsReader = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Both halves of the socket, locked together.
///
/// A request and its reply must stay paired, so one mutex covers the
/// sender and the reader. Concurrent callers queue on the lock instead of
/// stealing each other's replies.
struct WsIo {
    sender: WsSender,
    reader: WsReader,
}

/// Store backed by a WebSocket connection to the sync server.
pub struct RemoteStore {
    server_url: String,
    session: Arc<Session>,
    io: tokio::sync::Mutex<WsIo>,
    connected: AtomicBool,
    request_timeout: Duration,
}

impl RemoteStore {
    /// Connect to the sync server at the given WebSocket URL.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidUrl`] if the URL does not parse or is
    /// not a `ws`/`wss` URL, [`StoreError::Timeout`] if the connection
    /// attempt takes too long, and [`StoreError::Unreachable`] or
    /// [`StoreError::Io`] if the server cannot be reached.
    pub async fn connect(server_url: &str, session: Arc<Session>) -> Result<Self, StoreError> {
        // Step 1: validate the URL before dialing.
        let url = url::Url::parse(server_url)
            .map_err(|e| StoreError::InvalidUrl(format!("{server_url}: {e}")))?;
        if url.scheme() != "ws" && url.scheme() != "wss" {
            return Err(StoreError::InvalidUrl(format!(
                "{server_url}: expected ws:// or wss:// scheme"
            )));
        }

        // Step 2: establish the WebSocket connection with a deadline.
        let (ws_stream, _response) =
            tokio::time::timeout(CONNECT_TIMEOUT, connect_async(server_url))
                .await
                .map_err(|_| {
                    tracing::warn!(url = server_url, "connection attempt timed out");
                    StoreError::Timeout
                })?
                .map_err(|e| {
                    tracing::warn!(url = server_url, err = %e, "failed to connect to server");
                    map_ws_connect_error(server_url, &e)
                })?;

        tracing::info!(url = server_url, "connected to sync server");

        let (sender, reader) = ws_stream.split();
        Ok(Self {
            server_url: server_url.to_string(),
            session,
            io: tokio::sync::Mutex::new(WsIo { sender, reader }),
            connected: AtomicBool::new(true),
            request_timeout: REQUEST_TIMEOUT,
        })
    }

    /// Override the per-request timeout (defaults to 10 seconds).
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// The URL this store was connected to.
    #[must_use]
    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Whether the connection is still believed to be open.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Register a new account and open a session for it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::EmailTaken`] if an account already exists for
    /// the email, or a transport error if the exchange fails.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<(SessionToken, UserProfile), StoreError> {
        let reply = self
            .call(&ClientRequest::SignUp {
                email: email.to_string(),
                password: password.to_string(),
                full_name: full_name.to_string(),
            })
            .await?;
        match reply {
            ServerResponse::SessionStarted { token, profile } => Ok((token, profile)),
            other => Err(unexpected_reply("SessionStarted", &other)),
        }
    }

    /// Sign in with an existing account's credentials.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidCredentials`] for a wrong email or
    /// password, or a transport error if the exchange fails.
    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(SessionToken, UserProfile), StoreError> {
        let reply = self
            .call(&ClientRequest::SignIn {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await?;
        match reply {
            ServerResponse::SessionStarted { token, profile } => Ok((token, profile)),
            other => Err(unexpected_reply("SessionStarted", &other)),
        }
    }

    /// Revoke the current session token on the server.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unauthorized`] if no session is active, or a
    /// transport error if the exchange fails.
    pub async fn sign_out(&self) -> Result<(), StoreError> {
        let token = self.token()?;
        let reply = self.call(&ClientRequest::SignOut { token }).await?;
        match reply {
            ServerResponse::SignedOut => Ok(()),
            other => Err(unexpected_reply("SignedOut", &other)),
        }
    }

    /// Fetch the profile attached to the current session.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unauthorized`] if the session token is
    /// missing or no longer valid.
    pub async fn fetch_profile(&self) -> Result<UserProfile, StoreError> {
        let token = self.token()?;
        let reply = self.call(&ClientRequest::GetUser { token }).await?;
        match reply {
            ServerResponse::Profile(profile) => Ok(profile),
            other => Err(unexpected_reply("Profile", &other)),
        }
    }

    /// Change the signed-in user's display name.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unauthorized`] if the session token is
    /// missing or no longer valid, or [`StoreError::Rejected`] if the
    /// server refuses the new name.
    pub async fn update_profile(&self, full_name: &str) -> Result<UserProfile, StoreError> {
        let token = self.token()?;
        let reply = self
            .call(&ClientRequest::UpdateProfile {
                token,
                full_name: full_name.to_string(),
            })
            .await?;
        match reply {
            ServerResponse::Profile(profile) => Ok(profile),
            other => Err(unexpected_reply("Profile", &other)),
        }
    }

    fn token(&self) -> Result<SessionToken, StoreError> {
        self.session.token().ok_or(StoreError::Unauthorized)
    }

    /// Send one request and wait for its reply.
    async fn call(&self, request: &ClientRequest) -> Result<ServerResponse, StoreError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(StoreError::ConnectionClosed);
        }

        let payload = codec::encode(request)?;

        // Hold the lock across send and receive so the reply cannot be
        // consumed by another caller.
        let mut io = self.io.lock().await;
        if let Err(e) = io.sender.send(Message::Binary(payload.into())).await {
            tracing::warn!(err = %e, "failed to send request");
            self.connected.store(false, Ordering::SeqCst);
            return Err(StoreError::ConnectionClosed);
        }

        let reply = tokio::time::timeout(self.request_timeout, Self::read_reply(&mut io.reader))
            .await;
        drop(io);

        let reply = match reply {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => {
                if matches!(e, StoreError::ConnectionClosed) {
                    self.connected.store(false, Ordering::SeqCst);
                }
                return Err(e);
            }
            Err(_) => {
                tracing::warn!("request timed out waiting for reply");
                return Err(StoreError::Timeout);
            }
        };

        match reply {
            ServerResponse::Error { kind, reason } => Err(map_server_error(kind, &reason)),
            other => Ok(other),
        }
    }

    /// Read frames until a decodable reply arrives.
    async fn read_reply(reader: &mut WsReader) -> Result<ServerResponse, StoreError> {
        loop {
            match reader.next().await {
                Some(Ok(Message::Binary(data))) => {
                    return Ok(codec::decode::<ServerResponse>(&data)?);
                }
                Some(Ok(Message::Close(_))) | None => {
                    return Err(StoreError::ConnectionClosed);
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Text(_) | Message::Frame(_))) => {
                    // Control frames and stray text are not replies.
                }
                Some(Err(e)) => {
                    tracing::warn!(err = %e, "websocket error while awaiting reply");
                    return Err(StoreError::ConnectionClosed);
                }
            }
        }
    }
}

impl TaskStore for RemoteStore {
    // The server derives the owner from the session token, so the owner
    // argument is not sent on the wire.
    async fn fetch_page(
        &self,
        _owner: OwnerId,
        page: u32,
        per_page: u32,
    ) -> Result<TaskPage, StoreError> {
        let token = self.token()?;
        let reply = self
            .call(&ClientRequest::ListTasks {
                token,
                page,
                per_page,
            })
            .await?;
        match reply {
            ServerResponse::TaskPage(page) => Ok(page),
            other => Err(unexpected_reply("TaskPage", &other)),
        }
    }

    async fn create(&self, _owner: OwnerId, draft: &TaskDraft) -> Result<Task, StoreError> {
        let token = self.token()?;
        let reply = self
            .call(&ClientRequest::CreateTask {
                token,
                draft: draft.clone(),
            })
            .await?;
        match reply {
            ServerResponse::TaskCreated(task) => Ok(task),
            other => Err(unexpected_reply("TaskCreated", &other)),
        }
    }

    async fn update(
        &self,
        _owner: OwnerId,
        id: TaskId,
        patch: &TaskPatch,
    ) -> Result<Task, StoreError> {
        let token = self.token()?;
        let reply = self
            .call(&ClientRequest::UpdateTask {
                token,
                id,
                patch: patch.clone(),
            })
            .await?;
        match reply {
            ServerResponse::TaskUpdated(task) => Ok(task),
            other => Err(unexpected_reply("TaskUpdated", &other)),
        }
    }

    async fn delete(&self, _owner: OwnerId, id: TaskId) -> Result<(), StoreError> {
        let token = self.token()?;
        let reply = self.call(&ClientRequest::DeleteTask { token, id }).await?;
        match reply {
            ServerResponse::TaskDeleted(_) => Ok(()),
            other => Err(unexpected_reply("TaskDeleted", &other)),
        }
    }
}

fn map_server_error(kind: ErrorKind, reason: &str) -> StoreError {
    match kind {
        ErrorKind::Unauthorized => StoreError::Unauthorized,
        ErrorKind::NotFound => StoreError::NotFound,
        ErrorKind::InvalidCredentials => StoreError::InvalidCredentials,
        ErrorKind::EmailTaken => StoreError::EmailTaken,
        ErrorKind::InvalidRequest | ErrorKind::Internal => StoreError::Rejected {
            reason: reason.to_string(),
        },
    }
}

fn unexpected_reply(expected: &str, got: &ServerResponse) -> StoreError {
    tracing::warn!(?got, "server sent an unexpected reply");
    StoreError::Protocol(format!("expected {expected} reply"))
}

/// Map a tungstenite connect error to a store error.
fn map_ws_connect_error(url: &str, err: &tokio_tungstenite::tungstenite::Error) -> StoreError {
    use tokio_tungstenite::tungstenite::Error as WsError;

    match err {
        WsError::Io(io_err)
            if matches!(
                io_err.kind(),
                std::io::ErrorKind::ConnectionRefused | std::io::ErrorKind::AddrNotAvailable
            ) =>
        {
            StoreError::Unreachable(url.to_string())
        }
        WsError::Tls(tls_err) => {
            StoreError::Io(std::io::Error::other(format!("TLS error: {tls_err}")))
        }
        WsError::Http(response) => StoreError::Io(std::io::Error::other(format!(
            "server rejected connection with status {}",
            response.status()
        ))),
        other => StoreError::Io(std::io::Error::other(format!("connection failed: {other}"))),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
