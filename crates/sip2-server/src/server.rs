//! SIP2 server implementation.
//!
//! Each terminal connection runs in its own task and processes one message
//! at a time:
//!
//! 1. Read bytes up to the message terminator
//! 2. Strip and verify `AY`/`AZ` when error detection is on
//! 3. Dispatch to the handler registered for the command
//! 4. Append `AY`/`AZ`, write the response and remember it for `97`
//!
//! Anything that cannot be dispatched is answered with `96`.

use crate::{HandlerFn, HandlerRequest, Reply, ServerError, ServerResult};
use sip2_protocol_types::{
    append_error_detection, split_error_detection, Command, REQUEST_SC_RESEND,
};
use sip2_repositories::SessionData;
use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

type HandlerMap = Arc<RwLock<HashMap<Command, HandlerFn>>>;

/// Longest frame accepted, delimiter included. A terminal that sends more
/// without a delimiter is answered with `96` and disconnected.
pub const MAX_FRAME_BYTES: usize = 16 * 1024;

/// SIP2 server that listens on a TCP port.
#[derive(Clone)]
pub struct Sip2Server {
    address: String,
    message_delimiter: u8,
    session_template: SessionData,
    handlers: HandlerMap,
    shutdown_tx: broadcast::Sender<()>,
}

impl Sip2Server {
    /// Create a server for `address`.
    ///
    /// Every connection starts from a copy of `session_template`. The
    /// message delimiter must be a single ASCII character.
    pub fn new(
        address: impl Into<String>,
        message_delimiter: char,
        session_template: SessionData,
    ) -> ServerResult<Self> {
        let message_delimiter = u8::try_from(message_delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| {
                ServerError::Config(format!(
                    "Message delimiter must be ASCII, got {:?}",
                    message_delimiter
                ))
            })?;
        if char::from(message_delimiter) == session_template.field_delimiter {
            return Err(ServerError::Config(
                "Message and field delimiters must differ".to_string(),
            ));
        }

        let (shutdown_tx, _) = broadcast::channel(1);
        Ok(Self {
            address: address.into(),
            message_delimiter,
            session_template,
            handlers: Arc::new(RwLock::new(HashMap::new())),
            shutdown_tx,
        })
    }

    /// Register a handler for a command.
    pub async fn register_handler<F, Fut>(&self, command: Command, handler: F)
    where
        F: Fn(HandlerRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Reply> + Send + 'static,
    {
        let boxed_handler: HandlerFn = Box::new(move |req| Box::pin(handler(req)));
        self.handlers.write().await.insert(command, boxed_handler);
    }

    /// Whether a handler is registered for `command`.
    pub async fn has_handler(&self, command: Command) -> bool {
        self.handlers.read().await.contains_key(&command)
    }

    /// Get a shutdown receiver.
    pub fn shutdown_receiver(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Trigger shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Bind the configured address and serve until shutdown.
    pub async fn run(&self) -> ServerResult<()> {
        let listener = TcpListener::bind(&self.address).await?;
        self.serve(listener).await
    }

    /// Serve connections from an already bound listener until shutdown.
    pub async fn serve(&self, listener: TcpListener) -> ServerResult<()> {
        let local_addr: Option<SocketAddr> = listener.local_addr().ok();
        info!(address = ?local_addr, "SIP2 server listening");

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, peer)) => {
                            let handlers = self.handlers.clone();
                            let session = self.session_template.clone();
                            let delimiter = self.message_delimiter;
                            let span = info_span!("connection", id = %Uuid::new_v4(), peer = %peer);
                            tokio::spawn(
                                async move {
                                    if let Err(e) = handle_connection(stream, handlers, session, delimiter).await {
                                        error!(error = %e, "Connection error");
                                    }
                                }
                                .instrument(span),
                            );
                        }
                        Err(e) => {
                            error!(error = %e, "Accept error");
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("SIP2 server shutting down");
                    break;
                }
            }
        }

        Ok(())
    }
}

impl std::fmt::Debug for Sip2Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sip2Server")
            .field("address", &self.address)
            .field("message_delimiter", &char::from(self.message_delimiter))
            .finish_non_exhaustive()
    }
}

/// Handle a single terminal connection.
async fn handle_connection(
    stream: TcpStream,
    handlers: HandlerMap,
    mut session: SessionData,
    delimiter: u8,
) -> ServerResult<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut buffer = Vec::new();

    debug!("Terminal connected");

    loop {
        buffer.clear();
        let bytes_read = (&mut reader)
            .take(MAX_FRAME_BYTES as u64)
            .read_until(delimiter, &mut buffer)
            .await?;

        if bytes_read == 0 {
            debug!("Terminal disconnected");
            break;
        }
        if bytes_read == MAX_FRAME_BYTES && buffer.last() != Some(&delimiter) {
            warn!(limit = MAX_FRAME_BYTES, "Dropping terminal after oversized frame");
            writer.write_all(REQUEST_SC_RESEND.as_bytes()).await?;
            writer.write_all(&[delimiter]).await?;
            writer.flush().await?;
            break;
        }

        let raw = String::from_utf8_lossy(&buffer);
        let frame = raw
            .trim_end_matches(char::from(delimiter))
            .trim_matches('\n');
        if frame.is_empty() {
            continue;
        }

        debug!(request = %frame, "Received message");
        let response = process_frame(frame, &handlers, &mut session).await;
        debug!(response = %response, "Sending response");

        writer.write_all(response.as_bytes()).await?;
        writer.write_all(&[delimiter]).await?;
        writer.flush().await?;
    }

    Ok(())
}

/// Turn one framed message into the framed response.
async fn process_frame(frame: &str, handlers: &HandlerMap, session: &mut SessionData) -> String {
    let (body, sequence_number) = if session.error_detection_enabled {
        match split_error_detection(frame) {
            Ok(split) => (split.body, split.sequence_number),
            Err(e) => {
                warn!(error = %e, "Rejecting message with bad checksum");
                return REQUEST_SC_RESEND.to_string();
            }
        }
    } else {
        (frame, None)
    };

    let (command, payload) = match Command::split_message(body) {
        Ok(split) => split,
        Err(e) => {
            warn!(error = %e, "Unknown command");
            return REQUEST_SC_RESEND.to_string();
        }
    };

    let reply = {
        let handlers = handlers.read().await;
        if let Some(handler) = handlers.get(&command) {
            handler(HandlerRequest {
                command,
                body: payload.to_string(),
                session: session.clone(),
            })
            .await
        } else {
            warn!(command = ?command, "No handler registered");
            Reply::resend()
        }
    };

    if reply.is_resend() {
        return REQUEST_SC_RESEND.to_string();
    }
    if let Some(institution_id) = reply.institution_id() {
        session.institution_id = Some(institution_id.to_string());
    }

    let message = reply.into_message();
    session.last_response = Some(message.clone());

    if session.error_detection_enabled {
        append_error_detection(&message, sequence_number.unwrap_or('0'))
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Tz;
    use sip2_protocol_types::compute_checksum;

    fn session() -> SessionData {
        SessionData::new("diku", Tz::UTC, '|')
    }

    async fn echo_handlers() -> HandlerMap {
        let server = Sip2Server::new("127.0.0.1:0", '\r', session()).unwrap();
        server
            .register_handler(Command::RenewAll, |req| async move {
                Reply::message(format!("66{}", req.body)).with_institution_id("diku")
            })
            .await;
        server
            .register_handler(Command::RequestAcsResend, |req| async move {
                Reply::message(
                    req.session
                        .last_response
                        .unwrap_or_else(|| REQUEST_SC_RESEND.to_string()),
                )
            })
            .await;
        server
            .register_handler(Command::FeePaid, |_req| async move { Reply::resend() })
            .await;
        server.handlers.clone()
    }

    #[test]
    fn rejects_bad_delimiters() {
        assert!(Sip2Server::new("127.0.0.1:0", 'é', session()).is_err());
        assert!(Sip2Server::new("127.0.0.1:0", '|', session()).is_err());
    }

    #[tokio::test]
    async fn registered_handler_is_visible() {
        let server = Sip2Server::new("127.0.0.1:0", '\r', session()).unwrap();
        assert!(!server.has_handler(Command::FeePaid).await);

        server
            .register_handler(Command::FeePaid, |_req| async move { Reply::resend() })
            .await;
        assert!(server.has_handler(Command::FeePaid).await);
    }

    #[tokio::test]
    async fn shutdown_notifies_receivers() {
        let server = Sip2Server::new("127.0.0.1:0", '\r', session()).unwrap();
        let mut receiver = server.shutdown_receiver();

        server.shutdown();

        let result =
            tokio::time::timeout(std::time::Duration::from_millis(100), receiver.recv()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn dispatch_updates_session() {
        let handlers = echo_handlers().await;
        let mut session = session();

        let response = process_frame("65body", &handlers, &mut session).await;

        assert_eq!(response, "66body");
        assert_eq!(session.institution_id.as_deref(), Some("diku"));
        assert_eq!(session.last_response.as_deref(), Some("66body"));
    }

    #[tokio::test]
    async fn unknown_and_unhandled_commands_get_96() {
        let handlers = echo_handlers().await;
        let mut session = session();

        assert_eq!(process_frame("XXbody", &handlers, &mut session).await, "96");
        assert_eq!(process_frame("9", &handlers, &mut session).await, "96");
        assert_eq!(process_frame("09body", &handlers, &mut session).await, "96");
        assert_eq!(process_frame("37body", &handlers, &mut session).await, "96");
        assert!(session.last_response.is_none());
    }

    #[tokio::test]
    async fn resend_replays_last_response() {
        let handlers = echo_handlers().await;
        let mut session = session();

        assert_eq!(process_frame("97", &handlers, &mut session).await, "96");

        process_frame("65first", &handlers, &mut session).await;
        assert_eq!(process_frame("97", &handlers, &mut session).await, "66first");
    }

    #[tokio::test]
    async fn error_detection_round_trip() {
        let handlers = echo_handlers().await;
        let mut session = session();
        session.error_detection_enabled = true;

        let request = append_error_detection("65body", '3');
        let response = process_frame(&request, &handlers, &mut session).await;

        let expected_prefix = "66bodyAY3AZ";
        assert!(response.starts_with(expected_prefix));
        assert_eq!(&response[expected_prefix.len()..], compute_checksum(expected_prefix));
        assert_eq!(session.last_response.as_deref(), Some("66body"));
    }

    #[tokio::test]
    async fn bad_checksum_gets_96() {
        let handlers = echo_handlers().await;
        let mut session = session();
        session.error_detection_enabled = true;

        let response = process_frame("65bodyAY3AZ0000", &handlers, &mut session).await;
        assert_eq!(response, "96");
    }
}
