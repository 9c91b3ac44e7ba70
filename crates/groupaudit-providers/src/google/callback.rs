//! One-shot loopback listener for the OAuth redirect.
//!
//! The listener is bound up front by the caller and handed to the OAuth
//! flow, so nothing is registered process-wide. It serves connections one
//! at a time until a request carrying `code` (or `error`) arrives, answers
//! it, hands the result to the waiting flow over a oneshot channel, and
//! closes after a short grace delay.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tracing::{debug, warn};
use url::Url;

use crate::error::{ApiError, ApiResult};

/// How long the listener stays open after answering the callback.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

/// Per-connection budget for receiving the request head. Browsers open
/// speculative connections that never send anything.
const REQUEST_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Upper bound on the request head we are willing to read.
const MAX_REQUEST_BYTES: u64 = 16 * 1024;

const SUCCESS_BODY: &str = "Authentication complete. You can close this window.";
const FAILURE_BODY: &str = "Authentication failed. You can close this window.";
const NOT_FOUND_BODY: &str = "Not found.";

/// Parameters delivered by the authorization server's redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackParams {
    /// The authorization code.
    pub code: String,
    /// The echoed `state` value, if any.
    pub state: Option<String>,
}

/// A bound, not yet serving, callback listener.
#[derive(Debug)]
pub struct CallbackServer {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl CallbackServer {
    /// Binds the listener. Failure to bind is a configuration error.
    pub async fn bind(addr: &str) -> ApiResult<Self> {
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            ApiError::configuration(format!("could not listen on {}: {}", addr, e))
                .with_source(e)
        })?;
        let local_addr = listener.local_addr().map_err(|e| {
            ApiError::internal(format!("failed to read listener address: {}", e))
        })?;
        debug!("callback listener bound on {}", local_addr);
        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// The address actually bound (useful when binding port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serves until one callback arrives or `timeout` elapses.
    ///
    /// Requests without `code` or `error` get a 404 and do not end the wait.
    pub async fn wait_for_code(self, timeout: Duration) -> ApiResult<CallbackParams> {
        let (tx, rx) = oneshot::channel();
        let server = tokio::spawn(serve(self.listener, tx));

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(ApiError::internal("callback channel closed")),
            Err(_) => {
                server.abort();
                Err(ApiError::authentication(format!(
                    "timed out after {}s waiting for the authorization callback",
                    timeout.as_secs()
                )))
            }
        }
    }
}

async fn serve(listener: TcpListener, tx: oneshot::Sender<ApiResult<CallbackParams>>) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("failed to accept callback connection: {}", e);
                continue;
            }
        };
        debug!("callback connection from {}", peer);

        let outcome =
            match tokio::time::timeout(REQUEST_READ_TIMEOUT, handle_connection(stream)).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    debug!("dropping idle callback connection from {}", peer);
                    None
                }
            };

        if let Some(result) = outcome {
            let _ = tx.send(result);
            tokio::time::sleep(SHUTDOWN_GRACE).await;
            debug!("callback listener closed");
            return;
        }
    }
}

/// Reads one request and answers it. Returns `Some` when the request ends
/// the flow.
async fn handle_connection(mut stream: TcpStream) -> Option<ApiResult<CallbackParams>> {
    let (read_half, mut write_half) = stream.split();
    let mut reader = BufReader::new(read_half.take(MAX_REQUEST_BYTES));

    let mut request_line = String::new();
    if reader.read_line(&mut request_line).await.is_err() {
        return None;
    }

    // Drain headers so closing the socket does not reset the connection
    // before the browser reads the response.
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => break,
            Ok(_) if line == "\r\n" || line == "\n" => break,
            Ok(_) => continue,
            Err(_) => return None,
        }
    }

    let (status, body, outcome) = route(&request_line);

    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    if let Err(e) = write_half.write_all(response.as_bytes()).await {
        warn!("failed to answer callback request: {}", e);
    }
    let _ = write_half.flush().await;
    let _ = write_half.shutdown().await;

    outcome
}

/// Decides the response for a request line such as
/// `GET /?code=...&state=... HTTP/1.1`.
fn route(
    request_line: &str,
) -> (
    &'static str,
    &'static str,
    Option<ApiResult<CallbackParams>>,
) {
    let mut parts = request_line.split_whitespace();
    let (Some(method), Some(target)) = (parts.next(), parts.next()) else {
        return ("400 Bad Request", NOT_FOUND_BODY, None);
    };
    if method != "GET" {
        return ("405 Method Not Allowed", NOT_FOUND_BODY, None);
    }

    let Ok(url) = Url::parse(&format!("http://localhost{}", target)) else {
        return ("400 Bad Request", NOT_FOUND_BODY, None);
    };

    let mut code = None;
    let mut state = None;
    let mut error = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = error {
        return (
            "400 Bad Request",
            FAILURE_BODY,
            Some(Err(ApiError::authentication(format!(
                "authorization denied: {}",
                error
            )))),
        );
    }

    match code {
        Some(code) if !code.is_empty() => (
            "200 OK",
            SUCCESS_BODY,
            Some(Ok(CallbackParams { code, state })),
        ),
        _ => ("404 Not Found", NOT_FOUND_BODY, None),
    }
}
