//! HTTP transport.
//!
//! Accepts HTTP/1.1 connections with hyper over a tokio listener, collects
//! each request body, runs the request through the [`Kernel`] and writes the
//! response back, streaming bodies chunk by chunk.
//!
//! # Example
//!
//! ```rust,ignore
//! use tessera_server::{Kernel, Server, ServerConfig};
//!
//! async fn serve(kernel: Kernel) -> Result<(), tessera_server::ServerError> {
//!     let server = Server::bind(ServerConfig::default(), kernel).await?;
//!     server.serve().await
//! }
//! ```

use std::convert::Infallible;
use std::net::{AddrParseError, SocketAddr};

use bytes::Bytes;
use futures_util::TryStreamExt;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Full, StreamBody};
use hyper::body::{Frame, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tessera_core::{Body, BoxError, Request, Response};
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::kernel::Kernel;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Body type written to the wire.
pub type ResponseBody = UnsyncBoxBody<Bytes, BoxError>;

/// Response type written to the wire.
pub type HttpResponse = http::Response<ResponseBody>;

/// Transport failures.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configured address does not parse.
    #[error("invalid listen address `{addr}`")]
    InvalidAddress {
        /// The configured address.
        addr: String,
        /// Why it failed to parse.
        #[source]
        source: AddrParseError,
    },

    /// The listener could not bind.
    #[error("failed to bind {addr}")]
    Bind {
        /// The address.
        addr: SocketAddr,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Listener I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A bound HTTP server.
#[derive(Debug)]
pub struct Server {
    config: ServerConfig,
    kernel: Kernel,
    listener: TcpListener,
}

impl Server {
    /// Binds the configured address.
    pub async fn bind(config: ServerConfig, kernel: Kernel) -> Result<Self, ServerError> {
        let addr = config
            .socket_addr()
            .map_err(|source| ServerError::InvalidAddress {
                addr: config.http_addr().to_string(),
                source,
            })?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        Ok(Self {
            config,
            kernel,
            listener,
        })
    }

    /// The address actually bound; useful when binding port `0`.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Serves until SIGINT or SIGTERM.
    pub async fn serve(self) -> Result<(), ServerError> {
        self.serve_with_shutdown(ShutdownSignal::with_os_signals()).await
    }

    /// Serves until `shutdown` is triggered, then waits up to the configured
    /// grace period for open connections to finish.
    pub async fn serve_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let Self {
            config,
            kernel,
            listener,
        } = self;
        let tracker = ConnectionTracker::new();

        info!(addr = %listener.local_addr()?, "listening");

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, remote_addr)) => {
                        let guard = tracker.acquire();
                        let kernel = kernel.clone();
                        let shutdown = shutdown.clone();
                        let keep_alive = config.keep_alive();
                        tokio::spawn(async move {
                            serve_connection(stream, remote_addr, kernel, shutdown, keep_alive).await;
                            drop(guard);
                        });
                    }
                    Err(err) => warn!(error = %err, "failed to accept connection"),
                },
                () = shutdown.recv() => {
                    info!("shutdown requested, no longer accepting connections");
                    break;
                }
            }
        }

        let grace = config.shutdown_timeout();
        info!(
            open = tracker.active_connections(),
            grace_secs = grace.as_secs(),
            "waiting for open connections"
        );
        if tokio::time::timeout(grace, tracker.wait_idle()).await.is_err() {
            warn!(
                open = tracker.active_connections(),
                "grace period elapsed with connections still open"
            );
        }

        info!("server stopped");
        Ok(())
    }
}

async fn serve_connection(
    stream: TcpStream,
    remote_addr: SocketAddr,
    kernel: Kernel,
    shutdown: ShutdownSignal,
    keep_alive: bool,
) {
    let service = service_fn(move |request: http::Request<Incoming>| {
        let kernel = kernel.clone();
        async move { Ok::<_, Infallible>(handle_request(&kernel, request).await) }
    });

    let conn = http1::Builder::new()
        .keep_alive(keep_alive)
        .serve_connection(TokioIo::new(stream), service);
    tokio::pin!(conn);

    let result = tokio::select! {
        result = conn.as_mut() => result,
        () = shutdown.recv() => {
            debug!(%remote_addr, "closing connection for shutdown");
            conn.as_mut().graceful_shutdown();
            conn.await
        }
    };

    if let Err(err) = result {
        debug!(%remote_addr, error = %err, "connection ended with error");
    }
}

async fn handle_request(kernel: &Kernel, request: http::Request<Incoming>) -> HttpResponse {
    let (parts, body) = request.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            warn!(error = %err, "failed to read request body");
            return plain(StatusCode::BAD_REQUEST, "Bad request");
        }
    };

    let request = Request::from_parts(parts, body);
    let request_id = request.id();
    match kernel.handle(request).await {
        Ok(response) => into_http(response),
        Err(err) => {
            error!(%request_id, error = %err, "unhandled failure");
            plain(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        }
    }
}

/// Converts a response into its wire form.
pub fn into_http(response: Response) -> HttpResponse {
    let (status, headers, body) = response.into_parts();
    let body = match body {
        Body::Full(bytes) => Full::new(bytes)
            .map_err(|never: Infallible| -> BoxError { match never {} })
            .boxed_unsync(),
        Body::Stream(stream) => StreamBody::new(stream.map_ok(Frame::data)).boxed_unsync(),
    };

    let mut http = http::Response::new(body);
    *http.status_mut() = status;
    *http.headers_mut() = headers;
    http
}

fn plain(status: StatusCode, message: &'static str) -> HttpResponse {
    let mut response = into_http(Response::new(status, message));
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    response
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use futures_util::stream;
    use tessera_core::di::Container;
    use tessera_core::{HandlerRef, NoViews};
    use tessera_middleware::Pipeline;
    use tessera_router::RouteTable;

    use super::*;
    use crate::dispatcher::Dispatcher;
    use crate::errors::DefaultErrorHandler;
    use crate::normalize::Normalizer;

    fn empty_kernel() -> Kernel {
        let dispatcher = Dispatcher::new(
            Arc::new(Container::new()),
            Arc::new(RouteTable::<HandlerRef>::new()),
            Normalizer::new(Arc::new(NoViews), Arc::new(DefaultErrorHandler), false),
        );
        Kernel::new(Pipeline::default(), dispatcher)
    }

    #[tokio::test]
    async fn test_into_http_full_body() {
        let response = Response::text(StatusCode::CREATED, "made");
        let http = into_http(response);

        assert_eq!(http.status(), StatusCode::CREATED);
        assert_eq!(http.headers()[CONTENT_TYPE], "text/plain");
        let body = http.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"made");
    }

    #[tokio::test]
    async fn test_into_http_stream_body() {
        let chunks = stream::iter(vec![
            Ok::<_, BoxError>(Bytes::from_static(b"one ")),
            Ok(Bytes::from_static(b"two")),
        ]);
        let http = into_http(Response::stream(chunks));

        let body = http.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"one two");
    }

    #[tokio::test]
    async fn test_bind_rejects_invalid_address() {
        let config = ServerConfig::builder().http_addr("not an address").build();
        let err = Server::bind(config, empty_kernel()).await.unwrap_err();
        assert!(matches!(err, ServerError::InvalidAddress { .. }));
    }
}
