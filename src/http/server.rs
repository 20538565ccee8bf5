//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the conversion handler
//! - Build the shared origin client and pipeline
//! - Wire up middleware (request ID, tracing, read/write bounds)
//! - Serve until shutdown, then drain in-flight requests
//! - Bound how long a client may take to send its request head

use axum::{body::Body, http::Request, routing::get, Router};
use hyper_util::{
    rt::{TokioExecutor, TokioIo, TokioTimer},
    server::conn::auto::Builder,
    service::TowerToHyperService,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::{RequestBodyTimeoutLayer, TimeoutLayer},
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::http::handler::{convert_handler, AppState};
use crate::http::request::request_id;
use crate::imaging::{Codec, Grayscale, RasterCodec, Transform};
use crate::lifecycle::ShutdownSignal;
use crate::origin::OriginFetcher;
use crate::pipeline::ConversionPipeline;
use crate::resilience::{DeadlineCoordinator, InFlight};

/// HTTP server for the conversion proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    in_flight: InFlight,
}

impl HttpServer {
    /// Server using the raster codec and the grayscale transform.
    pub fn new(config: ProxyConfig) -> Self {
        Self::with_capabilities(config, Arc::new(RasterCodec), Arc::new(Grayscale))
    }

    /// Server with an injected codec and transform.
    pub fn with_capabilities(
        config: ProxyConfig,
        codec: Arc<dyn Codec>,
        transform: Arc<dyn Transform>,
    ) -> Self {
        let fetcher = OriginFetcher::from_config(&config.origin, &config.timeouts);
        let pipeline = Arc::new(ConversionPipeline::new(
            fetcher,
            codec,
            transform,
            config.origin.max_body_bytes,
        ));
        let coordinator = DeadlineCoordinator::new();
        let in_flight = coordinator.in_flight();

        let state = AppState {
            pipeline,
            coordinator,
            deadline: config.timeouts.deadline(),
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            in_flight,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        path = %request.uri().path(),
                        request_id = %request_id(request.headers()),
                    )
                }),
            )
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(RequestBodyTimeoutLayer::new(config.timeouts.read()))
            .layer(TimeoutLayer::new(config.timeouts.write()));

        Router::new()
            .route("/", get(convert_handler))
            .route("/{*path}", get(convert_handler))
            .with_state(state)
            .layer(middleware)
    }

    /// Run the server, accepting connections until `shutdown` fires.
    ///
    /// Each connection is served by hyper directly so the read bound also
    /// covers the request head, not only the body. After shutdown the
    /// listener is closed and open connections are drained.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            origin = %self.config.origin.base(),
            deadline_ms = self.config.timeouts.deadline_ms,
            "HTTP server starting"
        );

        let mut builder = Builder::new(TokioExecutor::new());
        builder
            .http1()
            .timer(TokioTimer::new())
            .header_read_timeout(self.config.timeouts.read());

        let mut connections = JoinSet::new();
        let stopped = shutdown.clone().wait();
        tokio::pin!(stopped);

        loop {
            tokio::select! {
                _ = &mut stopped => break,
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
                accepted = listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            tracing::warn!(error = %e, "Failed to accept connection");
                            continue;
                        }
                    };
                    let builder = builder.clone();
                    let service = TowerToHyperService::new(self.router.clone());
                    let shutdown = shutdown.clone();
                    connections.spawn(async move {
                        serve_connection(builder, stream, peer, service, shutdown).await;
                    });
                }
            }
        }

        drop(listener);
        tracing::info!(open = connections.len(), "Draining connections");
        while connections.join_next().await.is_some() {}

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Live pipeline tasks, including ones that outlived their deadline.
    pub fn in_flight(&self) -> InFlight {
        self.in_flight.clone()
    }
}

/// Serve one accepted connection, finishing gracefully on shutdown.
async fn serve_connection(
    builder: Builder<TokioExecutor>,
    stream: TcpStream,
    peer: SocketAddr,
    service: TowerToHyperService<Router>,
    shutdown: ShutdownSignal,
) {
    let connection = builder.serve_connection(TokioIo::new(stream), service);
    tokio::pin!(connection);
    let stopped = shutdown.wait();
    tokio::pin!(stopped);

    let result = tokio::select! {
        result = connection.as_mut() => result,
        _ = &mut stopped => {
            connection.as_mut().graceful_shutdown();
            connection.await
        }
    };
    if let Err(e) = result {
        tracing::debug!(peer = %peer, error = %e, "Connection closed with error");
    }
}
