//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use grayscale_proxy::config::ProxyConfig;
use grayscale_proxy::lifecycle::Shutdown;
use grayscale_proxy::resilience::InFlight;
use grayscale_proxy::HttpServer;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

/// What the mock origin sends back for one request.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub body: Vec<u8>,
    pub delay: Duration,
}

impl MockResponse {
    pub fn ok(body: Vec<u8>) -> Self {
        Self {
            status: 200,
            body,
            delay: Duration::ZERO,
        }
    }

    pub fn status(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Handle onto a running mock origin.
pub struct MockOrigin {
    pub addr: SocketAddr,
    requests: Arc<AtomicUsize>,
}

impl MockOrigin {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Requests whose head was fully received.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

/// Start a programmable origin. `f` receives the request target (path + query).
pub async fn start_origin<F, Fut>(f: F) -> MockOrigin
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = MockResponse> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(AtomicUsize::new(0));
    let counter = requests.clone();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let f = f.clone();
                    let counter = counter.clone();
                    tokio::spawn(async move {
                        serve_one(socket, f, counter).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    MockOrigin { addr, requests }
}

async fn serve_one<F, Fut>(mut socket: TcpStream, f: Arc<F>, counter: Arc<AtomicUsize>)
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = MockResponse>,
{
    let Some(target) = read_request_target(&mut socket).await else {
        return;
    };
    counter.fetch_add(1, Ordering::SeqCst);

    let response = f(target).await;
    if !response.delay.is_zero() {
        tokio::time::sleep(response.delay).await;
    }

    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        response.status,
        reason(response.status),
        response.body.len()
    );
    let _ = socket.write_all(head.as_bytes()).await;
    let _ = socket.write_all(&response.body).await;
    let _ = socket.shutdown().await;
}

async fn read_request_target(socket: &mut TcpStream) -> Option<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let head = String::from_utf8_lossy(&buf);
    let request_line = head.lines().next()?;
    request_line.split_whitespace().nth(1).map(str::to_string)
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

/// A running proxy under test.
pub struct TestProxy {
    pub addr: SocketAddr,
    pub in_flight: InFlight,
    pub shutdown: Shutdown,
}

impl TestProxy {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Poll until every pipeline task has ended, or panic after `within`.
    pub async fn wait_idle(&self, within: Duration) {
        let start = tokio::time::Instant::now();
        while self.in_flight.current() != 0 {
            assert!(
                start.elapsed() < within,
                "{} pipeline tasks still running",
                self.in_flight.current()
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

/// Default test configuration pointing at `origin`.
pub fn proxy_config(origin: &str, deadline_ms: u64) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.host = "127.0.0.1".into();
    config.listener.port = 0;
    config.origin.address = origin.to_string();
    config.timeouts.deadline_ms = deadline_ms;
    config
}

/// Start the proxy against `origin` with the given deadline.
pub async fn start_proxy(origin: &str, deadline_ms: u64) -> TestProxy {
    start_server(HttpServer::new(proxy_config(origin, deadline_ms))).await
}

/// Serve an already-built server on an ephemeral port.
pub async fn start_server(server: HttpServer) -> TestProxy {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let in_flight = server.in_flight();
    let shutdown = Shutdown::new();
    let signal = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, signal).await;
    });

    TestProxy {
        addr,
        in_flight,
        shutdown,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}

/// Solid-color image encoded in `format`.
pub fn solid_image(format: ImageFormat, color: Rgba<u8>, width: u32, height: u32) -> Vec<u8> {
    let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, color));
    let image = if format == ImageFormat::Jpeg {
        DynamicImage::ImageRgb8(image.to_rgb8())
    } else {
        image
    };
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, format).unwrap();
    out.into_inner()
}

pub fn red_png() -> Vec<u8> {
    solid_image(ImageFormat::Png, Rgba([255, 0, 0, 255]), 10, 10)
}
