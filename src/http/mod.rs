//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request id, trace span, read/write bounds)
//!     → request.rs (path + query, per-request deadline)
//!     → handler.rs (race the conversion pipeline against the deadline)
//!     → response.rs (settle the race, encode image or error)
//!     → Send to client
//! ```

pub mod handler;
pub mod request;
pub mod response;
pub mod server;

pub use handler::AppState;
pub use request::{ResourceRequest, X_REQUEST_ID};
pub use server::HttpServer;
