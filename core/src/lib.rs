//! Blocking client for the Noraina REST API.
//!
//! # Overview
//! A `NorainaClient` logs in once with email and password, keeps the returned
//! token, and attaches it as `x-access-token` to every later request. Request
//! and response bodies are JSON. Any non-2xx answer becomes an error; when the
//! body is a JSON object of strings it is surfaced as a structured
//! [`ErrorResponse`].
//!
//! # Design
//! - Requests are built as plain `HttpRequest` values before being sent, so
//!   their URL, headers and body can be checked without a server.
//! - The HTTP executor is a `ureq::Agent`. Clients built without one share a
//!   process-wide default agent.
//! - Every call takes a [`Context`] whose deadline bounds the round-trip and
//!   which, when cancellable, can be cancelled from another thread.
//! - No retries, token refresh or pagination.
//!
//! ```no_run
//! use noraina_core::{Context, InstanceRequest, NorainaClient};
//!
//! # fn main() -> Result<(), noraina_core::ApiError> {
//! let client = NorainaClient::new("me@example.com", "password", None)?;
//! let ctx = Context::background();
//! let instance = client.create_instance(
//!     &ctx,
//!     &InstanceRequest { name: "web".to_string(), services: Vec::new() },
//! )?;
//! let cert = client.get_certificate(&ctx, &instance.name)?;
//! println!("{}", cert.certificate);
//! # Ok(())
//! # }
//! ```

mod auth;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod response;
pub mod transport;
pub mod types;

pub use client::NorainaClient;
pub use config::ClientConfig;
pub use context::Context;
pub use error::{ApiError, ErrorResponse};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use response::check_response;
pub use types::{
    Certificate, Instance, InstanceRequest, InstanceServiceRequest, LoginRequest, LoginResponse,
};
