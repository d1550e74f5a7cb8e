//! Blocking execution of `HttpRequest` values over a `ureq::Agent`.
//!
//! Status-as-error is switched off on every request, including ones sent
//! through caller-supplied agents, so 4xx/5xx responses come back as data and
//! are classified by `check_response` rather than by ureq.
//!
//! Calls bound to a cancellable `Context` run on a worker thread while the
//! caller polls the context, so cancelling it releases the caller right away.
//! The worker finishes on its own once ureq returns or times out.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::OnceLock;
use std::thread;
use std::time::Duration;

use ureq::{Agent, RequestBuilder};

use crate::context::Context;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// How often a waiting caller checks its context for cancellation.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Process-wide agent used by clients built without one.
///
/// Clones share the same connection pool.
pub fn default_agent() -> Agent {
    static AGENT: OnceLock<Agent> = OnceLock::new();
    AGENT
        .get_or_init(|| {
            Agent::config_builder()
                .http_status_as_error(false)
                .build()
                .new_agent()
        })
        .clone()
}

/// Send `req` within the bounds of `ctx`.
///
/// The context deadline, or `fallback` when it has none, bounds the whole
/// call.
pub(crate) fn execute(
    agent: &Agent,
    ctx: &Context,
    req: &HttpRequest,
    fallback: Option<Duration>,
) -> Result<HttpResponse, ApiError> {
    if ctx.is_cancelled() {
        return Err(ApiError::Cancelled);
    }
    if ctx.is_expired() {
        return Err(ApiError::DeadlineExceeded);
    }

    let timeout = ctx.remaining().or(fallback);
    if !ctx.is_cancellable() {
        return Ok(send(agent, req, timeout)?);
    }

    let (tx, rx) = mpsc::channel();
    let worker_agent = agent.clone();
    let worker_req = req.clone();
    thread::spawn(move || {
        let _ = tx.send(send(&worker_agent, &worker_req, timeout));
    });

    loop {
        match rx.recv_timeout(CANCEL_POLL_INTERVAL) {
            Ok(result) => return Ok(result?),
            Err(RecvTimeoutError::Timeout) => {
                if ctx.is_cancelled() {
                    tracing::debug!(method = req.method.as_str(), url = %req.url, "request cancelled");
                    return Err(ApiError::Cancelled);
                }
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err(ApiError::Transport(ureq::Error::Io(std::io::Error::other(
                    "request worker exited without a response",
                ))));
            }
        }
    }
}

/// Send `req` and read the whole response body.
///
/// `timeout` bounds the entire call, connection included.
pub(crate) fn send(
    agent: &Agent,
    req: &HttpRequest,
    timeout: Option<Duration>,
) -> Result<HttpResponse, ureq::Error> {
    tracing::debug!(method = req.method.as_str(), url = %req.url, "sending request");

    let mut response = match (req.method, req.body.as_deref()) {
        (HttpMethod::Get, _) => prepare(agent.get(&req.url), req, timeout).call(),
        (HttpMethod::Delete, _) => prepare(agent.delete(&req.url), req, timeout).call(),
        (HttpMethod::Post, Some(body)) => {
            prepare(agent.post(&req.url), req, timeout).send(body.as_bytes())
        }
        (HttpMethod::Post, None) => prepare(agent.post(&req.url), req, timeout).send_empty(),
    }?;

    let status = response.status().as_u16();
    let body = response.body_mut().read_to_string()?;

    tracing::debug!(status, url = %req.url, "received response");

    Ok(HttpResponse { status, body })
}

fn prepare<B>(
    mut builder: RequestBuilder<B>,
    req: &HttpRequest,
    timeout: Option<Duration>,
) -> RequestBuilder<B> {
    for (name, value) in &req.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }

    let mut config = builder.config().http_status_as_error(false);
    if let Some(timeout) = timeout {
        config = config.timeout_global(Some(timeout));
    }
    config.build()
}
