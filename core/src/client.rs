//! HTTP client for the Noraina API.
//!
//! # Design
//! `NorainaClient` owns a parsed base URL, the session token and a handle to
//! a shared `ureq::Agent`. Each call is split the same way: `build_request`
//! produces an `HttpRequest` as plain data, then `execute` sends it, runs the
//! response through `check_response`, and decodes the body. The token is
//! fixed at construction; a new session means a new client.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use ureq::Agent;
use url::Url;

use crate::config::ClientConfig;
use crate::context::Context;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::response::check_response;
use crate::transport;
use crate::types::{Certificate, Instance, InstanceRequest};

pub const LOGIN_ROUTE: &str = "api/login";
pub const INSTANCE_ROUTE: &str = "api/instance";
pub const CERTIFICATE_ROUTE: &str = "api/certificate";

/// Header carrying the session token.
pub const TOKEN_HEADER: &str = "x-access-token";

#[derive(Clone)]
pub struct NorainaClient {
    base_url: Url,
    token: String,
    agent: Agent,
    config: ClientConfig,
}

impl fmt::Debug for NorainaClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NorainaClient")
            .field("base_url", &self.base_url.as_str())
            .field("authenticated", &!self.token.is_empty())
            .finish_non_exhaustive()
    }
}

impl NorainaClient {
    /// Log in against the production endpoint and return a ready client.
    ///
    /// Uses the process-wide default agent when `agent` is `None`.
    ///
    /// # Errors
    ///
    /// Any login failure; no client is returned in that case.
    pub fn new(email: &str, password: &str, agent: Option<Agent>) -> Result<Self, ApiError> {
        Self::connect(
            &Context::background(),
            ClientConfig::default(),
            email,
            password,
            agent,
        )
    }

    /// Log in with an explicit configuration and deadline.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidConfig` for an unusable configuration, or
    /// whatever error the login call produced.
    pub fn connect(
        ctx: &Context,
        config: ClientConfig,
        email: &str,
        password: &str,
        agent: Option<Agent>,
    ) -> Result<Self, ApiError> {
        let client = Self::anonymous(config, agent)?;
        let token = client.login(ctx, email, password)?;
        Ok(client.with_token(token))
    }

    /// Build a client without logging in. Requests carry no token.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidConfig` if the base URL is unusable.
    pub fn anonymous(config: ClientConfig, agent: Option<Agent>) -> Result<Self, ApiError> {
        let base_url = config.parsed_base_url()?;
        Ok(Self {
            base_url,
            token: String::new(),
            agent: agent.unwrap_or_else(transport::default_agent),
            config,
        })
    }

    /// Replace the session token. An empty token disables the token header.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    /// Build a request for `path`, resolved against the base URL.
    ///
    /// A `Some` body is encoded as JSON and marked with
    /// `content-type: application/json`. The token header is only set when
    /// the client holds a token.
    ///
    /// # Errors
    ///
    /// `ApiError::InvalidUrl` if `path` does not resolve, and
    /// `ApiError::Serialization` if the body cannot be encoded.
    pub fn build_request<B>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
    ) -> Result<HttpRequest, ApiError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.base_url.join(path)?;

        let mut headers = vec![
            ("accept".to_string(), "application/json".to_string()),
            ("user-agent".to_string(), self.config.user_agent.clone()),
        ];

        let body = match body {
            Some(body) => {
                let json = serde_json::to_string(body).map_err(ApiError::Serialization)?;
                headers.push(("content-type".to_string(), "application/json".to_string()));
                Some(json)
            }
            None => None,
        };

        if !self.token.is_empty() {
            headers.push((TOKEN_HEADER.to_string(), self.token.clone()));
        }

        Ok(HttpRequest {
            method,
            url: url.into(),
            headers,
            body,
        })
    }

    /// [`NorainaClient::build_request`] without a body.
    pub fn build_empty_request(
        &self,
        method: HttpMethod,
        path: &str,
    ) -> Result<HttpRequest, ApiError> {
        self.build_request::<()>(method, path, None)
    }

    /// Send `req` and return the response if its status is 2xx.
    ///
    /// # Errors
    ///
    /// `ApiError::Cancelled` once the context is cancelled,
    /// `ApiError::DeadlineExceeded` if the context deadline already passed,
    /// `ApiError::Transport` for network failures, and whatever
    /// `check_response` reports for non-2xx responses.
    pub fn send(&self, ctx: &Context, req: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let response = transport::execute(&self.agent, ctx, req, self.config.timeout)?;

        if let Err(err) = check_response(&response) {
            tracing::warn!(
                method = req.method.as_str(),
                url = %req.url,
                status = response.status,
                error = %err,
                "request rejected"
            );
            return Err(err);
        }

        Ok(response)
    }

    /// Send `req` and decode the JSON response body into `T`.
    ///
    /// # Errors
    ///
    /// Everything [`NorainaClient::send`] returns, plus
    /// `ApiError::Deserialization` if the body does not match `T`.
    pub fn execute<T: DeserializeOwned>(
        &self,
        ctx: &Context,
        req: &HttpRequest,
    ) -> Result<T, ApiError> {
        let response = self.send(ctx, req)?;
        serde_json::from_str(&response.body).map_err(ApiError::Deserialization)
    }

    /// Send `req` and discard the response body.
    pub fn execute_empty(&self, ctx: &Context, req: &HttpRequest) -> Result<(), ApiError> {
        self.send(ctx, req).map(|_| ())
    }

    pub fn create_instance(
        &self,
        ctx: &Context,
        instance: &InstanceRequest,
    ) -> Result<Instance, ApiError> {
        let req = self.build_request(HttpMethod::Post, INSTANCE_ROUTE, Some(instance))?;
        self.execute(ctx, &req)
    }

    pub fn delete_instance(&self, ctx: &Context, name: &str) -> Result<(), ApiError> {
        let mut url = self.base_url.join(INSTANCE_ROUTE)?;
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidConfig("base_url cannot be a base".to_string()))?
            .push(name);

        let req = self.build_empty_request(HttpMethod::Delete, url.as_str())?;
        self.execute_empty(ctx, &req)
    }

    /// Fetch the certificate issued for the instance `name`.
    pub fn get_certificate(&self, ctx: &Context, name: &str) -> Result<Certificate, ApiError> {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("name", name)
            .finish();

        let path = format!("{CERTIFICATE_ROUTE}?{query}");
        let req = self.build_empty_request(HttpMethod::Get, &path)?;
        self.execute(ctx, &req)
    }
}
