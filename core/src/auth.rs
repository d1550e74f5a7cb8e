//! Session login.

use crate::client::{NorainaClient, LOGIN_ROUTE};
use crate::context::Context;
use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::types::{LoginRequest, LoginResponse};

impl NorainaClient {
    /// Exchange credentials for a session token.
    ///
    /// Does not store the token; `NorainaClient::connect` does that once at
    /// construction. Failures are returned as-is, there is no retry.
    ///
    /// # Errors
    ///
    /// Transport failures, `ApiError::Api` for rejected credentials, and
    /// `ApiError::Deserialization` if the answer has no `token` field.
    pub fn login(&self, ctx: &Context, email: &str, password: &str) -> Result<String, ApiError> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let req = self.build_request(HttpMethod::Post, LOGIN_ROUTE, Some(&body))?;
        let response: LoginResponse = self.execute(ctx, &req)?;

        tracing::info!(email, base_url = %self.base_url(), "logged in");
        Ok(response.token)
    }
}
