//! Classification of raw responses into success or failure.

use std::collections::BTreeMap;

use crate::error::{ApiError, ErrorResponse};
use crate::http::HttpResponse;

/// Map a response onto `Ok(())` for any 2xx status, or onto the error it
/// describes.
///
/// A non-2xx body must be a JSON object of string pairs or `null`. An empty
/// body or `null` still yields `ApiError::Api` with no messages. Any other
/// body, whitespace-only included, is reported as `ApiError::Deserialization`,
/// since it carries nothing structured.
pub fn check_response(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }

    let message = if response.body.is_empty() {
        BTreeMap::new()
    } else {
        serde_json::from_str::<Option<BTreeMap<String, String>>>(&response.body)
            .map_err(ApiError::Deserialization)?
            .unwrap_or_default()
    };

    Err(ApiError::Api(ErrorResponse {
        status_code: response.status,
        message,
    }))
}
