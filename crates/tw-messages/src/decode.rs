//! Response decoding
//!
//! Turns a `RawResponse` into the expected resource or an `Error::Api`,
//! keyed on the HTTP status.

use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::{ApiError, Error, Result};
use crate::transport::RawResponse;
use crate::types::ApiException;

/// `200 OK`, expected by reads
pub const STATUS_OK: u16 = 200;

/// `201 Created`, expected by sends and account creation
pub const STATUS_CREATED: u16 = 201;

/// Decode `response` as `T` if it carries `expected_status`, otherwise as
/// an API error.
///
/// A malformed success body is `Error::Decode`, never a default value.
pub fn decode_response<T: DeserializeOwned>(response: &RawResponse, expected_status: u16) -> Result<T> {
    if response.status != expected_status {
        return Err(Error::Api(decode_api_error(response)));
    }

    serde_json::from_str(&response.body).map_err(Error::Decode)
}

/// Decode an error body.
///
/// Never fails: an undecodable body still yields an `ApiError` carrying the
/// HTTP status and the decode failure, so the caller always learns that the
/// request was rejected.
pub fn decode_api_error(response: &RawResponse) -> ApiError {
    let (mut exception, decode_error) = match serde_json::from_str::<ApiException>(&response.body) {
        Ok(exception) => (exception, None),
        Err(e) => (ApiException::default(), Some(e.to_string())),
    };

    if exception.status == 0 {
        exception.status = response.status;
    }

    warn!(
        status = response.status,
        code = exception.code,
        "API returned an error: {}",
        if exception.message.is_empty() { &response.body } else { &exception.message }
    );

    ApiError {
        status: response.status,
        exception,
        decode_error,
    }
}
