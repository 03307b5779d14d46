//! Request body construction for POST requests.

use tracing::warn;

use crate::encode::encode_query;
use crate::error::RequestError;
use crate::http::ContentType;
use crate::params::ParamMap;

/// What to do when the parameters cannot be serialized as JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonErrorPolicy {
    /// Return `RequestError::Serialization` to the caller.
    #[default]
    Surface,
    /// Log a warning and send an empty body. Matches legacy callers that
    /// never checked for serialization failures.
    EmptyBody,
}

/// Build the body bytes for `params` in the given content type.
pub fn build_body(
    content_type: ContentType,
    params: &ParamMap,
    policy: JsonErrorPolicy,
) -> Result<Vec<u8>, RequestError> {
    match content_type {
        ContentType::Json => match serde_json::to_vec(params) {
            Ok(body) => Ok(body),
            Err(e) if policy == JsonErrorPolicy::EmptyBody => {
                warn!(error = %e, "json body serialization failed, sending empty body");
                Ok(Vec::new())
            }
            Err(e) => Err(RequestError::Serialization(e.to_string())),
        },
        ContentType::Form => Ok(encode_query(params, None).into_bytes()),
    }
}
