use http::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::warn;

use crate::error::UserError;
use crate::transport::RawResponse;
use crate::{Error, Result};

/// JSON body of an error response from the API.
#[derive(Deserialize, Debug)]
struct ErrorResponse {
    error: UserError,
}

/// Maps a bare status code to the error it stands for.
pub fn status_code_to_error(status: StatusCode) -> Result<()> {
    match status.as_u16() {
        | 200..=299 => Ok(()),
        | 401 => Err(Error::Unauthorized),
        | 403 => Err(Error::Forbidden),
        | 404 => Err(Error::NotFound),
        | 408 => Err(Error::Timeout),
        | 409 => Err(Error::Conflict),
        | 501 => Err(Error::NotImplemented),
        | 500..=599 => Err(Error::ServerError),
        | _ => Err(Error::Http(status)),
    }
}

/// Classifies a response status. A structured error from the body wins over
/// the status code, as long as it carries a `type`.
pub fn classify_status(
    status: StatusCode,
    body_error: Option<&UserError>,
) -> Result<()> {
    if status.is_success() {
        return Ok(());
    }

    match body_error {
        | Some(e) if !e.kind.is_empty() => {
            match e.kind.as_str() {
                | "Unauthorized" => Err(Error::Unauthorized),
                | "Forbidden" => Err(Error::Forbidden),
                | _ => Err(Error::User(e.clone())),
            }
        }
        | _ => status_code_to_error(status),
    }
}

/// Decodes the status of `response` into an error, consulting the JSON error
/// body when there is one.
pub(crate) fn decode_response_error(response: &RawResponse) -> Result<()> {
    if response.status.is_success() {
        return Ok(());
    }

    let body_error = if response.body.is_empty() {
        None
    } else {
        match serde_json::from_slice::<ErrorResponse>(&response.body) {
            | Ok(parsed) => Some(parsed.error),
            | Err(e) => {
                warn!(
                    "Response error body is not json. Error: {}. Body: {}",
                    e,
                    response.text()
                );
                None
            }
        }
    };

    classify_status(response.status, body_error.as_ref())
}

pub(crate) fn decode_json<T>(response: &RawResponse) -> Result<T>
where
    T: DeserializeOwned,
{
    serde_json::from_slice(&response.body).map_err(|source| {
        Error::Decode {
            url: response.url.to_string(),
            source,
        }
    })
}
