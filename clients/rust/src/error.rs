use http::StatusCode;
use serde::Deserialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Authentication failure")]
    Unauthorized,
    #[error("You're not allowed to do this")]
    Forbidden,
    #[error("Doesn't look like this exists")]
    NotFound,
    /// 408 from the server, or a timeout from the http client.
    #[error("Operation timed out. Try again later.")]
    Timeout,
    /// The account holds an exclusive lock on the resource. Mostly seen on
    /// git repositories.
    #[error("Locked for update by another operation. Try again later.")]
    Conflict,
    #[error("This operation is not supported")]
    NotImplemented,
    #[error("Something went wrong. Please contact support.")]
    ServerError,
    #[error("{}", .0.canonical_reason().unwrap_or("Unexpected response from server"))]
    Http(StatusCode),
    #[error("Invalid client configuration: {0}")]
    Config(String),
    #[error("Unexpected error from the http client: {0}")]
    Transport(#[source] BoxError),
    #[error("Returned JSON from '{url}' does not conform to protocol: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    User(#[from] UserError),
    #[error("{0}")]
    Login(String),
    #[error("Operation was cancelled")]
    Cancelled,
}

/// Field-less discriminant of [`Error`], handy for matching without borrowing
/// the error payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Unauthorized,
    Forbidden,
    NotFound,
    Timeout,
    Conflict,
    NotImplemented,
    ServerError,
    Http,
    Config,
    Transport,
    Decode,
    User,
    Login,
    Cancelled,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            | Error::Unauthorized => ErrorKind::Unauthorized,
            | Error::Forbidden => ErrorKind::Forbidden,
            | Error::NotFound => ErrorKind::NotFound,
            | Error::Timeout => ErrorKind::Timeout,
            | Error::Conflict => ErrorKind::Conflict,
            | Error::NotImplemented => ErrorKind::NotImplemented,
            | Error::ServerError => ErrorKind::ServerError,
            | Error::Http(_) => ErrorKind::Http,
            | Error::Config(_) => ErrorKind::Config,
            | Error::Transport(_) => ErrorKind::Transport,
            | Error::Decode { .. } => ErrorKind::Decode,
            | Error::User(_) => ErrorKind::User,
            | Error::Login(_) => ErrorKind::Login,
            | Error::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// A compact explanation suitable for one-line status output.
    pub fn short_error(&self) -> String {
        match self {
            | Error::User(e) => e.short_error().to_owned(),
            | Error::Unauthorized => "unauthorized".to_owned(),
            | e => e.to_string(),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Error::Timeout
        } else {
            Error::Transport(Box::new(e))
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::Config(format!("invalid url: {e}"))
    }
}

impl From<http::header::InvalidHeaderValue> for Error {
    fn from(e: http::header::InvalidHeaderValue) -> Self {
        Error::Config(format!("invalid header value: {e}"))
    }
}

/// An error whose message comes straight from the API and can be shown to
/// the user as is.
#[derive(Error, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[error("{message}")]
pub struct UserError {
    #[serde(default)]
    pub message: String,
    #[serde(default, rename = "type")]
    pub kind: String,
}

impl UserError {
    pub fn new(message: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: kind.into(),
        }
    }

    /// Shortened explanation, used for per-file status lines.
    pub fn short_error(&self) -> &str {
        match self.kind.as_str() {
            | "Conflict" | "DupeVersion" => "this version already exists",
            | "GemVersionError" | "InvalidGemFile" => "corrupt package file",
            | "Forbidden" => "no permission",
            | _ => &self.message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_error_short_forms() {
        let dupe = UserError::new("Version 1.0 exists", "DupeVersion");
        assert_eq!("this version already exists", dupe.short_error());
        assert_eq!("Version 1.0 exists", dupe.to_string());

        let corrupt = UserError::new("Bad gem", "InvalidGemFile");
        assert_eq!("corrupt package file", corrupt.short_error());

        let other = UserError::new("Quota exceeded", "QuotaError");
        assert_eq!("Quota exceeded", other.short_error());
    }

    #[test]
    fn error_kinds_are_stable() {
        assert_eq!(ErrorKind::Timeout, Error::Timeout.kind());
        assert_eq!(
            ErrorKind::Http,
            Error::Http(StatusCode::IM_A_TEAPOT).kind()
        );
        assert_eq!(
            ErrorKind::User,
            Error::from(UserError::new("nope", "Whatever")).kind()
        );
        assert_eq!("I'm a teapot", Error::Http(StatusCode::IM_A_TEAPOT).to_string());
    }
}
