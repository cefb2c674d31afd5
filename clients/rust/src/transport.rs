//! The seam between [`crate::Client`] and the network.
//!
//! A [`Transport`] knows how to create a bare request and how to execute it.
//! Everything above it (authentication, path templates, status
//! classification, pagination) lives in the client, which makes it possible
//! to swap the network for a deterministic fake in tests.

use async_trait::async_trait;
use base64::Engine;
use http::header::{HeaderName, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use serde::Serialize;
use url::Url;

use crate::constants::ACCEPT_API_V1;
use crate::{Error, Result};

/// A fully described HTTP request. Built fresh for each call and consumed by
/// [`Transport::execute`].
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl Request {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn bearer_auth(self, token: &str) -> Result<Self> {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))?;
        value.set_sensitive(true);
        Ok(self.header(AUTHORIZATION, value))
    }

    pub fn basic_auth(self, username: &str, password: &str) -> Result<Self> {
        let encoded = base64::engine::general_purpose::STANDARD
            .encode(format!("{username}:{password}"));
        let mut value = HeaderValue::from_str(&format!("Basic {encoded}"))?;
        value.set_sensitive(true);
        Ok(self.header(AUTHORIZATION, value))
    }

    /// Serializes `body` as the JSON payload of this request.
    pub fn json_body<B>(mut self, body: &B) -> Result<Self>
    where
        B: Serialize + ?Sized,
    {
        let encoded = serde_json::to_vec(body).map_err(|e| {
            Error::Config(format!(
                "cannot encode request to {}: {e}",
                self.url
            ))
        })?;
        self.body = Some(encoded);
        Ok(self.header(CONTENT_TYPE, HeaderValue::from_static("application/json")))
    }
}

/// A response whose body has already been read to the end. Holding the body
/// as bytes means the connection is released on every path, including the
/// ones where decoding fails later.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub url: Url,
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(url: Url, status: StatusCode) -> Self {
        Self {
            url,
            status,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: &str) -> Result<Self> {
        self.headers.insert(name, HeaderValue::from_str(value)?);
        Ok(self)
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Wrapper around the http stack. Implementations must not retry: retry
/// policy belongs to the callers that know which failures are transient.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Creates a bare request carrying the transport's default headers.
    fn new_request(&self, method: Method, url: Url) -> Result<Request>;

    /// Performs the request. Network failures surface as
    /// [`Error::Transport`] (or [`Error::Timeout`]); the status code is not
    /// interpreted here.
    async fn execute(&self, request: Request) -> Result<RawResponse>;
}

/// The default [`Transport`], backed by a [`reqwest::Client`].
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    http_client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        let http_client = reqwest::ClientBuilder::new()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self { http_client })
    }

    /// Use a pre-configured [`reqwest::Client`]. This allows customising TLS,
    /// timeouts, and other low-level http options.
    pub fn with_client(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    fn new_request(&self, method: Method, url: Url) -> Result<Request> {
        Ok(Request::new(method, url)
            .header(ACCEPT, HeaderValue::from_static(ACCEPT_API_V1)))
    }

    async fn execute(&self, request: Request) -> Result<RawResponse> {
        let Request {
            method,
            url,
            headers,
            body,
        } = request;

        let mut builder = self.http_client.request(method, url).headers(headers);
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let resp = builder.send().await?;
        let url = resp.url().clone();
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.bytes().await?.to_vec();

        Ok(RawResponse {
            url,
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_auth_uses_token_as_username() {
        let url = Url::parse("https://api.example.com/users/me").unwrap();
        let request = Request::new(Method::GET, url)
            .basic_auth("abc123", "")
            .unwrap();

        // base64("abc123:")
        assert_eq!(
            "Basic YWJjMTIzOg==",
            request.headers.get(AUTHORIZATION).unwrap()
        );
    }

    #[test]
    fn json_body_sets_content_type() {
        let url = Url::parse("https://api.example.com/login").unwrap();
        let request = Request::new(Method::POST, url)
            .json_body(&serde_json::json!({"email": "u@example.com"}))
            .unwrap();

        assert_eq!(
            "application/json",
            request.headers.get(CONTENT_TYPE).unwrap()
        );
        assert_eq!(
            br#"{"email":"u@example.com"}"#.to_vec(),
            request.body.unwrap()
        );
    }

    #[test]
    fn unencodable_body_is_a_config_error() {
        let url = Url::parse("https://api.example.com/login").unwrap();
        let body: std::collections::BTreeMap<(u8, u8), u8> =
            [((1, 2), 3)].into_iter().collect();

        let err = Request::new(Method::POST, url).json_body(&body).unwrap_err();
        assert_eq!(crate::ErrorKind::Config, err.kind());
    }
}
