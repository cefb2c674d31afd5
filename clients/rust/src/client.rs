use std::sync::Arc;

use http::header::USER_AGENT;
use http::{HeaderValue, Method};
use reqwest::IntoUrl;
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use url::Url;

use crate::api::{decode_json, decode_response_error};
use crate::constants::{
    CURRENT_ACCOUNT,
    DEFAULT_ENDPOINT,
    ENDPOINT_ENV,
    IMPERSONATE_PARAM,
};
use crate::pagination::{Paginated, PaginationResponse};
use crate::transport::{RawResponse, ReqwestTransport, Request, Transport};
use crate::{Error, Result};

/// An asynchronous client for the package-hosting API.
///
/// The client has various configuration options, but has reasonable defaults
/// that should suit most use-cases. To configure a client, use
/// [`Client::builder()`] or [`ClientBuilder::new()`]
///
/// Each `Client` owns its [`Transport`]; there is no process-wide default.
/// Cloning is cheap and shares the transport.
#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
    config: ClientConfig,
}

/// A `ClientBuilder` is what should be used to construct a `Client` with custom
/// configuration.
///
/// We default to the production service `https://api.fury.io` unless the
/// `FURY_ENDPOINT` environment variable is defined. Alternatively,
/// [`ClientBuilder::endpoint`] overrides the server url for this particular
/// client instance.
#[must_use]
#[derive(Default, Clone)]
pub struct ClientBuilder {
    config: Config,
}

impl ClientBuilder {
    /// Construct a new client builder with reasonable defaults. Use
    /// [`ClientBuilder::build`] to construct a client.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn endpoint<T: IntoUrl>(mut self, endpoint: T) -> Result<Self> {
        let mut endpoint = endpoint
            .into_url()
            .map_err(|e| Error::Config(format!("invalid endpoint: {e}")))?;
        // We want to make sure that the query string is empty.
        endpoint.set_query(None);
        self.config.endpoint = Some(endpoint);
        Ok(self)
    }

    /// The API token. Requests are sent unauthenticated without one, which
    /// is what the login endpoints expect.
    pub fn token(mut self, token: Option<String>) -> Self {
        self.config.token = token.filter(|t| !t.is_empty());
        self
    }

    /// The account to act on. It fills the `{acct}` path variable, and
    /// endpoints that support impersonation send it as `?as=`.
    pub fn account(mut self, account: Option<String>) -> Self {
        self.config.account = account.filter(|a| !a.is_empty());
        self
    }

    pub fn user_agent<T: Into<String>>(mut self, user_agent: T) -> Self {
        self.config.user_agent = Some(user_agent.into());
        self
    }

    /// Use a pre-configured [`reqwest::Client`] instance instead of creating
    /// our own. This allows customising TLS, timeout, and other low-level http
    /// client configuration options.
    pub fn reqwest_client(mut self, c: reqwest::Client) -> Self {
        self.config.transport =
            Some(Arc::new(ReqwestTransport::with_client(c)));
        self
    }

    /// Replace the network layer altogether.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.config.transport = Some(transport);
        self
    }

    pub fn build(self) -> Result<Client> {
        let transport = match self.config.transport {
            | Some(t) => t,
            | None => Arc::new(ReqwestTransport::new()?),
        };

        let endpoint = match self.config.endpoint {
            | Some(e) => e,
            | None => {
                // Attempt to read from environment variable before fallback to
                // default.
                match std::env::var(ENDPOINT_ENV) {
                    | Ok(endpoint) => Url::parse(&endpoint)?,
                    | Err(_) => DEFAULT_ENDPOINT.clone(),
                }
            }
        };

        let user_agent = self
            .config
            .user_agent
            .map(|ua| HeaderValue::from_str(&ua))
            .transpose()?;

        Ok(Client {
            transport,
            config: ClientConfig {
                endpoint,
                token: self.config.token,
                account: self.config.account,
                user_agent,
            },
        })
    }
}

impl Client {
    /// Creates a `ClientBuilder` to configure a `Client`.
    ///
    /// This is the same as `ClientBuilder::new()`.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub fn endpoint(&self) -> &Url {
        &self.config.endpoint
    }

    pub fn account(&self) -> Option<&str> {
        self.config.account.as_deref()
    }

    pub fn has_token(&self) -> bool {
        self.config.token.is_some()
    }

    /// Builds an authenticated request for `path`, which may contain
    /// `{acct}` and a query string. With `impersonate`, the configured
    /// account (if any) is appended as `as=<account>`.
    pub fn build_request(
        &self,
        method: Method,
        path: &str,
        impersonate: bool,
    ) -> Result<Request> {
        let account = self.account().unwrap_or(CURRENT_ACCOUNT);
        let path = expand_template(path, &[("acct", account)])?;

        let mut url = self.config.endpoint.join(&path)?;
        if impersonate {
            if let Some(account) = self.account() {
                url.query_pairs_mut()
                    .append_pair(IMPERSONATE_PARAM, account);
            }
        }

        let mut request = self.new_request(method, url)?;
        if let Some(ref token) = self.config.token {
            request = request.basic_auth(token, "")?;
        }
        Ok(request)
    }

    /// Builds a request authenticated with a bearer token instead of the
    /// client's own token. `target` may be absolute or relative to the
    /// endpoint.
    pub fn build_bearer_request(
        &self,
        method: Method,
        target: &str,
        bearer: &str,
    ) -> Result<Request> {
        let url = self.config.endpoint.join(target)?;
        self.new_request(method, url)?.bearer_auth(bearer)
    }

    fn new_request(&self, method: Method, url: Url) -> Result<Request> {
        let request = self.transport.new_request(method, url)?;
        Ok(match self.config.user_agent {
            | Some(ref ua) => request.header(USER_AGENT, ua.clone()),
            | None => request,
        })
    }

    /// Executes the request and turns error statuses into errors.
    pub async fn execute(&self, request: Request) -> Result<RawResponse> {
        info!("Sending a request '{} {}'", request.method, request.url);
        let response = self.transport.execute(request).await?;
        debug!(status = %response.status, url = %response.url, "Received response");
        decode_response_error(&response)?;
        Ok(response)
    }

    pub(crate) async fn run_json<T>(&self, request: Request) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = self.execute(request).await?;
        decode_json(&response)
    }

    /// Like `run_json`, additionally returning the pagination metadata of the
    /// response.
    pub(crate) async fn run_paginated<B>(
        &self,
        request: Request,
    ) -> Result<(B, Option<PaginationResponse>)>
    where
        B: DeserializeOwned,
    {
        let response = self.execute(request).await?;
        let pagination = PaginationResponse::from_headers(&response.headers);
        Ok((decode_json(&response)?, pagination))
    }

    pub(crate) async fn run_list<T>(
        &self,
        request: Request,
    ) -> Result<Paginated<T>>
    where
        T: DeserializeOwned,
    {
        let (items, pagination) = self.run_paginated(request).await?;
        Ok(Paginated { items, pagination })
    }

    pub(crate) async fn run_empty(&self, request: Request) -> Result<()> {
        self.execute(request).await.map(|_| ())
    }

    pub(crate) async fn run_text(&self, request: Request) -> Result<String> {
        self.execute(request).await.map(|r| r.text())
    }
}

/// Expands `{name}` placeholders in a path template. Values are inserted
/// percent-encoded.
pub(crate) fn expand_template(
    template: &str,
    vars: &[(&str, &str)],
) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(idx) = rest.find(['{', '}']) {
        if rest[idx..].starts_with('}') {
            return Err(Error::Config(format!(
                "unbalanced '}}' in path template '{template}'"
            )));
        }
        out.push_str(&rest[..idx]);

        let after = &rest[idx + 1..];
        let close = after.find('}').ok_or_else(|| {
            Error::Config(format!(
                "unterminated variable in path template '{template}'"
            ))
        })?;
        let name = &after[..close];
        let value = vars
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
            .ok_or_else(|| {
                Error::Config(format!(
                    "unknown variable '{name}' in path template '{template}'"
                ))
            })?;

        out.push_str(&urlencoding::encode(value));
        rest = &after[close + 1..];
    }

    out.push_str(rest);
    Ok(out)
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("endpoint", &self.config.endpoint.as_str())
            .field("account", &self.config.account)
            .field("has_token", &self.config.token.is_some())
            .finish()
    }
}

#[derive(Default, Clone)]
struct Config {
    endpoint: Option<Url>,
    token: Option<String>,
    account: Option<String>,
    user_agent: Option<String>,
    transport: Option<Arc<dyn Transport>>,
}

#[derive(Clone)]
struct ClientConfig {
    endpoint: Url,
    token: Option<String>,
    account: Option<String>,
    user_agent: Option<HeaderValue>,
}

// Ensure that Client is Send + Sync. Compiler will fail if it's not.
const _: () = {
    fn assert_send<T: Send + Sync>() {}
    let _ = assert_send::<Client>;
};

#[cfg(test)]
mod tests {
    use http::header::{ACCEPT, AUTHORIZATION};
    use http::StatusCode;

    use super::*;
    use crate::test_helpers::FakeTransport;
    use crate::ErrorKind;

    fn client(account: Option<&str>, token: Option<&str>) -> Client {
        Client::builder()
            .endpoint("https://api.example.com")
            .unwrap()
            .account(account.map(str::to_owned))
            .token(token.map(str::to_owned))
            .transport(Arc::new(FakeTransport::not_found()))
            .build()
            .unwrap()
    }

    #[test]
    fn account_template_defaults_to_me() {
        let req = client(None, None)
            .build_request(Method::GET, "/git/repos/{acct}", false)
            .unwrap();
        assert_eq!("https://api.example.com/git/repos/me", req.url.as_str());

        let req = client(Some("acme co"), None)
            .build_request(Method::GET, "/git/repos/{acct}/app", false)
            .unwrap();
        assert_eq!(
            "https://api.example.com/git/repos/acme%20co/app",
            req.url.as_str()
        );
    }

    #[test]
    fn bad_templates_are_config_errors() {
        let c = client(None, None);
        for path in ["/git/{nope}", "/git/{acct", "/git/acct}"] {
            let err = c.build_request(Method::GET, path, false).unwrap_err();
            assert_eq!(ErrorKind::Config, err.kind(), "path: {path}");
        }
    }

    #[test]
    fn malformed_endpoint_is_a_config_error() {
        let err = Client::builder().endpoint("not a url").err().unwrap();
        assert_eq!(ErrorKind::Config, err.kind());
    }

    #[test]
    fn impersonation_only_when_requested_and_configured() {
        let req = client(Some("acme"), None)
            .build_request(Method::GET, "/packages", true)
            .unwrap();
        assert_eq!("https://api.example.com/packages?as=acme", req.url.as_str());

        let req = client(Some("acme"), None)
            .build_request(Method::GET, "/versions?expand=package", true)
            .unwrap();
        assert_eq!(
            "https://api.example.com/versions?expand=package&as=acme",
            req.url.as_str()
        );

        let req = client(Some("acme"), None)
            .build_request(Method::GET, "/packages", false)
            .unwrap();
        assert_eq!(None, req.url.query());

        let req = client(None, None)
            .build_request(Method::GET, "/packages", true)
            .unwrap();
        assert_eq!(None, req.url.query());
    }

    #[test]
    fn token_is_sent_as_basic_auth() {
        let req = client(None, Some("abc123"))
            .build_request(Method::GET, "/users/me", false)
            .unwrap();
        assert_eq!(
            "Basic YWJjMTIzOg==",
            req.headers.get(AUTHORIZATION).unwrap()
        );
        assert_eq!(
            "application/vnd.fury.v1",
            req.headers.get(ACCEPT).unwrap()
        );

        let req = client(None, None)
            .build_request(Method::GET, "/users/me", false)
            .unwrap();
        assert!(req.headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn bearer_requests_resolve_relative_targets() {
        let req = client(None, Some("abc123"))
            .build_bearer_request(Method::GET, "/cli/auth?wait=true", "xyz")
            .unwrap();
        assert_eq!(
            "https://api.example.com/cli/auth?wait=true",
            req.url.as_str()
        );
        assert_eq!("Bearer xyz", req.headers.get(AUTHORIZATION).unwrap());
    }

    #[tokio::test]
    async fn execute_classifies_status() {
        let fake = Arc::new(FakeTransport::new(|req, _| {
            Ok(RawResponse::new(req.url.clone(), StatusCode::FORBIDDEN))
        }));
        let c = Client::builder()
            .endpoint("https://api.example.com")
            .unwrap()
            .transport(fake.clone())
            .build()
            .unwrap();

        let req = c.build_request(Method::GET, "/packages", true).unwrap();
        let err = c.execute(req).await.unwrap_err();
        assert_eq!(ErrorKind::Forbidden, err.kind());
        assert_eq!(1, fake.calls());
    }
}
