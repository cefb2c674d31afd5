//! Authentication endpoints and the browser login poller.
//!
//! Browser login is a challenge/poll exchange: the CLI asks the server for a
//! challenge, the user completes it in a browser, and meanwhile the CLI polls
//! the challenge's `cli_url` with the challenge token as bearer credential.
//! Until the user is done, polling answers 404 (or 408), so [`BrowserLogin`]
//! keeps retrying those at a fixed interval, for a bounded amount of time.

use std::time::Duration;

use http::Method;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::accounts::Account;
use crate::backoff::ConstantBackoff;
use crate::{Client, Error, ErrorKind, Result};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_POLL_MAX_ELAPSED: Duration = Duration::from_secs(3 * 60);

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoginResponse {
    pub token: String,
    pub user: Account,
}

/// What a single poll of the challenge returns once it's no longer pending.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginPollResponse {
    #[serde(flatten)]
    pub login: LoginResponse,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginChallenge {
    #[serde(default)]
    pub browser_url: String,
    #[serde(rename = "cli_url")]
    pub poll_url: String,
    pub token: String,
}

/// Exchanges email and password for a CLI token.
pub async fn login(
    client: &Client,
    email: impl Into<String>,
    password: impl Into<String>,
) -> Result<LoginResponse> {
    let body = LoginRequest {
        email: email.into(),
        password: password.into(),
    };
    let req = client
        .build_request(Method::POST, "/login", false)?
        .json_body(&body)?;
    client.run_json(req).await
}

/// Deactivates the token the client is configured with.
pub async fn logout(client: &Client) -> Result<()> {
    let req = client.build_request(Method::POST, "/logout", false)?;
    client.run_empty(req).await
}

pub async fn create_challenge(client: &Client) -> Result<LoginChallenge> {
    let req = client.build_request(Method::POST, "/cli/auth", false)?;
    let challenge: LoginChallenge = client.run_json(req).await?;
    if challenge.browser_url.is_empty() {
        return Err(Error::Login("Internal error".to_owned()));
    }
    Ok(challenge)
}

/// Polls the challenge once. A pending challenge surfaces as
/// [`Error::NotFound`] or [`Error::Timeout`].
pub async fn poll(
    client: &Client,
    challenge: &LoginChallenge,
) -> Result<LoginPollResponse> {
    let req = client.build_bearer_request(
        Method::GET,
        &challenge.poll_url,
        &challenge.token,
    )?;
    client.run_json(req).await
}

/// Waits for a browser login to complete.
#[derive(Debug, Clone, Copy)]
pub struct BrowserLogin {
    backoff: ConstantBackoff,
}

impl Default for BrowserLogin {
    fn default() -> Self {
        Self {
            backoff: ConstantBackoff::new(
                DEFAULT_POLL_INTERVAL,
                DEFAULT_POLL_MAX_ELAPSED,
            ),
        }
    }
}

impl BrowserLogin {
    pub fn new(backoff: ConstantBackoff) -> Self {
        Self { backoff }
    }

    pub fn backoff(&self) -> ConstantBackoff {
        self.backoff
    }

    /// Polls `challenge` until the user completes it.
    ///
    /// Only `Timeout` and `NotFound` are retried; any other error is returned
    /// as soon as it happens. Running out of time is always reported as
    /// [`Error::Timeout`]. A completed poll carrying an `error` message fails
    /// with [`Error::Login`]. Firing `cancel` interrupts the wait between two
    /// polls with [`Error::Cancelled`]; a poll already in flight is not
    /// interrupted.
    pub async fn wait(
        &self,
        client: &Client,
        challenge: &LoginChallenge,
        cancel: &CancellationToken,
    ) -> Result<LoginResponse> {
        let mut retry = self.backoff.retry();

        while let Some(delay) = retry.next() {
            let attempt = delay.attempt_number();
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(attempt, "Browser login was cancelled");
                    return Err(Error::Cancelled);
                }
                _ = delay => {}
            }

            match poll(client, challenge).await {
                | Ok(resp) => {
                    return match resp.error {
                        | Some(message) if !message.is_empty() => {
                            Err(Error::Login(message))
                        }
                        | _ => Ok(resp.login),
                    };
                }
                | Err(e)
                    if matches!(
                        e.kind(),
                        ErrorKind::Timeout | ErrorKind::NotFound
                    ) =>
                {
                    debug!(attempt, error = %e, "Browser login is pending");
                }
                | Err(e) => return Err(e),
            }
        }

        info!(
            elapsed = ?retry.elapsed(),
            "Gave up waiting for browser login"
        );
        Err(Error::Timeout)
    }
}
