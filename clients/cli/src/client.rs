use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use fury::{Client, RawResponse, ReqwestTransport, Request, Transport};
use tracing::debug;
use url::Url;

use crate::args::CommonOptions;

/// Logs every exchange with the API at debug level.
pub struct CliTransport {
    inner: ReqwestTransport,
}

impl CliTransport {
    pub fn new() -> Result<Self> {
        Ok(Self {
            inner: ReqwestTransport::new()
                .context("Failed to initialise the http client")?,
        })
    }
}

#[async_trait]
impl Transport for CliTransport {
    fn new_request(
        &self,
        method: http::Method,
        url: Url,
    ) -> fury::Result<Request> {
        self.inner.new_request(method, url)
    }

    async fn execute(&self, request: Request) -> fury::Result<RawResponse> {
        debug!(?request);
        let response = self.inner.execute(request).await?;
        debug!(
            status = %response.status,
            headers = ?response.headers,
            body_len = response.body.len(),
            "response"
        );
        Ok(response)
    }
}

/// Identifies this CLI to the server.
pub fn user_agent() -> String {
    format!(
        "fury-cli-{}-{}-{}",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH,
    )
}

pub fn build(common: &CommonOptions, token: Option<String>) -> Result<Client> {
    Ok(Client::builder()
        .endpoint(common.endpoint().clone())
        .context("Error while parsing endpoint url")?
        .token(token)
        .account(common.account().map(str::to_owned))
        .user_agent(user_agent())
        .transport(Arc::new(CliTransport::new()?))
        .build()?)
}
