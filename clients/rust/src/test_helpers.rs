use std::sync::Mutex;

use async_trait::async_trait;
use http::header::ACCEPT;
use http::{HeaderValue, Method, StatusCode};
use url::Url;

use crate::constants::ACCEPT_API_V1;
use crate::transport::{RawResponse, Request, Transport};
use crate::{Client, Result};

type Handler =
    Box<dyn Fn(&Request, usize) -> Result<RawResponse> + Send + Sync>;

/// Answers requests from a closure and records everything it was sent. The
/// handler also receives the zero-based index of the call.
pub(crate) struct FakeTransport {
    handler: Handler,
    requests: Mutex<Vec<Request>>,
}

impl FakeTransport {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&Request, usize) -> Result<RawResponse> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn not_found() -> Self {
        Self::new(|req, _| {
            Ok(RawResponse::new(req.url.clone(), StatusCode::NOT_FOUND))
        })
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    fn new_request(&self, method: Method, url: Url) -> Result<Request> {
        Ok(Request::new(method, url)
            .header(ACCEPT, HeaderValue::from_static(ACCEPT_API_V1)))
    }

    async fn execute(&self, request: Request) -> Result<RawResponse> {
        let idx = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            requests.len() - 1
        };
        (self.handler)(&request, idx)
    }
}

pub(crate) fn json(req: &Request, status: u16, body: &str) -> Result<RawResponse> {
    Ok(RawResponse::new(req.url.clone(), StatusCode::from_u16(status).unwrap())
        .with_body(body))
}

pub(crate) fn client_with(
    fake: std::sync::Arc<FakeTransport>,
    account: Option<&str>,
) -> Client {
    Client::builder()
        .endpoint("https://api.example.com")
        .unwrap()
        .token(Some("abc123".to_owned()))
        .account(account.map(str::to_owned))
        .transport(fake)
        .build()
        .unwrap()
}
