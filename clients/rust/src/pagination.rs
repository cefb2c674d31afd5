//! Cursor pagination over list endpoints.
//!
//! Every list endpoint accepts a [`PaginationRequest`] and answers with the
//! page items plus an optional [`PaginationResponse`] parsed from the `Link`
//! header. The cursor found in the `rel="next"` link is opaque: it is
//! forwarded verbatim and never parsed or computed on the client.

use std::future::Future;

use http::header::LINK;
use http::HeaderMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use crate::Result;

pub const DEFAULT_PAGE_SIZE: u32 = 100;

// Relative links are resolved against this base only to read their query.
static LINK_BASE: Lazy<Url> =
    Lazy::new(|| Url::parse("https://localhost/").expect("LINK_BASE"));

fn is_zero(n: &u32) -> bool {
    *n == 0
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationRequest {
    #[serde(default, skip_serializing_if = "is_zero")]
    pub limit: u32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub page: String,
}

impl PaginationRequest {
    pub fn with_limit(limit: u32) -> Self {
        Self {
            limit,
            page: String::new(),
        }
    }
}

/// One entry of a `Link` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub url: String,
    pub rels: Vec<String>,
}

impl Link {
    pub fn has_rel(&self, rel: &str) -> bool {
        self.rels.iter().any(|r| r.eq_ignore_ascii_case(rel))
    }
}

/// Pagination metadata of a single response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationResponse {
    links: Vec<Link>,
}

impl PaginationResponse {
    /// Returns `None` when the response carries no usable `Link` header.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let value = headers.get(LINK)?.to_str().ok()?;
        Self::parse(value)
    }

    pub fn parse(value: &str) -> Option<Self> {
        let links = parse_link_header(value);
        if links.is_empty() {
            return None;
        }
        Some(Self { links })
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// The `page` parameter of the first parseable `rel="next"` link, or
    /// `None` if there are no more pages.
    pub fn next_page_cursor(&self) -> Option<String> {
        let next = self.links.iter().filter(|l| l.has_rel("next")).find_map(
            |l| {
                Url::options().base_url(Some(&LINK_BASE)).parse(&l.url).ok()
            },
        )?;

        next.query_pairs()
            .find(|(key, _)| key == "page")
            .map(|(_, value)| value.into_owned())
            .filter(|page| !page.is_empty())
    }
}

// RFC 8288 style: `<url>; rel="next", <url>; rel="last"`
fn parse_link_header(value: &str) -> Vec<Link> {
    let mut links = Vec::new();
    let mut rest = value;

    while let Some(open) = rest.find('<') {
        let Some(close) = rest[open..].find('>') else {
            break;
        };
        let url = rest[open + 1..open + close].trim().to_owned();
        rest = &rest[open + close + 1..];

        // Parameters run up to the next comma outside of quotes.
        let mut in_quotes = false;
        let mut end = rest.len();
        for (i, c) in rest.char_indices() {
            match c {
                | '"' => in_quotes = !in_quotes,
                | ',' if !in_quotes => {
                    end = i;
                    break;
                }
                | _ => {}
            }
        }
        let params = &rest[..end];
        rest = &rest[end..];

        let mut rels = Vec::new();
        for param in params.split(';') {
            let Some((key, val)) = param.split_once('=') else {
                continue;
            };
            if key.trim().eq_ignore_ascii_case("rel") {
                rels.extend(
                    val.trim()
                        .trim_matches('"')
                        .split_whitespace()
                        .map(str::to_ascii_lowercase),
                );
            }
        }

        links.push(Link { url, rels });
    }

    links
}

/// A page of results together with its pagination metadata.
#[derive(Debug, Clone)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub pagination: Option<PaginationResponse>,
}

impl<T> Paginated<T> {
    pub fn next_page_cursor(&self) -> Option<String> {
        self.pagination
            .as_ref()
            .and_then(PaginationResponse::next_page_cursor)
    }
}

/// Receives cosmetic progress notifications while pages are fetched.
pub trait PageProgress: Send {
    /// Called once, after the first page, when more pages are pending.
    fn start(&mut self) {}

    /// Called when iteration stops, but only if `start` was called.
    fn finish(&mut self) {}
}

/// A [`PageProgress`] that shows nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl PageProgress for NoProgress {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagerState {
    /// No page was requested yet.
    Start,
    /// A request for the current cursor is due.
    Fetch,
    Done,
}

/// The pagination state machine, for callers that handle each page as it
/// arrives.
///
/// ```ignore
/// let mut pager = Pager::new(DEFAULT_PAGE_SIZE, cancel);
/// while let Some(req) = pager.next_request() {
///     let page = fury::packages::list(&client, &req).await?;
///     pager.advance(page.pagination.as_ref());
///     handle(page.items);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Pager {
    request: PaginationRequest,
    state: PagerState,
    cancel: CancellationToken,
    pages: usize,
}

impl Pager {
    pub fn new(page_size: u32, cancel: CancellationToken) -> Self {
        Self {
            request: PaginationRequest::with_limit(page_size),
            state: PagerState::Start,
            cancel,
            pages: 0,
        }
    }

    pub fn state(&self) -> PagerState {
        self.state
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages
    }

    /// The request to send next, or `None` once iteration is over.
    pub fn next_request(&self) -> Option<PaginationRequest> {
        match self.state {
            | PagerState::Done => None,
            | _ => Some(self.request.clone()),
        }
    }

    /// Records a fetched page. Returns `true` if another page should be
    /// fetched.
    pub fn advance(&mut self, response: Option<&PaginationResponse>) -> bool {
        if self.state == PagerState::Done {
            return false;
        }
        self.pages += 1;

        let cursor = response.and_then(PaginationResponse::next_page_cursor);
        match cursor {
            | Some(cursor) if !self.cancel.is_cancelled() => {
                debug!(pages = self.pages, "More pages pending");
                self.request.page = cursor;
                self.state = PagerState::Fetch;
                true
            }
            | _ => {
                self.request.page.clear();
                self.state = PagerState::Done;
                false
            }
        }
    }
}

/// Outcome of [`Paginator::collect`]. Items fetched before a failure are kept
/// so callers can still show them.
#[derive(Debug)]
pub struct Collected<T> {
    pub items: Vec<T>,
    pub pages: usize,
    pub result: Result<()>,
}

impl<T> Collected<T> {
    pub fn into_result(self) -> Result<Vec<T>> {
        self.result.map(|_| self.items)
    }
}

/// Drives a list endpoint to the end, aggregating every page.
pub struct Paginator<'a> {
    page_size: u32,
    cancel: CancellationToken,
    progress: Option<&'a mut dyn PageProgress>,
}

impl<'a> Paginator<'a> {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            cancel,
            progress: None,
        }
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn progress(mut self, progress: &'a mut dyn PageProgress) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Calls `fetch` once per page, in server order, until the server stops
    /// handing out cursors, the cancellation token fires, or `fetch` fails.
    pub async fn collect<T, F, Fut>(self, mut fetch: F) -> Collected<T>
    where
        F: FnMut(PaginationRequest) -> Fut,
        Fut: Future<Output = Result<Paginated<T>>>,
    {
        let Paginator {
            page_size,
            cancel,
            mut progress,
        } = self;

        let mut pager = Pager::new(page_size, cancel);
        let mut items = Vec::new();
        let mut started = false;
        let mut result = Ok(());

        while let Some(request) = pager.next_request() {
            let page = match fetch(request).await {
                | Ok(page) => page,
                | Err(e) => {
                    result = Err(e);
                    break;
                }
            };

            items.extend(page.items);
            if pager.advance(page.pagination.as_ref()) && !started {
                started = true;
                if let Some(p) = progress.as_deref_mut() {
                    p.start();
                }
            }
        }

        if started {
            if let Some(p) = progress.as_deref_mut() {
                p.finish();
            }
        }

        Collected {
            items,
            pages: pager.pages_fetched(),
            result,
        }
    }
}
