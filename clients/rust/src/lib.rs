pub mod accounts;
mod api;
pub mod backoff;
pub mod client;
mod constants;
mod error;
pub mod git;
pub mod login;
pub mod packages;
pub mod pagination;
pub mod sharing;
pub mod transport;

#[cfg(test)]
mod test_helpers;

pub use self::api::{classify_status, status_code_to_error};
pub use self::backoff::ConstantBackoff;
pub use self::client::{Client, ClientBuilder};
pub use self::constants::{DEFAULT_ENDPOINT, ENDPOINT_ENV};
pub use self::error::{BoxError, Error, ErrorKind, Result, UserError};
pub use self::pagination::{
    Collected,
    NoProgress,
    PageProgress,
    Paginated,
    PaginationRequest,
    PaginationResponse,
    Paginator,
};
pub use self::transport::{RawResponse, ReqwestTransport, Request, Transport};
