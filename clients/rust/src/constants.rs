use once_cell::sync::Lazy;
use url::Url;

pub static ENDPOINT_ENV: &str = "FURY_ENDPOINT";
pub static DEFAULT_ENDPOINT: Lazy<Url> = Lazy::new(|| {
    // Builds can point the default at a staging service by setting
    // FURY_DEFAULT_ENDPOINT at compile time.
    let url_str = std::option_env!("FURY_DEFAULT_ENDPOINT")
        .unwrap_or("https://api.fury.io");
    Url::parse(url_str).expect("DEFAULT_ENDPOINT")
});

/// Default "Accept" header for API requests
pub(crate) const ACCEPT_API_V1: &str = "application/vnd.fury.v1";

/// Value of the `{acct}` path variable when no account is configured.
pub(crate) const CURRENT_ACCOUNT: &str = "me";

/// Query parameter used to act on behalf of another account.
pub(crate) const IMPERSONATE_PARAM: &str = "as";
