use chrono::{DateTime, Utc};
use http::Method;
use serde::{Deserialize, Serialize};
use url::form_urlencoded;
use urlencoding::encode;

use crate::accounts::Account;
use crate::pagination::{Paginated, PaginationRequest};
use crate::{Client, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Package {
    pub id: String,
    pub name: String,
    #[serde(rename = "kind_key")]
    pub kind: String,
    pub private: bool,
    pub latest_version: Option<Version>,
    pub release_version: Option<Version>,
}

impl Package {
    pub fn privacy(&self) -> &'static str {
        if self.private {
            "private"
        } else {
            "public"
        }
    }

    /// The released version, or `beta` when nothing was released yet.
    pub fn display_version(&self) -> &str {
        match self.release_version {
            | Some(ref v) => &v.version,
            | None => "beta",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Version {
    pub id: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<Box<Package>>,
    pub created_by: Option<Account>,
    pub created_at: Option<DateTime<Utc>>,
    pub download_url: String,
    pub filename: String,
    pub digests: VersionDigests,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionDigests {
    pub sha512: String,
    pub sha256: String,
    pub sha1: String,
    pub md5: String,
}

impl Version {
    pub fn display_created_by(&self) -> &str {
        match self.created_by {
            | Some(ref a) => &a.name,
            | None => "N/A",
        }
    }

    pub fn kind(&self) -> &str {
        match self.package {
            | Some(ref p) if !p.kind.is_empty() => &p.kind,
            | _ => "N/A",
        }
    }
}

/// One page of the account's packages.
pub async fn list(
    client: &Client,
    page: &PaginationRequest,
) -> Result<Paginated<Package>> {
    let req = client
        .build_request(Method::GET, "/packages", true)?
        .json_body(page)?;
    client.run_list(req).await
}

/// One page of the versions of `package`, newest first.
pub async fn versions(
    client: &Client,
    package: &str,
    page: &PaginationRequest,
) -> Result<Paginated<Version>> {
    let path = format!("/packages/{}/versions?expand=package", encode(package));
    let req = client
        .build_request(Method::GET, &path, true)?
        .json_body(page)?;
    client.run_list(req).await
}

/// One page of versions across packages matching `filter`, e.g.
/// `[("kind", "npm")]`.
pub async fn filter_versions(
    client: &Client,
    filter: &[(&str, &str)],
    page: &PaginationRequest,
) -> Result<Paginated<Version>> {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("expand", "package")
        .extend_pairs(filter)
        .finish();
    let path = format!("/versions?{query}");
    let req = client
        .build_request(Method::GET, &path, true)?
        .json_body(page)?;
    client.run_list(req).await
}

pub async fn version(
    client: &Client,
    package: &str,
    version: &str,
) -> Result<Version> {
    let path = format!(
        "/packages/{}/versions/{}?expand=package",
        encode(package),
        encode(version)
    );
    let req = client.build_request(Method::GET, &path, true)?;
    client.run_json(req).await
}

/// Removes a single version of a package.
pub async fn yank(client: &Client, package: &str, version: &str) -> Result<()> {
    let path =
        format!("/packages/{}/versions/{}", encode(package), encode(version));
    let req = client.build_request(Method::DELETE, &path, true)?;
    client.run_empty(req).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use http::header::LINK;
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::pagination::Paginator;
    use crate::test_helpers::{client_with, json, FakeTransport};
    use crate::transport::RawResponse;
    use crate::ErrorKind;

    #[tokio::test]
    async fn list_sends_pagination_body_and_impersonates() {
        let fake = Arc::new(FakeTransport::new(|req, _| {
            json(
                req,
                200,
                r#"[{"id":"p1","name":"foo","kind_key":"npm","private":true,"release_version":{"version":"1.2.0"}}]"#,
            )
        }));
        let client = client_with(fake.clone(), Some("acme"));

        let page = list(&client, &PaginationRequest::with_limit(100))
            .await
            .unwrap();
        assert_eq!(1, page.items.len());
        assert_eq!(None, page.next_page_cursor());

        let pkg = &page.items[0];
        assert_eq!("npm", pkg.kind);
        assert_eq!("private", pkg.privacy());
        assert_eq!("1.2.0", pkg.display_version());

        let req = &fake.requests()[0];
        assert_eq!("https://api.example.com/packages?as=acme", req.url.as_str());
        assert_eq!(br#"{"limit":100}"#.to_vec(), req.body.clone().unwrap());
    }

    #[tokio::test]
    async fn version_lookup_expands_package() {
        let fake = Arc::new(FakeTransport::new(|req, _| {
            json(
                req,
                200,
                r#"{"id":"v1","version":"1.0.0","package":{"id":"p1","name":"@scope/pkg","kind_key":"npm"},"created_at":"2024-03-01T12:00:00Z"}"#,
            )
        }));
        let client = client_with(fake.clone(), Some("acme"));

        let v = version(&client, "@scope/pkg", "1.0.0").await.unwrap();
        assert_eq!("1.0.0", v.version);
        assert_eq!("npm", v.kind());
        assert!(v.created_at.is_some());

        let req = &fake.requests()[0];
        assert_eq!(Method::GET, req.method);
        assert_eq!("/packages/%40scope%2Fpkg/versions/1.0.0", req.url.path());
        assert_eq!(Some("expand=package&as=acme"), req.url.query());
    }

    #[tokio::test]
    async fn package_names_are_escaped() {
        let fake = Arc::new(FakeTransport::new(|req, _| json(req, 200, "[]")));
        let client = client_with(fake.clone(), None);

        versions(&client, "@scope/pkg", &PaginationRequest::default())
            .await
            .unwrap();
        yank(&client, "@scope/pkg", "1.0.0-rc.1").await.unwrap();

        let reqs = fake.requests();
        assert_eq!(
            "/packages/%40scope%2Fpkg/versions",
            reqs[0].url.path()
        );
        assert_eq!(Some("expand=package"), reqs[0].url.query());
        assert_eq!(Method::DELETE, reqs[1].method);
        assert_eq!(
            "/packages/%40scope%2Fpkg/versions/1.0.0-rc.1",
            reqs[1].url.path()
        );
    }

    #[tokio::test]
    async fn filter_versions_keeps_filter_before_impersonation() {
        let fake = Arc::new(FakeTransport::new(|req, _| json(req, 200, "[]")));
        let client = client_with(fake.clone(), Some("acme"));

        filter_versions(
            &client,
            &[("kind", "npm")],
            &PaginationRequest::default(),
        )
        .await
        .unwrap();

        assert_eq!(
            Some("expand=package&kind=npm&as=acme"),
            fake.requests()[0].url.query()
        );
    }

    #[tokio::test]
    async fn collects_versions_across_pages() {
        let fake = Arc::new(FakeTransport::new(|req, idx| {
            let body = format!(r#"[{{"version":"{idx}.0.0"}}]"#);
            let resp = RawResponse::new(req.url.clone(), http::StatusCode::OK)
                .with_body(body);
            if idx < 2 {
                resp.with_header(
                    LINK,
                    &format!(r#"</packages/foo/versions?page=cur{idx}>; rel="next""#),
                )
            } else {
                Ok(resp)
            }
        }));
        let client = client_with(fake.clone(), None);

        let collected = Paginator::new(CancellationToken::new())
            .collect(|page| {
                let client = &client;
                async move { versions(client, "foo", &page).await }
            })
            .await;

        let names: Vec<_> = collected
            .into_result()
            .unwrap()
            .into_iter()
            .map(|v| v.version)
            .collect();
        assert_eq!(vec!["0.0.0", "1.0.0", "2.0.0"], names);

        let bodies: Vec<String> = fake
            .requests()
            .iter()
            .map(|r| String::from_utf8(r.body.clone().unwrap()).unwrap())
            .collect();
        assert_eq!(
            vec![
                r#"{"limit":100}"#,
                r#"{"limit":100,"page":"cur0"}"#,
                r#"{"limit":100,"page":"cur1"}"#,
            ],
            bodies
        );
    }

    #[tokio::test]
    async fn yank_surfaces_not_found() {
        let fake = Arc::new(FakeTransport::not_found());
        let client = client_with(fake, None);

        let err = yank(&client, "foo", "9.9.9").await.unwrap_err();
        assert_eq!(ErrorKind::NotFound, err.kind());
    }

    #[test]
    fn version_display_fallbacks() {
        let v = Version::default();
        assert_eq!("N/A", v.display_created_by());
        assert_eq!("N/A", v.kind());
        assert_eq!("beta", Package::default().display_version());
        assert_eq!("public", Package::default().privacy());
    }
}
