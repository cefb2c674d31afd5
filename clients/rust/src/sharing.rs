use http::Method;
use serde::{Deserialize, Serialize};
use urlencoding::encode;

use crate::pagination::{Paginated, PaginationRequest};
use crate::{Client, Result};

/// A collaborator on the account, or an account the user collaborates on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Member {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// One page of the account's collaborators.
pub async fn members(
    client: &Client,
    page: &PaginationRequest,
) -> Result<Paginated<Member>> {
    let req = client
        .build_request(Method::GET, "/members", true)?
        .json_body(page)?;
    client.run_list(req).await
}

/// One page of the accounts the user collaborates on.
pub async fn collaborations(
    client: &Client,
    page: &PaginationRequest,
) -> Result<Paginated<Member>> {
    let req = client
        .build_request(Method::GET, "/collaborations", true)?
        .json_body(page)?;
    client.run_list(req).await
}

/// Invites a collaborator by username or email. Without a role the server
/// picks its default.
pub async fn add_collaborator(
    client: &Client,
    name: &str,
    role: Option<&str>,
) -> Result<()> {
    let path = format!("/collaborators/{}", encode(name));
    let mut req = client.build_request(Method::PUT, &path, true)?;
    if let Some(role) = role.filter(|r| !r.is_empty()) {
        req.url.query_pairs_mut().append_pair("role", role);
    }
    client.run_empty(req).await
}

pub async fn remove_collaborator(client: &Client, name: &str) -> Result<()> {
    let path = format!("/collaborators/{}", encode(name));
    let req = client.build_request(Method::DELETE, &path, true)?;
    client.run_empty(req).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::test_helpers::{client_with, json, FakeTransport};
    use crate::{Error, ErrorKind};

    #[tokio::test]
    async fn members_decode_type_as_kind() {
        let fake = Arc::new(FakeTransport::new(|req, _| {
            json(
                req,
                200,
                r#"[{"id":"m1","name":"bob","role":"push","type":"user"}]"#,
            )
        }));
        let client = client_with(fake.clone(), None);

        let page = members(&client, &PaginationRequest::with_limit(10))
            .await
            .unwrap();
        assert_eq!("user", page.items[0].kind);
        assert_eq!("push", page.items[0].role);
        assert_eq!("/members", fake.requests()[0].url.path());
    }

    #[tokio::test]
    async fn add_collaborator_with_role() {
        let fake = Arc::new(FakeTransport::new(|req, _| json(req, 204, "")));
        let client = client_with(fake.clone(), Some("acme"));

        add_collaborator(&client, "bob@example.com", Some("push"))
            .await
            .unwrap();
        add_collaborator(&client, "carol", None).await.unwrap();

        let reqs = fake.requests();
        assert_eq!(Method::PUT, reqs[0].method);
        assert_eq!(
            "https://api.example.com/collaborators/bob%40example.com?as=acme&role=push",
            reqs[0].url.as_str()
        );
        assert_eq!(Some("as=acme"), reqs[1].url.query());
    }

    #[tokio::test]
    async fn remove_collaborator_surfaces_user_errors() {
        let fake = Arc::new(FakeTransport::new(|req, _| {
            json(
                req,
                422,
                r#"{"error":{"message":"Cannot remove owner","type":"InvalidRequest"}}"#,
            )
        }));
        let client = client_with(fake, None);

        let err = remove_collaborator(&client, "owner").await.unwrap_err();
        assert_eq!(ErrorKind::User, err.kind());
        match err {
            | Error::User(e) => assert_eq!("Cannot remove owner", e.message),
            | other => panic!("unexpected error: {other:?}"),
        }
    }
}
