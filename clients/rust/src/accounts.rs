use http::Method;
use serde::{Deserialize, Serialize};

use crate::{Client, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub email: String,
    pub username: String,
}

/// The account that owns the current token.
pub async fn whoami(client: &Client) -> Result<Account> {
    let req = client.build_request(Method::GET, "/users/me", false)?;
    client.run_json(req).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::test_helpers::{client_with, json, FakeTransport};

    #[tokio::test]
    async fn whoami_decodes_account_and_ignores_unknown_fields() {
        let fake = Arc::new(FakeTransport::new(|req, _| {
            json(
                req,
                200,
                r#"{"id":"acc_1","name":"Jane","email":"j@example.com","username":"jane","plan":"pro"}"#,
            )
        }));
        let client = client_with(fake.clone(), Some("acme"));

        let account = whoami(&client).await.unwrap();
        assert_eq!("jane", account.username);
        assert_eq!("j@example.com", account.email);

        // whoami never impersonates.
        let reqs = fake.requests();
        assert_eq!(
            "https://api.example.com/users/me",
            reqs[0].url.as_str()
        );
    }
}
