use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Parser;
use colored::Colorize;
use dialoguer::{Input, Password};
use fury::login::{BrowserLogin, LoginResponse};
use fury::Client;
use tokio::io::AsyncWriteExt;

use crate::args::CommonOptions;
use crate::confirm::confirm;
use crate::credentials::{CredentialStore, Credentials};
use crate::{client, emitln, ui, RunCommand};

#[derive(Parser, Debug, Clone)]
pub struct Login {
    /// Log in with email and password instead of the browser
    #[arg(long)]
    interactive: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct Logout {}

#[async_trait]
impl RunCommand for Login {
    async fn run<
        A: tokio::io::AsyncWrite + Send + Sync + Unpin,
        B: tokio::io::AsyncWrite + Send + Sync + Unpin,
    >(
        &self,
        out: &mut tokio::io::BufWriter<A>,
        err: &mut tokio::io::BufWriter<B>,
        common_options: &CommonOptions,
    ) -> Result<()> {
        // An inline token needs no login, only a check that it works.
        if common_options.inline_token().is_some() {
            let client = common_options.new_client()?;
            let account = fury::accounts::whoami(&client).await?;
            emitln!(out, "API token belongs to {:?}", account.name);
            return Ok(());
        }

        let store = common_options.credential_store()?;
        if let Some(saved) = store.load()? {
            logout_current(err, common_options, &store, &saved.token, true)
                .await?;
        }

        let client = common_options.anonymous_client()?;
        let resp = if self.interactive {
            interactive_login(err, &client).await?
        } else {
            browser_login(err, common_options, &client).await?
        };

        store.save(&Credentials {
            email: resp.user.email.clone(),
            token: resp.token,
        })?;
        emitln!(
            out,
            "You are logged in as {}",
            format!("{:?}", resp.user.email).green()
        );
        Ok(())
    }
}

#[async_trait]
impl RunCommand for Logout {
    async fn run<
        A: tokio::io::AsyncWrite + Send + Sync + Unpin,
        B: tokio::io::AsyncWrite + Send + Sync + Unpin,
    >(
        &self,
        out: &mut tokio::io::BufWriter<A>,
        err: &mut tokio::io::BufWriter<B>,
        common_options: &CommonOptions,
    ) -> Result<()> {
        let store = common_options.credential_store()?;
        let Some(saved) = store.load()? else {
            emitln!(out, "You are logged out");
            return Ok(());
        };

        crate::confirm_or_abort!(
            common_options,
            "Are you sure you want to logout?"
        );
        logout_current(err, common_options, &store, &saved.token, false)
            .await?;
        emitln!(out, "You have been logged out");
        Ok(())
    }
}

/// Deactivates the saved token on the server and forgets it locally. When
/// the server refuses, the user decides whether to carry on.
async fn logout_current<B>(
    err: &mut tokio::io::BufWriter<B>,
    common_options: &CommonOptions,
    store: &impl CredentialStore,
    token: &str,
    for_login: bool,
) -> Result<()>
where
    B: tokio::io::AsyncWrite + Send + Sync + Unpin,
{
    let client = client::build(common_options, Some(token.to_owned()))?;
    if let Err(e) = fury::login::logout(&client).await {
        emitln!(err, "Error deactivating your old CLI credentials: {}", e);
        err.flush().await?;
        let proceed = if for_login {
            confirm!(
                common_options,
                "Do you want to ignore & continue with your login?"
            )
        } else {
            confirm!(
                common_options,
                "Do you want to remove the saved credentials anyway?"
            )
        };
        if !proceed {
            return Err(e.into());
        }
    }
    store.wipe()
}

async fn browser_login<B>(
    err: &mut tokio::io::BufWriter<B>,
    common_options: &CommonOptions,
    client: &Client,
) -> Result<LoginResponse>
where
    B: tokio::io::AsyncWrite + Send + Sync + Unpin,
{
    let challenge = fury::login::create_challenge(client)
        .await
        .context("Failed to start browser login")?;

    emitln!(err, "Open this URL in your browser to log in:");
    emitln!(err, "  {}", challenge.browser_url.bold());
    err.flush().await?;

    let spinner = ui::spin_if_terminal("Waiting ...");
    let resp = BrowserLogin::default()
        .wait(client, &challenge, &common_options.cancel)
        .await;
    ui::stop_spinner(spinner);
    Ok(resp?)
}

async fn interactive_login<B>(
    err: &mut tokio::io::BufWriter<B>,
    client: &Client,
) -> Result<LoginResponse>
where
    B: tokio::io::AsyncWrite + Send + Sync + Unpin,
{
    emitln!(err, "Please enter your credentials.");
    err.flush().await?;

    let email: String = Input::new().with_prompt("Email").interact_text()?;
    let password = Password::new().with_prompt("Password").interact()?;

    Ok(fury::login::login(client, email, password).await?)
}
