use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use fury::{Client, DEFAULT_ENDPOINT, ENDPOINT_ENV};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::credentials::{CredentialStore, FileCredentialStore};
use crate::{auth, client, git, packages, sharing, whoami, RunCommand};

const FURY_API_TOKEN_VAR: &str = "FURY_API_TOKEN";
const FURY_ACCOUNT_VAR: &str = "FURY_ACCOUNT";

#[derive(Parser, Debug, Clone)]
/// Command-line utility to manage packages, Git repositories and
/// collaborators of your account
pub struct Cli {
    #[clap(flatten)]
    pub common: CommonOptions,
    #[clap(flatten)]
    pub verbose: clap_verbosity_flag::Verbosity,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Parser, Debug, Clone)]
pub struct CommonOptions {
    #[arg(
        long,
        global = true,
        value_name = "URL",
        env(ENDPOINT_ENV),
        hide = true
    )]
    endpoint: Option<Url>,
    #[arg(
        long,
        global = true,
        value_name = "TOKEN",
        env(FURY_API_TOKEN_VAR),
        hide_env_values = true
    )]
    /// Inline authentication token. Takes precedence over the saved
    /// credentials
    api_token: Option<String>,

    #[arg(
        long,
        short = 'a',
        global = true,
        value_name = "ACCOUNT",
        env(FURY_ACCOUNT_VAR),
        alias = "as"
    )]
    /// Act on behalf of another account that you collaborate on
    account: Option<String>,

    #[arg(long, global = true, value_name = "PATH", hide = true)]
    /// Where login credentials are kept. Defaults to the user's config
    /// directory
    credentials: Option<PathBuf>,

    /// Ignore the confirmation prompt and always answer "yes"
    #[arg(long, short, global = true)]
    pub yes: bool,

    /// Fired on Ctrl-C.
    #[arg(skip)]
    pub cancel: CancellationToken,
}

#[derive(Parser, Debug, Clone)]
pub enum CliCommand {
    #[command(name = "whoami")]
    /// Return current account
    WhoAmI(whoami::WhoAmI),
    /// Authenticate into your account
    Login(auth::Login),
    /// Clear CLI session credentials
    Logout(auth::Logout),
    /// List packages in this account
    #[command(visible_alias = "list")]
    Packages(packages::List),
    /// List versions for a package
    Versions(packages::Versions),
    /// Remove a package version from account
    Yank(packages::Yank),
    /// Collaboration commands. Lists collaborators without a subcommand
    Sharing(sharing::Sharing),
    /// Listing of your collaborations
    Accounts(sharing::Accounts),
    /// Git repository commands
    Git {
        #[command(subcommand)]
        command: git::GitCommand,
    },
}

impl CommonOptions {
    pub fn endpoint(&self) -> &Url {
        self.endpoint.as_ref().unwrap_or(&DEFAULT_ENDPOINT)
    }

    pub fn account(&self) -> Option<&str> {
        self.account.as_deref()
    }

    /// The token passed on the command line or through the environment.
    pub fn inline_token(&self) -> Option<&str> {
        self.api_token.as_deref().filter(|t| !t.is_empty())
    }

    pub fn credential_store(&self) -> Result<FileCredentialStore> {
        match self.credentials {
            | Some(ref path) => Ok(FileCredentialStore::new(path.clone())),
            | None => FileCredentialStore::default_location(),
        }
    }

    /// The token to authenticate with: inline first, then saved
    /// credentials.
    pub fn api_token(&self) -> Result<Option<String>> {
        if let Some(token) = self.inline_token() {
            return Ok(Some(token.to_owned()));
        }
        let saved = self
            .credential_store()?
            .load()
            .context("Failed to read saved credentials")?;
        Ok(saved.map(|c| c.token))
    }

    /// A client for commands that need to be logged in.
    pub fn new_client(&self) -> Result<Client> {
        let Some(token) = self.api_token()? else {
            anyhow::bail!(
                "You're not logged in. Run `fury login` or pass --api-token."
            );
        };
        client::build(self, Some(token))
    }

    /// A client that carries no credentials, used to log in.
    pub fn anonymous_client(&self) -> Result<Client> {
        client::build(self, None)
    }
}

impl CliCommand {
    pub async fn run<
        A: tokio::io::AsyncWrite + Send + Sync + Unpin,
        B: tokio::io::AsyncWrite + Send + Sync + Unpin,
    >(
        &self,
        out: &mut tokio::io::BufWriter<A>,
        err: &mut tokio::io::BufWriter<B>,
        common_options: &CommonOptions,
    ) -> Result<()> {
        match self {
            | CliCommand::WhoAmI(c) => c.run(out, err, common_options).await,
            | CliCommand::Login(c) => c.run(out, err, common_options).await,
            | CliCommand::Logout(c) => c.run(out, err, common_options).await,
            | CliCommand::Packages(c) => {
                c.run(out, err, common_options).await
            }
            | CliCommand::Versions(c) => {
                c.run(out, err, common_options).await
            }
            | CliCommand::Yank(c) => c.run(out, err, common_options).await,
            | CliCommand::Sharing(c) => c.run(out, err, common_options).await,
            | CliCommand::Accounts(c) => {
                c.run(out, err, common_options).await
            }
            | CliCommand::Git { command } => {
                command.run(out, err, common_options).await
            }
        }
    }
}
