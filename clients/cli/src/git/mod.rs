//! Git repository subcommands

mod config;
mod list;
mod repo;
mod stack;

use anyhow::Result;
use clap::Parser;

pub(crate) use self::config::Config;
pub(crate) use self::list::List;
pub(crate) use self::repo::{Destroy, Rebuild, Rename, Reset};
pub(crate) use self::stack::Stack;
use crate::args::CommonOptions;
use crate::RunCommand;

#[derive(Parser, Debug, Clone)]
pub enum GitCommand {
    /// List repositories
    #[command(visible_alias = "ls")]
    List(List),
    /// Rename a Git repository
    Rename(Rename),
    /// Remove the content of a Git repository, keeping its settings
    Reset(Reset),
    /// Delete a Git repository
    Destroy(Destroy),
    /// Run the builder on the repo
    Rebuild(Rebuild),
    /// Configure Git build. Lists the build environment without a
    /// subcommand
    Config(Config),
    /// Configure Git stack. Lists available stacks without a subcommand
    Stack(Stack),
}

impl GitCommand {
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
            | GitCommand::List(c) => c.run(out, err, common_options).await,
            | GitCommand::Rename(c) => c.run(out, err, common_options).await,
            | GitCommand::Reset(c) => c.run(out, err, common_options).await,
            | GitCommand::Destroy(c) => c.run(out, err, common_options).await,
            | GitCommand::Rebuild(c) => c.run(out, err, common_options).await,
            | GitCommand::Config(c) => c.run(out, err, common_options).await,
            | GitCommand::Stack(c) => c.run(out, err, common_options).await,
        }
    }
}
