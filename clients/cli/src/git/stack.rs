use anyhow::{bail, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};

use crate::args::CommonOptions;
use crate::{emitln, ui, RunCommand};

#[derive(Clone, Debug, Parser)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Stack {
    #[command(subcommand)]
    command: Option<StackCommand>,
    /// Repository name
    repo: Option<String>,
}

#[derive(Clone, Debug, Subcommand)]
enum StackCommand {
    /// Set Git stack for repo
    Set {
        /// Repository name
        repo: String,
        stack: String,
    },
}

#[async_trait]
impl RunCommand for Stack {
    async fn run<
        A: tokio::io::AsyncWrite + Send + Sync + Unpin,
        B: tokio::io::AsyncWrite + Send + Sync + Unpin,
    >(
        &self,
        out: &mut tokio::io::BufWriter<A>,
        _err: &mut tokio::io::BufWriter<B>,
        common_options: &CommonOptions,
    ) -> Result<()> {
        match (&self.command, &self.repo) {
            | (Some(StackCommand::Set { repo, stack }), _) => {
                let client = common_options.new_client()?;
                fury::git::stack_set(&client, repo, stack).await?;
                emitln!(out, "Updated {} repository build stack", repo);
                Ok(())
            }
            | (None, Some(repo)) => {
                let client = common_options.new_client()?;
                let repo = fury::git::info(&client, repo).await?;
                let stacks = fury::git::stacks(&client).await?;

                emitln!(out, "*** [{}] GIT BUILD STACKS ***", repo.name);
                for s in &stacks {
                    emitln!(
                        out,
                        "{} {}",
                        ui::marker(s.name == repo.build_stack.name),
                        s.name
                    );
                }
                Ok(())
            }
            | (None, None) => bail!("Command requires a repository argument"),
        }
    }
}
