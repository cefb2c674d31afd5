use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use colored::Colorize;
use fury::{Collected, Paginator};
use prettytable::row;
use tracing::log::warn;

use crate::args::CommonOptions;
use crate::packages::plain_table;
use crate::ui::SpinnerProgress;
use crate::{emitln, RunCommand};

#[derive(Clone, Debug, Parser)]
pub struct Sharing {
    #[command(subcommand)]
    command: Option<SharingCommand>,
}

#[derive(Clone, Debug, Subcommand)]
pub enum SharingCommand {
    /// Add a collaborator
    Add {
        /// Usernames or emails to invite
        names: Vec<String>,
        /// Collaborator role
        #[arg(long)]
        role: Option<String>,
    },
    /// Remove a collaborator
    Remove {
        /// Usernames or emails to remove
        names: Vec<String>,
    },
}

#[derive(Clone, Debug, Parser)]
pub struct Accounts {}

#[async_trait]
impl RunCommand for Sharing {
    async fn run<
        A: tokio::io::AsyncWrite + Send + Sync + Unpin,
        B: tokio::io::AsyncWrite + Send + Sync + Unpin,
    >(
        &self,
        out: &mut tokio::io::BufWriter<A>,
        err: &mut tokio::io::BufWriter<B>,
        common_options: &CommonOptions,
    ) -> Result<()> {
        match self.command {
            | None => list_members(out, common_options).await,
            | Some(SharingCommand::Add {
                ref names,
                ref role,
            }) => {
                if names.is_empty() {
                    bail!("Please specify at least one collaborator");
                }
                let client = common_options.new_client()?;
                let mut failed = 0;
                for name in names {
                    match fury::sharing::add_collaborator(
                        &client,
                        name,
                        role.as_deref(),
                    )
                    .await
                    {
                        | Ok(()) => {
                            emitln!(out, "Invited {:?} as a collaborator", name)
                        }
                        | Err(e) => {
                            failed += 1;
                            warn!("Problem adding {name:?}: {e}");
                            emitln!(
                                err,
                                "Problem adding {:?}: {}",
                                name,
                                e.short_error()
                            );
                        }
                    }
                }
                summarize(failed, names.len(), "invite")
            }
            | Some(SharingCommand::Remove { ref names }) => {
                if names.is_empty() {
                    bail!("Please specify at least one collaborator");
                }
                let client = common_options.new_client()?;
                let mut failed = 0;
                for name in names {
                    match fury::sharing::remove_collaborator(&client, name).await
                    {
                        | Ok(()) => {
                            emitln!(out, "Removed {:?} as a collaborator", name)
                        }
                        | Err(e) => {
                            failed += 1;
                            warn!("Problem removing {name:?}: {e}");
                            emitln!(
                                err,
                                "Problem removing {:?}: {}",
                                name,
                                e.short_error()
                            );
                        }
                    }
                }
                summarize(failed, names.len(), "remove")
            }
        }
    }
}

/// Multi-target commands keep going past failures, then fail as a whole.
fn summarize(failed: usize, total: usize, verb: &str) -> Result<()> {
    if failed == 0 {
        return Ok(());
    }
    Err(anyhow!("Failed to {verb} {failed} of {total} collaborators"))
}

async fn list_members<A>(
    out: &mut tokio::io::BufWriter<A>,
    common_options: &CommonOptions,
) -> Result<()>
where
    A: tokio::io::AsyncWrite + Send + Sync + Unpin,
{
    let client = common_options.new_client()?;
    let mut progress = SpinnerProgress::new("Fetching ...");

    let Collected { items, result, .. } =
        Paginator::new(common_options.cancel.clone())
            .progress(&mut progress)
            .collect(|page| {
                let client = &client;
                async move { fury::sharing::members(client, &page).await }
            })
            .await;

    if items.is_empty() {
        emitln!(out, "No members found for this account");
        return Ok(result?);
    }

    let mut table = plain_table();
    table.set_titles(row!["name", "role"]);
    for m in &items {
        table.add_row(row![m.name, m.role]);
    }
    emitln!(out, "*** {} ***", "Collaborators".bold());
    emitln!(out, "{}", table);
    Ok(result?)
}

#[async_trait]
impl RunCommand for Accounts {
    async fn run<
        A: tokio::io::AsyncWrite + Send + Sync + Unpin,
        B: tokio::io::AsyncWrite + Send + Sync + Unpin,
    >(
        &self,
        out: &mut tokio::io::BufWriter<A>,
        _err: &mut tokio::io::BufWriter<B>,
        common_options: &CommonOptions,
    ) -> Result<()> {
        let client = common_options.new_client()?;
        let mut progress = SpinnerProgress::new("Fetching ...");

        let Collected { items, result, .. } =
            Paginator::new(common_options.cancel.clone())
                .progress(&mut progress)
                .collect(|page| {
                    let client = &client;
                    async move {
                        fury::sharing::collaborations(client, &page).await
                    }
                })
                .await;

        if items.is_empty() {
            emitln!(out, "No collaborations found for this account");
            return Ok(result?);
        }

        let mut table = plain_table();
        table.set_titles(row!["name", "kind", "role"]);
        for m in &items {
            table.add_row(row![m.name, m.kind, m.role]);
        }
        emitln!(out, "{}", table);
        Ok(result?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::{Cli, CliCommand};

    fn sharing(args: &[&str]) -> Option<SharingCommand> {
        let mut argv = vec!["fury", "sharing"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            | CliCommand::Sharing(s) => s.command,
            | other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn sharing_without_subcommand_lists_members() {
        assert!(sharing(&[]).is_none());
    }

    #[test]
    fn sharing_add_takes_many_names_and_a_role() {
        match sharing(&["add", "a@example.com", "bob", "--role", "push"]) {
            | Some(SharingCommand::Add { names, role }) => {
                assert_eq!(vec!["a@example.com", "bob"], names);
                assert_eq!(Some("push".to_owned()), role);
            }
            | other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn partial_failures_are_reported() {
        assert!(summarize(0, 3, "invite").is_ok());
        let err = summarize(1, 3, "remove").unwrap_err();
        assert_eq!("Failed to remove 1 of 3 collaborators", err.to_string());
    }
}
