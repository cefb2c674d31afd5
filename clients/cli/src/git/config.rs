use std::collections::BTreeMap;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use colored::Colorize;
use prettytable::row;

use crate::args::CommonOptions;
use crate::packages::plain_table;
use crate::{emitln, RunCommand};

#[derive(Clone, Debug, Parser)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Config {
    #[command(subcommand)]
    command: Option<ConfigCommand>,
    /// Repository name
    repo: Option<String>,
}

#[derive(Clone, Debug, Subcommand)]
enum ConfigCommand {
    /// Get Git build environment key
    Get {
        /// Repository name
        repo: String,
        key: String,
    },
    /// Set Git build environment keys
    Set {
        /// Repository name
        repo: String,
        /// One or more KEY=VALUE pairs
        #[arg(required = true, value_name = "KEY=VALUE")]
        pairs: Vec<String>,
    },
}

fn parse_pairs(pairs: &[String]) -> Result<BTreeMap<String, String>> {
    pairs
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .ok_or_else(|| anyhow!("Argument has no value: {pair}"))
        })
        .collect()
}

#[async_trait]
impl RunCommand for Config {
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
            | (Some(ConfigCommand::Get { repo, key }), _) => {
                let client = common_options.new_client()?;
                let vars = fury::git::config(&client, repo).await?;
                if let Some(pair) = vars.iter().find(|p| &p.key == key) {
                    emitln!(out, "{}", pair.value);
                }
                Ok(())
            }
            | (Some(ConfigCommand::Set { repo, pairs }), _) => {
                let vars = parse_pairs(pairs)?;
                let client = common_options.new_client()?;
                fury::git::config_set(&client, repo, vars).await?;
                emitln!(out, "Updated {} repository config", repo);
                Ok(())
            }
            | (None, Some(repo)) => {
                let client = common_options.new_client()?;
                let vars = fury::git::config(&client, repo).await?;

                let mut table = plain_table();
                for pair in &vars {
                    table.add_row(row![format!("{}:", pair.key), pair.value]);
                }
                emitln!(out, "\n*** {} ***\n", "GIT CONFIG".bold());
                emitln!(out, "{}", table);
                Ok(())
            }
            | (None, None) => bail!("Please specify a repository"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::{Cli, CliCommand};
    use crate::git::GitCommand;

    fn config(args: &[&str]) -> Config {
        let mut argv = vec!["fury", "git", "config"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            | CliCommand::Git {
                command: GitCommand::Config(c),
            } => c,
            | other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn config_lists_or_dispatches() {
        let c = config(&["app"]);
        assert_eq!(Some("app".to_owned()), c.repo);
        assert!(c.command.is_none());

        let c = config(&["set", "app", "A=1", "B=x=y"]);
        match c.command {
            | Some(ConfigCommand::Set { repo, pairs }) => {
                assert_eq!("app", repo);
                let vars = parse_pairs(&pairs).unwrap();
                assert_eq!("1", vars["A"]);
                assert_eq!("x=y", vars["B"]);
            }
            | other => panic!("unexpected: {other:?}"),
        }

        let c = config(&["get", "app", "A"]);
        assert!(matches!(c.command, Some(ConfigCommand::Get { .. })));
    }

    #[test]
    fn pair_without_value_is_rejected() {
        let err = parse_pairs(&["NOPE".to_owned()]).unwrap_err();
        assert_eq!("Argument has no value: NOPE", err.to_string());
    }
}
