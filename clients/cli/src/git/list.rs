use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use colored::Colorize;
use fury::{Collected, Paginator};
use prettytable::row;

use crate::args::CommonOptions;
use crate::packages::plain_table;
use crate::ui::SpinnerProgress;
use crate::{emitln, RunCommand};

#[derive(Clone, Debug, Parser)]
pub struct List {}

#[async_trait]
impl RunCommand for List {
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
                    async move { fury::git::list(client, &page).await }
                })
                .await;

        if items.is_empty() {
            emitln!(out, "No repositories found");
            return Ok(result?);
        }

        let mut table = plain_table();
        table.set_titles(row!["name", "stack"]);
        for repo in &items {
            table.add_row(row![repo.name, repo.build_stack.name]);
        }
        emitln!(out, "\n*** {} ***\n", "GIT REPOSITORIES".bold());
        emitln!(out, "{}", table);
        Ok(result?)
    }
}
