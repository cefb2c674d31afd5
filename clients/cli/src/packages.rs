use anyhow::{bail, Result};
use async_trait::async_trait;
use clap::Parser;
use colored::Colorize;
use fury::{Collected, Paginator};
use prettytable::{format, row, Table};

use crate::args::CommonOptions;
use crate::ui::{time_with_ago, SpinnerProgress};
use crate::{emitln, RunCommand};

#[derive(Clone, Debug, Parser)]
pub struct List {}

#[derive(Clone, Debug, Parser)]
pub struct Versions {
    /// Package name
    package: String,
}

#[derive(Clone, Debug, Parser)]
pub struct Yank {
    /// Package name
    package: String,
    /// Version to remove
    version: Option<String>,
    /// Version to remove, takes precedence over the positional argument
    #[arg(long = "version", value_name = "VERSION")]
    version_flag: Option<String>,
}

pub(crate) fn plain_table() -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_CLEAN);
    table
}

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
                    async move { fury::packages::list(client, &page).await }
                })
                .await;

        if items.is_empty() {
            emitln!(out, "No packages found in this account");
            return Ok(result?);
        }

        let mut table = plain_table();
        table.set_titles(row!["name", "kind", "version", "privacy"]);
        for p in &items {
            table.add_row(row![p.name, p.kind, p.display_version(), p.privacy()]);
        }

        emitln!(out, "\n*** {} ***\n", "PACKAGES".bold());
        emitln!(out, "{}", table);
        Ok(result?)
    }
}

#[async_trait]
impl RunCommand for Versions {
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
                    let package = self.package.as_str();
                    async move {
                        fury::packages::versions(client, package, &page).await
                    }
                })
                .await;

        let now = chrono::Utc::now();
        let mut table = plain_table();
        table.set_titles(row!["version", "uploaded_by", "uploaded_at", "filename"]);
        for v in &items {
            let uploaded_at =
                v.created_at.map(|t| time_with_ago(t, now)).unwrap_or_default();
            table.add_row(row![
                v.version,
                v.display_created_by(),
                uploaded_at,
                v.filename
            ]);
        }

        emitln!(out, "\n*** {} versions ***\n", self.package.bold());
        emitln!(out, "{}", table);
        Ok(result?)
    }
}

impl Yank {
    fn target_version(&self) -> Result<&str> {
        match (self.version_flag.as_deref(), self.version.as_deref()) {
            | (Some(v), _) | (None, Some(v)) if !v.is_empty() => Ok(v),
            | _ => bail!("No version specified"),
        }
    }
}

#[async_trait]
impl RunCommand for Yank {
    async fn run<
        A: tokio::io::AsyncWrite + Send + Sync + Unpin,
        B: tokio::io::AsyncWrite + Send + Sync + Unpin,
    >(
        &self,
        out: &mut tokio::io::BufWriter<A>,
        _err: &mut tokio::io::BufWriter<B>,
        common_options: &CommonOptions,
    ) -> Result<()> {
        let version = self.target_version()?;
        let client = common_options.new_client()?;

        fury::packages::yank(&client, &self.package, version).await?;
        emitln!(
            out,
            "Removed package {:?} version {:?}",
            self.package,
            version
        );
        Ok(())
    }
}
