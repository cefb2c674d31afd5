use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use colored::Colorize;

use crate::args::CommonOptions;
use crate::{confirm_or_abort, emitln, ui, RunCommand};

#[derive(Clone, Debug, Parser)]
pub struct Rename {
    /// Repository name
    repo: String,
    /// New repository name
    new_name: String,
}

#[derive(Clone, Debug, Parser)]
pub struct Reset {
    /// Repository name
    repo: String,
}

#[derive(Clone, Debug, Parser)]
pub struct Destroy {
    /// Repository name
    repo: String,
}

#[derive(Clone, Debug, Parser)]
pub struct Rebuild {
    /// Repository name
    repo: String,
    /// Build this revision instead of the latest push
    #[arg(long, short)]
    revision: Option<String>,
}

#[async_trait]
impl RunCommand for Rename {
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
        fury::git::rename(&client, &self.repo, &self.new_name).await?;
        emitln!(
            out,
            "Renamed {} repository to {}",
            self.repo,
            self.new_name.green()
        );
        Ok(())
    }
}

#[async_trait]
impl RunCommand for Reset {
    async fn run<
        A: tokio::io::AsyncWrite + Send + Sync + Unpin,
        B: tokio::io::AsyncWrite + Send + Sync + Unpin,
    >(
        &self,
        out: &mut tokio::io::BufWriter<A>,
        _err: &mut tokio::io::BufWriter<B>,
        common_options: &CommonOptions,
    ) -> Result<()> {
        confirm_or_abort!(
            common_options,
            "Are you sure you want to remove the content of {}? Build history \
             and configuration are kept.",
            self.repo
        );
        let client = common_options.new_client()?;
        fury::git::destroy(&client, &self.repo, true).await?;
        emitln!(out, "Reset {} repository", self.repo);
        Ok(())
    }
}

#[async_trait]
impl RunCommand for Destroy {
    async fn run<
        A: tokio::io::AsyncWrite + Send + Sync + Unpin,
        B: tokio::io::AsyncWrite + Send + Sync + Unpin,
    >(
        &self,
        out: &mut tokio::io::BufWriter<A>,
        _err: &mut tokio::io::BufWriter<B>,
        common_options: &CommonOptions,
    ) -> Result<()> {
        confirm_or_abort!(
            common_options,
            "Are you sure you want to permanently delete {}?",
            self.repo.red()
        );
        let client = common_options.new_client()?;
        fury::git::destroy(&client, &self.repo, false).await?;
        emitln!(out, "Removed {} repository", self.repo);
        Ok(())
    }
}

#[async_trait]
impl RunCommand for Rebuild {
    async fn run<
        A: tokio::io::AsyncWrite + Send + Sync + Unpin,
        B: tokio::io::AsyncWrite + Send + Sync + Unpin,
    >(
        &self,
        out: &mut tokio::io::BufWriter<A>,
        err: &mut tokio::io::BufWriter<B>,
        common_options: &CommonOptions,
    ) -> Result<()> {
        let client = common_options.new_client()?;
        emitln!(err, "Building {} repository...", self.repo);
        tokio::io::AsyncWriteExt::flush(err).await?;

        let spinner = ui::spin_if_terminal("");
        let output =
            fury::git::rebuild(&client, &self.repo, self.revision.as_deref())
                .await;
        ui::stop_spinner(spinner);

        emitln!(out, "{}", output?.trim_end());
        Ok(())
    }
}
