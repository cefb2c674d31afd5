use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use colored::Colorize;

use crate::args::CommonOptions;
use crate::{emitln, RunCommand};

#[derive(Parser, Debug, Clone)]
pub struct WhoAmI {}

#[async_trait]
impl RunCommand for WhoAmI {
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
        let account = fury::accounts::whoami(&client).await?;
        emitln!(
            out,
            "You are logged in as {}",
            format!("{:?}", account.name).green()
        );
        Ok(())
    }
}
