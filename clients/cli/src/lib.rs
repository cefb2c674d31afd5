mod args;
mod auth;
mod client;
mod command;
mod confirm;
mod credentials;
mod git;
mod packages;
mod sharing;
mod ui;
mod whoami;

use anyhow::Result;
use colored::Colorize;
pub use command::RunCommand;
pub(crate) use confirm::confirm_or_abort;
use tokio::io::AsyncWriteExt;
use tracing::log::info;

use self::args::CliCommand;
pub use self::args::Cli;
pub use self::credentials::{CredentialStore, Credentials, FileCredentialStore};

macro_rules! emitln {
    ($dst: expr) => {
        {
            tokio::io::AsyncWriteExt::write_all($dst, b"\n").await?
        }
    };
    ($dst: expr, $fmt: expr) => {
        {
            use std::io::Write;
            let mut buf = Vec::<u8>::new();
            writeln!(buf, $fmt)?;
            tokio::io::AsyncWriteExt::write_all($dst, &buf).await?
        }
    };
    ($dst: expr, $fmt: expr, $($arg: tt)*) => {
        {
            use std::io::Write;
            let mut buf = Vec::<u8>::new();
            writeln!(buf, $fmt, $( $arg )*)?;
            tokio::io::AsyncWriteExt::write_all($dst, &buf).await?
        }
    };
}

pub(crate) use emitln;

pub async fn run_cli(args: Cli) -> Result<()> {
    info!("Endpoint: {}", args.common.endpoint());
    let stdout = tokio::io::stdout();
    let mut stdout = tokio::io::BufWriter::new(stdout);

    let stderr = tokio::io::stderr();
    let mut stderr = tokio::io::BufWriter::new(stderr);

    // Ctrl-C stops pagination and login polling at their next checkpoint.
    let cancel = args.common.cancel.clone();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, cancelling");
            cancel.cancel();
        }
    });

    let res = args
        .command
        .run(&mut stdout, &mut stderr, &args.common)
        .await;
    ctrl_c.abort();

    if let Err(ref e) = res {
        if needs_login_hint(&args.command, e) {
            emitln!(
                &mut stderr,
                "{}",
                "Your credentials were rejected by the server. Run `fury \
                 login` to authenticate."
                    .yellow()
            );
        }
    }
    stdout.flush().await?;
    stderr.flush().await?;
    res
}

/// A rejected login already tells the user what went wrong.
fn needs_login_hint(command: &CliCommand, e: &anyhow::Error) -> bool {
    !matches!(command, CliCommand::Login(_)) && is_unauthorized(e)
}

fn is_unauthorized(e: &anyhow::Error) -> bool {
    e.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<fury::Error>().map(fury::Error::kind),
            Some(fury::ErrorKind::Unauthorized)
        )
    })
}
