//! shortfs entry point.

mod app;
mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use shortfs_itomx::Client;

#[derive(Parser, Debug)]
#[command(name = "shortfs", version, about = "Store files as chains of ito.mx short links")]
struct Cli {
    /// Log every record created or read.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (default: ~/.config/shortfs/config.toml).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload a file and print the URL of its header record.
    Upload { file: PathBuf, password: String },

    /// Rebuild the file stored in the chain containing `url`.
    Download {
        url: String,
        password: String,

        /// Directory the file is written into.
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Usage errors are not failures.
            let _ = e.print();
            return Ok(());
        }
    };

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = config::Config::load(cli.config.as_deref())?;
    let client = Client::with_options(&config.service_url, config.timeout())?;

    let rt = tokio::runtime::Runtime::new()?;
    match cli.command {
        Command::Upload { file, password } => {
            let url = rt.block_on(app::upload(&client, config.chain, &file, &password))?;
            println!("{url}");
        }
        Command::Download {
            url,
            password,
            output_dir,
        } => {
            let path = rt.block_on(app::download(
                &client,
                config.chain,
                &url,
                &password,
                &output_dir,
            ))?;
            tracing::info!(path = %path.display(), "download complete");
        }
    }

    Ok(())
}
