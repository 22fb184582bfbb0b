use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use keystok::{ClientConfig, CredentialSession};

#[derive(Parser)]
#[command(name = "keystok")]
#[command(about = "Fetch secrets from the Keystok service")]
struct Cli {
    /// Bootstrap token (falls back to the KEYSTOK_ACCESS_TOKEN environment variable)
    #[arg(short = 'a', long)]
    access_token: Option<String>,

    /// Cache directory (KEYSTOK_CACHE_DIR wins over this; defaults to ~/.keystok)
    #[arg(short = 'c', long)]
    cache_dir: Option<PathBuf>,

    /// Disable the on-disk access-token cache
    #[arg(long)]
    no_cache: bool,

    /// Verbose listing output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List secret ids
    Ls,
    /// Fetch and decrypt one secret
    Get { key_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let token = cli
        .access_token
        .or_else(|| std::env::var("KEYSTOK_ACCESS_TOKEN").ok())
        .context("No bootstrap token given (use -a or set KEYSTOK_ACCESS_TOKEN)")?;

    let mut config = ClientConfig::default();
    config.cache_dir = std::env::var_os("KEYSTOK_CACHE_DIR")
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .or(cli.cache_dir);
    config.use_cache = !cli.no_cache;

    let session = CredentialSession::new(&token, config)?;

    match cli.command {
        Command::Ls => {
            let secrets = session.list_secrets().await?;
            if cli.verbose {
                println!("{:<30} {}", "KEY ID", "DESCRIPTION");
                println!("{:-<30} {:-<42}", "", "");
                for (id, description) in &secrets {
                    println!("{id:<30} {description}");
                }
            } else {
                for id in secrets.keys() {
                    println!("{id}");
                }
            }
        }
        Command::Get { key_id } => {
            let value = session.get_secret(&key_id).await?;
            println!("{value}");
        }
    }

    Ok(())
}
