mod server;

use std::path::PathBuf;

use anyhow::{Context, Result, ensure};
use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "vitrine-host")]
#[command(about = "Serves a model directory over plain HTTP", long_about = None)]
struct Cli {
    /// Directory to serve
    root: PathBuf,

    /// Port to listen on
    #[arg(long, default_value_t = 3001)]
    port: u16,

    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    bind: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let root = cli
        .root
        .canonicalize()
        .with_context(|| format!("cannot open {}", cli.root.display()))?;
    ensure!(root.is_dir(), "{} is not a directory", root.display());

    let handle = server::start(&cli.bind, cli.port, root.clone())
        .with_context(|| format!("failed to bind {}:{}", cli.bind, cli.port))?;
    log::info!("serving {} on http://{}", root.display(), handle.addr);
    handle.join();
    Ok(())
}
