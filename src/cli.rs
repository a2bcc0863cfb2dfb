use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "vitrine")]
#[command(about = "A native glTF model browser", long_about = None)]
pub struct Cli {
    /// Viewer configuration file
    #[arg(default_value = "vitrine.toml")]
    pub config: PathBuf,
}
