use std::{path::Path, process};

use anyhow::Result;

mod blocks;
mod clap;
mod color;
mod config;
mod mosaic;

use config::Settings;

fn main() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    clap::get_matches();

    if let Err(err) = run(Path::new(clap::CONFIG_FILE)) {
        eprintln!("{err:#}");
        process::exit(1);
    }
}

fn run(config_path: &Path) -> Result<()> {
    let settings = Settings::load(config_path)?;
    tracing::debug!(?settings, "configuration loaded");
    let output = mosaic::mosaic(&settings)?;
    println!("All done. Mosaic written to {}", output.display());
    Ok(())
}
