//! `hoard config` – show where the config lives and what is in effect.

use anyhow::Result;
use hoard_core::config::{self, HoardConfig};

pub fn run_config(cfg: &HoardConfig) -> Result<()> {
    println!("# {}", config::config_path()?.display());
    println!("# cache root: {}", cfg.cache_root().display());
    print!("{}", config::render(cfg)?);
    Ok(())
}
