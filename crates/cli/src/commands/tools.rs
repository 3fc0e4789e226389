//! `loopsmith tools` — List registered tools.

use anyhow::{Context, Result};
use loopsmith_config::AppConfig;
use loopsmith_memory::MemoryStore;
use std::path::PathBuf;

pub async fn run() -> Result<()> {
    let config = AppConfig::load().context("Failed to load config")?;
    let workspace = PathBuf::from(&config.workspace.root_path);
    let registry = loopsmith_tools::default_registry(&workspace, MemoryStore::new());

    let mut definitions = registry.definitions();
    definitions.sort_by(|a, b| a.name.cmp(&b.name));

    println!("Registered tools ({}):", definitions.len());
    for def in definitions {
        println!("  {:<14} {}", def.name, def.description);
    }

    Ok(())
}
