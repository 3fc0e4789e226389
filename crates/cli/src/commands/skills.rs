//! `loopsmith skills` — List loaded skills.

use anyhow::{Context, Result};
use loopsmith_config::AppConfig;
use loopsmith_skills::SkillLoader;

pub async fn run() -> Result<()> {
    let config = AppConfig::load().context("Failed to load config")?;

    let mut loader = SkillLoader::new(&config.skills_dir);
    loader.scan();

    if loader.is_empty() {
        println!("No skills found in {}", config.skills_dir);
        return Ok(());
    }

    println!("Loaded skills ({}):", loader.len());
    for name in loader.list() {
        if let Some(skill) = loader.get(name) {
            println!("  {:<16} {}", skill.name, skill.description);
        }
    }

    Ok(())
}
