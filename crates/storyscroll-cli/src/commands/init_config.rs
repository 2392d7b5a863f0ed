use anyhow::Result;

use storyscroll_core::AppConfig;

pub fn run(force: bool) -> Result<()> {
    let path = AppConfig::config_path();

    if path.exists() && !force {
        println!("Config already exists at {}", path.display());
        println!("Use --force to overwrite it.");
        return Ok(());
    }

    AppConfig::default().save()?;
    println!("Wrote config to {}", path.display());

    Ok(())
}
