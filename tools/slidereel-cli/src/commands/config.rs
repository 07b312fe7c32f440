//! Show or write the engine configuration.

use std::path::PathBuf;

use slidereel_common::config::EngineConfig;

pub fn run(config: EngineConfig, path: PathBuf, init: bool) -> anyhow::Result<()> {
    if init {
        if path.exists() {
            return Err(anyhow::anyhow!(
                "Config already exists at {}; edit it directly",
                path.display()
            ));
        }
        config
            .save_to(&path)
            .map_err(|e| anyhow::anyhow!("Failed to write {}: {e}", path.display()))?;
        println!("Wrote config: {}", path.display());
        return Ok(());
    }

    println!("Config file: {}", path.display());
    if !path.exists() {
        println!("  (not present, showing defaults)");
    }
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
