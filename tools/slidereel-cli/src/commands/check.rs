//! Check encoder availability.

use slidereel_common::config::EngineConfig;
use slidereel_render_engine::probe::tool_available;

pub async fn run(config: EngineConfig) -> anyhow::Result<()> {
    println!("Slidereel System Check");
    println!("{}", "=".repeat(50));

    let mut all_ok = true;
    for (name, path) in [
        ("ffmpeg", &config.tools.ffmpeg),
        ("ffprobe", &config.tools.ffprobe),
    ] {
        if tool_available(path).await {
            println!("[OK] {name}: {}", path.display());
        } else {
            println!("[MISSING] {name}: {} (install ffmpeg or set tools.{name} in config)", path.display());
            all_ok = false;
        }
    }

    println!();
    if all_ok {
        println!("All required tools are available. Slidereel is ready.");
        Ok(())
    } else {
        Err(anyhow::anyhow!("Some required tools are missing"))
    }
}
