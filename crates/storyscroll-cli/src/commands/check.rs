use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use storyscroll_core::{AppConfig, AssetHandle, AssetLoader, StandardAssetLoader, Story};

/// Outcome of loading one asset: pixel size or the failure reason
type AssetCheck = (AssetHandle, std::result::Result<(u32, u32), String>);

pub async fn run(config: &AppConfig, story_path: &Path) -> Result<()> {
    let story = Story::load(story_path)
        .with_context(|| format!("Failed to load story {}", story_path.display()))?;
    println!(
        "{}: {} steps",
        story.title().unwrap_or("(untitled)"),
        story.len()
    );

    let loader = StandardAssetLoader::new(config)?;
    let results = check_assets(&loader, &story, config.assets.load_timeout()).await;

    let mut failed = 0;
    for (asset, result) in &results {
        match result {
            Ok((width, height)) => println!("  ✓ {} ({}x{})", asset, width, height),
            Err(reason) => {
                failed += 1;
                println!("  ✗ {}: {}", asset, reason);
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} assets failed to load", failed, results.len());
    }
    println!("\nAll {} assets loaded.", results.len());
    Ok(())
}

/// Load every distinct asset in story order
async fn check_assets(loader: &dyn AssetLoader, story: &Story, timeout: Duration) -> Vec<AssetCheck> {
    let mut seen = HashSet::new();
    let mut results = Vec::new();

    for step in story.iter() {
        let asset = step.asset();
        if !seen.insert(asset.clone()) {
            continue;
        }
        let result = match tokio::time::timeout(timeout, loader.load(asset)).await {
            Ok(Ok(image)) => Ok((image.width(), image.height())),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!("timed out after {:?}", timeout)),
        };
        if let Err(reason) = &result {
            tracing::warn!(%asset, "asset check failed: {}", reason);
        }
        results.push((asset.clone(), result));
    }

    results
}
