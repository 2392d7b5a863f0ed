use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use image::DynamicImage;

use crate::asset::AssetLoader;
use crate::story::{AssetHandle, StepSpec, Story};
use crate::{Error, Result};

pub(crate) fn pixel() -> Arc<DynamicImage> {
    Arc::new(DynamicImage::new_rgba8(1, 1))
}

/// Story with one step per asset, titled "Step N"
pub(crate) fn story(assets: &[&str]) -> Story {
    let specs = assets
        .iter()
        .enumerate()
        .map(|(i, asset)| StepSpec {
            title: format!("Step {}", i + 1),
            description: format!("Description {}", i + 1),
            asset: Some(asset.to_string()),
            ..Default::default()
        })
        .collect();
    Story::new(specs).unwrap()
}

/// Loader whose behavior per asset is set up by the test
#[derive(Default)]
pub(crate) struct ScriptedLoader {
    cached: HashSet<String>,
    failing: HashSet<String>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedLoader {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn cached(mut self, asset: &str) -> Self {
        self.cached.insert(asset.to_string());
        self
    }

    pub(crate) fn failing(mut self, asset: &str) -> Self {
        self.failing.insert(asset.to_string());
        self
    }

    pub(crate) fn delayed(mut self, asset: &str, delay: Duration) -> Self {
        self.delays.insert(asset.to_string(), delay);
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AssetLoader for ScriptedLoader {
    fn cached(&self, asset: &AssetHandle) -> Option<Arc<DynamicImage>> {
        self.cached.contains(asset.as_str()).then(pixel)
    }

    async fn load(&self, asset: &AssetHandle) -> Result<Arc<DynamicImage>> {
        self.calls.lock().unwrap().push(asset.to_string());
        if let Some(delay) = self.delays.get(asset.as_str()) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.contains(asset.as_str()) {
            return Err(Error::AssetLoad {
                asset: asset.to_string(),
                reason: "scripted failure".to_string(),
            });
        }
        Ok(pixel())
    }
}
