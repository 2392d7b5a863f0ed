use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Reference to an image asset: a filesystem path or an http(s) URL
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetHandle(String);

impl AssetHandle {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the asset has to be fetched over HTTP
    pub fn is_remote(&self) -> bool {
        self.0.starts_with("http://") || self.0.starts_with("https://")
    }
}

impl fmt::Display for AssetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A step as authored in a story file, before validation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepSpec {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub asset: Option<String>,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub highlights: Vec<String>,
}

/// One narrative unit selected by scroll progress
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    index: usize,
    title: String,
    description: String,
    asset: AssetHandle,
    alt: Option<String>,
    highlights: Vec<String>,
}

impl Step {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn asset(&self) -> &AssetHandle {
        &self.asset
    }

    /// Alternate text for the asset, falling back to the title
    pub fn alt(&self) -> &str {
        self.alt.as_deref().unwrap_or(&self.title)
    }

    pub fn highlights(&self) -> &[String] {
        &self.highlights
    }
}

#[derive(Debug, Deserialize)]
struct StoryFile {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    steps: Vec<StepSpec>,
}

/// The ordered, validated step list of one presentation
///
/// Cloning is cheap; the steps are shared and never change after construction.
#[derive(Debug, Clone)]
pub struct Story {
    title: Option<String>,
    steps: Arc<[Step]>,
}

impl Story {
    /// Validate authored steps. Fails on an empty list or a step without an asset.
    pub fn new(specs: Vec<StepSpec>) -> Result<Self> {
        if specs.is_empty() {
            return Err(Error::InvalidConfiguration(
                "a story needs at least one step".to_string(),
            ));
        }

        let steps = specs
            .into_iter()
            .enumerate()
            .map(|(index, authored)| {
                let asset = authored
                    .asset
                    .map(|a| a.trim().to_string())
                    .filter(|a| !a.is_empty())
                    .ok_or_else(|| {
                        Error::InvalidConfiguration(format!(
                            "step {} ({:?}) has no asset reference",
                            index + 1,
                            authored.title
                        ))
                    })?;
                Ok(Step {
                    index,
                    title: authored.title,
                    description: authored.description,
                    asset: AssetHandle::new(asset),
                    alt: authored.alt,
                    highlights: authored.highlights,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            title: None,
            steps: steps.into(),
        })
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Parse a story from TOML. Relative asset paths are kept as written.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: StoryFile =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        let story = Self::new(file.steps)?;
        Ok(match file.title {
            Some(title) => story.with_title(title),
            None => story,
        })
    }

    /// Load a story file; relative asset paths resolve against its directory
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let story = Self::from_toml_str(&content)?;
        match path.parent() {
            Some(base) => Ok(story.resolve_assets(base)),
            None => Ok(story),
        }
    }

    fn resolve_assets(self, base: &Path) -> Self {
        let steps: Vec<Step> = self
            .steps
            .iter()
            .cloned()
            .map(|mut step| {
                let relative = Path::new(step.asset.as_str());
                if !step.asset.is_remote() && relative.is_relative() {
                    step.asset = AssetHandle::new(base.join(relative).to_string_lossy());
                }
                step
            })
            .collect();
        Self {
            title: self.title,
            steps: steps.into(),
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Number of steps, always at least one
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn iter(&self) -> impl Iterator<Item = &Step> {
        self.steps.iter()
    }

    pub fn first(&self) -> &Step {
        &self.steps[0]
    }

    /// The assets the double buffer starts with: step 0, then step 1
    /// (or step 0 again when the story has a single step)
    pub fn initial_assets(&self) -> (&AssetHandle, &AssetHandle) {
        let first = self.steps[0].asset();
        let second = self.steps.get(1).map(Step::asset).unwrap_or(first);
        (first, second)
    }
}
