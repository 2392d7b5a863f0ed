pub mod asset;
pub mod config;
pub mod crossfade;
pub mod engine;
pub mod error;
pub mod layout;
pub mod mapper;
pub mod motion;
pub mod region;
pub mod reveal;
pub mod story;

#[cfg(test)]
pub(crate) mod test_support;

pub use asset::{AssetLoader, StandardAssetLoader};
pub use config::{AppConfig, EasingType, MotionConfig};
pub use engine::{EngineEvent, HostEvent, ScrollEngine};
pub use error::{Error, Result};
pub use layout::{Measurements, Viewport};
pub use story::{AssetHandle, Step, StepSpec, Story};
