//! Asynchronous asset loading with explicit Loaded / Failed outcomes
//!
//! Loads run as tokio tasks and report back over an unbounded channel that the
//! crossfade buffer drains on the host loop. Each load has a ticket; canceling
//! a ticket aborts its task and discards any completion that still arrives.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use image::DynamicImage;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use url::Url;

use crate::config::AppConfig;
use crate::story::AssetHandle;
use crate::{Error, Result};

/// Source of decoded images for asset handles
#[async_trait]
pub trait AssetLoader: Send + Sync + 'static {
    /// Synchronous cache lookup; a hit lets a transition start without waiting
    fn cached(&self, _asset: &AssetHandle) -> Option<Arc<DynamicImage>> {
        None
    }

    /// Load and decode the asset
    async fn load(&self, asset: &AssetHandle) -> Result<Arc<DynamicImage>>;
}

/// Result of one asset load
#[derive(Debug, Clone)]
pub enum LoadOutcome {
    Loaded(Arc<DynamicImage>),
    Failed(String),
}

impl LoadOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadOutcome::Loaded(_))
    }
}

/// Identifier of one in-flight load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadTicket(u64);

impl fmt::Display for LoadTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "load#{}", self.0)
    }
}

/// Completion message sent by a load task
#[derive(Debug)]
pub struct AssetCompletion {
    pub ticket: LoadTicket,
    pub asset: AssetHandle,
    pub outcome: LoadOutcome,
}

/// What a load request turned into
#[derive(Debug)]
pub enum LoadRequest {
    /// Answered synchronously (cache hit, or a fail-fast failure)
    Ready(LoadOutcome),
    /// Running in the background; its completion will carry this ticket
    Pending(LoadTicket),
}

pub struct AssetPipeline {
    loader: Arc<dyn AssetLoader>,
    timeout: Duration,
    tx: mpsc::UnboundedSender<AssetCompletion>,
    rx: mpsc::UnboundedReceiver<AssetCompletion>,
    in_flight: HashMap<LoadTicket, JoinHandle<()>>,
    next_ticket: u64,
    closed: bool,
}

impl AssetPipeline {
    pub fn new(loader: Arc<dyn AssetLoader>, timeout: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            loader,
            timeout,
            tx,
            rx,
            in_flight: HashMap::new(),
            next_ticket: 0,
            closed: false,
        }
    }

    /// Start loading `asset`
    ///
    /// Cache hits are answered synchronously. Without a tokio runtime, or after
    /// shutdown, the request fails immediately instead of waiting forever.
    pub fn request(&mut self, asset: &AssetHandle) -> LoadRequest {
        if self.closed {
            return LoadRequest::Ready(LoadOutcome::Failed(
                "asset pipeline is shut down".to_string(),
            ));
        }

        if let Some(image) = self.loader.cached(asset) {
            tracing::trace!(%asset, "asset cache hit");
            return LoadRequest::Ready(LoadOutcome::Loaded(image));
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                tracing::warn!(%asset, "no async runtime to load asset on");
                return LoadRequest::Ready(LoadOutcome::Failed(
                    "no async runtime available".to_string(),
                ));
            }
        };

        self.next_ticket += 1;
        let ticket = LoadTicket(self.next_ticket);
        let loader = Arc::clone(&self.loader);
        let tx = self.tx.clone();
        let timeout = self.timeout;
        let asset = asset.clone();

        let task = runtime.spawn(async move {
            let outcome = match tokio::time::timeout(timeout, loader.load(&asset)).await {
                Ok(Ok(image)) => LoadOutcome::Loaded(image),
                Ok(Err(e)) => LoadOutcome::Failed(e.to_string()),
                Err(_) => LoadOutcome::Failed(format!("timed out after {}ms", timeout.as_millis())),
            };
            // The receiver is gone once the pipeline shuts down
            let _ = tx.send(AssetCompletion {
                ticket,
                asset,
                outcome,
            });
        });

        tracing::debug!(%ticket, "asset load started");
        self.in_flight.insert(ticket, task);
        LoadRequest::Pending(ticket)
    }

    /// Abort an in-flight load. Returns false if it already completed or was canceled.
    pub fn cancel(&mut self, ticket: LoadTicket) -> bool {
        match self.in_flight.remove(&ticket) {
            Some(task) => {
                task.abort();
                tracing::debug!(%ticket, "asset load canceled");
                true
            }
            None => false,
        }
    }

    /// Next completion of a live ticket, without blocking
    pub fn try_next(&mut self) -> Option<AssetCompletion> {
        loop {
            let completion = self.rx.try_recv().ok()?;
            if self.in_flight.remove(&completion.ticket).is_some() {
                return Some(completion);
            }
            tracing::trace!(ticket = %completion.ticket, "dropping completion of canceled load");
        }
    }

    /// Wait for the next completion of a live ticket
    ///
    /// Returns `None` immediately when nothing is in flight.
    pub async fn next(&mut self) -> Option<AssetCompletion> {
        while !self.in_flight.is_empty() {
            let completion = self.rx.recv().await?;
            if self.in_flight.remove(&completion.ticket).is_some() {
                return Some(completion);
            }
        }
        None
    }

    pub fn is_pending(&self, ticket: LoadTicket) -> bool {
        self.in_flight.contains_key(&ticket)
    }

    pub fn pending(&self) -> Vec<LoadTicket> {
        let mut tickets: Vec<LoadTicket> = self.in_flight.keys().copied().collect();
        tickets.sort();
        tickets
    }

    /// Abort every load and stop accepting completions
    pub fn shutdown(&mut self) {
        for (_, task) in self.in_flight.drain() {
            task.abort();
        }
        self.rx.close();
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Drop for AssetPipeline {
    fn drop(&mut self) {
        for (_, task) in self.in_flight.drain() {
            task.abort();
        }
    }
}

/// Local disk cache for remote assets
pub struct AssetDiskCache {
    cache_dir: PathBuf,
}

impl AssetDiskCache {
    pub fn new(cache_dir: &Path) -> std::io::Result<Self> {
        std::fs::create_dir_all(cache_dir)?;
        Ok(Self {
            cache_dir: cache_dir.to_path_buf(),
        })
    }

    /// Generate a cache filename from URL
    fn url_to_filename(url: &str) -> String {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        url.hash(&mut hasher);
        let hash = hasher.finish();

        // Extract extension from URL if possible
        let ext = url
            .rsplit('.')
            .next()
            .and_then(|e| {
                let e = e.split('?').next().unwrap_or(e).to_lowercase();
                if ["jpg", "jpeg", "png", "gif", "webp"].contains(&e.as_str()) {
                    Some(e)
                } else {
                    None
                }
            })
            .unwrap_or_else(|| "bin".to_string());

        format!("{:016x}.{}", hash, ext)
    }

    pub fn cache_path(&self, url: &str) -> PathBuf {
        self.cache_dir.join(Self::url_to_filename(url))
    }

    pub async fn load(&self, url: &str) -> Option<Vec<u8>> {
        tokio::fs::read(self.cache_path(url)).await.ok()
    }

    pub async fn save(&self, url: &str, data: &[u8]) -> std::io::Result<()> {
        tokio::fs::write(self.cache_path(url), data).await
    }
}

/// Loads local files and http(s) URLs, with a memory cache and an optional disk cache
pub struct StandardAssetLoader {
    client: reqwest::Client,
    disk_cache: Option<AssetDiskCache>,
    memory: Mutex<HashMap<AssetHandle, Arc<DynamicImage>>>,
}

impl StandardAssetLoader {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.assets.request_timeout_secs))
            .build()?;

        let disk_cache = if config.assets.disk_cache {
            match AssetDiskCache::new(&config.asset_cache_dir()) {
                Ok(cache) => Some(cache),
                Err(e) => {
                    tracing::warn!("Asset disk cache disabled: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Ok(Self {
            client,
            disk_cache,
            memory: Mutex::new(HashMap::new()),
        })
    }

    async fn fetch_bytes(&self, asset: &AssetHandle) -> Result<Vec<u8>> {
        if !asset.is_remote() {
            return Ok(tokio::fs::read(asset.as_str()).await?);
        }

        if let Some(cache) = &self.disk_cache {
            if let Some(bytes) = cache.load(asset.as_str()).await {
                tracing::debug!(%asset, "asset served from disk cache");
                return Ok(bytes);
            }
        }

        let url = Url::parse(asset.as_str())?;
        let body: Bytes = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        if let Some(cache) = &self.disk_cache {
            if let Err(e) = cache.save(asset.as_str(), &body).await {
                tracing::warn!(%asset, "Failed to write asset cache: {}", e);
            }
        }

        Ok(body.to_vec())
    }
}

#[async_trait]
impl AssetLoader for StandardAssetLoader {
    fn cached(&self, asset: &AssetHandle) -> Option<Arc<DynamicImage>> {
        self.memory.lock().ok()?.get(asset).cloned()
    }

    async fn load(&self, asset: &AssetHandle) -> Result<Arc<DynamicImage>> {
        if let Some(hit) = self.cached(asset) {
            return Ok(hit);
        }

        let bytes = self.fetch_bytes(asset).await?;
        let decoded = tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
            .await
            .map_err(|e| Error::AssetLoad {
                asset: asset.to_string(),
                reason: e.to_string(),
            })??;
        let image = Arc::new(decoded);

        if let Ok(mut memory) = self.memory.lock() {
            memory.insert(asset.clone(), Arc::clone(&image));
        }
        Ok(image)
    }
}
