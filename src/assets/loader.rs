use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, mpsc};

use anyhow::Context;

use crate::assets::decode::{DecodedImage, decode_source};
use crate::foundation::error::{StageError, StageResult};

/// Load progress of one source at one raster size.
#[derive(Clone, Debug, PartialEq)]
pub enum LoadState {
    Pending,
    Ready(Arc<DecodedImage>),
    /// Sticky for the loader's lifetime; the source is never retried.
    Failed(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct LoadKey {
    source: String,
    raster: Option<(u32, u32)>,
}

type LoadMsg = (LoadKey, Result<DecodedImage, String>);

/// Decodes images and SVG stickers off the caller's thread.
///
/// `request` never blocks: it returns the current state and schedules a decode on the rayon pool
/// the first time a source is seen. Results are folded in by `poll`.
pub struct ImageLoader {
    root: PathBuf,
    pool: rayon::ThreadPool,
    entries: HashMap<LoadKey, LoadState>,
    tx: mpsc::Sender<LoadMsg>,
    rx: mpsc::Receiver<LoadMsg>,
    in_flight: usize,
}

impl std::fmt::Debug for ImageLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageLoader")
            .field("root", &self.root)
            .field("entries", &self.entries.len())
            .field("in_flight", &self.in_flight)
            .finish()
    }
}

impl ImageLoader {
    /// Loader resolving relative paths against `root`, on a pool of `threads` workers
    /// (`None` uses rayon's default).
    pub fn new(root: impl Into<PathBuf>, threads: Option<usize>) -> StageResult<Self> {
        if threads == Some(0) {
            return Err(StageError::validation("image loader needs at least one thread"));
        }
        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(n) = threads {
            builder = builder.num_threads(n);
        }
        let pool = builder
            .build()
            .map_err(|e| StageError::asset(format!("failed to build decode thread pool: {e}")))?;
        let (tx, rx) = mpsc::channel();
        Ok(Self {
            root: root.into(),
            pool,
            entries: HashMap::new(),
            tx,
            rx,
            in_flight: 0,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Current state of `source`, scheduling a decode if it was never requested.
    pub fn request(&mut self, source: &str, raster: Option<(u32, u32)>) -> LoadState {
        let key = LoadKey {
            source: source.to_string(),
            raster,
        };
        if let Some(state) = self.entries.get(&key) {
            return state.clone();
        }

        let path = match resolve_source(&self.root, source) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(source, error = %e, "asset source unavailable");
                let state = LoadState::Failed(e.to_string());
                self.entries.insert(key, state.clone());
                return state;
            }
        };

        self.entries.insert(key.clone(), LoadState::Pending);
        self.in_flight += 1;
        let tx = self.tx.clone();
        self.pool.spawn(move || {
            let result = load_path(&path, key.raster).map_err(|e| e.to_string());
            // The receiver only disappears with the loader itself.
            let _ = tx.send((key, result));
        });
        LoadState::Pending
    }

    /// Fold finished decodes into the cache. Returns how many loads settled.
    pub fn poll(&mut self) -> usize {
        let mut settled = 0;
        while let Ok(msg) = self.rx.try_recv() {
            self.settle(msg);
            settled += 1;
        }
        settled
    }

    /// Block until every scheduled decode has settled. Returns how many settled.
    pub fn wait_idle(&mut self) -> usize {
        let mut settled = 0;
        while self.in_flight > 0 {
            match self.rx.recv() {
                Ok(msg) => {
                    self.settle(msg);
                    settled += 1;
                }
                Err(_) => break,
            }
        }
        settled
    }

    fn settle(&mut self, (key, result): LoadMsg) {
        self.in_flight = self.in_flight.saturating_sub(1);
        let state = match result {
            Ok(img) => {
                tracing::debug!(source = %key.source, w = img.width, h = img.height, "asset loaded");
                LoadState::Ready(Arc::new(img))
            }
            Err(e) => {
                tracing::warn!(source = %key.source, error = %e, "asset load failed");
                LoadState::Failed(e)
            }
        };
        self.entries.insert(key, state);
    }
}

/// Map a source string to a filesystem path. Plain paths are relative to `root`; `file://` URLs
/// are taken as absolute. Any other scheme is unsupported.
pub fn resolve_source(root: &Path, source: &str) -> StageResult<PathBuf> {
    if let Some(rest) = source.strip_prefix("file://") {
        return Ok(PathBuf::from(rest));
    }
    if source.contains("://") || source.starts_with("data:") {
        return Err(StageError::asset(format!("unsupported asset source '{source}'")));
    }
    let p = Path::new(source);
    Ok(if p.is_absolute() {
        p.to_path_buf()
    } else {
        root.join(p)
    })
}

fn load_path(path: &Path, raster: Option<(u32, u32)>) -> StageResult<DecodedImage> {
    let bytes = std::fs::read(path).with_context(|| format!("read asset '{}'", path.display()))?;
    decode_source(&bytes, raster)
}

/// Host-supplied decoded video frames. Without one, video elements draw nothing.
pub trait VideoFrameSource {
    fn frame_at(&self, media_id: &str, source_time_s: f64) -> Option<Arc<DecodedImage>>;
}

#[cfg(test)]
#[path = "../../tests/unit/assets/loader.rs"]
mod tests;
