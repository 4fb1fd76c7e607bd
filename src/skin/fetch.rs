use super::cache::EntryTable;
use super::error::FetchError;
use super::key::texture_name;
use super::remap::{SKIN_WIDTH, is_legacy_layout, remap_legacy};
use super::store::AssetStore;
use crate::assets::{TextureHandle, TextureRegistry};
use crate::config::Config;
use crate::core::network::SkinFetcher;
use image::RgbaImage;
use log::{debug, info, warn};
use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

/// High-resolution skins are accepted as-is.
const HD_SKIN_WIDTH: u32 = 128;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            max_attempts: u32::from(cfg.download_attempts),
            retry_delay: Duration::from_millis(u64::from(cfg.retry_delay_ms)),
        }
    }

    #[inline(always)]
    const fn attempts(&self) -> u32 {
        if self.max_attempts == 0 { 1 } else { self.max_attempts }
    }
}

/// Bookkeeping for one download; dropped once the fetch settles.
struct RetryState {
    attempt: u32,
    last_error: Option<FetchError>,
    started: Instant,
}

impl RetryState {
    fn new() -> Self {
        Self {
            attempt: 0,
            last_error: None,
            started: Instant::now(),
        }
    }
}

/// Downloads `key`, retrying network failures up to the policy's budget.
///
/// The delay only runs between attempts, never after the last one.
pub fn download_with_retry(
    fetcher: &dyn SkinFetcher,
    key: &str,
    policy: &RetryPolicy,
) -> Result<Vec<u8>, FetchError> {
    let max = policy.attempts();
    let mut state = RetryState::new();
    loop {
        state.attempt += 1;
        match fetcher.fetch(key) {
            Ok(bytes) => {
                debug!(
                    "Skin for '{key}' downloaded on attempt {} ({} bytes).",
                    state.attempt,
                    bytes.len()
                );
                return Ok(bytes);
            }
            Err(e) => {
                warn!(
                    "Skin download failed for '{key}': {e}, attempt {}/{max}",
                    state.attempt
                );
                let retryable = e.is_retryable();
                state.last_error = Some(e);
                if !retryable {
                    break;
                }
            }
        }
        if state.attempt >= max {
            break;
        }
        thread::sleep(policy.retry_delay);
    }

    let err = state
        .last_error
        .unwrap_or_else(|| FetchError::Transport("unknown error".into()));
    warn!(
        "Giving up on skin for '{key}' after {} attempt(s) in {:.1}s: {err}",
        state.attempt,
        state.started.elapsed().as_secs_f32()
    );
    Err(err)
}

/// Decodes skin bytes, rejecting unsupported widths and upgrading the legacy
/// 64x32 layout.
pub fn decode_skin(bytes: &[u8]) -> Result<RgbaImage, FetchError> {
    let img = image::load_from_memory(bytes).map_err(|e| FetchError::Decode(e.to_string()))?;
    let (width, height) = (img.width(), img.height());
    if width != SKIN_WIDTH && width != HD_SKIN_WIDTH {
        return Err(FetchError::UnsupportedSize { width, height });
    }
    let rgba = img.into_rgba8();
    if is_legacy_layout(&rgba) {
        debug!("Converting legacy {width}x{height} skin to the 64x64 layout.");
        return remap_legacy(&rgba).ok_or(FetchError::UnsupportedSize { width, height });
    }
    Ok(rgba)
}

struct FetchContext {
    entries: Arc<EntryTable>,
    store: AssetStore,
    fetcher: Arc<dyn SkinFetcher>,
    textures: Arc<dyn TextureRegistry>,
    policy: RetryPolicy,
}

impl FetchContext {
    fn run(&self, key: &str) {
        match self.resolve(key) {
            Ok(handle) => {
                info!("Skin registered: {key} -> {}", handle.name());
                self.entries.resolve(key, handle);
            }
            Err(e) => self.fail(key, &e),
        }
    }

    fn fail(&self, key: &str, err: &FetchError) {
        warn!("Skin unavailable for '{key}': {err}");
        self.entries.fail(key);
    }

    fn resolve(&self, key: &str) -> Result<TextureHandle, FetchError> {
        let bytes = match self.store.read(key) {
            Some(bytes) => {
                info!(
                    "Local skin file exists, skipping download: {}",
                    self.store.path_for(key).display()
                );
                bytes
            }
            None => {
                let bytes = download_with_retry(self.fetcher.as_ref(), key, &self.policy)?;
                if let Err(e) = self.store.write(key, &bytes) {
                    // The in-memory texture still goes ahead; a restart re-downloads.
                    warn!("Failed to persist skin for '{key}': {e}");
                }
                bytes
            }
        };

        let image = decode_skin(&bytes)?;
        self.textures
            .register(&texture_name(key), image)
            .map_err(|e| FetchError::Registration(e.to_string()))
    }
}

/// Starts and drives skin fetches. At most one fetch runs per key; the claim
/// on the shared entry table decides which caller gets to start it.
#[derive(Clone)]
pub struct FetchCoordinator {
    ctx: Arc<FetchContext>,
}

impl FetchCoordinator {
    pub(crate) fn new(
        entries: Arc<EntryTable>,
        store: AssetStore,
        fetcher: Arc<dyn SkinFetcher>,
        textures: Arc<dyn TextureRegistry>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            ctx: Arc::new(FetchContext {
                entries,
                store,
                fetcher,
                textures,
                policy,
            }),
        }
    }

    /// Launches a background fetch for `key` if it is Absent. Returns whether
    /// a fetch was started.
    pub fn begin(&self, key: &str) -> bool {
        if !self.ctx.entries.claim(key) {
            return false;
        }
        info!("Start async skin fetch: {key}");

        let ctx = Arc::clone(&self.ctx);
        let owned_key = key.to_string();
        let spawned = thread::Builder::new()
            .name("skin-fetch".into())
            .spawn(move || ctx.run(&owned_key));
        if let Err(e) = spawned {
            self.ctx.fail(key, &FetchError::Spawn(e.to_string()));
        }
        true
    }
}
