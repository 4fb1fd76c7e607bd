use super::cache::{EntryState, ResourceCache};
use super::error::FetchError;
use super::fetch::RetryPolicy;
use super::notify::NotificationHub;
use super::store::AssetStore;
use crate::assets::GeneratedTextures;
use crate::core::network::SkinFetcher;
use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// Fetcher that replays canned responses and counts calls. Once the script
/// runs out the last response repeats.
pub struct ScriptedFetcher {
    script: Vec<Result<Vec<u8>, FetchError>>,
    next: Mutex<usize>,
    calls: AtomicUsize,
    delay: Duration,
}

impl ScriptedFetcher {
    pub fn always(response: Result<Vec<u8>, FetchError>) -> Self {
        Self::sequence(vec![response])
    }

    pub fn sequence(script: Vec<Result<Vec<u8>, FetchError>>) -> Self {
        assert!(!script.is_empty(), "script needs at least one response");
        Self {
            script,
            next: Mutex::new(0),
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SkinFetcher for ScriptedFetcher {
    fn fetch(&self, _key: &str) -> Result<Vec<u8>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        let mut next = self.next.lock().expect("script cursor poisoned");
        let idx = (*next).min(self.script.len() - 1);
        *next += 1;
        self.script[idx].clone()
    }
}

pub fn no_delay_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        retry_delay: Duration::ZERO,
    }
}

/// Encodes a solid PNG of the given size.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([200, 40, 90, 255]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)
        .expect("failed to encode test PNG");
    out.into_inner()
}

pub fn test_cache(
    root: &Path,
    fetcher: Arc<ScriptedFetcher>,
) -> (ResourceCache, NotificationHub, Arc<GeneratedTextures>, AssetStore) {
    let store = AssetStore::open(root).expect("failed to open asset store");
    let textures = Arc::new(GeneratedTextures::new());
    let (cache, hub) = ResourceCache::new(
        store.clone(),
        fetcher,
        textures.clone(),
        no_delay_policy(),
    );
    (cache, hub, textures, store)
}

/// Polls the entry state (without triggering fetches) until it settles.
pub fn wait_settled(cache: &ResourceCache, key: &str) -> EntryState {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let state = cache.state(key);
        if state.is_settled() || Instant::now() >= deadline {
            return state;
        }
        thread::sleep(Duration::from_millis(5));
    }
}
