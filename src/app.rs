use crate::assets::{DEFAULT_SKIN, GeneratedTextures};
use crate::config;
use crate::core::network::HttpSkinFetcher;
use crate::skin::{AssetStore, EntryState, NotificationHub, ResourceCache, RetryPolicy};
use log::{debug, info, warn};
use std::{
    error::Error,
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

/// An armor stand entity. Named stands wear the skin of the player they are
/// named after.
#[derive(Debug, Clone)]
pub struct Stand {
    name: Option<String>,
    /// Texture sampled on the last draw.
    drawn: String,
    dirty: bool,
    refreshes: u32,
}

impl Stand {
    pub fn new(name: Option<String>) -> Self {
        Self {
            name: name.filter(|n| !n.is_empty()),
            drawn: DEFAULT_SKIN.to_string(),
            dirty: true,
            refreshes: 0,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn drawn(&self) -> &str {
        &self.drawn
    }

    pub const fn refreshes(&self) -> u32 {
        self.refreshes
    }
}

/// Single-threaded host: owns the stands and drives lookups once per tick.
pub struct Host {
    cache: ResourceCache,
    hub: NotificationHub,
    stands: Vec<Stand>,
    ticks: u64,
}

impl Host {
    pub fn new(cache: ResourceCache, hub: NotificationHub) -> Self {
        Self {
            cache,
            hub,
            stands: Vec::new(),
            ticks: 0,
        }
    }

    pub fn spawn_stand(&mut self, name: Option<String>) -> usize {
        self.stands.push(Stand::new(name));
        self.stands.len() - 1
    }

    pub fn stands(&self) -> &[Stand] {
        &self.stands
    }

    pub const fn cache(&self) -> &ResourceCache {
        &self.cache
    }

    /// Texture a stand should be drawn with this frame.
    pub fn texture_for(&self, stand: &Stand) -> String {
        stand
            .name()
            .and_then(|name| self.cache.lookup(name))
            .map_or_else(|| DEFAULT_SKIN.to_string(), |h| h.name().to_string())
    }

    /// Marks every stand named `key` for redraw. Returns how many matched.
    fn request_redraw(&mut self, key: &str) -> usize {
        let mut refreshed = 0;
        for stand in self.stands.iter_mut().filter(|s| s.name() == Some(key)) {
            stand.dirty = true;
            stand.refreshes += 1;
            refreshed += 1;
        }
        debug!("Skin ready for '{key}', refreshed {refreshed} stand(s).");
        refreshed
    }

    /// Runs one frame: delivers pending resolution notices, then samples the
    /// texture of every stand.
    pub fn tick(&mut self) {
        self.ticks += 1;

        let mut ready = Vec::new();
        self.hub.drain(|key| ready.push(key.to_string()));
        for key in &ready {
            self.request_redraw(key);
        }

        for i in 0..self.stands.len() {
            let texture = self.texture_for(&self.stands[i]);
            let stand = &mut self.stands[i];
            if stand.dirty || stand.drawn != texture {
                stand.drawn = texture;
                stand.dirty = false;
            }
        }
    }

    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn all_settled(&self) -> bool {
        self.stands
            .iter()
            .filter_map(Stand::name)
            .all(|name| self.cache.state(name).is_settled())
    }
}

const fn state_label(state: &EntryState) -> &'static str {
    match state {
        EntryState::Absent => "absent",
        EntryState::InFlight => "pending",
        EntryState::Resolved(_) => "resolved",
        EntryState::Failed => "failed",
    }
}

pub fn run() -> Result<(), Box<dyn Error>> {
    let names: Vec<String> = std::env::args().skip(1).collect();
    if names.is_empty() {
        println!("usage: standskin <player-name>...");
        return Ok(());
    }

    let cfg = config::get();
    let root = cfg.resolved_config_root();
    let store = AssetStore::open(&root)?;
    info!("Skin directory: {}", store.dir().display());

    let textures = Arc::new(GeneratedTextures::new());
    let (cache, hub) = ResourceCache::new(
        store,
        Arc::new(HttpSkinFetcher::from_config(&cfg)),
        textures.clone(),
        RetryPolicy::from_config(&cfg),
    );

    let mut host = Host::new(cache, hub);
    for name in names {
        host.spawn_stand(Some(name));
    }

    let frame = Duration::from_secs_f64(1.0 / f64::from(cfg.tick_rate_hz.max(1)));
    let deadline = Instant::now() + Duration::from_secs(u64::from(cfg.host_timeout_seconds));
    loop {
        host.tick();
        if host.all_settled() {
            // One more frame so the final notices are drained and drawn.
            host.tick();
            break;
        }
        if Instant::now() >= deadline {
            warn!(
                "Timed out after {}s with skins still pending.",
                cfg.host_timeout_seconds
            );
            break;
        }
        thread::sleep(frame);
    }
    info!("Host ran {} tick(s).", host.ticks());

    for stand in host.stands() {
        let Some(name) = stand.name() else { continue };
        let state = host.cache().state(name);
        let dims = textures
            .texture_dims(stand.drawn())
            .map(|m| format!(" {}x{}", m.w, m.h))
            .unwrap_or_default();
        println!(
            "{name}: {} -> {}{dims} (refreshed {})",
            state_label(&state),
            stand.drawn(),
            stand.refreshes()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::Host;
    use crate::assets::DEFAULT_SKIN;
    use crate::skin::FetchError;
    use crate::skin::remap::{MODERN_HEIGHT, SKIN_WIDTH};
    use crate::skin::test_support::{ScriptedFetcher, png_bytes, test_cache};
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};
    use tempfile::tempdir;

    fn tick_until_settled(host: &mut Host) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !host.all_settled() && Instant::now() < deadline {
            host.tick();
            thread::sleep(Duration::from_millis(5));
        }
        host.tick();
    }

    #[test]
    fn stands_switch_to_their_skin_once_resolved() {
        let root = tempdir().expect("failed to create temp directory");
        let fetcher = Arc::new(
            ScriptedFetcher::always(Ok(png_bytes(SKIN_WIDTH, MODERN_HEIGHT)))
                .with_delay(Duration::from_millis(100)),
        );
        let (cache, hub, _textures, _store) = test_cache(root.path(), fetcher.clone());
        let mut host = Host::new(cache, hub);
        host.spawn_stand(Some("Alice".into()));
        host.spawn_stand(Some("Alice".into()));
        host.spawn_stand(None);

        host.tick();
        assert!(
            host.stands().iter().all(|s| s.drawn() == DEFAULT_SKIN),
            "first frame draws the default skin"
        );

        tick_until_settled(&mut host);
        let stands = host.stands();
        assert_eq!(stands[0].drawn(), "standskin:skins/alice");
        assert_eq!(stands[1].drawn(), "standskin:skins/alice");
        assert_eq!(stands[0].refreshes(), 1);
        assert_eq!(stands[1].refreshes(), 1);
        assert_eq!(stands[2].drawn(), DEFAULT_SKIN);
        assert_eq!(stands[2].refreshes(), 0);
        assert_eq!(fetcher.calls(), 1, "two stands with one name share a fetch");
    }

    #[test]
    fn failed_skins_keep_the_default_texture() {
        let root = tempdir().expect("failed to create temp directory");
        let fetcher = Arc::new(ScriptedFetcher::always(Err(FetchError::Status(404))));
        let (cache, hub, _textures, _store) = test_cache(root.path(), fetcher.clone());
        let mut host = Host::new(cache, hub);
        host.spawn_stand(Some("Bob".into()));

        tick_until_settled(&mut host);
        for _ in 0..5 {
            host.tick();
        }
        assert_eq!(host.stands()[0].drawn(), DEFAULT_SKIN);
        assert_eq!(host.stands()[0].refreshes(), 0);
        assert_eq!(fetcher.calls(), 3);
    }

    #[test]
    fn unnamed_stands_are_always_settled() {
        let root = tempdir().expect("failed to create temp directory");
        let fetcher = Arc::new(ScriptedFetcher::always(Err(FetchError::Status(500))));
        let (cache, hub, _textures, _store) = test_cache(root.path(), fetcher.clone());
        let mut host = Host::new(cache, hub);
        host.spawn_stand(None);
        host.spawn_stand(Some(String::new()));

        assert!(host.all_settled());
        host.tick();
        assert_eq!(fetcher.calls(), 0);
    }
}
