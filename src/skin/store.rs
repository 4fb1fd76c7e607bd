use log::{info, warn};
use std::{
    fs, io,
    path::{Path, PathBuf},
};

pub const SKIN_DIR: &str = "skins";
const SKIN_EXT: &str = "png";

/// Downloaded skin files, one per raw key, under `<root>/skins/`.
#[derive(Clone, Debug)]
pub struct AssetStore {
    dir: PathBuf,
}

impl AssetStore {
    /// Opens the store under `config_root`, creating the directory if needed.
    pub fn open<P: AsRef<Path>>(config_root: P) -> io::Result<Self> {
        let dir = config_root.as_ref().join(SKIN_DIR);
        if !dir.is_dir() {
            fs::create_dir_all(&dir)?;
            info!("Created skin directory '{}'.", dir.display());
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The raw key is used verbatim as the file stem.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{SKIN_EXT}"))
    }

    pub fn has(&self, key: &str) -> bool {
        self.path_for(key).is_file()
    }

    pub fn read(&self, key: &str) -> Option<Vec<u8>> {
        let path = self.path_for(key);
        match fs::read(&path) {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!("Failed to read skin file '{}': {e}", path.display());
                None
            }
        }
    }

    pub fn write(&self, key: &str, bytes: &[u8]) -> io::Result<()> {
        // Only `skins/` itself is created; a key naming a missing directory fails here.
        let path = self.path_for(key);
        fs::write(&path, bytes)?;
        info!("Stored skin for '{key}' at '{}'.", path.display());
        Ok(())
    }
}
