use image::RgbaImage;
use log::debug;
use rustc_hash::FxHashMap;
use std::{
    error::Error,
    sync::{Arc, PoisonError, RwLock},
};

/// Texture every stand falls back to while its own skin is unavailable.
pub const DEFAULT_SKIN: &str = "minecraft:textures/entity/player/wide/steve.png";

// --- Texture Metadata ---

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TexMeta {
    pub w: u32,
    pub h: u32,
}

/// Opaque handle to a registered texture, cheap to clone every frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextureHandle {
    name: Arc<str>,
    meta: TexMeta,
}

impl TextureHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn meta(&self) -> TexMeta {
        self.meta
    }
}

/// Host side of texture creation. Implementations must accept calls from
/// fetch workers.
pub trait TextureRegistry: Send + Sync {
    fn register(
        &self,
        name: &str,
        image: RgbaImage,
    ) -> Result<TextureHandle, Box<dyn Error + Send + Sync>>;
}

/// `namespace:path` with the character rules of a resource location.
pub fn is_valid_texture_name(name: &str) -> bool {
    let Some((namespace, path)) = name.split_once(':') else {
        return false;
    };
    let ns_ok = !namespace.is_empty()
        && namespace
            .bytes()
            .all(|b| matches!(b, b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-' | b'.'));
    let path_ok = !path.is_empty()
        && !path.ends_with('/')
        && path
            .bytes()
            .all(|b| matches!(b, b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-' | b'.' | b'/'));
    ns_ok && path_ok
}

#[derive(Clone)]
struct GeneratedTexture {
    image: Arc<RgbaImage>,
    meta: TexMeta,
}

/// CPU-side texture store. The renderer uploads from here on its own thread.
#[derive(Default)]
pub struct GeneratedTextures {
    textures: RwLock<FxHashMap<String, GeneratedTexture>>,
}

impl GeneratedTextures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn image(&self, name: &str) -> Option<Arc<RgbaImage>> {
        self.read().get(name).map(|t| Arc::clone(&t.image))
    }

    pub fn texture_dims(&self, name: &str) -> Option<TexMeta> {
        self.read().get(name).map(|t| t.meta)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, FxHashMap<String, GeneratedTexture>> {
        self.textures.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TextureRegistry for GeneratedTextures {
    fn register(
        &self,
        name: &str,
        image: RgbaImage,
    ) -> Result<TextureHandle, Box<dyn Error + Send + Sync>> {
        if !is_valid_texture_name(name) {
            return Err(format!("'{name}' is not a valid texture name").into());
        }
        let meta = TexMeta {
            w: image.width(),
            h: image.height(),
        };
        self.textures
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                name.to_string(),
                GeneratedTexture {
                    image: Arc::new(image),
                    meta,
                },
            );
        debug!("Registered texture '{name}' ({}x{}).", meta.w, meta.h);
        Ok(TextureHandle {
            name: Arc::from(name),
            meta,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_SKIN, GeneratedTextures, TexMeta, TextureRegistry, is_valid_texture_name};
    use image::RgbaImage;

    #[test]
    fn validates_resource_location_names() {
        assert!(is_valid_texture_name("standskin:skins/alice"));
        assert!(is_valid_texture_name(DEFAULT_SKIN));
        assert!(!is_valid_texture_name("standskin:skins/"));
        assert!(!is_valid_texture_name("standskin:"));
        assert!(!is_valid_texture_name("no_namespace"));
        assert!(!is_valid_texture_name("standskin:skins/Alice"));
        assert!(!is_valid_texture_name("standskin:skins/a b"));
    }

    #[test]
    fn register_records_image_and_dims() {
        let textures = GeneratedTextures::new();
        let handle = textures
            .register("standskin:skins/alice", RgbaImage::new(64, 64))
            .expect("valid name should register");
        assert_eq!(handle.name(), "standskin:skins/alice");
        assert_eq!(handle.meta(), TexMeta { w: 64, h: 64 });
        assert_eq!(
            textures.texture_dims("standskin:skins/alice"),
            Some(TexMeta { w: 64, h: 64 })
        );
        assert!(textures.image("standskin:skins/alice").is_some());
        assert_eq!(textures.len(), 1);
    }

    #[test]
    fn handles_compare_by_name_and_dims() {
        let textures = GeneratedTextures::new();
        let a = textures
            .register("standskin:skins/alice", RgbaImage::new(64, 64))
            .expect("valid name should register");
        let b = textures
            .register("standskin:skins/alice", RgbaImage::new(64, 64))
            .expect("valid name should register");
        let hd = textures
            .register("standskin:skins/alice", RgbaImage::new(128, 128))
            .expect("valid name should register");
        assert_eq!(a, b.clone());
        assert_ne!(a, hd);
    }

    #[test]
    fn register_rejects_invalid_names() {
        let textures = GeneratedTextures::new();
        assert!(textures.register("standskin:skins/", RgbaImage::new(64, 64)).is_err());
        assert_eq!(textures.len(), 0);
    }
}
