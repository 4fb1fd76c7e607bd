/// Namespace every registered skin texture lives under.
pub const TEXTURE_NAMESPACE: &str = "standskin";

/// Lowercases `raw` and replaces anything outside `[a-z0-9_-]` with `_`.
///
/// The result is only used to build the registered texture name. Lookups and
/// the on-disk file keep the raw identifier, so two names that normalize to
/// the same string share a texture slot but not a cache entry.
pub fn normalize_key(raw: &str) -> String {
    raw.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '_' | '-' => c,
            _ => '_',
        })
        .collect()
}

pub fn texture_name(raw: &str) -> String {
    format!("{TEXTURE_NAMESPACE}:skins/{}", normalize_key(raw))
}
