use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::foundation::error::{StageError, StageResult};
use crate::stickers::id::StickerId;

/// Requested raster size for a resolved sticker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolveOptions {
    pub width: u32,
    pub height: u32,
}

impl ResolveOptions {
    pub fn square(size: u32) -> Self {
        Self {
            width: size,
            height: size,
        }
    }
}

/// Maps sticker ids of one provider to a loadable source (path or `file://` URL).
pub trait StickerProvider: Send + Sync {
    fn id(&self) -> &str;
    fn resolve_url(&self, id: &StickerId, opts: ResolveOptions) -> StageResult<String>;
}

const STICKER_EXTENSIONS: [&str; 5] = ["svg", "png", "webp", "jpg", "jpeg"];

/// Provider backed by a directory tree: `icons:mdi:home` → `<root>/mdi/home.<ext>`.
#[derive(Clone, Debug)]
pub struct DirectoryProvider {
    id: String,
    root: PathBuf,
}

impl DirectoryProvider {
    pub fn new(id: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            root: root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl StickerProvider for DirectoryProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn resolve_url(&self, id: &StickerId, _opts: ResolveOptions) -> StageResult<String> {
        let mut base = self.root.clone();
        for segment in id.value().split(':') {
            if segment.is_empty()
                || segment == "."
                || segment == ".."
                || segment.contains(['/', '\\'])
            {
                return Err(StageError::sticker(format!(
                    "sticker id \"{id}\" has an invalid path segment"
                )));
            }
            base.push(segment);
        }

        let path = STICKER_EXTENSIONS
            .iter()
            .map(|ext| base.with_extension(ext))
            .find(|p| p.is_file())
            .unwrap_or_else(|| base.with_extension(STICKER_EXTENSIONS[0]));
        Ok(path.to_string_lossy().into_owned())
    }
}

/// Explicit provider registry owned by the compositor's asset resolution.
#[derive(Clone, Default)]
pub struct StickerRegistry {
    providers: BTreeMap<String, Arc<dyn StickerProvider>>,
}

impl std::fmt::Debug for StickerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StickerRegistry")
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl StickerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory providers for `icons`, `emoji`, `flags` and `shapes`, one subdirectory each.
    pub fn with_directory_providers(root: &Path) -> Self {
        let mut reg = Self::new();
        for id in ["icons", "emoji", "flags", "shapes"] {
            reg.register(DirectoryProvider::new(id, root.join(id)));
        }
        reg
    }

    /// Register a provider, replacing any previous one with the same id.
    pub fn register(&mut self, provider: impl StickerProvider + 'static) {
        self.providers
            .insert(provider.id().to_string(), Arc::new(provider));
    }

    pub fn has_provider(&self, id: &str) -> bool {
        self.providers.contains_key(id)
    }

    pub fn provider(&self, id: &str) -> StageResult<&Arc<dyn StickerProvider>> {
        self.providers
            .get(id)
            .ok_or_else(|| StageError::sticker(format!("unknown sticker provider: {id}")))
    }

    pub fn resolve(&self, raw_id: &str, opts: ResolveOptions) -> StageResult<String> {
        let id = StickerId::parse(raw_id)?;
        self.provider(id.provider())?.resolve_url(&id, opts)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/stickers/registry.rs"]
mod tests;
