//! Icon resolution and rasterization.
//!
//! A symbolic icon name is resolved to a file through the configured theme,
//! then the `hicolor` fallback theme, then a synthesized path in the
//! fallback theme's scalable directory. SVG sources are rendered with
//! `resvg` at the exact target size; PNG/JPEG sources are decoded with
//! `image` and resampled. Any failure yields "no icon": the entry is still
//! shown and selectable.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use resvg::{tiny_skia, usvg};

use crate::bitmap::Bitmap;
use crate::entry::Entry;
use crate::error::{CouchError, Result};

/// Theme consulted when the configured one has no match.
pub const FALLBACK_THEME: &str = "hicolor";

/// Directory used to synthesize a last-resort SVG path.
pub const FALLBACK_ICON_DIR: &str = "/usr/share/icons/hicolor/scalable/apps";

/// Default Gaussian blur applied to the background image.
pub const DEFAULT_BACKGROUND_BLUR: f32 = 10.0;

/// Icon theme subdirectories searched below each size directory.
const CONTEXTS: &[&str] = &[
    "apps",
    "places",
    "devices",
    "actions",
    "status",
    "categories",
    "mimetypes",
];

const EXTENSIONS: &[&str] = &["png", "svg"];

/// Extensions that mark an icon reference as a file rather than a theme name.
const FILE_EXTENSIONS: &[&str] = &["png", "svg", "jpg", "jpeg", "xpm"];

/// Expand a leading `~` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    let home = || dirs::home_dir().unwrap_or_else(|| PathBuf::from("/"));
    if path == "~" {
        home()
    } else if let Some(rest) = path.strip_prefix("~/") {
        home().join(rest)
    } else {
        PathBuf::from(path)
    }
}

/// Icon theme lookup service.
pub trait IconLookup {
    /// Find a file for `name` at roughly `size` pixels in `theme`.
    fn lookup(&self, name: &str, size: u32, theme: &str) -> Option<PathBuf>;
}

/// Filesystem icon-theme search over the XDG icon directories.
#[derive(Debug, Clone)]
pub struct ThemeIconLookup {
    bases: Vec<PathBuf>,
    pixmaps: Option<PathBuf>,
}

impl Default for ThemeIconLookup {
    fn default() -> Self {
        let mut bases = Vec::new();
        if let Some(data) = dirs::data_dir() {
            bases.push(data.join("icons"));
        }
        bases.push(PathBuf::from("/usr/local/share/icons"));
        bases.push(PathBuf::from("/usr/share/icons"));
        Self {
            bases,
            pixmaps: Some(PathBuf::from("/usr/share/pixmaps")),
        }
    }
}

impl ThemeIconLookup {
    /// Search only the given base directories (no pixmaps fallback).
    pub fn with_bases(bases: Vec<PathBuf>) -> Self {
        Self {
            bases,
            pixmaps: None,
        }
    }

    fn find_in_dir(dir: &Path, name: &str) -> Option<PathBuf> {
        EXTENSIONS
            .iter()
            .map(|ext| dir.join(format!("{name}.{ext}")))
            .find(|p| p.is_file())
    }

    fn find_in_theme(theme_dir: &Path, name: &str, size: u32) -> Option<PathBuf> {
        let exact = format!("{size}x{size}");
        for size_dir in [exact.as_str(), "scalable"] {
            for ctx in CONTEXTS {
                if let Some(p) = Self::find_in_dir(&theme_dir.join(size_dir).join(ctx), name) {
                    return Some(p);
                }
            }
        }

        // Any other size, largest first so downscaling is preferred.
        let mut others: Vec<(u32, PathBuf)> = std::fs::read_dir(theme_dir)
            .ok()?
            .filter_map(|e| e.ok())
            .filter_map(|e| {
                let file_name = e.file_name();
                let dim = file_name.to_str()?.split('x').next()?.parse::<u32>().ok()?;
                Some((dim, e.path()))
            })
            .collect();
        others.sort_by(|a, b| b.0.cmp(&a.0));
        others.into_iter().find_map(|(_, dir)| {
            CONTEXTS
                .iter()
                .find_map(|ctx| Self::find_in_dir(&dir.join(ctx), name))
        })
    }
}

impl IconLookup for ThemeIconLookup {
    fn lookup(&self, name: &str, size: u32, theme: &str) -> Option<PathBuf> {
        let direct = Path::new(name);
        if is_file_ref(direct) {
            return direct.is_file().then(|| direct.to_path_buf());
        }
        self.bases
            .iter()
            .map(|base| base.join(theme))
            .filter(|dir| dir.is_dir())
            .find_map(|dir| Self::find_in_theme(&dir, name, size))
            .or_else(|| {
                self.pixmaps
                    .as_deref()
                    .and_then(|dir| Self::find_in_dir(dir, name))
            })
    }
}

/// A reference is a file path when it is absolute, has a directory part, or
/// ends in an image extension. Dotted names like `org.gnome.Nautilus` are
/// theme names.
fn is_file_ref(path: &Path) -> bool {
    let known_ext = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| FILE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));
    path.is_absolute() || path.components().count() > 1 || known_ext
}

/// Resolves icon references to rasterized bitmaps, caching every result.
pub struct AssetResolver<L = ThemeIconLookup> {
    lookup: L,
    fallback_dir: PathBuf,
    cache: HashMap<(String, (u32, u32)), Option<Bitmap>>,
}

impl Default for AssetResolver<ThemeIconLookup> {
    fn default() -> Self {
        Self::new(ThemeIconLookup::default())
    }
}

impl<L: IconLookup> AssetResolver<L> {
    pub fn new(lookup: L) -> Self {
        Self {
            lookup,
            fallback_dir: PathBuf::from(FALLBACK_ICON_DIR),
            cache: HashMap::new(),
        }
    }

    /// Override the directory used for the synthesized last-resort path.
    pub fn with_fallback_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.fallback_dir = dir.into();
        self
    }

    /// Number of cached lookups, including negative results.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Resolve `icon_ref` to a file path. Always yields a candidate; the
    /// last resort may not exist.
    pub fn resolve_path(&self, icon_ref: &str, size: (u32, u32), theme: Option<&str>) -> PathBuf {
        let name = expand_home(icon_ref);
        let name = name.to_string_lossy();
        let theme = theme.unwrap_or(FALLBACK_THEME);
        self.lookup
            .lookup(&name, size.0, theme)
            .or_else(|| {
                (theme != FALLBACK_THEME)
                    .then(|| self.lookup.lookup(&name, size.0, FALLBACK_THEME))
                    .flatten()
            })
            .unwrap_or_else(|| self.fallback_dir.join(format!("{name}.svg")))
    }

    /// Resolve and rasterize an icon at exactly `size`.
    pub fn resolve_and_load(
        &mut self,
        icon_ref: &str,
        size: (u32, u32),
        theme: Option<&str>,
    ) -> Option<Bitmap> {
        if icon_ref.is_empty() {
            return None;
        }
        let key = (icon_ref.to_string(), size);
        if let Some(hit) = self.cache.get(&key) {
            return hit.clone();
        }
        let path = self.resolve_path(icon_ref, size, theme);
        let loaded = match rasterize(&path, size) {
            Ok(bmp) => bmp,
            Err(e) => {
                log::warn!("Icon '{icon_ref}' ({}): {e}", path.display());
                None
            },
        };
        if loaded.is_none() {
            log::debug!("No icon for '{icon_ref}'");
        }
        self.cache.insert(key, loaded.clone());
        loaded
    }

    /// Attach icons to every entry that does not have one yet.
    pub fn load_icons(&mut self, entries: &mut [Entry], size: (u32, u32), theme: Option<&str>) {
        for entry in entries.iter_mut().filter(|e| e.icon.is_none()) {
            entry.icon = self.resolve_and_load(&entry.icon_ref, size, theme);
        }
        let found = entries.iter().filter(|e| e.icon.is_some()).count();
        log::info!("Loaded {found}/{} icons", entries.len());
    }
}

/// Load `path` at exactly `size`.
///
/// `Ok(None)` means the path does not exist or has an unsupported
/// extension. `Err` means the file exists but could not be decoded.
pub fn rasterize(path: &Path, size: (u32, u32)) -> Result<Option<Bitmap>> {
    if !path.is_file() {
        return Ok(None);
    }
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("svg") => rasterize_svg(&std::fs::read(path)?, size).map(Some),
        Some("png" | "jpg" | "jpeg") => load_raster(path, size).map(Some),
        _ => Ok(None),
    }
}

/// Render SVG data scaled uniformly to the target width.
pub fn rasterize_svg(data: &[u8], (w, h): (u32, u32)) -> Result<Bitmap> {
    let tree = usvg::Tree::from_data(data, &usvg::Options::default())
        .map_err(|e| CouchError::Asset(format!("SVG parse: {e}")))?;
    let intrinsic = tree.size().width();
    if intrinsic <= 0.0 {
        return Err(CouchError::Asset("SVG has zero width".into()));
    }
    let scale = w as f32 / intrinsic;
    let mut pixmap = tiny_skia::Pixmap::new(w, h)
        .ok_or_else(|| CouchError::Asset(format!("invalid target size {w}x{h}")))?;
    resvg::render(
        &tree,
        tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );

    let mut rgba = Vec::with_capacity(w as usize * h as usize * 4);
    for px in pixmap.pixels() {
        let c = px.demultiply();
        rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    Bitmap::new(w, h, rgba).ok_or_else(|| CouchError::Asset("pixel buffer size".into()))
}

/// Decode a raster image and resample it to exactly the target size.
pub fn load_raster(path: &Path, (w, h): (u32, u32)) -> Result<Bitmap> {
    let img = image::open(path).map_err(|e| CouchError::Asset(e.to_string()))?;
    let rgba = img.resize_exact(w, h, FilterType::Lanczos3).to_rgba8();
    Bitmap::new(w, h, rgba.into_raw()).ok_or_else(|| CouchError::Asset("pixel buffer size".into()))
}

/// Load a background image, cover-scaled to `size` and blurred.
pub fn load_background(path: &str, size: (u32, u32), blur_sigma: f32) -> Option<Bitmap> {
    let path = expand_home(path);
    let img = match image::open(&path) {
        Ok(img) => img,
        Err(e) => {
            log::warn!("Background {}: {e}", path.display());
            return None;
        },
    };
    let mut img = img.resize_to_fill(size.0, size.1, FilterType::Triangle);
    if blur_sigma > 0.0 {
        img = img.blur(blur_sigma);
    }
    let rgba = img.to_rgba8();
    let (w, h) = rgba.dimensions();
    log::info!("Background loaded: {} ({w}x{h})", path.display());
    Bitmap::new(w, h, rgba.into_raw())
}
