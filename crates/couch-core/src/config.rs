//! Launcher configuration loaded from `config.toml`.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::assets::expand_home;
use crate::entry::{Command, Entry};
use crate::error::{CouchError, Result};
use crate::multiplex::DEFAULT_AXIS_THRESHOLD;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "COUCHMODE_CONFIG";

const CONFIG_FILE: &str = "config.toml";

/// Top-level configuration document.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CouchConfig {
    /// Window size in pixels.
    pub resolution: (u32, u32),
    /// Square icon edge in pixels.
    pub icon_size: u32,
    pub columns: usize,
    pub fullscreen: bool,
    /// Loop ticks per second.
    pub fps: u32,
    /// Analog stick deflection that counts as a move.
    pub axis_threshold: f32,
    /// Icon theme searched before `hicolor`.
    pub theme: Option<String>,
    /// Command line used to open `web` entries.
    pub browser: String,
    pub background: Option<String>,
    /// TrueType font for labels. Falls back to common system fonts.
    pub font: Option<String>,
    /// Remote-control bridge command.
    pub bridge: String,
    /// Directories scanned for `.desktop` files.
    pub app_dirs: Vec<String>,
    pub entries: Vec<EntrySpec>,
}

impl Default for CouchConfig {
    fn default() -> Self {
        Self {
            resolution: (1920, 1080),
            icon_size: 256,
            columns: 6,
            fullscreen: true,
            fps: 15,
            axis_threshold: DEFAULT_AXIS_THRESHOLD,
            theme: None,
            browser: "xdg-open".to_string(),
            background: None,
            font: None,
            bridge: "cec-client".to_string(),
            app_dirs: vec![
                "/usr/share/applications".to_string(),
                "~/.local/share/applications".to_string(),
            ],
            entries: Vec::new(),
        }
    }
}

/// One item of the `entries` list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum EntrySpec {
    /// Key of a discovered desktop entry (lower-cased file stem).
    Key(String),
    /// Inline entries keyed by an identifier.
    Inline(BTreeMap<String, InlineEntry>),
}

/// An entry defined directly in the configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InlineEntry {
    pub name: Option<String>,
    pub run: Option<String>,
    /// URL opened with [`CouchConfig::browser`].
    pub web: Option<String>,
    #[serde(default)]
    pub icon: String,
}

impl CouchConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path.filter(|p| p.exists()) else {
            log::warn!("No configuration file found, using defaults");
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)
            .map_err(|e| CouchError::Config(format!("{}: {e}", path.display())))?;
        log::info!(
            "Loaded config {} ({} entries)",
            path.display(),
            config.entries.len()
        );
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let (w, h) = self.resolution;
        if w == 0 || h == 0 {
            return Err(CouchError::Config(format!("invalid resolution {w}x{h}")));
        }
        if self.icon_size == 0 {
            return Err(CouchError::Config("icon_size must be positive".into()));
        }
        if self.fps == 0 {
            return Err(CouchError::Config("fps must be positive".into()));
        }
        if !(0.0..1.0).contains(&self.axis_threshold) {
            return Err(CouchError::Config(format!(
                "axis_threshold {} outside [0, 1)",
                self.axis_threshold
            )));
        }
        Ok(())
    }

    /// Icon target size as `(w, h)`.
    pub fn icon_dims(&self) -> (u32, u32) {
        (self.icon_size, self.icon_size)
    }

    /// `app_dirs` with `~` expanded.
    pub fn app_dir_paths(&self) -> Vec<PathBuf> {
        self.app_dirs.iter().map(|d| expand_home(d)).collect()
    }
}

/// Locate the config file: explicit argument, then `$COUCHMODE_CONFIG`,
/// then `./config.toml`, then `$XDG_CONFIG_HOME/couchmode/config.toml`.
pub fn find_config(cli: Option<&str>) -> Option<PathBuf> {
    if let Some(path) = cli {
        return Some(expand_home(path));
    }
    if let Ok(path) = std::env::var(CONFIG_ENV)
        && !path.is_empty()
    {
        return Some(expand_home(&path));
    }
    let mut candidates = vec![PathBuf::from(CONFIG_FILE)];
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("couchmode").join(CONFIG_FILE));
    }
    candidates.into_iter().find(|p| p.is_file())
}

/// Build the grid entries in configuration order.
///
/// Keys not found in `discovered` are skipped. With no configured entries
/// every discovered application is shown, sorted by name.
pub fn resolve_entries(config: &CouchConfig, discovered: &HashMap<String, Entry>) -> Vec<Entry> {
    if config.entries.is_empty() {
        let mut all: Vec<Entry> = discovered.values().cloned().collect();
        all.sort_by_key(|e| e.name.to_lowercase());
        return all;
    }

    let mut out = Vec::new();
    for item in &config.entries {
        match item {
            EntrySpec::Key(key) => match discovered.get(&key.to_lowercase()) {
                Some(entry) => out.push(entry.clone()),
                None => log::debug!("Unknown entry key '{key}', skipping"),
            },
            EntrySpec::Inline(map) => {
                for (key, inline) in map {
                    match inline_entry(key, inline, &config.browser) {
                        Some(entry) => out.push(entry),
                        None => log::warn!("Entry '{key}' has neither 'run' nor 'web', skipping"),
                    }
                }
            },
        }
    }
    out
}

fn inline_entry(key: &str, inline: &InlineEntry, browser: &str) -> Option<Entry> {
    let command = match (&inline.run, &inline.web) {
        (Some(run), _) => Command::parse(run),
        (None, Some(url)) => Command::web(browser, url),
        (None, None) => return None,
    };
    let name = inline.name.clone().unwrap_or_else(|| key.to_string());
    Some(Entry::new(name, inline.icon.clone(), command))
}
