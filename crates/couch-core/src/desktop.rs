//! Freedesktop `.desktop` file discovery.
//!
//! Only the `[Desktop Entry]` group is read. Localized keys (`Name[de]=`)
//! are ignored.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::entry::{Command, Entry};

const GROUP_HEADER: &str = "[Desktop Entry]";

/// Fields of a parsed desktop file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesktopEntry {
    pub name: String,
    pub exec: String,
    pub icon: String,
    /// `NoDisplay=true` or `Hidden=true`.
    pub hidden: bool,
    /// `Type=`, empty when absent.
    pub kind: String,
}

impl DesktopEntry {
    /// Whether this entry should appear in the launcher.
    pub fn is_launchable(&self) -> bool {
        !self.hidden && (self.kind.is_empty() || self.kind == "Application")
    }

    pub fn into_entry(self) -> Entry {
        Entry::new(self.name, self.icon, Command::parse(&self.exec))
    }
}

/// Parse desktop-file contents. Returns `None` if `Name` or `Exec` is missing.
pub fn parse_desktop_file(content: &str) -> Option<DesktopEntry> {
    let mut name = None;
    let mut exec = None;
    let mut icon = None;
    let mut kind = None;
    let mut hidden = false;
    let mut in_group = false;

    for line in content.lines() {
        let line = line.trim();
        if line.starts_with('[') {
            in_group = line == GROUP_HEADER;
            continue;
        }
        if !in_group || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "Name" => name = Some(value),
            "Exec" => exec = Some(value),
            "Icon" => icon = Some(value),
            "Type" => kind = Some(value),
            "NoDisplay" | "Hidden" => hidden |= value.eq_ignore_ascii_case("true"),
            _ => {},
        }
    }

    Some(DesktopEntry {
        name: name?.to_string(),
        exec: exec?.to_string(),
        icon: icon.unwrap_or_default().to_string(),
        hidden,
        kind: kind.unwrap_or_default().to_string(),
    })
}

/// Lookup key of a desktop file: its lower-cased stem.
pub fn entry_key(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_lowercase)
}

/// Read every `*.desktop` file in `dirs`. Later directories override
/// earlier ones for the same key.
pub fn discover(dirs: &[PathBuf]) -> HashMap<String, Entry> {
    let mut entries = HashMap::new();
    for dir in dirs {
        let listing = match std::fs::read_dir(dir) {
            Ok(listing) => listing,
            Err(e) => {
                log::debug!("Skipping app dir {}: {e}", dir.display());
                continue;
            },
        };
        for path in listing.filter_map(|e| e.ok()).map(|e| e.path()) {
            if path.extension().and_then(|e| e.to_str()) != Some("desktop") {
                continue;
            }
            let Some(key) = entry_key(&path) else {
                continue;
            };
            let parsed = std::fs::read_to_string(&path)
                .ok()
                .and_then(|text| parse_desktop_file(&text));
            match parsed {
                Some(de) if de.is_launchable() => {
                    entries.insert(key, de.into_entry());
                },
                Some(_) => log::debug!("Hidden desktop entry {}", path.display()),
                None => log::debug!("Unusable desktop entry {}", path.display()),
            }
        }
    }
    log::info!("Discovered {} applications", entries.len());
    entries
}
