//! Launchable entries and their commands.
//!
//! A command string is classified exactly once, when the entry is built:
//! `@name` becomes a [`Builtin`], anything else becomes a shell-style argv
//! with desktop-entry field codes (`%f`, `%U`, ...) removed.

use crate::bitmap::Bitmap;

/// Prefix that marks a builtin action.
pub const BUILTIN_SIGIL: char = '@';

/// Prefix of desktop-entry placeholder tokens dropped from argv.
const FIELD_CODE_SIGIL: char = '%';

/// Actions handled inside the launcher without spawning a process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Builtin {
    /// Leave the launcher and return to the desktop session.
    Desktop,
    /// A sigil command with no known handler. Ignored on activation.
    Unknown(String),
}

impl Builtin {
    fn from_name(name: &str) -> Self {
        match name {
            "desktop" => Self::Desktop,
            other => {
                log::warn!("Unknown builtin action '@{other}'");
                Self::Unknown(other.to_string())
            },
        }
    }
}

/// What activating an entry does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Builtin(Builtin),
    /// Program and arguments, already split and filtered.
    Shell(Vec<String>),
}

impl Command {
    /// Classify a command line.
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if let Some(name) = trimmed.strip_prefix(BUILTIN_SIGIL) {
            return Self::Builtin(Builtin::from_name(name.trim()));
        }
        Self::Shell(
            trimmed
                .split_whitespace()
                .filter(|tok| !tok.starts_with(FIELD_CODE_SIGIL))
                .map(str::to_string)
                .collect(),
        )
    }

    /// A command that opens `url` with the configured browser command line.
    pub fn web(browser: &str, url: &str) -> Self {
        let mut argv: Vec<String> = browser.split_whitespace().map(str::to_string).collect();
        argv.push(url.to_string());
        Self::Shell(argv)
    }
}

/// A single launchable item shown in the grid.
#[derive(Debug, Clone)]
pub struct Entry {
    pub name: String,
    /// Symbolic icon name or filesystem path.
    pub icon_ref: String,
    pub command: Command,
    /// Rasterized icon, filled in once by the asset resolver.
    pub icon: Option<Bitmap>,
}

impl Entry {
    pub fn new(name: impl Into<String>, icon_ref: impl Into<String>, command: Command) -> Self {
        Self {
            name: name.into(),
            icon_ref: icon_ref.into(),
            command,
            icon: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(cmd: &Command) -> Vec<&str> {
        match cmd {
            Command::Shell(argv) => argv.iter().map(String::as_str).collect(),
            other => panic!("expected shell command, got {other:?}"),
        }
    }

    #[test]
    fn parse_drops_field_codes() {
        let cmd = Command::parse("firefox --new-window %u");
        assert_eq!(argv(&cmd), ["firefox", "--new-window"]);
    }

    #[test]
    fn parse_collapses_whitespace() {
        let cmd = Command::parse("  kodi   --standalone\t%F ");
        assert_eq!(argv(&cmd), ["kodi", "--standalone"]);
    }

    #[test]
    fn parse_builtin_desktop() {
        assert_eq!(Command::parse("@desktop"), Command::Builtin(Builtin::Desktop));
    }

    #[test]
    fn parse_unknown_builtin_is_kept() {
        assert_eq!(
            Command::parse("@reboot"),
            Command::Builtin(Builtin::Unknown("reboot".into()))
        );
    }

    #[test]
    fn sigil_only_at_start() {
        let cmd = Command::parse("mail user@desktop");
        assert_eq!(argv(&cmd), ["mail", "user@desktop"]);
    }

    #[test]
    fn web_appends_url_to_browser() {
        let cmd = Command::web("browser", "http://e");
        assert_eq!(argv(&cmd), ["browser", "http://e"]);
    }

    #[test]
    fn web_splits_browser_flags() {
        let cmd = Command::web("firefox --kiosk", "https://youtube.com/tv");
        assert_eq!(argv(&cmd), ["firefox", "--kiosk", "https://youtube.com/tv"]);
    }

    #[test]
    fn empty_line_is_empty_argv() {
        assert_eq!(Command::parse("   "), Command::Shell(Vec::new()));
    }
}
