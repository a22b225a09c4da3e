//! couchmode core.
//!
//! Input unification, navigation, icon asset resolution, and the
//! dirty-flag render loop for a TV-style launcher. This crate has no
//! platform dependencies: drawing, events, and the display surface are
//! reached through the traits in [`backend`].

// Re-exports from couch-types (foundation types and traits).
pub use couch_types::backend;
pub use couch_types::bitmap;
pub use couch_types::error;
pub use couch_types::input;

pub mod assets;
pub mod config;
pub mod desktop;
pub mod driver;
pub mod entry;
pub mod launch;
pub mod layout;
pub mod multiplex;
pub mod nav;
pub mod remote;
pub mod statusbar;

#[cfg(test)]
pub(crate) mod test_utils;
