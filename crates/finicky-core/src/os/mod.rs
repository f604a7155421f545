//! Boundary to native OS facilities.
//!
//! The dispatch core only talks to these traits; how bundle ids are looked up
//! or how URL events are captured is up to each implementation.

mod source;
mod system;

pub use source::{ArgsSource, EventSource, StdinSource};
pub use system::SystemIntegration;

/// Modifier keys held down at the time a URL is evaluated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModifierKeys {
    pub shift: bool,
    pub option: bool,
    pub command: bool,
    pub control: bool,
    pub caps_lock: bool,
    pub fn_key: bool,
}

/// Application lookup and input state provided by the host OS.
pub trait OsIntegration: Send + Sync {
    /// Stable bundle identifier for an application display name.
    fn resolve_bundle_id(&self, name: &str) -> Option<String>;
    /// Installed application path for an application display name.
    fn resolve_app_path(&self, name: &str) -> Option<String>;
    fn current_modifier_keys(&self) -> ModifierKeys;
}
