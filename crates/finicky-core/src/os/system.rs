//! OS integration backed by command-line tools.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::{ModifierKeys, OsIntegration};

/// Resolves applications with `osascript` and the standard application folders.
///
/// Modifier key state needs a native event tap, which this implementation does
/// not have; it always reports no keys held.
#[derive(Debug, Clone)]
pub struct SystemIntegration {
    app_dirs: Vec<PathBuf>,
}

impl Default for SystemIntegration {
    fn default() -> Self {
        let mut app_dirs = vec![
            PathBuf::from("/Applications"),
            PathBuf::from("/System/Applications"),
        ];
        if let Some(home) = dirs::home_dir() {
            app_dirs.push(home.join("Applications"));
        }
        Self { app_dirs }
    }
}

impl SystemIntegration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Search only the given application folders (in order).
    pub fn with_app_dirs(app_dirs: Vec<PathBuf>) -> Self {
        Self { app_dirs }
    }
}

impl OsIntegration for SystemIntegration {
    fn resolve_bundle_id(&self, name: &str) -> Option<String> {
        let script = format!("id of application \"{}\"", escape_applescript(name));
        let output = Command::new("osascript")
            .arg("-e")
            .arg(&script)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .ok()?;
        if !output.status.success() {
            return None;
        }
        let id = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if id.is_empty() {
            None
        } else {
            Some(id)
        }
    }

    fn resolve_app_path(&self, name: &str) -> Option<String> {
        find_app_bundle(&self.app_dirs, name).map(|p| p.to_string_lossy().into_owned())
    }

    fn current_modifier_keys(&self) -> ModifierKeys {
        ModifierKeys::default()
    }
}

fn escape_applescript(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// `name` may already be a path to an `.app` bundle; otherwise look for
/// `<dir>/<name>.app` in each folder.
fn find_app_bundle(app_dirs: &[PathBuf], name: &str) -> Option<PathBuf> {
    let direct = Path::new(name);
    if direct.is_absolute() && direct.exists() {
        return Some(direct.to_path_buf());
    }
    let bundle = if name.ends_with(".app") {
        name.to_string()
    } else {
        format!("{}.app", name)
    };
    app_dirs
        .iter()
        .map(|dir| dir.join(&bundle))
        .find(|candidate| candidate.exists())
}
