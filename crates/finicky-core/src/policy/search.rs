//! Where policies are looked up.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

const SCRIPT_NAME: &str = ".finicky.js";
const DOCUMENT_NAME: &str = ".finicky.json";

/// Ordered candidate paths for the scriptable policy and the simple document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicySearch {
    pub script_paths: Vec<PathBuf>,
    pub document_paths: Vec<PathBuf>,
}

impl PolicySearch {
    /// Search order from the environment: `DEBUG=true` selects the test
    /// fixtures, otherwise the home dotfile then the XDG config dotfile.
    pub fn from_env() -> Result<Self> {
        if std::env::var("DEBUG").map(|v| v == "true").unwrap_or(false) {
            return Ok(Self::debug_fixtures());
        }
        let home = dirs::home_dir().context("no home directory")?;
        let config_home = xdg::BaseDirectories::new()?.get_config_home();
        Ok(Self::in_dirs(&[home, config_home]))
    }

    pub fn debug_fixtures() -> Self {
        Self {
            script_paths: vec![PathBuf::from("./test/example.js")],
            document_paths: vec![PathBuf::from("./test/example.json")],
        }
    }

    /// `.finicky.js` / `.finicky.json` in each directory, in order.
    pub fn in_dirs(dirs: &[PathBuf]) -> Self {
        Self {
            script_paths: dirs.iter().map(|d| d.join(SCRIPT_NAME)).collect(),
            document_paths: dirs.iter().map(|d| d.join(DOCUMENT_NAME)).collect(),
        }
    }

    /// Fixed paths, e.g. from command-line overrides. `None` disables that kind.
    pub fn explicit(script: Option<PathBuf>, document: Option<PathBuf>) -> Self {
        Self {
            script_paths: script.into_iter().collect(),
            document_paths: document.into_iter().collect(),
        }
    }

    pub fn find_script(&self) -> Option<&Path> {
        first_existing(&self.script_paths)
    }

    pub fn find_document(&self) -> Option<&Path> {
        first_existing(&self.document_paths)
    }

    pub fn all_paths(&self) -> Vec<PathBuf> {
        self.script_paths
            .iter()
            .chain(self.document_paths.iter())
            .cloned()
            .collect()
    }
}

fn first_existing(paths: &[PathBuf]) -> Option<&Path> {
    paths.iter().map(PathBuf::as_path).find(|p| p.is_file())
}
