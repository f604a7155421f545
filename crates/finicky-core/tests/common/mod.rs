#![allow(dead_code)]

pub mod redirect_server;

use std::collections::HashMap;
use std::sync::Mutex;

use finicky_core::browser::{LaunchCommand, Launcher};
use finicky_core::error::DispatchError;
use finicky_core::os::{ModifierKeys, OsIntegration};
use finicky_core::shorturl::{ProbeMethod, ProbeResponse, RedirectProbe};

/// OS integration backed by fixed lookup tables.
#[derive(Default)]
pub struct FakeOs {
    pub bundle_ids: HashMap<String, String>,
    pub app_paths: HashMap<String, String>,
}

impl FakeOs {
    pub fn with_bundle_id(mut self, name: &str, id: &str) -> Self {
        self.bundle_ids.insert(name.to_string(), id.to_string());
        self
    }
}

impl OsIntegration for FakeOs {
    fn resolve_bundle_id(&self, name: &str) -> Option<String> {
        self.bundle_ids.get(name).cloned()
    }

    fn resolve_app_path(&self, name: &str) -> Option<String> {
        self.app_paths.get(name).cloned()
    }

    fn current_modifier_keys(&self) -> ModifierKeys {
        ModifierKeys::default()
    }
}

/// Redirect probe that fails every request and counts them.
#[derive(Default)]
pub struct NoNetwork {
    pub calls: Mutex<usize>,
}

impl RedirectProbe for NoNetwork {
    fn fetch(&self, _method: ProbeMethod, _url: &str) -> Result<ProbeResponse, String> {
        *self.calls.lock().unwrap() += 1;
        Err("network disabled in tests".to_string())
    }
}

/// Launcher that records commands instead of spawning them.
#[derive(Default)]
pub struct RecordingLauncher {
    pub launched: Mutex<Vec<LaunchCommand>>,
}

impl RecordingLauncher {
    pub fn commands(&self) -> Vec<LaunchCommand> {
        self.launched.lock().unwrap().clone()
    }
}

impl Launcher for RecordingLauncher {
    fn launch(&self, command: &LaunchCommand) -> Result<(), DispatchError> {
        self.launched.lock().unwrap().push(command.clone());
        Ok(())
    }
}
