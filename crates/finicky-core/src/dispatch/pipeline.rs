//! The production event handler: assemble, evaluate, resolve, launch.

use std::sync::Arc;

use crate::browser::{BrowserDirective, BrowserResolver, LaunchCommand, Launcher, SystemLauncher};
use crate::config::DaemonConfig;
use crate::error::DispatchError;
use crate::event::IncomingUrlEvent;
use crate::os::{OsIntegration, SystemIntegration};
use crate::policy::{self, PolicyConfig, PolicySearch};
use crate::sandbox::PolicyHost;
use crate::shorturl::{CurlProbe, RedirectProbe};

use super::EventHandler;

pub struct Pipeline {
    search: PolicySearch,
    host: PolicyHost,
    resolver: BrowserResolver,
    launcher: Arc<dyn Launcher>,
}

impl Pipeline {
    pub fn new(
        search: PolicySearch,
        host: PolicyHost,
        resolver: BrowserResolver,
        launcher: Arc<dyn Launcher>,
    ) -> Self {
        Self {
            search,
            host,
            resolver,
            launcher,
        }
    }

    /// Everything up to (not including) spawning the browser.
    pub fn evaluate_only(
        &self,
        event: &IncomingUrlEvent,
    ) -> Result<(BrowserDirective, LaunchCommand), DispatchError> {
        let policy = policy::assemble(&self.search)?;
        let directive = self.host.evaluate(&policy, event)?;
        let command = self.resolver.command_for(&directive);
        Ok((directive, command))
    }

    /// Assemble and validate the policy without a URL.
    pub fn check(&self) -> Result<PolicyConfig, DispatchError> {
        let policy = policy::assemble(&self.search)?;
        self.host.check(&policy)?;
        Ok(policy)
    }
}

impl EventHandler for Pipeline {
    fn handle(&self, event: IncomingUrlEvent) -> Result<LaunchCommand, DispatchError> {
        let (directive, command) = self.evaluate_only(&event)?;
        tracing::debug!(
            browser = %directive.name,
            app_type = ?directive.app_type,
            "policy chose a browser"
        );
        self.launcher.launch(&command)?;
        Ok(command)
    }
}

/// Process-wide collaborators shared by every event.
pub struct DaemonContext {
    pub config: DaemonConfig,
    pub os: Arc<dyn OsIntegration>,
    pub launcher: Arc<dyn Launcher>,
    pub search: PolicySearch,
    pub probe: Arc<dyn RedirectProbe>,
}

impl DaemonContext {
    /// Real OS lookups, real process spawning and libcurl redirect probing.
    pub fn system(config: DaemonConfig, search: PolicySearch) -> Self {
        let probe = Arc::new(CurlProbe::new(&config.short_url));
        Self {
            config,
            os: Arc::new(SystemIntegration::new()),
            launcher: Arc::new(SystemLauncher),
            search,
            probe,
        }
    }

    pub fn pipeline(&self) -> Pipeline {
        let host = PolicyHost::new(
            Arc::clone(&self.os),
            Arc::clone(&self.probe),
            self.config.sandbox.clone(),
        );
        let resolver = BrowserResolver::new(Arc::clone(&self.os), self.config.launcher.program.clone());
        Pipeline::new(self.search.clone(), host, resolver, Arc::clone(&self.launcher))
    }
}
