//! Typed errors for each stage of the dispatch pipeline.
//!
//! Every per-event failure is reported as a `DispatchError`. The dispatch loop
//! asks `is_fatal()` to decide whether to abandon the event or stop the daemon.

use std::fmt;
use std::path::PathBuf;

/// Which guest call was running when a script error was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptStage {
    /// Executing the compiled user policy bundle.
    UserPolicy,
    /// `finickyConfigAPI.mergeConfig`.
    Merge,
    /// `finickyConfigAPI.validateConfig`.
    Validate,
    /// `finickyConfigAPI.openUrl`.
    OpenUrl,
}

impl fmt::Display for ScriptStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScriptStage::UserPolicy => "user policy",
            ScriptStage::Merge => "mergeConfig",
            ScriptStage::Validate => "validateConfig",
            ScriptStage::OpenUrl => "openUrl",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("no policy found (searched: {})", display_paths(.searched))]
    ConfigNotFound { searched: Vec<PathBuf> },

    #[error("failed to read {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build policy bundle from {}: {message}", .path.display())]
    BundleBuild { path: PathBuf, message: String },

    #[error("failed to create sandbox runtime: {0}")]
    RuntimeInit(String),

    #[error("failed to load policy library: {0}")]
    ScriptLoad(String),

    #[error("{stage} failed: {message}")]
    ScriptRun { stage: ScriptStage, message: String },

    #[error("configuration is invalid: {0}")]
    ValidationFailed(String),

    #[error("malformed browser directive: {0}")]
    DirectiveDecode(String),

    #[error("failed to start `{command}`: {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

impl DispatchError {
    /// True for failures that would repeat on every event: the sandbox cannot
    /// be created at all, or the embedded policy library does not load.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DispatchError::RuntimeInit(_) | DispatchError::ScriptLoad(_))
    }

    /// Short stable name used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::ConfigNotFound { .. } => "config-not-found",
            DispatchError::ConfigRead { .. } => "config-read",
            DispatchError::BundleBuild { .. } => "bundle-build",
            DispatchError::RuntimeInit(_) => "runtime-init",
            DispatchError::ScriptLoad(_) => "script-load",
            DispatchError::ScriptRun { .. } => "script-run",
            DispatchError::ValidationFailed(_) => "validation",
            DispatchError::DirectiveDecode(_) => "directive-decode",
            DispatchError::Launch { .. } => "launch",
        }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_initialization_failures_are_fatal() {
        assert!(DispatchError::RuntimeInit("oom".into()).is_fatal());
        assert!(DispatchError::ScriptLoad("syntax".into()).is_fatal());

        assert!(!DispatchError::ConfigNotFound { searched: vec![] }.is_fatal());
        assert!(!DispatchError::ValidationFailed("bad".into()).is_fatal());
        assert!(!DispatchError::ScriptRun {
            stage: ScriptStage::OpenUrl,
            message: "boom".into()
        }
        .is_fatal());
        assert!(!DispatchError::Launch {
            command: "open".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        }
        .is_fatal());
    }

    #[test]
    fn config_not_found_lists_searched_paths() {
        let err = DispatchError::ConfigNotFound {
            searched: vec![PathBuf::from("/a/.finicky.js"), PathBuf::from("/b/.finicky.json")],
        };
        let msg = err.to_string();
        assert!(msg.contains("/a/.finicky.js"));
        assert!(msg.contains("/b/.finicky.json"));
        assert_eq!(err.kind(), "config-not-found");
    }

    #[test]
    fn script_run_names_stage() {
        let err = DispatchError::ScriptRun {
            stage: ScriptStage::Merge,
            message: "TypeError: x is undefined".into(),
        };
        assert_eq!(err.to_string(), "mergeConfig failed: TypeError: x is undefined");
    }
}
