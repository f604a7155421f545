//! Map a directive to a concrete launch command.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use super::directive::{AppType, BrowserDirective};
use crate::os::OsIntegration;

/// Whether the identifier passed to the launcher is a bundle id or an
/// application name/path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IdentifierKind {
    BundleId,
    Application,
}

impl IdentifierKind {
    pub fn flag(self) -> &'static str {
        match self {
            IdentifierKind::BundleId => "-b",
            IdentifierKind::Application => "-a",
        }
    }
}

/// A fully built invocation of the OS's application-open program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl fmt::Display for LaunchCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

pub struct BrowserResolver {
    os: Arc<dyn OsIntegration>,
    program: String,
}

impl BrowserResolver {
    pub fn new(os: Arc<dyn OsIntegration>, program: impl Into<String>) -> Self {
        Self {
            os,
            program: program.into(),
        }
    }

    /// Resolve the identifier for `directive`.
    ///
    /// For `AppType::Name`: bundle id first, then installed path, then the
    /// literal name treated as a bundle id.
    pub fn resolve_identifier(&self, directive: &BrowserDirective) -> (IdentifierKind, String) {
        match directive.app_type {
            AppType::Name => {
                let name = &directive.name;
                if let Some(bundle_id) = self.os.resolve_bundle_id(name) {
                    tracing::debug!("resolved bundle id for {}: {}", name, bundle_id);
                    (IdentifierKind::BundleId, bundle_id)
                } else if let Some(path) = self.os.resolve_app_path(name) {
                    tracing::debug!("using app path for {}: {}", name, path);
                    (IdentifierKind::Application, path)
                } else {
                    tracing::warn!("could not resolve app {}, using name as-is", name);
                    (IdentifierKind::BundleId, name.clone())
                }
            }
            AppType::BundleId => (IdentifierKind::BundleId, directive.name.clone()),
            AppType::Path | AppType::None => (IdentifierKind::Application, directive.name.clone()),
        }
    }

    pub fn command_for(&self, directive: &BrowserDirective) -> LaunchCommand {
        let (kind, identifier) = self.resolve_identifier(directive);
        LaunchCommand {
            program: self.program.clone(),
            args: launch_args(directive, kind, identifier),
        }
    }
}

/// `<kind flag> <identifier> <args...> [--profile=<p>] <url>`; the URL is always last.
///
/// `open_in_background` is decoded but does not change the command line.
pub fn launch_args(directive: &BrowserDirective, kind: IdentifierKind, identifier: String) -> Vec<String> {
    let mut args = Vec::with_capacity(directive.args.len() + 4);
    args.push(kind.flag().to_string());
    args.push(identifier);
    args.extend(directive.args.iter().cloned());
    if let Some(profile) = &directive.profile {
        args.push(format!("--profile={}", profile));
    }
    args.push(directive.url.clone());
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::os::ModifierKeys;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeOs {
        bundle_id: Option<String>,
        app_path: Option<String>,
        calls: Mutex<Vec<&'static str>>,
    }

    impl OsIntegration for FakeOs {
        fn resolve_bundle_id(&self, _name: &str) -> Option<String> {
            self.calls.lock().unwrap().push("bundle_id");
            self.bundle_id.clone()
        }
        fn resolve_app_path(&self, _name: &str) -> Option<String> {
            self.calls.lock().unwrap().push("app_path");
            self.app_path.clone()
        }
        fn current_modifier_keys(&self) -> ModifierKeys {
            ModifierKeys::default()
        }
    }

    fn directive(name: &str, app_type: AppType) -> BrowserDirective {
        BrowserDirective {
            name: name.to_string(),
            app_type,
            open_in_background: false,
            profile: None,
            args: vec![],
            url: "https://x.com".to_string(),
        }
    }

    #[test]
    fn name_resolved_to_bundle_id() {
        let os = Arc::new(FakeOs {
            bundle_id: Some("com.apple.Safari".into()),
            ..Default::default()
        });
        let r = BrowserResolver::new(os.clone(), "open");
        let cmd = r.command_for(&directive("Safari", AppType::Name));
        assert_eq!(cmd.program, "open");
        assert_eq!(cmd.args, vec!["-b", "com.apple.Safari", "https://x.com"]);
        assert_eq!(*os.calls.lock().unwrap(), vec!["bundle_id"]);
    }

    #[test]
    fn name_falls_back_to_app_path() {
        let os = Arc::new(FakeOs {
            app_path: Some("/Applications/Arc.app".into()),
            ..Default::default()
        });
        let r = BrowserResolver::new(os.clone(), "open");
        let cmd = r.command_for(&directive("Arc", AppType::Name));
        assert_eq!(cmd.args, vec!["-a", "/Applications/Arc.app", "https://x.com"]);
        assert_eq!(*os.calls.lock().unwrap(), vec!["bundle_id", "app_path"]);
    }

    #[test]
    fn name_falls_back_to_literal_bundle_id() {
        let os = Arc::new(FakeOs::default());
        let r = BrowserResolver::new(os.clone(), "open");
        let cmd = r.command_for(&directive("Mystery", AppType::Name));
        assert_eq!(cmd.args, vec!["-b", "Mystery", "https://x.com"]);
        assert_eq!(*os.calls.lock().unwrap(), vec!["bundle_id", "app_path"]);
    }

    #[test]
    fn non_name_types_skip_resolution() {
        let os = Arc::new(FakeOs {
            bundle_id: Some("should.not.be.used".into()),
            ..Default::default()
        });
        let r = BrowserResolver::new(os.clone(), "open");
        assert_eq!(
            r.command_for(&directive("org.mozilla.firefox", AppType::BundleId)).args,
            vec!["-b", "org.mozilla.firefox", "https://x.com"]
        );
        assert_eq!(
            r.command_for(&directive("/Applications/Foo.app", AppType::Path)).args,
            vec!["-a", "/Applications/Foo.app", "https://x.com"]
        );
        assert_eq!(
            r.command_for(&directive("Foo", AppType::None)).args,
            vec!["-a", "Foo", "https://x.com"]
        );
        assert!(os.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn path_with_profile_and_args() {
        let r = BrowserResolver::new(Arc::new(FakeOs::default()), "open");
        let mut d = directive("/Applications/Foo.app", AppType::Path);
        d.profile = Some("work".into());
        d.args = vec!["--flag".into()];
        d.url = "https://y.com".into();
        let cmd = r.command_for(&d);
        assert_eq!(
            cmd.args,
            vec!["-a", "/Applications/Foo.app", "--flag", "--profile=work", "https://y.com"]
        );
        assert_eq!(
            cmd.to_string(),
            "open -a /Applications/Foo.app --flag --profile=work https://y.com"
        );
    }

    #[test]
    fn url_is_always_last_and_args_keep_order() {
        for background in [false, true] {
            for profile in [None, Some("p".to_string())] {
                for args in [vec![], vec!["--a".to_string(), "--b".to_string()]] {
                    let d = BrowserDirective {
                        name: "com.x".into(),
                        app_type: AppType::BundleId,
                        open_in_background: background,
                        profile: profile.clone(),
                        args: args.clone(),
                        url: "https://z.com".into(),
                    };
                    let out = launch_args(&d, IdentifierKind::BundleId, "com.x".into());
                    assert_eq!(out.last().map(String::as_str), Some("https://z.com"));

                    let id_pos = out.iter().position(|a| a == "com.x").unwrap();
                    assert_eq!(out[id_pos - 1], "-b");
                    assert_eq!(&out[id_pos + 1..id_pos + 1 + args.len()], args.as_slice());
                    if let Some(p) = &profile {
                        assert_eq!(out[out.len() - 2], format!("--profile={}", p));
                    }
                    assert_eq!(out.first().map(String::as_str), Some("-b"));
                    assert!(!out.iter().any(|a| a == "-g"));
                }
            }
        }
    }
}
