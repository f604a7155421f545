//! Compile a policy script and the relative modules it imports into a bundle
//! the sandbox can load.
//!
//! The bundle is a JSON manifest naming the entry module and mapping each
//! module's path to its source. The sandbox evaluates the entry as a real ES
//! module and serves its imports out of the manifest, so nothing is read from
//! disk after compilation.
//!
//! Only relative (`./`, `../`) and absolute imports are followed. Package
//! imports fail the build: there is no package resolution in the sandbox.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use rquickjs::{CatchResultExt, Context, Module, Runtime};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::DispatchError;

/// Global that receives the compiled policy's namespace.
pub const NAMESPACE: &str = "finickyConfig";

/// Every module reachable from the entry, keyed by path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleBundle {
    pub entry: String,
    pub modules: BTreeMap<String, String>,
}

impl ModuleBundle {
    pub fn source(&self, name: &str) -> Option<&str> {
        self.modules.get(name).map(String::as_str)
    }

    /// Module name for `specifier` imported from the module named `base`.
    pub fn resolve(&self, base: &str, specifier: &str) -> Option<String> {
        if !is_relative(specifier) {
            return None;
        }
        resolve_specifier(Path::new(base), specifier, |p| {
            self.modules.contains_key(&module_name(p))
        })
        .map(|p| module_name(&p))
    }
}

/// The compiled policy, stored in a temporary file removed on drop.
#[derive(Debug)]
pub struct CompiledPolicy {
    source_path: PathBuf,
    file: NamedTempFile,
}

impl CompiledPolicy {
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn output_path(&self) -> &Path {
        self.file.path()
    }

    /// Read the manifest back from the output file.
    pub fn bundle(&self) -> Result<ModuleBundle, DispatchError> {
        let raw = fs::read_to_string(self.file.path()).map_err(|source| DispatchError::ConfigRead {
            path: self.file.path().to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|e| DispatchError::BundleBuild {
            path: self.source_path.clone(),
            message: format!("corrupt bundle {}: {}", self.file.path().display(), e),
        })
    }
}

fn static_import_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?m)(?:^|[;{}])\s*import\s*(?:[\w$*{][^;'"]*?\bfrom\s*)?["']([^"'\n]+)["']"#)
            .expect("valid regex")
    })
}

fn reexport_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?m)(?:^|[;{}])\s*export\s*(?:\*(?:\s*as\s+[\w$]+)?|\{[^}]*\})\s*from\s*["']([^"'\n]+)["']"#,
        )
        .expect("valid regex")
    })
}

fn dynamic_import_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?:^|[^.\w$])import\s*\(\s*["']([^"'\n]+)["']\s*\)"#).expect("valid regex")
    })
}

/// Blank out comments, keeping string contents and line breaks.
fn mask_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    let mut quote: Option<char> = None;

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            out.push(c);
            if c == '\\' {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' | '`' => {
                quote = Some(c);
                out.push(c);
            }
            // Escapes outside strings only occur in regex literals.
            '\\' => {
                out.push(c);
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            '/' if chars.peek() == Some(&'/') => {
                while chars.peek().is_some_and(|&n| n != '\n') {
                    chars.next();
                }
                out.push(' ');
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = ' ';
                for n in chars.by_ref() {
                    if n == '\n' {
                        out.push('\n');
                    }
                    if prev == '*' && n == '/' {
                        break;
                    }
                    prev = n;
                }
                out.push(' ');
            }
            _ => out.push(c),
        }
    }
    out
}

/// Specifiers of `source`, split into (required, optional). Dynamic imports
/// are optional: they only fail if the policy actually calls them.
fn import_specifiers(source: &str) -> (Vec<String>, Vec<String>) {
    let code = mask_comments(source);
    let capture = |re: &Regex| -> Vec<String> {
        re.captures_iter(&code)
            .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
            .collect()
    };
    let mut required = capture(static_import_re());
    required.extend(capture(reexport_re()));
    (required, capture(dynamic_import_re()))
}

fn is_relative(specifier: &str) -> bool {
    specifier.starts_with("./") || specifier.starts_with("../") || specifier.starts_with('/')
}

fn module_name(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut s: OsString = path.as_os_str().to_owned();
    s.push(suffix);
    PathBuf::from(s)
}

/// Resolve `specifier` against the directory of `base`, trying the exact
/// path, then `.js` / `.mjs`, then `index.js`.
fn resolve_specifier(base: &Path, specifier: &str, exists: impl Fn(&Path) -> bool) -> Option<PathBuf> {
    let joined = if specifier.starts_with('/') {
        PathBuf::from(specifier)
    } else {
        base.parent().unwrap_or_else(|| Path::new("/")).join(specifier)
    };
    let target = normalize(&joined);
    [
        target.clone(),
        with_suffix(&target, ".js"),
        with_suffix(&target, ".mjs"),
        target.join("index.js"),
    ]
    .into_iter()
    .find(|p| exists(p))
}

/// Walk the import graph from `entry`, reading every module once.
fn collect(entry: &Path, entry_source: String) -> Result<BTreeMap<String, String>, String> {
    let mut modules = BTreeMap::new();
    let mut pending = vec![(entry.to_path_buf(), Some(entry_source))];

    while let Some((path, source)) = pending.pop() {
        let name = module_name(&path);
        if modules.contains_key(&name) {
            continue;
        }
        let source = match source {
            Some(s) => s,
            None => fs::read_to_string(&path).map_err(|e| format!("read {}: {}", path.display(), e))?,
        };

        let (required, optional) = import_specifiers(&source);
        for spec in required {
            if !is_relative(&spec) {
                return Err(format!(
                    "package imports are not supported: '{}' (imported from {})",
                    spec,
                    path.display()
                ));
            }
            let found = resolve_specifier(&path, &spec, Path::is_file).ok_or_else(|| {
                format!("cannot resolve import '{}' from {}", spec, path.display())
            })?;
            pending.push((found, None));
        }
        for spec in optional.iter().filter(|s| is_relative(s)) {
            match resolve_specifier(&path, spec, Path::is_file) {
                Some(found) => pending.push((found, None)),
                None => tracing::debug!("dynamic import '{}' in {} not bundled", spec, path.display()),
            }
        }

        modules.insert(name, source);
    }
    Ok(modules)
}

/// Compile every module without running it, in a throwaway runtime.
fn syntax_check(bundle: &ModuleBundle) -> Result<(), String> {
    let rt = Runtime::new().map_err(|e| e.to_string())?;
    let ctx = Context::full(&rt).map_err(|e| e.to_string())?;
    ctx.with(|ctx| {
        for (name, source) in &bundle.modules {
            Module::declare(ctx.clone(), name.as_str(), source.as_str())
                .catch(&ctx)
                .map_err(|e| e.to_string())?;
        }
        Ok(())
    })
}

/// Compile the policy at `path` into a temporary bundle.
pub fn compile(path: &Path) -> Result<CompiledPolicy, DispatchError> {
    let build_err = |message: String| DispatchError::BundleBuild {
        path: path.to_path_buf(),
        message,
    };
    let read_err = |source| DispatchError::ConfigRead {
        path: path.to_path_buf(),
        source,
    };

    let entry = fs::canonicalize(path).map_err(read_err)?;
    let source = fs::read_to_string(&entry).map_err(read_err)?;
    let bundle = ModuleBundle {
        entry: module_name(&entry),
        modules: collect(&entry, source).map_err(build_err)?,
    };
    syntax_check(&bundle).map_err(build_err)?;

    let manifest = serde_json::to_vec(&bundle).map_err(|e| build_err(e.to_string()))?;
    let mut file = tempfile::Builder::new()
        .prefix("finicky_output")
        .suffix(".json")
        .tempfile()
        .map_err(|e| build_err(format!("create output file: {}", e)))?;
    file.write_all(&manifest)
        .and_then(|_| file.flush())
        .map_err(|e| build_err(format!("write output file: {}", e)))?;

    tracing::debug!(
        modules = bundle.modules.len(),
        "compiled {} to {}",
        path.display(),
        file.path().display()
    );

    Ok(CompiledPolicy {
        source_path: path.to_path_buf(),
        file,
    })
}
