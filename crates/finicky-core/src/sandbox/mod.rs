//! PolicyHost: evaluates the user's policy for one event inside a fresh
//! QuickJS sandbox and returns the browser directive it chose.
//!
//! A sandbox lives for exactly one call. Nothing the policy does (globals,
//! prototype patches, leaked state) survives into the next event.
//!
//! Evaluation order inside the sandbox:
//!
//! 1. host bridges (`console`, `self`, the URL parser) and the embedded
//!    policy library, which defines `finickyConfigAPI`;
//! 2. the compiled user policy evaluated as an ES module, its imports
//!    served from the bundle, and its namespace bound to `finickyConfig`
//!    (an empty namespace when there is no script);
//! 3. `mergeConfig` with the simple document embedded as literal data;
//! 4. `validateConfig`;
//! 5. URL normalization on the host, then `openUrl`.

mod bridge;
mod console;
mod loader;

use std::sync::Arc;

use rquickjs::{CatchResultExt, CaughtError, Context, Ctx, FromJs, Module, Object, Runtime, Value};
use serde::Deserialize;

use crate::browser::{BrowserDirective, DecodeError};
use crate::config::SandboxConfig;
use crate::error::{DispatchError, ScriptStage};
use crate::event::IncomingUrlEvent;
use crate::os::OsIntegration;
use crate::policy::{ModuleBundle, PolicyConfig, NAMESPACE};
use crate::shorturl::{RedirectProbe, ShortenerDomains, UrlNormalizer};

const POLICY_LIBRARY: &str = include_str!("../../js/finickyConfigAPI.js");

/// Host-relevant subset of `mergedConfig.options`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PolicyOptions {
    pub url_shorteners: Vec<String>,
    pub log_requests: bool,
}

pub struct PolicyHost {
    os: Arc<dyn OsIntegration>,
    probe: Arc<dyn RedirectProbe>,
    limits: SandboxConfig,
}

impl PolicyHost {
    pub fn new(
        os: Arc<dyn OsIntegration>,
        probe: Arc<dyn RedirectProbe>,
        limits: SandboxConfig,
    ) -> Self {
        Self { os, probe, limits }
    }

    /// Run the full policy for `event` and decode the resulting directive.
    pub fn evaluate(
        &self,
        policy: &PolicyConfig,
        event: &IncomingUrlEvent,
    ) -> Result<BrowserDirective, DispatchError> {
        let bundle = load_bundle(policy)?;
        self.with_sandbox(bundle.clone(), |ctx| {
            self.prepare(ctx, bundle.as_deref(), policy)?;
            self.open_url(ctx, event)
        })
    }

    /// Load, merge and validate the policy without handling a URL.
    pub fn check(&self, policy: &PolicyConfig) -> Result<(), DispatchError> {
        let bundle = load_bundle(policy)?;
        self.with_sandbox(bundle.clone(), |ctx| {
            self.prepare(ctx, bundle.as_deref(), policy)
        })
    }

    fn with_sandbox<T>(
        &self,
        bundle: Option<Arc<ModuleBundle>>,
        f: impl for<'js> FnOnce(&Ctx<'js>) -> Result<T, DispatchError>,
    ) -> Result<T, DispatchError> {
        let rt = Runtime::new().map_err(|e| DispatchError::RuntimeInit(e.to_string()))?;
        rt.set_memory_limit(self.limits.memory_limit_bytes);
        rt.set_max_stack_size(self.limits.max_stack_bytes);
        if let Some(bundle) = bundle {
            rt.set_loader(loader::BundleModules(bundle.clone()), loader::BundleModules(bundle));
        }
        let context = Context::full(&rt).map_err(|e| DispatchError::RuntimeInit(e.to_string()))?;
        context.with(|ctx| f(&ctx))
    }

    fn prepare<'js>(
        &self,
        ctx: &Ctx<'js>,
        bundle: Option<&ModuleBundle>,
        policy: &PolicyConfig,
    ) -> Result<(), DispatchError> {
        self.load_library(ctx)?;

        match bundle {
            Some(bundle) => load_policy_module(ctx, bundle)?,
            None => {
                let empty = Object::new(ctx.clone()).catch(ctx).map_err(script_load)?;
                ctx.globals().set(NAMESPACE, empty).catch(ctx).map_err(script_load)?;
            }
        }

        let document = match &policy.document {
            Some(raw) => {
                let literal = serde_json::to_string(raw).map_err(|e| DispatchError::ScriptRun {
                    stage: ScriptStage::Merge,
                    message: e.to_string(),
                })?;
                format!("JSON.parse({})", literal)
            }
            None => "undefined".to_string(),
        };
        eval::<()>(
            ctx,
            format!(
                "var mergedConfig = finickyConfigAPI.mergeConfig({}.default, {});",
                NAMESPACE, document
            ),
            ScriptStage::Merge,
        )?;

        eval::<()>(
            ctx,
            "var __finickyValidation = finickyConfigAPI.validateConfig(mergedConfig);",
            ScriptStage::Validate,
        )?;
        let valid: bool = eval(ctx, "!!__finickyValidation", ScriptStage::Validate)?;
        if !valid {
            let diagnostic: String = eval(ctx, "String(__finickyValidation)", ScriptStage::Validate)?;
            tracing::warn!("configuration is invalid: {}", diagnostic);
            return Err(DispatchError::ValidationFailed(diagnostic));
        }
        Ok(())
    }

    fn load_library<'js>(&self, ctx: &Ctx<'js>) -> Result<(), DispatchError> {
        let globals = ctx.globals();
        globals
            .set("self", globals.clone())
            .and_then(|_| console::install(ctx))
            .and_then(|_| bridge::install_url_parser(ctx))
            .catch(ctx)
            .map_err(script_load)?;

        ctx.eval::<(), _>(POLICY_LIBRARY)
            .catch(ctx)
            .map_err(script_load)?;

        bridge::install_finicky(ctx, self.os.clone())
            .catch(ctx)
            .map_err(script_load)
    }

    fn open_url<'js>(
        &self,
        ctx: &Ctx<'js>,
        event: &IncomingUrlEvent,
    ) -> Result<BrowserDirective, DispatchError> {
        let options = read_options(ctx)?;

        let normalizer = UrlNormalizer::new(
            ShortenerDomains::with_extra(&options.url_shorteners),
            self.probe.clone(),
        );
        let url = normalizer.resolve_or_original(&event.url);

        if options.log_requests {
            let opener = event.opener.as_ref().map(|o| o.name.as_str()).unwrap_or("unknown");
            tracing::info!("opening {} from {} (pid {})", url, opener, event.pid);
        }

        let globals = ctx.globals();
        let opener = opener_value(ctx, event);
        globals
            .set("url", url.as_str())
            .and_then(|_| globals.set("pid", event.pid))
            .and_then(|_| globals.set("opener", opener?))
            .catch(ctx)
            .map_err(|e| DispatchError::ScriptRun {
                stage: ScriptStage::OpenUrl,
                message: e.to_string(),
            })?;

        let json: Option<String> = eval(
            ctx,
            "JSON.stringify(finickyConfigAPI.openUrl(url, pid, opener, mergedConfig))",
            ScriptStage::OpenUrl,
        )?;
        let json = json.ok_or_else(|| DispatchError::DirectiveDecode(DecodeError::Missing.to_string()))?;
        tracing::debug!("policy returned {}", json);
        BrowserDirective::from_json(&json).map_err(|e| DispatchError::DirectiveDecode(e.to_string()))
    }
}

fn load_bundle(policy: &PolicyConfig) -> Result<Option<Arc<ModuleBundle>>, DispatchError> {
    policy
        .compiled
        .as_ref()
        .map(|compiled| compiled.bundle().map(Arc::new))
        .transpose()
}

/// Evaluate the entry module and bind its namespace to `finickyConfig`.
///
/// A policy written as CommonJS (`module.exports = ...`) has no default
/// export; its `module.exports` is used as the default instead.
fn load_policy_module<'js>(ctx: &Ctx<'js>, bundle: &ModuleBundle) -> Result<(), DispatchError> {
    let user_policy = |e: CaughtError<'_>| DispatchError::ScriptRun {
        stage: ScriptStage::UserPolicy,
        message: e.to_string(),
    };

    eval::<()>(
        ctx,
        "var module = { exports: {} }; var exports = module.exports; var __finickyExports = exports;",
        ScriptStage::UserPolicy,
    )?;

    let source = bundle.source(&bundle.entry).ok_or_else(|| DispatchError::ScriptRun {
        stage: ScriptStage::UserPolicy,
        message: format!("entry module {} missing from bundle", bundle.entry),
    })?;
    let declared = Module::declare(ctx.clone(), bundle.entry.as_str(), source)
        .catch(ctx)
        .map_err(user_policy)?;
    let (module, done) = declared.eval().catch(ctx).map_err(user_policy)?;
    done.finish::<()>().catch(ctx).map_err(user_policy)?;
    let namespace = module.namespace().catch(ctx).map_err(user_policy)?;
    ctx.globals().set(NAMESPACE, namespace).catch(ctx).map_err(user_policy)?;

    eval::<()>(
        ctx,
        format!(
            "if ({ns}.default === undefined) {{
             {ns} = {{ default: module.exports !== __finickyExports ? module.exports : __finickyExports.default }};
             }}",
            ns = NAMESPACE
        ),
        ScriptStage::UserPolicy,
    )
}

fn read_options<'js>(ctx: &Ctx<'js>) -> Result<PolicyOptions, DispatchError> {
    let json: Option<String> = eval(
        ctx,
        "JSON.stringify((mergedConfig && mergedConfig.options) || {})",
        ScriptStage::OpenUrl,
    )?;
    Ok(match json.map(|j| serde_json::from_str::<PolicyOptions>(&j)) {
        Some(Ok(options)) => options,
        Some(Err(e)) => {
            tracing::warn!("ignoring unreadable options: {}", e);
            PolicyOptions::default()
        }
        None => PolicyOptions::default(),
    })
}

fn opener_value<'js>(ctx: &Ctx<'js>, event: &IncomingUrlEvent) -> rquickjs::Result<Value<'js>> {
    let Some(info) = &event.opener else {
        return Ok(Value::new_null(ctx.clone()));
    };
    let obj = Object::new(ctx.clone())?;
    obj.set("name", info.name.as_str())?;
    obj.set("bundleID", info.bundle_id.as_str())?;
    obj.set("path", info.path.as_str())?;
    Ok(obj.into_value())
}

fn eval<'js, T: FromJs<'js>>(
    ctx: &Ctx<'js>,
    source: impl Into<Vec<u8>>,
    stage: ScriptStage,
) -> Result<T, DispatchError> {
    ctx.eval::<T, _>(source)
        .catch(ctx)
        .map_err(|e| DispatchError::ScriptRun {
            stage,
            message: e.to_string(),
        })
}

fn script_load(e: rquickjs::CaughtError<'_>) -> DispatchError {
    DispatchError::ScriptLoad(e.to_string())
}
