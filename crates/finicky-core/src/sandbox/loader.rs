//! Module loader serving a compiled policy's imports out of its bundle.

use std::sync::Arc;

use rquickjs::loader::{Loader, Resolver};
use rquickjs::module::Declared;
use rquickjs::{Ctx, Error, Module};

use crate::policy::ModuleBundle;

#[derive(Debug, Clone)]
pub(crate) struct BundleModules(pub(crate) Arc<ModuleBundle>);

impl Resolver for BundleModules {
    fn resolve<'js>(&mut self, _ctx: &Ctx<'js>, base: &str, name: &str) -> rquickjs::Result<String> {
        self.0.resolve(base, name).ok_or_else(|| {
            Error::new_resolving_message(base, name, "not part of the compiled policy")
        })
    }
}

impl Loader for BundleModules {
    fn load<'js>(&mut self, ctx: &Ctx<'js>, name: &str) -> rquickjs::Result<Module<'js, Declared>> {
        let source = self.0.source(name).ok_or_else(|| Error::new_loading(name))?;
        Module::declare(ctx.clone(), name, source)
    }
}
