//! Host-native globals the policy library and user policies rely on.

use std::sync::Arc;

use rquickjs::function::Opt;
use rquickjs::{Ctx, Exception, Function, Object, Value};
use url::Url;

use crate::os::{ModifierKeys, OsIntegration};

/// Global consumed by the library's `URL` shim.
pub(crate) const PARSE_URL_GLOBAL: &str = "__finickyParseUrl";

/// Installs `__finickyParseUrl(input, base?)`. Must run before the library loads.
pub(crate) fn install_url_parser<'js>(ctx: &Ctx<'js>) -> rquickjs::Result<()> {
    let parse = Function::new(
        ctx.clone(),
        |ctx: Ctx<'js>, input: String, base: Opt<String>| -> rquickjs::Result<Object<'js>> {
            let parsed = parse_url(&input, base.0.as_deref()).map_err(|e| {
                Exception::throw_type(&ctx, &format!("Invalid URL: {} ({})", input, e))
            })?;
            url_parts(&ctx, &parsed)
        },
    )?;
    ctx.globals().set(PARSE_URL_GLOBAL, parse)
}

fn parse_url(input: &str, base: Option<&str>) -> Result<Url, url::ParseError> {
    match base {
        Some(base) => Url::parse(base)?.join(input),
        None => Url::parse(input),
    }
}

fn url_parts<'js>(ctx: &Ctx<'js>, url: &Url) -> rquickjs::Result<Object<'js>> {
    let parts = Object::new(ctx.clone())?;
    parts.set("protocol", format!("{}:", url.scheme()))?;
    parts.set("username", url.username())?;
    parts.set("password", url.password().unwrap_or(""))?;
    parts.set("hostname", url.host_str().unwrap_or(""))?;
    parts.set("port", url.port().map(|p| p.to_string()).unwrap_or_default())?;
    parts.set("pathname", url.path())?;
    parts.set("search", prefixed('?', url.query()))?;
    parts.set("hash", prefixed('#', url.fragment()))?;
    parts.set("slashes", url.has_authority())?;
    Ok(parts)
}

// WHATWG reports an empty query or fragment as "" rather than "?" / "#".
fn prefixed(marker: char, part: Option<&str>) -> String {
    match part {
        Some(p) if !p.is_empty() => format!("{}{}", marker, p),
        _ => String::new(),
    }
}

/// Builds the `finicky` global from the library's utilities plus `getKeys()`.
pub(crate) fn install_finicky<'js>(
    ctx: &Ctx<'js>,
    os: Arc<dyn OsIntegration>,
) -> rquickjs::Result<()> {
    let globals = ctx.globals();
    let api: Object = globals.get("finickyConfigAPI")?;
    let utilities: Object = api.get("utilities")?;

    let finicky = Object::new(ctx.clone())?;
    for key in utilities.keys::<String>() {
        let key = key?;
        let value: Value = utilities.get(key.as_str())?;
        finicky.set(key, value)?;
    }

    let get_keys = Function::new(ctx.clone(), move |ctx: Ctx<'js>| {
        modifier_object(&ctx, os.current_modifier_keys())
    })?;
    finicky.set("getKeys", get_keys)?;
    globals.set("finicky", finicky)
}

fn modifier_object<'js>(ctx: &Ctx<'js>, keys: ModifierKeys) -> rquickjs::Result<Object<'js>> {
    let obj = Object::new(ctx.clone())?;
    obj.set("shift", keys.shift)?;
    obj.set("option", keys.option)?;
    obj.set("command", keys.command)?;
    obj.set("control", keys.control)?;
    obj.set("capsLock", keys.caps_lock)?;
    obj.set("fn", keys.fn_key)?;
    Ok(obj)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rquickjs::{Context, Runtime};

    fn with_parser<R>(f: impl for<'js> FnOnce(Ctx<'js>) -> R) -> R {
        let rt = Runtime::new().unwrap();
        let ctx = Context::full(&rt).unwrap();
        ctx.with(|ctx| {
            install_url_parser(&ctx).unwrap();
            f(ctx)
        })
    }

    #[test]
    fn parts_follow_whatwg_shapes() {
        with_parser(|ctx| {
            let json: String = ctx
                .eval("JSON.stringify(__finickyParseUrl('HTTPS://User:pw@Example.com:8443/a/b?q=1#frag'))")
                .unwrap();
            let v: serde_json::Value = serde_json::from_str(&json).unwrap();
            assert_eq!(v["protocol"], "https:");
            assert_eq!(v["username"], "User");
            assert_eq!(v["password"], "pw");
            assert_eq!(v["hostname"], "example.com");
            assert_eq!(v["port"], "8443");
            assert_eq!(v["pathname"], "/a/b");
            assert_eq!(v["search"], "?q=1");
            assert_eq!(v["hash"], "#frag");
            assert_eq!(v["slashes"], true);
        });
    }

    #[test]
    fn default_port_and_empty_query_are_blank() {
        with_parser(|ctx| {
            let json: String = ctx
                .eval("JSON.stringify(__finickyParseUrl('https://example.com:443/?'))")
                .unwrap();
            let v: serde_json::Value = serde_json::from_str(&json).unwrap();
            assert_eq!(v["port"], "");
            assert_eq!(v["search"], "");
        });
    }

    #[test]
    fn relative_input_resolves_against_base() {
        with_parser(|ctx| {
            let path: String = ctx
                .eval("__finickyParseUrl('../c', 'https://example.com/a/b/').pathname")
                .unwrap();
            assert_eq!(path, "/a/c");
        });
    }

    #[test]
    fn invalid_url_throws_type_error() {
        with_parser(|ctx| {
            let caught: String = ctx
                .eval("try { __finickyParseUrl('not a url'); 'no' } catch (e) { e instanceof TypeError ? 'type' : 'other' }")
                .unwrap();
            assert_eq!(caught, "type");
        });
    }

    #[test]
    fn mailto_has_no_authority() {
        with_parser(|ctx| {
            let slashes: bool = ctx.eval("__finickyParseUrl('mailto:a@b.c').slashes").unwrap();
            assert!(!slashes);
        });
    }
}
