//! `console.*` bridge: guest log calls become tracing events.

use rquickjs::convert::Coerced;
use rquickjs::function::Rest;
use rquickjs::{Ctx, Function, Object, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Log,
    Warn,
    Error,
}

impl Level {
    fn prefix(self) -> &'static str {
        match self {
            Level::Log => "[js]",
            Level::Warn => "[js] [warn]",
            Level::Error => "[js] [error]",
        }
    }
}

pub(crate) fn install<'js>(ctx: &Ctx<'js>) -> rquickjs::Result<()> {
    let console = Object::new(ctx.clone())?;
    for (name, level) in [
        ("log", Level::Log),
        ("info", Level::Log),
        ("debug", Level::Log),
        ("warn", Level::Warn),
        ("error", Level::Error),
    ] {
        console.set(name, log_function(ctx, level)?)?;
    }
    ctx.globals().set("console", console)
}

fn log_function<'js>(ctx: &Ctx<'js>, level: Level) -> rquickjs::Result<Function<'js>> {
    Function::new(ctx.clone(), move |ctx: Ctx<'js>, args: Rest<Value<'js>>| {
        let line = format_line(&ctx, level.prefix(), &args.0);
        match level {
            Level::Log => tracing::info!("{}", line),
            Level::Warn => tracing::warn!("{}", line),
            Level::Error => tracing::error!("{}", line),
        }
    })
}

pub(crate) fn format_line<'js>(ctx: &Ctx<'js>, prefix: &str, args: &[Value<'js>]) -> String {
    let mut parts = Vec::with_capacity(args.len() + 1);
    parts.push(prefix.to_string());
    parts.extend(args.iter().map(|v| render(ctx, v)));
    parts.join(" ")
}

fn render<'js>(ctx: &Ctx<'js>, value: &Value<'js>) -> String {
    if value.is_object() {
        if let Ok(Some(json)) = stringify_pretty(ctx, value) {
            return json;
        }
    }
    value
        .get::<Coerced<String>>()
        .map(|s| s.0)
        .unwrap_or_else(|_| "[unprintable]".to_string())
}

fn stringify_pretty<'js>(ctx: &Ctx<'js>, value: &Value<'js>) -> rquickjs::Result<Option<String>> {
    let json: Object = ctx.globals().get("JSON")?;
    let stringify: Function = json.get("stringify")?;
    stringify.call((value.clone(), Value::new_null(ctx.clone()), 2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rquickjs::{Context, Runtime};

    fn line_for(script: &str) -> String {
        let rt = Runtime::new().unwrap();
        let ctx = Context::full(&rt).unwrap();
        ctx.with(|ctx| {
            let args: rquickjs::Array = ctx.eval(script).unwrap();
            let values: Vec<Value> = args.iter::<Value>().collect::<rquickjs::Result<_>>().unwrap();
            format_line(&ctx, "[js]", &values)
        })
    }

    #[test]
    fn primitives_are_space_joined() {
        assert_eq!(line_for(r#"["opening", 3, true, null]"#), "[js] opening 3 true null");
    }

    #[test]
    fn objects_are_pretty_printed() {
        assert_eq!(line_for(r#"[{a: 1}]"#), "[js] {\n  \"a\": 1\n}");
    }

    #[test]
    fn unserializable_values_fall_back_to_string() {
        let line = line_for("[function named() { return 1; }]");
        assert!(line.starts_with("[js] function named()"), "{}", line);

        let line = line_for("var o = {}; o.self = o; [o]");
        assert_eq!(line, "[js] [object Object]");
    }

    #[test]
    fn console_calls_do_not_throw() {
        let rt = Runtime::new().unwrap();
        let ctx = Context::full(&rt).unwrap();
        ctx.with(|ctx| {
            install(&ctx).unwrap();
            ctx.eval::<(), _>("console.log('a', {b: [1]}); console.warn('w'); console.error('e');")
                .unwrap();
        });
    }
}
