//! Console and error interception inside a sandboxed context.
//!
//! The context gets exactly one native entry point, `__relay_post`, which the
//! prelude captures into a closure and removes from the global object. The
//! native side posts to whatever run is bound to the current worker thread.
//!
//! `NativeFunction::from_copy_closure` cannot capture the host port (it is not
//! `Copy`), so the run's port lives in a thread-local outlet bound for the
//! duration of the run. A context only ever executes on the thread that
//! created it.

use std::cell::RefCell;

use boa_engine::object::FunctionObjectBuilder;
use boa_engine::property::Attribute;
use boa_engine::{js_string, Context, JsNativeError, JsResult, JsValue, NativeFunction, Source};

use xplayground_types::{ChannelMessage, HostPort, MessageKind, RunId};

/// Script evaluated before any user code.
const PRELUDE: &str = r#"
(function (global) {
    var post = global.__relay_post;
    delete global.__relay_post;

    function render(value) {
        if (typeof value === 'object') {
            try {
                var json = JSON.stringify(value);
                if (json !== undefined) {
                    return json;
                }
            } catch (e) {}
        }
        return String(value);
    }

    function send(kind, args, caught) {
        try {
            var parts = [];
            for (var i = 0; i < args.length; i++) {
                parts.push(render(args[i]));
            }
            post(kind, parts.join(' '), caught === true);
        } catch (e) {}
    }

    var console = {};
    ['log', 'info', 'warn', 'error'].forEach(function (kind) {
        console[kind] = function () { send(kind, arguments); };
    });
    global.console = console;

    global.onerror = function (message, source, line, column, error) {
        send('error', [message + ' (at ' + line + ':' + column + ')']);
    };

    Object.defineProperty(global, '__relay_report', {
        value: function (err) {
            var text;
            try {
                text = String(err);
                var stack = err && err.stack;
                if (typeof stack === 'string' && stack) {
                    text = stack.indexOf(text) === 0 ? stack : text + '\n' + stack;
                }
            } catch (e) {
                text = 'Uncaught exception';
            }
            send('error', [text], true);
        },
        writable: false,
        configurable: false,
        enumerable: false
    });
})(globalThis);
"#;

struct Outlet {
    run_id: RunId,
    port: HostPort,
    posted: usize,
    caught_throw: bool,
}

thread_local! {
    static OUTLET: RefCell<Option<Outlet>> = const { RefCell::new(None) };
}

/// What a run sent while its outlet was bound.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct OutletSummary {
    pub posted: usize,
    pub caught_throw: bool,
}

/// Binds a run's port to the current thread; unbinds on drop.
pub(crate) struct OutletGuard {
    run_id: RunId,
}

impl OutletGuard {
    pub(crate) fn bind(run_id: RunId, port: HostPort) -> Self {
        OUTLET.with(|cell| {
            *cell.borrow_mut() = Some(Outlet {
                run_id,
                port,
                posted: 0,
                caught_throw: false,
            });
        });
        Self { run_id }
    }

    pub(crate) fn run_id(&self) -> RunId {
        self.run_id
    }

    pub(crate) fn post(&self, kind: MessageKind, text: impl Into<String>) {
        post(kind, text.into());
    }

    pub(crate) fn summary(&self) -> OutletSummary {
        OUTLET.with(|cell| {
            cell.borrow()
                .as_ref()
                .map(|outlet| OutletSummary {
                    posted: outlet.posted,
                    caught_throw: outlet.caught_throw,
                })
                .unwrap_or_default()
        })
    }
}

impl Drop for OutletGuard {
    fn drop(&mut self) {
        OUTLET.with(|cell| cell.borrow_mut().take());
    }
}

fn post(kind: MessageKind, text: String) {
    OUTLET.with(|cell| {
        let mut cell = cell.borrow_mut();
        let Some(outlet) = cell.as_mut() else {
            tracing::trace!(%kind, "sandbox output with no bound run dropped");
            return;
        };
        let message = ChannelMessage::new(outlet.run_id, kind, text);
        if outlet.port.post_message(&message) {
            outlet.posted += 1;
            tracing::trace!(run_id = outlet.run_id, %kind, "relayed sandbox output");
        } else {
            tracing::debug!(run_id = outlet.run_id, %kind, "host channel closed");
        }
    });
}

fn mark_caught_throw() {
    OUTLET.with(|cell| {
        if let Some(outlet) = cell.borrow_mut().as_mut() {
            outlet.caught_throw = true;
        }
    });
}

/// Install the console overrides, the global error hook and the catch
/// reporter used by the run template.
pub fn install(context: &mut Context) -> JsResult<()> {
    let relay = FunctionObjectBuilder::new(context.realm(), NativeFunction::from_fn_ptr(relay_post))
        .name(js_string!("__relay_post"))
        .length(3)
        .constructor(false)
        .build();
    context.register_global_property(js_string!("__relay_post"), relay, Attribute::all())?;

    context.eval(Source::from_bytes(PRELUDE))?;
    Ok(())
}

/// `__relay_post(kind, text, caught)`
fn relay_post(_this: &JsValue, args: &[JsValue], ctx: &mut Context) -> JsResult<JsValue> {
    let kind = js_arg_to_string(args.first(), ctx)?;
    let text = js_arg_to_string(args.get(1), ctx)?;
    let caught = args.get(2).map(JsValue::to_boolean).unwrap_or(false);

    // `done` is reserved for the executor.
    let kind = match kind.parse::<MessageKind>() {
        Ok(MessageKind::Done) | Err(_) => {
            return Err(JsNativeError::typ()
                .with_message("invalid relay message kind")
                .into())
        }
        Ok(kind) => kind,
    };

    if caught {
        mark_caught_throw();
    }
    post(kind, text);
    Ok(JsValue::undefined())
}

fn js_arg_to_string(arg: Option<&JsValue>, ctx: &mut Context) -> JsResult<String> {
    match arg {
        Some(value) => Ok(value.to_string(ctx)?.to_std_string_escaped()),
        None => Ok(String::new()),
    }
}
