//! Probe over the context a host hands to the compiler plugin.
//!
//! Compiler hosts pass an API object (`{ types, template, ... }`). Bundler
//! loaders are invoked with a loader context that exposes an async
//! `callback`. Seeing the latter means the plugin was put in the loader chain.

use rlyeh_diagnostics::{Integration, Probe};
use serde_json::Value;

/// Check that `host` looks like a compiler plugin host.
pub fn probe_plugin_host(host: &Value) -> Probe<&Value> {
    let is_loader_context = host
        .as_object()
        .and_then(|object| object.get("callback"))
        .map_or(false, is_truthy);

    if is_loader_context {
        log::trace!("plugin host exposes a loader callback");
        Probe::WrongIntegration(Integration::Loader)
    } else {
        Probe::Ok(host)
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |n| n != 0.0 && !n.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
