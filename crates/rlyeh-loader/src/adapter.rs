//! Position-mapping adapter: append the tagger fragment to emitted module text
//! and extend the incoming source map so original positions still resolve.
//!
//! The output text is `text + "\n\n" + fragment`. The input map is kept as is;
//! only its `mappings` string grows. Fragment lines receive generated-only
//! segments, so nothing in them resolves to an original position.

use rlyeh_diagnostics::{Error, Integration, Probe, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::sourcemap::{line_groups, SourceMapJson};
use crate::template::TemplateCache;

/// Between the module text and the fragment.
pub const SEPARATOR: &str = "\n\n";

/// What the loader was handed as module source.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceInput<'a> {
    Text(&'a str),
    /// Raw bytes (a serialised `Buffer`). Passed through untouched.
    Binary,
}

/// Classify the loader's source argument.
pub fn probe_source(source: &Value) -> Result<Probe<SourceInput<'_>>> {
    if let Some(text) = source.as_str() {
        return Ok(Probe::Ok(SourceInput::Text(text)));
    }

    if source.pointer("/types/IfStatement").map_or(false, |v| !v.is_null()) {
        log::trace!("loader received a compiler plugin API object");
        return Ok(Probe::WrongIntegration(Integration::CompilerPlugin));
    }

    if source.get("type").and_then(Value::as_str) == Some("Buffer")
        && source.get("data").map_or(false, Value::is_array)
    {
        return Ok(Probe::Ok(SourceInput::Binary));
    }

    Err(Error::malformed(format!(
        "loader source must be a string, got {}",
        kind_of(source)
    )))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// The host-side options the adapter reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoaderContext {
    pub resource_path: String,
    /// `false` when the host disabled source maps for this build.
    #[serde(default = "default_source_map")]
    pub source_map: bool,
}

fn default_source_map() -> bool {
    true
}

#[derive(Debug, Clone)]
pub struct AppendRequest<'a> {
    pub text: &'a str,
    pub map: Option<SourceMapJson>,
    pub resource_path: &'a str,
    pub source_map: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoaderOutput {
    pub code: String,
    /// Serialised source map, absent when source maps are disabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map: Option<String>,
}

/// Append the rendered fragment to `request.text`.
pub fn append(request: AppendRequest<'_>, template: &TemplateCache) -> Result<LoaderOutput> {
    let fragment = template.render(request.resource_path)?;
    let code = [request.text, fragment.as_str()].join(SEPARATOR);

    if !request.source_map {
        return Ok(LoaderOutput { code, map: None });
    }

    let mut map = match request.map {
        Some(map) => map,
        None => {
            log::debug!("no input map for {}, using identity map", request.resource_path);
            SourceMapJson::identity(request.text, request.resource_path)
        }
    };
    map.mappings = concat_mappings(&map.mappings, request.text, &fragment)?;
    map.ensure_source(request.resource_path);

    Ok(LoaderOutput {
        code,
        map: Some(map.to_json()?),
    })
}

/// `mappings` for `text + SEPARATOR + fragment`, given the mappings of `text`.
fn concat_mappings(mappings: &str, text: &str, fragment: &str) -> Result<String> {
    let text_lines = text.split('\n').count();
    let mut out = mappings.to_string();

    // Trailing empty groups say nothing; drop them before lining up.
    while line_groups(&out) > text_lines && out.ends_with(';') {
        out.pop();
    }
    let groups = line_groups(&out);
    if groups > text_lines {
        return Err(Error::malformed(format!(
            "source map covers {} lines but the module has {}",
            groups, text_lines
        )));
    }
    for _ in groups..text_lines {
        out.push(';');
    }

    // The separator ends the last module line and adds one empty line.
    let separator_lines = SEPARATOR.matches('\n').count();
    for _ in 1..separator_lines {
        out.push(';');
    }
    for _ in 0..fragment.split('\n').count() {
        out.push_str(";A");
    }
    Ok(out)
}

/// Loader entry point. Returns `None` for binary input, which is left alone.
pub fn loader(
    source: &Value,
    input_map: Option<&Value>,
    context: &LoaderContext,
    template: &TemplateCache,
) -> Result<Option<LoaderOutput>> {
    let text = match probe_source(source)?.into_result()? {
        SourceInput::Text(text) => text,
        SourceInput::Binary => {
            log::debug!("{} is binary, passing through", context.resource_path);
            return Ok(None);
        }
    };

    let map = match input_map {
        None | Some(Value::Null) => None,
        Some(Value::String(json)) => Some(SourceMapJson::from_json(json)?),
        Some(value) => Some(SourceMapJson::from_value(value.clone())?),
    };

    append(
        AppendRequest {
            text,
            map,
            resource_path: &context.resource_path,
            source_map: context.source_map,
        },
        template,
    )
    .map(Some)
}
