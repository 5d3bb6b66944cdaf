//! The export tagger fragment appended to every loaded module.
//!
//! The fragment is loaded and sanitised once per process. Sanitising strips
//! the bits the authoring tools put in and squeezes the fragment onto a single
//! line so it adds as few generated lines as possible.

use std::path::PathBuf;

use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;
use rlyeh_diagnostics::Result;

/// Placeholder replaced with the JSON-quoted resource path.
pub const FILENAME_PLACEHOLDER: &str = "__FILENAME__";

const BUNDLED: &[u8] = include_bytes!("../assets/tagCommonJSExports.js");

static USE_STRICT: Lazy<Regex> = Lazy::new(|| Regex::new(r#"['"]use strict['"];"#).unwrap());
static ESLINT_LINE_COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"// eslint-disable-line .*\n").unwrap());
static GLOBAL_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\* global.*\*/").unwrap());
static LINE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*").unwrap());

/// Turn raw fragment bytes into the text that gets appended.
pub fn sanitize_template(raw: &[u8]) -> Result<String> {
    let text = std::str::from_utf8(raw)?;
    let text = USE_STRICT.replace(text, "");
    let text = ESLINT_LINE_COMMENT.replace_all(&text, "\n");
    let text = GLOBAL_COMMENT.replace(&text, "");
    Ok(LINE_BREAK.replace_all(&text, " ").into_owned())
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TemplateSource {
    /// The fragment compiled into this crate.
    #[default]
    Bundled,
    File(PathBuf),
}

/// Write-once holder of the sanitised fragment.
#[derive(Debug, Default)]
pub struct TemplateCache {
    source: TemplateSource,
    text: OnceCell<String>,
}

impl TemplateCache {
    pub fn new(source: TemplateSource) -> Self {
        Self {
            source,
            text: OnceCell::new(),
        }
    }

    pub fn source(&self) -> &TemplateSource {
        &self.source
    }

    /// The sanitised fragment, loading it on first use.
    pub fn get(&self) -> Result<&str> {
        let text = self.text.get_or_try_init(|| {
            let raw = match &self.source {
                TemplateSource::Bundled => BUNDLED.to_vec(),
                TemplateSource::File(path) => {
                    log::debug!("loading tagger template from {}", path.display());
                    std::fs::read(path)?
                }
            };
            sanitize_template(&raw)
        })?;
        Ok(text.as_str())
    }

    /// The fragment parameterised with `resource_path`.
    pub fn render(&self, resource_path: &str) -> Result<String> {
        let quoted = serde_json::to_string(resource_path)?;
        Ok(self.get()?.replace(FILENAME_PLACEHOLDER, &quoted))
    }
}

/// Process-wide cache over the bundled fragment.
pub fn bundled() -> &'static TemplateCache {
    static CACHE: Lazy<TemplateCache> = Lazy::new(TemplateCache::default);
    &CACHE
}
