//! Pass configuration.

use serde::{Deserialize, Serialize};

/// Build mode signal. Production builds get no instrumentation at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    #[default]
    Development,
    Production,
}

impl BuildMode {
    /// Read the mode from `NODE_ENV`. Anything other than `production`
    /// (including an unset variable) is a development build.
    pub fn from_env() -> Self {
        match std::env::var("NODE_ENV") {
            Ok(value) => Self::from_node_env(&value),
            Err(_) => BuildMode::Development,
        }
    }

    pub fn from_node_env(value: &str) -> Self {
        if value == "production" {
            BuildMode::Production
        } else {
            BuildMode::Development
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, BuildMode::Production)
    }
}

/// Where registration calls go: `<global>.<method>(value, name, file)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationConfig {
    /// Runtime global probed with `typeof` before any call is made.
    pub global: String,
    /// Method on the runtime global receiving each binding.
    pub method: String,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            global: "__RLYEH__".to_string(),
            method: "register".to_string(),
        }
    }
}

/// Naming of lifted methods: field `foo` becomes `__foo__<TAG>__`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiftConfig {
    pub tag: String,
}

impl Default for LiftConfig {
    fn default() -> Self {
        Self {
            tag: "RLYEH".to_string(),
        }
    }
}

impl LiftConfig {
    /// Name of the method a field named `field` is lifted into.
    pub fn method_name(&self, field: &str) -> String {
        format!("__{}__{}__", field, self.tag)
    }

    /// If `name` is a lifted method name, the field it was lifted from.
    pub fn lifted_field<'a>(&self, name: &'a str) -> Option<&'a str> {
        let field = name
            .strip_prefix("__")?
            .strip_suffix("__")?
            .strip_suffix(self.tag.as_str())?
            .strip_suffix("__")?;
        if field.is_empty() {
            None
        } else {
            Some(field)
        }
    }
}

/// Options for the combined plugin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    pub registration: RegistrationConfig,
    pub lifting: LiftConfig,
    /// Explicit build mode. `None` reads `NODE_ENV` when the plugin is built.
    pub build_mode: Option<BuildMode>,
}
