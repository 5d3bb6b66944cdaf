//! `rlyeh.toml` loading.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use rlyeh_loader::TemplateSource;
use rlyeh_transform::{BuildMode, LiftConfig, Options, RegistrationConfig};
use serde::Deserialize;

pub const CONFIG_FILE: &str = "rlyeh.toml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Overrides `NODE_ENV` when set.
    pub build_mode: Option<BuildMode>,
    pub registration: RegistrationConfig,
    pub lifting: LiftConfig,
    pub loader: LoaderConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderConfig {
    pub source_map: bool,
    /// Tagger fragment to use instead of the bundled one.
    pub template: Option<PathBuf>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            source_map: true,
            template: None,
        }
    }
}

impl Config {
    /// Load `path`, or `./rlyeh.toml` when no path is given. A missing default
    /// file yields the defaults; a missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(CONFIG_FILE), false),
        };

        if !explicit && !path.exists() {
            log::debug!("no {} found, using defaults", CONFIG_FILE);
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::parse(&text)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn options(&self) -> Options {
        Options {
            registration: self.registration.clone(),
            lifting: self.lifting.clone(),
            build_mode: self.build_mode,
        }
    }

    pub fn template_source(&self) -> TemplateSource {
        match &self.loader.template {
            Some(path) => TemplateSource::File(path.clone()),
            None => TemplateSource::Bundled,
        }
    }
}
