use crate::error::KnobError;
use crate::knob::{Attribute, Knob, KnobConfig};
use derive_more::{Deref, Display, From, Into};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Instance defaults every knob starts from before its own attributes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize, Deref, From, Into)]
#[serde(transparent)]
pub struct KnobDefaults(KnobConfig);

/// Attribute value as written in the settings file.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Display)]
#[serde(untagged)]
pub enum AttributeValue {
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct KnobDefinition {
    pub label: String,
    #[serde(default)]
    pub attributes: BTreeMap<Attribute, AttributeValue>,
}

impl KnobDefinition {
    /// Sets the attributes on `knob`, range before `value`.
    pub fn apply_to(&self, knob: &Knob) -> Result<(), KnobError> {
        for (attribute, value) in &self.attributes {
            knob.set_attribute(&attribute.to_string(), &value.to_string())?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub defaults: KnobDefaults,
    #[serde(default)]
    pub knobs: Vec<KnobDefinition>,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to determine config directory")]
    ConfigDirNotFound,
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
}

pub fn get_config_path() -> Result<PathBuf, ConfigError> {
    let proj_dirs =
        ProjectDirs::from("org", "arc-knob", "arc-knob").ok_or(ConfigError::ConfigDirNotFound)?;
    Ok(proj_dirs.config_dir().join("config.toml"))
}

/// Overrides such as `ARC_KNOB_DEFAULTS__MAX=100` or
/// `ARC_KNOB_DEFAULTS__STROKE_WIDTH=8`.
fn environment() -> config::Environment {
    config::Environment::with_prefix("ARC_KNOB")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

fn load_with(path: &Path, environment: config::Environment) -> Result<Settings, ConfigError> {
    let s = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(environment)
        .build()?;

    Ok(s.try_deserialize()?)
}

pub fn load_config_from(path: &Path) -> Result<Settings, ConfigError> {
    load_with(path, environment())
}

pub fn load_config() -> Result<Settings, ConfigError> {
    load_config_from(&get_config_path()?)
}

pub fn parse_settings(toml: &str) -> Result<Settings, ConfigError> {
    let s = config::Config::builder()
        .add_source(config::File::from_str(toml, config::FileFormat::Toml))
        .build()?;

    Ok(s.try_deserialize()?)
}

/// Loads the user's settings, falling back to the defaults when there is no
/// file or it cannot be read.
pub fn load_or_default() -> Settings {
    match load_config() {
        Ok(settings) => settings,
        Err(e) => {
            log::warn!("Using default knob settings: {}", e);
            Settings::default()
        }
    }
}

/// Writes [`DEFAULT_CONFIG`] to `path`. Returns `false` and leaves the file
/// alone when it already exists.
pub fn write_default_config(path: &Path) -> std::io::Result<bool> {
    if let Some(dir) = path.parent() {
        fs_err::create_dir_all(dir)?;
    }
    let mut file = match fs_err::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
    {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(e),
    };
    file.write_all(DEFAULT_CONFIG.as_bytes())?;
    Ok(true)
}

pub const DEFAULT_CONFIG: &str = include_str!("default_config.toml");
