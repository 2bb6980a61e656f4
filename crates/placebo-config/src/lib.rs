//! `placebo.toml` configuration and logging setup.

#![forbid(unsafe_code)]

mod logging;

use std::path::{Path, PathBuf};

use placebo_ir::{FieldRef, PrimitiveKind, Type};
use placebo_synth::{AbstractionKind, SharedSet, SynthesisOptions};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use crate::logging::{init_tracing, LoggingConfig};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "placebo.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        let message = err.message().trim().to_string();
        match err.span() {
            Some(span) => ConfigError::Toml(format!("{message} (at byte {})", span.start)),
            None => ConfigError::Toml(message),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlaceboConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub synthesis: SynthesisConfig,
    #[serde(default)]
    pub reflection: ReflectionConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl PlaceboConfig {
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::load_from_str(&text)
    }

    pub fn load_from_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// `path` if given, else `placebo.toml` in `dir` when it exists, else
    /// the defaults.
    pub fn discover(path: Option<&Path>, dir: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            tracing::debug!(
                target: "placebo.config",
                path = %candidate.display(),
                "using discovered config file"
            );
            return Self::load_from_path(candidate);
        }
        Ok(Self::default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SynthesisConfig {
    #[serde(default)]
    pub abstraction: AbstractionKind,
    /// Worker threads; one per core when unset.
    #[serde(default)]
    pub threads: Option<usize>,
    #[serde(default = "SynthesisConfig::default_library_class")]
    pub shared_set_class: String,
    #[serde(default = "SynthesisConfig::default_shared_set_field")]
    pub shared_set_field: String,
    #[serde(default = "SynthesisConfig::default_library_class")]
    pub guard_class: String,
    #[serde(default = "SynthesisConfig::default_guard_field")]
    pub guard_field: String,
}

impl SynthesisConfig {
    fn default_library_class() -> String {
        "placebo.Library".to_owned()
    }

    fn default_shared_set_field() -> String {
        "set".to_owned()
    }

    fn default_guard_field() -> String {
        "guard".to_owned()
    }

    pub fn shared_set(&self) -> SharedSet {
        SharedSet::new(FieldRef::new(
            self.shared_set_class.as_str(),
            self.shared_set_field.as_str(),
            Type::object(),
        ))
    }

    pub fn options(&self) -> SynthesisOptions {
        SynthesisOptions {
            guard_field: FieldRef::new(
                self.guard_class.as_str(),
                self.guard_field.as_str(),
                Type::Primitive(PrimitiveKind::Int),
            ),
            threads: self.threads,
        }
    }
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            abstraction: AbstractionKind::default(),
            threads: None,
            shared_set_class: Self::default_library_class(),
            shared_set_field: Self::default_shared_set_field(),
            guard_class: Self::default_library_class(),
            guard_field: Self::default_guard_field(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReflectionConfig {
    /// Reflection log to fold into synthesized bodies.
    #[serde(default)]
    pub facts_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default = "OutputConfig::default_dir")]
    pub dir: PathBuf,
}

impl OutputConfig {
    fn default_dir() -> PathBuf {
        PathBuf::from("placebo-output")
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: Self::default_dir(),
        }
    }
}
