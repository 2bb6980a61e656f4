use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Mutex, Once};

use serde::{Deserialize, Serialize};
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::prelude::*;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// A level (`info`, `debug`, ...) or a full `EnvFilter` directive string.
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,

    /// Emit one JSON object per event instead of plain text.
    #[serde(default)]
    pub json: bool,

    #[serde(default = "LoggingConfig::default_stderr")]
    pub stderr: bool,

    /// Also append events to this file. Ignored if it cannot be opened.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_owned()
    }

    fn default_stderr() -> bool {
        true
    }

    /// Turns `level` into `EnvFilter` directives for the `placebo.*` targets.
    ///
    /// A bare level (`debug`, `warning`, ...) applies to every `placebo` target
    /// while other crates stay at `warn`. `component=level` scopes one
    /// component, so `synth=debug` means `placebo.synth=debug`. Anything else
    /// is passed through as a raw directive.
    pub(crate) fn level_directives(input: &str) -> String {
        let trimmed = input.trim();
        let trimmed = if trimmed.is_empty() { "info" } else { trimmed };
        trimmed
            .split(',')
            .map(str::trim)
            .filter(|directive| !directive.is_empty())
            .map(|directive| match directive.split_once('=') {
                None => match canonical_level(directive) {
                    Some(level) => format!("warn,placebo={level}"),
                    None => directive.to_owned(),
                },
                Some((component, level)) if COMPONENTS.contains(&component) => {
                    let level = canonical_level(level).map_or(level, |canonical| canonical);
                    format!("placebo.{component}={level}")
                }
                Some(_) => directive.to_owned(),
            })
            .collect::<Vec<_>>()
            .join(",")
    }

    fn config_env_filter(&self) -> tracing_subscriber::EnvFilter {
        let directives = Self::level_directives(&self.level);
        tracing_subscriber::EnvFilter::try_new(directives).unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::default()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
        })
    }

    /// The configured directives with `RUST_LOG` appended, so an explicit
    /// `RUST_LOG` target wins over the config file.
    pub fn env_filter(&self) -> tracing_subscriber::EnvFilter {
        let Some(env_directives) = std::env::var("RUST_LOG")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
        else {
            return self.config_env_filter();
        };

        let directives = format!("{},{env_directives}", Self::level_directives(&self.level));
        tracing_subscriber::EnvFilter::try_new(directives)
            .or_else(|_| tracing_subscriber::EnvFilter::try_new(env_directives))
            .unwrap_or_else(|_| self.config_env_filter())
    }

    fn make_writer(&self) -> BoxMakeWriter {
        let file = self.file.as_ref().and_then(|path| {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
        });
        match (self.stderr, file) {
            (true, Some(file)) => BoxMakeWriter::new(std::io::stderr.and(Mutex::new(file))),
            (true, None) => BoxMakeWriter::new(std::io::stderr),
            (false, Some(file)) => BoxMakeWriter::new(Mutex::new(file)),
            (false, None) => BoxMakeWriter::new(std::io::sink),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            json: false,
            stderr: Self::default_stderr(),
            file: None,
        }
    }
}

/// Components logging under a `placebo.<component>` target.
const COMPONENTS: &[&str] = &["synth", "callgraph", "config", "reflect"];

fn canonical_level(level: &str) -> Option<&'static str> {
    match level.to_ascii_lowercase().as_str() {
        "trace" => Some("trace"),
        "debug" => Some("debug"),
        "info" => Some("info"),
        "warn" | "warning" => Some("warn"),
        "error" => Some("error"),
        "off" => Some("off"),
        _ => None,
    }
}

static TRACING_INIT: Once = Once::new();

/// Installs the global `tracing` subscriber.
///
/// Safe to call more than once; only the first call has an effect.
pub fn init_tracing(config: &LoggingConfig) {
    TRACING_INIT.call_once(|| {
        let filter = config.env_filter();
        let writer = config.make_writer();

        let layer: Box<dyn tracing_subscriber::Layer<_> + Send + Sync> = if config.json {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer)
                .with_ansi(false)
                .boxed()
        } else {
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .boxed()
        };

        let subscriber = tracing_subscriber::registry().with(filter).with(layer);
        if tracing::subscriber::set_global_default(subscriber).is_ok() {
            tracing::debug!(
                target: "placebo.config",
                level = %config.level,
                json = config.json,
                "tracing initialized"
            );
        }
    });
}
