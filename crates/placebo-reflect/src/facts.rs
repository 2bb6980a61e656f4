use std::fmt;
use std::path::Path;

use indexmap::IndexSet;

use crate::error::ConfigurationError;

/// The reflective operations a reflection log records targets for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReflectiveCallKind {
    ArrayNewInstance,
    ClassForName,
    ClassNewInstance,
    ConstructorNewInstance,
    MethodInvoke,
}

impl ReflectiveCallKind {
    pub const ALL: [ReflectiveCallKind; 5] = [
        ReflectiveCallKind::ArrayNewInstance,
        ReflectiveCallKind::ClassForName,
        ReflectiveCallKind::ClassNewInstance,
        ReflectiveCallKind::ConstructorNewInstance,
        ReflectiveCallKind::MethodInvoke,
    ];

    /// The kind token as it appears in the first column of the log.
    pub fn token(self) -> &'static str {
        match self {
            ReflectiveCallKind::ArrayNewInstance => "Array.newInstance",
            ReflectiveCallKind::ClassForName => "Class.forName",
            ReflectiveCallKind::ClassNewInstance => "Class.newInstance",
            ReflectiveCallKind::ConstructorNewInstance => "Constructor.newInstance",
            ReflectiveCallKind::MethodInvoke => "Method.invoke",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.token() == token)
    }

    fn slot(self) -> usize {
        match self {
            ReflectiveCallKind::ArrayNewInstance => 0,
            ReflectiveCallKind::ClassForName => 1,
            ReflectiveCallKind::ClassNewInstance => 2,
            ReflectiveCallKind::ConstructorNewInstance => 3,
            ReflectiveCallKind::MethodInvoke => 4,
        }
    }
}

impl fmt::Display for ReflectiveCallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Reflective call targets read from a `;`-delimited reflection log.
///
/// Loaded once before any synthesis starts and read-only afterwards, so a
/// shared reference can be handed to every worker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReflectionFacts {
    targets: [IndexSet<String>; 5],
}

impl ReflectionFacts {
    /// A store with no facts, used when no log is configured.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigurationError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let facts = Self::parse(&text, &path.display().to_string())?;
        tracing::info!(
            target: "placebo.reflect",
            path = %path.display(),
            array_new_instance = facts.targets(ReflectiveCallKind::ArrayNewInstance).len(),
            class_for_name = facts.targets(ReflectiveCallKind::ClassForName).len(),
            class_new_instance = facts.targets(ReflectiveCallKind::ClassNewInstance).len(),
            constructor_new_instance = facts.targets(ReflectiveCallKind::ConstructorNewInstance).len(),
            method_invoke = facts.targets(ReflectiveCallKind::MethodInvoke).len(),
            "loaded reflection facts"
        );
        Ok(facts)
    }

    /// Parse log text. `origin` names the source in error messages.
    pub fn parse(text: &str, origin: &str) -> Result<Self, ConfigurationError> {
        let mut facts = Self::default();
        for (idx, line) in text.lines().enumerate() {
            if line.is_empty() {
                continue;
            }

            let mut columns = line.split(';');
            let kind = columns.next().unwrap_or_default();
            let Some(target) = columns.next() else {
                return Err(ConfigurationError::Malformed {
                    path: origin.to_string(),
                    line: idx + 1,
                    content: line.to_string(),
                });
            };

            // Kinds we do not model (field accesses, etc.) are not errors.
            if let Some(kind) = ReflectiveCallKind::from_token(kind) {
                facts.insert(kind, target);
            }
        }
        Ok(facts)
    }

    pub fn insert(&mut self, kind: ReflectiveCallKind, target: impl Into<String>) {
        self.targets[kind.slot()].insert(target.into());
    }

    pub fn targets(&self, kind: ReflectiveCallKind) -> &IndexSet<String> {
        &self.targets[kind.slot()]
    }

    pub fn is_empty(&self) -> bool {
        self.targets.iter().all(IndexSet::is_empty)
    }
}
