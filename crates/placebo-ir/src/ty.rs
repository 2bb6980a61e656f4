use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fully-qualified, dot-separated class name (`java.lang.String`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassName(String);

impl ClassName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClassName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveKind {
    pub fn is_floating(self) -> bool {
        matches!(self, PrimitiveKind::Float | PrimitiveKind::Double)
    }

    pub fn keyword(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
        }
    }

    fn from_keyword(word: &str) -> Option<Self> {
        Some(match word {
            "boolean" => PrimitiveKind::Boolean,
            "byte" => PrimitiveKind::Byte,
            "char" => PrimitiveKind::Char,
            "short" => PrimitiveKind::Short,
            "int" => PrimitiveKind::Int,
            "long" => PrimitiveKind::Long,
            "float" => PrimitiveKind::Float,
            "double" => PrimitiveKind::Double,
            _ => return None,
        })
    }
}

/// A value type. Equality is structural, so types double as map keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Type {
    Primitive(PrimitiveKind),
    Reference(ClassName),
    /// `base` is never itself an array; nesting is expressed by `dimensions`.
    Array { base: Box<Type>, dimensions: u8 },
}

impl Type {
    pub fn class(name: impl Into<String>) -> Self {
        Type::Reference(ClassName::new(name))
    }

    pub fn object() -> Self {
        Type::class("java.lang.Object")
    }

    /// Build an array type, flattening `base` if it is already an array.
    pub fn array_of(base: Type, dimensions: u8) -> Self {
        match base {
            Type::Array {
                base,
                dimensions: inner,
            } => Type::Array {
                base,
                dimensions: inner.saturating_add(dimensions),
            },
            base => Type::Array {
                base: Box::new(base),
                dimensions,
            },
        }
    }

    /// Reference-like types carry call-graph information; primitives do not.
    pub fn is_reference_like(&self) -> bool {
        !matches!(self, Type::Primitive(_))
    }

    pub fn as_class(&self) -> Option<&ClassName> {
        match self {
            Type::Reference(name) => Some(name),
            _ => None,
        }
    }

    pub fn dimensions(&self) -> u8 {
        match self {
            Type::Array { dimensions, .. } => *dimensions,
            _ => 0,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Primitive(kind) => f.write_str(kind.keyword()),
            Type::Reference(name) => write!(f, "{name}"),
            Type::Array { base, dimensions } => {
                write!(f, "{base}")?;
                for _ in 0..*dimensions {
                    f.write_str("[]")?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeParseError {
    #[error("empty type name")]
    Empty,
    #[error("`void` is not a value type")]
    Void,
    #[error("invalid type name: {0}")]
    Invalid(String),
}

impl FromStr for Type {
    type Err = TypeParseError;

    /// Parse a Java source-level type name: `int`, `java.lang.String`, `byte[][]`.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(TypeParseError::Empty);
        }

        let mut base = trimmed;
        let mut dimensions = 0u8;
        while let Some(rest) = base.strip_suffix("[]") {
            base = rest.trim_end();
            dimensions = dimensions
                .checked_add(1)
                .ok_or_else(|| TypeParseError::Invalid(input.to_string()))?;
        }

        if base == "void" {
            return Err(TypeParseError::Void);
        }
        if base.is_empty()
            || base.contains(|c: char| c.is_whitespace() || matches!(c, '[' | ']' | '<' | '>'))
        {
            return Err(TypeParseError::Invalid(input.to_string()));
        }

        let elem = match PrimitiveKind::from_keyword(base) {
            Some(kind) => Type::Primitive(kind),
            None => Type::class(base),
        };
        Ok(if dimensions == 0 {
            elem
        } else {
            Type::array_of(elem, dimensions)
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnType {
    Void,
    Type(Type),
}

impl ReturnType {
    pub fn as_type(&self) -> Option<&Type> {
        match self {
            ReturnType::Void => None,
            ReturnType::Type(ty) => Some(ty),
        }
    }

    pub fn is_reference_like(&self) -> bool {
        self.as_type().is_some_and(Type::is_reference_like)
    }
}

impl fmt::Display for ReturnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnType::Void => f.write_str("void"),
            ReturnType::Type(ty) => write!(f, "{ty}"),
        }
    }
}

impl FromStr for ReturnType {
    type Err = TypeParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if input.trim() == "void" {
            return Ok(ReturnType::Void);
        }
        input.parse().map(ReturnType::Type)
    }
}

pub const CONSTRUCTOR_NAME: &str = "<init>";
pub const STATIC_INITIALIZER_NAME: &str = "<clinit>";

/// Identity of a method: declaring class, name and erased signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MethodRef {
    pub class: ClassName,
    pub name: String,
    #[serde(default)]
    pub params: Vec<Type>,
    pub return_type: ReturnType,
}

impl MethodRef {
    pub fn new(
        class: impl Into<ClassName>,
        name: impl Into<String>,
        params: Vec<Type>,
        return_type: ReturnType,
    ) -> Self {
        Self {
            class: class.into(),
            name: name.into(),
            params,
            return_type,
        }
    }

    pub fn is_constructor(&self) -> bool {
        self.name == CONSTRUCTOR_NAME
    }

    pub fn is_static_initializer(&self) -> bool {
        self.name == STATIC_INITIALIZER_NAME
    }

    /// `name(params)` without the declaring class or return type.
    pub fn sub_signature(&self) -> String {
        let params = self
            .params
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        format!("{} {}({params})", self.return_type, self.name)
    }
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}: {}>", self.class, self.sub_signature())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldRef {
    pub class: ClassName,
    pub name: String,
    pub ty: Type,
}

impl FieldRef {
    pub fn new(class: impl Into<ClassName>, name: impl Into<String>, ty: Type) -> Self {
        Self {
            class: class.into(),
            name: name.into(),
            ty,
        }
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}: {} {}>", self.class, self.ty, self.name)
    }
}
