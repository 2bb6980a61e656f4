use std::path::Path;

use indexmap::IndexMap;
use placebo_ir::{
    Body, ClassName, MethodRef, ReturnType, Type, CONSTRUCTOR_NAME, STATIC_INITIALIZER_NAME,
};
use serde::{Deserialize, Serialize};

use crate::error::{ModelConsistencyError, ModelError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub ty: Type,
    #[serde(default)]
    pub is_static: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDef {
    pub name: String,
    #[serde(default)]
    pub params: Vec<Type>,
    pub return_type: ReturnType,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub is_native: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Body>,
}

impl MethodDef {
    pub fn is_constructor(&self) -> bool {
        self.name == CONSTRUCTOR_NAME
    }

    pub fn is_static_initializer(&self) -> bool {
        self.name == STATIC_INITIALIZER_NAME
    }

    /// Abstract and native methods have no body to replace.
    pub fn is_concrete(&self) -> bool {
        !self.is_abstract && !self.is_native
    }

    pub fn method_ref(&self, class: &ClassName) -> MethodRef {
        MethodRef {
            class: class.clone(),
            name: self.name.clone(),
            params: self.params.clone(),
            return_type: self.return_type.clone(),
        }
    }

    fn matches(&self, method: &MethodRef) -> bool {
        self.name == method.name
            && self.params == method.params
            && self.return_type == method.return_type
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDef {
    pub name: ClassName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superclass: Option<ClassName>,
    #[serde(default)]
    pub interfaces: Vec<ClassName>,
    #[serde(default)]
    pub is_interface: bool,
    /// Application classes keep their bodies; everything else is library.
    #[serde(default)]
    pub is_application: bool,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    #[serde(default)]
    pub methods: Vec<MethodDef>,
}

impl ClassDef {
    pub fn new(name: impl Into<ClassName>) -> Self {
        Self {
            name: name.into(),
            superclass: None,
            interfaces: Vec::new(),
            is_interface: false,
            is_application: false,
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn declares_method(&self, name: &str) -> bool {
        self.methods.iter().any(|m| m.name == name)
    }

    pub fn constructors(&self) -> impl Iterator<Item = &MethodDef> + '_ {
        self.methods.iter().filter(|m| m.is_constructor())
    }

    /// The no-argument constructor, if declared.
    pub fn default_constructor(&self) -> Option<&MethodDef> {
        self.constructors().find(|m| m.params.is_empty())
    }

    pub fn static_initializer(&self) -> Option<&MethodDef> {
        self.methods.iter().find(|m| m.is_static_initializer())
    }

    pub fn method(&self, method: &MethodRef) -> Option<&MethodDef> {
        self.methods.iter().find(|m| m.matches(method))
    }

    pub fn find_method(&self, name: &str, params: &[Type]) -> Option<&MethodDef> {
        self.methods
            .iter()
            .find(|m| m.name == name && m.params == params)
    }
}

/// All classes of the analyzed program, keyed by name in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "ProgramRepr", into = "ProgramRepr")]
pub struct Program {
    classes: IndexMap<ClassName, ClassDef>,
}

#[derive(Serialize, Deserialize)]
struct ProgramRepr {
    #[serde(default)]
    classes: Vec<ClassDef>,
}

impl From<ProgramRepr> for Program {
    fn from(repr: ProgramRepr) -> Self {
        repr.classes.into_iter().collect()
    }
}

impl From<Program> for ProgramRepr {
    fn from(program: Program) -> Self {
        ProgramRepr {
            classes: program.classes.into_values().collect(),
        }
    }
}

impl FromIterator<ClassDef> for Program {
    fn from_iter<I: IntoIterator<Item = ClassDef>>(iter: I) -> Self {
        let mut program = Program::default();
        for class in iter {
            program.add_class(class);
        }
        program
    }
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ModelError::Json {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ModelError> {
        let path = path.as_ref();
        let text = serde_json::to_string_pretty(self).map_err(|source| ModelError::Json {
            path: path.display().to_string(),
            source,
        })?;
        std::fs::write(path, text).map_err(|source| ModelError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    /// Insert a class, replacing any previous definition with the same name.
    pub fn add_class(&mut self, class: ClassDef) {
        self.classes.insert(class.name.clone(), class);
    }

    pub fn class(&self, name: &ClassName) -> Option<&ClassDef> {
        self.classes.get(name)
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassDef> + '_ {
        self.classes.values()
    }

    pub fn superclass_of(&self, class: &ClassDef) -> Option<&ClassDef> {
        class.superclass.as_ref().and_then(|name| self.class(name))
    }

    /// Resolve a method reference to its declaring class and definition.
    pub fn lookup(
        &self,
        method: &MethodRef,
    ) -> Result<(&ClassDef, &MethodDef), ModelConsistencyError> {
        let class = self
            .class(&method.class)
            .ok_or_else(|| ModelConsistencyError::MissingClass(method.class.clone()))?;
        let def = class
            .method(method)
            .ok_or_else(|| ModelConsistencyError::MissingMethod(method.clone()))?;
        Ok((class, def))
    }

    pub fn method(&self, method: &MethodRef) -> Option<&MethodDef> {
        self.lookup(method).ok().map(|(_, def)| def)
    }

    pub fn has_static_initializer(&self, class: &ClassName) -> bool {
        self.class(class)
            .is_some_and(|c| c.declares_method(STATIC_INITIALIZER_NAME))
    }

    /// Every concrete method with a body declared by a non-application class,
    /// in model order.
    pub fn library_methods(&self) -> Vec<MethodRef> {
        self.classes
            .values()
            .filter(|class| !class.is_application)
            .flat_map(|class| {
                class
                    .methods
                    .iter()
                    .filter(|m| m.is_concrete() && m.body.is_some())
                    .map(|m| m.method_ref(&class.name))
            })
            .collect()
    }

    /// Install `body` as the body of `method`, returning the body it replaces.
    pub fn replace_body(
        &mut self,
        method: &MethodRef,
        body: Body,
    ) -> Result<Option<Body>, ModelConsistencyError> {
        let class = self
            .classes
            .get_mut(&method.class)
            .ok_or_else(|| ModelConsistencyError::MissingClass(method.class.clone()))?;
        let def = class
            .methods
            .iter_mut()
            .find(|m| m.matches(method))
            .ok_or_else(|| ModelConsistencyError::MissingMethod(method.clone()))?;
        Ok(def.body.replace(body))
    }
}
