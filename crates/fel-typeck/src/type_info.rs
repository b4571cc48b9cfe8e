use std::rc::Rc;

use fel_common::Span;
use rustc_hash::FxHashMap;

/// A resolved type. Primitives and named types (`Struct`/`Procedure`)
/// compare as atomic values -- identical only when their names match, never
/// decomposed further; arrays compare structurally on their element type
/// (spec.md §4.3). `#[derive(PartialEq)]` already gives exactly this
/// semantics: it recurses into `Array`'s boxed element but treats
/// `Struct`/`Procedure` names as opaque leaves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeInfo {
    Int,
    Float,
    String,
    Bool,
    Array(Box<TypeInfo>),
    Struct(Rc<str>),
    Procedure(Rc<str>),
}

impl TypeInfo {
    pub fn array_of(element: TypeInfo) -> Self {
        TypeInfo::Array(Box::new(element))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, TypeInfo::Array(_))
    }

    pub fn display(&self) -> String {
        match self {
            TypeInfo::Int => "int".to_string(),
            TypeInfo::Float => "float".to_string(),
            TypeInfo::String => "string".to_string(),
            TypeInfo::Bool => "bool".to_string(),
            TypeInfo::Array(el) => format!("{}[]", el.display()),
            TypeInfo::Struct(name) => name.to_string(),
            TypeInfo::Procedure(name) => name.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StructShape {
    pub fields: Vec<StructFieldShape>,
}

#[derive(Debug, Clone)]
pub struct StructFieldShape {
    pub name: Rc<str>,
    pub ty: TypeInfo,
    pub has_default: bool,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ProcedureShape {
    pub params: Vec<(Rc<str>, TypeInfo)>,
    pub return_type: Option<TypeInfo>,
}

/// The named-type registry (`TypeInfoManager` in spec.md §4.3). Built-in
/// primitives are available from construction; struct and procedure shapes
/// are registered during stage 1 of the global check.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    structs: FxHashMap<Rc<str>, StructShape>,
    procedures: FxHashMap<Rc<str>, ProcedureShape>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builtin(name: &str) -> Option<TypeInfo> {
        Some(match name {
            "int" => TypeInfo::Int,
            "float" => TypeInfo::Float,
            "string" => TypeInfo::String,
            "bool" => TypeInfo::Bool,
            _ => return None,
        })
    }

    pub fn register_struct(&mut self, name: Rc<str>, shape: StructShape) {
        self.structs.insert(name, shape);
    }

    pub fn register_procedure(&mut self, name: Rc<str>, shape: ProcedureShape) {
        self.procedures.insert(name, shape);
    }

    pub fn struct_shape(&self, name: &str) -> Option<&StructShape> {
        self.structs.get(name)
    }

    pub fn procedure_shape(&self, name: &str) -> Option<&ProcedureShape> {
        self.procedures.get(name)
    }

    pub fn has_struct(&self, name: &str) -> bool {
        self.structs.contains_key(name)
    }

    /// `DetermineType(Type{name, arrayDepth})` (spec.md §4.3): resolve a
    /// parsed type reference by name, then wrap it `array_depth` times.
    pub fn resolve(&self, name: &str, array_depth: u32) -> Option<TypeInfo> {
        let mut base = Self::builtin(name).or_else(|| {
            if self.structs.contains_key(name) {
                Some(TypeInfo::Struct(Rc::from(name)))
            } else if self.procedures.contains_key(name) {
                Some(TypeInfo::Procedure(Rc::from(name)))
            } else {
                None
            }
        })?;
        for _ in 0..array_depth {
            base = TypeInfo::array_of(base);
        }
        Some(base)
    }
}
