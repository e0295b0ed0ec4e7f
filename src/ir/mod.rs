//! # ir
//!
//! The object-oriented program model consumed by the pointer analysis.
//! Classes, fields, methods and variables live in arenas inside `Program`
//! and are addressed by small copyable ids. A method body is a flat list of
//! `Stmt`, a statement is identified program-wide by its `Location`.
//! Programs are created with `ProgramBuilder`, which validates them.

mod builder;
mod hierarchy;
mod signature;

pub use builder::{MethodBodyBuilder, ProgramBuilder};
pub use signature::Subsignature;

use std::collections::HashMap;
use std::fmt;

macro_rules! id_type {
    ($name:ident, $prefix:expr) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) u32);

        impl $name {
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $prefix, self.0)
            }
        }
    };
}

id_type!(ClassId, "class#");
id_type!(FieldId, "field#");
id_type!(MethodId, "method#");
id_type!(VarId, "var#");

/// A statement of a method: (method, index into the method's statements).
/// Allocation sites and call sites are both locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Location {
    pub method: MethodId,
    pub index: usize,
}

impl Location {
    pub fn new(method: MethodId, index: usize) -> Self {
        Self { method, index }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Type {
    Class(ClassId),
    Array(Box<Type>),
}

impl Type {
    pub fn array_of(elem: Type) -> Self {
        Type::Array(Box::new(elem))
    }
}

/// Dispatch kind of a call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CallKind {
    Static,
    Special,
    Virtual,
    Interface,
}

impl CallKind {
    pub fn is_static(self) -> bool {
        self == CallKind::Static
    }
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CallKind::Static => "static",
            CallKind::Special => "special",
            CallKind::Virtual => "virtual",
            CallKind::Interface => "interface",
        };
        f.write_str(name)
    }
}

/// Symbolic reference to a method, resolved against the hierarchy on demand.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodRef {
    pub class: ClassId,
    pub subsignature: Subsignature,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoke {
    pub kind: CallKind,
    pub method_ref: MethodRef,
    pub receiver: Option<VarId>,
    pub args: Vec<VarId>,
    pub result: Option<VarId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    /// `lhs = new T`
    New { lhs: VarId, ty: Type },
    /// `lhs = rhs`
    Copy { lhs: VarId, rhs: VarId },
    /// `lhs = (T) rhs`
    Cast { lhs: VarId, rhs: VarId, ty: Type },
    /// `lhs = base.field`, or `lhs = T.field` when `base` is `None`.
    LoadField {
        lhs: VarId,
        base: Option<VarId>,
        field: FieldId,
    },
    /// `base.field = rhs`, or `T.field = rhs` when `base` is `None`.
    StoreField {
        base: Option<VarId>,
        field: FieldId,
        rhs: VarId,
    },
    /// `lhs = base[index]`
    LoadArray { lhs: VarId, base: VarId, index: VarId },
    /// `base[index] = rhs`
    StoreArray { base: VarId, index: VarId, rhs: VarId },
    Invoke(Invoke),
    Return { value: Option<VarId> },
    /// Anything without pointer effects (branches, arithmetic, ...).
    Other,
}

impl Stmt {
    /// Variables read or written by this statement.
    pub fn vars(&self) -> Vec<VarId> {
        match self {
            Stmt::New { lhs, .. } => vec![*lhs],
            Stmt::Copy { lhs, rhs } | Stmt::Cast { lhs, rhs, .. } => vec![*lhs, *rhs],
            Stmt::LoadField { lhs, base, .. } => std::iter::once(*lhs).chain(*base).collect(),
            Stmt::StoreField { base, rhs, .. } => std::iter::once(*rhs).chain(*base).collect(),
            Stmt::LoadArray { lhs, base, index } => vec![*lhs, *base, *index],
            Stmt::StoreArray { base, index, rhs } => vec![*base, *index, *rhs],
            Stmt::Invoke(invoke) => invoke
                .receiver
                .iter()
                .chain(invoke.args.iter())
                .chain(invoke.result.iter())
                .copied()
                .collect(),
            Stmt::Return { value } => value.iter().copied().collect(),
            Stmt::Other => Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Class {
    pub name: String,
    pub superclass: Option<ClassId>,
    pub interfaces: Vec<ClassId>,
    pub is_interface: bool,
    pub is_abstract: bool,
    pub methods: HashMap<Subsignature, MethodId>,
    pub fields: Vec<FieldId>,
}

#[derive(Debug, Clone)]
pub struct Field {
    pub class: ClassId,
    pub name: String,
    pub is_static: bool,
}

#[derive(Debug, Clone)]
pub struct Method {
    pub class: ClassId,
    pub subsignature: Subsignature,
    pub is_static: bool,
    pub is_abstract: bool,
    pub this: Option<VarId>,
    pub params: Vec<VarId>,
    pub return_vars: Vec<VarId>,
    pub stmts: Vec<Stmt>,
    pub vars: Vec<VarId>,
}

/// Locations of the statements that access the heap through a variable.
/// Filled in by `ProgramBuilder::build`.
#[derive(Debug, Clone, Default)]
pub struct VarAccesses {
    pub load_fields: Vec<Location>,
    pub store_fields: Vec<Location>,
    pub load_arrays: Vec<Location>,
    pub store_arrays: Vec<Location>,
    pub invokes: Vec<Location>,
}

#[derive(Debug, Clone)]
pub struct Var {
    pub name: String,
    pub method: MethodId,
    pub accesses: VarAccesses,
}

#[derive(Debug, Clone)]
pub struct Program {
    pub(crate) classes: Vec<Class>,
    pub(crate) fields: Vec<Field>,
    pub(crate) methods: Vec<Method>,
    pub(crate) vars: Vec<Var>,
    pub(crate) class_names: HashMap<String, ClassId>,
    pub(crate) main_method: Option<MethodId>,
    pub(crate) object_class: Option<ClassId>,
}

impl Program {
    pub fn class(&self, id: ClassId) -> &Class {
        &self.classes[id.index()]
    }

    pub fn field(&self, id: FieldId) -> &Field {
        &self.fields[id.index()]
    }

    pub fn method(&self, id: MethodId) -> &Method {
        &self.methods[id.index()]
    }

    pub fn var(&self, id: VarId) -> &Var {
        &self.vars[id.index()]
    }

    pub fn stmt(&self, loc: Location) -> &Stmt {
        &self.method(loc.method).stmts[loc.index]
    }

    pub fn class_by_name(&self, name: &str) -> Option<ClassId> {
        self.class_names.get(name).copied()
    }

    /// The entry method of the analysis.
    pub fn main_method(&self) -> Option<MethodId> {
        self.main_method
    }

    /// Root of the class hierarchy, used to dispatch calls on array objects.
    pub fn object_class(&self) -> Option<ClassId> {
        self.object_class
    }

    pub fn classes(&self) -> impl Iterator<Item = ClassId> {
        (0..self.classes.len() as u32).map(ClassId)
    }

    pub fn methods(&self) -> impl Iterator<Item = MethodId> {
        (0..self.methods.len() as u32).map(MethodId)
    }

    pub fn vars(&self) -> impl Iterator<Item = VarId> {
        (0..self.vars.len() as u32).map(VarId)
    }

    /// Finds a method declared (not inherited) in `class` by its subsignature string.
    pub fn declared_method(&self, class: ClassId, subsignature: &str) -> Option<MethodId> {
        let subsig: Subsignature = subsignature.parse().ok()?;
        self.class(class).methods.get(&subsig).copied()
    }

    /// Finds a variable of `method` by name.
    pub fn var_by_name(&self, method: MethodId, name: &str) -> Option<VarId> {
        self.method(method)
            .vars
            .iter()
            .copied()
            .find(|var| self.var(*var).name == name)
    }

    pub fn method_name(&self, id: MethodId) -> String {
        let method = self.method(id);
        format!("<{}: {}>", self.class(method.class).name, method.subsignature)
    }

    pub fn type_name(&self, ty: &Type) -> String {
        match ty {
            Type::Class(class) => self.class(*class).name.clone(),
            Type::Array(elem) => format!("{}[]", self.type_name(elem)),
        }
    }

    pub fn var_name(&self, id: VarId) -> String {
        let var = self.var(id);
        format!("{}/{}", self.method_name(var.method), var.name)
    }

    pub fn field_name(&self, id: FieldId) -> String {
        let field = self.field(id);
        format!("{}.{}", self.class(field.class).name, field.name)
    }
}
