//! Programmatic construction of a `Program`.
//! Ill-formed input is rejected by `ProgramBuilder::build`, the analysis
//! itself assumes a validated program.

use anyhow::{anyhow, bail, Context, Result};
use std::collections::HashMap;

use super::{
    CallKind, Class, ClassId, Field, FieldId, Invoke, Location, Method, MethodId, MethodRef,
    Program, Stmt, Subsignature, Type, Var, VarAccesses, VarId,
};

#[derive(Debug, Default)]
pub struct ProgramBuilder {
    classes: Vec<Class>,
    fields: Vec<Field>,
    methods: Vec<Method>,
    vars: Vec<Var>,
    class_names: HashMap<String, ClassId>,
    main_method: Option<MethodId>,
    object_class: Option<ClassId>,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn new_class(
        &mut self,
        name: &str,
        superclass: Option<ClassId>,
        is_interface: bool,
        is_abstract: bool,
    ) -> Result<ClassId> {
        if self.class_names.contains_key(name) {
            bail!("class {} is declared twice", name);
        }
        let id = ClassId(self.classes.len() as u32);
        self.classes.push(Class {
            name: name.to_owned(),
            superclass,
            interfaces: Vec::new(),
            is_interface,
            is_abstract,
            methods: HashMap::new(),
            fields: Vec::new(),
        });
        self.class_names.insert(name.to_owned(), id);
        // The first root class is the root of the hierarchy unless told otherwise.
        if superclass.is_none() && !is_interface && self.object_class.is_none() {
            self.object_class = Some(id);
        }
        Ok(id)
    }

    pub fn add_class(&mut self, name: &str, superclass: Option<ClassId>) -> Result<ClassId> {
        self.new_class(name, superclass, false, false)
    }

    pub fn add_abstract_class(
        &mut self,
        name: &str,
        superclass: Option<ClassId>,
    ) -> Result<ClassId> {
        self.new_class(name, superclass, false, true)
    }

    pub fn add_interface(&mut self, name: &str, superinterfaces: &[ClassId]) -> Result<ClassId> {
        let id = self.new_class(name, None, true, true)?;
        for iface in superinterfaces {
            self.add_interface_impl(id, *iface)?;
        }
        Ok(id)
    }

    fn class(&self, class: ClassId) -> Result<&Class> {
        self.classes
            .get(class.index())
            .ok_or_else(|| foreign("class", class.index()))
    }

    /// Records that `class` implements (or, for interfaces, extends) `iface`.
    pub fn add_interface_impl(&mut self, class: ClassId, iface: ClassId) -> Result<()> {
        let class_name = self.class(class)?.name.clone();
        let target = self.class(iface)?;
        if !target.is_interface {
            bail!(
                "{} is not an interface and cannot be implemented by {}",
                target.name,
                class_name
            );
        }
        self.classes[class.index()].interfaces.push(iface);
        Ok(())
    }

    pub fn set_object_class(&mut self, class: ClassId) {
        self.object_class = Some(class);
    }

    pub fn add_field(&mut self, class: ClassId, name: &str, is_static: bool) -> Result<FieldId> {
        if self
            .class(class)?
            .fields
            .iter()
            .any(|f| self.fields[f.index()].name == name)
        {
            bail!(
                "field {} is declared twice in {}",
                name,
                self.classes[class.index()].name
            );
        }
        let id = FieldId(self.fields.len() as u32);
        self.fields.push(Field {
            class,
            name: name.to_owned(),
            is_static,
        });
        self.classes[class.index()].fields.push(id);
        Ok(id)
    }

    /// Resolves a field by name, searching superclasses of `class`.
    pub fn lookup_field(&self, class: ClassId, name: &str) -> Option<FieldId> {
        let mut current = Some(class);
        // bounded, the hierarchy is only checked for cycles by `build`
        for _ in 0..self.classes.len() {
            let c = current?;
            let class = self.classes.get(c.index())?;
            if let Some(field) = class
                .fields
                .iter()
                .copied()
                .find(|f| self.fields[f.index()].name == name)
            {
                return Some(field);
            }
            current = class.superclass;
        }
        None
    }

    fn new_var(&mut self, method: MethodId, name: &str) -> VarId {
        let id = VarId(self.vars.len() as u32);
        self.vars.push(Var {
            name: name.to_owned(),
            method,
            accesses: VarAccesses::default(),
        });
        self.methods[method.index()].vars.push(id);
        id
    }

    fn new_method(
        &mut self,
        class: ClassId,
        subsignature: &str,
        is_static: bool,
        is_abstract: bool,
    ) -> Result<MethodId> {
        let subsignature: Subsignature = subsignature.parse()?;
        if self.class(class)?.methods.contains_key(&subsignature) {
            bail!(
                "method {} is declared twice in {}",
                subsignature,
                self.classes[class.index()].name
            );
        }
        let id = MethodId(self.methods.len() as u32);
        let param_count = subsignature.param_count();
        self.methods.push(Method {
            class,
            subsignature: subsignature.clone(),
            is_static,
            is_abstract,
            this: None,
            params: Vec::new(),
            return_vars: Vec::new(),
            stmts: Vec::new(),
            vars: Vec::new(),
        });
        self.classes[class.index()].methods.insert(subsignature, id);
        if !is_static {
            let this = self.new_var(id, "this");
            self.methods[id.index()].this = Some(this);
        }
        for i in 0..param_count {
            let param = self.new_var(id, &format!("p{}", i));
            self.methods[id.index()].params.push(param);
        }
        Ok(id)
    }

    /// Declares a concrete method. `this` (for instance methods) and one
    /// variable per parameter, named `p0`, `p1`, ..., are created with it.
    pub fn add_method(
        &mut self,
        class: ClassId,
        subsignature: &str,
        is_static: bool,
    ) -> Result<MethodId> {
        self.new_method(class, subsignature, is_static, false)
    }

    pub fn add_abstract_method(&mut self, class: ClassId, subsignature: &str) -> Result<MethodId> {
        self.new_method(class, subsignature, false, true)
    }

    pub fn set_main_method(&mut self, method: MethodId) {
        self.main_method = Some(method);
    }

    pub fn method_ref(&self, class: ClassId, subsignature: &str) -> Result<MethodRef> {
        Ok(MethodRef {
            class,
            subsignature: subsignature.parse()?,
        })
    }

    pub fn body(&mut self, method: MethodId) -> Result<MethodBodyBuilder<'_>> {
        if method.index() >= self.methods.len() {
            return Err(foreign("method", method.index()));
        }
        Ok(MethodBodyBuilder {
            builder: self,
            method,
        })
    }

    pub fn build(self) -> Result<Program> {
        let mut program = Program {
            classes: self.classes,
            fields: self.fields,
            methods: self.methods,
            vars: self.vars,
            class_names: self.class_names,
            main_method: self.main_method,
            object_class: self.object_class,
        };
        validate_hierarchy(&program)?;
        if let Some(main) = program.main_method {
            check_id("method", main.index(), program.methods.len())?;
            if !program.method(main).is_static {
                bail!("main method {} is not static", program.method_name(main));
            }
        }
        for method in program.methods() {
            validate_method(&program, method)
                .with_context(|| format!("invalid method {}", program.method_name(method)))?;
        }
        index_accesses(&mut program);
        Ok(program)
    }
}

fn foreign(what: &str, index: usize) -> anyhow::Error {
    anyhow!("{} #{} does not belong to this program", what, index)
}

fn check_id(what: &str, index: usize, len: usize) -> Result<()> {
    if index >= len {
        return Err(foreign(what, index));
    }
    Ok(())
}

/// Every class id resolves and no class is its own ancestor.
fn validate_hierarchy(program: &Program) -> Result<()> {
    let num_classes = program.classes.len();
    if let Some(object) = program.object_class {
        check_id("class", object.index(), num_classes)?;
    }
    for class in program.classes() {
        let declared = program.class(class);
        for parent in declared.superclass.iter().chain(declared.interfaces.iter()) {
            check_id("class", parent.index(), num_classes)
                .with_context(|| format!("in the supertypes of {}", declared.name))?;
        }
    }
    for class in program.classes() {
        // a chain longer than the number of classes revisits one of them
        if program.superclasses(class).nth(num_classes).is_some() {
            bail!("superclass chain of {} is cyclic", program.class(class).name);
        }
    }
    Ok(())
}

fn check_type(program: &Program, ty: &Type) -> Result<()> {
    match ty {
        Type::Class(class) => check_id("class", class.index(), program.classes.len()),
        Type::Array(elem) => check_type(program, elem),
    }
}

fn validate_method(program: &Program, id: MethodId) -> Result<()> {
    let method = program.method(id);
    if method.is_abstract && !method.stmts.is_empty() {
        bail!("abstract method has a body");
    }
    if method.is_static == method.this.is_some() {
        bail!("`this` must be present exactly for instance methods");
    }
    for (index, stmt) in method.stmts.iter().enumerate() {
        validate_stmt(program, id, stmt)
            .with_context(|| format!("at statement {}: {:?}", index, stmt))?;
    }
    Ok(())
}

fn validate_stmt(program: &Program, method: MethodId, stmt: &Stmt) -> Result<()> {
    for var in stmt.vars() {
        check_id("variable", var.index(), program.vars.len())?;
        let owner = program.var(var).method;
        if owner != method {
            bail!(
                "variable {} belongs to {}",
                program.var(var).name,
                program.method_name(owner)
            );
        }
    }
    match stmt {
        Stmt::New { ty, .. } | Stmt::Cast { ty, .. } => check_type(program, ty)?,
        Stmt::LoadField { base, field, .. } | Stmt::StoreField { base, field, .. } => {
            check_id("field", field.index(), program.fields.len())?;
            let is_static = program.field(*field).is_static;
            if is_static && base.is_some() {
                bail!("static field {} accessed through a base variable", program.field_name(*field));
            }
            if !is_static && base.is_none() {
                bail!("instance field {} accessed without a base variable", program.field_name(*field));
            }
        }
        Stmt::Invoke(invoke) => validate_invoke(program, invoke)?,
        _ => {}
    }
    Ok(())
}

fn validate_invoke(program: &Program, invoke: &Invoke) -> Result<()> {
    check_id("class", invoke.method_ref.class.index(), program.classes.len())?;
    match (invoke.kind, invoke.receiver) {
        (CallKind::Static, Some(_)) => bail!("static call with a receiver"),
        (kind, None) if !kind.is_static() => bail!("{} call without a receiver", kind),
        _ => {}
    }
    if let Some(target) = program.resolve_method_ref(&invoke.method_ref) {
        let target_method = program.method(target);
        if target_method.is_static != invoke.kind.is_static() {
            bail!(
                "{} call resolves to {}, dispatch kind does not match",
                invoke.kind,
                program.method_name(target)
            );
        }
        if target_method.params.len() != invoke.args.len() {
            return Err(anyhow!(
                "call passes {} arguments but {} takes {}",
                invoke.args.len(),
                program.method_name(target),
                target_method.params.len()
            ));
        }
    }
    Ok(())
}

fn index_accesses(program: &mut Program) {
    let Program { methods, vars, .. } = program;
    for (m, method) in methods.iter_mut().enumerate() {
        let id = MethodId(m as u32);
        let mut return_vars = Vec::new();
        for (index, stmt) in method.stmts.iter().enumerate() {
            let loc = Location::new(id, index);
            match stmt {
                Stmt::LoadField {
                    base: Some(base), ..
                } => vars[base.index()].accesses.load_fields.push(loc),
                Stmt::StoreField {
                    base: Some(base), ..
                } => vars[base.index()].accesses.store_fields.push(loc),
                Stmt::LoadArray { base, .. } => vars[base.index()].accesses.load_arrays.push(loc),
                Stmt::StoreArray { base, .. } => {
                    vars[base.index()].accesses.store_arrays.push(loc)
                }
                Stmt::Invoke(Invoke {
                    receiver: Some(recv),
                    ..
                }) => vars[recv.index()].accesses.invokes.push(loc),
                Stmt::Return { value: Some(value) } => {
                    if !return_vars.contains(value) {
                        return_vars.push(*value);
                    }
                }
                _ => {}
            }
        }
        method.return_vars = return_vars;
    }
}

/// Appends statements to one method body.
pub struct MethodBodyBuilder<'a> {
    builder: &'a mut ProgramBuilder,
    method: MethodId,
}

impl<'a> MethodBodyBuilder<'a> {
    pub fn method(&self) -> MethodId {
        self.method
    }

    pub fn this(&self) -> Option<VarId> {
        self.builder.methods[self.method.index()].this
    }

    pub fn param(&self, i: usize) -> Option<VarId> {
        self.builder.methods[self.method.index()].params.get(i).copied()
    }

    /// Returns the local variable called `name`, creating it on first use.
    pub fn var(&mut self, name: &str) -> VarId {
        let builder = &*self.builder;
        let existing = builder.methods[self.method.index()]
            .vars
            .iter()
            .copied()
            .find(|v| builder.vars[v.index()].name == name);
        match existing {
            Some(var) => var,
            None => self.builder.new_var(self.method, name),
        }
    }

    pub fn push(&mut self, stmt: Stmt) -> Location {
        let stmts = &mut self.builder.methods[self.method.index()].stmts;
        stmts.push(stmt);
        Location::new(self.method, stmts.len() - 1)
    }

    pub fn new_object(&mut self, lhs: VarId, ty: Type) -> Location {
        self.push(Stmt::New { lhs, ty })
    }

    pub fn copy(&mut self, lhs: VarId, rhs: VarId) -> Location {
        self.push(Stmt::Copy { lhs, rhs })
    }

    pub fn cast(&mut self, lhs: VarId, rhs: VarId, ty: Type) -> Location {
        self.push(Stmt::Cast { lhs, rhs, ty })
    }

    pub fn load_field(&mut self, lhs: VarId, base: VarId, field: FieldId) -> Location {
        self.push(Stmt::LoadField {
            lhs,
            base: Some(base),
            field,
        })
    }

    pub fn store_field(&mut self, base: VarId, field: FieldId, rhs: VarId) -> Location {
        self.push(Stmt::StoreField {
            base: Some(base),
            field,
            rhs,
        })
    }

    pub fn load_static(&mut self, lhs: VarId, field: FieldId) -> Location {
        self.push(Stmt::LoadField {
            lhs,
            base: None,
            field,
        })
    }

    pub fn store_static(&mut self, field: FieldId, rhs: VarId) -> Location {
        self.push(Stmt::StoreField {
            base: None,
            field,
            rhs,
        })
    }

    pub fn load_array(&mut self, lhs: VarId, base: VarId, index: VarId) -> Location {
        self.push(Stmt::LoadArray { lhs, base, index })
    }

    pub fn store_array(&mut self, base: VarId, index: VarId, rhs: VarId) -> Location {
        self.push(Stmt::StoreArray { base, index, rhs })
    }

    pub fn invoke(
        &mut self,
        kind: CallKind,
        method_ref: MethodRef,
        receiver: Option<VarId>,
        args: &[VarId],
        result: Option<VarId>,
    ) -> Location {
        self.push(Stmt::Invoke(Invoke {
            kind,
            method_ref,
            receiver,
            args: args.to_vec(),
            result,
        }))
    }

    pub fn invoke_static(
        &mut self,
        method_ref: MethodRef,
        args: &[VarId],
        result: Option<VarId>,
    ) -> Location {
        self.invoke(CallKind::Static, method_ref, None, args, result)
    }

    pub fn invoke_virtual(
        &mut self,
        receiver: VarId,
        method_ref: MethodRef,
        args: &[VarId],
        result: Option<VarId>,
    ) -> Location {
        self.invoke(CallKind::Virtual, method_ref, Some(receiver), args, result)
    }

    pub fn ret(&mut self, value: Option<VarId>) -> Location {
        self.push(Stmt::Return { value })
    }

    pub fn other(&mut self) -> Location {
        self.push(Stmt::Other)
    }
}
