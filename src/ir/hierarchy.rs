//! Method lookup along the class hierarchy.
//! Dispatch is a pure function of (class, subsignature); nothing is cached.

use super::{ClassId, MethodId, MethodRef, Program, Subsignature, Type};
use std::collections::{HashSet, VecDeque};

impl Program {
    /// Superclass chain starting at `class` itself.
    pub fn superclasses(&self, class: ClassId) -> impl Iterator<Item = ClassId> + '_ {
        std::iter::successors(Some(class), move |c| self.class(*c).superclass)
    }

    /// All interfaces implemented by `class` or its superclasses, directly or
    /// through superinterfaces, in breadth-first order.
    pub fn superinterfaces(&self, class: ClassId) -> Vec<ClassId> {
        let mut visited = HashSet::new();
        let mut queue: VecDeque<ClassId> = self
            .superclasses(class)
            .flat_map(|c| self.class(c).interfaces.iter().copied())
            .collect();
        let mut result = Vec::new();
        while let Some(iface) = queue.pop_front() {
            if !visited.insert(iface) {
                continue;
            }
            result.push(iface);
            queue.extend(self.class(iface).interfaces.iter().copied());
        }
        result
    }

    pub fn is_subclass(&self, sub: ClassId, sup: ClassId) -> bool {
        self.superclasses(sub).any(|c| c == sup) || self.superinterfaces(sub).contains(&sup)
    }

    /// Finds the method that runs when `subsignature` is invoked on an object
    /// whose runtime class is `class`: the first non-abstract declaration on
    /// the superclass chain, then default methods of superinterfaces.
    pub fn dispatch(&self, class: ClassId, subsignature: &Subsignature) -> Option<MethodId> {
        self.lookup(class, subsignature, false)
    }

    /// Dispatch on an object of type `ty`. Arrays only have the methods of
    /// the root object class.
    pub fn dispatch_on_type(&self, ty: &Type, subsignature: &Subsignature) -> Option<MethodId> {
        match ty {
            Type::Class(class) => self.dispatch(*class, subsignature),
            Type::Array(_) => self
                .object_class
                .and_then(|object| self.dispatch(object, subsignature)),
        }
    }

    /// Resolves a symbolic method reference to its declaration. Unlike
    /// `dispatch`, abstract declarations are accepted.
    pub fn resolve_method_ref(&self, method_ref: &MethodRef) -> Option<MethodId> {
        self.lookup(method_ref.class, &method_ref.subsignature, true)
    }

    fn lookup(
        &self,
        class: ClassId,
        subsignature: &Subsignature,
        allow_abstract: bool,
    ) -> Option<MethodId> {
        let accept = |method: MethodId| allow_abstract || !self.method(method).is_abstract;
        self.superclasses(class)
            .filter_map(|c| self.class(c).methods.get(subsignature).copied())
            .find(|m| accept(*m))
            .or_else(|| {
                self.superinterfaces(class)
                    .into_iter()
                    .filter_map(|c| self.class(c).methods.get(subsignature).copied())
                    .find(|m| accept(*m))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ProgramBuilder;

    #[test]
    fn test_dispatch_walks_superclasses() {
        let mut builder = ProgramBuilder::new();
        let object = builder.add_class("Object", None).unwrap();
        let base = builder.add_class("Base", Some(object)).unwrap();
        let sub = builder.add_class("Sub", Some(base)).unwrap();
        let base_foo = builder.add_method(base, "void foo()", false).unwrap();
        let object_hash = builder.add_method(object, "int hashCode()", false).unwrap();
        let program = builder.build().unwrap();

        let foo: Subsignature = "void foo()".parse().unwrap();
        let hash: Subsignature = "int hashCode()".parse().unwrap();
        assert_eq!(program.dispatch(sub, &foo), Some(base_foo));
        assert_eq!(program.dispatch(sub, &hash), Some(object_hash));
        assert_eq!(program.dispatch(object, &foo), None);
        assert_eq!(
            program.dispatch_on_type(&Type::array_of(Type::Class(sub)), &hash),
            Some(object_hash)
        );
        assert!(program.is_subclass(sub, object));
        assert!(!program.is_subclass(base, sub));
    }

    #[test]
    fn test_dispatch_skips_abstract_and_finds_default_methods() {
        let mut builder = ProgramBuilder::new();
        let object = builder.add_class("Object", None).unwrap();
        let iface = builder.add_interface("Greeter", &[]).unwrap();
        let greet_decl = builder.add_abstract_method(iface, "void greet()").unwrap();
        let size_default = builder.add_method(iface, "int size()", false).unwrap();
        let shape = builder.add_abstract_class("Shape", Some(object)).unwrap();
        builder.add_interface_impl(shape, iface).unwrap();
        let shape_area = builder.add_abstract_method(shape, "int area()").unwrap();
        let circle = builder.add_class("Circle", Some(shape)).unwrap();
        let circle_area = builder.add_method(circle, "int area()", false).unwrap();
        let program = builder.build().unwrap();

        let area: Subsignature = "int area()".parse().unwrap();
        let greet: Subsignature = "void greet()".parse().unwrap();
        let size: Subsignature = "int size()".parse().unwrap();
        assert_eq!(program.dispatch(circle, &area), Some(circle_area));
        assert_eq!(program.dispatch(shape, &area), None);
        assert_eq!(program.dispatch(circle, &greet), None);
        assert_eq!(program.dispatch(circle, &size), Some(size_default));

        let area_ref = MethodRef {
            class: shape,
            subsignature: area,
        };
        assert_eq!(program.resolve_method_ref(&area_ref), Some(shape_area));
        let greet_ref = MethodRef {
            class: circle,
            subsignature: greet,
        };
        assert_eq!(program.resolve_method_ref(&greet_ref), Some(greet_decl));
    }
}
