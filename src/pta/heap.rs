//! Allocation-site abstraction of the heap.
//! All objects allocated by one `new` statement are represented by one `Obj`.

use std::collections::HashMap;
use std::fmt;

use crate::ir::{Location, Program, Type};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjId(pub(crate) u32);

impl ObjId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ObjId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obj#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Obj {
    pub alloc_site: Location,
    pub ty: Type,
}

impl Obj {
    pub fn describe(&self, program: &Program) -> String {
        format!(
            "NewObj{{{}[{}]new {}}}",
            program.method_name(self.alloc_site.method),
            self.alloc_site.index,
            program.type_name(&self.ty)
        )
    }
}

/// Object table keyed by allocation site.
#[derive(Debug, Default)]
pub struct HeapModel {
    objs: Vec<Obj>,
    sites: HashMap<Location, ObjId>,
}

impl HeapModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the object of an allocation site, creating it on first use.
    pub fn get_obj(&mut self, alloc_site: Location, ty: &Type) -> ObjId {
        let objs = &mut self.objs;
        *self.sites.entry(alloc_site).or_insert_with(|| {
            let id = ObjId(objs.len() as u32);
            objs.push(Obj {
                alloc_site,
                ty: ty.clone(),
            });
            id
        })
    }

    pub fn obj(&self, id: ObjId) -> &Obj {
        &self.objs[id.index()]
    }

    pub fn obj_at(&self, alloc_site: Location) -> Option<ObjId> {
        self.sites.get(&alloc_site).copied()
    }

    pub fn objects(&self) -> impl Iterator<Item = ObjId> {
        (0..self.objs.len() as u32).map(ObjId)
    }

    pub fn len(&self) -> usize {
        self.objs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objs.is_empty()
    }
}
