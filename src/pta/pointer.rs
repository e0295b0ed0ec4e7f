use std::collections::btree_set;
use std::collections::BTreeSet;
use std::fmt;

use super::heap::ObjId;
use crate::ir::{FieldId, Program, VarId};

/// Node of the pointer flow graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Pointer {
    /// A local variable. Every variable belongs to exactly one method.
    Var(VarId),
    InstanceField(ObjId, FieldId),
    /// All elements of an array object.
    ArrayIndex(ObjId),
    StaticField(FieldId),
}

impl Pointer {
    pub fn as_var(self) -> Option<VarId> {
        match self {
            Pointer::Var(var) => Some(var),
            _ => None,
        }
    }

    pub fn describe(&self, program: &Program) -> String {
        match self {
            Pointer::Var(var) => program.var_name(*var),
            Pointer::InstanceField(obj, field) => {
                format!("{}.{}", obj, program.field(*field).name)
            }
            Pointer::ArrayIndex(obj) => format!("{}[*]", obj),
            Pointer::StaticField(field) => program.field_name(*field),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointerId(pub(crate) u32);

impl PointerId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Set of abstract objects. Iteration is ordered by `ObjId` so that dumps are reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PointsToSet {
    objs: BTreeSet<ObjId>,
}

impl PointsToSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn singleton(obj: ObjId) -> Self {
        let mut set = Self::new();
        set.add(obj);
        set
    }

    pub fn add(&mut self, obj: ObjId) -> bool {
        self.objs.insert(obj)
    }

    pub fn add_all(&mut self, other: &PointsToSet) -> bool {
        let before = self.objs.len();
        self.objs.extend(other.objs.iter().copied());
        self.objs.len() != before
    }

    pub fn contains(&self, obj: ObjId) -> bool {
        self.objs.contains(&obj)
    }

    pub fn is_subset(&self, other: &PointsToSet) -> bool {
        self.objs.is_subset(&other.objs)
    }

    pub fn intersects(&self, other: &PointsToSet) -> bool {
        !self.objs.is_disjoint(&other.objs)
    }

    /// Objects of `self` that are not in `other`.
    pub fn difference(&self, other: &PointsToSet) -> PointsToSet {
        Self {
            objs: self.objs.difference(&other.objs).copied().collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = ObjId> + '_ {
        self.objs.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.objs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objs.is_empty()
    }
}

impl IntoIterator for PointsToSet {
    type Item = ObjId;
    type IntoIter = btree_set::IntoIter<ObjId>;

    fn into_iter(self) -> Self::IntoIter {
        self.objs.into_iter()
    }
}

impl std::iter::FromIterator<ObjId> for PointsToSet {
    fn from_iter<I: IntoIterator<Item = ObjId>>(iter: I) -> Self {
        Self {
            objs: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for PointsToSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let objs: Vec<String> = self.objs.iter().map(|o| o.to_string()).collect();
        write!(f, "{{{}}}", objs.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_to_set_operations() {
        let mut set = PointsToSet::singleton(ObjId(1));
        assert!(set.add(ObjId(3)));
        assert!(!set.add(ObjId(1)));
        let other: PointsToSet = vec![ObjId(1), ObjId(2)].into_iter().collect();
        assert_eq!(other.difference(&set), PointsToSet::singleton(ObjId(2)));
        assert!(set.intersects(&other));
        assert!(!set.is_subset(&other));
        assert!(set.add_all(&other));
        assert!(!set.add_all(&other));
        assert!(other.is_subset(&set));
        assert_eq!(set.to_string(), "{obj#1, obj#2, obj#3}");
        assert_eq!(set.into_iter().collect::<Vec<_>>(), vec![ObjId(1), ObjId(2), ObjId(3)]);
    }
}
