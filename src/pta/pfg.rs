//! # pfg
//!
//! Pointer flow graph. An edge `s -> t` means every object pointed to by
//! `s` may be pointed to by `t`.
//! Pointers are interned into an arena on first reference and addressed by
//! `PointerId` afterwards, each one owns its points-to set. Both the arena
//! and the edge set only grow.

use std::collections::HashMap;

use super::heap::ObjId;
use super::pointer::{Pointer, PointerId, PointsToSet};
use crate::ir::{FieldId, VarId};
use crate::util::Graph;

#[derive(Debug, Default)]
pub struct PointerFlowGraph {
    pointers: Vec<Pointer>,
    pts: Vec<PointsToSet>,
    ids: HashMap<Pointer, PointerId>,
    graph: Graph<PointerId>,
}

impl PointerFlowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_pointer(&mut self, pointer: Pointer) -> PointerId {
        if let Some(id) = self.ids.get(&pointer) {
            return *id;
        }
        let id = PointerId(self.pointers.len() as u32);
        self.pointers.push(pointer);
        self.pts.push(PointsToSet::new());
        self.ids.insert(pointer, id);
        id
    }

    pub fn get_var_ptr(&mut self, var: VarId) -> PointerId {
        self.get_pointer(Pointer::Var(var))
    }

    pub fn get_instance_field(&mut self, obj: ObjId, field: FieldId) -> PointerId {
        self.get_pointer(Pointer::InstanceField(obj, field))
    }

    pub fn get_array_index(&mut self, obj: ObjId) -> PointerId {
        self.get_pointer(Pointer::ArrayIndex(obj))
    }

    pub fn get_static_field(&mut self, field: FieldId) -> PointerId {
        self.get_pointer(Pointer::StaticField(field))
    }

    /// Looks a pointer up without creating it.
    pub fn find(&self, pointer: &Pointer) -> Option<PointerId> {
        self.ids.get(pointer).copied()
    }

    pub fn pointer(&self, id: PointerId) -> Pointer {
        self.pointers[id.index()]
    }

    pub fn points_to(&self, id: PointerId) -> &PointsToSet {
        &self.pts[id.index()]
    }

    pub(crate) fn points_to_mut(&mut self, id: PointerId) -> &mut PointsToSet {
        &mut self.pts[id.index()]
    }

    /// Returns true iff the edge is new.
    pub fn add_edge(&mut self, source: PointerId, target: PointerId) -> bool {
        self.graph.add_edge(source, target)
    }

    pub fn has_edge(&self, source: PointerId, target: PointerId) -> bool {
        self.graph.contains_edge(source, target)
    }

    pub fn succs_of(&self, id: PointerId) -> Vec<PointerId> {
        let mut succs: Vec<PointerId> = self
            .graph
            .neighbors(id)
            .map(|succs| succs.iter().copied().collect())
            .unwrap_or_default();
        succs.sort();
        succs
    }

    pub fn pointers(&self) -> impl Iterator<Item = PointerId> {
        (0..self.pointers.len() as u32).map(PointerId)
    }

    pub fn edges(&self) -> impl Iterator<Item = (PointerId, PointerId)> + '_ {
        self.graph.iter_edges()
    }

    pub fn num_pointers(&self) -> usize {
        self.pointers.len()
    }

    pub fn num_edges(&self) -> usize {
        self.graph.num_edges()
    }
}
