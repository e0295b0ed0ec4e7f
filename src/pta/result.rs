use anyhow::{bail, Result};
use log::info;
use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use std::fmt;

use super::heap::{HeapModel, Obj, ObjId};
use super::options::DumpMode;
use super::pfg::PointerFlowGraph;
use super::pointer::{Pointer, PointsToSet};
use crate::callgraph::CallGraph;
use crate::ir::{FieldId, Location, Program, VarId};

static EMPTY_PTS: Lazy<PointsToSet> = Lazy::new(PointsToSet::new);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Statistics {
    pub reachable_methods: usize,
    pub call_edges: usize,
    pub pointers: usize,
    pub pfg_edges: usize,
    pub objects: usize,
    pub iterations: usize,
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#reachable methods: {}, #call edges: {}, #pointers: {}, #pfg edges: {}, #objects: {}, #iterations: {}",
            self.reachable_methods,
            self.call_edges,
            self.pointers,
            self.pfg_edges,
            self.objects,
            self.iterations
        )
    }
}

/// Final state of a pointer analysis run.
#[derive(Debug)]
pub struct PointerAnalysisResult {
    pfg: PointerFlowGraph,
    heap: HeapModel,
    call_graph: CallGraph,
    iterations: usize,
}

impl PointerAnalysisResult {
    pub(crate) fn new(
        pfg: PointerFlowGraph,
        heap: HeapModel,
        call_graph: CallGraph,
        iterations: usize,
    ) -> Self {
        Self {
            pfg,
            heap,
            call_graph,
            iterations,
        }
    }

    /// Points-to set of any pointer; empty for pointers the analysis never saw.
    pub fn points_to(&self, pointer: &Pointer) -> &PointsToSet {
        match self.pfg.find(pointer) {
            Some(id) => self.pfg.points_to(id),
            None => &*EMPTY_PTS,
        }
    }

    pub fn var_points_to(&self, var: VarId) -> &PointsToSet {
        self.points_to(&Pointer::Var(var))
    }

    pub fn instance_field_points_to(&self, obj: ObjId, field: FieldId) -> &PointsToSet {
        self.points_to(&Pointer::InstanceField(obj, field))
    }

    pub fn array_index_points_to(&self, obj: ObjId) -> &PointsToSet {
        self.points_to(&Pointer::ArrayIndex(obj))
    }

    pub fn static_field_points_to(&self, field: FieldId) -> &PointsToSet {
        self.points_to(&Pointer::StaticField(field))
    }

    /// Every pointer created during the analysis together with its set.
    pub fn pointers(&self) -> impl Iterator<Item = (Pointer, &PointsToSet)> {
        let pfg = &self.pfg;
        pfg.pointers().map(move |id| (pfg.pointer(id), pfg.points_to(id)))
    }

    pub fn points_to_map(&self) -> BTreeMap<Pointer, PointsToSet> {
        self.pointers()
            .map(|(pointer, pts)| (pointer, pts.clone()))
            .collect()
    }

    pub fn objects(&self) -> impl Iterator<Item = ObjId> {
        self.heap.objects()
    }

    pub fn obj(&self, id: ObjId) -> &Obj {
        self.heap.obj(id)
    }

    /// The object allocated at `alloc_site`, if that allocation was reachable.
    pub fn object_at(&self, alloc_site: Location) -> Option<ObjId> {
        self.heap.obj_at(alloc_site)
    }

    pub fn may_alias(&self, a: VarId, b: VarId) -> bool {
        self.var_points_to(a).intersects(self.var_points_to(b))
    }

    pub fn call_graph(&self) -> &CallGraph {
        &self.call_graph
    }

    pub fn pfg_edge_count(&self) -> usize {
        self.pfg.num_edges()
    }

    /// Whether points-to information flows along `source -> target`.
    pub fn has_pfg_edge(&self, source: &Pointer, target: &Pointer) -> bool {
        match (self.pfg.find(source), self.pfg.find(target)) {
            (Some(s), Some(t)) => self.pfg.has_edge(s, t),
            _ => false,
        }
    }

    /// Verifies that the sets are closed under every flow edge.
    pub fn check_fixpoint(&self) -> Result<()> {
        for (source, target) in self.pfg.edges() {
            if !self
                .pfg
                .points_to(source)
                .is_subset(self.pfg.points_to(target))
            {
                bail!(
                    "points-to set of {:?} is not contained in that of its successor {:?}",
                    self.pfg.pointer(source),
                    self.pfg.pointer(target)
                );
            }
        }
        Ok(())
    }

    pub fn statistics(&self) -> Statistics {
        Statistics {
            reachable_methods: self.call_graph.reachable_methods().len(),
            call_edges: self.call_graph.num_edges(),
            pointers: self.pfg.num_pointers(),
            pfg_edges: self.pfg.num_edges(),
            objects: self.heap.len(),
            iterations: self.iterations,
        }
    }

    pub fn dump(&self, program: &Program, mode: DumpMode) {
        if mode.statistics() {
            info!("{}", self.statistics());
            for (pointer, pts) in self.points_to_map() {
                if !pts.is_empty() {
                    info!("{} -> {}", pointer.describe(program), pts);
                }
            }
            for obj in self.objects() {
                info!("{} = {}", obj, self.obj(obj).describe(program));
            }
        }
        if mode.call_graph() {
            info!("call graph:\n{}", self.call_graph.dot(program));
        }
    }
}
