// Worklist solver, context insensitive, flow insensitive.
// init: main reachable, its statements seed the worklist and the PFG
// loop: (p, pts) = poll
//  delta = pts - pt(p), pt(p) += delta, (succ, delta) for every succ of p
//  if p is variable v, for every o in delta:
//      v.f = y   => y -> o.f
//      x = v.f   => o.f -> x
//      v[*] = y  => y -> o[*]
//      x = v[*]  => o[*] -> x
//      r = v.m(a) => callee = dispatch(o, m), o -> callee.this
//          if (site, callee) is new: args -> params, returns -> r
//  newly reachable methods run through the statement processor
// Every new edge s -> t enqueues (t, pt(s)).

mod stmt_processor;

use anyhow::{anyhow, Result};
use log::{debug, info, trace};
use std::collections::VecDeque;

use super::heap::{HeapModel, ObjId};
use super::options::PtaOptions;
use super::pfg::PointerFlowGraph;
use super::pointer::{Pointer, PointerId, PointsToSet};
use super::result::PointerAnalysisResult;
use super::worklist::{Entry, WorkList};
use crate::callgraph::{CallEdge, CallGraph};
use crate::ir::{CallKind, Invoke, Location, MethodId, Program, Stmt, VarId};

pub struct Solver<'p> {
    program: &'p Program,
    heap: HeapModel,
    pfg: PointerFlowGraph,
    worklist: WorkList,
    call_graph: CallGraph,
    pending_methods: VecDeque<MethodId>,
    iterations: usize,
}

impl<'p> Solver<'p> {
    pub fn new(program: &'p Program, options: &PtaOptions) -> Self {
        Self {
            program,
            heap: HeapModel::new(),
            pfg: PointerFlowGraph::new(),
            worklist: WorkList::new(options.order),
            call_graph: CallGraph::new(),
            pending_methods: VecDeque::new(),
            iterations: 0,
        }
    }

    /// Runs the analysis from the program's main method to a fixpoint.
    pub fn solve(mut self) -> Result<PointerAnalysisResult> {
        let entry = self
            .program
            .main_method()
            .ok_or_else(|| anyhow!("program has no main method to start the analysis from"))?;
        info!(
            "pointer analysis starts from {}",
            self.program.method_name(entry)
        );
        self.initialize(entry);
        self.analyze();
        let result = PointerAnalysisResult::new(self.pfg, self.heap, self.call_graph, self.iterations);
        info!("pointer analysis finished: {}", result.statistics());
        Ok(result)
    }

    fn initialize(&mut self, entry: MethodId) {
        self.call_graph.add_entry_method(entry);
        self.add_reachable(entry);
        self.process_pending_methods();
    }

    /// Marks `method` reachable. Its statements are processed once, by
    /// `process_pending_methods`.
    fn add_reachable(&mut self, method: MethodId) {
        if self.call_graph.add_reachable_method(method) {
            debug!("new reachable method {}", self.program.method_name(method));
            self.pending_methods.push_back(method);
        }
    }

    fn process_pending_methods(&mut self) {
        while let Some(method) = self.pending_methods.pop_front() {
            self.process_method(method);
        }
    }

    /// Adds `source -> target` to the PFG. A new edge immediately carries
    /// whatever `source` already points to.
    fn add_pfg_edge(&mut self, source: PointerId, target: PointerId) {
        if self.pfg.add_edge(source, target) {
            let pts = self.pfg.points_to(source);
            if !pts.is_empty() {
                let pts = pts.clone();
                self.worklist.add_entry(target, pts);
            }
        }
    }

    fn analyze(&mut self) {
        while self.step() {}
    }

    /// Processes one worklist entry. Returns false once the worklist is empty.
    fn step(&mut self) -> bool {
        let Entry { pointer, pts } = match self.worklist.poll_entry() {
            Some(entry) => entry,
            None => return false,
        };
        self.iterations += 1;
        let delta = self.propagate(pointer, &pts);
        if !delta.is_empty() {
            if let Pointer::Var(var) = self.pfg.pointer(pointer) {
                for obj in delta.iter() {
                    self.process_heap_accesses(var, obj);
                    self.process_call(var, obj);
                }
            }
            self.process_pending_methods();
        }
        true
    }

    /// Adds the new part of `pts` to `pt(pointer)` and forwards it to the
    /// successors of `pointer`. Returns the new part.
    fn propagate(&mut self, pointer: PointerId, pts: &PointsToSet) -> PointsToSet {
        let delta = pts.difference(self.pfg.points_to(pointer));
        if delta.is_empty() {
            return delta;
        }
        let before = self.pfg.points_to(pointer).len();
        self.pfg.points_to_mut(pointer).add_all(&delta);
        assert_eq!(
            self.pfg.points_to(pointer).len(),
            before + delta.len(),
            "propagated objects overlap the points-to set of {:?}",
            self.pfg.pointer(pointer)
        );
        trace!("{:?} += {}", self.pfg.pointer(pointer), delta);
        for succ in self.pfg.succs_of(pointer) {
            self.worklist.add_entry(succ, delta.clone());
        }
        delta
    }

    /// Connects the field and array accesses through `var` to the fields
    /// and elements of `obj`.
    fn process_heap_accesses(&mut self, var: VarId, obj: ObjId) {
        let program = self.program;
        let accesses = &program.var(var).accesses;
        for loc in &accesses.store_fields {
            if let Stmt::StoreField { field, rhs, .. } = program.stmt(*loc) {
                let source = self.pfg.get_var_ptr(*rhs);
                let target = self.pfg.get_instance_field(obj, *field);
                self.add_pfg_edge(source, target);
            }
        }
        for loc in &accesses.load_fields {
            if let Stmt::LoadField { lhs, field, .. } = program.stmt(*loc) {
                let source = self.pfg.get_instance_field(obj, *field);
                let target = self.pfg.get_var_ptr(*lhs);
                self.add_pfg_edge(source, target);
            }
        }
        for loc in &accesses.store_arrays {
            if let Stmt::StoreArray { rhs, .. } = program.stmt(*loc) {
                let source = self.pfg.get_var_ptr(*rhs);
                let target = self.pfg.get_array_index(obj);
                self.add_pfg_edge(source, target);
            }
        }
        for loc in &accesses.load_arrays {
            if let Stmt::LoadArray { lhs, .. } = program.stmt(*loc) {
                let source = self.pfg.get_array_index(obj);
                let target = self.pfg.get_var_ptr(*lhs);
                self.add_pfg_edge(source, target);
            }
        }
    }

    /// Resolves the instance calls on `var` for the newly discovered receiver `recv`.
    fn process_call(&mut self, var: VarId, recv: ObjId) {
        let program = self.program;
        for loc in &program.var(var).accesses.invokes {
            let invoke = match program.stmt(*loc) {
                Stmt::Invoke(invoke) => invoke,
                _ => continue,
            };
            let callee = match self.resolve_callee(Some(recv), invoke) {
                Some(callee) => callee,
                None => {
                    debug!(
                        "no target for call at {:?} on {}",
                        loc,
                        self.heap.obj(recv).describe(program)
                    );
                    continue;
                }
            };
            if let Some(this) = program.method(callee).this {
                let this_ptr = self.pfg.get_var_ptr(this);
                self.worklist.add_entry(this_ptr, PointsToSet::singleton(recv));
            }
            self.add_call_edge(*loc, invoke, callee);
        }
    }

    /// Records the call edge, and on its first appearance makes the callee
    /// reachable and passes arguments and return values.
    fn add_call_edge(&mut self, call_site: Location, invoke: &Invoke, callee: MethodId) {
        let program = self.program;
        self.add_reachable(callee);
        if !self
            .call_graph
            .add_edge(CallEdge::new(invoke.kind, call_site, callee))
        {
            return;
        }
        debug!(
            "new call edge {} [{:?}] -> {}",
            program.method_name(call_site.method),
            call_site,
            program.method_name(callee)
        );
        let method = program.method(callee);
        for (arg, param) in invoke.args.iter().zip(method.params.iter()) {
            let source = self.pfg.get_var_ptr(*arg);
            let target = self.pfg.get_var_ptr(*param);
            self.add_pfg_edge(source, target);
        }
        if let Some(result) = invoke.result {
            let target = self.pfg.get_var_ptr(result);
            for ret in &method.return_vars {
                let source = self.pfg.get_var_ptr(*ret);
                self.add_pfg_edge(source, target);
            }
        }
    }

    /// `recv` is ignored for static calls.
    fn resolve_callee(&self, recv: Option<ObjId>, invoke: &Invoke) -> Option<MethodId> {
        let method_ref = &invoke.method_ref;
        match invoke.kind {
            CallKind::Static => self.program.resolve_method_ref(method_ref),
            CallKind::Special => self
                .program
                .dispatch(method_ref.class, &method_ref.subsignature),
            CallKind::Virtual | CallKind::Interface => recv.and_then(|recv| {
                self.program
                    .dispatch_on_type(&self.heap.obj(recv).ty, &method_ref.subsignature)
            }),
        }
    }
}
