//! Initial PFG edges and worklist entries of a newly reachable method.
//! Statements whose effect depends on the objects a base or receiver
//! variable points to are left to the solver loop.

use super::Solver;
use crate::ir::{Invoke, Location, MethodId, Stmt};
use crate::pta::pointer::PointsToSet;

impl<'p> Solver<'p> {
    pub(super) fn process_method(&mut self, method: MethodId) {
        let program = self.program;
        for (index, stmt) in program.method(method).stmts.iter().enumerate() {
            self.process_stmt(Location::new(method, index), stmt);
        }
    }

    fn process_stmt(&mut self, loc: Location, stmt: &Stmt) {
        match stmt {
            Stmt::New { lhs, ty } => {
                let obj = self.heap.get_obj(loc, ty);
                let ptr = self.pfg.get_var_ptr(*lhs);
                self.worklist.add_entry(ptr, PointsToSet::singleton(obj));
            }
            Stmt::Copy { lhs, rhs } | Stmt::Cast { lhs, rhs, .. } => {
                let source = self.pfg.get_var_ptr(*rhs);
                let target = self.pfg.get_var_ptr(*lhs);
                self.add_pfg_edge(source, target);
            }
            Stmt::LoadField {
                lhs,
                base: None,
                field,
            } => {
                let source = self.pfg.get_static_field(*field);
                let target = self.pfg.get_var_ptr(*lhs);
                self.add_pfg_edge(source, target);
            }
            Stmt::StoreField {
                base: None,
                field,
                rhs,
            } => {
                let source = self.pfg.get_var_ptr(*rhs);
                let target = self.pfg.get_static_field(*field);
                self.add_pfg_edge(source, target);
            }
            Stmt::Invoke(invoke) if invoke.kind.is_static() => self.process_static_call(loc, invoke),
            Stmt::LoadField { .. }
            | Stmt::StoreField { .. }
            | Stmt::LoadArray { .. }
            | Stmt::StoreArray { .. }
            | Stmt::Invoke(_) => {}
            Stmt::Return { .. } | Stmt::Other => {}
        }
    }

    fn process_static_call(&mut self, loc: Location, invoke: &Invoke) {
        match self.resolve_callee(None, invoke) {
            Some(callee) => self.add_call_edge(loc, invoke, callee),
            None => log::debug!(
                "cannot resolve static call at {:?} to {}",
                loc,
                invoke.method_ref.subsignature
            ),
        }
    }
}
