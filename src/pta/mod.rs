//! # pta
//!
//! Context-insensitive, flow-insensitive points-to analysis that builds the
//! call graph on the fly. Heap objects are abstracted by allocation site,
//! instance fields and array elements are kept per abstract object.

mod heap;
mod options;
mod pfg;
mod pointer;
mod result;
mod solver;
mod worklist;

pub use heap::{HeapModel, Obj, ObjId};
pub use options::{DumpMode, PtaOptions, DUMP_ENV_VAR};
pub use pfg::PointerFlowGraph;
pub use pointer::{Pointer, PointerId, PointsToSet};
pub use result::{PointerAnalysisResult, Statistics};
pub use solver::Solver;
pub use worklist::{Entry, WorkList, WorkListOrder};

use anyhow::Result;

use crate::ir::Program;

/// Analyzes `program` from its main method with default options.
pub fn analyze(program: &Program) -> Result<PointerAnalysisResult> {
    analyze_with(program, &PtaOptions::default())
}

pub fn analyze_with(program: &Program, options: &PtaOptions) -> Result<PointerAnalysisResult> {
    let result = Solver::new(program, options).solve()?;
    result.dump(program, options.dump);
    Ok(result)
}
