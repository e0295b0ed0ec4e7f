//! Whole-program points-to analysis and on-the-fly call graph construction
//! for an object-oriented intermediate representation.
//!
//! ```ignore
//! let program = builder.build()?;
//! let result = rust_pta::pta::analyze(&program)?;
//! let pts = result.var_points_to(var);
//! let callees = result.call_graph().callees_of(call_site);
//! ```

pub mod callgraph;
pub mod ir;
pub mod pta;
mod util;
