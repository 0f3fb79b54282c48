//! C Backend - Generate C code from the BASIC AST
//!
//! Line labels become C labels, GOTO becomes `goto`, and GOSUB/RETURN are
//! emulated with a global return-address stack and a `switch` dispatch.

mod c_codegen;
mod control_flow;

pub use c_codegen::CCodeGen;
pub use control_flow::{ControlFlow, ResumeLabel};
