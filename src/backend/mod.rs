//! Backend module - Code generation

pub mod codegen;

// C Backend
pub mod c;

pub use c::CCodeGen;
pub use codegen::{
    CodeGen, CodegenOptions, GeneratedCode, ResumeStrategy, DEFAULT_RETURN_STACK_CAPACITY,
    RESUME_LINE_OFFSET,
};
