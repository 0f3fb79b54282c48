//! Frontend module - Lexer, Parser, Semantic checks

pub mod token;
pub mod lexer;
pub mod ast;
pub mod parser;
pub mod semantic;
