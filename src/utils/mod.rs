pub mod ast;
pub mod codegen;
