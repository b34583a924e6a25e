pub mod lexer;
pub mod parser;
pub mod ast;
pub mod typeck;
pub mod codegen;

pub mod cli;

pub mod error;
