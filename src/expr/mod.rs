//! Layout expression language: tokenizer, parser, evaluator, formatter.

pub mod ast;
pub mod eval;
pub mod format;
pub mod parser;
pub mod tokenizer;

pub use ast::{BinaryOp, BindingRef, BindingTarget, Expr, Function, Property, Segment, UnaryOp};
pub use parser::{parse_layout, parse_layout2d};
