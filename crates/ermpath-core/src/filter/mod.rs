//! Filter grammar: the AST, its canonical path encoding, and the
//! segment parser.

mod ast;
mod parse;


pub use ast::{BinaryPredicate, ColumnRef, FilterNode, Operator, UnaryPredicate};
pub use parse::{parse_filter_segment, parse_filter_segment_at};
