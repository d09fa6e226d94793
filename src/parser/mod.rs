//! kcc Parser Module
//!
//! Parses C tokens into an Abstract Syntax Tree (AST), resolving types and
//! identifiers and assigning stack slots on the way.

mod ast;
mod c_parser;
mod state;

pub use ast::{
    Argument, AssignmentExpr, BinaryExpr, BinaryOp, Decl, DeclRefExpr, Expr, ExprStmt, Function,
    IntegerLiteral, Literal, PrimaryExpr, Program, ReturnStmt, Stmt, StringLiteral, VariableDecl,
};
pub use c_parser::{Parser, MAX_NESTING_DEPTH};
pub use state::{qualify, CompilerState, IdentifierInfo, IdentifierKind, TypeInfo, SCOPE_SEPARATOR};
