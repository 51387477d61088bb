// src/compiler/mod.rs
//! Front ends that turn parsed surface syntax into AIR

pub mod air;
pub mod compiler;
pub mod sexpr;

use crate::ast::{self, Node, SExpr};
use crate::CompilationError;

pub use air::{Air, Arm, Binding};

/// A parsed program in one of the accepted surface syntaxes
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    /// ESTree JSON handed over by an external parser
    Estree(serde_json::Value),

    /// Typed imperative tree
    Ast(Node),

    /// S-expression tree
    SExpression(SExpr),
}

impl Source {
    /// Which front end this source goes through
    pub fn syntax(&self) -> &'static str {
        match self {
            Source::Estree(_) | Source::Ast(_) => "imperative",
            Source::SExpression(_) => "s-expression",
        }
    }
}

impl From<Node> for Source {
    fn from(node: Node) -> Self {
        Source::Ast(node)
    }
}

impl From<SExpr> for Source {
    fn from(expr: SExpr) -> Self {
        Source::SExpression(expr)
    }
}

/// Compile a parsed program into AIR
pub fn compile(source: &Source) -> Result<Air, CompilationError> {
    match source {
        Source::Estree(value) => compile_estree(value),
        Source::Ast(node) => compiler::Compiler::compile(node),
        Source::SExpression(expr) => sexpr::compile(expr),
    }
}

/// Lift an ESTree JSON tree and compile it
pub fn compile_estree(value: &serde_json::Value) -> Result<Air, CompilationError> {
    let node = ast::lift(value)?;
    compiler::Compiler::compile(&node)
}
