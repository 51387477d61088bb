// src/ast/mod.rs
//! Syntax trees accepted by the AIR front ends
//!
//! The imperative front end works on a typed [`Node`] tree. Trees produced by
//! an external ESTree parser are lifted into it by [`estree::lift`], which is
//! where node kinds outside the supported grammar are rejected. The
//! S-expression front end works on [`SExpr`].

pub mod estree;
pub mod sexpr;

use serde::{ser, Serialize, Serializer};
use std::fmt;

pub use estree::lift;
pub use sexpr::SExpr;

/// Every node kind the imperative front end understands.
///
/// This is the closed dispatch table of the compiler: an ESTree `type` that
/// does not name one of these variants is an unsupported construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Program,
    ExpressionStatement,
    IfStatement,
    BlockStatement,
    FunctionDeclaration,
    ReturnStatement,
    ForInStatement,
    ForOfStatement,
    BinaryExpression,
    LogicalExpression,
    UnaryExpression,
    CallExpression,
    Identifier,
    Literal,
}

impl NodeKind {
    pub const ALL: [NodeKind; 14] = [
        NodeKind::Program,
        NodeKind::ExpressionStatement,
        NodeKind::IfStatement,
        NodeKind::BlockStatement,
        NodeKind::FunctionDeclaration,
        NodeKind::ReturnStatement,
        NodeKind::ForInStatement,
        NodeKind::ForOfStatement,
        NodeKind::BinaryExpression,
        NodeKind::LogicalExpression,
        NodeKind::UnaryExpression,
        NodeKind::CallExpression,
        NodeKind::Identifier,
        NodeKind::Literal,
    ];

    /// The ESTree `type` string for this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Program => "Program",
            NodeKind::ExpressionStatement => "ExpressionStatement",
            NodeKind::IfStatement => "IfStatement",
            NodeKind::BlockStatement => "BlockStatement",
            NodeKind::FunctionDeclaration => "FunctionDeclaration",
            NodeKind::ReturnStatement => "ReturnStatement",
            NodeKind::ForInStatement => "ForInStatement",
            NodeKind::ForOfStatement => "ForOfStatement",
            NodeKind::BinaryExpression => "BinaryExpression",
            NodeKind::LogicalExpression => "LogicalExpression",
            NodeKind::UnaryExpression => "UnaryExpression",
            NodeKind::CallExpression => "CallExpression",
            NodeKind::Identifier => "Identifier",
            NodeKind::Literal => "Literal",
        }
    }

    /// Look up a kind by its ESTree `type` string
    pub fn from_name(name: &str) -> Option<NodeKind> {
        NodeKind::ALL.iter().copied().find(|kind| kind.as_str() == name)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed imperative syntax tree
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Program {
        body: Vec<Node>,
    },

    ExpressionStatement {
        expression: Box<Node>,
    },

    /// if (test) consequent else alternate
    If {
        test: Box<Node>,
        consequent: Box<Node>,
        alternate: Option<Box<Node>>,
    },

    Block {
        body: Vec<Node>,
    },

    FunctionDeclaration {
        name: Option<String>,
        params: Vec<String>,
        body: Box<Node>,
    },

    Return {
        argument: Option<Box<Node>>,
    },

    /// for (binding in right) body
    ForIn {
        binding: String,
        right: Box<Node>,
        body: Box<Node>,
    },

    /// for (binding of right) body
    ForOf {
        binding: String,
        right: Box<Node>,
        body: Box<Node>,
    },

    Binary {
        operator: String,
        left: Box<Node>,
        right: Box<Node>,
    },

    /// `&&`, `||` and `??`
    Logical {
        operator: String,
        left: Box<Node>,
        right: Box<Node>,
    },

    Unary {
        operator: String,
        argument: Box<Node>,
    },

    Call {
        callee: Box<Node>,
        arguments: Vec<Node>,
    },

    Identifier(String),

    Literal(Literal),
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Program { .. } => NodeKind::Program,
            Node::ExpressionStatement { .. } => NodeKind::ExpressionStatement,
            Node::If { .. } => NodeKind::IfStatement,
            Node::Block { .. } => NodeKind::BlockStatement,
            Node::FunctionDeclaration { .. } => NodeKind::FunctionDeclaration,
            Node::Return { .. } => NodeKind::ReturnStatement,
            Node::ForIn { .. } => NodeKind::ForInStatement,
            Node::ForOf { .. } => NodeKind::ForOfStatement,
            Node::Binary { .. } => NodeKind::BinaryExpression,
            Node::Logical { .. } => NodeKind::LogicalExpression,
            Node::Unary { .. } => NodeKind::UnaryExpression,
            Node::Call { .. } => NodeKind::CallExpression,
            Node::Identifier(_) => NodeKind::Identifier,
            Node::Literal(_) => NodeKind::Literal,
        }
    }

    pub fn ident(name: impl Into<String>) -> Self {
        Node::Identifier(name.into())
    }

    pub fn lit(value: impl Into<Literal>) -> Self {
        Node::Literal(value.into())
    }

    pub fn binary(operator: impl Into<String>, left: Node, right: Node) -> Self {
        Node::Binary {
            operator: operator.into(),
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn call(callee: Node, arguments: Vec<Node>) -> Self {
        Node::Call {
            callee: Box::new(callee),
            arguments,
        }
    }

    pub fn ret(argument: Node) -> Self {
        Node::Return {
            argument: Some(Box::new(argument)),
        }
    }

    pub fn block(body: Vec<Node>) -> Self {
        Node::Block { body }
    }

    pub fn expr_stmt(expression: Node) -> Self {
        Node::ExpressionStatement {
            expression: Box::new(expression),
        }
    }
}

/// Literal value carried through to AIR unchanged
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl Serialize for Literal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Literal::Null => serializer.serialize_unit(),
            Literal::Bool(b) => serializer.serialize_bool(*b),
            Literal::Int(n) => serializer.serialize_i64(*n),
            Literal::Float(f) if !f.is_finite() => Err(ser::Error::custom(format!(
                "non-finite number {} has no JSON form",
                f
            ))),
            Literal::Float(f) => serializer.serialize_f64(*f),
            Literal::String(s) => serializer.serialize_str(s),
        }
    }
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self {
        Literal::Bool(b)
    }
}

impl From<i64> for Literal {
    fn from(n: i64) -> Self {
        Literal::Int(n)
    }
}

impl From<i32> for Literal {
    fn from(n: i32) -> Self {
        Literal::Int(n as i64)
    }
}

impl From<f64> for Literal {
    fn from(f: f64) -> Self {
        Literal::Float(f)
    }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Literal::String(s.to_string())
    }
}

impl From<String> for Literal {
    fn from(s: String) -> Self {
        Literal::String(s)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => write!(f, "null"),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Int(n) => write!(f, "{}", n),
            Literal::Float(x) => write!(f, "{:?}", x),
            Literal::String(s) => write!(f, "{:?}", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_round_trip() {
        for kind in NodeKind::ALL {
            assert_eq!(NodeKind::from_name(kind.as_str()), Some(kind));
        }
        assert_eq!(NodeKind::from_name("TryStatement"), None);
        assert_eq!(NodeKind::from_name("identifier"), None);
    }

    #[test]
    fn test_node_kind() {
        let node = Node::binary("+", Node::ident("a"), Node::lit(1));
        assert_eq!(node.kind(), NodeKind::BinaryExpression);
        assert_eq!(Node::ret(Node::lit(true)).kind(), NodeKind::ReturnStatement);
    }
}
