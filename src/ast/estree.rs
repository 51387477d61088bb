// src/ast/estree.rs
//! Lifting of ESTree JSON into the typed [`Node`] tree
//!
//! The surface parser is external; it hands over the JSON form of an ESTree
//! AST (the shape esprima and acorn produce). Each object is classified by
//! its `type` field through [`NodeKind::from_name`]. Kinds outside the
//! supported grammar fail with `UnsupportedConstruct`, recognised kinds that
//! lack a required child fail with `MalformedNode`.

use super::{Literal, Node, NodeKind};
use crate::CompilationError;
use serde_json::Value;
use tracing::trace;

/// Lift one ESTree node (and its children) into a typed tree
pub fn lift(value: &Value) -> Result<Node, CompilationError> {
    let type_name = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| CompilationError::MalformedNode {
            kind: "node".to_string(),
            reason: format!("expected an object with a string `type`, got {}", value),
        })?;

    let kind = NodeKind::from_name(type_name).ok_or_else(|| {
        CompilationError::UnsupportedConstruct {
            kind: type_name.to_string(),
            dump: value.to_string(),
        }
    })?;

    trace!(kind = %kind, "lifting node");

    let node = match kind {
        NodeKind::Program => Node::Program {
            body: lift_list(value, kind, "body")?,
        },

        NodeKind::ExpressionStatement => Node::ExpressionStatement {
            expression: Box::new(lift_child(value, kind, "expression")?),
        },

        NodeKind::IfStatement => Node::If {
            test: Box::new(lift_child(value, kind, "test")?),
            consequent: Box::new(lift_child(value, kind, "consequent")?),
            alternate: lift_optional(value, "alternate")?.map(Box::new),
        },

        NodeKind::BlockStatement => Node::Block {
            body: lift_list(value, kind, "body")?,
        },

        NodeKind::FunctionDeclaration => {
            let name = value
                .get("id")
                .and_then(|id| id.get("name"))
                .and_then(Value::as_str)
                .map(str::to_string);

            let params = child_array(value, kind, "params")?
                .iter()
                .map(|param| identifier_name(param, kind, "params"))
                .collect::<Result<Vec<_>, _>>()?;

            Node::FunctionDeclaration {
                name,
                params,
                body: Box::new(lift_child(value, kind, "body")?),
            }
        }

        NodeKind::ReturnStatement => Node::Return {
            argument: lift_optional(value, "argument")?.map(Box::new),
        },

        NodeKind::ForInStatement => Node::ForIn {
            binding: loop_binding(value, kind)?,
            right: Box::new(lift_child(value, kind, "right")?),
            body: Box::new(lift_child(value, kind, "body")?),
        },

        NodeKind::ForOfStatement => Node::ForOf {
            binding: loop_binding(value, kind)?,
            right: Box::new(lift_child(value, kind, "right")?),
            body: Box::new(lift_child(value, kind, "body")?),
        },

        NodeKind::BinaryExpression => Node::Binary {
            operator: string_field(value, kind, "operator")?,
            left: Box::new(lift_child(value, kind, "left")?),
            right: Box::new(lift_child(value, kind, "right")?),
        },

        NodeKind::LogicalExpression => Node::Logical {
            operator: string_field(value, kind, "operator")?,
            left: Box::new(lift_child(value, kind, "left")?),
            right: Box::new(lift_child(value, kind, "right")?),
        },

        NodeKind::UnaryExpression => Node::Unary {
            operator: string_field(value, kind, "operator")?,
            argument: Box::new(lift_child(value, kind, "argument")?),
        },

        NodeKind::CallExpression => Node::Call {
            callee: Box::new(lift_child(value, kind, "callee")?),
            arguments: lift_list(value, kind, "arguments")?,
        },

        NodeKind::Identifier => Node::Identifier(string_field(value, kind, "name")?),

        NodeKind::Literal => Node::Literal(lift_literal(value)?),
    };

    Ok(node)
}

fn malformed(kind: NodeKind, reason: impl Into<String>) -> CompilationError {
    CompilationError::MalformedNode {
        kind: kind.to_string(),
        reason: reason.into(),
    }
}

fn lift_child(value: &Value, kind: NodeKind, field: &str) -> Result<Node, CompilationError> {
    match value.get(field) {
        Some(child) if !child.is_null() => lift(child),
        _ => Err(malformed(kind, format!("missing `{}`", field))),
    }
}

fn lift_optional(value: &Value, field: &str) -> Result<Option<Node>, CompilationError> {
    match value.get(field) {
        Some(child) if !child.is_null() => lift(child).map(Some),
        _ => Ok(None),
    }
}

fn child_array<'a>(
    value: &'a Value,
    kind: NodeKind,
    field: &str,
) -> Result<&'a Vec<Value>, CompilationError> {
    value
        .get(field)
        .and_then(Value::as_array)
        .ok_or_else(|| malformed(kind, format!("missing array `{}`", field)))
}

fn lift_list(value: &Value, kind: NodeKind, field: &str) -> Result<Vec<Node>, CompilationError> {
    child_array(value, kind, field)?.iter().map(lift).collect()
}

fn string_field(value: &Value, kind: NodeKind, field: &str) -> Result<String, CompilationError> {
    value
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| malformed(kind, format!("missing string `{}`", field)))
}

fn identifier_name(value: &Value, kind: NodeKind, field: &str) -> Result<String, CompilationError> {
    match value.get("type").and_then(Value::as_str) {
        Some("Identifier") => string_field(value, NodeKind::Identifier, "name"),
        Some(other) => Err(malformed(
            kind,
            format!("`{}` must hold identifiers, found {}", field, other),
        )),
        None => Err(malformed(kind, format!("`{}` holds a non-node value", field))),
    }
}

/// `for (x of ...)`, `for (const x of ...)`; destructuring is rejected
fn loop_binding(value: &Value, kind: NodeKind) -> Result<String, CompilationError> {
    let left = value
        .get("left")
        .filter(|left| !left.is_null())
        .ok_or_else(|| malformed(kind, "missing `left`"))?;

    if left.get("type").and_then(Value::as_str) != Some("VariableDeclaration") {
        return identifier_name(left, kind, "left");
    }

    let declarations = child_array(left, kind, "declarations")?;
    match declarations.as_slice() {
        [declarator] => {
            if declarator.get("init").is_some_and(|init| !init.is_null()) {
                return Err(malformed(kind, "loop binding must not have an initializer"));
            }
            let id = declarator
                .get("id")
                .ok_or_else(|| malformed(kind, "loop binding declarator has no `id`"))?;
            identifier_name(id, kind, "left")
        }
        _ => Err(malformed(
            kind,
            format!("loop must declare exactly one binding, found {}", declarations.len()),
        )),
    }
}

fn lift_literal(value: &Value) -> Result<Literal, CompilationError> {
    if value.get("regex").is_some() || value.get("bigint").is_some() {
        return Err(CompilationError::UnsupportedConstruct {
            kind: "Literal".to_string(),
            dump: value.to_string(),
        });
    }

    match value.get("value") {
        None => Err(malformed(NodeKind::Literal, "missing `value`")),
        Some(Value::Null) => Ok(Literal::Null),
        Some(Value::Bool(b)) => Ok(Literal::Bool(*b)),
        // Source numbers are doubles: integers past i64 keep their double value
        Some(Value::Number(n)) => match n.as_i64() {
            Some(i) => Ok(Literal::Int(i)),
            None => n.as_f64().map(Literal::Float).ok_or_else(|| {
                malformed(NodeKind::Literal, format!("unrepresentable number {}", n))
            }),
        },
        Some(Value::String(s)) => Ok(Literal::String(s.clone())),
        Some(other) => Err(malformed(
            NodeKind::Literal,
            format!("`value` is not a scalar: {}", other),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ident(name: &str) -> Value {
        json!({ "type": "Identifier", "name": name })
    }

    #[test]
    fn test_lift_binary_expression() {
        let node = lift(&json!({
            "type": "BinaryExpression",
            "operator": "==",
            "left": ident("a"),
            "right": { "type": "Literal", "value": 15, "raw": "15" }
        }))
        .unwrap();

        assert_eq!(node, Node::binary("==", Node::ident("a"), Node::lit(15)));
    }

    #[test]
    fn test_unknown_kind_is_unsupported() {
        let err = lift(&json!({
            "type": "TryStatement",
            "block": { "type": "BlockStatement", "body": [] },
            "handler": null,
            "finalizer": null
        }))
        .unwrap_err();

        match err {
            CompilationError::UnsupportedConstruct { kind, dump } => {
                assert_eq!(kind, "TryStatement");
                assert!(dump.contains("BlockStatement"));
            }
            other => panic!("Expected UnsupportedConstruct, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_kind_nested_in_supported_node() {
        let err = lift(&json!({
            "type": "ExpressionStatement",
            "expression": {
                "type": "AssignmentExpression",
                "operator": "=",
                "left": ident("x"),
                "right": ident("y")
            }
        }))
        .unwrap_err();

        match err {
            CompilationError::UnsupportedConstruct { kind, .. } => {
                assert_eq!(kind, "AssignmentExpression")
            }
            other => panic!("Expected UnsupportedConstruct, got {:?}", other),
        }
    }

    #[test]
    fn test_if_without_consequent_is_malformed() {
        let err = lift(&json!({ "type": "IfStatement", "test": ident("a"), "alternate": null }))
            .unwrap_err();

        assert_eq!(
            err,
            CompilationError::MalformedNode {
                kind: "IfStatement".to_string(),
                reason: "missing `consequent`".to_string(),
            }
        );
    }

    #[test]
    fn test_for_of_with_const_binding() {
        let node = lift(&json!({
            "type": "ForOfStatement",
            "left": {
                "type": "VariableDeclaration",
                "kind": "const",
                "declarations": [
                    { "type": "VariableDeclarator", "id": ident("edge"), "init": null }
                ]
            },
            "right": {
                "type": "CallExpression",
                "callee": ident("this_outbound_edges"),
                "arguments": []
            },
            "body": { "type": "BlockStatement", "body": [] }
        }))
        .unwrap();

        match node {
            Node::ForOf { binding, .. } => assert_eq!(binding, "edge"),
            other => panic!("Expected ForOf, got {:?}", other),
        }
    }

    #[test]
    fn test_destructuring_loop_binding_is_malformed() {
        let err = lift(&json!({
            "type": "ForInStatement",
            "left": { "type": "ArrayPattern", "elements": [] },
            "right": ident("xs"),
            "body": { "type": "BlockStatement", "body": [] }
        }))
        .unwrap_err();

        assert!(matches!(err, CompilationError::MalformedNode { .. }));
    }

    #[test]
    fn test_regex_literal_is_unsupported() {
        let err = lift(&json!({
            "type": "Literal",
            "value": {},
            "regex": { "pattern": "a+", "flags": "" }
        }))
        .unwrap_err();

        assert!(matches!(err, CompilationError::UnsupportedConstruct { .. }));
    }

    #[test]
    fn test_large_integer_literal_is_a_double() {
        let node = lift(&json!({ "type": "Literal", "value": 18446744073709551615u64 })).unwrap();
        assert_eq!(node, Node::Literal(Literal::Float(18446744073709551615u64 as f64)));
    }

    #[test]
    fn test_non_object_is_malformed() {
        assert!(matches!(
            lift(&json!(42)).unwrap_err(),
            CompilationError::MalformedNode { .. }
        ));
    }
}
