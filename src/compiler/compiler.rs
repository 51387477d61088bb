// src/compiler/compiler.rs
//! Compiler from the typed imperative tree to AIR

use crate::ast::{Literal, Node, NodeKind};
use crate::compiler::air::{Air, Arm, Binding};
use crate::program::builders::builtins;
use crate::CompilationError;
use tracing::{debug, trace};

/// Where a node sits relative to the program root. Function declarations
/// are only accepted at the root or directly inside `Program`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Site {
    Root,
    TopLevel,
    Nested,
}

pub struct Compiler {
    nodes_visited: usize,
}

impl Compiler {
    fn new() -> Self {
        Self { nodes_visited: 0 }
    }

    /// Compile a typed tree into a well-formed AIR tree
    pub fn compile(node: &Node) -> Result<Air, CompilationError> {
        let mut compiler = Compiler::new();
        let air = compiler.compile_node(node, Site::Root)?;

        air.check_well_formed()
            .map_err(|e| CompilationError::MalformedNode {
                kind: node.kind().to_string(),
                reason: e.to_string(),
            })?;

        debug!(
            root = %node.kind(),
            visited = compiler.nodes_visited,
            emitted = air.node_count(),
            "compiled imperative program"
        );
        Ok(air)
    }

    fn compile_node(&mut self, node: &Node, site: Site) -> Result<Air, CompilationError> {
        self.nodes_visited += 1;
        trace!(kind = %node.kind(), "compiling node");

        match node {
            Node::Program { body } => {
                let statements = body
                    .iter()
                    .map(|statement| self.compile_node(statement, Site::TopLevel))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Air::Seq(statements))
            }

            Node::ExpressionStatement { expression } => match expression.kind() {
                NodeKind::CallExpression
                | NodeKind::BinaryExpression
                | NodeKind::LogicalExpression
                | NodeKind::UnaryExpression
                | NodeKind::Literal => self.compile_node(expression, Site::Nested),
                other => Err(CompilationError::UnsupportedConstruct {
                    kind: NodeKind::ExpressionStatement.to_string(),
                    dump: format!(
                        "an expression statement must be a call or a literal, found {}: {:?}",
                        other, expression
                    ),
                }),
            },

            Node::If { .. } => self.compile_if(node),

            Node::Block { body } => {
                let statements = body
                    .iter()
                    .map(|statement| self.compile_node(statement, Site::Nested))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Air::Seq(statements))
            }

            Node::FunctionDeclaration { name, params, body } => {
                let name = name.as_deref().unwrap_or("<anonymous>");

                if site == Site::Nested {
                    return Err(CompilationError::UnsupportedConstruct {
                        kind: NodeKind::FunctionDeclaration.to_string(),
                        dump: format!("nested declaration of function {}", name),
                    });
                }

                if !params.is_empty() {
                    return Err(CompilationError::UnsupportedConstruct {
                        kind: NodeKind::FunctionDeclaration.to_string(),
                        dump: format!(
                            "function {}({}) declares parameters; vertex programs take none",
                            name,
                            params.join(", ")
                        ),
                    });
                }

                // A vertex program has a single entry point: keep the body only
                self.compile_node(body, Site::Nested)
            }

            Node::Return { argument } => {
                let value = match argument {
                    Some(argument) => self.compile_node(argument, Site::Nested)?,
                    None => Air::Literal(Literal::Null),
                };
                Ok(Air::ret(value))
            }

            // for-in walks the keys of its right-hand side, for-of its values
            Node::ForIn { binding, right, body } => {
                let object = self.compile_node(right, Site::Nested)?;
                let domain = Air::call(builtins::KEYS, vec![object]);
                let body = self.compile_branch(body)?;
                Ok(Air::for_each(vec![Binding::new(binding.clone(), domain)], body))
            }

            Node::ForOf { binding, right, body } => {
                let domain = self.compile_node(right, Site::Nested)?;
                let body = self.compile_branch(body)?;
                Ok(Air::for_each(vec![Binding::new(binding.clone(), domain)], body))
            }

            Node::Binary { operator, left, right } | Node::Logical { operator, left, right } => {
                let left = self.compile_node(left, Site::Nested)?;
                let right = self.compile_node(right, Site::Nested)?;
                Ok(Air::call(operator.clone(), vec![left, right]))
            }

            Node::Unary { operator, argument } => {
                let argument = self.compile_node(argument, Site::Nested)?;
                Ok(Air::call(operator.clone(), vec![argument]))
            }

            Node::Call { callee, arguments } => {
                let callee = self.compile_node(callee, Site::Nested)?;
                let args = arguments
                    .iter()
                    .map(|argument| self.compile_node(argument, Site::Nested))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Air::call_with(callee, args))
            }

            Node::Identifier(name) => Ok(Air::Identifier(name.clone())),

            Node::Literal(lit) => Ok(Air::Literal(lit.clone())),
        }
    }

    /// Flatten an if / else-if / else chain into the arms of one `If`
    fn compile_if(&mut self, node: &Node) -> Result<Air, CompilationError> {
        let mut arms = Vec::new();
        let mut current = node;

        loop {
            match current {
                Node::If {
                    test,
                    consequent,
                    alternate,
                } => {
                    let condition = self.compile_node(test, Site::Nested)?;
                    let body = self.compile_branch(consequent)?;
                    arms.push(Arm::new(condition, body));

                    match alternate {
                        Some(next) => current = &**next,
                        None => break,
                    }
                }
                otherwise => {
                    arms.push(Arm::otherwise(self.compile_branch(otherwise)?));
                    break;
                }
            }
        }

        Ok(Air::If(arms))
    }

    /// Branch and loop bodies: a block of one statement is that statement
    fn compile_branch(&mut self, node: &Node) -> Result<Air, CompilationError> {
        match node {
            Node::Block { body } if body.len() == 1 => self.compile_node(&body[0], Site::Nested),
            _ => self.compile_node(node, Site::Nested),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::air::tags;

    fn if_else(test: Node, then: Vec<Node>, otherwise: Option<Node>) -> Node {
        Node::If {
            test: Box::new(test),
            consequent: Box::new(Node::block(then)),
            alternate: otherwise.map(Box::new),
        }
    }

    #[test]
    fn test_compile_if_else_returns() {
        let node = if_else(
            Node::binary("==", Node::ident("a"), Node::ident("b")),
            vec![Node::ret(Node::lit(15))],
            Some(Node::block(vec![Node::ret(Node::lit(16))])),
        );

        let air = Compiler::compile(&node).unwrap();

        assert_eq!(
            air,
            Air::If(vec![
                Arm::new(
                    Air::call("==", vec![Air::ident("a"), Air::ident("b")]),
                    Air::ret(Air::lit(15))
                ),
                Arm::otherwise(Air::ret(Air::lit(16))),
            ])
        );
    }

    #[test]
    fn test_else_if_chain_is_flat() {
        let node = if_else(
            Node::ident("a"),
            vec![Node::expr_stmt(Node::call(Node::ident("f"), vec![]))],
            Some(if_else(
                Node::ident("b"),
                vec![Node::expr_stmt(Node::call(Node::ident("g"), vec![]))],
                Some(Node::block(vec![Node::expr_stmt(Node::call(Node::ident("h"), vec![]))])),
            )),
        );

        match Compiler::compile(&node).unwrap() {
            Air::If(arms) => {
                assert_eq!(arms.len(), 3);
                assert_eq!(arms[1].condition, Air::ident("b"));
                assert!(arms[2].is_else());
                assert!(!arms[1].is_else());
            }
            other => panic!("Expected If, got {:?}", other),
        }
    }

    #[test]
    fn test_if_without_else_has_no_true_arm() {
        let node = if_else(Node::ident("a"), vec![Node::ret(Node::lit(1))], None);
        match Compiler::compile(&node).unwrap() {
            Air::If(arms) => {
                assert_eq!(arms.len(), 1);
                assert!(!arms[0].is_else());
            }
            other => panic!("Expected If, got {:?}", other),
        }
    }

    #[test]
    fn test_multi_statement_branch_is_seq() {
        let node = if_else(
            Node::lit(true),
            vec![
                Node::expr_stmt(Node::call(Node::ident("f"), vec![])),
                Node::ret(Node::lit(1)),
            ],
            None,
        );
        match Compiler::compile(&node).unwrap() {
            Air::If(arms) => assert!(matches!(arms[0].body, Air::Seq(ref s) if s.len() == 2)),
            other => panic!("Expected If, got {:?}", other),
        }
    }

    #[test]
    fn test_expression_statement_binary() {
        let node = Node::expr_stmt(Node::binary("+", Node::ident("a"), Node::ident("b")));
        assert_eq!(
            Compiler::compile(&node).unwrap(),
            Air::call("+", vec![Air::ident("a"), Air::ident("b")])
        );
    }

    #[test]
    fn test_bare_identifier_statement_is_rejected() {
        let node = Node::expr_stmt(Node::ident("a"));
        let err = Compiler::compile(&node).unwrap_err();
        assert!(matches!(
            err,
            CompilationError::UnsupportedConstruct { ref kind, .. } if kind == "ExpressionStatement"
        ));
    }

    #[test]
    fn test_block_preserves_order() {
        let calls: Vec<Node> = ["a", "b", "c"]
            .iter()
            .map(|name| Node::expr_stmt(Node::call(Node::ident(*name), vec![])))
            .collect();
        let air = Compiler::compile(&Node::block(calls)).unwrap();
        assert_eq!(
            air,
            Air::seq(vec![
                Air::call("a", vec![]),
                Air::call("b", vec![]),
                Air::call("c", vec![]),
            ])
        );
    }

    #[test]
    fn test_function_declaration_keeps_body() {
        let program = Node::Program {
            body: vec![Node::FunctionDeclaration {
                name: Some("init".to_string()),
                params: vec![],
                body: Box::new(Node::block(vec![Node::ret(Node::lit(1))])),
            }],
        };
        assert_eq!(
            Compiler::compile(&program).unwrap(),
            Air::seq(vec![Air::seq(vec![Air::ret(Air::lit(1))])])
        );
    }

    #[test]
    fn test_parameterized_function_is_rejected() {
        let node = Node::FunctionDeclaration {
            name: Some("update".to_string()),
            params: vec!["vertex".to_string()],
            body: Box::new(Node::block(vec![])),
        };
        let err = Compiler::compile(&node).unwrap_err();
        match err {
            CompilationError::UnsupportedConstruct { kind, dump } => {
                assert_eq!(kind, "FunctionDeclaration");
                assert!(dump.contains("update(vertex)"));
            }
            other => panic!("Expected UnsupportedConstruct, got {:?}", other),
        }
    }

    #[test]
    fn test_nested_function_is_rejected() {
        let node = Node::block(vec![Node::FunctionDeclaration {
            name: None,
            params: vec![],
            body: Box::new(Node::block(vec![])),
        }]);
        assert!(matches!(
            Compiler::compile(&node),
            Err(CompilationError::UnsupportedConstruct { .. })
        ));
    }

    #[test]
    fn test_for_of_binds_explicit_domain() {
        let node = Node::ForOf {
            binding: "edge".to_string(),
            right: Box::new(Node::call(Node::ident("this-outbound-edges"), vec![])),
            body: Box::new(Node::block(vec![Node::expr_stmt(Node::call(
                Node::ident("send-to-accum"),
                vec![Node::ident("edge"), Node::lit(1)],
            ))])),
        };

        let air = Compiler::compile(&node).unwrap();
        assert_eq!(
            air,
            Air::for_each(
                vec![Binding::new("edge", Air::call("this-outbound-edges", vec![]))],
                Air::call("send-to-accum", vec![Air::ident("edge"), Air::lit(1)])
            )
        );
        assert_eq!(air.tag(), tags::FOR_EACH);
    }

    #[test]
    fn test_for_in_enumerates_keys() {
        let body = Node::expr_stmt(Node::call(Node::ident("f"), vec![Node::ident("k")]));
        let for_in = Node::ForIn {
            binding: "k".to_string(),
            right: Box::new(Node::ident("obj")),
            body: Box::new(body.clone()),
        };
        let for_of = Node::ForOf {
            binding: "k".to_string(),
            right: Box::new(Node::ident("obj")),
            body: Box::new(body),
        };

        let keys = Compiler::compile(&for_in).unwrap();
        let values = Compiler::compile(&for_of).unwrap();

        assert_eq!(
            keys,
            Air::for_each(
                vec![Binding::new("k", Air::call("keys", vec![Air::ident("obj")]))],
                Air::call("f", vec![Air::ident("k")])
            )
        );
        assert_eq!(
            values,
            Air::for_each(
                vec![Binding::new("k", Air::ident("obj"))],
                Air::call("f", vec![Air::ident("k")])
            )
        );
        assert_ne!(keys, values);
    }

    #[test]
    fn test_bare_return_yields_null() {
        let air = Compiler::compile(&Node::Return { argument: None }).unwrap();
        assert_eq!(air, Air::ret(Air::Literal(Literal::Null)));
    }

    #[test]
    fn test_unary_and_logical() {
        let node = Node::Logical {
            operator: "&&".to_string(),
            left: Box::new(Node::Unary {
                operator: "!".to_string(),
                argument: Box::new(Node::ident("a")),
            }),
            right: Box::new(Node::ident("b")),
        };
        assert_eq!(
            Compiler::compile(&node).unwrap(),
            Air::call("&&", vec![Air::call("!", vec![Air::ident("a")]), Air::ident("b")])
        );
    }

    #[test]
    fn test_hand_built_nested_return_is_malformed() {
        let node = Node::binary("+", Node::ret(Node::lit(1)), Node::lit(2));
        assert!(matches!(
            Compiler::compile(&node),
            Err(CompilationError::MalformedNode { .. })
        ));
    }
}
