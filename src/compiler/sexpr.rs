// src/compiler/sexpr.rs
//! S-expression front end
//!
//! AIR is itself an S-expression language, so this front end mostly checks
//! the shape of the special forms and builds the typed tree. Lists headed by
//! any other symbol are calls.

use super::air::{tags, Air, Arm, Binding};
use crate::ast::{Literal, SExpr};
use crate::CompilationError;
use tracing::debug;

/// Compile an S-expression into a well-formed AIR tree
pub fn compile(expr: &SExpr) -> Result<Air, CompilationError> {
    let air = compile_expr(expr)?;

    air.check_well_formed()
        .map_err(|e| CompilationError::MalformedNode {
            kind: e.construct().to_string(),
            reason: e.to_string(),
        })?;

    debug!(root = air.tag(), nodes = air.node_count(), "compiled S-expression");
    Ok(air)
}

fn compile_expr(expr: &SExpr) -> Result<Air, CompilationError> {
    match expr {
        SExpr::Nil => Ok(Air::Literal(Literal::Null)),
        SExpr::Bool(b) => Ok(Air::Literal(Literal::Bool(*b))),
        SExpr::Int(n) => Ok(Air::Literal(Literal::Int(*n))),
        SExpr::Float(f) => Ok(Air::Literal(Literal::Float(*f))),
        SExpr::Symbol(name) => Ok(Air::Identifier(name.clone())),
        SExpr::List(items) => compile_list(expr, items),
    }
}

fn malformed(kind: &str, reason: impl Into<String>) -> CompilationError {
    CompilationError::MalformedNode {
        kind: kind.to_string(),
        reason: reason.into(),
    }
}

fn compile_all(items: &[SExpr]) -> Result<Vec<Air>, CompilationError> {
    items.iter().map(compile_expr).collect()
}

fn compile_list(expr: &SExpr, items: &[SExpr]) -> Result<Air, CompilationError> {
    let (head, rest) = items
        .split_first()
        .ok_or_else(|| malformed("list", "empty list has no operator"))?;

    let tag = match head {
        SExpr::Symbol(tag) => tag.as_str(),
        // ((f ...) args...) calls the value of the head expression
        SExpr::List(_) => return Ok(Air::call_with(compile_expr(head)?, compile_all(rest)?)),
        other => {
            return Err(malformed(
                "list",
                format!("operator position holds the literal {} in {}", other, expr),
            ))
        }
    };

    match tag {
        tags::SEQ => Ok(Air::Seq(compile_all(rest)?)),

        tags::IF => {
            let arms = rest
                .iter()
                .map(|arm| match arm {
                    SExpr::List(pair) if pair.len() == 2 => {
                        Ok(Arm::new(compile_expr(&pair[0])?, compile_expr(&pair[1])?))
                    }
                    other => Err(malformed(
                        tags::IF,
                        format!("arm must be a [condition, body] pair, got {}", other),
                    )),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Air::If(arms))
        }

        tags::FOR_EACH => {
            let [bindings, body] = rest else {
                return Err(malformed(
                    tags::FOR_EACH,
                    format!("expected bindings and a body, got {} operands", rest.len()),
                ));
            };
            let SExpr::List(bindings) = bindings else {
                return Err(malformed(
                    tags::FOR_EACH,
                    format!("bindings must be a list, got {}", bindings),
                ));
            };
            let bindings = bindings
                .iter()
                .map(|binding| match binding {
                    SExpr::List(pair) => match pair.as_slice() {
                        [SExpr::Symbol(name), domain] => {
                            Ok(Binding::new(name.clone(), compile_expr(domain)?))
                        }
                        _ => Err(malformed(
                            tags::FOR_EACH,
                            format!("binding must be [name, domain], got {}", binding),
                        )),
                    },
                    other => Err(malformed(
                        tags::FOR_EACH,
                        format!("binding must be [name, domain], got {}", other),
                    )),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Air::for_each(bindings, compile_expr(body)?))
        }

        tags::RETURN => match rest {
            [value] => Ok(Air::ret(compile_expr(value)?)),
            _ => Err(malformed(
                tags::RETURN,
                format!("expected exactly one value, got {}", rest.len()),
            )),
        },

        tags::QUOTE => match rest {
            [SExpr::Symbol(text)] => Ok(Air::string(text.clone())),
            [SExpr::List(_)] => Err(CompilationError::UnsupportedConstruct {
                kind: tags::QUOTE.to_string(),
                dump: expr.to_string(),
            }),
            [atom] => compile_expr(atom),
            _ => Err(malformed(
                tags::QUOTE,
                format!("expected exactly one operand, got {}", rest.len()),
            )),
        },

        tags::FUNCALL => match rest.split_first() {
            Some((callee, args)) => Ok(Air::call_with(compile_expr(callee)?, compile_all(args)?)),
            None => Err(malformed(tags::FUNCALL, "missing callee")),
        },

        name => Ok(Air::call(name, compile_all(rest)?)),
    }
}
