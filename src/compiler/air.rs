// src/compiler/air.rs
//! Abstract Intermediate Representation (AIR)
//!
//! AIR is the tree the vertex-program runtime evaluates. It is plain owned
//! data and serializes to JSON S-expressions:
//!
//! ```text
//! literal            1, 2.5, true, null
//! string literal     ["quote", "text"]
//! identifier         "name"
//! call               ["f", arg, ...]        or ["funcall", callee, arg, ...]
//! sequence           ["seq", stmt, ...]
//! conditional        ["if", [cond, body], ...]
//! iteration          ["for-each", [[name, domain], ...], body]
//! early return       ["return", value]
//! ```
//!
//! Deserialization goes through the S-expression front end, so anything that
//! serializes reads back as an equal tree.

use crate::ast::{Literal, SExpr};
use serde::de::{self, Deserialize, Deserializer};
use serde::ser::{self, Serialize, SerializeSeq, SerializeTuple, Serializer};
use thiserror::Error;

/// Head symbols with special meaning in the wire form
pub mod tags {
    pub const SEQ: &str = "seq";
    pub const IF: &str = "if";
    pub const FOR_EACH: &str = "for-each";
    pub const RETURN: &str = "return";
    pub const QUOTE: &str = "quote";
    pub const FUNCALL: &str = "funcall";

    pub const RESERVED: [&str; 6] = [SEQ, IF, FOR_EACH, RETURN, QUOTE, FUNCALL];

    pub fn is_reserved(name: &str) -> bool {
        RESERVED.contains(&name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Air {
    Literal(Literal),

    /// Bare name, resolved by the runtime
    Identifier(String),

    Call {
        callee: Box<Air>,
        args: Vec<Air>,
    },

    Seq(Vec<Air>),

    /// Cascading conditional; the first arm whose condition holds runs
    If(Vec<Arm>),

    ForEach {
        bindings: Vec<Binding>,
        body: Box<Air>,
    },

    /// Stop evaluating the enclosing sequence and yield the value
    Return(Box<Air>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Arm {
    pub condition: Air,
    pub body: Air,
}

impl Arm {
    pub fn new(condition: Air, body: Air) -> Self {
        Self { condition, body }
    }

    /// The `else` arm: condition fixed to literal `true`
    pub fn otherwise(body: Air) -> Self {
        Self {
            condition: Air::Literal(Literal::Bool(true)),
            body,
        }
    }

    pub fn is_else(&self) -> bool {
        self.condition == Air::Literal(Literal::Bool(true))
    }
}

/// One `name <- domain` binding of a `for-each`
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub name: String,
    pub domain: Air,
}

impl Binding {
    pub fn new(name: impl Into<String>, domain: Air) -> Self {
        Self {
            name: name.into(),
            domain,
        }
    }
}

/// Structural defects in an AIR tree
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShapeError {
    #[error("`if` without arms")]
    EmptyIf,

    #[error("`for-each` without bindings")]
    EmptyBindings,

    #[error("`for-each` binding with an empty name")]
    EmptyBindingName,

    #[error("`return` outside statement position")]
    NestedReturn,

    #[error("non-finite number {0} cannot be serialized")]
    NonFiniteLiteral(f64),
}

impl ShapeError {
    /// Tag of the construct at fault
    pub fn construct(&self) -> &'static str {
        match self {
            ShapeError::EmptyIf => tags::IF,
            ShapeError::EmptyBindings | ShapeError::EmptyBindingName => tags::FOR_EACH,
            ShapeError::NestedReturn => tags::RETURN,
            ShapeError::NonFiniteLiteral(_) => "literal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Statement,
    Expression,
}

impl Air {
    pub fn ident(name: impl Into<String>) -> Self {
        Air::Identifier(name.into())
    }

    pub fn lit(value: impl Into<Literal>) -> Self {
        Air::Literal(value.into())
    }

    /// String literal, `["quote", s]` on the wire
    pub fn string(s: impl Into<String>) -> Self {
        Air::Literal(Literal::String(s.into()))
    }

    /// Call of a named function or builtin
    pub fn call(name: impl Into<String>, args: Vec<Air>) -> Self {
        Air::Call {
            callee: Box::new(Air::Identifier(name.into())),
            args,
        }
    }

    /// Call of a computed callee
    pub fn call_with(callee: Air, args: Vec<Air>) -> Self {
        Air::Call {
            callee: Box::new(callee),
            args,
        }
    }

    pub fn seq(statements: Vec<Air>) -> Self {
        Air::Seq(statements)
    }

    pub fn cond(arms: Vec<Arm>) -> Self {
        Air::If(arms)
    }

    pub fn for_each(bindings: Vec<Binding>, body: Air) -> Self {
        Air::ForEach {
            bindings,
            body: Box::new(body),
        }
    }

    pub fn ret(value: Air) -> Self {
        Air::Return(Box::new(value))
    }

    /// Short name of the node variant, used in log fields
    pub fn tag(&self) -> &'static str {
        match self {
            Air::Literal(_) => "literal",
            Air::Identifier(_) => "identifier",
            Air::Call { .. } => "call",
            Air::Seq(_) => tags::SEQ,
            Air::If(_) => tags::IF,
            Air::ForEach { .. } => tags::FOR_EACH,
            Air::Return(_) => tags::RETURN,
        }
    }

    /// Total number of nodes in the tree
    pub fn node_count(&self) -> usize {
        1 + match self {
            Air::Literal(_) | Air::Identifier(_) => 0,
            Air::Call { callee, args } => {
                callee.node_count() + args.iter().map(Air::node_count).sum::<usize>()
            }
            Air::Seq(statements) => statements.iter().map(Air::node_count).sum(),
            Air::If(arms) => arms
                .iter()
                .map(|arm| arm.condition.node_count() + arm.body.node_count())
                .sum(),
            Air::ForEach { bindings, body } => {
                bindings.iter().map(|b| b.domain.node_count()).sum::<usize>() + body.node_count()
            }
            Air::Return(value) => value.node_count(),
        }
    }

    /// Check the invariants the runtime relies on.
    ///
    /// `return` may only appear where a statement is expected: at the root,
    /// as an element of a `seq`, or as the body of an `if` arm or `for-each`
    /// that is itself in statement position.
    pub fn check_well_formed(&self) -> Result<(), ShapeError> {
        self.check(Position::Statement)
    }

    fn check(&self, position: Position) -> Result<(), ShapeError> {
        match self {
            Air::Literal(Literal::Float(f)) if !f.is_finite() => {
                Err(ShapeError::NonFiniteLiteral(*f))
            }
            Air::Literal(_) | Air::Identifier(_) => Ok(()),
            Air::Call { callee, args } => {
                callee.check(Position::Expression)?;
                args.iter().try_for_each(|arg| arg.check(Position::Expression))
            }
            Air::Seq(statements) => statements.iter().try_for_each(|s| s.check(position)),
            Air::If(arms) => {
                if arms.is_empty() {
                    return Err(ShapeError::EmptyIf);
                }
                for arm in arms {
                    arm.condition.check(Position::Expression)?;
                    arm.body.check(position)?;
                }
                Ok(())
            }
            Air::ForEach { bindings, body } => {
                if bindings.is_empty() {
                    return Err(ShapeError::EmptyBindings);
                }
                for binding in bindings {
                    if binding.name.trim().is_empty() {
                        return Err(ShapeError::EmptyBindingName);
                    }
                    binding.domain.check(Position::Expression)?;
                }
                body.check(position)
            }
            Air::Return(value) => {
                if position == Position::Expression {
                    return Err(ShapeError::NestedReturn);
                }
                value.check(Position::Expression)
            }
        }
    }

    /// JSON wire form of the tree. Trees that fail [`Air::check_well_formed`]
    /// do not decode again and are refused.
    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        self.check_well_formed()
            .map_err(<serde_json::Error as ser::Error>::custom)?;
        serde_json::to_value(self)
    }

    /// Read a tree from its JSON wire form
    pub fn from_value(value: &serde_json::Value) -> Result<Self, serde_json::Error> {
        Air::deserialize(value)
    }
}

impl From<Literal> for Air {
    fn from(lit: Literal) -> Self {
        Air::Literal(lit)
    }
}

impl Serialize for Air {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Air::Literal(Literal::String(s)) => {
                let mut tuple = serializer.serialize_tuple(2)?;
                tuple.serialize_element(tags::QUOTE)?;
                tuple.serialize_element(s)?;
                tuple.end()
            }
            Air::Literal(lit) => lit.serialize(serializer),
            Air::Identifier(name) => serializer.serialize_str(name),
            Air::Call { callee, args } => match callee.as_ref() {
                Air::Identifier(name) if !tags::is_reserved(name) => {
                    let mut seq = serializer.serialize_seq(Some(args.len() + 1))?;
                    seq.serialize_element(name)?;
                    for arg in args {
                        seq.serialize_element(arg)?;
                    }
                    seq.end()
                }
                _ => {
                    let mut seq = serializer.serialize_seq(Some(args.len() + 2))?;
                    seq.serialize_element(tags::FUNCALL)?;
                    seq.serialize_element(callee)?;
                    for arg in args {
                        seq.serialize_element(arg)?;
                    }
                    seq.end()
                }
            },
            Air::Seq(statements) => {
                let mut seq = serializer.serialize_seq(Some(statements.len() + 1))?;
                seq.serialize_element(tags::SEQ)?;
                for statement in statements {
                    seq.serialize_element(statement)?;
                }
                seq.end()
            }
            Air::If(arms) => {
                let mut seq = serializer.serialize_seq(Some(arms.len() + 1))?;
                seq.serialize_element(tags::IF)?;
                for arm in arms {
                    seq.serialize_element(&(&arm.condition, &arm.body))?;
                }
                seq.end()
            }
            Air::ForEach { bindings, body } => {
                let bindings: Vec<(&str, &Air)> = bindings
                    .iter()
                    .map(|b| (b.name.as_str(), &b.domain))
                    .collect();
                let mut tuple = serializer.serialize_tuple(3)?;
                tuple.serialize_element(tags::FOR_EACH)?;
                tuple.serialize_element(&bindings)?;
                tuple.serialize_element(body)?;
                tuple.end()
            }
            Air::Return(value) => {
                let mut tuple = serializer.serialize_tuple(2)?;
                tuple.serialize_element(tags::RETURN)?;
                tuple.serialize_element(value)?;
                tuple.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Air {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let expr = SExpr::deserialize(deserializer)?;
        super::sexpr::compile(&expr).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_form() {
        let air = Air::cond(vec![
            Arm::new(
                Air::call("==", vec![Air::ident("a"), Air::ident("b")]),
                Air::ret(Air::lit(15)),
            ),
            Arm::otherwise(Air::ret(Air::lit(16))),
        ]);

        assert_eq!(
            air.to_value().unwrap(),
            json!(["if", [["==", "a", "b"], ["return", 15]], [true, ["return", 16]]])
        );
    }

    #[test]
    fn test_string_literal_is_quoted() {
        let air = Air::call("attrib-ref", vec![Air::ident("edge"), Air::string("_to")]);
        assert_eq!(air.to_value().unwrap(), json!(["attrib-ref", "edge", ["quote", "_to"]]));
    }

    #[test]
    fn test_computed_and_reserved_callees_use_funcall() {
        let lookup = Air::call("lookup", vec![Air::string("f")]);
        let computed = Air::call_with(lookup, vec![Air::lit(1)]);
        assert_eq!(
            computed.to_value().unwrap(),
            json!(["funcall", ["lookup", ["quote", "f"]], 1])
        );

        let reserved = Air::call("seq", vec![Air::lit(1)]);
        let value = reserved.to_value().unwrap();
        assert_eq!(value, json!(["funcall", "seq", 1]));
        assert_eq!(Air::from_value(&value).unwrap(), reserved);
    }

    #[test]
    fn test_for_each_round_trip() {
        let air = Air::for_each(
            vec![Binding::new("edge", Air::call("this-outbound-edges", vec![]))],
            Air::seq(vec![
                Air::call("send-to-accum", vec![Air::ident("edge"), Air::lit(1.5)]),
                Air::ret(Air::lit(Literal::Null)),
            ]),
        );

        let value = air.to_value().unwrap();
        assert_eq!(
            value,
            json!(["for-each", [["edge", ["this-outbound-edges"]]],
                   ["seq", ["send-to-accum", "edge", 1.5], ["return", null]]])
        );
        assert_eq!(Air::from_value(&value).unwrap(), air);
    }

    #[test]
    fn test_return_in_expression_position_is_rejected() {
        let air = Air::call("+", vec![Air::ret(Air::lit(1)), Air::lit(2)]);
        assert_eq!(air.check_well_formed(), Err(ShapeError::NestedReturn));

        let in_condition = Air::cond(vec![Arm::new(Air::ret(Air::lit(true)), Air::lit(1))]);
        assert_eq!(in_condition.check_well_formed(), Err(ShapeError::NestedReturn));
    }

    #[test]
    fn test_return_in_branch_of_expression_if_is_rejected() {
        let inner = Air::cond(vec![Arm::otherwise(Air::ret(Air::lit(1)))]);
        let air = Air::call("accum-set!", vec![Air::ident("x"), inner]);
        assert_eq!(air.check_well_formed(), Err(ShapeError::NestedReturn));
    }

    #[test]
    fn test_statement_returns_are_well_formed() {
        let air = Air::seq(vec![
            Air::cond(vec![Arm::new(Air::ident("done"), Air::ret(Air::lit(0)))]),
            Air::for_each(
                vec![Binding::new("e", Air::ident("edges"))],
                Air::ret(Air::ident("e")),
            ),
            Air::ret(Air::lit(1)),
        ]);
        assert_eq!(air.check_well_formed(), Ok(()));
    }

    #[test]
    fn test_non_finite_literals_do_not_serialize() {
        let air = Air::call("f", vec![Air::lit(f64::NAN)]);
        let err = air.to_value().unwrap_err();
        assert!(err.to_string().contains("non-finite"));

        assert!(serde_json::to_string(&Air::lit(f64::INFINITY)).is_err());
    }

    #[test]
    fn test_integers_beyond_i64_do_not_decode() {
        assert!(Air::from_value(&json!(["f", 18446744073709551615u64])).is_err());
        assert_eq!(
            Air::from_value(&json!(["f", i64::MIN])).unwrap(),
            Air::call("f", vec![Air::lit(i64::MIN)])
        );
    }

    #[test]
    fn test_nested_return_does_not_serialize() {
        let air = Air::call("+", vec![Air::ret(Air::lit(1)), Air::lit(2)]);
        let err = air.to_value().unwrap_err();
        assert!(err.to_string().contains("statement position"));
    }

    #[test]
    fn test_structural_defects() {
        assert_eq!(Air::cond(vec![]).check_well_formed(), Err(ShapeError::EmptyIf));
        assert_eq!(
            Air::for_each(vec![], Air::lit(1)).check_well_formed(),
            Err(ShapeError::EmptyBindings)
        );
        assert_eq!(
            Air::for_each(vec![Binding::new("", Air::ident("edges"))], Air::lit(1))
                .check_well_formed(),
            Err(ShapeError::EmptyBindingName)
        );
        assert_eq!(
            Air::for_each(vec![Binding::new(" ", Air::ident("edges"))], Air::lit(1))
                .check_well_formed(),
            Err(ShapeError::EmptyBindingName)
        );
        assert_eq!(
            Air::lit(f64::NAN).check_well_formed().unwrap_err().construct(),
            "literal"
        );
    }

    #[test]
    fn test_node_count() {
        let air = Air::call("+", vec![Air::ident("a"), Air::ident("b")]);
        assert_eq!(air.node_count(), 4);
    }
}
