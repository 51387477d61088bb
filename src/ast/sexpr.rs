// src/ast/sexpr.rs
//! S-expression trees
//!
//! S-expressions arrive as JSON: arrays are lists, strings are symbols and
//! other scalars are atoms. String data is written `["quote", "text"]`.

use serde::de::{self, Deserialize, Deserializer, SeqAccess, Visitor};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum SExpr {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Symbol(String),
    List(Vec<SExpr>),
}

impl SExpr {
    pub fn symbol(name: impl Into<String>) -> Self {
        SExpr::Symbol(name.into())
    }

    pub fn list(items: Vec<SExpr>) -> Self {
        SExpr::List(items)
    }

    /// Read an S-expression from an already-parsed JSON value
    pub fn from_value(value: &serde_json::Value) -> Result<Self, serde_json::Error> {
        SExpr::deserialize(value)
    }

    /// Operator symbol of a non-empty list whose head is a symbol
    pub fn head_symbol(&self) -> Option<&str> {
        match self {
            SExpr::List(items) => match items.first() {
                Some(SExpr::Symbol(s)) => Some(s),
                _ => None,
            },
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for SExpr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(SExprVisitor)
    }
}

struct SExprVisitor;

impl<'de> Visitor<'de> for SExprVisitor {
    type Value = SExpr;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an S-expression (array, string, number, boolean or null)")
    }

    fn visit_unit<E: de::Error>(self) -> Result<SExpr, E> {
        Ok(SExpr::Nil)
    }

    fn visit_none<E: de::Error>(self) -> Result<SExpr, E> {
        Ok(SExpr::Nil)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<SExpr, E> {
        Ok(SExpr::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<SExpr, E> {
        Ok(SExpr::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<SExpr, E> {
        i64::try_from(v)
            .map(SExpr::Int)
            .map_err(|_| E::custom(format!("integer {} does not fit in 64 signed bits", v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<SExpr, E> {
        Ok(SExpr::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<SExpr, E> {
        Ok(SExpr::Symbol(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<SExpr, E> {
        Ok(SExpr::Symbol(v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<SExpr, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(SExpr::List(items))
    }
}

impl fmt::Display for SExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SExpr::Nil => write!(f, "nil"),
            SExpr::Bool(b) => write!(f, "{}", b),
            SExpr::Int(n) => write!(f, "{}", n),
            SExpr::Float(x) => write!(f, "{:?}", x),
            SExpr::Symbol(s) => write!(f, "{}", s),
            SExpr::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
        }
    }
}
