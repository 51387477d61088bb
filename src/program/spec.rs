// src/program/spec.rs
//! Vertex program data model
//!
//! A [`ProgramSpec`] is the payload handed to the runtime's install call:
//!
//! ```text
//! {
//!   "resultField": "degree",
//!   "maxGSS": 2,
//!   "vertexAccumulators": {
//!     "outDegree": { "accumulatorType": "sum", "valueType": "ints", "storeSender": false }
//!   },
//!   "phases": [ { "name": "main", "initProgram": [...], "updateProgram": false } ]
//! }
//! ```

use crate::ast::SExpr;
use crate::compiler::{sexpr, Air};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

/// A named per-vertex aggregation cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccumulatorSpec {
    /// Key in `vertexAccumulators`, not repeated inside the entry
    #[serde(skip)]
    pub name: String,

    pub accumulator_type: String,

    pub value_type: String,

    /// Also record which neighbour contributed last
    #[serde(default)]
    pub store_sender: bool,
}

impl AccumulatorSpec {
    pub fn new(
        name: impl Into<String>,
        accumulator_type: impl Into<String>,
        value_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            accumulator_type: accumulator_type.into(),
            value_type: value_type.into(),
            store_sender: false,
        }
    }

    pub fn with_store_sender(mut self, store_sender: bool) -> Self {
        self.store_sender = store_sender;
        self
    }
}

/// Program slot of a phase: an AIR tree, or `false` for "never run"
#[derive(Debug, Clone, PartialEq)]
pub enum PhaseProgram {
    Disabled,
    Run(Air),
}

impl PhaseProgram {
    pub fn is_disabled(&self) -> bool {
        matches!(self, PhaseProgram::Disabled)
    }

    pub fn program(&self) -> Option<&Air> {
        match self {
            PhaseProgram::Disabled => None,
            PhaseProgram::Run(air) => Some(air),
        }
    }
}

impl From<Air> for PhaseProgram {
    fn from(air: Air) -> Self {
        PhaseProgram::Run(air)
    }
}

impl From<Option<Air>> for PhaseProgram {
    fn from(air: Option<Air>) -> Self {
        air.map_or(PhaseProgram::Disabled, PhaseProgram::Run)
    }
}

impl Serialize for PhaseProgram {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PhaseProgram::Disabled => serializer.serialize_bool(false),
            PhaseProgram::Run(air) => air.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for PhaseProgram {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match SExpr::deserialize(deserializer)? {
            SExpr::Bool(false) => Ok(PhaseProgram::Disabled),
            expr => sexpr::compile(&expr)
                .map(PhaseProgram::Run)
                .map_err(de::Error::custom),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
    pub name: String,
    pub init_program: PhaseProgram,
    pub update_program: PhaseProgram,
}

impl Phase {
    pub fn new(
        name: impl Into<String>,
        init_program: impl Into<PhaseProgram>,
        update_program: impl Into<PhaseProgram>,
    ) -> Self {
        Self {
            name: name.into(),
            init_program: init_program.into(),
            update_program: update_program.into(),
        }
    }
}

/// A compiled vertex program, ready for validation and installation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramSpec {
    /// Vertex attribute receiving the final value
    #[serde(rename = "resultField")]
    pub result_field: String,

    /// Hard bound on the number of supersteps
    #[serde(rename = "maxGSS")]
    pub max_gss: u64,

    /// Kept as a list so that duplicate names survive until validation
    #[serde(rename = "vertexAccumulators", with = "accumulator_map")]
    pub vertex_accumulators: Vec<AccumulatorSpec>,

    pub phases: Vec<Phase>,
}

impl ProgramSpec {
    pub fn accumulator(&self, name: &str) -> Option<&AccumulatorSpec> {
        self.vertex_accumulators.iter().find(|acc| acc.name == name)
    }

    pub fn phase(&self, name: &str) -> Option<&Phase> {
        self.phases.iter().find(|phase| phase.name == name)
    }

    /// JSON payload for the runtime's install call. Non-finite numbers are
    /// refused; the other structural rules are checked by `validate`.
    pub fn to_payload(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Read a payload from JSON text. Duplicate accumulator keys are kept,
    /// so validation can report them.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// `vertexAccumulators` as a JSON object keyed by accumulator name
mod accumulator_map {
    use super::AccumulatorSpec;
    use serde::de::{Deserializer, MapAccess, Visitor};
    use serde::ser::{SerializeMap, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(
        accumulators: &[AccumulatorSpec],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(accumulators.len()))?;
        for accumulator in accumulators {
            map.serialize_entry(&accumulator.name, accumulator)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<AccumulatorSpec>, D::Error> {
        deserializer.deserialize_map(AccumulatorMapVisitor)
    }

    struct AccumulatorMapVisitor;

    impl<'de> Visitor<'de> for AccumulatorMapVisitor {
        type Value = Vec<AccumulatorSpec>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map from accumulator names to accumulator specs")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
            let mut accumulators = Vec::with_capacity(access.size_hint().unwrap_or(0));
            while let Some((name, mut spec)) = access.next_entry::<String, AccumulatorSpec>()? {
                spec.name = name;
                accumulators.push(spec);
            }
            Ok(accumulators)
        }
    }
}
