// src/program/builders.rs
//! Hand-assembled vertex programs and the builder they are made with

use super::registry::AccumulatorRegistry;
use super::spec::{AccumulatorSpec, Phase, PhaseProgram, ProgramSpec};
use super::validate::validate;
use crate::compiler::{Air, Arm, Binding};
use crate::ValidationError;

/// Superstep bound used when a program does not set one
pub const DEFAULT_MAX_GSS: u64 = 500;

/// Names of runtime builtins used by the stock programs
pub mod builtins {
    pub const ACCUM_SET: &str = "accum-set!";
    pub const ACCUM_CLEAR: &str = "accum-clear!";
    pub const ACCUM_REF: &str = "accum-ref";
    pub const SEND_TO_ACCUM: &str = "send-to-accum";
    pub const SEND_TO_ALL_NEIGHBOURS: &str = "send-to-all-neighbours";
    pub const THIS_OUTBOUND_EDGES: &str = "this-outbound-edges";
    pub const THIS_OUTBOUND_EDGES_COUNT: &str = "this-outbound-edges-count";
    pub const THIS_VERTEX_ID: &str = "this-vertex-id";
    pub const ATTRIB_REF: &str = "attrib-ref";
    pub const VOTE_HALT: &str = "vote-halt";
    pub const VOTE_ACTIVE: &str = "vote-active";
    /// Key enumeration of an object, the domain of a `for…in` loop
    pub const KEYS: &str = "keys";
}

/// Fluent construction of a [`ProgramSpec`]
///
/// ```rust
/// use pregel_air::program::{AccumulatorRegistry, PhaseProgram, ProgramSpecBuilder};
/// use pregel_air::Air;
///
/// let spec = ProgramSpecBuilder::new("visited")
///     .max_gss(10)
///     .accumulator("seen", "or", "bool")
///     .phase(
///         "main",
///         Air::call("accum-set!", vec![Air::ident("seen"), Air::lit(true)]),
///         PhaseProgram::Disabled,
///     )
///     .build(&AccumulatorRegistry::default())
///     .unwrap();
///
/// assert_eq!(spec.max_gss, 10);
/// ```
#[derive(Debug, Clone)]
pub struct ProgramSpecBuilder {
    result_field: String,
    max_gss: u64,
    accumulators: Vec<AccumulatorSpec>,
    phases: Vec<Phase>,
}

impl ProgramSpecBuilder {
    pub fn new(result_field: impl Into<String>) -> Self {
        Self {
            result_field: result_field.into(),
            max_gss: DEFAULT_MAX_GSS,
            accumulators: Vec::new(),
            phases: Vec::new(),
        }
    }

    pub fn max_gss(mut self, max_gss: u64) -> Self {
        self.max_gss = max_gss;
        self
    }

    pub fn accumulator(
        self,
        name: impl Into<String>,
        accumulator_type: impl Into<String>,
        value_type: impl Into<String>,
    ) -> Self {
        self.accumulator_spec(AccumulatorSpec::new(name, accumulator_type, value_type))
    }

    pub fn accumulator_spec(mut self, accumulator: AccumulatorSpec) -> Self {
        self.accumulators.push(accumulator);
        self
    }

    pub fn phase(
        mut self,
        name: impl Into<String>,
        init_program: impl Into<PhaseProgram>,
        update_program: impl Into<PhaseProgram>,
    ) -> Self {
        self.phases.push(Phase::new(name, init_program, update_program));
        self
    }

    /// Assemble the spec without validating it
    pub fn finish(self) -> ProgramSpec {
        ProgramSpec {
            result_field: self.result_field,
            max_gss: self.max_gss,
            vertex_accumulators: self.accumulators,
            phases: self.phases,
        }
    }

    /// Assemble and validate the spec
    pub fn build(self, registry: &AccumulatorRegistry) -> Result<ProgramSpec, ValidationError> {
        let spec = self.finish();
        validate(&spec, registry)?;
        Ok(spec)
    }
}

/// In- and out-degree of every vertex.
///
/// The init program records the out-degree and sends `1` to the `inDegree`
/// accumulator of every neighbour. The accumulators' merge does the rest,
/// so the phase never needs an update program.
pub fn vertex_degrees(result_field: &str) -> Result<ProgramSpec, ValidationError> {
    use builtins::*;

    let init = Air::seq(vec![
        Air::call(
            ACCUM_SET,
            vec![Air::ident("outDegree"), Air::call(THIS_OUTBOUND_EDGES_COUNT, vec![])],
        ),
        Air::call(ACCUM_SET, vec![Air::ident("inDegree"), Air::lit(0)]),
        Air::call(SEND_TO_ALL_NEIGHBOURS, vec![Air::ident("inDegree"), Air::lit(1)]),
    ]);

    ProgramSpecBuilder::new(result_field)
        .max_gss(2)
        .accumulator("outDegree", "sum", "ints")
        .accumulator("inDegree", "sum", "ints")
        .phase("main", init, PhaseProgram::Disabled)
        .build(&AccumulatorRegistry::default())
}

/// Hop distance from `start_vertex` to every reachable vertex.
///
/// `distance` is a `min` accumulator that remembers its sender, so the
/// runtime can also report the predecessor on a shortest path.
pub fn single_source_shortest_path(
    result_field: &str,
    start_vertex: &str,
) -> Result<ProgramSpec, ValidationError> {
    use builtins::*;

    let init = Air::cond(vec![
        Arm::new(
            Air::call("==", vec![Air::call(THIS_VERTEX_ID, vec![]), Air::string(start_vertex)]),
            Air::seq(vec![
                Air::call(ACCUM_SET, vec![Air::ident("distance"), Air::lit(0)]),
                Air::ret(Air::string(VOTE_ACTIVE)),
            ]),
        ),
        Arm::otherwise(Air::seq(vec![
            Air::call(ACCUM_CLEAR, vec![Air::ident("distance")]),
            Air::ret(Air::string(VOTE_HALT)),
        ])),
    ]);

    let update = Air::seq(vec![
        Air::for_each(
            vec![Binding::new("edge", Air::call(THIS_OUTBOUND_EDGES, vec![]))],
            Air::call(
                SEND_TO_ACCUM,
                vec![
                    Air::call(ATTRIB_REF, vec![Air::ident("edge"), Air::string("_to")]),
                    Air::ident("distance"),
                    Air::call(
                        "+",
                        vec![Air::call(ACCUM_REF, vec![Air::ident("distance")]), Air::lit(1)],
                    ),
                ],
            ),
        ),
        Air::ret(Air::string(VOTE_HALT)),
    ]);

    ProgramSpecBuilder::new(result_field)
        .accumulator_spec(
            AccumulatorSpec::new("distance", "min", "doubles").with_store_sender(true),
        )
        .phase("main", init, update)
        .build(&AccumulatorRegistry::default())
}
