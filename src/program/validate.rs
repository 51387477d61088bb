// src/program/validate.rs
//! Validation of program specs against the data-model invariants

use super::registry::AccumulatorRegistry;
use super::spec::{PhaseProgram, ProgramSpec};
use crate::ast::Literal;
use crate::compiler::Air;
use crate::ValidationError;
use ahash::HashSet;
use tracing::debug;

/// Check a spec before it is handed to the runtime.
///
/// Pure: the first violated rule is reported and the spec is left untouched.
pub fn validate(
    spec: &ProgramSpec,
    registry: &AccumulatorRegistry,
) -> Result<(), ValidationError> {
    let result = check(spec, registry);

    match &result {
        Ok(()) => debug!(
            result_field = %spec.result_field,
            accumulators = spec.vertex_accumulators.len(),
            phases = spec.phases.len(),
            "program spec validated"
        ),
        Err(e) => debug!(error = %e, kind = ?e.kind(), "program spec rejected"),
    }

    result
}

/// Names and type tags made only of whitespace count as empty
fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

fn check(spec: &ProgramSpec, registry: &AccumulatorRegistry) -> Result<(), ValidationError> {
    if is_blank(&spec.result_field) {
        return Err(ValidationError::EmptyResultField);
    }

    if spec.max_gss == 0 {
        return Err(ValidationError::InvalidMaxGss);
    }

    let mut accumulator_names = HashSet::default();
    for accumulator in &spec.vertex_accumulators {
        if is_blank(&accumulator.name) {
            return Err(ValidationError::EmptyAccumulatorName);
        }
        if !accumulator_names.insert(accumulator.name.as_str()) {
            return Err(ValidationError::DuplicateAccumulatorName(accumulator.name.clone()));
        }
        if !registry.contains(&accumulator.accumulator_type) {
            return Err(ValidationError::UnknownAccumulatorType {
                accumulator: accumulator.name.clone(),
                accumulator_type: accumulator.accumulator_type.clone(),
            });
        }
        if is_blank(&accumulator.value_type) {
            return Err(ValidationError::EmptyValueType(accumulator.name.clone()));
        }
    }

    if spec.phases.is_empty() {
        return Err(ValidationError::NoPhases);
    }

    let mut phase_names = HashSet::default();
    for phase in &spec.phases {
        if is_blank(&phase.name) {
            return Err(ValidationError::EmptyPhaseName);
        }
        if !phase_names.insert(phase.name.as_str()) {
            return Err(ValidationError::DuplicatePhaseName(phase.name.clone()));
        }
        check_program(&phase.name, "initProgram", &phase.init_program)?;
        check_program(&phase.name, "updateProgram", &phase.update_program)?;
    }

    Ok(())
}

fn check_program(phase: &str, slot: &str, program: &PhaseProgram) -> Result<(), ValidationError> {
    let malformed = |reason: String| ValidationError::MalformedProgram {
        phase: phase.to_string(),
        slot: slot.to_string(),
        reason,
    };

    match program {
        PhaseProgram::Disabled => Ok(()),
        PhaseProgram::Run(Air::Literal(Literal::Bool(false))) => Err(malformed(
            "literal `false` is reserved for a disabled slot".to_string(),
        )),
        PhaseProgram::Run(air) => air.check_well_formed().map_err(|e| malformed(e.to_string())),
    }
}
