// src/lib.rs
//! # Pregel AIR
//!
//! Compiler front end for vertex programs run by a Pregel-style graph
//! engine. Parsed imperative code (ESTree JSON) or S-expressions are
//! compiled into AIR, the tree-shaped intermediate representation the
//! runtime evaluates, and assembled into a validated [`ProgramSpec`].
//!
//! ## Example
//!
//! ```rust
//! use pregel_air::{Source, Toolchain};
//! use serde_json::json;
//!
//! let toolchain = Toolchain::new();
//!
//! // `a + b;` as produced by an ESTree parser
//! let source = Source::Estree(json!({
//!     "type": "ExpressionStatement",
//!     "expression": {
//!         "type": "BinaryExpression",
//!         "operator": "+",
//!         "left": { "type": "Identifier", "name": "a" },
//!         "right": { "type": "Identifier", "name": "b" }
//!     }
//! }));
//!
//! let air = toolchain.compile(&source).unwrap();
//! assert_eq!(air.to_value().unwrap(), json!(["+", "a", "b"]));
//! ```

pub mod ast;
pub mod compiler;
pub mod program;
pub mod runtime;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

pub use compiler::{Air, Arm, Binding, Source};
pub use program::{AccumulatorRegistry, ProgramSpec, ProgramSpecBuilder};
pub use runtime::{JobHandle, Runtime, SubmitError};

/// Errors that can occur during compilation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompilationError {
    /// A node kind outside the supported grammar
    #[error("Unsupported construct {kind}: {dump}")]
    UnsupportedConstruct { kind: String, dump: String },

    /// A supported node kind missing a required part
    #[error("Malformed {kind} node: {reason}")]
    MalformedNode { kind: String, reason: String },
}

impl CompilationError {
    pub fn kind_name(&self) -> &'static str {
        match self {
            CompilationError::UnsupportedConstruct { .. } => "UnsupportedConstruct",
            CompilationError::MalformedNode { .. } => "MalformedNode",
        }
    }
}

/// Data-model violations found by [`program::validate`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Duplicate accumulator name: {0}")]
    DuplicateAccumulatorName(String),

    #[error("Accumulator with an empty name")]
    EmptyAccumulatorName,

    #[error("Unknown accumulator type {accumulator_type} for accumulator {accumulator}")]
    UnknownAccumulatorType {
        accumulator: String,
        accumulator_type: String,
    },

    #[error("Accumulator {0} has an empty value type")]
    EmptyValueType(String),

    #[error("Duplicate phase name: {0}")]
    DuplicatePhaseName(String),

    #[error("Phase with an empty name")]
    EmptyPhaseName,

    #[error("Program has no phases")]
    NoPhases,

    #[error("Result field is empty")]
    EmptyResultField,

    #[error("maxGSS must be at least 1")]
    InvalidMaxGss,

    #[error("Malformed {slot} in phase {phase}: {reason}")]
    MalformedProgram {
        phase: String,
        slot: String,
        reason: String,
    },
}

/// Discriminant of a [`ValidationError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValidationErrorKind {
    DuplicateAccumulatorName,
    EmptyAccumulatorName,
    UnknownAccumulatorType,
    EmptyValueType,
    DuplicatePhaseName,
    EmptyPhaseName,
    NoPhases,
    EmptyResultField,
    InvalidMaxGss,
    MalformedProgram,
}

impl ValidationError {
    pub fn kind(&self) -> ValidationErrorKind {
        match self {
            ValidationError::DuplicateAccumulatorName(_) => {
                ValidationErrorKind::DuplicateAccumulatorName
            }
            ValidationError::EmptyAccumulatorName => ValidationErrorKind::EmptyAccumulatorName,
            ValidationError::UnknownAccumulatorType { .. } => {
                ValidationErrorKind::UnknownAccumulatorType
            }
            ValidationError::EmptyValueType(_) => ValidationErrorKind::EmptyValueType,
            ValidationError::DuplicatePhaseName(_) => ValidationErrorKind::DuplicatePhaseName,
            ValidationError::EmptyPhaseName => ValidationErrorKind::EmptyPhaseName,
            ValidationError::NoPhases => ValidationErrorKind::NoPhases,
            ValidationError::EmptyResultField => ValidationErrorKind::EmptyResultField,
            ValidationError::InvalidMaxGss => ValidationErrorKind::InvalidMaxGss,
            ValidationError::MalformedProgram { .. } => ValidationErrorKind::MalformedProgram,
        }
    }
}

/// Any error raised while turning source into an installable program
#[derive(Error, Debug)]
pub enum ProgramError {
    #[error(transparent)]
    Compilation(#[from] CompilationError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Structured `{ kind, detail }` form of an error, for callers that report
/// errors over the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub kind: String,
    pub detail: String,
}

impl From<&CompilationError> for ErrorReport {
    fn from(err: &CompilationError) -> Self {
        let detail = match err {
            CompilationError::UnsupportedConstruct { kind, dump } => format!("{}: {}", kind, dump),
            CompilationError::MalformedNode { kind, reason } => format!("{}: {}", kind, reason),
        };
        Self {
            kind: err.kind_name().to_string(),
            detail,
        }
    }
}

impl From<&ValidationError> for ErrorReport {
    fn from(err: &ValidationError) -> Self {
        Self {
            kind: format!("{:?}", err.kind()),
            detail: err.to_string(),
        }
    }
}

impl From<&ProgramError> for ErrorReport {
    fn from(err: &ProgramError) -> Self {
        match err {
            ProgramError::Compilation(e) => e.into(),
            ProgramError::Validation(e) => e.into(),
            ProgramError::Serialization(e) => Self {
                kind: "Serialization".to_string(),
                detail: e.to_string(),
            },
        }
    }
}

/// Compiler and validator sharing one accumulator registry
#[derive(Debug, Clone)]
pub struct Toolchain {
    registry: Arc<AccumulatorRegistry>,
}

impl Toolchain {
    /// Toolchain accepting the builtin accumulator types
    pub fn new() -> Self {
        Self::with_registry(AccumulatorRegistry::default())
    }

    pub fn with_registry(registry: AccumulatorRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub fn registry(&self) -> &AccumulatorRegistry {
        &self.registry
    }

    /// Compile a parsed program into AIR
    pub fn compile(&self, source: &Source) -> Result<Air, CompilationError> {
        debug!(syntax = source.syntax(), "compiling vertex program");
        compiler::compile(source)
    }

    pub fn validate(&self, spec: &ProgramSpec) -> Result<(), ValidationError> {
        program::validate(spec, &self.registry)
    }

    /// Validate a builder's spec against this toolchain's registry
    pub fn build(&self, builder: ProgramSpecBuilder) -> Result<ProgramSpec, ValidationError> {
        builder.build(&self.registry)
    }

    /// Compile an init and an optional update program into a single-phase spec
    pub fn single_phase(
        &self,
        builder: ProgramSpecBuilder,
        phase: &str,
        init: &Source,
        update: Option<&Source>,
    ) -> Result<ProgramSpec, ProgramError> {
        let init = self.compile(init)?;
        let update = update.map(|source| self.compile(source)).transpose()?;
        Ok(self.build(builder.phase(phase, init, update))?)
    }

    /// Read and validate a payload received as JSON text
    pub fn load(&self, json: &str) -> Result<ProgramSpec, ProgramError> {
        let spec = ProgramSpec::from_json(json)?;
        self.validate(&spec)?;
        Ok(spec)
    }

    /// Validate a spec and start it on the runtime
    pub fn submit<R: Runtime>(
        &self,
        runtime: &R,
        graph_name: &str,
        spec: &ProgramSpec,
    ) -> Result<JobHandle, SubmitError<R::Error>> {
        runtime::submit(runtime, graph_name, spec, &self.registry)
    }
}

impl Default for Toolchain {
    fn default() -> Self {
        Self::new()
    }
}
