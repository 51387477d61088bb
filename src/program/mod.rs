// src/program/mod.rs
//! Vertex program specs: data model, validation and stock programs

pub mod builders;
pub mod registry;
pub mod spec;
pub mod validate;

pub use builders::{single_source_shortest_path, vertex_degrees, ProgramSpecBuilder};
pub use registry::AccumulatorRegistry;
pub use spec::{AccumulatorSpec, Phase, PhaseProgram, ProgramSpec};
pub use validate::validate;
