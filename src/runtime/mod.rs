// src/runtime/mod.rs
//! Boundary to the distributed superstep runtime
//!
//! The runtime itself lives elsewhere. This module fixes the contract a
//! runtime client implements and the one rule this crate enforces on its
//! behalf: nothing reaches `start` without passing validation.

use crate::program::{validate, AccumulatorRegistry, ProgramSpec};
use crate::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Client for a runtime able to install and run vertex programs
pub trait Runtime {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Install `spec` on `graph_name` and start the superstep loop
    fn start(&self, graph_name: &str, spec: &ProgramSpec) -> Result<JobHandle, Self::Error>;

    fn status(&self, job: &JobHandle) -> Result<JobStatus, Self::Error>;
}

/// Identifier the runtime hands out for a started program
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobHandle(pub String);

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Loading,
    Running,
    Storing,
    Done,
    Canceled,
    Fatal,
}

impl JobState {
    pub fn is_finished(&self) -> bool {
        matches!(self, JobState::Done | JobState::Canceled | JobState::Fatal)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    pub state: JobState,

    /// Global superstep reached so far
    #[serde(default)]
    pub gss: u64,
}

#[derive(Error, Debug)]
pub enum SubmitError<E: std::error::Error + 'static> {
    #[error("Program rejected: {0}")]
    Invalid(#[from] ValidationError),

    #[error("Runtime error: {0}")]
    Runtime(#[source] E),
}

/// Validate `spec` and start it on `runtime`
pub fn submit<R: Runtime>(
    runtime: &R,
    graph_name: &str,
    spec: &ProgramSpec,
    registry: &AccumulatorRegistry,
) -> Result<JobHandle, SubmitError<R::Error>> {
    validate(spec, registry)?;

    let job = runtime
        .start(graph_name, spec)
        .map_err(SubmitError::Runtime)?;

    debug!(
        graph = graph_name,
        job = %job,
        result_field = %spec.result_field,
        "vertex program started"
    );
    Ok(job)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::{vertex_degrees, PhaseProgram, ProgramSpecBuilder};
    use crate::Air;
    use std::cell::RefCell;

    #[derive(Debug, Error)]
    #[error("graph {0} not found")]
    struct UnknownGraph(String);

    #[derive(Default)]
    struct RecordingRuntime {
        started: RefCell<Vec<(String, serde_json::Value)>>,
    }

    impl Runtime for RecordingRuntime {
        type Error = UnknownGraph;

        fn start(&self, graph_name: &str, spec: &ProgramSpec) -> Result<JobHandle, UnknownGraph> {
            if graph_name != "social" {
                return Err(UnknownGraph(graph_name.to_string()));
            }
            let payload = spec.to_payload().expect("payload serializes");
            let mut started = self.started.borrow_mut();
            started.push((graph_name.to_string(), payload));
            Ok(JobHandle(format!("job-{}", started.len())))
        }

        fn status(&self, _job: &JobHandle) -> Result<JobStatus, UnknownGraph> {
            Ok(JobStatus { state: JobState::Running, gss: 1 })
        }
    }

    #[test]
    fn test_submit_valid_program() {
        let runtime = RecordingRuntime::default();
        let spec = vertex_degrees("degree").unwrap();

        let job = submit(&runtime, "social", &spec, &AccumulatorRegistry::default()).unwrap();

        assert_eq!(job, JobHandle("job-1".to_string()));
        assert_eq!(runtime.started.borrow()[0].1["resultField"], "degree");
        assert!(!runtime.status(&job).unwrap().state.is_finished());
    }

    #[test]
    fn test_invalid_program_never_reaches_runtime() {
        let runtime = RecordingRuntime::default();
        let spec = ProgramSpecBuilder::new("r")
            .accumulator("a", "sum", "ints")
            .accumulator("a", "sum", "ints")
            .phase("main", Air::seq(vec![]), PhaseProgram::Disabled)
            .finish();

        let err = submit(&runtime, "social", &spec, &AccumulatorRegistry::default()).unwrap_err();

        assert!(matches!(err, SubmitError::Invalid(ValidationError::DuplicateAccumulatorName(_))));
        assert!(runtime.started.borrow().is_empty());
    }

    #[test]
    fn test_runtime_errors_are_wrapped() {
        let runtime = RecordingRuntime::default();
        let spec = vertex_degrees("degree").unwrap();

        let err = submit(&runtime, "missing", &spec, &AccumulatorRegistry::default()).unwrap_err();
        assert_eq!(err.to_string(), "Runtime error: graph missing not found");
    }

    #[test]
    fn test_job_status_wire_form() {
        let status: JobStatus = serde_json::from_str(r#"{ "state": "done", "gss": 4 }"#).unwrap();
        assert_eq!(status, JobStatus { state: JobState::Done, gss: 4 });
        assert!(status.state.is_finished());
    }
}
