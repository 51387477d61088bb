// src/program/registry.rs
//! Registry of accumulator types known to the runtime

use ahash::HashSet;

/// Accumulator types every runtime provides
pub const BUILTIN_ACCUMULATOR_TYPES: [&str; 7] =
    ["sum", "min", "max", "and", "or", "store", "list"];

/// Set of accepted `accumulatorType` names.
///
/// Built once and passed by reference to validation; extend it with
/// [`AccumulatorRegistry::with_type`] when the runtime offers custom
/// accumulators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccumulatorRegistry {
    types: HashSet<String>,
}

impl AccumulatorRegistry {
    /// Only `sum`, the one type every program may rely on
    pub fn minimal() -> Self {
        let mut types = HashSet::default();
        types.insert("sum".to_string());
        Self { types }
    }

    pub fn with_type(mut self, name: impl Into<String>) -> Self {
        self.register(name);
        self
    }

    /// Returns false if the type was already registered
    pub fn register(&mut self, name: impl Into<String>) -> bool {
        self.types.insert(name.into())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains(name)
    }

    /// Registered names, sorted
    pub fn types(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.iter().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for AccumulatorRegistry {
    fn default() -> Self {
        BUILTIN_ACCUMULATOR_TYPES
            .iter()
            .fold(Self::minimal(), |registry, name| registry.with_type(*name))
    }
}
