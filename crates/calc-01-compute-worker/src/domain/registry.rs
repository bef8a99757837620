//! Operation registry.
//!
//! Built once at startup. The table is the single source of truth for which
//! operation names the worker accepts.

use std::collections::HashMap;

use super::config::ArithmeticConfig;
use super::operation::Operation;
use crate::error::CalcError;

/// Case-insensitive name → operation lookup.
#[derive(Clone, Debug)]
pub struct OperationRegistry {
    operations: HashMap<&'static str, Operation>,
}

impl OperationRegistry {
    /// Build a registry from an operation set.
    ///
    /// A name that appears twice is a configuration error.
    pub fn new(operations: impl IntoIterator<Item = Operation>) -> Result<Self, CalcError> {
        let mut table = HashMap::new();
        for op in operations {
            if table.insert(op.name(), op).is_some() {
                return Err(CalcError::DuplicateOperation(op.name().to_string()));
            }
        }
        Ok(Self { operations: table })
    }

    /// Registry holding the full configured operation set.
    pub fn from_config(config: &ArithmeticConfig) -> Result<Self, CalcError> {
        config.validate()?;
        Self::new(Operation::standard_set(config))
    }

    /// Resolve `name` ignoring case.
    ///
    /// The error carries the name exactly as the caller spelled it.
    pub fn resolve(&self, name: &str) -> Result<Operation, CalcError> {
        self.operations
            .get(name.to_lowercase().as_str())
            .copied()
            .ok_or_else(|| CalcError::UnsupportedOperation(name.to_string()))
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.operations.keys().copied().collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}
