//! Environment lookups.
//!
//! [`Env::real()`] reads the process environment; unit tests build an
//! [`Env::mock()`] from fixed pairs so configuration layering can be checked
//! without touching process-wide state.

use std::collections::HashMap;
use std::env::VarError;

/// Source of environment variables.
#[derive(Clone, Debug, Default)]
pub struct Env {
    fixed: Option<HashMap<String, String>>,
}

impl Env {
    /// Reads from the real process environment.
    pub fn real() -> Self {
        Self { fixed: None }
    }

    /// Backed by exactly the given pairs; everything else is absent.
    #[cfg(test)]
    pub fn mock(vars: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>) -> Self {
        Self {
            fixed: Some(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect()),
        }
    }

    pub fn var(&self, name: &str) -> Result<String, VarError> {
        match &self.fixed {
            Some(map) => map.get(name).cloned().ok_or(VarError::NotPresent),
            None => std::env::var(name),
        }
    }
}
