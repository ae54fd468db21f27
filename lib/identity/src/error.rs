//! Configuration error type.
//!
//! Construction-time only: a [`ConfigError`] means the gate was never built.
//! Request-time failures live in the middleware crate.

use std::fmt;

/// An invalid gate configuration.
///
/// Carries every violated invariant so a deployment can report all of its
/// configuration problems in one pass instead of fixing them one at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    problems: Vec<String>,
}

impl ConfigError {
    /// Creates an error from the list of violated invariants.
    #[must_use]
    pub fn new(problems: Vec<String>) -> Self {
        Self { problems }
    }

    /// Returns each violated invariant.
    #[must_use]
    pub fn problems(&self) -> &[String] {
        &self.problems
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid gate configuration: {}", self.problems.join("; "))
    }
}

impl std::error::Error for ConfigError {}
