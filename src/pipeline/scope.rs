// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 dagc contributors

//! Scope paths
//!
//! A scope path is the chain of composite task names leading from the root
//! pipeline to a DAG. It qualifies task names in diagnostics and seeds the
//! generated workflow task names.

use std::fmt;

/// Name of the root scope in qualified paths
pub const ROOT_SCOPE: &str = "root";

/// Path from the root pipeline to a nested DAG
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopePath {
    segments: Vec<String>,
}

impl ScopePath {
    /// The root scope
    pub fn root() -> Self {
        Self::default()
    }

    /// Scope of the DAG nested under `task`
    pub fn child(&self, task: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(task.to_string());
        Self { segments }
    }

    /// Composite task names from the root down
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Fully-qualified name of a task in this scope, e.g. `root/outer/train`
    pub fn qualify(&self, task: &str) -> String {
        format!("{}/{}", self, task)
    }
}

impl fmt::Display for ScopePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", ROOT_SCOPE)?;
        for segment in &self.segments {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualify() {
        let root = ScopePath::root();
        let nested = root.child("outer").child("inner");

        assert_eq!(root.qualify("a"), "root/a");
        assert_eq!(nested.qualify("a"), "root/outer/inner/a");
        assert_eq!(nested.to_string(), "root/outer/inner");
        assert_eq!(nested.segments(), ["outer", "inner"]);
        assert_eq!(root.to_string(), "root");
    }
}
