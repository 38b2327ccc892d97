// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 dagc contributors

//! Workflow task naming
//!
//! Compiled task names are a pure function of (scope path, task name, role)
//! and must be valid DNS-1123 labels for the engine.
//!
//! A name is the role prefix followed by one segment per scope level and the
//! task itself, separated by a single `-`. Inside a segment every `-` is
//! doubled, so separators and segment text never read the same. When
//! sanitizing changes a segment, or the name is too long, `---` and a short
//! digest of `role:qualified/path` are appended. A run of exactly three `-`
//! never appears otherwise. Names are still claimed in a [`NameArena`] so a
//! digest clash is reported instead of silently merging two tasks.

use std::collections::BTreeMap;
use std::fmt;

use crate::errors::{CompileError, CompileResult};
use crate::pipeline::ScopePath;

/// Longest name the engine accepts
pub const MAX_NAME_LEN: usize = 63;

/// Hex digits of the digest appended to lossy or shortened names
const DIGEST_LEN: usize = 8;

/// Marks the start of the digest suffix
const DIGEST_MARKER: &str = "---";

/// Role of a compiled task in a logical task's chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    Driver,
    DagDriver,
    Executor,
    Publisher,
}

impl Role {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Driver => "driver",
            Self::DagDriver => "dag-driver",
            Self::Executor => "executor",
            Self::Publisher => "publisher",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.prefix())
    }
}

/// Name of the compiled task playing `role` for `task` in `scope`
pub fn task_name(scope: &ScopePath, task: &str, role: Role) -> String {
    let mut name = role.prefix().to_string();
    let mut lossy = false;

    for segment in scope.segments().iter().map(String::as_str).chain([task]) {
        let clean = sanitize(segment);
        lossy |= clean != segment;
        name.push('-');
        name.push_str(&clean.replace('-', "--"));
    }

    if !lossy && name.len() <= MAX_NAME_LEN {
        return name;
    }

    with_digest(&name, &format!("{}:{}", role, scope.qualify(task)))
}

/// Lowercase, with everything outside `[a-z0-9-]` turned into `-`
pub fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
        .collect();
    let trimmed = cleaned.trim_matches('-');

    if trimmed.is_empty() {
        // Nothing usable survived; fall back to a digest of the raw name
        short_digest(name)
    } else {
        trimmed.to_string()
    }
}

/// Append a digest of `identity`, cutting `name` so the result fits
fn with_digest(name: &str, identity: &str) -> String {
    let keep = MAX_NAME_LEN - DIGEST_MARKER.len() - DIGEST_LEN;
    let head = name[..name.len().min(keep)].trim_end_matches('-');
    format!("{}{}{}", head, DIGEST_MARKER, short_digest(identity))
}

fn short_digest(value: &str) -> String {
    let hex = blake3::hash(value.as_bytes()).to_hex();
    hex[..DIGEST_LEN].to_string()
}

/// Registry of already assigned task names
#[derive(Debug, Default)]
pub struct NameArena {
    claimed: BTreeMap<String, String>,
}

impl NameArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `name` for `owner`, failing if another owner already holds it
    pub fn claim(&mut self, name: &str, owner: String) -> CompileResult<()> {
        if let Some(first) = self.claimed.get(name) {
            return Err(CompileError::TaskNameCollision {
                name: name.to_string(),
                first: first.clone(),
                second: owner,
            });
        }

        self.claimed.insert(name.to_string(), owner);
        Ok(())
    }
}
