// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 dagc contributors

//! Compiler configuration
//!
//! Loaded from `dagc.toml`:
//!
//! ```toml
//! [engine]
//! root_driver_task = "root-driver"
//!
//! [templates]
//! executor = "kfp-executor"
//!
//! [templates.bindings]
//! comp-train = "kfp-gpu-executor"
//! ```
//!
//! Every key is optional and falls back to its built-in default.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::compiler::{Compiler, EngineConfig, TemplateRegistry};
use crate::errors::{DagcError, DagcResult};

/// Config file name looked up in the working and user config directories
pub const CONFIG_FILE: &str = "dagc.toml";

/// Contents of `dagc.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DagcConfig {
    pub engine: EngineConfig,
    pub templates: TemplateRegistry,
}

impl DagcConfig {
    /// Load a config file
    pub fn from_file(path: &Path) -> DagcResult<Self> {
        let content = DagcError::read_file(path)?;

        toml::from_str(&content).map_err(|e| DagcError::InvalidConfig {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Find and load the config
    ///
    /// Uses `explicit` when given, else the first `dagc.toml` found in `cwd`
    /// or the user config directory. Returns the defaults and no path when
    /// none exists.
    pub fn discover(explicit: Option<&Path>, cwd: &Path) -> DagcResult<(Self, Option<PathBuf>)> {
        if let Some(path) = explicit {
            return Ok((Self::from_file(path)?, Some(path.to_path_buf())));
        }

        let candidates = [Some(cwd.join(CONFIG_FILE)), user_config_path()];
        match candidates.into_iter().flatten().find(|p| p.is_file()) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading config");
                Ok((Self::from_file(&path)?, Some(path)))
            }
            None => Ok((Self::default(), None)),
        }
    }

    /// Compiler using these settings
    pub fn compiler(&self) -> DagcResult<Compiler> {
        Ok(Compiler::new(self.engine.clone(), self.templates.clone())?)
    }
}

/// `dagc.toml` in the platform's user config directory
pub fn user_config_path() -> Option<PathBuf> {
    ProjectDirs::from("io", "dagc", "dagc").map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}
