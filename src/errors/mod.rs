// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 dagc contributors

//! Error types
//!
//! [`CompileError`] covers everything the pure compile pass can reject.
//! [`DagcError`] wraps it together with the I/O and parsing failures of the
//! loaders, config and CLI around it.

mod compile;

pub use compile::{CompileError, CompileResult};

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for dagc operations
pub type DagcResult<T> = Result<T, DagcError>;

/// Main error type for dagc
#[derive(Error, Debug, Diagnostic)]
pub enum DagcError {
    // ─────────────────────────────────────────────────────────────────────────
    // Compile Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(transparent)]
    Compile(#[from] CompileError),

    // ─────────────────────────────────────────────────────────────────────────
    // File Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("File not found: {path}")]
    #[diagnostic(code(dagc::file_not_found))]
    FileNotFound {
        path: PathBuf,
        #[help]
        help: Option<String>,
    },

    #[error("Failed to read file '{path}': {error}")]
    #[diagnostic(code(dagc::file_read_error))]
    FileReadError { path: PathBuf, error: String },

    #[error("Failed to write file '{path}': {error}")]
    #[diagnostic(code(dagc::file_write_error))]
    FileWriteError { path: PathBuf, error: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Config Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Invalid configuration in '{path}': {reason}")]
    #[diagnostic(
        code(dagc::invalid_config),
        help("dagc.toml accepts an [engine] table and a [templates] table")
    )]
    InvalidConfig { path: PathBuf, reason: String },

    // ─────────────────────────────────────────────────────────────────────────
    // IO/System Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("IO error: {message}")]
    #[diagnostic(code(dagc::io_error))]
    Io { message: String },

    #[error("YAML parsing error: {message}")]
    #[diagnostic(code(dagc::yaml_error))]
    Yaml { message: String },

    #[error("JSON parsing error: {message}")]
    #[diagnostic(code(dagc::json_error))]
    Json { message: String },
}

impl From<std::io::Error> for DagcError {
    fn from(e: std::io::Error) -> Self {
        Self::Io { message: e.to_string() }
    }
}

impl From<serde_yaml::Error> for DagcError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Yaml { message: e.to_string() }
    }
}

impl From<serde_json::Error> for DagcError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json { message: e.to_string() }
    }
}

impl DagcError {
    /// Read a file, mapping failures to a path-aware error
    pub fn read_file(path: &std::path::Path) -> DagcResult<String> {
        if !path.exists() {
            return Err(Self::FileNotFound {
                path: path.to_path_buf(),
                help: Some("Check the path passed on the command line".into()),
            });
        }

        std::fs::read_to_string(path).map_err(|e| Self::FileReadError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }
}
