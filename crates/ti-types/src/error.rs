// ─────────────────────────────────────────────────────────────────────
// SCPN TI Envelope — Errors
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Field file not found: {}", path.display())]
    FieldFileMissing { path: PathBuf },

    #[error("Array '{name}' missing from {origin}")]
    MissingArray { origin: String, name: String },

    #[error("Field '{name}' in {origin} has shape {shape:?}, expected {expected}")]
    FieldShape {
        origin: String,
        name: String,
        shape: Vec<usize>,
        expected: String,
    },

    #[error(
        "Element count mismatch: {first} has {first_count} elements, \
         {second} has {second_count}"
    )]
    ElementCountMismatch {
        first: String,
        first_count: usize,
        second: String,
        second_count: usize,
    },

    #[error("Region tags diverge at element {index}: {first_tag} in first mesh, {second_tag} in second")]
    RegionTagMismatch {
        index: usize,
        first_tag: i32,
        second_tag: i32,
    },

    #[error("Failed to launch solver '{program}': {source}")]
    SolverLaunch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Solver '{program}' failed ({status})")]
    SolverFailed { program: String, status: String },

    #[error("NPZ error: {0}")]
    Npz(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type TiResult<T> = Result<T, TiError>;
