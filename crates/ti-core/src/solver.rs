// ─────────────────────────────────────────────────────────────────────
// SCPN TI Envelope — Field Solver Seam
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! The finite-element solve is delegated to an external program.
//!
//! Output locations are decided by [`FieldNaming`], not by the solver, so
//! callers and tests can point the pipeline at any pair of field files.

use crate::session::Session;
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::process::Command;
use ti_types::error::{TiError, TiResult};

pub const DEFAULT_SOLVER_PROGRAM: &str = "simnibs_ti_solve";

/// Locations of the two solved field archives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPaths {
    pub first: PathBuf,
    pub second: PathBuf,
}

impl FieldPaths {
    pub fn new(first: impl Into<PathBuf>, second: impl Into<PathBuf>) -> Self {
        FieldPaths {
            first: first.into(),
            second: second.into(),
        }
    }

    pub fn ensure_exist(&self) -> TiResult<()> {
        for path in [&self.first, &self.second] {
            if !path.is_file() {
                return Err(TiError::FieldFileMissing { path: path.clone() });
            }
        }
        Ok(())
    }

    pub fn to_array(&self) -> [PathBuf; 2] {
        [self.first.clone(), self.second.clone()]
    }
}

impl From<[PathBuf; 2]> for FieldPaths {
    fn from([first, second]: [PathBuf; 2]) -> Self {
        FieldPaths { first, second }
    }
}

/// File-name patterns for solver output and derived files.
/// `{subject}` and `{index}` are substituted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldNaming {
    pub field_pattern: String,
    pub envelope_pattern: String,
    pub report_pattern: String,
    pub session_pattern: String,
}

impl Default for FieldNaming {
    fn default() -> Self {
        FieldNaming {
            field_pattern: "{subject}_TDCS_{index}_scalar.npz".to_string(),
            envelope_pattern: "{subject}_TI_envelope.npz".to_string(),
            report_pattern: "{subject}_TI_report.json".to_string(),
            session_pattern: "{subject}_session.json".to_string(),
        }
    }
}

fn expand(pattern: &str, subject: &str, index: usize) -> String {
    pattern
        .replace("{subject}", subject)
        .replace("{index}", &index.to_string())
}

impl FieldNaming {
    /// Solved field of pair `index` (1-based).
    pub fn field_file(&self, out_dir: &Path, subject: &str, index: usize) -> PathBuf {
        out_dir.join(expand(&self.field_pattern, subject, index))
    }

    pub fn field_paths(&self, out_dir: &Path, subject: &str) -> FieldPaths {
        FieldPaths::new(
            self.field_file(out_dir, subject, 1),
            self.field_file(out_dir, subject, 2),
        )
    }

    pub fn envelope_file(&self, out_dir: &Path, subject: &str) -> PathBuf {
        out_dir.join(expand(&self.envelope_pattern, subject, 0))
    }

    pub fn report_file(&self, out_dir: &Path, subject: &str) -> PathBuf {
        out_dir.join(expand(&self.report_pattern, subject, 0))
    }

    pub fn session_file(&self, out_dir: &Path, subject: &str) -> PathBuf {
        out_dir.join(expand(&self.session_pattern, subject, 0))
    }
}

/// Produces the two electric-field solutions for a session.
pub trait FieldSolver {
    fn solve(&self, session: &Session) -> TiResult<FieldPaths>;
}

/// Runs a solver executable once, blocking until it exits.
///
/// The program receives `args` followed by the path of the session JSON.
#[derive(Debug, Clone)]
pub struct ExternalSolver {
    pub program: String,
    pub args: Vec<String>,
    pub naming: FieldNaming,
}

impl Default for ExternalSolver {
    fn default() -> Self {
        Self::new(DEFAULT_SOLVER_PROGRAM)
    }
}

impl ExternalSolver {
    pub fn new(program: impl Into<String>) -> Self {
        ExternalSolver {
            program: program.into(),
            args: Vec::new(),
            naming: FieldNaming::default(),
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_naming(mut self, naming: FieldNaming) -> Self {
        self.naming = naming;
        self
    }
}

impl FieldSolver for ExternalSolver {
    fn solve(&self, session: &Session) -> TiResult<FieldPaths> {
        let session_path = self
            .naming
            .session_file(&session.output_dir, &session.subject);
        session.write_json(&session_path)?;

        info!("Running {} for '{}'", self.program, session.subject);
        debug!("  args: {:?} {}", self.args, session_path.display());
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(&session_path)
            .status()
            .map_err(|source| TiError::SolverLaunch {
                program: self.program.clone(),
                source,
            })?;
        if !status.success() {
            return Err(TiError::SolverFailed {
                program: self.program.clone(),
                status: status.to_string(),
            });
        }

        let paths = self
            .naming
            .field_paths(&session.output_dir, &session.subject);
        paths.ensure_exist()?;
        Ok(paths)
    }
}
