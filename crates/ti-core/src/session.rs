// ─────────────────────────────────────────────────────────────────────
// SCPN TI Envelope — Session Configurator
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Simulation session handed to the field solver.
//!
//! One session holds two independent tDCS-style pairs. Each pair drives
//! `+I` through its anode (channel 1) and `-I` through its cathode
//! (channel 2), with `I` in amperes.

use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use ti_types::config::{ElectrodeShape, PairConfig, RunConfig};
use ti_types::constants::MA_TO_A;
use ti_types::error::TiResult;

/// Electrode as the solver sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Electrode {
    /// 1 = anode, 2 = cathode.
    pub channelnr: u8,
    /// EEG landmark the pad is centred on.
    pub centre: String,
    pub shape: ElectrodeShape,
    pub dimensions: [f64; 2],
    pub thickness: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TdcsPair {
    /// Channel currents in A, `[anode, cathode]`.
    pub currents: [f64; 2],
    pub electrodes: [Electrode; 2],
}

impl TdcsPair {
    pub fn from_pair(pair: &PairConfig, current_ma: f64) -> Self {
        let amps = current_ma * MA_TO_A;
        let electrode = |channelnr: u8, centre: &str| Electrode {
            channelnr,
            centre: centre.to_string(),
            shape: pair.shape,
            dimensions: pair.dimensions,
            thickness: pair.thickness.clone(),
        };
        TdcsPair {
            currents: [amps, -amps],
            electrodes: [electrode(1, &pair.anode), electrode(2, &pair.cathode)],
        }
    }

    /// Sum of channel currents; zero for a balanced pair.
    pub fn net_current(&self) -> f64 {
        self.currents.iter().sum()
    }
}

/// Input for one pair of field solves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub subject: String,
    pub subject_dir: PathBuf,
    pub output_dir: PathBuf,
    pub pairs: [TdcsPair; 2],
}

impl Session {
    pub fn from_config(cfg: &RunConfig) -> Self {
        let [first, second] = &cfg.montage.pairs;
        Session {
            subject: cfg.subject_id(),
            subject_dir: cfg.head_dir.clone(),
            output_dir: cfg.out_dir.clone(),
            pairs: [
                TdcsPair::from_pair(first, cfg.current_ma),
                TdcsPair::from_pair(second, cfg.current_ma),
            ],
        }
    }

    /// Write the session as pretty JSON.
    pub fn write_json(&self, path: &Path) -> TiResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        debug!("Session for '{}' written to {}", self.subject, path.display());
        Ok(())
    }
}
