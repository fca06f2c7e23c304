// ─────────────────────────────────────────────────────────────────────
// SCPN TI Envelope — Config
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::constants::{
    DEFAULT_CURRENT_MA, DEFAULT_HEAD_DIR, DEFAULT_OUT_DIR, DEFAULT_PAD_DIMENSIONS_MM,
    DEFAULT_PAD_THICKNESS_MM, DEFAULT_THRESHOLD_V_PER_M, GRAY_MATTER_TAG,
};
use crate::error::{TiError, TiResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Electrode pad outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElectrodeShape {
    Rect,
    #[default]
    Ellipse,
}

/// One anode/cathode pair of a montage file.
/// Currents are not part of the file; they come from the run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairConfig {
    /// Landmark label of the positive electrode (e.g. "F5").
    pub anode: String,
    /// Landmark label of the negative electrode (e.g. "P5").
    pub cathode: String,
    #[serde(default)]
    pub shape: ElectrodeShape,
    /// Pad dimensions in mm.
    #[serde(default = "default_dimensions")]
    pub dimensions: [f64; 2],
    /// Layer thickness in mm: `[pad]` or `[gel, pad]`.
    #[serde(default = "default_thickness")]
    pub thickness: Vec<f64>,
}

fn default_dimensions() -> [f64; 2] {
    DEFAULT_PAD_DIMENSIONS_MM
}
fn default_thickness() -> Vec<f64> {
    DEFAULT_PAD_THICKNESS_MM.to_vec()
}

impl PairConfig {
    pub fn new(anode: &str, cathode: &str) -> Self {
        PairConfig {
            anode: anode.to_string(),
            cathode: cathode.to_string(),
            shape: ElectrodeShape::default(),
            dimensions: default_dimensions(),
            thickness: default_thickness(),
        }
    }

    fn validate(&self, idx: usize) -> TiResult<()> {
        if self.anode.trim().is_empty() || self.cathode.trim().is_empty() {
            return Err(TiError::ConfigError(format!(
                "pair[{idx}] requires non-empty anode and cathode labels"
            )));
        }
        if self
            .dimensions
            .iter()
            .any(|d| !d.is_finite() || *d <= 0.0)
        {
            return Err(TiError::ConfigError(format!(
                "pair[{idx}] dimensions must be finite and > 0, got {:?}",
                self.dimensions
            )));
        }
        if self.thickness.is_empty() || self.thickness.len() > 2 {
            return Err(TiError::ConfigError(format!(
                "pair[{idx}] thickness needs 1 or 2 layers, got {}",
                self.thickness.len()
            )));
        }
        if self.thickness.iter().any(|t| !t.is_finite() || *t <= 0.0) {
            return Err(TiError::ConfigError(format!(
                "pair[{idx}] thickness must be finite and > 0, got {:?}",
                self.thickness
            )));
        }
        Ok(())
    }
}

/// Two electrode pairs forming one TI session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MontageConfig {
    pub pairs: [PairConfig; 2],
}

impl Default for MontageConfig {
    fn default() -> Self {
        MontageConfig {
            pairs: [PairConfig::new("F5", "P5"), PairConfig::new("F6", "P6")],
        }
    }
}

impl MontageConfig {
    /// Load a montage from JSON and check its structure.
    pub fn from_file(path: &Path) -> TiResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            TiError::ConfigError(format!(
                "Failed to read montage file '{}': {e}",
                path.display()
            ))
        })?;
        let montage: Self = serde_json::from_str(&contents)?;
        montage.validate()?;
        Ok(montage)
    }

    /// Structural checks only; current balance is left to the solver.
    pub fn validate(&self) -> TiResult<()> {
        for (idx, pair) in self.pairs.iter().enumerate() {
            pair.validate(idx)?;
        }
        Ok(())
    }
}

/// Everything one run of the workflow needs.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Subject model directory (`m2m_<subject>`).
    pub head_dir: PathBuf,
    pub out_dir: PathBuf,
    /// Peak current per electrode (mA).
    pub current_ma: f64,
    /// Focality threshold (V/m).
    pub threshold: f64,
    /// Region tags counted as gray matter for reporting.
    pub gm_tags: Vec<i32>,
    pub montage: MontageConfig,
    /// Optional global direction for the directional envelope.
    pub direction: Option<[f64; 3]>,
    /// Pre-computed field files; when set the solver is not invoked.
    pub field_paths: Option<[PathBuf; 2]>,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            head_dir: PathBuf::from(DEFAULT_HEAD_DIR),
            out_dir: PathBuf::from(DEFAULT_OUT_DIR),
            current_ma: DEFAULT_CURRENT_MA,
            threshold: DEFAULT_THRESHOLD_V_PER_M,
            gm_tags: vec![GRAY_MATTER_TAG],
            montage: MontageConfig::default(),
            direction: None,
            field_paths: None,
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> TiResult<()> {
        if !self.current_ma.is_finite() {
            return Err(TiError::ConfigError(format!(
                "current must be finite, got {}",
                self.current_ma
            )));
        }
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(TiError::ConfigError(format!(
                "threshold must be finite and >= 0, got {}",
                self.threshold
            )));
        }
        if self.gm_tags.is_empty() {
            return Err(TiError::ConfigError(
                "at least one gray-matter tag is required".to_string(),
            ));
        }
        if let Some(dir) = self.direction {
            if dir.iter().any(|v| !v.is_finite()) {
                return Err(TiError::ConfigError(format!(
                    "direction must be finite, got {dir:?}"
                )));
            }
        }
        self.montage.validate()
    }

    /// Subject id: `m2m_ernie` → `ernie`, anything else → the directory name.
    pub fn subject_id(&self) -> String {
        subject_id_from_dir(&self.head_dir)
    }
}

pub fn subject_id_from_dir(head_dir: &Path) -> String {
    let name = head_dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "subject".to_string());
    match name.strip_prefix("m2m_") {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_montage_labels() {
        let montage = MontageConfig::default();
        assert_eq!(montage.pairs[0].anode, "F5");
        assert_eq!(montage.pairs[0].cathode, "P5");
        assert_eq!(montage.pairs[1].anode, "F6");
        assert_eq!(montage.pairs[1].cathode, "P6");
        assert_eq!(montage.pairs[0].shape, ElectrodeShape::Ellipse);
        assert_eq!(montage.pairs[1].thickness, vec![2.0, 1.0]);
        assert!(montage.validate().is_ok());
    }

    #[test]
    fn test_montage_from_file_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"pairs": [
                {{"anode": "C3", "cathode": "C4", "shape": "rect", "dimensions": [50.0, 30.0]}},
                {{"anode": "Fp1", "cathode": "O2"}}
            ]}}"#
        )
        .unwrap();

        let montage = MontageConfig::from_file(file.path()).unwrap();
        assert_eq!(montage.pairs[0].shape, ElectrodeShape::Rect);
        assert_eq!(montage.pairs[0].dimensions, [50.0, 30.0]);
        assert_eq!(montage.pairs[0].thickness, vec![2.0, 1.0]);
        assert_eq!(montage.pairs[1].anode, "Fp1");
        assert_eq!(montage.pairs[1].shape, ElectrodeShape::Ellipse);
    }

    #[test]
    fn test_montage_rejects_single_pair() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"pairs": [{{"anode": "C3", "cathode": "C4"}}]}}"#).unwrap();
        let err = MontageConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, TiError::Json(_)));
    }

    #[test]
    fn test_montage_rejects_bad_geometry() {
        let mut montage = MontageConfig::default();
        montage.pairs[1].dimensions = [40.0, -1.0];
        assert!(matches!(montage.validate(), Err(TiError::ConfigError(_))));

        let mut montage = MontageConfig::default();
        montage.pairs[0].thickness = vec![];
        assert!(montage.validate().is_err());

        let mut montage = MontageConfig::default();
        montage.pairs[0].cathode = "  ".to_string();
        assert!(montage.validate().is_err());
    }

    #[test]
    fn test_missing_montage_file() {
        let err = MontageConfig::from_file(Path::new("/nonexistent/montage.json")).unwrap_err();
        assert!(err.to_string().contains("montage.json"));
    }

    #[test]
    fn test_run_config_defaults() {
        let cfg = RunConfig::default();
        assert_eq!(cfg.head_dir, PathBuf::from("m2m_ernie"));
        assert_eq!(cfg.out_dir, PathBuf::from("TI"));
        assert!((cfg.current_ma - 1.0).abs() < 1e-12);
        assert!((cfg.threshold - 0.2).abs() < 1e-12);
        assert_eq!(cfg.gm_tags, vec![2]);
        assert_eq!(cfg.subject_id(), "ernie");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_run_config_validation() {
        let cfg = RunConfig {
            threshold: f64::NAN,
            ..RunConfig::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = RunConfig {
            gm_tags: vec![],
            ..RunConfig::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = RunConfig {
            direction: Some([0.0, f64::INFINITY, 0.0]),
            ..RunConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_subject_id_from_dir() {
        assert_eq!(subject_id_from_dir(Path::new("/data/m2m_ernie")), "ernie");
        assert_eq!(subject_id_from_dir(Path::new("heads/MNI152")), "MNI152");
        assert_eq!(subject_id_from_dir(Path::new("m2m_")), "m2m_");
    }

    #[test]
    fn test_montage_roundtrip_serialization() {
        let montage = MontageConfig::default();
        let json = serde_json::to_string_pretty(&montage).unwrap();
        let back: MontageConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(montage, back);
    }
}
