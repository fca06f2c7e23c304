// ─────────────────────────────────────────────────────────────────────
// SCPN TI Envelope — State
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::error::{TiError, TiResult};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Per-element view of a solved head mesh.
/// Node coordinates and connectivity stay with the solver; only what the
/// post-processing needs is carried: region tags, volumes and element fields.
#[derive(Debug, Clone)]
pub struct ElementMesh {
    /// Where the mesh came from, used in error messages.
    pub origin: String,
    pub tags: Array1<i32>,            // [n]
    pub volumes: Option<Array1<f64>>, // [n], mm³
    vector_fields: BTreeMap<String, Array2<f64>>, // [n, 3]
    scalar_fields: BTreeMap<String, Array1<f64>>, // [n]
}

impl ElementMesh {
    pub fn new(origin: impl Into<String>, tags: Array1<i32>) -> Self {
        ElementMesh {
            origin: origin.into(),
            tags,
            volumes: None,
            vector_fields: BTreeMap::new(),
            scalar_fields: BTreeMap::new(),
        }
    }

    pub fn n_elements(&self) -> usize {
        self.tags.len()
    }

    pub fn with_volumes(mut self, volumes: Array1<f64>) -> TiResult<Self> {
        if volumes.len() != self.n_elements() {
            let expected = format!("[{}]", self.n_elements());
            return Err(self.shape_error("volume", volumes.shape(), expected));
        }
        self.volumes = Some(volumes);
        Ok(self)
    }

    pub fn add_vector_field(&mut self, name: &str, field: Array2<f64>) -> TiResult<()> {
        if field.dim() != (self.n_elements(), 3) {
            let expected = format!("[{}, 3]", self.n_elements());
            return Err(self.shape_error(name, field.shape(), expected));
        }
        self.vector_fields.insert(name.to_string(), field);
        Ok(())
    }

    pub fn add_scalar_field(&mut self, name: &str, field: Array1<f64>) -> TiResult<()> {
        if field.len() != self.n_elements() {
            let expected = format!("[{}]", self.n_elements());
            return Err(self.shape_error(name, field.shape(), expected));
        }
        self.scalar_fields.insert(name.to_string(), field);
        Ok(())
    }

    pub fn vector_field(&self, name: &str) -> TiResult<&Array2<f64>> {
        self.vector_fields
            .get(name)
            .ok_or_else(|| TiError::MissingArray {
                origin: self.origin.clone(),
                name: name.to_string(),
            })
    }

    pub fn scalar_field(&self, name: &str) -> TiResult<&Array1<f64>> {
        self.scalar_fields
            .get(name)
            .ok_or_else(|| TiError::MissingArray {
                origin: self.origin.clone(),
                name: name.to_string(),
            })
    }

    pub fn vector_fields(&self) -> impl Iterator<Item = (&str, &Array2<f64>)> {
        self.vector_fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn scalar_fields(&self) -> impl Iterator<Item = (&str, &Array1<f64>)> {
        self.scalar_fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// New mesh holding only `indices`, in the given order, with every
    /// field and the volumes carried along.
    pub fn select(&self, indices: &[usize]) -> ElementMesh {
        ElementMesh {
            origin: self.origin.clone(),
            tags: self.tags.select(Axis(0), indices),
            volumes: self.volumes.as_ref().map(|v| v.select(Axis(0), indices)),
            vector_fields: self
                .vector_fields
                .iter()
                .map(|(k, v)| (k.clone(), v.select(Axis(0), indices)))
                .collect(),
            scalar_fields: self
                .scalar_fields
                .iter()
                .map(|(k, v)| (k.clone(), v.select(Axis(0), indices)))
                .collect(),
        }
    }

    /// Same tags and volumes, no fields. Used as the carrier for derived output.
    pub fn geometry_only(&self) -> ElementMesh {
        ElementMesh {
            origin: self.origin.clone(),
            tags: self.tags.clone(),
            volumes: self.volumes.clone(),
            vector_fields: BTreeMap::new(),
            scalar_fields: BTreeMap::new(),
        }
    }

    fn shape_error(&self, name: &str, shape: &[usize], expected: String) -> TiError {
        TiError::FieldShape {
            origin: self.origin.clone(),
            name: name.to_string(),
            shape: shape.to_vec(),
            expected,
        }
    }
}

/// Threshold statistics over a masked region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocalityReport {
    pub threshold: f64,
    pub n_masked: usize,
    pub n_above: usize,
    /// `n_above / n_masked`, 0 when nothing is masked.
    pub fraction: f64,
    /// Volume of above-threshold elements over masked volume, when volumes exist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_fraction: Option<f64>,
}

impl FocalityReport {
    /// True when no element matched the mask.
    pub fn is_empty(&self) -> bool {
        self.n_masked == 0
    }
}

/// Distribution of a scalar field over a masked region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSummary {
    pub max: f64,
    pub mean: f64,
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
    pub p99_9: f64,
}

/// Result of one full run, also written as `<subject>_TI_report.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TiReport {
    pub subject: String,
    pub field_files: [PathBuf; 2],
    pub envelope_file: PathBuf,
    pub n_elements: usize,
    pub gm_tags: Vec<i32>,
    pub focality: FocalityReport,
    pub summary: Option<FieldSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directional_summary: Option<FieldSummary>,
}
