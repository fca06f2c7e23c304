// ─────────────────────────────────────────────────────────────────────
// SCPN TI Envelope — Field Archive I/O
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Per-element field archives in NumPy `.npz` format.
//!
//! Layout written by the solver adaptor and by this crate:
//!   `tag`     i32 (or i64) `[n]`  region tag per element
//!   `volume`  f64 `[n]`           element volume (optional)
//!   any other 1-D f64 `[n]`       scalar field
//!   `normal`  f64 `[n, 3]`        per-element direction (optional)
//!   any other 2-D f64 `[n, 3]`    vector field (f32 is widened)
//!
//! Node coordinates and connectivity are not part of the archive.

use log::debug;
use ndarray::{Array, Array1, ArrayD, Dimension, Ix1, Ix2, IxDyn, OwnedRepr};
use ndarray_npy::{NpzReader, NpzWriter, ReadableElement};
use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;
use ti_types::error::{TiError, TiResult};
use ti_types::state::ElementMesh;

pub const TAG_KEY: &str = "tag";
pub const VOLUME_KEY: &str = "volume";
pub const FIELD_KEY: &str = "E";
pub const ENVELOPE_KEY: &str = "TImax";
pub const DIRECTIONAL_KEY: &str = "TIdir";
/// Optional per-element unit directions (e.g. cortical normals), `[n, 3]`.
pub const NORMAL_KEY: &str = "normal";

struct FieldArchive {
    npz: NpzReader<File>,
    names: Vec<String>,
    origin: String,
}

impl FieldArchive {
    fn open(path: &Path) -> TiResult<Self> {
        let file = File::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => TiError::FieldFileMissing {
                path: path.to_path_buf(),
            },
            _ => TiError::Io(e),
        })?;
        let origin = path.display().to_string();
        let mut npz = NpzReader::new(file)
            .map_err(|e| TiError::Npz(format!("Failed to open npz '{origin}': {e}")))?;
        let names = npz
            .names()
            .map_err(|e| TiError::Npz(format!("Failed to list arrays in '{origin}': {e}")))?;
        Ok(Self { npz, names, origin })
    }

    /// Array keys without the `.npy` suffix.
    fn keys(&self) -> Vec<String> {
        self.names
            .iter()
            .map(|n| n.strip_suffix(".npy").unwrap_or(n).to_string())
            .collect()
    }

    fn entry_name(&self, key: &str) -> Option<String> {
        let with_ext = format!("{key}.npy");
        self.names
            .iter()
            .find(|n| **n == with_ext || n.as_str() == key)
            .cloned()
    }

    fn read<A, D>(&mut self, key: &str) -> TiResult<Option<Array<A, D>>>
    where
        A: ReadableElement,
        D: Dimension,
    {
        let Some(name) = self.entry_name(key) else {
            return Ok(None);
        };
        self.npz
            .by_name::<OwnedRepr<A>, D>(&name)
            .map(Some)
            .map_err(|e| TiError::Npz(format!("Failed to read '{key}' from {}: {e}", self.origin)))
    }

    fn missing(&self, key: &str) -> TiError {
        TiError::MissingArray {
            origin: self.origin.clone(),
            name: key.to_string(),
        }
    }

    /// Tags are stored as i32 by default; i64 archives are narrowed.
    fn read_tags(&mut self) -> TiResult<Array1<i32>> {
        if let Ok(Some(tags)) = self.read::<i32, Ix1>(TAG_KEY) {
            return Ok(tags);
        }
        let wide: Array1<i64> = self
            .read::<i64, Ix1>(TAG_KEY)?
            .ok_or_else(|| self.missing(TAG_KEY))?;
        let narrowed = wide
            .iter()
            .map(|&t| i32::try_from(t))
            .collect::<Result<Vec<i32>, _>>()
            .map_err(|_| {
                TiError::Npz(format!("Region tag out of i32 range in {}", self.origin))
            })?;
        Ok(Array1::from_vec(narrowed))
    }

    /// Any float array as f64, f32 widened.
    fn read_float(&mut self, key: &str) -> TiResult<ArrayD<f64>> {
        if let Ok(Some(values)) = self.read::<f64, IxDyn>(key) {
            return Ok(values);
        }
        let narrow: ArrayD<f32> = self
            .read::<f32, IxDyn>(key)?
            .ok_or_else(|| self.missing(key))?;
        Ok(narrow.mapv(f64::from))
    }
}

fn shape_error(origin: &str, key: &str, shape: &[usize], expected: String) -> TiError {
    TiError::FieldShape {
        origin: origin.to_string(),
        name: key.to_string(),
        shape: shape.to_vec(),
        expected,
    }
}

/// Load every per-element array of an archive.
///
/// Arrays that are neither `[n]` nor `[n, 3]` floats are skipped with a
/// debug message.
pub fn load_element_mesh(path: &Path) -> TiResult<ElementMesh> {
    let mut archive = FieldArchive::open(path)?;
    let tags = archive.read_tags()?;
    let n = tags.len();
    let mut mesh = ElementMesh::new(archive.origin.clone(), tags);

    for key in archive.keys() {
        if key == TAG_KEY {
            continue;
        }
        let values = match archive.read_float(&key) {
            Ok(values) => values,
            Err(e) => {
                debug!("{}: skipping '{key}': {e}", archive.origin);
                continue;
            }
        };
        let shape = values.shape().to_vec();
        if key == VOLUME_KEY {
            let volumes = values
                .into_dimensionality::<Ix1>()
                .map_err(|_| shape_error(&archive.origin, &key, &shape, format!("[{n}]")))?;
            mesh = mesh.with_volumes(volumes)?;
            continue;
        }
        match shape.as_slice() {
            [rows] if *rows == n => {
                let field = values
                    .into_dimensionality::<Ix1>()
                    .map_err(|_| shape_error(&archive.origin, &key, &shape, format!("[{n}]")))?;
                mesh.add_scalar_field(&key, field)?;
            }
            [rows, 3] if *rows == n => {
                let field = values
                    .into_dimensionality::<Ix2>()
                    .map_err(|_| shape_error(&archive.origin, &key, &shape, format!("[{n}, 3]")))?;
                mesh.add_vector_field(&key, field)?;
            }
            _ => debug!(
                "{}: skipping '{key}' with shape {shape:?} (mesh has {n} elements)",
                archive.origin
            ),
        }
    }

    debug!(
        "Loaded {} ({} elements, {} vector / {} scalar fields)",
        mesh.origin,
        n,
        mesh.vector_fields().count(),
        mesh.scalar_fields().count()
    );
    Ok(mesh)
}

/// Load a solver result and check it carries the vector field `field`
/// with shape `[n, 3]`.
pub fn load_field_mesh(path: &Path, field: &str) -> TiResult<ElementMesh> {
    let mesh = load_element_mesh(path)?;
    if mesh.vector_field(field).is_err() {
        if let Ok(scalar) = mesh.scalar_field(field) {
            return Err(shape_error(
                &mesh.origin,
                field,
                scalar.shape(),
                format!("[{}, 3]", mesh.n_elements()),
            ));
        }
    }
    mesh.vector_field(field)?;
    Ok(mesh)
}

/// Write tags, volumes and every field of `mesh` to an `.npz` archive.
pub fn save_element_mesh(path: &Path, mesh: &ElementMesh) -> TiResult<()> {
    let origin = path.display().to_string();
    let npz_err = |e: ndarray_npy::WriteNpzError| {
        TiError::Npz(format!("Failed to write npz '{origin}': {e}"))
    };

    let file = File::create(path)?;
    let mut npz = NpzWriter::new(file);
    npz.add_array(TAG_KEY, &mesh.tags).map_err(npz_err)?;
    if let Some(volumes) = &mesh.volumes {
        npz.add_array(VOLUME_KEY, volumes).map_err(npz_err)?;
    }
    for (name, field) in mesh.scalar_fields() {
        npz.add_array(name, field).map_err(npz_err)?;
    }
    for (name, field) in mesh.vector_fields() {
        npz.add_array(name, field).map_err(npz_err)?;
    }
    npz.finish().map_err(npz_err)?;
    debug!("Wrote {} ({} elements)", origin, mesh.n_elements());
    Ok(())
}
