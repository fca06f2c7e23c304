// ─────────────────────────────────────────────────────────────────────
// SCPN TI Envelope — Envelope Combiner
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Temporal-interference envelope of two per-element field vectors.
//!
//! Two fields E1, E2 driven at f and f + Δf superpose to a carrier whose
//! amplitude beats at Δf. The maximal beat amplitude over all directions
//! (Grossman et al., Cell 2017) is, with |E1| ≥ |E2| and the angle α
//! between them folded to α ≤ 90°:
//!
//!   |E_AM| = 2|E2|                          if |E2| ≤ |E1| cos α
//!   |E_AM| = 2|E2 × (E1 − E2)| / |E1 − E2|  otherwise
//!
//! Along a fixed unit direction n the envelope is
//!   |E_AM(n)| = | |(E1 + E2)·n| − |(E1 − E2)·n| |

use ndarray::{Array1, ArrayView1, ArrayView2, Zip};
use ti_types::constants::PARALLEL_REL_TOL;
use ti_types::error::{TiError, TiResult};

pub type Vec3 = [f64; 3];

#[inline]
fn dot(a: Vec3, b: Vec3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[inline]
fn cross(a: Vec3, b: Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

#[inline]
fn norm(a: Vec3) -> f64 {
    dot(a, a).sqrt()
}

#[inline]
fn sub(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
fn add(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

#[inline]
fn row_vec3(row: ArrayView1<f64>) -> Vec3 {
    [row[0], row[1], row[2]]
}

#[inline]
fn max_abs(v: Vec3) -> f64 {
    v[0].abs().max(v[1].abs()).max(v[2].abs())
}

#[inline]
fn scale(v: Vec3, s: f64) -> Vec3 {
    [v[0] / s, v[1] / s, v[2] / s]
}

/// Maximal TI modulation amplitude for one element.
///
/// Symmetric in its arguments, non-negative, and finite for finite input.
/// Degenerate geometry falls back to analytic limits instead of dividing:
/// a zero field gives 0, parallel fields give twice the weaker magnitude.
pub fn max_envelope(e1: Vec3, e2: Vec3) -> f64 {
    // Homogeneous of degree 1: work on unit-scale vectors so the squared
    // norms neither overflow nor underflow.
    let s = max_abs(e1).max(max_abs(e2));
    if s == 0.0 {
        return 0.0;
    }
    s * max_envelope_unit(scale(e1, s), scale(e2, s))
}

fn max_envelope_unit(e1: Vec3, e2: Vec3) -> f64 {
    let (mut a, mut b) = (e1, e2);
    if norm(b) > norm(a) {
        std::mem::swap(&mut a, &mut b);
    }
    let norm_a = norm(a);
    let norm_b = norm(b);

    if norm_b == 0.0 {
        return 0.0;
    }

    // The envelope depends on the unsigned angle only.
    if dot(a, b) < 0.0 {
        b = [-b[0], -b[1], -b[2]];
    }

    if norm(cross(a, b)) <= PARALLEL_REL_TOL * norm_a * norm_b {
        return 2.0 * norm_b;
    }

    let cos_alpha = (dot(a, b) / (norm_a * norm_b)).clamp(-1.0, 1.0);
    if norm_b <= norm_a * cos_alpha {
        return 2.0 * norm_b;
    }

    let diff = sub(a, b);
    2.0 * norm(cross(b, diff)) / norm(diff)
}

/// Envelope amplitude along a fixed direction. The direction need not be
/// normalised; a zero direction yields 0.
pub fn directional_envelope(e1: Vec3, e2: Vec3, direction: Vec3) -> f64 {
    let d = max_abs(direction);
    let s = max_abs(e1).max(max_abs(e2));
    if d == 0.0 || !d.is_finite() || s == 0.0 {
        return 0.0;
    }
    let direction = scale(direction, d);
    let n = scale(direction, norm(direction));
    let (a, b) = (scale(e1, s), scale(e2, s));
    s * (dot(add(a, b), n).abs() - dot(sub(a, b), n).abs()).abs()
}

fn check_pair(e1: &ArrayView2<f64>, e2: &ArrayView2<f64>) -> TiResult<()> {
    for (name, shape) in [("E1", e1.shape()), ("E2", e2.shape())] {
        if shape[1] != 3 {
            return Err(TiError::FieldShape {
                origin: "envelope input".to_string(),
                name: name.to_string(),
                shape: shape.to_vec(),
                expected: "[n, 3]".to_string(),
            });
        }
    }
    if e1.nrows() != e2.nrows() {
        return Err(TiError::ElementCountMismatch {
            first: "E1".to_string(),
            first_count: e1.nrows(),
            second: "E2".to_string(),
            second_count: e2.nrows(),
        });
    }
    Ok(())
}

/// Per-element maximal envelope of two `[n, 3]` fields.
/// Element order and count are preserved.
pub fn max_envelope_field(e1: ArrayView2<f64>, e2: ArrayView2<f64>) -> TiResult<Array1<f64>> {
    check_pair(&e1, &e2)?;
    Ok(Zip::from(e1.rows())
        .and(e2.rows())
        .map_collect(|a, b| max_envelope(row_vec3(a), row_vec3(b))))
}

/// Per-element directional envelope. `directions` is `[n, 3]` (e.g. local
/// surface normals); use [`directional_envelope_field_uniform`] for one
/// direction shared by every element.
pub fn directional_envelope_field(
    e1: ArrayView2<f64>,
    e2: ArrayView2<f64>,
    directions: ArrayView2<f64>,
) -> TiResult<Array1<f64>> {
    check_pair(&e1, &e2)?;
    if directions.dim() != e1.dim() {
        return Err(TiError::FieldShape {
            origin: "envelope input".to_string(),
            name: "direction".to_string(),
            shape: directions.shape().to_vec(),
            expected: format!("[{}, 3]", e1.nrows()),
        });
    }
    Ok(Zip::from(e1.rows())
        .and(e2.rows())
        .and(directions.rows())
        .map_collect(|a, b, n| directional_envelope(row_vec3(a), row_vec3(b), row_vec3(n))))
}

pub fn directional_envelope_field_uniform(
    e1: ArrayView2<f64>,
    e2: ArrayView2<f64>,
    direction: Vec3,
) -> TiResult<Array1<f64>> {
    check_pair(&e1, &e2)?;
    Ok(Zip::from(e1.rows())
        .and(e2.rows())
        .map_collect(|a, b| directional_envelope(row_vec3(a), row_vec3(b), direction)))
}
