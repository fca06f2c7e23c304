// ─────────────────────────────────────────────────────────────────────
// SCPN TI Envelope — Focality Reporter
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Threshold statistics of a scalar field inside a masked region.

use ndarray::ArrayView1;
use ti_types::error::{TiError, TiResult};
use ti_types::state::{FieldSummary, FocalityReport};

fn check_len(name: &str, len: usize, expected: usize) -> TiResult<()> {
    if len != expected {
        return Err(TiError::FieldShape {
            origin: "focality input".to_string(),
            name: name.to_string(),
            shape: vec![len],
            expected: format!("[{expected}]"),
        });
    }
    Ok(())
}

/// Fraction of masked elements whose value is at or above `threshold`.
///
/// An empty mask reports zero rather than dividing by zero; check
/// [`FocalityReport::is_empty`] to tell it apart from a genuine 0 %.
pub fn focality(
    field: ArrayView1<f64>,
    mask: ArrayView1<bool>,
    threshold: f64,
    volumes: Option<ArrayView1<f64>>,
) -> TiResult<FocalityReport> {
    check_len("mask", mask.len(), field.len())?;
    if let Some(v) = &volumes {
        check_len("volume", v.len(), field.len())?;
    }

    let mut n_masked = 0usize;
    let mut n_above = 0usize;
    let mut vol_masked = 0.0;
    let mut vol_above = 0.0;
    for (i, (&value, &selected)) in field.iter().zip(mask.iter()).enumerate() {
        if !selected {
            continue;
        }
        let above = value >= threshold;
        n_masked += 1;
        if above {
            n_above += 1;
        }
        if let Some(v) = &volumes {
            vol_masked += v[i];
            if above {
                vol_above += v[i];
            }
        }
    }

    let fraction = if n_masked > 0 {
        n_above as f64 / n_masked as f64
    } else {
        0.0
    };
    let volume_fraction = volumes.map(|_| {
        if vol_masked > 0.0 {
            (vol_above / vol_masked).clamp(0.0, 1.0)
        } else {
            0.0
        }
    });

    Ok(FocalityReport {
        threshold,
        n_masked,
        n_above,
        fraction,
        volume_fraction,
    })
}

/// Nearest-rank percentile of an ascending slice, `p` in [0, 100].
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    let rank = (p * n as f64 / 100.0).ceil() as usize;
    sorted[rank.clamp(1, n) - 1]
}

/// Distribution of the masked values; `None` when the mask selects nothing.
pub fn summarize(
    field: ArrayView1<f64>,
    mask: ArrayView1<bool>,
) -> TiResult<Option<FieldSummary>> {
    check_len("mask", mask.len(), field.len())?;
    let mut values: Vec<f64> = field
        .iter()
        .zip(mask.iter())
        .filter(|(_, m)| **m)
        .map(|(&v, _)| v)
        .collect();
    if values.is_empty() {
        return Ok(None);
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mean = values.iter().sum::<f64>() / values.len() as f64;

    Ok(Some(FieldSummary {
        max: values[values.len() - 1],
        mean,
        p50: percentile(&values, 50.0),
        p95: percentile(&values, 95.0),
        p99: percentile(&values, 99.0),
        p99_9: percentile(&values, 99.9),
    }))
}
