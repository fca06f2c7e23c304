// ─────────────────────────────────────────────────────────────────────
// SCPN TI Envelope — Property-Based Tests (proptest) for ti-core
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Property-based tests for ti-core using proptest.
//!
//! Covers: envelope combiner (symmetry, limits, bounds), region filter,
//! focality fraction.

use ndarray::{Array1, Array2};
use proptest::prelude::*;
use ti_core::envelope::{directional_envelope, max_envelope, max_envelope_field};
use ti_core::focality::focality;
use ti_core::region::{region_mask, RegionFilter};
use ti_types::state::ElementMesh;

fn vec3() -> impl Strategy<Value = [f64; 3]> {
    prop::array::uniform3(-10.0f64..10.0)
}

/// Components spread over 400 decades.
fn wide_vec3() -> impl Strategy<Value = [f64; 3]> {
    prop::array::uniform3((-1.0f64..1.0, -200i32..200).prop_map(|(m, e)| m * 10f64.powi(e)))
}

fn norm(v: [f64; 3]) -> f64 {
    v[0].hypot(v[1]).hypot(v[2])
}

fn tol(a: [f64; 3], b: [f64; 3]) -> f64 {
    1e-9 * (norm(a) + norm(b)) + 1e-12
}

// ── Envelope Combiner Properties ─────────────────────────────────────

proptest! {
    /// Swapping the two fields does not change the envelope.
    #[test]
    fn envelope_symmetric(a in vec3(), b in vec3()) {
        let ab = max_envelope(a, b);
        let ba = max_envelope(b, a);
        prop_assert!((ab - ba).abs() <= tol(a, b), "ab={} ba={}", ab, ba);
    }

    /// Identical fields give twice their magnitude.
    #[test]
    fn envelope_of_identical_fields(a in vec3()) {
        let env = max_envelope(a, a);
        prop_assert!((env - 2.0 * norm(a)).abs() <= tol(a, a), "env={}", env);
    }

    /// A zero field gives a zero envelope.
    #[test]
    fn envelope_with_zero_field(a in vec3()) {
        prop_assert_eq!(max_envelope(a, [0.0; 3]), 0.0);
        prop_assert_eq!(max_envelope([0.0; 3], a), 0.0);
    }

    /// Always finite, non-negative and bounded by twice the weaker field.
    #[test]
    fn envelope_bounded(a in vec3(), b in vec3()) {
        let env = max_envelope(a, b);
        prop_assert!(env.is_finite());
        prop_assert!(env >= 0.0);
        let bound = 2.0 * norm(a).min(norm(b));
        prop_assert!(env <= bound + tol(a, b), "env={} bound={}", env, bound);
    }

    /// Nearly identical fields stay finite and close to 2|a|.
    #[test]
    fn envelope_near_identical(a in vec3(), d in prop::array::uniform3(-1e-9f64..1e-9)) {
        let b = [a[0] + d[0], a[1] + d[1], a[2] + d[2]];
        let env = max_envelope(a, b);
        prop_assert!(env.is_finite());
        prop_assert!(env >= 0.0);
        prop_assert!(env <= 2.0 * norm(a) + 1e-6);
    }

    /// Finite, non-negative and bounded for any finite magnitude.
    #[test]
    fn envelope_bounded_wide_range(a in wide_vec3(), b in wide_vec3()) {
        let env = max_envelope(a, b);
        prop_assert!(env.is_finite(), "a={:?} b={:?}", a, b);
        prop_assert!(env >= 0.0);
        // A field more than ~150 decades weaker than the other is resolved
        // only relative to the stronger one.
        let scale = a.iter().chain(b.iter()).fold(0.0f64, |m, v| m.max(v.abs()));
        let slack = 1e-140 * scale;
        let bound = 2.0 * norm(a).min(norm(b));
        prop_assert!(env <= bound * (1.0 + 1e-9) + slack, "env={} bound={}", env, bound);
        let ba = max_envelope(b, a);
        prop_assert!((env - ba).abs() <= 1e-9 * env.max(ba) + slack, "ab={} ba={}", env, ba);
    }

    /// Scaling both fields scales the envelope.
    #[test]
    fn envelope_homogeneous(a in vec3(), b in vec3(), e in -200i32..200) {
        let k = 10f64.powi(e);
        let scaled = max_envelope(
            [k * a[0], k * a[1], k * a[2]],
            [k * b[0], k * b[1], k * b[2]],
        );
        let expected = k * max_envelope(a, b);
        prop_assert!(scaled.is_finite());
        prop_assert!((scaled - expected).abs() <= k * tol(a, b), "scaled={} expected={}", scaled, expected);
    }

    /// No single direction beats the maximal envelope.
    #[test]
    fn directional_never_exceeds_max(a in vec3(), b in vec3(), n in vec3()) {
        let max = max_envelope(a, b);
        let dir = directional_envelope(a, b, n);
        prop_assert!(dir >= 0.0);
        prop_assert!(dir <= max + tol(a, b), "dir={} max={}", dir, max);
    }

    /// The field version matches the per-element function row by row.
    #[test]
    fn field_matches_pointwise(rows in prop::collection::vec((vec3(), vec3()), 0..32)) {
        let n = rows.len();
        let e1 = Array2::from_shape_fn((n, 3), |(i, j)| rows[i].0[j]);
        let e2 = Array2::from_shape_fn((n, 3), |(i, j)| rows[i].1[j]);
        let env = max_envelope_field(e1.view(), e2.view()).unwrap();
        prop_assert_eq!(env.len(), n);
        for (i, (a, b)) in rows.iter().enumerate() {
            prop_assert_eq!(env[i], max_envelope(*a, *b));
        }
    }
}

// ── Region Filter Properties ─────────────────────────────────────────

fn mesh(origin: &str, tags: &[i32], scale: f64) -> ElementMesh {
    let n = tags.len();
    let mut m = ElementMesh::new(origin, Array1::from_vec(tags.to_vec()));
    m.add_vector_field("E", Array2::from_shape_fn((n, 3), |(i, j)| scale * (i + j) as f64))
        .unwrap();
    m
}

proptest! {
    /// Same geometry in, same element count and tags out, none non-anatomical.
    #[test]
    fn filter_same_geometry_aligned(tags in prop::collection::vec(0i32..1500, 0..64)) {
        let (a, b) = RegionFilter::anatomical()
            .apply_pair(&mesh("a", &tags, 1.0), &mesh("b", &tags, 2.0))
            .unwrap();
        prop_assert_eq!(a.n_elements(), b.n_elements());
        prop_assert_eq!(&a.tags, &b.tags);
        prop_assert!(a.tags.iter().all(|&t| t < 1000));
        let expected = tags.iter().filter(|&&t| t < 1000).count();
        prop_assert_eq!(a.n_elements(), expected);
        prop_assert_eq!(a.vector_field("E").unwrap().nrows(), expected);
    }
}

// ── Focality Properties ──────────────────────────────────────────────

proptest! {
    /// The fraction lies in [0, 1] and is 0 when nothing is masked.
    #[test]
    fn fraction_in_unit_interval(
        values in prop::collection::vec(0.0f64..2.0, 0..64),
        tag_seed in prop::collection::vec(1i32..4, 64),
        thr in 0.0f64..2.0,
    ) {
        let n = values.len();
        let field = Array1::from_vec(values);
        let tags = Array1::from_vec(tag_seed[..n].to_vec());
        let mask = region_mask(tags.view(), &[2]);
        let report = focality(field.view(), mask.view(), thr, None).unwrap();

        prop_assert!((0.0..=1.0).contains(&report.fraction));
        prop_assert!(report.n_above <= report.n_masked);
        if report.n_masked == 0 {
            prop_assert_eq!(report.fraction, 0.0);
        }
    }

    /// Raising the threshold never raises the fraction.
    #[test]
    fn fraction_monotone_in_threshold(
        values in prop::collection::vec(0.0f64..2.0, 1..64),
        lo in 0.0f64..1.0,
        step in 0.0f64..1.0,
    ) {
        let field = Array1::from_vec(values);
        let mask = Array1::from_elem(field.len(), true);
        let low = focality(field.view(), mask.view(), lo, None).unwrap();
        let high = focality(field.view(), mask.view(), lo + step, None).unwrap();
        prop_assert!(high.fraction <= low.fraction);
    }

    /// An all-false mask always reports exactly zero.
    #[test]
    fn empty_mask_reports_zero(values in prop::collection::vec(-1.0f64..2.0, 0..32), thr in -1.0f64..1.0) {
        let field = Array1::from_vec(values);
        let mask = Array1::from_elem(field.len(), false);
        let report = focality(field.view(), mask.view(), thr, None).unwrap();
        prop_assert!(report.is_empty());
        prop_assert_eq!(report.fraction, 0.0);
    }
}
