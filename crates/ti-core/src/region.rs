// ─────────────────────────────────────────────────────────────────────
// SCPN TI Envelope — Region Filter
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Region cropping and tag masks.
//!
//! Both solved meshes are cropped with the same rule so that element `i`
//! of one refers to the same tetrahedron as element `i` of the other.

use log::debug;
use ndarray::{Array1, ArrayView1};
use ti_types::constants::NON_ANATOMICAL_TAG_MIN;
use ti_types::error::{TiError, TiResult};
use ti_types::state::ElementMesh;

/// Keeps elements whose region tag lies below a fixed limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionFilter {
    limit: i32,
}

impl Default for RegionFilter {
    fn default() -> Self {
        Self::anatomical()
    }
}

impl RegionFilter {
    /// Drops electrode, gel and surface elements (tags >= 1000).
    pub fn anatomical() -> Self {
        Self::below(NON_ANATOMICAL_TAG_MIN)
    }

    fn below(limit: i32) -> Self {
        Self { limit }
    }

    pub fn keeps(&self, tag: i32) -> bool {
        tag < self.limit
    }

    pub fn kept_indices(&self, tags: ArrayView1<i32>) -> Vec<usize> {
        tags.iter()
            .enumerate()
            .filter(|(_, tag)| self.keeps(**tag))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn apply(&self, mesh: &ElementMesh) -> ElementMesh {
        let kept = self.kept_indices(mesh.tags.view());
        debug!(
            "{}: keeping {} of {} elements (tag < {})",
            mesh.origin,
            kept.len(),
            mesh.n_elements(),
            self.limit
        );
        mesh.select(&kept)
    }

    /// Crop both meshes identically and check they still line up.
    ///
    /// A count or tag-sequence mismatch means the two solves were not run on
    /// the same geometry; this is fatal.
    pub fn apply_pair(
        &self,
        first: &ElementMesh,
        second: &ElementMesh,
    ) -> TiResult<(ElementMesh, ElementMesh)> {
        let first = self.apply(first);
        let second = self.apply(second);
        check_aligned(&first, &second)?;
        Ok((first, second))
    }
}

/// Fails unless both meshes have the same element count and tag sequence.
pub fn check_aligned(first: &ElementMesh, second: &ElementMesh) -> TiResult<()> {
    if first.n_elements() != second.n_elements() {
        return Err(TiError::ElementCountMismatch {
            first: first.origin.clone(),
            first_count: first.n_elements(),
            second: second.origin.clone(),
            second_count: second.n_elements(),
        });
    }
    if let Some((index, (&a, &b))) = first
        .tags
        .iter()
        .zip(second.tags.iter())
        .enumerate()
        .find(|(_, (a, b))| a != b)
    {
        return Err(TiError::RegionTagMismatch {
            index,
            first_tag: a,
            second_tag: b,
        });
    }
    Ok(())
}

/// Boolean mask of elements whose tag is in `selected`.
pub fn region_mask(tags: ArrayView1<i32>, selected: &[i32]) -> Array1<bool> {
    tags.mapv(|tag| selected.contains(&tag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    fn mesh(origin: &str, tags: Array1<i32>) -> ElementMesh {
        let n = tags.len();
        let mut m = ElementMesh::new(origin, tags);
        m.add_vector_field("E", Array2::from_shape_fn((n, 3), |(i, _)| i as f64))
            .unwrap();
        m
    }

    #[test]
    fn test_anatomical_limit() {
        let filter = RegionFilter::anatomical();
        assert!(filter.keeps(1));
        assert!(filter.keeps(999));
        assert!(!filter.keeps(1000));
        assert!(!filter.keeps(1502));
        assert_eq!(filter, RegionFilter::default());
    }

    #[test]
    fn test_apply_preserves_order_and_fields() {
        let m = mesh("m1", array![1, 1001, 2, 5, 1100]);
        let cropped = RegionFilter::anatomical().apply(&m);
        assert_eq!(cropped.tags, array![1, 2, 5]);
        let e = cropped.vector_field("E").unwrap();
        assert_eq!(e.column(0).to_vec(), vec![0.0, 2.0, 3.0]);
    }

    #[test]
    fn test_apply_pair_same_geometry() {
        let tags = array![3, 2, 1005, 2, 1];
        let (a, b) = RegionFilter::anatomical()
            .apply_pair(&mesh("m1", tags.clone()), &mesh("m2", tags))
            .unwrap();
        assert_eq!(a.n_elements(), 4);
        assert_eq!(a.n_elements(), b.n_elements());
    }

    #[test]
    fn test_apply_pair_count_mismatch_names_files() {
        let err = RegionFilter::anatomical()
            .apply_pair(
                &mesh("ernie_TDCS_1_scalar.npz", array![1, 2, 2]),
                &mesh("ernie_TDCS_2_scalar.npz", array![1, 2, 1001]),
            )
            .unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, TiError::ElementCountMismatch { .. }));
        assert!(msg.contains("ernie_TDCS_1_scalar.npz"), "{msg}");
        assert!(msg.contains("ernie_TDCS_2_scalar.npz"), "{msg}");
        assert!(msg.contains('3') && msg.contains('2'), "{msg}");
    }

    #[test]
    fn test_apply_pair_tag_mismatch() {
        let err = RegionFilter::anatomical()
            .apply_pair(&mesh("a", array![1, 2, 3]), &mesh("b", array![1, 3, 3]))
            .unwrap_err();
        assert!(matches!(
            err,
            TiError::RegionTagMismatch {
                index: 1,
                first_tag: 2,
                second_tag: 3
            }
        ));
    }

    #[test]
    fn test_region_mask() {
        let tags = array![1, 2, 3, 2, 1002];
        let mask = region_mask(tags.view(), &[2]);
        assert_eq!(mask, array![false, true, false, true, false]);
        let mask = region_mask(tags.view(), &[1, 3]);
        assert_eq!(mask, array![true, false, true, false, false]);
        assert!(region_mask(tags.view(), &[]).iter().all(|&m| !m));
    }
}
