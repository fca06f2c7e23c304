// ─────────────────────────────────────────────────────────────────────
// SCPN TI Envelope — Constants
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
/// Region tags at or above this value mark non-anatomical elements
/// (electrode pads, gel, surface patches). They are cropped before analysis.
pub const NON_ANATOMICAL_TAG_MIN: i32 = 1000;

/// Gray matter volume tag in the standard head-model labelling.
pub const GRAY_MATTER_TAG: i32 = 2;

/// Default peak current per electrode (mA).
pub const DEFAULT_CURRENT_MA: f64 = 1.0;

/// Default focality threshold (V/m).
pub const DEFAULT_THRESHOLD_V_PER_M: f64 = 0.2;

/// Milliampere to ampere.
pub const MA_TO_A: f64 = 1e-3;

/// Default electrode pad size (mm).
pub const DEFAULT_PAD_DIMENSIONS_MM: [f64; 2] = [40.0, 40.0];

/// Default layer thickness (mm): gel, then rubber pad.
pub const DEFAULT_PAD_THICKNESS_MM: [f64; 2] = [2.0, 1.0];

/// Default subject model directory.
pub const DEFAULT_HEAD_DIR: &str = "m2m_ernie";

/// Default output directory.
pub const DEFAULT_OUT_DIR: &str = "TI";

/// Relative tolerance under which two field vectors count as parallel.
pub const PARALLEL_REL_TOL: f64 = 1e-12;
