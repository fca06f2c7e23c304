// ─────────────────────────────────────────────────────────────────────
// SCPN TI Envelope — Core
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Temporal-interference envelope post-processing.
//!
//! Field I/O and solver seam: mesh_io, session, solver
//! Numerics: envelope, region, focality
//! Orchestration: pipeline

pub mod envelope;
pub mod focality;
pub mod mesh_io;
pub mod pipeline;
pub mod region;
pub mod session;
pub mod solver;
