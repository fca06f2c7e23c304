// ─────────────────────────────────────────────────────────────────────
// SCPN TI Envelope — Pipeline
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! End-to-end run: session → solve → load → filter → combine → report.

use crate::envelope::{
    directional_envelope_field, directional_envelope_field_uniform, max_envelope_field,
};
use crate::focality::{focality, summarize};
use crate::mesh_io::{
    load_field_mesh, save_element_mesh, DIRECTIONAL_KEY, ENVELOPE_KEY, FIELD_KEY, NORMAL_KEY,
};
use crate::region::{region_mask, RegionFilter};
use crate::session::Session;
use crate::solver::{FieldNaming, FieldPaths, FieldSolver};
use log::{debug, info, warn};
use std::fmt;
use std::fs;
use ti_types::config::RunConfig;
use ti_types::error::TiResult;
use ti_types::state::TiReport;

/// Stages reported to the progress callback, in run order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Configuring,
    Solving,
    Loading,
    Combining,
    Saving,
    Reporting,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Configuring => "Setting up session",
            Stage::Solving => "Solving fields",
            Stage::Loading => "Loading field meshes",
            Stage::Combining => "Computing TI envelope",
            Stage::Saving => "Saving envelope",
            Stage::Reporting => "Computing focality",
        };
        f.write_str(label)
    }
}

/// Run the full workflow. The solver is called once, or not at all when
/// `cfg.field_paths` is set.
pub fn run(cfg: &RunConfig, solver: &dyn FieldSolver, naming: &FieldNaming) -> TiResult<TiReport> {
    run_with_progress(cfg, solver, naming, |_| {})
}

pub fn run_with_progress(
    cfg: &RunConfig,
    solver: &dyn FieldSolver,
    naming: &FieldNaming,
    mut on_stage: impl FnMut(Stage),
) -> TiResult<TiReport> {
    cfg.validate()?;
    let subject = cfg.subject_id();

    on_stage(Stage::Configuring);
    fs::create_dir_all(&cfg.out_dir)?;
    let session = Session::from_config(cfg);
    for (i, pair) in session.pairs.iter().enumerate() {
        let [anode, cathode] = &pair.electrodes;
        debug!(
            "Pair {}: {} (+) / {} (-), {:+.3e} A, net {:.1e} A",
            i + 1,
            anode.centre,
            cathode.centre,
            pair.currents[0],
            pair.net_current()
        );
    }

    let paths = match &cfg.field_paths {
        Some(explicit) => {
            info!("Using precomputed fields, solver skipped");
            let paths = FieldPaths::from(explicit.clone());
            paths.ensure_exist()?;
            paths
        }
        None => {
            on_stage(Stage::Solving);
            solver.solve(&session)?
        }
    };

    on_stage(Stage::Loading);
    let first = load_field_mesh(&paths.first, FIELD_KEY)?;
    let second = load_field_mesh(&paths.second, FIELD_KEY)?;
    let (first, second) = RegionFilter::anatomical().apply_pair(&first, &second)?;
    info!(
        "{} anatomical elements in {} and {}",
        first.n_elements(),
        paths.first.display(),
        paths.second.display()
    );

    on_stage(Stage::Combining);
    let e1 = first.vector_field(FIELD_KEY)?;
    let e2 = second.vector_field(FIELD_KEY)?;
    let envelope = max_envelope_field(e1.view(), e2.view())?;
    // A global direction wins over per-element normals stored with the fields.
    let directional = match (cfg.direction, first.vector_field(NORMAL_KEY)) {
        (Some(direction), _) => Some(directional_envelope_field_uniform(
            e1.view(),
            e2.view(),
            direction,
        )?),
        (None, Ok(normals)) => {
            info!("Directional envelope along per-element '{NORMAL_KEY}'");
            Some(directional_envelope_field(
                e1.view(),
                e2.view(),
                normals.view(),
            )?)
        }
        (None, Err(_)) => None,
    };

    on_stage(Stage::Saving);
    let envelope_file = naming.envelope_file(&cfg.out_dir, &subject);
    let mut output = first.geometry_only();
    output.add_scalar_field(ENVELOPE_KEY, envelope.clone())?;
    if let Some(dir_env) = &directional {
        output.add_scalar_field(DIRECTIONAL_KEY, dir_env.clone())?;
    }
    save_element_mesh(&envelope_file, &output)?;
    info!("Envelope written to {}", envelope_file.display());

    on_stage(Stage::Reporting);
    let mask = region_mask(first.tags.view(), &cfg.gm_tags);
    let report = focality(
        envelope.view(),
        mask.view(),
        cfg.threshold,
        first.volumes.as_ref().map(|v| v.view()),
    )?;
    if report.is_empty() {
        warn!(
            "No elements with gray-matter tags {:?}; focality reported as 0",
            cfg.gm_tags
        );
    }
    let summary = summarize(envelope.view(), mask.view())?;
    let directional_summary = match &directional {
        Some(dir_env) => summarize(dir_env.view(), mask.view())?,
        None => None,
    };

    let ti_report = TiReport {
        subject: subject.clone(),
        field_files: paths.to_array(),
        envelope_file,
        n_elements: first.n_elements(),
        gm_tags: cfg.gm_tags.clone(),
        focality: report,
        summary,
        directional_summary,
    };
    let report_file = naming.report_file(&cfg.out_dir, &subject);
    fs::write(&report_file, serde_json::to_string_pretty(&ti_report)?)?;
    info!("Report written to {}", report_file.display());

    Ok(ti_report)
}
