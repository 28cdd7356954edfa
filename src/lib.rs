#![allow(non_snake_case)]

pub mod annotation;
pub mod error;
pub mod evidence;
pub mod fusion;
pub mod io;
pub mod params;
pub mod stats;

use log::info;

use crate::annotation::AnnotationIndex;
use crate::evidence::{JunctionMapper, SpanningMapper};
use crate::fusion::FusionResolver;
use crate::params::{
    Parameters, DISCORDANT_SPANS_SUFFIX, FUSION_CANDIDATES_SUFFIX, JUNCTION_BREAKPOINTS_SUFFIX,
    JUNCTION_READ_NAMES_SUFFIX, SPANNING_READ_NAMES_SUFFIX,
};
use crate::stats::RunStats;

/// Top-level pipeline. Called from `main()` after CLI parsing.
///
/// Phases run in order: annotation index, junction evidence, spanning
/// evidence, fusion resolution.
pub fn run(params: &Parameters) -> anyhow::Result<()> {
    params.validate()?;

    info!("ruSTAR-Fusion v{}", env!("CARGO_PKG_VERSION"));
    info!("chimeric_junction: {}", params.chimeric_junction.display());
    info!("chimeric_out_sam: {}", params.chimeric_out_sam.display());
    info!("ref_GTF: {}", params.ref_gtf.display());
    info!("out_prefix: {}", params.out_prefix.display());
    info!(
        "min_novel_junction_support: {}, min_alt_pct_junction: {}, tie_break: {}",
        params.min_novel_junction_support, params.min_alt_pct_junction, params.tie_break
    );

    let mut stats = RunStats::new();

    let index = AnnotationIndex::from_gtf(&params.ref_gtf)?;
    stats.record_annotation(&index);

    // every input is read before the first output file is created
    let mut junction_mapper = JunctionMapper::new(&index);
    junction_mapper.map_file(&params.chimeric_junction, &mut stats)?;

    let mut spanning_mapper = SpanningMapper::new(&index);
    spanning_mapper.map_file(&params.chimeric_out_sam, &mut stats)?;
    let spans = spanning_mapper.finish(&mut stats);

    junction_mapper.write_audit(&params.output_path(JUNCTION_BREAKPOINTS_SUFFIX))?;
    let junctions = junction_mapper.finish();
    spans.write_output(&params.output_path(DISCORDANT_SPANS_SUFFIX))?;

    info!("Resolving fusion candidates...");
    let resolution = FusionResolver::from_params(params).resolve(&junctions, &spans);
    stats.record_resolution(&resolution);

    fusion::write_junction_read_names(
        &params.output_path(JUNCTION_READ_NAMES_SUFFIX),
        &resolution.retained,
    )?;
    fusion::write_spanning_read_names(
        &params.output_path(SPANNING_READ_NAMES_SUFFIX),
        &resolution.retained,
    )?;

    let candidates_path = params.output_path(FUSION_CANDIDATES_SUFFIX);
    fusion::write_fusion_candidates(&candidates_path, &resolution.predictions)?;
    info!("Wrote fusion candidates to {}", candidates_path.display());

    stats.print_summary();
    Ok(())
}
