// Fusion prediction from junction and spanning evidence
//
// Per fusion, breakpoints are ranked by junction support and filtered
// against the dominant breakpoint. Naming variants that share the same
// physical breakpoint are then collapsed to one prediction.

mod output;

pub use output::{write_fusion_candidates, write_junction_read_names, write_spanning_read_names};

use crate::evidence::{
    Breakpoint, BreakpointKey, BreakpointSupport, FusionName, JunctionSupport, ReadSet,
    SpanSupport,
};
use crate::params::{Parameters, TieBreak};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// One fusion call at one breakpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FusionCandidate {
    pub fusion: FusionName,
    pub breakpoint: BreakpointKey,
    pub junction_reads: u32,
    /// Distinct junction read names
    pub junction_read_names: ReadSet,
    /// Spanning read pairs not also seen as junction reads
    pub spanning_reads: ReadSet,
}

impl FusionCandidate {
    pub fn simple_name(&self) -> String {
        self.fusion.simple()
    }

    pub fn complex_name(&self) -> String {
        self.fusion.complex()
    }

    pub fn spanning_frags(&self) -> usize {
        self.spanning_reads.len()
    }

    /// Physical breakpoint shared by naming variants
    fn coordinates(&self) -> (Breakpoint, Breakpoint) {
        (
            self.breakpoint.left.breakpoint.clone(),
            self.breakpoint.right.breakpoint.clone(),
        )
    }
}

/// Outcome of fusion resolution
#[derive(Debug, Default)]
pub struct Resolution {
    /// Every breakpoint passing the support filters
    pub retained: Vec<FusionCandidate>,
    /// One prediction per physical breakpoint, best supported first
    pub predictions: Vec<FusionCandidate>,
}

/// Breakpoint filtering and prediction selection
#[derive(Debug, Clone)]
pub struct FusionResolver {
    pub min_novel_junction_support: u32,
    pub min_alt_pct_junction: f64,
    pub tie_break: TieBreak,
}

impl FusionResolver {
    pub fn new(min_novel_junction_support: u32, min_alt_pct_junction: f64) -> Self {
        Self {
            min_novel_junction_support,
            min_alt_pct_junction,
            tie_break: TieBreak::default(),
        }
    }

    pub fn from_params(params: &Parameters) -> Self {
        Self {
            min_novel_junction_support: params.min_novel_junction_support,
            min_alt_pct_junction: params.min_alt_pct_junction,
            tie_break: params.tie_break,
        }
    }

    /// Breakpoints of one fusion that pass the support filters, by decreasing count
    ///
    /// A breakpoint on reference splice sites needs no minimum support;
    /// a novel one needs `min_novel_junction_support` reads. Every passing
    /// breakpoint after the first must also reach `min_alt_pct_junction`
    /// percent of the first one's count.
    pub fn retain_breakpoints<'s>(
        &self,
        breakpoints: &'s BTreeMap<BreakpointKey, BreakpointSupport>,
    ) -> Vec<(&'s BreakpointKey, &'s BreakpointSupport)> {
        let mut ranked: Vec<_> = breakpoints.iter().collect();
        // stable: equal counts stay in key order
        ranked.sort_by(|a, b| b.1.count.cmp(&a.1.count));

        let mut top_support: Option<u32> = None;
        let mut retained = Vec::new();

        for (key, support) in ranked {
            if !key.is_reference_splice() && support.count < self.min_novel_junction_support {
                continue;
            }

            match top_support {
                None => top_support = Some(support.count),
                Some(top) => {
                    let pct = support.count as f64 / top as f64 * 100.0;
                    if pct < self.min_alt_pct_junction {
                        continue;
                    }
                }
            }

            retained.push((key, support));
        }

        retained
    }

    /// Combine junction and spanning evidence into fusion predictions
    pub fn resolve(&self, junctions: &JunctionSupport, spans: &SpanSupport) -> Resolution {
        let mut retained = Vec::new();

        for (fusion, breakpoints) in junctions.iter() {
            let spanning = spans.reads(&fusion.gene_pair());

            for (key, support) in self.retain_breakpoints(breakpoints) {
                let spanning_reads = spanning
                    .map(|s| s.without(&support.reads))
                    .unwrap_or_default();

                retained.push(FusionCandidate {
                    fusion: fusion.clone(),
                    breakpoint: key.clone(),
                    junction_reads: support.count,
                    junction_read_names: support.reads.clone(),
                    spanning_reads,
                });
            }
        }

        let mut by_coordinates: BTreeMap<(Breakpoint, Breakpoint), Vec<&FusionCandidate>> =
            BTreeMap::new();
        for candidate in &retained {
            by_coordinates
                .entry(candidate.coordinates())
                .or_default()
                .push(candidate);
        }

        let mut predictions: Vec<FusionCandidate> = by_coordinates
            .into_values()
            .filter_map(|group| self.select(group).cloned())
            .collect();
        predictions.sort_by(|a, b| {
            b.junction_reads
                .cmp(&a.junction_reads)
                .then_with(|| b.spanning_frags().cmp(&a.spanning_frags()))
                .then_with(|| a.simple_name().cmp(&b.simple_name()))
                .then_with(|| a.breakpoint.cmp(&b.breakpoint))
        });

        log::info!(
            "Retained {} breakpoints, {} fusion predictions",
            retained.len(),
            predictions.len()
        );

        Resolution {
            retained,
            predictions,
        }
    }

    /// Pick the prediction among candidates sharing one breakpoint
    ///
    /// Most spanning fragments wins; ties go to the tie-break policy.
    pub fn select<'c>(&self, group: Vec<&'c FusionCandidate>) -> Option<&'c FusionCandidate> {
        group.into_iter().min_by(|a, b| {
            b.spanning_frags()
                .cmp(&a.spanning_frags())
                .then_with(|| self.tie_break_order(a, b))
        })
    }

    fn tie_break_order(&self, a: &FusionCandidate, b: &FusionCandidate) -> Ordering {
        let (a_name, b_name) = (a.simple_name(), b.simple_name());
        match self.tie_break {
            TieBreak::ShortestName => a_name
                .len()
                .cmp(&b_name.len())
                .then_with(|| a_name.cmp(&b_name)),
            TieBreak::Lexical => a_name.cmp(&b_name),
        }
        .then_with(|| a.breakpoint.cmp(&b.breakpoint))
    }
}
