// Breakpoint to exon-boundary resolution
//
// A fusion breakpoint is matched, per overlapping gene, to the exon
// boundary a splice donor (left side) or acceptor (right side) would use.
// Which physical end that is depends on whether the read strand agrees
// with the gene (sense) or opposes it (antisense).

use crate::annotation::{AnnotationIndex, Exon, GeneId, Strand};

/// Which side of a fusion junction a breakpoint sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Upstream partner; the junction leaves its exon at the 3' end
    Donor,
    /// Downstream partner; the junction enters its exon at the 5' end
    Acceptor,
}

/// Query strand relative to the matched exon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Orientation {
    Sense,
    Antisense,
}

/// Closest exon boundary of one gene for a breakpoint query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExonMatch<'a> {
    /// Distance between the query coordinate and `boundary`
    pub delta: u64,
    pub exon: &'a Exon,
    pub gene: &'a GeneId,
    pub orientation: Orientation,
    pub coord: u64,
    pub boundary: u64,
}

impl ExonMatch<'_> {
    /// Matched exon is the first or last of its transcript
    pub fn is_terminal(&self) -> bool {
        self.exon.terminal
    }
}

/// Exon boundary a junction on `side` uses, given the read orientation
fn boundary_for(exon: &Exon, orientation: Orientation, side: Side) -> u64 {
    match (orientation, side) {
        (Orientation::Sense, Side::Donor) | (Orientation::Antisense, Side::Acceptor) => {
            exon.three_prime()
        }
        (Orientation::Sense, Side::Acceptor) | (Orientation::Antisense, Side::Donor) => {
            exon.five_prime()
        }
    }
}

impl AnnotationIndex {
    /// Map a breakpoint to the nearest exon boundary of every gene it falls in
    ///
    /// Returns at most one match per gene (the minimum delta, first in
    /// genomic exon order on ties), ordered by gene id. Transcripts whose
    /// span does not contain `coord` are ignored.
    pub fn resolve_breakpoint(
        &self,
        chr: &str,
        coord: u64,
        strand: Strand,
        side: Side,
    ) -> Vec<ExonMatch<'_>> {
        let mut matches = Vec::new();

        for gene in self.genes_overlapping(chr, coord.saturating_sub(1), coord.saturating_add(1)) {
            let mut best: Option<ExonMatch<'_>> = None;

            for transcript in gene.transcripts.values() {
                if !transcript.spans(coord) {
                    continue;
                }

                for exon in transcript.exons.iter().filter(|e| e.contains(coord)) {
                    let orientation = if exon.strand == strand {
                        Orientation::Sense
                    } else {
                        Orientation::Antisense
                    };
                    let boundary = boundary_for(exon, orientation, side);
                    let delta = coord.abs_diff(boundary);

                    if best.as_ref().map_or(true, |b| delta < b.delta) {
                        best = Some(ExonMatch {
                            delta,
                            exon,
                            gene: &gene.id,
                            orientation,
                            coord,
                            boundary,
                        });
                    }
                }
            }

            matches.extend(best);
        }

        matches
    }
}
