// Chimeric.out.junction reader and split-read evidence aggregation

use crate::annotation::{AnnotationIndex, ExonMatch, GeneId, Orientation, Side, Strand};
use crate::error::Error;
use crate::evidence::{Breakpoint, FusionName, ReadSet};
use crate::stats::RunStats;
use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use std::path::Path;

/// One record of STAR's Chimeric.out.junction file
///
/// Columns used (tab-separated, 0-based):
/// 0. Donor chromosome
/// 1. Donor breakpoint (first intronic base, 1-based)
/// 2. Donor strand (+/-)
/// 3. Acceptor chromosome
/// 4. Acceptor breakpoint (first intronic base, 1-based)
/// 5. Acceptor strand (+/-)
/// 9. Read name
///
/// Junction type, repeat lengths and segment CIGARs are carried along
/// untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChimericJunction<'l> {
    pub donor: Breakpoint,
    pub acceptor: Breakpoint,
    pub read_name: &'l str,
}

impl<'l> ChimericJunction<'l> {
    /// Header or comment line written by newer STAR versions
    pub fn is_header(line: &str) -> bool {
        line.starts_with('#') || line.starts_with("chr_donorA")
    }

    pub fn parse(line: &'l str) -> Result<Self, String> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 10 {
            return Err(format!(
                "chimeric junction line has {} fields, expected at least 10",
                fields.len()
            ));
        }

        Ok(Self {
            donor: parse_breakpoint(fields[0], fields[1], fields[2])?,
            acceptor: parse_breakpoint(fields[3], fields[4], fields[5])?,
            read_name: fields[9],
        })
    }

    /// Breakpoints moved from the first intronic base onto the exon base
    /// next to the junction: donor steps back against its strand, acceptor
    /// steps forward along it.
    pub fn splice_positions(&self) -> (Breakpoint, Breakpoint) {
        let mut donor = self.donor.clone();
        donor.coord = match donor.strand {
            Strand::Forward => donor.coord.saturating_sub(1),
            Strand::Reverse => donor.coord.saturating_add(1),
        };

        let mut acceptor = self.acceptor.clone();
        acceptor.coord = match acceptor.strand {
            Strand::Forward => acceptor.coord.saturating_add(1),
            Strand::Reverse => acceptor.coord.saturating_sub(1),
        };

        (donor, acceptor)
    }
}

fn parse_breakpoint(chr: &str, coord: &str, strand: &str) -> Result<Breakpoint, String> {
    let coord = coord
        .parse::<u64>()
        .map_err(|e| format!("Invalid breakpoint coordinate '{}': {}", coord, e))?;
    let strand = match strand {
        "+" => Strand::Forward,
        "-" => Strand::Reverse,
        other => return Err(format!("Invalid strand '{}'", other)),
    };
    Ok(Breakpoint {
        chr: chr.to_string(),
        coord,
        strand,
    })
}

/// One side of a fusion breakpoint
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BreakpointEnd {
    pub gene: GeneId,
    pub breakpoint: Breakpoint,
    /// Distance to the matched reference exon boundary
    pub delta: u64,
}

impl BreakpointEnd {
    fn from_match(breakpoint: &Breakpoint, m: &ExonMatch<'_>) -> Self {
        Self {
            gene: m.gene.clone(),
            breakpoint: breakpoint.clone(),
            delta: m.delta,
        }
    }
}

/// Directional fusion breakpoint (left = 5' partner)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BreakpointKey {
    pub left: BreakpointEnd,
    pub right: BreakpointEnd,
}

impl BreakpointKey {
    pub fn fusion_name(&self) -> FusionName {
        FusionName::new(self.left.gene.clone(), self.right.gene.clone())
    }

    /// Both ends sit exactly on annotated exon boundaries
    pub fn is_reference_splice(&self) -> bool {
        self.left.delta == 0 && self.right.delta == 0
    }
}

impl std::fmt::Display for BreakpointKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}|{}|{}|{}|{}|{}|{}",
            self.fusion_name().simple(),
            self.left.gene,
            self.left.breakpoint,
            self.left.delta,
            self.right.gene,
            self.right.breakpoint,
            self.right.delta
        )
    }
}

/// Junction reads for one breakpoint
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BreakpointSupport {
    /// Every supporting chimeric alignment
    pub count: u32,
    /// Distinct supporting read names
    pub reads: ReadSet,
}

/// Junction evidence per fusion, per breakpoint
#[derive(Debug, Default)]
pub struct JunctionSupport {
    fusions: BTreeMap<FusionName, BTreeMap<BreakpointKey, BreakpointSupport>>,
}

impl JunctionSupport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: BreakpointKey, read_name: &str) {
        let support = self
            .fusions
            .entry(key.fusion_name())
            .or_default()
            .entry(key)
            .or_default();
        support.count += 1;
        support.reads.insert(read_name);
    }

    pub fn iter(
        &self,
    ) -> impl Iterator<Item = (&FusionName, &BTreeMap<BreakpointKey, BreakpointSupport>)> {
        self.fusions.iter()
    }

    /// Number of fusions with junction support
    pub fn len(&self) -> usize {
        self.fusions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fusions.is_empty()
    }
}

/// Maps chimeric junction records onto gene pairs
pub struct JunctionMapper<'a> {
    index: &'a AnnotationIndex,
    support: JunctionSupport,
    /// Input rows with their breakpoint annotations appended
    audit: Vec<u8>,
}

impl<'a> JunctionMapper<'a> {
    pub fn new(index: &'a AnnotationIndex) -> Self {
        Self {
            index,
            support: JunctionSupport::new(),
            audit: Vec::new(),
        }
    }

    /// All fusion breakpoints a junction can be explained by
    ///
    /// Donor and acceptor matches must agree in orientation and hit
    /// different genes. Antisense pairs are mirrored so that `left` is
    /// always the 5' gene.
    pub fn pairings(&self, junction: &ChimericJunction<'_>) -> Vec<BreakpointKey> {
        let (donor, acceptor) = junction.splice_positions();

        let donor_matches =
            self.index
                .resolve_breakpoint(&donor.chr, donor.coord, donor.strand, Side::Donor);
        if donor_matches.is_empty() {
            return Vec::new();
        }
        let acceptor_matches = self.index.resolve_breakpoint(
            &acceptor.chr,
            acceptor.coord,
            acceptor.strand,
            Side::Acceptor,
        );

        let mut keys = Vec::new();
        for a in &donor_matches {
            for b in &acceptor_matches {
                if a.orientation != b.orientation || a.gene == b.gene {
                    continue;
                }

                let donor_end = BreakpointEnd::from_match(&donor, a);
                let acceptor_end = BreakpointEnd::from_match(&acceptor, b);
                let key = match a.orientation {
                    Orientation::Sense => BreakpointKey {
                        left: donor_end,
                        right: acceptor_end,
                    },
                    Orientation::Antisense => BreakpointKey {
                        left: acceptor_end,
                        right: donor_end,
                    },
                };
                keys.push(key);
            }
        }
        keys
    }

    /// Record one junction; returns the breakpoints it was credited to
    pub fn map_junction(&mut self, junction: &ChimericJunction<'_>) -> Vec<BreakpointKey> {
        let keys = self.pairings(junction);
        for key in &keys {
            self.support.add(key.clone(), junction.read_name);
        }
        keys
    }

    /// Map every record of a Chimeric.out.junction stream
    ///
    /// Each data line is echoed to `audit` with one extra column per
    /// accepted breakpoint.
    pub fn map_reader<R: BufRead, W: Write>(
        &mut self,
        reader: R,
        audit: &mut W,
        stats: &mut RunStats,
    ) -> Result<(), Error> {
        for (idx, line) in reader.lines().enumerate() {
            let line_num = idx + 1;
            let line = line
                .map_err(|e| Error::Junction(format!("Failed to read line {}: {}", line_num, e)))?;
            let line = line.trim_end_matches('\r');

            if line.trim().is_empty() || ChimericJunction::is_header(line) {
                continue;
            }

            let junction = ChimericJunction::parse(line)
                .map_err(|e| Error::Junction(format!("line {}: {}", line_num, e)))?;
            let keys = self.map_junction(&junction);
            stats.record_junction(keys.len());

            let mut row = line.to_string();
            for key in &keys {
                row.push('\t');
                row.push_str(&key.to_string());
            }
            writeln!(audit, "{}", row).map_err(|e| {
                Error::Junction(format!("Failed to write junction annotation: {}", e))
            })?;
        }

        Ok(())
    }

    /// Map a Chimeric.out.junction file
    ///
    /// The annotated copy is kept in memory until `write_audit`, so a
    /// failing input leaves no partial output behind.
    pub fn map_file(&mut self, path: &Path, stats: &mut RunStats) -> Result<(), Error> {
        log::info!("Mapping chimeric junctions from: {}", path.display());
        let reader = crate::io::open_text(path)?;

        let mut audit = Vec::new();
        self.map_reader(reader, &mut audit, stats)?;
        self.audit.extend(audit);

        log::info!(
            "Junction reads support {} candidate gene fusions",
            self.support.len()
        );
        Ok(())
    }

    /// Write the annotated junction rows collected by `map_file`
    pub fn write_audit(&self, output_path: &Path) -> Result<(), Error> {
        std::fs::write(output_path, &self.audit).map_err(|e| Error::io(e, output_path))
    }

    pub fn finish(self) -> JunctionSupport {
        self.support
    }
}
