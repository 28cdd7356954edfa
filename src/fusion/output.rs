// Fusion result writers

use crate::error::Error;
use crate::fusion::FusionCandidate;
use crate::evidence::ReadSet;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

const CANDIDATES_HEADER: &str = "#fusion_name\tJunctionReads\tSpanningFrags\tLeftGene\t\
LeftBreakpoint\tLeftDistFromRefExonSplice\tRightGene\tRightBreakpoint\tRightDistFromRefExonSplice";

/// Create `path` and hand a buffered writer to `write`
fn write_file<F>(path: &Path, write: F) -> Result<(), Error>
where
    F: FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
{
    let file = File::create(path).map_err(|e| Error::io(e, path))?;
    let mut writer = BufWriter::new(file);
    write(&mut writer)
        .and_then(|_| writer.flush())
        .map_err(|e| Error::io(e, path))
}

/// Final predictions, one row each
///
/// Columns:
/// 1. Simple fusion name
/// 2. Junction reads
/// 3. Spanning fragments (net of junction reads)
/// 4. Left gene (`name^id`)
/// 5. Left breakpoint (`chr:coord:strand`)
/// 6. Left distance from the reference exon boundary
/// 7-9. Same for the right gene
pub fn write_fusion_candidates_to<W: Write>(
    writer: &mut W,
    predictions: &[FusionCandidate],
) -> std::io::Result<()> {
    writeln!(writer, "{}", CANDIDATES_HEADER)?;
    for candidate in predictions {
        let (left, right) = (&candidate.breakpoint.left, &candidate.breakpoint.right);
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            candidate.simple_name(),
            candidate.junction_reads,
            candidate.spanning_frags(),
            left.gene,
            left.breakpoint,
            left.delta,
            right.gene,
            right.breakpoint,
            right.delta,
        )?;
    }
    Ok(())
}

pub fn write_fusion_candidates(path: &Path, predictions: &[FusionCandidate]) -> Result<(), Error> {
    write_file(path, |w| write_fusion_candidates_to(w, predictions))
}

/// `complex_name<TAB>breakpoint<TAB>read` for every retained breakpoint
pub fn write_junction_read_names_to<W: Write>(
    writer: &mut W,
    retained: &[FusionCandidate],
) -> std::io::Result<()> {
    for candidate in retained {
        let complex = candidate.complex_name();
        for read in candidate.junction_read_names.iter() {
            writeln!(writer, "{}\t{}\t{}", complex, candidate.breakpoint, read)?;
        }
    }
    Ok(())
}

pub fn write_junction_read_names(path: &Path, retained: &[FusionCandidate]) -> Result<(), Error> {
    write_file(path, |w| write_junction_read_names_to(w, retained))
}

/// `complex_name<TAB>read`, net spanning reads merged over a fusion's breakpoints
pub fn write_spanning_read_names_to<W: Write>(
    writer: &mut W,
    retained: &[FusionCandidate],
) -> std::io::Result<()> {
    let mut by_fusion: BTreeMap<String, ReadSet> = BTreeMap::new();
    for candidate in retained {
        let reads = by_fusion.entry(candidate.complex_name()).or_default();
        for read in candidate.spanning_reads.iter() {
            reads.insert(read);
        }
    }

    for (complex, reads) in &by_fusion {
        for read in reads.iter() {
            writeln!(writer, "{}\t{}", complex, read)?;
        }
    }
    Ok(())
}

pub fn write_spanning_read_names(path: &Path, retained: &[FusionCandidate]) -> Result<(), Error> {
    write_file(path, |w| write_spanning_read_names_to(w, retained))
}
