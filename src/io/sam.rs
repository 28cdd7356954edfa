/// SAM/BAM alignment input with noodles
///
/// Only what fusion evidence needs is kept per record: read name,
/// reference sequence name and the aligned genomic blocks.
use crate::error::Error;
use bstr::ByteSlice;
use noodles::bam;
use noodles::sam;
use noodles::sam::alignment::record::cigar::op::Kind;
use std::fs::File;
use std::path::Path;

/// Aligned read reduced to its genomic footprint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentRecord {
    pub name: String,
    /// `None` when the record is unmapped
    pub reference_name: Option<String>,
    /// Aligned blocks, 1-based inclusive, in reference order
    pub blocks: Vec<(u64, u64)>,
}

/// Split a CIGAR into gapless reference blocks
///
/// M/=/X extend the current block; D and N close it and advance the
/// reference; I, S, H and P do not move on the reference.
pub fn blocks_from_cigar(
    start: u64,
    ops: impl IntoIterator<Item = (Kind, usize)>,
) -> Vec<(u64, u64)> {
    let mut blocks = Vec::new();
    let mut pos = start;
    let mut block_start: Option<u64> = None;

    for (kind, len) in ops {
        let len = len as u64;
        match kind {
            Kind::Match | Kind::SequenceMatch | Kind::SequenceMismatch => {
                if len == 0 {
                    continue;
                }
                block_start.get_or_insert(pos);
                pos += len;
            }
            Kind::Deletion | Kind::Skip => {
                if let Some(s) = block_start.take() {
                    blocks.push((s, pos - 1));
                }
                pos += len;
            }
            Kind::Insertion | Kind::SoftClip | Kind::HardClip | Kind::Pad => {}
        }
    }

    if let Some(s) = block_start {
        blocks.push((s, pos - 1));
    }

    blocks
}

/// Decode any noodles alignment record into an `AlignmentRecord`
fn decode_record<R>(record: &R, header: &sam::Header) -> Result<AlignmentRecord, Error>
where
    R: sam::alignment::Record + ?Sized,
{
    let name = record
        .name()
        .map(|n| n.to_str_lossy().into_owned())
        .ok_or_else(|| Error::Alignment("record without read name".to_string()))?;

    let flags = record
        .flags()
        .map_err(|e| Error::Alignment(format!("{}: invalid flags: {}", name, e)))?;

    let reference_name = match record.reference_sequence_id(header) {
        Some(Ok(id)) => header
            .reference_sequences()
            .get_index(id)
            .map(|(ref_name, _)| ref_name.to_str_lossy().into_owned()),
        Some(Err(e)) => {
            return Err(Error::Alignment(format!(
                "{}: invalid reference sequence: {}",
                name, e
            )))
        }
        None => None,
    };

    let start = match record.alignment_start() {
        Some(Ok(p)) => Some(p.get() as u64),
        Some(Err(e)) => {
            return Err(Error::Alignment(format!(
                "{}: invalid alignment start: {}",
                name, e
            )))
        }
        None => None,
    };

    let blocks = match (flags.is_unmapped(), &reference_name, start) {
        (false, Some(_), Some(start)) => {
            let mut ops = Vec::new();
            for op in record.cigar().iter() {
                let op = op.map_err(|e| {
                    Error::Alignment(format!("{}: invalid CIGAR: {}", name, e))
                })?;
                ops.push((op.kind(), op.len()));
            }
            blocks_from_cigar(start, ops)
        }
        _ => Vec::new(),
    };

    Ok(AlignmentRecord {
        name,
        reference_name: reference_name.filter(|_| !flags.is_unmapped()),
        blocks,
    })
}

fn is_bam(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("bam"))
}

/// Stream every record of a SAM (plain/gzip/stdin) or BAM file to `f`
///
/// Records are delivered in file order. Returns the number of records read.
pub fn read_alignments<F>(path: &Path, mut f: F) -> Result<u64, Error>
where
    F: FnMut(AlignmentRecord) -> Result<(), Error>,
{
    let mut n_records = 0u64;

    if is_bam(path) {
        let file = File::open(path).map_err(|e| Error::io(e, path))?;
        let mut reader = bam::io::Reader::new(file);
        let header = reader.read_header().map_err(|e| Error::io(e, path))?;

        for result in reader.records() {
            let record = result.map_err(|e| Error::io(e, path))?;
            f(decode_record(&record, &header)?)?;
            n_records += 1;
        }
    } else {
        let mut reader = sam::io::Reader::new(crate::io::open_text(path)?);
        let header = reader.read_header().map_err(|e| Error::io(e, path))?;

        for result in reader.records() {
            let record = result.map_err(|e| Error::io(e, path))?;
            f(decode_record(&record, &header)?)?;
            n_records += 1;
        }
    }

    Ok(n_records)
}
