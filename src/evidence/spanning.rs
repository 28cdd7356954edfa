// Discordant read-pair evidence
//
// Records of one read pair must arrive back to back. Genes hit by each
// mate are collected until the pair name changes, then every cross-mate
// gene combination credits the pair once.

use crate::annotation::{AnnotationIndex, GeneId};
use crate::error::Error;
use crate::evidence::{GenePair, ReadSet};
use crate::io::sam::AlignmentRecord;
use crate::stats::RunStats;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Split a read name into its pair name and mate number (1 or 2)
pub fn split_mate(read_name: &str) -> Result<(&str, usize), Error> {
    if let Some(pair) = read_name.strip_suffix("/1") {
        Ok((pair, 1))
    } else if let Some(pair) = read_name.strip_suffix("/2") {
        Ok((pair, 2))
    } else {
        Err(Error::MateMarker(read_name.to_string()))
    }
}

/// Read pairs supporting each gene pair
#[derive(Debug, Default)]
pub struct SpanSupport {
    pairs: BTreeMap<GenePair, ReadSet>,
}

impl SpanSupport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, pair: GenePair, read_pair_name: &str) {
        self.pairs.entry(pair).or_default().insert(read_pair_name);
    }

    pub fn reads(&self, pair: &GenePair) -> Option<&ReadSet> {
        self.pairs.get(pair)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// One `read_pair<TAB>gene_pair` row per association
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for (pair, reads) in &self.pairs {
            for name in reads.iter() {
                writeln!(writer, "{}\t{}", name, pair)?;
            }
        }
        Ok(())
    }

    pub fn write_output(&self, output_path: &Path) -> Result<(), Error> {
        let file = File::create(output_path).map_err(|e| Error::io(e, output_path))?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)
            .and_then(|_| writer.flush())
            .map_err(|e| Error::io(e, output_path))
    }
}

/// Genes hit by each mate of the read pair being collected
struct PairGenes<'a> {
    name: String,
    mates: [BTreeSet<&'a GeneId>; 2],
}

/// Builds `SpanSupport` from a name-grouped alignment stream
pub struct SpanningMapper<'a> {
    index: &'a AnnotationIndex,
    current: Option<PairGenes<'a>>,
    support: SpanSupport,
}

impl<'a> SpanningMapper<'a> {
    pub fn new(index: &'a AnnotationIndex) -> Self {
        Self {
            index,
            current: None,
            support: SpanSupport::new(),
        }
    }

    /// Add one alignment record
    ///
    /// A change of pair name completes the previous pair.
    pub fn push(&mut self, record: &AlignmentRecord, stats: &mut RunStats) -> Result<(), Error> {
        let (pair_name, mate) = split_mate(&record.name)?;

        if self.current.as_ref().map_or(true, |c| c.name != pair_name) {
            self.flush(stats);
            self.current = Some(PairGenes {
                name: pair_name.to_string(),
                mates: [BTreeSet::new(), BTreeSet::new()],
            });
        }

        let chr = match &record.reference_name {
            Some(chr) if self.index.has_chromosome(chr) => chr,
            _ => {
                log::debug!("Skipping {}: unmapped or unannotated", record.name);
                stats.record_alignment(true);
                return Ok(());
            }
        };
        stats.record_alignment(false);

        let index = self.index;
        if let Some(current) = self.current.as_mut() {
            for &(left, right) in record.blocks.iter().filter(|(l, r)| r >= l) {
                for gene in index.genes_overlapping(chr, left, right) {
                    current.mates[mate - 1].insert(&gene.id);
                }
            }
        }

        Ok(())
    }

    /// Credit the completed pair to every cross-mate gene pair
    fn flush(&mut self, stats: &mut RunStats) {
        let Some(pair) = self.current.take() else {
            return;
        };

        let mut tokens = BTreeSet::new();
        for &g1 in &pair.mates[0] {
            for &g2 in &pair.mates[1] {
                if g1 != g2 {
                    tokens.insert(GenePair::new(g1.clone(), g2.clone()));
                }
            }
        }

        stats.record_pair(!tokens.is_empty());
        for token in tokens {
            self.support.add(token, &pair.name);
        }
    }

    /// Map every record of an alignment file
    pub fn map_file(&mut self, path: &Path, stats: &mut RunStats) -> Result<(), Error> {
        log::info!("Mapping discordant read pairs from: {}", path.display());
        let n_records =
            crate::io::sam::read_alignments(path, |record| self.push(&record, stats))?;
        log::info!("Read {} alignment records", n_records);
        Ok(())
    }

    /// Complete the last pair and return the evidence
    pub fn finish(mut self, stats: &mut RunStats) -> SpanSupport {
        self.flush(stats);
        log::info!(
            "Spanning read pairs support {} gene pairs",
            self.support.len()
        );
        self.support
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::junction::tests::fusion_index;

    fn record(name: &str, chr: Option<&str>, blocks: &[(u64, u64)]) -> AlignmentRecord {
        AlignmentRecord {
            name: name.to_string(),
            reference_name: chr.map(str::to_string),
            blocks: blocks.to_vec(),
        }
    }

    fn gene_a() -> GeneId {
        GeneId::new("ENSG_A", Some("GeneA"))
    }

    fn gene_b() -> GeneId {
        GeneId::new("ENSG_B", Some("GeneB"))
    }

    fn gene_c() -> GeneId {
        GeneId::new("ENSG_C", Some("GeneC"))
    }

    #[test]
    fn test_split_mate() {
        assert_eq!(split_mate("HWI:1:2/1").unwrap(), ("HWI:1:2", 1));
        assert_eq!(split_mate("HWI:1:2/2").unwrap(), ("HWI:1:2", 2));
        assert!(matches!(split_mate("HWI:1:2"), Err(Error::MateMarker(_))));
        assert!(split_mate("HWI:1:2/3").is_err());
    }

    #[test]
    fn test_pair_spanning_two_genes() {
        let index = fusion_index();
        let mut stats = RunStats::new();
        let mut mapper = SpanningMapper::new(&index);

        mapper
            .push(&record("p1/1", Some("chr1"), &[(900, 949)]), &mut stats)
            .unwrap();
        mapper
            .push(&record("p1/2", Some("chr1"), &[(2100, 2149)]), &mut stats)
            .unwrap();
        let support = mapper.finish(&mut stats);

        let reads = support.reads(&GenePair::new(gene_a(), gene_b())).unwrap();
        assert_eq!(reads.iter().collect::<Vec<_>>(), vec!["p1"]);
        assert_eq!(stats.read_pairs, 1);
        assert_eq!(stats.read_pairs_spanning, 1);
    }

    #[test]
    fn test_pair_counted_once_per_gene_pair() {
        let index = fusion_index();
        let mut stats = RunStats::new();
        let mut mapper = SpanningMapper::new(&index);

        // several blocks per mate, mate order reversed
        mapper
            .push(
                &record("p1/2", Some("chr1"), &[(2100, 2149), (2700, 2720)]),
                &mut stats,
            )
            .unwrap();
        mapper
            .push(
                &record("p1/1", Some("chr1"), &[(600, 620), (1600, 1620)]),
                &mut stats,
            )
            .unwrap();
        let support = mapper.finish(&mut stats);

        assert_eq!(support.len(), 1);
        let reads = support.reads(&GenePair::new(gene_b(), gene_a())).unwrap();
        assert_eq!(reads.len(), 1);
    }

    #[test]
    fn test_same_gene_pairs_and_single_mates_ignored() {
        let index = fusion_index();
        let mut stats = RunStats::new();
        let mut mapper = SpanningMapper::new(&index);

        for rec in [
            record("p1/1", Some("chr1"), &[(600, 620)]),
            record("p1/2", Some("chr1"), &[(1600, 1620)]),
            record("p2/1", Some("chr1"), &[(600, 620)]),
            record("p2/2", None, &[]),
            record("p3/1", Some("chrUn"), &[(600, 620)]),
            record("p3/2", Some("chr2"), &[(5100, 5150)]),
        ] {
            mapper.push(&rec, &mut stats).unwrap();
        }
        let support = mapper.finish(&mut stats);

        assert!(support.is_empty());
        assert_eq!(stats.read_pairs, 3);
        assert_eq!(stats.read_pairs_spanning, 0);
        assert_eq!(stats.alignment_records_skipped, 2);
    }

    #[test]
    fn test_multiple_pairs_and_genes() {
        let index = fusion_index();
        let mut stats = RunStats::new();
        let mut mapper = SpanningMapper::new(&index);

        for rec in [
            record("p1/1", Some("chr1"), &[(900, 949)]),
            record("p1/2", Some("chr2"), &[(5100, 5150)]),
            record("p2/1", Some("chr1"), &[(900, 949)]),
            record("p2/2", Some("chr2"), &[(5900, 5950)]),
            record("p3/1", Some("chr1"), &[(2100, 2149)]),
            record("p3/2", Some("chr2"), &[(5100, 5150)]),
        ] {
            mapper.push(&rec, &mut stats).unwrap();
        }
        let support = mapper.finish(&mut stats);

        let ac = support.reads(&GenePair::new(gene_a(), gene_c())).unwrap();
        assert_eq!(ac.iter().collect::<Vec<_>>(), vec!["p1", "p2"]);
        let bc = support.reads(&GenePair::new(gene_b(), gene_c())).unwrap();
        assert_eq!(bc.iter().collect::<Vec<_>>(), vec!["p3"]);

        let mut out = Vec::new();
        support.write_to(&mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert_eq!(
            out,
            "p1\tGeneA^ENSG_A--GeneC^ENSG_C\n\
             p2\tGeneA^ENSG_A--GeneC^ENSG_C\n\
             p3\tGeneB^ENSG_B--GeneC^ENSG_C\n"
        );
    }

    #[test]
    fn test_missing_mate_marker_is_fatal() {
        let index = fusion_index();
        let mut stats = RunStats::new();
        let mut mapper = SpanningMapper::new(&index);
        let err = mapper
            .push(&record("p1", Some("chr1"), &[(900, 949)]), &mut stats)
            .unwrap_err();
        assert!(matches!(err, Error::MateMarker(_)));
    }
}
