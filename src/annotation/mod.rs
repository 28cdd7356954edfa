/// Gene model annotation and genomic overlap queries
///
/// This module handles:
/// - GTF file parsing into exon/transcript/gene records
/// - One interval tree per chromosome keyed by gene span
/// - Mapping breakpoint coordinates to the closest exon boundary (`splice`)
mod gtf;
mod splice;

pub use gtf::{parse_gtf, GtfExon};
pub use splice::{ExonMatch, Orientation, Side};

use crate::error::Error;
use bio::data_structures::interval_tree::IntervalTree;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Genomic strand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Strand {
    Forward,
    Reverse,
}

impl Strand {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Self::Forward),
            '-' => Some(Self::Reverse),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Self::Forward => '+',
            Self::Reverse => '-',
        }
    }
}

impl std::fmt::Display for Strand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Gene identifier: annotation gene id plus optional human-readable name
///
/// Text form is `name^id` when a name is known, otherwise the bare id.
/// Ordering follows the text form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GeneId {
    name: Option<String>,
    id: String,
}

impl GeneId {
    pub fn new(id: &str, name: Option<&str>) -> Self {
        Self {
            name: name.map(str::to_string),
            id: id.to_string(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Name used in simple fusion names: gene name, or the id when unnamed.
    pub fn symbol(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

impl GeneId {
    fn text_bytes(&self) -> impl Iterator<Item = u8> + '_ {
        let prefix = self
            .name
            .as_deref()
            .map(|name| name.bytes().chain(std::iter::once(b'^')));
        prefix.into_iter().flatten().chain(self.id.bytes())
    }
}

impl Ord for GeneId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.text_bytes()
            .cmp(other.text_bytes())
            // `A^B` + `C` and `A` + `B^C` share a text form
            .then_with(|| (&self.name, &self.id).cmp(&(&other.name, &other.id)))
    }
}

impl PartialOrd for GeneId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for GeneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}^{}", name, self.id),
            None => write!(f, "{}", self.id),
        }
    }
}

/// Annotated exon (1-based inclusive, `left <= right` on either strand)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exon {
    pub chr: String,
    pub left: u64,
    pub right: u64,
    pub strand: Strand,
    pub gene: GeneId,
    pub transcript_id: String,
    /// First or last exon of its transcript in genomic order
    pub terminal: bool,
    /// 1-based position within the transcript in genomic order
    pub ordinal: usize,
    pub exon_count: usize,
}

impl Exon {
    pub fn contains(&self, coord: u64) -> bool {
        self.left <= coord && coord <= self.right
    }

    pub fn five_prime(&self) -> u64 {
        match self.strand {
            Strand::Forward => self.left,
            Strand::Reverse => self.right,
        }
    }

    pub fn three_prime(&self) -> u64 {
        match self.strand {
            Strand::Forward => self.right,
            Strand::Reverse => self.left,
        }
    }
}

/// Transcript with exons ordered by left end
#[derive(Debug, Clone)]
pub struct Transcript {
    pub id: String,
    pub exons: Vec<Exon>,
}

impl Transcript {
    fn from_exons(id: String, chr: &str, mut records: Vec<GtfExon>) -> Self {
        records.sort_by_key(|e| (e.start, e.end));
        let exon_count = records.len();

        let exons = records
            .into_iter()
            .enumerate()
            .map(|(i, r)| Exon {
                chr: chr.to_string(),
                left: r.start,
                right: r.end,
                strand: r.strand,
                gene: r.gene,
                transcript_id: r.transcript_id,
                terminal: i == 0 || i + 1 == exon_count,
                ordinal: i + 1,
                exon_count,
            })
            .collect();

        Self { id, exons }
    }

    /// Genomic span (min left, max right)
    pub fn span(&self) -> Option<(u64, u64)> {
        span_of(self.exons.iter())
    }

    pub fn spans(&self, coord: u64) -> bool {
        self.span()
            .is_some_and(|(left, right)| left <= coord && coord <= right)
    }
}

/// Gene on one chromosome
#[derive(Debug, Clone)]
pub struct Gene {
    pub id: GeneId,
    pub transcripts: BTreeMap<String, Transcript>,
}

impl Gene {
    /// Genomic span over all exons of all transcripts
    pub fn span(&self) -> Option<(u64, u64)> {
        span_of(self.transcripts.values().flat_map(|t| t.exons.iter()))
    }
}

fn span_of<'a>(exons: impl Iterator<Item = &'a Exon>) -> Option<(u64, u64)> {
    exons.fold(None, |acc, e| match acc {
        None => Some((e.left, e.right)),
        Some((l, r)) => Some((l.min(e.left), r.max(e.right))),
    })
}

/// Genes of one chromosome plus their span index
struct ChromosomeIndex {
    genes: BTreeMap<GeneId, Gene>,
    tree: IntervalTree<u64, GeneId>,
}

/// Read-only gene model index, one interval tree per chromosome
pub struct AnnotationIndex {
    chromosomes: HashMap<String, ChromosomeIndex>,
}

impl AnnotationIndex {
    /// Build the index from a GTF file
    pub fn from_gtf(gtf_path: &Path) -> Result<Self, Error> {
        log::info!("Loading GTF annotations from: {}", gtf_path.display());

        let exons = parse_gtf(gtf_path)?;
        log::debug!("Parsed {} exon features from GTF", exons.len());

        let index = Self::from_exons(exons);
        log::info!(
            "Indexed {} genes ({} transcripts) on {} chromosomes",
            index.num_genes(),
            index.num_transcripts(),
            index.num_chromosomes()
        );
        Ok(index)
    }

    /// Group exons chromosome -> gene -> transcript and index gene spans
    pub fn from_exons(exons: Vec<GtfExon>) -> Self {
        let mut grouped: HashMap<String, BTreeMap<GeneId, BTreeMap<String, Vec<GtfExon>>>> =
            HashMap::new();

        for exon in exons {
            grouped
                .entry(exon.seqname.clone())
                .or_default()
                .entry(exon.gene.clone())
                .or_default()
                .entry(exon.transcript_id.clone())
                .or_default()
                .push(exon);
        }

        let chromosomes = grouped
            .into_iter()
            .map(|(chr, genes)| {
                let genes: BTreeMap<GeneId, Gene> = genes
                    .into_iter()
                    .map(|(gene_id, transcripts)| {
                        let transcripts = transcripts
                            .into_iter()
                            .map(|(tid, records)| {
                                (tid.clone(), Transcript::from_exons(tid, &chr, records))
                            })
                            .collect();
                        let gene = Gene {
                            id: gene_id.clone(),
                            transcripts,
                        };
                        (gene_id, gene)
                    })
                    .collect();

                let mut tree = IntervalTree::new();
                for gene in genes.values() {
                    if let Some((left, right)) = gene.span() {
                        // half-open in the tree
                        tree.insert(left..right.saturating_add(1), gene.id.clone());
                    }
                }

                (chr, ChromosomeIndex { genes, tree })
            })
            .collect();

        Self { chromosomes }
    }

    /// All genes whose span overlaps `[left, right]` on `chr`, ordered by id.
    ///
    /// An unannotated chromosome yields no genes.
    pub fn genes_overlapping(&self, chr: &str, left: u64, right: u64) -> Vec<&Gene> {
        let Some(chrom) = self.chromosomes.get(chr) else {
            return Vec::new();
        };

        let mut genes: Vec<&Gene> = chrom
            .tree
            .find(left..right.max(left).saturating_add(1))
            .filter_map(|entry| chrom.genes.get(entry.data()))
            .collect();
        genes.sort_by(|a, b| a.id.cmp(&b.id));
        genes.dedup_by(|a, b| a.id == b.id);
        genes
    }

    pub fn gene(&self, chr: &str, id: &GeneId) -> Option<&Gene> {
        self.chromosomes.get(chr)?.genes.get(id)
    }

    pub fn has_chromosome(&self, chr: &str) -> bool {
        self.chromosomes.contains_key(chr)
    }

    pub fn num_chromosomes(&self) -> usize {
        self.chromosomes.len()
    }

    pub fn num_genes(&self) -> usize {
        self.chromosomes.values().map(|c| c.genes.len()).sum()
    }

    pub fn num_transcripts(&self) -> usize {
        self.chromosomes
            .values()
            .flat_map(|c| c.genes.values())
            .map(|g| g.transcripts.len())
            .sum()
    }

    pub fn num_exons(&self) -> usize {
        self.chromosomes
            .values()
            .flat_map(|c| c.genes.values())
            .flat_map(|g| g.transcripts.values())
            .map(|t| t.exons.len())
            .sum()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn exon(
        chr: &str,
        start: u64,
        end: u64,
        strand: Strand,
        gene: &GeneId,
        transcript: &str,
    ) -> GtfExon {
        GtfExon {
            seqname: chr.to_string(),
            start,
            end,
            strand,
            gene: gene.clone(),
            transcript_id: transcript.to_string(),
        }
    }

    #[test]
    fn test_gene_id_text_form() {
        assert_eq!(GeneId::new("ENSG1", Some("BCR")).to_string(), "BCR^ENSG1");
        assert_eq!(GeneId::new("ENSG1", None).to_string(), "ENSG1");
        assert_eq!(GeneId::new("ENSG1", None).symbol(), "ENSG1");
        assert_eq!(GeneId::new("ENSG1", Some("BCR")).symbol(), "BCR");
    }

    #[test]
    fn test_gene_id_orders_by_text_form() {
        let abl1 = GeneId::new("ENSG2", Some("ABL1"));
        let unnamed = GeneId::new("ENSG9", None);
        assert!(abl1 < unnamed);
        assert!(GeneId::new("ENSG1", None) < GeneId::new("ENSG1", Some("X")));

        // same text, different fields: ordered but not equal
        let a = GeneId::new("C", Some("A^B"));
        let b = GeneId::new("B^C", Some("A"));
        assert_eq!(a.to_string(), b.to_string());
        assert_ne!(a.cmp(&b), std::cmp::Ordering::Equal);
        assert_eq!(a.cmp(&b), b.cmp(&a).reverse());
    }

    #[test]
    fn test_gene_span_covers_all_transcripts() {
        let g = GeneId::new("G1", Some("GENE1"));
        let index = AnnotationIndex::from_exons(vec![
            exon("chr1", 500, 600, Strand::Forward, &g, "T1"),
            exon("chr1", 100, 200, Strand::Forward, &g, "T1"),
            exon("chr1", 300, 400, Strand::Forward, &g, "T2"),
            exon("chr1", 700, 900, Strand::Forward, &g, "T2"),
        ]);

        let gene = index.gene("chr1", &g).unwrap();
        assert_eq!(gene.span(), Some((100, 900)));
        assert_eq!(gene.transcripts["T1"].span(), Some((100, 600)));
        assert_eq!(index.num_genes(), 1);
        assert_eq!(index.num_transcripts(), 2);
        assert_eq!(index.num_exons(), 4);
    }

    #[test]
    fn test_transcript_exon_order_and_terminal_flags() {
        let g = GeneId::new("G1", None);
        let index = AnnotationIndex::from_exons(vec![
            exon("chr1", 500, 600, Strand::Reverse, &g, "T1"),
            exon("chr1", 100, 200, Strand::Reverse, &g, "T1"),
            exon("chr1", 300, 400, Strand::Reverse, &g, "T1"),
        ]);

        let t = &index.gene("chr1", &g).unwrap().transcripts["T1"];
        let lefts: Vec<u64> = t.exons.iter().map(|e| e.left).collect();
        assert_eq!(lefts, vec![100, 300, 500]);
        let terminal: Vec<bool> = t.exons.iter().map(|e| e.terminal).collect();
        assert_eq!(terminal, vec![true, false, true]);
        assert_eq!(t.exons[1].ordinal, 2);
        assert_eq!(t.exons[1].exon_count, 3);
        assert_eq!(t.exons[1].five_prime(), 400);
        assert_eq!(t.exons[1].three_prime(), 300);
    }

    #[test]
    fn test_same_gene_id_on_two_chromosomes() {
        let g = GeneId::new("PAR1", None);
        let index = AnnotationIndex::from_exons(vec![
            exon("chrX", 100, 200, Strand::Forward, &g, "T1"),
            exon("chrY", 1000, 2000, Strand::Forward, &g, "T1"),
        ]);

        assert_eq!(index.gene("chrX", &g).unwrap().span(), Some((100, 200)));
        assert_eq!(index.gene("chrY", &g).unwrap().span(), Some((1000, 2000)));
        assert_eq!(index.num_chromosomes(), 2);
    }

    #[test]
    fn test_overlap_queries() {
        let a = GeneId::new("A", None);
        let b = GeneId::new("B", None);
        let index = AnnotationIndex::from_exons(vec![
            exon("chr1", 100, 500, Strand::Forward, &a, "TA"),
            exon("chr1", 400, 900, Strand::Reverse, &b, "TB"),
        ]);

        let ids = |v: Vec<&Gene>| v.iter().map(|g| g.id.id().to_string()).collect::<Vec<_>>();
        assert_eq!(ids(index.genes_overlapping("chr1", 450, 450)), vec!["A", "B"]);
        assert_eq!(ids(index.genes_overlapping("chr1", 500, 500)), vec!["A", "B"]);
        assert_eq!(ids(index.genes_overlapping("chr1", 501, 600)), vec!["B"]);
        assert_eq!(ids(index.genes_overlapping("chr1", 99, 99)), Vec::<String>::new());
        assert_eq!(ids(index.genes_overlapping("chr1", 901, 1000)), Vec::<String>::new());
        assert!(index.genes_overlapping("chr2", 450, 450).is_empty());
        assert!(!index.has_chromosome("chr2"));
    }
}
