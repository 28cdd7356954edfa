/// Run statistics tracking and reporting
use crate::annotation::AnnotationIndex;
use crate::fusion::Resolution;
use log::info;

/// Tracks record and evidence counts for a fusion detection run
#[derive(Default, Debug)]
pub struct RunStats {
    /// Exons, transcripts, genes and chromosomes in the annotation
    pub exons: usize,
    pub transcripts: usize,
    pub genes: usize,
    pub chromosomes: usize,
    /// Chimeric junction records read
    pub junction_records: u64,
    /// Junction records with at least one accepted gene pairing
    pub junction_records_mapped: u64,
    /// Accepted (record, gene pairing) combinations
    pub junction_pairings: u64,
    /// Alignment records read
    pub alignment_records: u64,
    /// Alignment records that were unmapped or on an unannotated chromosome
    pub alignment_records_skipped: u64,
    /// Read pairs completed
    pub read_pairs: u64,
    /// Read pairs contributing to at least one gene pair
    pub read_pairs_spanning: u64,
    /// Breakpoints passing the support filters
    pub breakpoints_retained: usize,
    /// Final fusion predictions
    pub fusion_candidates: usize,
}

impl RunStats {
    /// Create new statistics tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the size of the loaded annotation
    pub fn record_annotation(&mut self, index: &AnnotationIndex) {
        self.exons = index.num_exons();
        self.transcripts = index.num_transcripts();
        self.genes = index.num_genes();
        self.chromosomes = index.num_chromosomes();
    }

    /// Record one chimeric junction record and its accepted pairings
    pub fn record_junction(&mut self, n_pairings: usize) {
        self.junction_records += 1;
        if n_pairings > 0 {
            self.junction_records_mapped += 1;
            self.junction_pairings += n_pairings as u64;
        }
    }

    /// Record one alignment record
    pub fn record_alignment(&mut self, skipped: bool) {
        self.alignment_records += 1;
        if skipped {
            self.alignment_records_skipped += 1;
        }
    }

    /// Record one completed read pair
    pub fn record_pair(&mut self, spanning: bool) {
        self.read_pairs += 1;
        if spanning {
            self.read_pairs_spanning += 1;
        }
    }

    /// Record the outcome of fusion resolution
    pub fn record_resolution(&mut self, resolution: &Resolution) {
        self.breakpoints_retained = resolution.retained.len();
        self.fusion_candidates = resolution.predictions.len();
    }

    /// Print summary statistics to log
    pub fn print_summary(&self) {
        info!("=== Fusion Detection Summary ===");
        info!(
            "Annotation: {} exons, {} transcripts, {} genes on {} chromosomes",
            self.exons, self.transcripts, self.genes, self.chromosomes
        );

        if self.junction_records == 0 {
            info!("No chimeric junction records processed");
        } else {
            info!("Chimeric junction records: {}", self.junction_records);
            info!(
                "Junction records mapped to gene pairs: {} ({:.2}%), {} pairings",
                self.junction_records_mapped,
                100.0 * self.junction_records_mapped as f64 / self.junction_records as f64,
                self.junction_pairings
            );
        }

        info!(
            "Alignment records: {} ({} unmapped or unannotated)",
            self.alignment_records, self.alignment_records_skipped
        );
        if self.read_pairs > 0 {
            info!(
                "Read pairs: {}, spanning two genes: {} ({:.2}%)",
                self.read_pairs,
                self.read_pairs_spanning,
                100.0 * self.read_pairs_spanning as f64 / self.read_pairs as f64
            );
        }

        info!("Breakpoints retained: {}", self.breakpoints_retained);
        info!("Fusion candidates: {}", self.fusion_candidates);
    }
}
