// Read-level fusion evidence
//
// Two independent evidence streams are aggregated here:
// - junction: chimeric split reads from STAR's Chimeric.out.junction
// - spanning: discordant read pairs from the chimeric alignments
//
// Both are keyed by gene pairs and count distinct read names.

mod junction;
mod spanning;

pub use junction::{
    BreakpointEnd, BreakpointKey, BreakpointSupport, ChimericJunction, JunctionMapper,
    JunctionSupport,
};
pub use spanning::{split_mate, SpanSupport, SpanningMapper};

use crate::annotation::{GeneId, Strand};
use std::collections::BTreeSet;

/// Distinct read names supporting one piece of evidence
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadSet(BTreeSet<String>);

impl ReadSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a read name; false if it was already present
    pub fn insert(&mut self, name: &str) -> bool {
        if self.0.contains(name) {
            return false;
        }
        self.0.insert(name.to_string())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Names in `self` that are not in `other`
    pub fn without(&self, other: &ReadSet) -> ReadSet {
        ReadSet(self.0.difference(&other.0).cloned().collect())
    }
}

impl<'a> FromIterator<&'a str> for ReadSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        ReadSet(iter.into_iter().map(str::to_string).collect())
    }
}

/// Genomic breakpoint position, rendered as `chr:coord:strand`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Breakpoint {
    pub chr: String,
    pub coord: u64,
    pub strand: Strand,
}

impl std::fmt::Display for Breakpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.chr, self.coord, self.strand)
    }
}

/// Unordered gene pair, stored lexically sorted
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GenePair {
    first: GeneId,
    second: GeneId,
}

impl GenePair {
    pub fn new(a: GeneId, b: GeneId) -> Self {
        if a <= b {
            Self { first: a, second: b }
        } else {
            Self { first: b, second: a }
        }
    }
}

impl std::fmt::Display for GenePair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}--{}", self.first, self.second)
    }
}

/// Directional fusion partners (left = 5' partner)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FusionName {
    pub left: GeneId,
    pub right: GeneId,
}

impl FusionName {
    pub fn new(left: GeneId, right: GeneId) -> Self {
        Self { left, right }
    }

    /// Gene symbols only, e.g. `BCR--ABL1`
    pub fn simple(&self) -> String {
        format!("{}--{}", self.left.symbol(), self.right.symbol())
    }

    /// Full identifiers, e.g. `BCR^ENSG1--ABL1^ENSG2`
    pub fn complex(&self) -> String {
        self.to_string()
    }

    pub fn gene_pair(&self) -> GenePair {
        GenePair::new(self.left.clone(), self.right.clone())
    }
}

impl std::fmt::Display for FusionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}--{}", self.left, self.right)
    }
}
