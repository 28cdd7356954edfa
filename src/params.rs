use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::Parser;

// ---------------------------------------------------------------------------
// Tie-break policy
// ---------------------------------------------------------------------------

/// How to choose between fusion candidates that share one breakpoint and
/// have the same number of spanning fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TieBreak {
    /// Prefer the shorter simple fusion name (primary gene symbols over aliases).
    ShortestName,
    /// Prefer the lexically smallest simple fusion name.
    Lexical,
}

impl Default for TieBreak {
    fn default() -> Self {
        Self::ShortestName
    }
}

impl std::str::FromStr for TieBreak {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shortest-name" => Ok(Self::ShortestName),
            "lexical" => Ok(Self::Lexical),
            _ => Err(format!(
                "unknown tie_break '{s}'; expected 'shortest-name' or 'lexical'"
            )),
        }
    }
}

impl std::fmt::Display for TieBreak {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ShortestName => write!(f, "shortest-name"),
            Self::Lexical => write!(f, "lexical"),
        }
    }
}

// ---------------------------------------------------------------------------
// Output files
// ---------------------------------------------------------------------------

pub const JUNCTION_BREAKPOINTS_SUFFIX: &str = "junction_breakpts_to_genes.txt";
pub const DISCORDANT_SPANS_SUFFIX: &str = "discordant_spans_to_genes.txt";
pub const JUNCTION_READ_NAMES_SUFFIX: &str = "junction_read_names";
pub const SPANNING_READ_NAMES_SUFFIX: &str = "spanning_read_names";
pub const FUSION_CANDIDATES_SUFFIX: &str = "fusion_candidates.txt";

// ---------------------------------------------------------------------------
// Parameters struct
// ---------------------------------------------------------------------------

/// ruSTAR-Fusion command-line parameters, matching STAR-Fusion's argument names.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "ruSTAR-Fusion",
    about = "Fusion transcript detection from STAR chimeric junctions and discordant read pairs",
    version
)]
pub struct Parameters {
    // ── Inputs ──────────────────────────────────────────────────────────
    /// Chimeric.out.junction file produced by STAR (plain or .gz)
    #[arg(short = 'J', long = "chimeric_junction")]
    pub chimeric_junction: PathBuf,

    /// Chimeric alignments (SAM, SAM.gz or BAM); '-' reads SAM from stdin.
    /// Records of one read pair must be adjacent.
    #[arg(short = 'S', long = "chimeric_out_sam")]
    pub chimeric_out_sam: PathBuf,

    /// Reference gene annotation in GTF format (plain or .gz)
    #[arg(short = 'G', long = "ref_GTF")]
    pub ref_gtf: PathBuf,

    // ── Output ──────────────────────────────────────────────────────────
    /// Output file name prefix (including path)
    #[arg(short = 'O', long = "out_prefix", default_value = "STAR-Fusion")]
    pub out_prefix: PathBuf,

    // ── Breakpoint filtering ────────────────────────────────────────────
    /// Minimum junction reads for a breakpoint off the reference splice sites
    #[arg(long = "min_novel_junction_support", default_value_t = 10)]
    pub min_novel_junction_support: u32,

    /// Minimum support of an alternate breakpoint, as a percent of the dominant one
    #[arg(long = "min_alt_pct_junction", default_value_t = 10.0)]
    pub min_alt_pct_junction: f64,

    /// Tie-break among naming variants of one breakpoint: shortest-name or lexical
    #[arg(long = "tie_break", default_value = "shortest-name")]
    pub tie_break: TieBreak,
}

impl Parameters {
    /// Output path `<out_prefix>.<suffix>`.
    pub fn output_path(&self, suffix: &str) -> PathBuf {
        let mut name = OsString::from(self.out_prefix.as_os_str());
        name.push(".");
        name.push(suffix);
        PathBuf::from(name)
    }

    /// Validate parameter combinations that clap alone cannot enforce.
    ///
    /// Runs before any output file is created.
    pub fn validate(&self) -> Result<(), crate::error::Error> {
        for (flag, path) in [
            ("--chimeric_junction", &self.chimeric_junction),
            ("--chimeric_out_sam", &self.chimeric_out_sam),
            ("--ref_GTF", &self.ref_gtf),
        ] {
            if !is_stdin(path) && !path.is_file() {
                return Err(crate::error::Error::Parameter(format!(
                    "{flag}: cannot read input file {}",
                    path.display()
                )));
            }
        }

        if is_stdin(&self.chimeric_junction) || is_stdin(&self.ref_gtf) {
            return Err(crate::error::Error::Parameter(
                "only --chimeric_out_sam may be read from stdin".into(),
            ));
        }

        if !self.min_alt_pct_junction.is_finite()
            || !(0.0..=100.0).contains(&self.min_alt_pct_junction)
        {
            return Err(crate::error::Error::Parameter(format!(
                "--min_alt_pct_junction must be within 0..=100, got {}",
                self.min_alt_pct_junction
            )));
        }

        if self.out_prefix.as_os_str().is_empty() {
            return Err(crate::error::Error::Parameter(
                "--out_prefix must not be empty".into(),
            ));
        }

        Ok(())
    }
}

/// `-` stands for standard input.
pub fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == "-"
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    /// Helper: parse a STAR-Fusion-style command line (without program name).
    fn parse(args: &[&str]) -> Parameters {
        let mut full = vec!["ruSTAR-Fusion"];
        full.extend_from_slice(args);
        Parameters::parse_from(full)
    }

    const REQUIRED: [&str; 6] = [
        "-J",
        "Chimeric.out.junction",
        "-S",
        "Chimeric.out.sam",
        "-G",
        "genes.gtf",
    ];

    #[test]
    fn defaults() {
        let p = parse(&REQUIRED);
        assert_eq!(p.chimeric_junction, PathBuf::from("Chimeric.out.junction"));
        assert_eq!(p.chimeric_out_sam, PathBuf::from("Chimeric.out.sam"));
        assert_eq!(p.ref_gtf, PathBuf::from("genes.gtf"));
        assert_eq!(p.out_prefix, PathBuf::from("STAR-Fusion"));
        assert_eq!(p.min_novel_junction_support, 10);
        assert!((p.min_alt_pct_junction - 10.0).abs() < f64::EPSILON);
        assert_eq!(p.tie_break, TieBreak::ShortestName);
    }

    #[test]
    fn long_names_and_overrides() {
        let p = parse(&[
            "--chimeric_junction",
            "cj.gz",
            "--chimeric_out_sam",
            "-",
            "--ref_GTF",
            "gencode.gtf.gz",
            "--out_prefix",
            "/out/sample1",
            "--min_novel_junction_support",
            "3",
            "--min_alt_pct_junction",
            "25.5",
            "--tie_break",
            "lexical",
        ]);
        assert_eq!(p.chimeric_junction, PathBuf::from("cj.gz"));
        assert!(is_stdin(&p.chimeric_out_sam));
        assert_eq!(p.min_novel_junction_support, 3);
        assert!((p.min_alt_pct_junction - 25.5).abs() < f64::EPSILON);
        assert_eq!(p.tie_break, TieBreak::Lexical);
    }

    #[test]
    fn output_path_appends_suffix() {
        let mut args = REQUIRED.to_vec();
        args.extend_from_slice(&["-O", "/out/sample1"]);
        let p = parse(&args);
        assert_eq!(
            p.output_path(FUSION_CANDIDATES_SUFFIX),
            PathBuf::from("/out/sample1.fusion_candidates.txt")
        );
    }

    #[test]
    fn unknown_tie_break_rejected() {
        let mut full = vec!["ruSTAR-Fusion"];
        full.extend_from_slice(&REQUIRED);
        full.extend_from_slice(&["--tie_break", "longest"]);
        assert!(Parameters::try_parse_from(full).is_err());
    }

    #[test]
    fn validate_missing_input() {
        let p = parse(&REQUIRED);
        let err = p.validate().unwrap_err();
        assert!(err.to_string().contains("--chimeric_junction"));
    }

    #[test]
    fn validate_alt_pct_range() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_str().unwrap();
        let p = parse(&[
            "-J",
            path,
            "-S",
            path,
            "-G",
            path,
            "--min_alt_pct_junction",
            "150",
        ]);
        let err = p.validate().unwrap_err();
        assert!(err.to_string().contains("min_alt_pct_junction"));

        let p = parse(&["-J", path, "-S", "-", "-G", path]);
        assert!(p.validate().is_ok());
    }
}
