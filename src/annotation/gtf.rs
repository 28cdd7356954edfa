/// Exon records from a GTF gene model
///
/// Columns read: seqname, feature, start and end (1-based inclusive),
/// strand and the attribute column, where `gene_id`, `transcript_id`
/// and the optional `gene_name` are looked up.
use crate::annotation::{GeneId, Strand};
use crate::error::Error;
use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

/// One exon line of a GTF file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GtfExon {
    pub seqname: String,
    pub start: u64,
    pub end: u64,
    pub strand: Strand,
    pub gene: GeneId,
    pub transcript_id: String,
}

/// Parse a GTF file and extract exon features
///
/// Lines whose feature is not "exon" are skipped. An exon without
/// `gene_id` or `transcript_id` makes the whole annotation unusable.
pub fn parse_gtf(path: &Path) -> Result<Vec<GtfExon>, Error> {
    let reader = crate::io::open_text(path)?;
    parse_gtf_reader(reader)
}

pub(crate) fn parse_gtf_reader<R: BufRead>(reader: R) -> Result<Vec<GtfExon>, Error> {
    let mut exons = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line_num = idx + 1;
        let line =
            line.map_err(|e| Error::Gtf(format!("Failed to read line {}: {}", line_num, e)))?;

        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(exon) = parse_gtf_line(line)
            .map_err(|e| Error::Gtf(format!("line {}: {}", line_num, e)))?
        {
            exons.push(exon);
        }
    }

    Ok(exons)
}

/// Parse a single GTF line; `None` for non-exon features
fn parse_gtf_line(line: &str) -> Result<Option<GtfExon>, String> {
    let fields: Vec<&str> = line.split('\t').collect();

    if fields.len() >= 3 && fields[2] != "exon" {
        return Ok(None);
    }

    if fields.len() < 9 {
        return Err(format!("GTF line has {} fields, expected 9", fields.len()));
    }

    let start = fields[3]
        .parse::<u64>()
        .map_err(|e| format!("Invalid start position '{}': {}", fields[3], e))?;
    let end = fields[4]
        .parse::<u64>()
        .map_err(|e| format!("Invalid end position '{}': {}", fields[4], e))?;
    let Some(strand) = fields[6].chars().next().and_then(Strand::from_char) else {
        log::warn!(
            "Skipping exon at {}:{}-{} with unknown strand '{}'",
            fields[0],
            fields[3],
            fields[4],
            fields[6]
        );
        return Ok(None);
    };

    let attributes = parse_attributes(fields[8]);

    let gene_id = attributes
        .get("gene_id")
        .filter(|v| !v.is_empty())
        .ok_or_else(|| "exon missing gene_id attribute".to_string())?;
    let transcript_id = attributes
        .get("transcript_id")
        .filter(|v| !v.is_empty())
        .ok_or_else(|| "exon missing transcript_id attribute".to_string())?;
    let gene_name = attributes.get("gene_name").filter(|v| !v.is_empty());

    let (start, end) = if start <= end {
        (start, end)
    } else {
        log::warn!(
            "Exon of {} has start {} > end {}; swapping",
            transcript_id,
            start,
            end
        );
        (end, start)
    };

    Ok(Some(GtfExon {
        seqname: fields[0].to_string(),
        start,
        end,
        strand,
        gene: GeneId::new(gene_id.as_str(), gene_name.map(String::as_str)),
        transcript_id: transcript_id.clone(),
    }))
}

/// `key "value";` pairs of the attribute column
fn parse_attributes(attr_str: &str) -> HashMap<String, String> {
    let mut attributes = HashMap::new();

    for pair in attr_str.split(';') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }

        let Some((key, value)) = pair.split_once(char::is_whitespace) else {
            continue;
        };

        // first occurrence wins (tags like `tag "basic"` repeat)
        attributes
            .entry(key.trim().to_string())
            .or_insert_with(|| value.trim().trim_matches('"').to_string());
    }

    attributes
}
