/// Input opening shared by the GTF, junction and alignment readers
pub mod sam;

use crate::error::Error;
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Open a text input (plain or gzip compressed)
///
/// Compression is detected by file extension; `-` reads standard input.
pub fn open_text(path: &Path) -> Result<Box<dyn BufRead>, Error> {
    if crate::params::is_stdin(path) {
        return Ok(Box::new(BufReader::new(std::io::stdin())));
    }

    let file = File::open(path).map_err(|e| Error::io(e, path))?;

    if is_gzipped(path) {
        // bgzip output is multi-member gzip
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

fn is_gzipped(path: &Path) -> bool {
    let path_str = path.to_string_lossy();
    path_str.ends_with(".gz") || path_str.ends_with(".gzip")
}
