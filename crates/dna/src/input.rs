//! Reading DNA from plain or gzip-compressed text.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use endo_rope::Rope;
use flate2::read::GzDecoder;

use crate::error::Error;

/// Parses DNA text from `reader`, inflating it first when `gzip` is set.
///
/// Whitespace between bases is ignored.
pub fn read_dna<R: Read>(mut reader: R, gzip: bool) -> Result<Rope, Error> {
    let mut text = String::new();
    if gzip {
        GzDecoder::new(reader).read_to_string(&mut text)?;
    } else {
        reader.read_to_string(&mut text)?;
    }
    Ok(text.parse()?)
}

/// Reads DNA from `path`, or from stdin when `path` is `-`.
///
/// Files ending in `.gz` are decompressed.
pub fn load_dna(path: &Path) -> Result<Rope, Error> {
    if path == Path::new("-") {
        return read_dna(io::stdin().lock(), false);
    }
    let gzip = path.extension().is_some_and(|ext| ext == "gz");
    read_dna(BufReader::new(File::open(path)?), gzip)
}
