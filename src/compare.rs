use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Content-equality capability consumed by the file handler.
///
/// Implementations decide what "equal" means; the default compares sizes and
/// then bytes.
pub trait FileCompare {
    /// Compare two files by content.
    ///
    /// # Errors
    /// Returns an error if either file cannot be read.
    fn compare(&self, f1: &Path, f2: &Path) -> std::io::Result<bool>;
}

/// Default comparer: size prefilter, then a buffered byte-by-byte compare.
#[derive(Debug, Default, Clone, Copy)]
pub struct SizeThenContent;

impl FileCompare for SizeThenContent {
    fn compare(&self, f1: &Path, f2: &Path) -> std::io::Result<bool> {
        if std::fs::metadata(f1)?.len() != std::fs::metadata(f2)?.len() {
            return Ok(false);
        }

        let mut r1 = BufReader::new(File::open(f1)?);
        let mut r2 = BufReader::new(File::open(f2)?);
        let mut b1 = [0_u8; 8192];
        let mut b2 = [0_u8; 8192];

        loop {
            let n1 = r1.read(&mut b1)?;
            let n2 = r2.read(&mut b2)?;
            if n1 != n2 || b1[..n1] != b2[..n2] {
                // Sizes matched at stat time; short reads of differing length
                // mean the file changed underneath us, report unequal.
                return Ok(false);
            }
            if n1 == 0 {
                return Ok(true);
            }
        }
    }
}
