//! Byte-exact content comparison.
//!
//! This is the stage we most want to avoid: it reads both files. Streams are
//! compared in equal-sized blocks and the comparison stops at the first block
//! that differs, so a mismatch near the start costs almost nothing. Callers
//! have already checked that the sizes match.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Default comparison block size (8 KiB).
pub const DEFAULT_BLOCK_SIZE: usize = 8 * 1024;

/// Compare two streams byte for byte.
///
/// Reads at most `block_size` bytes from each stream per step and returns as
/// soon as a step differs. With a block size of one, no byte past the first
/// difference is read. A stream ending before the other is a mismatch.
///
/// # Errors
///
/// Returns the first read error from either stream.
pub fn contents_match<A: Read, B: Read>(
    mut first: A,
    mut second: B,
    block_size: usize,
) -> io::Result<bool> {
    let block_size = block_size.max(1);
    let mut first_buf = vec![0u8; block_size];
    let mut second_buf = vec![0u8; block_size];

    loop {
        let first_len = fill_block(&mut first, &mut first_buf)?;
        let second_len = fill_block(&mut second, &mut second_buf)?;

        if first_len != second_len || first_buf[..first_len] != second_buf[..second_len] {
            return Ok(false);
        }
        if first_len == 0 {
            return Ok(true);
        }
    }
}

/// Compare two files byte for byte.
///
/// # Errors
///
/// Returns an error if either file cannot be opened or read.
pub fn files_match(first: &Path, second: &Path, block_size: usize) -> io::Result<bool> {
    let first = File::open(first)?;
    let second = File::open(second)?;
    contents_match(first, second, block_size)
}

/// Read until `buf` is full or the stream ends.
fn fill_block<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
