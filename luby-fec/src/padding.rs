//! Helpers to fit a message into a `k × block_size` source matrix and back.

use crate::error::{Error, Result};

/// Right-pad with zeros, or truncate, to exactly `k * block_size` bytes.
pub fn pad(message: &[u8], k: usize, block_size: usize) -> Vec<u8> {
    let len = k * block_size;
    let mut out = vec![0u8; len];
    let n = message.len().min(len);
    out[..n].copy_from_slice(&message[..n]);
    out
}

/// Partition a padded buffer into `k` contiguous rows of `block_size` bytes.
pub fn split(padded: &[u8], k: usize, block_size: usize) -> Result<Vec<Vec<u8>>> {
    if block_size == 0 || padded.len() != k * block_size {
        return Err(Error::invalid(format!(
            "padded buffer is {} bytes, expected {k} x {block_size}",
            padded.len()
        )));
    }
    Ok(padded.chunks(block_size).map(<[u8]>::to_vec).collect())
}

/// Concatenate rows back into one buffer.
pub fn merge(blocks: &[Vec<u8>]) -> Vec<u8> {
    blocks.concat()
}

/// Check that `blocks` is exactly `k` rows of `block_size` bytes.
pub fn validate_matrix(blocks: &[Vec<u8>], k: usize, block_size: usize) -> Result<()> {
    if blocks.len() != k {
        return Err(Error::invalid(format!(
            "source matrix has {} rows, expected {k}",
            blocks.len()
        )));
    }
    if let Some((row, b)) = blocks.iter().enumerate().find(|(_, b)| b.len() != block_size) {
        return Err(Error::invalid(format!(
            "source row {row} is {} bytes, expected {block_size}",
            b.len()
        )));
    }
    Ok(())
}
