//! Binary framing for symbols.
//!
//! Layout, all integers little-endian:
//! `[seed: 8][degree: u32][n: u32][n x neighbor: u32][len: u32][payload: len]`.
//! The seed is the raw 64-bit pattern, so signed and unsigned readers agree.

use crate::error::{Error, Result};
use crate::symbol::Symbol;
use bytes::{Buf, BufMut, Bytes, BytesMut};

const HEADER_LEN: usize = 8 + 4 + 4;

impl Symbol {
    /// Size of [`Symbol::to_bytes`] output.
    pub fn encoded_len(&self) -> usize {
        HEADER_LEN + 4 * self.neighbors().len() + 4 + self.payload().len()
    }

    /// Serialize into a single frame.
    pub fn to_bytes(&self) -> Result<Bytes> {
        let mut out = BytesMut::with_capacity(self.encoded_len());
        out.put_u64_le(self.seed());
        out.put_u32_le(self.degree());
        out.put_u32_le(len_u32(self.neighbors().len(), "neighbor count")?);
        for &n in self.neighbors() {
            out.put_u32_le(len_u32(n, "neighbor index")?);
        }
        out.put_u32_le(len_u32(self.payload().len(), "payload length")?);
        out.put_slice(self.payload());
        Ok(out.freeze())
    }

    /// Parse exactly one frame; trailing bytes are rejected.
    pub fn from_bytes(frame: &[u8]) -> Result<Self> {
        let total = frame.len();
        let mut src = frame;
        need(&src, 8, total)?;
        let seed = src.get_u64_le();
        need(&src, 8, total)?;
        let degree = src.get_u32_le();
        let n = src.get_u32_le() as usize;
        if n > degree as usize {
            return Err(Error::malformed(format!("{n} neighbors exceed degree {degree}")));
        }
        let mut neighbors = Vec::with_capacity(n.min(src.remaining() / 4));
        for _ in 0..n {
            need(&src, 4, total)?;
            neighbors.push(src.get_u32_le() as usize);
        }
        need(&src, 4, total)?;
        let len = src.get_u32_le() as usize;
        need(&src, len, total)?;
        let payload = src.copy_to_bytes(len).to_vec();
        if src.has_remaining() {
            return Err(Error::malformed(format!("{} trailing bytes", src.remaining())));
        }
        Ok(Symbol::from_parts(seed, degree, neighbors, payload))
    }
}

fn len_u32(v: usize, what: &str) -> Result<u32> {
    u32::try_from(v).map_err(|_| Error::malformed(format!("{what} {v} does not fit u32")))
}

fn need(src: &impl Buf, n: usize, total: usize) -> Result<()> {
    if src.remaining() < n {
        return Err(Error::malformed(format!(
            "truncated at byte {}",
            total - src.remaining()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Symbol {
        Symbol::from_parts(0xDEAD_BEEF_0000_0001, 3, vec![4, 0, 4], vec![1, 2, 3, 4])
    }

    #[test]
    fn frame_roundtrip() -> Result<()> {
        let s = sample();
        let bytes = s.to_bytes()?;
        assert_eq!(bytes.len(), s.encoded_len());
        assert_eq!(Symbol::from_bytes(&bytes)?, s);
        Ok(())
    }

    #[test]
    fn seed_reads_as_i64() -> Result<()> {
        let s = Symbol::from_parts(u64::MAX, 1, vec![0], vec![0]);
        let bytes = s.to_bytes()?;
        let mut seed = [0u8; 8];
        seed.copy_from_slice(&bytes[..8]);
        assert_eq!(i64::from_le_bytes(seed), -1);
        Ok(())
    }

    #[test]
    fn rejects_truncated() -> Result<()> {
        let bytes = sample().to_bytes()?;
        for cut in [0, 7, HEADER_LEN, bytes.len() - 1] {
            assert!(matches!(Symbol::from_bytes(&bytes[..cut]), Err(Error::Malformed(_))), "cut {cut}");
        }
        Ok(())
    }

    #[test]
    fn truncation_reports_offset() -> Result<()> {
        let bytes = sample().to_bytes()?;
        let err = Symbol::from_bytes(&bytes[..HEADER_LEN + 4]).unwrap_err();
        assert!(err.to_string().contains(&format!("truncated at byte {}", HEADER_LEN + 4)));
        Ok(())
    }

    #[test]
    fn rejects_trailing_bytes() -> Result<()> {
        let mut bytes = sample().to_bytes()?.to_vec();
        bytes.push(0);
        let err = Symbol::from_bytes(&bytes).unwrap_err();
        assert!(err.to_string().contains("trailing"));
        Ok(())
    }

    #[test]
    fn rejects_neighbor_count_above_degree() -> Result<()> {
        let mut bytes = sample().to_bytes()?.to_vec();
        bytes[8..12].copy_from_slice(&1u32.to_le_bytes());
        assert!(matches!(Symbol::from_bytes(&bytes), Err(Error::Malformed(_))));
        Ok(())
    }
}
