//! Encoded symbol: seed, degree, residual neighbor list and XOR payload.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// XOR `src` into `dst` byte by byte. Lengths must match.
#[inline]
pub fn xor_into(dst: &mut [u8], src: &[u8]) {
    debug_assert_eq!(dst.len(), src.len());
    for (d, s) in dst.iter_mut().zip(src) {
        *d ^= s;
    }
}

/// One encoded unit of the fountain stream.
///
/// `neighbors` lists the source block indices still folded into `payload`.
/// It starts with `degree` entries (repeats allowed) and only shrinks while
/// decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    seed: u64,
    degree: u32,
    neighbors: Vec<usize>,
    #[serde(with = "serde_bytes")]
    payload: Vec<u8>,
}

impl Symbol {
    /// Empty symbol with a zeroed payload of `block_size` bytes.
    pub fn new(seed: u64, degree: u32, block_size: usize) -> Self {
        Self {
            seed,
            degree,
            neighbors: Vec::with_capacity(degree as usize),
            payload: vec![0; block_size],
        }
    }

    /// Assemble a symbol from already-known parts.
    pub fn from_parts(seed: u64, degree: u32, neighbors: Vec<usize>, payload: Vec<u8>) -> Self {
        Self { seed, degree, neighbors, payload }
    }

    /// Seed the degree and neighbors were derived from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Degree as generated.
    pub fn degree(&self) -> u32 {
        self.degree
    }

    /// Source block indices still folded into the payload.
    pub fn neighbors(&self) -> &[usize] {
        &self.neighbors
    }

    /// XOR of the listed neighbors.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Take the payload.
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    /// Number of unresolved neighbor entries.
    pub fn residual_degree(&self) -> usize {
        self.neighbors.len()
    }

    /// The sole remaining neighbor, if exactly one is left.
    pub fn sole_neighbor(&self) -> Option<usize> {
        match self.neighbors.as_slice() {
            [j] => Some(*j),
            _ => None,
        }
    }

    /// Whether `index` is still a neighbor.
    pub fn contains(&self, index: usize) -> bool {
        self.neighbors.contains(&index)
    }

    /// Fold source block `index` into the payload and record it as a neighbor.
    pub fn fold(&mut self, index: usize, block: &[u8]) {
        self.neighbors.push(index);
        xor_into(&mut self.payload, block);
    }

    /// Remove one occurrence of `index` after XOR-ing its resolved `block` out
    /// of the payload. Returns `false` and leaves the symbol untouched when
    /// `index` is not a neighbor.
    pub fn resolve(&mut self, index: usize, block: &[u8]) -> bool {
        match self.neighbors.iter().position(|&n| n == index) {
            Some(at) => {
                xor_into(&mut self.payload, block);
                self.neighbors.remove(at);
                true
            }
            None => false,
        }
    }

    /// Drop neighbor pairs that cancel under XOR.
    ///
    /// An index listed an even number of times contributes nothing to the
    /// payload and is removed; an odd count keeps one entry at its first
    /// position. `degree` is left as generated.
    pub fn cancel_duplicates(&mut self) {
        let mut counts: HashMap<usize, usize> = HashMap::with_capacity(self.neighbors.len());
        for &n in &self.neighbors {
            *counts.entry(n).or_default() += 1;
        }
        let mut seen = HashSet::with_capacity(counts.len());
        self.neighbors
            .retain(|n| counts.get(n).is_some_and(|c| c % 2 == 1) && seen.insert(*n));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_accumulates_xor() {
        let a = [0b1010u8, 1, 2, 3];
        let b = [0b0110u8, 1, 0, 0];
        let mut s = Symbol::new(9, 2, 4);
        s.fold(0, &a);
        assert_eq!(s.payload(), &a);
        s.fold(3, &b);
        assert_eq!(s.payload(), &[0b1100, 0, 2, 3]);
        assert_eq!(s.neighbors(), &[0, 3]);
        assert_eq!(s.residual_degree(), 2);
        assert_eq!(s.sole_neighbor(), None);
    }

    #[test]
    fn resolve_peels_one_occurrence() {
        let a = [1u8, 2];
        let b = [4u8, 8];
        let mut s = Symbol::new(0, 2, 2);
        s.fold(0, &a);
        s.fold(1, &b);
        assert!(s.resolve(0, &a));
        assert_eq!(s.sole_neighbor(), Some(1));
        assert_eq!(s.payload(), &b);
        assert!(!s.resolve(0, &a));
        assert_eq!(s.payload(), &b);
    }

    #[test]
    fn double_fold_cancels() {
        let a = [0xAAu8; 4];
        let mut s = Symbol::new(1, 2, 4);
        s.fold(2, &a);
        s.fold(2, &a);
        assert_eq!(s.payload(), &[0; 4]);
        assert_eq!(s.neighbors(), &[2, 2]);
        s.cancel_duplicates();
        assert_eq!(s.residual_degree(), 0);
        assert_eq!(s.degree(), 2);
    }

    #[test]
    fn cancel_duplicates_keeps_odd_counts_in_first_order() {
        let mut s = Symbol::from_parts(0, 6, vec![3, 1, 3, 2, 1, 3], vec![0]);
        s.cancel_duplicates();
        assert_eq!(s.neighbors(), &[3, 2]);
    }

    #[test]
    fn serde_json_shape() -> Result<(), Box<dyn std::error::Error>> {
        let s = Symbol::from_parts(u64::MAX, 2, vec![0, 5], vec![7, 7]);
        let json = serde_json::to_string(&s)?;
        assert!(json.contains("\"neighbors\":[0,5]"));
        let back: Symbol = serde_json::from_str(&json)?;
        assert_eq!(s, back);
        Ok(())
    }
}
