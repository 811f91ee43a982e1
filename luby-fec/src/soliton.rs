//! Robust soliton degree distribution.
//!
//! `μ(i) = (ρ(i) + τ(i)) / β` over degrees `1..=k`, where `ρ` is the ideal
//! soliton and `τ` adds mass to low degrees plus a spike at `round(k/R)`.
//! `β` is fixed at construction; every sample and the redundancy estimate
//! are derived from that single value.

use crate::error::{Error, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Robust soliton distribution over degrees `1..=k`.
#[derive(Debug, Clone)]
pub struct DegreeDistribution {
    k: usize,
    delta: f64,
    r: f64,
    spike: usize,
    beta: f64,
    /// `cdf[i-1] = μ(1) + … + μ(i)`, accumulated in degree order.
    cdf: Vec<f64>,
}

impl DegreeDistribution {
    /// Build the distribution for `k` source blocks.
    ///
    /// Fails with [`Error::InvalidArgument`] when `k == 0`, `c` is not a
    /// positive finite real, or `delta` lies outside `[0,1]`.
    pub fn new(k: usize, c: f64, delta: f64) -> Result<Self> {
        if k == 0 {
            return Err(Error::invalid("k must be positive"));
        }
        if !(c.is_finite() && c > 0.0) {
            return Err(Error::invalid(format!("c must be a positive real, got {c}")));
        }
        if !(0.0..=1.0).contains(&delta) {
            return Err(Error::invalid(format!("delta must lie in [0,1], got {delta}")));
        }

        let kf = k as f64;
        let r = c * (kf / delta).ln() * kf.sqrt();
        // Saturating cast: R == 0 pushes the spike past k, R == inf pulls it to 0.
        let spike = (kf / r).round() as usize;

        let mut dist = Self { k, delta, r, spike, beta: 1.0, cdf: Vec::new() };

        let mut mass = Vec::with_capacity(k);
        let mut beta = 0.0;
        for i in 1..=k {
            let m = dist.rho(i)? + dist.tau(i)?;
            beta += m;
            mass.push(m);
        }
        dist.beta = beta;

        let mut sum = 0.0;
        dist.cdf = mass
            .into_iter()
            .map(|m| {
                sum += m / beta;
                sum
            })
            .collect();
        Ok(dist)
    }

    /// Number of source blocks.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Normalization constant `β = Σ (ρ(i) + τ(i))`.
    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// `R = c·ln(k/δ)·√k`.
    pub fn robust_r(&self) -> f64 {
        self.r
    }

    /// Degree carrying the `τ` spike, `round(k/R)`.
    pub fn spike(&self) -> usize {
        self.spike
    }

    fn check(&self, i: usize) -> Result<()> {
        if i == 0 || i > self.k {
            return Err(Error::Domain { index: i, k: self.k });
        }
        Ok(())
    }

    /// Ideal soliton component.
    pub fn rho(&self, i: usize) -> Result<f64> {
        self.check(i)?;
        Ok(if i == 1 {
            1.0 / self.k as f64
        } else {
            let i = i as f64;
            1.0 / (i * (i - 1.0))
        })
    }

    /// Robust component.
    pub fn tau(&self, i: usize) -> Result<f64> {
        self.check(i)?;
        let kf = self.k as f64;
        Ok(match i.cmp(&self.spike) {
            std::cmp::Ordering::Less => self.r / (i as f64 * kf),
            std::cmp::Ordering::Equal => self.r * (self.r / self.delta).ln() / kf,
            std::cmp::Ordering::Greater => 0.0,
        })
    }

    /// Normalized probability of degree `i`.
    pub fn mu(&self, i: usize) -> Result<f64> {
        Ok((self.rho(i)? + self.tau(i)?) / self.beta)
    }

    /// Degree for `seed`. A pure function of `(k, c, delta, seed)`.
    pub fn sample(&self, seed: u64) -> usize {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let r: f64 = rng.gen();
        self.degree_for(r)
    }

    /// First degree whose cumulative mass reaches `r`; `k` if rounding leaves
    /// the total short of `r`.
    pub fn degree_for(&self, r: f64) -> usize {
        let idx = self.cdf.partition_point(|&acc| acc < r);
        (idx + 1).min(self.k)
    }

    /// Symbols a receiver needs to decode with probability at least `1 - δ`:
    /// `floor(k·β)`, never below `k`.
    pub fn blocks_needed(&self) -> usize {
        ((self.k as f64 * self.beta).floor() as usize).max(self.k)
    }
}
