//! LT encoder: turns a `k × block_size` source matrix into an unbounded
//! stream of XOR-combined symbols.

use crate::config::CodecConfig;
use crate::error::{Error, Result};
use crate::padding::{pad, split, validate_matrix};
use crate::pipeline::{pipeline, Delivery, SymbolReceiver, SymbolSender};
use crate::soliton::DegreeDistribution;
use crate::stats::EncodingStats;
use crate::symbol::Symbol;
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::time::Instant;
use tracing::{debug, info};

/// Source block indices a symbol of `degree` generated from `seed` folds in.
///
/// Indices are drawn uniformly from `[0, k)` with replacement.
pub fn neighbors_for_seed(k: usize, degree: usize, seed: u64) -> Vec<usize> {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    (0..degree).map(|_| rng.gen_range(0..k)).collect()
}

/// LT encoder over one loaded source matrix.
pub struct Encoder {
    k: usize,
    block_size: usize,
    distribution: DegreeDistribution,
    seeds: ChaCha20Rng,
    source: Option<Vec<Vec<u8>>>,
    stats: EncodingStats,
}

impl Encoder {
    /// Encoder with the default distribution parameters.
    pub fn new(k: usize, block_size: usize) -> Result<Self> {
        Self::with_config(&CodecConfig::new(k, block_size))
    }

    /// Encoder for the dimensions and distribution `cfg` describes.
    pub fn with_config(cfg: &CodecConfig) -> Result<Self> {
        if cfg.k == 0 || cfg.block_size == 0 {
            return Err(Error::invalid(format!(
                "k and block_size must be positive, got k={} block_size={}",
                cfg.k, cfg.block_size
            )));
        }
        if u32::try_from(cfg.k).is_err() {
            return Err(Error::invalid(format!("k={} exceeds the u32 index space", cfg.k)));
        }
        let distribution = DegreeDistribution::new(cfg.k, cfg.c, cfg.delta)?;
        let seeds = match cfg.master_seed {
            Some(s) => ChaCha20Rng::seed_from_u64(s),
            None => ChaCha20Rng::from_entropy(),
        };
        Ok(Self {
            k: cfg.k,
            block_size: cfg.block_size,
            stats: EncodingStats::with_k(cfg.k),
            distribution,
            seeds,
            source: None,
        })
    }

    /// Number of source blocks.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Bytes per source block.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Degree distribution in use.
    pub fn distribution(&self) -> &DegreeDistribution {
        &self.distribution
    }

    /// Receiver quota for this distribution.
    pub fn blocks_needed(&self) -> usize {
        self.distribution.blocks_needed()
    }

    /// A pipeline sized to the receiver quota.
    pub fn pipeline(&self) -> Result<(SymbolSender, SymbolReceiver)> {
        pipeline(self.blocks_needed())
    }

    /// Pad or truncate `message` to `k * block_size` bytes.
    pub fn pad(&self, message: &[u8]) -> Vec<u8> {
        pad(message, self.k, self.block_size)
    }

    /// Pad and split `message` into the source matrix.
    pub fn load(&mut self, message: &[u8]) -> Result<()> {
        if message.is_empty() {
            return Err(Error::invalid("message is empty"));
        }
        let padded = self.pad(message);
        self.source = Some(split(&padded, self.k, self.block_size)?);
        Ok(())
    }

    /// Install a pre-split matrix of exactly `k` rows of `block_size` bytes.
    pub fn load_blocks(&mut self, blocks: Vec<Vec<u8>>) -> Result<()> {
        validate_matrix(&blocks, self.k, self.block_size)?;
        self.source = Some(blocks);
        Ok(())
    }

    /// The loaded source matrix, if any.
    pub fn source_blocks(&self) -> Option<&[Vec<u8>]> {
        self.source.as_deref()
    }

    /// Rebuild the symbol `seed` yields over the loaded matrix.
    pub fn symbol_for_seed(&self, seed: u64) -> Result<Symbol> {
        let blocks = self
            .source
            .as_deref()
            .ok_or_else(|| Error::invalid("no source blocks loaded"))?;
        let degree = self.distribution.sample(seed);
        // `k` fits u32, checked at construction.
        let mut symbol = Symbol::new(seed, degree as u32, self.block_size);
        for j in neighbors_for_seed(self.k, degree, seed) {
            symbol.fold(j, &blocks[j]);
        }
        Ok(symbol)
    }

    fn next_symbol(&mut self) -> Result<Symbol> {
        let seed = self.seeds.next_u64();
        self.symbol_for_seed(seed)
    }

    /// Generate one symbol with a fresh seed.
    pub fn encode_one(&mut self) -> Result<Symbol> {
        let symbol = self.next_symbol()?;
        self.stats.record_symbol(symbol.degree() as usize);
        Ok(symbol)
    }

    /// Encode `message` into `sink` until the consumer signals completion.
    ///
    /// Returns a copy of every symbol the consumer side accepted.
    pub async fn encode(&mut self, message: &[u8], sink: &SymbolSender) -> Result<Vec<Symbol>> {
        self.load(message)?;
        self.emit(sink).await
    }

    /// [`Encoder::encode`] over a pre-split matrix.
    pub async fn encode_blocks(
        &mut self,
        blocks: Vec<Vec<u8>>,
        sink: &SymbolSender,
    ) -> Result<Vec<Symbol>> {
        self.load_blocks(blocks)?;
        self.emit(sink).await
    }

    async fn emit(&mut self, sink: &SymbolSender) -> Result<Vec<Symbol>> {
        let start = Instant::now();
        let mut history = Vec::new();
        loop {
            let symbol = self.next_symbol()?;
            match sink.send(symbol.clone()).await? {
                Delivery::Delivered => {
                    self.stats.record_symbol(symbol.degree() as usize);
                    history.push(symbol);
                }
                Delivery::Completed => break,
            }
            if sink.is_complete() {
                break;
            }
        }
        self.stats.record_run(start.elapsed());
        debug!(mean_degree = self.stats.mean_degree(), "encoder degree profile");
        info!(
            "Encoded {} source blocks of {} bytes into {} symbols",
            self.k,
            self.block_size,
            history.len()
        );
        Ok(history)
    }

    /// Snapshot of the encoding statistics.
    pub fn get_stats(&self) -> EncodingStats {
        self.stats.clone()
    }
}
