//! Peeling ("ripple") decoder.
//!
//! A drained batch is held in an arena indexed by position. Each source block
//! keeps the positions of the symbols that mention it, so resolving block `j`
//! only visits those symbols. A symbol whose residual neighbor list drops to
//! one entry joins the ripple queue; the queue is seeded in arena order and
//! grows FIFO, which makes the resolution order deterministic.

use crate::config::CodecConfig;
use crate::error::{Error, Result};
use crate::pipeline::SymbolReceiver;
use crate::soliton::DegreeDistribution;
use crate::stats::DecodingStats;
use crate::symbol::Symbol;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Peeling decoder. Clones share statistics.
#[derive(Debug, Clone)]
pub struct PeelingDecoder {
    k: usize,
    block_size: usize,
    quota: usize,
    drain_timeout: Option<Duration>,
    stats: Arc<Mutex<DecodingStats>>,
}

impl PeelingDecoder {
    /// Decoder with the default distribution parameters.
    pub fn new(k: usize, block_size: usize) -> Result<Self> {
        Self::with_config(&CodecConfig::new(k, block_size))
    }

    /// Decoder whose quota follows the distribution `cfg` describes.
    pub fn with_config(cfg: &CodecConfig) -> Result<Self> {
        if cfg.k == 0 || cfg.block_size == 0 {
            return Err(Error::invalid(format!(
                "k and block_size must be positive, got k={} block_size={}",
                cfg.k, cfg.block_size
            )));
        }
        let distribution = DegreeDistribution::new(cfg.k, cfg.c, cfg.delta)?;
        Ok(Self {
            k: cfg.k,
            block_size: cfg.block_size,
            quota: distribution.blocks_needed(),
            drain_timeout: cfg.drain_timeout(),
            stats: Arc::new(Mutex::new(DecodingStats::default())),
        })
    }

    /// Symbols drained per decode pass.
    pub fn quota(&self) -> usize {
        self.quota
    }

    /// Number of source blocks.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Bytes per source block.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Drain the quota from `source`, signal completion, then peel.
    ///
    /// Waits until the quota is met. Without a drain timeout a producer that
    /// stays alive but stops sending keeps this pending; closing the producer
    /// side yields [`Error::PipelineStall`].
    pub async fn decode(&self, mut source: SymbolReceiver) -> Result<Vec<u8>> {
        let drained = match self.drain_timeout {
            Some(limit) => match tokio::time::timeout(limit, source.drain(self.quota)).await {
                Ok(r) => r,
                Err(_) => Err(Error::PipelineStall(format!(
                    "quota of {} symbols not met within {limit:?}",
                    self.quota
                ))),
            },
            None => source.drain(self.quota).await,
        };
        // Release the producer whether or not the drain succeeded.
        source.complete();

        let batch = match drained {
            Ok(b) => b,
            Err(e) => {
                if let Ok(mut stats) = self.stats.lock() {
                    stats.pipeline_stalls += 1;
                }
                return Err(e);
            }
        };
        debug!(symbols = batch.len(), "drained decode batch");
        self.decode_batch(batch)
    }

    /// Peel a caller-supplied batch.
    pub fn decode_batch(&self, batch: Vec<Symbol>) -> Result<Vec<u8>> {
        let start = Instant::now();
        let used = batch.len();
        let result = self.peel(batch);

        if let Ok(mut stats) = self.stats.lock() {
            stats.record_batch(used, result.is_ok(), start.elapsed());
        }
        match &result {
            Ok(_) => info!("Decoded {} source blocks from {} symbols", self.k, used),
            Err(Error::DecodeFailure { resolved, k }) => {
                warn!(resolved, k, symbols = used, "ripple stalled before all blocks resolved")
            }
            Err(e) => warn!("decode rejected batch: {e}"),
        }
        result
    }

    fn peel(&self, batch: Vec<Symbol>) -> Result<Vec<u8>> {
        let mut arena = Vec::with_capacity(batch.len());
        let mut mentions: Vec<Vec<usize>> = vec![Vec::new(); self.k];
        let mut ripple = VecDeque::new();

        for (pos, mut symbol) in batch.into_iter().enumerate() {
            if symbol.payload().len() != self.block_size {
                return Err(Error::invalid(format!(
                    "symbol {pos} payload is {} bytes, expected {}",
                    symbol.payload().len(),
                    self.block_size
                )));
            }
            if let Some(&j) = symbol.neighbors().iter().find(|&&j| j >= self.k) {
                return Err(Error::invalid(format!(
                    "symbol {pos} references block {j}, k={}",
                    self.k
                )));
            }
            symbol.cancel_duplicates();
            for &j in symbol.neighbors() {
                mentions[j].push(pos);
            }
            if symbol.residual_degree() == 1 {
                ripple.push_back(pos);
            }
            arena.push(symbol);
        }

        let mut blocks: Vec<Option<Vec<u8>>> = vec![None; self.k];
        let mut resolved = 0;

        while resolved < self.k {
            let Some(pos) = ripple.pop_front() else { break };
            // Its last neighbor may have been resolved by an earlier symbol.
            let Some(j) = arena[pos].sole_neighbor() else { continue };

            let block = arena[pos].payload().to_vec();
            for &other in &mentions[j] {
                let symbol = &mut arena[other];
                if symbol.resolve(j, &block) && symbol.residual_degree() == 1 {
                    ripple.push_back(other);
                }
            }
            blocks[j] = Some(block);
            resolved += 1;
            debug!(block = j, resolved, pending = ripple.len(), "resolved source block");
        }

        if resolved < self.k {
            return Err(Error::DecodeFailure { resolved, k: self.k });
        }
        Ok(blocks.into_iter().flatten().flatten().collect())
    }

    /// Snapshot of the decoding statistics.
    pub fn get_stats(&self) -> DecodingStats {
        self.stats.lock().map(|s| s.clone()).unwrap_or_default()
    }
}
