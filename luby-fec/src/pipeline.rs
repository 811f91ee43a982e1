//! Bounded single-producer/single-consumer symbol channel with a completion
//! signal.
//!
//! The consumer drains a fixed quota, then calls [`SymbolReceiver::complete`].
//! That sets the shared [`CompletionToken`] and closes the channel, so a
//! producer parked on a full channel wakes up and stops instead of waiting
//! forever.
//!
//! Liveness: if the producer stops before the quota is met, the consumer sees
//! the channel close and reports [`Error::PipelineStall`]. A producer that is
//! alive but never sends keeps the consumer waiting unless a drain timeout is
//! configured on the decoder.

use crate::error::{Error, Result};
use crate::symbol::Symbol;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Single-writer "consumer is done" flag shared by both pipeline halves.
#[derive(Debug, Clone, Default)]
pub struct CompletionToken(Arc<AtomicBool>);

impl CompletionToken {
    /// Unset token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the consumer done.
    pub fn complete(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether the consumer is done.
    pub fn is_complete(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Result of handing one symbol to the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The symbol is queued for the consumer.
    Delivered,
    /// The consumer completed and closed the channel; the symbol was dropped.
    Completed,
}

/// Create a connected sender/receiver pair with room for `capacity` symbols.
pub fn pipeline(capacity: usize) -> Result<(SymbolSender, SymbolReceiver)> {
    if capacity == 0 {
        return Err(Error::invalid("pipeline capacity must be positive"));
    }
    let (tx, rx) = mpsc::channel(capacity);
    let done = CompletionToken::new();
    debug!(capacity, "pipeline created");
    Ok((
        SymbolSender { tx, done: done.clone() },
        SymbolReceiver { rx, done, capacity },
    ))
}

/// Producer half.
#[derive(Debug)]
pub struct SymbolSender {
    tx: mpsc::Sender<Symbol>,
    done: CompletionToken,
}

impl SymbolSender {
    /// Push one symbol, waiting while the channel is full.
    ///
    /// Returns [`Delivery::Completed`] if the consumer finished meanwhile, and
    /// [`Error::Interrupted`] if the consumer went away without completing.
    pub async fn send(&self, symbol: Symbol) -> Result<Delivery> {
        match self.tx.send(symbol).await {
            Ok(()) => Ok(Delivery::Delivered),
            Err(_) if self.done.is_complete() => Ok(Delivery::Completed),
            Err(_) => {
                warn!("consumer dropped the pipeline before completing");
                Err(Error::Interrupted("consumer dropped before completion".into()))
            }
        }
    }

    /// Whether the consumer has completed.
    pub fn is_complete(&self) -> bool {
        self.done.is_complete()
    }

    /// The shared completion token.
    pub fn token(&self) -> &CompletionToken {
        &self.done
    }
}

/// Consumer half.
#[derive(Debug)]
pub struct SymbolReceiver {
    rx: mpsc::Receiver<Symbol>,
    done: CompletionToken,
    capacity: usize,
}

impl SymbolReceiver {
    /// Channel capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Next symbol, or `None` once the channel is closed and empty.
    pub async fn recv(&mut self) -> Option<Symbol> {
        self.rx.recv().await
    }

    /// Wait for exactly `quota` symbols.
    ///
    /// Fails with [`Error::PipelineStall`] when the producer closes first.
    pub async fn drain(&mut self, quota: usize) -> Result<Vec<Symbol>> {
        let mut batch = Vec::with_capacity(quota);
        while batch.len() < quota {
            match self.rx.recv().await {
                Some(s) => batch.push(s),
                None => {
                    warn!(received = batch.len(), quota, "producer closed before quota was met");
                    return Err(Error::PipelineStall(format!(
                        "producer closed after {}/{quota} symbols",
                        batch.len()
                    )));
                }
            }
        }
        Ok(batch)
    }

    /// Signal completion and close the channel to further sends.
    pub fn complete(&mut self) {
        self.done.complete();
        self.rx.close();
    }

    /// Whether [`SymbolReceiver::complete`] has been called.
    pub fn is_complete(&self) -> bool {
        self.done.is_complete()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(seed: u64) -> Symbol {
        Symbol::from_parts(seed, 1, vec![0], vec![seed as u8])
    }

    #[test]
    fn zero_capacity_rejected() {
        assert!(matches!(pipeline(0), Err(Error::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn fifo_order_and_drain() -> Result<()> {
        let (tx, mut rx) = pipeline(4)?;
        for s in 0..3 {
            assert_eq!(tx.send(sym(s)).await?, Delivery::Delivered);
        }
        let batch = rx.drain(3).await?;
        let seeds: Vec<u64> = batch.iter().map(Symbol::seed).collect();
        assert_eq!(seeds, vec![0, 1, 2]);
        Ok(())
    }

    #[tokio::test]
    async fn completion_wakes_blocked_sender() -> Result<()> {
        let (tx, mut rx) = pipeline(1)?;
        assert_eq!(tx.send(sym(0)).await?, Delivery::Delivered);
        let producer = tokio::spawn(async move {
            // Channel is full; this parks until the consumer closes it.
            let outcome = tx.send(sym(1)).await;
            (outcome, tx.is_complete())
        });
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
        assert!(!producer.is_finished());
        rx.complete();
        let (outcome, seen) = producer.await.map_err(|e| Error::Interrupted(e.to_string()))?;
        assert_eq!(outcome?, Delivery::Completed);
        assert!(seen);
        // Already buffered symbols stay readable after completion.
        assert_eq!(rx.recv().await.map(|s| s.seed()), Some(0));
        assert!(rx.recv().await.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn send_after_completion_reports_completed() -> Result<()> {
        let (tx, mut rx) = pipeline(4)?;
        rx.complete();
        assert!(tx.is_complete());
        assert_eq!(tx.send(sym(0)).await?, Delivery::Completed);
        Ok(())
    }

    #[tokio::test]
    async fn dropped_consumer_interrupts_producer() -> Result<()> {
        let (tx, rx) = pipeline(2)?;
        drop(rx);
        assert!(matches!(tx.send(sym(0)).await, Err(Error::Interrupted(_))));
        Ok(())
    }

    #[tokio::test]
    async fn dropped_producer_stalls_drain() -> Result<()> {
        let (tx, mut rx) = pipeline(4)?;
        tx.send(sym(0)).await?;
        drop(tx);
        let err = rx.drain(3).await.unwrap_err();
        assert!(matches!(err, Error::PipelineStall(ref m) if m.contains("1/3")));
        Ok(())
    }

    #[test]
    fn token_is_shared() {
        let t = CompletionToken::new();
        let u = t.clone();
        assert!(!u.is_complete());
        t.complete();
        assert!(u.is_complete());
    }
}
