//! Luby-Transform fountain codec.
//! - Robust soliton degree distribution with a seed-deterministic sampler.
//! - Encoder emitting an unbounded stream of XOR-combined symbols.
//! - Peeling (belief-propagation) decoder with explicit stall detection.
//! - Bounded producer/consumer pipeline with a completion signal.
//!
//! ```no_run
//! use luby_fec::{Encoder, PeelingDecoder};
//! # async fn run() -> luby_fec::Result<()> {
//! let mut encoder = Encoder::new(16, 8)?;
//! let decoder = PeelingDecoder::new(16, 8)?;
//! let (tx, rx) = encoder.pipeline()?;
//! let producer = tokio::spawn(async move { encoder.encode(b"hello fountain", &tx).await });
//! let message = decoder.decode(rx).await?;
//! # let _ = (producer, message);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

/// Codec configuration from file and environment.
pub mod config;
/// Peeling decoder.
pub mod decoder;
/// LT encoder.
pub mod encoder;
/// Error types.
pub mod error;
/// Message padding and block splitting.
pub mod padding;
/// Bounded symbol channel with a completion signal.
pub mod pipeline;
/// Robust soliton degree distribution.
pub mod soliton;
/// Encoder and decoder statistics.
pub mod stats;
/// Encoded symbols.
pub mod symbol;
/// Binary framing for symbols.
pub mod wire;

pub use config::CodecConfig;
pub use decoder::PeelingDecoder;
pub use encoder::{neighbors_for_seed, Encoder};
pub use error::{Error, Result};
pub use pipeline::{pipeline, CompletionToken, Delivery, SymbolReceiver, SymbolSender};
pub use soliton::DegreeDistribution;
pub use stats::{DecodingStats, EncodingStats};
pub use symbol::Symbol;
