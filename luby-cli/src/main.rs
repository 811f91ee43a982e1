//! Demonstration driver: encodes a message and decodes it back through an
//! in-process LT symbol pipeline.

#![forbid(unsafe_code)]

use anyhow::{bail, Context, Result};
use clap::Parser;
use luby_fec::{CodecConfig, Encoder, Error as FecError, PeelingDecoder};
use std::future::Future;
use std::path::PathBuf;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "luby-cli",
    version,
    about = "Encode a message into an LT symbol stream and decode it back"
)]
struct Cli {
    /// Message to transmit. Read from stdin when omitted.
    #[arg(long)]
    message: Option<String>,
    /// TOML codec configuration. Defaults plus LUBY_* environment when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Number of source blocks
    #[arg(long)]
    k: Option<usize>,
    /// Bytes per source block
    #[arg(long)]
    block_size: Option<usize>,
    /// Robust soliton spreading constant
    #[arg(long)]
    c: Option<f64>,
    /// Admissible decode failure probability
    #[arg(long)]
    delta: Option<f64>,
    /// Master seed for a reproducible symbol stream
    #[arg(long)]
    seed: Option<u64>,
    /// Give up on a drain after this many milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,
    /// Tracing filter used when RUST_LOG is unset
    #[arg(long)]
    log_level: Option<String>,
    /// Decode passes to run before giving up
    #[arg(long, default_value_t = 3)]
    attempts: u32,
    /// Strip trailing zero padding from the decoded output
    #[arg(long)]
    trim: bool,
}

fn build_config(cli: &Cli) -> Result<CodecConfig> {
    let mut cfg = match &cli.config {
        Some(path) => CodecConfig::load_from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => CodecConfig::from_env().context("reading LUBY_* environment")?,
    };
    if let Some(v) = cli.k { cfg.k = v; }
    if let Some(v) = cli.block_size { cfg.block_size = v; }
    if let Some(v) = cli.c { cfg.c = v; }
    if let Some(v) = cli.delta { cfg.delta = v; }
    if let Some(v) = cli.seed { cfg.master_seed = Some(v); }
    if let Some(v) = cli.timeout_ms { cfg.drain_timeout_ms = Some(v); }
    if let Some(v) = &cli.log_level { cfg.log_level = v.clone(); }
    cfg.validate()?;
    Ok(cfg)
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // stdout carries the decoded message only.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn read_message(cli: &Cli) -> Result<Vec<u8>> {
    if let Some(m) = &cli.message {
        return Ok(m.as_bytes().to_vec());
    }
    let mut buf = Vec::new();
    tokio::io::stdin()
        .read_to_end(&mut buf)
        .await
        .context("reading message from stdin")?;
    Ok(buf)
}

/// One encode/decode pass over a fresh pipeline.
///
/// `shutdown` aborts the pass when it resolves `Ok`; an `Err` (no handler
/// could be installed) is ignored.
async fn transmit(
    cfg: &CodecConfig,
    message: &[u8],
    shutdown: impl Future<Output = std::io::Result<()>>,
) -> luby_fec::Result<Vec<u8>> {
    let mut encoder = Encoder::with_config(cfg)?;
    let decoder = PeelingDecoder::with_config(cfg)?;
    let (tx, rx) = encoder.pipeline()?;

    let payload = message.to_vec();
    let producer = tokio::spawn(async move {
        encoder.encode(&payload, &tx).await.map(|history| history.len())
    });

    let decoded = tokio::select! {
        r = decoder.decode(rx) => r,
        Ok(()) = shutdown => {
            producer.abort();
            return Err(FecError::Interrupted("ctrl-c".into()));
        }
    };
    let emitted = producer
        .await
        .map_err(|e| FecError::Interrupted(format!("encoder task: {e}")))??;
    info!(emitted, quota = decoder.quota(), "producer finished");
    decoded
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = build_config(&cli)?;
    init_tracing(&cfg.log_level);

    let message = read_message(&cli).await?;
    if message.is_empty() {
        bail!("message is empty");
    }
    let capacity = cfg.k * cfg.block_size;
    if message.len() > capacity {
        warn!(len = message.len(), capacity, "message truncated to k x block_size");
    }

    let attempts = cli.attempts.max(1);
    let mut last_err = None;
    for attempt in 1..=attempts {
        let mut pass = cfg.clone();
        // Re-running the same master seed would replay the same batch.
        pass.master_seed = cfg.master_seed.map(|s| s.wrapping_add(u64::from(attempt - 1)));
        match transmit(&pass, &message, tokio::signal::ctrl_c()).await {
            Ok(mut out) => {
                if cli.trim {
                    let end = out.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
                    out.truncate(end);
                }
                let mut stdout = tokio::io::stdout();
                stdout.write_all(&out).await?;
                stdout.flush().await?;
                info!(attempt, "message decoded");
                return Ok(());
            }
            Err(e) if e.is_recoverable() => {
                warn!(attempt, attempts, "decode pass failed: {e}");
                last_err = Some(e);
            }
            Err(e) => return Err(e.into()),
        }
    }
    match last_err {
        Some(e) => Err(anyhow::Error::new(e).context(format!("giving up after {attempts} attempts"))),
        None => bail!("no decode attempt ran"),
    }
}
