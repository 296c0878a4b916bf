//! Exhaustive search over bounded bit-strings.
//!
//! From any string shorter than `max_len` you may append a bit; from any
//! non-empty string you may drop the last bit, or (when there is room) replace
//! it with two bits. Every string of length `0..=max_len` is reachable, so the
//! search must visit `2^(max_len + 1) - 1` states.
//!
//! ```text
//! RUST_LOG=parbfs=debug cargo run --release --example bitstrings -- 20 22 8
//! ```

use anyhow::{ensure, Context, Result};
use clap::Parser;
use parbfs::search::{BfsConfig, LevelSearch};
use parbfs::DedupeStrategy;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bitstrings")]
#[command(about = "Level-synchronous BFS over bit-strings of bounded length", long_about = None)]
struct Cli {
    /// Longest bit-string to generate
    max_len: usize,

    /// The dedupe set gets 2^BUCKET_BITS buckets
    bucket_bits: u32,

    /// Number of worker threads
    threads: usize,

    /// Use the lock-free dedupe set instead of the lock-striped one
    #[arg(long, default_value_t = false)]
    lock_free: bool,

    /// Fixed bucket seed (random per run when omitted)
    #[arg(long)]
    seed: Option<u64>,
}

/// Packs up to 64 bits plus a length so states stay small and cheap to hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct BitString {
    bits: u64,
    len: u8,
}

impl BitString {
    const EMPTY: Self = Self { bits: 0, len: 0 };

    fn push(self, bit: u64) -> Self {
        Self {
            bits: self.bits << 1 | bit,
            len: self.len + 1,
        }
    }

    fn pop(self) -> Self {
        Self {
            bits: self.bits >> 1,
            len: self.len - 1,
        }
    }

    fn transitions(self, max_len: usize) -> Vec<Self> {
        let mut out = Vec::with_capacity(7);
        let room = usize::from(self.len) < max_len;
        if room {
            out.push(self.push(0));
            out.push(self.push(1));
        }
        if self.len > 0 {
            let popped = self.pop();
            out.push(popped);
            if room {
                for b0 in [0, 1] {
                    for b1 in [0, 1] {
                        out.push(popped.push(b0).push(b1));
                    }
                }
            }
        }
        out
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("parbfs=info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    ensure!(cli.max_len < 63, "max_len must be below 63, got {}", cli.max_len);

    let strategy = if cli.lock_free {
        DedupeStrategy::LockFree
    } else {
        DedupeStrategy::Striped
    };
    let mut config = BfsConfig::new(cli.threads, cli.bucket_bits).with_strategy(strategy);
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }

    let max_len = cli.max_len;
    let report = LevelSearch::new(config)
        .run(BitString::EMPTY, |s| s.transitions(max_len))
        .map_err(anyhow::Error::from)
        .context("search failed")?;

    let expected = (1usize << (max_len + 1)) - 1;
    ensure!(
        report.total_visited == expected,
        "visited {} states, expected {expected}",
        report.total_visited
    );

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
