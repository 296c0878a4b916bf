use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::Command;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "parbfs workspace automation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Benchmark the scoped executor against the rayon pool
    Bench {
        /// Run quickly (lower sample size/time)
        #[arg(long, default_value_t = false)]
        quick: bool,

        /// Generate report only (skip running benchmarks)
        #[arg(long, default_value_t = false)]
        report_only: bool,
    },
}

const BENCH: &str = "bfs_benchmark";

/// (baseline name, cargo features)
const FEATURE_SETS: &[(&str, &[&str])] = &[("scoped", &[]), ("pool", &["parallel"])];

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Bench { quick, report_only } => {
            if !report_only {
                run_benchmarks(quick)?;
            }
            generate_report()?;
        }
    }

    Ok(())
}

fn run_benchmarks(quick: bool) -> Result<()> {
    for (baseline, features) in FEATURE_SETS {
        println!("\n>>> Benchmarking {baseline} (features: {features:?})");
        let start = Instant::now();

        let mut cmd = Command::new("cargo");
        cmd.args(["bench", "--bench", BENCH]);
        if !features.is_empty() {
            cmd.arg("--features").arg(features.join(","));
        }

        // Args for the test runner (Criterion) go after --
        cmd.arg("--").arg("--save-baseline").arg(baseline);
        if quick {
            cmd.args(["--measurement-time", "0.5", "--sample-size", "10", "--noplot"]);
        }

        let status = cmd
            .status()
            .with_context(|| format!("failed to run cargo bench for {baseline}"))?;
        if status.success() {
            println!("Finished {baseline} in {:.2?}", start.elapsed());
        } else {
            eprintln!("Warning: benchmark failed for {baseline}");
        }
    }

    Ok(())
}

fn generate_report() -> Result<()> {
    println!("\n>>> Generating Report...");
    let criterion_dir = Path::new("target/criterion");
    if !criterion_dir.exists() {
        eprintln!("No criterion output found at {}", criterion_dir.display());
        return Ok(());
    }

    // workload -> baseline -> mean time (ns)
    let mut results: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
    collect_results(criterion_dir, criterion_dir, &mut results)?;

    let report_path = Path::new("benchmark_results/report.md");
    if let Some(parent) = report_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = fs::File::create(report_path)
        .with_context(|| format!("failed to create {}", report_path.display()))?;

    writeln!(file, "# Executor Benchmark Report")?;
    writeln!(file)?;
    write!(file, "| Workload |")?;
    for (baseline, _) in FEATURE_SETS {
        write!(file, " {baseline} (ms) |")?;
    }
    writeln!(file, " pool vs scoped |")?;
    write!(file, "|---|")?;
    for _ in FEATURE_SETS {
        write!(file, "---|")?;
    }
    writeln!(file, "---|")?;

    for (workload, by_baseline) in &results {
        write!(file, "| {workload} |")?;
        for (baseline, _) in FEATURE_SETS {
            match by_baseline.get(*baseline) {
                Some(ns) => write!(file, " {:.3} |", ns / 1e6)?,
                None => write!(file, " N/A |")?,
            }
        }
        match (by_baseline.get("scoped"), by_baseline.get("pool")) {
            (Some(scoped), Some(pool)) if *pool > 0.0 => writeln!(file, " **{:.2}x** |", scoped / pool)?,
            _ => writeln!(file, " - |")?,
        }
    }

    println!("Report written to {}", report_path.display());
    Ok(())
}

/// Walks `target/criterion/<workload...>/<baseline>/estimates.json`.
fn collect_results(
    root: &Path,
    dir: &Path,
    results: &mut BTreeMap<String, BTreeMap<String, f64>>,
) -> Result<()> {
    for entry in fs::read_dir(dir)?.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_results(root, &path, results)?;
            continue;
        }
        if path.file_name().and_then(|s| s.to_str()) != Some("estimates.json") {
            continue;
        }
        let Some(baseline_dir) = path.parent() else { continue };
        let Some(baseline) = baseline_dir.file_name().and_then(|s| s.to_str()) else { continue };
        if !FEATURE_SETS.iter().any(|(name, _)| *name == baseline) {
            continue;
        }
        let Some(workload_dir) = baseline_dir.parent() else { continue };
        let workload = workload_dir
            .strip_prefix(root)
            .unwrap_or(workload_dir)
            .to_string_lossy()
            .replace('\\', "/");

        let content = fs::read_to_string(&path)?;
        let json: serde_json::Value = serde_json::from_str(&content)
            .with_context(|| format!("malformed {}", path.display()))?;
        if let Some(ns) = json.pointer("/mean/point_estimate").and_then(serde_json::Value::as_f64) {
            results.entry(workload).or_default().insert(baseline.to_string(), ns);
        }
    }
    Ok(())
}
