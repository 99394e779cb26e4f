//! Solana Ed25519 vanity address search.
//!
//! GPU-accelerated brute-force search for a Base58 public key matching a
//! user-supplied pattern, with a CPU fallback. Keeps the teacher's
//! `console`/`indicatif` progress styling and `format_compact_*`/
//! `format_number` helpers; everything else is rewired for vanity search.

mod base58;
mod cpu_fallback;
mod difficulty;
mod driver;
mod error;
mod fe;
mod ge;
mod gpu;
mod gpu_detect;
mod kernel;
mod keypair;
mod pattern;
mod rng;
mod sha512;

use std::env;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::driver::{Backend, BackendPreference, SearchDriver};
use crate::error::SearchError;
use crate::pattern::{PatternConfig, PatternMode};

/// Solana vanity address search.
#[derive(Parser, Debug)]
#[command(name = "grind")]
#[command(about = "Brute-force search for a Solana address matching a pattern")]
#[command(version)]
struct Args {
    /// Pattern to match, optionally suffixed with `:<count>` (default 1).
    /// Falls back to `VANITY_PATTERN` if omitted.
    pattern: Option<String>,

    /// Case-sensitive comparison (default: case-insensitive)
    #[arg(short = 's', long = "case-sensitive")]
    case_sensitive: bool,

    /// Anchor the pattern at the start of the address (default)
    #[arg(long)]
    prefix: bool,

    /// Anchor the pattern at the end of the address
    #[arg(long)]
    suffix: bool,

    /// Match the pattern anywhere in the address
    #[arg(long)]
    anywhere: bool,

    /// Force the CPU fallback path
    #[arg(long)]
    cpu: bool,

    /// Work-group size for GPU, worker count for CPU
    #[arg(long, default_value_t = 64)]
    threads: usize,

    /// Run CPU and GPU against a fixed pattern for 10s and report throughput
    #[arg(long)]
    benchmark: bool,
}

/// Resolved command line, after folding in the `VANITY_PATTERN`/`MATCH_MODE`/
/// `CASE_SENSITIVE` environment fallbacks named in spec §6.
struct Cli {
    pattern: String,
    target_count: usize,
    case_sensitive: bool,
    mode: PatternMode,
    force_cpu: bool,
    threads: usize,
    benchmark: bool,
}

fn env_truthy(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}

fn resolve_args(args: Args) -> Cli {
    let mode = if args.anywhere {
        PatternMode::Anywhere
    } else if args.suffix {
        PatternMode::Suffix
    } else if let Ok(v) = env::var("MATCH_MODE") {
        match v.as_str() {
            "suffix" => PatternMode::Suffix,
            "anywhere" => PatternMode::Anywhere,
            _ => PatternMode::Prefix,
        }
    } else {
        PatternMode::Prefix
    };

    let case_sensitive = args.case_sensitive
        || env::var("CASE_SENSITIVE")
            .map(|v| env_truthy(&v))
            .unwrap_or(false);

    let raw = args
        .pattern
        .or_else(|| env::var("VANITY_PATTERN").ok())
        .unwrap_or_default();
    let (pattern, target_count) = match raw.rsplit_once(':') {
        Some((p, count)) => (p.to_string(), count.parse::<usize>().unwrap_or(1).max(1)),
        None => (raw, 1),
    };

    Cli {
        pattern,
        target_count,
        case_sensitive,
        mode,
        force_cpu: args.cpu,
        threads: args.threads.max(1),
        benchmark: args.benchmark,
    }
}

fn build_pattern(cli: &Cli) -> Result<PatternConfig, SearchError> {
    if cli.benchmark {
        return Ok(PatternConfig::new("ZZZZ", PatternMode::Prefix, false));
    }
    if let Err((ch, pos)) = pattern::validate(&cli.pattern) {
        return Err(SearchError::InvalidPattern { ch, pos });
    }
    Ok(PatternConfig::new(&cli.pattern, cli.mode, cli.case_sensitive))
}

fn main() {
    let exit_code = match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<i32, SearchError> {
    let cli = resolve_args(Args::parse());

    let pattern = build_pattern(&cli)?;

    println!(
        "{}",
        style("═══════════════════════════════════════════════════════════").cyan()
    );
    println!(
        "{}",
        style("              Solana Vanity Address Search").cyan().bold()
    );
    println!(
        "{}",
        style("═══════════════════════════════════════════════════════════").cyan()
    );
    println!("{} Pattern: {}", style("ℹ").blue(), pattern.description());
    println!(
        "{} Target:  {} match(es)",
        style("ℹ").blue(),
        cli.target_count
    );
    print_gpu_diagnostics();

    if cli.benchmark {
        return run_benchmark(&pattern, cli.threads);
    }

    let preference = if cli.force_cpu {
        BackendPreference::ForceCpu
    } else {
        BackendPreference::PreferGpu
    };

    let mut driver = match SearchDriver::start(preference, cli.threads, pattern.clone()) {
        Err(SearchError::NoGpu) => {
            eprintln!("No GPU adapter could be opened; rerun with --cpu to force the CPU path.");
            return Err(SearchError::NoGpu);
        }
        other => other?,
    };

    match driver.backend() {
        Backend::Gpu => println!(
            "{} Backend: GPU ({})",
            style("ℹ").blue(),
            driver.gpu_adapter_name().unwrap_or("unknown adapter")
        ),
        Backend::Cpu => println!(
            "{} Backend: CPU ({} worker threads)",
            style("ℹ").blue(),
            cli.threads
        ),
    }
    println!();

    let progress_bar = ProgressBar::new_spinner();
    progress_bar.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap(),
    );
    progress_bar.enable_steady_tick(Duration::from_millis(100));

    let start_time = Instant::now();
    let p50 = difficulty::p50_attempts(&pattern);
    let mut found_count = 0usize;
    let output_dir = PathBuf::from(".");

    loop {
        match driver.receiver().recv_timeout(Duration::from_millis(200)) {
            Ok(found) => {
                if let Err(e) = driver::verify(&found) {
                    progress_bar.finish_and_clear();
                    return Err(e);
                }

                found_count += 1;
                let saved_path = match keypair::save(&output_dir, &found.address, &found.private_key) {
                    Ok(path) => Some(path),
                    Err(e) => {
                        eprintln!("Warning: failed to write key file: {}", e);
                        None
                    }
                };

                progress_bar.suspend(|| {
                    println!();
                    println!(
                        "*** FOUND MATCH {}/{}! ***",
                        found_count, cli.target_count
                    );
                    println!("Address: {}", found.address);
                    println!("Public Key (Base58): {}", found.address);
                    println!("VERIFIED: Address matches Base58(PublicKey)");
                    if let Some(path) = &saved_path {
                        println!("Saved: {}", path.display());
                    }
                    println!();
                });

                if found_count >= cli.target_count {
                    break;
                }
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {}
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
        }

        let attempts = driver.total_attempts();
        let elapsed = start_time.elapsed();
        let rate = if elapsed.as_secs_f64() > 0.0 {
            attempts as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };
        let eta_seconds = if rate > 0.0 {
            (p50 - attempts as f64).max(0.0) / rate
        } else {
            f64::INFINITY
        };
        let eta_display = if eta_seconds.is_finite() {
            format!("ETA {:.0}s", eta_seconds)
        } else {
            "ETA ∞".to_string()
        };

        progress_bar.set_message(format!(
            "{attempts:>10} | Rate: {rate:>8}/s | Found: {found:>3}/{target:<3} | {eta}",
            attempts = format_compact_u64(attempts),
            rate = format_compact_f64(rate),
            found = found_count,
            target = cli.target_count,
            eta = eta_display,
        ));
    }

    driver.stop();
    progress_bar.finish_and_clear();

    let elapsed = start_time.elapsed();
    let attempts = driver.total_attempts();
    let rate = if elapsed.as_secs_f64() > 0.0 {
        attempts as f64 / elapsed.as_secs_f64()
    } else {
        0.0
    };

    println!();
    println!(
        "{}",
        style("═══════════════════════════════════════════════════════════").cyan()
    );
    println!("  Total Time:     {:.2}s", elapsed.as_secs_f64());
    println!("  Total Attempts: {}", format_number(attempts));
    println!("  Average Rate:   {:.0} addr/sec", rate);
    println!("  Matches Found:  {}", found_count);
    println!(
        "{}",
        style("═══════════════════════════════════════════════════════════").cyan()
    );

    Ok(0)
}

/// Print what `gpu_detect` can see before committing to a backend: whether
/// any adapter is available at all, which one would be preferred, and the
/// one-line-per-adapter detail dump.
fn print_gpu_diagnostics() {
    if gpu_detect::gpu_available() {
        println!(
            "{} GPU detected (preferred backend: {})",
            style("ℹ").blue(),
            gpu_detect::best_backend()
        );
    } else {
        println!("{} No GPU adapter detected", style("ℹ").blue());
    }
    gpu_detect::print_gpu_summary();
}

/// Run the fixed `ZZZZ` pattern against each backend for its own 10-second
/// window and report throughput for both, per the benchmark mode named in
/// spec §6/S2. A backend that can't be opened (no GPU adapter) is reported
/// as unavailable rather than failing the whole run.
fn run_benchmark(pattern: &PatternConfig, threads: usize) -> Result<i32, SearchError> {
    println!();
    println!(
        "{}",
        style("Benchmark mode: each backend runs for 10s").yellow()
    );

    let cpu = bench_one_backend("CPU", BackendPreference::ForceCpu, threads, pattern.clone());
    let gpu = bench_one_backend("GPU", BackendPreference::PreferGpu, threads, pattern.clone());

    println!();
    println!(
        "{}",
        style("═══════════════════════════════════════════════════════════").cyan()
    );
    println!("  Benchmark pattern: {}", pattern.description());
    match cpu {
        Some((attempts, rate)) => println!(
            "  CPU: {} attempts in 10s ({:.0} addr/sec)",
            format_number(attempts),
            rate
        ),
        None => println!("  CPU: unavailable"),
    }
    match gpu {
        Some((attempts, rate)) => println!(
            "  GPU: {} attempts in 10s ({:.0} addr/sec)",
            format_number(attempts),
            rate
        ),
        None => println!("  GPU: unavailable (no wgpu adapter found)"),
    }
    println!(
        "{}",
        style("═══════════════════════════════════════════════════════════").cyan()
    );

    Ok(0)
}

const BENCHMARK_WINDOW: Duration = Duration::from_secs(10);

/// Drive one backend for [`BENCHMARK_WINDOW`] and return its (attempts, rate).
/// `None` means the backend could not be opened at all (e.g. no GPU adapter);
/// matches found during the window are drained but not persisted.
fn bench_one_backend(
    label: &str,
    preference: BackendPreference,
    threads: usize,
    pattern: PatternConfig,
) -> Option<(u64, f64)> {
    let mut driver = match SearchDriver::start(preference, threads, pattern) {
        Ok(d) => d,
        Err(SearchError::NoGpu) => return None,
        Err(e) => {
            eprintln!("Warning: {} backend failed to start: {}", label, e);
            return None;
        }
    };

    println!("{} Running {} benchmark...", style("ℹ").blue(), label);
    let start = Instant::now();
    while start.elapsed() < BENCHMARK_WINDOW {
        let _ = driver.receiver().recv_timeout(Duration::from_millis(200));
    }
    driver.stop();

    let elapsed = start.elapsed().as_secs_f64();
    let attempts = driver.total_attempts();
    let rate = if elapsed > 0.0 {
        attempts as f64 / elapsed
    } else {
        0.0
    };
    Some((attempts, rate))
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Compact human-readable formatting: 24.8k, 1.2M, etc.
fn format_compact_u64(n: u64) -> String {
    const K: f64 = 1_000.0;
    const M: f64 = 1_000_000.0;
    const B: f64 = 1_000_000_000.0;

    let f = n as f64;
    if f >= B {
        format!("{:.1}B", f / B)
    } else if f >= M {
        format!("{:.1}M", f / M)
    } else if f >= K {
        format!("{:.1}k", f / K)
    } else {
        format!("{}", n)
    }
}

fn format_compact_f64(n: f64) -> String {
    const K: f64 = 1_000.0;
    const M: f64 = 1_000_000.0;
    const B: f64 = 1_000_000_000.0;

    if n.is_infinite() {
        return "∞".to_string();
    }

    if n >= B {
        format!("{:.1}B", n / B)
    } else if n >= M {
        format!("{:.1}M", n / M)
    } else if n >= K {
        format!("{:.1}k", n / K)
    } else {
        format!("{:.0}", n)
    }
}
