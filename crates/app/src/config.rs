//! Configuration for the adhuff command-line tool.
//!
//! Handles parsing command-line arguments and generating sensible defaults
//! (including a randomized sample size that is reproducible with a seed).
//!
//! The tool works with ZERO arguments: it generates a sample input, runs it
//! through a compress/decompress round trip and prints the metrics.

use adaptive_huffman_core::{DecodeMode, DEFAULT_CAPACITY, MAX_PAYLOAD};
use log::LevelFilter;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::path::PathBuf;

/// What the run does with its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Raw input -> container of compressed chunks
    Compress,
    /// Container of compressed chunks -> raw output
    Decompress,
    /// Compress, decompress and verify in memory
    RoundTrip,
}

impl Mode {
    fn parse(s: &str) -> Result<Self, String> {
        match s {
            "compress" | "c" => Ok(Mode::Compress),
            "decompress" | "d" => Ok(Mode::Decompress),
            "roundtrip" | "rt" => Ok(Mode::RoundTrip),
            _ => Err(format!("unknown mode: {}", s)),
        }
    }
}

/// Complete configuration for a run.
#[derive(Debug, Clone)]
pub struct Config {
    // === Files ===
    /// Input file path (None = generate sample)
    pub input_file: Option<PathBuf>,

    /// Output file path (None = don't write)
    pub output_file: Option<PathBuf>,

    // === Codec ===
    pub mode: Mode,

    /// Bytes per compressed message (at most the 16-bit prefix limit)
    pub chunk_bytes: usize,

    /// Destination capacity per message
    pub capacity: usize,

    /// Lenient or strict handling of damaged streams
    pub decode_mode: DecodeMode,

    /// Carry model statistics from one chunk to the next
    pub persistent: bool,

    // === Sample input ===
    pub seed: u64,

    /// Size of the generated sample when no input file is given
    pub sample_bytes: usize,

    // === Behavior ===
    /// Whether to print detailed config
    pub print_config: bool,

    /// Whether to print detailed metrics summary
    pub print_metrics: bool,

    pub log_level: LevelFilter,
}

impl Config {
    /// Parse configuration from command-line arguments.
    ///
    /// Without --seed a time-based seed is used; the resolved seed is part
    /// of the printed config so a run can be repeated.
    pub fn from_args(args: &[String]) -> Result<Self, String> {
        let mut input_file: Option<PathBuf> = None;
        let mut output_file: Option<PathBuf> = None;
        let mut mode: Option<Mode> = None;
        let mut chunk_bytes: Option<usize> = None;
        let mut capacity: Option<usize> = None;
        let mut decode_mode = DecodeMode::Lenient;
        let mut persistent = false;
        let mut seed: Option<u64> = None;
        let mut sample_bytes: Option<usize> = None;
        let mut print_config = false;
        let mut print_metrics = true;
        let mut log_level = LevelFilter::Warn;

        let mut i = 0;
        while i < args.len() {
            match args[i].as_str() {
                "--in" => {
                    let v = value(args, &mut i, "--in requires a path")?;
                    input_file = Some(PathBuf::from(v));
                }
                "--out" => {
                    let v = value(args, &mut i, "--out requires a path")?;
                    output_file = Some(PathBuf::from(v));
                }
                "--mode" => {
                    let v = value(args, &mut i, "--mode requires a value")?;
                    mode = Some(Mode::parse(v)?);
                }
                "--chunk-bytes" => {
                    let v = value(args, &mut i, "--chunk-bytes requires a number")?;
                    chunk_bytes = Some(v.parse().map_err(|_| "invalid chunk-bytes")?);
                }
                "--capacity" => {
                    let v = value(args, &mut i, "--capacity requires a number")?;
                    capacity = Some(v.parse().map_err(|_| "invalid capacity")?);
                }
                "--seed" => {
                    let v = value(args, &mut i, "--seed requires a number")?;
                    seed = Some(v.parse().map_err(|_| "invalid seed")?);
                }
                "--size" => {
                    let v = value(args, &mut i, "--size requires a number")?;
                    sample_bytes = Some(v.parse().map_err(|_| "invalid size")?);
                }
                "--strict" => {
                    decode_mode = DecodeMode::Strict;
                }
                "--persistent" => {
                    persistent = true;
                }
                "--print-config" => {
                    print_config = true;
                }
                "--no-metrics" => {
                    print_metrics = false;
                }
                "--verbose" | "-v" => {
                    log_level = match log_level {
                        LevelFilter::Warn => LevelFilter::Info,
                        LevelFilter::Info => LevelFilter::Debug,
                        _ => LevelFilter::Trace,
                    };
                }
                "--quiet" | "-q" => {
                    log_level = LevelFilter::Off;
                }
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                _ => {
                    return Err(format!("unknown argument: {}", args[i]));
                }
            }
            i += 1;
        }

        let mode = mode.unwrap_or(Mode::RoundTrip);
        if mode == Mode::Decompress && input_file.is_none() {
            return Err("--mode decompress requires --in".to_string());
        }

        let chunk_bytes = chunk_bytes.unwrap_or(16 * 1024);
        if chunk_bytes == 0 || chunk_bytes > MAX_PAYLOAD {
            return Err(format!("chunk-bytes must be between 1 and {}", MAX_PAYLOAD));
        }

        // Determine seed (explicit or time-based)
        let seed = seed.unwrap_or_else(|| {
            use std::time::{SystemTime, UNIX_EPOCH};
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0)
        });
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        Ok(Config {
            input_file,
            output_file,
            mode,
            chunk_bytes,
            capacity: capacity.unwrap_or(DEFAULT_CAPACITY),
            decode_mode,
            persistent,
            seed,
            sample_bytes: sample_bytes.unwrap_or_else(|| rng.gen_range(64 * 1024..=512 * 1024)),
            print_config,
            print_metrics,
            log_level,
        })
    }

    /// Print the configuration in human-readable form.
    pub fn print(&self) {
        let path = |p: &Option<PathBuf>, none: &'static str| {
            p.as_ref()
                .map_or_else(|| none.to_string(), |p| p.display().to_string())
        };
        println!("=== Configuration ===");
        println!("Input file:  {}", path(&self.input_file, "(generate sample)"));
        println!("Output file: {}", path(&self.output_file, "(none)"));
        println!("Mode: {:?}", self.mode);
        println!();
        println!("=== Codec ===");
        println!("Chunk size: {} bytes", self.chunk_bytes);
        println!("Capacity: {} bytes", self.capacity);
        println!("Decode mode: {:?}", self.decode_mode);
        println!("Persistent model: {}", self.persistent);
        println!();
        println!("=== Sample ===");
        println!("Seed: {}", self.seed);
        println!("Sample size: {} bytes", self.sample_bytes);
        println!();
    }
}

/// Advance past a flag and return its value.
fn value<'a>(args: &'a [String], i: &mut usize, missing: &str) -> Result<&'a str, String> {
    *i += 1;
    args.get(*i)
        .map(String::as_str)
        .ok_or_else(|| missing.to_string())
}

fn print_help() {
    println!("adhuff: adaptive Huffman compression");
    println!();
    println!("USAGE:");
    println!("    adhuff [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    --in <PATH>             Input file (default: generate sample)");
    println!("    --out <PATH>            Output file (default: none)");
    println!("    --mode <MODE>           compress | decompress | roundtrip (default: roundtrip)");
    println!();
    println!(
        "    --chunk-bytes <N>       Bytes per message, max {} (default: 16384)",
        MAX_PAYLOAD
    );
    println!(
        "    --capacity <N>          Destination capacity per message (default: {})",
        DEFAULT_CAPACITY
    );
    println!("    --strict                Reject damaged streams instead of degrading");
    println!("    --persistent            Keep model statistics across messages (both ends)");
    println!();
    println!("    --seed <N>              Seed for the generated sample");
    println!("    --size <N>              Sample size in bytes (default: random 64-512 KiB)");
    println!();
    println!("    --print-config          Print resolved configuration");
    println!("    --no-metrics            Don't print metrics summary");
    println!("    --verbose, -v           More log output (repeatable)");
    println!("    --quiet, -q             No log output");
    println!("    --help, -h              Print this help");
    println!();
    println!("EXAMPLES:");
    println!("    adhuff                                         # Round trip a random sample");
    println!("    adhuff --seed 42 --persistent                  # Deterministic, carried model");
    println!("    adhuff --mode compress --in f.bin --out f.ahf  # Compress a file");
    println!("    adhuff --mode decompress --in f.ahf --out f    # Restore it");
    println!();
}
