//! adhuff: compress, decompress or round-trip data through the adaptive
//! Huffman codec, one message-sized chunk at a time.

mod config;
mod container;
mod input_gen;
mod logger;

use adaptive_huffman_core::{
    compress_with, decompress_with, metrics::Metrics, Coded, Error, HuffmanPair, Result,
    SessionConfig,
};
use config::{Config, Mode};

/// Per-chunk codec: a fresh model for every message, or one pair carried
/// through the whole run.
enum Codec {
    Fresh(SessionConfig),
    Persistent(HuffmanPair),
}

impl Codec {
    fn new(config: &Config) -> Self {
        let session = SessionConfig {
            mode: config.decode_mode,
            capacity: config.capacity,
        };
        if config.persistent {
            Codec::Persistent(HuffmanPair::new(session))
        } else {
            Codec::Fresh(session)
        }
    }

    fn compress(&mut self, chunk: &[u8]) -> Result<Coded> {
        match self {
            Codec::Fresh(session) => compress_with(chunk, session),
            Codec::Persistent(pair) => pair.compress(chunk),
        }
    }

    fn decompress(&mut self, packed: &[u8]) -> Result<Coded> {
        match self {
            Codec::Fresh(session) => decompress_with(packed, session),
            Codec::Persistent(pair) => pair.decompress(packed),
        }
    }
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = match Config::from_args(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            eprintln!("run with --help for usage");
            std::process::exit(2);
        }
    };

    logger::init(config.log_level);
    if config.print_config {
        config.print();
    }

    let mut metrics = Metrics::new();
    let result = run(&config, &mut metrics);
    metrics.complete();

    if config.print_metrics {
        metrics.print_summary();
    }
    metrics.print_result();

    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(config: &Config, metrics: &mut Metrics) -> Result<()> {
    let mut codec = Codec::new(config);

    match config.mode {
        Mode::Compress => {
            let input = load_input(config)?;
            let packed = compress_all(&mut codec, &input, config.chunk_bytes, metrics)?;
            let bytes = container::write_frames(packed.iter().map(Vec::as_slice));
            write_output(config, &bytes)?;
        }
        Mode::Decompress => {
            let input = load_input(config)?;
            let frames = container::read_frames(&input)?;
            let output = decompress_all(&mut codec, &frames, metrics)?;
            write_output(config, &output)?;
        }
        Mode::RoundTrip => {
            let input = load_input(config)?;
            let packed = compress_all(&mut codec, &input, config.chunk_bytes, metrics)?;
            let frames: Vec<&[u8]> = packed.iter().map(Vec::as_slice).collect();
            let output = decompress_all(&mut codec, &frames, metrics)?;
            if output != input {
                return Err(Error::Config(format!(
                    "round trip mismatch: {} bytes in, {} bytes out",
                    input.len(),
                    output.len()
                )));
            }
            log::info!("round trip verified for {} bytes", input.len());
            write_output(config, &output)?;
        }
    }
    Ok(())
}

fn compress_all(
    codec: &mut Codec,
    input: &[u8],
    chunk_bytes: usize,
    metrics: &mut Metrics,
) -> Result<Vec<Vec<u8>>> {
    let mut packed = Vec::with_capacity(input.len().div_ceil(chunk_bytes));
    for (i, chunk) in input.chunks(chunk_bytes).enumerate() {
        match codec.compress(chunk) {
            Ok(coded) => {
                log::debug!("chunk {}: {} -> {} bytes", i, chunk.len(), coded.bytes.len());
                metrics.record_compress(&coded.stats);
                packed.push(coded.bytes);
            }
            Err(e) => {
                metrics.record_failure();
                return Err(e);
            }
        }
    }
    Ok(packed)
}

fn decompress_all(codec: &mut Codec, frames: &[&[u8]], metrics: &mut Metrics) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    for (i, frame) in frames.iter().enumerate() {
        match codec.decompress(frame) {
            Ok(coded) => {
                if coded.stats.degraded {
                    log::warn!("chunk {} was damaged and has been zero-filled", i);
                }
                metrics.record_decompress(&coded.stats);
                output.extend_from_slice(&coded.bytes);
            }
            Err(e) => {
                metrics.record_failure();
                return Err(e);
            }
        }
    }
    Ok(output)
}

fn load_input(config: &Config) -> Result<Vec<u8>> {
    match &config.input_file {
        Some(path) => {
            let data = std::fs::read(path)?;
            log::info!("read {} bytes from {}", data.len(), path.display());
            Ok(data)
        }
        None => {
            log::info!(
                "generating {} sample bytes with seed {}",
                config.sample_bytes,
                config.seed
            );
            Ok(input_gen::generate_sample_data(config.seed, config.sample_bytes))
        }
    }
}

fn write_output(config: &Config, bytes: &[u8]) -> Result<()> {
    if let Some(path) = &config.output_file {
        std::fs::write(path, bytes)?;
        log::info!("wrote {} bytes to {}", bytes.len(), path.display());
    }
    Ok(())
}
