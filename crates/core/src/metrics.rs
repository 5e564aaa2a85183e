//! Metrics collection and reporting for codec runs.
//!
//! Tracks what a sequence of sessions did:
//! - Throughput (bytes in/out)
//! - Compression ratio and bits per symbol
//! - Escapes (first-time symbols) and lenient degradations
//! - Timing information
//!
//! # Thread Safety
//!
//! `Metrics` is a plain struct updated by the caller after each session.
//! Per-thread instances can be combined with [`Metrics::merge`].

use std::time::{Duration, Instant};

use crate::session::SessionStats;

/// Counters for a run of compress/decompress sessions.
#[derive(Debug, Clone)]
pub struct Metrics {
    // === Timing ===
    /// When the run started
    pub start_time: Instant,

    /// When the run ended (set on completion)
    pub end_time: Option<Instant>,

    // === Compression ===
    /// Messages compressed
    pub messages_compressed: u64,

    /// Uncompressed bytes fed to compression
    pub raw_bytes: u64,

    /// Bytes produced by compression, prefixes included
    pub compressed_bytes: u64,

    /// Symbols sent as NYT + literal
    pub escapes: u64,

    /// Bitstream bits written, prefixes excluded
    pub bits_written: u64,

    // === Decompression ===
    /// Messages decompressed
    pub messages_decompressed: u64,

    /// Bytes produced by decompression
    pub decoded_bytes: u64,

    // === Faults ===
    /// Sessions that clamped, truncated or zero-filled
    pub degraded_sessions: u64,

    /// Sessions that returned an error
    pub failed_sessions: u64,
}

impl Metrics {
    /// Create new metrics with start time set to now.
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            end_time: None,
            messages_compressed: 0,
            raw_bytes: 0,
            compressed_bytes: 0,
            escapes: 0,
            bits_written: 0,
            messages_decompressed: 0,
            decoded_bytes: 0,
            degraded_sessions: 0,
            failed_sessions: 0,
        }
    }

    /// Account for one compression session.
    pub fn record_compress(&mut self, stats: &SessionStats) {
        self.messages_compressed += 1;
        self.raw_bytes += stats.input_bytes as u64;
        self.compressed_bytes += stats.output_bytes as u64;
        self.escapes += stats.escapes as u64;
        self.bits_written += stats.bits as u64;
        if stats.degraded {
            self.degraded_sessions += 1;
        }
    }

    /// Account for one decompression session.
    pub fn record_decompress(&mut self, stats: &SessionStats) {
        self.messages_decompressed += 1;
        self.decoded_bytes += stats.output_bytes as u64;
        if stats.degraded {
            self.degraded_sessions += 1;
        }
    }

    /// Account for a session that failed outright.
    pub fn record_failure(&mut self) {
        self.failed_sessions += 1;
    }

    /// Fold another set of counters into this one.
    pub fn merge(&mut self, other: &Metrics) {
        self.messages_compressed += other.messages_compressed;
        self.raw_bytes += other.raw_bytes;
        self.compressed_bytes += other.compressed_bytes;
        self.escapes += other.escapes;
        self.bits_written += other.bits_written;
        self.messages_decompressed += other.messages_decompressed;
        self.decoded_bytes += other.decoded_bytes;
        self.degraded_sessions += other.degraded_sessions;
        self.failed_sessions += other.failed_sessions;
    }

    /// Mark the run as complete.
    pub fn complete(&mut self) {
        self.end_time = Some(Instant::now());
    }

    /// Get total duration (or current elapsed if not complete).
    pub fn duration(&self) -> Duration {
        match self.end_time {
            Some(end) => end.duration_since(self.start_time),
            None => self.start_time.elapsed(),
        }
    }

    /// Compute compression ratio (compressed / raw).
    ///
    /// Returns 0.0 if no data compressed.
    pub fn compression_ratio(&self) -> f64 {
        if self.raw_bytes == 0 {
            0.0
        } else {
            self.compressed_bytes as f64 / self.raw_bytes as f64
        }
    }

    /// Average bitstream bits per input symbol.
    pub fn bits_per_symbol(&self) -> f64 {
        if self.raw_bytes == 0 {
            0.0
        } else {
            self.bits_written as f64 / self.raw_bytes as f64
        }
    }

    /// Compute throughput in bytes/second over raw and decoded bytes.
    pub fn throughput_bps(&self) -> f64 {
        let duration_secs = self.duration().as_secs_f64();
        if duration_secs == 0.0 {
            0.0
        } else {
            (self.raw_bytes + self.decoded_bytes) as f64 / duration_secs
        }
    }

    /// Print a human-readable summary to stdout.
    pub fn print_summary(&self) {
        let duration_ms = self.duration().as_millis();

        println!("\n=== Codec Summary ===");
        println!("Duration: {} ms", duration_ms);
        println!();

        println!("=== Compression ===");
        println!("Messages: {}", self.messages_compressed);
        println!("Raw bytes: {} ({:.2} KiB)", self.raw_bytes, self.raw_bytes as f64 / 1024.0);
        println!(
            "Compressed: {} ({:.2} KiB)",
            self.compressed_bytes,
            self.compressed_bytes as f64 / 1024.0
        );
        println!("Ratio: {:.1}%", self.compression_ratio() * 100.0);
        println!("Bits/symbol: {:.3}", self.bits_per_symbol());
        println!("Escapes: {}", self.escapes);
        println!();

        println!("=== Decompression ===");
        println!("Messages: {}", self.messages_decompressed);
        println!("Decoded bytes: {}", self.decoded_bytes);
        println!();

        println!("=== Faults ===");
        println!("Degraded sessions: {}", self.degraded_sessions);
        println!("Failed sessions: {}", self.failed_sessions);
        println!();

        println!("=== Performance ===");
        println!("Throughput: {:.2} MB/s", self.throughput_bps() / 1_000_000.0);
        println!();
    }

    /// Print just the final result (pass/fail).
    pub fn print_result(&self) {
        if self.failed_sessions == 0 && self.degraded_sessions == 0 {
            println!(
                "✓ Completed {} sessions",
                self.messages_compressed + self.messages_decompressed
            );
        } else if self.failed_sessions > 0 {
            println!("✗ {} sessions failed", self.failed_sessions);
        } else {
            println!("! {} sessions degraded", self.degraded_sessions);
        }
    }

    /// Export metrics as a simple text format (for parsing/testing).
    pub fn export_text(&self) -> String {
        format!(
            "duration_ms={}\n\
             messages_compressed={}\n\
             raw_bytes={}\n\
             compressed_bytes={}\n\
             compression_ratio={:.4}\n\
             bits_per_symbol={:.4}\n\
             escapes={}\n\
             messages_decompressed={}\n\
             decoded_bytes={}\n\
             degraded_sessions={}\n\
             failed_sessions={}\n",
            self.duration().as_millis(),
            self.messages_compressed,
            self.raw_bytes,
            self.compressed_bytes,
            self.compression_ratio(),
            self.bits_per_symbol(),
            self.escapes,
            self.messages_decompressed,
            self.decoded_bytes,
            self.degraded_sessions,
            self.failed_sessions,
        )
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(input: usize, output: usize, degraded: bool) -> SessionStats {
        SessionStats {
            symbols: input,
            escapes: 2,
            bits: output * 8,
            input_bytes: input,
            output_bytes: output,
            degraded,
        }
    }

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new();
        assert!(metrics.end_time.is_none());
        assert!(metrics.duration().as_millis() < 100);
    }

    #[test]
    fn test_compression_ratio() {
        let mut metrics = Metrics::new();
        metrics.record_compress(&stats(1000, 750, false));

        assert_eq!(metrics.compression_ratio(), 0.75);
        assert_eq!(metrics.bits_per_symbol(), 6.0);
        assert_eq!(metrics.escapes, 2);
    }

    #[test]
    fn test_degraded_and_failed() {
        let mut metrics = Metrics::new();
        metrics.record_decompress(&stats(10, 40, true));
        metrics.record_failure();

        assert_eq!(metrics.degraded_sessions, 1);
        assert_eq!(metrics.failed_sessions, 1);
        assert_eq!(metrics.decoded_bytes, 40);
    }

    #[test]
    fn test_merge() {
        let mut a = Metrics::new();
        let mut b = Metrics::new();
        a.record_compress(&stats(100, 50, false));
        b.record_compress(&stats(300, 100, false));
        a.merge(&b);

        assert_eq!(a.messages_compressed, 2);
        assert_eq!(a.compression_ratio(), 0.375);
    }

    #[test]
    fn test_throughput() {
        let mut metrics = Metrics::new();
        metrics.raw_bytes = 1_000_000;

        std::thread::sleep(Duration::from_millis(10));
        metrics.complete();

        assert!(metrics.throughput_bps() > 0.0);
    }

    #[test]
    fn test_export_text() {
        let mut metrics = Metrics::new();
        metrics.record_compress(&stats(1000, 400, false));
        metrics.record_decompress(&stats(400, 1000, false));

        let text = metrics.export_text();
        assert!(text.contains("raw_bytes=1000"));
        assert!(text.contains("compressed_bytes=400"));
        assert!(text.contains("decoded_bytes=1000"));
        assert!(text.contains("compression_ratio=0.4000"));
    }
}
