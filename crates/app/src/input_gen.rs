//! Sample input generation.
//!
//! When no input file is specified we generate traffic that looks like a
//! stream of small game-state messages, so the adaptive model has something
//! to learn: a skewed set of text fields, long runs, small deltas and a
//! share of incompressible noise.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Generate `size_bytes` of mixed-compressibility data from `seed`.
pub fn generate_sample_data(seed: u64, size_bytes: usize) -> Vec<u8> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut data = Vec::with_capacity(size_bytes);

    while data.len() < size_bytes {
        let section = rng.gen_range(4..=2048).min(size_bytes - data.len());

        match rng.gen_range(0..10) {
            // 40% key/value text
            0..=3 => {
                const FIELDS: [&[u8]; 6] = [
                    b"origin ",
                    b"angles ",
                    b"health ",
                    b"weapon ",
                    b"score ",
                    b"ping ",
                ];
                let start = data.len();
                while data.len() - start < section {
                    data.extend_from_slice(FIELDS[rng.gen_range(0..FIELDS.len())]);
                    let n: u16 = rng.gen_range(0..1000);
                    data.extend_from_slice(n.to_string().as_bytes());
                    data.push(b'\n');
                }
                data.truncate(start + section);
            }

            // 20% runs of one byte
            4..=5 => {
                let byte: u8 = rng.gen();
                data.extend(std::iter::repeat(byte).take(section));
            }

            // 20% small signed deltas around zero
            6..=7 => {
                for _ in 0..section {
                    let delta: i8 = rng.gen_range(-3..=3);
                    data.push(delta as u8);
                }
            }

            // 20% noise
            _ => {
                for _ in 0..section {
                    data.push(rng.gen());
                }
            }
        }
    }

    data.truncate(size_bytes);
    data
}
