//! Synthetic WFDB data roots for integration tests

#![allow(dead_code)]

use std::path::Path;

use afib_detect::record::wfdb::{encode_annotations, Annotation};

pub const FS: u32 = 128;

/// Deterministic generator so fixtures are identical on every run
struct Lcg(u64);

impl Lcg {
    fn next_unit(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// Beat sample positions with R-R intervals drawn from `[min_s, max_s]` seconds
pub fn beats(count: usize, min_s: f64, max_s: f64, seed: u64) -> Vec<u64> {
    let mut rng = Lcg(seed);
    let mut position = 50u64;
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        out.push(position);
        let rr = min_s + (max_s - min_s) * rng.next_unit();
        position += (rr * FS as f64).round() as u64;
    }
    out
}

/// Write `<dir>/<name>.hea`, `.dat` and `.<suffix>` for one record
pub fn write_record(dir: &Path, name: &str, beat_samples: &[u64], suffix: &str) {
    std::fs::create_dir_all(dir).unwrap();
    let last = beat_samples.last().copied().unwrap_or(0) + 100;
    std::fs::write(
        dir.join(format!("{name}.hea")),
        format!("{name} 2 {FS} {last}\n{name}.dat 212 200 11 1024 0 0 0 ECG\n"),
    )
    .unwrap();
    std::fs::write(dir.join(format!("{name}.dat")), [0u8; 16]).unwrap();
    let annotations: Vec<Annotation> = beat_samples
        .iter()
        .map(|&sample| Annotation { sample, code: 1 })
        .collect();
    std::fs::write(
        dir.join(format!("{name}.{suffix}")),
        encode_annotations(&annotations),
    )
    .unwrap();
}

/// Data root with `fa` irregular records in aftdb/learning-set and `normal`
/// regular records in nsrdb. The other aftdb subsets are created empty.
pub fn data_root(root: &Path, fa: usize, normal: usize) {
    let learning = root.join("aftdb/learning-set");
    for i in 0..fa {
        let b = beats(60, 0.35, 1.1, 1000 + i as u64);
        write_record(&learning, &format!("n{:02}", i + 1), &b, "qrs");
    }
    std::fs::create_dir_all(root.join("aftdb/test-set-a")).unwrap();
    std::fs::create_dir_all(root.join("aftdb/test-set-b")).unwrap();

    let nsrdb = root.join("nsrdb");
    for i in 0..normal {
        let b = beats(60, 0.78, 0.82, 2000 + i as u64);
        write_record(&nsrdb, &format!("{}", 16000 + i), &b, "atr");
    }
}
