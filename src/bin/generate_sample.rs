use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime};

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// One generated column: daily sine around `base` plus noise.
struct Signal {
    name: &'static str,
    base: f64,
    amplitude: f64,
    noise: f64,
}

impl Signal {
    fn sample(&self, hour: f64, rng: &mut SimpleRng) -> f64 {
        let daily = (2.0 * std::f64::consts::PI * hour / 24.0).sin();
        self.base + self.amplitude * daily + rng.gauss(0.0, self.noise)
    }
}

fn write_file(
    path: &Path,
    start: NaiveDateTime,
    step: Duration,
    rows: usize,
    signals: &[Signal],
    rng: &mut SimpleRng,
) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;

    let mut header = vec!["Timestamp"];
    header.extend(signals.iter().map(|s| s.name));
    writer.write_record(&header)?;

    for row in 0..rows {
        let ts = start + step * row as i32;
        let hour = (step * row as i32).num_minutes() as f64 / 60.0;
        let mut record = vec![ts.format("%Y-%m-%d %H:%M:%S").to_string()];
        record.extend(signals.iter().map(|s| format!("{:.3}", s.sample(hour, rng))));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let out_dir = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut rng = SimpleRng::new(42);
    let start = NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .context("invalid start date")?;

    // Different scales and sampling rates so the overlaid axes matter.
    let files: [(&str, Duration, usize, Vec<Signal>); 3] = [
        (
            "weather.csv",
            Duration::minutes(30),
            336,
            vec![
                Signal { name: "Temp", base: 18.0, amplitude: 6.0, noise: 0.4 },
                Signal { name: "Humidity", base: 55.0, amplitude: 15.0, noise: 2.0 },
            ],
        ),
        (
            "pressure.csv",
            Duration::hours(1),
            168,
            vec![Signal { name: "Pressure", base: 1013.0, amplitude: 4.0, noise: 0.8 }],
        ),
        (
            "pump.csv",
            Duration::minutes(15),
            672,
            vec![
                Signal { name: "Flow", base: 0.35, amplitude: 0.1, noise: 0.02 },
                Signal { name: "Power", base: 2400.0, amplitude: 600.0, noise: 50.0 },
            ],
        ),
    ];

    for (name, step, rows, signals) in &files {
        let path = out_dir.join(name);
        write_file(&path, start, *step, *rows, signals, &mut rng)?;
        println!("Wrote {rows} rows to {}", path.display());
    }
    Ok(())
}
