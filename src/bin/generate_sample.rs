use std::f64::consts::PI;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use image::{Rgb, RgbImage};

/// Write a synthetic tedana-style results folder for trying out compview.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Output folder
    #[arg(default_value = "sample_tedana")]
    out: PathBuf,

    /// Number of components
    #[arg(long, default_value_t = 24)]
    components: usize,

    /// Number of volumes
    #[arg(long, default_value_t = 200)]
    volumes: usize,

    #[arg(long, default_value_t = 42)]
    seed: u64,
}

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

    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
        mean + std_dev * z
    }
}

struct SampleComponent {
    label: String,
    kappa: f64,
    rho: f64,
    variance: f64,
    classification: &'static str,
    tags: &'static str,
    /// Oscillation frequency in cycles per volume.
    frequency: f64,
}

fn make_components(n: usize, rng: &mut SimpleRng) -> Vec<SampleComponent> {
    let raw: Vec<f64> = (0..n).map(|_| rng.uniform(0.5, 10.0)).collect();
    let total: f64 = raw.iter().sum();
    (0..n)
        .map(|i| {
            let kappa = rng.uniform(10.0, 120.0);
            let rho = rng.uniform(5.0, 80.0);
            let (classification, tags) = if i % 11 == 10 {
                ("ignored", "Low variance")
            } else if kappa > rho {
                ("accepted", "Likely BOLD")
            } else {
                ("rejected", "Unlikely BOLD")
            };
            SampleComponent {
                label: format!("ICA_{i:02}"),
                kappa,
                rho,
                variance: 100.0 * raw[i] / total,
                classification,
                tags,
                frequency: rng.uniform(0.01, 0.45),
            }
        })
        .collect()
}

fn write_metrics(path: &Path, comps: &[SampleComponent]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record([
        "Component",
        "kappa",
        "rho",
        "variance explained",
        "normalized variance explained",
        "dice_FT2",
        "dice_FS0",
        "signal-noise_t",
        "classification",
        "classification_tags",
    ])?;
    for (i, c) in comps.iter().enumerate() {
        let dice = (c.kappa / 120.0).min(1.0);
        writer.write_record([
            c.label.clone(),
            format!("{:.4}", c.kappa),
            format!("{:.4}", c.rho),
            format!("{:.4}", c.variance),
            format!("{:.6}", c.variance / 100.0),
            format!("{dice:.4}"),
            format!("{:.4}", 1.0 - dice),
            // One tiny value to exercise scientific formatting.
            if i == 0 { "0.00003".to_string() } else { format!("{:.3}", c.kappa - c.rho) },
            c.classification.to_string(),
            c.tags.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_mixing(
    path: &Path,
    comps: &[SampleComponent],
    volumes: usize,
    rng: &mut SimpleRng,
) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(comps.iter().map(|c| c.label.as_str()))?;
    let phases: Vec<f64> = comps.iter().map(|_| rng.uniform(0.0, 2.0 * PI)).collect();
    for t in 0..volumes {
        let row: Vec<String> = comps
            .iter()
            .zip(&phases)
            .map(|(c, phase)| {
                let v = (2.0 * PI * c.frequency * t as f64 + phase).sin() + rng.gauss(0.0, 0.3);
                format!("{v:.6}")
            })
            .collect();
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Small striped PNG standing in for a component figure.
fn write_figure(path: &Path, comp: &SampleComponent) -> Result<()> {
    let stripes = (comp.frequency * 40.0).max(1.0) as u32;
    let tint = match comp.classification {
        "accepted" => Rgb([0xA8, 0xE3, 0xA5]),
        "rejected" => Rgb([0xE9, 0x94, 0x97]),
        _ => Rgb([0xB5, 0xDE, 0xFF]),
    };
    let img = RgbImage::from_fn(320, 120, |x, _| {
        if (x * stripes / 320) % 2 == 0 { tint } else { Rgb([40, 40, 40]) }
    });
    img.save(path)
        .with_context(|| format!("writing {}", path.display()))
}

fn write_carpet(path: &Path, rng: &mut SimpleRng) -> Result<()> {
    let mut svg = String::from(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="400" height="100">"#,
    );
    for row in 0..10 {
        for col in 0..40 {
            let shade = (rng.uniform(0.0, 1.0) * 255.0) as u8;
            svg.push_str(&format!(
                r#"<rect x="{}" y="{}" width="10" height="10" fill="rgb({shade},{shade},{shade})"/>"#,
                col * 10,
                row * 10
            ));
        }
    }
    svg.push_str("</svg>");
    fs::write(path, svg).with_context(|| format!("writing {}", path.display()))
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let mut rng = SimpleRng::new(args.seed);

    let figures = args.out.join("figures");
    fs::create_dir_all(&figures).with_context(|| format!("creating {}", figures.display()))?;

    let comps = make_components(args.components, &mut rng);
    write_metrics(&args.out.join("desc-tedana_metrics.tsv"), &comps)?;
    write_mixing(
        &args.out.join("desc-ICA_mixing.tsv"),
        &comps,
        args.volumes,
        &mut rng,
    )?;
    for (i, comp) in comps.iter().enumerate() {
        write_figure(&figures.join(format!("comp_{i:03}.png")), comp)?;
    }
    write_carpet(&figures.join("carpet_optcom.svg"), &mut rng)?;

    fs::write(
        args.out.join("report.txt"),
        format!(
            "Synthetic decomposition with {} components over {} volumes.\n",
            comps.len(),
            args.volumes
        ),
    )?;
    fs::write(
        args.out.join("tedana_2024-01-01T000000.tsv"),
        format!("time\tmessage\tOutput directory: {}\n", args.out.display()),
    )?;

    println!(
        "Wrote {} components ({} volumes each) to {}",
        comps.len(),
        args.volumes,
        args.out.display()
    );
    Ok(())
}
