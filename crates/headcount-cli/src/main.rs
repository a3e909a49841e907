use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use headcount_core::{FaceAnalyzer, OnnxAnalyzer};
use headcount_hw::{Camera, FrameSource};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "headcount", about = "headcount camera and detection diagnostics")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List V4L2 capture devices
    Devices {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Capture frames and run face detection on them
    Test {
        /// V4L2 device path
        #[arg(short, long, default_value = "/dev/video0")]
        device: String,
        /// Number of frames to capture
        #[arg(short, long, default_value_t = 10)]
        frames: usize,
        /// Directory containing det_10g.onnx and w600k_r50.onnx
        #[arg(long)]
        model_dir: Option<PathBuf>,
        /// Only check capture, skip model loading
        #[arg(long)]
        no_detect: bool,
    },
}

#[derive(Serialize)]
struct DeviceRow {
    path: String,
    name: String,
    driver: String,
    bus: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Devices { json } => list_devices(json),
        Commands::Test {
            device,
            frames,
            model_dir,
            no_detect,
        } => run_test(&device, frames, model_dir, no_detect),
    }
}

fn list_devices(json: bool) -> Result<()> {
    let rows: Vec<DeviceRow> = Camera::list_devices()
        .into_iter()
        .map(|d| DeviceRow {
            path: d.path,
            name: d.name,
            driver: d.driver,
            bus: d.bus,
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("No capture devices found");
    }
    for row in rows {
        println!("{}\t{} ({}, {})", row.path, row.name, row.driver, row.bus);
    }
    Ok(())
}

fn run_test(device: &str, frames: usize, model_dir: Option<PathBuf>, no_detect: bool) -> Result<()> {
    tracing::debug!(device, frames, no_detect, "starting capture test");
    let mut camera = Camera::open(device, 640, 480).with_context(|| format!("could not open {device}"))?;
    println!(
        "{}: {}x{} {}",
        camera.device_path, camera.width, camera.height, camera.fourcc
    );

    let mut analyzer = if no_detect {
        None
    } else {
        let dir = model_dir.unwrap_or_else(headcount_core::default_model_dir);
        let scrfd = dir.join(headcount_core::SCRFD_MODEL_FILE);
        let arcface = dir.join(headcount_core::ARCFACE_MODEL_FILE);
        let analyzer = OnnxAnalyzer::load(&scrfd.to_string_lossy(), &arcface.to_string_lossy(), 0.5)
            .context("could not load face models")?;
        Some(analyzer)
    };

    let mut previous: Option<Instant> = None;
    for i in 0..frames {
        let frame = camera.next_frame().context("frame capture failed")?;
        let brightness = frame.avg_brightness();
        let interval_ms = previous
            .map(|p| frame.timestamp.duration_since(p).as_secs_f32() * 1000.0)
            .unwrap_or(0.0);
        previous = Some(frame.timestamp);

        match analyzer.as_mut() {
            Some(analyzer) => match analyzer.analyze(&frame.data, frame.width, frame.height) {
                Ok(faces) => {
                    let best = faces
                        .iter()
                        .map(|f| f.bbox.confidence)
                        .fold(0.0f32, f32::max);
                    println!(
                        "frame {i}: seq={} dt={interval_ms:.0}ms brightness={brightness:.1} faces={} best={best:.2}",
                        frame.sequence,
                        faces.len()
                    );
                }
                Err(e) => println!("frame {i}: seq={} analysis failed: {e}", frame.sequence),
            },
            None => println!("frame {i}: seq={} dt={interval_ms:.0}ms brightness={brightness:.1}", frame.sequence),
        }
    }

    Ok(())
}
