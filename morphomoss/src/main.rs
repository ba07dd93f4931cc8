//! `morphomoss` command-line tool
//!
//! ```text
//! morphomoss <IMAGE_PATH> [SCALE] [OPTIONS]
//! ```
//!
//! Prints `Average tooth length: <value> <unit>` and exits 0, or prints
//! `Error: <message>` and exits 1. Both go to stdout; logs go to stderr.

use clap::error::ErrorKind;
use clap::{ArgAction, Parser, ValueEnum};
use morphomoss::filter::{CannyParams, EdgeDetector};
use morphomoss::region;
use morphomoss::{
    DEFAULT_MIN_LENGTH_PX, GaussianBlur, ImageFormat, MeasureError, MeasureOptions,
    MeasureResult, PreprocessOptions, ToothMeasurement, detect_edges, load_image, measure_edges,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::Level;

#[derive(Parser, Debug)]
#[command(name = "morphomoss")]
#[command(about = "Estimate the average length of moss peristome teeth", long_about = None)]
#[command(version, allow_negative_numbers = true)]
struct Cli {
    /// Microscopy image (PNG, JPEG, TIFF, BMP, PNM, WebP or JPEG 2000)
    image_path: PathBuf,

    /// Micrometers per pixel; without it the result is in pixels
    scale: Option<f64>,

    /// Canny low threshold
    #[arg(long, default_value_t = 50.0)]
    low_threshold: f32,

    /// Canny high threshold
    #[arg(long, default_value_t = 150.0)]
    high_threshold: f32,

    /// Edge detector
    #[arg(long, value_enum, default_value_t = DetectorArg::Canny)]
    detector: DetectorArg,

    /// Magnitude threshold for the sobel detector
    #[arg(long, default_value_t = 150.0)]
    sobel_threshold: f32,

    /// Contrast enhancement factor applied before edge detection
    #[arg(long)]
    contrast: Option<f32>,

    /// Gaussian blur sigma applied before edge detection
    #[arg(long)]
    blur_sigma: Option<f32>,

    /// Ignore teeth shorter than this many pixels (0 keeps every contour)
    #[arg(long, default_value_t = DEFAULT_MIN_LENGTH_PX)]
    min_length: f64,

    /// Write the edge map to this file (format from extension, PNG if unknown)
    #[arg(long)]
    save_edges: Option<PathBuf>,

    /// Write the traced outlines of the measured contours to this file
    #[arg(long)]
    save_contours: Option<PathBuf>,

    /// Also print per-tooth lengths
    #[arg(long)]
    details: bool,

    /// Log more to stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DetectorArg {
    /// Canny with hysteresis
    Canny,
    /// Thresholded Sobel magnitude
    Sobel,
}

impl Cli {
    fn options(&self) -> MeasureOptions {
        let detector = match self.detector {
            DetectorArg::Canny => {
                EdgeDetector::Canny(CannyParams::new(self.low_threshold, self.high_threshold))
            }
            DetectorArg::Sobel => EdgeDetector::Sobel {
                threshold: self.sobel_threshold,
            },
        };
        MeasureOptions::default()
            .with_detector(detector)
            .with_preprocess(PreprocessOptions {
                contrast: self.contrast,
                blur: self.blur_sigma.map(GaussianBlur::from_sigma),
            })
            .with_min_length(self.min_length)
    }

    fn log_level(&self) -> Level {
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}

fn save_mask(mask: &morphomoss::Pix, path: &Path, what: &str) -> MeasureResult<()> {
    let format = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => ImageFormat::from_extension(ext),
        None => ImageFormat::Png,
    };
    morphomoss::io::write_image(mask, path, format).map_err(|source| {
        MeasureError::Save {
            path: path.display().to_string(),
            source,
        }
    })?;
    tracing::info!(path = %path.display(), "wrote {}", what);
    Ok(())
}

fn run(cli: &Cli) -> MeasureResult<ToothMeasurement> {
    let options = cli.options();
    if let Some(s) = cli.scale.filter(|s| !s.is_finite() || *s <= 0.0) {
        return Err(MeasureError::InvalidScale(s));
    }
    options.validate()?;

    let pix = load_image(&cli.image_path)?;
    let edges = detect_edges(&pix, &options)?;
    if let Some(path) = &cli.save_edges {
        save_mask(&edges, path, "edge map")?;
    }
    if let Some(path) = &cli.save_contours {
        let borders = region::get_external_borders(&edges)?;
        let outlines = region::render_borders(&borders, edges.width(), edges.height())?;
        save_mask(&outlines, path, "contour outlines")?;
    }
    measure_edges(&edges, cli.scale, &options)
}

/// First paragraph of a clap error without its `error: ` prefix.
fn clap_message(err: &clap::Error) -> String {
    let rendered = err.to_string();
    rendered
        .lines()
        .take_while(|l| !l.trim().is_empty())
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(" ")
        .trim_start_matches("error: ")
        .to_string()
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            println!("Error: {}", clap_message(&e));
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level())
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match run(&cli) {
        Ok(m) => {
            println!("Average tooth length: {:.2} {}", m.value, m.unit);
            if cli.details {
                println!(
                    "Teeth measured: {} of {} contours",
                    m.tooth_count(),
                    m.contour_count
                );
                for (i, len) in m.lengths_px.iter().enumerate() {
                    println!("  tooth {}: {:.2} pixels", i + 1, len);
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
