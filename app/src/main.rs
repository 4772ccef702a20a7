use clap::{Parser, Subcommand};
use face_crop::{
    BoxCorrector, CorrectedFace, CroppingStats, DetectionBatch, ImageInfo, SeededRandom,
};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_appender::rolling;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

mod config;

#[derive(Parser)]
#[command(
    name = "facecrop",
    author,
    version,
    about = "Face bounding-box correction CLI"
)]
struct Cli {
    /// Override log level (e.g. info, debug)
    #[arg(long)]
    log_level: Option<String>,
    /// Directory for the rolling log file
    #[arg(long)]
    log_dir: Option<PathBuf>,
    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Log one event per corrected face
    #[arg(long)]
    debug_diagnostics: bool,
    /// Confidence above which fallback boxes shrink and loose boxes tighten harder
    #[arg(long)]
    high_confidence_threshold: Option<f64>,
    /// Confidence below which loose boxes tighten less
    #[arg(long)]
    low_confidence_threshold: Option<f64>,
    /// Seed the fallback jitter for reproducible output
    #[arg(long)]
    seed: Option<u64>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Correct the faces in one or more batch files
    Correct {
        /// Batch file: a JSON list of faces or an object with `faces` and `image`
        #[arg(long = "file", required = true)]
        files: Vec<PathBuf>,
        /// Write the report here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        image: ImageArgs,
    },
    /// Show the unit and verdict of every face without correcting
    Inspect {
        #[arg(long)]
        file: PathBuf,
        #[command(flatten)]
        image: ImageArgs,
    },
    /// Summarize a corrected batch against its original
    Stats {
        /// The batch that was fed to `correct`
        #[arg(long)]
        before: PathBuf,
        /// The report or face list `correct` produced
        #[arg(long)]
        after: PathBuf,
    },
    /// Write the effective configuration to disk
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(clap::Args, Clone, Copy)]
struct ImageArgs {
    /// Source image width in pixels
    #[arg(long, requires = "image_height")]
    image_width: Option<u32>,
    /// Source image height in pixels
    #[arg(long, requires = "image_width")]
    image_height: Option<u32>,
}

impl ImageArgs {
    fn resolve(&self, from_file: Option<ImageInfo>) -> Option<ImageInfo> {
        match (self.image_width, self.image_height) {
            (Some(w), Some(h)) => Some(ImageInfo::new(w, h)),
            _ => from_file,
        }
    }
}

#[derive(Serialize)]
struct BatchReport {
    source: PathBuf,
    faces: Vec<CorrectedFace>,
    stats: CroppingStats,
}

fn read_json(path: &Path) -> Result<Value, String> {
    let data =
        std::fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    serde_json::from_str(&data).map_err(|e| format!("{}: {}", path.display(), e))
}

fn load_batch(path: &Path) -> Result<DetectionBatch, String> {
    let value = read_json(path)?;
    DetectionBatch::from_json(&value).map_err(|e| format!("{}: {}", path.display(), e))
}

fn load_corrected(path: &Path) -> Result<Vec<CorrectedFace>, String> {
    let faces = match read_json(path)? {
        Value::Object(mut map) => map.remove("faces").unwrap_or(Value::Null),
        other => other,
    };
    serde_json::from_value(faces).map_err(|e| format!("{}: {}", path.display(), e))
}

fn correct_file(
    engine: &BoxCorrector,
    path: PathBuf,
    image: ImageArgs,
) -> Result<BatchReport, String> {
    let batch = load_batch(&path)?;
    let image = image.resolve(batch.image);
    let faces = engine.correct(&batch.faces, image);
    let stats = face_crop::stats(&batch.faces, &faces);
    tracing::info!(
        file = %path.display(),
        total = stats.total_faces,
        defaults_fixed = stats.defaults_fixed,
        tightened = stats.coordinates_tightened,
        validated = stats.coordinates_validated,
        "Batch corrected"
    );
    Ok(BatchReport {
        source: path,
        faces,
        stats,
    })
}

fn emit(json: String, output: Option<&Path>) -> std::io::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, json)?;
            eprintln!("Report written to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

#[cfg_attr(feature = "trace-spans", tracing::instrument)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let overrides = config::AppConfigOverrides {
        log_level: cli.log_level.clone(),
        log_dir: cli.log_dir.clone(),
        debug_diagnostics: cli.debug_diagnostics,
        high_confidence_threshold: cli.high_confidence_threshold,
        low_confidence_threshold: cli.low_confidence_threshold,
        seed: cli.seed,
    };
    let cfg = config::AppConfig::load_from(cli.config.clone()).apply_overrides(&overrides);

    std::fs::create_dir_all(&cfg.log_dir)?;
    let file_appender = rolling::daily(&cfg.log_dir, "facecrop.log");
    let (file_writer, _guard) = tracing_appender::non_blocking(file_appender);

    // stdout carries the JSON report, so the console copy goes to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(cfg.log_level.clone()))
        .with_writer(std::io::stderr.and(file_writer))
        .init();

    match cli.command {
        Commands::Correct {
            files,
            output,
            image,
        } => {
            let base = BoxCorrector::with_settings(cfg.correction_settings());
            let mut handles = Vec::with_capacity(files.len());
            for (i, path) in files.into_iter().enumerate() {
                // One stream per file so the output does not depend on scheduling.
                let engine = match cfg.seed {
                    Some(seed) => {
                        let random = SeededRandom::new(seed.wrapping_add(i as u64));
                        base.clone().random_source(Arc::new(random))
                    }
                    None => base.clone(),
                };
                handles.push(tokio::task::spawn_blocking(move || {
                    correct_file(&engine, path, image)
                }));
            }

            let mut reports = Vec::with_capacity(handles.len());
            for handle in handles {
                reports.push(handle.await??);
            }
            let json = if reports.len() == 1 {
                serde_json::to_string_pretty(&reports[0])?
            } else {
                serde_json::to_string_pretty(&reports)?
            };
            emit(json, output.as_deref())?;
        }
        Commands::Inspect { file, image } => {
            let batch = load_batch(&file)?;
            let image = image.resolve(batch.image);
            let engine = BoxCorrector::with_settings(cfg.correction_settings());
            println!("{:<16} {:<11} {:<9} {}", "ID", "UNIT", "VERDICT", "NOTE");
            for face in &batch.faces {
                let analysis = engine.analyze(face, image.as_ref());
                let (unit, note) = match analysis.units {
                    Some(c) if c.ambiguous => {
                        (c.unit.as_str(), "no image size, read as percentage")
                    }
                    Some(c) => (c.unit.as_str(), ""),
                    None => ("-", "unreadable box"),
                };
                println!(
                    "{:<16} {:<11} {:<9} {}",
                    face.id,
                    unit,
                    analysis.verdict.as_str(),
                    note
                );
            }
        }
        Commands::Stats { before, after } => {
            let batch = load_batch(&before)?;
            let corrected = load_corrected(&after)?;
            if corrected.len() != batch.faces.len() {
                tracing::warn!(
                    before = batch.faces.len(),
                    after = corrected.len(),
                    "Face counts differ"
                );
            }
            let stats = face_crop::stats(&batch.faces, &corrected);
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Commands::InitConfig { force } => {
            let path = cli.config.clone().unwrap_or_else(config::default_path);
            if path.exists() && !force {
                return Err(format!(
                    "{} already exists, pass --force to overwrite",
                    path.display()
                )
                .into());
            }
            cfg.save_to(Some(path.clone()))?;
            println!("Config written to {}", path.display());
        }
    }

    Ok(())
}
