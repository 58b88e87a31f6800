use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use imageshield_cli::{report, session_file, ConfigOverrides, ModuleRequest, Toolkit};
use imageshield_core::constants::{
    APP_NAME, DEFAULT_PRIVACY_INTENSITY, DEFAULT_WATERMARK_OPACITY, DEFAULT_WATERMARK_TEXT,
    LOG_REPORT_FILE_NAME,
};
use imageshield_core::{Config, SessionState};
use imageshield_processing::{WatermarkOptions, WatermarkPosition};

#[derive(Parser, Debug)]
#[command(name = "imageshield")]
#[command(about = "Blur faces, watermark and obfuscate images before sharing them")]
#[command(version)]
struct Cli {
    /// Activity log file (overrides IMAGESHIELD_LOG_PATH)
    #[arg(long, global = true, value_name = "FILE")]
    log_path: Option<PathBuf>,

    /// Directory receiving the output PNGs (overrides IMAGESHIELD_OUTPUT_DIR)
    #[arg(long, global = true, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// SeetaFace model file (overrides IMAGESHIELD_FACE_MODEL)
    #[arg(long, global = true, value_name = "FILE")]
    face_model: Option<PathBuf>,

    /// TrueType font for watermarks (overrides IMAGESHIELD_FONT)
    #[arg(long, global = true, value_name = "FILE")]
    font: Option<PathBuf>,

    /// Fail CleanScan instead of passing the image through unchanged
    #[arg(long, global = true)]
    fail_closed: bool,

    /// Keep the summary panel across invocations in this JSON file
    #[arg(long, global = true, value_name = "FILE")]
    session: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Detect faces and blur them
    Cleanscan {
        input: PathBuf,
    },
    /// Drop metadata and add a text watermark
    Safeshare {
        input: PathBuf,

        #[arg(long, default_value = DEFAULT_WATERMARK_TEXT)]
        text: String,

        /// Glyph alpha, 0-255
        #[arg(long, default_value_t = DEFAULT_WATERMARK_OPACITY)]
        opacity: u8,

        /// Rotation in degrees, 0-90
        #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u16).range(0..=90))]
        angle: u16,

        /// bottom-right, bottom-left, top-right, top-left or center
        #[arg(long, default_value = "bottom-right")]
        position: String,
    },
    /// Pixelate, add noise to or blur the whole image
    Noiseguard {
        input: PathBuf,

        /// pixelate, noise or blur
        #[arg(long, default_value = "pixelate")]
        mode: String,

        #[arg(long, default_value_t = DEFAULT_PRIVACY_INTENSITY)]
        intensity: u32,
    },
    /// Show the activity log
    History {
        /// Also write the plain-text report to this file
        #[arg(long, value_name = "FILE", num_args = 0..=1, default_missing_value = LOG_REPORT_FILE_NAME)]
        export: Option<PathBuf>,

        /// Print entries as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete the activity log and reset the summary
    ClearHistory,
    /// Show dimensions, format and EXIF fields of an image
    Inspect {
        input: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

fn load_config(cli: &Cli) -> Result<Config> {
    let config = Config::from_env().context("Failed to load configuration")?;
    let overrides = ConfigOverrides {
        log_path: cli.log_path.clone(),
        output_dir: cli.output_dir.clone(),
        face_model: cli.face_model.clone(),
        font: cli.font.clone(),
        fail_closed: cli.fail_closed,
    };
    Ok(overrides.apply(config)?)
}

fn print_summary(state: &SessionState) {
    println!();
    println!("{} summary", APP_NAME);
    for line in state.summary_lines() {
        println!("  {}", line);
    }
}

fn run_module(
    toolkit: &Toolkit,
    state: SessionState,
    input: &Path,
    request: ModuleRequest,
) -> Result<SessionState> {
    let image = toolkit
        .load_image(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let (state, report) = toolkit.run(state, &request, &image)?;

    if report.fell_open {
        eprintln!("Warning: face detection unavailable, image saved without blurring");
    }
    if let Some(faces) = report.faces {
        println!("Faces detected: {}", faces);
    }
    println!("Saved {}", report.output_path.display());
    print_summary(&state);
    Ok(state)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report::log_failure(&err);
            eprintln!("Error: {}", report::user_message(&err));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    imageshield_infra::init_tracing(config.log_format, "warn,imageshield=info")?;

    tracing::debug!(
        environment = %config.environment,
        log_path = %config.log_path.display(),
        output_dir = %config.output_dir.display(),
        face_policy = config.face_failure_policy.as_str(),
        "Configuration loaded"
    );

    let toolkit = Toolkit::from_config(&config)?;
    let state = match &cli.session {
        Some(path) => session_file::load(path)?,
        None => SessionState::new(),
    };

    let state = match &cli.command {
        Command::Cleanscan { input } => {
            run_module(&toolkit, state, input, ModuleRequest::CleanScan)?
        }
        Command::Safeshare {
            input,
            text,
            opacity,
            angle,
            position,
        } => {
            let options = WatermarkOptions::new(text.clone())
                .with_opacity(*opacity)
                .with_angle(*angle)
                .with_position(WatermarkPosition::parse(position));
            run_module(&toolkit, state, input, ModuleRequest::SafeShare(options))?
        }
        Command::Noiseguard {
            input,
            mode,
            intensity,
        } => {
            let request = ModuleRequest::NoiseGuard {
                mode: mode.clone(),
                intensity: *intensity,
            };
            run_module(&toolkit, state, input, request)?
        }
        Command::History { export, json } => {
            let entries = toolkit.history()?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else if entries.is_empty() {
                println!("No activity recorded yet.");
            } else {
                println!("{:<21} {:<12} DETAILS", "TIMESTAMP", "MODULE");
                for entry in &entries {
                    println!("{:<21} {:<12} {}", entry.timestamp, entry.module, entry.details);
                }
            }
            if let Some(path) = export {
                let lines = toolkit.export_history(path)?;
                eprintln!("Exported {} entries to {}", lines, path.display());
            }
            state
        }
        Command::ClearHistory => {
            let state = toolkit.clear_history(state)?;
            println!("History cleared.");
            print_summary(&state);
            state
        }
        Command::Inspect { input, json } => {
            let metadata = toolkit
                .inspect(input)
                .with_context(|| format!("Failed to inspect {}", input.display()))?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&metadata)?);
            } else {
                println!("Format:     {}", metadata.format);
                println!("Dimensions: {}x{}", metadata.width, metadata.height);
                println!("Size:       {} bytes", metadata.size_bytes);
                if metadata.exif_fields.is_empty() {
                    println!("EXIF:       none");
                } else {
                    println!("EXIF:");
                    for field in &metadata.exif_fields {
                        println!("  {:<24} {}", field.tag, field.value);
                    }
                }
            }
            state
        }
    };

    if let Some(path) = &cli.session {
        session_file::save(path, &state)?;
    }

    Ok(())
}
