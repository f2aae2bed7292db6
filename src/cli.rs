// ============================================================================
// LayerPaint CLI: headless batch processing via command-line arguments
// ============================================================================
//
// Usage examples:
//   LayerPaint -i photo.png --script strokes.json -o result.png
//   LayerPaint -i photo.jpg -o out.bmp                  (format inferred from output ext)
//   LayerPaint -i "*.jpg" --rotate 1 --output-dir rotated/ --format png
//   LayerPaint -i project.lpf -o flat.jpg --quality 85
//
// Scripts are JSON arrays of steps replayed through the same gesture routing
// the editor uses, e.g.
//   [{"op": "pointer", "tool": "pencil", "color": [255,0,0,255],
//     "x": 0, "y": 0, "phase": "down"}, ...]

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use serde::Deserialize;

use crate::canvas::{Color, Point};
use crate::components::tools::{FillMode, Tool};
use crate::error::ProjectFileError;
use crate::io::{SaveFormat, encode_and_write, load_image_sync, save_lpf};
use crate::project::{GestureEvent, GesturePhase, Project};

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// LayerPaint headless image processor.
#[derive(Parser, Debug)]
#[command(
    name = "LayerPaint",
    about = "LayerPaint headless batch image processor",
    long_about = "Replay gesture scripts and canvas transforms on image files and\n\
                  convert between formats. Supports PNG, JPEG, BMP, TGA and LPF\n\
                  project files.\n\n\
                  Example:\n  \
                  LayerPaint --input photo.png --script strokes.json --output result.png\n  \
                  LayerPaint -i \"*.jpg\" --rotate 1 --output-dir out/ --format png"
)]
pub struct CliArgs {
    /// Input file(s). Glob patterns accepted (e.g. "*.png", "shots/*.jpg").
    /// LPF project files retain all layers; all other formats load as one layer.
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<String>,

    /// JSON step script replayed on each input after the transforms.
    #[arg(short, long, value_name = "SCRIPT.json")]
    pub script: Option<PathBuf>,

    /// Output file path. Only valid for single-file input.
    /// For batch input use --output-dir instead.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing.
    /// Files are written here with the original stem and the target format's extension.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Output format: png, jpeg, bmp, tga, lpf.
    /// When omitted, the format is inferred from --output's extension, defaulting to png.
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// JPEG quality (1–100, default 90).
    #[arg(short, long, default_value_t = 90, value_name = "1-100")]
    pub quality: u8,

    /// Rotate the canvas clockwise by 90° this many times.
    #[arg(long, default_value_t = 0, value_name = "N")]
    pub rotate: u32,

    /// Mirror every layer left to right.
    #[arg(long)]
    pub flip_horizontal: bool,

    /// Mirror every layer top to bottom.
    #[arg(long)]
    pub flip_vertical: bool,

    /// Echo log output to stderr and print per-file timing.
    #[arg(short, long)]
    pub verbose: bool,
}

// ============================================================================
// Script steps
// ============================================================================

/// One scripted action. Colors are `[r, g, b, a]`.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScriptStep {
    Pointer {
        tool: Tool,
        color: [u8; 4],
        x: i32,
        y: i32,
        phase: GesturePhase,
        #[serde(default)]
        size: Option<i32>,
        #[serde(default)]
        fill: Option<FillMode>,
    },
    SprayTick {
        #[serde(default = "one")]
        count: u32,
    },
    Undo,
    Redo,
    AddLayer,
    SelectLayer { index: usize },
    RemoveLayer { index: usize },
}

fn one() -> u32 {
    1
}

pub fn parse_script(source: &str) -> Result<Vec<ScriptStep>, serde_json::Error> {
    serde_json::from_str(source)
}

/// Replay `steps` against `project` in order.
pub fn apply_script(project: &mut Project, steps: &[ScriptStep]) -> Result<(), ProjectFileError> {
    for step in steps {
        match step {
            ScriptStep::Pointer {
                tool,
                color,
                x,
                y,
                phase,
                size,
                fill,
            } => {
                let [r, g, b, a] = *color;
                project.apply_event(&GestureEvent {
                    tool: *tool,
                    color: Color::new(r, g, b, a),
                    point: Point::new(*x, *y),
                    phase: *phase,
                    brush_size: *size,
                    fill_mode: *fill,
                });
            }
            ScriptStep::SprayTick { count } => {
                for _ in 0..*count {
                    if !project.spray_tick() {
                        tracing::warn!("spray_tick with no spray gesture in progress");
                        break;
                    }
                }
            }
            ScriptStep::Undo => {
                project.undo();
            }
            ScriptStep::Redo => {
                project.redo();
            }
            ScriptStep::AddLayer => {
                project.add_layer();
            }
            ScriptStep::SelectLayer { index } => project.select_layer(*index)?,
            ScriptStep::RemoveLayer { index } => {
                project.remove_layer(*index)?;
            }
        }
    }
    Ok(())
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run all CLI processing and return an OS exit code.
/// `0` = all files succeeded, `1` = one or more files failed.
pub fn run(args: CliArgs) -> ExitCode {
    let inputs = resolve_inputs(&args.input);
    if inputs.is_empty() {
        eprintln!("error: no input files matched the given pattern(s).");
        return ExitCode::FAILURE;
    }

    if inputs.len() > 1 && args.output.is_some() && args.output_dir.is_none() {
        eprintln!(
            "error: {} input files given but --output only accepts a single file path.\n\
             Use --output-dir to specify a destination directory for batch processing.",
            inputs.len()
        );
        return ExitCode::FAILURE;
    }

    let save_format = parse_format(args.format.as_deref(), args.output.as_deref());

    let steps = match &args.script {
        Some(path) => match std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|src| parse_script(&src).map_err(|e| e.to_string()))
        {
            Ok(steps) => steps,
            Err(e) => {
                eprintln!("error: could not read script '{}': {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => Vec::new(),
    };

    if let Some(dir) = &args.output_dir
        && let Err(e) = std::fs::create_dir_all(dir)
    {
        eprintln!(
            "error: could not create output directory '{}': {}",
            dir.display(),
            e
        );
        return ExitCode::FAILURE;
    }

    let total = inputs.len();
    let multi = total > 1;
    let mut any_failure = false;

    for (idx, input_path) in inputs.iter().enumerate() {
        if multi || args.verbose {
            println!("[{}/{}] {}", idx + 1, total, input_path.display());
        }
        let file_start = Instant::now();

        let Some(output_path) = build_output_path(
            input_path,
            args.output.as_deref(),
            args.output_dir.as_deref(),
            save_format,
        ) else {
            eprintln!(
                "  error: cannot determine output path for '{}'.",
                input_path.display()
            );
            any_failure = true;
            continue;
        };

        match run_one(input_path, &output_path, &steps, &args, save_format) {
            Ok(project) => {
                tracing::info!("saved {}", project.display_title());
                if args.verbose || multi {
                    println!(
                        "  → {} ({:.0}ms)",
                        output_path.display(),
                        file_start.elapsed().as_secs_f64() * 1000.0
                    );
                }
            }
            Err(e) => {
                tracing::error!("{}: {}", input_path.display(), e);
                eprintln!("  error: {}", e);
                any_failure = true;
            }
        }
    }

    if any_failure {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

// ============================================================================
// Per-file processing pipeline
// ============================================================================

fn run_one(
    input: &Path,
    output: &Path,
    steps: &[ScriptStep],
    args: &CliArgs,
    format: SaveFormat,
) -> Result<Project, ProjectFileError> {
    let mut project = load_image_sync(input)?;

    for _ in 0..args.rotate % 4 {
        project.rotate_90();
    }
    if args.flip_horizontal {
        project.flip_horizontal();
    }
    if args.flip_vertical {
        project.flip_vertical();
    }

    apply_script(&mut project, steps)?;

    match format {
        SaveFormat::Project => save_lpf(&project, output)?,
        _ => encode_and_write(&project.composite(), output, format, args.quality)?,
    }
    project.mark_saved(output.to_path_buf());
    Ok(project)
}

// ============================================================================
// Helpers
// ============================================================================

/// Expand every pattern and keep the first occurrence of each path, in
/// argument order.
fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    patterns
        .iter()
        .flat_map(|pattern| expand_pattern(pattern))
        .filter(|path| seen.insert(path.clone()))
        .collect()
}

/// A path that exists is taken literally; anything else goes through `glob`.
fn expand_pattern(pattern: &str) -> Vec<PathBuf> {
    let literal = PathBuf::from(pattern);
    if literal.exists() {
        return vec![literal];
    }

    let matches: Vec<PathBuf> = match glob::glob(pattern) {
        Ok(paths) => paths.filter_map(Result::ok).collect(),
        Err(e) => {
            tracing::warn!("invalid glob '{}': {}", pattern, e);
            eprintln!("warning: invalid glob '{}': {}", pattern, e);
            return Vec::new();
        }
    };
    if matches.is_empty() {
        tracing::warn!("pattern '{}' matched no files", pattern);
        eprintln!("warning: pattern '{}' matched no files.", pattern);
    }
    matches
}

/// Choose the [`SaveFormat`] from the `--format` string or infer it from the
/// output file extension. Defaults to PNG when neither is known.
fn parse_format(format_arg: Option<&str>, output: Option<&Path>) -> SaveFormat {
    format_arg
        .and_then(SaveFormat::from_name)
        .or_else(|| output.and_then(SaveFormat::from_path))
        .unwrap_or_default()
}

/// Where the result for `input` is written. An explicit `--output` wins,
/// then `--output-dir` with the input's stem. Otherwise the file goes next to
/// the input, gaining an `_out` suffix when it would replace the input.
fn build_output_path(
    input: &Path,
    output: Option<&Path>,
    output_dir: Option<&Path>,
    format: SaveFormat,
) -> Option<PathBuf> {
    if let Some(out) = output {
        return Some(out.to_path_buf());
    }

    let stem = input.file_stem()?;
    let named = |suffix: &str| {
        let mut name = stem.to_os_string();
        name.push(suffix);
        name.push(".");
        name.push(format.extension());
        name
    };

    match output_dir {
        Some(dir) => Some(dir.join(named(""))),
        None => {
            let beside = input.with_file_name(named(""));
            if beside == input {
                Some(input.with_file_name(named("_out")))
            } else {
                Some(beside)
            }
        }
    }
}
