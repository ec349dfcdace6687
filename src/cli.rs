// ============================================================================
// imgadjust CLI — headless batch adjustments via command-line arguments
// ============================================================================
//
// Usage examples:
//   imgadjust -i photo.jpg --grayscale -o gray.png
//   imgadjust -i photo.png --brightness -40 --contrast 25 -o out.jpg --quality 85
//   imgadjust -i "shots/*.jpg" --preset warm.iadj --output-dir processed/ --format png
//   imgadjust -i big.bmp --contrast 60 --benchmark
//
// Every file is processed synchronously on the current thread, one session
// per input, exactly as an interactive window would do it.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;

use crate::io::{self, SaveFormat};
use crate::ops::{AdjustmentState, ProcessingStrategy};
use crate::session::Session;
use crate::settings::Settings;
use crate::{log_err, log_info};

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// imgadjust headless image adjuster.
#[derive(Parser, Debug)]
#[command(
    name = "imgadjust",
    about = "Apply grayscale, brightness and contrast adjustments to images",
    long_about = "Open JPEG, PNG, BMP or GIF images, apply grayscale / brightness /\n\
                  contrast adjustments with the fast (bulk buffer) or slow (per-pixel)\n\
                  engine, and save as JPEG, PNG or BMP.\n\n\
                  Example:\n  \
                  imgadjust -i photo.jpg --grayscale --contrast 20 -o result.png\n  \
                  imgadjust -i \"*.jpg\" --brightness 30 --output-dir out/ --format png"
)]
pub struct CliArgs {
    /// Input file(s). Glob patterns accepted (e.g. "*.png", "shots/*.jpg").
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<String>,

    /// Processing strategy: fast (bulk buffer) or slow (per-pixel get/set).
    /// Defaults to the `default_strategy` setting.
    #[arg(short, long, value_name = "fast|slow")]
    pub strategy: Option<ProcessingStrategy>,

    /// Convert to grayscale.
    #[arg(short, long)]
    pub grayscale: bool,

    /// Brightness offset (-255..255).
    #[arg(short, long, allow_negative_numbers = true, value_name = "-255..255")]
    pub brightness: Option<i32>,

    /// Contrast slider (-100..100).
    #[arg(short, long, allow_negative_numbers = true, value_name = "-100..100")]
    pub contrast: Option<i32>,

    /// Start from the adjustments stored in a preset file; other flags override it.
    #[arg(short, long, value_name = "FILE.iadj")]
    pub preset: Option<PathBuf>,

    /// Store the resulting adjustments as a preset file.
    #[arg(long, value_name = "FILE.iadj")]
    pub save_preset: Option<PathBuf>,

    /// Output file path. Only valid for single-file input.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Output format: jpeg, png, bmp. Inferred from --output's extension when
    /// omitted (unknown extensions save as JPEG).
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<SaveFormat>,

    /// JPEG quality (1-100). Defaults to the `jpeg_quality` setting.
    #[arg(short, long, value_name = "1-100")]
    pub quality: Option<u8>,

    /// Render every input with both strategies and report timings; nothing is saved.
    #[arg(long)]
    pub benchmark: bool,

    /// Print per-file timing information.
    #[arg(short, long)]
    pub verbose: bool,
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run all CLI processing and return an OS exit code.
/// `0` = all files succeeded, `1` = one or more files failed.
pub fn run(args: CliArgs, settings: &Settings) -> ExitCode {
    let inputs = resolve_inputs(&args.input);
    if inputs.is_empty() {
        eprintln!("error: no input files matched the given pattern(s).");
        return ExitCode::FAILURE;
    }

    if inputs.len() > 1 && args.output.is_some() {
        eprintln!(
            "error: {} input files given but --output only accepts a single file path.\n\
             Use --output-dir (without --output) to specify a destination directory for batch processing.",
            inputs.len()
        );
        return ExitCode::FAILURE;
    }

    let state = match build_state(&args) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(path) = &args.save_preset {
        let path = preset_path(path);
        if let Err(e) = io::save_preset(&state, &path) {
            eprintln!("error: could not write preset '{}': {}", path.display(), e);
            return ExitCode::FAILURE;
        }
        println!("preset written to {}", path.display());
    }

    let strategy = args.strategy.unwrap_or(settings.default_strategy);

    if args.benchmark {
        return run_benchmark(&inputs, &state);
    }

    let save_format = resolve_format(args.format, args.output.as_deref(), settings.default_save_format);
    let quality = args.quality.unwrap_or(settings.jpeg_quality);
    if quality_ignored(save_format, args.quality) {
        eprintln!("warning: --quality only applies to JPEG output; ignored for {}.", save_format);
    }

    if let Some(dir) = &args.output_dir
        && let Err(e) = std::fs::create_dir_all(dir)
    {
        eprintln!("error: could not create output directory '{}': {}", dir.display(), e);
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
            eprintln!("  error: cannot determine output path for '{}'.", input_path.display());
            any_failure = true;
            continue;
        };

        match run_one(input_path, &output_path, &state, strategy, save_format, quality) {
            Ok(render_time) => {
                if args.verbose || multi {
                    println!(
                        "  -> {} (render {:.1}ms [{}], total {:.0}ms)",
                        output_path.display(),
                        render_time.as_secs_f64() * 1000.0,
                        strategy,
                        file_start.elapsed().as_secs_f64() * 1000.0
                    );
                }
            }
            Err(e) => {
                eprintln!("  error: {}", e);
                log_err!("{}: {}", input_path.display(), e);
                any_failure = true;
            }
        }
    }

    if any_failure { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

// ============================================================================
// Per-file processing
// ============================================================================

fn run_one(
    input:    &Path,
    output:   &Path,
    state:    &AdjustmentState,
    strategy: ProcessingStrategy,
    format:   SaveFormat,
    quality:  u8,
) -> Result<Duration, String> {
    let mut session = Session::open(input, strategy)
        .map_err(|e| format!("load failed: {}", e))?;
    session.set_jpeg_quality(quality);
    session.apply_state(*state);
    session
        .save(output, format)
        .map_err(|e| format!("save failed: {}", e))?;
    Ok(session.last_render())
}

/// Render each input with both strategies and print the timings side by side.
fn run_benchmark(inputs: &[PathBuf], state: &AdjustmentState) -> ExitCode {
    let mut any_failure = false;
    for input in inputs {
        let original = match io::decode(input) {
            Ok(img) => img,
            Err(e) => {
                eprintln!("{}: load failed: {}", input.display(), e);
                any_failure = true;
                continue;
            }
        };
        println!("{} ({}x{})", input.display(), original.width(), original.height());

        let mut results = Vec::new();
        for &strategy in ProcessingStrategy::all() {
            let mut session = Session::from_image(original.clone(), strategy);
            session.apply_state(*state);
            println!(
                "  {:<5} {:>10.2}ms",
                strategy,
                session.last_render().as_secs_f64() * 1000.0
            );
            results.push(session.current().cloned());
        }
        let identical = results.windows(2).all(|w| w[0] == w[1]);
        println!("  outputs identical: {}", if identical { "yes" } else { "no" });
        log_info!("benchmark {}: outputs identical = {}", input.display(), identical);
    }
    if any_failure { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

// ============================================================================
// Helpers
// ============================================================================

/// Preset (if any) first, then explicit flags on top.
fn build_state(args: &CliArgs) -> Result<AdjustmentState, String> {
    let mut state = match &args.preset {
        Some(path) => io::load_preset(path)
            .map_err(|e| format!("could not read preset '{}': {}", path.display(), e))?,
        None => AdjustmentState::identity(),
    };
    if args.grayscale {
        state.grayscale = true;
    }
    if let Some(b) = args.brightness {
        state.set_brightness(b);
    }
    if let Some(c) = args.contrast {
        state.set_contrast(c);
    }
    Ok(state)
}

/// `--save-preset` paths without an extension get `.iadj`.
fn preset_path(path: &Path) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension(io::PRESET_EXTENSION)
    }
}

fn quality_ignored(format: SaveFormat, quality: Option<u8>) -> bool {
    quality.is_some() && !format.supports_quality()
}

/// Expand glob patterns and literal paths into a deduplicated, ordered list.
fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        let as_path = Path::new(pattern);

        if as_path.exists() {
            if !result.iter().any(|p| p.as_path() == as_path) {
                result.push(as_path.to_path_buf());
            }
            continue;
        }

        match glob::glob(pattern) {
            Ok(entries) => {
                let mut matched = false;
                for entry in entries.flatten() {
                    if !result.contains(&entry) {
                        result.push(entry);
                    }
                    matched = true;
                }
                if !matched {
                    // Keep it so the per-file loop reports "file not found".
                    eprintln!("warning: pattern '{}' matched no files.", pattern);
                    if !pattern.contains(['*', '?', '[']) {
                        result.push(as_path.to_path_buf());
                    }
                }
            }
            Err(e) => {
                eprintln!("warning: invalid glob '{}': {}", pattern, e);
            }
        }
    }

    result
}

/// `--format` wins; otherwise the `--output` extension (JPEG when unknown);
/// otherwise the configured default.
fn resolve_format(format_arg: Option<SaveFormat>, output: Option<&Path>, fallback: SaveFormat) -> SaveFormat {
    if let Some(f) = format_arg {
        return f;
    }
    if let Some(out) = output {
        return SaveFormat::from_path(out);
    }
    fallback
}

/// Compute the output path for a single input file.
///
/// Priority:
/// 1. `--output` (explicit path; `run` rejects it for multi-file input)
/// 2. `--output-dir` (batch directory, derives filename from input stem)
/// 3. Fallback: next to the input as `<stem>_adjusted.<ext>`
fn build_output_path(
    input:      &Path,
    output:     Option<&Path>,
    output_dir: Option<&Path>,
    format:     SaveFormat,
) -> Option<PathBuf> {
    if let Some(out) = output {
        return Some(out.to_path_buf());
    }

    let ext  = format.extension();
    let stem = input.file_stem()?.to_string_lossy().into_owned();

    if let Some(dir) = output_dir {
        return Some(dir.join(format!("{}.{}", stem, ext)));
    }

    let parent = input.parent().unwrap_or(Path::new("."));
    Some(parent.join(format!("{}_adjusted.{}", stem, ext)))
}

#[cfg(test)]
mod tests {
    use super::*;

    use image::{Rgb, RgbImage};

    fn parse(argv: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(std::iter::once("imgadjust").chain(argv.iter().copied())).unwrap()
    }

    fn succeeded(code: ExitCode) -> bool {
        format!("{:?}", code) == format!("{:?}", ExitCode::SUCCESS)
    }

    /// Fresh scratch directory holding `a.png` and `b.png`.
    fn scratch(test: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("imgadjust_cli_tests").join(test);
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        RgbImage::from_pixel(3, 2, Rgb([100, 100, 100])).save(dir.join("a.png")).unwrap();
        RgbImage::from_pixel(3, 2, Rgb([200, 200, 200])).save(dir.join("b.png")).unwrap();
        dir
    }

    fn arg(path: &Path) -> String {
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn parses_negative_values_and_strategy() {
        let args = parse(&["-i", "a.png", "--brightness", "-40", "--contrast", "-100", "--strategy", "slow"]);
        assert_eq!(args.brightness, Some(-40));
        assert_eq!(args.contrast, Some(-100));
        assert_eq!(args.strategy, Some(ProcessingStrategy::Slow));
    }

    #[test]
    fn rejects_unknown_format() {
        let res = CliArgs::try_parse_from(["imgadjust", "-i", "a.png", "--format", "gif"]);
        assert!(res.is_err());
    }

    #[test]
    fn flags_override_preset_and_clamp() {
        let args = parse(&["-i", "a.png", "-g", "-b", "999"]);
        let state = build_state(&args).unwrap();
        assert_eq!(state, AdjustmentState { grayscale: true, brightness: 255, contrast: 0 });
    }

    #[test]
    fn format_resolution_order() {
        let out = Path::new("x.bmp");
        assert_eq!(resolve_format(Some(SaveFormat::Png), Some(out), SaveFormat::Jpeg), SaveFormat::Png);
        assert_eq!(resolve_format(None, Some(out), SaveFormat::Png), SaveFormat::Bmp);
        assert_eq!(resolve_format(None, Some(Path::new("x.webp")), SaveFormat::Png), SaveFormat::Jpeg);
        assert_eq!(resolve_format(None, None, SaveFormat::Png), SaveFormat::Png);
    }

    #[test]
    fn output_path_priority() {
        let input = Path::new("shots/cat.gif");
        assert_eq!(
            build_output_path(input, Some(Path::new("o.png")), None, SaveFormat::Png),
            Some(PathBuf::from("o.png"))
        );
        assert_eq!(
            build_output_path(input, None, Some(Path::new("out")), SaveFormat::Bmp),
            Some(PathBuf::from("out/cat.bmp"))
        );
        assert_eq!(
            build_output_path(input, None, None, SaveFormat::Jpeg),
            Some(PathBuf::from("shots/cat_adjusted.jpg"))
        );
    }

    #[test]
    fn run_single_file_succeeds() {
        let dir = scratch("single");
        let out = dir.join("out.png");
        let args = parse(&["-i", &arg(&dir.join("a.png")), "-b", "10", "-o", &arg(&out)]);
        assert!(succeeded(run(args, &Settings::default())));

        let written = image::open(&out).unwrap().to_rgb8();
        assert_eq!(written.get_pixel(0, 0), &Rgb([110, 110, 110]));
    }

    #[test]
    fn run_with_missing_input_fails() {
        let dir = scratch("missing");
        let args = parse(&[
            "-i", &arg(&dir.join("a.png")), &arg(&dir.join("nope.png")),
            "--output-dir", &arg(&dir.join("out")),
        ]);
        assert!(!succeeded(run(args, &Settings::default())));
        // The readable input is still processed.
        assert!(dir.join("out").join("a.jpg").exists());
    }

    #[test]
    fn run_rejects_single_output_for_several_inputs() {
        let dir = scratch("clobber");
        let single = dir.join("single.png");
        let batch = dir.join("batch");
        let args = parse(&[
            "-i", &arg(&dir.join("a.png")), &arg(&dir.join("b.png")),
            "-o", &arg(&single), "--output-dir", &arg(&batch), "-b", "1",
        ]);
        assert!(!succeeded(run(args, &Settings::default())));
        assert!(!single.exists());
        assert!(!batch.exists());
    }

    #[test]
    fn run_batch_writes_one_file_per_input() {
        let dir = scratch("batch");
        let batch = dir.join("batch");
        let args = parse(&[
            "-i", &arg(&dir.join("*.png")),
            "--output-dir", &arg(&batch), "--format", "png", "-b", "1",
        ]);
        assert!(succeeded(run(args, &Settings::default())));
        let a = image::open(batch.join("a.png")).unwrap().to_rgb8();
        let b = image::open(batch.join("b.png")).unwrap().to_rgb8();
        assert_eq!(a.get_pixel(0, 0), &Rgb([101, 101, 101]));
        assert_eq!(b.get_pixel(0, 0), &Rgb([201, 201, 201]));
    }

    #[test]
    fn save_preset_adds_extension() {
        assert_eq!(preset_path(Path::new("looks/warm")), PathBuf::from("looks/warm.iadj"));
        assert_eq!(preset_path(Path::new("warm.preset")), PathBuf::from("warm.preset"));

        let dir = scratch("preset");
        let args = parse(&[
            "-i", &arg(&dir.join("a.png")), "-g", "-c", "30",
            "--save-preset", &arg(&dir.join("warm")), "--benchmark",
        ]);
        assert!(succeeded(run(args, &Settings::default())));
        let state = io::load_preset(&dir.join("warm.iadj")).unwrap();
        assert_eq!(state, AdjustmentState { grayscale: true, brightness: 0, contrast: 30 });
    }

    #[test]
    fn quality_only_matters_for_jpeg() {
        assert!(quality_ignored(SaveFormat::Png, Some(80)));
        assert!(!quality_ignored(SaveFormat::Jpeg, Some(80)));
        assert!(!quality_ignored(SaveFormat::Bmp, None));
    }
}
