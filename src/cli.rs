// ============================================================================
// photolayers CLI: headless batch editing via command-line arguments
// ============================================================================
//
// Usage examples:
//   photolayers -i photo.png -o out.png --preset sepia --brightness 10
//   photolayers -i "shots/*.jpg" --output-dir out/ --preset lark --format png
//   photolayers -i a.png --recipe edits.plr --save-recipe edits2.plr -o b.png
//   photolayers -i a.png --thumbnails thumbs/ --thumb-size 128
//
// Per file: load, geometry (crop, rotations, flip), recipe, preset, sliders,
// write. A failing file is reported and the batch moves on.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use crate::canvas::Layer;
use crate::io::{self, SaveFormat};
use crate::ops::adjustments::AdjustmentKind;
use crate::ops::filters::Preset;
use crate::ops::transform::{CropRect, Rotation};

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// photolayers headless photo editor.
///
/// Apply preset filters and colour adjustments to image files.
#[derive(Parser, Debug)]
#[command(
    name = "photolayers",
    version,
    about = "Batch preset filters and colour adjustments for photos",
    long_about = "Apply preset filters (grayscale, sepia, moon, claredon, lark) and\n\
                  brightness / contrast / saturation / gamma / temperature / vibrance\n\
                  adjustments to image files without opening an editor.\n\n\
                  Example:\n  \
                  photolayers -i photo.png -o out.png --preset sepia --brightness 10\n  \
                  photolayers -i \"shots/*.jpg\" --output-dir out/ --preset lark"
)]
pub struct CliArgs {
    /// Input file(s). Glob patterns accepted (e.g. "*.png", "shots/*.jpg").
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<String>,

    /// Output file path. Only valid for single-file input.
    /// For batch input use --output-dir instead.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing.
    /// Files are written here with the original stem and the target format's extension.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Output format: png, jpeg, bmp, tga, tiff.
    /// When omitted, the format is inferred from --output's extension, defaulting to png.
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// JPEG quality (1-100, default 90).
    #[arg(short, long, default_value_t = 90, value_name = "1-100")]
    pub quality: u8,

    /// Preset filter: original, grayscale, sepia, moon, claredon, lark.
    #[arg(long, value_name = "NAME")]
    pub preset: Option<Preset>,

    /// Brightness slider, -20 to 20.
    #[arg(long, allow_negative_numbers = true)]
    pub brightness: Option<f64>,

    /// Contrast slider, -10 to 10.
    #[arg(long, allow_negative_numbers = true)]
    pub contrast: Option<f64>,

    /// Saturation multiplier, 0 to 2.
    #[arg(long)]
    pub saturation: Option<f64>,

    /// Gamma in percent, up to 200 (100 = unchanged, 0 is rejected).
    #[arg(long)]
    pub gamma: Option<f64>,

    /// Temperature slider, -25 (cool) to 25 (warm).
    #[arg(long, allow_negative_numbers = true)]
    pub temperature: Option<f64>,

    /// Vibrance slider, -50 to 50.
    #[arg(long, allow_negative_numbers = true)]
    pub vibrance: Option<f64>,

    /// Quarter-turn the image: left or right. Repeatable.
    #[arg(long, value_name = "DIR")]
    pub rotate: Vec<Rotation>,

    /// Mirror the image horizontally.
    #[arg(long)]
    pub flip: bool,

    /// Crop to X,Y,W,H before rotating.
    #[arg(long, value_name = "X,Y,W,H")]
    pub crop: Option<CropRect>,

    /// Start from a saved edit recipe (.plr).
    #[arg(long, value_name = "FILE")]
    pub recipe: Option<PathBuf>,

    /// Save the final edit recipe (.plr). With several inputs, the last one wins.
    #[arg(long, value_name = "FILE")]
    pub save_recipe: Option<PathBuf>,

    /// Write one PNG thumbnail per preset into this directory.
    #[arg(long, value_name = "DIR")]
    pub thumbnails: Option<PathBuf>,

    /// Longest thumbnail edge in pixels.
    #[arg(long, default_value_t = 96, value_name = "PX")]
    pub thumb_size: u32,

    /// Debug-level logging.
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliArgs {
    /// Slider flags in replay order, skipping the ones not given.
    fn sliders(&self) -> Vec<(AdjustmentKind, f64)> {
        [
            (AdjustmentKind::Brightness, self.brightness),
            (AdjustmentKind::Contrast, self.contrast),
            (AdjustmentKind::Saturation, self.saturation),
            (AdjustmentKind::Gamma, self.gamma),
            (AdjustmentKind::Temperature, self.temperature),
            (AdjustmentKind::Vibrance, self.vibrance),
        ]
        .into_iter()
        .filter_map(|(kind, value)| value.map(|v| (kind, v)))
        .collect()
    }
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

    // Multiple inputs require --output-dir, not --output
    if inputs.len() > 1 && args.output.is_some() && args.output_dir.is_none() {
        eprintln!(
            "error: {} input files given but --output only accepts a single file path.\n\
             Use --output-dir to specify a destination directory for batch processing.",
            inputs.len()
        );
        return ExitCode::FAILURE;
    }

    let save_format = match parse_format(args.format.as_deref(), args.output.as_deref()) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    for dir in [&args.output_dir, &args.thumbnails].into_iter().flatten() {
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!("error: could not create directory '{}': {}", dir.display(), e);
            return ExitCode::FAILURE;
        }
    }

    let mut failed = 0usize;
    for input_path in &inputs {
        let result = build_output_path(
            input_path,
            args.output.as_deref(),
            args.output_dir.as_deref(),
            save_format,
        )
        .ok_or_else(|| "cannot determine output path".to_string())
        .and_then(|output_path| {
            run_one(input_path, &output_path, save_format, &args)?;
            Ok(output_path)
        });
        match result {
            Ok(output_path) => log::info!("{} -> {}", input_path.display(), output_path.display()),
            Err(e) => {
                log::error!("{}: {}", input_path.display(), e);
                failed += 1;
            }
        }
    }
    log::debug!("{} of {} file(s) processed", inputs.len() - failed, inputs.len());

    if failed > 0 { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

// ============================================================================
// Per-file processing pipeline
// ============================================================================

fn run_one(input: &Path, output: &Path, format: SaveFormat, args: &CliArgs) -> Result<(), String> {
    // -- Step 1: Load ----------------------------------------------------
    let buffer = io::load_image(input).map_err(|e| format!("load failed: {}", e))?;
    let stem = file_stem(input).unwrap_or_else(|| "image".to_string());
    let mut layer = Layer::image(stem.clone(), buffer);

    // -- Step 2: Geometry ------------------------------------------------
    if let Some(rect) = args.crop {
        layer.crop(rect).map_err(|e| e.to_string())?;
    }
    for &direction in &args.rotate {
        layer.rotate(direction).map_err(|e| e.to_string())?;
    }
    if args.flip {
        layer.flip_horizontal().map_err(|e| e.to_string())?;
    }

    // -- Step 3: Edits ---------------------------------------------------
    if let Some(path) = &args.recipe {
        let log = io::load_recipe(path)
            .map_err(|e| format!("recipe '{}': {}", path.display(), e))?;
        layer
            .as_image_mut()
            .and_then(|img| img.load_change_log(log))
            .map_err(|e| e.to_string())?;
    }
    if let Some(preset) = args.preset {
        layer.apply_preset(preset).map_err(|e| e.to_string())?;
    }
    for (kind, value) in args.sliders() {
        layer.apply_adjustment(kind, value).map_err(|e| format!("{}: {}", kind, e))?;
    }

    let image = layer.as_image().map_err(|e| e.to_string())?;

    // -- Step 4: Thumbnails (optional) -----------------------------------
    if let Some(dir) = &args.thumbnails {
        let thumbs = image.preset_thumbnails(args.thumb_size).map_err(|e| e.to_string())?;
        for (preset, thumb) in thumbs {
            let path = dir.join(format!("{}_{}.png", stem, preset.name()));
            io::encode_and_write(&thumb, &path, SaveFormat::Png, args.quality)
                .map_err(|e| format!("thumbnail save failed: {}", e))?;
        }
    }

    // -- Step 5: Save ----------------------------------------------------
    let rendered = image.rendered().map_err(|e| e.to_string())?;
    io::encode_and_write(&rendered, output, format, args.quality)
        .map_err(|e| format!("save failed: {}", e))?;

    if let Some(path) = &args.save_recipe {
        io::save_recipe(image.change_log(), path)
            .map_err(|e| format!("recipe save failed: {}", e))?;
    }

    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

/// Each argument is an existing path or a glob pattern. Duplicates are
/// dropped and first-seen order is kept.
fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();
    for pattern in patterns {
        let matches: Vec<PathBuf> = if Path::new(pattern).exists() {
            vec![PathBuf::from(pattern)]
        } else {
            match glob::glob(pattern) {
                Ok(entries) => entries.flatten().collect(),
                Err(e) => {
                    log::warn!("invalid glob '{}': {}", pattern, e);
                    continue;
                }
            }
        };
        if matches.is_empty() {
            log::warn!("pattern '{}' matched no files.", pattern);
        }
        for path in matches {
            if !result.contains(&path) {
                result.push(path);
            }
        }
    }
    result
}

/// Choose the [`SaveFormat`] from the `--format` string or infer it from the
/// output file extension. Defaults to PNG when neither is given.
fn parse_format(format_arg: Option<&str>, output: Option<&Path>) -> Result<SaveFormat, String> {
    if let Some(f) = format_arg {
        return SaveFormat::from_name(f).ok_or_else(|| format!("unsupported output format '{}'", f));
    }
    Ok(output.and_then(SaveFormat::from_extension).unwrap_or_default())
}

fn file_stem(path: &Path) -> Option<String> {
    Some(path.file_stem()?.to_string_lossy().into_owned())
}

/// `--output`, else `<output-dir>/<stem>.<ext>`, else `<stem>.<ext>` beside
/// the input (`<stem>_out.<ext>` when that would overwrite it).
fn build_output_path(
    input: &Path,
    output: Option<&Path>,
    output_dir: Option<&Path>,
    format: SaveFormat,
) -> Option<PathBuf> {
    if let Some(out) = output {
        return Some(out.to_path_buf());
    }
    let stem = file_stem(input)?;
    let ext = format.extension();
    if let Some(dir) = output_dir {
        return Some(dir.join(format!("{}.{}", stem, ext)));
    }
    let beside = input.with_file_name(format!("{}.{}", stem, ext));
    if beside == input {
        Some(input.with_file_name(format!("{}_out.{}", stem, ext)))
    } else {
        Some(beside)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::PixelBuffer;

    fn write_png(path: &Path, w: u32, h: u32, rgba: [u8; 4]) {
        io::encode_and_write(&PixelBuffer::filled(w, h, rgba).unwrap(), path, SaveFormat::Png, 90)
            .unwrap();
    }

    fn args(list: &[&str]) -> CliArgs {
        let mut argv = vec!["photolayers"];
        argv.extend_from_slice(list);
        CliArgs::parse_from(argv)
    }

    #[test]
    fn output_path_priority() {
        let input = Path::new("shots/cat.png");
        assert_eq!(
            build_output_path(input, Some(Path::new("x.jpg")), Some(Path::new("out")), SaveFormat::Png),
            Some(PathBuf::from("x.jpg"))
        );
        assert_eq!(
            build_output_path(input, None, Some(Path::new("out")), SaveFormat::Jpeg),
            Some(PathBuf::from("out/cat.jpg"))
        );
        assert_eq!(
            build_output_path(input, None, None, SaveFormat::Tiff),
            Some(PathBuf::from("shots/cat.tiff"))
        );
        assert_eq!(
            build_output_path(input, None, None, SaveFormat::Png),
            Some(PathBuf::from("shots/cat_out.png"))
        );
    }

    #[test]
    fn bare_input_names_stay_relative() {
        assert_eq!(
            build_output_path(Path::new("cat.png"), None, None, SaveFormat::Png),
            Some(PathBuf::from("cat_out.png"))
        );
        assert_eq!(
            build_output_path(Path::new("cat.png"), None, None, SaveFormat::Jpeg),
            Some(PathBuf::from("cat.jpg"))
        );
        assert_eq!(build_output_path(Path::new(""), None, None, SaveFormat::Png), None);
    }

    #[test]
    fn format_from_flag_or_extension() {
        assert_eq!(parse_format(Some("JPEG"), None), Ok(SaveFormat::Jpeg));
        assert!(parse_format(Some("gif"), None).is_err());
        assert_eq!(parse_format(None, Some(Path::new("a.bmp"))), Ok(SaveFormat::Bmp));
        assert_eq!(parse_format(None, Some(Path::new("a.xyz"))), Ok(SaveFormat::Png));
        assert_eq!(parse_format(None, None), Ok(SaveFormat::Png));
    }

    #[test]
    fn inputs_expand_globs_without_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.png", "b.png", "c.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        let literal = dir.path().join("a.png").to_string_lossy().into_owned();
        let pattern = dir.path().join("*.png").to_string_lossy().into_owned();
        let resolved = resolve_inputs(&[literal, pattern, "no/such/*.png".to_string()]);
        assert_eq!(resolved, vec![dir.path().join("a.png"), dir.path().join("b.png")]);
    }

    #[test]
    fn flags_parse_into_typed_values() {
        let a = args(&[
            "-i", "a.png", "--preset", "Sepia", "--brightness", "-3",
            "--rotate", "left", "--rotate", "right", "--crop", "1,2,3,4",
        ]);
        assert_eq!(a.preset, Some(Preset::Sepia));
        assert_eq!(a.rotate, vec![Rotation::Left, Rotation::Right]);
        assert_eq!(a.crop, Some(CropRect::new(1, 2, 3, 4)));
        assert_eq!(a.sliders(), vec![(AdjustmentKind::Brightness, -3.0)]);
        assert_eq!(a.quality, 90);
        assert_eq!(a.thumb_size, 96);
    }

    #[test]
    fn run_applies_preset_and_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.png");
        let output = dir.path().join("out.png");
        write_png(&input, 4, 2, [100, 150, 200, 255]);

        let code = run(args(&[
            "-i", input.to_str().unwrap(),
            "-o", output.to_str().unwrap(),
            "--preset", "grayscale",
            "--rotate", "right",
        ]));
        assert_eq!(code, ExitCode::SUCCESS);
        let out = io::load_image(&output).unwrap();
        assert_eq!(out.dimensions(), (2, 4));
        assert_eq!(out.pixel(0, 0), Some([143, 143, 143, 255]));
    }

    #[test]
    fn recipe_round_trips_through_the_cli() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.png");
        let recipe = dir.path().join("edits.plr");
        write_png(&input, 2, 2, [10, 20, 30, 255]);

        let first = dir.path().join("first.png");
        let code = run(args(&[
            "-i", input.to_str().unwrap(),
            "-o", first.to_str().unwrap(),
            "--preset", "sepia", "--gamma", "150",
            "--save-recipe", recipe.to_str().unwrap(),
        ]));
        assert_eq!(code, ExitCode::SUCCESS);

        let second = dir.path().join("second.png");
        let code = run(args(&[
            "-i", input.to_str().unwrap(),
            "-o", second.to_str().unwrap(),
            "--recipe", recipe.to_str().unwrap(),
        ]));
        assert_eq!(code, ExitCode::SUCCESS);
        assert_eq!(io::load_image(&first).unwrap(), io::load_image(&second).unwrap());
    }

    #[test]
    fn thumbnails_are_written_per_preset() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("pic.png");
        let thumbs = dir.path().join("thumbs");
        write_png(&input, 40, 20, [90, 120, 150, 255]);

        let code = run(args(&[
            "-i", input.to_str().unwrap(),
            "--output-dir", dir.path().join("out").to_str().unwrap(),
            "--thumbnails", thumbs.to_str().unwrap(),
            "--thumb-size", "10",
        ]));
        assert_eq!(code, ExitCode::SUCCESS);
        for preset in Preset::ALL {
            let thumb = io::load_image(&thumbs.join(format!("pic_{}.png", preset.name()))).unwrap();
            assert_eq!(thumb.dimensions(), (10, 5));
        }
        assert!(dir.path().join("out/pic.png").exists());
    }

    #[test]
    fn bad_files_fail_the_batch_but_not_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.png");
        let bad = dir.path().join("bad.png");
        let out = dir.path().join("out");
        write_png(&good, 2, 2, [1, 2, 3, 255]);
        std::fs::write(&bad, b"not an image").unwrap();

        let code = run(args(&[
            "-i", bad.to_str().unwrap(), good.to_str().unwrap(),
            "--output-dir", out.to_str().unwrap(),
        ]));
        assert_eq!(code, ExitCode::FAILURE);
        assert!(out.join("good.png").exists());
    }

    #[test]
    fn out_of_range_slider_fails_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.png");
        write_png(&input, 1, 1, [1, 2, 3, 255]);
        let output = dir.path().join("out.png");
        let code = run(args(&[
            "-i", input.to_str().unwrap(),
            "-o", output.to_str().unwrap(),
            "--gamma", "0",
        ]));
        assert_eq!(code, ExitCode::FAILURE);
        assert!(!output.exists());
    }

    #[test]
    fn many_inputs_need_an_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.png");
        let b = dir.path().join("b.png");
        write_png(&a, 1, 1, [0, 0, 0, 255]);
        write_png(&b, 1, 1, [0, 0, 0, 255]);
        let code = run(args(&[
            "-i", a.to_str().unwrap(), b.to_str().unwrap(),
            "-o", dir.path().join("x.png").to_str().unwrap(),
        ]));
        assert_eq!(code, ExitCode::FAILURE);
    }
}
