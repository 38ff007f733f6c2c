use std::{
    fs,
    path::{Path, PathBuf},
    time::Instant,
};

use anyhow::{anyhow, bail, Context, Result};
use image::{
    imageops::{replace, resize, FilterType::Lanczos3},
    ImageReader, RgbImage,
};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tracing::{debug, warn};

use crate::blocks::{block_position, column_count, split_into_blocks};
use crate::color::{average_color, find_best_match, AverageColor};
use crate::config::Settings;

/// Small images resized to the block size, each paired with its average color.
/// Both sequences only grow together, so index `i` always refers to the same image.
#[derive(Default)]
pub(crate) struct Palette {
    images: Vec<RgbImage>,
    colors: Vec<AverageColor>,
}

impl Palette {
    pub(crate) fn push(&mut self, image: RgbImage) {
        self.colors.push(average_color(&image));
        self.images.push(image);
    }

    pub(crate) fn len(&self) -> usize {
        self.images.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub(crate) fn colors(&self) -> &[AverageColor] {
        &self.colors
    }

    pub(crate) fn image(&self, index: usize) -> &RgbImage {
        &self.images[index]
    }
}

/// Runs the whole pipeline and returns where the mosaic was written.
pub(crate) fn mosaic(settings: &Settings) -> Result<PathBuf> {
    println!("[1/4] Loading the main image.");
    let main = load_main_image(&settings.main_image_path)?;
    let main = scale_image(main, settings.mosaic_size_scale)?;
    println!(
        "[1/4] Main image is {}x{} after scaling.",
        main.width(),
        main.height()
    );

    println!("[2/4] Preprocessing the small images.");
    let palette = read_palette(
        &settings.small_images_dir_path,
        settings.mosaic_block_width,
        settings.mosaic_block_height,
        settings.progress_bar_width,
    )?;
    if palette.is_empty() {
        debug!(
            "No usable image in [{}]",
            settings.small_images_dir_path.display()
        );
    }
    println!("[2/4] Loaded {} small images.", palette.len());

    println!("[3/4] Generating the mosaic image.");
    let output = compose(
        &main,
        settings.mosaic_block_width,
        settings.mosaic_block_height,
        &palette,
    )?;

    println!("[4/4] Saving the mosaic image.");
    output.save(&settings.result_image_path).with_context(|| {
        format!(
            "Could not write the result image: [{}]",
            settings.result_image_path.display()
        )
    })?;
    Ok(settings.result_image_path.clone())
}

pub(crate) fn load_main_image(path: &Path) -> Result<RgbImage> {
    decode(path).with_context(|| format!("Could not read the image: [{}]", path.display()))
}

fn decode(path: &Path) -> Result<RgbImage> {
    let image = ImageReader::open(path)?
        .with_guessed_format()?
        .decode()?
        .into_rgb8();
    Ok(image)
}

/// Upscales by an integer factor; a factor of 1 hands the image back untouched.
pub(crate) fn scale_image(image: RgbImage, scale: u32) -> Result<RgbImage> {
    if scale == 1 {
        return Ok(image);
    }
    let (width, height) = scaled_dimensions(image.dimensions(), scale)?;
    Ok(resize(&image, width, height, Lanczos3))
}

fn scaled_dimensions((width, height): (u32, u32), scale: u32) -> Result<(u32, u32)> {
    match (width.checked_mul(scale), height.checked_mul(scale)) {
        (Some(w), Some(h)) => Ok((w, h)),
        _ => bail!("Scaling {width}x{height} by {scale} overflows the image dimensions"),
    }
}

fn progress_bar(len: u64, bar_width: u32) -> Result<ProgressBar> {
    let style = ProgressStyle::with_template(&format!(
        "{{percent:>3}}% {{spinner}} [{{bar:{bar_width}}}] {{wide_msg}}"
    ))?
    .progress_chars("=> ");
    Ok(ProgressBar::with_draw_target(Some(len), ProgressDrawTarget::stdout()).with_style(style))
}

/// Directory entries that are regular files, in lexicographic path order.
fn list_files(directory: &Path) -> Result<Vec<PathBuf>> {
    if !directory.is_dir() {
        bail!(
            "Small images directory does not exist or is not a directory: [{}]",
            directory.display()
        );
    }
    let mut files = vec![];
    for entry in fs::read_dir(directory)
        .with_context(|| format!("Could not list directory: [{}]", directory.display()))?
    {
        let path = entry?.path();
        // Follows symlinks.
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Files that fail to decode are reported and skipped.
pub(crate) fn read_palette(
    directory: &Path,
    block_width: u32,
    block_height: u32,
    bar_width: u32,
) -> Result<Palette> {
    let files = list_files(directory)?;
    let pb = progress_bar(files.len() as u64, bar_width)?;
    let mut palette = Palette::default();
    for path in &files {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        pb.set_message(name);
        let started = Instant::now();
        match decode(path) {
            Ok(img) => {
                palette.push(resize(&img, block_width, block_height, Lanczos3));
                debug!(path = %path.display(), elapsed = ?started.elapsed(), "small image ready");
            }
            Err(err) => pb.suspend(|| {
                warn!("Could not read the image: [{}]: {err:#}", path.display());
            }),
        }
        pb.inc(1);
    }
    pb.finish_and_clear();
    debug!(
        usable = palette.len(),
        skipped = files.len() - palette.len(),
        "palette built"
    );
    Ok(palette)
}

/// Replaces every whole block of `main` with its closest palette image.
/// Pixels outside the block grid keep their values from `main`.
pub(crate) fn compose(
    main: &RgbImage,
    block_width: u32,
    block_height: u32,
    palette: &Palette,
) -> Result<RgbImage> {
    let columns = column_count(main.width(), block_width);
    let mut output = main.clone();
    let mut composed = 0_usize;
    for (index, block) in split_into_blocks(main, block_width, block_height).enumerate() {
        let color = average_color(&*block.view());
        let (x, y) = block_position(index, columns, block_width, block_height);
        debug_assert_eq!((x, y), (block.x, block.y));
        let best = find_best_match(&color, palette.colors()).ok_or_else(|| {
            anyhow!("no match found for block {index} at ({x}, {y}): palette is empty")
        })?;
        replace(&mut output, palette.image(best), i64::from(x), i64::from(y));
        composed += 1;
    }
    debug!(blocks = composed, palette = palette.len(), "mosaic composed");
    Ok(output)
}
