use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use ini::{Ini, ParseOption};

const SETTINGS: &str = "settings";
const SIZES: &str = "sizes";

/// Backslashes are kept as written so Windows paths survive.
fn parse_option() -> ParseOption {
    ParseOption {
        enabled_escape: false,
        ..ParseOption::default()
    }
}

/// Everything the pipeline needs, read once from the INI file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Settings {
    pub main_image_path: PathBuf,
    pub small_images_dir_path: PathBuf,
    pub result_image_path: PathBuf,
    pub mosaic_size_scale: u32,
    pub mosaic_block_width: u32,
    pub mosaic_block_height: u32,
    pub progress_bar_width: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            main_image_path: PathBuf::from("main.jpg"),
            small_images_dir_path: PathBuf::from("parts"),
            result_image_path: PathBuf::from("result.jpg"),
            mosaic_size_scale: 1,
            mosaic_block_width: 32,
            mosaic_block_height: 32,
            progress_bar_width: 50,
        }
    }
}

impl Settings {
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let ini = Ini::load_from_file_opt(path, parse_option())
            .with_context(|| format!("Could not read config file: [{}]", path.display()))?;
        Self::from_ini(&ini)
    }

    /// Missing sections and keys fall back to [`Settings::default`].
    pub(crate) fn from_ini(ini: &Ini) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            main_image_path: path_or(ini, "main_image_path", defaults.main_image_path),
            small_images_dir_path: path_or(
                ini,
                "small_images_dir_path",
                defaults.small_images_dir_path,
            ),
            result_image_path: path_or(ini, "result_image_path", defaults.result_image_path),
            mosaic_size_scale: positive_or(ini, "mosaic_size_scale", defaults.mosaic_size_scale)?,
            mosaic_block_width: positive_or(
                ini,
                "mosaic_block_width",
                defaults.mosaic_block_width,
            )?,
            mosaic_block_height: positive_or(
                ini,
                "mosaic_block_height",
                defaults.mosaic_block_height,
            )?,
            progress_bar_width: positive_or(
                ini,
                "progress_bar_width",
                defaults.progress_bar_width,
            )?,
        })
    }
}

fn path_or(ini: &Ini, key: &str, default: PathBuf) -> PathBuf {
    ini.get_from(Some(SETTINGS), key)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or(default)
}

fn positive_or(ini: &Ini, key: &str, default: u32) -> Result<u32> {
    let Some(raw) = ini.get_from(Some(SIZES), key) else {
        return Ok(default);
    };
    let value = raw
        .trim()
        .parse::<u32>()
        .with_context(|| format!("Invalid value for [{SIZES}] {key}: {raw:?}"))?;
    if value == 0 {
        bail!("Invalid value for [{SIZES}] {key}: must be at least 1");
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Settings> {
        Settings::from_ini(&Ini::load_from_str_opt(text, parse_option())?)
    }

    #[test]
    fn empty_file_gives_defaults() -> Result<()> {
        assert_eq!(parse("")?, Settings::default());
        Ok(())
    }

    #[test]
    fn reads_every_key() -> Result<()> {
        let settings = parse(
            "[settings]\n\
             main_image_path = photo.png\n\
             small_images_dir_path = tiles\n\
             result_image_path = out/mosaic.png\n\
             [sizes]\n\
             mosaic_size_scale = 3\n\
             mosaic_block_width = 16\n\
             mosaic_block_height = 8\n\
             progress_bar_width = 20\n",
        )?;
        assert_eq!(
            settings,
            Settings {
                main_image_path: PathBuf::from("photo.png"),
                small_images_dir_path: PathBuf::from("tiles"),
                result_image_path: PathBuf::from("out/mosaic.png"),
                mosaic_size_scale: 3,
                mosaic_block_width: 16,
                mosaic_block_height: 8,
                progress_bar_width: 20,
            }
        );
        Ok(())
    }

    #[test]
    fn sizes_under_the_wrong_section_are_ignored() -> Result<()> {
        let settings = parse("[settings]\nmosaic_block_width = 7\n")?;
        assert_eq!(settings.mosaic_block_width, 32);
        Ok(())
    }

    #[test]
    fn rejects_non_numeric_size() {
        let err = parse("[sizes]\nmosaic_block_width = wide\n").unwrap_err();
        assert!(err.to_string().contains("mosaic_block_width"), "{err:#}");
    }

    #[test]
    fn rejects_zero_size() {
        let err = parse("[sizes]\nmosaic_size_scale = 0\n").unwrap_err();
        assert!(err.to_string().contains("at least 1"), "{err:#}");
    }

    #[test]
    fn backslashes_in_paths_are_kept() -> Result<()> {
        let settings = parse(
            "[settings]\n\
             main_image_path = C:\\Users\\me\\photo.jpg\n\
             small_images_dir_path = D:\\pics\\parts\n\
             result_image_path = C:\\new\\tiles.jpg\n",
        )?;
        assert_eq!(settings.main_image_path, PathBuf::from(r"C:\Users\me\photo.jpg"));
        assert_eq!(settings.small_images_dir_path, PathBuf::from(r"D:\pics\parts"));
        assert_eq!(settings.result_image_path, PathBuf::from(r"C:\new\tiles.jpg"));
        Ok(())
    }

    #[test]
    fn backslashes_survive_loading_from_disk() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.ini");
        std::fs::write(&path, "[settings]\nmain_image_path = C:\\new\\tiles.jpg\n")?;
        let settings = Settings::load(&path)?;
        assert_eq!(settings.main_image_path, PathBuf::from(r"C:\new\tiles.jpg"));
        Ok(())
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ini");
        let err = Settings::load(&path).unwrap_err();
        assert!(
            err.to_string().starts_with("Could not read config file"),
            "{err:#}"
        );
    }
}
