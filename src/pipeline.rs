use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::annotation;
use crate::comment::{CommentRecord, Field};
use crate::config::Config;

/// The write strategy for a given image file, determined by its format.
///
/// # Example
///
/// ```rust
/// use annexif::pipeline::ImageKind;
/// use std::path::Path;
///
/// assert_eq!(ImageKind::from_path(Path::new("plot.JPG")), Some(ImageKind::Jpeg));
/// assert_eq!(ImageKind::from_path(Path::new("scan.tif")), Some(ImageKind::Tiff));
/// assert_eq!(ImageKind::from_path(Path::new("photo.png")), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    /// JPEG — APP1 EXIF segment replaced via img-parts
    Jpeg,
    /// TIFF — EXIF written in place via little_exif
    Tiff,
}

impl ImageKind {
    /// Determine the image kind from a file path extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "tif" | "tiff" => Some(Self::Tiff),
            _ => None,
        }
    }
}

/// What the CLI should do with each image.
#[derive(Debug, Clone)]
pub enum Action {
    /// Read the given fields (both when `None`).
    Get(Option<Field>),
    /// Print the raw UserComment text.
    Show,
    /// Write a plot id, a normalized date, or both.
    Set {
        plot_id: Option<String>,
        normalized_date: Option<String>,
    },
}

/// The result of processing a single image.
#[derive(Debug, Default, Serialize)]
pub struct ProcessResult {
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plot_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub written: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Collect supported image files from the given paths.
///
/// Accepts a mix of file paths and directory paths. Directories are walked
/// recursively (following symlinks). Only files with supported image extensions
/// are included.
pub fn collect_images(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut images = Vec::new();

    for path in paths {
        if path.is_file() {
            if is_supported_image(path) {
                images.push(path.clone());
            } else {
                log::warn!("Skipping unsupported file: {}", path.display());
            }
        } else if path.is_dir() {
            for entry in WalkDir::new(path)
                .follow_links(true)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let p = entry.path();
                if p.is_file() && is_supported_image(p) {
                    images.push(p.to_path_buf());
                }
            }
        } else {
            log::warn!("Path does not exist: {}", path.display());
        }
    }

    images
}

/// Check if a file has a supported image extension.
fn is_supported_image(path: &Path) -> bool {
    ImageKind::from_path(path).is_some()
}

/// Create a backup of the original file.
fn backup_file(path: &Path) -> Result<PathBuf> {
    let backup_path = path.with_extension(format!(
        "{}.bak",
        path.extension().unwrap_or_default().to_string_lossy()
    ));

    if !backup_path.exists() {
        std::fs::copy(path, &backup_path).context("Failed to create backup")?;
        log::debug!("Backup created: {}", backup_path.display());
    }

    Ok(backup_path)
}

/// Run one action against one image.
///
/// Errors are captured in [`ProcessResult::error`] so a batch can continue
/// past a bad file.
pub fn process_image(path: &Path, action: &Action, config: &Config) -> ProcessResult {
    let mut result = ProcessResult {
        path: path.to_path_buf(),
        ..Default::default()
    };

    if let Err(e) = run_action(path, action, config, &mut result) {
        result.error = Some(format!("{e:#}"));
    }

    result
}

fn run_action(
    path: &Path,
    action: &Action,
    config: &Config,
    result: &mut ProcessResult,
) -> Result<()> {
    match action {
        Action::Get(Some(Field::PlotId)) => {
            result.plot_id = Some(annotation::get_plot_id(path)?);
        }
        Action::Get(Some(Field::NormalizedDate)) => {
            result.normalized_date = Some(annotation::get_normalized_date(path)?);
        }
        Action::Get(None) => {
            let record = annotation::read_record(path)?;
            result.plot_id = Some(record.plot_id);
            result.normalized_date = Some(record.normalized_date);
        }
        Action::Show => {
            result.comment = annotation::read_user_comment(path)?;
        }
        Action::Set {
            plot_id,
            normalized_date,
        } => {
            let record = merged_record(path, plot_id.as_deref(), normalized_date.as_deref())?;
            result.comment = Some(record.encode());
            result.plot_id = Some(record.plot_id.clone());
            result.normalized_date = Some(record.normalized_date.clone());

            if config.output.dry_run {
                log::debug!("Dry run, not writing {}", path.display());
                return Ok(());
            }

            if config.output.backup_originals {
                match backup_file(path) {
                    Ok(backup) => result.backup_path = Some(backup),
                    Err(e) => log::warn!("Failed to backup {}: {e}", path.display()),
                }
            }

            result.written = annotation::write_record(&record, path)?;
        }
    }
    Ok(())
}

/// Combine new values with whatever the image already carries.
///
/// With both values given the old comment is not consulted. With one, the
/// other field must be present in the image.
fn merged_record(
    path: &Path,
    plot_id: Option<&str>,
    normalized_date: Option<&str>,
) -> Result<CommentRecord> {
    let record = match (plot_id, normalized_date) {
        (Some(id), Some(date)) => CommentRecord::new(id, date)?,
        (Some(id), None) => {
            let date = annotation::get_normalized_date(path)?;
            CommentRecord::new(id, date)?
        }
        (None, Some(date)) => {
            let id = annotation::get_plot_id(path)?;
            CommentRecord::new(id, date)?
        }
        (None, None) => anyhow::bail!("Nothing to set: give a plot id and/or a normalized date"),
    };
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fixture_jpeg(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        image::RgbImage::new(8, 8).save(&path).unwrap();
        path
    }

    // ── ImageKind::from_path ──────────────────────────────────────────

    #[test]
    fn image_kind_jpeg() {
        assert_eq!(ImageKind::from_path(Path::new("photo.jpg")), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::from_path(Path::new("photo.jpeg")), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::from_path(Path::new("PHOTO.JPG")), Some(ImageKind::Jpeg));
    }

    #[test]
    fn image_kind_tiff() {
        assert_eq!(ImageKind::from_path(Path::new("scan.tif")), Some(ImageKind::Tiff));
        assert_eq!(ImageKind::from_path(Path::new("scan.TIFF")), Some(ImageKind::Tiff));
    }

    #[test]
    fn image_kind_unsupported() {
        assert_eq!(ImageKind::from_path(Path::new("image.png")), None);
        assert_eq!(ImageKind::from_path(Path::new("doc.pdf")), None);
        assert_eq!(ImageKind::from_path(Path::new("noext")), None);
    }

    // ── is_supported_image ───────────────────────────────────────────

    #[test]
    fn supported_image_extensions() {
        assert!(is_supported_image(Path::new("photo.jpg")));
        assert!(is_supported_image(Path::new("photo.JPEG")));
        assert!(is_supported_image(Path::new("photo.tif")));
        assert!(!is_supported_image(Path::new("photo.webp")));
        assert!(!is_supported_image(Path::new("readme.txt")));
        assert!(!is_supported_image(Path::new("noext")));
    }

    // ── collect_images ───────────────────────────────────────────────

    #[test]
    fn collect_images_single_file() {
        let dir = TempDir::new().unwrap();
        let jpg = dir.path().join("test.jpg");
        fs::write(&jpg, b"fake").unwrap();

        let images = collect_images(&[jpg.clone()]);
        assert_eq!(images, vec![jpg]);
    }

    #[test]
    fn collect_images_skips_unsupported() {
        let dir = TempDir::new().unwrap();
        let txt = dir.path().join("readme.txt");
        fs::write(&txt, b"hello").unwrap();

        assert!(collect_images(&[txt]).is_empty());
    }

    #[test]
    fn collect_images_directory_recursive() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();

        fs::write(dir.path().join("a.jpg"), b"fake").unwrap();
        fs::write(sub.join("b.tiff"), b"fake").unwrap();
        fs::write(sub.join("c.txt"), b"fake").unwrap();

        let images = collect_images(&[dir.path().to_path_buf()]);
        assert_eq!(images.len(), 2);
    }

    #[test]
    fn collect_images_nonexistent_path() {
        let images = collect_images(&[PathBuf::from("/nonexistent/path")]);
        assert!(images.is_empty());
    }

    // ── process_image ────────────────────────────────────────────────

    #[test]
    fn set_both_then_get_all() {
        let dir = TempDir::new().unwrap();
        let path = fixture_jpeg(dir.path(), "plot.jpg");
        let config = Config::default();

        let set = Action::Set {
            plot_id: Some("42".into()),
            normalized_date: Some("2011-03-01".into()),
        };
        let result = process_image(&path, &set, &config);
        assert_eq!(result.error, None);
        assert!(result.written);
        assert_eq!(
            result.comment.as_deref(),
            Some("charset=Ascii normalized=2011-03-01,plotid=42")
        );

        let result = process_image(&path, &Action::Get(None), &config);
        assert_eq!(result.error, None);
        assert_eq!(result.plot_id.as_deref(), Some("42"));
        assert_eq!(result.normalized_date.as_deref(), Some("2011-03-01"));
    }

    #[test]
    fn dry_run_leaves_file_untouched() {
        let dir = TempDir::new().unwrap();
        let path = fixture_jpeg(dir.path(), "plot.jpg");
        let before = fs::read(&path).unwrap();

        let mut config = Config::default();
        config.output.dry_run = true;

        let set = Action::Set {
            plot_id: Some("7".into()),
            normalized_date: Some("2012-01-01".into()),
        };
        let result = process_image(&path, &set, &config);
        assert_eq!(result.error, None);
        assert!(!result.written);
        assert!(result.comment.is_some());
        assert_eq!(fs::read(&path).unwrap(), before);
    }

    #[test]
    fn set_single_field_without_comment_fails() {
        let dir = TempDir::new().unwrap();
        let path = fixture_jpeg(dir.path(), "plot.jpg");

        let set = Action::Set {
            plot_id: Some("7".into()),
            normalized_date: None,
        };
        let result = process_image(&path, &set, &Config::default());
        assert!(result.error.unwrap().contains("normalized date not found"));
        assert!(!result.written);
    }

    #[test]
    fn set_with_nothing_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = fixture_jpeg(dir.path(), "plot.jpg");
        let set = Action::Set {
            plot_id: None,
            normalized_date: None,
        };
        assert!(process_image(&path, &set, &Config::default()).error.is_some());
    }

    #[test]
    fn backup_created_before_write() {
        let dir = TempDir::new().unwrap();
        let path = fixture_jpeg(dir.path(), "plot.jpg");
        let original = fs::read(&path).unwrap();

        let mut config = Config::default();
        config.output.backup_originals = true;

        let set = Action::Set {
            plot_id: Some("1".into()),
            normalized_date: Some("2011-03-01".into()),
        };
        let result = process_image(&path, &set, &config);
        assert_eq!(result.error, None);

        let backup = result.backup_path.unwrap();
        assert_eq!(backup, dir.path().join("plot.jpg.bak"));
        assert_eq!(fs::read(&backup).unwrap(), original);
    }

    #[test]
    fn show_returns_raw_comment() {
        let dir = TempDir::new().unwrap();
        let path = fixture_jpeg(dir.path(), "plot.jpg");
        let config = Config::default();

        let result = process_image(&path, &Action::Show, &config);
        assert_eq!(result.error, None);
        assert_eq!(result.comment, None);

        let record = CommentRecord::new("9", "2013-05-05").unwrap();
        annotation::write_record(&record, &path).unwrap();
        let result = process_image(&path, &Action::Show, &config);
        assert!(result.comment.unwrap().contains("plotid=9"));
    }
}
