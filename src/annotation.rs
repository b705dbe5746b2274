//! Plot annotations stored in an image's UserComment tag.
//!
//! Every call opens the image, reads or rewrites the tag, and releases the
//! file before returning.

use std::path::Path;

use crate::comment::{self, CommentRecord, Field};
use crate::error::{Error, Result};
use crate::exif;
use crate::pipeline::ImageKind;

const LIBRARY_NAME: &str = "Annotation Exif Library";

/// Library name and `major.minor` version.
///
/// ```rust
/// assert_eq!(annexif::version(), "Annotation Exif Library, Version: 0.1.");
/// ```
pub fn version() -> String {
    format!(
        "{LIBRARY_NAME}, Version: {}.{}.",
        env!("CARGO_PKG_VERSION_MAJOR"),
        env!("CARGO_PKG_VERSION_MINOR"),
    )
}

/// Raw UserComment text, `None` when the image has no comment.
pub fn read_user_comment(path: &Path) -> Result<Option<String>> {
    exif::read_user_comment(path)
}

fn read_field(path: &Path, field: Field) -> Result<String> {
    let comment = exif::read_user_comment(path)?
        .ok_or_else(|| Error::not_found(field, "image has no UserComment"))?;
    comment::decode_field(&comment, field)
}

/// Plot id stored in the image.
pub fn get_plot_id(path: &Path) -> Result<String> {
    read_field(path, Field::PlotId)
}

/// Date the image was normalized.
pub fn get_normalized_date(path: &Path) -> Result<String> {
    read_field(path, Field::NormalizedDate)
}

/// Both fields stored in the image.
pub fn read_record(path: &Path) -> Result<CommentRecord> {
    let comment = exif::read_user_comment(path)?
        .ok_or_else(|| Error::not_found(Field::PlotId, "image has no UserComment"))?;
    CommentRecord::from_comment(&comment)
}

/// Write both fields, replacing whatever comment the image had.
pub fn write_record(record: &CommentRecord, path: &Path) -> Result<bool> {
    let kind = ImageKind::from_path(path)
        .ok_or_else(|| Error::UnsupportedFormat(path.to_path_buf()))?;
    exif::write_user_comment(path, &record.encode(), kind)?;
    log::info!(
        "Annotated {}: plot id {}, normalized {}",
        path.display(),
        record.plot_id,
        record.normalized_date
    );
    Ok(true)
}

/// Replace one field, carrying the other over from the current comment.
fn set_field(field: Field, value: &str, path: &Path) -> Result<bool> {
    comment::validate(field, value)?;
    let kept = read_field(path, field.other())?;

    let record = match field {
        Field::PlotId => CommentRecord::new(value, kept)?,
        Field::NormalizedDate => CommentRecord::new(kept, value)?,
    };
    write_record(&record, path)
}

/// Store a new plot id, keeping the normalized date.
///
/// Fails with [`Error::NotFound`] when the image has no normalized date yet;
/// use [`write_record`] to annotate a fresh image.
pub fn set_plot_id(plot_id: &str, path: &Path) -> Result<bool> {
    set_field(Field::PlotId, plot_id, path)
}

/// Store a new normalized date, keeping the plot id.
///
/// Fails with [`Error::NotFound`] when the image has no plot id yet.
pub fn set_normalized_date(date: &str, path: &Path) -> Result<bool> {
    set_field(Field::NormalizedDate, date, path)
}
