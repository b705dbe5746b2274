use img_parts::Bytes;
use img_parts::ImageEXIF;
use img_parts::jpeg::Jpeg;
use nom_exif::*;
use std::path::Path;

use super::user_comment;
use crate::error::{Error, Result};
use crate::pipeline::ImageKind;

/// Read the UserComment tag of an image as text.
///
/// Returns `Ok(None)` when the image carries no EXIF data, no UserComment
/// tag, or an empty one. Files that cannot be opened or parsed are reported
/// as [`Error::Io`].
pub fn read_user_comment(path: &Path) -> Result<Option<String>> {
    let mut parser = MediaParser::new();
    let ms = MediaSource::file_path(path).map_err(|e| Error::io(path, to_io_error(e)))?;

    let iter: ExifIter = match parser.parse(ms) {
        Ok(iter) => iter,
        Err(e) if lacks_exif_block(path) => {
            log::debug!("No EXIF data found in {}: {e}", path.display());
            return Ok(None);
        }
        Err(e) => return Err(Error::io(path, to_io_error(e))),
    };
    let exif: Exif = iter.into();

    let Some(val) = exif.get(ExifTag::UserComment) else {
        log::debug!("No UserComment tag in {}", path.display());
        return Ok(None);
    };

    let comment = entry_to_comment(val);
    log::debug!("UserComment of {}: {comment:?}", path.display());
    if comment.is_empty() { Ok(None) } else { Ok(Some(comment)) }
}

/// Render a UserComment entry as text, keeping its charset as a prefix.
fn entry_to_comment(val: &EntryValue) -> String {
    match val {
        EntryValue::Undefined(bytes) => user_comment::from_bytes(bytes),
        EntryValue::Text(s) => user_comment::from_bytes(s.as_bytes()),
        other => other.to_string().trim().to_string(),
    }
}

/// `true` only for an intact JPEG container without an APP1 EXIF segment.
fn lacks_exif_block(path: &Path) -> bool {
    if ImageKind::from_path(path) != Some(ImageKind::Jpeg) {
        return false;
    }
    let Ok(bytes) = std::fs::read(path) else {
        return false;
    };
    match Jpeg::from_bytes(Bytes::from(bytes)) {
        Ok(jpeg) => jpeg.exif().is_none(),
        Err(_) => false,
    }
}

fn to_io_error(e: nom_exif::Error) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undefined_entry_keeps_charset() {
        let val = EntryValue::Undefined(b"ASCII\0\0\0normalized=2011-03-01,plotid=42".to_vec());
        assert_eq!(entry_to_comment(&val), "charset=Ascii normalized=2011-03-01,plotid=42");
    }

    #[test]
    fn text_entry_passes_through() {
        let val = EntryValue::Text("normalized=2011-03-01,plotid=42".to_string());
        assert_eq!(entry_to_comment(&val), "normalized=2011-03-01,plotid=42");
    }

    #[test]
    fn jpeg_without_exif_has_no_comment() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("plain.jpg");
        image::RgbImage::new(8, 8).save(&path).unwrap();

        assert_eq!(read_user_comment(&path).unwrap(), None);
    }

    #[test]
    fn truncated_jpeg_is_io_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("plot.jpg");
        image::RgbImage::new(8, 8).save(&path).unwrap();
        crate::exif::write_user_comment(&path, "charset=Ascii plotid=1", ImageKind::Jpeg)
            .unwrap();

        // Cut the file inside its header segments
        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..40]).unwrap();

        let err = read_user_comment(&path).unwrap_err();
        assert!(err.is_io(), "{err}");
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = read_user_comment(Path::new("/nonexistent/photo.jpg")).unwrap_err();
        assert!(err.is_io());
    }
}
