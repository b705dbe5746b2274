use img_parts::Bytes;
use img_parts::ImageEXIF;
use img_parts::jpeg::Jpeg;
use little_exif::exif_tag::ExifTag;
use little_exif::filetype::FileExtension;
use little_exif::metadata::Metadata;
use std::io;
use std::path::Path;

use super::user_comment;
use crate::error::{Error, Result};
use crate::pipeline::ImageKind;

// little_exif as_u8_vec(JPEG) returns: [APP1 marker 2B][length 2B][Exif\0\0 6B][TIFF data]
// img-parts set_exif() expects just the TIFF data (after Exif\0\0)
const JPEG_EXIF_OVERHEAD: usize = 10; // 2 + 2 + 6

/// Load existing EXIF metadata from a file path using little_exif.
/// Returns None if it can't parse (instead of losing data).
fn load_existing_metadata(path: &Path) -> Option<Metadata> {
    let path_owned = path.to_path_buf();
    // Suppress panics from little_exif
    let prev_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(|_| {}));
    let result = std::panic::catch_unwind(move || Metadata::new_from_path(&path_owned));
    std::panic::set_hook(prev_hook);

    match result {
        Ok(Ok(m)) => Some(m),
        Ok(Err(e)) => {
            log::debug!("little_exif could not parse EXIF: {e}");
            None
        }
        Err(_) => {
            log::debug!("little_exif panicked parsing EXIF");
            None
        }
    }
}

/// Replace the UserComment tag of an image with `comment`, keeping every
/// other tag.
///
/// `comment` is in text form (`charset=Ascii ...`); it is converted to the
/// 8-byte-header layout before writing.
pub fn write_user_comment(path: &Path, comment: &str, kind: ImageKind) -> Result<()> {
    let tag = ExifTag::UserComment(user_comment::to_bytes(comment));

    match kind {
        ImageKind::Jpeg => write_tag_to_jpeg(path, tag),
        ImageKind::Tiff => write_tag_to_tiff(path, tag),
    }?;

    log::debug!("UserComment written to {}: {comment:?}", path.display());
    Ok(())
}

/// Write a tag into a JPEG file, preserving all existing segments.
///
/// Only the APP1 EXIF segment changes; it stays at its original position.
fn write_tag_to_jpeg(path: &Path, tag: ExifTag) -> Result<()> {
    let file_bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;

    let mut jpeg = Jpeg::from_bytes(Bytes::from(file_bytes))
        .map_err(|e| Error::io(path, invalid_data(format!("Failed to parse JPEG: {e}"))))?;

    // Remember where the EXIF segment was originally positioned
    let orig_exif_pos = find_exif_segment_pos(&jpeg);

    let mut metadata = if jpeg.exif().is_some() {
        load_existing_metadata(path).ok_or_else(|| {
            Error::io(
                path,
                invalid_data("existing EXIF data could not be parsed, refusing to overwrite it"),
            )
        })?
    } else {
        log::debug!("No existing EXIF in {}, building fresh", path.display());
        Metadata::new()
    };
    metadata.set_tag(tag);

    let exif_bytes = metadata.as_u8_vec(FileExtension::JPEG);
    if exif_bytes.len() <= JPEG_EXIF_OVERHEAD {
        return Err(Error::io(path, invalid_data("little_exif produced an empty EXIF block")));
    }
    jpeg.set_exif(Some(Bytes::from(exif_bytes[JPEG_EXIF_OVERHEAD..].to_vec())));

    // set_exif() inserts at position 3. Move the segment back so EXIF keeps
    // its place ahead of any XMP APP1.
    if let Some(new_pos) = find_exif_segment_pos(&jpeg) {
        let target_pos = orig_exif_pos.unwrap_or(1); // default: right after APP0
        if target_pos < new_pos {
            let segments = jpeg.segments_mut();
            let seg = segments.remove(new_pos);
            segments.insert(target_pos, seg);
        }
    }

    let output = jpeg.encoder().bytes();
    std::fs::write(path, &output).map_err(|e| Error::io(path, e))?;

    Ok(())
}

/// Write a tag into a TIFF file through little_exif.
fn write_tag_to_tiff(path: &Path, tag: ExifTag) -> Result<()> {
    let mut metadata = load_existing_metadata(path)
        .ok_or_else(|| Error::io(path, invalid_data("Failed to parse TIFF metadata")))?;
    metadata.set_tag(tag);
    metadata.write_to_file(path).map_err(|e| Error::io(path, e))
}

/// Find the position of the EXIF APP1 segment in a JPEG.
/// EXIF segments have marker 0xE1 (APP1) and contents starting with "Exif\0\0".
fn find_exif_segment_pos(jpeg: &Jpeg) -> Option<usize> {
    const EXIF_PREFIX: &[u8] = b"Exif\0\0";
    jpeg.segments()
        .iter()
        .position(|s| s.marker() == 0xE1 && s.contents().starts_with(EXIF_PREFIX))
}

fn invalid_data(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.into())
}
