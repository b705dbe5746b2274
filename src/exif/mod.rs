//! Access to the EXIF UserComment tag.
//!
//! - [`read_user_comment`] — Read the tag text from a JPEG or TIFF (nom-exif)
//! - [`write_user_comment`] — Replace the tag, preserving all other metadata (little_exif)
//!
//! Tag text uses the `charset=<Name> <payload>` form; [`user_comment`]
//! converts it to and from the 8-byte-header layout stored in the file.

mod reader;
pub mod user_comment;
mod writer;

pub use reader::read_user_comment;
pub use writer::write_user_comment;
