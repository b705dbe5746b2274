//! # annexif
//!
//! Read and write plot annotations (a plot id and a normalization date)
//! packed into the EXIF `UserComment` tag of JPEG and TIFF images.
//!
//! The tag text looks like
//! `charset=Ascii normalized=2011-03-01,plotid=42`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use annexif::{CommentRecord, get_normalized_date, get_plot_id, set_plot_id, write_record};
//! use std::path::Path;
//!
//! fn main() -> annexif::Result<()> {
//!     let path = Path::new("plot.jpg");
//!
//!     // Annotate a fresh image with both fields
//!     write_record(&CommentRecord::new("42", "2011-03-01")?, path)?;
//!
//!     // Change one field, the other is carried over
//!     set_plot_id("43", path)?;
//!
//!     println!("{} normalized on {}", get_plot_id(path)?, get_normalized_date(path)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`comment`] — Field markers, [`CommentRecord`], `decode_field` / `encode`
//! - [`exif`] — UserComment tag read (nom-exif) and write (little_exif + img-parts)
//! - [`annotation`] — Per-file operations re-exported at the crate root
//! - [`pipeline`] — Batch helpers used by the CLI
//! - [`config`] — CLI configuration loading/saving

pub mod annotation;
pub mod comment;
pub mod config;
pub mod error;
pub mod exif;
pub mod pipeline;

pub use annotation::{
    get_normalized_date, get_plot_id, read_record, read_user_comment, set_normalized_date,
    set_plot_id, version, write_record,
};
pub use comment::{CommentRecord, Field};
pub use error::{Error, Result};
