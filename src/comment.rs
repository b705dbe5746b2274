//! Plot id / normalized date record carried in the UserComment text.
//!
//! The comment text has the form
//! `charset=Ascii normalized=<date>,plotid=<id>`. Each field is found by
//! its marker and runs up to the next comma or the end of the text.

use std::fmt;

use crate::error::{Error, Result};

/// Prefix written in front of every encoded record.
pub const CHARSET_PREFIX: &str = "charset=Ascii ";

const FIELD_SEPARATOR: char = ',';

/// One of the two fields stored in the comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    PlotId,
    NormalizedDate,
}

impl Field {
    /// The `key=` marker that introduces this field in the comment.
    pub fn marker(self) -> &'static str {
        match self {
            Self::PlotId => "plotid=",
            Self::NormalizedDate => "normalized=",
        }
    }

    /// The field a single-field write has to carry over from the old comment.
    pub fn other(self) -> Self {
        match self {
            Self::PlotId => Self::NormalizedDate,
            Self::NormalizedDate => Self::PlotId,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlotId => f.write_str("plot id"),
            Self::NormalizedDate => f.write_str("normalized date"),
        }
    }
}

/// Both annotation fields of an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentRecord {
    pub plot_id: String,
    pub normalized_date: String,
}

impl CommentRecord {
    /// Build a record from user input, rejecting values the comment cannot hold.
    pub fn new(plot_id: impl Into<String>, normalized_date: impl Into<String>) -> Result<Self> {
        let plot_id = plot_id.into();
        let normalized_date = normalized_date.into();
        validate(Field::PlotId, &plot_id)?;
        validate(Field::NormalizedDate, &normalized_date)?;
        Ok(Self {
            plot_id,
            normalized_date,
        })
    }

    /// Decode both fields from comment text.
    pub fn from_comment(comment: &str) -> Result<Self> {
        Ok(Self {
            plot_id: decode_field(comment, Field::PlotId)?,
            normalized_date: decode_field(comment, Field::NormalizedDate)?,
        })
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::PlotId => &self.plot_id,
            Field::NormalizedDate => &self.normalized_date,
        }
    }

    /// Replace one field, with the same checks as [`CommentRecord::new`].
    pub fn set(&mut self, field: Field, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        validate(field, &value)?;
        match field {
            Field::PlotId => self.plot_id = value,
            Field::NormalizedDate => self.normalized_date = value,
        }
        Ok(())
    }

    pub fn encode(&self) -> String {
        encode(self)
    }
}

/// Check that `value` can be stored as `field` and read back unchanged.
pub fn validate(field: Field, value: &str) -> Result<()> {
    let reason = if value.is_empty() {
        "value is empty"
    } else if value.contains(FIELD_SEPARATOR) {
        "value may not contain a comma"
    } else if [Field::PlotId, Field::NormalizedDate]
        .iter()
        .any(|f| value.contains(f.marker()))
    {
        "value may not contain a field marker"
    } else if value.trim() != value {
        // Padding is trimmed from the tag on read
        "value may not start or end with whitespace"
    } else {
        return Ok(());
    };
    Err(Error::InvalidValue {
        field,
        value: value.to_string(),
        reason,
    })
}

/// Extract one field from the comment text.
///
/// The value starts right after the field marker and ends at the next comma,
/// or at the end of the text when no comma follows.
pub fn decode_field(comment: &str, field: Field) -> Result<String> {
    if comment.is_empty() {
        return Err(Error::not_found(field, "comment is empty"));
    }

    let marker = field.marker();
    let from = comment
        .find(marker)
        .map(|pos| pos + marker.len())
        .ok_or_else(|| Error::not_found(field, format!("no `{marker}` in comment")))?;

    let rest = &comment[from..];
    let value = match rest.find(FIELD_SEPARATOR) {
        Some(to) => &rest[..to],
        None => rest,
    };

    if value.is_empty() {
        return Err(Error::not_found(field, format!("`{marker}` has no value")));
    }

    Ok(value.to_string())
}

/// Serialize a record into comment text.
pub fn encode(record: &CommentRecord) -> String {
    format!(
        "{CHARSET_PREFIX}{}{}{FIELD_SEPARATOR}{}{}",
        Field::NormalizedDate.marker(),
        record.normalized_date,
        Field::PlotId.marker(),
        record.plot_id,
    )
}
