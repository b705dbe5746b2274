//! Conversion between UserComment text and its on-disk byte layout.
//!
//! EXIF stores UserComment as an 8-byte character code followed by the
//! payload. In text form the code is spelled as a `charset=<Name> ` prefix,
//! e.g. `charset=Ascii normalized=2011-03-01,plotid=42`.

use std::fmt;

const HEADER_LEN: usize = 8;
const PREFIX: &str = "charset=";

/// Character code of a UserComment value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    Ascii,
    Jis,
    Unicode,
    Undefined,
}

impl Charset {
    fn header(self) -> &'static [u8; HEADER_LEN] {
        match self {
            Self::Ascii => b"ASCII\0\0\0",
            Self::Jis => b"JIS\0\0\0\0\0",
            Self::Unicode => b"UNICODE\0",
            Self::Undefined => &[0; HEADER_LEN],
        }
    }

    fn from_header(header: &[u8]) -> Option<Self> {
        [Self::Ascii, Self::Jis, Self::Unicode, Self::Undefined]
            .into_iter()
            .find(|c| c.header().as_slice() == header)
    }

    fn from_name(name: &str) -> Option<Self> {
        match name.trim_matches('"').to_ascii_lowercase().as_str() {
            "ascii" => Some(Self::Ascii),
            "jis" => Some(Self::Jis),
            "unicode" => Some(Self::Unicode),
            "undefined" => Some(Self::Undefined),
            _ => None,
        }
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ascii => "Ascii",
            Self::Jis => "Jis",
            Self::Unicode => "Unicode",
            Self::Undefined => "Undefined",
        };
        f.write_str(name)
    }
}

/// Split a `charset=<Name> ` prefix off the comment text.
///
/// Text without a recognised prefix is returned whole with [`Charset::Undefined`].
fn split_charset(text: &str) -> (Charset, &str) {
    let Some(rest) = text.strip_prefix(PREFIX) else {
        return (Charset::Undefined, text);
    };
    let (name, payload) = rest.split_once(' ').unwrap_or((rest, ""));
    match Charset::from_name(name) {
        Some(charset) => (charset, payload),
        None => (Charset::Undefined, text),
    }
}

/// Encode comment text into raw UserComment bytes (header + payload).
pub fn to_bytes(text: &str) -> Vec<u8> {
    let (charset, payload) = split_charset(text);
    let mut bytes = charset.header().to_vec();
    match charset {
        Charset::Unicode => bytes.extend(payload.encode_utf16().flat_map(|c| c.to_le_bytes())),
        _ => bytes.extend_from_slice(payload.as_bytes()),
    }
    bytes
}

/// Decode raw UserComment bytes into comment text.
///
/// A known header is rendered back as a `charset=<Name> ` prefix (none for
/// an all-zero header). Trailing NUL and whitespace padding is dropped.
pub fn from_bytes(raw: &[u8]) -> String {
    let charset = raw.get(..HEADER_LEN).and_then(Charset::from_header);
    let Some(charset) = charset else {
        return trim_padding(&String::from_utf8_lossy(raw)).to_string();
    };

    let payload = &raw[HEADER_LEN..];
    let text = match charset {
        Charset::Unicode => {
            let units: Vec<u16> = payload
                .chunks_exact(2)
                .map(|c| u16::from_le_bytes([c[0], c[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        _ => String::from_utf8_lossy(payload).into_owned(),
    };
    let text = trim_padding(&text);

    match charset {
        Charset::Undefined => text.to_string(),
        _ => format!("{PREFIX}{charset} {text}"),
    }
}

fn trim_padding(s: &str) -> &str {
    s.trim_end_matches(|c: char| c == '\0' || c.is_whitespace())
}
