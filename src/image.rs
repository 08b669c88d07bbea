//! Program image text format.
//!
//! An image is a whitespace-separated list of decimal integers, one word
//! each, in load order. Line breaks carry no meaning beyond separating
//! fields. Values may be written unsigned (`0..=65535`) or as negative
//! two's-complement (`-32768..=-1`).

use crate::cpu::Word;
use std::path::Path;
use thiserror::Error;

/// Parse image text into words.
pub fn parse_words(text: &str) -> Result<Vec<Word>, ImageError> {
    let mut words = Vec::new();

    for (line_num, line) in text.lines().enumerate() {
        for field in line.split_whitespace() {
            let word = parse_field(field).ok_or_else(|| ImageError::Parse {
                line: line_num + 1,
                field: field.to_string(),
            })?;
            words.push(word);
        }
    }

    Ok(words)
}

fn parse_field(field: &str) -> Option<Word> {
    let value: i32 = field.parse().ok()?;
    match value {
        0..=0xFFFF => Some(value as Word),
        -0x8000..=-1 => Some(value as i16 as Word),
        _ => None,
    }
}

/// Load and parse an image file from disk.
pub fn load_image_file<P: AsRef<Path>>(path: P) -> Result<Vec<Word>, ImageError> {
    let text = std::fs::read_to_string(path.as_ref())
        .map_err(|e| ImageError::Io(e.to_string()))?;
    let words = parse_words(&text)?;
    log::debug!("read {} words from {}", words.len(), path.as_ref().display());
    Ok(words)
}

/// Errors that can occur while reading an image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("parse error on line {line}: {field:?} is not a 16-bit word")]
    Parse { line: usize, field: String },
}
