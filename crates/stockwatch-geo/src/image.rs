//! Pixel dimensions of the map image, read from the file header.
//!
//! Supports PNG (IHDR chunk) and PGM (`P5` binary or `P2` ASCII), the formats
//! map exporters produce. Nothing past the header is decoded.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use stockwatch_core::error::{Result, StockwatchError};

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];
const HEADER_LIMIT: u64 = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

/// Read the pixel dimensions of an image file
pub fn read_image_size(path: &Path) -> Result<ImageSize> {
    let mut header = Vec::new();
    File::open(path)?.take(HEADER_LIMIT).read_to_end(&mut header)?;

    image_size_from_header(&header).ok_or_else(|| StockwatchError::MapImage {
        path: path.to_path_buf(),
        reason: "not a PNG or PGM image".to_string(),
    })
}

/// Decode dimensions from the leading bytes of an image
pub fn image_size_from_header(header: &[u8]) -> Option<ImageSize> {
    if header.starts_with(&PNG_SIGNATURE) {
        return png_size(header);
    }
    if header.starts_with(b"P5") || header.starts_with(b"P2") {
        return pgm_size(header);
    }
    None
}

fn png_size(header: &[u8]) -> Option<ImageSize> {
    // signature(8) length(4) "IHDR"(4) width(4) height(4)
    if header.len() < 24 || &header[12..16] != b"IHDR" {
        return None;
    }
    let width = u32::from_be_bytes(header[16..20].try_into().ok()?);
    let height = u32::from_be_bytes(header[20..24].try_into().ok()?);
    non_zero(width, height)
}

fn pgm_size(header: &[u8]) -> Option<ImageSize> {
    let mut tokens = Vec::with_capacity(3);
    let mut pos = 2;

    while tokens.len() < 2 && pos < header.len() {
        let byte = header[pos];
        if byte == b'#' {
            while pos < header.len() && header[pos] != b'\n' {
                pos += 1;
            }
        } else if byte.is_ascii_whitespace() {
            pos += 1;
        } else {
            let start = pos;
            while pos < header.len() && header[pos].is_ascii_digit() {
                pos += 1;
            }
            if start == pos {
                return None;
            }
            let token = std::str::from_utf8(&header[start..pos]).ok()?;
            tokens.push(token.parse::<u32>().ok()?);
        }
    }

    match tokens.as_slice() {
        [width, height] => non_zero(*width, *height),
        _ => None,
    }
}

fn non_zero(width: u32, height: u32) -> Option<ImageSize> {
    (width > 0 && height > 0).then_some(ImageSize { width, height })
}
