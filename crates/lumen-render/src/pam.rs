//! Portable Arbitrary Map (PAM) reading and writing.
//!
//! Only the RGBA form is supported: `DEPTH 4`, `MAXVAL 255`,
//! `TUPLTYPE RGB_ALPHA`. The header is ASCII, one field per line,
//! terminated by `ENDHDR`; raw pixel bytes follow, row-major, unpadded.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use lumen_math::Rgba8;

use crate::error::ImageError;
use crate::Image;

/// Parsed PAM header fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PamHeader {
    /// Image width.
    pub width: u32,
    /// Image height.
    pub height: u32,
    /// Channels per pixel.
    pub depth: u32,
    /// Largest channel value.
    pub maxval: u32,
    /// Declared tuple type, if any.
    pub tupltype: Option<String>,
}

impl PamHeader {
    /// Size of the pixel payload in bytes, or `None` if it does not fit in `usize`.
    pub fn payload_len(&self) -> Option<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)?
            .checked_mul(self.depth as usize)
    }
}

/// Write `image` as RGBA PAM.
pub fn write<W: Write>(mut out: W, image: &Image) -> Result<(), ImageError> {
    write!(
        out,
        "P7\nWIDTH {}\nHEIGHT {}\nDEPTH 4\nMAXVAL 255\nTUPLTYPE RGB_ALPHA\nENDHDR\n",
        image.width(),
        image.height()
    )?;
    out.write_all(image.as_bytes())?;
    out.flush()?;
    Ok(())
}

fn invalid(msg: impl Into<String>) -> ImageError {
    ImageError::InvalidHeader(msg.into())
}

fn parse_field(key: &str, value: Option<&str>) -> Result<u32, ImageError> {
    value
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| invalid(format!("{key} needs a non-negative integer")))
}

/// Read a PAM header, leaving `input` positioned at the first pixel byte.
///
/// Blank lines and `#` comments are skipped. Any depth and maxval are
/// accepted here; [`read`] narrows them to RGBA.
pub fn read_header<R: BufRead>(mut input: R) -> Result<PamHeader, ImageError> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    if line.trim_end() != "P7" {
        return Err(invalid("missing P7 magic"));
    }

    let (mut width, mut height, mut depth, mut maxval) = (None, None, None, None);
    let mut tupltype: Option<String> = None;
    loop {
        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Err(invalid("missing ENDHDR"));
        }
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let mut tokens = trimmed.split_whitespace();
        let Some(key) = tokens.next() else { continue };
        match key {
            "ENDHDR" => break,
            "WIDTH" => width = Some(parse_field(key, tokens.next())?),
            "HEIGHT" => height = Some(parse_field(key, tokens.next())?),
            "DEPTH" => depth = Some(parse_field(key, tokens.next())?),
            "MAXVAL" => maxval = Some(parse_field(key, tokens.next())?),
            "TUPLTYPE" => {
                let value = tokens.collect::<Vec<_>>().join(" ");
                tupltype = Some(match tupltype {
                    Some(prev) => format!("{prev} {value}"),
                    None => value,
                });
            }
            other => return Err(invalid(format!("unknown header field {other}"))),
        }
    }

    Ok(PamHeader {
        width: width.ok_or_else(|| invalid("missing WIDTH"))?,
        height: height.ok_or_else(|| invalid("missing HEIGHT"))?,
        depth: depth.ok_or_else(|| invalid("missing DEPTH"))?,
        maxval: maxval.ok_or_else(|| invalid("missing MAXVAL"))?,
        tupltype,
    })
}

/// Read an RGBA PAM image.
pub fn read<R: BufRead>(mut input: R) -> Result<Image, ImageError> {
    let header = read_header(&mut input)?;
    if header.depth != 4 {
        return Err(invalid(format!("DEPTH {} is not RGBA", header.depth)));
    }
    if header.maxval != 255 {
        return Err(invalid(format!("MAXVAL {} is not 8-bit", header.maxval)));
    }
    if let Some(t) = header.tupltype.as_deref().filter(|t| *t != "RGB_ALPHA") {
        return Err(invalid(format!("TUPLTYPE {t} is not RGB_ALPHA")));
    }

    let expected = header.payload_len().ok_or_else(|| {
        invalid(format!(
            "{}x{} pixels of depth {} overflow the address space",
            header.width, header.height, header.depth
        ))
    })?;
    // Grows with the data actually present, not with the declared size.
    let mut bytes = Vec::new();
    (&mut input).take(expected as u64).read_to_end(&mut bytes)?;
    if bytes.len() < expected {
        return Err(ImageError::Truncated { expected });
    }
    let pixels: &[Rgba8] = bytemuck::cast_slice(&bytes);
    Image::from_pixels(header.width, header.height, pixels)
}

/// Write `image` to a PAM file at `path`.
pub fn save(path: impl AsRef<Path>, image: &Image) -> Result<(), ImageError> {
    write(BufWriter::new(File::create(path)?), image)
}

/// Read a PAM file from `path`.
pub fn load(path: impl AsRef<Path>) -> Result<Image, ImageError> {
    read(BufReader::new(File::open(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker() -> Image {
        let mut img = Image::new(3, 2).unwrap();
        for y in 0..2 {
            for x in 0..3 {
                img.set(x, y, Rgba8::new(x as u8 * 80, y as u8 * 200, 7, 255 - x as u8));
            }
        }
        img
    }

    #[test]
    fn test_header_bytes() {
        let mut out = Vec::new();
        write(&mut out, &checker()).unwrap();
        let header = b"P7\nWIDTH 3\nHEIGHT 2\nDEPTH 4\nMAXVAL 255\nTUPLTYPE RGB_ALPHA\nENDHDR\n";
        assert_eq!(&out[..header.len()], header);
        assert_eq!(out.len(), header.len() + 3 * 2 * 4);
        assert_eq!(&out[header.len()..header.len() + 8], &[0, 0, 7, 255, 80, 0, 7, 254]);
    }

    #[test]
    fn test_write_read_preserves_pixels() {
        let img = checker();
        let mut out = Vec::new();
        write(&mut out, &img).unwrap();
        let back = read(out.as_slice()).unwrap();
        assert_eq!((back.width(), back.height()), (3, 2));
        assert_eq!(back.pixels(), img.pixels());
    }

    #[test]
    fn test_comments_tolerated() {
        let mut data =
            b"P7\n# made by hand\nWIDTH 1\nHEIGHT 1\n\nDEPTH 4\nMAXVAL 255\nENDHDR\n".to_vec();
        data.extend_from_slice(&[9, 8, 7, 6]);
        let img = read(data.as_slice()).unwrap();
        assert_eq!(img.get(0, 0), Some(Rgba8::new(9, 8, 7, 6)));
    }

    #[test]
    fn test_rejects_unsupported() {
        let rgb = b"P7\nWIDTH 1\nHEIGHT 1\nDEPTH 3\nMAXVAL 255\nTUPLTYPE RGB\nENDHDR\n\0\0\0";
        assert!(matches!(read(&rgb[..]), Err(ImageError::InvalidHeader(_))));
        assert!(matches!(read(&b"P6\n1 1\n255\n"[..]), Err(ImageError::InvalidHeader(_))));
        let no_end = b"P7\nWIDTH 1\nHEIGHT 1\n";
        assert!(matches!(read(&no_end[..]), Err(ImageError::InvalidHeader(_))));
    }

    #[test]
    fn test_truncated_payload() {
        let data = b"P7\nWIDTH 2\nHEIGHT 1\nDEPTH 4\nMAXVAL 255\nENDHDR\n\x01\x02\x03";
        assert!(matches!(
            read(&data[..]),
            Err(ImageError::Truncated { expected: 8 })
        ));
    }

    #[test]
    fn test_header_only() {
        let mut out = Vec::new();
        write(&mut out, &checker()).unwrap();
        let header = read_header(out.as_slice()).unwrap();
        assert_eq!(header.payload_len(), Some(24));
        assert_eq!(header.tupltype.as_deref(), Some("RGB_ALPHA"));
    }

    #[test]
    fn test_oversized_dimensions_rejected() {
        let data = b"P7\nWIDTH 4294967295\nHEIGHT 4294967295\nDEPTH 4\nMAXVAL 255\nENDHDR\n";
        let header = read_header(&data[..]).unwrap();
        assert_eq!(header.payload_len(), None);
        assert!(matches!(read(&data[..]), Err(ImageError::InvalidHeader(_))));
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_large_declared_payload_without_data() {
        let data = b"P7\nWIDTH 65535\nHEIGHT 65535\nDEPTH 4\nMAXVAL 255\nENDHDR\n\x01\x02";
        assert!(matches!(
            read(&data[..]),
            Err(ImageError::Truncated { expected }) if expected == 65535 * 65535 * 4
        ));
    }
}
