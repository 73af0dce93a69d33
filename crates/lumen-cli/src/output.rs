//! Writing rendered images to disk.

use std::path::Path;

use anyhow::{bail, Context, Result};
use lumen_render::{pam, Image};

/// File formats `lumen render` can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// RGBA Portable Arbitrary Map.
    Pam,
    /// PNG through the `image` crate.
    Png,
}

impl OutputFormat {
    /// Pick a format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext.to_lowercase().as_str() {
            "pam" => Ok(Self::Pam),
            "png" => Ok(Self::Png),
            _ => bail!("Unknown output format: {:?} (use .pam or .png)", ext),
        }
    }
}

/// Write `frame` to `path` in the format its extension names.
pub fn save(frame: &Image, path: &Path) -> Result<()> {
    match OutputFormat::from_path(path)? {
        OutputFormat::Pam => pam::save(path, frame)
            .with_context(|| format!("writing {}", path.display()))?,
        OutputFormat::Png => {
            let buffer =
                image::RgbaImage::from_raw(frame.width(), frame.height(), frame.as_bytes().to_vec())
                    .context("pixel buffer does not match image dimensions")?;
            buffer
                .save(path)
                .with_context(|| format!("writing {}", path.display()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_math::Rgba8;

    fn gradient() -> Image {
        let pixels: Vec<Rgba8> = (0..12u8).map(|i| Rgba8::new(i * 20, 255 - i, 0, 255)).collect();
        Image::from_pixels(4, 3, &pixels).unwrap()
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(OutputFormat::from_path(Path::new("a.pam")).unwrap(), OutputFormat::Pam);
        assert_eq!(OutputFormat::from_path(Path::new("a.PNG")).unwrap(), OutputFormat::Png);
        assert!(OutputFormat::from_path(Path::new("a.bmp")).is_err());
        assert!(OutputFormat::from_path(Path::new("noext")).is_err());
    }

    #[test]
    fn test_save_pam_and_png() {
        let dir = std::env::temp_dir().join(format!("lumen-cli-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let frame = gradient();

        let pam_path = dir.join("out.pam");
        save(&frame, &pam_path).unwrap();
        assert_eq!(pam::load(&pam_path).unwrap().pixels(), frame.pixels());

        let png_path = dir.join("out.png");
        save(&frame, &png_path).unwrap();
        let decoded = image::open(&png_path).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (4, 3));
        assert_eq!(decoded.as_raw().as_slice(), frame.as_bytes());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
