//! Output container formats accepted by the service.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use image::ImageFormat;

use crate::error::Error;

/// Encoded container for generated images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
    Webp,
    Avif,
}

impl OutputFormat {
    /// Every supported format, in the order they are advertised to clients.
    pub const ALL: [Self; 4] = [Self::Jpeg, Self::Png, Self::Webp, Self::Avif];

    /// Upper-case name as accepted in the `output_format` form field.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Jpeg => "JPEG",
            Self::Png => "PNG",
            Self::Webp => "WEBP",
            Self::Avif => "AVIF",
        }
    }

    /// File extension used for persisted copies.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Webp => "webp",
            Self::Avif => "avif",
        }
    }

    /// MIME type sent back as `Content-Type`.
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
            Self::Avif => "image/avif",
        }
    }

    /// Pick the format from a file extension (`.jpg` is accepted as JPEG).
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] for a missing or unknown extension.
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match ext.as_str() {
            "jpg" => Ok(Self::Jpeg),
            _ => Self::ALL
                .into_iter()
                .find(|format| format.extension() == ext)
                .ok_or_else(|| Error::UnsupportedFormat(ext)),
        }
    }

    /// Whether decoded pixels keep an alpha channel. Only PNG does.
    #[must_use]
    pub const fn has_alpha(self) -> bool {
        matches!(self, Self::Png)
    }

    pub(crate) const fn image_format(self) -> ImageFormat {
        match self {
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Png => ImageFormat::Png,
            Self::Webp => ImageFormat::WebP,
            Self::Avif => ImageFormat::Avif,
        }
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|format| format.name() == upper)
            .ok_or_else(|| Error::UnsupportedFormat(s.to_string()))
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("png".parse::<OutputFormat>().unwrap(), OutputFormat::Png);
        assert_eq!("Webp".parse::<OutputFormat>().unwrap(), OutputFormat::Webp);
        assert_eq!("AVIF".parse::<OutputFormat>().unwrap(), OutputFormat::Avif);
        assert_eq!("jpeg".parse::<OutputFormat>().unwrap(), OutputFormat::Jpeg);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!(matches!(
            "BMP".parse::<OutputFormat>(),
            Err(Error::UnsupportedFormat(name)) if name == "BMP"
        ));
        // Only the canonical spelling is accepted.
        assert!("JPG".parse::<OutputFormat>().is_err());
        assert!(" png ".parse::<OutputFormat>().is_err());
        assert!("PNG\n".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_from_path() {
        assert_eq!(OutputFormat::from_path(Path::new("a/out.PNG")).unwrap(), OutputFormat::Png);
        assert_eq!(OutputFormat::from_path(Path::new("out.jpg")).unwrap(), OutputFormat::Jpeg);
        assert_eq!(OutputFormat::from_path(Path::new("out.avif")).unwrap(), OutputFormat::Avif);
        assert!(OutputFormat::from_path(Path::new("out.bmp")).is_err());
        assert!(OutputFormat::from_path(Path::new("out")).is_err());
    }

    #[test]
    fn test_default_is_jpeg() {
        assert_eq!(OutputFormat::default(), OutputFormat::Jpeg);
        assert_eq!(OutputFormat::default().mime_type(), "image/jpeg");
    }

    #[test]
    fn test_alpha_only_for_png() {
        for format in OutputFormat::ALL {
            assert_eq!(format.has_alpha(), format == OutputFormat::Png);
            assert_eq!(format.mime_type(), format!("image/{}", format.extension()));
        }
    }
}
