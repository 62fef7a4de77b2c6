use std::fmt;

/// Container formats recognised by their leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    WebP,
    Ico,
    Tiff,
}

/// Checked in order; the first prefix that matches wins.
const MAGIC_TABLE: &[(&[u8], ImageFormat)] = &[
    (&[0xFF, 0xD8, 0xFF], ImageFormat::Jpeg),
    (&[0x89, 0x50, 0x4E, 0x47], ImageFormat::Png),
    (&[0x47, 0x49, 0x46], ImageFormat::Gif),
    (&[0x52, 0x49, 0x46, 0x46], ImageFormat::WebP),
    (&[0x00, 0x00, 0x01, 0x00], ImageFormat::Ico),
];

impl ImageFormat {
    /// Anything unmatched is reported as TIFF: a captured image always has at least
    /// the platform bitmap encoding behind it.
    pub fn sniff(bytes: &[u8]) -> Self {
        MAGIC_TABLE
            .iter()
            .find(|(magic, _)| bytes.starts_with(magic))
            .map(|(_, format)| *format)
            .unwrap_or(ImageFormat::Tiff)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "JPEG",
            ImageFormat::Png => "PNG",
            ImageFormat::Gif => "GIF",
            ImageFormat::WebP => "WebP",
            ImageFormat::Ico => "ICO",
            ImageFormat::Tiff => "TIFF",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Png => "png",
            ImageFormat::Gif => "gif",
            ImageFormat::WebP => "webp",
            ImageFormat::Ico => "ico",
            ImageFormat::Tiff => "tiff",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::Gif => "image/gif",
            ImageFormat::WebP => "image/webp",
            ImageFormat::Ico => "image/x-icon",
            ImageFormat::Tiff => "image/tiff",
        }
    }

    /// Synthetic `content` label stored for image entries, e.g. `Image.png`.
    pub fn content_label(&self) -> String {
        format!("Image.{}", self.extension())
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_the_magic_table() {
        assert_eq!(ImageFormat::sniff(&[0xFF, 0xD8, 0xFF, 0xE0]), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::sniff(b"\x89PNG\r\n\x1a\n"), ImageFormat::Png);
        assert_eq!(ImageFormat::sniff(b"GIF89a"), ImageFormat::Gif);
        assert_eq!(ImageFormat::sniff(b"RIFF\0\0\0\0WEBP"), ImageFormat::WebP);
        assert_eq!(ImageFormat::sniff(&[0, 0, 1, 0, 1]), ImageFormat::Ico);
    }

    #[test]
    fn unmatched_bytes_fall_back_to_tiff() {
        assert_eq!(ImageFormat::sniff(b"II*\0"), ImageFormat::Tiff);
        assert_eq!(ImageFormat::sniff(&[]), ImageFormat::Tiff);
        assert_eq!(ImageFormat::sniff(&[0xFF, 0xD8]), ImageFormat::Tiff);
    }

    #[test]
    fn label_embeds_extension() {
        assert_eq!(ImageFormat::Png.content_label(), "Image.png");
        assert_eq!(ImageFormat::Jpeg.content_label(), "Image.jpg");
    }
}
