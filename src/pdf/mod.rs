//! # PDF Container Writer
//!
//! Wraps one [`EncodedImage`] in a minimal single-page PDF 1.4 file. The
//! image fills the page edge to edge: the page width is chosen by the caller
//! and the height follows the image's aspect ratio.
//!
//! ## Layout
//!
//! ```text
//! %PDF-1.4            <- header + binary comment
//! 1 0 obj Catalog     -> /Pages 2 0 R
//! 2 0 obj Pages       -> /Kids [3 0 R] /Count 1
//! 3 0 obj Page        -> /MediaBox, /Resources << /XObject << /Im0 4 0 R >> >>, /Contents 5 0 R
//! 4 0 obj Image       -> JPEG bytes verbatim under /DCTDecode
//! 5 0 obj Content     -> q / W 0 0 H 0 0 cm / /Im0 Do / Q
//! xref                <- 6 fixed-width 20-byte entries
//! trailer             <- /Size 6 /Root 1 0 R, startxref, %%EOF
//! ```
//!
//! Everything is written in a single forward pass. Each object's offset is
//! the output length at the moment its `N 0 obj` line starts, and the
//! `startxref` value is the output length when `xref` starts. Nothing is
//! patched afterwards.

use std::io::Write as IoWrite;

use tracing::debug;

use crate::encode::EncodedImage;
use crate::error::{ExportError, Result};
use crate::style::format_fixed;

/// MIME type of the produced bytes.
pub const MIME_TYPE: &str = "application/pdf";

/// File extension for the produced bytes.
pub const FILE_EXTENSION: &str = "pdf";

/// Number of indirect objects in every document (excluding the free entry 0).
pub const OBJECT_COUNT: usize = 5;

const CATALOG_ID: usize = 1;
const PAGES_ID: usize = 2;
const PAGE_ID: usize = 3;
const IMAGE_ID: usize = 4;
const CONTENT_ID: usize = 5;

/// Name of the image in the page's resource dictionary.
const IMAGE_NAME: &str = "Im0";

pub struct PdfWriter;

/// Output buffer plus the offset bookkeeping for the cross-reference table.
struct ObjectWriter {
    output: Vec<u8>,
    offsets: Vec<usize>,
}

impl ObjectWriter {
    fn new(capacity: usize) -> Self {
        Self {
            output: Vec::with_capacity(capacity),
            offsets: Vec::with_capacity(OBJECT_COUNT),
        }
    }

    /// Record where object `id` starts and write its header line.
    /// Objects must be opened in order 1, 2, 3, ...
    fn begin(&mut self, id: usize) {
        debug_assert_eq!(id, self.offsets.len() + 1, "objects must be emitted in order");
        self.offsets.push(self.output.len());
        let _ = write!(self.output, "{} 0 obj\n", id);
    }

    fn end(&mut self) {
        self.output.extend_from_slice(b"\nendobj\n");
    }

    fn dictionary_object(&mut self, id: usize, dict: &str) {
        self.begin(id);
        self.output.extend_from_slice(dict.as_bytes());
        self.end();
    }

    /// A stream object whose `/Length` is taken from `data` itself.
    fn stream_object(&mut self, id: usize, dict_entries: &str, data: &[u8]) {
        self.begin(id);
        if dict_entries.is_empty() {
            let _ = write!(self.output, "<< /Length {} >>\nstream\n", data.len());
        } else {
            let _ = write!(
                self.output,
                "<< {} /Length {} >>\nstream\n",
                dict_entries,
                data.len()
            );
        }
        self.output.extend_from_slice(data);
        self.output.extend_from_slice(b"\nendstream");
        self.end();
    }

    /// Write the xref table and trailer, consuming the writer.
    fn finish(mut self) -> Vec<u8> {
        let xref_offset = self.output.len();
        let _ = write!(self.output, "xref\n0 {}\n", self.offsets.len() + 1);
        self.output.extend_from_slice(b"0000000000 65535 f \n");
        for offset in &self.offsets {
            let _ = write!(self.output, "{:010} 00000 n \n", offset);
        }
        let _ = write!(
            self.output,
            "trailer\n<< /Size {} /Root {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            self.offsets.len() + 1,
            CATALOG_ID,
            xref_offset
        );
        self.output
    }
}

impl PdfWriter {
    pub fn new() -> Self {
        Self
    }

    /// Page height in points for an image drawn `page_width_pt` wide.
    pub fn page_height(image: &EncodedImage, page_width_pt: f64) -> f64 {
        page_width_pt * image.height as f64 / image.width as f64
    }

    /// Serialize `image` as a one-page PDF `page_width_pt` points wide.
    ///
    /// All validation happens before the first byte is produced; once it
    /// passes, writing cannot fail.
    pub fn write(&self, image: &EncodedImage, page_width_pt: f64) -> Result<Vec<u8>> {
        validate(image, page_width_pt)?;

        let page_width = fmt_real(page_width_pt);
        let page_height = fmt_real(Self::page_height(image, page_width_pt));

        let mut w = ObjectWriter::new(image.data.len() + 1024);

        // Header. The comment line with high-bit bytes marks the file as binary.
        w.output.extend_from_slice(b"%PDF-1.4\n");
        w.output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

        w.dictionary_object(
            CATALOG_ID,
            &format!("<< /Type /Catalog /Pages {} 0 R >>", PAGES_ID),
        );
        w.dictionary_object(
            PAGES_ID,
            &format!("<< /Type /Pages /Kids [{} 0 R] /Count 1 >>", PAGE_ID),
        );
        w.dictionary_object(
            PAGE_ID,
            &format!(
                "<< /Type /Page /Parent {} 0 R /MediaBox [0 0 {} {}] \
                 /Resources << /XObject << /{} {} 0 R >> >> /Contents {} 0 R >>",
                PAGES_ID, page_width, page_height, IMAGE_NAME, IMAGE_ID, CONTENT_ID
            ),
        );
        w.stream_object(
            IMAGE_ID,
            &format!(
                "/Type /XObject /Subtype /Image /Width {} /Height {} \
                 /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /DCTDecode",
                image.width, image.height
            ),
            &image.data,
        );
        let content = content_stream(&page_width, &page_height);
        w.stream_object(CONTENT_ID, "", content.as_bytes());

        let bytes = w.finish();
        debug!(
            bytes = bytes.len(),
            image_bytes = image.data.len(),
            page_width = %page_width,
            page_height = %page_height,
            "wrote PDF"
        );
        Ok(bytes)
    }
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn validate(image: &EncodedImage, page_width_pt: f64) -> Result<()> {
    if image.data.is_empty() {
        return Err(ExportError::invalid_input("image data is empty"));
    }
    if image.width == 0 || image.height == 0 {
        return Err(ExportError::invalid_input(format!(
            "image dimensions must be positive, got {}x{}",
            image.width, image.height
        )));
    }
    if !page_width_pt.is_finite() || page_width_pt <= 0.0 {
        return Err(ExportError::invalid_input(format!(
            "page width must be a positive number of points, got {}",
            page_width_pt
        )));
    }
    Ok(())
}

/// Save state, scale the unit square to the page, paint the image, restore.
fn content_stream(page_width: &str, page_height: &str) -> String {
    format!(
        "q\n{} 0 0 {} 0 0 cm\n/{} Do\nQ\n",
        page_width, page_height, IMAGE_NAME
    )
}

/// Format a PDF real number: fixed notation, four decimals, no trailing
/// zeros. Positive page dimensions never print as `0`.
fn fmt_real(v: f64) -> String {
    format_fixed(v, 4)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(width: u32, height: u32) -> EncodedImage {
        EncodedImage {
            data: vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0xFF, 0xD9],
            width,
            height,
        }
    }

    fn text(bytes: &[u8]) -> String {
        String::from_utf8_lossy(bytes).into_owned()
    }

    #[test]
    fn test_fmt_real() {
        assert_eq!(fmt_real(595.28), "595.28");
        assert_eq!(fmt_real(297.64), "297.64");
        assert_eq!(fmt_real(1.0), "1");
        assert_eq!(fmt_real(1.0 / 3.0), "0.3333");
        assert_eq!(fmt_real(1e-7), "0.0000001");
        assert_eq!(fmt_real(0.0), "0");
    }

    #[test]
    fn test_thin_image_keeps_nonzero_page() {
        let bytes = PdfWriter::new().write(&image(65535, 1), 1.0).unwrap();
        let pdf = text(&bytes);
        assert!(pdf.contains("/MediaBox [0 0 1 0.00001526]"));
        assert!(pdf.contains("q\n1 0 0 0.00001526 0 0 cm\n"));

        let bytes = PdfWriter::new().write(&image(2, 2), 0.00004).unwrap();
        let pdf = text(&bytes);
        assert!(pdf.contains("/MediaBox [0 0 0.00004 0.00004]"));
        assert!(!pdf.contains("/MediaBox [0 0 0 "));
    }

    #[test]
    fn test_page_height_follows_aspect_ratio() {
        let h = PdfWriter::page_height(&image(400, 200), 595.28);
        assert!((h - 297.64).abs() < 1e-9);
    }

    #[test]
    fn test_header_and_eof() {
        let bytes = PdfWriter::new().write(&image(2, 2), 100.0).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.4\n"));
        assert!(bytes.ends_with(b"%%EOF\n"));
    }

    #[test]
    fn test_content_stream_length_matches() {
        let content = content_stream("595.28", "297.64");
        assert_eq!(content, "q\n595.28 0 0 297.64 0 0 cm\n/Im0 Do\nQ\n");
        let bytes = PdfWriter::new().write(&image(400, 200), 595.28).unwrap();
        let pdf = text(&bytes);
        assert!(pdf.contains(&format!("<< /Length {} >>\nstream\n{}", content.len(), content)));
    }

    #[test]
    fn test_xref_entries_are_twenty_bytes() {
        let bytes = PdfWriter::new().write(&image(3, 1), 10.0).unwrap();
        let pdf = text(&bytes);
        let xref_start = pdf.find("xref\n0 6\n").unwrap() + "xref\n0 6\n".len();
        let table = &pdf[xref_start..xref_start + 6 * 20];
        assert!(table.starts_with("0000000000 65535 f \n"));
        for line in table.as_bytes().chunks(20) {
            assert_eq!(line.len(), 20);
            assert_eq!(line[19], b'\n');
        }
        assert!(pdf[xref_start + 120..].starts_with("trailer\n"));
    }

    #[test]
    fn test_rejects_empty_image() {
        let empty = EncodedImage {
            data: vec![],
            width: 1,
            height: 1,
        };
        assert!(matches!(
            PdfWriter::new().write(&empty, 100.0),
            Err(ExportError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_rejects_bad_page_width() {
        for width in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                PdfWriter::new().write(&image(1, 1), width),
                Err(ExportError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn test_rejects_zero_dimensions() {
        assert!(PdfWriter::new().write(&image(0, 1), 100.0).is_err());
        assert!(PdfWriter::new().write(&image(1, 0), 100.0).is_err());
    }
}
