//! Minimal PDF 1.4 writer for laid-out pages.
//!
//! Output uses the Helvetica base-14 fonts (no embedding) and an optional
//! JPEG logo passed through with DCTDecode, so no image decoding happens here.

use std::fmt::Write as _;

use thiserror::Error;

use crate::errors::AppError;
use crate::generator::font_metrics::FontFace;
use crate::generator::layout::{DrawOp, Page, PAGE_HEIGHT, PAGE_WIDTH};

pub const MAX_LOGO_WIDTH: f32 = 120.0;
pub const MAX_LOGO_HEIGHT: f32 = 60.0;

#[derive(Debug, Error, PartialEq)]
pub enum PdfError {
    #[error("Logo must be a JPEG image")]
    NotJpeg,

    #[error("Logo JPEG has no frame header")]
    MissingFrameHeader,

    #[error("Logo JPEG has unsupported component count {0}")]
    UnsupportedComponents(u8),
}

impl From<PdfError> for AppError {
    fn from(e: PdfError) -> Self {
        AppError::Validation(e.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegInfo {
    pub width: u16,
    pub height: u16,
    pub components: u8,
}

/// Reads dimensions from the first SOF marker.
pub fn jpeg_info(bytes: &[u8]) -> Result<JpegInfo, PdfError> {
    if bytes.len() < 4 || bytes[0] != 0xFF || bytes[1] != 0xD8 {
        return Err(PdfError::NotJpeg);
    }

    let mut pos = 2;
    while pos + 1 < bytes.len() {
        if bytes[pos] != 0xFF {
            pos += 1;
            continue;
        }
        let marker = bytes[pos + 1];
        match marker {
            // Fill byte, TEM, RSTn: no length field.
            0xFF => {
                pos += 1;
                continue;
            }
            0x01 | 0xD0..=0xD7 => {
                pos += 2;
                continue;
            }
            // Start of scan or end of image before any frame header.
            0xDA | 0xD9 => return Err(PdfError::MissingFrameHeader),
            _ => {}
        }

        let Some(length) = read_u16(bytes, pos + 2) else {
            break;
        };
        let is_sof = matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_sof {
            let (Some(height), Some(width), Some(&components)) = (
                read_u16(bytes, pos + 5),
                read_u16(bytes, pos + 7),
                bytes.get(pos + 9),
            ) else {
                break;
            };
            if !matches!(components, 1 | 3 | 4) {
                return Err(PdfError::UnsupportedComponents(components));
            }
            return Ok(JpegInfo {
                width,
                height,
                components,
            });
        }
        pos += 2 + length as usize;
    }

    Err(PdfError::MissingFrameHeader)
}

fn read_u16(bytes: &[u8], at: usize) -> Option<u16> {
    Some(u16::from_be_bytes([*bytes.get(at)?, *bytes.get(at + 1)?]))
}

/// Scales `(width, height)` down to fit the logo box, keeping the aspect ratio.
/// Never scales up.
pub fn fit_logo(width: f32, height: f32) -> (f32, f32) {
    if width <= 0.0 || height <= 0.0 {
        return (0.0, 0.0);
    }
    let factor = (MAX_LOGO_WIDTH / width)
        .min(MAX_LOGO_HEIGHT / height)
        .min(1.0);
    (width * factor, height * factor)
}

pub struct Logo<'a> {
    pub jpeg: &'a [u8],
    pub info: JpegInfo,
}

/// Serialises `pages` to a complete PDF file.
pub fn render_pdf(title: &str, pages: &[Page], logo: Option<&Logo<'_>>) -> Vec<u8> {
    let mut writer = PdfWriter::default();

    let font_ids = [FontFace::Helvetica, FontFace::HelveticaBold].map(|face| (face, writer.reserve()));
    let catalog_id = writer.reserve();
    let pages_id = writer.reserve();
    let info_id = writer.reserve();
    let logo_id = logo.map(|_| writer.reserve());

    for (face, id) in font_ids {
        writer.set(
            id,
            format!(
                "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                face.base_font()
            )
            .into_bytes(),
        );
    }

    if let (Some(logo), Some(id)) = (logo, logo_id) {
        let color_space = match logo.info.components {
            1 => "/DeviceGray",
            4 => "/DeviceCMYK",
            _ => "/DeviceRGB",
        };
        let mut object = format!(
            "<< /Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace {color_space} \
             /BitsPerComponent 8 /Filter /DCTDecode /Length {} >>\nstream\n",
            logo.info.width,
            logo.info.height,
            logo.jpeg.len()
        )
        .into_bytes();
        object.extend_from_slice(logo.jpeg);
        object.extend_from_slice(b"\nendstream");
        writer.set(id, object);
    }

    let font_resources: String = font_ids
        .iter()
        .map(|(face, id)| format!("/{} {id} 0 R", face.resource_name()))
        .collect::<Vec<_>>()
        .join(" ");
    let xobject_resources = logo_id
        .map(|id| format!(" /XObject << /Im1 {id} 0 R >>"))
        .unwrap_or_default();

    let mut page_ids = Vec::with_capacity(pages.len());
    for page in pages {
        let stream = content_stream(page);
        let content_id = writer.add(stream_object(&stream));
        let page_id = writer.add(
            format!(
                "<< /Type /Page /Parent {pages_id} 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
                 /Resources << /Font << {font_resources} >>{xobject_resources} >> \
                 /Contents {content_id} 0 R >>"
            )
            .into_bytes(),
        );
        page_ids.push(page_id);
    }

    let kids: String = page_ids
        .iter()
        .map(|id| format!("{id} 0 R"))
        .collect::<Vec<_>>()
        .join(" ");
    writer.set(
        pages_id,
        format!("<< /Type /Pages /Kids [{kids}] /Count {} >>", page_ids.len()).into_bytes(),
    );
    writer.set(
        catalog_id,
        format!("<< /Type /Catalog /Pages {pages_id} 0 R >>").into_bytes(),
    );
    let mut info = b"<< /Title ".to_vec();
    info.extend_from_slice(&pdf_string(title));
    info.extend_from_slice(b" /Producer (lexdesk) >>");
    writer.set(info_id, info);

    writer.finish(catalog_id, info_id)
}

fn content_stream(page: &Page) -> Vec<u8> {
    let mut out = Vec::new();
    for op in &page.ops {
        match op {
            DrawOp::Text {
                x,
                y,
                size,
                face,
                text,
            } => {
                out.extend_from_slice(
                    format!(
                        "BT /{} {size:.1} Tf {x:.2} {y:.2} Td ",
                        face.resource_name()
                    )
                    .as_bytes(),
                );
                out.extend_from_slice(&pdf_string(text));
                out.extend_from_slice(b" Tj ET\n");
            }
            DrawOp::Rule { x1, x2, y } => {
                out.extend_from_slice(
                    format!("0.75 w {x1:.2} {y:.2} m {x2:.2} {y:.2} l S\n").as_bytes(),
                );
            }
            DrawOp::Logo {
                x,
                y,
                width,
                height,
            } => {
                out.extend_from_slice(
                    format!("q {width:.2} 0 0 {height:.2} {x:.2} {y:.2} cm /Im1 Do Q\n").as_bytes(),
                );
            }
        }
    }
    out
}

fn stream_object(stream: &[u8]) -> Vec<u8> {
    let mut object = format!("<< /Length {} >>\nstream\n", stream.len()).into_bytes();
    object.extend_from_slice(stream);
    object.extend_from_slice(b"\nendstream");
    object
}

/// Literal string in WinAnsiEncoding. Unmappable characters become `?`.
fn pdf_string(text: &str) -> Vec<u8> {
    let mut out = vec![b'('];
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push(b'\\');
                out.push(c as u8);
            }
            ' '..='~' => out.push(c as u8),
            _ => match win_ansi_byte(c) {
                Some(byte) => out.extend_from_slice(format!("\\{byte:03o}").as_bytes()),
                None => out.push(b'?'),
            },
        }
    }
    out.push(b')');
    out
}

fn win_ansi_byte(c: char) -> Option<u8> {
    match c {
        '\u{A0}'..='\u{FF}' => Some(c as u32 as u8),
        '€' => Some(0x80),
        '‚' => Some(0x82),
        '„' => Some(0x84),
        '…' => Some(0x85),
        '‘' => Some(0x91),
        '’' => Some(0x92),
        '“' => Some(0x93),
        '”' => Some(0x94),
        '•' => Some(0x95),
        '–' => Some(0x96),
        '—' => Some(0x97),
        '™' => Some(0x99),
        _ => None,
    }
}

/// Collects numbered objects, then writes them with a cross-reference table.
#[derive(Default)]
struct PdfWriter {
    objects: Vec<Vec<u8>>,
}

impl PdfWriter {
    /// Allocates an object number to be filled in later with `set`.
    fn reserve(&mut self) -> usize {
        self.objects.push(Vec::new());
        self.objects.len()
    }

    fn set(&mut self, id: usize, body: Vec<u8>) {
        self.objects[id - 1] = body;
    }

    fn add(&mut self, body: Vec<u8>) -> usize {
        self.objects.push(body);
        self.objects.len()
    }

    fn finish(self, root_id: usize, info_id: usize) -> Vec<u8> {
        let mut out = b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n".to_vec();
        let mut offsets = Vec::with_capacity(self.objects.len());

        for (i, body) in self.objects.iter().enumerate() {
            offsets.push(out.len());
            out.extend_from_slice(format!("{} 0 obj\n", i + 1).as_bytes());
            out.extend_from_slice(body);
            out.extend_from_slice(b"\nendobj\n");
        }

        let xref_offset = out.len();
        let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", self.objects.len() + 1);
        for offset in offsets {
            let _ = write!(xref, "{offset:010} 00000 n \n");
        }
        let _ = write!(
            xref,
            "trailer\n<< /Size {} /Root {root_id} 0 R /Info {info_id} 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
            self.objects.len() + 1
        );
        out.extend_from_slice(xref.as_bytes());
        out
    }
}

#[cfg(test)]
pub mod fixtures {
    /// Smallest header-only JPEG with a baseline SOF0 frame.
    pub fn jpeg(width: u16, height: u16) -> Vec<u8> {
        let mut bytes = vec![0xFF, 0xD8];
        // APP0 / JFIF
        bytes.extend_from_slice(&[
            0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0x01, 0x01, 0x00, 0x00, 0x01,
            0x00, 0x01, 0x00, 0x00,
        ]);
        // SOF0: length 17, precision 8, height, width, 3 components
        bytes.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x11, 0x08]);
        bytes.extend_from_slice(&height.to_be_bytes());
        bytes.extend_from_slice(&width.to_be_bytes());
        bytes.extend_from_slice(&[
            0x03, 0x01, 0x22, 0x00, 0x02, 0x11, 0x01, 0x03, 0x11, 0x01,
        ]);
        bytes.extend_from_slice(&[0xFF, 0xD9]);
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::layout::layout_document;

    fn as_text(bytes: &[u8]) -> String {
        String::from_utf8_lossy(bytes).into_owned()
    }

    #[test]
    fn test_jpeg_info_reads_sof_dimensions() {
        let info = jpeg_info(&fixtures::jpeg(640, 320)).unwrap();
        assert_eq!(
            info,
            JpegInfo {
                width: 640,
                height: 320,
                components: 3
            }
        );
    }

    #[test]
    fn test_png_is_not_jpeg() {
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        assert_eq!(jpeg_info(&png), Err(PdfError::NotJpeg));
    }

    #[test]
    fn test_jpeg_without_frame_header_is_rejected() {
        assert_eq!(
            jpeg_info(&[0xFF, 0xD8, 0xFF, 0xD9]),
            Err(PdfError::MissingFrameHeader)
        );
    }

    #[test]
    fn test_fit_logo_keeps_aspect_ratio_and_never_upscales() {
        let close = |(w, h): (f32, f32), (ew, eh): (f32, f32)| {
            (w - ew).abs() < 1e-3 && (h - eh).abs() < 1e-3
        };
        assert!(close(fit_logo(640.0, 320.0), (120.0, 60.0)));
        assert!(close(fit_logo(100.0, 300.0), (20.0, 60.0)));
        assert_eq!(fit_logo(50.0, 20.0), (50.0, 20.0));
    }

    #[test]
    fn test_pdf_structure_and_xref_offsets() {
        let pages = layout_document("Service Agreement", &"Clause.\n".repeat(120), None);
        let pdf = render_pdf("Service Agreement", &pages, None);
        let text = as_text(&pdf);

        assert!(pdf.starts_with(b"%PDF-1.4\n"));
        assert!(text.ends_with("%%EOF\n"));
        assert!(text.contains(&format!("/Count {}", pages.len())));
        assert!(text.contains("/BaseFont /Helvetica-Bold"));

        let startxref: usize = text
            .rsplit("startxref\n")
            .next()
            .and_then(|tail| tail.lines().next())
            .and_then(|n| n.parse().ok())
            .unwrap();
        assert!(pdf[startxref..].starts_with(b"xref"));

        let xref = &text[startxref..];
        let entries: Vec<usize> = xref
            .lines()
            .skip(3)
            .take_while(|l| l.ends_with(" n "))
            .map(|l| l[..10].parse().unwrap())
            .collect();
        for (i, offset) in entries.iter().enumerate() {
            let header = format!("{} 0 obj", i + 1);
            assert!(pdf[*offset..].starts_with(header.as_bytes()), "bad offset for {header}");
        }
    }

    #[test]
    fn test_logo_embedded_as_dct_image() {
        let jpeg = fixtures::jpeg(240, 120);
        let info = jpeg_info(&jpeg).unwrap();
        let pages = layout_document("NDA", "Body.", Some(fit_logo(240.0, 120.0)));
        let pdf = render_pdf("NDA", &pages, Some(&Logo { jpeg: &jpeg, info }));
        let text = as_text(&pdf);

        assert!(text.contains("/Filter /DCTDecode"));
        assert!(text.contains("/Width 240 /Height 120"));
        assert!(text.contains("/XObject << /Im1"));
        assert!(text.contains("120.00 0 0 60.00 72.00"));
    }

    #[test]
    fn test_pdf_string_escapes_and_maps_win_ansi() {
        assert_eq!(pdf_string("a(b)\\"), b"(a\\(b\\)\\\\)".to_vec());
        assert_eq!(pdf_string("’"), b"(\\222)".to_vec());
        assert_eq!(pdf_string("漢"), b"(?)".to_vec());
    }
}
